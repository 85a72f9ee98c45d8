//! Surface sizing: logical size from host metrics, pixel size from the
//! device pixel ratio.

use crate::config::Config;

/// Dimensions reported by the host environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostMetrics {
    /// Bounds of the element the pad is mounted in.
    pub container_width: f64,
    pub container_height: f64,
    /// Visible viewport (used for full-screen modes).
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub device_pixel_ratio: f64,
}

impl HostMetrics {
    /// Metrics for a host where container and viewport coincide.
    pub fn fixed(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            container_width: width,
            container_height: height,
            viewport_width: width,
            viewport_height: height,
            device_pixel_ratio,
        }
    }
}

/// Logical size plus the scale applied to the backing bitmap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
    /// Backing pixels per logical pixel. `1.0` when density correction is off.
    pub ratio: f64,
}

impl SurfaceSize {
    /// Resolve the surface size for `config` inside `host`.
    pub fn resolve(config: &Config, host: &HostMetrics) -> Self {
        let (width, height) = if config.full_screen || config.full_cover {
            (host.viewport_width, host.viewport_height)
        } else {
            (
                config.canvas_width.unwrap_or(host.container_width),
                config.canvas_height.unwrap_or(host.container_height),
            )
        };
        let ratio = if config.density_correction {
            sanitize(host.device_pixel_ratio).max(1.0 / 8.0)
        } else {
            1.0
        };
        Self {
            width: sanitize(width).max(1.0),
            height: sanitize(height).max(1.0),
            ratio,
        }
    }

    /// Backing bitmap dimensions in device pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width * self.ratio).round().max(1.0) as u32,
            (self.height * self.ratio).round().max(1.0) as u32,
        )
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_container_by_default() {
        let host = HostMetrics {
            container_width: 300.0,
            container_height: 150.0,
            viewport_width: 1280.0,
            viewport_height: 720.0,
            device_pixel_ratio: 2.0,
        };
        let size = SurfaceSize::resolve(&Config::default(), &host);
        assert_eq!((size.width, size.height, size.ratio), (300.0, 150.0, 1.0));
        assert_eq!(size.pixel_size(), (300, 150));
    }

    #[test]
    fn density_correction_scales_pixels() {
        let config = Config {
            density_correction: true,
            ..Config::default()
        };
        let size = SurfaceSize::resolve(&config, &HostMetrics::fixed(301.0, 150.0, 1.5));
        assert_eq!(size.pixel_size(), (452, 225));
    }

    #[test]
    fn explicit_size_and_full_screen() {
        let host = HostMetrics {
            container_width: 300.0,
            container_height: 150.0,
            viewport_width: 1280.0,
            viewport_height: 720.0,
            device_pixel_ratio: 1.0,
        };
        let explicit = Config {
            canvas_width: Some(600.0),
            ..Config::default()
        };
        let size = SurfaceSize::resolve(&explicit, &host);
        assert_eq!((size.width, size.height), (600.0, 150.0));

        let cover = Config {
            full_cover: true,
            ..explicit
        };
        let size = SurfaceSize::resolve(&cover, &host);
        assert_eq!((size.width, size.height), (1280.0, 720.0));
    }

    #[test]
    fn degenerate_metrics_are_clamped() {
        let host = HostMetrics::fixed(0.0, f64::NAN, -2.0);
        let config = Config {
            density_correction: true,
            ..Config::default()
        };
        let size = SurfaceSize::resolve(&config, &host);
        assert_eq!(size.pixel_size(), (1, 1));
    }
}
