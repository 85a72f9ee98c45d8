//! Per-stroke writing state: last sample, time, speed and width.
//!
//! Speed maps to width inverse-linearly: a resting pen writes at the maximum
//! width and anything at or above `speed_ceiling` px/ms writes at the minimum.
//! The target width is blended with the previous width so adjacent segments
//! never jump:
//!
//! ```text
//! v      = |p - last| / max(t - last_t, 1)
//! target = max - (max - min) * min(v / speed_ceiling, 1)
//! width  = clamp(s * last_width + (1 - s) * target, min, max)
//! ```

use crate::config::Config;
use crate::model::Point;

/// Smallest time step used for speed, in milliseconds.
pub const MIN_TIME_STEP_MS: f64 = 1.0;

/// Width and speed computed for one input sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedSample {
    pub point: Point,
    pub width: f64,
    /// Instantaneous speed in px/ms.
    pub speed: f64,
}

/// Width parameters copied out of [`Config`] at stroke start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthModel {
    pub variable: bool,
    pub fixed_width: f64,
    pub min_width: f64,
    pub max_width: f64,
    pub smoothing: f64,
    pub speed_ceiling: f64,
    pub initial_width: f64,
}

impl WidthModel {
    pub fn from_config(config: &Config) -> Self {
        Self {
            variable: config.signature_mode,
            fixed_width: config.write_width,
            min_width: config.min_write_width,
            max_width: config.max_write_width,
            smoothing: config.width_smoothing,
            speed_ceiling: config.speed_ceiling,
            initial_width: config.initial_width(),
        }
    }

    /// Target width for an instantaneous speed, before smoothing.
    pub fn target_width(&self, speed: f64) -> f64 {
        let ratio = (speed / self.speed_ceiling).clamp(0.0, 1.0);
        self.max_width - (self.max_width - self.min_width) * ratio
    }

    fn next_width(&self, last_width: f64, speed: f64) -> f64 {
        if !self.variable {
            return self.fixed_width;
        }
        let target = self.target_width(speed);
        let blended = self.smoothing * last_width + (1.0 - self.smoothing) * target;
        blended.clamp(self.min_width, self.max_width)
    }
}

/// Transient state of the stroke being written.
#[derive(Debug, Clone)]
pub struct StrokeTracker {
    model: WidthModel,
    last_point: Option<Point>,
    last_time: f64,
    last_speed: f64,
    last_width: f64,
}

impl StrokeTracker {
    pub fn new(model: WidthModel) -> Self {
        Self {
            model,
            last_point: None,
            last_time: 0.0,
            last_speed: 0.0,
            last_width: model.initial_width,
        }
    }

    pub fn set_model(&mut self, model: WidthModel) {
        self.model = model;
    }

    /// Start a stroke at `point`.
    pub fn begin(&mut self, point: Point, time_ms: f64) -> TrackedSample {
        self.last_point = Some(point);
        self.last_time = time_ms;
        self.last_speed = 0.0;
        self.last_width = self.model.initial_width;
        TrackedSample {
            point,
            width: self.last_width,
            speed: 0.0,
        }
    }

    /// Record the next sample. Returns `None` when no stroke is open or the
    /// sample is not finite; a rejected sample leaves the state untouched.
    pub fn advance(&mut self, point: Point, time_ms: f64) -> Option<TrackedSample> {
        let last = self.last_point?;
        if !point.is_finite() || !time_ms.is_finite() {
            return None;
        }
        let dt = (time_ms - self.last_time).max(MIN_TIME_STEP_MS);
        let speed = last.distance(point) / dt;
        let width = self.model.next_width(self.last_width, speed);

        self.last_point = Some(point);
        self.last_time = time_ms;
        self.last_speed = speed;
        self.last_width = width;

        log::trace!("sample ({:.1}, {:.1}) v={speed:.3} w={width:.2}", point.x, point.y);
        Some(TrackedSample { point, width, speed })
    }

    /// Close the stroke; the next sample must come through [`begin`](Self::begin).
    pub fn end(&mut self) {
        self.last_point = None;
    }

    pub fn is_tracking(&self) -> bool {
        self.last_point.is_some()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.last_point
    }

    pub fn last_time(&self) -> f64 {
        self.last_time
    }

    pub fn last_speed(&self) -> f64 {
        self.last_speed
    }

    pub fn last_width(&self) -> f64 {
        self.last_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn narrow_config() -> Config {
        Config {
            min_write_width: 2.0,
            max_write_width: 10.0,
            ..Config::default()
        }
    }

    fn tracker() -> StrokeTracker {
        StrokeTracker::new(WidthModel::from_config(&narrow_config()))
    }

    #[test]
    fn begin_uses_midpoint_width() {
        let mut t = tracker();
        let s = t.begin(Point::new(4.0, 4.0), 100.0);
        assert_eq!(s.width, 6.0);
        assert_eq!(t.last_point(), Some(Point::new(4.0, 4.0)));
        assert_eq!(t.last_time(), 100.0);
    }

    #[test]
    fn fast_then_slow_widens() {
        let mut t = tracker();
        t.begin(Point::new(0.0, 0.0), 0.0);
        let fast = t.advance(Point::new(100.0, 0.0), 10.0).unwrap();
        let slow = t.advance(Point::new(101.0, 0.0), 1000.0).unwrap();

        assert_eq!(fast.width, 4.0);
        assert!(slow.width > fast.width);
        assert!((10.0 - slow.width).abs() < (10.0 - fast.width).abs());
    }

    #[test]
    fn zero_elapsed_time_is_floored() {
        let mut t = tracker();
        t.begin(Point::new(0.0, 0.0), 50.0);
        let s = t.advance(Point::new(3.0, 4.0), 50.0).unwrap();
        assert_eq!(s.speed, 5.0);
        assert!(s.width.is_finite());

        // Clock going backwards is treated the same way.
        let s = t.advance(Point::new(3.0, 5.0), 10.0).unwrap();
        assert_eq!(s.speed, 1.0);
    }

    #[test]
    fn width_stays_in_range_for_erratic_input() {
        let mut t = tracker();
        t.begin(Point::new(0.0, 0.0), 0.0);
        let mut time = 0.0;
        for i in 0..200 {
            let jump = if i % 7 == 0 { 500.0 } else { (i % 3) as f64 };
            time += (i % 5) as f64 * 3.0;
            let s = t
                .advance(Point::new(jump * (i as f64).cos(), jump), time)
                .unwrap();
            assert!((2.0..=10.0).contains(&s.width), "width {} out of range", s.width);
        }
    }

    #[test]
    fn advance_without_begin_is_ignored() {
        let mut t = tracker();
        assert!(t.advance(Point::new(1.0, 1.0), 1.0).is_none());
        t.begin(Point::new(0.0, 0.0), 0.0);
        t.end();
        assert!(!t.is_tracking());
        assert!(t.advance(Point::new(1.0, 1.0), 1.0).is_none());
    }

    #[test]
    fn non_finite_samples_are_skipped() {
        let mut t = tracker();
        t.begin(Point::new(0.0, 0.0), 0.0);
        let before = t.advance(Point::new(10.0, 0.0), 16.0).unwrap();

        assert!(t.advance(Point::new(f64::NAN, 5.0), 32.0).is_none());
        assert!(t.advance(Point::new(5.0, f64::INFINITY), 32.0).is_none());
        assert!(t.advance(Point::new(20.0, 0.0), f64::NEG_INFINITY).is_none());
        assert_eq!(t.last_point(), Some(before.point));
        assert_eq!(t.last_width(), before.width);

        let s = t.advance(Point::new(20.0, 0.0), 48.0).unwrap();
        assert!((2.0..=10.0).contains(&s.width), "width {} out of range", s.width);
    }

    #[test]
    fn fixed_width_when_not_signing() {
        let config = Config {
            signature_mode: false,
            write_width: 3.0,
            ..narrow_config()
        };
        let mut t = StrokeTracker::new(WidthModel::from_config(&config));
        assert_eq!(t.begin(Point::new(0.0, 0.0), 0.0).width, 3.0);
        let s = t.advance(Point::new(200.0, 0.0), 1.0).unwrap();
        assert_eq!(s.width, 3.0);
    }
}
