//! Core value types shared by the tracker, renderer and surfaces.
//!
//! Everything here is a small `Copy` value: points in surface-local logical
//! pixels, RGBA colors, cap/join styles, and the export image type.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Point ───────────────────────────────────────────────────────────────

/// A 2D coordinate in surface-local logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Point halfway between `self` and `other`.
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> Self {
        kurbo::Point::new(p.x, p.y)
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Point::new(p.x, p.y)
    }
}

// ─── Color ───────────────────────────────────────────────────────────────

/// RGBA color with straight (non-premultiplied) components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(1.0, 1.0, 1.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Parse a CSS color string as accepted by the widget options:
    /// hex (`#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`), `rgb(...)`, `rgba(...)`,
    /// `transparent` and a handful of basic named colors.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.starts_with('#') {
            return Self::from_hex(s);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
        {
            return Self::from_rgb_function(args.strip_suffix(')')?);
        }
        Self::from_name(&lower)
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        match bytes.len() {
            3 | 4 => {
                let mut c = [15u8; 4];
                for (slot, &b) in c.iter_mut().zip(bytes) {
                    *slot = hex_val(b)?;
                }
                Some(Self::from_rgba8(c[0] * 17, c[1] * 17, c[2] * 17, c[3] * 17))
            }
            6 | 8 => {
                let mut c = [255u8; 4];
                for (slot, pair) in c.iter_mut().zip(bytes.chunks(2)) {
                    *slot = hex_val(pair[0])? << 4 | hex_val(pair[1])?;
                }
                Some(Self::from_rgba8(c[0], c[1], c[2], c[3]))
            }
            _ => None,
        }
    }

    fn from_rgb_function(args: &str) -> Option<Self> {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |s: &str| -> Option<f32> {
            let v: f32 = s.parse().ok()?;
            Some(v.clamp(0.0, 255.0) / 255.0)
        };
        let alpha = match parts.get(3) {
            Some(a) => a.parse::<f32>().ok()?.clamp(0.0, 1.0),
            None => 1.0,
        };
        Some(Self::rgba(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
            alpha,
        ))
    }

    fn from_name(name: &str) -> Option<Self> {
        let (r, g, b, a) = match name {
            "transparent" => return Some(Self::TRANSPARENT),
            "black" => (0, 0, 0, 255),
            "white" => (255, 255, 255, 255),
            "red" => (255, 0, 0, 255),
            "green" => (0, 128, 0, 255),
            "blue" => (0, 0, 255, 255),
            "gray" | "grey" => (128, 128, 128, 255),
            _ => return None,
        };
        Some(Self::from_rgba8(r, g, b, a))
    }

    /// Components as 8-bit straight RGBA.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// CSS `rgba(...)` form, suitable for Canvas2D style setters.
    pub fn to_css(&self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("rgba({r}, {g}, {b}, {})", (self.a.clamp(0.0, 1.0) * 1000.0).round() / 1000.0)
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }
}

// ─── Line style ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

impl LineCap {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    Miter,
    #[default]
    Round,
    Bevel,
}

impl LineJoin {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineJoin::Miter => "miter",
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
        }
    }
}

/// Everything a surface needs to paint one piece of ink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ink {
    pub color: Color,
    pub cap: LineCap,
    pub join: LineJoin,
}

// ─── Export format ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageType {
    /// Parse a format name. Accepts `jpg` as an alias and a leading `image/`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        match s.strip_prefix("image/").unwrap_or(&s) {
            "png" => Some(ImageType::Png),
            "jpeg" | "jpg" => Some(ImageType::Jpeg),
            "webp" => Some(ImageType::Webp),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ImageType::Png => "image/png",
            ImageType::Jpeg => "image/jpeg",
            ImageType::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageType::Png => "png",
            ImageType::Jpeg => "jpg",
            ImageType::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex_forms() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_rgba8(), [0x6C, 0x5C, 0xE7, 255]);

        let short = Color::parse("#f00").unwrap();
        assert_eq!(short.to_rgba8(), [255, 0, 0, 255]);

        let with_alpha = Color::parse("#FF000080").unwrap();
        assert!((with_alpha.a - 128.0 / 255.0).abs() < 0.01);

        assert!(Color::from_hex("#12345").is_none());
        assert!(Color::from_hex("#zzzzzz").is_none());
    }

    #[test]
    fn color_rgb_functions() {
        let c = Color::parse("rgba(255, 255, 255, 0)").unwrap();
        assert_eq!(c.to_rgba8(), [255, 255, 255, 0]);
        assert!(c.is_transparent());

        let c = Color::parse("RGB(16,16,16)").unwrap();
        assert_eq!(c.to_rgba8(), [16, 16, 16, 255]);

        assert!(Color::parse("rgb(1,2)").is_none());
        assert!(Color::parse("rgba(1,2,3,x)").is_none());
    }

    #[test]
    fn color_names_and_css_output() {
        assert_eq!(Color::parse("white"), Some(Color::WHITE));
        assert!(Color::parse("transparent").unwrap().is_transparent());
        assert!(Color::parse("mauve-ish").is_none());
        assert_eq!(Color::from_rgba8(255, 120, 127, 255).to_css(), "rgba(255, 120, 127, 1)");
    }

    #[test]
    fn point_geometry() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(a.midpoint(b), Point::new(1.5, 2.0));
    }

    #[test]
    fn image_type_parsing() {
        assert_eq!(ImageType::parse("png"), Some(ImageType::Png));
        assert_eq!(ImageType::parse("JPG"), Some(ImageType::Jpeg));
        assert_eq!(ImageType::parse("image/webp"), Some(ImageType::Webp));
        assert_eq!(ImageType::parse("gif"), None);
        assert_eq!(ImageType::Jpeg.mime(), "image/jpeg");
    }
}
