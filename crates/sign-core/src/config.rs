//! Mount-time widget configuration.
//!
//! Options arrive from the host as a JSON object with camelCase keys. Loading
//! never fails: malformed input yields the defaults, a wrongly-typed field
//! falls back to its own default, and unknown keys are kept in `extras`.

use crate::model::{Color, ImageType, LineCap, LineJoin};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

// ─── Config ───────────────────────────────────────────────────────────────

/// Configuration for a signature pad instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Display
    /// Size the surface to the whole viewport.
    pub full_screen: bool,
    /// Full-screen overlay covering every other element on the page.
    pub full_cover: bool,
    /// Scale the backing bitmap by the device pixel ratio.
    pub density_correction: bool,
    /// Explicit logical size; `None` follows the container bounds.
    pub canvas_width: Option<f64>,
    pub canvas_height: Option<f64>,

    // Decoration
    pub show_border: bool,
    pub border_width: f64,
    pub border_color: Color,
    pub background: Color,

    // Ink
    /// Signature mode: width follows writing speed. When off, every
    /// segment uses `write_width`.
    pub signature_mode: bool,
    pub write_width: f64,
    pub min_write_width: f64,
    pub max_write_width: f64,
    pub write_color: Color,
    pub line_cap: LineCap,
    pub line_join: LineJoin,

    // Output
    pub image_type: ImageType,
    /// Returned by export while the pad holds no strokes.
    pub empty_placeholder: String,
    /// Encoder quality for lossy formats, `0.0..=1.0`.
    pub image_quality: f64,

    // Behaviour
    /// Debounce delay for resize notifications, in milliseconds.
    pub resize_delay_ms: f64,
    /// Maximum undo depth. `None` keeps every snapshot.
    pub max_history: Option<usize>,
    /// Weight given to the previous segment width when smoothing, `0.0..=1.0`.
    pub width_smoothing: f64,
    /// Writing speed (px/ms) at which the width bottoms out at the minimum.
    pub speed_ceiling: f64,

    /// Keys the widget does not know about, kept for forward compatibility.
    pub extras: BTreeMap<String, serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            full_screen: false,
            full_cover: false,
            density_correction: false,
            canvas_width: None,
            canvas_height: None,
            show_border: true,
            border_width: 1.0,
            border_color: Color::from_rgba8(0xFF, 0x78, 0x7F, 0xFF),
            background: Color::TRANSPARENT,
            signature_mode: true,
            write_width: 5.0,
            min_write_width: 5.0,
            max_write_width: 30.0,
            write_color: Color::from_rgba8(0x10, 0x10, 0x10, 0xFF),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            image_type: ImageType::Png,
            empty_placeholder: String::new(),
            image_quality: 0.92,
            resize_delay_ms: 200.0,
            max_history: None,
            width_smoothing: 0.5,
            speed_ceiling: 3.0,
            extras: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load from a JSON object. Never fails; see module docs.
    pub fn from_json(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<RawConfig>(text) {
            Ok(raw) => raw.into_config(),
            Err(e) => {
                log::warn!("invalid config JSON, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Repair out-of-range values in place.
    pub fn normalize(&mut self) {
        let positive = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
        let defaults = Config::default();

        self.min_write_width = positive(self.min_write_width, defaults.min_write_width);
        self.max_write_width = positive(self.max_write_width, defaults.max_write_width);
        if self.min_write_width > self.max_write_width {
            std::mem::swap(&mut self.min_write_width, &mut self.max_write_width);
        }
        self.write_width = positive(self.write_width, defaults.write_width);
        if self.signature_mode {
            self.write_width = self.write_width.clamp(self.min_write_width, self.max_write_width);
        }

        self.border_width = if self.border_width.is_finite() {
            self.border_width.max(0.0)
        } else {
            defaults.border_width
        };
        self.canvas_width = self.canvas_width.filter(|w| w.is_finite() && *w > 0.0);
        self.canvas_height = self.canvas_height.filter(|h| h.is_finite() && *h > 0.0);

        self.image_quality = finite_or(self.image_quality, defaults.image_quality).clamp(0.0, 1.0);
        self.width_smoothing =
            finite_or(self.width_smoothing, defaults.width_smoothing).clamp(0.0, 1.0);
        self.speed_ceiling = positive(self.speed_ceiling, defaults.speed_ceiling);
        self.resize_delay_ms = finite_or(self.resize_delay_ms, defaults.resize_delay_ms).max(0.0);
        self.max_history = self.max_history.filter(|n| *n > 0);
    }

    /// Width used when a stroke begins: the middle of the width range in
    /// signature mode, the fixed write width otherwise.
    pub fn initial_width(&self) -> f64 {
        if self.signature_mode {
            (self.min_write_width + self.max_write_width) / 2.0
        } else {
            self.write_width
        }
    }
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

// ─── Lenient decoding ─────────────────────────────────────────────────────

/// Wire shape of [`Config`]: every field optional, every field decoded
/// leniently so one bad value cannot reject the whole object.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawConfig {
    #[serde(deserialize_with = "lenient")]
    is_full_screen: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    is_full_cover: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    is_dpr: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    canvas_width: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    canvas_height: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    is_show_border: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    border_width: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    border_color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    bg_color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    is_sign: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    write_width: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    min_write_width: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    max_write_width: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    write_color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    line_cap: Option<LineCap>,
    #[serde(deserialize_with = "lenient")]
    line_join: Option<LineJoin>,
    #[serde(deserialize_with = "lenient")]
    img_type: Option<String>,
    #[serde(deserialize_with = "lenient")]
    empty_canvas: Option<String>,
    #[serde(deserialize_with = "lenient")]
    image_quality: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    resize_delay: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    max_history: Option<usize>,
    #[serde(deserialize_with = "lenient")]
    width_smoothing: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    speed_ceiling: Option<f64>,
    #[serde(flatten)]
    extras: BTreeMap<String, serde_json::Value>,
}

/// Decode a field as `T`, or `None` (with a warning) when the value has the
/// wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match T::deserialize(&value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            log::warn!("ignoring config value {value}: {e}");
            Ok(None)
        }
    }
}

fn color_or(raw: Option<String>, fallback: Color) -> Color {
    match raw {
        Some(s) => Color::parse(&s).unwrap_or_else(|| {
            log::warn!("unrecognized color {s:?}, using default");
            fallback
        }),
        None => fallback,
    }
}

impl RawConfig {
    fn into_config(self) -> Config {
        let d = Config::default();
        let image_type = match self.img_type {
            Some(s) => ImageType::parse(&s).unwrap_or_else(|| {
                log::warn!("unsupported image type {s:?}, using {}", d.image_type);
                d.image_type
            }),
            None => d.image_type,
        };
        let mut config = Config {
            full_screen: self.is_full_screen.unwrap_or(d.full_screen),
            full_cover: self.is_full_cover.unwrap_or(d.full_cover),
            density_correction: self.is_dpr.unwrap_or(d.density_correction),
            canvas_width: self.canvas_width.or(d.canvas_width),
            canvas_height: self.canvas_height.or(d.canvas_height),
            show_border: self.is_show_border.unwrap_or(d.show_border),
            border_width: self.border_width.unwrap_or(d.border_width),
            border_color: color_or(self.border_color, d.border_color),
            background: color_or(self.bg_color, d.background),
            signature_mode: self.is_sign.unwrap_or(d.signature_mode),
            write_width: self.write_width.unwrap_or(d.write_width),
            min_write_width: self.min_write_width.unwrap_or(d.min_write_width),
            max_write_width: self.max_write_width.unwrap_or(d.max_write_width),
            write_color: color_or(self.write_color, d.write_color),
            line_cap: self.line_cap.unwrap_or(d.line_cap),
            line_join: self.line_join.unwrap_or(d.line_join),
            image_type,
            empty_placeholder: self.empty_canvas.unwrap_or(d.empty_placeholder),
            image_quality: self.image_quality.unwrap_or(d.image_quality),
            resize_delay_ms: self.resize_delay.unwrap_or(d.resize_delay_ms),
            max_history: self.max_history.or(d.max_history),
            width_smoothing: self.width_smoothing.unwrap_or(d.width_smoothing),
            speed_ceiling: self.speed_ceiling.unwrap_or(d.speed_ceiling),
            extras: self.extras,
        };
        config.normalize();
        config
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_and_malformed_input_yield_defaults() {
        assert_eq!(Config::from_json(""), Config::default());
        assert_eq!(Config::from_json("{not json"), Config::default());
        assert_eq!(Config::from_json("{}"), Config::default());
    }

    #[test]
    fn known_keys_are_applied() {
        let config = Config::from_json(
            r##"{
                "isDpr": true,
                "canvasWidth": 320,
                "isShowBorder": false,
                "bgColor": "#ffffff",
                "minWriteWidth": 2,
                "maxWriteWidth": 10,
                "writeColor": "rgb(0, 0, 255)",
                "lineCap": "square",
                "imgType": "jpeg",
                "emptyCanvas": "data:,",
                "resizeDelay": 50
            }"##,
        );
        assert!(config.density_correction);
        assert_eq!(config.canvas_width, Some(320.0));
        assert_eq!(config.canvas_height, None);
        assert!(!config.show_border);
        assert_eq!(config.background, Color::WHITE);
        assert_eq!(config.min_write_width, 2.0);
        assert_eq!(config.max_write_width, 10.0);
        assert_eq!(config.write_color.to_rgba8(), [0, 0, 255, 255]);
        assert_eq!(config.line_cap, LineCap::Square);
        assert_eq!(config.image_type, ImageType::Jpeg);
        assert_eq!(config.empty_placeholder, "data:,");
        assert_eq!(config.resize_delay_ms, 50.0);
    }

    #[test]
    fn wrongly_typed_values_fall_back_per_field() {
        let config = Config::from_json(
            r#"{"minWriteWidth": "thin", "maxWriteWidth": 12, "lineJoin": "wobbly", "borderColor": "nope"}"#,
        );
        let d = Config::default();
        assert_eq!(config.min_write_width, d.min_write_width);
        assert_eq!(config.max_write_width, 12.0);
        assert_eq!(config.line_join, d.line_join);
        assert_eq!(config.border_color, d.border_color);
    }

    #[test]
    fn unknown_keys_are_kept_as_extras() {
        let config = Config::from_json(r#"{"isSign": false, "theme": "ink", "tilt": 3}"#);
        assert!(!config.signature_mode);
        assert_eq!(config.extras.get("theme"), Some(&serde_json::json!("ink")));
        assert_eq!(config.extras.get("tilt"), Some(&serde_json::json!(3)));
        assert_eq!(config.extras.len(), 2);
    }

    #[test]
    fn normalize_repairs_ranges() {
        let config = Config::from_json(
            r#"{"minWriteWidth": 12, "maxWriteWidth": 4, "writeWidth": -1,
                "widthSmoothing": 4, "imageQuality": -2, "borderWidth": -3,
                "canvasWidth": 0, "maxHistory": 0, "imgType": "bmp"}"#,
        );
        assert_eq!(config.min_write_width, 4.0);
        assert_eq!(config.max_write_width, 12.0);
        assert_eq!(config.write_width, 5.0);
        assert_eq!(config.width_smoothing, 1.0);
        assert_eq!(config.image_quality, 0.0);
        assert_eq!(config.border_width, 0.0);
        assert_eq!(config.canvas_width, None);
        assert_eq!(config.max_history, None);
        assert_eq!(config.image_type, ImageType::Png);
    }

    #[test]
    fn initial_width_depends_on_mode() {
        let mut config = Config {
            min_write_width: 2.0,
            max_write_width: 10.0,
            write_width: 3.0,
            ..Config::default()
        };
        assert_eq!(config.initial_width(), 6.0);
        config.signature_mode = false;
        assert_eq!(config.initial_width(), 3.0);
    }
}
