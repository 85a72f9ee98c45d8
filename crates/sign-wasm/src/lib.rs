//! WASM bridge for the signature pad. Exposes `SignPad` to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The host page mounts a
//! `<canvas>`, constructs a `SignCanvas` with a JSON options object, and
//! forwards pointer events in canvas-local CSS pixels.

mod canvas2d;

use canvas2d::CanvasSurface;
use sign_core::config::Config;
use sign_core::layout::HostMetrics;
use sign_core::model::{ImageType, Point};
use sign_editor::pad::SignPad;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlAnchorElement, HtmlCanvasElement};

type SharedPad = Rc<RefCell<SignPad<CanvasSurface>>>;

/// A scheduled `setTimeout` that applies the debounced resize.
/// Dropping it clears the timeout, so a replaced or unmounted timer never fires.
struct ResizeTimer {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Drop for ResizeTimer {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            window.clear_timeout_with_handle(self.handle);
        }
    }
}

/// The WASM-facing signature canvas.
///
/// Every call is absorbed locally: failures are logged to the console and
/// reported through return values, never thrown.
#[wasm_bindgen]
pub struct SignCanvas {
    pad: SharedPad,
    resize_timer: Option<ResizeTimer>,
}

#[wasm_bindgen]
impl SignCanvas {
    /// Mount on `canvas` with options given as a JSON object string.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config_json: &str) -> SignCanvas {
        console_setup();

        let config = Config::from_json(config_json);
        if config.full_cover {
            apply_cover_style(&canvas);
        }
        let host = host_metrics(&canvas);
        let pad = SignPad::mount(CanvasSurface::new(canvas), config, host);
        Self {
            pad: Rc::new(RefCell::new(pad)),
            resize_timer: None,
        }
    }

    /// Handle pointer down. Returns `true` if the canvas changed.
    pub fn handle_pointer_down(&mut self, x: f64, y: f64, time_ms: f64) -> bool {
        self.pad.borrow_mut().pointer_down(Point::new(x, y), time_ms)
    }

    /// Handle pointer move. Returns `true` if a segment was painted.
    pub fn handle_pointer_move(&mut self, x: f64, y: f64, time_ms: f64) -> bool {
        self.pad.borrow_mut().pointer_move(Point::new(x, y), time_ms)
    }

    /// Handle pointer up. Returns `true` if a stroke was finalized.
    pub fn handle_pointer_up(&mut self, _x: f64, _y: f64, _time_ms: f64) -> bool {
        self.pad.borrow_mut().end_stroke()
    }

    pub fn handle_pointer_cancel(&mut self, _time_ms: f64) -> bool {
        self.pad.borrow_mut().end_stroke()
    }

    pub fn handle_pointer_leave(&mut self, _x: f64, _y: f64, _time_ms: f64) -> bool {
        self.pad.borrow_mut().end_stroke()
    }

    pub fn clear(&mut self) {
        self.pad.borrow_mut().clear();
    }

    /// Undo the last stroke. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.pad.borrow_mut().undo()
    }

    /// Export as a `data:` URL (`png`, `jpeg` or `webp`; empty string for
    /// the configured type). Returns the `emptyCanvas` option while blank.
    pub fn to_data_url(&self, format: &str) -> String {
        self.pad.borrow().to_data_url(format)
    }

    pub fn is_empty(&self) -> bool {
        self.pad.borrow().is_empty()
    }

    pub fn is_drawing(&self) -> bool {
        self.pad.borrow().is_drawing()
    }

    /// Whether the pad could draw at all (a 2D context was available).
    pub fn is_ready(&self) -> bool {
        self.pad.borrow().is_ready()
    }

    pub fn is_full_cover(&self) -> bool {
        self.pad.borrow().config().full_cover
    }

    /// Resize immediately from the current layout.
    pub fn resize(&mut self) -> bool {
        self.resize_timer = None;
        let mut pad = self.pad.borrow_mut();
        let host = host_metrics(pad.surface().canvas());
        pad.resize(host)
    }

    /// Record a window resize / orientation change.
    ///
    /// The resize runs by itself once no further notification arrived for
    /// `resizeDelay` ms; each call restarts that wait. Hosts that drive a
    /// frame loop may call [`tick`](Self::tick) instead, which applies the
    /// same pending resize as soon as the delay has passed.
    pub fn notify_resize(&mut self, now_ms: f64) {
        let delay_ms = {
            let mut pad = self.pad.borrow_mut();
            let host = host_metrics(pad.surface().canvas());
            pad.notify_resize(host, now_ms);
            pad.config().resize_delay_ms
        };
        self.arm_resize_timer(delay_ms);
    }

    /// Apply a pending debounced resize. Returns `true` if the canvas was resized.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.pad.borrow_mut().tick(now_ms)
    }

    /// Save the signature through a temporary download link.
    /// Returns `false` if the pad is empty or the link could not be created.
    pub fn download(&self, name: &str, format: &str) -> bool {
        let (url, file_name) = {
            let pad = self.pad.borrow();
            if pad.is_empty() {
                return false;
            }
            let format = ImageType::parse(format).unwrap_or(pad.config().image_type);
            (pad.export(format), download_file_name(name, format))
        };
        match trigger_download(&url, &file_name) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("download failed: {e:?}");
                false
            }
        }
    }
}

impl SignCanvas {
    /// Replace any pending timer with one that fires after `delay_ms`.
    fn arm_resize_timer(&mut self, delay_ms: f64) {
        self.resize_timer = None;
        let Some(window) = web_sys::window() else {
            return;
        };
        let pad = Rc::clone(&self.pad);
        let callback = Closure::wrap(Box::new(move || {
            let Ok(mut pad) = pad.try_borrow_mut() else {
                return;
            };
            let host = host_metrics(pad.surface().canvas());
            pad.flush_resize(host);
        }) as Box<dyn FnMut()>);

        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            delay_ms.max(0.0).round() as i32,
        ) {
            Ok(handle) => {
                self.resize_timer = Some(ResizeTimer {
                    handle,
                    _callback: callback,
                });
            }
            Err(e) => log::warn!("resize timer unavailable, waiting for tick: {e:?}"),
        }
    }
}

// ─── Host helpers ────────────────────────────────────────────────────────

fn host_metrics(canvas: &HtmlCanvasElement) -> HostMetrics {
    let window = web_sys::window();
    let dimension = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let (viewport_width, viewport_height, device_pixel_ratio) = match &window {
        Some(w) => (
            dimension(w.inner_width()),
            dimension(w.inner_height()),
            w.device_pixel_ratio(),
        ),
        None => (0.0, 0.0, 1.0),
    };
    let (container_width, container_height) = match canvas.parent_element() {
        Some(parent) => (parent.client_width() as f64, parent.client_height() as f64),
        None => (canvas.client_width() as f64, canvas.client_height() as f64),
    };
    HostMetrics {
        container_width,
        container_height,
        viewport_width,
        viewport_height,
        device_pixel_ratio,
    }
}

/// Pin the canvas above every other element.
fn apply_cover_style(canvas: &HtmlCanvasElement) {
    let style = canvas.style();
    for (prop, value) in [
        ("position", "fixed"),
        ("top", "0"),
        ("left", "0"),
        ("z-index", "2147483647"),
    ] {
        let _ = style.set_property(prop, value);
    }
}

fn trigger_download(url: &str, file_name: &str) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(url);
    anchor.set_download(file_name);
    anchor.click();
    Ok(())
}

/// `name` with the format's extension, defaulting the stem to `signature`.
fn download_file_name(name: &str, format: ImageType) -> String {
    let stem = name.trim();
    let stem = if stem.is_empty() { "signature" } else { stem };
    let ext = format.extension();
    if stem
        .rsplit_once('.')
        .is_some_and(|(_, e)| e.eq_ignore_ascii_case(ext))
    {
        stem.to_string()
    } else {
        format!("{stem}.{ext}")
    }
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// Resolve an options object against the defaults. Returns the effective
/// options as JSON with the same camelCase keys the constructor accepts.
#[wasm_bindgen]
pub fn resolve_config(config_json: &str) -> String {
    let c = Config::from_json(config_json);
    let mut obj = serde_json::json!({
        "isFullScreen": c.full_screen,
        "isFullCover": c.full_cover,
        "isDpr": c.density_correction,
        "canvasWidth": c.canvas_width,
        "canvasHeight": c.canvas_height,
        "isShowBorder": c.show_border,
        "borderWidth": c.border_width,
        "borderColor": c.border_color.to_css(),
        "bgColor": c.background.to_css(),
        "isSign": c.signature_mode,
        "writeWidth": c.write_width,
        "minWriteWidth": c.min_write_width,
        "maxWriteWidth": c.max_write_width,
        "writeColor": c.write_color.to_css(),
        "lineCap": c.line_cap,
        "lineJoin": c.line_join,
        "imgType": c.image_type,
        "emptyCanvas": c.empty_placeholder,
        "imageQuality": c.image_quality,
        "resizeDelay": c.resize_delay_ms,
        "maxHistory": c.max_history,
        "widthSmoothing": c.width_smoothing,
        "speedCeiling": c.speed_ceiling,
    });
    for (key, value) in c.extras {
        obj[key] = value;
    }
    obj.to_string()
}

// ─── Console ─────────────────────────────────────────────────────────────

/// Forwards `log` records to the browser console.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[sign-canvas] {}", record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            log::Level::Info => web_sys::console::info_1(&msg),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
static LOGGER: ConsoleLogger = ConsoleLogger;

fn console_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SETUP: Once = Once::new();
        SETUP.call_once(|| {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Info);
            }
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("sign-canvas WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
