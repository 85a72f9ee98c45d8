//! Canvas2D surface.
//!
//! Draws straight into an HTML `<canvas>` through `CanvasRenderingContext2d`.
//! The backing store is sized in device pixels and the context carries a
//! `ratio` scale, so callers keep working in CSS pixels.

use sign_core::layout::SurfaceSize;
use sign_core::model::{Color, ImageType, Ink, Point};
use sign_core::surface::{Surface, SurfaceError};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Offscreen copy of the canvas. `None` if the copy could not be made.
#[derive(Clone)]
pub struct CanvasSnapshot {
    canvas: Option<HtmlCanvasElement>,
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: Option<CanvasRenderingContext2d>,
    size: SurfaceSize,
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
}

fn js_reason(e: &JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{e:?}"))
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        let ctx = context_2d(&canvas);
        Self {
            canvas,
            ctx,
            size: SurfaceSize {
                width: 0.0,
                height: 0.0,
                ratio: 1.0,
            },
        }
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn pixel_dims(&self) -> (f64, f64) {
        (self.canvas.width() as f64, self.canvas.height() as f64)
    }

    /// Run `f` with the identity transform, restoring state afterwards.
    fn in_device_space(&self, f: impl FnOnce(&CanvasRenderingContext2d)) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        ctx.save();
        let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        f(ctx);
        ctx.restore();
    }

    fn offscreen_copy(&self) -> Result<HtmlCanvasElement, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let copy: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        copy.set_width(self.canvas.width());
        copy.set_height(self.canvas.height());
        let ctx = context_2d(&copy).ok_or_else(|| JsValue::from_str("no 2d context"))?;
        ctx.draw_image_with_html_canvas_element(&self.canvas, 0.0, 0.0)?;
        Ok(copy)
    }
}

impl Surface for CanvasSurface {
    type Snapshot = CanvasSnapshot;

    fn allocate(&mut self, size: SurfaceSize) -> Result<(), SurfaceError> {
        let Some(ctx) = &self.ctx else {
            return Err(SurfaceError::Unsupported(
                "canvas has no 2d context".to_string(),
            ));
        };
        let (width, height) = size.pixel_size();
        self.canvas.set_width(width);
        self.canvas.set_height(height);

        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", size.width));
        let _ = style.set_property("height", &format!("{}px", size.height));

        // Resizing the backing store resets context state.
        ctx.set_transform(size.ratio, 0.0, 0.0, size.ratio, 0.0, 0.0)
            .map_err(|e| SurfaceError::Unsupported(js_reason(&e)))?;
        self.size = size;
        Ok(())
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn fill_background(&mut self, color: Color) {
        let (w, h) = self.pixel_dims();
        self.in_device_space(|ctx| {
            ctx.clear_rect(0.0, 0.0, w, h);
            if !color.is_transparent() {
                ctx.set_fill_style_str(&color.to_css());
                ctx.fill_rect(0.0, 0.0, w, h);
            }
        });
    }

    fn stroke_border(&mut self, width: f64, color: Color) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        if width <= 0.0 || color.is_transparent() {
            return;
        }
        let half = width / 2.0;
        ctx.set_stroke_style_str(&color.to_css());
        ctx.set_line_width(width);
        ctx.set_line_join("miter");
        ctx.stroke_rect(
            half,
            half,
            (self.size.width - width).max(0.0),
            (self.size.height - width).max(0.0),
        );
    }

    fn stroke_piece(&mut self, from: Point, to: Point, width: f64, ink: &Ink) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        ctx.begin_path();
        ctx.move_to(from.x, from.y);
        ctx.line_to(to.x, to.y);
        ctx.set_line_width(width);
        ctx.set_line_cap(ink.cap.as_str());
        ctx.set_line_join(ink.join.as_str());
        ctx.set_stroke_style_str(&ink.color.to_css());
        ctx.stroke();
    }

    fn fill_dot(&mut self, center: Point, radius: f64, color: Color) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        ctx.begin_path();
        let _ = ctx.arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU);
        ctx.set_fill_style_str(&color.to_css());
        ctx.fill();
    }

    fn snapshot(&self) -> CanvasSnapshot {
        match self.offscreen_copy() {
            Ok(canvas) => CanvasSnapshot {
                canvas: Some(canvas),
            },
            Err(e) => {
                log::warn!("canvas snapshot failed: {}", js_reason(&e));
                CanvasSnapshot { canvas: None }
            }
        }
    }

    fn restore(&mut self, snapshot: &CanvasSnapshot) {
        let (w, h) = self.pixel_dims();
        self.in_device_space(|ctx| {
            ctx.clear_rect(0.0, 0.0, w, h);
            let Some(saved) = &snapshot.canvas else {
                return;
            };
            let result = if (saved.width(), saved.height()) == (w as u32, h as u32) {
                ctx.draw_image_with_html_canvas_element(saved, 0.0, 0.0)
            } else {
                ctx.draw_image_with_html_canvas_element_and_dw_and_dh(saved, 0.0, 0.0, w, h)
            };
            if let Err(e) = result {
                log::warn!("canvas restore failed: {}", js_reason(&e));
            }
        });
    }

    fn encode(&self, format: ImageType, quality: f64) -> Result<String, SurfaceError> {
        self.canvas
            .to_data_url_with_type_and_encoder_options(format.mime(), &JsValue::from_f64(quality))
            .map_err(|e| SurfaceError::Encode {
                format,
                reason: js_reason(&e),
            })
    }
}
