//! Software surface backed by a `tiny-skia` pixmap.
//!
//! Used off-browser (native hosts, server-side rendering of captured
//! samples, tests). All drawing is in logical pixels; the device pixel ratio
//! is applied through the paint transform.

use crate::export::{data_url, encode_rgba};
use sign_core::layout::SurfaceSize;
use sign_core::model::{Color, ImageType, Ink, LineCap, LineJoin, Point};
use sign_core::surface::{Surface, SurfaceError};
use tiny_skia::{
    FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

/// Saved copy of the pixmap. Empty when taken from an unallocated surface.
#[derive(Clone)]
pub struct RasterSnapshot {
    pixmap: Option<Pixmap>,
}

impl RasterSnapshot {
    pub fn pixel_size(&self) -> (u32, u32) {
        self.pixmap
            .as_ref()
            .map_or((0, 0), |p| (p.width(), p.height()))
    }

    /// Premultiplied RGBA bytes.
    pub fn data(&self) -> &[u8] {
        self.pixmap.as_ref().map(Pixmap::data).unwrap_or_default()
    }
}

pub struct RasterSurface {
    pixmap: Option<Pixmap>,
    size: SurfaceSize,
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterSurface {
    /// An unallocated surface; call [`Surface::allocate`] before drawing.
    pub fn new() -> Self {
        Self {
            pixmap: None,
            size: SurfaceSize {
                width: 0.0,
                height: 0.0,
                ratio: 1.0,
            },
        }
    }

    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    /// Straight-alpha RGBA of the device pixel at (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.as_ref()?.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Straight-alpha RGBA bytes of the whole bitmap.
    pub fn to_rgba(&self) -> Vec<u8> {
        let Some(pixmap) = &self.pixmap else {
            return Vec::new();
        };
        pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    fn transform(&self) -> Transform {
        let r = self.size.ratio as f32;
        Transform::from_scale(r, r)
    }
}

fn skia_color(color: Color) -> tiny_skia::Color {
    let [r, g, b, a] = color.to_rgba8();
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

fn skia_cap(cap: LineCap) -> tiny_skia::LineCap {
    match cap {
        LineCap::Butt => tiny_skia::LineCap::Butt,
        LineCap::Round => tiny_skia::LineCap::Round,
        LineCap::Square => tiny_skia::LineCap::Square,
    }
}

fn skia_join(join: LineJoin) -> tiny_skia::LineJoin {
    match join {
        LineJoin::Miter => tiny_skia::LineJoin::Miter,
        LineJoin::Round => tiny_skia::LineJoin::Round,
        LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
    }
}

impl Surface for RasterSurface {
    type Snapshot = RasterSnapshot;

    fn allocate(&mut self, size: SurfaceSize) -> Result<(), SurfaceError> {
        let (width, height) = size.pixel_size();
        let pixmap = Pixmap::new(width, height).ok_or(SurfaceError::Allocation { width, height })?;
        log::debug!("raster surface {width}x{height} (ratio {})", size.ratio);
        self.pixmap = Some(pixmap);
        self.size = size;
        Ok(())
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn fill_background(&mut self, color: Color) {
        if let Some(pixmap) = &mut self.pixmap {
            pixmap.fill(skia_color(color));
        }
    }

    fn stroke_border(&mut self, width: f64, color: Color) {
        if width <= 0.0 || color.is_transparent() {
            return;
        }
        let transform = self.transform();
        let SurfaceSize {
            width: w, height: h, ..
        } = self.size;
        let Some(pixmap) = &mut self.pixmap else {
            return;
        };
        let half = width / 2.0;
        let Some(rect) = Rect::from_xywh(
            half as f32,
            half as f32,
            (w - width).max(0.0) as f32,
            (h - width).max(0.0) as f32,
        ) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        let stroke = Stroke {
            width: width as f32,
            line_join: tiny_skia::LineJoin::Miter,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &solid_paint(color), &stroke, transform, None);
    }

    fn stroke_piece(&mut self, from: Point, to: Point, width: f64, ink: &Ink) {
        let transform = self.transform();
        let Some(pixmap) = &mut self.pixmap else {
            return;
        };
        let mut pb = PathBuilder::new();
        pb.move_to(from.x as f32, from.y as f32);
        pb.line_to(to.x as f32, to.y as f32);
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = Stroke {
            width: width as f32,
            line_cap: skia_cap(ink.cap),
            line_join: skia_join(ink.join),
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &solid_paint(ink.color), &stroke, transform, None);
    }

    fn fill_dot(&mut self, center: Point, radius: f64, color: Color) {
        let transform = self.transform();
        let Some(pixmap) = &mut self.pixmap else {
            return;
        };
        if let Some(path) =
            PathBuilder::from_circle(center.x as f32, center.y as f32, radius as f32)
        {
            pixmap.fill_path(&path, &solid_paint(color), FillRule::Winding, transform, None);
        }
    }

    fn snapshot(&self) -> RasterSnapshot {
        RasterSnapshot {
            pixmap: self.pixmap.clone(),
        }
    }

    fn restore(&mut self, snapshot: &RasterSnapshot) {
        let Some(pixmap) = &mut self.pixmap else {
            return;
        };
        let Some(saved) = &snapshot.pixmap else {
            pixmap.fill(tiny_skia::Color::TRANSPARENT);
            return;
        };
        if (saved.width(), saved.height()) == (pixmap.width(), pixmap.height()) {
            pixmap.data_mut().copy_from_slice(saved.data());
            return;
        }
        let sx = pixmap.width() as f32 / saved.width() as f32;
        let sy = pixmap.height() as f32 / saved.height() as f32;
        pixmap.fill(tiny_skia::Color::TRANSPARENT);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        pixmap.draw_pixmap(
            0,
            0,
            saved.as_ref(),
            &paint,
            Transform::from_scale(sx, sy),
            None,
        );
    }

    fn encode(&self, format: ImageType, quality: f64) -> Result<String, SurfaceError> {
        let Some(pixmap) = &self.pixmap else {
            return Err(SurfaceError::Unsupported("surface not allocated".into()));
        };
        let bytes = encode_rgba(pixmap.width(), pixmap.height(), self.to_rgba(), format, quality)?;
        Ok(data_url(format, &bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Ink = Ink {
        color: Color::BLACK,
        cap: LineCap::Round,
        join: LineJoin::Round,
    };

    fn surface(width: f64, height: f64, ratio: f64) -> RasterSurface {
        let mut s = RasterSurface::new();
        s.allocate(SurfaceSize {
            width,
            height,
            ratio,
        })
        .unwrap();
        s
    }

    #[test]
    fn allocates_pixel_size() {
        let s = surface(40.0, 20.0, 2.0);
        let p = s.pixmap().unwrap();
        assert_eq!((p.width(), p.height()), (80, 40));
    }

    #[test]
    fn piece_covers_its_center() {
        let mut s = surface(20.0, 20.0, 1.0);
        s.stroke_piece(Point::new(2.0, 10.0), Point::new(18.0, 10.0), 4.0, &INK);
        assert_eq!(s.pixel(10, 10), Some([0, 0, 0, 255]));
        assert_eq!(s.pixel(10, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn ratio_scales_drawing() {
        let mut s = surface(20.0, 20.0, 2.0);
        s.fill_dot(Point::new(10.0, 10.0), 3.0, Color::BLACK);
        assert_eq!(s.pixel(20, 20), Some([0, 0, 0, 255]));
        assert_eq!(s.pixel(10, 10), Some([0, 0, 0, 0]));
    }

    #[test]
    fn background_and_border() {
        let mut s = surface(10.0, 10.0, 1.0);
        s.fill_background(Color::WHITE);
        s.stroke_border(2.0, Color::BLACK);
        assert_eq!(s.pixel(0, 5), Some([0, 0, 0, 255]));
        assert_eq!(s.pixel(5, 5), Some([255, 255, 255, 255]));
    }

    #[test]
    fn same_size_restore_is_exact() {
        let mut s = surface(16.0, 16.0, 1.0);
        s.fill_background(Color::WHITE);
        let before = s.snapshot();
        s.stroke_piece(Point::new(1.0, 1.0), Point::new(15.0, 15.0), 3.0, &INK);
        assert_ne!(s.snapshot().data(), before.data());
        s.restore(&before);
        assert_eq!(s.snapshot().data(), before.data());
    }

    #[test]
    fn restore_scales_to_new_size() {
        let mut s = surface(10.0, 10.0, 1.0);
        s.fill_background(Color::BLACK);
        let snap = s.snapshot();
        s.allocate(SurfaceSize {
            width: 20.0,
            height: 20.0,
            ratio: 1.0,
        })
        .unwrap();
        s.restore(&snap);
        assert_eq!(s.pixel(10, 10), Some([0, 0, 0, 255]));
    }

    #[test]
    fn encode_requires_allocation() {
        let s = RasterSurface::new();
        assert!(s.encode(ImageType::Png, 1.0).is_err());
        let s = surface(4.0, 4.0, 1.0);
        assert!(s.encode(ImageType::Png, 1.0).unwrap().starts_with("data:image/png;base64,"));
    }
}
