//! Stroke geometry: samples → smoothed, variable-width segments.
//!
//! Consecutive samples are joined with quadratic curves through their
//! midpoints: each segment runs from the previous midpoint to the midpoint
//! of the last two samples, with the earlier sample as control point. This
//! keeps the ink C1-continuous at every midpoint while only ever drawing
//! between samples already seen.
//!
//! A segment is painted as a run of short straight pieces whose width is
//! interpolated from the segment's start width to its end width.

use kurbo::{ParamCurve, ParamCurveArclen, QuadBez};
use sign_core::model::{Ink, Point};
use sign_core::surface::Surface;

/// Target length of one flattened piece, in logical pixels.
const PIECE_LENGTH: f64 = 1.5;
/// Upper bound on pieces per segment.
const MAX_PIECES: usize = 128;
const ARCLEN_ACCURACY: f64 = 0.1;

/// One rendered portion of a stroke between two samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub curve: QuadBez,
    pub start_width: f64,
    pub end_width: f64,
}

/// A straight, uniform-width slice of a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Piece {
    pub from: Point,
    pub to: Point,
    pub width: f64,
}

impl Segment {
    pub fn new(start: Point, control: Point, end: Point, start_width: f64, end_width: f64) -> Self {
        Self {
            curve: QuadBez::new(start, control, end),
            start_width,
            end_width,
        }
    }

    /// A single dab of ink at `center`.
    pub fn dot(center: Point, width: f64) -> Self {
        Self::new(center, center, center, width, width)
    }

    pub fn start(&self) -> Point {
        self.curve.p0.into()
    }

    pub fn end(&self) -> Point {
        self.curve.p2.into()
    }

    pub fn is_dot(&self) -> bool {
        self.curve.p0 == self.curve.p1 && self.curve.p1 == self.curve.p2
    }

    pub fn length(&self) -> f64 {
        self.curve.arclen(ARCLEN_ACCURACY)
    }

    /// Flatten into pieces, widths interpolated along the curve.
    pub fn pieces(&self) -> Vec<Piece> {
        let n = ((self.length() / PIECE_LENGTH).ceil() as usize).clamp(1, MAX_PIECES);
        let mut pieces = Vec::with_capacity(n);
        let mut from: Point = self.curve.p0.into();
        for i in 0..n {
            let t0 = i as f64 / n as f64;
            let t1 = (i + 1) as f64 / n as f64;
            let to: Point = self.curve.eval(t1).into();
            let t_mid = (t0 + t1) * 0.5;
            pieces.push(Piece {
                from,
                to,
                width: self.start_width + (self.end_width - self.start_width) * t_mid,
            });
            from = to;
        }
        pieces
    }
}

/// Turns tracked samples of one stroke into segments.
#[derive(Debug, Clone, Default)]
pub struct StrokeRenderer {
    last_sample: Option<Point>,
    last_mid: Point,
    last_width: f64,
    travelled: f64,
}

impl StrokeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor a new stroke at `point`.
    pub fn begin(&mut self, point: Point, width: f64) {
        self.last_sample = Some(point);
        self.last_mid = point;
        self.last_width = width;
        self.travelled = 0.0;
    }

    /// Next sample. Returns the segment to paint, or `None` outside a stroke.
    pub fn extend(&mut self, point: Point, width: f64) -> Option<Segment> {
        let prev = self.last_sample?;
        let mid = prev.midpoint(point);
        let segment = Segment::new(self.last_mid, prev, mid, self.last_width, width);

        self.travelled += prev.distance(point);
        self.last_sample = Some(point);
        self.last_mid = mid;
        self.last_width = width;
        Some(segment)
    }

    /// Close the stroke at the last known sample.
    ///
    /// Returns the tail from the last midpoint to that sample, or a dot when
    /// the pointer never moved.
    pub fn finish(&mut self) -> Option<Segment> {
        let last = self.last_sample.take()?;
        if self.travelled == 0.0 {
            return Some(Segment::dot(last, self.last_width));
        }
        if self.last_mid == last {
            return None;
        }
        let control = self.last_mid.midpoint(last);
        Some(Segment::new(
            self.last_mid,
            control,
            last,
            self.last_width,
            self.last_width,
        ))
    }

    pub fn is_open(&self) -> bool {
        self.last_sample.is_some()
    }
}

/// Paint `segment` onto `surface`.
pub fn paint_segment<S: Surface + ?Sized>(surface: &mut S, segment: &Segment, ink: &Ink) {
    if segment.is_dot() {
        surface.fill_dot(segment.start(), segment.start_width / 2.0, ink.color);
        return;
    }
    for piece in segment.pieces() {
        if piece.from != piece.to {
            surface.stroke_piece(piece.from, piece.to, piece.width, ink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_segment_starts_at_anchor() {
        let mut r = StrokeRenderer::new();
        r.begin(Point::new(0.0, 0.0), 4.0);
        let seg = r.extend(Point::new(10.0, 0.0), 6.0).unwrap();
        assert_eq!(seg.start(), Point::new(0.0, 0.0));
        assert_eq!(seg.end(), Point::new(5.0, 0.0));
        assert_eq!((seg.start_width, seg.end_width), (4.0, 6.0));
    }

    #[test]
    fn segments_chain_through_midpoints() {
        let mut r = StrokeRenderer::new();
        r.begin(Point::new(0.0, 0.0), 4.0);
        let a = r.extend(Point::new(10.0, 0.0), 5.0).unwrap();
        let b = r.extend(Point::new(10.0, 10.0), 6.0).unwrap();
        assert_eq!(a.end(), b.start());
        assert_eq!(b.curve.p1, kurbo::Point::new(10.0, 0.0));
        assert_eq!(b.start_width, a.end_width);

        let tail = r.finish().unwrap();
        assert_eq!(tail.start(), b.end());
        assert_eq!(tail.end(), Point::new(10.0, 10.0));
        assert!(!r.is_open());
    }

    #[test]
    fn tap_finishes_as_dot() {
        let mut r = StrokeRenderer::new();
        r.begin(Point::new(3.0, 3.0), 8.0);
        let seg = r.finish().unwrap();
        assert!(seg.is_dot());
        assert_eq!(seg.start_width, 8.0);
    }

    #[test]
    fn extend_outside_stroke_is_ignored() {
        let mut r = StrokeRenderer::new();
        assert!(r.extend(Point::new(1.0, 1.0), 1.0).is_none());
        assert!(r.finish().is_none());
    }

    #[test]
    fn pieces_interpolate_width_and_stay_connected() {
        let seg = Segment::new(
            Point::new(0.0, 0.0),
            Point::new(15.5, 0.0),
            Point::new(31.0, 0.0),
            2.0,
            10.0,
        );
        let pieces = seg.pieces();
        assert_eq!(pieces.len(), 21);
        assert_eq!(pieces[0].from, Point::new(0.0, 0.0));
        assert!((pieces.last().unwrap().to.x - 31.0).abs() < 1e-9);
        for pair in pieces.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
            assert!(pair[0].width < pair[1].width);
        }
        assert!(pieces.iter().all(|p| (2.0..=10.0).contains(&p.width)));
    }
}
