//! The drawing-surface seam.
//!
//! A `Surface` is an immediate-mode raster target addressed in logical
//! pixels. Implementations apply the device pixel ratio themselves. The
//! software backend lives in `sign-render`, the browser Canvas2D backend in
//! `sign-wasm`.

use crate::layout::SurfaceSize;
use crate::model::{Color, ImageType, Ink, Point};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The host cannot provide a 2D drawing context.
    #[error("2D drawing is not supported: {0}")]
    Unsupported(String),
    /// The backing bitmap could not be created at the requested size.
    #[error("cannot allocate a {width}x{height} bitmap")]
    Allocation { width: u32, height: u32 },
    #[error("failed to encode {format} image: {reason}")]
    Encode { format: ImageType, reason: String },
}

pub trait Surface {
    /// Saved bitmap state, restorable with [`Surface::restore`].
    type Snapshot: Clone;

    /// (Re)allocate the backing bitmap. Previous contents are discarded.
    fn allocate(&mut self, size: SurfaceSize) -> Result<(), SurfaceError>;

    fn size(&self) -> SurfaceSize;

    /// Replace every pixel with `color`.
    fn fill_background(&mut self, color: Color);

    /// Stroke a rectangle inset by half the border width along the edges.
    fn stroke_border(&mut self, width: f64, color: Color);

    /// Paint a straight piece of ink of uniform `width`.
    fn stroke_piece(&mut self, from: Point, to: Point, width: f64, ink: &Ink);

    /// Paint a filled disc, used for taps and zero-length pieces.
    fn fill_dot(&mut self, center: Point, radius: f64, color: Color);

    fn snapshot(&self) -> Self::Snapshot;

    /// Repaint from `snapshot`. Same-size snapshots restore exactly; others
    /// are scaled to fit the current size.
    fn restore(&mut self, snapshot: &Self::Snapshot);

    /// Encode the bitmap as a `data:` URL.
    fn encode(&self, format: ImageType, quality: f64) -> Result<String, SurfaceError>;
}
