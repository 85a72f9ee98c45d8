//! Stroke geometry, the software raster surface, and image export.

pub mod export;
pub mod raster;
pub mod stroke;

pub use raster::{RasterSnapshot, RasterSurface};
pub use stroke::{Piece, Segment, StrokeRenderer, paint_segment};
