//! Foundational primitives for color-cell grid codecs.
//!
//! ## Rasters and Stride
//! Rasters hold interleaved 8-bit channels (1 = grayscale, 3 or more = RGB
//! with any extra channels ignored by consumers). `stride` is the distance, in
//! bytes, between adjacent row starts and may be greater than
//! `width * channels`. A view is *contiguous* when rows pack with no gap, which
//! lets samplers walk the buffer with a single linear offset.
//!
//! ## Geometry
//! Quad geometry uses `f64` points. Integer points are derived by truncation
//! toward zero, and `Point2i::NONE` marks a coordinate that could not be
//! determined.

mod error;
mod geom;
mod raster;

pub use error::Error;
pub use geom::{Corners, Line2d, Midpoints, Point2d, Point2i, Vec2d};
pub use raster::{Raster, RasterView};
