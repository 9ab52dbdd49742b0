//! Per-cell color sampling for photographed color-cell grids.
//!
//! A [`Cell`] is a rectangular window into a borrowed raster; it never copies
//! pixel data. Two statistics are available for RGB and grayscale rasters:
//! - `mean_*`: arithmetic mean of every sampled channel value.
//! - `calc_*`: mean of a high order-statistic window taken from the nine
//!   largest values per channel. Averaging over an anti-aliased cell pulls the
//!   fill toward neighboring cells, while the upper order statistics keep the
//!   cell's own fill. When the fifth-largest value of every channel exceeds
//!   200 the cell is treated as overexposed and the three brightest samples
//!   are discounted.
//!
//! Traversal picks a linear walk over the backing buffer when the raster is
//! contiguous, and falls back to per-row addressing otherwise. Both walks
//! visit the same pixels.
//!
//! Rasters with the wrong channel count, and windows with no pixels, sample
//! as zero rather than failing.

mod cell;
mod nlargest;

pub use cell::{BRIGHT_SKIP, BRIGHT_THRESHOLD, Cell, RobustSample, SIGNAL_RANK, ScanStep};
pub use nlargest::NLargest;
