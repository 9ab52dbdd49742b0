use cg_core::{Error, RasterView};
use tracing::trace;

use crate::nlargest::NLargest;

/// Largest values retained per channel by the robust statistic.
const TOP_K_CAPACITY: usize = 9;

/// Number of ranked values averaged by the robust statistic.
pub const SIGNAL_RANK: usize = 5;

/// A cell whose `SIGNAL_RANK`-th largest value exceeds this in every channel
/// is overexposed.
pub const BRIGHT_THRESHOLD: u8 = 200;

/// Brightest samples discounted from an overexposed cell.
pub const BRIGHT_SKIP: usize = 3;

/// Scanline stepping inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStep {
    #[default]
    Every,
    /// Visit every other scanline, halving cost and staying clear of
    /// neighboring cells' bleed.
    Alternate,
}

impl ScanStep {
    pub fn increment(self) -> usize {
        match self {
            Self::Every => 1,
            Self::Alternate => 2,
        }
    }
}

/// Result of a robust sample with its overexposure verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RobustSample<T> {
    pub value: T,
    pub overexposed: bool,
}

/// Rectangular window into a raster.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    raster: RasterView<'a>,
    xstart: usize,
    ystart: usize,
    cols: usize,
    rows: usize,
}

impl<'a> Cell<'a> {
    /// Cell spanning the whole raster.
    pub fn new(raster: RasterView<'a>) -> Self {
        Self {
            raster,
            xstart: 0,
            ystart: 0,
            cols: raster.width(),
            rows: raster.height(),
        }
    }

    pub fn with_window(
        raster: RasterView<'a>,
        xstart: usize,
        ystart: usize,
        cols: usize,
        rows: usize,
    ) -> Result<Self, Error> {
        let xend = xstart.checked_add(cols).ok_or(Error::OutOfBounds)?;
        let yend = ystart.checked_add(rows).ok_or(Error::OutOfBounds)?;
        if xend > raster.width() || yend > raster.height() {
            return Err(Error::OutOfBounds);
        }

        Ok(Self {
            raster,
            xstart,
            ystart,
            cols,
            rows,
        })
    }

    /// Sub-cell offset by `(dx, dy)` from this cell's origin.
    pub fn child(&self, dx: usize, dy: usize, cols: usize, rows: usize) -> Result<Self, Error> {
        let xstart = self.xstart.checked_add(dx).ok_or(Error::OutOfBounds)?;
        let ystart = self.ystart.checked_add(dy).ok_or(Error::OutOfBounds)?;
        Self::with_window(self.raster, xstart, ystart, cols, rows)
    }

    pub fn xstart(&self) -> usize {
        self.xstart
    }

    pub fn ystart(&self) -> usize {
        self.ystart
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn raster(&self) -> RasterView<'a> {
        self.raster
    }

    pub fn mean_rgb(&self, step: ScanStep) -> [u8; 3] {
        if self.raster.channels() < 3 {
            return [0; 3];
        }

        let mut sums = [0u64; 3];
        let mut count = 0u64;
        self.scan(step, |px| {
            sums[0] += u64::from(px[0]);
            sums[1] += u64::from(px[1]);
            sums[2] += u64::from(px[2]);
            count += 1;
        });

        if count == 0 {
            return [0; 3];
        }
        sums.map(|s| to_u8(s / count))
    }

    pub fn mean_grayscale(&self, step: ScanStep) -> u8 {
        if self.raster.channels() != 1 {
            return 0;
        }

        let mut total = 0u64;
        let mut count = 0u64;
        self.scan(step, |px| {
            total += u64::from(px[0]);
            count += 1;
        });

        if count == 0 {
            return 0;
        }
        to_u8(total / count)
    }

    pub fn calc_rgb(&self, step: ScanStep) -> [u8; 3] {
        self.calc_rgb_detailed(step).value
    }

    pub fn calc_rgb_detailed(&self, step: ScanStep) -> RobustSample<[u8; 3]> {
        if self.raster.channels() < 3 {
            return RobustSample::default();
        }

        let mut tops = [NLargest::<u8, TOP_K_CAPACITY>::new(); 3];
        self.scan(step, |px| {
            for (top, &v) in tops.iter_mut().zip(px) {
                top.eval(v);
            }
        });

        let overexposed = self.is_overexposed(&tops);
        let skip = if overexposed { BRIGHT_SKIP } else { 0 };
        RobustSample {
            value: tops.map(|top| to_u8(top.mean(SIGNAL_RANK, skip))),
            overexposed,
        }
    }

    pub fn calc_grayscale(&self, step: ScanStep) -> u8 {
        self.calc_grayscale_detailed(step).value
    }

    pub fn calc_grayscale_detailed(&self, step: ScanStep) -> RobustSample<u8> {
        if self.raster.channels() != 1 {
            return RobustSample::default();
        }

        let mut top = NLargest::<u8, TOP_K_CAPACITY>::new();
        self.scan(step, |px| top.eval(px[0]));

        let overexposed = self.is_overexposed(core::slice::from_ref(&top));
        let skip = if overexposed { BRIGHT_SKIP } else { 0 };
        RobustSample {
            value: to_u8(top.mean(SIGNAL_RANK, skip)),
            overexposed,
        }
    }

    fn is_overexposed(&self, channels: &[NLargest<u8, TOP_K_CAPACITY>]) -> bool {
        let bright = channels
            .iter()
            .all(|top| top.nth(SIGNAL_RANK - 1) > BRIGHT_THRESHOLD);
        if bright {
            trace!(
                target: "cg_sample::overexposed",
                x = self.xstart,
                y = self.ystart,
                cols = self.cols,
                rows = self.rows,
                "cell is overexposed"
            );
        }
        bright
    }

    fn scan(&self, step: ScanStep, visit: impl FnMut(&[u8])) {
        if self.cols > 0
            && let Some(data) = self.raster.as_contiguous_slice()
        {
            self.scan_contiguous(data, step, visit);
            return;
        }
        self.scan_rows(step, visit);
    }

    /// Walks the packed buffer with one running offset, jumping a full raster
    /// row (two with `ScanStep::Alternate`) between scanlines.
    fn scan_contiguous(&self, data: &[u8], step: ScanStep, mut visit: impl FnMut(&[u8])) {
        let channels = self.raster.channels();
        let span = self.cols * channels;
        let jump = self.raster.row_len() * step.increment();

        let mut offset = (self.ystart * self.raster.width() + self.xstart) * channels;
        for _ in (0..self.rows).step_by(step.increment()) {
            for px in data[offset..offset + span].chunks_exact(channels) {
                visit(px);
            }
            offset += jump;
        }
    }

    fn scan_rows(&self, step: ScanStep, mut visit: impl FnMut(&[u8])) {
        let channels = self.raster.channels();
        let start = self.xstart * channels;
        let end = start + self.cols * channels;

        for y in (self.ystart..self.ystart + self.rows).step_by(step.increment()) {
            for px in self.raster.row(y)[start..end].chunks_exact(channels) {
                visit(px);
            }
        }
    }
}

#[inline]
fn to_u8(v: u64) -> u8 {
    u8::try_from(v).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use cg_core::{Error, Raster, RasterView};

    use super::{Cell, ScanStep};

    fn rgb_from(width: usize, height: usize, f: impl Fn(usize, usize) -> [u8; 3]) -> Raster {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Raster::from_vec(width, height, 3, data).expect("valid raster")
    }

    fn gray_from(width: usize, height: usize, values: &[u8]) -> Raster {
        Raster::from_vec(width, height, 1, values.to_vec()).expect("valid raster")
    }

    /// Copies `img` into a buffer with `pad` bytes after every row.
    fn padded(img: &Raster, pad: usize) -> Vec<u8> {
        let view = img.as_view();
        let mut out = Vec::new();
        for y in 0..view.height() {
            out.extend_from_slice(view.row(y));
            out.extend(std::iter::repeat_n(0xEE, pad));
        }
        out
    }

    #[test]
    fn uniform_cells_return_their_color() {
        for (w, h) in [(1, 1), (2, 2), (3, 3), (5, 4)] {
            for color in [[0, 0, 0], [12, 200, 90], [255, 255, 255], [201, 230, 250]] {
                let img = Raster::new_fill(w, h, &color).expect("valid raster");
                let cell = Cell::new(img.as_view());
                assert_eq!(cell.mean_rgb(ScanStep::Every), color, "{w}x{h}");
                assert_eq!(cell.calc_rgb(ScanStep::Every), color, "{w}x{h}");
            }

            let img = Raster::new_fill(w, h, &[77]).expect("valid raster");
            let cell = Cell::new(img.as_view());
            assert_eq!(cell.mean_grayscale(ScanStep::Every), 77);
            assert_eq!(cell.calc_grayscale(ScanStep::Every), 77);
        }
    }

    #[test]
    fn overexposed_cell_discounts_brightest_samples() {
        let red = [255u8, 250, 240, 230, 220, 210, 100, 50, 10];
        let green = [254u8, 249, 239, 229, 219, 209, 99, 49, 9];
        let img = rgb_from(3, 3, |x, y| {
            let i = (y * 3 + x + 4) % 9;
            [red[i], green[i], red[i]]
        });
        let cell = Cell::new(img.as_view());

        let sample = cell.calc_rgb_detailed(ScanStep::Every);
        assert!(sample.overexposed);

        let trimmed = |v: &[u8; 9]| v[3..8].iter().map(|&x| u32::from(x)).sum::<u32>() / 5;
        let expected = [trimmed(&red), trimmed(&green), trimmed(&red)];
        assert_eq!(sample.value.map(u32::from), expected);
        assert_eq!(sample.value, [162, 161, 162]);

        let untrimmed = red[..5].iter().map(|&x| u32::from(x)).sum::<u32>() / 5;
        assert_ne!(u32::from(sample.value[0]), untrimmed);
    }

    #[test]
    fn one_dim_channel_disables_trimming() {
        let bright = [255u8, 250, 240, 230, 220, 210, 100, 50, 10];
        let dimmer = [255u8, 250, 240, 230, 200, 190, 100, 50, 10];
        let img = rgb_from(3, 3, |x, y| {
            let i = y * 3 + x;
            [bright[i], bright[i], dimmer[i]]
        });
        let cell = Cell::new(img.as_view());

        let sample = cell.calc_rgb_detailed(ScanStep::Every);
        assert!(!sample.overexposed);
        assert_eq!(sample.value, [239, 239, 235]);
    }

    #[test]
    fn robust_value_ignores_dark_speckles() {
        let img = gray_from(3, 3, &[180, 180, 0, 180, 180, 180, 0, 180, 180]);
        let cell = Cell::new(img.as_view());
        assert_eq!(cell.mean_grayscale(ScanStep::Every), 140);
        assert_eq!(cell.calc_grayscale(ScanStep::Every), 180);
    }

    #[test]
    fn contiguous_and_padded_rasters_agree() {
        let img = rgb_from(6, 5, |x, y| {
            [(x * 40) as u8, (y * 50) as u8, ((x * 7 + y * 13) % 256) as u8]
        });
        let buffer = padded(&img, 4);
        let strided = RasterView::from_slice(6, 5, 3, 6 * 3 + 4, &buffer).expect("valid view");
        assert!(img.as_view().is_contiguous());
        assert!(!strided.is_contiguous());

        for step in [ScanStep::Every, ScanStep::Alternate] {
            for (x, y, c, r) in [(0, 0, 6, 5), (1, 1, 3, 3), (4, 2, 2, 3), (2, 0, 1, 5)] {
                let fast = Cell::with_window(img.as_view(), x, y, c, r).expect("in bounds");
                let slow = Cell::with_window(strided, x, y, c, r).expect("in bounds");
                assert_eq!(fast.mean_rgb(step), slow.mean_rgb(step));
                assert_eq!(fast.calc_rgb(step), slow.calc_rgb(step));
            }
        }
    }

    #[test]
    fn window_reads_only_its_pixels() {
        let img = rgb_from(4, 4, |x, y| {
            if (1..3).contains(&x) && (1..3).contains(&y) {
                [10, 20, 30]
            } else {
                [250, 250, 250]
            }
        });
        let cell = Cell::with_window(img.as_view(), 1, 1, 2, 2).expect("in bounds");
        assert_eq!(cell.mean_rgb(ScanStep::Every), [10, 20, 30]);
        assert_eq!(cell.calc_rgb(ScanStep::Every), [10, 20, 30]);
    }

    #[test]
    fn child_offsets_are_relative() {
        let values: Vec<u8> = (0..36).collect();
        let img = gray_from(6, 6, &values);
        let parent = Cell::with_window(img.as_view(), 1, 1, 4, 4).expect("in bounds");
        let child = parent.child(2, 1, 2, 2).expect("in bounds");

        assert_eq!((child.xstart(), child.ystart()), (3, 2));
        assert_eq!((child.cols(), child.rows()), (2, 2));
        // pixels 15, 16, 21, 22
        assert_eq!(child.mean_grayscale(ScanStep::Every), 18);
        // parent is untouched
        assert_eq!((parent.xstart(), parent.cols()), (1, 4));

        assert_eq!(parent.child(4, 0, 3, 1).unwrap_err(), Error::OutOfBounds);
    }

    #[test]
    fn alternate_step_skips_scanlines() {
        let mut values = Vec::new();
        for y in 0..4 {
            values.extend([if y % 2 == 0 { 100u8 } else { 200 }; 4]);
        }
        let img = gray_from(4, 4, &values);
        let cell = Cell::new(img.as_view());
        assert_eq!(cell.mean_grayscale(ScanStep::Every), 150);
        assert_eq!(cell.mean_grayscale(ScanStep::Alternate), 100);
    }

    #[test]
    fn wrong_channel_count_samples_as_zero() {
        let gray = gray_from(2, 2, &[9, 9, 9, 9]);
        let cell = Cell::new(gray.as_view());
        assert_eq!(cell.mean_rgb(ScanStep::Every), [0, 0, 0]);
        assert_eq!(cell.calc_rgb(ScanStep::Every), [0, 0, 0]);

        let rgb = Raster::new_fill(2, 2, &[9, 9, 9]).expect("valid raster");
        let cell = Cell::new(rgb.as_view());
        assert_eq!(cell.mean_grayscale(ScanStep::Every), 0);
        assert_eq!(cell.calc_grayscale(ScanStep::Every), 0);
    }

    #[test]
    fn extra_channels_are_ignored() {
        let img = Raster::new_fill(3, 2, &[40, 80, 120, 7]).expect("valid raster");
        let cell = Cell::new(img.as_view());
        assert_eq!(cell.mean_rgb(ScanStep::Every), [40, 80, 120]);
        assert_eq!(cell.calc_rgb(ScanStep::Every), [40, 80, 120]);
    }

    #[test]
    fn empty_window_samples_as_zero() {
        let img = Raster::new_fill(3, 3, &[50, 60, 70]).expect("valid raster");
        let no_cols = Cell::with_window(img.as_view(), 1, 1, 0, 2).expect("in bounds");
        let no_rows = Cell::with_window(img.as_view(), 1, 1, 2, 0).expect("in bounds");
        for cell in [no_cols, no_rows] {
            assert_eq!(cell.mean_rgb(ScanStep::Every), [0, 0, 0]);
            assert_eq!(cell.calc_rgb(ScanStep::Every), [0, 0, 0]);
        }
    }

    #[test]
    fn sums_do_not_overflow_on_large_windows() {
        let img = Raster::new_fill(400, 400, &[255, 254, 253]).expect("valid raster");
        let cell = Cell::new(img.as_view());
        assert_eq!(cell.mean_rgb(ScanStep::Every), [255, 254, 253]);
    }
}
