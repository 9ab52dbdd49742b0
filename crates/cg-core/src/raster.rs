use crate::Error;

/// Owned, tightly packed raster with interleaved channels.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Raster {
    pub fn from_vec(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, Error> {
        if channels == 0 {
            return Err(Error::InvalidChannels(channels));
        }

        let expected = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(channels))
            .ok_or(Error::SizeMismatch {
                expected: usize::MAX,
                actual: data.len(),
            })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Builds a raster where every pixel holds `pixel`.
    ///
    /// The channel count is `pixel.len()`.
    pub fn new_fill(width: usize, height: usize, pixel: &[u8]) -> Result<Self, Error> {
        let count = width.checked_mul(height).ok_or(Error::OutOfBounds)?;
        let data = pixel.repeat(count);
        Self::from_vec(width, height, pixel.len(), data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel_mut(&mut self, x: usize, y: usize) -> Option<&mut [u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * self.channels;
        self.data.get_mut(start..start + self.channels)
    }

    pub fn as_view(&self) -> RasterView<'_> {
        RasterView {
            width: self.width,
            height: self.height,
            channels: self.channels,
            stride: self.width * self.channels,
            data: &self.data,
        }
    }
}

/// Borrowed raster window. `stride` counts bytes between row starts.
#[derive(Debug, Clone, Copy)]
pub struct RasterView<'a> {
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
    data: &'a [u8],
}

impl<'a> RasterView<'a> {
    pub fn from_slice(
        width: usize,
        height: usize,
        channels: usize,
        stride: usize,
        data: &'a [u8],
    ) -> Result<Self, Error> {
        if channels == 0 {
            return Err(Error::InvalidChannels(channels));
        }

        let row_len = width.checked_mul(channels).ok_or(Error::InvalidStride)?;
        if stride < row_len {
            return Err(Error::InvalidStride);
        }

        let min_len = min_required_len(row_len, height, stride).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() < min_len {
            return Err(Error::SizeMismatch {
                expected: min_len,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            stride,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bytes in one row of pixels, excluding any padding.
    pub fn row_len(&self) -> usize {
        self.width * self.channels
    }

    pub fn row(&self, y: usize) -> &'a [u8] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.stride;
        &self.data[start..start + self.row_len()]
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<&'a [u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = y * self.stride + x * self.channels;
        self.data.get(start..start + self.channels)
    }

    pub fn subview(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<RasterView<'a>, Error> {
        if x > self.width
            || y > self.height
            || width > (self.width - x)
            || height > (self.height - y)
        {
            return Err(Error::OutOfBounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x * self.channels))
            .ok_or(Error::OutOfBounds)?;
        let min_len = min_required_len(width * self.channels, height, self.stride)
            .ok_or(Error::OutOfBounds)?;
        let tail = self.data.get(start..).ok_or(Error::OutOfBounds)?;

        if tail.len() < min_len {
            return Err(Error::OutOfBounds);
        }

        Ok(RasterView {
            width,
            height,
            channels: self.channels,
            stride: self.stride,
            data: tail,
        })
    }

    pub fn is_contiguous(&self) -> bool {
        self.stride == self.row_len()
    }

    pub fn as_contiguous_slice(&self) -> Option<&'a [u8]> {
        if !self.is_contiguous() {
            return None;
        }
        let len = self.row_len() * self.height;
        self.data.get(0..len)
    }
}

fn min_required_len(row_len: usize, height: usize, stride: usize) -> Option<usize> {
    if row_len == 0 || height == 0 {
        return Some(0);
    }

    let rows_before_last = height.checked_sub(1)?;
    let base = rows_before_last.checked_mul(stride)?;
    base.checked_add(row_len)
}
