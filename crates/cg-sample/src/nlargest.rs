/// Keeps the `N` largest values seen so far, sorted descending.
#[derive(Debug, Clone, Copy)]
pub struct NLargest<T, const N: usize> {
    values: [T; N],
    len: usize,
}

impl<T: Copy + Ord + Default, const N: usize> NLargest<T, N> {
    pub fn new() -> Self {
        Self {
            values: [T::default(); N],
            len: 0,
        }
    }

    /// Offers one sample.
    pub fn eval(&mut self, value: T) {
        if N == 0 {
            return;
        }
        if self.len == N {
            if value <= self.values[N - 1] {
                return;
            }
            self.len -= 1;
        }

        let pos = self.values[..self.len].partition_point(|&v| v >= value);
        self.values.copy_within(pos..self.len, pos + 1);
        self.values[pos] = value;
        self.len += 1;
    }

    /// Value at `rank` from the top (0 = largest), or `T::default()` if fewer
    /// than `rank + 1` samples were kept.
    pub fn nth(&self, rank: usize) -> T {
        if rank < self.len {
            self.values[rank]
        } else {
            T::default()
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values[..self.len]
    }
}

impl<T: Copy + Ord + Default + Into<u64>, const N: usize> NLargest<T, N> {
    /// Integer mean of ranks `[skip, skip + k)`, clipped to the kept samples.
    pub fn mean(&self, k: usize, skip: usize) -> u64 {
        let end = skip.saturating_add(k).min(self.len);
        if skip >= end {
            return 0;
        }
        let total: u64 = self.values[skip..end].iter().map(|&v| v.into()).sum();
        total / (end - skip) as u64
    }
}

impl<T: Copy + Ord + Default, const N: usize> Default for NLargest<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
