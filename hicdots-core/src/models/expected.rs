use std::ops::Range;

use ndarray::Array2;

///
/// Per-chromosome expected contact frequency indexed by diagonal offset.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedProfile {
    pub chrom: String,
    pub values: Vec<f64>,
    pub n_valid: Vec<u64>,
}

impl ExpectedProfile {
    pub fn new(chrom: &str, values: Vec<f64>) -> Self {
        let n_valid = vec![0; values.len()];
        ExpectedProfile {
            chrom: chrom.to_string(),
            values,
            n_valid,
        }
    }

    /// Number of diagonals, equal to the number of bins of the chromosome.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn view(&self) -> ExpectedView<'_> {
        ExpectedView::new(&self.values)
    }
}

///
/// Lazy Toeplitz view over an [ExpectedProfile]: `value(i, j) = profile[|i - j|]`.
///
/// Only the requested blocks are ever materialized. Offsets past the end of the
/// profile yield NaN, so truncated profiles never leak zeros into a convolution.
///
#[derive(Debug, Clone, Copy)]
pub struct ExpectedView<'a> {
    profile: &'a [f64],
}

impl<'a> ExpectedView<'a> {
    pub fn new(profile: &'a [f64]) -> Self {
        ExpectedView { profile }
    }

    #[inline]
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.profile.get(i.abs_diff(j)).copied().unwrap_or(f64::NAN)
    }

    ///
    /// Materialize a rectangular block.
    ///
    /// # Arguments
    /// - rows: row bin range, chromosome-relative or global (only differences matter)
    /// - cols: column bin range in the same coordinate system as `rows`
    pub fn block(&self, rows: Range<usize>, cols: Range<usize>) -> Array2<f64> {
        Array2::from_shape_fn((rows.len(), cols.len()), |(r, c)| {
            self.value(rows.start + r, cols.start + c)
        })
    }
}

///
/// The full expected table: one profile per chromosome, in file order.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectedTable {
    pub profiles: Vec<ExpectedProfile>,
}

impl ExpectedTable {
    pub fn new(profiles: Vec<ExpectedProfile>) -> Self {
        ExpectedTable { profiles }
    }

    pub fn get(&self, chrom: &str) -> Option<&ExpectedProfile> {
        self.profiles.iter().find(|p| p.chrom == chrom)
    }

    pub fn chromosomes(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.chrom.as_str()).collect()
    }
}
