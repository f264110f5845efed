use std::ops::Range;

use ndarray::Array2;
use sprs::{CsMat, TriMat};

use crate::errors::{DotsError, Result};

///
/// A chromosome of the contact matrix and its half-open extent in global bin ids.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chromosome {
    pub name: String,
    pub length: u64,
    pub bins: Range<usize>,
}

impl Chromosome {
    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }
}

/// Genomic annotation of a single bin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinCoords {
    pub start: u64,
    pub end: u64,
}

///
/// Read-only access to a genome-wide, logically symmetric matrix of raw contact counts.
///
/// Implementations are queried concurrently from every scoring worker.
///
pub trait ContactMatrix: Send + Sync {
    fn bin_size(&self) -> u64;

    fn chromosomes(&self) -> &[Chromosome];

    ///
    /// Raw (unbalanced) counts of a rectangular block.
    ///
    /// # Arguments
    /// - rows: global bin range of the rows
    /// - cols: global bin range of the columns
    fn observed(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Array2<f64>>;

    /// Balancing weights of a bin range, NaN where a bin is masked.
    fn weights(&self, bins: Range<usize>) -> Result<Vec<f64>>;

    fn chromosome(&self, name: &str) -> Option<&Chromosome> {
        self.chromosomes().iter().find(|c| c.name == name)
    }

    fn n_bins(&self) -> usize {
        self.chromosomes().last().map_or(0, |c| c.bins.end)
    }

    /// Genomic coordinates of a global bin id that belongs to `chrom`.
    fn bin_coords(&self, chrom: &Chromosome, bin_id: usize) -> BinCoords {
        let start = (bin_id - chrom.bins.start) as u64 * self.bin_size();
        let end = (start + self.bin_size()).min(chrom.length);
        BinCoords { start, end }
    }
}

///
/// In-memory contact matrix storing the upper triangle as CSR.
///
#[derive(Debug, Clone)]
pub struct SparseContactMatrix {
    bin_size: u64,
    chromosomes: Vec<Chromosome>,
    weights: Vec<f64>,
    upper: CsMat<u32>,
}

impl SparseContactMatrix {
    ///
    /// Build from chromosome sizes, per-bin weights and `(bin1_id, bin2_id, count)` triplets.
    ///
    /// Triplets from the lower triangle are mirrored into the upper one and duplicates
    /// are summed.
    ///
    /// # Arguments
    /// - bin_size: resolution in bp
    /// - chrom_sizes: `(name, length)` in genome order
    /// - weights: one balancing weight per bin, NaN for masked bins
    /// - pixels: raw counts
    pub fn new(
        bin_size: u64,
        chrom_sizes: &[(String, u64)],
        weights: Vec<f64>,
        pixels: &[(usize, usize, u32)],
    ) -> Result<Self> {
        if bin_size == 0 {
            return Err(DotsError::InvalidParameter("bin size must be positive".to_string()));
        }

        let mut chromosomes = Vec::with_capacity(chrom_sizes.len());
        let mut offset = 0;
        for (name, length) in chrom_sizes {
            let n_bins = length.div_ceil(bin_size) as usize;
            chromosomes.push(Chromosome {
                name: name.clone(),
                length: *length,
                bins: offset..offset + n_bins,
            });
            offset += n_bins;
        }

        if weights.len() != offset {
            return Err(DotsError::DataIntegrity(format!(
                "{} balancing weights supplied for {} bins",
                weights.len(),
                offset
            )));
        }

        let mut triplets = TriMat::new((offset, offset));
        for &(bin1, bin2, count) in pixels {
            if bin1 >= offset || bin2 >= offset {
                return Err(DotsError::DataIntegrity(format!(
                    "pixel ({}, {}) lies outside a matrix of {} bins",
                    bin1, bin2, offset
                )));
            }
            let (row, col) = if bin1 <= bin2 { (bin1, bin2) } else { (bin2, bin1) };
            triplets.add_triplet(row, col, count);
        }

        Ok(SparseContactMatrix {
            bin_size,
            chromosomes,
            weights,
            upper: triplets.to_csr(),
        })
    }

    fn check_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start > range.end || range.end > self.weights.len() {
            return Err(DotsError::InvalidParameter(format!(
                "bin range {:?} outside a matrix of {} bins",
                range,
                self.weights.len()
            )));
        }
        Ok(())
    }
}

impl ContactMatrix for SparseContactMatrix {
    fn bin_size(&self) -> u64 {
        self.bin_size
    }

    fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    fn observed(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Array2<f64>> {
        self.check_range(&rows)?;
        self.check_range(&cols)?;

        let mut block = Array2::zeros((rows.len(), cols.len()));

        // upper-triangle entries (row <= col)
        for row in rows.clone() {
            if let Some(entries) = self.upper.outer_view(row) {
                for (col, count) in entries.iter() {
                    if cols.contains(&col) {
                        block[[row - rows.start, col - cols.start]] = *count as f64;
                    }
                }
            }
        }

        // lower-triangle entries are mirrored from (col, row)
        for col in cols.clone() {
            if let Some(entries) = self.upper.outer_view(col) {
                for (row, count) in entries.iter() {
                    if row != col && rows.contains(&row) {
                        block[[row - rows.start, col - cols.start]] = *count as f64;
                    }
                }
            }
        }

        Ok(block)
    }

    fn weights(&self, bins: Range<usize>) -> Result<Vec<f64>> {
        self.check_range(&bins)?;
        Ok(self.weights[bins].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn matrix() -> SparseContactMatrix {
        let chroms = vec![("chr1".to_string(), 45), ("chr2".to_string(), 20)];
        let weights = vec![1.0, 0.5, f64::NAN, 1.0, 2.0, 1.0, 1.0];
        let pixels = vec![(0, 1, 3), (1, 0, 2), (2, 4, 7), (3, 3, 9), (5, 6, 1)];
        SparseContactMatrix::new(10, &chroms, weights, &pixels).unwrap()
    }

    #[rstest]
    fn test_chromosome_extents(matrix: SparseContactMatrix) {
        let chr1 = matrix.chromosome("chr1").unwrap();
        assert_eq!(chr1.bins, 0..5);
        assert_eq!(matrix.chromosome("chr2").unwrap().bins, 5..7);
        assert_eq!(matrix.n_bins(), 7);
        // last bin of chr1 is truncated to the chromosome length
        assert_eq!(matrix.bin_coords(chr1, 4), BinCoords { start: 40, end: 45 });
    }

    #[rstest]
    fn test_observed_is_symmetric(matrix: SparseContactMatrix) {
        let block = matrix.observed(0..5, 0..5).unwrap();
        // duplicates are summed: (0, 1) + (1, 0)
        assert_eq!(block[[0, 1]], 5.0);
        assert_eq!(block[[1, 0]], 5.0);
        assert_eq!(block[[4, 2]], 7.0);
        assert_eq!(block[[2, 4]], 7.0);
        assert_eq!(block[[3, 3]], 9.0);
        assert_eq!(block[[0, 0]], 0.0);
    }

    #[rstest]
    fn test_observed_offset_block(matrix: SparseContactMatrix) {
        let block = matrix.observed(3..5, 1..3).unwrap();
        assert_eq!(block.dim(), (2, 2));
        assert_eq!(block[[1, 1]], 7.0); // (4, 2)
    }

    #[rstest]
    fn test_weights(matrix: SparseContactMatrix) {
        let weights = matrix.weights(1..3).unwrap();
        assert_eq!(weights[0], 0.5);
        assert!(weights[1].is_nan());
        assert!(matrix.weights(5..9).is_err());
    }

    #[rstest]
    fn test_rejects_out_of_range_pixels() {
        let chroms = vec![("chr1".to_string(), 20)];
        let result = SparseContactMatrix::new(10, &chroms, vec![1.0, 1.0], &[(0, 2, 1)]);
        assert!(matches!(result, Err(DotsError::DataIntegrity(_))));
    }
}
