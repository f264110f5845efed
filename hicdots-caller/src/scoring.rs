use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use ndarray::Array2;
use statrs::distribution::{DiscreteCDF, Poisson};

use hicdots_core::models::{
    ContactMatrix, ExpectedTable, ExpectedView, Kernel, KernelHistograms, KernelScores, ScoredPixel,
    Tile,
};
use hicdots_core::{CallingParams, DotsError, Result, ValidationError};

///
/// Poisson survival function `P(X > observed)` for rate `lambda`.
///
/// A zero rate yields 0: any count is infinitely surprising.
///
pub fn poisson_sf(observed: u64, lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 0.0;
    }
    match Poisson::new(lambda) {
        Ok(dist) => dist.sf(observed),
        Err(_) => f64::NAN,
    }
}

///
/// Genome-wide result of the scoring stage: every scored pixel, sorted by
/// `(bin1_id, bin2_id)`, and the merged lambda-chunked histograms.
///
#[derive(Debug, Clone, Default)]
pub struct ScoringOutcome {
    pub pixels: Vec<ScoredPixel>,
    pub histograms: KernelHistograms,
    pub tiles_expected: usize,
    pub tiles_scored: usize,
}

impl ScoringOutcome {
    /// True once every generated tile has been scored and merged.
    pub fn is_complete(&self) -> bool {
        self.tiles_scored == self.tiles_expected
    }
}

///
/// Convolution-based local background estimation over a single tile.
///
/// For every core pixel of the tile and every kernel, computes the locally-adjusted
/// expected, the number of unusable footprint cells and the Poisson p-value of the
/// observed count. Pixels outside the band, or with too many unusable cells or a
/// non-finite background for any kernel, are dropped.
///
pub struct TileScorer<'a, M: ContactMatrix + ?Sized> {
    matrix: &'a M,
    expected: &'a ExpectedTable,
    kernels: &'a [Kernel],
    band: usize,
    max_nans_tolerated: u32,
}

// a tile's fetched blocks, indexed relative to the tile origin
struct TileBlocks {
    observed: Array2<f64>,
    expected: Array2<f64>,
    balanced_observed: Array2<f64>,
    balanced_expected: Array2<f64>,
    valid: Array2<bool>,
    row_weights: Vec<f64>,
    col_weights: Vec<f64>,
}

impl<'a, M: ContactMatrix + ?Sized> TileScorer<'a, M> {
    ///
    /// # Arguments
    /// - matrix: contact matrix to fetch observed counts and weights from
    /// - expected: expected table with a profile for every tiled chromosome
    /// - kernels: footprints to convolve with
    /// - band: maximum separation from the diagonal, in bins (exclusive)
    /// - max_nans_tolerated: a pixel is kept only when every kernel has fewer unusable cells
    pub fn new(
        matrix: &'a M,
        expected: &'a ExpectedTable,
        kernels: &'a [Kernel],
        band: usize,
        max_nans_tolerated: u32,
    ) -> Self {
        TileScorer {
            matrix,
            expected,
            kernels,
            band,
            max_nans_tolerated,
        }
    }

    pub fn from_params(matrix: &'a M, expected: &'a ExpectedTable, params: &'a CallingParams) -> Self {
        TileScorer::new(
            matrix,
            expected,
            &params.kernels,
            params.band_bins,
            params.max_nans_tolerated,
        )
    }

    ///
    /// Score every core pixel of `tile` that survives the band and NaN filters.
    ///
    /// Pixels come out sorted by `(bin1_id, bin2_id)`.
    ///
    pub fn score(&self, tile: &Tile) -> Result<Vec<ScoredPixel>> {
        let chrom = self.matrix.chromosome(&tile.chrom).ok_or_else(|| {
            DotsError::InvalidParameter(format!("tile {} names an unknown chromosome", tile))
        })?;
        let profile = self.expected.get(&tile.chrom).ok_or_else(|| {
            ValidationError::ChromosomeMismatch {
                resource: "contact matrix".to_string(),
                reference: "expected table".to_string(),
                missing: vec![tile.chrom.clone()],
            }
        })?;

        let blocks = self.fetch(tile, profile.view())?;
        let chrom_name: Arc<str> = Arc::from(chrom.name.as_str());

        let mut pixels = Vec::new();
        for bin1 in tile.core_rows.clone() {
            for bin2 in tile.core_cols.clone() {
                if bin2 <= bin1 || bin2 - bin1 >= self.band {
                    continue;
                }
                let r = bin1 - tile.rows.start;
                let c = bin2 - tile.cols.start;

                let weight = blocks.row_weights[r] * blocks.col_weights[c];
                let expected_raw = blocks.expected[[r, c]] / weight;

                let mut kernels = BTreeMap::new();
                let mut keep = true;
                for kernel in self.kernels {
                    let (value, nan_count) = convolve(kernel, &blocks, (r, c), expected_raw);
                    if nan_count >= self.max_nans_tolerated || !value.is_finite() {
                        keep = false;
                        break;
                    }
                    kernels.insert(kernel.kind, KernelScores {
                        value,
                        nan_count,
                        pvalue: 0.0,
                        qvalue: None,
                    });
                }
                if !keep {
                    continue;
                }

                let observed = blocks.observed[[r, c]] as u32;
                for scores in kernels.values_mut() {
                    scores.pvalue = poisson_sf(observed as u64, scores.value);
                }

                let coords1 = self.matrix.bin_coords(chrom, bin1);
                let coords2 = self.matrix.bin_coords(chrom, bin2);
                pixels.push(ScoredPixel {
                    bin1_id: bin1,
                    bin2_id: bin2,
                    chrom1: chrom_name.clone(),
                    start1: coords1.start,
                    end1: coords1.end,
                    chrom2: chrom_name.clone(),
                    start2: coords2.start,
                    end2: coords2.end,
                    observed,
                    expected: expected_raw,
                    kernels,
                });
            }
        }

        debug!("Tile {}: {} pixels scored", tile, pixels.len());
        Ok(pixels)
    }

    fn fetch(&self, tile: &Tile, view: ExpectedView<'_>) -> Result<TileBlocks> {
        let observed = self.matrix.observed(tile.rows.clone(), tile.cols.clone())?;
        if let Some(bad) = observed
            .iter()
            .find(|v| !v.is_finite() || **v < 0.0 || v.fract() != 0.0 || **v > u32::MAX as f64)
        {
            return Err(DotsError::DataIntegrity(format!(
                "tile {} holds a non-integer observed count: {}",
                tile, bad
            )));
        }

        // only offsets matter, so global bin ids index the profile directly
        let expected = view.block(tile.rows.clone(), tile.cols.clone());
        let row_weights = self.matrix.weights(tile.rows.clone())?;
        let col_weights = self.matrix.weights(tile.cols.clone())?;

        // cells strictly below the diagonal are mirrored contacts and count as unusable
        let (row0, col0) = (tile.rows.start, tile.cols.start);
        let valid = Array2::from_shape_fn(observed.dim(), |(r, c)| {
            let w = row_weights[r] * col_weights[c];
            col0 + c >= row0 + r && w.is_finite() && w > 0.0 && expected[[r, c]].is_finite()
        });
        let balanced_observed = Array2::from_shape_fn(observed.dim(), |(r, c)| {
            if valid[[r, c]] {
                observed[[r, c]] * row_weights[r] * col_weights[c]
            } else {
                0.0
            }
        });
        let balanced_expected =
            Array2::from_shape_fn(observed.dim(), |(r, c)| if valid[[r, c]] { expected[[r, c]] } else { 0.0 });

        Ok(TileBlocks {
            observed,
            expected,
            balanced_observed,
            balanced_expected,
            valid,
            row_weights,
            col_weights,
        })
    }
}

// locally-adjusted expected and NaN count of one kernel at (r, c)
fn convolve(
    kernel: &Kernel,
    blocks: &TileBlocks,
    (r, c): (usize, usize),
    expected_raw: f64,
) -> (f64, u32) {
    let (n_rows, n_cols) = blocks.valid.dim();
    let mut kernel_observed = 0.0;
    let mut kernel_expected = 0.0;
    let mut nan_count = 0;

    for &(dy, dx, k) in kernel.footprint() {
        let rr = r as isize + dy;
        let cc = c as isize + dx;
        if rr < 0 || cc < 0 || rr as usize >= n_rows || cc as usize >= n_cols {
            nan_count += 1;
            continue;
        }
        let (rr, cc) = (rr as usize, cc as usize);
        if !blocks.valid[[rr, cc]] {
            nan_count += 1;
            continue;
        }
        kernel_observed += k * blocks.balanced_observed[[rr, cc]];
        kernel_expected += k * blocks.balanced_expected[[rr, cc]];
    }

    (expected_raw * kernel_observed / kernel_expected, nan_count)
}
