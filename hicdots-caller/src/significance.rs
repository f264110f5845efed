use std::cmp::Ordering;

use log::info;

use hicdots_core::models::{KernelHistograms, KernelKind, LambdaBins, LambdaHistogram, ScoredPixel};
use hicdots_core::{DotsError, QValueMethod, Result};

use crate::scoring::{ScoringOutcome, poisson_sf};

///
/// Benjamini-Hochberg step-up adjustment.
///
/// `q_i = min(1, min_{j >= rank_i} p_(j) * n / j)`; tied p-values share a q-value and
/// the result does not depend on input order. NaN p-values get `q = 1`.
///
pub fn benjamini_hochberg(pvalues: &[f64]) -> Vec<f64> {
    let n = pvalues.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| compare_pvalues(pvalues[*a], pvalues[*b]));

    let mut qvalues = vec![1.0; n];
    let mut running = 1.0f64;
    for (rank0, &i) in order.iter().enumerate().rev() {
        let p = pvalues[i];
        if p.is_nan() {
            continue;
        }
        let candidate = p * n as f64 / (rank0 + 1) as f64;
        running = running.min(candidate);
        qvalues[i] = running;
    }
    qvalues
}

fn compare_pvalues(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

///
/// Q-values of one lambda chunk, indexed by observed count.
///
/// Every hypothesis of the chunk is modelled as Poisson with the chunk's representative
/// rate, so `p(o)` only depends on the observed count `o` and the number of hypotheses
/// at least as significant is the number with an observed count `>= o`.
///
pub fn lambda_chunk_qvalues(counts: &[u64], lambda: f64) -> Vec<f64> {
    let n: u64 = counts.iter().sum();
    let mut qvalues = vec![1.0; counts.len()];
    if n == 0 {
        return qvalues;
    }

    // walk from the least significant (smallest observed) upwards
    let mut at_least = n;
    let mut running = 1.0f64;
    for (observed, count) in counts.iter().enumerate() {
        if *count > 0 {
            let p = poisson_sf(observed as u64, lambda);
            running = running.min(p * n as f64 / at_least as f64);
        }
        qvalues[observed] = running;
        at_least -= count;
    }
    qvalues
}

///
/// Multiple-hypothesis testing over the genome-wide scoring outcome.
///
#[derive(Debug, Clone)]
pub struct SignificanceTester {
    method: QValueMethod,
    bins: LambdaBins,
}

impl SignificanceTester {
    pub fn new(method: QValueMethod, bins: LambdaBins) -> Self {
        SignificanceTester { method, bins }
    }

    ///
    /// Assign a q-value for every kernel of every scored pixel.
    ///
    /// Refuses to run on a partial outcome: q-values depend on all hypotheses.
    ///
    pub fn apply(&self, outcome: &mut ScoringOutcome) -> Result<()> {
        if !outcome.is_complete() {
            return Err(DotsError::IncompleteStage {
                stage: "significance testing",
                requires: "scoring of every tile",
            });
        }

        for kind in KernelKind::ALL {
            match self.method {
                QValueMethod::GenomeWide => self.genome_wide(kind, &mut outcome.pixels),
                QValueMethod::LambdaChunked => {
                    self.lambda_chunked(kind, &mut outcome.pixels, &outcome.histograms)?
                }
            }
        }

        info!(
            "Assigned {} q-values to {} pixels",
            self.method,
            outcome.pixels.len()
        );
        Ok(())
    }

    fn genome_wide(&self, kind: KernelKind, pixels: &mut [ScoredPixel]) {
        let tested: Vec<usize> = (0..pixels.len())
            .filter(|i| pixels[*i].scores(kind).is_some())
            .collect();
        let pvalues: Vec<f64> = tested
            .iter()
            .filter_map(|i| pixels[*i].scores(kind).map(|s| s.pvalue))
            .collect();
        let qvalues = benjamini_hochberg(&pvalues);

        for (i, q) in tested.into_iter().zip(qvalues) {
            if let Some(scores) = pixels[i].kernels.get_mut(&kind) {
                scores.qvalue = Some(q.min(1.0));
            }
        }
    }

    fn lambda_chunked(
        &self,
        kind: KernelKind,
        pixels: &mut [ScoredPixel],
        histograms: &KernelHistograms,
    ) -> Result<()> {
        let Some(histogram) = histograms.get(kind) else {
            if pixels.iter().any(|p| p.scores(kind).is_some()) {
                return Err(DotsError::IncompleteStage {
                    stage: "lambda-chunked significance testing",
                    requires: "lambda histograms of every kernel",
                });
            }
            return Ok(());
        };
        let chunks = self.chunk_qvalues(histogram);

        for pixel in pixels.iter_mut() {
            let observed = pixel.observed as usize;
            let Some(scores) = pixel.kernels.get_mut(&kind) else {
                continue;
            };
            let q = self
                .bins
                .bin_of(scores.value)
                .and_then(|bin| chunks.get(bin))
                .and_then(|chunk| chunk.get(observed))
                .copied()
                .ok_or(DotsError::IncompleteStage {
                    stage: "lambda-chunked significance testing",
                    requires: "histograms covering every scored pixel",
                })?;
            scores.qvalue = Some(q);
        }
        Ok(())
    }

    fn chunk_qvalues(&self, histogram: &LambdaHistogram) -> Vec<Vec<f64>> {
        (0..histogram.n_bins())
            .map(|k| lambda_chunk_qvalues(histogram.bin(k), self.bins.representative(k)))
            .collect()
    }
}

/// Pixels whose q-value is at most `fdr` for every kernel.
pub fn fdr_compliant(pixels: &[ScoredPixel], fdr: f64) -> Vec<ScoredPixel> {
    pixels
        .iter()
        .filter(|p| p.complies_with_fdr(fdr))
        .cloned()
        .collect()
}
