use log::info;

use hicdots_core::models::{DotCall, DotCandidate, KernelKind};
use hicdots_core::{DotsError, EnrichmentThresholds, Result, ValidationError};

///
/// Final fold-enrichment and orphan filter over cluster centroids.
///
#[derive(Debug, Clone)]
pub struct EnrichmentFilter {
    thresholds: EnrichmentThresholds,
}

impl EnrichmentFilter {
    pub fn new(thresholds: EnrichmentThresholds) -> Self {
        EnrichmentFilter { thresholds }
    }

    ///
    /// Whether a centroid passes every constraint:
    ///
    /// - `obs > factor_2 * la(lowleft)` and `obs > factor_2 * la(donut)`
    /// - `obs > factor_1 * la(vertical)` and `obs > factor_1 * la(horizontal)`
    /// - `obs > factor_3 * la(lowleft)` or `obs > factor_3 * la(donut)`
    /// - `size > 1` or the four q-values sum to at most `orphan_fdr`
    ///
    pub fn accepts(&self, candidate: &DotCandidate) -> Result<bool> {
        let t = &self.thresholds;
        let pixel = &candidate.pixel;
        let observed = pixel.observed as f64;

        let la = |kind: KernelKind| -> Result<f64> {
            pixel
                .la_exp(kind)
                .ok_or_else(|| ValidationError::MissingKernel(kind.to_string()).into())
        };
        let q = |kind: KernelKind| -> Result<f64> {
            pixel.qvalue(kind).ok_or(DotsError::IncompleteStage {
                stage: "enrichment filtering",
                requires: "significance testing",
            })
        };

        let (donut, vertical, horizontal, lowleft) = (
            la(KernelKind::Donut)?,
            la(KernelKind::Vertical)?,
            la(KernelKind::Horizontal)?,
            la(KernelKind::Lowleft)?,
        );
        let qsum = q(KernelKind::Donut)? + q(KernelKind::Vertical)? + q(KernelKind::Horizontal)? + q(KernelKind::Lowleft)?;

        let enriched_donut_lowleft = observed > t.factor_2 * lowleft && observed > t.factor_2 * donut;
        let enriched_strips = observed > t.factor_1 * vertical && observed > t.factor_1 * horizontal;
        let strongly_enriched = observed > t.factor_3 * lowleft || observed > t.factor_3 * donut;
        let not_orphan = candidate.cluster.size > 1 || qsum <= t.orphan_fdr;

        Ok(enriched_donut_lowleft && enriched_strips && strongly_enriched && not_orphan)
    }

    pub fn filter(&self, candidates: Vec<DotCandidate>) -> Result<Vec<DotCall>> {
        let total = candidates.len();
        let mut calls = Vec::new();
        for candidate in candidates {
            if self.accepts(&candidate)? {
                calls.push(DotCall(candidate));
            }
        }
        info!("{} of {} cluster centroids pass the enrichment filter", calls.len(), total);
        Ok(calls)
    }
}
