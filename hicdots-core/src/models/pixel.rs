use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::Result;
use crate::models::kernel::KernelKind;

///
/// Convolution statistics of one kernel at one pixel.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelScores {
    /// locally-adjusted expected
    pub value: f64,
    pub nan_count: u32,
    pub pvalue: f64,
    /// set by the significance test, genome-wide
    pub qvalue: Option<f64>,
}

///
/// A pixel of a cis map that survived the band and NaN filters, annotated with its
/// genomic coordinates and per-kernel statistics.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPixel {
    pub bin1_id: usize,
    pub bin2_id: usize,
    pub chrom1: Arc<str>,
    pub start1: u64,
    pub end1: u64,
    pub chrom2: Arc<str>,
    pub start2: u64,
    pub end2: u64,
    pub observed: u32,
    pub expected: f64,
    pub kernels: BTreeMap<KernelKind, KernelScores>,
}

impl ScoredPixel {
    pub fn scores(&self, kind: KernelKind) -> Option<&KernelScores> {
        self.kernels.get(&kind)
    }

    pub fn la_exp(&self, kind: KernelKind) -> Option<f64> {
        self.kernels.get(&kind).map(|s| s.value)
    }

    pub fn qvalue(&self, kind: KernelKind) -> Option<f64> {
        self.kernels.get(&kind).and_then(|s| s.qvalue)
    }

    /// True once the significance test has assigned a q-value for every kernel.
    pub fn is_tested(&self) -> bool {
        !self.kernels.is_empty() && self.kernels.values().all(|s| s.qvalue.is_some())
    }

    ///
    /// A pixel complies with FDR when its q-value is at most `fdr` for every kernel.
    /// Untested pixels never comply.
    ///
    pub fn complies_with_fdr(&self, fdr: f64) -> bool {
        self.is_tested()
            && self
                .kernels
                .values()
                .all(|s| s.qvalue.is_some_and(|q| q <= fdr))
    }
}

///
/// Destination for scored pixels as they come back from the workers.
///
/// Only the coordinating thread ever holds a sink, so appends are sequential.
///
pub trait PixelSink: Send {
    fn append(&mut self, pixels: &[ScoredPixel]) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
