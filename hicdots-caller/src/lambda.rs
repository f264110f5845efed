use hicdots_core::models::{KernelHistograms, KernelKind, LambdaBins, ScoredPixel};

///
/// Builds per-kernel lambda-chunked histograms of observed counts.
///
/// Each tile produces a partial [KernelHistograms]; partials are combined with
/// [LambdaHistogramAccumulator::merge] in any order.
///
#[derive(Debug, Clone)]
pub struct LambdaHistogramAccumulator {
    bins: LambdaBins,
    kinds: Vec<KernelKind>,
}

impl LambdaHistogramAccumulator {
    pub fn new(bins: LambdaBins, kinds: &[KernelKind]) -> Self {
        LambdaHistogramAccumulator {
            bins,
            kinds: kinds.to_vec(),
        }
    }

    pub fn empty(&self) -> KernelHistograms {
        KernelHistograms::new(&self.kinds, self.bins.n_bins())
    }

    ///
    /// Histogram a batch of scored pixels. Pixels without a score for a kernel, or
    /// with a NaN background, are not counted for that kernel.
    ///
    pub fn accumulate(&self, pixels: &[ScoredPixel]) -> KernelHistograms {
        let mut histograms = self.empty();
        for kind in &self.kinds {
            let Some(histogram) = histograms.get_mut(*kind) else {
                continue;
            };
            for pixel in pixels {
                let bin = pixel.la_exp(*kind).and_then(|value| self.bins.bin_of(value));
                if let Some(bin) = bin {
                    histogram.add(bin, pixel.observed);
                }
            }
        }
        histograms
    }

    /// Fold `partial` into `total`.
    pub fn merge(&self, total: &mut KernelHistograms, partial: &KernelHistograms) {
        total.merge(partial);
    }
}
