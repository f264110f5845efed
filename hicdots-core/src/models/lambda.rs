use std::collections::BTreeMap;
use std::fmt::{self, Display};

use crate::consts::{LAMBDA_BASE, LAMBDA_LOG_BINS};
use crate::models::kernel::KernelKind;

///
/// Log-spaced partition of the real line used to chunk hypotheses by locally-adjusted
/// expected.
///
/// Edges are `-inf, 1, b, b^2, ..., b^n, +inf`, bins are right-closed: bin `k` holds
/// `(edges[k], edges[k + 1]]`.
///
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaBins {
    edges: Vec<f64>,
}

impl LambdaBins {
    pub fn new(base: f64, n_log_bins: usize) -> Self {
        let mut edges = Vec::with_capacity(n_log_bins + 3);
        edges.push(f64::NEG_INFINITY);
        edges.extend((0..=n_log_bins).map(|k| base.powi(k as i32)));
        edges.push(f64::INFINITY);
        LambdaBins { edges }
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    ///
    /// Index of the bin holding `value`, `None` for NaN.
    ///
    pub fn bin_of(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        // first upper edge >= value
        Some(self.edges[1..].partition_point(|edge| *edge < value))
    }

    /// Lower and upper edge of bin `k`.
    pub fn bounds(&self, k: usize) -> (f64, f64) {
        (self.edges[k], self.edges[k + 1])
    }

    ///
    /// Poisson rate standing for every hypothesis of bin `k`: its upper edge, or the
    /// lower edge of the open last bin.
    ///
    pub fn representative(&self, k: usize) -> f64 {
        let (lower, upper) = self.bounds(k);
        if upper.is_finite() { upper } else { lower }
    }

    /// Column label of bin `k`, e.g. `(1.0, 1.26]`.
    pub fn label(&self, k: usize) -> String {
        let (lower, upper) = self.bounds(k);
        format!("({}, {}]", fmt_edge(lower), fmt_edge(upper))
    }
}

impl Default for LambdaBins {
    fn default() -> Self {
        LambdaBins::new(LAMBDA_BASE, LAMBDA_LOG_BINS)
    }
}

fn fmt_edge(edge: f64) -> String {
    if edge.is_infinite() {
        if edge > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if edge.fract() == 0.0 {
        format!("{:.1}", edge)
    } else {
        format!("{:.6}", edge)
    }
}

///
/// Per lambda bin, a dense vector of counts indexed by observed raw value.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaHistogram {
    counts: Vec<Vec<u64>>,
}

impl LambdaHistogram {
    pub fn new(n_bins: usize) -> Self {
        LambdaHistogram {
            counts: vec![Vec::new(); n_bins],
        }
    }

    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn add(&mut self, bin: usize, observed: u32) {
        let row = &mut self.counts[bin];
        let observed = observed as usize;
        if row.len() <= observed {
            row.resize(observed + 1, 0);
        }
        row[observed] += 1;
    }

    /// Counts of bin `k`; trailing zeros are never stored.
    pub fn bin(&self, k: usize) -> &[u64] {
        &self.counts[k]
    }

    /// Length of the longest count vector, i.e. max observed + 1.
    pub fn max_len(&self) -> usize {
        self.counts.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Zero-padded element-wise addition.
    pub fn merge(&mut self, other: &LambdaHistogram) {
        if self.counts.len() < other.counts.len() {
            self.counts.resize(other.counts.len(), Vec::new());
        }
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            if mine.len() < theirs.len() {
                mine.resize(theirs.len(), 0);
            }
            for (m, t) in mine.iter_mut().zip(theirs) {
                *m += t;
            }
        }
    }
}

///
/// One [LambdaHistogram] per kernel.
///
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KernelHistograms {
    histograms: BTreeMap<KernelKind, LambdaHistogram>,
}

impl KernelHistograms {
    pub fn new(kinds: &[KernelKind], n_bins: usize) -> Self {
        KernelHistograms {
            histograms: kinds
                .iter()
                .map(|kind| (*kind, LambdaHistogram::new(n_bins)))
                .collect(),
        }
    }

    pub fn get(&self, kind: KernelKind) -> Option<&LambdaHistogram> {
        self.histograms.get(&kind)
    }

    pub fn get_mut(&mut self, kind: KernelKind) -> Option<&mut LambdaHistogram> {
        self.histograms.get_mut(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KernelKind, &LambdaHistogram)> {
        self.histograms.iter()
    }

    pub fn merge(&mut self, other: &KernelHistograms) {
        for (kind, theirs) in &other.histograms {
            self.histograms
                .entry(*kind)
                .or_insert_with(|| LambdaHistogram::new(theirs.n_bins()))
                .merge(theirs);
        }
    }
}

impl Display for LambdaBins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LambdaBins({} bins)", self.n_bins())
    }
}
