use crate::models::pixel::ScoredPixel;

///
/// Cluster annotation carried by a centroid pixel.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterInfo {
    /// mean start1 of the members
    pub cstart1: f64,
    /// mean start2 of the members
    pub cstart2: f64,
    pub label: usize,
    pub size: usize,
}

///
/// The centroid of a cluster of FDR-compliant pixels, not yet enrichment-filtered.
///
#[derive(Debug, Clone, PartialEq)]
pub struct DotCandidate {
    pub pixel: ScoredPixel,
    pub cluster: ClusterInfo,
}

///
/// A centroid that passed every FDR and enrichment constraint.
///
#[derive(Debug, Clone, PartialEq)]
pub struct DotCall(pub DotCandidate);

impl DotCall {
    pub fn pixel(&self) -> &ScoredPixel {
        &self.0.pixel
    }

    pub fn cluster(&self) -> &ClusterInfo {
        &self.0.cluster
    }
}
