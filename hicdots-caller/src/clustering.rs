use std::sync::Arc;

use fxhash::FxHashMap;
use log::info;
use petgraph::unionfind::UnionFind;

use hicdots_core::models::{ClusterInfo, DotCandidate, ScoredPixel};
use hicdots_core::{DotsError, Result};

///
/// Groups FDR-compliant pixels into clusters of mutually nearby pixels and reduces
/// each cluster to its centroid.
///
/// Two pixels of the same chromosome pair are linked when the Euclidean distance
/// between their `(start1, start2)` is at most `radius` bp; clusters are the connected
/// components of that graph. The centroid is the member with the highest observed
/// count, ties going to the lowest `(bin1_id, bin2_id)`.
///
#[derive(Debug, Clone)]
pub struct Clusterer {
    radius: u64,
}

impl Clusterer {
    pub fn new(radius: u64) -> Self {
        Clusterer { radius }
    }

    ///
    /// Member indices of every cluster.
    ///
    /// Clusters are ordered by chromosome pair, then by their smallest member; members
    /// are sorted by `(bin1_id, bin2_id)`. Every input pixel lands in exactly one cluster.
    ///
    pub fn clusters(&self, pixels: &[ScoredPixel]) -> Result<Vec<Vec<usize>>> {
        if let Some(untested) = pixels.iter().find(|p| !p.is_tested()) {
            return Err(DotsError::IncompleteStage {
                stage: "clustering",
                requires: if untested.kernels.is_empty() {
                    "scoring"
                } else {
                    "significance testing"
                },
            });
        }

        let mut groups: FxHashMap<(Arc<str>, Arc<str>), Vec<usize>> = FxHashMap::default();
        for (i, pixel) in pixels.iter().enumerate() {
            groups
                .entry((pixel.chrom1.clone(), pixel.chrom2.clone()))
                .or_default()
                .push(i);
        }

        let mut groups: Vec<Vec<usize>> = groups.into_values().collect();
        for members in groups.iter_mut() {
            members.sort_by_key(|i| (pixels[*i].bin1_id, pixels[*i].bin2_id));
        }
        groups.sort_by_key(|members| {
            let first = &pixels[members[0]];
            (first.bin1_id, first.bin2_id, first.chrom1.clone(), first.chrom2.clone())
        });

        let mut clusters = Vec::new();
        for members in groups {
            clusters.extend(self.components(pixels, &members));
        }
        Ok(clusters)
    }

    ///
    /// Cluster the pixels and annotate each centroid with its cluster.
    ///
    pub fn cluster(&self, pixels: &[ScoredPixel]) -> Result<Vec<DotCandidate>> {
        let clusters = self.clusters(pixels)?;

        let mut candidates = Vec::with_capacity(clusters.len());
        let mut label = 0;
        let mut previous_pair: Option<(Arc<str>, Arc<str>)> = None;
        for members in &clusters {
            let centroid = centroid(pixels, members);

            let pair = (centroid.chrom1.clone(), centroid.chrom2.clone());
            if previous_pair.as_ref() != Some(&pair) {
                label = 0;
                previous_pair = Some(pair);
            }

            let size = members.len() as f64;
            let cstart1 = members.iter().map(|i| pixels[*i].start1 as f64).sum::<f64>() / size;
            let cstart2 = members.iter().map(|i| pixels[*i].start2 as f64).sum::<f64>() / size;

            candidates.push(DotCandidate {
                pixel: centroid.clone(),
                cluster: ClusterInfo {
                    cstart1,
                    cstart2,
                    label,
                    size: members.len(),
                },
            });
            label += 1;
        }

        info!(
            "Clustered {} pixels into {} clusters (radius {} bp)",
            pixels.len(),
            candidates.len(),
            self.radius
        );
        Ok(candidates)
    }

    // connected components of one chromosome pair; `members` sorted by (bin1, bin2)
    fn components(&self, pixels: &[ScoredPixel], members: &[usize]) -> Vec<Vec<usize>> {
        let radius = self.radius as u128;
        let mut union_find = UnionFind::<usize>::new(members.len());

        for (a, &i) in members.iter().enumerate() {
            let first = &pixels[i];
            for (b, &j) in members.iter().enumerate().skip(a + 1) {
                let second = &pixels[j];
                let d1 = second.start1.abs_diff(first.start1) as u128;
                // sorted by start1, nothing further can be in reach
                if d1 > radius {
                    break;
                }
                let d2 = second.start2.abs_diff(first.start2) as u128;
                if d1 * d1 + d2 * d2 <= radius * radius {
                    union_find.union(a, b);
                }
            }
        }

        // label clusters by their smallest member
        let mut components: Vec<Vec<usize>> = Vec::new();
        let mut component_of: FxHashMap<usize, usize> = FxHashMap::default();
        for (a, &i) in members.iter().enumerate() {
            let root = union_find.find(a);
            let index = *component_of.entry(root).or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[index].push(i);
        }
        components
    }
}

fn centroid<'a>(pixels: &'a [ScoredPixel], members: &[usize]) -> &'a ScoredPixel {
    let mut best = &pixels[members[0]];
    for i in &members[1..] {
        // members are sorted, so only a strictly larger count displaces the current best
        if pixels[*i].observed > best.observed {
            best = &pixels[*i];
        }
    }
    best
}
