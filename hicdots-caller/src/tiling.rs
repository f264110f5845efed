use std::ops::Range;

use hicdots_core::models::{Chromosome, Tile};

///
/// Partitions the near-diagonal band of every analysed chromosome into tiles.
///
/// Cores are `tile_size` squares over the upper triangle; each tile is padded by the
/// kernel half-width (clipped to the chromosome) so that core pixels have full
/// convolution context. Tiles whose core holds no upper-triangle pixel closer to the
/// diagonal than `band` are skipped. Cores never overlap, so every pixel in the band is
/// reported by exactly one tile.
///
#[derive(Debug, Clone)]
pub struct TileGenerator {
    chromosomes: Vec<Chromosome>,
    tile_size: usize,
    pad: usize,
    band: usize,
}

impl TileGenerator {
    ///
    /// # Arguments
    /// - chromosomes: chromosomes to tile, with their global bin extents
    /// - tile_size: side of a tile core, in bins
    /// - pad: kernel half-width, in bins
    /// - band: maximum separation from the diagonal, in bins (exclusive)
    pub fn new(chromosomes: Vec<Chromosome>, tile_size: usize, pad: usize, band: usize) -> Self {
        TileGenerator {
            chromosomes,
            tile_size: tile_size.max(1),
            pad,
            band,
        }
    }

    /// A fresh pass over all tiles; may be called any number of times.
    pub fn iter(&self) -> impl Iterator<Item = Tile> + '_ {
        self.chromosomes
            .iter()
            .flat_map(move |chrom| self.chromosome_tiles(chrom))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    fn chromosome_tiles<'a>(&'a self, chrom: &'a Chromosome) -> impl Iterator<Item = Tile> + 'a {
        let extent = chrom.bins.clone();
        let n_tiles = extent.len().div_ceil(self.tile_size);

        (0..n_tiles).flat_map(move |i| {
            let core_rows = self.core(&extent, i);
            let mut row = Vec::new();
            for j in i..n_tiles {
                let core_cols = self.core(&extent, j);
                // separation of the closest pixel only grows with j
                if min_separation(&core_rows, &core_cols).max(1) >= self.band as isize {
                    break;
                }
                if max_separation(&core_rows, &core_cols) < 1 {
                    continue;
                }
                row.push(Tile {
                    chrom: chrom.name.clone(),
                    rows: self.padded(&extent, &core_rows),
                    cols: self.padded(&extent, &core_cols),
                    core_rows: core_rows.clone(),
                    core_cols,
                });
            }
            row
        })
    }

    fn core(&self, extent: &Range<usize>, index: usize) -> Range<usize> {
        let start = extent.start + index * self.tile_size;
        start..(start + self.tile_size).min(extent.end)
    }

    fn padded(&self, extent: &Range<usize>, core: &Range<usize>) -> Range<usize> {
        core.start.saturating_sub(self.pad).max(extent.start)..(core.end + self.pad).min(extent.end)
    }
}

// bin2 - bin1 over a core block, as signed offsets
fn min_separation(rows: &Range<usize>, cols: &Range<usize>) -> isize {
    cols.start as isize - (rows.end as isize - 1)
}

fn max_separation(rows: &Range<usize>, cols: &Range<usize>) -> isize {
    (cols.end as isize - 1) - rows.start as isize
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn chromosomes() -> Vec<Chromosome> {
        vec![
            Chromosome {
                name: "chr1".to_string(),
                length: 1_000,
                bins: 0..100,
            },
            Chromosome {
                name: "chr2".to_string(),
                length: 255,
                bins: 100..126,
            },
        ]
    }

    #[rstest]
    fn test_tiles_are_restartable(chromosomes: Vec<Chromosome>) {
        let generator = TileGenerator::new(chromosomes, 10, 3, 25);
        let first: Vec<Tile> = generator.iter().collect();
        let second: Vec<Tile> = generator.iter().collect();
        assert_eq!(first, second);
        assert_eq!(generator.count(), first.len());
    }

    #[rstest]
    fn test_tiles_stay_within_chromosome_and_padding(chromosomes: Vec<Chromosome>) {
        let pad = 3;
        let generator = TileGenerator::new(chromosomes.clone(), 10, pad, 25);
        for tile in generator.iter() {
            let chrom = chromosomes.iter().find(|c| c.name == tile.chrom).unwrap();
            assert!(tile.rows.start >= chrom.bins.start && tile.rows.end <= chrom.bins.end);
            assert!(tile.cols.start >= chrom.bins.start && tile.cols.end <= chrom.bins.end);
            assert!(tile.core_rows.start - tile.rows.start <= pad);
            assert!(tile.cols.end - tile.core_cols.end <= pad);
            assert!(tile.core_rows.start <= tile.core_cols.start);
        }
    }

    #[rstest]
    fn test_cores_partition_the_band(chromosomes: Vec<Chromosome>) {
        let band = 25;
        let generator = TileGenerator::new(chromosomes.clone(), 10, 3, band);

        let mut seen = HashSet::new();
        for tile in generator.iter() {
            for bin1 in tile.core_rows.clone() {
                for bin2 in tile.core_cols.clone() {
                    if bin2 > bin1 && bin2 - bin1 < band {
                        assert!(seen.insert((bin1, bin2)), "pixel reported twice");
                    }
                }
            }
        }

        let mut expected = 0;
        for chrom in &chromosomes {
            for bin1 in chrom.bins.clone() {
                for bin2 in bin1 + 1..chrom.bins.end {
                    if bin2 - bin1 < band {
                        expected += 1;
                        assert!(seen.contains(&(bin1, bin2)));
                    }
                }
            }
        }
        assert_eq!(seen.len(), expected);
    }

    #[rstest]
    fn test_far_tiles_are_skipped() {
        let chrom = Chromosome {
            name: "chr1".to_string(),
            length: 1_000,
            bins: 0..100,
        };
        // band of 5 bins never reaches beyond the neighbouring tile
        let generator = TileGenerator::new(vec![chrom], 10, 2, 5);
        for tile in generator.iter() {
            let i = (tile.core_rows.start) / 10;
            let j = (tile.core_cols.start) / 10;
            assert!(j == i || j == i + 1);
        }
        // 10 diagonal tiles + 9 off-diagonal neighbours
        assert_eq!(generator.count(), 19);
    }
}
