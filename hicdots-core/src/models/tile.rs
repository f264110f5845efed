use std::fmt::{self, Display};
use std::ops::Range;

///
/// Unit of parallel work: a rectangular block of one chromosome's cis map.
///
/// `rows`/`cols` are the fetched ranges (core plus kernel padding, clipped to the
/// chromosome), `core_rows`/`core_cols` the pixels this tile is responsible for.
/// All ranges are global bin ids.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tile {
    pub chrom: String,
    pub rows: Range<usize>,
    pub cols: Range<usize>,
    pub core_rows: Range<usize>,
    pub core_cols: Range<usize>,
}

impl Tile {
    pub fn new(
        chrom: &str,
        rows: Range<usize>,
        cols: Range<usize>,
        core_rows: Range<usize>,
        core_cols: Range<usize>,
    ) -> Self {
        Tile {
            chrom: chrom.to_string(),
            rows,
            cols,
            core_rows,
            core_cols,
        }
    }

    /// A tile that reports every pixel it fetches.
    pub fn unpadded(chrom: &str, rows: Range<usize>, cols: Range<usize>) -> Self {
        Tile::new(chrom, rows.clone(), cols.clone(), rows, cols)
    }
}

impl Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:[{}-{})x[{}-{})",
            self.chrom, self.rows.start, self.rows.end, self.cols.start, self.cols.end
        )
    }
}
