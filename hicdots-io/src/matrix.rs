use std::io::BufRead;
use std::path::Path;

use fxhash::FxHashMap;
use log::{info, warn};

use hicdots_core::models::SparseContactMatrix;
use hicdots_core::utils::{get_dynamic_reader, read_tsv_header};
use hicdots_core::{DotsError, Result};

use crate::consts::*;
use crate::parse::{field, parse_count, parse_float, parse_int, required_column};

///
/// The bins table of a contact matrix: resolution, chromosome sizes in genome order
/// and one balancing weight per bin.
///
#[derive(Debug, Clone, PartialEq)]
pub struct BinTable {
    pub bin_size: u64,
    pub chrom_sizes: Vec<(String, u64)>,
    pub weights: Vec<f64>,
}

impl BinTable {
    pub fn n_bins(&self) -> usize {
        self.weights.len()
    }
}

///
/// Read a bins table with columns `chrom`, `start`, `end` and the balancing weight
/// column `weight_name`. Row order defines the global bin ids.
///
pub fn read_bins<P: AsRef<Path>>(path: P, weight_name: &str) -> Result<BinTable> {
    let reader = get_dynamic_reader(path.as_ref())?;
    parse_bins(reader, weight_name)
}

pub fn parse_bins<R: BufRead>(mut reader: R, weight_name: &str) -> Result<BinTable> {
    let header = read_tsv_header(&mut reader)?
        .ok_or_else(|| DotsError::DataIntegrity("bins table is empty".to_string()))?;

    let chrom_col = required_column(&header, BINS_CHROM_COL, "bins table")?;
    let start_col = required_column(&header, BINS_START_COL, "bins table")?;
    let end_col = required_column(&header, BINS_END_COL, "bins table")?;
    let weight_col = required_column(&header, weight_name, "bins table")?;

    let mut bins: Vec<(String, u64, u64)> = Vec::new();
    let mut weights = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let line_no = line_no + 2;

        let chrom = field(&fields, chrom_col, line_no)?;
        let start = parse_int(field(&fields, start_col, line_no)?, BINS_START_COL, line_no)?;
        let end = parse_int(field(&fields, end_col, line_no)?, BINS_END_COL, line_no)?;
        let weight = parse_float(field(&fields, weight_col, line_no)?, weight_name, line_no)?;

        if end <= start {
            return Err(DotsError::DataIntegrity(format!(
                "line {}: bin {}:{}-{} is empty",
                line_no, chrom, start, end
            )));
        }
        bins.push((chrom.to_string(), start, end));
        weights.push(weight);
    }

    let bin_size = bins
        .iter()
        .map(|(_, start, end)| end - start)
        .max()
        .ok_or_else(|| DotsError::DataIntegrity("bins table has no rows".to_string()))?;

    // chromosome lengths, bin counts and a contiguity check, in order of first appearance
    let mut chrom_sizes: Vec<(String, u64)> = Vec::new();
    let mut chrom_bins: Vec<u64> = Vec::new();
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    let mut expected_start = 0;
    for (chrom, start, end) in &bins {
        let is_new = chrom_sizes.last().is_none_or(|(name, _)| name != chrom);
        if is_new {
            if seen.insert(chrom.clone(), chrom_sizes.len()).is_some() {
                return Err(DotsError::DataIntegrity(format!(
                    "bins of {} are not contiguous in the bins table",
                    chrom
                )));
            }
            chrom_sizes.push((chrom.clone(), 0));
            chrom_bins.push(0);
            expected_start = 0;
        }
        if *start != expected_start {
            return Err(DotsError::DataIntegrity(format!(
                "bins table is not a uniform {} bp binning: {}:{} follows {}",
                bin_size, chrom, start, expected_start
            )));
        }
        expected_start = *end;
        if let Some(last) = chrom_sizes.last_mut() {
            last.1 = *end;
        }
        if let Some(n_bins) = chrom_bins.last_mut() {
            *n_bins += 1;
        }
    }

    for ((chrom, size), n_bins) in chrom_sizes.iter().zip(&chrom_bins) {
        if size.div_ceil(bin_size) != *n_bins {
            return Err(DotsError::DataIntegrity(format!(
                "bins table is not a uniform {} bp binning of {} ({} bp in {} bins)",
                bin_size, chrom, size, n_bins
            )));
        }
    }

    Ok(BinTable {
        bin_size,
        chrom_sizes,
        weights,
    })
}

///
/// Read a pixels table with columns `bin1_id`, `bin2_id` and `count`.
///
/// Counts must be non-negative integers; anything else is a data-integrity error.
///
pub fn read_pixels<P: AsRef<Path>>(path: P) -> Result<Vec<(usize, usize, u32)>> {
    let reader = get_dynamic_reader(path.as_ref())?;
    parse_pixels(reader)
}

pub fn parse_pixels<R: BufRead>(mut reader: R) -> Result<Vec<(usize, usize, u32)>> {
    let header = read_tsv_header(&mut reader)?
        .ok_or_else(|| DotsError::DataIntegrity("pixels table is empty".to_string()))?;

    let bin1_col = required_column(&header, PIXELS_BIN1_COL, "pixels table")?;
    let bin2_col = required_column(&header, PIXELS_BIN2_COL, "pixels table")?;
    let count_col = required_column(&header, PIXELS_COUNT_COL, "pixels table")?;

    let mut pixels = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let line_no = line_no + 2;

        let bin1 = parse_int(field(&fields, bin1_col, line_no)?, PIXELS_BIN1_COL, line_no)?;
        let bin2 = parse_int(field(&fields, bin2_col, line_no)?, PIXELS_BIN2_COL, line_no)?;
        let count = parse_count(field(&fields, count_col, line_no)?, PIXELS_COUNT_COL, line_no)?;
        pixels.push((bin1 as usize, bin2 as usize, count));
    }

    Ok(pixels)
}

///
/// Load a contact matrix from a bins table and a pixels table.
///
/// # Arguments
/// - bins_path: bins table, see [read_bins]
/// - pixels_path: pixels table, see [read_pixels]
/// - weight_name: name of the balancing weight column
pub fn load_contact_matrix<P: AsRef<Path>>(
    bins_path: P,
    pixels_path: P,
    weight_name: &str,
) -> Result<SparseContactMatrix> {
    let bins = read_bins(&bins_path, weight_name)?;
    let pixels = read_pixels(&pixels_path)?;

    let masked = bins.weights.iter().filter(|w| !w.is_finite()).count();
    if masked == bins.n_bins() {
        warn!("Every bin of {} is masked", bins_path.as_ref().display());
    }
    info!(
        "Loaded {} bins at {} bp ({} masked) and {} pixels",
        bins.n_bins(),
        bins.bin_size,
        masked,
        pixels.len()
    );

    SparseContactMatrix::new(bins.bin_size, &bins.chrom_sizes, bins.weights, &pixels)
}
