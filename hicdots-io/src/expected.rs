use std::io::BufRead;
use std::path::Path;

use fxhash::FxHashMap;
use log::debug;

use hicdots_core::models::{ExpectedProfile, ExpectedTable};
use hicdots_core::utils::{get_dynamic_reader, read_tsv_header};
use hicdots_core::{DotsError, Result};

use crate::consts::{EXPECTED_CHROM_COL, EXPECTED_DIAG_COL, EXPECTED_NVALID_COL, EXPECTED_REGION_COL};
use crate::parse::{field, parse_float, parse_int, required_column};

///
/// Read a cis expected table.
///
/// The header must carry `chrom` (or `region`), `diag`, `n_valid` and the requested
/// value column. Diagonals of every chromosome must be contiguous from zero.
///
/// # Arguments
/// - path: path to the table, optionally gzipped
/// - value_name: name of the expected column, e.g. `balanced.avg`
pub fn read_expected<P: AsRef<Path>>(path: P, value_name: &str) -> Result<ExpectedTable> {
    let reader = get_dynamic_reader(path.as_ref())?;
    parse_expected(reader, value_name)
}

pub fn parse_expected<R: BufRead>(mut reader: R, value_name: &str) -> Result<ExpectedTable> {
    let header = read_tsv_header(&mut reader)?
        .ok_or_else(|| DotsError::DataIntegrity("expected table is empty".to_string()))?;

    let chrom_col = header
        .iter()
        .position(|c| c == EXPECTED_CHROM_COL || c == EXPECTED_REGION_COL)
        .ok_or_else(|| {
            DotsError::DataIntegrity(format!(
                "expected table is missing the `{}` column",
                EXPECTED_CHROM_COL
            ))
        })?;
    let diag_col = required_column(&header, EXPECTED_DIAG_COL, "expected table")?;
    let n_valid_col = required_column(&header, EXPECTED_NVALID_COL, "expected table")?;
    let value_col = required_column(&header, value_name, "expected table")?;

    let mut order: Vec<String> = Vec::new();
    let mut rows: FxHashMap<String, Vec<(u64, u64, f64)>> = FxHashMap::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let line_no = line_no + 2;

        let chrom = field(&fields, chrom_col, line_no)?;
        let diag = parse_int(field(&fields, diag_col, line_no)?, EXPECTED_DIAG_COL, line_no)?;
        let n_valid = parse_int(field(&fields, n_valid_col, line_no)?, EXPECTED_NVALID_COL, line_no)?;
        let value = parse_float(field(&fields, value_col, line_no)?, value_name, line_no)?;

        if !rows.contains_key(chrom) {
            order.push(chrom.to_string());
        }
        rows.entry(chrom.to_string())
            .or_default()
            .push((diag, n_valid, value));
    }

    let mut profiles = Vec::with_capacity(order.len());
    for chrom in order {
        let mut diagonals = rows.remove(&chrom).unwrap_or_default();
        diagonals.sort_by_key(|(diag, _, _)| *diag);

        if let Some(pos) = diagonals
            .iter()
            .enumerate()
            .position(|(k, (diag, _, _))| *diag != k as u64)
        {
            return Err(DotsError::DataIntegrity(format!(
                "expected profile of {} is not contiguous: diagonal {} found at position {}",
                chrom, diagonals[pos].0, pos
            )));
        }

        let mut profile = ExpectedProfile::new(&chrom, diagonals.iter().map(|d| d.2).collect());
        profile.n_valid = diagonals.iter().map(|d| d.1).collect();
        debug!("Expected profile for {}: {} diagonals", chrom, profile.len());
        profiles.push(profile);
    }

    Ok(ExpectedTable::new(profiles))
}
