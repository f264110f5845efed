use log::info;

use hicdots_core::models::{ContactMatrix, ExpectedTable};
use hicdots_core::{Result, ValidationError, kernel_params_for_resolution};

///
/// Cross-check a contact matrix against an expected table before any work is scheduled.
///
/// Checks, in order: the resolution is supported, every chromosome of the expected
/// table exists in the matrix, every analysed chromosome has an expected profile, and
/// bin counts agree for every chromosome the two inputs share.
///
/// # Arguments
/// - matrix: the contact matrix
/// - expected: the expected table
/// - chromosomes: chromosomes to analyse; every matrix chromosome when `None`
///
/// Returns the validated chromosome list, in matrix order.
pub fn validate_inputs<M: ContactMatrix + ?Sized>(
    matrix: &M,
    expected: &ExpectedTable,
    chromosomes: Option<&[String]>,
) -> Result<Vec<String>> {
    kernel_params_for_resolution(matrix.bin_size())?;

    let matrix_chroms: Vec<&str> = matrix.chromosomes().iter().map(|c| c.name.as_str()).collect();

    let missing: Vec<String> = expected
        .chromosomes()
        .into_iter()
        .filter(|c| !matrix_chroms.contains(c))
        .map(String::from)
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::ChromosomeMismatch {
            resource: "expected table".to_string(),
            reference: "contact matrix".to_string(),
            missing,
        }
        .into());
    }

    let requested: Vec<String> = match chromosomes {
        Some(list) => {
            let unknown: Vec<String> = list
                .iter()
                .filter(|c| !matrix_chroms.contains(&c.as_str()))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                return Err(ValidationError::ChromosomeMismatch {
                    resource: "requested chromosomes".to_string(),
                    reference: "contact matrix".to_string(),
                    missing: unknown,
                }
                .into());
            }
            // keep matrix order
            matrix_chroms
                .iter()
                .filter(|c| list.iter().any(|l| l == *c))
                .map(|c| c.to_string())
                .collect()
        }
        None => matrix_chroms.iter().map(|c| c.to_string()).collect(),
    };

    let without_profile: Vec<String> = requested
        .iter()
        .filter(|c| expected.get(c).is_none())
        .cloned()
        .collect();
    if !without_profile.is_empty() {
        return Err(ValidationError::ChromosomeMismatch {
            resource: "contact matrix".to_string(),
            reference: "expected table".to_string(),
            missing: without_profile,
        }
        .into());
    }

    // every chromosome shared by both inputs, analysed or not
    for name in expected.chromosomes() {
        if let (Some(chrom), Some(profile)) = (matrix.chromosome(name), expected.get(name)) {
            if chrom.n_bins() != profile.len() {
                return Err(ValidationError::BinCountMismatch {
                    chrom: name.to_string(),
                    expected_bins: profile.len(),
                    matrix_bins: chrom.n_bins(),
                }
                .into());
            }
        }
    }

    info!(
        "Validated {} chromosomes at {} bp resolution",
        requested.len(),
        matrix.bin_size()
    );
    Ok(requested)
}
