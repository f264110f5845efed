use hicdots_core::{DotsError, Result};

pub(crate) fn required_column(header: &[String], name: &str, table: &str) -> Result<usize> {
    header.iter().position(|c| c == name).ok_or_else(|| {
        DotsError::DataIntegrity(format!("{} is missing the `{}` column", table, name))
    })
}

pub(crate) fn field<'a>(fields: &[&'a str], col: usize, line: usize) -> Result<&'a str> {
    fields.get(col).copied().ok_or_else(|| {
        DotsError::DataIntegrity(format!(
            "line {}: expected at least {} fields, found {}",
            line,
            col + 1,
            fields.len()
        ))
    })
}

pub(crate) fn parse_int(field: &str, column: &str, line: usize) -> Result<u64> {
    field.trim().parse::<u64>().map_err(|_| {
        DotsError::DataIntegrity(format!(
            "line {}: column `{}` must hold a non-negative integer, found `{}`",
            line, column, field
        ))
    })
}

/// Empty fields and `NA` read as NaN.
pub(crate) fn parse_float(field: &str, column: &str, line: usize) -> Result<f64> {
    let field = field.trim();
    if field.is_empty() || field.eq_ignore_ascii_case("na") {
        return Ok(f64::NAN);
    }
    field.parse::<f64>().map_err(|_| {
        DotsError::DataIntegrity(format!(
            "line {}: column `{}` must hold a float, found `{}`",
            line, column, field
        ))
    })
}

///
/// Parse a raw contact count. Counts written as floats are accepted only when they
/// hold an exact non-negative integer.
///
pub(crate) fn parse_count(field: &str, column: &str, line: usize) -> Result<u32> {
    let field = field.trim();
    if let Ok(count) = field.parse::<u32>() {
        return Ok(count);
    }
    match field.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 => {
            Ok(value as u32)
        }
        _ => Err(DotsError::DataIntegrity(format!(
            "line {}: column `{}` must hold a non-negative integer count, found `{}`",
            line, column, field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::*;

    #[rstest]
    #[case("3", Some(3))]
    #[case("3.0", Some(3))]
    #[case("0", Some(0))]
    #[case("2.5", None)]
    #[case("-1", None)]
    #[case("NaN", None)]
    #[case("x", None)]
    fn test_parse_count(#[case] field: &str, #[case] expected: Option<u32>) {
        assert_eq!(parse_count(field, "count", 2).ok(), expected);
    }

    #[rstest]
    fn test_parse_float_missing_values() {
        assert!(parse_float("", "weight", 2).unwrap().is_nan());
        assert!(parse_float("NA", "weight", 2).unwrap().is_nan());
        assert_eq!(parse_float("0.5", "weight", 2).unwrap(), 0.5);
    }
}
