//! Small helpers over polars frames shared by the cleaner, the aggregator
//! and the report builders.

use std::collections::BTreeSet;

use flows_core::{FlowsError, Result};
use polars::prelude::*;

pub fn has_column(df: &DataFrame, column: &str) -> bool {
    df.get_column_names().contains(&column)
}

/// Fail with [`FlowsError::MissingColumn`] naming the first absent column.
pub fn require_columns(df: &DataFrame, table: &str, columns: &[&str]) -> Result<()> {
    match columns.iter().find(|c| !has_column(df, c)) {
        Some(missing) => Err(FlowsError::missing_column(table, *missing)),
        None => Ok(()),
    }
}

/// Sorted distinct non-null values of a string column.
pub fn distinct_strings(df: &DataFrame, column: &str) -> Result<BTreeSet<String>> {
    let series = df.column(column)?.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    Ok(values)
}

/// A column as `f64`, nulls and unparseable values read as zero.
pub fn numbers(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let series = df.column(column)?.cast(&DataType::Float64)?;
    let values = series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();
    Ok(values)
}

/// A column as strings, nulls read as empty.
pub fn strings(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let series = df.column(column)?.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect();
    Ok(values)
}

/// Replace nulls in `columns` with `0.0`.
pub fn fill_zero(columns: &[&str]) -> Vec<Expr> {
    columns
        .iter()
        .map(|c| col(c).fill_null(lit(0.0)).alias(c))
        .collect()
}

/// Conjunction of `is_not_null` over `columns`, or `None` when empty.
pub fn all_present(columns: &[&str]) -> Option<Expr> {
    columns
        .iter()
        .map(|c| col(c).is_not_null())
        .reduce(|a, b| a.and(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        DataFrame::new(vec![
            Series::new("Source", &[Some("Syria"), None, Some("Iraq"), Some("Syria")]),
            Series::new("Value", &[Some(300.0), Some(50.0), None, Some(5.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_require_columns_names_missing_column() {
        let df = sample();
        assert!(require_columns(&df, "sample", &["Source", "Value"]).is_ok());
        let err = require_columns(&df, "sample", &["Source", "Year"]).unwrap_err();
        assert_eq!(err.to_string(), "Missing column 'Year' in sample");
    }

    #[test]
    fn test_distinct_strings_skips_nulls() {
        let values = distinct_strings(&sample(), "Source").unwrap();
        assert_eq!(values.into_iter().collect::<Vec<_>>(), vec!["Iraq", "Syria"]);
    }

    #[test]
    fn test_numbers_and_strings() {
        let df = sample();
        assert_eq!(numbers(&df, "Value").unwrap(), vec![300.0, 50.0, 0.0, 5.0]);
        assert_eq!(strings(&df, "Source").unwrap()[1], "");
        assert!(numbers(&df, "Nope").is_err());
    }

    #[test]
    fn test_fill_zero_and_all_present() {
        let df = sample()
            .lazy()
            .filter(all_present(&["Source"]).unwrap())
            .with_columns(fill_zero(&["Value"]))
            .collect()
            .unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(numbers(&df, "Value").unwrap(), vec![300.0, 0.0, 5.0]);
        assert!(all_present(&[]).is_none());
    }
}
