//! Record cleaning for the six UNHCR source tables.
//!
//! All sources share one routine, [`clean_table`], driven by a [`CleanSpec`]
//! naming which columns hold countries and which hold counts.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use flows_core::countries::{is_geocodable, normalize_country};
use flows_core::Result;
use polars::prelude::*;
use tracing::debug;

use crate::frame::{all_present, distinct_strings, has_column};
use crate::reader::load_table;

// ── Column names ──────────────────────────────────────────────────────────────

pub const ASYLUM_COLUMN: &str = "Country / territory of asylum/residence";
pub const ORIGIN_COLUMN: &str = "Origin";
pub const YEAR_COLUMN: &str = "Year";
pub const SOURCE_COLUMN: &str = "Source";
pub const TARGET_COLUMN: &str = "Target";

// ── CleanSpec ─────────────────────────────────────────────────────────────────

/// Column configuration for one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanSpec {
    /// Short identifier, e.g. `"asylum_seekers"`.
    pub name: &'static str,
    /// File name inside the data directory.
    pub file_name: &'static str,
    /// Columns run through the country normalizer.
    pub country_columns: &'static [&'static str],
    /// Country columns whose rows are dropped when not geocodable.
    pub required_columns: &'static [&'static str],
    /// Columns coerced to numbers, missing values becoming zero.
    pub numeric_columns: &'static [&'static str],
}

impl CleanSpec {
    pub fn path_in(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.file_name)
    }
}

const ORIGIN_AND_ASYLUM: &[&str] = &[ASYLUM_COLUMN, ORIGIN_COLUMN];

pub const ASYLUM_SEEKERS: CleanSpec = CleanSpec {
    name: "asylum_seekers",
    file_name: "asylum_seekers.csv",
    country_columns: ORIGIN_AND_ASYLUM,
    required_columns: ORIGIN_AND_ASYLUM,
    numeric_columns: &[
        "Tota pending start-year",
        "of which UNHCR-assisted(start-year)",
        "Applied during year",
        "decisions_recognized",
        "decisions_other",
        "Rejected",
        "Otherwise closed",
        "Total decisions",
        "Total pending end-year",
        "of which UNHCR-assisted(end-year)",
    ],
};

pub const ASYLUM_SEEKERS_MONTHLY: CleanSpec = CleanSpec {
    name: "asylum_seekers_monthly",
    file_name: "asylum_seekers_monthly.csv",
    country_columns: ORIGIN_AND_ASYLUM,
    required_columns: ORIGIN_AND_ASYLUM,
    numeric_columns: &["Value"],
};

pub const PERSONS_OF_CONCERN: CleanSpec = CleanSpec {
    name: "persons_of_concern",
    file_name: "persons_of_concern.csv",
    country_columns: ORIGIN_AND_ASYLUM,
    required_columns: ORIGIN_AND_ASYLUM,
    numeric_columns: &[
        "Refugees (incl. refugee-like situations)",
        "Asylum-seekers (pending cases)",
        "Returned refugees",
        "Internally displaced persons (IDPs)",
        "Returned IDPs",
        "Stateless persons",
        "Others of concern",
        "Total Population",
    ],
};

/// Demographics carry no origin column; only the asylum country is required.
pub const DEMOGRAPHICS: CleanSpec = CleanSpec {
    name: "demographics",
    file_name: "demographics.csv",
    country_columns: &[ASYLUM_COLUMN],
    required_columns: &[ASYLUM_COLUMN],
    numeric_columns: &[
        "Female 0-4",
        "Female 5-11",
        "Female 5-17",
        "Female 12-17",
        "Female 18-59",
        "Female 60+",
        "F: Unknown",
        "F: Total",
        "Male 0-4",
        "Male 5-11",
        "Male 5-17",
        "Male 12-17",
        "Male 18-59",
        "Male 60+",
        "M: Unknown",
        "M: Total",
    ],
};

pub const TIME_SERIES: CleanSpec = CleanSpec {
    name: "time_series",
    file_name: "time_series.csv",
    country_columns: ORIGIN_AND_ASYLUM,
    required_columns: ORIGIN_AND_ASYLUM,
    numeric_columns: &["Value"],
};

pub const RESETTLEMENT: CleanSpec = CleanSpec {
    name: "resettlement",
    file_name: "resettlement.csv",
    country_columns: ORIGIN_AND_ASYLUM,
    required_columns: ORIGIN_AND_ASYLUM,
    numeric_columns: &["Value"],
};

/// Every input the pipeline expects, in validation order.
pub const ALL_SOURCES: [CleanSpec; 6] = [
    ASYLUM_SEEKERS,
    ASYLUM_SEEKERS_MONTHLY,
    PERSONS_OF_CONCERN,
    DEMOGRAPHICS,
    TIME_SERIES,
    RESETTLEMENT,
];

// ── Cleaning ──────────────────────────────────────────────────────────────────

/// Load the file at `path` and clean it according to `spec`.
pub fn clean(path: &Path, spec: &CleanSpec) -> Result<DataFrame> {
    let raw = load_table(path)?;
    clean_table(raw, spec)
}

/// Clean an already-loaded frame.
///
/// 1. Numeric columns are cast to `f64`; nulls and unparseable text become `0`.
/// 2. Country columns are normalized; non-geocodable labels become null.
/// 3. Rows missing a required country are dropped.
///
/// Designated columns absent from the frame are skipped.
pub fn clean_table(df: DataFrame, spec: &CleanSpec) -> Result<DataFrame> {
    let before = df.height();
    let mut exprs = Vec::new();

    for column in spec.numeric_columns {
        if has_column(&df, column) {
            exprs.push(numeric(column));
        } else {
            debug!("{}: numeric column '{}' not present", spec.name, column);
        }
    }

    let mut countries = Vec::new();
    for column in spec.country_columns {
        if has_column(&df, column) {
            countries.push(*column);
            exprs.push(normalized(column));
        } else {
            debug!("{}: country column '{}' not present", spec.name, column);
        }
    }

    let dropped = find_non_geocodable(&df, &countries)?;
    if !dropped.is_empty() {
        debug!("{}: dropping labels {:?}", spec.name, dropped);
    }

    let required: Vec<&str> = spec
        .required_columns
        .iter()
        .copied()
        .filter(|c| has_column(&df, c))
        .collect();

    let mut lf = df.lazy();
    if !exprs.is_empty() {
        lf = lf.with_columns(exprs);
    }
    if let Some(present) = all_present(&required) {
        lf = lf.filter(present);
    }
    let cleaned = lf.collect()?;

    debug!(
        "Cleaned {}: kept {} of {} rows",
        spec.name,
        cleaned.height(),
        before
    );
    Ok(cleaned)
}

fn numeric(column: &str) -> Expr {
    col(column)
        .cast(DataType::String)
        .str()
        .strip_chars(lit(NULL))
        .cast(DataType::Float64)
        .fill_nan(lit(0.0))
        .fill_null(lit(0.0))
        .alias(column)
}

fn normalized(column: &str) -> Expr {
    col(column)
        .cast(DataType::String)
        .map(
            |s| {
                let out: StringChunked = s
                    .str()?
                    .into_iter()
                    .map(|label| label.and_then(normalize_country))
                    .collect();
                Ok(Some(out.into_series()))
            },
            GetOutput::from_type(DataType::String),
        )
        .alias(column)
}

// ── Row filters ───────────────────────────────────────────────────────────────

/// Keep rows whose year lies in `start..=end`.
///
/// The year column is cast to `i64`; rows with a non-numeric year are
/// dropped. Frames without a year column are returned untouched.
pub fn filter_year_range(df: DataFrame, start: i64, end: i64) -> Result<DataFrame> {
    if !has_column(&df, YEAR_COLUMN) {
        return Ok(df);
    }
    let filtered = df
        .lazy()
        .with_column(col(YEAR_COLUMN).cast(DataType::Int64))
        .filter(
            col(YEAR_COLUMN)
                .gt_eq(lit(start))
                .and(col(YEAR_COLUMN).lt_eq(lit(end))),
        )
        .collect()?;
    Ok(filtered)
}

/// Smallest and largest numeric year, or `None` when there are none.
pub fn get_year_range(df: &DataFrame) -> Option<(i64, i64)> {
    let years = df.column(YEAR_COLUMN).ok()?.cast(&DataType::Int64).ok()?;
    let years = years.i64().ok()?;
    Some((years.min()?, years.max()?))
}

/// Drop rows whose `Source` equals their `Target`.
pub fn filter_self_loops(df: DataFrame) -> Result<DataFrame> {
    if !(has_column(&df, SOURCE_COLUMN) && has_column(&df, TARGET_COLUMN)) {
        return Ok(df);
    }
    let filtered = df
        .lazy()
        .filter(col(SOURCE_COLUMN).neq(col(TARGET_COLUMN)))
        .collect()?;
    Ok(filtered)
}

/// Distinct non-blank labels in `columns` that the normalizer would reject.
pub fn find_non_geocodable(df: &DataFrame, columns: &[&str]) -> Result<BTreeSet<String>> {
    let mut rejected = BTreeSet::new();
    for column in columns.iter().filter(|c| has_column(df, c)) {
        rejected.extend(
            distinct_strings(df, column)?
                .into_iter()
                .filter(|label| !label.trim().is_empty() && !is_geocodable(label)),
        );
    }
    Ok(rejected)
}

/// Rename the UNHCR country columns to the graph's `Source` / `Target`.
pub fn rename_to_edges(df: &mut DataFrame) -> Result<()> {
    for (from, to) in [(ASYLUM_COLUMN, TARGET_COLUMN), (ORIGIN_COLUMN, SOURCE_COLUMN)] {
        if has_column(df, from) {
            df.rename(from, to)?;
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{numbers, strings};
    use tempfile::TempDir;

    const TIME_SERIES_CSV: &str = "\
Year,Country / territory of asylum/residence,Origin,Population type,Value
2005,Germany,Syrian Arab Rep.,Refugees (incl. refugee-like situations),120
2006,Germany,Stateless,Refugees (incl. refugee-like situations),40
2007,Various/Unknown,Iraq,Refugees (incl. refugee-like situations),15
2008,Jordan,Iraq,Refugees (incl. refugee-like situations),*
2009,Jordan,,Refugees (incl. refugee-like situations),9
2010,Viet Nam,China,Refugees (incl. refugee-like situations),abc
";

    fn raw(name: &str, csv: &str) -> DataFrame {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join(name);
        std::fs::write(&path, csv).unwrap();
        load_table(&path).unwrap()
    }

    fn time_series() -> DataFrame {
        clean_table(raw("time_series.csv", TIME_SERIES_CSV), &TIME_SERIES).unwrap()
    }

    #[test]
    fn test_clean_drops_ungeocodable_required_countries() {
        let df = time_series();
        // Stateless origin, unknown asylum country and blank origin are dropped.
        assert_eq!(df.height(), 3);
        for column in [ORIGIN_COLUMN, ASYLUM_COLUMN] {
            assert_eq!(df.column(column).unwrap().null_count(), 0);
            for label in strings(&df, column).unwrap() {
                assert!(normalize_country(&label).is_some());
            }
        }
    }

    #[test]
    fn test_clean_normalizes_countries() {
        let df = time_series();
        assert_eq!(strings(&df, ORIGIN_COLUMN).unwrap()[0], "Syria");
        assert_eq!(strings(&df, ASYLUM_COLUMN).unwrap()[2], "Vietnam");
    }

    #[test]
    fn test_clean_coerces_numeric_columns() {
        let df = time_series();
        assert_eq!(df.column("Value").unwrap().dtype(), &DataType::Float64);
        assert_eq!(numbers(&df, "Value").unwrap(), vec![120.0, 0.0, 0.0]);
    }

    #[test]
    fn test_clean_leaves_other_columns_as_text() {
        let df = time_series();
        assert_eq!(
            strings(&df, "Population type").unwrap()[0],
            "Refugees (incl. refugee-like situations)"
        );
        assert_eq!(df.column(YEAR_COLUMN).unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_demographics_only_requires_asylum_country() {
        let csv = "Year,Country / territory of asylum/residence,Location Name,F: Total\n\
                   2005,Kenya,Dadaab,10\n\
                   2005,Stateless,Camp,3\n";
        let df = clean_table(raw("demographics.csv", csv), &DEMOGRAPHICS).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(numbers(&df, "F: Total").unwrap(), vec![10.0]);
    }

    #[test]
    fn test_clean_skips_absent_designated_columns() {
        let csv = "Year,Country / territory of asylum/residence,Origin\n2001,Chad,Sudan\n";
        let df = clean_table(raw("asylum_seekers.csv", csv), &ASYLUM_SEEKERS).unwrap();
        assert_eq!(df.height(), 1);
        assert!(!has_column(&df, "Rejected"));
    }

    #[test]
    fn test_clean_from_file_does_not_modify_source() {
        let tmp = TempDir::new().expect("tempdir");
        let path = TIME_SERIES.path_in(tmp.path());
        std::fs::write(&path, TIME_SERIES_CSV).unwrap();

        let df = clean(&path, &TIME_SERIES).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TIME_SERIES_CSV);
    }

    #[test]
    fn test_filter_year_range_inclusive_and_drops_non_numeric() {
        let df = raw("years.csv", "Year,Value\n1999,1\n2000,2\n2016,3\n2017,4\nunknown,5\n");
        let df = filter_year_range(df, 2000, 2016).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(get_year_range(&df), Some((2000, 2016)));
    }

    #[test]
    fn test_filter_year_range_without_year_column() {
        let df = filter_year_range(raw("noyear.csv", "Value\n1\n"), 2000, 2016).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(get_year_range(&df), None);
    }

    #[test]
    fn test_filter_self_loops() {
        let df = DataFrame::new(vec![
            Series::new(SOURCE_COLUMN, &["Chad", "Chad"]),
            Series::new(TARGET_COLUMN, &["Chad", "Sudan"]),
        ])
        .unwrap();
        let df = filter_self_loops(df).unwrap();
        assert_eq!(strings(&df, TARGET_COLUMN).unwrap(), vec!["Sudan"]);
    }

    #[test]
    fn test_find_non_geocodable_on_raw_frame() {
        let raw = raw("time_series.csv", TIME_SERIES_CSV);
        let rejected = find_non_geocodable(&raw, &[ORIGIN_COLUMN, ASYLUM_COLUMN]).unwrap();
        assert!(rejected.contains("Stateless"));
        assert!(rejected.contains("Various/Unknown"));
        assert!(find_non_geocodable(&time_series(), &[ORIGIN_COLUMN, ASYLUM_COLUMN])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rename_to_edges() {
        let mut df = time_series();
        rename_to_edges(&mut df).unwrap();
        assert!(has_column(&df, SOURCE_COLUMN));
        assert!(has_column(&df, TARGET_COLUMN));
        assert!(!has_column(&df, ORIGIN_COLUMN));
    }

    #[test]
    fn test_all_sources_have_distinct_files() {
        let names: BTreeSet<_> = ALL_SOURCES.iter().map(|s| s.file_name).collect();
        assert_eq!(names.len(), 6);
    }
}
