//! Group-and-sum aggregation and key joins over polars frames.

use flows_core::Result;
use polars::prelude::*;

use crate::frame::{all_present, has_column, require_columns};

// ── FlowAggregator ────────────────────────────────────────────────────────────

/// Stateless helper that collapses records sharing a key into one row.
pub struct FlowAggregator;

impl FlowAggregator {
    /// Sum `value_columns` per (`source_key`, `target_key`, *`extra_group_keys`).
    ///
    /// Output columns are the group keys followed by the value columns, one
    /// row per distinct key, sorted ascending by key. Value columns absent
    /// from `df` are skipped; rows with a null key are ignored.
    pub fn aggregate(
        df: &DataFrame,
        source_key: &str,
        target_key: &str,
        value_columns: &[&str],
        extra_group_keys: &[&str],
    ) -> Result<DataFrame> {
        let mut keys = vec![source_key, target_key];
        keys.extend_from_slice(extra_group_keys);
        Self::group_sum(df, &keys, value_columns)
    }

    /// Sum `value_columns` per distinct combination of `keys`.
    pub fn group_sum(df: &DataFrame, keys: &[&str], value_columns: &[&str]) -> Result<DataFrame> {
        require_columns(df, "aggregation input", keys)?;

        let key_exprs: Vec<Expr> = keys.iter().map(|k| col(k)).collect();
        let sums: Vec<Expr> = value_columns
            .iter()
            .filter(|c| has_column(df, c))
            .map(|c| {
                col(c)
                    .cast(DataType::Float64)
                    .fill_null(lit(0.0))
                    .sum()
                    .alias(c)
            })
            .collect();

        let mut lf = df.clone().lazy();
        if let Some(present) = all_present(keys) {
            lf = lf.filter(present);
        }
        let out = lf
            .group_by(key_exprs.clone())
            .agg(sums)
            .sort_by_exprs(key_exprs, SortMultipleOptions::default())
            .collect()?;
        Ok(out)
    }

    /// Join on `on`, keeping every key from either side.
    ///
    /// Key columns are coalesced. Measures without a match stay null; callers
    /// zero-fill. Rows come out sorted by key.
    pub fn outer_join(left: &DataFrame, right: &DataFrame, on: &[&str]) -> Result<DataFrame> {
        let keys: Vec<Expr> = on.iter().map(|k| col(k)).collect();
        let args = JoinArgs::new(JoinType::Outer).with_coalesce(JoinCoalesce::CoalesceColumns);
        let out = left
            .clone()
            .lazy()
            .join(right.clone().lazy(), keys.clone(), keys.clone(), args)
            .sort_by_exprs(keys, SortMultipleOptions::default())
            .collect()?;
        Ok(out)
    }

    /// Join on `on`, keeping every left row in order. Unmatched right
    /// columns stay null.
    pub fn left_join(left: &DataFrame, right: &DataFrame, on: &[&str]) -> Result<DataFrame> {
        let keys: Vec<Expr> = on.iter().map(|k| col(k)).collect();
        let out = left
            .clone()
            .lazy()
            .join(
                right.clone().lazy(),
                keys.clone(),
                keys,
                JoinArgs::new(JoinType::Left),
            )
            .collect()?;
        Ok(out)
    }

    /// Totals of `columns` over the whole frame.
    pub fn calculate_totals(df: &DataFrame, columns: &[&str]) -> Result<Vec<(String, f64)>> {
        columns
            .iter()
            .map(|c| {
                let values = df.column(c)?.cast(&DataType::Float64)?;
                Ok((c.to_string(), values.f64()?.sum().unwrap_or(0.0)))
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{fill_zero, numbers, strings};

    fn edges(rows: &[(&str, &str, i64, f64, f64)]) -> DataFrame {
        DataFrame::new(vec![
            Series::new("Source", rows.iter().map(|r| r.0).collect::<Vec<_>>()),
            Series::new("Target", rows.iter().map(|r| r.1).collect::<Vec<_>>()),
            Series::new("Year", rows.iter().map(|r| r.2).collect::<Vec<_>>()),
            Series::new("Refugees", rows.iter().map(|r| r.3).collect::<Vec<_>>()),
            Series::new("Asylum", rows.iter().map(|r| r.4).collect::<Vec<_>>()),
        ])
        .unwrap()
    }

    fn pairs(value_column: &str, rows: &[(&str, &str, f64)]) -> DataFrame {
        DataFrame::new(vec![
            Series::new("Source", rows.iter().map(|r| r.0).collect::<Vec<_>>()),
            Series::new("Target", rows.iter().map(|r| r.1).collect::<Vec<_>>()),
            Series::new(value_column, rows.iter().map(|r| r.2).collect::<Vec<_>>()),
        ])
        .unwrap()
    }

    fn routes(df: &DataFrame) -> Vec<String> {
        strings(df, "Source")
            .unwrap()
            .into_iter()
            .zip(strings(df, "Target").unwrap())
            .map(|(s, t)| format!("{s}->{t}"))
            .collect()
    }

    // ── aggregate ─────────────────────────────────────────────────────────────

    #[test]
    fn test_aggregate_sums_per_pair() {
        let df = edges(&[
            ("A", "B", 2001, 60.0, 60.0),
            ("A", "B", 2002, 10.0, 0.0),
            ("C", "D", 2001, 50.0, 0.0),
        ]);
        let out = FlowAggregator::aggregate(&df, "Source", "Target", &["Refugees", "Asylum"], &[])
            .unwrap();

        assert_eq!(out.get_column_names(), &["Source", "Target", "Refugees", "Asylum"]);
        assert_eq!(out.height(), 2);
        assert_eq!(numbers(&out, "Refugees").unwrap(), vec![70.0, 50.0]);
        assert_eq!(numbers(&out, "Asylum").unwrap(), vec![60.0, 0.0]);
    }

    #[test]
    fn test_aggregate_extra_group_key() {
        let df = edges(&[
            ("A", "B", 2002, 4.0, 0.0),
            ("A", "B", 2001, 1.0, 0.0),
            ("A", "B", 2001, 2.0, 0.0),
        ]);
        let out =
            FlowAggregator::aggregate(&df, "Source", "Target", &["Refugees"], &["Year"]).unwrap();

        assert_eq!(out.get_column_names(), &["Source", "Target", "Year", "Refugees"]);
        assert_eq!(numbers(&out, "Year").unwrap(), vec![2001.0, 2002.0]);
        assert_eq!(numbers(&out, "Refugees").unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_aggregate_conserves_sums_and_keys_unique() {
        let df = edges(&[
            ("Syria", "Turkey", 2014, 1000.0, 5.0),
            ("Iraq", "Jordan", 2014, 30.0, 7.0),
            ("Syria", "Turkey", 2015, 2000.0, 9.0),
            ("Syria", "Lebanon", 2015, 400.0, 1.0),
            ("Iraq", "Jordan", 2016, 70.0, 3.0),
        ]);
        let out = FlowAggregator::aggregate(&df, "Source", "Target", &["Refugees", "Asylum"], &[])
            .unwrap();

        let before = FlowAggregator::calculate_totals(&df, &["Refugees", "Asylum"]).unwrap();
        let after = FlowAggregator::calculate_totals(&out, &["Refugees", "Asylum"]).unwrap();
        assert_eq!(before, after);

        let keys = routes(&out);
        let mut unique = keys.clone();
        unique.dedup();
        assert_eq!(unique, keys);
        assert_eq!(keys, vec!["Iraq->Jordan", "Syria->Lebanon", "Syria->Turkey"]);
    }

    #[test]
    fn test_aggregate_independent_of_row_order() {
        let rows = [
            ("B", "C", 2001, 5.0, 1.0),
            ("A", "B", 2001, 1.0, 1.0),
            ("B", "C", 2002, 7.0, 1.0),
        ];
        let mut reversed = rows;
        reversed.reverse();

        let a = FlowAggregator::aggregate(&edges(&rows), "Source", "Target", &["Refugees"], &[])
            .unwrap();
        let b =
            FlowAggregator::aggregate(&edges(&reversed), "Source", "Target", &["Refugees"], &[])
                .unwrap();
        assert!(a.equals(&b));
    }

    #[test]
    fn test_aggregate_skips_null_keys_and_absent_values() {
        let df = DataFrame::new(vec![
            Series::new("Source", &[Some("A"), Some("A"), None]),
            Series::new("Target", &["B", "B", "B"]),
            Series::new("Value", &[None, Some(12.0), Some(99.0)]),
        ])
        .unwrap();

        let out =
            FlowAggregator::aggregate(&df, "Source", "Target", &["Value", "Absent"], &[]).unwrap();
        assert_eq!(out.get_column_names(), &["Source", "Target", "Value"]);
        assert_eq!(out.height(), 1);
        assert_eq!(numbers(&out, "Value").unwrap(), vec![12.0]);
    }

    #[test]
    fn test_aggregate_missing_key_column_is_error() {
        let df = DataFrame::new(vec![
            Series::new("Source", &["A"]),
            Series::new("Value", &[1.0]),
        ])
        .unwrap();
        let err = FlowAggregator::aggregate(&df, "Source", "Target", &["Value"], &[]).unwrap_err();
        assert!(err.to_string().contains("'Target'"));
    }

    #[test]
    fn test_group_sum_single_key() {
        let df = edges(&[("A", "B", 2001, 1.0, 0.0), ("C", "B", 2001, 2.0, 0.0)]);
        let out = FlowAggregator::group_sum(&df, &["Target", "Year"], &["Refugees"]).unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(numbers(&out, "Refugees").unwrap(), vec![3.0]);
    }

    // ── joins ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_outer_join_keeps_both_sides() {
        let left = pairs("TotalRefugees", &[("A", "B", 10.0), ("C", "D", 5.0)]);
        let right = pairs("TotalRejected", &[("A", "B", 3.0), ("E", "F", 8.0)]);

        let out = FlowAggregator::outer_join(&left, &right, &["Source", "Target"]).unwrap();
        assert_eq!(
            out.get_column_names(),
            &["Source", "Target", "TotalRefugees", "TotalRejected"]
        );
        assert_eq!(routes(&out), vec!["A->B", "C->D", "E->F"]);
        assert_eq!(out.column("TotalRejected").unwrap().null_count(), 1);

        let out = out
            .lazy()
            .with_columns(fill_zero(&["TotalRefugees", "TotalRejected"]))
            .collect()
            .unwrap();
        assert_eq!(numbers(&out, "TotalRefugees").unwrap(), vec![10.0, 5.0, 0.0]);
        assert_eq!(numbers(&out, "TotalRejected").unwrap(), vec![3.0, 0.0, 8.0]);
    }

    #[test]
    fn test_left_join_preserves_left_rows() {
        let left = pairs("TotalFlow", &[("Z", "B", 1.0), ("A", "C", 2.0)]);
        let right = DataFrame::new(vec![
            Series::new("Target", &["B"]),
            Series::new("TotalFemale", &[40.0]),
        ])
        .unwrap();

        let out = FlowAggregator::left_join(&left, &right, &["Target"]).unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(strings(&out, "Source").unwrap(), vec!["Z", "A"]);
        assert_eq!(out.column("TotalFemale").unwrap().null_count(), 1);
        assert_eq!(numbers(&out, "TotalFemale").unwrap(), vec![40.0, 0.0]);
    }

    #[test]
    fn test_join_suffixes_clashing_columns() {
        let left = pairs("Value", &[("A", "B", 1.0)]);
        let right = pairs("Value", &[("A", "B", 2.0)]);
        let out = FlowAggregator::left_join(&left, &right, &["Source", "Target"]).unwrap();
        assert!(has_column(&out, "Value_right"));
    }

    #[test]
    fn test_calculate_totals() {
        let df = edges(&[("A", "B", 2001, 1.0, 2.0), ("C", "D", 2001, 3.0, 4.0)]);
        let totals = FlowAggregator::calculate_totals(&df, &["Refugees", "Asylum"]).unwrap();
        assert_eq!(
            totals,
            vec![("Refugees".to_string(), 4.0), ("Asylum".to_string(), 6.0)]
        );
        assert!(FlowAggregator::calculate_totals(&df, &["Absent"]).is_err());
    }
}
