//! The four graph reports.
//!
//! Each report combines one or more cleaned source frames into a weighted,
//! directed edge list (`Source` → `Target`) and writes it as CSV. The
//! `build_*` functions are pure frame transformations; the `generate_*`
//! functions add loading, writing and a [`ReportSummary`] for logging.
//!
//! | Report | Years | Inputs |
//! |---|---|---|
//! | [`ReportKind::GlobalFlows`] | 2000–2016 | persons of concern, asylum seekers |
//! | [`ReportKind::TemporalEvolution`] | 2000–2016 | time series |
//! | [`ReportKind::TransitNodes`] | 2000–2016 | asylum seekers |
//! | [`ReportKind::GenderRoutes`] | 2001–2016 | demographics, persons of concern |

use std::path::{Path, PathBuf};

use flows_core::formatting::{format_count, format_number, format_ratio};
use flows_core::{FlowsError, Result};
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::aggregator::FlowAggregator;
use crate::cleaner::{
    clean, filter_self_loops, filter_year_range, get_year_range, rename_to_edges, ASYLUM_COLUMN,
    ASYLUM_SEEKERS,
    DEMOGRAPHICS, PERSONS_OF_CONCERN, SOURCE_COLUMN, TARGET_COLUMN, TIME_SERIES, YEAR_COLUMN,
};
use crate::frame::{distinct_strings, fill_zero, numbers, require_columns, strings};
use crate::writer::write_table;

// ── Thresholds and column names ───────────────────────────────────────────────

pub const FIRST_YEAR: i64 = 2000;
/// Demographics start in 2001.
pub const FIRST_DEMOGRAPHICS_YEAR: i64 = 2001;
pub const LAST_YEAR: i64 = 2016;

pub const MIN_TOTAL_FLOW: f64 = 100.0;
pub const MIN_YEARLY_FLOW: f64 = 50.0;
pub const MIN_APPLICATIONS: f64 = 100.0;

/// Transit candidates: high volume and mostly rejected.
pub const TRANSIT_MIN_APPLICATIONS: f64 = 10_000.0;
pub const TRANSIT_MIN_REJECTION_RATE: f64 = 0.5;
pub const HIGH_FEMALE_RATIO: f64 = 0.55;

const REFUGEES: &str = "Refugees (incl. refugee-like situations)";
const ASYLUM_PENDING: &str = "Asylum-seekers (pending cases)";
const POPULATION_TYPE: &str = "Population type";
const APPLIED: &str = "Applied during year";
const REJECTED: &str = "Rejected";
const RECOGNIZED: &str = "decisions_recognized";

const FEMALE_TOTAL: &str = "F: Total";
const MALE_TOTAL: &str = "M: Total";
/// 0-4 and 5-17 partition childhood; 5-11 and 12-17 overlap 5-17.
const CHILD_BANDS: &[&str] = &["Female 0-4", "Female 5-17", "Male 0-4", "Male 5-17"];

const HIGHLIGHT_LIMIT: usize = 5;

const ASCENDING: bool = false;
const DESCENDING: bool = true;

// ── ReportKind ────────────────────────────────────────────────────────────────

/// One of the four output tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Q1: total flows between country pairs (sources and sinks).
    GlobalFlows,
    /// Q2: yearly refugee flows for topology-over-time analysis.
    TemporalEvolution,
    /// Q3: asylum applications with rejection rates (centrality analysis).
    TransitNodes,
    /// Q4: yearly flows annotated with gender and child shares.
    GenderRoutes,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::GlobalFlows,
        ReportKind::TemporalEvolution,
        ReportKind::TransitNodes,
        ReportKind::GenderRoutes,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ReportKind::GlobalFlows => "q1_flujos_globales.csv",
            ReportKind::TemporalEvolution => "q2_evolucion_temporal.csv",
            ReportKind::TransitNodes => "q3_nodos_transito.csv",
            ReportKind::GenderRoutes => "q4_genero_rutas.csv",
        }
    }

    /// File stem, used as the report's name in logs and errors.
    pub fn name(&self) -> &'static str {
        self.file_name().trim_end_matches(".csv")
    }

    /// Output schema, in column order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ReportKind::GlobalFlows => &[
                "Source",
                "Target",
                "TotalRefugees",
                "TotalAsylum",
                "TotalRejected",
                "TotalFlow",
            ],
            ReportKind::TemporalEvolution => &["Source", "Target", "Year", "Value"],
            ReportKind::TransitNodes => &[
                "Source",
                "Target",
                "Value",
                "Rejected",
                "Recognized",
                "RejectionRate",
            ],
            ReportKind::GenderRoutes => &[
                "Source",
                "Target",
                "Year",
                "TotalFlow",
                "TotalFemale",
                "TotalMale",
                "TotalChildren",
                "FemaleRatio",
                "ChildrenRatio",
            ],
        }
    }

    /// Person counts, written as integers and totalled in the summary.
    pub fn measure_columns(&self) -> &'static [&'static str] {
        match self {
            ReportKind::GlobalFlows => &["TotalRefugees", "TotalAsylum", "TotalRejected", "TotalFlow"],
            ReportKind::TemporalEvolution => &["Value"],
            ReportKind::TransitNodes => &["Value", "Rejected", "Recognized"],
            ReportKind::GenderRoutes => &["TotalFlow", "TotalFemale", "TotalMale", "TotalChildren"],
        }
    }
}

// ── ReportSummary ─────────────────────────────────────────────────────────────

/// What a generator produced, for logging and the run report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub kind: ReportKind,
    pub output_path: PathBuf,
    /// Number of edges written.
    pub rows: usize,
    /// Distinct countries appearing as Source or Target.
    pub unique_nodes: usize,
    pub year_range: Option<(i64, i64)>,
    /// Column totals over the written edges.
    pub totals: Vec<(String, f64)>,
    /// Human-readable notable rows (top routes, transit candidates, ...).
    pub highlights: Vec<String>,
}

impl ReportSummary {
    fn new(kind: ReportKind, output_path: &Path, df: &DataFrame) -> Result<Self> {
        let mut nodes = distinct_strings(df, SOURCE_COLUMN)?;
        nodes.extend(distinct_strings(df, TARGET_COLUMN)?);

        Ok(Self {
            kind,
            output_path: output_path.to_path_buf(),
            rows: df.height(),
            unique_nodes: nodes.len(),
            year_range: get_year_range(df),
            totals: FlowAggregator::calculate_totals(df, kind.measure_columns())?,
            highlights: Vec::new(),
        })
    }

    /// Emit the summary as `info!` events.
    pub fn log(&self) {
        info!("  Saved: {}", self.output_path.display());
        info!(
            "    Edges: {}, unique nodes: {}",
            format_count(self.rows),
            format_count(self.unique_nodes)
        );
        if let Some((lo, hi)) = self.year_range {
            info!("    Years: {} - {}", lo, hi);
        }
        if self.rows > 0 {
            let totals: Vec<String> = self
                .totals
                .iter()
                .map(|(column, total)| format!("{} {}", column, format_number(*total, 0)))
                .collect();
            info!("    Totals: {}", totals.join(", "));
        }
        for line in &self.highlights {
            info!("      {}", line);
        }
    }
}

// ── Generators ────────────────────────────────────────────────────────────────

/// Run the generator for `kind`, reading inputs from `data_dir`.
///
/// Any failure is wrapped in [`FlowsError::Report`] naming the report.
pub fn generate(kind: ReportKind, data_dir: &Path, output_path: &Path) -> Result<ReportSummary> {
    let result = match kind {
        ReportKind::GlobalFlows => generate_global_flows(data_dir, output_path),
        ReportKind::TemporalEvolution => generate_temporal_evolution(data_dir, output_path),
        ReportKind::TransitNodes => generate_transit_nodes(data_dir, output_path),
        ReportKind::GenderRoutes => generate_gender_routes(data_dir, output_path),
    };
    result.map_err(|e| FlowsError::Report {
        report: kind.name().to_string(),
        message: e.to_string(),
    })
}

/// Q1: sources and sinks.
pub fn generate_global_flows(data_dir: &Path, output_path: &Path) -> Result<ReportSummary> {
    info!("Generating Q1: global flows...");
    let poc = clean(&PERSONS_OF_CONCERN.path_in(data_dir), &PERSONS_OF_CONCERN)?;
    let asylum = clean(&ASYLUM_SEEKERS.path_in(data_dir), &ASYLUM_SEEKERS)?;

    let mut df = build_global_flows(poc, asylum)?;
    write_table(&mut df, output_path)?;

    let mut summary = ReportSummary::new(ReportKind::GlobalFlows, output_path, &df)?;
    summary.highlights = top_routes(&df, "TotalFlow")?;
    Ok(summary)
}

/// Q2: yearly evolution.
pub fn generate_temporal_evolution(data_dir: &Path, output_path: &Path) -> Result<ReportSummary> {
    info!("Generating Q2: temporal evolution...");
    let series = clean(&TIME_SERIES.path_in(data_dir), &TIME_SERIES)?;

    let mut df = build_temporal_evolution(series)?;
    write_table(&mut df, output_path)?;

    let mut summary = ReportSummary::new(ReportKind::TemporalEvolution, output_path, &df)?;
    summary.highlights = yearly_samples(&df)?;
    Ok(summary)
}

/// Q3: transit nodes.
pub fn generate_transit_nodes(data_dir: &Path, output_path: &Path) -> Result<ReportSummary> {
    info!("Generating Q3: transit nodes...");
    let asylum = clean(&ASYLUM_SEEKERS.path_in(data_dir), &ASYLUM_SEEKERS)?;

    let mut df = build_transit_nodes(asylum)?;
    write_table(&mut df, output_path)?;

    let mut summary = ReportSummary::new(ReportKind::TransitNodes, output_path, &df)?;
    summary.highlights = transit_candidates(&df)?;
    Ok(summary)
}

/// Q4: gender and children along routes.
pub fn generate_gender_routes(data_dir: &Path, output_path: &Path) -> Result<ReportSummary> {
    info!("Generating Q4: gender routes...");
    let demographics = clean(&DEMOGRAPHICS.path_in(data_dir), &DEMOGRAPHICS)?;
    let poc = clean(&PERSONS_OF_CONCERN.path_in(data_dir), &PERSONS_OF_CONCERN)?;

    let mut df = build_gender_routes(demographics, poc)?;
    write_table(&mut df, output_path)?;

    let mut summary = ReportSummary::new(ReportKind::GenderRoutes, output_path, &df)?;
    summary.highlights = gender_highlights(&df)?;
    Ok(summary)
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Q1 from cleaned persons-of-concern and asylum-seeker frames.
///
/// Refugee and pending-asylum totals come from persons of concern, rejections
/// from asylum seekers; pairs present on only one side get zeros.
pub fn build_global_flows(poc: DataFrame, asylum: DataFrame) -> Result<DataFrame> {
    require_columns(&poc, PERSONS_OF_CONCERN.file_name, &[REFUGEES, ASYLUM_PENDING])?;
    require_columns(&asylum, ASYLUM_SEEKERS.file_name, &[REJECTED])?;

    let mut poc = filter_year_range(poc, FIRST_YEAR, LAST_YEAR)?;
    let mut asylum = filter_year_range(asylum, FIRST_YEAR, LAST_YEAR)?;
    rename_to_edges(&mut poc)?;
    rename_to_edges(&mut asylum)?;

    let mut refugees = FlowAggregator::aggregate(
        &poc,
        SOURCE_COLUMN,
        TARGET_COLUMN,
        &[REFUGEES, ASYLUM_PENDING],
        &[],
    )?;
    refugees.rename(REFUGEES, "TotalRefugees")?;
    refugees.rename(ASYLUM_PENDING, "TotalAsylum")?;

    let mut rejected =
        FlowAggregator::aggregate(&asylum, SOURCE_COLUMN, TARGET_COLUMN, &[REJECTED], &[])?;
    rejected.rename(REJECTED, "TotalRejected")?;

    let joined = FlowAggregator::outer_join(&refugees, &rejected, &[SOURCE_COLUMN, TARGET_COLUMN])?;
    let lf = joined
        .lazy()
        .with_columns(fill_zero(&["TotalRefugees", "TotalAsylum", "TotalRejected"]))
        .with_column((col("TotalRefugees") + col("TotalAsylum")).alias("TotalFlow"))
        .filter(col("TotalFlow").gt_eq(lit(MIN_TOTAL_FLOW)));

    finish(lf, ReportKind::GlobalFlows, &[("TotalFlow", DESCENDING)])
}

/// Q2 from the cleaned time series, refugees only.
pub fn build_temporal_evolution(series: DataFrame) -> Result<DataFrame> {
    require_columns(&series, TIME_SERIES.file_name, &[POPULATION_TYPE, "Value"])?;

    let series = series
        .lazy()
        .filter(col(POPULATION_TYPE).eq(lit(REFUGEES)))
        .collect()?;
    let mut series = filter_year_range(series, FIRST_YEAR, LAST_YEAR)?;
    rename_to_edges(&mut series)?;

    let aggregated = FlowAggregator::aggregate(
        &series,
        SOURCE_COLUMN,
        TARGET_COLUMN,
        &["Value"],
        &[YEAR_COLUMN],
    )?;
    let lf = aggregated
        .lazy()
        .filter(col("Value").gt_eq(lit(MIN_YEARLY_FLOW)));

    finish(
        lf,
        ReportKind::TemporalEvolution,
        &[(YEAR_COLUMN, ASCENDING), ("Value", DESCENDING)],
    )
}

/// Q3 from the cleaned asylum-seeker frame.
///
/// `RejectionRate = Rejected / max(Value, 1)` clipped to `[0, 1]`, so a pair
/// with no applications reports 0 when nothing was rejected and 1 otherwise.
pub fn build_transit_nodes(asylum: DataFrame) -> Result<DataFrame> {
    require_columns(&asylum, ASYLUM_SEEKERS.file_name, &[APPLIED, REJECTED, RECOGNIZED])?;

    let mut asylum = filter_year_range(asylum, FIRST_YEAR, LAST_YEAR)?;
    rename_to_edges(&mut asylum)?;

    let mut aggregated = FlowAggregator::aggregate(
        &asylum,
        SOURCE_COLUMN,
        TARGET_COLUMN,
        &[APPLIED, REJECTED, RECOGNIZED],
        &[],
    )?;
    aggregated.rename(APPLIED, "Value")?;
    aggregated.rename(RECOGNIZED, "Recognized")?;

    let lf = aggregated
        .lazy()
        .with_column(clipped_ratio(col("Rejected"), col("Value")).alias("RejectionRate"))
        .filter(col("Value").gt_eq(lit(MIN_APPLICATIONS)));

    finish(lf, ReportKind::TransitNodes, &[("Value", DESCENDING)])
}

/// Q4 from cleaned demographics and persons-of-concern frames.
///
/// Demographics only know the asylum country, so gender and child counts are
/// aggregated per (Target, Year) and attached to every refugee flow into that
/// country in that year.
pub fn build_gender_routes(demographics: DataFrame, poc: DataFrame) -> Result<DataFrame> {
    let mut needed = vec![YEAR_COLUMN, FEMALE_TOTAL, MALE_TOTAL];
    needed.extend_from_slice(CHILD_BANDS);
    require_columns(&demographics, DEMOGRAPHICS.file_name, &needed)?;
    require_columns(&poc, PERSONS_OF_CONCERN.file_name, &[REFUGEES])?;

    let demographics = filter_year_range(demographics, FIRST_DEMOGRAPHICS_YEAR, LAST_YEAR)?;
    let mut poc = filter_year_range(poc, FIRST_DEMOGRAPHICS_YEAR, LAST_YEAR)?;

    let children = CHILD_BANDS
        .iter()
        .fold(lit(0.0), |total, band| total + col(band));
    let demographics = demographics
        .lazy()
        .with_columns([
            col(FEMALE_TOTAL).alias("TotalFemale"),
            col(MALE_TOTAL).alias("TotalMale"),
            children.alias("TotalChildren"),
        ])
        .collect()?;

    let mut demo_agg = FlowAggregator::group_sum(
        &demographics,
        &[ASYLUM_COLUMN, YEAR_COLUMN],
        &["TotalFemale", "TotalMale", "TotalChildren"],
    )?;
    demo_agg.rename(ASYLUM_COLUMN, TARGET_COLUMN)?;

    rename_to_edges(&mut poc)?;
    let mut flows = FlowAggregator::aggregate(
        &poc,
        SOURCE_COLUMN,
        TARGET_COLUMN,
        &[REFUGEES],
        &[YEAR_COLUMN],
    )?;
    flows.rename(REFUGEES, "TotalFlow")?;

    let joined = FlowAggregator::left_join(&flows, &demo_agg, &[TARGET_COLUMN, YEAR_COLUMN])?;
    let gender_total = col("TotalFemale") + col("TotalMale");
    let lf = joined
        .lazy()
        .with_columns(fill_zero(&["TotalFemale", "TotalMale", "TotalChildren"]))
        .with_columns([
            clipped_ratio(col("TotalFemale"), gender_total.clone()).alias("FemaleRatio"),
            clipped_ratio(col("TotalChildren"), gender_total.clone()).alias("ChildrenRatio"),
        ])
        .filter(gender_total.gt(lit(0.0)))
        .filter(col("TotalFlow").gt_eq(lit(MIN_TOTAL_FLOW)));

    finish(lf, ReportKind::GenderRoutes, &[("FemaleRatio", DESCENDING)])
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// `numerator / max(denominator, 1)` clipped to `[0, 1]`.
fn clipped_ratio(numerator: Expr, denominator: Expr) -> Expr {
    let floor = when(denominator.clone().gt(lit(1.0)))
        .then(denominator)
        .otherwise(lit(1.0));
    (numerator / floor).clip(lit(0.0), lit(1.0))
}

/// Drop self-loops, project onto the report schema with integer counts and
/// sort. Ties keep their aggregation order.
fn finish(lf: LazyFrame, kind: ReportKind, order: &[(&str, bool)]) -> Result<DataFrame> {
    let projection: Vec<Expr> = kind
        .columns()
        .iter()
        .map(|c| {
            if *c == YEAR_COLUMN || kind.measure_columns().contains(c) {
                col(c).cast(DataType::Int64)
            } else {
                col(c)
            }
        })
        .collect();
    let by: Vec<Expr> = order.iter().map(|(c, _)| col(c)).collect();
    let descending: Vec<bool> = order.iter().map(|(_, d)| *d).collect();

    let df = filter_self_loops(lf.collect()?)?
        .lazy()
        .select(projection)
        .sort_by_exprs(
            by,
            SortMultipleOptions::default()
                .with_order_descendings(descending)
                .with_maintain_order(true),
        )
        .collect()?;
    Ok(df)
}

fn routes(df: &DataFrame) -> Result<Vec<String>> {
    Ok(strings(df, SOURCE_COLUMN)?
        .into_iter()
        .zip(strings(df, TARGET_COLUMN)?)
        .map(|(source, target)| format!("{source} -> {target}"))
        .collect())
}

/// Top routes of a frame already sorted by `weight` descending.
fn top_routes(df: &DataFrame, weight: &str) -> Result<Vec<String>> {
    Ok(routes(df)?
        .into_iter()
        .zip(numbers(df, weight)?)
        .take(HIGHLIGHT_LIMIT)
        .map(|(route, w)| format!("{}: {}", route, format_number(w, 0)))
        .collect())
}

/// Edge counts and totals for a handful of sample years.
fn yearly_samples(df: &DataFrame) -> Result<Vec<String>> {
    let years = numbers(df, YEAR_COLUMN)?;
    let values = numbers(df, "Value")?;

    let mut lines = Vec::new();
    for year in [2000, 2005, 2010, 2015, 2016] {
        let (edges, total) = years
            .iter()
            .zip(&values)
            .filter(|(y, _)| **y == year as f64)
            .fold((0, 0.0), |(n, sum), (_, v)| (n + 1, sum + v));
        if edges == 0 {
            continue;
        }
        lines.push(format!(
            "{}: {} edges, {} people",
            year,
            format_count(edges),
            format_number(total, 0)
        ));
    }
    Ok(lines)
}

/// High-volume pairs where at least half the applications were rejected.
fn transit_candidates(df: &DataFrame) -> Result<Vec<String>> {
    let values = numbers(df, "Value")?;
    let rates = numbers(df, "RejectionRate")?;
    Ok(routes(df)?
        .into_iter()
        .zip(values.into_iter().zip(rates))
        .filter(|(_, (v, rate))| {
            *v >= TRANSIT_MIN_APPLICATIONS && *rate >= TRANSIT_MIN_REJECTION_RATE
        })
        .take(HIGHLIGHT_LIMIT)
        .map(|(route, (v, rate))| {
            format!(
                "transit candidate {}: {} applications, {} rejected",
                route,
                format_number(v, 0),
                format_ratio(rate)
            )
        })
        .collect())
}

/// Female-majority routes and routes with the largest share of children.
fn gender_highlights(df: &DataFrame) -> Result<Vec<String>> {
    let routes = routes(df)?;
    let years = strings(df, YEAR_COLUMN)?;
    let female = numbers(df, "FemaleRatio")?;
    let children = numbers(df, "ChildrenRatio")?;

    let mut lines: Vec<String> = (0..routes.len())
        .filter(|&i| female[i] >= HIGH_FEMALE_RATIO)
        .take(HIGHLIGHT_LIMIT)
        .map(|i| format!("{} ({}): {} women", routes[i], years[i], format_ratio(female[i])))
        .collect();

    let mut by_children: Vec<usize> = (0..routes.len()).collect();
    by_children.sort_by(|&a, &b| children[b].total_cmp(&children[a]));
    lines.extend(by_children.into_iter().take(HIGHLIGHT_LIMIT).map(|i| {
        format!("{} ({}): {} minors", routes[i], years[i], format_ratio(children[i]))
    }));
    Ok(lines)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
