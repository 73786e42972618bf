//! Data layer for the refugee-flow pipeline.
//!
//! Reads the UNHCR CSV exports into polars frames, cleans them, aggregates
//! records into country-to-country edges and writes the four graph reports.

pub mod aggregator;
pub mod cleaner;
pub mod frame;
pub mod reader;
pub mod reports;
pub mod writer;

pub use flows_core as core;
