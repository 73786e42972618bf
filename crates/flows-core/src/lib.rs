//! Core types for the refugee-flow pipeline.
//!
//! Holds the country-name normalizer, the shared error type, CLI settings
//! and log formatting helpers. Nothing here touches the filesystem.

pub mod countries;
pub mod error;
pub mod formatting;
pub mod settings;

pub use error::{FlowsError, Result};
