//! Runtime layer for the refugee-flow pipeline.
//!
//! Resolves the file layout, runs input and output validation and drives the
//! report generators in order.

pub mod layout;
pub mod orchestrator;
pub mod validation;

pub use flows_core as core;
pub use flows_data as data;
