//! CLI front end for the usedtype analyzer.
//!
//! Loads an IR snapshot produced by a frontend, selects the packages to
//! analyze, runs the pipeline and prints the rendered usage trees.

pub mod args;
pub mod run;

pub use args::CliArgs;
pub use run::{CliError, execute, run};
