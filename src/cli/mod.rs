//! Command-line interface module

pub mod args;
pub mod runner;

pub use args::Args;
pub use runner::Runner;
