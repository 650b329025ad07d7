//! Cleans French regional energy statistics and builds the per-region coverage balance.

pub mod balance;
pub mod config;
pub mod consumption;
pub mod energy;
pub mod error;
pub mod geo;
pub mod loader;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod production;
pub mod reshape;
pub mod schema;
pub mod values;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{run, PipelineReport, Stage, StageOutcome};
