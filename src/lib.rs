pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{storage::LocalStorage, store::DocumentStore};
pub use core::{analysis::FeedbackAnalyzer, etl::EtlEngine, pipeline::ReportPipeline};
pub use utils::error::{FeedbackError, Result};
