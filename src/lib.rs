pub mod config;
pub mod error;
pub mod importers;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod tidy_csv;
pub mod utils;
pub mod week_dates;

pub use error::PipelineError;
