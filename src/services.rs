pub mod classifier;
pub mod reports;

pub use classifier::Classifier;
pub use reports::{
    low_ec_readings, range_violations, Completeness, NormalRanking, StatusSummary,
};
