//! Report module - analysis reports, JSON export and terminal summaries

pub mod eda;
pub mod export;
pub mod features;
pub mod preprocessing;
pub mod regional;
pub mod summary;
pub mod visualizations;

pub use eda::EdaReport;
pub use export::*;
pub use features::FeatureReport;
pub use preprocessing::{OutputFiles, PreprocessReport};
pub use regional::RegionalReport;
pub use summary::*;
pub use visualizations::ChartDataReport;
