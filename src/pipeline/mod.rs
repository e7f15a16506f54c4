//! Pipeline module - loading, cleaning, feature derivation, aggregation and tests

pub mod aggregate;
pub mod binning;
pub mod cleaner;
pub mod correlation;
pub mod encoder;
pub mod error;
pub mod features;
pub mod filter;
pub mod hypothesis;
pub mod loader;
pub mod schema;
pub mod stats;

pub use aggregate::{
    aggregate, count_by, crosstab, pivot_mean, pivot_mean_with_axes, Crosstab, GroupStats, KeyCount,
    Pivot, SortPolicy,
};
pub use binning::{BinSpec, Bucket, AGE_BINS, BIN_SPECS, BMI_BINS, CHARGES_BINS};
pub use cleaner::*;
pub use correlation::{CorrelationMatrix, TargetCorrelation};
pub use encoder::{ColumnMapping, Encodings, LabelEncoding};
pub use error::{ErrorKind, PipelineError};
pub use features::*;
pub use filter::{compute_view, AggregationCache, FilteredView, Kpis, RecordFilter};
pub use hypothesis::{one_way_anova, t_test_independent, TestOutcome, TestReport, DEFAULT_ALPHA};
pub use loader::*;
pub use schema::*;
