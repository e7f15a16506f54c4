//! Feature exploration report over the enriched table

use serde::Serialize;

use super::export::ReportMetadata;
use crate::pipeline::hypothesis::t_test_independent;
use crate::pipeline::stats::{self, linear_fit, LinearFit};
use crate::pipeline::{
    aggregate, pivot_mean, Bucket, CorrelationMatrix, EnrichedRecord, GroupStats, PipelineError,
    Pivot, SortPolicy, Smoker, TargetCorrelation, TestReport, TARGET_COLUMN,
};

/// Columns of the correlation matrix, in matrix order.
pub const CORRELATION_COLUMNS: [&str; 7] = [
    "age",
    "bmi",
    "children",
    "charges",
    "sex_encoded",
    "smoker_encoded",
    "region_encoded",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trends {
    pub age: Option<LinearFit>,
    pub bmi: Option<LinearFit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmokerComparison {
    pub non_smoker_mean: Option<f64>,
    pub smoker_mean: Option<f64>,
    /// Smoker mean minus non-smoker mean
    pub difference: Option<f64>,
    /// Smoker mean over non-smoker mean
    pub ratio: Option<f64>,
    pub test: TestReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfluenceFactor {
    pub rank: usize,
    pub factor: String,
    pub correlation: f64,
    pub abs_correlation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureReport {
    pub metadata: ReportMetadata,
    pub correlation: CorrelationMatrix,
    pub target_correlations: Vec<TargetCorrelation>,
    pub by_age_category: Vec<GroupStats<Bucket>>,
    pub by_bmi_category: Vec<GroupStats<Bucket>>,
    pub by_children: Vec<GroupStats<u32>>,
    pub trends: Trends,
    pub smoker_comparison: SmokerComparison,
    pub smoker_bmi: Pivot<Smoker, Bucket>,
    pub age_bmi: Pivot<Bucket, Bucket>,
    pub influence_ranking: Vec<InfluenceFactor>,
}

/// Named numeric columns feeding the correlation matrix.
pub fn correlation_inputs(rows: &[EnrichedRecord]) -> Vec<(String, Vec<f64>)> {
    let extract: [fn(&EnrichedRecord) -> f64; 7] = [
        |r| r.record.age as f64,
        |r| r.record.bmi,
        |r| r.record.children as f64,
        |r| r.record.charges,
        |r| r.sex_code as f64,
        |r| r.smoker_code as f64,
        |r| r.region_code as f64,
    ];
    CORRELATION_COLUMNS
        .iter()
        .zip(extract)
        .map(|(name, f)| (name.to_string(), rows.iter().map(f).collect()))
        .collect()
}

pub fn compare_smokers(rows: &[EnrichedRecord], alpha: f64) -> Result<SmokerComparison, PipelineError> {
    let charges = |smoker: bool| -> Vec<f64> {
        rows.iter()
            .filter(|r| r.record.is_smoker() == smoker)
            .map(|r| r.record.charges)
            .collect()
    };
    let non_smokers = charges(false);
    let smokers = charges(true);

    let non_smoker_mean = stats::mean(&non_smokers);
    let smoker_mean = stats::mean(&smokers);
    let difference = match (smoker_mean, non_smoker_mean) {
        (Some(s), Some(n)) => Some(s - n),
        _ => None,
    };
    let ratio = match (smoker_mean, non_smoker_mean) {
        (Some(s), Some(n)) if n != 0.0 => Some(s / n),
        _ => None,
    };

    Ok(SmokerComparison {
        non_smoker_mean,
        smoker_mean,
        difference,
        ratio,
        test: TestReport::from_result(t_test_independent(&non_smokers, &smokers, alpha))?,
    })
}

pub fn analyze(
    rows: &[EnrichedRecord],
    alpha: f64,
    metadata: ReportMetadata,
) -> Result<FeatureReport, PipelineError> {
    if rows.is_empty() {
        return Err(PipelineError::EmptyDataset { path: None });
    }

    let correlation = CorrelationMatrix::compute(&correlation_inputs(rows));
    let target_correlations = correlation.with_target(TARGET_COLUMN);
    let influence_ranking = target_correlations
        .iter()
        .enumerate()
        .map(|(i, t)| InfluenceFactor {
            rank: i + 1,
            factor: t.column.clone(),
            correlation: t.correlation,
            abs_correlation: t.correlation.abs(),
        })
        .collect();

    let charges = |r: &EnrichedRecord| r.record.charges;
    let ages: Vec<f64> = rows.iter().map(|r| r.record.age as f64).collect();
    let bmis: Vec<f64> = rows.iter().map(|r| r.record.bmi).collect();
    let values: Vec<f64> = rows.iter().map(charges).collect();

    Ok(FeatureReport {
        metadata,
        target_correlations,
        by_age_category: aggregate(rows, |r| r.age_category, charges, SortPolicy::KeyAscending),
        by_bmi_category: aggregate(rows, |r| r.bmi_category, charges, SortPolicy::KeyAscending),
        by_children: aggregate(rows, |r| r.record.children, charges, SortPolicy::KeyAscending),
        trends: Trends {
            age: linear_fit(&ages, &values),
            bmi: linear_fit(&bmis, &values),
        },
        smoker_comparison: compare_smokers(rows, alpha)?,
        smoker_bmi: pivot_mean(rows, |r| r.record.smoker, |r| r.bmi_category, charges),
        age_bmi: pivot_mean(rows, |r| r.age_category, |r| r.bmi_category, charges),
        influence_ranking,
        correlation,
    })
}
