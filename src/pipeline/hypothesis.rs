//! Significance tests: pooled two-sample t-test and one-way ANOVA
//!
//! Both tests fail with [`PipelineError::InsufficientData`] instead of
//! producing NaN statistics; stages turn that into a skipped entry.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use super::error::PipelineError;
use super::stats;

/// Significance level used when none is given.
pub const DEFAULT_ALPHA: f64 = 0.05;

pub const T_TEST: &str = "independent t-test";
pub const ANOVA: &str = "one-way ANOVA";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DegreesOfFreedom {
    Single(f64),
    Pair { between: f64, within: f64 },
}

/// Result of a completed test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestOutcome {
    pub test: String,
    pub statistic: f64,
    pub df: DegreesOfFreedom,
    pub p_value: f64,
    pub alpha: f64,
    pub significant: bool,
}

impl TestOutcome {
    fn new(test: &str, statistic: f64, df: DegreesOfFreedom, p_value: f64, alpha: f64) -> Self {
        Self {
            test: test.to_string(),
            statistic,
            df,
            p_value,
            alpha,
            significant: p_value < alpha,
        }
    }
}

/// A test as it appears in a report: either run or skipped with a reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TestReport {
    Completed(TestOutcome),
    Skipped { test: String, reason: String },
}

impl TestReport {
    /// Turn an insufficient-data failure into a skipped entry; other errors pass through.
    pub fn from_result(result: Result<TestOutcome, PipelineError>) -> Result<Self, PipelineError> {
        match result {
            Ok(outcome) => Ok(TestReport::Completed(outcome)),
            Err(PipelineError::InsufficientData { test, reason }) => {
                Ok(TestReport::Skipped { test, reason })
            }
            Err(other) => Err(other),
        }
    }

    pub fn outcome(&self) -> Option<&TestOutcome> {
        match self {
            TestReport::Completed(outcome) => Some(outcome),
            TestReport::Skipped { .. } => None,
        }
    }
}

/// Student's t-test for two independent samples with pooled variance, two-sided.
pub fn t_test_independent(a: &[f64], b: &[f64], alpha: f64) -> Result<TestOutcome, PipelineError> {
    for (name, group) in [("first", a), ("second", b)] {
        if group.len() < 2 {
            return Err(PipelineError::insufficient(
                T_TEST,
                format!("{} group has {} observation(s), need at least 2", name, group.len()),
            ));
        }
    }

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let insufficient = || PipelineError::insufficient(T_TEST, "groups are empty");
    let (m1, m2) = (
        stats::mean(a).ok_or_else(insufficient)?,
        stats::mean(b).ok_or_else(insufficient)?,
    );
    let (v1, v2) = (
        stats::sample_variance(a).ok_or_else(insufficient)?,
        stats::sample_variance(b).ok_or_else(insufficient)?,
    );

    let df = n1 + n2 - 2.0;
    let pooled = ((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / df;
    if pooled == 0.0 {
        return Err(PipelineError::insufficient(T_TEST, "both groups have zero variance"));
    }

    let t = (m1 - m2) / (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| PipelineError::insufficient(T_TEST, e.to_string()))?;
    let p_value = (2.0 * dist.sf(t.abs())).min(1.0);

    Ok(TestOutcome::new(
        T_TEST,
        t,
        DegreesOfFreedom::Single(df),
        p_value,
        alpha,
    ))
}

/// One-way ANOVA F-test across `groups`.
pub fn one_way_anova(groups: &[&[f64]], alpha: f64) -> Result<TestOutcome, PipelineError> {
    if groups.len() < 2 {
        return Err(PipelineError::insufficient(
            ANOVA,
            format!("{} group(s) given, need at least 2", groups.len()),
        ));
    }
    if let Some(small) = groups.iter().find(|g| g.len() < 2) {
        return Err(PipelineError::insufficient(
            ANOVA,
            format!("a group has {} observation(s), need at least 2", small.len()),
        ));
    }

    let k = groups.len() as f64;
    let n: usize = groups.iter().map(|g| g.len()).sum();
    let all: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let grand_mean =
        stats::mean(&all).ok_or_else(|| PipelineError::insufficient(ANOVA, "no observations"))?;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let m = stats::mean(group).unwrap_or(grand_mean);
        ss_between += group.len() as f64 * (m - grand_mean).powi(2);
        ss_within += group.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    }

    let df_between = k - 1.0;
    let df_within = n as f64 - k;
    if ss_within == 0.0 {
        return Err(PipelineError::insufficient(ANOVA, "within-group variance is zero"));
    }

    let f = (ss_between / df_between) / (ss_within / df_within);
    let dist = FisherSnedecor::new(df_between, df_within)
        .map_err(|e| PipelineError::insufficient(ANOVA, e.to_string()))?;
    let p_value = dist.sf(f);

    Ok(TestOutcome::new(
        ANOVA,
        f,
        DegreesOfFreedom::Pair {
            between: df_between,
            within: df_within,
        },
        p_value,
        alpha,
    ))
}
