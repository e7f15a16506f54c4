//! Chart data report: the series behind each comparative chart
//!
//! Nothing is drawn here. Each field holds the aggregate a chart of the
//! cleaned dataset would plot, so any front end can render it from JSON.

use serde::Serialize;

use super::export::ReportMetadata;
use crate::pipeline::stats::{linear_fit, Describe, LinearFit};
use crate::pipeline::{
    aggregate, count_by, crosstab, pivot_mean, pivot_mean_with_axes, Bucket, Categorical,
    Crosstab, EnrichedRecord, GroupStats, KeyCount, NumericColumn, PipelineError, Pivot, Region,
    Sex, SortPolicy, Smoker,
};

/// Equal-width bins of the charges histograms.
pub const HISTOGRAM_BINS: usize = 30;

/// Distribution of one numeric column within one smoker group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmokerDistribution {
    pub smoker: Smoker,
    pub column: NumericColumn,
    pub describe: Describe,
}

/// Charges histogram of one region and smoker status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSeries {
    pub region: Region,
    pub smoker: Smoker,
    pub counts: Vec<usize>,
}

/// Histograms sharing one set of bin edges (`HISTOGRAM_BINS + 1` values).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargesHistograms {
    pub edges: Vec<f64>,
    pub series: Vec<HistogramSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataReport {
    pub metadata: ReportMetadata,
    pub smoker_distributions: Vec<SmokerDistribution>,
    pub age_bmi: Pivot<Bucket, Bucket>,
    pub charges_by_sex: Vec<GroupStats<Sex>>,
    pub charges_by_region: Vec<GroupStats<Region>>,
    pub charges_by_age_category: Vec<GroupStats<Bucket>>,
    pub charges_by_bmi_category: Vec<GroupStats<Bucket>>,
    pub children_smoker: Pivot<u32, Smoker>,
    pub sex_smoker: Pivot<Sex, Smoker>,
    pub age_trend: Option<LinearFit>,
    pub bmi_trend: Option<LinearFit>,
    pub charges_histograms: ChargesHistograms,
    pub age_sex: Vec<GroupStats<(Bucket, Sex)>>,
    pub sex_smoker_counts: Crosstab<Sex, Smoker>,
    pub region_counts: Vec<KeyCount<Region>>,
    pub bmi_category_counts: Vec<KeyCount<Bucket>>,
    pub risk_score_counts: Vec<KeyCount<u8>>,
}

/// Describe every numeric column for smokers and non-smokers; a group with
/// no rows is left out.
pub fn smoker_distributions(rows: &[EnrichedRecord]) -> Vec<SmokerDistribution> {
    let mut out = Vec::new();
    for &smoker in Smoker::ALL {
        let members: Vec<&EnrichedRecord> =
            rows.iter().filter(|r| r.record.smoker == smoker).collect();
        for column in NumericColumn::ALL {
            let values: Vec<f64> = members.iter().map(|r| r.record.numeric(column)).collect();
            if let Some(describe) = Describe::from_values(&values) {
                out.push(SmokerDistribution {
                    smoker,
                    column,
                    describe,
                });
            }
        }
    }
    out
}

/// Counts of `values` in `bins` equal-width bins over `[lo, hi]`.
///
/// The last bin is closed so `hi` is counted; values outside the range are
/// ignored. A zero-width range puts everything in the first bin.
pub fn histogram(values: &[f64], lo: f64, hi: f64, bins: usize) -> Vec<usize> {
    let mut counts = vec![0; bins];
    if bins == 0 {
        return counts;
    }
    let width = (hi - lo) / bins as f64;
    for &v in values {
        if v < lo || v > hi {
            continue;
        }
        let index = if width > 0.0 {
            (((v - lo) / width) as usize).min(bins - 1)
        } else {
            0
        };
        counts[index] += 1;
    }
    counts
}

/// Histograms of charges for every region × smoker pair, on shared edges.
pub fn charges_histograms(rows: &[EnrichedRecord], bins: usize) -> ChargesHistograms {
    if rows.is_empty() {
        return ChargesHistograms {
            edges: Vec::new(),
            series: Vec::new(),
        };
    }
    let charges = || rows.iter().map(|r| r.record.charges);
    let lo = charges().fold(f64::INFINITY, f64::min);
    let hi = charges().fold(f64::NEG_INFINITY, f64::max);

    let width = (hi - lo) / bins as f64;
    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();

    let mut series = Vec::new();
    for &region in Region::ALL {
        for &smoker in Smoker::ALL {
            let values: Vec<f64> = rows
                .iter()
                .filter(|r| r.record.region == region && r.record.smoker == smoker)
                .map(|r| r.record.charges)
                .collect();
            series.push(HistogramSeries {
                region,
                smoker,
                counts: histogram(&values, lo, hi, bins),
            });
        }
    }
    ChargesHistograms { edges, series }
}

pub fn analyze(
    rows: &[EnrichedRecord],
    metadata: ReportMetadata,
) -> Result<ChartDataReport, PipelineError> {
    if rows.is_empty() {
        return Err(PipelineError::EmptyDataset { path: None });
    }

    let charges = |r: &EnrichedRecord| r.record.charges;
    let by = SortPolicy::KeyAscending;
    let values: Vec<f64> = rows.iter().map(charges).collect();
    let ages: Vec<f64> = rows.iter().map(|r| r.record.age as f64).collect();
    let bmis: Vec<f64> = rows.iter().map(|r| r.record.bmi).collect();

    Ok(ChartDataReport {
        metadata,
        smoker_distributions: smoker_distributions(rows),
        age_bmi: pivot_mean(rows, |r| r.age_category, |r| r.bmi_category, charges),
        charges_by_sex: aggregate(rows, |r| r.record.sex, charges, by),
        charges_by_region: aggregate(rows, |r| r.record.region, charges, by),
        charges_by_age_category: aggregate(rows, |r| r.age_category, charges, by),
        charges_by_bmi_category: aggregate(rows, |r| r.bmi_category, charges, by),
        children_smoker: pivot_mean(rows, |r| r.record.children, |r| r.record.smoker, charges),
        sex_smoker: pivot_mean_with_axes(
            rows,
            Sex::ALL,
            Smoker::ALL,
            |r| r.record.sex,
            |r| r.record.smoker,
            charges,
        ),
        age_trend: linear_fit(&ages, &values),
        bmi_trend: linear_fit(&bmis, &values),
        charges_histograms: charges_histograms(rows, HISTOGRAM_BINS),
        age_sex: aggregate(rows, |r| (r.age_category, r.record.sex), charges, by),
        sex_smoker_counts: crosstab(
            rows,
            Sex::ALL,
            Smoker::ALL,
            |r| r.record.sex,
            |r| r.record.smoker,
        ),
        region_counts: count_by(rows, |r| r.record.region),
        bmi_category_counts: count_by(rows, |r| r.bmi_category),
        risk_score_counts: count_by(rows, |r| r.risk_score),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_closes_last_bin() {
        let counts = histogram(&[0.0, 0.5, 1.0, 9.99, 10.0, 11.0], 0.0, 10.0, 10);
        assert_eq!(counts[0], 2);
        assert_eq!(counts[1], 1);
        assert_eq!(counts[9], 2);
        assert_eq!(counts.iter().sum::<usize>(), 5);
    }

    #[test]
    fn test_histogram_zero_width_range() {
        assert_eq!(histogram(&[3.0, 3.0], 3.0, 3.0, 4), vec![2, 0, 0, 0]);
    }
}
