//! Regional analysis report

use serde::Serialize;

use super::export::ReportMetadata;
use crate::pipeline::hypothesis::one_way_anova;
use crate::pipeline::{
    aggregate, pivot_mean_with_axes, stats, Categorical, EnrichedRecord, GroupStats,
    PipelineError, Pivot, Region, Sex, SortPolicy, Smoker, TestReport,
};

/// Who lives in a region and what they pay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionProfile {
    pub region: Region,
    pub observations: usize,
    pub mean_charges: f64,
    pub mean_age: f64,
    pub mean_bmi: f64,
    pub smoker_pct: f64,
    pub mean_children: f64,
    pub male: usize,
    pub female: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRegion {
    pub rank: usize,
    pub region: Region,
    pub mean_charges: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalReport {
    pub metadata: ReportMetadata,
    pub by_region: Vec<GroupStats<Region>>,
    pub anova: TestReport,
    pub profiles: Vec<RegionProfile>,
    pub region_smoker: Pivot<Region, Smoker>,
    pub ranking: Vec<RankedRegion>,
    pub most_expensive: Option<Region>,
    pub least_expensive: Option<Region>,
    /// Mean charges of the most expensive minus the least expensive region
    pub spread: Option<f64>,
}

/// Profile every region that has at least one row, in region order.
pub fn profile_regions(rows: &[EnrichedRecord]) -> Vec<RegionProfile> {
    Region::ALL
        .iter()
        .filter_map(|&region| {
            let members: Vec<&EnrichedRecord> =
                rows.iter().filter(|r| r.record.region == region).collect();
            if members.is_empty() {
                return None;
            }
            let mean_of = |f: fn(&EnrichedRecord) -> f64| {
                let values: Vec<f64> = members.iter().map(|r| f(r)).collect();
                stats::mean(&values).unwrap_or(0.0)
            };
            let n = members.len();
            let smokers = members.iter().filter(|r| r.record.is_smoker()).count();
            let male = members.iter().filter(|r| r.record.sex == Sex::Male).count();

            Some(RegionProfile {
                region,
                observations: n,
                mean_charges: mean_of(|r| r.record.charges),
                mean_age: mean_of(|r| r.record.age as f64),
                mean_bmi: mean_of(|r| r.record.bmi),
                smoker_pct: smokers as f64 / n as f64 * 100.0,
                mean_children: mean_of(|r| r.record.children as f64),
                male,
                female: n - male,
            })
        })
        .collect()
}

pub fn analyze(
    rows: &[EnrichedRecord],
    alpha: f64,
    metadata: ReportMetadata,
) -> Result<RegionalReport, PipelineError> {
    if rows.is_empty() {
        return Err(PipelineError::EmptyDataset { path: None });
    }
    let charges = |r: &EnrichedRecord| r.record.charges;

    let by_region = aggregate(rows, |r| r.record.region, charges, SortPolicy::KeyAscending);

    let groups: Vec<Vec<f64>> = by_region
        .iter()
        .map(|g| {
            rows.iter()
                .filter(|r| r.record.region == g.key)
                .map(charges)
                .collect()
        })
        .collect();
    let slices: Vec<&[f64]> = groups.iter().map(Vec::as_slice).collect();
    let anova = TestReport::from_result(one_way_anova(&slices, alpha))?;

    let ranked = aggregate(rows, |r| r.record.region, charges, SortPolicy::MeanDescending);
    let ranking: Vec<RankedRegion> = ranked
        .iter()
        .enumerate()
        .map(|(i, g)| RankedRegion {
            rank: i + 1,
            region: g.key,
            mean_charges: g.mean,
        })
        .collect();
    let most = ranked.first();
    let least = ranked.last();

    Ok(RegionalReport {
        metadata,
        anova,
        profiles: profile_regions(rows),
        region_smoker: pivot_mean_with_axes(
            rows,
            Region::ALL,
            Smoker::ALL,
            |r| r.record.region,
            |r| r.record.smoker,
            charges,
        ),
        most_expensive: most.map(|g| g.key),
        least_expensive: least.map(|g| g.key),
        spread: most.zip(least).map(|(m, l)| m.mean - l.mean),
        ranking,
        by_region,
    })
}
