//! Filtered aggregation views for the interactive dashboard
//!
//! The dashboard never holds a global table: it owns an
//! [`AggregationCache`] over an immutable shared slice of enriched records,
//! and asks it for a [`FilteredView`] whenever a control changes. Views are
//! memoized by the filter parameters.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Serialize;

use super::aggregate::{aggregate, pivot_mean_with_axes, GroupStats, Pivot, SortPolicy};
use super::features::EnrichedRecord;
use super::schema::{Categorical, Record, Region, Sex, Smoker};
use super::stats;

/// Active dashboard controls. Ranges are inclusive on both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFilter {
    pub smokers: BTreeSet<Smoker>,
    pub regions: BTreeSet<Region>,
    pub sexes: BTreeSet<Sex>,
    pub age: (u32, u32),
    pub bmi: (f64, f64),
}

impl RecordFilter {
    /// Filter that selects every category and spans the data's age and bmi range.
    pub fn full(rows: &[EnrichedRecord]) -> Self {
        let ages = rows.iter().map(|r| r.record.age);
        let bmis = || rows.iter().map(|r| r.record.bmi);
        let age = (
            ages.clone().min().unwrap_or(0),
            ages.max().unwrap_or(0),
        );
        let bmi = if rows.is_empty() {
            (0.0, 0.0)
        } else {
            (
                bmis().fold(f64::INFINITY, f64::min),
                bmis().fold(f64::NEG_INFINITY, f64::max),
            )
        };

        Self {
            smokers: Smoker::ALL.iter().copied().collect(),
            regions: Region::ALL.iter().copied().collect(),
            sexes: Sex::ALL.iter().copied().collect(),
            age,
            bmi,
        }
    }

    pub fn matches(&self, r: &Record) -> bool {
        self.smokers.contains(&r.smoker)
            && self.regions.contains(&r.region)
            && self.sexes.contains(&r.sex)
            && r.age >= self.age.0
            && r.age <= self.age.1
            && r.bmi >= self.bmi.0
            && r.bmi <= self.bmi.1
    }

    pub fn key(&self) -> FilterKey {
        FilterKey {
            smokers: self.smokers.iter().copied().collect(),
            regions: self.regions.iter().copied().collect(),
            sexes: self.sexes.iter().copied().collect(),
            age: self.age,
            bmi: (self.bmi.0.to_bits(), self.bmi.1.to_bits()),
        }
    }
}

/// Hashable identity of a [`RecordFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterKey {
    smokers: Vec<Smoker>,
    regions: Vec<Region>,
    sexes: Vec<Sex>,
    age: (u32, u32),
    bmi: (u64, u64),
}

/// Headline numbers of a set of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub observations: usize,
    pub mean_charges: Option<f64>,
    pub median_charges: Option<f64>,
    pub smoker_pct: Option<f64>,
}

impl Kpis {
    pub fn from_rows(rows: &[&EnrichedRecord]) -> Self {
        let charges: Vec<f64> = rows.iter().map(|r| r.record.charges).collect();
        let smokers = rows.iter().filter(|r| r.record.is_smoker()).count();
        let smoker_pct = if rows.is_empty() {
            None
        } else {
            Some(smokers as f64 / rows.len() as f64 * 100.0)
        };

        Self {
            observations: rows.len(),
            mean_charges: stats::mean(&charges),
            median_charges: stats::median(&charges),
            smoker_pct,
        }
    }

    /// Difference of each headline number against `baseline`.
    pub fn delta(&self, baseline: &Kpis) -> KpiDelta {
        let diff = |a: Option<f64>, b: Option<f64>| Some(a? - b?);
        KpiDelta {
            mean_charges: diff(self.mean_charges, baseline.mean_charges),
            median_charges: diff(self.median_charges, baseline.median_charges),
            smoker_pct: diff(self.smoker_pct, baseline.smoker_pct),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiDelta {
    pub mean_charges: Option<f64>,
    pub median_charges: Option<f64>,
    pub smoker_pct: Option<f64>,
}

/// Everything the dashboard shows for one filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredView {
    pub total: usize,
    pub kpis: Kpis,
    /// Present only when the filter narrows the data
    pub delta: Option<KpiDelta>,
    pub by_region: Vec<GroupStats<Region>>,
    pub by_smoker: Vec<GroupStats<Smoker>>,
    /// Over the full region and smoker domains
    pub region_smoker: Pivot<Region, Smoker>,
}

impl FilteredView {
    pub fn matched(&self) -> usize {
        self.kpis.observations
    }
}

/// Compute the view for `filter` from scratch.
pub fn compute_view(
    table: &[EnrichedRecord],
    filter: &RecordFilter,
    baseline: Option<&Kpis>,
) -> FilteredView {
    let rows: Vec<&EnrichedRecord> = table.iter().filter(|r| filter.matches(&r.record)).collect();
    let kpis = Kpis::from_rows(&rows);
    let delta = baseline.map(|b| kpis.delta(b));
    let charges = |r: &&EnrichedRecord| r.record.charges;

    FilteredView {
        total: table.len(),
        by_region: aggregate(&rows, |r| r.record.region, charges, SortPolicy::KeyAscending),
        by_smoker: aggregate(&rows, |r| r.record.smoker, charges, SortPolicy::KeyAscending),
        region_smoker: pivot_mean_with_axes(
            &rows,
            Region::ALL,
            Smoker::ALL,
            |r| r.record.region,
            |r| r.record.smoker,
            charges,
        ),
        kpis,
        delta,
    }
}

/// Views kept by [`AggregationCache::new`].
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Memoized views over one immutable table.
///
/// Holds at most `capacity` views; the least recently used one is evicted
/// when a new view would exceed it.
#[derive(Debug)]
pub struct AggregationCache {
    table: Arc<[EnrichedRecord]>,
    full: RecordFilter,
    baseline: Kpis,
    views: HashMap<FilterKey, CachedView>,
    capacity: usize,
    clock: u64,
    hits: usize,
    misses: usize,
}

#[derive(Debug)]
struct CachedView {
    view: Arc<FilteredView>,
    last_used: u64,
}

impl AggregationCache {
    pub fn new(table: Arc<[EnrichedRecord]>) -> Self {
        Self::with_capacity(table, DEFAULT_CACHE_CAPACITY)
    }

    /// Cache holding at most `capacity` views (at least one).
    pub fn with_capacity(table: Arc<[EnrichedRecord]>, capacity: usize) -> Self {
        let full = RecordFilter::full(&table);
        let all: Vec<&EnrichedRecord> = table.iter().collect();
        let baseline = Kpis::from_rows(&all);
        Self {
            table,
            full,
            baseline,
            views: HashMap::new(),
            capacity: capacity.max(1),
            clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn table(&self) -> &Arc<[EnrichedRecord]> {
        &self.table
    }

    /// The filter that selects the whole table.
    pub fn full_filter(&self) -> &RecordFilter {
        &self.full
    }

    pub fn baseline(&self) -> &Kpis {
        &self.baseline
    }

    /// View for `filter`, computed on first request and shared afterwards.
    pub fn view(&mut self, filter: &RecordFilter) -> Arc<FilteredView> {
        self.clock += 1;
        let key = filter.key();
        if let Some(cached) = self.views.get_mut(&key) {
            self.hits += 1;
            cached.last_used = self.clock;
            return Arc::clone(&cached.view);
        }

        self.misses += 1;
        let baseline = (filter != &self.full).then_some(&self.baseline);
        let view = Arc::new(compute_view(&self.table, filter, baseline));
        if self.views.len() >= self.capacity {
            self.evict_least_recent();
        }
        self.views.insert(
            key,
            CachedView {
                view: Arc::clone(&view),
                last_used: self.clock,
            },
        );
        view
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .views
            .iter()
            .min_by_key(|(_, cached)| cached.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.views.remove(&key);
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn clear(&mut self) {
        self.views.clear();
        self.clock = 0;
        self.hits = 0;
        self.misses = 0;
    }
}
