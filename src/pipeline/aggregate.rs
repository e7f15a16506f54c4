//! Group aggregates and two-way pivots of a numeric target

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::stats;

/// Summary of the target values within one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats<K> {
    pub key: K,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; absent for a single-row group
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl<K> GroupStats<K> {
    /// Summarize one group; `None` for an empty group.
    pub fn from_values(key: K, values: &[f64]) -> Option<Self> {
        let mean = stats::mean(values)?;
        let median = stats::median(values)?;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            key,
            count: values.len(),
            mean,
            median,
            std: stats::sample_std(values),
            min,
            max,
        })
    }
}

/// Ordering of aggregated groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortPolicy {
    #[default]
    KeyAscending,
    MeanDescending,
    MeanAscending,
}

/// Group `rows` by `key` and summarize `value` per group.
pub fn aggregate<T, K, FK, FV>(rows: &[T], key: FK, value: FV, sort: SortPolicy) -> Vec<GroupStats<K>>
where
    K: Ord + Clone,
    FK: Fn(&T) -> K,
    FV: Fn(&T) -> f64,
{
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(value(row));
    }

    let mut out: Vec<GroupStats<K>> = groups
        .into_iter()
        .filter_map(|(k, values)| GroupStats::from_values(k, &values))
        .collect();

    let by_mean = |a: &GroupStats<K>, b: &GroupStats<K>| {
        a.mean
            .partial_cmp(&b.mean)
            .unwrap_or(std::cmp::Ordering::Equal)
    };
    match sort {
        SortPolicy::KeyAscending => {}
        SortPolicy::MeanAscending => out.sort_by(by_mean),
        SortPolicy::MeanDescending => out.sort_by(|a, b| by_mean(b, a)),
    }
    out
}

/// Two-way table of mean target values; absent combinations are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pivot<R, C> {
    pub rows: Vec<R>,
    pub columns: Vec<C>,
    /// `cells[i][j]` belongs to `rows[i]` and `columns[j]`
    pub cells: Vec<Vec<Option<f64>>>,
}

impl<R: PartialEq, C: PartialEq> Pivot<R, C> {
    pub fn get(&self, row: &R, column: &C) -> Option<f64> {
        let i = self.rows.iter().position(|r| r == row)?;
        let j = self.columns.iter().position(|c| c == column)?;
        self.cells[i][j]
    }
}

/// Pivot over the keys that actually occur in `rows`, both axes ascending.
pub fn pivot_mean<T, R, C, FR, FC, FV>(rows: &[T], row_key: FR, col_key: FC, value: FV) -> Pivot<R, C>
where
    R: Ord + Clone,
    C: Ord + Clone,
    FR: Fn(&T) -> R,
    FC: Fn(&T) -> C,
    FV: Fn(&T) -> f64,
{
    let row_axis: Vec<R> = rows.iter().map(&row_key).collect::<BTreeSet<_>>().into_iter().collect();
    let col_axis: Vec<C> = rows.iter().map(&col_key).collect::<BTreeSet<_>>().into_iter().collect();
    pivot_mean_with_axes(rows, &row_axis, &col_axis, row_key, col_key, value)
}

/// Pivot over caller-supplied axes, so keys with no rows still get a (null) cell.
pub fn pivot_mean_with_axes<T, R, C, FR, FC, FV>(
    rows: &[T],
    row_axis: &[R],
    col_axis: &[C],
    row_key: FR,
    col_key: FC,
    value: FV,
) -> Pivot<R, C>
where
    R: Ord + Clone,
    C: Ord + Clone,
    FR: Fn(&T) -> R,
    FC: Fn(&T) -> C,
    FV: Fn(&T) -> f64,
{
    let mut sums: BTreeMap<(R, C), (f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = sums.entry((row_key(row), col_key(row))).or_insert((0.0, 0));
        entry.0 += value(row);
        entry.1 += 1;
    }

    let cells = row_axis
        .iter()
        .map(|r| {
            col_axis
                .iter()
                .map(|c| {
                    sums.get(&(r.clone(), c.clone()))
                        .map(|(sum, n)| sum / *n as f64)
                })
                .collect()
        })
        .collect();

    Pivot {
        rows: row_axis.to_vec(),
        columns: col_axis.to_vec(),
        cells,
    }
}

/// Number of rows holding one key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyCount<K> {
    pub key: K,
    pub count: usize,
    pub pct: f64,
}

/// Count rows per key, keys ascending. Percentages are of all rows.
pub fn count_by<T, K, FK>(rows: &[T], key: FK) -> Vec<KeyCount<K>>
where
    K: Ord,
    FK: Fn(&T) -> K,
{
    let mut counts: BTreeMap<K, usize> = BTreeMap::new();
    for row in rows {
        *counts.entry(key(row)).or_insert(0) += 1;
    }
    let total = rows.len() as f64;
    counts
        .into_iter()
        .map(|(key, count)| KeyCount {
            key,
            count,
            pct: count as f64 / total * 100.0,
        })
        .collect()
}

/// Two-way table of row counts over caller-supplied axes.
///
/// Unlike [`Pivot`], an empty combination is a real zero count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Crosstab<R, C> {
    pub rows: Vec<R>,
    pub columns: Vec<C>,
    pub counts: Vec<Vec<usize>>,
}

impl<R: PartialEq, C: PartialEq> Crosstab<R, C> {
    pub fn get(&self, row: &R, column: &C) -> Option<usize> {
        let i = self.rows.iter().position(|r| r == row)?;
        let j = self.columns.iter().position(|c| c == column)?;
        Some(self.counts[i][j])
    }
}

pub fn crosstab<T, R, C, FR, FC>(
    rows: &[T],
    row_axis: &[R],
    col_axis: &[C],
    row_key: FR,
    col_key: FC,
) -> Crosstab<R, C>
where
    R: Ord + Clone,
    C: Ord + Clone,
    FR: Fn(&T) -> R,
    FC: Fn(&T) -> C,
{
    let mut counts: BTreeMap<(R, C), usize> = BTreeMap::new();
    for row in rows {
        *counts.entry((row_key(row), col_key(row))).or_insert(0) += 1;
    }

    Crosstab {
        rows: row_axis.to_vec(),
        columns: col_axis.to_vec(),
        counts: row_axis
            .iter()
            .map(|r| {
                col_axis
                    .iter()
                    .map(|c| counts.get(&(r.clone(), c.clone())).copied().unwrap_or(0))
                    .collect()
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_row_group_has_no_std() {
        let g = GroupStats::from_values("a", &[5.0]).unwrap();
        assert_eq!(g.std, None);
        assert_eq!(g.min, 5.0);
        assert_eq!(g.max, 5.0);
    }

    #[test]
    fn test_sort_policies() {
        let rows = [("b", 1.0), ("a", 10.0), ("c", 5.0)];
        let keys = |s: SortPolicy| -> Vec<&str> {
            aggregate(&rows, |r| r.0, |r| r.1, s)
                .into_iter()
                .map(|g| g.key)
                .collect()
        };
        assert_eq!(keys(SortPolicy::KeyAscending), vec!["a", "b", "c"]);
        assert_eq!(keys(SortPolicy::MeanDescending), vec!["a", "c", "b"]);
        assert_eq!(keys(SortPolicy::MeanAscending), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_pivot_absent_cell_is_none() {
        let rows = [("x", 1, 2.0), ("x", 1, 4.0), ("y", 2, 8.0)];
        let p = pivot_mean(&rows, |r| r.0, |r| r.1, |r| r.2);
        assert_eq!(p.get(&"x", &1), Some(3.0));
        assert_eq!(p.get(&"x", &2), None);
        assert_eq!(p.get(&"y", &2), Some(8.0));
    }

    #[test]
    fn test_count_by_percentages() {
        let rows = [2u8, 0, 2, 1, 2];
        let counts = count_by(&rows, |r| *r);
        assert_eq!(counts.iter().map(|c| c.key).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(counts[2].count, 3);
        assert!((counts[2].pct - 60.0).abs() < 1e-12);
        assert!(count_by(&[] as &[u8], |r| *r).is_empty());
    }

    #[test]
    fn test_crosstab_zero_for_empty_pair() {
        let rows = [("x", 1), ("x", 1), ("y", 2)];
        let t = crosstab(&rows, &["x", "y"], &[1, 2], |r| r.0, |r| r.1);
        assert_eq!(t.get(&"x", &1), Some(2));
        assert_eq!(t.get(&"x", &2), Some(0));
        assert_eq!(t.get(&"z", &1), None);
    }
}
