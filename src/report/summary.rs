//! Terminal summary tables for stages, aggregates and the full run

use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{GroupStats, Pivot};
use crate::utils::format_money;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        header
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn print_title(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

/// Metric / value summary printed at the end of a stage.
#[derive(Debug, Default)]
pub struct StageSummary {
    pub title: String,
    rows: Vec<(String, String, Option<Color>)>,
}

impl StageSummary {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn add(&mut self, metric: &str, value: impl Display) -> &mut Self {
        self.rows.push((metric.to_string(), value.to_string(), None));
        self
    }

    pub fn add_highlighted(&mut self, metric: &str, value: impl Display, color: Color) -> &mut Self {
        self.rows
            .push((metric.to_string(), value.to_string(), Some(color)));
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn display(&self) {
        print_title("📋", &self.title.to_uppercase());

        let mut table = new_table(vec!["Metric", "Value"]);
        for (metric, value, color) in &self.rows {
            let mut cell = Cell::new(value);
            if let Some(color) = color {
                cell = cell.fg(*color).add_attribute(Attribute::Bold);
            }
            table.add_row(vec![Cell::new(metric), cell]);
        }
        print_indented(&table);
    }
}

/// Print a table of group aggregates of the charges column.
pub fn print_group_table<K: Display>(title: &str, groups: &[GroupStats<K>]) {
    print_title("📊", title);

    let mut table = new_table(vec!["Group", "Count", "Mean", "Median", "Std", "Min", "Max"]);
    for g in groups {
        table.add_row(vec![
            Cell::new(&g.key),
            Cell::new(g.count).set_alignment(CellAlignment::Right),
            Cell::new(format_money(g.mean)).set_alignment(CellAlignment::Right),
            Cell::new(format_money(g.median)).set_alignment(CellAlignment::Right),
            Cell::new(g.std.map(format_money).unwrap_or_else(|| "-".to_string()))
                .set_alignment(CellAlignment::Right),
            Cell::new(format_money(g.min)).set_alignment(CellAlignment::Right),
            Cell::new(format_money(g.max)).set_alignment(CellAlignment::Right),
        ]);
    }
    print_indented(&table);
}

/// Print a pivot of mean charges; absent cells show as `-`.
pub fn print_pivot_table<R: Display, C: Display>(title: &str, pivot: &Pivot<R, C>) {
    print_title("📊", title);

    let columns: Vec<String> = pivot.columns.iter().map(|c| c.to_string()).collect();
    let mut header = vec![""];
    header.extend(columns.iter().map(String::as_str));
    let mut table = new_table(header);

    for (row, cells) in pivot.rows.iter().zip(&pivot.cells) {
        let mut line = vec![Cell::new(row).add_attribute(Attribute::Bold)];
        line.extend(cells.iter().map(|v| {
            Cell::new(v.map(format_money).unwrap_or_else(|| "-".to_string()))
                .set_alignment(CellAlignment::Right)
        }));
        table.add_row(line);
    }
    print_indented(&table);
}

/// Print a plain table; the first column is the row label, the rest are
/// right-aligned values.
pub fn print_table(title: &str, header: Vec<&str>, rows: Vec<Vec<String>>) {
    print_title("📊", title);

    let mut table = new_table(header);
    for row in rows {
        let mut cells = row.into_iter();
        let mut line: Vec<Cell> = cells
            .next()
            .map(|label| Cell::new(label).add_attribute(Attribute::Bold))
            .into_iter()
            .collect();
        line.extend(cells.map(|v| Cell::new(v).set_alignment(CellAlignment::Right)));
        table.add_row(line);
    }
    print_indented(&table);
}

/// Result of one stage in a full run.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    pub stage: String,
    pub success: bool,
    pub elapsed: Duration,
    pub detail: Option<String>,
}

/// Summary of a full run across every stage.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<StageOutcome>,
    pub generated: Vec<PathBuf>,
    pub total: Duration,
}

impl RunSummary {
    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    /// The stage that stopped the run, if any.
    pub fn failed_stage(&self) -> Option<&str> {
        self.outcomes
            .iter()
            .find(|o| !o.success)
            .map(|o| o.stage.as_str())
    }

    pub fn display(&self) {
        print_title("📋", "RUN SUMMARY");

        let mut table = new_table(vec!["Stage", "Status", "Time"]);
        for o in &self.outcomes {
            let status = if o.success {
                Cell::new("✅ OK").fg(Color::Green)
            } else {
                Cell::new("❌ FAILED").fg(Color::Red).add_attribute(Attribute::Bold)
            };
            table.add_row(vec![
                Cell::new(&o.stage),
                status,
                Cell::new(format!("{:.2}s", o.elapsed.as_secs_f64()))
                    .set_alignment(CellAlignment::Right),
            ]);
        }
        table.add_row(vec![
            Cell::new("Total").add_attribute(Attribute::Bold),
            Cell::new(format!("{} ok / {} failed", self.successes(), self.failures())),
            Cell::new(format!("{:.2}s", self.total.as_secs_f64()))
                .set_alignment(CellAlignment::Right),
        ]);
        print_indented(&table);

        if !self.generated.is_empty() {
            print_title("📝", "GENERATED FILES");
            for path in &self.generated {
                println!("      {} {}", style("•").dim(), path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_summary_counts() {
        let summary = RunSummary {
            outcomes: vec![
                StageOutcome {
                    stage: "eda".into(),
                    success: true,
                    elapsed: Duration::from_millis(10),
                    detail: None,
                },
                StageOutcome {
                    stage: "preprocess".into(),
                    success: false,
                    elapsed: Duration::from_millis(5),
                    detail: Some("exit status 1".into()),
                },
            ],
            ..Default::default()
        };
        assert_eq!(summary.successes(), 1);
        assert_eq!(summary.failures(), 1);
        assert_eq!(summary.failed_stage(), Some("preprocess"));
    }

    #[test]
    fn test_stage_summary_rows() {
        let mut summary = StageSummary::new("Preprocessing");
        summary.add("Rows", 10).add("Columns", 27);
        assert_eq!(summary.len(), 2);
    }
}
