//! `visualizations` stage: the data series behind the comparative charts

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;

use super::{load_enriched, spin, Stage};
use crate::cli::Config;
use crate::report::visualizations::{self, ChartDataReport};
use crate::report::{
    export_json, print_group_table, print_pivot_table, print_table, ReportMetadata, StageSummary,
};
use crate::utils::{
    format_money, print_completion, print_stage_banner, print_step_header, print_step_time,
    print_success,
};

pub fn run(config: &Config) -> Result<PathBuf> {
    let input = config.clean_path();
    let output = Stage::Visualizations.report_path(config);
    print_stage_banner("Chart Data", &input, &output, None);

    // Step 1: Load
    print_step_header(1, "Load Cleaned Dataset");
    let step_start = Instant::now();
    let table = load_enriched(config)?;
    print_step_time(step_start.elapsed());

    // Step 2: Series
    print_step_header(2, "Distributions and Counts");
    let step_start = Instant::now();
    let metadata = ReportMetadata::new(Stage::Visualizations.name(), &input, None);
    let report = spin("Building chart series...", "Chart series built", || {
        visualizations::analyze(&table.rows, metadata)
    })?;
    print_report(&report);
    print_step_time(step_start.elapsed());

    // Step 3: Export
    print_step_header(3, "Export Report");
    export_json(&report, &output)?;
    print_success(&format!("Report saved to {}", output.display()));

    summarize(&report).display();
    print_completion("Chart data complete");
    Ok(output)
}

fn print_report(report: &ChartDataReport) {
    print_group_table("CHARGES BY SEX", &report.charges_by_sex);
    print_pivot_table("MEAN CHARGES: SEX × SMOKER", &report.sex_smoker);
    print_pivot_table("MEAN CHARGES: CHILDREN × SMOKER", &report.children_smoker);

    let age_sex = report
        .age_sex
        .iter()
        .map(|g| {
            vec![
                g.key.0.to_string(),
                g.key.1.to_string(),
                g.count.to_string(),
                format_money(g.mean),
                g.std.map(format_money).unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(
        "MEAN CHARGES: AGE CATEGORY × SEX",
        vec!["Age", "Sex", "Count", "Mean", "Std"],
        age_sex,
    );

    let counts = &report.sex_smoker_counts;
    let rows = counts
        .rows
        .iter()
        .zip(&counts.counts)
        .map(|(sex, line)| {
            let mut cells = vec![sex.to_string()];
            cells.extend(line.iter().map(|c| c.to_string()));
            cells
        })
        .collect();
    let mut header = vec![String::new()];
    header.extend(counts.columns.iter().map(|c| format!("smoker={}", c)));
    print_table(
        "COUNTS: SEX × SMOKER",
        header.iter().map(String::as_str).collect(),
        rows,
    );

    let risk = report
        .risk_score_counts
        .iter()
        .map(|c| {
            vec![
                c.key.to_string(),
                c.count.to_string(),
                format!("{:.1}%", c.pct),
            ]
        })
        .collect();
    print_table("COUNTS BY RISK SCORE", vec!["Score", "Count", "Share"], risk);
}

fn summarize(report: &ChartDataReport) -> StageSummary {
    let mut summary = StageSummary::new("Chart data summary");
    summary.add("Smoker distributions", report.smoker_distributions.len());
    summary.add("Histogram series", report.charges_histograms.series.len());
    summary.add("Histogram bins", visualizations::HISTOGRAM_BINS);
    summary.add("BMI categories", report.bmi_category_counts.len());
    summary.add("Risk score levels", report.risk_score_counts.len());
    summary
}
