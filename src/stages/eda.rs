//! `eda` stage: exploratory analysis of the raw dataset

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::Color;

use super::{spin, Stage};
use crate::cli::Config;
use crate::pipeline::{load_frame, validate_frame};
use crate::report::eda::{self, EdaReport};
use crate::report::{export_json, print_table, ReportMetadata, StageSummary};
use crate::utils::{
    format_money, print_completion, print_info, print_kv, print_stage_banner, print_step_header,
    print_step_time, print_success, print_warning,
};

pub fn run(config: &Config) -> Result<PathBuf> {
    let input = config.raw_path();
    let output = Stage::Eda.report_path(config);
    print_stage_banner("Exploratory Data Analysis", &input, &output, None);

    // Step 1: Load and validate
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let df = spin("Reading dataset...", "Dataset loaded", || {
        let df = load_frame(&input, config.infer_schema_length)?;
        validate_frame(&df).map_err(|e| e.with_path(&input))?;
        Ok(df)
    })
    .with_context(|| format!("EDA could not load {}", input.display()))?;
    print_kv("Rows", df.height());
    print_kv("Columns", df.width());
    print_step_time(step_start.elapsed());

    // Step 2: Analysis
    print_step_header(2, "Descriptive Statistics");
    let step_start = Instant::now();
    let metadata = ReportMetadata::new(Stage::Eda.name(), &input, None);
    let report = spin("Computing statistics...", "Statistics computed", || {
        eda::analyze(&df, metadata)
    })?;
    print_report(&report);
    print_step_time(step_start.elapsed());

    // Step 3: Export
    print_step_header(3, "Export Report");
    export_json(&report, &output)?;
    print_success(&format!("Report saved to {}", output.display()));

    summarize(&report).display();
    print_completion("EDA complete");
    Ok(output)
}

fn print_report(report: &EdaReport) {
    let describe_rows = report
        .numeric
        .iter()
        .map(|n| {
            let d = &n.describe;
            vec![
                n.column.clone(),
                d.count.to_string(),
                format!("{:.2}", d.mean),
                d.std.map(|s| format!("{:.2}", s)).unwrap_or_else(|| "-".into()),
                format!("{:.2}", d.min),
                format!("{:.2}", d.q1),
                format!("{:.2}", d.median),
                format!("{:.2}", d.q3),
                format!("{:.2}", d.max),
            ]
        })
        .collect();
    print_table(
        "NUMERIC COLUMNS",
        vec!["Column", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"],
        describe_rows,
    );

    let count_rows = report
        .categorical
        .iter()
        .flat_map(|c| {
            c.values.iter().map(move |v| {
                vec![
                    c.column.clone(),
                    v.value.clone(),
                    v.count.to_string(),
                    format!("{:.1}%", v.pct),
                ]
            })
        })
        .collect();
    print_table(
        "CATEGORICAL COLUMNS",
        vec!["Column", "Value", "Count", "Share"],
        count_rows,
    );

    let missing: Vec<_> = report.missing.iter().filter(|m| m.count > 0).collect();
    if missing.is_empty() {
        print_info("No missing values");
    } else {
        for m in missing {
            print_warning(&format!(
                "{}: {} missing ({:.1}%)",
                m.column, m.count, m.pct
            ));
        }
    }

    for o in report.outliers.iter().filter(|o| o.count > 0) {
        print_info(&format!(
            "{}: {} outlier(s) outside [{:.2}, {:.2}]",
            o.column, o.count, o.lower_bound, o.upper_bound
        ));
    }
}

fn summarize(report: &EdaReport) -> StageSummary {
    let mut summary = StageSummary::new("EDA summary");
    summary
        .add("Rows", report.shape.rows)
        .add("Columns", report.shape.columns)
        .add(
            "Missing cells",
            report.missing.iter().map(|m| m.count).sum::<usize>(),
        );
    if report.duplicates.count > 0 {
        summary.add_highlighted(
            "Duplicate rows",
            format!("{} ({:.1}%)", report.duplicates.count, report.duplicates.pct),
            Color::Yellow,
        );
    } else {
        summary.add("Duplicate rows", 0);
    }
    if let Some(target) = &report.target {
        summary
            .add("Mean charges", format_money(target.mean))
            .add("Median charges", format_money(target.median));
        if let Some(skew) = target.skewness {
            summary.add("Skewness", format!("{:.3}", skew));
        }
        if let Some(kurt) = target.kurtosis {
            summary.add("Excess kurtosis", format!("{:.3}", kurt));
        }
    }
    summary
}
