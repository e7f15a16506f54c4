//! `features` stage: correlations, category aggregates, trends and the
//! smoker comparison over the cleaned dataset

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use console::style;

use super::{load_enriched, print_test, spin, Stage};
use crate::cli::Config;
use crate::report::features::{self, FeatureReport};
use crate::report::{
    export_json, print_group_table, print_pivot_table, print_table, ReportMetadata, StageSummary,
};
use crate::utils::{
    format_money, print_completion, print_kv, print_stage_banner, print_step_header,
    print_step_time, print_success,
};

pub fn run(config: &Config) -> Result<PathBuf> {
    let input = config.clean_path();
    let output = Stage::Features.report_path(config);
    print_stage_banner("Feature Analysis", &input, &output, Some(config.alpha));

    // Step 1: Load
    print_step_header(1, "Load Cleaned Dataset");
    let step_start = Instant::now();
    let table = load_enriched(config)?;
    print_step_time(step_start.elapsed());

    // Step 2: Analysis
    print_step_header(2, "Correlations and Aggregates");
    let step_start = Instant::now();
    let metadata = ReportMetadata::new(Stage::Features.name(), &input, Some(config.alpha));
    let report = spin("Analyzing features...", "Feature analysis complete", || {
        features::analyze(&table.rows, config.alpha, metadata)
    })?;
    print_report(&report);
    print_step_time(step_start.elapsed());

    // Step 3: Export
    print_step_header(3, "Export Report");
    export_json(&report, &output)?;
    print_success(&format!("Report saved to {}", output.display()));

    summarize(&report).display();
    print_completion("Feature analysis complete");
    Ok(output)
}

fn print_report(report: &FeatureReport) {
    let ranking = report
        .influence_ranking
        .iter()
        .map(|f| {
            vec![
                f.rank.to_string(),
                f.factor.clone(),
                format!("{:+.4}", f.correlation),
            ]
        })
        .collect();
    print_table(
        "CORRELATION WITH CHARGES",
        vec!["Rank", "Factor", "Pearson r"],
        ranking,
    );

    print_group_table("CHARGES BY AGE CATEGORY", &report.by_age_category);
    print_group_table("CHARGES BY BMI CATEGORY", &report.by_bmi_category);
    print_group_table("CHARGES BY CHILDREN", &report.by_children);

    println!("\n    {} Trends:", style("✧").cyan());
    for (name, fit) in [("age", &report.trends.age), ("bmi", &report.trends.bmi)] {
        match fit {
            Some(fit) => print_kv(
                &format!("charges ~ {}", name),
                format!("slope={:.2}, intercept={:.2}", fit.slope, fit.intercept),
            ),
            None => print_kv(&format!("charges ~ {}", name), "undefined"),
        }
    }

    let cmp = &report.smoker_comparison;
    println!("\n    {} Smokers vs non-smokers:", style("✧").cyan());
    let money = |v: Option<f64>| v.map(format_money).unwrap_or_else(|| "-".to_string());
    print_kv("Non-smoker mean", money(cmp.non_smoker_mean));
    print_kv("Smoker mean", money(cmp.smoker_mean));
    print_kv("Difference", money(cmp.difference));
    if let Some(ratio) = cmp.ratio {
        print_kv("Ratio", format!("{:.2}x", ratio));
    }
    print_test(&cmp.test);

    print_pivot_table("MEAN CHARGES: SMOKER × BMI CATEGORY", &report.smoker_bmi);
    print_pivot_table("MEAN CHARGES: AGE × BMI CATEGORY", &report.age_bmi);
}

fn summarize(report: &FeatureReport) -> StageSummary {
    let mut summary = StageSummary::new("Feature analysis summary");
    if let Some(top) = report.influence_ranking.first() {
        summary.add(
            "Strongest factor",
            format!("{} (r={:+.3})", top.factor, top.correlation),
        );
    }
    if let Some(ratio) = report.smoker_comparison.ratio {
        summary.add("Smoker cost ratio", format!("{:.2}x", ratio));
    }
    summary.add(
        "Smoker t-test",
        match report.smoker_comparison.test.outcome() {
            Some(o) if o.significant => "significant",
            Some(_) => "not significant",
            None => "skipped",
        },
    );
    summary
}
