//! `regional` stage: per-region aggregates, profiles and ANOVA

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use console::style;

use super::{load_enriched, print_test, spin, Stage};
use crate::cli::Config;
use crate::report::regional::{self, RegionalReport};
use crate::report::{
    export_json, print_group_table, print_pivot_table, print_table, ReportMetadata, StageSummary,
};
use crate::utils::{
    format_money, print_completion, print_stage_banner, print_step_header, print_step_time,
    print_success,
};

pub fn run(config: &Config) -> Result<PathBuf> {
    let input = config.clean_path();
    let output = Stage::Regional.report_path(config);
    print_stage_banner("Regional Analysis", &input, &output, Some(config.alpha));

    // Step 1: Load
    print_step_header(1, "Load Cleaned Dataset");
    let step_start = Instant::now();
    let table = load_enriched(config)?;
    print_step_time(step_start.elapsed());

    // Step 2: Analysis
    print_step_header(2, "Regional Comparison");
    let step_start = Instant::now();
    let metadata = ReportMetadata::new(Stage::Regional.name(), &input, Some(config.alpha));
    let report = spin("Comparing regions...", "Regional analysis complete", || {
        regional::analyze(&table.rows, config.alpha, metadata)
    })?;
    print_report(&report);
    print_step_time(step_start.elapsed());

    // Step 3: Export
    print_step_header(3, "Export Report");
    export_json(&report, &output)?;
    print_success(&format!("Report saved to {}", output.display()));

    summarize(&report).display();
    print_completion("Regional analysis complete");
    Ok(output)
}

fn print_report(report: &RegionalReport) {
    print_group_table("CHARGES BY REGION", &report.by_region);

    println!("\n    {} Differences between regions:", style("✧").cyan());
    print_test(&report.anova);

    let profiles = report
        .profiles
        .iter()
        .map(|p| {
            vec![
                p.region.to_string(),
                p.observations.to_string(),
                format_money(p.mean_charges),
                format!("{:.1}", p.mean_age),
                format!("{:.1}", p.mean_bmi),
                format!("{:.1}%", p.smoker_pct),
                format!("{:.2}", p.mean_children),
                format!("{}/{}", p.male, p.female),
            ]
        })
        .collect();
    print_table(
        "REGION PROFILES",
        vec!["Region", "N", "Charges", "Age", "BMI", "Smokers", "Children", "M/F"],
        profiles,
    );

    print_pivot_table("MEAN CHARGES: REGION × SMOKER", &report.region_smoker);

    let ranking = report
        .ranking
        .iter()
        .map(|r| {
            vec![
                r.rank.to_string(),
                r.region.to_string(),
                format_money(r.mean_charges),
            ]
        })
        .collect();
    print_table(
        "REGIONS BY MEAN CHARGES",
        vec!["Rank", "Region", "Mean charges"],
        ranking,
    );
}

fn summarize(report: &RegionalReport) -> StageSummary {
    let mut summary = StageSummary::new("Regional summary");
    summary.add("Regions", report.by_region.len());
    if let Some(region) = report.most_expensive {
        summary.add("Most expensive", region);
    }
    if let Some(region) = report.least_expensive {
        summary.add("Least expensive", region);
    }
    if let Some(spread) = report.spread {
        summary.add("Spread", format_money(spread));
    }
    summary.add(
        "ANOVA",
        match report.anova.outcome() {
            Some(o) if o.significant => "significant",
            Some(_) => "not significant",
            None => "skipped",
        },
    );
    summary
}
