//! `preprocess` stage: clean, encode, scale and enrich the raw dataset

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use super::{spin, Stage};
use crate::cli::Config;
use crate::pipeline::{
    clean_frame, load_frame, save_frame, validate_frame, EnrichedTable, NumericColumn,
};
use crate::report::{export_json, OutputFiles, PreprocessReport, ReportMetadata, StageSummary};
use crate::utils::{
    print_completion, print_count, print_info, print_kv, print_stage_banner, print_step_header,
    print_step_time, print_success,
};

pub fn run(config: &Config) -> Result<PathBuf> {
    let input = config.raw_path();
    let clean_path = config.clean_path();
    let essential_path = config.essential_path();
    let output = Stage::Preprocess.report_path(config);
    print_stage_banner("Preprocessing", &input, &clean_path, None);

    // Step 1: Load
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let df = spin("Reading dataset...", "Dataset loaded", || {
        let df = load_frame(&input, config.infer_schema_length)?;
        validate_frame(&df).map_err(|e| e.with_path(&input))?;
        Ok(df)
    })
    .with_context(|| format!("preprocessing could not load {}", input.display()))?;
    print_kv("Rows", df.height());
    print_step_time(step_start.elapsed());

    // Step 2: Missing values and duplicates
    print_step_header(2, "Cleaning");
    let step_start = Instant::now();
    let (records, clean) = spin("Filling missing values...", "Dataset cleaned", || {
        clean_frame(&df).map_err(|e| e.with_path(&input))
    })?;
    if clean.fills.is_empty() {
        print_info("No missing values to fill");
    } else {
        for fill in &clean.fills {
            print_kv(
                &format!("{} ({} filled)", fill.column, fill.filled),
                &fill.value,
            );
        }
    }
    if clean.duplicates_dropped > 0 {
        print_count("duplicate row(s) dropped", clean.duplicates_dropped, None);
    } else {
        print_info("No duplicate rows");
    }
    print_step_time(step_start.elapsed());

    // Step 3: Encoding, scaling and derived features
    print_step_header(3, "Feature Engineering");
    let step_start = Instant::now();
    let table = spin("Deriving features...", "Features derived", || {
        EnrichedTable::build(&records)
    })?;

    println!("\n    {} Label mappings:", style("✧").cyan());
    for mapping in table.model.encodings.mappings() {
        let pairs: Vec<String> = mapping
            .classes
            .iter()
            .map(|(class, code)| format!("{}={}", class, code))
            .collect();
        print_kv(&mapping.column, pairs.join(", "));
    }

    println!("\n    {} Scalers:", style("✧").cyan());
    for column in NumericColumn::ALL {
        let z = table.model.scaler(column);
        print_kv(
            column.name(),
            format!("mean={:.4}, std={:.4}", z.mean, z.scale),
        );
    }

    let new_columns = table.new_columns();
    print_count("new column(s)", new_columns.len(), None);
    print_step_time(step_start.elapsed());

    // Step 4: Write outputs
    print_step_header(4, "Save Outputs");
    let step_start = Instant::now();
    let mut full = table.to_frame()?;
    save_frame(&mut full, &clean_path)?;
    print_success(&format!("Saved {}", clean_path.display()));

    let mut essential = table.essential_frame()?;
    save_frame(&mut essential, &essential_path)?;
    print_success(&format!("Saved {}", essential_path.display()));

    let metadata = ReportMetadata::new(Stage::Preprocess.name(), &input, None);
    let report = PreprocessReport::new(
        metadata,
        &clean,
        &table,
        OutputFiles {
            enriched: clean_path.display().to_string(),
            essential: essential_path.display().to_string(),
        },
    );
    export_json(&report, &output)?;
    print_success(&format!("Report saved to {}", output.display()));
    print_step_time(step_start.elapsed());

    let mut summary = StageSummary::new("Preprocessing summary");
    summary
        .add("Rows before", report.rows_before)
        .add("Rows after", report.rows_after)
        .add("Filled cells", report.filled_cells)
        .add("Duplicates dropped", report.duplicates_dropped)
        .add("New columns", report.new_columns.len())
        .add("Total columns", report.total_columns);
    summary.display();

    print_completion("Preprocessing complete");
    Ok(output)
}
