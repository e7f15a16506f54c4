//! Preprocessing report: cleaning outcome, encodings, scalers and new columns

use serde::Serialize;

use super::export::ReportMetadata;
use crate::pipeline::{CleanReport, ColumnFill, ColumnMapping, EnrichedTable, NumericColumn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalerEntry {
    pub column: String,
    pub mean: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputFiles {
    pub enriched: String,
    pub essential: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreprocessReport {
    pub metadata: ReportMetadata,
    pub rows_before: usize,
    pub rows_after: usize,
    pub filled_cells: usize,
    pub fills: Vec<ColumnFill>,
    pub duplicates_dropped: usize,
    pub label_mappings: Vec<ColumnMapping>,
    pub scalers: Vec<ScalerEntry>,
    pub new_columns: Vec<String>,
    pub total_columns: usize,
    pub outputs: OutputFiles,
}

impl PreprocessReport {
    pub fn new(
        metadata: ReportMetadata,
        clean: &CleanReport,
        table: &EnrichedTable,
        outputs: OutputFiles,
    ) -> Self {
        let scalers = NumericColumn::ALL
            .iter()
            .map(|c| {
                let z = table.model.scaler(*c);
                ScalerEntry {
                    column: c.name().to_string(),
                    mean: z.mean,
                    scale: z.scale,
                }
            })
            .collect();

        Self {
            metadata,
            rows_before: clean.rows_before,
            rows_after: clean.rows_after,
            filled_cells: clean.filled_cells(),
            fills: clean.fills.clone(),
            duplicates_dropped: clean.duplicates_dropped,
            label_mappings: table.model.encodings.mappings(),
            scalers,
            new_columns: table.new_columns(),
            total_columns: table.column_names().len(),
            outputs,
        }
    }
}
