//! JSON report export and the zip bundle of all analysis reports

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::pipeline::loader::create_parent_dir;
use crate::pipeline::PipelineError;

/// Metadata block at the top of every report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub timestamp: String,
    pub medcost_version: String,
    pub stage: String,
    pub input_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
}

impl ReportMetadata {
    pub fn new(stage: &str, input: &Path, alpha: Option<f64>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            medcost_version: env!("CARGO_PKG_VERSION").to_string(),
            stage: stage.to_string(),
            input_file: input.display().to_string(),
            alpha,
        }
    }
}

/// Write a report as pretty-printed JSON, creating parent directories.
pub fn export_json<T: Serialize>(report: &T, output_path: &Path) -> Result<(), PipelineError> {
    create_parent_dir(output_path)?;

    let json =
        serde_json::to_string_pretty(report).map_err(|e| PipelineError::output(output_path, e))?;
    std::fs::write(output_path, json).map_err(|e| PipelineError::output(output_path, e))?;

    Ok(())
}

/// Name of a report inside the bundle: `<stage dir>/<file name>`.
fn entry_name(path: &Path) -> String {
    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("report.json");
    match path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
    {
        Some(dir) => format!("{}/{}", dir, file),
        None => file.to_string(),
    }
}

/// Package report files into a deflate zip archive.
///
/// The individual reports are left in place.
pub fn package_reports(reports: &[PathBuf], zip_path: &Path) -> Result<(), PipelineError> {
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    create_parent_dir(zip_path)?;

    let zip_file = std::fs::File::create(zip_path).map_err(|e| PipelineError::output(zip_path, e))?;
    let mut zip = ZipWriter::new(zip_file);
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for path in reports {
        let name = entry_name(path);
        let mut content = Vec::new();
        std::fs::File::open(path)
            .and_then(|mut f| f.read_to_end(&mut content))
            .map_err(|e| PipelineError::output(zip_path, format!("{}: {}", path.display(), e)))?;

        zip.start_file(name.as_str(), options)
            .map_err(|e| PipelineError::output(zip_path, e))?;
        zip.write_all(&content)
            .map_err(|e| PipelineError::output(zip_path, e))?;
    }

    zip.finish().map_err(|e| PipelineError::output(zip_path, e))?;
    Ok(())
}
