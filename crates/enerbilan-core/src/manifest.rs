use chrono::Utc;
use serde_json::json;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::output::write_bytes;
use crate::pipeline::PipelineReport;

/// Records what a run produced next to its outputs.
pub fn write_manifest(config: &PipelineConfig, report: &PipelineReport) -> Result<()> {
    let metadata = json!({
        "generated_at": Utc::now().to_rfc3339(),
        "raw_dir": config.raw_dir,
        "processed_dir": config.processed_dir,
        "encoding": config.encoding,
        "complete": report.is_complete(),
        "stages": report.stages,
        "balance": report.balance,
    });

    let bytes = serde_json::to_vec_pretty(&metadata)?;
    write_bytes(&config.manifest_output(), &bytes)
}
