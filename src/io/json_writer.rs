use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::eval::MetricsReport;
use crate::schema::v1::KaryotypeV1;

pub fn write_report(path: &Path, report: &KaryotypeV1) -> Result<()> {
    super::write_json(path, report)?;
    info!(path = %path.display(), "report_json_written");
    Ok(())
}

pub fn write_metrics(path: &Path, metrics: &MetricsReport) -> Result<()> {
    super::write_json(path, metrics)?;
    info!(path = %path.display(), "metrics_json_written");
    Ok(())
}
