//! Per-module best-path table (`<prefix>_paths.csv`).

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::pathscore::BestPath;

/// Best completion path of one module, flattened for CSV output.
#[derive(Debug, Clone, Serialize)]
pub struct PathReportRow {
    pub module: String,
    pub path_id: u32,
    pub path: String,
    pub raw_before: f64,
    pub geo_before: f64,
    pub raw_after: f64,
    pub geo_after: f64,
}

impl PathReportRow {
    pub fn new(module: &str, best: BestPath) -> Self {
        Self {
            module: module.to_string(),
            path_id: best.path_id,
            path: best.path,
            raw_before: best.raw_before,
            geo_before: best.geo_before,
            raw_after: best.raw_after,
            geo_after: best.geo_after,
        }
    }
}

pub fn write_paths_table(path: &Path, rows: &[PathReportRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
