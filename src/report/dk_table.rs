//! Per-KO detection table (`<prefix>_dk.csv`).

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// One output row per KO in the module universe, in sorted KO order.
#[derive(Debug, Clone, Serialize)]
pub struct KoReportRow {
    pub ko: String,
    pub score: f64,
    pub e_value: f64,
    pub hit_conf: f64,
    pub ko_freq: f64,
    pub dk_before: f64,
    pub dk_after: f64,
    /// Comma-joined sorted module memberships.
    pub modules: String,
}

pub fn write_dk_table(path: &Path, rows: &[KoReportRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
