//! Hit table input handling.
//!
//! Two fixed tabular schemas are supported, named after their file
//! extensions:
//!
//! - `tbl` — BATH summary table, 19 whitespace-delimited fields
//! - `domtblout` — HMMER3 per-domain table, 23 fields
//!
//! Both parsers produce the same normalized [`HitRecord`] sequence; the
//! rest of the pipeline never sees format differences.

pub mod domtblout;
pub mod tbl;

use anyhow::{bail, Result};
use std::path::Path;

use crate::common::HitRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitFormat {
    Tbl,
    Domtblout,
}

impl HitFormat {
    pub fn parse_file(&self, path: &Path) -> Result<Vec<HitRecord>> {
        match self {
            HitFormat::Tbl => tbl::parse_file(path),
            HitFormat::Domtblout => domtblout::parse_file(path),
        }
    }
}

/// Fail fast on unusable input before any computation: the file must
/// exist, be non-empty, and carry a recognized extension.
pub fn validate_hits_path(path: &Path) -> Result<()> {
    let name = path.to_string_lossy();
    if !(name.ends_with(".tbl") || name.ends_with(".domtblout")) {
        bail!("{}: expected a .tbl or .domtblout file", path.display());
    }
    let meta = match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta,
        _ => bail!("file not found: {}", path.display()),
    };
    if meta.len() == 0 {
        bail!("file is empty: {}", path.display());
    }
    Ok(())
}

/// Parse a mandatory field, reporting the physical line number and
/// column name on failure.
fn parse_field<T: std::str::FromStr>(fields: &[&str], idx: usize, name: &str, lineno: usize) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw = match fields.get(idx) {
        Some(raw) => *raw,
        None => bail!("line {}: missing field {} ({})", lineno, idx + 1, name),
    };
    match raw.parse() {
        Ok(value) => Ok(value),
        Err(err) => bail!("line {}: bad {} {:?}: {}", lineno, name, raw, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_wrong_extension() {
        assert!(validate_hits_path(Path::new("sample.csv")).is_err());
    }

    #[test]
    fn test_validate_rejects_missing_file() {
        assert!(validate_hits_path(Path::new("no_such_sample.tbl")).is_err());
    }
}
