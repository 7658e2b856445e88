//! HMMER3 `.domtblout` per-domain table parser.
//!
//! Layout: 3 header lines, one 23-field row per domain hit, 10 footer
//! lines; `#`-prefixed lines are ignored wherever they appear. Consumed
//! fields by index: target 0, query/KO 3, i-Evalue 12, i-score 13,
//! hmm_from 15, hmm_to 16, ali_from 17, ali_to 18.
//!
//! Rows whose alignment or profile span collapses to zero length carry
//! no locatable signal and are dropped here, before clustering.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::parse_field;
use crate::common::HitRecord;

const HEADER_LINES: usize = 3;
const FOOTER_LINES: usize = 10;
const MIN_FIELDS: usize = 23;

pub fn parse_file(path: &Path) -> Result<Vec<HitRecord>> {
    let file =
        File::open(path).with_context(|| format!("opening hit table {}", path.display()))?;
    parse_reader(BufReader::new(file))
        .with_context(|| format!("parsing domtblout file {}", path.display()))
}

pub fn parse_reader<R: BufRead>(reader: R) -> Result<Vec<HitRecord>> {
    let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
    let body_end = lines.len().saturating_sub(FOOTER_LINES);
    let mut hits = Vec::new();

    for (i, line) in lines.iter().enumerate().take(body_end).skip(HEADER_LINES) {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let lineno = i + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            anyhow::bail!(
                "line {}: expected at least {} fields, found {}",
                lineno,
                MIN_FIELDS,
                fields.len()
            );
        }
        let hit = HitRecord {
            target_id: fields[0].to_string(),
            ko_id: fields[3].to_string(),
            e_value: parse_field(&fields, 12, "i-Evalue", lineno)?,
            score: parse_field(&fields, 13, "i-score", lineno)?,
            hmm_from: parse_field(&fields, 15, "hmm from", lineno)?,
            hmm_to: parse_field(&fields, 16, "hmm to", lineno)?,
            ali_from: parse_field(&fields, 17, "ali from", lineno)?,
            ali_to: parse_field(&fields, 18, "ali to", lineno)?,
        };
        if (hit.ali_to - hit.ali_from).abs() == 0 || (hit.hmm_to - hit.hmm_from).abs() == 0 {
            continue;
        }
        hits.push(hit);
    }
    Ok(hits)
}
