//! BATH `.tbl` summary table parser.
//!
//! Layout: 2 header lines, then one 19-field whitespace-delimited row
//! per hit (the trailing description may itself contain spaces), then
//! 8 footer lines of run metadata. Consumed fields by index:
//! target 0, query/KO 2, hmm_from 5, hmm_to 6, ali_from 8, ali_to 9,
//! E-value 12, score 13.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::parse_field;
use crate::common::HitRecord;

const HEADER_LINES: usize = 2;
const FOOTER_LINES: usize = 8;
const MIN_FIELDS: usize = 19;

pub fn parse_file(path: &Path) -> Result<Vec<HitRecord>> {
    let file =
        File::open(path).with_context(|| format!("opening hit table {}", path.display()))?;
    parse_reader(BufReader::new(file))
        .with_context(|| format!("parsing tbl file {}", path.display()))
}

pub fn parse_reader<R: BufRead>(reader: R) -> Result<Vec<HitRecord>> {
    let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
    let body_end = lines.len().saturating_sub(FOOTER_LINES);
    let mut hits = Vec::new();

    for (i, line) in lines.iter().enumerate().take(body_end).skip(HEADER_LINES) {
        if line.trim().is_empty() {
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
        hits.push(HitRecord {
            target_id: fields[0].to_string(),
            ko_id: fields[2].to_string(),
            hmm_from: parse_field(&fields, 5, "hmm from", lineno)?,
            hmm_to: parse_field(&fields, 6, "hmm to", lineno)?,
            ali_from: parse_field(&fields, 8, "ali from", lineno)?,
            ali_to: parse_field(&fields, 9, "ali to", lineno)?,
            e_value: parse_field(&fields, 12, "E-value", lineno)?,
            score: parse_field(&fields, 13, "score", lineno)?,
        });
    }
    Ok(hits)
}
