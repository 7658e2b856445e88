//! Background KO occurrence table: two whitespace-separated columns
//! (KO id, occurrence count over the reference corpus).

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Size of the reference sample corpus the occurrence counts were
/// collected over; frequency = count / corpus size.
pub const REFERENCE_SAMPLE_COUNT: f64 = 895.0;

/// Per-KO background occurrence frequency lookup.
#[derive(Debug, Default)]
pub struct KoFrequencies {
    freq: FxHashMap<String, f64>,
}

impl KoFrequencies {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening KO occurrence table {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing KO occurrence table {}", path.display()))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut freq = FxHashMap::default();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let ko = match fields.next() {
                Some(ko) => ko,
                None => continue, // blank line
            };
            // The table carries one literal header row
            if ko == "KO_ID" {
                continue;
            }
            let count: f64 = fields
                .next()
                .with_context(|| format!("line {}: missing count for {}", lineno + 1, ko))?
                .parse()
                .with_context(|| format!("line {}: bad count for {}", lineno + 1, ko))?;
            freq.insert(ko.to_string(), count / REFERENCE_SAMPLE_COUNT);
        }
        Ok(Self { freq })
    }

    /// Build directly from raw counts (tests and tooling).
    pub fn from_counts(counts: Vec<(String, f64)>) -> Self {
        let freq = counts
            .into_iter()
            .map(|(ko, count)| (ko, count / REFERENCE_SAMPLE_COUNT))
            .collect();
        Self { freq }
    }

    pub fn get(&self, ko: &str) -> Option<f64> {
        self.freq.get(ko).copied()
    }

    pub fn len(&self) -> usize {
        self.freq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freq.is_empty()
    }
}
