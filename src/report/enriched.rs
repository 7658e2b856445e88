//! Enriched per-module JSON (`<prefix>_modules_enriched.json`): every
//! module's node metadata joined with its detection state and the
//! selected best path, for the interactive module diagram.

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::detection::MISSING_E_VALUE;
use crate::pathscore::{ko_of_node, BestPath};
use crate::refdata::{KoFrequencies, ModuleGraph};

/// Key names follow the module diagram viewer's contract, which reads
/// `KO_Occurrence`, `Dk_before`, `E-value` and `Dk_after` off each node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub id: String,
    pub group: i64,
    #[serde(rename = "KO_Occurrence")]
    pub ko_occurrence: f64,
    #[serde(rename = "Dk_before")]
    pub dk_before: f64,
    #[serde(rename = "E-value")]
    pub e_value: f64,
    #[serde(rename = "Dk_after")]
    pub dk_after: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    pub nodes: Vec<NodeReport>,
    pub best_path: Option<BestPath>,
}

/// Assemble the enriched report for every module. Nodes keep the
/// module's group-sorted order; structural nodes report zero
/// probabilities and the missing-hit E-value.
pub fn build_enriched(
    modules: &[ModuleGraph],
    frequencies: &KoFrequencies,
    dk_before: &FxHashMap<String, f64>,
    e_values: &FxHashMap<String, f64>,
    dk_after: &FxHashMap<String, f64>,
    mut best_paths: FxHashMap<String, BestPath>,
) -> BTreeMap<String, ModuleReport> {
    let mut report = BTreeMap::new();
    for module in modules {
        let nodes = module
            .nodes
            .iter()
            .map(|(node, group)| {
                let ko = ko_of_node(node).unwrap_or("");
                NodeReport {
                    id: node.clone(),
                    group: *group,
                    ko_occurrence: frequencies.get(ko).unwrap_or(0.0),
                    dk_before: dk_before.get(ko).copied().unwrap_or(0.0),
                    e_value: e_values.get(ko).copied().unwrap_or(MISSING_E_VALUE),
                    dk_after: dk_after.get(ko).copied().unwrap_or(0.0),
                }
            })
            .collect();
        report.insert(
            module.id.clone(),
            ModuleReport {
                nodes,
                best_path: best_paths.remove(&module.id),
            },
        );
    }
    report
}

pub fn write_enriched(path: &Path, report: &BTreeMap<String, ModuleReport>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
