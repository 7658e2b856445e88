//! KEGG module graph files: per module a `module_<id>_nodes.json`
//! (node id → integer group/order tag) and a `module_<id>_paths.json`
//! (path id → comma-joined ordered node string).
//!
//! Discovery is keyed on the nodes file; a module without a paths file
//! still contributes its KOs and nodes but gets no best path. A
//! malformed module file is logged and skips that module only, so one
//! bad file never aborts the batch.

use anyhow::{Context, Result};
use log::warn;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::pathscore::ko_of_node;

const NODES_SUFFIX: &str = "_nodes.json";
const PATHS_SUFFIX: &str = "_paths.json";
const MODULE_PREFIX: &str = "module_";

/// One module's graph: nodes sorted by group tag, candidate paths
/// sorted by numeric path id.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    pub id: String,
    pub nodes: Vec<(String, i64)>,
    pub paths: Vec<(u32, String)>,
}

impl ModuleGraph {
    /// KOs tagged on this module's nodes, sorted and deduplicated.
    pub fn kos(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .nodes
            .iter()
            .filter_map(|(node, _)| ko_of_node(node))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }
}

/// Scan a directory for module graph files, returning modules in
/// sorted module-id order.
pub fn discover_modules(dir: &Path) -> Result<Vec<ModuleGraph>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading module graph directory {}", dir.display()))?;

    let mut module_ids: BTreeSet<String> = BTreeSet::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(stem) = name
            .strip_prefix(MODULE_PREFIX)
            .and_then(|s| s.strip_suffix(NODES_SUFFIX))
        {
            module_ids.insert(stem.to_string());
        }
    }

    let mut modules = Vec::with_capacity(module_ids.len());
    for id in module_ids {
        match load_module(dir, &id) {
            Ok(module) => modules.push(module),
            Err(err) => warn!("skipping module {}: {:#}", id, err),
        }
    }
    Ok(modules)
}

fn load_module(dir: &Path, id: &str) -> Result<ModuleGraph> {
    let nodes_path = dir.join(format!("{}{}{}", MODULE_PREFIX, id, NODES_SUFFIX));
    let raw_nodes: FxHashMap<String, i64> = read_json(&nodes_path)?;
    let mut nodes: Vec<(String, i64)> = raw_nodes.into_iter().collect();
    nodes.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let paths_path = dir.join(format!("{}{}{}", MODULE_PREFIX, id, PATHS_SUFFIX));
    let mut paths: Vec<(u32, String)> = Vec::new();
    if paths_path.is_file() {
        let raw_paths: FxHashMap<String, String> = read_json(&paths_path)?;
        for (pid, joined) in raw_paths {
            let pid: u32 = pid
                .parse()
                .with_context(|| format!("bad path id {:?} in {}", pid, paths_path.display()))?;
            paths.push((pid, joined));
        }
        paths.sort_by_key(|(pid, _)| *pid);
    }

    Ok(ModuleGraph {
        id: id.to_string(),
        nodes,
        paths,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

/// Sorted union of all KOs known to any module. This is the universe
/// every downstream Dk/diffusion map is keyed by.
pub fn ko_universe(modules: &[ModuleGraph]) -> Vec<String> {
    let mut set: BTreeSet<String> = BTreeSet::new();
    for module in modules {
        set.extend(module.kos());
    }
    set.into_iter().collect()
}

/// KO id → comma-joined sorted list of the modules it appears in.
pub fn ko_to_modules(modules: &[ModuleGraph]) -> FxHashMap<String, String> {
    let mut memberships: FxHashMap<String, BTreeSet<&str>> = FxHashMap::default();
    for module in modules {
        for (node, _) in &module.nodes {
            if let Some(ko) = ko_of_node(node) {
                memberships
                    .entry(ko.to_string())
                    .or_default()
                    .insert(module.id.as_str());
            }
        }
    }
    memberships
        .into_iter()
        .map(|(ko, mods)| {
            let joined = mods.into_iter().collect::<Vec<_>>().join(",");
            (ko, joined)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str, nodes: &[(&str, i64)], paths: &[(u32, &str)]) -> ModuleGraph {
        ModuleGraph {
            id: id.to_string(),
            nodes: nodes.iter().map(|(n, g)| (n.to_string(), *g)).collect(),
            paths: paths.iter().map(|(p, s)| (*p, s.to_string())).collect(),
        }
    }

    #[test]
    fn test_module_kos_ignore_structural_nodes() {
        let m = module(
            "M00001",
            &[("K00001_a", 0), ("and_1", 1), ("K00002_b", 2), ("K00001_c", 3)],
            &[],
        );
        assert_eq!(m.kos(), vec!["K00001".to_string(), "K00002".to_string()]);
    }

    #[test]
    fn test_ko_universe_is_sorted_union() {
        let m1 = module("M00001", &[("K00002_a", 0)], &[]);
        let m2 = module("M00002", &[("K00001_b", 0), ("K00002_c", 1)], &[]);
        assert_eq!(
            ko_universe(&[m1, m2]),
            vec!["K00001".to_string(), "K00002".to_string()]
        );
    }

    #[test]
    fn test_ko_to_modules_joins_sorted() {
        let m1 = module("M00002", &[("K00001_a", 0)], &[]);
        let m2 = module("M00001", &[("K00001_b", 0)], &[]);
        let map = ko_to_modules(&[m1, m2]);
        assert_eq!(map["K00001"], "M00001,M00002");
    }
}
