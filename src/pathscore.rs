//! Scoring of candidate module completion paths.
//!
//! A path is an ordered node list; KO-tagged nodes contribute their Dk,
//! structural nodes (and/joint markers) pass through unpenalized. The
//! raw score is the product of per-node probabilities, accumulated in
//! log space so long paths cannot underflow; the geometric mean
//! normalizes for path length so short and long routes rank fairly.

use rustc_hash::FxHashMap;

/// Scores of one module's best path, before and after diffusion.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BestPath {
    pub path_id: u32,
    /// Nodes joined with `" -> "`.
    pub path: String,
    pub raw_before: f64,
    pub geo_before: f64,
    pub raw_after: f64,
    pub geo_after: f64,
}

/// KO prefix of a KO-tagged node (`"K00001_pgi"` → `"K00001"`).
/// Structural nodes return None.
pub fn ko_of_node(node: &str) -> Option<&str> {
    if !node.starts_with('K') {
        return None;
    }
    node.split_once('_').map(|(ko, _)| ko)
}

/// Raw product and geometric mean of Dk over a path's KO-tagged nodes.
///
/// KOs absent from the map default to 1.0. A path with no KO-tagged
/// node keeps the empty product 1.0 as raw but scores geo 0; a path
/// with any zero factor scores 0 on both. Either way geo is 0, so a
/// degenerate path is never selected.
pub fn score_path(nodes: &[&str], dk: &FxHashMap<String, f64>) -> (f64, f64) {
    let mut log_raw = 0.0f64;
    let mut ko_count = 0usize;
    let mut has_zero = false;

    for node in nodes {
        if let Some(ko) = ko_of_node(node) {
            ko_count += 1;
            let p = dk.get(ko).copied().unwrap_or(1.0);
            if p > 0.0 {
                log_raw += p.ln();
            } else {
                has_zero = true;
            }
        }
    }

    if has_zero {
        return (0.0, 0.0);
    }
    if ko_count == 0 {
        return (1.0, 0.0);
    }
    let raw = log_raw.exp();
    let geo = (log_raw / ko_count as f64).exp();
    (raw, geo)
}

/// Score every candidate path of one module and return the best by
/// post-diffusion geometric mean. Paths are given as
/// `(numeric path id, comma-joined node string)` and must be in
/// ascending id order; the first maximum wins on ties. Returns None for
/// a module without any path.
pub fn best_path(
    paths: &[(u32, String)],
    dk_before: &FxHashMap<String, f64>,
    dk_after: &FxHashMap<String, f64>,
) -> Option<BestPath> {
    let mut best: Option<BestPath> = None;
    for (path_id, joined) in paths {
        let nodes: Vec<&str> = joined.split(',').map(str::trim).collect();
        let (raw_before, geo_before) = score_path(&nodes, dk_before);
        let (raw_after, geo_after) = score_path(&nodes, dk_after);
        let candidate = BestPath {
            path_id: *path_id,
            path: nodes.join(" -> "),
            raw_before,
            geo_before,
            raw_after,
            geo_after,
        };
        match &best {
            Some(current) if candidate.geo_after <= current.geo_after => {}
            _ => best = Some(candidate),
        }
    }
    best
}
