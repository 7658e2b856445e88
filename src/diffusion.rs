//! KO similarity graph and the single-pass neighbor diffusion update.
//!
//! Each KO's detection probability is nudged upward by its neighbors'
//! pre-update probabilities, weighted by edge weight and damped by a
//! decay factor that shrinks as the total neighbor weight grows. The
//! update is one synchronous pass over a snapshot, not an iterative
//! relaxation: every lookup reads pre-update values, so the result is
//! independent of KO processing order.

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Diffusion rate: the base of the per-KO decay factor `alpha^(1/Σw)`.
pub const DEFAULT_ALPHA: f64 = 0.6;

/// Replacement for zero edge weights so edges stay live.
pub const MIN_EDGE_WEIGHT: f64 = 0.001;

/// Static weighted adjacency over KO ids, loaded once per run and
/// read-only thereafter.
#[derive(Debug, Default)]
pub struct NeighborGraph {
    adjacency: FxHashMap<String, Vec<(String, f64)>>,
}

impl NeighborGraph {
    /// Load from the line-oriented table `KO:index:NBR1:w1,NBR2:w2,...`.
    /// Lines not starting with `K` are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening neighbor graph {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing neighbor graph {}", path.display()))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut adjacency: FxHashMap<String, Vec<(String, f64)>> = FxHashMap::default();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if !line.starts_with('K') {
                continue;
            }
            let mut parts = line.splitn(3, ':');
            let ko = parts.next().unwrap_or("").trim().to_string();
            let _index = parts.next();
            let nbrs_str = parts
                .next()
                .with_context(|| format!("line {}: missing neighbor list", lineno + 1))?;

            let mut nbrs = Vec::new();
            for entry in nbrs_str.split(',') {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                let (nbr_id, weight_str) = entry
                    .split_once(':')
                    .with_context(|| format!("line {}: bad neighbor entry {:?}", lineno + 1, entry))?;
                let mut weight: f64 = weight_str
                    .trim()
                    .parse()
                    .with_context(|| format!("line {}: bad weight {:?}", lineno + 1, weight_str))?;
                if weight == 0.0 {
                    weight = MIN_EDGE_WEIGHT;
                }
                nbrs.push((nbr_id.trim().to_string(), weight));
            }
            adjacency.insert(ko, nbrs);
        }
        Ok(Self { adjacency })
    }

    pub fn neighbors(&self, ko: &str) -> Option<&[(String, f64)]> {
        self.adjacency.get(ko).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}

/// One synchronous diffusion pass over `dk_before`.
///
/// Per KO i: X = alpha^(1/Σw), shift = (1 − p_i) · Σ_j (w_j/Σw)·X·p_j,
/// Dk_after = min(p_i + shift, 1). KOs without neighbors pass through
/// unchanged; neighbors absent from the Dk map contribute 0.
pub fn spring_update(
    dk_before: &FxHashMap<String, f64>,
    graph: &NeighborGraph,
    alpha: f64,
) -> FxHashMap<String, f64> {
    let mut dk_after = FxHashMap::default();
    for (ko, &p_i) in dk_before {
        let nbrs = match graph.neighbors(ko) {
            Some(nbrs) if !nbrs.is_empty() => nbrs,
            _ => {
                dk_after.insert(ko.clone(), p_i);
                continue;
            }
        };
        let sum_w: f64 = nbrs.iter().map(|(_, w)| w).sum();
        let x = alpha.powf(1.0 / sum_w);
        let room = 1.0 - p_i;
        let shift: f64 = nbrs
            .iter()
            .map(|(j, w)| {
                let p_j = dk_before.get(j).copied().unwrap_or(0.0);
                room * (w / sum_w) * x * p_j
            })
            .sum();
        dk_after.insert(ko.clone(), (p_i + shift).min(1.0));
    }
    dk_after
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn graph(text: &str) -> NeighborGraph {
        NeighborGraph::from_reader(Cursor::new(text)).expect("parse graph")
    }

    fn dk(pairs: &[(&str, f64)]) -> FxHashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_parse_neighbor_table() {
        let g = graph("# header\nK00001:0:K00002:2.0,K00003:0.00\nK00002:1:K00001:2.0\n");
        assert_eq!(g.len(), 2);
        let nbrs = g.neighbors("K00001").expect("K00001 present");
        assert_eq!(nbrs.len(), 2);
        assert_eq!(nbrs[0], ("K00002".to_string(), 2.0));
        // Zero weight floored to keep the edge live
        assert_eq!(nbrs[1], ("K00003".to_string(), MIN_EDGE_WEIGHT));
    }

    #[test]
    fn test_isolated_ko_passes_through_unchanged() {
        let g = graph("K00002:0:K00003:1.0\n");
        let before = dk(&[("K00001", 0.42)]);
        let after = spring_update(&before, &g, DEFAULT_ALPHA);
        assert_eq!(after["K00001"], 0.42);
    }

    #[test]
    fn test_single_neighbor_shift() {
        // X = 0.6^(1/2), shift = 0.5 * (2/2) * X * 0.3
        let g = graph("K00001:0:K00002:2.0\n");
        let before = dk(&[("K00001", 0.5), ("K00002", 0.3)]);
        let after = spring_update(&before, &g, 0.6);
        let x = 0.6f64.powf(0.5);
        let expected = 0.5 + 0.5 * x * 0.3;
        assert!((after["K00001"] - expected).abs() < 1e-12);
        assert!((after["K00001"] - 0.616189).abs() < 1e-6);
        // K00002 has no adjacency entry, so it is unchanged
        assert_eq!(after["K00002"], 0.3);
    }

    #[test]
    fn test_update_uses_pre_diffusion_snapshot() {
        // Symmetric pair: each must see the other's *before* value
        let g = graph("K00001:0:K00002:1.0\nK00002:1:K00001:1.0\n");
        let before = dk(&[("K00001", 0.2), ("K00002", 0.8)]);
        let after = spring_update(&before, &g, 0.6);
        let x = 0.6f64;
        assert!((after["K00001"] - (0.2 + 0.8 * x * 0.8)).abs() < 1e-12);
        assert!((after["K00002"] - (0.8 + 0.2 * x * 0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_dk_after_is_monotone_and_capped() {
        let g = graph("K00001:0:K00002:5.0\n");
        let before = dk(&[("K00001", 0.999), ("K00002", 1.0)]);
        let after = spring_update(&before, &g, 0.6);
        assert!(after["K00001"] >= before["K00001"]);
        assert!(after["K00001"] <= 1.0);
    }

    #[test]
    fn test_neighbor_missing_from_dk_map_contributes_zero() {
        let g = graph("K00001:0:K99999:3.0\n");
        let before = dk(&[("K00001", 0.5)]);
        let after = spring_update(&before, &g, 0.6);
        assert_eq!(after["K00001"], 0.5);
    }
}
