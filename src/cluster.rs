//! Greedy interval clustering of hits into overlap groups (loci).
//!
//! Hits on the same target and strand whose alignment spans overlap by
//! at least `min_overlap_frac` of the shorter span are merged into one
//! locus and later compete for a single functional call. A hit joins
//! the first qualifying cluster in creation order, not the
//! best-overlapping one; with the stable sort by start coordinate this
//! makes cluster assignment fully deterministic.

use crate::common::{HitRecord, Strand};
use rustc_hash::FxHashMap;

/// Fraction of the shorter span that must be covered for a hit to join
/// an existing cluster.
pub const DEFAULT_MIN_OVERLAP_FRAC: f64 = 0.6;

/// Envelope of one open cluster during the greedy scan.
struct Cluster {
    id: usize,
    start: i64,
    end: i64,
}

/// Assign every hit a locus label `"{target}_{cluster_id}_{strand}"`.
///
/// Returned labels are index-aligned with `hits`. Clustering is run
/// independently per (target, strand) pair; cluster ids are 1-based
/// within each pair.
pub fn assign_overlap_groups(hits: &[HitRecord], min_overlap_frac: f64) -> Vec<String> {
    // Bucket hit indices per (target, strand), preserving input order.
    let mut buckets: FxHashMap<(&str, Strand), Vec<usize>> = FxHashMap::default();
    for (idx, hit) in hits.iter().enumerate() {
        buckets
            .entry((hit.target_id.as_str(), hit.strand()))
            .or_default()
            .push(idx);
    }

    let mut labels = vec![String::new(); hits.len()];
    for ((target, strand), indices) in buckets {
        let spans: Vec<(i64, i64)> = indices
            .iter()
            .map(|&i| (hits[i].ali_start(), hits[i].ali_end()))
            .collect();
        let cluster_ids = cluster_spans(&spans, min_overlap_frac);
        for (pos, &idx) in indices.iter().enumerate() {
            labels[idx] = format!("{}_{}_{}", target, cluster_ids[pos], strand.as_char());
        }
    }
    labels
}

/// Cluster `[start, end]` spans, returning a 1-based cluster id per
/// input span (index-aligned with `spans`).
pub fn cluster_spans(spans: &[(i64, i64)], min_overlap_frac: f64) -> Vec<usize> {
    // Stable sort by start so ties keep input order.
    let mut order: Vec<usize> = (0..spans.len()).collect();
    order.sort_by_key(|&i| spans[i].0);

    let mut clusters: Vec<Cluster> = Vec::new();
    let mut ids = vec![0usize; spans.len()];

    for &idx in &order {
        let (s, e) = spans[idx];
        let mut joined = false;
        for cluster in &mut clusters {
            // Only clusters whose envelope still reaches this start can
            // overlap at all.
            if s > cluster.end {
                continue;
            }
            let overlap = (e.min(cluster.end) - s.max(cluster.start)).max(0) as f64;
            let short_len = ((e - s).min(cluster.end - cluster.start)) as f64;
            if overlap / short_len >= min_overlap_frac {
                ids[idx] = cluster.id;
                cluster.start = cluster.start.min(s);
                cluster.end = cluster.end.max(e);
                joined = true;
                break;
            }
        }
        if !joined {
            let id = clusters.len() + 1;
            clusters.push(Cluster { id, start: s, end: e });
            ids[idx] = id;
        }
    }
    ids
}
