//! Per-hit confidence from bit scores, computed in log space.
//!
//! Each locus is treated as a weighted softmax over its hits plus a
//! noise floor derived from the E-value threshold: a hit's confidence
//! is the fraction of the locus's total weight it carries. Weights are
//! `2^score`, so everything is accumulated as log-sum-exp to avoid
//! overflow for large bit scores.

use crate::common::HitRecord;
use log::warn;
use rustc_hash::FxHashMap;

/// E-value threshold whose negated natural log is the noise weight
/// competing with every locus.
pub const DEFAULT_E_THRESHOLD: f64 = 1e-5;

/// A hit annotated with its locus label and calibrated confidence.
#[derive(Debug, Clone)]
pub struct ScoredHit {
    pub hit: HitRecord,
    pub locus: String,
    /// Fraction of the locus weight carried by this hit, in (0, 1).
    pub confidence: f64,
}

/// log(exp(a) + exp(b)) without overflow.
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let m = a.max(b);
    m + ((a - m).exp() + (b - m).exp()).ln()
}

/// log(sum(exp(values))) without overflow.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, log_add_exp)
}

/// Compute per-hit confidence for every hit. `loci` must be
/// index-aligned with `hits` (see [`crate::cluster::assign_overlap_groups`]).
///
/// Formula per hit: conf = exp(score·ln2 − logaddexp(locus_logsum, −ln e_threshold)).
pub fn calculate_hit_confidence(
    hits: Vec<HitRecord>,
    loci: Vec<String>,
    e_threshold: f64,
) -> Vec<ScoredHit> {
    debug_assert_eq!(hits.len(), loci.len());
    let ln2 = std::f64::consts::LN_2;
    let noise_logw = -e_threshold.ln();

    let log_weights: Vec<f64> = hits.iter().map(|h| h.score * ln2).collect();

    // Locus log-sums over per-hit log-weights.
    let mut locus_logsum: FxHashMap<&str, f64> = FxHashMap::default();
    for (logw, locus) in log_weights.iter().zip(&loci) {
        locus_logsum
            .entry(locus.as_str())
            .and_modify(|acc| *acc = log_add_exp(*acc, *logw))
            .or_insert(*logw);
    }

    let totals: FxHashMap<&str, f64> = locus_logsum
        .into_iter()
        .map(|(locus, sum)| (locus, log_add_exp(sum, noise_logw)))
        .collect();
    let confidences: Vec<f64> = log_weights
        .iter()
        .zip(&loci)
        .map(|(logw, locus)| (logw - totals[locus.as_str()]).exp())
        .collect();

    hits.into_iter()
        .zip(loci)
        .zip(confidences)
        .map(|((hit, locus), confidence)| ScoredHit {
            hit,
            locus,
            confidence,
        })
        .collect()
}

/// Keep the single highest-confidence hit per locus (the locus
/// representative). Rows with a non-finite confidence are logged and
/// dropped rather than aborting the run. First maximum wins on ties.
pub fn select_locus_representatives(rows: Vec<ScoredHit>) -> Vec<ScoredHit> {
    let mut reps: Vec<ScoredHit> = Vec::new();
    let mut slot: FxHashMap<String, usize> = FxHashMap::default();

    for row in rows {
        if !row.confidence.is_finite() {
            warn!(
                "dropping hit with undefined confidence: target={} ko={} score={} locus={}",
                row.hit.target_id, row.hit.ko_id, row.hit.score, row.locus
            );
            continue;
        }
        match slot.get(&row.locus) {
            Some(&i) => {
                if row.confidence > reps[i].confidence {
                    reps[i] = row;
                }
            }
            None => {
                slot.insert(row.locus.clone(), reps.len());
                reps.push(row);
            }
        }
    }
    reps
}

/// Collapse locus representatives to one row per KO, keeping the row
/// with the highest raw score. The sort is stable, so equal scores keep
/// their input order and the earlier row wins.
pub fn best_hit_per_ko(mut rows: Vec<ScoredHit>) -> FxHashMap<String, ScoredHit> {
    rows.sort_by(|a, b| {
        b.hit
            .score
            .partial_cmp(&a.hit.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut by_ko: FxHashMap<String, ScoredHit> = FxHashMap::default();
    for row in rows {
        by_ko.entry(row.hit.ko_id.clone()).or_insert(row);
    }
    by_ko
}
