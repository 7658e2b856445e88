//! Per-KO detection probability (Dk) from hit confidence, background
//! frequency and sample completeness.

use crate::confidence::ScoredHit;
use crate::refdata::occurrences::KoFrequencies;
use rustc_hash::FxHashMap;

/// Frequency assigned to KOs missing from the occurrence table, so Dk
/// stays well-defined for every KO in the module universe.
pub const FREQUENCY_FLOOR: f64 = 1e-4;

/// E-value reported for KOs with no surviving hit.
pub const MISSING_E_VALUE: f64 = 100.0;

/// Detection state of one KO before diffusion.
#[derive(Debug, Clone)]
pub struct KoDetection {
    pub ko: String,
    pub score: f64,
    pub e_value: f64,
    pub hit_conf: f64,
    pub ko_freq: f64,
    pub dk_before: f64,
}

/// Shrinkage factor applied to the background frequency.
///
/// sigma' = 1 − (e^(3·sigma) − 1) / e^3, so a fully complete sample
/// (sigma = 1) trusts the background least (sigma' = e^(−3)) and an
/// empty assembly (sigma = 0) trusts it fully (sigma' = 1).
pub fn sigma_shrinkage(sigma_val: f64) -> f64 {
    1.0 - ((3.0 * sigma_val).exp() - 1.0) / 3.0f64.exp()
}

/// Compute Dk for every KO in `universe` (sorted KO ids from the module
/// graphs). KOs without a best hit get confidence 0 and the missing
/// E-value; KOs absent from the frequency table get the floor.
///
/// Dk = conf + (1 − conf) · sigma' · freq — confidence dominates when
/// high, otherwise Dk is pulled toward the background frequency scaled
/// by incompleteness.
pub fn calculate_dk(
    universe: &[String],
    best_hits: &FxHashMap<String, ScoredHit>,
    frequencies: &KoFrequencies,
    sigma_val: f64,
) -> Vec<KoDetection> {
    let sigma = sigma_shrinkage(sigma_val);
    universe
        .iter()
        .map(|ko| {
            let (score, e_value, hit_conf) = match best_hits.get(ko) {
                Some(row) => (row.hit.score, row.hit.e_value, row.confidence),
                None => (0.0, MISSING_E_VALUE, 0.0),
            };
            let ko_freq = frequencies.get(ko).unwrap_or(FREQUENCY_FLOOR);
            let dk_before = hit_conf + (1.0 - hit_conf) * sigma * ko_freq;
            KoDetection {
                ko: ko.clone(),
                score,
                e_value,
                hit_conf,
                ko_freq,
                dk_before,
            }
        })
        .collect()
}
