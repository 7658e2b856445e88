//! End-to-end run: parse hits, cluster, calibrate confidence, compute
//! and diffuse Dk, score module paths, write reports.
//!
//! All intermediate state lives in memory for the duration of one run;
//! the reference tables are loaded once and passed in read-only. Path
//! scoring is data-parallel across modules (they share no mutable
//! state); the deterministic merge keeps output byte-identical across
//! runs regardless of thread count.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

use crate::cluster::{assign_overlap_groups, DEFAULT_MIN_OVERLAP_FRAC};
use crate::common::HitRecord;
use crate::confidence::{
    best_hit_per_ko, calculate_hit_confidence, select_locus_representatives, DEFAULT_E_THRESHOLD,
};
use crate::detection::{calculate_dk, KoDetection};
use crate::diffusion::{spring_update, NeighborGraph, DEFAULT_ALPHA};
use crate::input::{validate_hits_path, HitFormat};
use crate::pathscore::{best_path, BestPath};
use crate::refdata::{discover_modules, ko_to_modules, ko_universe, KoFrequencies, ModuleGraph};
use crate::report::{
    build_enriched, write_dk_table, write_enriched, write_paths_table, KoReportRow, PathReportRow,
};

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Hit table produced by the search tool (.tbl or .domtblout)
    pub input: PathBuf,

    /// Assembly completeness estimate in [0.0, 1.0] (e.g. from CheckM
    /// or BUSCO); shrinks reliance on background frequency as it grows
    #[arg(short, long, default_value_t = 1.0, value_parser = completeness_in_range)]
    pub completeness: f64,

    /// Output path prefix for the generated reports
    #[arg(short, long)]
    pub output: PathBuf,

    /// KO occurrence table (two columns: KO id, count)
    #[arg(long)]
    pub ko_occurrences: PathBuf,

    /// KO neighbor-similarity table (KO:index:NBR1:w1,NBR2:w2,...)
    #[arg(long)]
    pub neighbors: PathBuf,

    /// Directory of module_*_nodes.json / module_*_paths.json files
    #[arg(long)]
    pub modules_dir: PathBuf,

    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

fn completeness_in_range(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("{:?} is not a valid float", s))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!(
            "completeness must be between 0.0 and 1.0, got {}",
            value
        ));
    }
    Ok(value)
}

/// Tunables of one detection run.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    pub e_threshold: f64,
    pub min_overlap_frac: f64,
    pub alpha: f64,
    pub completeness: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            e_threshold: DEFAULT_E_THRESHOLD,
            min_overlap_frac: DEFAULT_MIN_OVERLAP_FRAC,
            alpha: DEFAULT_ALPHA,
            completeness: 1.0,
        }
    }
}

/// The read-only reference tables, loaded once per run.
pub struct ReferenceData {
    pub frequencies: KoFrequencies,
    pub neighbors: NeighborGraph,
    pub modules: Vec<ModuleGraph>,
}

impl ReferenceData {
    pub fn load(args: &DetectArgs) -> Result<Self> {
        let frequencies = KoFrequencies::load(&args.ko_occurrences)?;
        let neighbors = NeighborGraph::load(&args.neighbors)?;
        let modules = discover_modules(&args.modules_dir)?;
        Ok(Self {
            frequencies,
            neighbors,
            modules,
        })
    }
}

/// Everything a run produces, before serialization.
pub struct DetectionOutcome {
    pub dk_rows: Vec<KoReportRow>,
    pub detections: Vec<KoDetection>,
    pub best_paths: Vec<PathReportRow>,
    pub dk_before: FxHashMap<String, f64>,
    pub dk_after: FxHashMap<String, f64>,
}

/// CLI entry point for one sample file.
pub fn run(format: HitFormat, args: &DetectArgs) -> Result<()> {
    validate_hits_path(&args.input)?;

    let sample = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!(
        "processing sample {} with completeness={}",
        sample, args.completeness
    );

    let hits = format.parse_file(&args.input)?;
    info!("parsed {} hits from {}", hits.len(), args.input.display());

    let refs = ReferenceData::load(args)?;
    info!(
        "loaded {} KO frequencies, {} neighbor lists, {} modules",
        refs.frequencies.len(),
        refs.neighbors.len(),
        refs.modules.len()
    );

    let config = RunConfig {
        completeness: args.completeness,
        ..RunConfig::default()
    };
    let progress = if args.verbose {
        let bar = ProgressBar::new(refs.modules.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    } else {
        None
    };

    let outcome = run_detection(hits, &refs, &config, progress.as_ref());
    if let Some(bar) = progress {
        bar.finish();
    }

    write_reports(&args.output, &refs, &outcome)?;
    Ok(())
}

/// The in-memory pipeline, separated from file IO so tests can drive it
/// with synthetic hits and reference tables.
pub fn run_detection(
    hits: Vec<HitRecord>,
    refs: &ReferenceData,
    config: &RunConfig,
    progress: Option<&ProgressBar>,
) -> DetectionOutcome {
    // Cluster hits into loci and calibrate per-hit confidence.
    let loci = assign_overlap_groups(&hits, config.min_overlap_frac);
    let scored = calculate_hit_confidence(hits, loci, config.e_threshold);
    let representatives = select_locus_representatives(scored);
    let best_hits = best_hit_per_ko(representatives);

    // Dk over the full module KO universe.
    let universe = ko_universe(&refs.modules);
    let detections = calculate_dk(&universe, &best_hits, &refs.frequencies, config.completeness);

    let dk_before: FxHashMap<String, f64> = detections
        .iter()
        .map(|d| (d.ko.clone(), d.dk_before))
        .collect();
    let dk_after = spring_update(&dk_before, &refs.neighbors, config.alpha);

    // Score candidate paths per module; modules are independent, the
    // input order is sorted, and par_iter preserves it.
    let best_paths: Vec<PathReportRow> = refs
        .modules
        .par_iter()
        .filter_map(|module| {
            let best = best_path(&module.paths, &dk_before, &dk_after);
            if let Some(bar) = progress {
                bar.inc(1);
            }
            best.map(|best| PathReportRow::new(&module.id, best))
        })
        .collect();

    let memberships = ko_to_modules(&refs.modules);
    let dk_rows = detections
        .iter()
        .map(|d| KoReportRow {
            ko: d.ko.clone(),
            score: d.score,
            e_value: d.e_value,
            hit_conf: d.hit_conf,
            ko_freq: d.ko_freq,
            dk_before: d.dk_before,
            dk_after: dk_after.get(&d.ko).copied().unwrap_or(0.0),
            modules: memberships.get(&d.ko).cloned().unwrap_or_default(),
        })
        .collect();

    DetectionOutcome {
        dk_rows,
        detections,
        best_paths,
        dk_before,
        dk_after,
    }
}

/// Write the three report files next to the output prefix, creating the
/// parent directory if needed.
pub fn write_reports(prefix: &Path, refs: &ReferenceData, outcome: &DetectionOutcome) -> Result<()> {
    if let Some(parent) = prefix.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }
    }

    let dk_path = prefixed(prefix, "_dk.csv");
    write_dk_table(&dk_path, &outcome.dk_rows)?;

    let paths_path = prefixed(prefix, "_paths.csv");
    write_paths_table(&paths_path, &outcome.best_paths)?;

    let e_values: FxHashMap<String, f64> = outcome
        .detections
        .iter()
        .map(|d| (d.ko.clone(), d.e_value))
        .collect();
    let best_by_module: FxHashMap<String, BestPath> = outcome
        .best_paths
        .iter()
        .map(|row| {
            (
                row.module.clone(),
                BestPath {
                    path_id: row.path_id,
                    path: row.path.clone(),
                    raw_before: row.raw_before,
                    geo_before: row.geo_before,
                    raw_after: row.raw_after,
                    geo_after: row.geo_after,
                },
            )
        })
        .collect();
    let enriched = build_enriched(
        &refs.modules,
        &refs.frequencies,
        &outcome.dk_before,
        &e_values,
        &outcome.dk_after,
        best_by_module,
    );
    let enriched_path = prefixed(prefix, "_modules_enriched.json");
    write_enriched(&enriched_path, &enriched)?;

    info!(
        "reports written to {}, {} and {}",
        dk_path.display(),
        paths_path.display(),
        enriched_path.display()
    );
    Ok(())
}

fn prefixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
