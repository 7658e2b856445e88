//! End-to-end pipeline tests over a synthetic sample: a domtblout hit
//! table, a KO occurrence table, a neighbor graph and two module
//! graphs, written to a temporary directory and processed through the
//! CLI entry path.

use std::fs;
use std::path::{Path, PathBuf};

use komod::input::HitFormat;
use komod::pipeline::{self, DetectArgs};

fn domtblout_row(target: &str, ko: &str, score: f64, ali_from: i64, ali_to: i64) -> String {
    format!(
        "{} - 500 {} - 250 1e-40 150.0 0.1 1 1 1e-38 1.0e-12 {} 0.1 3 248 {} {} 5 60 0.95 -\n",
        target, ko, score, ali_from, ali_to
    )
}

/// Two overlapping plus-strand hits on the same target: K00001 at
/// [10,50] score 20 and K00002 at [15,55] score 15. They cluster into
/// one locus; K00001 wins the locus and K00002's hit is discarded.
fn write_fixture(dir: &Path) -> DetectArgs {
    let input = dir.join("sample.domtblout");
    let mut table = String::new();
    table.push_str("# --- full sequence ---\n# target name\n#-----------\n");
    table.push_str(&domtblout_row("contig_1", "K00001", 20.0, 10, 50));
    table.push_str(&domtblout_row("contig_1", "K00002", 15.0, 15, 55));
    for i in 0..10 {
        table.push_str(&format!("# footer {}\n", i));
    }
    fs::write(&input, table).expect("write hit table");

    let occurrences = dir.join("ko_occurrences.txt");
    fs::write(&occurrences, "KO_ID occurences\nK00001 179\nK00002 895\n")
        .expect("write occurrences");

    let neighbors = dir.join("ko_neighbors.txt");
    fs::write(&neighbors, "K00001:0:K00002:2.0\n").expect("write neighbors");

    let modules_dir = dir.join("modules");
    fs::create_dir(&modules_dir).expect("create modules dir");
    fs::write(
        modules_dir.join("module_M00001_nodes.json"),
        r#"{"K00001_a": 0, "and_1": 1, "K00002_b": 2}"#,
    )
    .expect("write nodes");
    fs::write(
        modules_dir.join("module_M00001_paths.json"),
        r#"{"1": "K00001_a,and_1,K00002_b", "2": "K00001_a"}"#,
    )
    .expect("write paths");
    // M00002 has nodes but no candidate paths
    fs::write(
        modules_dir.join("module_M00002_nodes.json"),
        r#"{"K00003_x": 0}"#,
    )
    .expect("write nodes");

    DetectArgs {
        input,
        completeness: 1.0,
        output: dir.join("out").join("sample"),
        ko_occurrences: occurrences,
        neighbors,
        modules_dir,
        verbose: false,
    }
}

fn read_csv_rows(path: &PathBuf) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(path).expect("open csv");
    reader.records().collect::<Result<_, _>>().expect("records")
}

#[test]
fn test_end_to_end_domtblout_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = write_fixture(dir.path());
    pipeline::run(HitFormat::Domtblout, &args).expect("pipeline run");

    // dk table: the full module KO universe, sorted
    let dk_rows = read_csv_rows(&dir.path().join("out").join("sample_dk.csv"));
    assert_eq!(dk_rows.len(), 3);
    assert_eq!(&dk_rows[0][0], "K00001");
    assert_eq!(&dk_rows[1][0], "K00002");
    assert_eq!(&dk_rows[2][0], "K00003");

    // K00001 carries the locus confidence: 2^20 / (2^20 + 2^15 + 1e5)
    let conf: f64 = dk_rows[0][3].parse().expect("hit_conf");
    assert!((conf - 1048576.0 / 1181344.0).abs() < 1e-6);

    // K00002 lost the locus to K00001, so only background remains
    let conf2: f64 = dk_rows[1][3].parse().expect("hit_conf");
    assert_eq!(conf2, 0.0);
    let dk2: f64 = dk_rows[1][5].parse().expect("dk_before");
    let sigma = 1.0 - (3.0f64.exp() - 1.0) / 3.0f64.exp();
    assert!((dk2 - sigma).abs() < 1e-9);

    // Diffusion only lifts probabilities, capped at 1
    for row in &dk_rows {
        let before: f64 = row[5].parse().expect("dk_before");
        let after: f64 = row[6].parse().expect("dk_after");
        assert!((0.0..=1.0).contains(&before));
        assert!(after >= before && after <= 1.0);
    }
    // K00002 and K00003 have no adjacency entry: unchanged by diffusion
    assert_eq!(dk_rows[1][5], dk_rows[1][6]);
    assert_eq!(dk_rows[2][5], dk_rows[2][6]);

    // Module memberships
    assert_eq!(&dk_rows[0][7], "M00001");
    assert_eq!(&dk_rows[2][7], "M00002");

    // Best path: the single-KO path beats the route through weak K00002
    let path_rows = read_csv_rows(&dir.path().join("out").join("sample_paths.csv"));
    assert_eq!(path_rows.len(), 1);
    assert_eq!(&path_rows[0][0], "M00001");
    assert_eq!(&path_rows[0][1], "2");
    assert_eq!(&path_rows[0][2], "K00001_a");
    let geo_after: f64 = path_rows[0][6].parse().expect("geo_after");
    let dk1_after: f64 = dk_rows[0][6].parse().expect("dk_after");
    assert!((geo_after - dk1_after).abs() < 1e-9);

    // Enriched JSON: nodes in group order, M00002 without a best path
    let enriched: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("out").join("sample_modules_enriched.json"))
            .expect("read enriched"),
    )
    .expect("parse enriched");
    let m1 = &enriched["M00001"];
    assert_eq!(m1["best_path"]["path_id"], 2);
    assert_eq!(m1["nodes"][0]["id"], "K00001_a");
    assert_eq!(m1["nodes"][1]["id"], "and_1");
    // Node keys are the diagram viewer's load contract
    for key in ["KO_Occurrence", "Dk_before", "E-value", "Dk_after"] {
        assert!(
            m1["nodes"][0].get(key).is_some(),
            "viewer key {:?} missing from enriched nodes",
            key
        );
    }
    assert!(enriched["M00002"]["best_path"].is_null());
}

#[test]
fn test_runs_are_byte_identical() {
    let dir_a = tempfile::tempdir().expect("tempdir");
    let dir_b = tempfile::tempdir().expect("tempdir");
    let args_a = write_fixture(dir_a.path());
    let args_b = write_fixture(dir_b.path());
    pipeline::run(HitFormat::Domtblout, &args_a).expect("run a");
    pipeline::run(HitFormat::Domtblout, &args_b).expect("run b");

    for name in [
        "sample_dk.csv",
        "sample_paths.csv",
        "sample_modules_enriched.json",
    ] {
        let a = fs::read(dir_a.path().join("out").join(name)).expect("read a");
        let b = fs::read(dir_b.path().join("out").join(name)).expect("read b");
        assert_eq!(a, b, "output {} differs between runs", name);
    }
}

#[test]
fn test_rejects_empty_input_before_computation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut args = write_fixture(dir.path());
    let empty = dir.path().join("empty.domtblout");
    fs::write(&empty, "").expect("write empty");
    args.input = empty;
    assert!(pipeline::run(HitFormat::Domtblout, &args).is_err());
}
