//! End-to-end runs against stub `muscle` / `trimal` / `fasttree` shell scripts.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use busco_phylogenomics::config::{Aligner, Analysis, PipelineConfig, TreeProgram};
use busco_phylogenomics::error::PipelineError;
use busco_phylogenomics::io::fasta::read_fasta_file;
use busco_phylogenomics::pipeline::Pipeline;
use busco_phylogenomics::tools::Toolbox;

// 脚本只写一次，避免写入时其他线程 fork 导致 ETXTBSY
fn stub_dir() -> &'static Path {
    static DIR: OnceLock<tempfile::TempDir> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let scripts = [
            // muscle -align IN -output OUT
            ("muscle", "#!/bin/sh\ncp \"$2\" \"$4\"\n"),
            // trimal -in IN -out OUT -strategy
            (
                "trimal",
                "#!/bin/sh\ncase \"$2\" in *FAIL*) echo 'trimal: bad alignment' >&2; exit 1;; esac\ncp \"$2\" \"$4\"\n",
            ),
            ("fasttree", "#!/bin/sh\necho '(a,b,c);'\n"),
        ];
        for (name, body) in scripts {
            let p = dir.path().join(name);
            fs::write(&p, body).unwrap();
            fs::set_permissions(&p, fs::Permissions::from_mode(0o755)).unwrap();
        }
        dir
    })
    .path()
}

fn toolbox() -> Toolbox {
    let d = stub_dir();
    Toolbox {
        aligner: Aligner::Muscle,
        aligner_path: d.join("muscle"),
        trimal_path: d.join("trimal"),
        tree_program: TreeProgram::Fasttree,
        tree_path: d.join("fasttree"),
    }
}

/// BUSCO v5 layout for one species; every sequence of a marker has the same length
/// so the pass-through aligner yields a valid alignment.
fn species(root: &Path, name: &str, markers: &[(&str, &str)]) {
    let run = root.join(name).join("run_eukaryota_odb10");
    let seqs = run.join("busco_sequences/single_copy_busco_sequences");
    fs::create_dir_all(&seqs).unwrap();
    let mut table = String::from("# BUSCO version is: 5.4.7\n# Busco id\tStatus\tSequence\n");
    for (id, seq) in markers {
        table.push_str(&format!("{}\tComplete\tscaffold_1\t1\t100\t+\t50.0\t{}\n", id, seq.len()));
        fs::write(seqs.join(format!("{}.faa", id)), format!(">scaffold_1:1-100\n{}\n", seq)).unwrap();
    }
    table.push_str("ZZZat1\tMissing\n");
    fs::write(run.join("full_table.tsv"), table).unwrap();
}

struct Fixture {
    _tmp: tempfile::TempDir,
    input: PathBuf,
    output: PathBuf,
}

fn fixture(extra: &[(&str, &str)]) -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("busco");
    let mut a = vec![("M1at1", "MKVL"), ("M2at1", "AAA"), ("M3at1", "W")];
    a.extend_from_slice(extra);
    species(&input, "alpha", &a);
    let mut b = vec![("M1at1", "MKIL"), ("M2at1", "AAG")];
    b.extend_from_slice(extra);
    species(&input, "beta", &b);
    let mut c = vec![("M1at1", "MRIL")];
    c.extend_from_slice(extra);
    species(&input, "gamma", &c);
    let output = tmp.path().join("out");
    Fixture { _tmp: tmp, input, output }
}

fn config(f: &Fixture, psc: f64) -> PipelineConfig {
    let mut cfg = PipelineConfig::new(&f.input, &f.output, 2);
    cfg.percent_single_copy = psc;
    cfg
}

#[test]
fn full_run_builds_padded_supermatrix_and_gene_trees() {
    let f = fixture(&[]);
    let cfg = config(&f, 60.0);
    let summary = Pipeline::with_tools(&cfg, toolbox()).unwrap().run().unwrap();

    assert_eq!(summary.markers_selected, vec!["M1at1", "M2at1"]);
    assert!(summary.failed.is_empty());

    let sm = summary.supermatrix.expect("supermatrix");
    assert_eq!(sm.width, 7);
    let rows = read_fasta_file(&sm.fasta).unwrap();
    let names: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    assert_eq!(rows[0].seq, b"MKVLAAA");
    assert_eq!(rows[2].seq, b"MRIL???");
    assert!(rows.iter().all(|r| r.seq.len() == 7));
    assert!(sm.species_tree.is_file());

    let parts = fs::read_to_string(&sm.partitions).unwrap();
    assert!(parts.contains("charset M1at1 = 1-4;"));
    assert!(parts.contains("charset M2at1 = 5-7;"));

    // M2at1 has only two sequences, too few for a gene tree
    let all = fs::read_to_string(summary.gene_trees.unwrap()).unwrap();
    assert_eq!(all.lines().count(), 1);
    assert!(f.output.join("gene_trees/M1at1.treefile").is_file());
    assert!(f.output.join("markers/M2at1/M2at1.trimmed.aln").is_file());
    assert!(f.output.join("run_summary.json").is_file());
}

#[test]
fn stricter_threshold_drops_partial_marker() {
    let f = fixture(&[]);
    let cfg = config(&f, 70.0);
    let summary = Pipeline::with_tools(&cfg, toolbox()).unwrap().run().unwrap();
    assert_eq!(summary.markers_selected, vec!["M1at1"]);
    assert_eq!(summary.supermatrix.unwrap().width, 4);
}

#[test]
fn failed_marker_is_excluded_and_reported() {
    let f = fixture(&[("FAIL9at1", "MMM")]);
    let cfg = config(&f, 100.0);
    let summary = Pipeline::with_tools(&cfg, toolbox()).unwrap().run().unwrap();

    assert_eq!(summary.markers_selected, vec!["FAIL9at1", "M1at1"]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].marker, "FAIL9at1");
    let sm = summary.supermatrix.unwrap();
    assert_eq!(sm.n_markers, 1);
    assert_eq!(sm.width, 4);

    let report = fs::read_to_string(f.output.join("failed_markers.tsv")).unwrap();
    assert!(report.lines().nth(1).unwrap().starts_with("FAIL9at1\t"));
    assert!(f.output.join("markers/FAIL9at1/trim.log").is_file());
}

#[test]
fn gene_trees_only_skips_supermatrix() {
    let f = fixture(&[]);
    let mut cfg = config(&f, 100.0);
    cfg.analysis = Analysis::GeneTreesOnly;
    let summary = Pipeline::with_tools(&cfg, toolbox()).unwrap().run().unwrap();
    assert!(summary.supermatrix.is_none());
    assert!(summary.gene_trees.is_some());
    assert!(!f.output.join("supermatrix").exists());
}

#[test]
fn supermatrix_only_skips_gene_trees() {
    let f = fixture(&[]);
    let mut cfg = config(&f, 100.0);
    cfg.analysis = Analysis::SupermatrixOnly;
    let summary = Pipeline::with_tools(&cfg, toolbox()).unwrap().run().unwrap();
    assert!(summary.gene_trees.is_none());
    assert!(!f.output.join("gene_trees").exists());
    assert!(!f.output.join("markers/M1at1/M1at1.treefile").exists());
}

#[test]
fn existing_output_directory_is_left_alone() {
    let f = fixture(&[]);
    fs::create_dir(&f.output).unwrap();
    fs::write(f.output.join("notes.txt"), "keep me").unwrap();

    let cfg = config(&f, 100.0);
    let err = Pipeline::with_tools(&cfg, toolbox()).err().expect("must fail");
    assert!(matches!(err, PipelineError::OutputExists(_)));
    assert_eq!(fs::read_dir(&f.output).unwrap().count(), 1);
    assert_eq!(fs::read_to_string(f.output.join("notes.txt")).unwrap(), "keep me");
}

#[test]
fn no_selected_marker_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("busco");
    species(&input, "alpha", &[("A1", "MK")]);
    species(&input, "beta", &[("B1", "MK")]);
    let output = tmp.path().join("out");
    let cfg = PipelineConfig::new(&input, &output, 1);

    let err = Pipeline::with_tools(&cfg, toolbox()).unwrap().run().unwrap_err();
    assert!(matches!(err, PipelineError::NoMarkers(_)));
    assert!(!output.exists());
}

fn all_failing_fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("busco");
    for name in ["alpha", "beta", "gamma"] {
        species(&input, name, &[("FAIL1at1", "MKV"), ("FAIL2at1", "MKI")]);
    }
    let output = tmp.path().join("out");
    Fixture { _tmp: tmp, input, output }
}

#[test]
fn every_marker_failing_aborts_supermatrix_run() {
    let f = all_failing_fixture();
    let cfg = config(&f, 100.0);
    let err = Pipeline::with_tools(&cfg, toolbox()).unwrap().run().unwrap_err();

    assert!(matches!(err, PipelineError::AllMarkersFailed(2)));
    let report = fs::read_to_string(f.output.join("failed_markers.tsv")).unwrap();
    assert_eq!(report.lines().count(), 3);
    assert!(!f.output.join("supermatrix").exists());
    assert!(!f.output.join("run_summary.json").exists());
}

#[test]
fn every_marker_failing_aborts_gene_trees_only_run() {
    let f = all_failing_fixture();
    let mut cfg = config(&f, 100.0);
    cfg.analysis = Analysis::GeneTreesOnly;
    let err = Pipeline::with_tools(&cfg, toolbox()).unwrap().run().unwrap_err();

    assert!(matches!(err, PipelineError::AllMarkersFailed(2)));
    assert!(f.output.join("failed_markers.tsv").is_file());
    assert!(!f.output.join("run_summary.json").exists());
}

#[test]
fn species_name_with_whitespace_stops_before_any_output() {
    let f = fixture(&[]);
    species(&f.input, "Homo sapiens", &[("M1at1", "MKVI")]);
    let cfg = config(&f, 60.0);

    let err = Pipeline::with_tools(&cfg, toolbox()).unwrap().run().unwrap_err();
    match err {
        PipelineError::Layout { directory, .. } => assert!(directory.ends_with("Homo sapiens")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!f.output.exists());
}
