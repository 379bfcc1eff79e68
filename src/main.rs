use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use busco_phylogenomics::config::{
    parse_missing_character, Aligner, Analysis, BuscoLayout, PipelineConfig, SequenceType, TreeProgram,
    TrimalStrategy,
};
use busco_phylogenomics::pipeline::Pipeline;
use busco_phylogenomics::util::logging;

#[derive(Parser, Debug)]
#[command(
    name = "busco-phylogenomics",
    author,
    version,
    about = "Perform phylogenomic reconstruction using BUSCO sequences",
    arg_required_else_help = true
)]
struct Cli {
    /// Input directory containing completed BUSCO runs
    #[arg(short = 'i', long = "input")]
    input: PathBuf,
    /// Output directory to store results (must not exist)
    #[arg(short = 'o', long = "output")]
    output: PathBuf,
    /// Number of threads to use
    #[arg(short = 't', long = "threads")]
    threads: usize,
    /// Don't generate gene trees
    #[arg(long = "supermatrix_only", conflicts_with = "gene_trees_only")]
    supermatrix_only: bool,
    /// Don't perform supermatrix analysis
    #[arg(long = "gene_trees_only")]
    gene_trees_only: bool,
    /// Align nucleotide sequences instead of amino acid sequences
    #[arg(long = "nt")]
    nt: bool,
    /// BUSCOs that are complete and single-copy in at least this percent of species are included
    #[arg(long = "percent_single_copy", visible_alias = "psc", default_value_t = 100.0)]
    psc: f64,
    /// trimal trimming strategy
    #[arg(long = "trimal_strategy", value_enum, default_value_t = TrimalStrategy::Automated1)]
    trimal_strategy: TrimalStrategy,
    /// Character to represent missing data
    #[arg(long = "missing_character", default_value = "?", value_parser = parse_missing_character)]
    missing_character: char,
    /// Program to use to generate gene trees and the supermatrix tree
    #[arg(long = "gene_tree_program", value_enum, default_value_t = TreeProgram::Fasttree)]
    gene_tree_program: TreeProgram,
    /// Multiple sequence aligner
    #[arg(long = "aligner", value_enum, default_value_t = Aligner::Muscle)]
    aligner: Aligner,
    /// BUSCO version 3 was used (different output structure)
    #[arg(long = "busco_version_3")]
    busco_version_3: bool,
}

impl Cli {
    fn into_config(self) -> Result<PipelineConfig> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        let absolute = |p: &Path| if p.is_absolute() { p.to_path_buf() } else { cwd.join(p) };
        Ok(PipelineConfig {
            input: absolute(&self.input),
            output: absolute(&self.output),
            threads: self.threads,
            analysis: Analysis::from_flags(self.gene_trees_only, self.supermatrix_only)?,
            sequence_type: if self.nt { SequenceType::Nucleotide } else { SequenceType::Protein },
            percent_single_copy: self.psc,
            trimal_strategy: self.trimal_strategy,
            missing_character: self.missing_character,
            gene_tree_program: self.gene_tree_program,
            aligner: self.aligner,
            layout: if self.busco_version_3 { BuscoLayout::V3 } else { BuscoLayout::V5 },
        })
    }
}

/// 兼容单横线写法 `-psc 90` / `-psc=90`（clap 的短参数只能是单个字符）。
fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|a| match a.to_str().and_then(|s| s.strip_prefix("-psc")) {
            Some(rest) if rest.is_empty() || rest.starts_with('=') => OsString::from(format!("--psc{}", rest)),
            _ => a,
        })
        .collect()
}

fn main() {
    logging::init();
    let args = normalize_args(std::env::args_os());
    let cli = Cli::parse_from(&args);
    if let Err(e) = run(cli, &args) {
        error!("ERROR. {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, args: &[OsString]) -> Result<()> {
    info!("Starting BUSCO Phylogenomics Pipeline");
    let raw: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
    info!("User provided arguments: {}", raw.join(" "));

    let cfg = cli.into_config()?;
    info!("Parsed arguments: {:?}", cfg);

    let summary = Pipeline::new(&cfg)?.run()?;
    info!(
        "Finished: {} species, {} of {} BUSCOs completed, {} failed",
        summary.species.len(),
        summary.markers_completed,
        summary.markers_selected.len(),
        summary.failed.len()
    );
    if let Some(sm) = &summary.supermatrix {
        info!("Supermatrix tree: {}", sm.species_tree.display());
    }
    if let Some(gt) = &summary.gene_trees {
        info!("Gene trees: {}", gt.display());
    }
    Ok(())
}
