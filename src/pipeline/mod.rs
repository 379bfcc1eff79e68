//! 整个流水线的阶段调度。
//!
//! `Init → ValidateInput → ScanSpecies → SelectMarkers → RegroupSequences →
//! ProcessMarkers → [Concatenate → SupermatrixTree] → Done`
//!
//! 每个 BUSCO 的比对/修剪/建树在 rayon 线程池中并行执行，各自写入独立目录；
//! 超矩阵拼接在所有 BUSCO 完成之后单线程进行。

pub mod marker;
pub mod summary;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use rayon::prelude::*;

use crate::busco::{self, MarkerFasta, Occupancy, SpeciesRun};
use crate::config::{PipelineConfig, TreeProgram};
use crate::error::{IoContext, PipelineError, Result};
use crate::supermatrix::{self, Supermatrix, TrimmedAlignment};
use crate::tools::{tree, Toolbox};

use marker::{process_marker, MarkerResult};
use summary::{FailedMarker, RunSummary, SpeciesSummary, SupermatrixSummary};

pub const SEQUENCES_DIR: &str = "sequences";
pub const MARKERS_DIR: &str = "markers";
pub const GENE_TREES_DIR: &str = "gene_trees";
pub const SUPERMATRIX_DIR: &str = "supermatrix";
pub const ALL_GENE_TREES: &str = "ALL_GENE_TREES.newick";
pub const SUPERMATRIX_PREFIX: &str = "SUPERMATRIX";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ValidateInput,
    ScanSpecies,
    SelectMarkers,
    RegroupSequences,
    ProcessMarkers,
    Concatenate,
    SupermatrixTree,
    Done,
}

/// 输入目录必须存在，输出目录必须不存在。
pub fn check_paths(cfg: &PipelineConfig) -> Result<()> {
    if !cfg.input.is_dir() {
        return Err(PipelineError::InputNotFound(cfg.input.clone()));
    }
    if cfg.output.exists() {
        return Err(PipelineError::OutputExists(cfg.output.clone()));
    }
    Ok(())
}

pub struct Pipeline<'a> {
    cfg: &'a PipelineConfig,
    tools: Toolbox,
    stage: Stage,
}

impl<'a> Pipeline<'a> {
    /// 校验配置与路径，并在 PATH 中查找外部程序。
    pub fn new(cfg: &'a PipelineConfig) -> Result<Self> {
        cfg.validate()?;
        check_paths(cfg)?;
        let tools = Toolbox::discover(cfg)?;
        Ok(Self::validated(cfg, tools))
    }

    /// 使用已确定的外部程序路径（不查找 PATH）。
    pub fn with_tools(cfg: &'a PipelineConfig, tools: Toolbox) -> Result<Self> {
        cfg.validate()?;
        check_paths(cfg)?;
        Ok(Self::validated(cfg, tools))
    }

    fn validated(cfg: &'a PipelineConfig, tools: Toolbox) -> Self {
        let mut p = Self { cfg, tools, stage: Stage::Init };
        p.enter(Stage::ValidateInput);
        p
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        debug!("stage {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    /// 依次执行各阶段；失败时 `stage()` 停留在出错的阶段。
    pub fn run(&mut self) -> Result<RunSummary> {
        self.run_stages().map_err(|e| {
            info!("Run stopped at stage {:?}", self.stage);
            e
        })
    }

    fn run_stages(&mut self) -> Result<RunSummary> {
        let started = Utc::now().to_rfc3339();
        let cfg = self.cfg;

        self.enter(Stage::ScanSpecies);
        let species = busco::scan_input(&cfg.input, cfg.layout, cfg.sequence_type)?;
        info!("{} species found", species.len());

        self.enter(Stage::SelectMarkers);
        let occupancy = Occupancy::from_species(&species);
        let selected = occupancy.select(cfg.percent_single_copy);
        info!(
            "{} of {} BUSCOs are complete and single-copy in at least {}% of species",
            selected.len(),
            occupancy.n_markers(),
            cfg.percent_single_copy
        );
        if selected.is_empty() {
            return Err(PipelineError::NoMarkers(cfg.percent_single_copy));
        }

        self.enter(Stage::RegroupSequences);
        fs::create_dir(&cfg.output).at(&cfg.output)?;
        let fastas = busco::regroup(&species, &selected, cfg.sequence_type, &cfg.output.join(SEQUENCES_DIR))?;

        self.enter(Stage::ProcessMarkers);
        let outcomes = self.process_all(&fastas)?;
        let mut failed = Vec::new();
        let mut done: Vec<MarkerResult> = Vec::new();
        for (marker, outcome) in outcomes {
            match outcome {
                Ok(r) => done.push(r),
                Err(e) => {
                    error!("{}: {}", marker, e);
                    failed.push(FailedMarker { marker, reason: e.to_string() });
                }
            }
        }

        let gene_trees = if cfg.analysis.gene_trees() {
            Some(collect_gene_trees(&done, &cfg.output.join(GENE_TREES_DIR))?)
        } else {
            None
        };

        let supermatrix = if cfg.analysis.supermatrix() {
            self.enter(Stage::Concatenate);
            let alignments = load_alignments(&done, &mut failed);
            write_failures_if_any(&failed, &cfg.output)?;
            if alignments.is_empty() {
                return Err(PipelineError::AllMarkersFailed(selected.len()));
            }
            let sm = Supermatrix::build(&species_names(&species), &alignments, cfg.missing_character as u8)?;

            self.enter(Stage::SupermatrixTree);
            Some(self.supermatrix_tree(&sm)?)
        } else {
            write_failures_if_any(&failed, &cfg.output)?;
            if done.is_empty() {
                return Err(PipelineError::AllMarkersFailed(selected.len()));
            }
            None
        };

        self.enter(Stage::Done);
        let summary = RunSummary {
            started,
            finished: Utc::now().to_rfc3339(),
            config: cfg.clone(),
            species: species.iter().map(SpeciesSummary::from).collect(),
            markers_observed: occupancy.n_markers(),
            markers_selected: selected,
            markers_completed: done.len(),
            failed,
            gene_trees,
            supermatrix,
        };
        summary.save(&cfg.output.join("run_summary.json"))?;
        info!("Results written to {}", cfg.output.display());
        Ok(summary)
    }

    /// 线程池并行处理所有 BUSCO，返回顺序与输入一致。
    fn process_all(&self, fastas: &[MarkerFasta]) -> Result<Vec<(String, Result<MarkerResult>)>> {
        let markers_dir = self.cfg.output.join(MARKERS_DIR);
        fs::create_dir_all(&markers_dir).at(&markers_dir)?;
        let pool = rayon::ThreadPoolBuilder::new().num_threads(self.cfg.threads).build()?;

        info!("Aligning and trimming {} BUSCOs with {} threads", fastas.len(), self.cfg.threads);
        let pb = ProgressBar::new(fastas.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} BUSCOs ({elapsed})") {
            pb.set_style(style);
        }

        let outcomes = pool.install(|| {
            fastas
                .par_iter()
                .map(|f| {
                    let r = process_marker(f, self.cfg, &self.tools, &markers_dir);
                    pb.inc(1);
                    (f.marker.clone(), r)
                })
                .collect::<Vec<_>>()
        });
        pb.finish_and_clear();
        Ok(outcomes)
    }

    fn supermatrix_tree(&self, sm: &Supermatrix) -> Result<SupermatrixSummary> {
        let dir = self.cfg.output.join(SUPERMATRIX_DIR);
        fs::create_dir_all(&dir).at(&dir)?;
        let prefix = dir.join(SUPERMATRIX_PREFIX);
        let path = |ext: &str| PathBuf::from(format!("{}.{}", prefix.display(), ext));

        let fasta = path("fasta");
        let phylip = path("phylip");
        let partitions = path("partitions.nex");
        let occupancy = dir.join("occupancy.tsv");
        supermatrix::write::write_fasta(sm, &fasta)?;
        supermatrix::write::write_phylip(sm, &phylip)?;
        supermatrix::write::write_partitions(sm, &partitions)?;
        supermatrix::write::write_occupancy(sm, &occupancy)?;
        info!(
            "Supermatrix: {} species x {} columns from {} BUSCOs",
            sm.n_species(),
            sm.width(),
            sm.partitions.len()
        );

        // IQ-TREE 读 PHYLIP 并使用分区；fasttree 直接读 FASTA
        let input = match self.tools.tree_program {
            TreeProgram::Fasttree => &fasta,
            TreeProgram::Iqtree => &phylip,
        };
        let job = tree::command(
            self.tools.tree_program,
            &self.tools.tree_path,
            self.cfg.sequence_type,
            input,
            &prefix,
            self.cfg.threads,
            Some(partitions.as_path()),
            &dir.join("tree.log"),
        );
        info!("Inferring species tree with {}", self.tools.tree_program);
        job.command.run(SUPERMATRIX_PREFIX)?;
        if !job.treefile.is_file() {
            return Err(PipelineError::MissingOutput {
                tool: self.tools.tree_program.to_string(),
                path: job.treefile,
            });
        }
        info!("Species tree: {}", job.treefile.display());

        Ok(SupermatrixSummary {
            fasta,
            phylip,
            partitions,
            occupancy,
            n_markers: sm.partitions.len(),
            width: sm.width(),
            species_tree: job.treefile,
        })
    }
}

/// 读取修剪后的比对；格式错误或宽度为 0 的 BUSCO 记为失败并排除。
fn load_alignments(done: &[MarkerResult], failed: &mut Vec<FailedMarker>) -> Vec<TrimmedAlignment> {
    let mut out = Vec::with_capacity(done.len());
    for r in done {
        match TrimmedAlignment::from_file(&r.marker, &r.trimmed) {
            Ok(a) if a.width == 0 => {
                warn!("{}: trimming removed every column, excluded from supermatrix", r.marker);
                failed.push(FailedMarker { marker: r.marker.clone(), reason: "empty trimmed alignment".into() });
            }
            Ok(a) => out.push(a),
            Err(e) => {
                error!("{}: {}", r.marker, e);
                failed.push(FailedMarker { marker: r.marker.clone(), reason: e.to_string() });
            }
        }
    }
    out
}

/// 把各基因树复制到 `gene_trees/`，并按 BUSCO 顺序合并为 `ALL_GENE_TREES.newick`。
fn collect_gene_trees(done: &[MarkerResult], dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).at(dir)?;
    let mut all = String::new();
    let mut n = 0usize;
    for r in done {
        if let Some(e) = &r.tree_error {
            warn!("{}: gene tree failed: {}", r.marker, e);
        }
        let Some(t) = &r.tree else { continue };
        let newick = fs::read_to_string(t).at(t)?;
        let target = dir.join(format!("{}.treefile", r.marker));
        fs::write(&target, &newick).at(&target)?;
        all.push_str(newick.trim_end());
        all.push('\n');
        n += 1;
    }
    let path = dir.join(ALL_GENE_TREES);
    fs::write(&path, all).at(&path)?;
    info!("{} gene trees written to {}", n, path.display());
    Ok(path)
}

fn write_failures_if_any(failed: &[FailedMarker], output: &Path) -> Result<()> {
    if failed.is_empty() {
        return Ok(());
    }
    let path = output.join("failed_markers.tsv");
    warn!("{} BUSCOs failed, listed in {}", failed.len(), path.display());
    summary::write_failures(failed, &path)
}

fn species_names(species: &[SpeciesRun]) -> Vec<String> {
    species.iter().map(|s| s.name.clone()).collect()
}
