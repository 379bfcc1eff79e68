use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::busco::SpeciesRun;
use crate::config::PipelineConfig;
use crate::error::{IoContext, PipelineError, Result};
use crate::io::full_table::BuscoTally;

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesSummary {
    pub name: String,
    pub directory: PathBuf,
    pub busco: BuscoTally,
}

impl From<&SpeciesRun> for SpeciesSummary {
    fn from(run: &SpeciesRun) -> Self {
        Self { name: run.name.clone(), directory: run.directory.clone(), busco: run.tally }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedMarker {
    pub marker: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupermatrixSummary {
    pub fasta: PathBuf,
    pub phylip: PathBuf,
    pub partitions: PathBuf,
    pub occupancy: PathBuf,
    pub n_markers: usize,
    pub width: usize,
    pub species_tree: PathBuf,
}

/// 写入 `run_summary.json` 的运行记录
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started: String,
    pub finished: String,
    pub config: PipelineConfig,
    pub species: Vec<SpeciesSummary>,
    pub markers_observed: usize,
    pub markers_selected: Vec<String>,
    pub markers_completed: usize,
    pub failed: Vec<FailedMarker>,
    pub gene_trees: Option<PathBuf>,
    pub supermatrix: Option<SupermatrixSummary>,
}

impl RunSummary {
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path).at(path)?);
        serde_json::to_writer_pretty(&mut out, self)
            .map_err(|e| PipelineError::Io { path: path.to_path_buf(), source: e.into() })?;
        writeln!(out).at(path)?;
        out.flush().at(path)
    }
}

/// `failed_markers.tsv`：BUSCO ID 与失败原因
pub fn write_failures(failed: &[FailedMarker], path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path).at(path)?);
    writeln!(out, "busco_id\treason").at(path)?;
    for f in failed {
        writeln!(out, "{}\t{}", f.marker, f.reason.replace(['\t', '\n'], " ")).at(path)?;
    }
    out.flush().at(path)
}
