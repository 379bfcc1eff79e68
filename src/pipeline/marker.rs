use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::busco::MarkerFasta;
use crate::config::PipelineConfig;
use crate::error::{IoContext, PipelineError, Result};
use crate::tools::{align, trim, tree, Toolbox};

/// 无根树至少需要三个类群
pub const MIN_TREE_TAXA: usize = 3;

/// 单个 BUSCO 处理完成后的产物
#[derive(Debug, Clone)]
pub struct MarkerResult {
    pub marker: String,
    pub trimmed: PathBuf,
    pub tree: Option<PathBuf>,
    /// 基因树失败不影响超矩阵，只记录原因
    pub tree_error: Option<String>,
}

fn require_output(path: &Path, tool: &str) -> Result<()> {
    match fs::metadata(path) {
        Ok(m) if m.len() > 0 => Ok(()),
        _ => Err(PipelineError::MissingOutput { tool: tool.to_string(), path: path.to_path_buf() }),
    }
}

/// 比对 → 修剪 → （可选）基因树，全部写在 `<markers_dir>/<marker>/` 下。
pub fn process_marker(
    fasta: &MarkerFasta,
    cfg: &PipelineConfig,
    tools: &Toolbox,
    markers_dir: &Path,
) -> Result<MarkerResult> {
    let marker = fasta.marker.as_str();
    let dir = markers_dir.join(marker);
    fs::create_dir_all(&dir).at(&dir)?;

    let aligned = dir.join(format!("{}.aln", marker));
    align::command(tools.aligner, &tools.aligner_path, &fasta.path, &aligned, &dir.join("align.log"))
        .run(marker)?;
    require_output(&aligned, &tools.aligner.to_string())?;

    let trimmed = dir.join(format!("{}.trimmed.aln", marker));
    trim::command(&tools.trimal_path, cfg.trimal_strategy, &aligned, &trimmed, &dir.join("trim.log"))
        .run(marker)?;
    require_output(&trimmed, "trimal")?;

    let mut result = MarkerResult { marker: marker.to_string(), trimmed, tree: None, tree_error: None };
    if !cfg.analysis.gene_trees() {
        return Ok(result);
    }
    if fasta.species.len() < MIN_TREE_TAXA {
        debug!("{}: {} sequences, skipping gene tree", marker, fasta.species.len());
        return Ok(result);
    }

    let job = tree::command(
        tools.tree_program,
        &tools.tree_path,
        cfg.sequence_type,
        &result.trimmed,
        &dir.join(marker),
        1,
        None,
        &dir.join("tree.log"),
    );
    match job.command.run(marker).and_then(|()| require_output(&job.treefile, &tools.tree_program.to_string())) {
        Ok(()) => result.tree = Some(job.treefile),
        Err(e) => result.tree_error = Some(e.to_string()),
    }
    Ok(result)
}
