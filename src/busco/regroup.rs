use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SequenceType;
use crate::error::{IoContext, PipelineError, Result};
use crate::io::fasta::{self, FastaRecord};

use super::scan::SpeciesRun;

/// 单个 BUSCO 的多物种序列文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerFasta {
    pub marker: String,
    pub path: PathBuf,
    /// 文件中出现的物种，与记录顺序一致
    pub species: Vec<String>,
}

/// 读取物种 BUSCO 序列文件的第一条记录，并改名为物种名
fn species_record(run: &SpeciesRun, marker: &str, path: &Path) -> Result<FastaRecord> {
    let rec = fasta::read_fasta_file(path)?
        .into_iter()
        .next()
        .filter(|r| !r.seq.is_empty())
        .ok_or_else(|| PipelineError::Layout {
            directory: run.directory.clone(),
            reason: format!("sequence file for {} ({}) is empty", marker, path.display()),
        })?;
    Ok(FastaRecord { id: run.name.clone(), desc: None, seq: rec.seq })
}

/// 为每个入选 BUSCO 写出 `<out_dir>/<marker>.faa|fna`，
/// 每个拥有该 BUSCO 的物种一条记录，记录名即物种名。
pub fn regroup(
    species: &[SpeciesRun],
    markers: &[String],
    seq_type: SequenceType,
    out_dir: &Path,
) -> Result<Vec<MarkerFasta>> {
    fs::create_dir_all(out_dir).at(out_dir)?;
    let mut out = Vec::with_capacity(markers.len());
    for marker in markers {
        let mut records = Vec::new();
        for run in species {
            if let Some(path) = run.markers.get(marker) {
                records.push(species_record(run, marker, path)?);
            }
        }
        let path = out_dir.join(format!("{}.{}", marker, seq_type.extension()));
        fasta::write_fasta_file(&path, &records)?;
        out.push(MarkerFasta {
            marker: marker.clone(),
            path,
            species: records.into_iter().map(|r| r.id).collect(),
        });
    }
    Ok(out)
}
