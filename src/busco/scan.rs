use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::{BuscoLayout, SequenceType};
use crate::error::{IoContext, PipelineError, Result};
use crate::io::full_table::{BuscoTally, FullTable};

const RUN_PREFIX: &str = "run_";

/// 一个物种的 BUSCO 结果
#[derive(Debug, Clone)]
pub struct SpeciesRun {
    pub name: String,
    pub directory: PathBuf,
    /// 单拷贝完整 BUSCO ID → 序列文件
    pub markers: BTreeMap<String, PathBuf>,
    pub tally: BuscoTally,
}

/// 单个物种运行目录中需要的文件位置
struct RunPaths {
    full_table: PathBuf,
    sequences: PathBuf,
}

fn layout_error(directory: &Path, reason: impl Into<String>) -> PipelineError {
    PipelineError::Layout { directory: directory.to_path_buf(), reason: reason.into() }
}

/// 按文件名排序列出目录项
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .at(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .at(dir)?;
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// BUSCO v4/v5: `<species>/run_<lineage>/{full_table.tsv, busco_sequences/single_copy_busco_sequences}`
fn locate_v5(species_dir: &Path) -> Result<RunPaths> {
    let runs: Vec<PathBuf> = sorted_entries(species_dir)?
        .into_iter()
        .filter(|p| p.is_dir() && file_name(p).starts_with(RUN_PREFIX))
        .collect();
    let run = match runs.as_slice() {
        [one] => one,
        [] => return Err(layout_error(species_dir, "no run_* directory found")),
        many => {
            let names: Vec<String> = many.iter().map(|p| file_name(p)).collect();
            return Err(layout_error(
                species_dir,
                format!("expected one run_* directory, found {}", names.join(", ")),
            ));
        }
    };
    Ok(RunPaths {
        full_table: run.join("full_table.tsv"),
        sequences: run.join("busco_sequences").join("single_copy_busco_sequences"),
    })
}

/// BUSCO v3: `run_<species>/{full_table_<species>.tsv, single_copy_busco_sequences}`
fn locate_v3(species_dir: &Path) -> Result<RunPaths> {
    let full_table = sorted_entries(species_dir)?
        .into_iter()
        .find(|p| {
            let n = file_name(p);
            p.is_file() && n.starts_with("full_table") && n.ends_with(".tsv")
        })
        .ok_or_else(|| layout_error(species_dir, "no full_table*.tsv found"))?;
    Ok(RunPaths {
        full_table,
        sequences: species_dir.join("single_copy_busco_sequences"),
    })
}

// 会破坏 FASTA 记录名、PHYLIP 或 Newick 的字符
const RESERVED_NAME_CHARS: &[char] = &[',', '(', ')', ':', ';', '[', ']', '\'', '"'];

/// 物种名会原样写进 FASTA/PHYLIP/Newick，不允许空白与保留字符。
fn species_name(dir: &Path, layout: BuscoLayout) -> Result<String> {
    let name = file_name(dir);
    let name = match layout {
        BuscoLayout::V3 => name.strip_prefix(RUN_PREFIX).unwrap_or(&name).to_string(),
        BuscoLayout::V5 => name,
    };
    if name.is_empty() {
        return Err(layout_error(dir, "empty species name"));
    }
    if let Some(c) = name
        .chars()
        .find(|&c| c.is_whitespace() || c.is_control() || c == '>' || RESERVED_NAME_CHARS.contains(&c))
    {
        return Err(layout_error(
            dir,
            format!("species name '{}' contains {:?}; rename the directory", name, c),
        ));
    }
    Ok(name)
}

/// 读取单个物种目录。
pub fn scan_species(dir: &Path, layout: BuscoLayout, seq_type: SequenceType) -> Result<SpeciesRun> {
    let name = species_name(dir, layout)?;
    let paths = match layout {
        BuscoLayout::V3 => locate_v3(dir)?,
        BuscoLayout::V5 => locate_v5(dir)?,
    };
    if !paths.full_table.is_file() {
        return Err(layout_error(dir, format!("missing {}", paths.full_table.display())));
    }
    if !paths.sequences.is_dir() {
        return Err(layout_error(dir, format!("missing {}", paths.sequences.display())));
    }

    let table = FullTable::from_file(&paths.full_table)?;
    let mut markers = BTreeMap::new();
    for id in table.single_copy() {
        let seq = paths.sequences.join(format!("{}.{}", id, seq_type.extension()));
        if !seq.is_file() {
            return Err(layout_error(
                dir,
                format!("BUSCO {} is Complete but {} does not exist", id, seq.display()),
            ));
        }
        markers.insert(id.to_string(), seq);
    }

    Ok(SpeciesRun {
        name,
        directory: dir.to_path_buf(),
        markers,
        tally: table.tally(),
    })
}

/// 扫描输入目录下的全部物种，按物种名排序返回。
pub fn scan_input(input: &Path, layout: BuscoLayout, seq_type: SequenceType) -> Result<Vec<SpeciesRun>> {
    let mut species: Vec<SpeciesRun> = Vec::new();
    for entry in sorted_entries(input)? {
        if !entry.is_dir() {
            debug!("skipping non-directory {}", entry.display());
            continue;
        }
        let run = scan_species(&entry, layout, seq_type)?;
        info!(
            "{}: {} complete single-copy, {} duplicated, {} fragmented, {} missing",
            run.name, run.tally.complete, run.tally.duplicated, run.tally.fragmented, run.tally.missing
        );
        species.push(run);
    }

    if species.is_empty() {
        return Err(PipelineError::NoSpecies(input.to_path_buf()));
    }
    species.sort_by(|a, b| a.name.cmp(&b.name));
    if let Some(w) = species.windows(2).find(|w| w[0].name == w[1].name) {
        return Err(layout_error(
            &w[1].directory,
            format!("species name '{}' is also used by {}", w[1].name, w[0].directory.display()),
        ));
    }
    Ok(species)
}
