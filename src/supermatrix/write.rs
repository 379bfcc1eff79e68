use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{IoContext, Result};
use crate::io::fasta::{write_record, FastaRecord};

use super::Supermatrix;

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path).at(path)?))
}

pub fn write_fasta(sm: &Supermatrix, path: &Path) -> Result<()> {
    let mut out = create(path)?;
    for (name, row) in sm.species.iter().zip(&sm.rows) {
        let rec = FastaRecord::new(name.as_str(), row.as_slice());
        write_record(&mut out, &rec).at(path)?;
    }
    out.flush().at(path)
}

/// Relaxed PHYLIP：首行 `<物种数> <列数>`，之后每行 `名称 序列`。
pub fn write_phylip(sm: &Supermatrix, path: &Path) -> Result<()> {
    let mut out = create(path)?;
    let pad = sm.species.iter().map(String::len).max().unwrap_or(0);
    writeln!(out, "{} {}", sm.n_species(), sm.width()).at(path)?;
    for (name, row) in sm.species.iter().zip(&sm.rows) {
        write!(out, "{:<width$} ", name, width = pad).at(path)?;
        out.write_all(row).at(path)?;
        out.write_all(b"\n").at(path)?;
    }
    out.flush().at(path)
}

/// NEXUS `sets` 块，每个 BUSCO 一个 charset，可直接给 IQ-TREE `-spp` 使用。
pub fn write_partitions(sm: &Supermatrix, path: &Path) -> Result<()> {
    let mut out = create(path)?;
    writeln!(out, "#nexus").at(path)?;
    writeln!(out, "begin sets;").at(path)?;
    for p in &sm.partitions {
        writeln!(out, "    charset {} = {}-{};", p.marker, p.start, p.end).at(path)?;
    }
    writeln!(out, "end;").at(path)?;
    out.flush().at(path)
}

/// 占有率矩阵（TSV）：每个 BUSCO 一行，每个物种一列，1 表示存在。
pub fn write_occupancy(sm: &Supermatrix, path: &Path) -> Result<()> {
    let mut out = create(path)?;
    write!(out, "busco_id\twidth\tn_species").at(path)?;
    for s in &sm.species {
        write!(out, "\t{}", s).at(path)?;
    }
    writeln!(out).at(path)?;
    for (p, present) in sm.partitions.iter().zip(&sm.occupancy) {
        let n = present.iter().filter(|&&b| b).count();
        write!(out, "{}\t{}\t{}", p.marker, p.width(), n).at(path)?;
        for &b in present {
            write!(out, "\t{}", u8::from(b)).at(path)?;
        }
        writeln!(out).at(path)?;
    }
    out.flush().at(path)
}
