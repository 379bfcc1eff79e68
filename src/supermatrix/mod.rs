//! 超矩阵拼接。
//!
//! 每个 BUSCO 的修剪后比对按固定顺序逐列拼接；某物种缺少该 BUSCO 时，
//! 用缺失字符补足该 BUSCO 的比对宽度，保证每一行长度一致。

pub mod write;

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::io::fasta::{self, FastaRecord};

/// 修剪后的单个 BUSCO 比对
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimmedAlignment {
    pub marker: String,
    pub width: usize,
    /// 物种名 → 比对行
    pub rows: BTreeMap<String, Vec<u8>>,
}

impl TrimmedAlignment {
    /// 校验所有行等长、物种不重复。
    pub fn from_records(marker: &str, records: Vec<FastaRecord>, path: &Path) -> Result<Self> {
        let malformed = |reason: String| PipelineError::Alignment { path: path.to_path_buf(), reason };
        let mut width = None;
        let mut rows = BTreeMap::new();
        for rec in records {
            match width {
                None => width = Some(rec.seq.len()),
                Some(w) if w != rec.seq.len() => {
                    return Err(malformed(format!(
                        "row '{}' has {} columns, expected {}",
                        rec.id,
                        rec.seq.len(),
                        w
                    )));
                }
                Some(_) => {}
            }
            if rows.contains_key(&rec.id) {
                return Err(malformed(format!("species '{}' appears twice", rec.id)));
            }
            rows.insert(rec.id, rec.seq);
        }
        let width = width.ok_or_else(|| malformed("no sequences".into()))?;
        Ok(Self { marker: marker.to_string(), width, rows })
    }

    pub fn from_file(marker: &str, path: &Path) -> Result<Self> {
        Self::from_records(marker, fasta::read_fasta_file(path)?, path)
    }
}

/// 超矩阵中一个 BUSCO 所占的列区间（1-based，闭区间）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub marker: String,
    pub start: usize,
    pub end: usize,
}

impl Partition {
    pub fn width(&self) -> usize {
        self.end + 1 - self.start
    }
}

#[derive(Debug, Clone)]
pub struct Supermatrix {
    pub species: Vec<String>,
    pub rows: Vec<Vec<u8>>,
    pub partitions: Vec<Partition>,
    /// occupancy[m][s]：物种 s 是否拥有第 m 个分区的序列
    pub occupancy: Vec<Vec<bool>>,
}

impl Supermatrix {
    /// 按 `alignments` 的顺序拼接。宽度为 0 的比对不产生分区。
    pub fn build(species: &[String], alignments: &[TrimmedAlignment], missing: u8) -> Result<Self> {
        let index: BTreeMap<&str, usize> =
            species.iter().enumerate().map(|(i, s)| (s.as_str(), i)).collect();
        let total: usize = alignments.iter().map(|a| a.width).sum();
        let mut rows: Vec<Vec<u8>> = vec![Vec::with_capacity(total); species.len()];
        let mut partitions = Vec::with_capacity(alignments.len());
        let mut occupancy = Vec::with_capacity(alignments.len());

        let mut col = 0usize;
        for aln in alignments.iter().filter(|a| a.width > 0) {
            if let Some(unknown) = aln.rows.keys().find(|s| !index.contains_key(s.as_str())) {
                return Err(PipelineError::Alignment {
                    path: aln.marker.clone().into(),
                    reason: format!("unknown species '{}'", unknown),
                });
            }
            let mut present = vec![false; species.len()];
            for (i, sp) in species.iter().enumerate() {
                match aln.rows.get(sp) {
                    Some(seq) => {
                        rows[i].extend_from_slice(seq);
                        present[i] = true;
                    }
                    None => rows[i].resize(col + aln.width, missing),
                }
            }
            partitions.push(Partition { marker: aln.marker.clone(), start: col + 1, end: col + aln.width });
            occupancy.push(present);
            col += aln.width;
        }

        Ok(Self { species: species.to_vec(), rows, partitions, occupancy })
    }

    pub fn width(&self) -> usize {
        self.partitions.last().map_or(0, |p| p.end)
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aln(marker: &str, rows: &[(&str, &str)]) -> TrimmedAlignment {
        let recs = rows.iter().map(|(id, s)| FastaRecord::new(*id, s.as_bytes())).collect();
        TrimmedAlignment::from_records(marker, recs, Path::new(marker)).unwrap()
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pads_missing_species_to_marker_width() {
        let species = names(&["a", "b", "c"]);
        let alns = vec![
            aln("M1", &[("a", "MK-V"), ("b", "MKIV")]),
            aln("M2", &[("b", "AA"), ("c", "A-")]),
        ];
        let sm = Supermatrix::build(&species, &alns, b'?').unwrap();

        assert_eq!(sm.rows[0], b"MK-V??");
        assert_eq!(sm.rows[1], b"MKIVAA");
        assert_eq!(sm.rows[2], b"????A-");
        assert_eq!(sm.width(), 6);
        assert_eq!(sm.partitions[1], Partition { marker: "M2".into(), start: 5, end: 6 });
        assert_eq!(sm.occupancy[1], vec![false, true, true]);
    }

    #[test]
    fn every_row_has_total_width() {
        let species = names(&["a", "b", "c", "d"]);
        let alns = vec![
            aln("M1", &[("a", "AAAAA")]),
            aln("M2", &[("b", "CC"), ("d", "GG")]),
            aln("M3", &[("a", "T"), ("b", "T"), ("c", "T"), ("d", "T")]),
        ];
        let sm = Supermatrix::build(&species, &alns, b'-').unwrap();
        assert_eq!(sm.rows.len(), sm.n_species());
        let expected: usize = sm.partitions.iter().map(Partition::width).sum();
        assert_eq!(expected, 8);
        assert!(sm.rows.iter().all(|r| r.len() == expected));
    }

    #[test]
    fn zero_width_alignment_is_skipped() {
        let species = names(&["a"]);
        let alns = vec![aln("M1", &[("a", "")]), aln("M2", &[("a", "MM")])];
        let sm = Supermatrix::build(&species, &alns, b'?').unwrap();
        assert_eq!(sm.partitions.len(), 1);
        assert_eq!(sm.partitions[0].start, 1);
    }

    #[test]
    fn unequal_rows_are_malformed() {
        let recs = vec![FastaRecord::new("a", "MKV"), FastaRecord::new("b", "MK")];
        assert!(TrimmedAlignment::from_records("M1", recs, Path::new("M1.aln")).is_err());
    }

    #[test]
    fn unknown_species_is_rejected() {
        let species = names(&["a"]);
        let alns = vec![aln("M1", &[("zz", "MK")])];
        assert!(Supermatrix::build(&species, &alns, b'?').is_err());
    }
}
