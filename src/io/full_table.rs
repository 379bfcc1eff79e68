//! BUSCO `full_table.tsv` 解析。
//!
//! 以 `#` 开头的行为注释；其余行以 tab 分隔，第 1 列是 BUSCO ID，第 2 列是状态。
//! Duplicated 的 BUSCO 会占多行。

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use crate::error::{IoContext, PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuscoStatus {
    Complete,
    Duplicated,
    Fragmented,
    Missing,
}

impl BuscoStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Complete" => Some(BuscoStatus::Complete),
            "Duplicated" => Some(BuscoStatus::Duplicated),
            "Fragmented" => Some(BuscoStatus::Fragmented),
            "Missing" => Some(BuscoStatus::Missing),
            _ => None,
        }
    }
}

/// 各状态下不同 BUSCO ID 的数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuscoTally {
    pub complete: usize,
    pub duplicated: usize,
    pub fragmented: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FullTable {
    status: BTreeMap<String, BuscoStatus>,
}

impl FullTable {
    pub fn parse<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut status: BTreeMap<String, BuscoStatus> = BTreeMap::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line.at(path)?;
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut cols = line.split('\t');
            let id = cols.next().unwrap_or("").trim();
            let raw = cols.next().map(str::trim);
            let err = |reason: String| PipelineError::FullTable {
                path: path.to_path_buf(),
                line: i + 1,
                reason,
            };
            let raw = raw.ok_or_else(|| err("expected at least two tab-separated columns".into()))?;
            if id.is_empty() {
                return Err(err("empty BUSCO id".into()));
            }
            let st = BuscoStatus::parse(raw).ok_or_else(|| err(format!("unknown BUSCO status '{}'", raw)))?;

            // 同一 ID 多行时取“最差”的状态，保证 Complete 只代表单拷贝
            status
                .entry(id.to_string())
                .and_modify(|prev| *prev = (*prev).max(st))
                .or_insert(st);
        }
        Ok(Self { status })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let fh = File::open(path).at(path)?;
        Self::parse(BufReader::new(fh), path)
    }

    /// 单拷贝完整（Complete）的 BUSCO ID，升序
    pub fn single_copy(&self) -> BTreeSet<&str> {
        self.status
            .iter()
            .filter(|(_, s)| **s == BuscoStatus::Complete)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn tally(&self) -> BuscoTally {
        let mut t = BuscoTally::default();
        for s in self.status.values() {
            match s {
                BuscoStatus::Complete => t.complete += 1,
                BuscoStatus::Duplicated => t.duplicated += 1,
                BuscoStatus::Fragmented => t.fragmented += 1,
                BuscoStatus::Missing => t.missing += 1,
            }
        }
        t
    }
}
