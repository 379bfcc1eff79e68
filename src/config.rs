use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::{PipelineError, Result};

/// 比对所用的序列类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceType {
    Protein,
    Nucleotide,
}

impl SequenceType {
    /// BUSCO 单拷贝序列文件的扩展名
    pub fn extension(self) -> &'static str {
        match self {
            SequenceType::Protein => "faa",
            SequenceType::Nucleotide => "fna",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimalStrategy {
    Automated1,
    Gappyout,
    Strict,
    Strictplus,
}

impl TrimalStrategy {
    pub fn flag(self) -> &'static str {
        match self {
            TrimalStrategy::Automated1 => "-automated1",
            TrimalStrategy::Gappyout => "-gappyout",
            TrimalStrategy::Strict => "-strict",
            TrimalStrategy::Strictplus => "-strictplus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeProgram {
    Fasttree,
    Iqtree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aligner {
    Muscle,
    Mafft,
}

/// BUSCO 输出目录布局（v3 与 v4/v5 不同）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuscoLayout {
    V3,
    V5,
}

/// 需要执行哪些树构建分析
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Analysis {
    Both,
    GeneTreesOnly,
    SupermatrixOnly,
}

impl Analysis {
    pub fn from_flags(gene_trees_only: bool, supermatrix_only: bool) -> Result<Self> {
        match (gene_trees_only, supermatrix_only) {
            (false, false) => Ok(Analysis::Both),
            (true, false) => Ok(Analysis::GeneTreesOnly),
            (false, true) => Ok(Analysis::SupermatrixOnly),
            (true, true) => Err(PipelineError::InvalidConfig(
                "--gene_trees_only and --supermatrix_only are mutually exclusive".into(),
            )),
        }
    }

    pub fn gene_trees(self) -> bool {
        self != Analysis::SupermatrixOnly
    }

    pub fn supermatrix(self) -> bool {
        self != Analysis::GeneTreesOnly
    }
}

/// 一次运行的全部设置，以引用传给各阶段
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub threads: usize,
    pub analysis: Analysis,
    pub sequence_type: SequenceType,
    pub percent_single_copy: f64,
    pub trimal_strategy: TrimalStrategy,
    pub missing_character: char,
    pub gene_tree_program: TreeProgram,
    pub aligner: Aligner,
    pub layout: BuscoLayout,
}

impl PipelineConfig {
    /// 以默认值构造（阈值 100%、automated1、`?`、fasttree、muscle、BUSCO v5）
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, threads: usize) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            threads,
            analysis: Analysis::Both,
            sequence_type: SequenceType::Protein,
            percent_single_copy: 100.0,
            trimal_strategy: TrimalStrategy::Automated1,
            missing_character: '?',
            gene_tree_program: TreeProgram::Fasttree,
            aligner: Aligner::Muscle,
            layout: BuscoLayout::V5,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(PipelineError::InvalidConfig("--threads must be at least 1".into()));
        }
        if !(0.0..=100.0).contains(&self.percent_single_copy) {
            return Err(PipelineError::InvalidConfig(format!(
                "--percent_single_copy must be within 0-100, got {}",
                self.percent_single_copy
            )));
        }
        if !self.missing_character.is_ascii_graphic() || self.missing_character == '>' {
            return Err(PipelineError::InvalidConfig(format!(
                "--missing_character '{}' cannot be used inside a FASTA sequence",
                self.missing_character
            )));
        }
        Ok(())
    }
}

/// 解析 `--missing_character`：必须恰好是一个字符，否则补齐宽度无法与比对列数一致。
pub fn parse_missing_character(s: &str) -> std::result::Result<char, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("expected exactly one character, got '{}'", s)),
    }
}

impl fmt::Display for TreeProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeProgram::Fasttree => f.write_str("fasttree"),
            TreeProgram::Iqtree => f.write_str("iqtree"),
        }
    }
}

impl fmt::Display for Aligner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aligner::Muscle => f.write_str("muscle"),
            Aligner::Mafft => f.write_str("mafft"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = PipelineConfig::new("in", "out", 4);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.percent_single_copy, 100.0);
        assert_eq!(cfg.missing_character, '?');
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut cfg = PipelineConfig::new("in", "out", 4);
        cfg.percent_single_copy = 100.5;
        assert!(cfg.validate().is_err());
        cfg.percent_single_copy = -1.0;
        assert!(cfg.validate().is_err());
        cfg.percent_single_copy = 0.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_zero_threads() {
        let cfg = PipelineConfig::new("in", "out", 0);
        assert!(matches!(cfg.validate(), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn analysis_flags_conflict() {
        assert_eq!(Analysis::from_flags(false, false).unwrap(), Analysis::Both);
        assert!(!Analysis::from_flags(true, false).unwrap().supermatrix());
        assert!(!Analysis::from_flags(false, true).unwrap().gene_trees());
        assert!(Analysis::from_flags(true, true).is_err());
    }

    #[test]
    fn missing_character_is_single_char() {
        assert_eq!(parse_missing_character("-"), Ok('-'));
        assert!(parse_missing_character("").is_err());
        assert!(parse_missing_character("NN").is_err());
    }
}
