//! 外部程序的查找与调用（比对、修剪、建树）。
//!
//! 每次调用的 stderr（未重定向时也包括 stdout）写入单独的日志文件，
//! 失败时错误信息中给出该日志路径。

pub mod align;
pub mod trim;
pub mod tree;

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::config::{Aligner, PipelineConfig, TreeProgram};
use crate::error::{IoContext, PipelineError, Result};

/// 一次外部程序调用
#[derive(Debug, Clone)]
pub struct ToolCommand {
    pub tool: String,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// stdout 重定向目标（fasttree、mafft 把结果写到 stdout）
    pub stdout: Option<PathBuf>,
    pub log: PathBuf,
}

impl ToolCommand {
    pub fn new(tool: impl Into<String>, program: &Path, log: PathBuf) -> Self {
        Self {
            tool: tool.into(),
            program: program.to_path_buf(),
            args: Vec::new(),
            stdout: None,
            log,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn stdout_to(mut self, path: PathBuf) -> Self {
        self.stdout = Some(path);
        self
    }

    pub fn command_line(&self) -> String {
        let mut s = self.program.display().to_string();
        for a in &self.args {
            s.push(' ');
            s.push_str(&a.to_string_lossy());
        }
        if let Some(out) = &self.stdout {
            s.push_str(&format!(" > {}", out.display()));
        }
        s
    }

    /// 运行并等待结束；非零退出码转为 `ToolFailed`，`label` 用于错误信息（通常是 BUSCO ID）。
    pub fn run(&self, label: &str) -> Result<()> {
        debug!("[{}] {}", label, self.command_line());
        let log = File::create(&self.log).at(&self.log)?;
        let stderr = log.try_clone().at(&self.log)?;
        let stdout: Stdio = match &self.stdout {
            Some(p) => File::create(p).at(p)?.into(),
            None => log.into(),
        };
        let status = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .at(&self.program)?;
        if !status.success() {
            return Err(PipelineError::ToolFailed {
                tool: self.tool.clone(),
                marker: label.to_string(),
                status: status.to_string(),
                log: self.log.clone(),
            });
        }
        Ok(())
    }
}

/// 按顺序在 PATH 中查找候选名称，返回第一个存在的可执行文件。
pub fn resolve(candidates: &[&str]) -> Result<PathBuf> {
    candidates
        .iter()
        .find_map(|c| which::which(c).ok())
        .ok_or_else(|| PipelineError::ToolNotFound(candidates.join(" or ")))
}

/// 一次运行所用外部程序的绝对路径
#[derive(Debug, Clone)]
pub struct Toolbox {
    pub aligner: Aligner,
    pub aligner_path: PathBuf,
    pub trimal_path: PathBuf,
    pub tree_program: TreeProgram,
    pub tree_path: PathBuf,
}

impl Toolbox {
    /// 在写出任何结果之前确认所需程序都在 PATH 中。
    pub fn discover(cfg: &PipelineConfig) -> Result<Self> {
        let aligner_path = match cfg.aligner {
            Aligner::Muscle => resolve(&["muscle"])?,
            Aligner::Mafft => resolve(&["mafft"])?,
        };
        let trimal_path = resolve(&["trimal"])?;
        let tree_path = match cfg.gene_tree_program {
            TreeProgram::Fasttree => resolve(&["fasttree", "FastTree"])?,
            TreeProgram::Iqtree => resolve(&["iqtree2", "iqtree"])?,
        };
        Ok(Self {
            aligner: cfg.aligner,
            aligner_path,
            trimal_path,
            tree_program: cfg.gene_tree_program,
            tree_path,
        })
    }
}
