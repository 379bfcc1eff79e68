//! # busco-phylogenomics
//!
//! 基于多个物种各自独立运行的 BUSCO 结果构建物种系统发育树。
//!
//! 本 crate 只负责“胶水”部分，比对、修剪、建树均调用外部程序：
//!
//! - **结果扫描**：读取每个物种的 BUSCO 输出目录（v3 或 v4/v5 布局）
//! - **BUSCO 筛选**：按 `--percent_single_copy` 阈值选出在足够多物种中为单拷贝完整的 BUSCO
//! - **序列重组**：每个入选 BUSCO 生成一个多物种 FASTA
//! - **外部程序调度**：muscle/mafft → trimal → fasttree/iqtree，按 BUSCO 并行
//! - **超矩阵**：拼接修剪后的比对，缺失物种以缺失字符补齐，并输出分区与占有率
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use busco_phylogenomics::busco::{scan_input, Occupancy};
//! use busco_phylogenomics::config::{BuscoLayout, SequenceType};
//! use std::path::Path;
//!
//! let species = scan_input(Path::new("busco_runs"), BuscoLayout::V5, SequenceType::Protein)?;
//! let occupancy = Occupancy::from_species(&species);
//! let selected = occupancy.select(90.0);
//! println!("{} BUSCOs retained", selected.len());
//! # Ok::<(), busco_phylogenomics::error::PipelineError>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`config`] — 运行参数
//! - [`io`] — FASTA 与 `full_table.tsv` 解析
//! - [`busco`] — 扫描、筛选、重组
//! - [`tools`] — 外部程序命令构建与执行
//! - [`supermatrix`] — 超矩阵拼接与输出
//! - [`pipeline`] — 阶段调度与线程池
//! - [`util`] — 日志

pub mod busco;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod supermatrix;
pub mod tools;
pub mod util;
