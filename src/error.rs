use std::path::PathBuf;

use thiserror::Error;

/// 流水线各阶段可能产生的错误。
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input BUSCO directory {} not found", .0.display())]
    InputNotFound(PathBuf),

    #[error("Output directory {} already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// BUSCO 输出目录结构不符合预期（按物种报告）
    #[error("unexpected BUSCO layout in {}: {reason}", .directory.display())]
    Layout { directory: PathBuf, reason: String },

    #[error("{}:{line}: {reason}", .path.display())]
    FullTable { path: PathBuf, line: usize, reason: String },

    #[error("no species found in {}", .0.display())]
    NoSpecies(PathBuf),

    #[error("no BUSCO is complete and single-copy in at least {0}% of species")]
    NoMarkers(f64),

    #[error("all {0} BUSCOs failed; see failed_markers.tsv")]
    AllMarkersFailed(usize),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("executable '{0}' not found on PATH")]
    ToolNotFound(String),

    #[error("{tool} failed for {marker} ({status}); see {}", .log.display())]
    ToolFailed {
        tool: String,
        marker: String,
        status: String,
        log: PathBuf,
    },

    #[error("{tool} produced no output at {}", .path.display())]
    MissingOutput { tool: String, path: PathBuf },

    #[error("malformed alignment {}: {reason}", .path.display())]
    Alignment { path: PathBuf, reason: String },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// 给 `std::io::Result` 附上出错的路径。
pub trait IoContext<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| PipelineError::Io { path: path.into(), source })
    }
}
