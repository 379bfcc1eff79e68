use std::path::{Path, PathBuf};

use crate::config::{SequenceType, TreeProgram};

use super::ToolCommand;

/// 建树命令及其输出的 Newick 文件位置
#[derive(Debug, Clone)]
pub struct TreeJob {
    pub command: ToolCommand,
    pub treefile: PathBuf,
}

/// 单基因树或超矩阵树。
///
/// fasttree 把树写到 stdout（核酸时加 `-nt -gtr`）；
/// IQ-TREE 以 `prefix` 为前缀输出，树在 `<prefix>.treefile`。
/// `partitions` 仅用于超矩阵。
pub fn command(
    program: TreeProgram,
    path: &Path,
    seq_type: SequenceType,
    alignment: &Path,
    prefix: &Path,
    threads: usize,
    partitions: Option<&Path>,
    log: &Path,
) -> TreeJob {
    let treefile = PathBuf::from(format!("{}.treefile", prefix.display()));
    let mut cmd = ToolCommand::new(program.to_string(), path, log.to_path_buf());
    match program {
        TreeProgram::Fasttree => {
            if seq_type == SequenceType::Nucleotide {
                cmd = cmd.arg("-nt").arg("-gtr");
            }
            cmd = cmd.arg(alignment).stdout_to(treefile.clone());
        }
        TreeProgram::Iqtree => {
            cmd = cmd.arg("-s").arg(alignment);
            if let Some(p) = partitions {
                cmd = cmd.arg("-spp").arg(p);
            }
            cmd = cmd
                .arg("-m")
                .arg("MFP")
                .arg("-nt")
                .arg(threads.to_string())
                .arg("-pre")
                .arg(prefix)
                .arg("-quiet");
        }
    }
    TreeJob { command: cmd, treefile }
}
