use std::path::Path;

use crate::config::Aligner;

use super::ToolCommand;

/// 多序列比对命令。
///
/// - muscle (v5): `muscle -align <in> -output <out>`
/// - mafft: `mafft --auto --thread 1 <in> > <out>`
pub fn command(aligner: Aligner, program: &Path, input: &Path, output: &Path, log: &Path) -> ToolCommand {
    let cmd = ToolCommand::new(aligner.to_string(), program, log.to_path_buf());
    match aligner {
        Aligner::Muscle => cmd.arg("-align").arg(input).arg("-output").arg(output),
        Aligner::Mafft => cmd
            .arg("--auto")
            .arg("--thread")
            .arg("1")
            .arg(input)
            .stdout_to(output.to_path_buf()),
    }
}
