use std::path::Path;

use crate::config::TrimalStrategy;

use super::ToolCommand;

/// `trimal -in <aln> -out <trimmed> -<strategy>`
pub fn command(program: &Path, strategy: TrimalStrategy, input: &Path, output: &Path, log: &Path) -> ToolCommand {
    ToolCommand::new("trimal", program, log.to_path_buf())
        .arg("-in")
        .arg(input)
        .arg("-out")
        .arg(output)
        .arg(strategy.flag())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_becomes_flag() {
        let cmd = command(
            Path::new("trimal"),
            TrimalStrategy::Gappyout,
            Path::new("x.aln"),
            Path::new("x.trimmed.aln"),
            Path::new("trim.log"),
        );
        assert_eq!(cmd.command_line(), "trimal -in x.aln -out x.trimmed.aln -gappyout");
    }
}
