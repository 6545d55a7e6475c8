use anyhow::Result;
use clap::Command;
use clap_complete::{Shell, generate};
use std::io::{self, Write};

/// Write the completion script for `shell` to stdout
pub fn execute(shell: Shell, cmd: &mut Command) -> Result<()> {
    write_completion(shell, cmd, &mut io::stdout())
}

pub fn write_completion(shell: Shell, cmd: &mut Command, out: &mut dyn Write) -> Result<()> {
    let bin_name = cmd.get_name().to_string();
    tracing::debug!("Generating {} completion for {}", shell, bin_name);
    generate(shell, cmd, bin_name, out);
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Arg;

    #[test]
    fn test_bash_completion_names_subcommands() {
        let mut cmd = Command::new("jsbloat")
            .subcommand(Command::new("unused").arg(Arg::new("har").long("har")));
        let mut out = Vec::new();

        write_completion(Shell::Bash, &mut cmd, &mut out).unwrap();

        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("jsbloat"));
        assert!(script.contains("unused"));
    }
}
