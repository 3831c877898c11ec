//! src/cli.rs
//! ============================================================================
//! # CLI: Invocation Surface
//!
//! Default invocation starts the interactive explorer; `report` produces a
//! one-shot ranked listing without touching the terminal state.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dirscope", version, about = "Interactive filesystem-size explorer")]
pub struct Cli {
    /// Directory to explore (defaults to the current directory)
    pub target: Option<PathBuf>,

    /// Mirror log events to stderr (one-shot modes only)
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a one-shot report of the largest child directories
    Report(ReportArgs),
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Directory to report on (defaults to the current directory)
    pub target: Option<PathBuf>,

    /// Number of results to show
    #[arg(long, short = 't', default_value_t = 30)]
    pub top: usize,

    /// Drop results smaller than this many KiB
    #[arg(long, value_name = "KIB", default_value_t = 0)]
    pub min_size: u64,

    /// Exclude paths containing this substring (repeatable)
    #[arg(long, short = 'x', value_name = "SUBSTR")]
    pub exclude: Vec<String>,

    /// Mirror log events to stderr
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_is_interactive() {
        let cli: Cli = Cli::parse_from(["dirscope"]);
        assert!(cli.command.is_none());
        assert!(cli.target.is_none());
    }

    #[test]
    fn report_flags_parse() {
        let cli: Cli = Cli::parse_from([
            "dirscope",
            "report",
            "/var/log",
            "--top",
            "10",
            "--min-size",
            "512",
            "-x",
            "node_modules",
            "-x",
            ".git",
        ]);
        let Some(Command::Report(args)) = cli.command else {
            panic!("expected report subcommand");
        };
        assert_eq!(args.target.as_deref(), Some(std::path::Path::new("/var/log")));
        assert_eq!(args.top, 10);
        assert_eq!(args.min_size, 512);
        assert_eq!(args.exclude, vec!["node_modules", ".git"]);
    }
}
