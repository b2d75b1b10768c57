use clap::{Args, Parser, Subcommand};

use crate::state::Layout;
use crate::theme::Theme;

#[derive(Parser, Debug)]
#[command(
    name = "webdiff",
    version,
    about = "View git diffs as an interactive page in your browser"
)]
pub struct Cli {
    /// Print diagnostic logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a global git alias (`git webdiff`) that runs this tool
    Install,

    /// Remove the global git alias
    Uninstall,

    /// Capture `git diff` and show it in the browser
    Run(RunArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Force a theme instead of following the system appearance
    #[arg(long, value_enum)]
    pub theme: Option<Theme>,

    /// Start in split (side-by-side) layout
    #[arg(long)]
    pub split: bool,

    /// Start with line backgrounds disabled
    #[arg(long = "no-background")]
    pub no_background: bool,

    /// Stop the server this many seconds after opening the browser
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the URL without opening a browser
    #[arg(long = "no-open")]
    pub no_open: bool,

    /// Arguments passed through to `git diff` (revisions, --staged, -- paths)
    #[arg(
        value_name = "GIT_DIFF_ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

impl RunArgs {
    pub fn layout(&self, configured: Layout) -> Layout {
        if self.split {
            Layout::Split
        } else {
            configured
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("webdiff").chain(args.iter().copied()))
    }

    fn run_args(args: &[&str]) -> RunArgs {
        match parse(args).unwrap().command {
            Some(Command::Run(run)) => run,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments() {
        let cli = parse(&[]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_install_uninstall() {
        assert!(matches!(
            parse(&["install"]).unwrap().command,
            Some(Command::Install)
        ));
        assert!(matches!(
            parse(&["uninstall"]).unwrap().command,
            Some(Command::Uninstall)
        ));
    }

    #[test]
    fn test_unknown_subcommand_fails() {
        assert!(parse(&["frobnicate"]).is_err());
    }

    #[test]
    fn test_help_flags() {
        for flag in ["--help", "-h"] {
            let err = parse(&[flag]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
            assert_eq!(err.exit_code(), 0);
        }
    }

    #[test]
    fn test_run_forwards_selectors() {
        let run = run_args(&["run", "--staged"]);
        assert_eq!(run.args, vec!["--staged"]);

        let run = run_args(&["run", "HEAD~2..HEAD", "--stat", "--", "src"]);
        assert_eq!(run.args, vec!["HEAD~2..HEAD", "--stat", "--", "src"]);
    }

    #[test]
    fn test_run_options_before_selectors() {
        let run = run_args(&["run", "--theme", "light", "--split", "--timeout", "5", "main"]);
        assert_eq!(run.theme, Some(Theme::Light));
        assert!(run.split);
        assert_eq!(run.timeout, Some(5));
        assert_eq!(run.args, vec!["main"]);
        assert_eq!(run.layout(Layout::Unified), Layout::Split);
    }

    #[test]
    fn test_run_without_selectors() {
        let run = run_args(&["run"]);
        assert!(run.args.is_empty());
        assert!(!run.no_open);
        assert_eq!(run.layout(Layout::Unified), Layout::Unified);
    }
}
