use std::process::ExitCode;

use anyhow::{Context, Result};

use crate::browser;
use crate::cli::RunArgs;
use crate::config::WebdiffConfig;
use crate::git::{capture, AliasRemoval, CaptureError, GitCli};
use crate::server::{self, DiffSession, StopPolicy};
use crate::session::{is_blank, SessionPayload};
use crate::state::ViewState;
use crate::theme::{resolve_theme_blocking, Theme};

/// Conventional exit status for a run cut short by Ctrl+C.
const INTERRUPTED: u8 = 130;

/// Settings for one `run`, with CLI flags layered over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub selectors: Vec<String>,
    pub theme: Option<Theme>,
    pub view: ViewState,
    pub stop: StopPolicy,
    pub open_browser: bool,
}

impl RunSettings {
    pub fn resolve(args: RunArgs, config: &WebdiffConfig) -> Self {
        let layout = args.layout(config.layout);
        let background_disabled = args.no_background || config.disable_background;
        Self {
            theme: args.theme.or(config.theme),
            view: ViewState::new(layout, background_disabled),
            stop: StopPolicy::from_secs(args.timeout.or(config.auto_stop_secs)),
            open_browser: config.open_browser && !args.no_open,
            selectors: args.args,
        }
    }
}

/// Report a capture failure the way the user expects and pick the exit code.
fn report_capture_error(err: &CaptureError) -> u8 {
    match err {
        CaptureError::NotARepository => eprintln!("Error: {err}"),
        // git's own diagnostic, verbatim
        CaptureError::ToolFailure { stderr, .. } => eprint!("{stderr}"),
        CaptureError::Spawn(_) => eprintln!("Error: {err}"),
    }
    err.exit_code()
}

/// Capture the diff and serve it until the stop policy fires.
pub async fn run_session(args: RunArgs, config: &WebdiffConfig) -> Result<ExitCode> {
    let settings = RunSettings::resolve(args, config);
    let git = GitCli::new();

    // One listener for the whole run, armed before capture starts, so a
    // signal between capture and serving is not lost.
    let interrupt = server::interrupted();
    tokio::pin!(interrupt);

    // Dropping the capture future kills git, so nothing outlives an interrupt.
    let captured = tokio::select! {
        captured = capture(&git, &settings.selectors) => captured,
        _ = &mut interrupt => {
            tracing::info!("interrupted while capturing diff");
            return Ok(ExitCode::from(INTERRUPTED));
        }
    };

    let patch = match captured {
        Ok(patch) => patch,
        Err(err) => return Ok(ExitCode::from(report_capture_error(&err))),
    };

    if is_blank(&patch) {
        println!("No diff to display");
        return Ok(ExitCode::SUCCESS);
    }

    let theme = tokio::select! {
        theme = resolve_theme_blocking(settings.theme) => theme,
        _ = &mut interrupt => {
            tracing::info!("interrupted before serving");
            return Ok(ExitCode::from(INTERRUPTED));
        }
    };
    let payload = SessionPayload::build(patch, theme, settings.view);

    let mut session = DiffSession::new(&payload)?;
    session.bind().await?;

    let open_browser = settings.open_browser;
    let stop = settings.stop;
    session
        .run(stop.wait(&mut interrupt), |url| {
            println!("Opening diff at {url}");
            if open_browser {
                browser::open(url);
            }
            match stop {
                StopPolicy::Signal => println!("Press Ctrl+C to exit"),
                StopPolicy::After(limit) => {
                    println!("Stopping in {}s (Ctrl+C to stop now)", limit.as_secs())
                }
            }
        })
        .await?;

    Ok(ExitCode::SUCCESS)
}

/// Point `git <alias>` at `<this executable> run`. Re-running overwrites.
pub async fn install(config: &WebdiffConfig) -> Result<ExitCode> {
    let exe = std::env::current_exe().context("Failed to locate the webdiff executable")?;
    let command = alias_command(&exe.to_string_lossy());

    GitCli::new()
        .set_global_alias(&config.alias, &command)
        .await?;
    tracing::debug!(alias = %config.alias, %command, "installed alias");
    println!("Installed: git {} -> {command}", config.alias);
    Ok(ExitCode::SUCCESS)
}

pub async fn uninstall(config: &WebdiffConfig) -> Result<ExitCode> {
    match GitCli::new().unset_global_alias(&config.alias).await? {
        AliasRemoval::Removed => println!("Removed git alias '{}'", config.alias),
        AliasRemoval::NotInstalled => println!("Alias '{}' is not installed", config.alias),
    }
    Ok(ExitCode::SUCCESS)
}

/// Shell alias body that re-enters this tool.
fn alias_command(exe: &str) -> String {
    format!("!\"{}\" run", exe.replace('\\', "\\\\").replace('"', "\\\""))
}
