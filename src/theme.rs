use std::process::{Command, Stdio};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Presentation theme handed to the browser renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Theme name understood by the diff renderer in the client bundle.
    pub fn renderer_name(self) -> &'static str {
        match self {
            Theme::Dark => "pierre-dark",
            Theme::Light => "pierre-light",
        }
    }
}

/// Resolves the ambient theme of the host.
///
/// Implementations never fail: a query that cannot be answered maps to a
/// fixed theme instead of an error, so theme detection can't abort a session.
pub trait ThemeProvider {
    fn detect(&self) -> Theme;
}

/// Always answers with the same theme. Used on hosts without an appearance
/// preference and for explicit overrides.
#[derive(Debug, Clone, Copy)]
pub struct FixedTheme(pub Theme);

impl ThemeProvider for FixedTheme {
    fn detect(&self) -> Theme {
        self.0
    }
}

/// Queries the system appearance preference (macOS `AppleInterfaceStyle`).
///
/// The query prints `Dark` when dark mode is on; it exits non-zero when the
/// key is unset, which is how light mode reports itself. Any failure,
/// including a missing query tool, resolves to [`Theme::Light`].
#[derive(Debug, Clone)]
pub struct SystemAppearance {
    program: String,
    args: Vec<String>,
}

impl Default for SystemAppearance {
    fn default() -> Self {
        Self {
            program: "defaults".to_string(),
            args: ["read", "-g", "AppleInterfaceStyle"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl SystemAppearance {
    /// Use a different query command. Its trimmed stdout is compared against `Dark`.
    pub fn with_query(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl ThemeProvider for SystemAppearance {
    fn detect(&self) -> Theme {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(out) if out.status.success() => {
                if String::from_utf8_lossy(&out.stdout).trim() == "Dark" {
                    Theme::Dark
                } else {
                    Theme::Light
                }
            }
            Ok(out) => {
                tracing::debug!(status = ?out.status, "appearance query failed, using light theme");
                Theme::Light
            }
            Err(e) => {
                tracing::debug!(error = %e, program = %self.program, "appearance query unavailable, using light theme");
                Theme::Light
            }
        }
    }
}

/// Whether this host exposes a system appearance preference we know how to query.
pub fn host_has_appearance_preference() -> bool {
    cfg!(target_os = "macos")
}

/// Pick the provider for this host.
pub fn theme_provider() -> Box<dyn ThemeProvider> {
    if host_has_appearance_preference() {
        Box::new(SystemAppearance::default())
    } else {
        Box::new(FixedTheme(Theme::Dark))
    }
}

/// Resolve the session theme. An explicit override wins over the host probe.
pub fn resolve_theme(override_theme: Option<Theme>) -> Theme {
    let provider: Box<dyn ThemeProvider> = match override_theme {
        Some(theme) => Box::new(FixedTheme(theme)),
        None => theme_provider(),
    };
    let theme = provider.detect();
    tracing::debug!(theme = theme.label(), overridden = override_theme.is_some(), "resolved theme");
    theme
}

/// [`resolve_theme`] on the blocking pool, since the host probe spawns a
/// process and waits for it.
pub async fn resolve_theme_blocking(override_theme: Option<Theme>) -> Theme {
    match tokio::task::spawn_blocking(move || resolve_theme(override_theme)).await {
        Ok(theme) => theme,
        Err(e) => {
            tracing::warn!(error = %e, "theme probe panicked, using dark theme");
            Theme::Dark
        }
    }
}
