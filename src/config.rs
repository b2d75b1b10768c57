use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::state::Layout;
use crate::theme::Theme;

pub const DEFAULT_ALIAS: &str = "webdiff";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebdiffConfig {
    /// Forced theme; `None` asks the host.
    pub theme: Option<Theme>,
    pub layout: Layout,
    pub disable_background: bool,
    /// Stop the server this many seconds after opening the browser instead
    /// of waiting for Ctrl+C.
    pub auto_stop_secs: Option<u64>,
    pub open_browser: bool,
    /// Name of the git alias managed by `install` / `uninstall`.
    pub alias: String,
}

impl Default for WebdiffConfig {
    fn default() -> Self {
        Self {
            theme: None,
            layout: Layout::Unified,
            disable_background: false,
            auto_stop_secs: None,
            open_browser: true,
            alias: DEFAULT_ALIAS.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    layout: Option<String>,
    #[serde(default)]
    disable_background: Option<bool>,
    #[serde(default)]
    auto_stop_secs: Option<u64>,
    #[serde(default)]
    open_browser: Option<bool>,
    #[serde(default)]
    alias: Option<String>,
}

fn config_path() -> PathBuf {
    let mut path = dirs_home().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("webdiff");
    path.push("config.toml");
    path
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Load config from `~/.config/webdiff/config.toml`, falling back to defaults.
pub fn load_config() -> WebdiffConfig {
    load_config_from(&config_path())
}

/// Load config from `path`. A missing or malformed file yields defaults;
/// unrecognised values fall back field by field.
pub fn load_config_from(path: &Path) -> WebdiffConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return WebdiffConfig::default(),
    };

    let file: ConfigFile = match toml::from_str(&contents) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config");
            return WebdiffConfig::default();
        }
    };

    let defaults = WebdiffConfig::default();

    let theme = file.theme.as_deref().and_then(|name| {
        let theme = Theme::from_name(name);
        if theme.is_none() {
            tracing::warn!(theme = name, "unknown theme in config");
        }
        theme
    });

    let layout = file
        .layout
        .as_deref()
        .and_then(Layout::from_name)
        .unwrap_or(defaults.layout);

    let alias = file
        .alias
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or(defaults.alias);

    WebdiffConfig {
        theme,
        layout,
        disable_background: file.disable_background.unwrap_or(defaults.disable_background),
        auto_stop_secs: file.auto_stop_secs.filter(|&s| s > 0),
        open_browser: file.open_browser.unwrap_or(defaults.open_browser),
        alias,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.toml"));
        assert_eq!(config, WebdiffConfig::default());
    }

    #[test]
    fn test_full_config() {
        let file = write_config(
            r#"
theme = "light"
layout = "split"
disable_background = true
auto_stop_secs = 5
open_browser = false
alias = "wd"
"#,
        );
        let config = load_config_from(file.path());
        assert_eq!(
            config,
            WebdiffConfig {
                theme: Some(Theme::Light),
                layout: Layout::Split,
                disable_background: true,
                auto_stop_secs: Some(5),
                open_browser: false,
                alias: "wd".to_string(),
            }
        );
    }

    #[test]
    fn test_malformed_file_is_default() {
        let file = write_config("theme = [not toml");
        assert_eq!(load_config_from(file.path()), WebdiffConfig::default());
    }

    #[test]
    fn test_unknown_values_fall_back() {
        let file = write_config(
            r#"
theme = "sepia"
layout = "stacked"
alias = "   "
auto_stop_secs = 0
"#,
        );
        let config = load_config_from(file.path());
        assert_eq!(config.theme, None);
        assert_eq!(config.layout, Layout::Unified);
        assert_eq!(config.alias, DEFAULT_ALIAS);
        assert_eq!(config.auto_stop_secs, None);
    }
}
