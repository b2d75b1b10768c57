use std::collections::BTreeMap;

use serde::Serialize;

use crate::theme::Theme;

/// How every file diff in the session is laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Unified,
    Split,
}

impl Layout {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "unified" => Some(Layout::Unified),
            "split" => Some(Layout::Split),
            _ => None,
        }
    }
}

/// Initial presentation state the browser mounts with.
///
/// `layout` and `background_disabled` apply to every file. `collapsed` is
/// keyed by the file's position in the parsed patch; an absent key means
/// expanded. The browser owns all later changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub layout: Layout,
    pub background_disabled: bool,
    pub collapsed: BTreeMap<usize, bool>,
}

/// Renderer options for the session. The browser applies its current
/// layout and background toggles on top of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub theme: &'static str,
    pub diff_style: Layout,
    pub disable_background: bool,
    pub disable_file_header: bool,
    pub diff_indicators: &'static str,
    pub line_diff_type: &'static str,
}

impl ViewState {
    pub fn new(layout: Layout, background_disabled: bool) -> Self {
        Self {
            layout,
            background_disabled,
            collapsed: BTreeMap::new(),
        }
    }

    pub fn render_options(&self, theme: Theme) -> RenderOptions {
        RenderOptions {
            theme: theme.renderer_name(),
            diff_style: self.layout,
            disable_background: self.background_disabled,
            // the page draws its own header row with the collapse toggle
            disable_file_header: true,
            diff_indicators: "bars",
            line_diff_type: "word",
        }
    }
}
