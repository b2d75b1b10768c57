use anyhow::{Context, Result};
use serde::Serialize;

use crate::state::{RenderOptions, ViewState};
use crate::theme::Theme;

/// Everything one session serves at `/api/diff`.
///
/// Fields are private: once built, the payload is never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionPayload {
    patch: String,
    theme: Theme,
    view: ViewState,
    options: RenderOptions,
}

impl SessionPayload {
    pub fn build(patch: String, theme: Theme, view: ViewState) -> Self {
        let options = view.render_options(theme);
        Self {
            patch,
            theme,
            view,
            options,
        }
    }

    pub fn patch(&self) -> &str {
        &self.patch
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Serialize once; the server hands out these exact bytes on every request.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("Failed to serialize session payload")
    }
}

/// A patch that is empty or whitespace-only means there is nothing to show.
pub fn is_blank(patch: &str) -> bool {
    patch.trim().is_empty()
}
