//! Rendered diagram artifact.

use rw_theme::ThemeKey;

/// Engine output for one render request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// Sequence number of the request this answers.
    pub sequence: u64,
    /// Theme the request was issued with.
    pub theme: ThemeKey,
    /// Markup produced by the engine (usually SVG).
    pub markup: String,
}

impl RenderedArtifact {
    /// True when the engine produced no markup.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markup.trim().is_empty()
    }
}
