//! Rendering engine seam.
//!
//! The engine is opaque: given diagram text, a caller-chosen identifier and
//! options, it eventually produces markup or fails. Options travel with every
//! request instead of living in shared engine state, so concurrently mounted
//! diagrams with different themes cannot observe each other's settings.

use std::future::Future;

use rw_config::EngineOptions;
use serde_json::Value;

/// Key under which the resolved theme is placed in [`EngineOptions`].
pub const THEME_OPTION: &str = "theme";

/// One request to the rendering engine.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineRequest {
    /// Unique identifier for the rendered element.
    pub id: String,
    /// Diagram source text.
    pub text: String,
    /// Engine options merged with the resolved theme.
    pub options: EngineOptions,
}

impl EngineRequest {
    /// Theme identifier carried in the options.
    #[must_use]
    pub fn theme(&self) -> Option<&str> {
        self.options.get(THEME_OPTION).and_then(Value::as_str)
    }
}

/// Error returned by a rendering engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The diagram text was rejected.
    #[error("invalid diagram: {0}")]
    Syntax(String),
    /// Transport or HTTP-level failure.
    #[error("HTTP error: {0}")]
    Http(String),
    /// Failure reading the engine response.
    #[error("I/O error: {0}")]
    Io(String),
    /// The render task was dropped or panicked.
    #[error("render task failed: {0}")]
    Task(String),
}

/// Asynchronous diagram rendering capability.
///
/// Implementations must tolerate many outstanding requests; callers discard
/// results they no longer need instead of cancelling them.
pub trait RenderEngine: Send + Sync + 'static {
    /// Render `request.text` to markup.
    fn render(
        &self,
        request: &EngineRequest,
    ) -> impl Future<Output = Result<String, EngineError>> + Send;
}

/// Combine caller options with the resolved engine theme.
///
/// The resolved theme always wins over a `theme` the caller set.
#[must_use]
pub fn merge_options(options: Option<&EngineOptions>, theme: &str) -> EngineOptions {
    let mut merged = options.cloned().unwrap_or_default();
    merged.insert(THEME_OPTION.to_owned(), Value::String(theme.to_owned()));
    merged
}
