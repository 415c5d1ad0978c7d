//! Kroki-backed rendering engine.
//!
//! Posts Mermaid source to `{server_url}/mermaid/svg`. Engine options are
//! delivered in-band as an `%%{init: ...}%%` directive prepended to the
//! source, which is how Mermaid itself accepts per-diagram configuration.
//! HTTP calls are blocking (`ureq`) and run on tokio's blocking pool.

use std::future::Future;
use std::time::Duration;

use rw_config::{DiagramsConfig, EngineOptions};
use ureq::Agent;

use crate::consts::DEFAULT_TIMEOUT;
use crate::engine::{EngineError, EngineRequest, RenderEngine};

/// Kroki endpoint for Mermaid diagrams.
const MERMAID_ENDPOINT: &str = "mermaid";

/// Create HTTP agent with the specified timeout.
///
/// HTTP status codes are returned as responses, not errors, so the body of a
/// failed request can be surfaced to the caller.
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Prepend a Mermaid init directive carrying `options`.
///
/// Returns the text unchanged when there are no options.
#[must_use]
pub fn with_init_directive(text: &str, options: &EngineOptions) -> String {
    if options.is_empty() {
        return text.to_owned();
    }
    let init = serde_json::Value::Object(options.clone());
    format!("%%{{init: {init}}}%%\n{text}")
}

/// Rendering engine backed by a Kroki server.
#[derive(Clone)]
pub struct KrokiEngine {
    server_url: String,
    agent: Agent,
}

impl std::fmt::Debug for KrokiEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrokiEngine")
            .field("server_url", &self.server_url)
            .finish_non_exhaustive()
    }
}

impl KrokiEngine {
    /// Create an engine for `server_url` with the default timeout.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_timeout(server_url, DEFAULT_TIMEOUT)
    }

    /// Create an engine for `server_url` with a custom HTTP timeout.
    pub fn with_timeout(server_url: impl Into<String>, timeout: Duration) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_owned();
        Self {
            server_url,
            agent: create_agent(timeout),
        }
    }

    /// Build an engine from the `[diagrams]` section.
    ///
    /// Returns `None` if no Kroki URL is configured.
    #[must_use]
    pub fn from_config(config: &DiagramsConfig) -> Option<Self> {
        let url = config.kroki_url.as_deref()?;
        Some(Self::with_timeout(url, config.timeout))
    }

    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

/// Send diagram source to Kroki and return the SVG.
///
/// A `400` response means Kroki could not parse the diagram.
fn send_request(agent: &Agent, server_url: &str, source: &str) -> Result<String, EngineError> {
    let url = format!("{server_url}/{MERMAID_ENDPOINT}/svg");

    let response = agent
        .post(&url)
        .header("Content-Type", "text/plain")
        .send(source.as_bytes())
        .map_err(|e| EngineError::Http(e.to_string()))?;

    let status = response.status().as_u16();
    let mut body = response.into_body();

    if status >= 400 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| String::from("(unable to read error body)"));
        if status == 400 {
            return Err(EngineError::Syntax(error_body));
        }
        return Err(EngineError::Http(format!("HTTP {status}: {error_body}")));
    }

    body.read_to_string()
        .map_err(|e| EngineError::Io(e.to_string()))
}

impl RenderEngine for KrokiEngine {
    fn render(
        &self,
        request: &EngineRequest,
    ) -> impl Future<Output = Result<String, EngineError>> + Send {
        let agent = self.agent.clone();
        let server_url = self.server_url.clone();
        let source = with_init_directive(&request.text, &request.options);
        let id = request.id.clone();

        async move {
            tracing::debug!(id = %id, server = %server_url, "Sending diagram to Kroki");
            tokio::task::spawn_blocking(move || send_request(&agent, &server_url, &source))
                .await
                .map_err(|e| EngineError::Task(e.to_string()))?
        }
    }
}
