//! Diagram render lifecycle with last-request-wins reconciliation.
//!
//! [`DiagramRenderer`] turns `(chart, theme)` changes into [`RenderTask`]s.
//! Every task carries a sequence number; when a task completes, its result is
//! applied only if no newer request has been issued in the meantime. Engines
//! cannot be aborted, so superseded renders still run to completion and are
//! dropped on arrival.
//!
//! ```text
//!            mount / change            result (seq == latest)
//!   Idle ─────────────────► Pending ─────────────────────────► Settled
//!                            ▲   │ error (seq == latest)          │
//!                            │   ▼                                │
//!                            └─ Failed ◄──── change ──────────────┘
//! ```

use std::sync::{Arc, Mutex};

use rw_config::MermaidConfig;
use rw_theme::{ResolvedTheme, ThemeKey};
use tokio::sync::watch;
use uuid::Uuid;

use crate::artifact::RenderedArtifact;
use crate::engine::{EngineError, EngineRequest, RenderEngine, merge_options};
use crate::ids::RenderKey;

/// Lifecycle state of a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderState {
    /// Not mounted yet; nothing requested.
    Idle,
    /// The latest request has not produced a result.
    Pending,
    /// The latest request produced the displayed artifact.
    Settled,
    /// The latest request failed; the previous artifact (if any) remains.
    Failed,
}

/// What happened to a completed render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The result became the displayed artifact.
    Applied,
    /// A newer request was issued before this one finished.
    Discarded,
}

/// Render failure surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The engine rejected the latest request.
    #[error("render {sequence} failed: {source}")]
    Engine {
        /// Sequence number of the failed request.
        sequence: u64,
        /// Engine error.
        #[source]
        source: EngineError,
    },
    /// A spawned render task panicked or was cancelled.
    #[error("render task aborted: {0}")]
    Aborted(String),
}

struct Reconciler {
    latest_issued: u64,
    state: RenderState,
}

/// State shared between a renderer and its in-flight tasks.
struct Shared {
    reconciler: Mutex<Reconciler>,
    displayed: watch::Sender<Option<RenderedArtifact>>,
}

impl Shared {
    fn issue(&self) -> u64 {
        let mut reconciler = self.reconciler.lock().unwrap();
        reconciler.latest_issued += 1;
        reconciler.state = RenderState::Pending;
        reconciler.latest_issued
    }

    fn complete(
        &self,
        sequence: u64,
        theme: ThemeKey,
        result: Result<String, EngineError>,
    ) -> Result<RenderOutcome, RenderError> {
        let mut reconciler = self.reconciler.lock().unwrap();

        if sequence != reconciler.latest_issued {
            tracing::debug!(
                sequence,
                latest = reconciler.latest_issued,
                failed = result.is_err(),
                "Discarding superseded render result"
            );
            return Ok(RenderOutcome::Discarded);
        }

        match result {
            Ok(markup) => {
                tracing::info!(sequence, %theme, bytes = markup.len(), "Diagram render settled");
                reconciler.state = RenderState::Settled;
                self.displayed.send_replace(Some(RenderedArtifact {
                    sequence,
                    theme,
                    markup,
                }));
                Ok(RenderOutcome::Applied)
            }
            Err(source) => {
                tracing::warn!(sequence, error = %source, "Diagram render failed");
                reconciler.state = RenderState::Failed;
                Err(RenderError::Engine { sequence, source })
            }
        }
    }
}

/// A single issued render request, ready to run.
///
/// Tasks are independent futures: they may be awaited inline or spawned, and
/// may complete in any order.
#[must_use = "a render task does nothing until it is run"]
pub struct RenderTask<E> {
    engine: Arc<E>,
    request: EngineRequest,
    sequence: u64,
    theme: ThemeKey,
    defer: bool,
    shared: Arc<Shared>,
}

impl<E> std::fmt::Debug for RenderTask<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTask")
            .field("sequence", &self.sequence)
            .field("theme", &self.theme)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl<E: RenderEngine> RenderTask<E> {
    /// Sequence number of this request.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Request that will be sent to the engine.
    #[must_use]
    pub fn request(&self) -> &EngineRequest {
        &self.request
    }

    /// Send the request and reconcile the result.
    ///
    /// Results of superseded requests, successful or not, are reported as
    /// [`RenderOutcome::Discarded`].
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Engine`] when the engine fails the latest request.
    ///
    /// # Panics
    ///
    /// Panics if the shared reconciliation lock is poisoned.
    pub async fn run(self) -> Result<RenderOutcome, RenderError> {
        if self.defer {
            // No explicit engine options: give the host one scheduling turn
            // before the first render.
            tokio::task::yield_now().await;
        }
        let result = self.engine.render(&self.request).await;
        self.shared.complete(self.sequence, self.theme, result)
    }
}

/// Render lifecycle for one diagram instance.
pub struct DiagramRenderer<E> {
    engine: Arc<E>,
    config: Arc<MermaidConfig>,
    chart: String,
    theme: ResolvedTheme,
    instance: Uuid,
    shared: Arc<Shared>,
}

impl<E: RenderEngine> DiagramRenderer<E> {
    /// Create an idle renderer. Nothing is requested until [`mount`](Self::mount).
    #[must_use]
    pub fn new(
        engine: Arc<E>,
        chart: impl Into<String>,
        theme: ResolvedTheme,
        config: Arc<MermaidConfig>,
    ) -> Self {
        let (displayed, _) = watch::channel(None);
        Self {
            engine,
            config,
            chart: chart.into(),
            theme,
            instance: Uuid::new_v4(),
            shared: Arc::new(Shared {
                reconciler: Mutex::new(Reconciler {
                    latest_issued: 0,
                    state: RenderState::Idle,
                }),
                displayed,
            }),
        }
    }

    /// Issue the initial request.
    ///
    /// Returns `None` if the renderer is already mounted.
    pub fn mount(&mut self) -> Option<RenderTask<E>> {
        if self.state() != RenderState::Idle {
            return None;
        }
        Some(self.issue())
    }

    /// Replace the diagram text.
    ///
    /// Issues a request only when mounted and the text actually changed.
    pub fn set_chart(&mut self, chart: impl Into<String>) -> Option<RenderTask<E>> {
        let chart = chart.into();
        if chart == self.chart {
            return None;
        }
        self.chart = chart;
        self.reissue()
    }

    /// Replace the resolved theme.
    ///
    /// Issues a request only when mounted and the theme actually changed.
    pub fn set_theme(&mut self, theme: ResolvedTheme) -> Option<RenderTask<E>> {
        if theme == self.theme {
            return None;
        }
        self.theme = theme;
        self.reissue()
    }

    /// # Panics
    ///
    /// Panics if the shared reconciliation lock is poisoned.
    #[must_use]
    pub fn state(&self) -> RenderState {
        self.shared.reconciler.lock().unwrap().state
    }

    /// Highest sequence number issued so far (0 before mount).
    ///
    /// # Panics
    ///
    /// Panics if the shared reconciliation lock is poisoned.
    #[must_use]
    pub fn latest_sequence(&self) -> u64 {
        self.shared.reconciler.lock().unwrap().latest_issued
    }

    /// Currently displayed artifact.
    #[must_use]
    pub fn artifact(&self) -> Option<RenderedArtifact> {
        self.shared.displayed.borrow().clone()
    }

    /// Receiver notified whenever the displayed artifact changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<RenderedArtifact>> {
        self.shared.displayed.subscribe()
    }

    #[must_use]
    pub fn chart(&self) -> &str {
        &self.chart
    }

    #[must_use]
    pub fn theme(&self) -> &ResolvedTheme {
        &self.theme
    }

    fn reissue(&mut self) -> Option<RenderTask<E>> {
        if self.state() == RenderState::Idle {
            return None;
        }
        Some(self.issue())
    }

    fn issue(&mut self) -> RenderTask<E> {
        let sequence = self.shared.issue();
        let id = RenderKey {
            instance: self.instance,
            sequence,
            chart: &self.chart,
        }
        .compute_id();
        let engine_options = self.config.engine_options.as_ref();

        tracing::debug!(
            sequence,
            id = %id,
            theme = %self.theme.key,
            engine_theme = %self.theme.engine_theme,
            "Issuing diagram render"
        );

        RenderTask {
            engine: Arc::clone(&self.engine),
            request: EngineRequest {
                id,
                text: self.chart.clone(),
                options: merge_options(engine_options, &self.theme.engine_theme),
            },
            sequence,
            theme: self.theme.key,
            defer: engine_options.is_none() && sequence == 1,
            shared: Arc::clone(&self.shared),
        }
    }
}
