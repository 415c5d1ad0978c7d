//! Mermaid diagram component.
//!
//! [`MermaidDiagram`] wires a [`ThemeWatcher`] to a [`DiagramRenderer`]:
//! theme changes and chart updates become render tasks, which run
//! concurrently on a [`JoinSet`] and reconcile themselves on completion.
//! Callers interact with a running component through a [`DiagramHandle`].

use std::sync::Arc;

use rw_config::MermaidConfig;
use rw_theme::{HostDocument, ResolvedTheme, ThemeWatcher};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::artifact::RenderedArtifact;
use crate::engine::RenderEngine;
use crate::html::{render_placeholder, render_view};
use crate::renderer::{DiagramRenderer, RenderError, RenderOutcome, RenderState, RenderTask};
use crate::viewer::{ExternalViewer, ViewOpener, ViewerError};

/// Message sent from a [`DiagramHandle`] to its component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramUpdate {
    /// Replace the diagram text.
    Chart(String),
    /// Stop observing the host and end [`MermaidDiagram::run`].
    Unmount,
}

/// Cloneable handle to a mounted diagram.
#[derive(Debug, Clone)]
pub struct DiagramHandle {
    updates: mpsc::UnboundedSender<DiagramUpdate>,
    displayed: watch::Receiver<Option<RenderedArtifact>>,
}

impl DiagramHandle {
    /// Replace the diagram text.
    ///
    /// Returns `false` if the component no longer exists.
    pub fn set_chart(&self, chart: impl Into<String>) -> bool {
        self.updates.send(DiagramUpdate::Chart(chart.into())).is_ok()
    }

    /// Ask the component to unmount.
    ///
    /// Returns `false` if the component no longer exists.
    pub fn unmount(&self) -> bool {
        self.updates.send(DiagramUpdate::Unmount).is_ok()
    }

    /// Currently displayed artifact.
    #[must_use]
    pub fn artifact(&self) -> Option<RenderedArtifact> {
        self.displayed.borrow().clone()
    }

    /// Wait until a new artifact is displayed.
    ///
    /// Returns `None` once the component is gone (or never renders because
    /// it has no host document).
    pub async fn artifact_changed(&mut self) -> Option<RenderedArtifact> {
        self.displayed.changed().await.ok()?;
        self.displayed.borrow_and_update().clone()
    }
}

type TaskResult = Result<RenderOutcome, RenderError>;

/// A Mermaid diagram embedded in a host document.
pub struct MermaidDiagram<E> {
    config: Arc<MermaidConfig>,
    watcher: ThemeWatcher,
    renderer: Option<DiagramRenderer<E>>,
    queued: Vec<RenderTask<E>>,
    tasks: JoinSet<TaskResult>,
    updates_tx: mpsc::UnboundedSender<DiagramUpdate>,
    updates: mpsc::UnboundedReceiver<DiagramUpdate>,
    displayed: watch::Receiver<Option<RenderedArtifact>>,
    unmounted: bool,
}

impl<E: RenderEngine> MermaidDiagram<E> {
    /// Mount a diagram into `host`.
    ///
    /// Resolves the initial theme, subscribes to host theme changes and
    /// queues the first render; nothing is sent to the engine until
    /// [`run`](Self::run) is awaited. Without a host the component renders a
    /// placeholder and never calls the engine.
    pub fn mount(
        host: Option<&HostDocument>,
        engine: Arc<E>,
        chart: impl Into<String>,
        config: impl Into<Arc<MermaidConfig>>,
    ) -> Self {
        let config = config.into();
        let watcher = ThemeWatcher::new(host, &config);
        let (updates_tx, updates) = mpsc::unbounded_channel();

        let (renderer, queued, displayed) = if host.is_some() {
            let mut renderer =
                DiagramRenderer::new(engine, chart, watcher.current(), Arc::clone(&config));
            let queued: Vec<_> = renderer.mount().into_iter().collect();
            let displayed = renderer.subscribe();
            (Some(renderer), queued, displayed)
        } else {
            tracing::debug!("No host document, rendering placeholder");
            let (_, displayed) = watch::channel(None);
            (None, Vec::new(), displayed)
        };

        Self {
            config,
            watcher,
            renderer,
            queued,
            tasks: JoinSet::new(),
            updates_tx,
            updates,
            displayed,
            unmounted: false,
        }
    }

    /// Handle for sending updates and observing the displayed artifact.
    #[must_use]
    pub fn handle(&self) -> DiagramHandle {
        DiagramHandle {
            updates: self.updates_tx.clone(),
            displayed: self.displayed.clone(),
        }
    }

    /// Current view markup.
    #[must_use]
    pub fn view(&self) -> String {
        match &self.renderer {
            Some(renderer) => render_view(
                renderer.artifact().as_ref(),
                self.watcher.current().key,
                &self.config,
            ),
            None => render_placeholder(),
        }
    }

    /// Open the displayed artifact in a new top-level view.
    ///
    /// Returns `Ok(false)` when the affordance is disabled or there is
    /// nothing to show.
    pub fn open_external<O: ViewOpener>(&self, opener: &O) -> Result<bool, ViewerError> {
        if !self.config.show_external_view {
            return Ok(false);
        }
        let artifact = self.displayed.borrow().clone();
        ExternalViewer::new(opener).open(artifact.as_ref())
    }

    /// Renderer state, or `None` without a host document.
    #[must_use]
    pub fn state(&self) -> Option<RenderState> {
        self.renderer.as_ref().map(DiagramRenderer::state)
    }

    /// Last published host theme.
    #[must_use]
    pub fn theme(&self) -> ResolvedTheme {
        self.watcher.current()
    }

    #[must_use]
    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    /// Drive the component until it is unmounted.
    ///
    /// Theme changes and chart updates issue new render tasks; completed
    /// tasks are reconciled as they finish. Calling `run` again after an
    /// error resumes with the in-flight tasks intact.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Engine`] when the latest render fails and
    /// [`RenderError::Aborted`] when a render task panics.
    pub async fn run(&mut self) -> Result<(), RenderError> {
        for task in std::mem::take(&mut self.queued) {
            self.spawn(task);
        }

        while !self.unmounted {
            let event = tokio::select! {
                Some(theme) = self.watcher.changed() => Event::Theme(theme),
                update = self.updates.recv() => Event::Update(update),
                Some(joined) = self.tasks.join_next() => Event::Joined(joined),
            };

            match event {
                Event::Theme(theme) => {
                    if let Some(task) = self.renderer.as_mut().and_then(|r| r.set_theme(theme)) {
                        self.spawn(task);
                    }
                }
                Event::Update(Some(DiagramUpdate::Chart(chart))) => {
                    if let Some(task) = self.renderer.as_mut().and_then(|r| r.set_chart(chart)) {
                        self.spawn(task);
                    }
                }
                Event::Update(Some(DiagramUpdate::Unmount) | None) => self.unmount(),
                Event::Joined(Ok(result)) => {
                    result?;
                }
                Event::Joined(Err(e)) => return Err(RenderError::Aborted(e.to_string())),
            }
        }

        Ok(())
    }

    /// Stop observing the host and drop in-flight renders.
    pub fn unmount(&mut self) {
        if self.unmounted {
            return;
        }
        self.unmounted = true;
        self.watcher.unsubscribe();
        self.queued.clear();
        self.tasks.abort_all();
        tracing::debug!("Diagram unmounted");
    }

    fn spawn(&mut self, task: RenderTask<E>) {
        self.tasks.spawn(task.run());
    }
}

enum Event {
    Theme(ResolvedTheme),
    Update(Option<DiagramUpdate>),
    Joined(Result<TaskResult, tokio::task::JoinError>),
}
