//! Theme-synchronized Mermaid diagram rendering for RW.
//!
//! A diagram is rendered by an asynchronous [`RenderEngine`] and re-rendered
//! whenever its text or the host document's light/dark theme changes. Renders
//! may complete out of order; only the result of the most recently issued
//! request is ever displayed.
//!
//! # Architecture
//!
//! - [`DiagramRenderer`]: render lifecycle and last-request-wins
//!   reconciliation
//! - [`MermaidDiagram`]: component tying a [`ThemeWatcher`](rw_theme::ThemeWatcher)
//!   to a renderer, driven by [`MermaidDiagram::run`]
//! - [`ExternalViewer`]: opens the displayed diagram in a new view
//! - [`KrokiEngine`]: production engine backed by a Kroki server
//! - [`ManualEngine`] / [`RecordingOpener`]: test doubles (behind `mock`
//!   feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rw_config::Config;
//! use rw_mermaid::{KrokiEngine, MermaidDiagram};
//! use rw_theme::{HostDocument, THEME_ATTRIBUTE};
//!
//! let config = Config::load(None)?;
//! let engine = KrokiEngine::from_config(&config.diagrams_resolved).unwrap();
//! let host = HostDocument::new().with_attribute(THEME_ATTRIBUTE, "dark");
//!
//! let mut diagram = MermaidDiagram::mount(
//!     Some(&host),
//!     Arc::new(engine),
//!     "graph TD; A-->B;",
//!     config.mermaid,
//! );
//! let handle = diagram.handle();
//! tokio::spawn(async move { diagram.run().await });
//! ```

mod artifact;
mod component;
mod consts;
mod engine;
mod html;
mod ids;
mod kroki;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod renderer;
mod viewer;

pub use artifact::RenderedArtifact;
pub use component::{DiagramHandle, DiagramUpdate, MermaidDiagram};
pub use engine::{EngineError, EngineRequest, RenderEngine, THEME_OPTION, merge_options};
pub use html::{escape_html, render_placeholder, render_view};
pub use ids::RenderKey;
pub use kroki::{KrokiEngine, create_agent, with_init_directive};
#[cfg(any(test, feature = "mock"))]
pub use mock::{ManualEngine, RecordingOpener};
pub use renderer::{DiagramRenderer, RenderError, RenderOutcome, RenderState, RenderTask};
pub use viewer::{ExternalViewer, ViewOpener, ViewResource, ViewerError, affordance, glyph_fill};
