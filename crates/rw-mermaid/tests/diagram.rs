//! End-to-end component behaviour against a timed engine.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use rw_config::{Config, MermaidConfig};
use rw_mermaid::{
    DiagramRenderer, EngineError, EngineRequest, MermaidDiagram, RenderEngine, RenderError,
    RenderOutcome, RenderState, ViewOpener, ViewResource, ViewerError,
};
use rw_theme::{HostDocument, THEME_ATTRIBUTE, ThemeKey, resolve};

const CHART: &str = "graph TD; A-->B;";

/// Engine that answers after a per-theme delay.
#[derive(Default)]
struct TimedEngine {
    delays: HashMap<&'static str, Duration>,
    requests: Mutex<Vec<EngineRequest>>,
}

impl TimedEngine {
    fn with_delay(mut self, theme: &'static str, delay: Duration) -> Self {
        self.delays.insert(theme, delay);
        self
    }

    fn requests(&self) -> Vec<EngineRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl RenderEngine for TimedEngine {
    fn render(
        &self,
        request: &EngineRequest,
    ) -> impl Future<Output = Result<String, EngineError>> + Send {
        self.requests.lock().unwrap().push(request.clone());
        let theme = request.theme().unwrap_or_default().to_owned();
        let delay = self.delays.get(theme.as_str()).copied().unwrap_or_default();
        let text = request.text.clone();

        async move {
            tokio::time::sleep(delay).await;
            if text.trim().is_empty() {
                return Err(EngineError::Syntax("No diagram type detected".to_owned()));
            }
            Ok(format!(r#"<svg data-engine-theme="{theme}">{text}</svg>"#))
        }
    }
}

#[derive(Default)]
struct Opened(Mutex<Vec<ViewResource>>);

impl ViewOpener for Opened {
    fn open_view(&self, resource: &ViewResource) -> Result<(), ViewerError> {
        self.0.lock().unwrap().push(resource.clone());
        Ok(())
    }
}

fn host(theme: &str) -> HostDocument {
    HostDocument::new().with_attribute(THEME_ATTRIBUTE, theme)
}

#[tokio::test]
async fn test_dark_host_default_config() {
    let host = host("dark");
    let engine = Arc::new(TimedEngine::default());
    let mut diagram = MermaidDiagram::mount(
        Some(&host),
        Arc::clone(&engine),
        CHART,
        MermaidConfig::default(),
    );
    let mut handle = diagram.handle();

    let running = tokio::spawn(async move {
        let result = diagram.run().await;
        (diagram, result)
    });
    let artifact = handle.artifact_changed().await.unwrap();
    handle.unmount();
    let (diagram, result) = running.await.unwrap();
    result.unwrap();

    assert_eq!(artifact.theme, ThemeKey::Dark);
    assert_eq!(engine.requests().len(), 1);
    assert_eq!(engine.requests()[0].theme(), Some("dark"));
    assert_eq!(
        diagram.view(),
        format!(
            r#"<div class="mermaid-wrapper" data-theme="dark"><div class="mermaid-container" data-render-sequence="1"><svg data-engine-theme="dark">{CHART}</svg></div></div>"#
        )
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_stale_render_never_displayed() {
    let host = host("light");
    let engine = Arc::new(
        TimedEngine::default()
            .with_delay("default", Duration::from_millis(300))
            .with_delay("dark", Duration::from_millis(10)),
    );
    let mut diagram = MermaidDiagram::mount(
        Some(&host),
        Arc::clone(&engine),
        CHART,
        MermaidConfig::default(),
    );
    let mut handle = diagram.handle();
    let running = tokio::spawn(async move {
        let result = diagram.run().await;
        (diagram, result)
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    host.set_attribute(THEME_ATTRIBUTE, "dark");

    let artifact = handle.artifact_changed().await.unwrap();
    assert_eq!(artifact.sequence, 2);
    assert_eq!(artifact.theme, ThemeKey::Dark);

    // Let the slow light render finish; it must be discarded.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(handle.artifact(), Some(artifact));

    handle.unmount();
    let (diagram, result) = running.await.unwrap();
    result.unwrap();
    assert_eq!(diagram.state(), Some(RenderState::Settled));
    assert_eq!(engine.requests().len(), 2);
}

#[tokio::test]
async fn test_override_with_external_view() {
    let config = Config::from_toml(
        r#"
[mermaid]
show_external_view = true

[mermaid.theme]
light = "default"
dark = "dark"
"#,
    )
    .unwrap();

    let host = host("light");
    let engine = Arc::new(TimedEngine::default());
    let mut diagram = MermaidDiagram::mount(
        Some(&host),
        Arc::clone(&engine),
        CHART,
        config.mermaid,
    );
    let mut handle = diagram.handle();
    assert!(diagram.view().contains(" disabled>"));

    let running = tokio::spawn(async move {
        let result = diagram.run().await;
        (diagram, result)
    });
    handle.artifact_changed().await.unwrap();
    handle.unmount();
    let (diagram, _) = running.await.unwrap();

    assert_eq!(engine.requests()[0].theme(), Some("default"));
    let view = diagram.view();
    assert!(view.contains(r#"class="mermaid-opener""#));
    assert!(!view.contains("disabled"));

    let opener = Opened::default();
    assert!(diagram.open_external(&opener).unwrap());
    assert_eq!(opener.0.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_engine_error_surfaces_from_run() {
    let host = host("light");
    let engine = Arc::new(TimedEngine::default());
    let mut diagram =
        MermaidDiagram::mount(Some(&host), engine, "   ", MermaidConfig::default());

    let err = diagram.run().await.unwrap_err();
    assert!(matches!(err, RenderError::Engine { sequence: 1, .. }));
    assert_eq!(diagram.state(), Some(RenderState::Failed));
    assert!(diagram.view().contains(r#"aria-busy="true""#));
}

#[tokio::test]
async fn test_renderer_reverse_completion() {
    let engine = Arc::new(TimedEngine::default());
    let config = Arc::new(MermaidConfig::default());
    let mut renderer = DiagramRenderer::new(
        engine,
        CHART,
        resolve(Some("light"), &config),
        Arc::clone(&config),
    );

    let a = renderer.mount().unwrap();
    let b = renderer.set_theme(resolve(Some("dark"), &config)).unwrap();

    // B completes first, then A.
    let b = b.run().await.unwrap();
    let a = a.run().await.unwrap();
    assert_eq!((a, b), (RenderOutcome::Discarded, RenderOutcome::Applied));

    let artifact = renderer.artifact().unwrap();
    assert_eq!(artifact.sequence, 2);
    assert_eq!(artifact.theme, ThemeKey::Dark);
}
