//! External view: open a rendered diagram outside the host document.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use rw_theme::ThemeKey;

use crate::artifact::RenderedArtifact;
use crate::consts::{GLYPH_FILL_ON_DARK, GLYPH_FILL_ON_LIGHT, OPENER_CLASS};

/// Self-contained resource the host can open in a new top-level view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewResource {
    /// Media type of the embedded markup.
    pub media_type: &'static str,
    /// `data:` URL carrying the markup.
    pub url: String,
}

impl ViewResource {
    /// Build a `data:` URL resource from engine markup.
    ///
    /// SVG markup is typed as `image/svg+xml`; anything else as `text/html`.
    #[must_use]
    pub fn from_markup(markup: &str) -> Self {
        let trimmed = markup.trim_start();
        let media_type = if trimmed.starts_with("<svg") || trimmed.starts_with("<?xml") {
            "image/svg+xml"
        } else {
            "text/html"
        };
        let encoded = BASE64_STANDARD.encode(markup.as_bytes());
        Self {
            media_type,
            url: format!("data:{media_type};base64,{encoded}"),
        }
    }
}

/// Error reported by a host when it cannot open a view.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// The host refused or failed to open the view.
    #[error("cannot open external view: {0}")]
    Refused(String),
}

/// Host capability to open a resource in a new top-level view.
pub trait ViewOpener {
    /// Open `resource`.
    fn open_view(&self, resource: &ViewResource) -> Result<(), ViewerError>;
}

impl<T: ViewOpener + ?Sized> ViewOpener for &T {
    fn open_view(&self, resource: &ViewResource) -> Result<(), ViewerError> {
        (**self).open_view(resource)
    }
}

/// Opens rendered artifacts through a host [`ViewOpener`].
#[derive(Debug)]
pub struct ExternalViewer<O> {
    opener: O,
}

impl<O: ViewOpener> ExternalViewer<O> {
    pub fn new(opener: O) -> Self {
        Self { opener }
    }

    /// Open `artifact` in a new view.
    ///
    /// Returns `Ok(false)` without touching the host when there is nothing
    /// to show yet.
    ///
    /// # Errors
    ///
    /// Propagates the host's [`ViewerError`].
    pub fn open(&self, artifact: Option<&RenderedArtifact>) -> Result<bool, ViewerError> {
        let Some(artifact) = artifact.filter(|a| !a.is_empty()) else {
            return Ok(false);
        };

        let resource = ViewResource::from_markup(&artifact.markup);
        self.opener.open_view(&resource)?;
        tracing::debug!(
            sequence = artifact.sequence,
            media_type = resource.media_type,
            "Opened diagram in external view"
        );
        Ok(true)
    }
}

/// Glyph fill that stays visible on the current diagram background.
#[must_use]
pub fn glyph_fill(theme: ThemeKey) -> &'static str {
    match theme {
        ThemeKey::Dark => GLYPH_FILL_ON_DARK,
        ThemeKey::Light => GLYPH_FILL_ON_LIGHT,
    }
}

/// Markup for the "open in new window" button.
///
/// The button is disabled until an artifact exists.
#[must_use]
pub fn affordance(theme: ThemeKey, enabled: bool) -> String {
    let fill = glyph_fill(theme);
    let disabled = if enabled { "" } else { " disabled" };
    format!(
        r#"<button type="button" class="{OPENER_CLASS}" title="Open in new window" aria-label="Open diagram in new window"{disabled}><svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" width="16" height="16" aria-hidden="true"><path fill="{fill}" d="M14 3h7v7h-2V6.41l-9.29 9.3-1.42-1.42 9.3-9.29H14V3zM5 5h6v2H5v12h12v-6h2v6a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2V7a2 2 0 0 1 2-2z"/></svg></button>"#
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mock::RecordingOpener;

    fn artifact(markup: &str) -> RenderedArtifact {
        RenderedArtifact {
            sequence: 1,
            theme: ThemeKey::Light,
            markup: markup.to_owned(),
        }
    }

    #[test]
    fn test_open_without_artifact_is_noop() {
        let viewer = ExternalViewer::new(RecordingOpener::new());
        assert!(!viewer.open(None).unwrap());
        assert!(viewer.opener.opened().is_empty());
    }

    #[test]
    fn test_open_empty_artifact_is_noop() {
        let viewer = ExternalViewer::new(RecordingOpener::new());
        assert!(!viewer.open(Some(&artifact("  "))).unwrap());
        assert!(viewer.opener.opened().is_empty());
    }

    #[test]
    fn test_open_svg_builds_data_url() {
        let viewer = ExternalViewer::new(RecordingOpener::new());
        assert!(viewer.open(Some(&artifact("<svg></svg>"))).unwrap());

        let opened = viewer.opener.opened();
        assert_eq!(
            opened,
            vec![ViewResource {
                media_type: "image/svg+xml",
                url: "data:image/svg+xml;base64,PHN2Zz48L3N2Zz4=".to_owned(),
            }]
        );
    }

    #[test]
    fn test_non_svg_markup_is_html() {
        let resource = ViewResource::from_markup("<div>diagram</div>");
        assert_eq!(resource.media_type, "text/html");
        assert!(resource.url.starts_with("data:text/html;base64,"));
    }

    #[test]
    fn test_opener_error_propagates() {
        struct Refusing;
        impl ViewOpener for Refusing {
            fn open_view(&self, _: &ViewResource) -> Result<(), ViewerError> {
                Err(ViewerError::Refused("popup blocked".to_owned()))
            }
        }

        let viewer = ExternalViewer::new(Refusing);
        let err = viewer.open(Some(&artifact("<svg/>"))).unwrap_err();
        assert!(err.to_string().contains("popup blocked"));
    }

    #[test]
    fn test_glyph_contrasts_with_theme() {
        assert_eq!(glyph_fill(ThemeKey::Dark), "#ffffff");
        assert_eq!(glyph_fill(ThemeKey::Light), "#1c1e21");
    }

    #[test]
    fn test_affordance_disabled_until_enabled() {
        let disabled = affordance(ThemeKey::Light, false);
        assert!(disabled.contains(r#"class="mermaid-opener""#));
        assert!(disabled.contains(" disabled>"));
        assert!(disabled.contains(r##"fill="#1c1e21""##));

        let enabled = affordance(ThemeKey::Dark, true);
        assert!(!enabled.contains("disabled"));
        assert!(enabled.contains(r##"fill="#ffffff""##));
    }
}
