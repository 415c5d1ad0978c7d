//! View markup for a diagram component.
//!
//! ```html
//! <div class="mermaid-wrapper" data-theme="dark">
//!   <button class="mermaid-opener" ...>...</button>   <!-- optional -->
//!   <div class="mermaid-container" data-render-sequence="3"><svg>...</svg></div>
//! </div>
//! ```
//!
//! Engine output is inserted verbatim; everything else is escaped.

use rw_config::MermaidConfig;
use rw_theme::ThemeKey;

use crate::artifact::RenderedArtifact;
use crate::consts::{CONTAINER_CLASS, PLACEHOLDER_CLASS, WRAPPER_CLASS};
use crate::viewer::affordance;

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Empty container emitted when there is no host document to render into.
#[must_use]
pub fn render_placeholder() -> String {
    format!(r#"<div class="{WRAPPER_CLASS} {PLACEHOLDER_CLASS}"></div>"#)
}

/// Render the component view.
///
/// `theme` is the current host theme; it drives the wrapper's `data-theme`
/// and the opener glyph even while a render for it is still pending.
#[must_use]
pub fn render_view(
    artifact: Option<&RenderedArtifact>,
    theme: ThemeKey,
    config: &MermaidConfig,
) -> String {
    let mut html = format!(
        r#"<div class="{WRAPPER_CLASS}" data-theme="{}">"#,
        escape_html(theme.as_str())
    );

    if config.show_external_view {
        let enabled = artifact.is_some_and(|a| !a.is_empty());
        html.push_str(&affordance(theme, enabled));
    }

    match artifact {
        Some(artifact) => {
            html.push_str(&format!(
                r#"<div class="{CONTAINER_CLASS}" data-render-sequence="{}">"#,
                artifact.sequence
            ));
            html.push_str(&artifact.markup);
            html.push_str("</div>");
        }
        None => {
            html.push_str(&format!(
                r#"<div class="{CONTAINER_CLASS}" aria-busy="true"></div>"#
            ));
        }
    }

    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn artifact(sequence: u64, markup: &str) -> RenderedArtifact {
        RenderedArtifact {
            sequence,
            theme: ThemeKey::Dark,
            markup: markup.to_owned(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_placeholder() {
        assert_eq!(
            render_placeholder(),
            r#"<div class="mermaid-wrapper mermaid-placeholder"></div>"#
        );
    }

    #[test]
    fn test_view_before_first_render() {
        let html = render_view(None, ThemeKey::Light, &MermaidConfig::default());
        assert_eq!(
            html,
            r#"<div class="mermaid-wrapper" data-theme="light"><div class="mermaid-container" aria-busy="true"></div></div>"#
        );
    }

    #[test]
    fn test_view_embeds_markup_verbatim() {
        let html = render_view(
            Some(&artifact(2, "<svg><g/></svg>")),
            ThemeKey::Dark,
            &MermaidConfig::default(),
        );
        assert_eq!(
            html,
            r#"<div class="mermaid-wrapper" data-theme="dark"><div class="mermaid-container" data-render-sequence="2"><svg><g/></svg></div></div>"#
        );
    }

    #[test]
    fn test_opener_hidden_by_default() {
        let html = render_view(
            Some(&artifact(1, "<svg/>")),
            ThemeKey::Dark,
            &MermaidConfig::default(),
        );
        assert!(!html.contains("mermaid-opener"));
    }

    #[test]
    fn test_opener_disabled_until_rendered() {
        let config = MermaidConfig::default().with_external_view(true);

        let pending = render_view(None, ThemeKey::Dark, &config);
        assert!(pending.contains("mermaid-opener"));
        assert!(pending.contains(" disabled>"));

        let ready = render_view(Some(&artifact(1, "<svg/>")), ThemeKey::Dark, &config);
        assert!(ready.contains("mermaid-opener"));
        assert!(!ready.contains("disabled"));
    }

    #[test]
    fn test_opener_glyph_follows_current_theme() {
        let config = MermaidConfig::default().with_external_view(true);
        // Artifact still shows the dark render while the host is already light.
        let html = render_view(Some(&artifact(1, "<svg/>")), ThemeKey::Light, &config);
        assert!(html.contains(r#"data-theme="light""#));
        assert!(html.contains(r##"fill="#1c1e21""##));
    }
}
