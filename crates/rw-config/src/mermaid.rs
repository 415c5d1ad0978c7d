//! `[mermaid]` section: per-diagram component configuration.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, require_non_empty};

/// Opaque engine options passed through to the rendering engine.
pub type EngineOptions = serde_json::Map<String, serde_json::Value>;

/// Configuration for a Mermaid diagram component.
///
/// All fields are independent and optional. A component receives this by
/// shared reference and never mutates it while rendering.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MermaidConfig {
    /// Explicit engine theme identifiers for light and dark host themes.
    pub theme: Option<ThemeOverride>,
    /// Engine-specific options forwarded verbatim (the `theme` field is
    /// always replaced by the resolved theme).
    pub engine_options: Option<EngineOptions>,
    /// Whether to show the "open in new window" affordance.
    pub show_external_view: bool,
}

impl MermaidConfig {
    /// Builder: set the theme override.
    #[must_use]
    pub fn with_theme(mut self, light: impl Into<String>, dark: impl Into<String>) -> Self {
        self.theme = Some(ThemeOverride {
            light: light.into(),
            dark: dark.into(),
        });
        self
    }

    /// Builder: set engine options.
    #[must_use]
    pub fn with_engine_options(mut self, options: EngineOptions) -> Self {
        self.engine_options = Some(options);
        self
    }

    /// Builder: toggle the external view affordance.
    #[must_use]
    pub fn with_external_view(mut self, show: bool) -> Self {
        self.show_external_view = show;
        self
    }

    /// Validate the section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if a theme identifier is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(theme) = &self.theme {
            require_non_empty(&theme.light, "mermaid.theme.light")?;
            require_non_empty(&theme.dark, "mermaid.theme.dark")?;
        }
        Ok(())
    }
}

/// Engine theme identifiers keyed by host theme.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThemeOverride {
    /// Identifier used when the host is in light mode.
    pub light: String,
    /// Identifier used when the host is in dark mode.
    pub dark: String,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_builder_sets_all_fields() {
        let mut options = EngineOptions::new();
        options.insert("fontFamily".to_owned(), json!("Inter"));

        let config = MermaidConfig::default()
            .with_theme("neutral", "dark")
            .with_engine_options(options.clone())
            .with_external_view(true);

        assert_eq!(
            config.theme,
            Some(ThemeOverride {
                light: "neutral".to_owned(),
                dark: "dark".to_owned(),
            })
        );
        assert_eq!(config.engine_options, Some(options));
        assert!(config.show_external_view);
    }

    #[test]
    fn test_validate_empty_theme_identifier() {
        let config = MermaidConfig::default().with_theme("", "dark");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mermaid.theme.light"));
    }

    #[test]
    fn test_theme_override_requires_both_keys() {
        let result: Result<MermaidConfig, _> = toml::from_str("[theme]\nlight = \"default\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: MermaidConfig = serde_json::from_value(json!({
            "theme": { "light": "default", "dark": "dark" },
            "show_external_view": true
        }))
        .unwrap();
        assert!(config.show_external_view);
        assert_eq!(config.theme.unwrap().dark, "dark");
    }
}
