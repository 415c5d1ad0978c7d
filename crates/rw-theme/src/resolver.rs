//! Theme resolution: host attribute + configuration to engine theme.

use rw_config::MermaidConfig;

use crate::key::ThemeKey;

/// Engine theme used for [`ThemeKey::Light`] when no override is configured.
pub const DEFAULT_LIGHT_THEME: &str = "default";

/// Engine theme used for [`ThemeKey::Dark`] when no override is configured.
pub const DEFAULT_DARK_THEME: &str = "dark";

/// Effective theme for one render: the host key and the engine identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTheme {
    /// Light/dark selection derived from the host.
    pub key: ThemeKey,
    /// Theme identifier handed to the rendering engine.
    pub engine_theme: String,
}

/// Resolve the effective theme.
///
/// The host attribute decides light vs. dark; absent or unrecognized values
/// fall back to [`ThemeKey::Light`]. A configured theme override replaces the
/// built-in engine identifiers entirely for both cases.
#[must_use]
pub fn resolve(host_value: Option<&str>, config: &MermaidConfig) -> ResolvedTheme {
    let key = host_value
        .and_then(ThemeKey::from_attribute)
        .unwrap_or_default();

    ResolvedTheme {
        key,
        engine_theme: engine_theme(key, config).to_owned(),
    }
}

/// Engine theme identifier for `key` under `config`.
#[must_use]
pub fn engine_theme(key: ThemeKey, config: &MermaidConfig) -> &str {
    match (&config.theme, key) {
        (Some(theme), ThemeKey::Light) => &theme.light,
        (Some(theme), ThemeKey::Dark) => &theme.dark,
        (None, ThemeKey::Light) => DEFAULT_LIGHT_THEME,
        (None, ThemeKey::Dark) => DEFAULT_DARK_THEME,
    }
}
