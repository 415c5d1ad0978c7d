//! Host theme resolution and observation for RW Mermaid rendering.
//!
//! A diagram follows the light/dark theme of the document it is embedded in.
//! The host announces its theme through a single attribute on the document
//! root ([`THEME_ATTRIBUTE`]); this crate turns that attribute into a
//! [`ThemeKey`] and keeps it current:
//!
//! - [`resolve`]: pure mapping from attribute value + configuration to a
//!   [`ResolvedTheme`]
//! - [`HostDocument`]: in-memory host document with attribute mutation
//!   observers ([`MutationObserver`])
//! - [`ThemeWatcher`]: observes the theme attribute and publishes only
//!   distinct resolved themes
//!
//! # Example
//!
//! ```
//! use rw_config::MermaidConfig;
//! use rw_theme::{HostDocument, ThemeKey, ThemeWatcher, THEME_ATTRIBUTE};
//!
//! let host = HostDocument::new().with_attribute(THEME_ATTRIBUTE, "light");
//! let mut watcher = ThemeWatcher::new(Some(&host), &MermaidConfig::default());
//! assert_eq!(watcher.current().key, ThemeKey::Light);
//!
//! host.set_attribute(THEME_ATTRIBUTE, "dark");
//! let changed = watcher.pump();
//! assert_eq!(changed.map(|t| t.key), Some(ThemeKey::Dark));
//! ```

mod host;
mod key;
mod resolver;
mod watcher;

pub use host::{HostDocument, HostError, Mutation, MutationObserver, MutationRecord, ObserveOptions};
pub use key::ThemeKey;
pub use resolver::{DEFAULT_DARK_THEME, DEFAULT_LIGHT_THEME, ResolvedTheme, engine_theme, resolve};
pub use watcher::ThemeWatcher;

/// Document-level attribute carrying the host theme (`"light"` / `"dark"`).
pub const THEME_ATTRIBUTE: &str = "data-theme";
