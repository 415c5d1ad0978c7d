//! Internal constants for diagram rendering.

use std::time::Duration;

/// Prefix for render identifiers handed to the engine.
pub const RENDER_ID_PREFIX: &str = "mermaid";

/// Hex characters of the content hash kept in a render identifier.
pub const RENDER_ID_HASH_LEN: usize = 16;

/// Outer element wrapping a rendered diagram.
pub const WRAPPER_CLASS: &str = "mermaid-wrapper";

/// Element holding the engine markup.
pub const CONTAINER_CLASS: &str = "mermaid-container";

/// "Open in new window" button.
pub const OPENER_CLASS: &str = "mermaid-opener";

/// Extra class on the wrapper when nothing can be rendered.
pub const PLACEHOLDER_CLASS: &str = "mermaid-placeholder";

/// Glyph fill on dark backgrounds.
pub const GLYPH_FILL_ON_DARK: &str = "#ffffff";

/// Glyph fill on light backgrounds.
pub const GLYPH_FILL_ON_LIGHT: &str = "#1c1e21";

/// Default HTTP timeout for Kroki requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
