//! Light/dark theme key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host theme selection. Exactly one is active at any time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKey {
    /// Light background (the default when the host says nothing useful).
    #[default]
    Light,
    /// Dark background.
    Dark,
}

impl ThemeKey {
    /// Parse a raw host attribute value.
    ///
    /// Matching ignores surrounding whitespace and ASCII case.
    /// Returns `None` for unrecognized values.
    #[must_use]
    pub fn from_attribute(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("light") {
            Some(Self::Light)
        } else if value.eq_ignore_ascii_case("dark") {
            Some(Self::Dark)
        } else {
            None
        }
    }

    /// Attribute spelling of this key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }
}

impl fmt::Display for ThemeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
