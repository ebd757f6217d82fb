//! Light/dark theme preference.

/// Local storage key holding the theme preference.
pub const THEME_STORAGE_KEY: &str = "theme";
/// Body class applied while the dark theme is active.
pub const DARK_MODE_CLASS: &str = "dark-mode";

/// Selected colour theme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ThemeMode {
    /// Light surfaces (default).
    #[default]
    Light,
    /// Dark surfaces.
    Dark,
}

impl ThemeMode {
    /// Interpret a stored preference; absent or unknown values select light.
    #[must_use]
    pub fn from_storage(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Self::Dark,
            _ => Self::Light,
        }
    }

    /// Value written to local storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The other theme.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Whether [`DARK_MODE_CLASS`] should be present on the body.
    #[must_use]
    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    /// Toggle button label, naming the theme a click switches to.
    #[must_use]
    pub const fn toggle_label(self) -> &'static str {
        match self {
            Self::Light => "🌓 Dark Mode",
            Self::Dark => "☀️ Light Mode",
        }
    }
}
