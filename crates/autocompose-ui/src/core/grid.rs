//! Grid column slider handling.

use autocompose_api_models::UpdateColumnsRequest;

use crate::core::error::GridError;

/// CSS custom property the card grid reads.
pub const GRID_COLUMNS_PROPERTY: &str = "--grid-columns";

/// Column count accepted by the server (values outside the range are clamped).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct GridColumns(u32);

impl GridColumns {
    /// Fewest columns the server stores.
    pub const MIN: u32 = 1;
    /// Most columns the server stores.
    pub const MAX: u32 = 5;
    /// Column count used before the user touches the slider.
    pub const DEFAULT: Self = Self(3);

    /// Clamp an arbitrary count into the accepted range.
    #[must_use]
    pub const fn clamped(value: u32) -> Self {
        if value < Self::MIN {
            Self(Self::MIN)
        } else if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    /// Parse a slider value.
    ///
    /// # Errors
    /// Returns [`GridError::NotANumber`] when the value is not an integer.
    pub fn parse(raw: &str) -> Result<Self, GridError> {
        let trimmed = raw.trim();
        let value = trimmed
            .parse::<i64>()
            .map_err(|_| GridError::NotANumber {
                value: raw.to_string(),
            })?;
        let value = u32::try_from(value.max(0)).unwrap_or(Self::MAX);
        Ok(Self::clamped(value))
    }

    /// Column count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Value written into [`GRID_COLUMNS_PROPERTY`] and the display label.
    #[must_use]
    pub fn css_value(self) -> String {
        self.0.to_string()
    }

    /// Body for `POST /update_columns`.
    #[must_use]
    pub const fn request(self) -> UpdateColumnsRequest {
        UpdateColumnsRequest { num_cols: self.0 }
    }
}

impl Default for GridColumns {
    fn default() -> Self {
        Self::DEFAULT
    }
}
