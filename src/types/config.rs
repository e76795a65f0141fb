use serde::{Deserialize, Serialize};

use super::pixel::MAX_MESSAGE_LEN;
use crate::error::{PixelGridError, Result};

/// Grid geometry, zoom bounds, sync and interaction tuning.
///
/// Deserialized from a plain JS object (camelCase keys); missing keys fall
/// back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Number of addressable columns (W)
    pub grid_width: u32,
    /// Number of addressable rows (H)
    pub grid_height: u32,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub initial_zoom: f64,
    /// Extra pan allowance in grid units on each side
    pub overscroll_margin: f64,
    /// Records fetched per bulk ledger call (B)
    pub batch_size: u32,
    /// Message length limit in characters (N)
    pub max_message_len: usize,
    /// Screen pixels a press may travel before it counts as a drag
    pub drag_threshold: f64,
    /// Screen pixels moved by one step pan
    pub pan_step: f64,
    /// Extra attempts for the total-count request before giving up
    pub total_count_retries: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_width: 1921,
            grid_height: 1081,
            min_zoom: 1.0,
            max_zoom: 50.0,
            initial_zoom: 10.0,
            overscroll_margin: 1.0,
            batch_size: 100,
            max_message_len: MAX_MESSAGE_LEN,
            drag_threshold: 3.0,
            pan_step: 50.0,
            total_count_retries: 3,
        }
    }
}

impl GridConfig {
    /// Parse a JSON config, applying defaults for missing keys, then validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PixelGridError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(PixelGridError::Config("grid must have at least one cell".into()));
        }
        // Positions are packed into 16-bit fields.
        if self.grid_width > 65536 || self.grid_height > 65536 {
            return Err(PixelGridError::Config(format!(
                "grid {}x{} exceeds 65536x65536",
                self.grid_width, self.grid_height
            )));
        }
        if !(self.min_zoom.is_finite() && self.max_zoom.is_finite())
            || self.min_zoom <= 0.0
            || self.min_zoom > self.max_zoom
        {
            return Err(PixelGridError::Config(format!(
                "invalid zoom bounds [{}, {}]",
                self.min_zoom, self.max_zoom
            )));
        }
        if !self.initial_zoom.is_finite() {
            return Err(PixelGridError::Config("initial zoom must be finite".into()));
        }
        if self.batch_size == 0 {
            return Err(PixelGridError::Config("batch size must be positive".into()));
        }
        if !(self.overscroll_margin.is_finite() && self.overscroll_margin >= 0.0) {
            return Err(PixelGridError::Config("overscroll margin must be >= 0".into()));
        }
        Ok(())
    }

    pub fn grid_width_f64(&self) -> f64 {
        f64::from(self.grid_width)
    }

    pub fn grid_height_f64(&self) -> f64 {
        f64::from(self.grid_height)
    }

    /// Clamp a zoom level into `[min_zoom, max_zoom]`.
    ///
    /// Never panics on an unvalidated config: with inverted bounds the
    /// result is `max_zoom`.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.min_zoom;
        }
        zoom.max(self.min_zoom).min(self.max_zoom)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fhd_grid() {
        let config = GridConfig::default();
        assert_eq!((config.grid_width, config.grid_height), (1921, 1081));
        assert_eq!(config.initial_zoom, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_fills_missing_keys() {
        let config = GridConfig::from_json(r#"{"gridWidth": 64, "batchSize": 8}"#).unwrap();
        assert_eq!(config.grid_width, 64);
        assert_eq!(config.grid_height, 1081);
        assert_eq!(config.batch_size, 8);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(GridConfig::from_json(r#"{"batchSize": 0}"#).is_err());
        assert!(GridConfig::from_json(r#"{"minZoom": 5, "maxZoom": 2}"#).is_err());
        assert!(GridConfig::from_json(r#"{"gridWidth": 70000}"#).is_err());
        assert!(GridConfig::from_json("not json").is_err());
    }

    #[test]
    fn clamp_zoom_handles_nan() {
        let config = GridConfig::default();
        assert_eq!(config.clamp_zoom(f64::NAN), 1.0);
        assert_eq!(config.clamp_zoom(500.0), 50.0);
    }

    #[test]
    fn clamp_zoom_tolerates_inverted_bounds() {
        let config = GridConfig {
            min_zoom: 5.0,
            max_zoom: 2.0,
            ..GridConfig::default()
        };
        assert_eq!(config.clamp_zoom(3.0), 2.0);
        assert_eq!(config.clamp_zoom(0.5), 2.0);
    }
}
