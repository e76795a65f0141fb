//! Palette and color helpers for the grid renderer.

use crate::types::Rgba;

/// Relative luminance (0.0 to 1.0), ignoring alpha.
/// Uses simplified formula: 0.299*R + 0.587*G + 0.114*B
pub fn luminance(color: Rgba) -> f64 {
    let r = f64::from(color.r);
    let g = f64::from(color.g);
    let b = f64::from(color.b);
    (0.299 * r + 0.587 * g + 0.114 * b) / 255.0
}

/// A cell counts as light when it is mostly transparent or bright.
pub fn is_light(color: Rgba) -> bool {
    color.alpha_unit() < 0.5 || luminance(color) > 0.5
}

/// Selection outline color that stays visible over the selected cell.
pub fn selection_outline(under: Option<Rgba>) -> &'static str {
    match under {
        Some(color) if is_light(color) => palette::SELECTION_ON_LIGHT,
        _ => palette::SELECTION,
    }
}

pub mod palette {
    /// Canvas background behind the grid
    pub const BACKGROUND: &str = "#FFFFFF";

    /// Grid line color (very light gray)
    pub const GRID_LINE: &str = "#EEEEEE";

    /// Translucent fill over a free hovered cell
    pub const HOVER_FILL: &str = "rgba(128, 128, 128, 0.5)";

    /// Outline around a free hovered cell
    pub const HOVER_OUTLINE: &str = "#FFD700";

    /// Dark backing under a free selected cell
    pub const SELECTION_FILL: &str = "rgba(0, 0, 0, 0.7)";

    /// Selection outline
    pub const SELECTION: &str = "#FF4500";

    /// Selection outline over light cells
    pub const SELECTION_ON_LIGHT: &str = "#8B0000";
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
    fn luminance_extremes() {
        assert_eq!(luminance(Rgba::opaque(0, 0, 0)), 0.0);
        assert!((luminance(Rgba::opaque(255, 255, 255)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn selection_colors_differ_from_hover() {
        assert_ne!(palette::SELECTION, palette::HOVER_OUTLINE);
        assert_ne!(palette::SELECTION_ON_LIGHT, palette::HOVER_OUTLINE);
        assert_ne!(palette::SELECTION_FILL, palette::HOVER_FILL);
    }

    #[test]
    fn selection_outline_contrasts() {
        assert_eq!(selection_outline(None), palette::SELECTION);
        assert_eq!(selection_outline(Some(Rgba::opaque(10, 10, 10))), palette::SELECTION);
        assert_eq!(
            selection_outline(Some(Rgba::opaque(250, 250, 250))),
            palette::SELECTION_ON_LIGHT
        );
        assert_eq!(
            selection_outline(Some(Rgba::new(0, 0, 0, 10))),
            palette::SELECTION_ON_LIGHT
        );
    }
}
