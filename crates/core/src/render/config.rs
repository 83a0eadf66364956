use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration specific to visually rendering a map. These options have
/// absolutely no bearing on map _generation_, only on the visual
/// presentation. In other words, if you generate a map then output to a
/// non-visual format (e.g. JSON or binary), these options will **never**
/// affect that output.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RenderConfig {
    /// Side length of one cell, in screen units
    #[validate(range(min = 0.001))]
    pub cell_size: f64,

    /// Brightness multiplier for cells drawn with a decorative variant, so
    /// they stand out from plain interior cells. 1.0 draws them unchanged.
    #[validate(range(min = 0.0, max = 2.0))]
    pub decoration_shade: f32,

    /// Should carved overlays (roads, rivers, etc.) be drawn?
    pub show_overlays: bool,

    /// Should the raw route of each carved path be drawn as a line through
    /// cell centers? Useful for debugging the path search.
    pub show_routes: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            decoration_shade: 0.85,
            show_overlays: true,
            show_routes: false,
        }
    }
}
