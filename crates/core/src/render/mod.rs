pub mod config;
#[cfg(feature = "svg")]
pub mod svg;
pub mod unit;

use crate::{
    config::MapConfig,
    map::{biome::BiomeId, grid::GridPoint, BaseTile, OverlayId, TileMap},
    render::{
        config::RenderConfig,
        unit::{Color3, Point2},
    },
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A map renderer is used to convert maps into a visual preview. A renderer
/// is created using a particular [RenderConfig], and from there can be used
/// to render any number of maps any number of times.
///
/// This is not a rasterizer. It never touches the tile artwork, and instead
/// draws every corner in its biome's preview color, which makes it handy for
/// checking what the generator did without a tile sheet on hand. To draw the
/// real tiles, use [TileMap::cell_tiles].
///
/// ## Supported Formats
/// - SVG
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapRenderer {
    render_config: RenderConfig,
}

impl MapRenderer {
    /// Initialize a new renderer with the given options. Returns an error if
    /// the render config is invalid.
    pub fn new(render_config: RenderConfig) -> anyhow::Result<Self> {
        render_config.validate()?;
        Ok(Self { render_config })
    }

    /// Get a reference to the config that this renderer uses
    pub fn render_config(&self) -> &RenderConfig {
        &self.render_config
    }

    /// Get the position of a point in the corner lattice, in screen space.
    /// For a cell, this is its top-left (NW) corner.
    pub fn screen_position(&self, point: GridPoint) -> Point2 {
        let [x, y] = point.as_f64();
        Point2::new(x, y) * self.render_config.cell_size
    }

    /// Get the center of a cell, in screen space
    pub fn cell_center(&self, cell: GridPoint) -> Point2 {
        let [x, y] = cell.center();
        Point2::new(x, y) * self.render_config.cell_size
    }

    /// Compute the color to draw one quadrant of a cell with. Each quadrant
    /// takes the color of the corner it touches. Decorated cells get shaded.
    pub fn quadrant_color(
        &self,
        map: &TileMap,
        palette: &Palette,
        corner: GridPoint,
        base: &BaseTile,
    ) -> Color3 {
        let color = palette.biome(map.corners()[corner]);
        match base {
            BaseTile::Decorated { .. } => {
                color * self.render_config.decoration_shade
            }
            _ => color,
        }
    }

    /// Render this map as a 2D SVG, from a top-down perspective. Returns the
    /// SVG in a string, or an error if the map's config holds an invalid
    /// color.
    #[cfg(feature = "svg")]
    pub fn render_as_svg(&self, map: &TileMap) -> anyhow::Result<String> {
        let palette = Palette::new(map.config())?;
        Ok(svg::map_to_svg(map, self, &palette).to_string())
    }
}

/// Preview colors for a map, parsed from its config
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    /// Indexed by biome ID
    biomes: Vec<Color3>,
    /// Indexed by overlay ID
    overlays: Vec<Color3>,
}

impl Palette {
    pub fn new(config: &MapConfig) -> anyhow::Result<Self> {
        let biomes = config
            .biomes
            .iter()
            .map(|biome| {
                Color3::from_html(&biome.color).with_context(|| {
                    format!("invalid color for biome {}", biome.label)
                })
            })
            .collect::<anyhow::Result<_>>()?;
        let overlays = config
            .overlays
            .iter()
            .map(|overlay| {
                Color3::from_html(&overlay.color).with_context(|| {
                    format!("invalid color for overlay {}", overlay.kind)
                })
            })
            .collect::<anyhow::Result<_>>()?;
        Ok(Self { biomes, overlays })
    }

    pub fn biome(&self, id: BiomeId) -> Color3 {
        self.biomes[id.index()]
    }

    pub fn overlay(&self, id: OverlayId) -> Color3 {
        self.overlays[id.index()]
    }
}
