pub mod biome;
pub(crate) mod generate;
pub mod grid;

use crate::{
    config::MapConfig,
    map::{
        biome::{BiomeId, BiomePair},
        generate::MapBuilder,
        grid::{CornerCode, Grid, GridPoint},
    },
    tiles::{TileHandle, TileSheetProvider},
    timed,
};
use anyhow::Context;
use derive_more::Display;
use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};
use strum::Display as StrumDisplay;

/// Any step cost at or above this value makes a cell impassable for a path.
pub const IMPASSABLE_COST: u32 = 99;

/// A fully generated map. Holds every layer of the generation pipeline, from
/// the corner biomes up to the composited overlay tiles, plus the config
/// that produced it.
///
/// ## Serialization
/// Maps can be exported as JSON via [TileMap::to_json] and as binary via
/// [TileMap::to_bin], and reloaded with the matching `from_` function. The
/// binary format is currently [CBOR](https://cbor.io/), but that is subject
/// to change.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileMap {
    /// The config used to generate this map. Generation is deterministic
    /// based on config (and tile sheets), so this is enough to rebuild it.
    config: MapConfig,

    /// Final biome of every corner, after separation and repair
    corners: Grid<BiomeId>,

    /// The base terrain tile for every cell
    base: Grid<BaseTile>,

    /// Carved overlay bitmasks, one per overlay kind, in draw order
    masks: Vec<OverlayMask>,

    /// The overlay tile drawn on each cell, if any
    overlays: Grid<Option<OverlayTile>>,

    /// Every route that was searched for, in carving order. Includes routes
    /// that couldn't be carved.
    routes: Vec<Route>,

    report: GenerationReport,
}

impl TileMap {
    /// Generate a new map from a config and a source of tile sheets. Returns
    /// an error if the config is invalid, or if it asks for art the provider
    /// doesn't have. Every problem of that sort is caught before generation
    /// begins. Problems that come up during generation (unreachable paths,
    /// repairs that don't converge) are not errors; check
    /// [TileMap::report] for those.
    pub fn generate(
        config: MapConfig,
        provider: &dyn TileSheetProvider,
    ) -> anyhow::Result<Self> {
        info!("Generating map with config {:#?}", config);

        config.validate_all().context("invalid config")?;

        timed!("Map generation", log::Level::Info, {
            MapBuilder::new(&config, provider)
                .context("invalid config")?
                .generate_map()
        })
    }

    /// Assemble a map from its finished layers. Only the builder does this.
    pub(crate) fn from_layers(
        config: MapConfig,
        corners: Grid<BiomeId>,
        base: Grid<BaseTile>,
        masks: Vec<OverlayMask>,
        overlays: Grid<Option<OverlayTile>>,
        routes: Vec<Route>,
        report: GenerationReport,
    ) -> Self {
        Self {
            config,
            corners,
            base,
            masks,
            overlays,
            routes,
            report,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Biome of every corner. The grid is one larger than the map in both
    /// dimensions.
    pub fn corners(&self) -> &Grid<BiomeId> {
        &self.corners
    }

    pub fn base(&self) -> &Grid<BaseTile> {
        &self.base
    }

    pub fn masks(&self) -> &[OverlayMask] {
        &self.masks
    }

    pub fn overlays(&self) -> &Grid<Option<OverlayTile>> {
        &self.overlays
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn report(&self) -> &GenerationReport {
        &self.report
    }

    /// Get the label of a biome in this map
    pub fn biome_label(&self, id: BiomeId) -> Option<&str> {
        self.config
            .biomes
            .get(id.index())
            .map(|biome| biome.label.as_str())
    }

    /// Get the label of an overlay kind in this map
    pub fn overlay_label(&self, id: OverlayId) -> Option<&str> {
        self.config
            .overlays
            .get(id.index())
            .map(|overlay| overlay.kind.as_str())
    }

    /// Flatten the map into the tile references a rasterizer needs: one base
    /// tile per cell, plus at most one overlay tile on top of it.
    pub fn cell_tiles(&self) -> Grid<CellTiles> {
        self.base.map(|cell, base| CellTiles {
            base: base.tile(),
            overlay: self.overlays[cell].map(|overlay| overlay.tile),
        })
    }

    /// Make sure every layer fits the config: layer sizes match the map
    /// dimensions, and every biome, overlay kind and route cell refers to
    /// something that exists. Maps loaded from outside go through this
    /// before anything can index into them.
    #[cfg(any(feature = "json", feature = "bin"))]
    fn check_layers(&self) -> anyhow::Result<()> {
        fn check_size<T>(
            layer: &str,
            grid: &Grid<T>,
            width: u32,
            height: u32,
        ) -> anyhow::Result<()> {
            if grid.width() != width || grid.height() != height {
                anyhow::bail!(
                    "{} layer is {}x{}, expected {}x{}",
                    layer,
                    grid.width(),
                    grid.height(),
                    width,
                    height
                );
            }
            Ok(())
        }

        self.config.validate_all().context("invalid config")?;
        let (width, height) = (self.config.width, self.config.height);
        check_size("corner", &self.corners, width + 1, height + 1)?;
        check_size("base", &self.base, width, height)?;
        check_size("overlay", &self.overlays, width, height)?;

        let biomes = self.config.biomes.len();
        let check_biome = |biome: BiomeId| {
            if biome.index() >= biomes {
                anyhow::bail!("unknown biome ID {}", biome);
            }
            Ok(())
        };
        let kinds = self.config.overlays.len();
        let check_kind = |kind: OverlayId| {
            if kind.index() >= kinds {
                anyhow::bail!("unknown overlay kind ID {}", kind);
            }
            Ok(())
        };

        for biome in self.corners.values() {
            check_biome(*biome)?;
        }
        for base in self.base.values() {
            match base {
                BaseTile::Interior { biome, .. }
                | BaseTile::Decorated { biome, .. }
                | BaseTile::Fallback { biome, .. } => check_biome(*biome)?,
                BaseTile::Transition { pair, .. } => {
                    for biome in pair.biomes() {
                        check_biome(biome)?;
                    }
                }
            }
        }

        if self.masks.len() != kinds {
            anyhow::bail!(
                "{} overlay masks for {} kinds",
                self.masks.len(),
                kinds
            );
        }
        for (i, mask) in self.masks.iter().enumerate() {
            if mask.kind.index() != i {
                anyhow::bail!(
                    "overlay mask {} belongs to kind {}",
                    i,
                    mask.kind
                );
            }
            check_size("overlay mask", &mask.corners, width + 1, height + 1)?;
        }
        for overlay in self.overlays.values().flatten() {
            check_kind(overlay.kind)?;
        }
        for route in &self.routes {
            check_kind(route.kind)?;
            if let Some(cell) =
                route.cells.iter().find(|cell| !self.base.contains(**cell))
            {
                anyhow::bail!("route cell {} is outside the map", cell);
            }
        }
        Ok(())
    }

    /// Deserialize a map from JSON. A map can be serialized into JSON with
    /// [TileMap::to_json]. Will fail if the input is malformed, or if its
    /// layers don't fit together.
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let map: Self =
            serde_json::from_str(json).context("error deserializing map")?;
        map.check_layers().context("inconsistent map")?;
        Ok(map)
    }

    /// Serialize this map into JSON. This is a recoverable format, which can
    /// be loaded back with [TileMap::from_json].
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> String {
        // Panic here indicates an internal bug in the data format
        serde_json::to_string(self).expect("error serializing map")
    }

    /// Deserialize a map from binary format. A map can be serialized into
    /// binary with [TileMap::to_bin]. Will fail if the input is malformed,
    /// or if its layers don't fit together.
    #[cfg(feature = "bin")]
    pub fn from_bin(read: impl std::io::Read) -> anyhow::Result<Self> {
        let map: Self = serde_cbor::from_reader(read)
            .context("error deserializing map")?;
        map.check_layers().context("inconsistent map")?;
        Ok(map)
    }

    /// Serialize this map into a binary format. This is a recoverable format,
    /// which can be loaded back with [TileMap::from_bin].
    #[cfg(feature = "bin")]
    pub fn to_bin(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        // Panic here indicates an internal bug in the data format
        serde_cbor::to_writer(&mut buffer, self)
            .expect("error serializing map");
        buffer
    }
}

/// The tile chosen for one cell of base terrain, and why it was chosen.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BaseTile {
    /// All 4 corners are the same biome
    Interior { biome: BiomeId, tile: TileHandle },
    /// All 4 corners are the same biome, and the cell got a decorative
    /// variant
    Decorated { biome: BiomeId, tile: TileHandle },
    /// Exactly 2 biomes, blended with a transition tile
    Transition {
        pair: BiomePair,
        code: CornerCode,
        tile: TileHandle,
    },
    /// Repair left this cell with a combination no tile can draw (3+ biomes,
    /// or 2 with no transition art). The most common biome's interior tile
    /// is used instead. This is a degraded mode, and always gets reported.
    Fallback { biome: BiomeId, tile: TileHandle },
}

impl BaseTile {
    pub fn tile(&self) -> TileHandle {
        match self {
            Self::Interior { tile, .. }
            | Self::Decorated { tile, .. }
            | Self::Transition { tile, .. }
            | Self::Fallback { tile, .. } => *tile,
        }
    }
}

/// A handle to one overlay kind. IDs follow draw order, so a lower ID means
/// higher precedence.
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[display(fmt = "{}", _0)]
pub struct OverlayId(u16);

impl OverlayId {
    pub fn new(index: usize) -> Self {
        Self(index as u16)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-corner carve state for one overlay kind. Corners only ever get set,
/// never cleared.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayMask {
    pub kind: OverlayId,
    pub corners: Grid<bool>,
}

/// An overlay tile drawn on top of a cell's base terrain
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayTile {
    pub kind: OverlayId,
    pub code: CornerCode,
    pub tile: TileHandle,
}

/// How a path search turned out
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    StrumDisplay,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RouteOutcome {
    /// A route was found and carved into its overlay
    Carved,
    /// The endpoints aren't connected under the path's cost table
    Unreachable,
    /// No cell on the map satisfies an endpoint's anchor rule
    AnchorNotFound,
    /// The search gave up after hitting its expansion budget
    BudgetExhausted,
}

/// The result of carving one path. Anything other than
/// [RouteOutcome::Carved] has no cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub kind: OverlayId,
    /// Cells along the route, from start to end
    pub cells: Vec<GridPoint>,
    pub outcome: RouteOutcome,
}

/// The tile references for a single cell, ready to be rasterized
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellTiles {
    pub base: TileHandle,
    pub overlay: Option<TileHandle>,
}

/// Everything noteworthy that happened during generation. None of these are
/// errors, but a nonzero count for some of them (residual illegal edges,
/// fallback cells, unreachable paths) means part of the map is degraded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Corners demoted to enforce separation distances
    pub separated_corners: usize,
    /// Number of repair passes that ran
    pub repair_passes: u32,
    /// Corners demoted during adjacency repair
    pub repaired_edges: usize,
    /// Illegal edges still left after the last repair pass
    pub residual_illegal_edges: usize,
    /// Cells drawn with a majority-fallback tile
    pub fallback_cells: usize,
    /// Interior cells that got a decorative variant
    pub decorated_cells: usize,
    pub carved_paths: usize,
    /// Paths that weren't carved, for any reason
    pub unreachable_paths: usize,
    /// Overlay tiles skipped because of a suppression rule
    pub suppressed_overlay_cells: usize,
    /// Number of corners of each biome in the final grid, in declaration
    /// order
    pub biome_counts: IndexMap<String, usize>,
}
