//! Tessera is a Wang-corner tile map generator. It assigns a biome to every
//! corner of a grid from procedural noise, fixes up biome pairs that have no
//! transition artwork, picks one of 16 corner-coded tiles for every cell,
//! then carves roads and rivers through the map with a weighted path search
//! and composites them on top.
//!
//! This crate contains all the generation logic. It never loads or writes
//! images: artwork comes in through a [TileSheetProvider] as indexed tile
//! handles, and comes back out as a grid of handles via
//! [TileMap::cell_tiles].
//!
//! ```
//! use tessera::{Atlas, MapConfig, TileMap};
//!
//! let config = MapConfig::default();
//! let map = TileMap::generate(config, &Atlas::default()).unwrap();
//! println!("{:?}", map.report());
//! // From here you can rasterize the tiles however you like.
//! let tiles = map.cell_tiles();
//! assert_eq!(tiles.len(), 64 * 64);
//! ```
//!
//! See [MapConfig] for details on how generation can be customized.

mod config;
mod error;
mod map;
mod render;
mod tiles;
mod util;

pub use crate::{
    config::{
        AnchorRule, BiomeConfig, BiomeRule, DecorationConfig, MapConfig,
        NoiseConfig, OverlayConfig, PathConfig, RepairConfig, SearchConfig,
        Seed, SeparationConfig, SuppressRule,
    },
    error::ConfigError,
    map::{
        biome::{BiomeId, BiomePair},
        grid::{Corner, CornerCode, Direction, Grid, GridPoint},
        BaseTile, CellTiles, GenerationReport, OverlayId, OverlayMask,
        OverlayTile, Route, RouteOutcome, TileMap, IMPASSABLE_COST,
    },
    render::{
        config::RenderConfig,
        unit::{Color3, Point2},
        MapRenderer, Palette,
    },
    tiles::{
        Atlas, InteriorTiles, SheetId, TileHandle, TileSheetProvider,
        TransitionSheet, SHEET_TILES,
    },
};
