use crate::map::grid::GridPoint;
use thiserror::Error;

/// A structural problem with a [MapConfig](crate::MapConfig), or with the
/// tile sheets it was paired with. These are all detected before generation
/// starts, so a run either fails up front or produces a complete map.
///
/// Numeric range problems are reported separately, through
/// [validator::ValidationErrors].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown biome {0:?}")]
    UnknownBiome(String),

    #[error("biome {0:?} is declared more than once")]
    DuplicateBiome(String),

    #[error("no catch-all biome; exactly one biome must use the `always` rule")]
    MissingCatchAll,

    #[error("biomes {0:?} and {1:?} are both catch-alls")]
    MultipleCatchAll(String, String),

    #[error("catch-all biome {0:?} must be the last biome declared")]
    CatchAllNotLast(String),

    #[error("fallback chain starting at biome {0:?} loops back on itself")]
    FallbackCycle(String),

    #[error("biome {0:?} can't be demoted because it has no fallback")]
    MissingFallback(String),

    #[error("no canonical interior tile for biome {0:?}")]
    MissingInteriorTile(String),

    #[error(
        "no transition tiles for biomes {0:?} and {1:?}, and neither side \
        can be demoted"
    )]
    MissingTransition(String, String),

    #[error(
        "transition sheet for {biome_a:?}/{biome_b:?} names {high:?} as its \
        high biome"
    )]
    InvalidHighBiome {
        biome_a: String,
        biome_b: String,
        high: String,
    },

    #[error("unknown overlay kind {0:?}")]
    UnknownOverlayKind(String),

    #[error("overlay kind {0:?} is declared more than once")]
    DuplicateOverlayKind(String),

    #[error("no tile sheet for overlay kind {0:?}")]
    MissingOverlaySheet(String),

    #[error("point {point} is outside the {width}x{height} map")]
    PointOutOfBounds {
        point: GridPoint,
        width: u32,
        height: u32,
    },

    #[error("invalid cost {cost} for biome {biome:?} in {kind:?} path")]
    InvalidCost {
        kind: String,
        biome: String,
        cost: u32,
    },
}
