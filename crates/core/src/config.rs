mod seed;

pub use crate::config::seed::Seed;
use crate::map::grid::GridPoint;
use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration that defines a map generation process. Two maps generated
/// with the same config (and the same tile sheets) will always be identical.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MapConfig {
    /// RNG seed to use for all randomized processes during generation. See
    /// [Seed] for the accepted input formats.
    pub seed: Seed,

    /// Number of cells along the X axis. The corner grid is one wider.
    #[validate(range(min = 1, max = 4096))]
    pub width: u32,

    /// Number of cells along the Y axis. The corner grid is one taller.
    #[validate(range(min = 1, max = 4096))]
    pub height: u32,

    /// Pixel edge length of one tile. Generation doesn't care about this,
    /// it's carried along so that rasterizers know how to lay tiles out.
    #[validate(range(min = 1, max = 1024))]
    pub tile_size: u32,

    /// Shape of the noise used for classification and decoration patches
    #[validate]
    pub noise: NoiseConfig,

    /// The biome classification table. **Order matters**: each corner gets
    /// the first biome whose rule matches, so earlier entries win ties.
    /// Exactly one biome must use [BiomeRule::Always], and it must be last.
    pub biomes: Vec<BiomeConfig>,

    /// Minimum-distance rules between pairs of biomes, applied after
    /// classification and before adjacency repair.
    pub separations: Vec<SeparationConfig>,

    /// Controls for adjacency repair
    #[validate]
    pub repair: RepairConfig,

    /// Overlay kinds, in draw order. The first kind has the highest
    /// precedence: once it claims a cell, nothing after it can draw there.
    pub overlays: Vec<OverlayConfig>,

    /// Paths to carve, in carving order. All paths share one RNG stream, so
    /// reordering this list changes the exact shape of every path after the
    /// first moved one.
    pub paths: Vec<PathConfig>,

    /// Limits for path search
    #[validate]
    pub search: SearchConfig,
}

/// Config for the coherent noise shared by every noise-driven rule. Each
/// rule picks its own frequency and seed offset; the fractal shape is global.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NoiseConfig {
    /// Number of different frequencies to add together.
    #[validate(range(min = 1, max = 6))]
    pub octaves: usize,

    /// Frequency multiplier between successive octaves.
    #[validate(range(min = 1.0))]
    pub lacunarity: f64,

    /// Amplitude multiplier between successive octaves. E.g. with 3 octaves
    /// and a persistence of 0.5, amplitudes will be `[1.0, 0.5, 0.25]`.
    #[validate(range(min = 0.0, max = 1.0))]
    pub persistence: f64,
}

/// One entry in the biome table.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct BiomeConfig {
    /// Unique name of the biome. Tile sheets refer to biomes by this label.
    #[validate(length(min = 1))]
    pub label: String,

    /// Dominance rank, lower is more dominant. During adjacency repair, the
    /// less dominant side of an illegal edge gets demoted.
    pub priority: u32,

    /// What this biome turns into when it gets demoted. Biomes without a
    /// fallback can't be demoted.
    #[serde(default)]
    pub fallback: Option<String>,

    /// Classification rule for this biome
    pub rule: BiomeRule,

    /// Optional decorative variants for interior cells of this biome
    #[serde(default)]
    pub decoration: Option<DecorationConfig>,

    /// Preview color, as an HTML color code. Only used by renderers.
    #[serde(default = "default_color")]
    pub color: String,
}

/// Predicate that decides whether a corner belongs to a biome.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BiomeRule {
    /// Always matches. This is the catch-all biome.
    Always,
    /// Matches when the noise value is strictly below the threshold
    NoiseBelow {
        frequency: f64,
        seed_offset: u32,
        threshold: f64,
    },
    /// Matches when the noise value is strictly above the threshold
    NoiseAbove {
        frequency: f64,
        seed_offset: u32,
        threshold: f64,
    },
}

/// Controls how often interior cells of a biome swap their canonical tile
/// for a decorative variant. A cell is decorated only if it sits in a noise
/// "patch" AND it wins a per-cell density roll.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, Validate)]
pub struct DecorationConfig {
    /// Frequency of the patch noise. Higher means smaller patches.
    #[validate(range(min = 0.0))]
    pub frequency: f64,
    pub seed_offset: u32,
    /// Cells where the patch noise is at or below this are never decorated
    pub patch_threshold: f64,
    /// Probability that a cell inside a patch gets decorated
    #[validate(range(min = 0.0, max = 1.0))]
    pub density: f64,
}

/// Keeps one biome at least some distance away from another. Any corner of
/// `demote` within `distance` corners (along a grid axis) of a `near` corner
/// gets demoted to its fallback.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct SeparationConfig {
    pub near: String,
    pub demote: String,
    #[validate(range(min = 1, max = 64))]
    pub distance: u32,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RepairConfig {
    /// Maximum number of full scans over the corner grid. If the grid still
    /// has illegal edges after this many passes, generation continues in a
    /// degraded mode and the leftovers are reported.
    #[validate(range(min = 1, max = 64))]
    pub max_passes: u32,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SearchConfig {
    /// Node expansion budget for a single path search, per map cell. Bounds
    /// the worst case of a search under a pathological cost table.
    #[validate(range(min = 1))]
    pub expansions_per_cell: u32,

    /// Upper bound of the random jitter added to each step cost, for a path
    /// with a wiggle of 1.0. The bound scales linearly with wiggle.
    #[validate(range(max = 1000))]
    pub max_jitter: u32,
}

/// A kind of overlay (river, road, ...).
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct OverlayConfig {
    #[validate(length(min = 1))]
    pub kind: String,

    /// Rules that stop this kind from drawing on a cell. A suppressed cell
    /// stays unclaimed, so lower-precedence kinds can still draw there.
    #[serde(default)]
    pub suppress: Vec<SuppressRule>,

    /// Preview color, as an HTML color code. Only used by renderers.
    #[serde(default = "default_color")]
    pub color: String,
}

/// A condition under which an overlay tile is not drawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuppressRule {
    /// Skip the cell if at least `at_least` of its 4 ground corners are the
    /// given biome.
    GroundCorners { biome: String, at_least: u8 },
}

/// A single path to carve into an overlay.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct PathConfig {
    /// Overlay kind this path is carved into
    pub kind: String,
    /// Requested start cell
    pub start: GridPoint,
    /// Requested end cell
    pub end: GridPoint,
    /// How far the route is allowed to meander. 0 gives a cheapest path.
    #[validate(range(min = 0.0, max = 10.0))]
    pub wiggle: f64,
    /// How the start cell snaps to an anchor before searching
    #[serde(default)]
    pub anchor_start: AnchorRule,
    /// How the end cell snaps to an anchor before searching
    #[serde(default)]
    pub anchor_end: AnchorRule,
    /// Step cost for any biome missing from `costs`
    #[serde(default = "default_cost")]
    pub default_cost: u32,
    /// Step cost into a cell, keyed by the cell's biome label. A cost of
    /// [IMPASSABLE_COST](crate::IMPASSABLE_COST) or more can't be entered.
    #[serde(default)]
    pub costs: IndexMap<String, u32>,
}

/// Where a path endpoint is allowed to sit. Endpoints that don't satisfy the
/// rule are moved to the nearest cell that does.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnchorRule {
    /// Use the requested cell as-is
    None,
    /// Any cell with at least one corner of the given biome
    Biome { biome: String },
    /// Any cell on the map boundary
    Edge,
    /// Either of the above
    BiomeOrEdge { biome: String },
}

impl Default for AnchorRule {
    fn default() -> Self {
        Self::None
    }
}

impl MapConfig {
    /// Run range validation on the config and on every entry of its lists.
    /// Structural problems (unknown labels, missing art...) are caught later,
    /// when the config is resolved against its tile sheets.
    pub fn validate_all(&self) -> anyhow::Result<()> {
        self.validate()?;
        for biome in &self.biomes {
            biome
                .validate()
                .with_context(|| format!("biome {:?}", biome.label))?;
            if let Some(decoration) = &biome.decoration {
                decoration.validate().with_context(|| {
                    format!("decoration for biome {:?}", biome.label)
                })?;
            }
        }
        for separation in &self.separations {
            separation.validate().with_context(|| {
                format!(
                    "separation of {:?} from {:?}",
                    separation.demote, separation.near
                )
            })?;
        }
        for overlay in &self.overlays {
            overlay.validate()?;
        }
        for path in &self.paths {
            path.validate()
                .with_context(|| format!("{:?} path", path.kind))?;
        }
        Ok(())
    }
}

fn default_color() -> String {
    "#808080".into()
}

fn default_cost() -> u32 {
    1
}

impl Default for MapConfig {
    fn default() -> Self {
        // The default is a small three-biome map with one river and one road.
        // It should always generate something that looks reasonable.
        let water = "water".to_owned();
        let grass = "grass".to_owned();
        let desert = "desert".to_owned();
        Self {
            seed: Seed::Int(42),
            width: 64,
            height: 64,
            tile_size: 32,
            noise: NoiseConfig::default(),
            biomes: vec![
                BiomeConfig {
                    label: water.clone(),
                    priority: 0,
                    fallback: Some(grass.clone()),
                    rule: BiomeRule::NoiseBelow {
                        frequency: 1.2,
                        seed_offset: 101,
                        threshold: -0.10,
                    },
                    decoration: None,
                    color: "#144da3".into(),
                },
                BiomeConfig {
                    label: desert.clone(),
                    priority: 2,
                    fallback: Some(grass.clone()),
                    rule: BiomeRule::NoiseAbove {
                        frequency: 1.0,
                        seed_offset: 202,
                        threshold: 0.20,
                    },
                    decoration: None,
                    color: "#d6cc6b".into(),
                },
                BiomeConfig {
                    label: grass.clone(),
                    priority: 3,
                    fallback: None,
                    rule: BiomeRule::Always,
                    decoration: Some(DecorationConfig {
                        frequency: 6.0,
                        seed_offset: 303,
                        patch_threshold: 0.1,
                        density: 0.3,
                    }),
                    color: "#adc973".into(),
                },
            ],
            separations: vec![SeparationConfig {
                near: water.clone(),
                demote: desert.clone(),
                distance: 2,
            }],
            repair: RepairConfig::default(),
            overlays: vec![
                // Roads win over rivers, which reads as a bridge
                OverlayConfig {
                    kind: "road".into(),
                    suppress: vec![SuppressRule::GroundCorners {
                        biome: water.clone(),
                        at_least: 1,
                    }],
                    color: "#8b5a2b".into(),
                },
                OverlayConfig {
                    kind: "river".into(),
                    suppress: vec![SuppressRule::GroundCorners {
                        biome: water.clone(),
                        at_least: 2,
                    }],
                    color: "#48c0f0".into(),
                },
            ],
            paths: vec![
                PathConfig {
                    kind: "river".into(),
                    start: GridPoint::new(20, 12),
                    end: GridPoint::new(44, 52),
                    wiggle: 0.6,
                    anchor_start: AnchorRule::None,
                    anchor_end: AnchorRule::BiomeOrEdge {
                        biome: water.clone(),
                    },
                    default_cost: 2,
                    costs: [(water, 1), (grass.clone(), 2), (desert.clone(), 5)]
                        .into_iter()
                        .collect(),
                },
                PathConfig {
                    kind: "road".into(),
                    start: GridPoint::new(0, 32),
                    end: GridPoint::new(63, 32),
                    wiggle: 0.3,
                    anchor_start: AnchorRule::None,
                    anchor_end: AnchorRule::None,
                    default_cost: 1,
                    costs: [
                        ("water".to_owned(), 99),
                        (grass, 1),
                        (desert, 2),
                    ]
                    .into_iter()
                    .collect(),
                },
            ],
            search: SearchConfig::default(),
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
        }
    }
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self { max_passes: 4 }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            expansions_per_cell: 8,
            max_jitter: 10,
        }
    }
}
