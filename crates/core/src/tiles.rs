//! Tile sheets are where tile artwork comes from. The generator never touches
//! pixels, it only hands out [TileHandle]s, which a rasterizer later turns
//! into images. Sheets are supplied through the [TileSheetProvider] trait;
//! [Atlas] is a provider that derives everything from sheet file names.
//!
//! Every sheet holds 16 tiles, laid out as a 4×4 grid and indexed row-major.
//! For transition and overlay sheets, tile `i` is the tile for corner code
//! `i` (see [CornerCode](crate::CornerCode)).

use crate::{
    error::ConfigError,
    map::biome::{BiomeCatalogue, BiomeId, BiomePair},
};
use anyhow::{anyhow, bail, Context};
use derive_more::Display;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of tiles in every sheet
pub const SHEET_TILES: usize = 16;

/// Index of a tile sheet within a provider
#[derive(
    Copy, Clone, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[display(fmt = "{}", _0)]
pub struct SheetId(pub u16);

/// A reference to a single tile: a sheet, and a position within that sheet.
#[derive(
    Copy, Clone, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[display(fmt = "{}:{}", sheet, index)]
pub struct TileHandle {
    pub sheet: SheetId,
    pub index: u8,
}

impl TileHandle {
    /// Get handles to all 16 tiles of a sheet, in index order
    pub fn sheet(sheet: SheetId) -> [Self; SHEET_TILES] {
        let mut tiles = [Self { sheet, index: 0 }; SHEET_TILES];
        for (i, tile) in tiles.iter_mut().enumerate() {
            tile.index = i as u8;
        }
        tiles
    }
}

/// The 16 tiles that blend two biomes. A corner that belongs to `high` sets
/// its bit in the corner code, the other biome leaves it clear.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionSheet {
    pub high: String,
    pub tiles: [TileHandle; SHEET_TILES],
}

/// Tiles for a cell that's entirely one biome.
#[derive(Clone, Debug, PartialEq)]
pub struct InteriorTiles {
    /// The plain tile, used unless the cell gets decorated
    pub canonical: TileHandle,
    /// Decorative variants. May be empty.
    pub decorations: Vec<TileHandle>,
}

/// Something that knows where tile artwork lives. Biomes and overlays are
/// referred to by their labels from the config.
pub trait TileSheetProvider {
    /// Every biome pair that has transition art. Order matters: if a pair
    /// shows up more than once, the first one wins.
    fn transition_pairs(&self) -> Vec<(String, String)>;

    /// Get the transition sheet for two biomes, in either order
    fn transition(&self, biome_a: &str, biome_b: &str)
        -> Option<TransitionSheet>;

    /// Get the interior tiles for a single biome
    fn interior(&self, biome: &str) -> Option<InteriorTiles>;

    /// Get the 16 tiles for an overlay kind. For overlays, a corner is high
    /// if the overlay was carved through it.
    fn overlay(&self, kind: &str) -> Option<[TileHandle; SHEET_TILES]>;
}

/// What a sheet holds, as determined by its name
#[derive(Clone, Debug, PartialEq)]
enum SheetKind {
    /// `transition_<high>_<low>`
    Transition { high: String, low: String },
    /// `overlay_<kind>`
    Overlay { kind: String },
    /// `decor_<biome>_<count>`, where `count` is the number of variants
    Decor { biome: String, variants: u8 },
}

/// A [TileSheetProvider] built from a list of sheet names. The name of each
/// sheet (minus any directory or extension) determines what's in it:
///
/// - `transition_<high>_<low>` holds transitions between two biomes. Tile 15
///   (all corners high) doubles as the interior tile for `<high>`, and tile 0
///   as the interior tile for `<low>`. The first sheet that mentions a biome
///   provides its interior tile.
/// - `overlay_<kind>` holds the tiles for one overlay kind
/// - `decor_<biome>_<n>` holds `n` decorative variants of a biome's interior
///   tile, in the first `n` slots
///
/// Because `_` separates the parts of a name, biome labels used with an
/// atlas can't contain underscores.
#[derive(Clone, Debug)]
pub struct Atlas {
    sheets: Vec<(String, SheetKind)>,
}

impl Atlas {
    /// The sheets that go with the default config
    pub const DEFAULT_SHEETS: &'static [&'static str] = &[
        "transition_grass_water.png",
        "transition_grass_desert.png",
        "transition_desert_water.png",
        "overlay_road.png",
        "overlay_river.png",
        "decor_grass_4.png",
    ];

    /// Build an atlas from a list of sheet names. Sheet IDs are assigned in
    /// list order. Fails if any name doesn't follow the naming convention.
    pub fn from_sheet_names<S: AsRef<str>>(
        names: impl IntoIterator<Item = S>,
    ) -> anyhow::Result<Self> {
        let sheets = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                let kind = Self::parse_sheet_name(name)
                    .with_context(|| format!("invalid sheet name {:?}", name))?;
                Ok((name.to_owned(), kind))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        if sheets.len() > u16::MAX as usize {
            bail!("too many sheets: {}", sheets.len());
        }
        Ok(Self { sheets })
    }

    /// Get the name of a sheet, as it was given to the atlas
    pub fn sheet_name(&self, id: SheetId) -> Option<&str> {
        self.sheets.get(id.0 as usize).map(|(name, _)| name.as_str())
    }

    /// Names of all sheets, in sheet ID order
    pub fn sheet_names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.sheets.iter().map(|(name, _)| name.as_str())
    }

    fn parse_sheet_name(name: &str) -> anyhow::Result<SheetKind> {
        let stem = Path::new(name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow!("no file name"))?;
        let (prefix, rest) = stem
            .split_once('_')
            .ok_or_else(|| anyhow!("expected <type>_<...>"))?;

        match prefix {
            "transition" => {
                let (high, low) = rest
                    .split_once('_')
                    .filter(|(high, low)| !high.is_empty() && !low.is_empty())
                    .ok_or_else(|| {
                        anyhow!("expected transition_<high>_<low>")
                    })?;
                if low.contains('_') {
                    bail!("expected transition_<high>_<low>");
                }
                if high == low {
                    bail!("transition from {:?} to itself", high);
                }
                Ok(SheetKind::Transition {
                    high: high.into(),
                    low: low.into(),
                })
            }
            "overlay" if !rest.is_empty() && !rest.contains('_') => {
                Ok(SheetKind::Overlay { kind: rest.into() })
            }
            "decor" => {
                let (biome, count) = rest
                    .split_once('_')
                    .filter(|(biome, _)| !biome.is_empty())
                    .ok_or_else(|| anyhow!("expected decor_<biome>_<count>"))?;
                let variants: u8 = count
                    .parse()
                    .with_context(|| format!("invalid count {:?}", count))?;
                if variants == 0 || variants as usize > SHEET_TILES {
                    bail!(
                        "variant count must be 1-{}, got {}",
                        SHEET_TILES,
                        variants
                    );
                }
                Ok(SheetKind::Decor {
                    biome: biome.into(),
                    variants,
                })
            }
            _ => bail!("unknown sheet type {:?}", prefix),
        }
    }

    /// Iterate over sheets along with their IDs
    fn indexed(&self) -> impl Iterator<Item = (SheetId, &SheetKind)> {
        self.sheets
            .iter()
            .enumerate()
            .map(|(i, (_, kind))| (SheetId(i as u16), kind))
    }
}

impl Default for Atlas {
    fn default() -> Self {
        // Panic here indicates a typo in the default list
        Self::from_sheet_names(Self::DEFAULT_SHEETS)
            .expect("invalid default sheet names")
    }
}

impl TileSheetProvider for Atlas {
    fn transition_pairs(&self) -> Vec<(String, String)> {
        self.sheets
            .iter()
            .filter_map(|(_, kind)| match kind {
                SheetKind::Transition { high, low } => {
                    Some((high.clone(), low.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn transition(
        &self,
        biome_a: &str,
        biome_b: &str,
    ) -> Option<TransitionSheet> {
        self.indexed().find_map(|(id, kind)| match kind {
            SheetKind::Transition { high, low }
                if (high == biome_a && low == biome_b)
                    || (high == biome_b && low == biome_a) =>
            {
                Some(TransitionSheet {
                    high: high.clone(),
                    tiles: TileHandle::sheet(id),
                })
            }
            _ => None,
        })
    }

    fn interior(&self, biome: &str) -> Option<InteriorTiles> {
        let canonical = self.indexed().find_map(|(id, kind)| match kind {
            SheetKind::Transition { high, .. } if high == biome => {
                Some(TileHandle::sheet(id)[SHEET_TILES - 1])
            }
            SheetKind::Transition { low, .. } if low == biome => {
                Some(TileHandle::sheet(id)[0])
            }
            _ => None,
        })?;
        let decorations = self
            .indexed()
            .find_map(|(id, kind)| match kind {
                SheetKind::Decor {
                    biome: decor_biome,
                    variants,
                } if decor_biome == biome => {
                    Some(TileHandle::sheet(id)[..*variants as usize].to_vec())
                }
                _ => None,
            })
            .unwrap_or_default();
        Some(InteriorTiles {
            canonical,
            decorations,
        })
    }

    fn overlay(&self, kind: &str) -> Option<[TileHandle; SHEET_TILES]> {
        self.indexed().find_map(|(id, sheet_kind)| match sheet_kind {
            SheetKind::Overlay { kind: overlay } if overlay == kind => {
                Some(TileHandle::sheet(id))
            }
            _ => None,
        })
    }
}

/// Transition tiles with the high biome resolved to an ID
#[derive(Clone, Debug)]
pub struct TransitionTiles {
    pub high: BiomeId,
    pub tiles: [TileHandle; SHEET_TILES],
}

/// All the tiles a generation run can ever ask for, resolved up front from a
/// provider. Building the library is where missing art gets caught, so once
/// generation starts, every lookup the compositors make is guaranteed to
/// succeed.
#[derive(Clone, Debug)]
pub struct TileLibrary {
    /// Indexed by biome ID
    interiors: Vec<InteriorTiles>,
    transitions: FnvHashMap<BiomePair, TransitionTiles>,
    /// Indexed by overlay ID
    overlays: Vec<[TileHandle; SHEET_TILES]>,
}

impl TileLibrary {
    pub fn resolve(
        catalogue: &BiomeCatalogue,
        overlay_kinds: &[String],
        provider: &dyn TileSheetProvider,
    ) -> Result<Self, ConfigError> {
        let interiors = catalogue
            .iter()
            .map(|biome| {
                provider.interior(&biome.label).ok_or_else(|| {
                    ConfigError::MissingInteriorTile(biome.label.clone())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut transitions = FnvHashMap::default();
        for (label_a, label_b) in provider.transition_pairs() {
            // Sheets for biomes this config doesn't use are fine, just
            // irrelevant
            let (a, b) = match (catalogue.id(&label_a), catalogue.id(&label_b))
            {
                (Ok(a), Ok(b)) if a != b => (a, b),
                _ => continue,
            };
            let pair = BiomePair::new(a, b);
            if transitions.contains_key(&pair) {
                continue;
            }
            let sheet = match provider.transition(&label_a, &label_b) {
                Some(sheet) => sheet,
                None => continue,
            };
            let high = catalogue
                .id(&sheet.high)
                .ok()
                .filter(|high| pair.contains(*high))
                .ok_or_else(|| ConfigError::InvalidHighBiome {
                    biome_a: label_a.clone(),
                    biome_b: label_b.clone(),
                    high: sheet.high.clone(),
                })?;
            transitions.insert(
                pair,
                TransitionTiles {
                    high,
                    tiles: sheet.tiles,
                },
            );
        }

        // A pair without art is only OK if repair can always break it up,
        // i.e. the losing side can be demoted
        let biomes: Vec<_> = catalogue.iter().collect();
        for (i, a) in biomes.iter().enumerate() {
            for b in &biomes[i + 1..] {
                let pair = BiomePair::new(a.id, b.id);
                let loser = catalogue.loser(a.id, b.id);
                if !transitions.contains_key(&pair)
                    && catalogue[loser].fallback.is_none()
                {
                    return Err(ConfigError::MissingTransition(
                        a.label.clone(),
                        b.label.clone(),
                    ));
                }
            }
        }

        let overlays = overlay_kinds
            .iter()
            .map(|kind| {
                provider.overlay(kind).ok_or_else(|| {
                    ConfigError::MissingOverlaySheet(kind.clone())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            interiors,
            transitions,
            overlays,
        })
    }

    /// Is there transition art for this pair?
    pub fn is_valid(&self, pair: BiomePair) -> bool {
        self.transitions.contains_key(&pair)
    }

    pub fn transition(&self, pair: BiomePair) -> Option<&TransitionTiles> {
        self.transitions.get(&pair)
    }

    pub fn interior(&self, biome: BiomeId) -> &InteriorTiles {
        &self.interiors[biome.index()]
    }

    pub fn overlay(&self, index: usize) -> &[TileHandle; SHEET_TILES] {
        &self.overlays[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;

    fn handle(sheet: u16, index: u8) -> TileHandle {
        TileHandle {
            sheet: SheetId(sheet),
            index,
        }
    }

    #[test]
    fn test_parse_names() {
        let atlas = Atlas::from_sheet_names(&[
            "tiles/transition_grass_water.png",
            "overlay_road",
            "decor_grass_3.png",
        ])
        .unwrap();
        assert_eq!(
            atlas.sheets.iter().map(|(_, kind)| kind).collect::<Vec<_>>(),
            vec![
                &SheetKind::Transition {
                    high: "grass".into(),
                    low: "water".into()
                },
                &SheetKind::Overlay {
                    kind: "road".into()
                },
                &SheetKind::Decor {
                    biome: "grass".into(),
                    variants: 3
                },
            ]
        );
        assert_eq!(
            atlas.sheet_name(SheetId(0)),
            Some("tiles/transition_grass_water.png")
        );
        assert_eq!(atlas.sheet_name(SheetId(3)), None);
        assert_eq!(atlas.sheet_names().len(), 3);
        assert_eq!(
            atlas.sheet_names().last(),
            Some("decor_grass_3.png")
        );
    }

    #[test]
    fn test_parse_names_invalid() {
        for name in &[
            "grass.png",
            "transition_grass.png",
            "transition_grass_grass.png",
            "transition_a_b_c.png",
            "overlay_.png",
            "decor_grass.png",
            "decor_grass_0.png",
            "decor_grass_17.png",
            "decor_grass_lots.png",
            "sprite_tree.png",
        ] {
            assert!(
                Atlas::from_sheet_names(&[name]).is_err(),
                "expected {:?} to be rejected",
                name
            );
        }
    }

    #[test]
    fn test_lookups() {
        let atlas = Atlas::default();
        let sheet = atlas.transition("water", "grass").unwrap();
        assert_eq!(sheet.high, "grass");
        assert_eq!(sheet.tiles[5], handle(0, 5));
        assert_eq!(atlas.transition("grass", "water"), Some(sheet));
        assert_eq!(atlas.transition("grass", "lava"), None);

        // First sheet that mentions the biome wins
        let grass = atlas.interior("grass").unwrap();
        assert_eq!(grass.canonical, handle(0, 15));
        assert_eq!(
            grass.decorations,
            vec![handle(5, 0), handle(5, 1), handle(5, 2), handle(5, 3)]
        );
        let water = atlas.interior("water").unwrap();
        assert_eq!(water.canonical, handle(0, 0));
        assert!(water.decorations.is_empty());
        assert_eq!(atlas.interior("desert").unwrap().canonical, handle(1, 0));
        assert_eq!(atlas.interior("lava"), None);

        assert_eq!(atlas.overlay("river"), Some(TileHandle::sheet(SheetId(4))));
        assert_eq!(atlas.overlay("rail"), None);
    }

    #[test]
    fn test_resolve_default() {
        let config = MapConfig::default();
        let catalogue = BiomeCatalogue::new(&config.biomes).unwrap();
        let kinds = vec!["road".to_owned(), "river".to_owned()];
        let library =
            TileLibrary::resolve(&catalogue, &kinds, &Atlas::default())
                .unwrap();
        let water = catalogue.id("water").unwrap();
        let grass = catalogue.id("grass").unwrap();
        let desert = catalogue.id("desert").unwrap();
        assert!(library.is_valid(BiomePair::new(water, grass)));
        assert!(library.is_valid(BiomePair::new(desert, water)));
        assert_eq!(
            library.transition(BiomePair::new(grass, water)).unwrap().high,
            grass
        );
        assert_eq!(library.overlay(1), &TileHandle::sheet(SheetId(4)));
    }

    #[test]
    fn test_resolve_missing_art() {
        let config = MapConfig::default();
        let catalogue = BiomeCatalogue::new(&config.biomes).unwrap();
        let kinds = vec!["road".to_owned()];

        // Desert has no sheets at all
        let atlas = Atlas::from_sheet_names(&[
            "transition_grass_water",
            "overlay_road",
        ])
        .unwrap();
        assert_eq!(
            TileLibrary::resolve(&catalogue, &kinds, &atlas).unwrap_err(),
            ConfigError::MissingInteriorTile("desert".into())
        );

        // Overlay sheet is missing
        let atlas = Atlas::from_sheet_names(&[
            "transition_grass_water",
            "transition_grass_desert",
        ])
        .unwrap();
        assert_eq!(
            TileLibrary::resolve(&catalogue, &kinds, &atlas).unwrap_err(),
            ConfigError::MissingOverlaySheet("road".into())
        );

        // Grass is the catch-all with no fallback, so water/grass edges
        // can't be repaired without art
        let atlas = Atlas::from_sheet_names(&[
            "transition_desert_water",
            "transition_grass_desert",
            "overlay_road",
        ])
        .unwrap();
        assert_eq!(
            TileLibrary::resolve(&catalogue, &kinds, &atlas).unwrap_err(),
            ConfigError::MissingTransition("water".into(), "grass".into())
        );
    }

    #[test]
    fn test_resolve_invalid_high() {
        struct BadProvider;

        impl TileSheetProvider for BadProvider {
            fn transition_pairs(&self) -> Vec<(String, String)> {
                vec![("grass".into(), "water".into())]
            }

            fn transition(&self, _: &str, _: &str) -> Option<TransitionSheet> {
                Some(TransitionSheet {
                    high: "desert".into(),
                    tiles: TileHandle::sheet(SheetId(0)),
                })
            }

            fn interior(&self, _: &str) -> Option<InteriorTiles> {
                Some(InteriorTiles {
                    canonical: handle(0, 0),
                    decorations: vec![],
                })
            }

            fn overlay(&self, _: &str) -> Option<[TileHandle; 16]> {
                None
            }
        }

        let config = MapConfig::default();
        let catalogue = BiomeCatalogue::new(&config.biomes).unwrap();
        assert_eq!(
            TileLibrary::resolve(&catalogue, &[], &BadProvider).unwrap_err(),
            ConfigError::InvalidHighBiome {
                biome_a: "grass".into(),
                biome_b: "water".into(),
                high: "desert".into(),
            }
        );
    }
}
