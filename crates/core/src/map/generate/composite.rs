use crate::{
    map::{
        biome::{BiomeCatalogue, BiomeId, BiomePair},
        generate::{noise::NoiseField, stage, Generate, MapBuilder},
        grid::{CornerCode, Grid, GridPoint},
        BaseTile,
    },
    tiles::TileLibrary,
    util::{
        self,
        hash::{self, HashPurpose},
    },
};
use log::{debug, warn};

/// Everything needed to pick the tile for one cell
pub struct CellCompositor<'a> {
    pub catalogue: &'a BiomeCatalogue,
    pub tiles: &'a TileLibrary,
    pub noise: &'a NoiseField,
    pub seed: u64,
}

impl<'a> CellCompositor<'a> {
    /// Pick the base tile for a cell, from its 4 corner biomes.
    pub fn composite(
        &self,
        corners: &Grid<BiomeId>,
        cell: GridPoint,
    ) -> BaseTile {
        let biomes = cell.corners().map(|corner| corners[corner]);
        let distinct = util::distinct(&biomes);

        match distinct.as_slice() {
            [biome] => self.interior(cell, *biome),
            [a, b] => {
                let pair = BiomePair::new(*a, *b);
                match self.tiles.transition(pair) {
                    Some(transition) => {
                        let code = CornerCode::from_corners(|corner| {
                            corners[cell.corner(corner)] == transition.high
                        });
                        BaseTile::Transition {
                            pair,
                            code,
                            tile: transition.tiles[code.index()],
                        }
                    }
                    // Repair didn't get to this pair
                    None => self.fallback(&biomes),
                }
            }
            _ => self.fallback(&biomes),
        }
    }

    /// Tile for a cell that's all one biome. Decoration needs two things to
    /// line up: the cell has to sit inside a noise patch, and then it has to
    /// win a density roll. The patch noise makes decorations clump together
    /// rather than being sprinkled uniformly.
    fn interior(&self, cell: GridPoint, biome: BiomeId) -> BaseTile {
        let interior = self.tiles.interior(biome);
        let decoration = match self.catalogue[biome].decoration {
            Some(decoration) if !interior.decorations.is_empty() => decoration,
            _ => {
                return BaseTile::Interior {
                    biome,
                    tile: interior.canonical,
                }
            }
        };

        let patch = self.noise.evaluate(
            cell.center(),
            decoration.frequency,
            decoration.seed_offset,
        );
        let salt = biome.index() as u64;
        let roll = hash::unit_interval(hash::cell_hash(
            self.seed,
            cell,
            HashPurpose::DecorationDensity,
            salt,
        ));
        if patch > decoration.patch_threshold && roll < decoration.density {
            let variant = hash::cell_hash(
                self.seed,
                cell,
                HashPurpose::DecorationVariant,
                salt,
            ) % interior.decorations.len() as u64;
            BaseTile::Decorated {
                biome,
                tile: interior.decorations[variant as usize],
            }
        } else {
            BaseTile::Interior {
                biome,
                tile: interior.canonical,
            }
        }
    }

    /// Degraded mode: draw the most common corner biome as if the cell were
    /// all that biome. Ties go to whichever comes first in NW, NE, SW, SE
    /// order.
    fn fallback(&self, biomes: &[BiomeId; 4]) -> BaseTile {
        // A 4-element slice always has a majority
        let biome = util::majority(biomes).unwrap_or(biomes[0]);
        BaseTile::Fallback {
            biome,
            tile: self.tiles.interior(biome).canonical,
        }
    }
}

/// The biome that represents a whole cell, for anything that needs to treat
/// cells as a single biome (e.g. path costs). This is the most common corner
/// biome, with ties going to the first one in NW, NE, SW, SE order.
pub fn dominant_biome(corners: &Grid<BiomeId>, cell: GridPoint) -> BiomeId {
    let biomes = cell.corners().map(|corner| corners[corner]);
    util::majority(&biomes).unwrap_or(biomes[0])
}

/// Pick a base terrain tile for every cell, based on its 4 corners.
#[derive(Debug)]
pub struct TileCompositor;

impl Generate for TileCompositor {
    fn generate(&self, map: &mut MapBuilder) -> anyhow::Result<()> {
        let corners = stage(&map.corners, "corners")?;
        let compositor = CellCompositor {
            catalogue: &map.catalogue,
            tiles: &map.tiles,
            noise: &map.noise,
            seed: map.config.seed.to_u64(),
        };
        let (width, height) = (map.config.width, map.config.height);
        let base = Grid::from_fn(width, height, |cell| {
            compositor.composite(corners, cell)
        });
        let cell_biomes =
            Grid::from_fn(width, height, |cell| dominant_biome(corners, cell));

        let mut fallback_cells = 0;
        let mut decorated_cells = 0;
        for tile in base.values() {
            match tile {
                BaseTile::Fallback { .. } => fallback_cells += 1,
                BaseTile::Decorated { .. } => decorated_cells += 1,
                _ => {}
            }
        }
        if fallback_cells > 0 {
            warn!("{} cells drawn with a fallback tile", fallback_cells);
        }
        debug!("Decorated {} cells", decorated_cells);

        map.report.fallback_cells = fallback_cells;
        map.report.decorated_cells = decorated_cells;
        map.base = Some(base);
        map.cell_biomes = Some(cell_biomes);
        Ok(())
    }
}
