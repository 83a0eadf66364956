use crate::{
    config::{OverlayConfig, SuppressRule},
    error::ConfigError,
    map::{
        biome::{BiomeCatalogue, BiomeId},
        generate::{stage, Generate, MapBuilder},
        grid::{CornerCode, Grid, GridPoint},
        OverlayId, OverlayMask, OverlayTile,
    },
    tiles::TileLibrary,
};
use log::debug;

/// An overlay kind with its suppression rules resolved
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayKind {
    pub id: OverlayId,
    pub label: String,
    pub suppress: Vec<Suppression>,
}

/// Don't draw an overlay on a cell where at least `at_least` of the 4
/// ground corners are `biome`
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Suppression {
    pub biome: BiomeId,
    pub at_least: u8,
}

impl OverlayKind {
    /// Resolve every overlay kind. IDs are assigned in declaration order,
    /// which is also draw order.
    pub fn resolve_all(
        configs: &[OverlayConfig],
        catalogue: &BiomeCatalogue,
    ) -> Result<Vec<Self>, ConfigError> {
        let mut kinds: Vec<Self> = Vec::with_capacity(configs.len());
        for (i, config) in configs.iter().enumerate() {
            if kinds.iter().any(|kind| kind.label == config.kind) {
                return Err(ConfigError::DuplicateOverlayKind(
                    config.kind.clone(),
                ));
            }
            let suppress = config
                .suppress
                .iter()
                .map(|rule| match rule {
                    SuppressRule::GroundCorners { biome, at_least } => {
                        Ok(Suppression {
                            biome: catalogue.id(biome)?,
                            at_least: *at_least,
                        })
                    }
                })
                .collect::<Result<_, ConfigError>>()?;
            kinds.push(Self {
                id: OverlayId::new(i),
                label: config.kind.clone(),
                suppress,
            });
        }
        Ok(kinds)
    }

    fn is_suppressed(&self, corners: &Grid<BiomeId>, cell: GridPoint) -> bool {
        self.suppress.iter().any(|rule| {
            let matching = cell
                .corners()
                .iter()
                .filter(|corner| corners[**corner] == rule.biome)
                .count();
            matching >= rule.at_least as usize
        })
    }
}

/// Turn carved overlay masks into tiles. Kinds are drawn in order, and the
/// first kind to draw on a cell claims it. A kind that is suppressed on a
/// cell doesn't claim it, so a later kind can still draw there.
pub fn composite_overlays(
    kinds: &[OverlayKind],
    masks: &[OverlayMask],
    corners: &Grid<BiomeId>,
    tiles: &TileLibrary,
) -> (Grid<Option<OverlayTile>>, usize) {
    let mut overlays: Grid<Option<OverlayTile>> =
        Grid::filled(corners.width() - 1, corners.height() - 1, None);
    let mut suppressed = 0;

    for kind in kinds {
        let mask = &masks[kind.id.index()].corners;
        for cell in overlays.points() {
            if overlays[cell].is_some() {
                continue;
            }
            let code =
                CornerCode::from_corners(|corner| mask[cell.corner(corner)]);
            if code.is_empty() {
                continue;
            }
            if kind.is_suppressed(corners, cell) {
                suppressed += 1;
                continue;
            }
            overlays[cell] = Some(OverlayTile {
                kind: kind.id,
                code,
                tile: tiles.overlay(kind.id.index())[code.index()],
            });
        }
    }
    (overlays, suppressed)
}

/// Composite every overlay kind over the base terrain
#[derive(Debug)]
pub struct OverlayCompositor;

impl Generate for OverlayCompositor {
    fn generate(&self, map: &mut MapBuilder) -> anyhow::Result<()> {
        let corners = stage(&map.corners, "corners")?;
        let (overlays, suppressed) = composite_overlays(
            &map.overlay_kinds,
            &map.masks,
            corners,
            &map.tiles,
        );
        debug!(
            "Drew {} overlay tiles, suppressed {}",
            overlays.values().filter(|tile| tile.is_some()).count(),
            suppressed
        );
        map.report.suppressed_overlay_cells = suppressed;
        map.overlays = Some(overlays);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::MapConfig,
        map::generate::path::carve,
        tiles::{Atlas, SheetId, TileHandle},
    };

    struct Setup {
        kinds: Vec<OverlayKind>,
        tiles: TileLibrary,
        water: BiomeId,
        grass: BiomeId,
    }

    /// Default config: road (suppressed on any water corner) draws before
    /// river (suppressed on 2+ water corners)
    fn setup() -> Setup {
        let config = MapConfig::default();
        let catalogue = BiomeCatalogue::new(&config.biomes).unwrap();
        let kinds =
            OverlayKind::resolve_all(&config.overlays, &catalogue).unwrap();
        let labels: Vec<String> =
            kinds.iter().map(|kind| kind.label.clone()).collect();
        let tiles = TileLibrary::resolve(&catalogue, &labels, &Atlas::default())
            .unwrap();
        Setup {
            kinds,
            tiles,
            water: catalogue.id("water").unwrap(),
            grass: catalogue.id("grass").unwrap(),
        }
    }

    fn masks(
        kinds: &[OverlayKind],
        width: u32,
        height: u32,
    ) -> Vec<OverlayMask> {
        kinds
            .iter()
            .map(|kind| OverlayMask {
                kind: kind.id,
                corners: Grid::filled(width + 1, height + 1, false),
            })
            .collect()
    }

    #[test]
    fn test_resolve() {
        let setup = setup();
        assert_eq!(setup.kinds.len(), 2);
        assert_eq!(setup.kinds[0].label, "road");
        assert_eq!(setup.kinds[1].id, OverlayId::new(1));
        assert_eq!(
            setup.kinds[1].suppress,
            vec![Suppression {
                biome: setup.water,
                at_least: 2
            }]
        );

        let config = MapConfig::default();
        let catalogue = BiomeCatalogue::new(&config.biomes).unwrap();
        let mut duplicated = config.overlays.clone();
        duplicated.push(config.overlays[0].clone());
        assert_eq!(
            OverlayKind::resolve_all(&duplicated, &catalogue).unwrap_err(),
            ConfigError::DuplicateOverlayKind("road".into())
        );

        let mut unknown = config.overlays;
        unknown[0].suppress = vec![SuppressRule::GroundCorners {
            biome: "lava".into(),
            at_least: 1,
        }];
        assert_eq!(
            OverlayKind::resolve_all(&unknown, &catalogue).unwrap_err(),
            ConfigError::UnknownBiome("lava".into())
        );
    }

    #[test]
    fn test_corner_codes() {
        let setup = setup();
        let corners = Grid::filled(4, 4, setup.grass);
        let mut masks = masks(&setup.kinds, 3, 3);
        carve(&mut masks[0].corners, &[GridPoint::new(1, 1)]);

        let (overlays, suppressed) =
            composite_overlays(&setup.kinds, &masks, &corners, &setup.tiles);
        assert_eq!(suppressed, 0);
        // The carved cell is full, and its 8 neighbors each get a partial
        // tile
        let codes: Vec<u8> = overlays
            .values()
            .map(|tile| tile.map(|tile| tile.code.bits()).unwrap_or(0))
            .collect();
        assert_eq!(codes, vec![2, 6, 4, 3, 15, 12, 1, 9, 8]);
        assert_eq!(
            overlays[GridPoint::new(1, 1)].unwrap().tile,
            TileHandle {
                sheet: SheetId(3),
                index: 15
            }
        );
    }

    #[test]
    fn test_precedence() {
        let setup = setup();
        let corners = Grid::filled(3, 2, setup.grass);
        let mut masks = masks(&setup.kinds, 2, 1);
        carve(&mut masks[0].corners, &[GridPoint::new(0, 0)]);
        carve(
            &mut masks[1].corners,
            &[GridPoint::new(0, 0), GridPoint::new(1, 0)],
        );

        let (overlays, _) =
            composite_overlays(&setup.kinds, &masks, &corners, &setup.tiles);
        let [road, river] = [OverlayId::new(0), OverlayId::new(1)];
        // Road claims both cells (its carve leaks into the neighbor)
        assert_eq!(overlays[GridPoint::new(0, 0)].unwrap().kind, road);
        assert_eq!(overlays[GridPoint::new(1, 0)].unwrap().kind, road);
        assert_eq!(
            overlays[GridPoint::new(1, 0)].unwrap().code.bits(),
            0b1100
        );
    }

    #[test]
    fn test_suppression() {
        let setup = setup();
        let (water, grass) = (setup.water, setup.grass);
        // Cell (0, 0) has 1 water corner, cell (1, 0) has 2
        let corners = Grid::from_fn(3, 2, |p| {
            if p == GridPoint::new(1, 0) || p == GridPoint::new(2, 0) {
                water
            } else {
                grass
            }
        });
        let mut masks = masks(&setup.kinds, 2, 1);
        for mask in &mut masks {
            carve(
                &mut mask.corners,
                &[GridPoint::new(0, 0), GridPoint::new(1, 0)],
            );
        }

        let (overlays, suppressed) =
            composite_overlays(&setup.kinds, &masks, &corners, &setup.tiles);
        // Road is out on both cells. River gets the one with a single water
        // corner, but is suppressed on the other.
        assert_eq!(
            overlays[GridPoint::new(0, 0)].unwrap().kind,
            OverlayId::new(1)
        );
        assert_eq!(overlays[GridPoint::new(1, 0)], None);
        assert_eq!(suppressed, 3);
    }
}
