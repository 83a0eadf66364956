use crate::{
    map::{
        biome::{BiomeCatalogue, BiomeId, BiomePair},
        generate::{stage_mut, Generate, MapBuilder},
        grid::{Grid, GridPoint},
    },
    tiles::TileLibrary,
};
use log::{debug, warn};

/// Outcome of a repair run
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RepairStats {
    pub passes: u32,
    /// Total number of demotions, across all passes
    pub repaired: usize,
    /// Illegal edges left over after the last pass
    pub residual: usize,
}

/// Is this edge drawable? Edges between two corners of the same biome always
/// are, otherwise there has to be transition art for the pair.
fn is_legal(tiles: &TileLibrary, a: BiomeId, b: BiomeId) -> bool {
    a == b || tiles.is_valid(BiomePair::new(a, b))
}

/// Count the edges of a corner grid that have no transition art
pub fn illegal_edges(corners: &Grid<BiomeId>, tiles: &TileLibrary) -> usize {
    corners
        .edges()
        .filter(|(a, b)| !is_legal(tiles, corners[*a], corners[*b]))
        .count()
}

/// Repeatedly scan every corner edge, demoting the less dominant end of any
/// illegal edge to its fallback. Stops after a pass that changes nothing, or
/// after `max_passes`.
///
/// Edges are scanned row-major (for each corner, its east edge then its south
/// edge) and demotions take effect immediately, so a demotion can fix or
/// create problems for edges later in the same pass.
pub fn repair(
    corners: &mut Grid<BiomeId>,
    catalogue: &BiomeCatalogue,
    tiles: &TileLibrary,
    max_passes: u32,
) -> RepairStats {
    let edges: Vec<(GridPoint, GridPoint)> = corners.edges().collect();
    let mut stats = RepairStats::default();

    while stats.passes < max_passes {
        stats.passes += 1;
        let mut changes = 0;
        for &(a, b) in &edges {
            let (biome_a, biome_b) = (corners[a], corners[b]);
            if is_legal(tiles, biome_a, biome_b) {
                continue;
            }
            let loser = catalogue.loser(biome_a, biome_b);
            // Biomes with no fallback stay put; the edge is left illegal and
            // shows up in the residual count
            if let Some(fallback) = catalogue[loser].fallback {
                let point = if loser == biome_a { a } else { b };
                corners[point] = fallback;
                changes += 1;
            }
        }
        debug!("Repair pass {} made {} changes", stats.passes, changes);
        stats.repaired += changes;
        if changes == 0 {
            break;
        }
    }

    stats.residual = illegal_edges(corners, tiles);
    stats
}

/// Enforce that every pair of adjacent corners is either the same biome or
/// has transition art. This is bounded by a pass limit, so it might not fully
/// converge. Whatever's left is reported, and the tile compositor draws the
/// affected cells in a degraded mode.
#[derive(Debug)]
pub struct AdjacencyRepair;

impl Generate for AdjacencyRepair {
    fn generate(&self, map: &mut MapBuilder) -> anyhow::Result<()> {
        let corners = stage_mut(&mut map.corners, "corners")?;
        let stats = repair(
            corners,
            &map.catalogue,
            &map.tiles,
            map.config.repair.max_passes,
        );
        if stats.residual > 0 {
            warn!(
                "Adjacency repair didn't converge after {} passes, \
                {} illegal edges remain",
                stats.passes, stats.residual
            );
        }
        map.report.repair_passes = stats.passes;
        map.report.repaired_edges = stats.repaired;
        map.report.residual_illegal_edges = stats.residual;
        Ok(())
    }
}
