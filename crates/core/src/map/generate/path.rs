use crate::{
    config::{AnchorRule, MapConfig, PathConfig},
    error::ConfigError,
    map::{
        biome::{BiomeCatalogue, BiomeId},
        generate::{overlay::OverlayKind, stage, Generate, MapBuilder},
        grid::{Grid, GridPoint},
        OverlayId, Route, RouteOutcome, IMPASSABLE_COST,
    },
};
use log::{debug, warn};
use pathfinding::prelude::{astar, bfs};
use rand::Rng;

/// Where a path endpoint may sit, with labels resolved
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Anchor {
    Anywhere,
    Biome(BiomeId),
    Edge,
    BiomeOrEdge(BiomeId),
}

impl Anchor {
    fn resolve(
        rule: &AnchorRule,
        catalogue: &BiomeCatalogue,
    ) -> Result<Self, ConfigError> {
        Ok(match rule {
            AnchorRule::None => Self::Anywhere,
            AnchorRule::Biome { biome } => Self::Biome(catalogue.id(biome)?),
            AnchorRule::Edge => Self::Edge,
            AnchorRule::BiomeOrEdge { biome } => {
                Self::BiomeOrEdge(catalogue.id(biome)?)
            }
        })
    }
}

/// A [PathConfig] with everything resolved and checked against the map
#[derive(Clone, Debug)]
pub struct PathRequest {
    pub kind: OverlayId,
    /// Label of the overlay kind, for logging
    pub label: String,
    pub start: GridPoint,
    pub end: GridPoint,
    pub wiggle: f64,
    pub anchor_start: Anchor,
    pub anchor_end: Anchor,
    /// Cost to step into a cell, indexed by the cell's biome ID
    pub costs: Vec<u32>,
}

impl PathRequest {
    pub fn resolve(
        config: &PathConfig,
        map_config: &MapConfig,
        catalogue: &BiomeCatalogue,
        overlay_kinds: &[OverlayKind],
    ) -> Result<Self, ConfigError> {
        let overlay = overlay_kinds
            .iter()
            .find(|kind| kind.label == config.kind)
            .ok_or_else(|| {
                ConfigError::UnknownOverlayKind(config.kind.clone())
            })?;

        for point in [config.start, config.end] {
            if point.x >= map_config.width || point.y >= map_config.height {
                return Err(ConfigError::PointOutOfBounds {
                    point,
                    width: map_config.width,
                    height: map_config.height,
                });
            }
        }

        // A zero cost would make the Manhattan heuristic overestimate
        let invalid_cost = |biome: &str, cost: u32| ConfigError::InvalidCost {
            kind: config.kind.clone(),
            biome: biome.into(),
            cost,
        };
        if config.default_cost == 0 {
            return Err(invalid_cost("*", config.default_cost));
        }
        let mut costs = vec![config.default_cost; catalogue.len()];
        for (label, cost) in &config.costs {
            let biome = catalogue.id(label)?;
            if *cost == 0 {
                return Err(invalid_cost(label, *cost));
            }
            costs[biome.index()] = *cost;
        }

        Ok(Self {
            kind: overlay.id,
            label: config.kind.clone(),
            start: config.start,
            end: config.end,
            wiggle: config.wiggle,
            anchor_start: Anchor::resolve(&config.anchor_start, catalogue)?,
            anchor_end: Anchor::resolve(&config.anchor_end, catalogue)?,
            costs,
        })
    }
}

/// Shortest-path search over the cells of a map. Cells are treated as a
/// single biome each (see [dominant_biome](super::composite::dominant_biome)),
/// which decides what it costs to step into them.
pub struct PathSearch<'a> {
    /// Dominant biome of each cell
    pub cells: &'a Grid<BiomeId>,
    /// Corner biomes, for anchor checks
    pub corners: &'a Grid<BiomeId>,
    /// Max number of nodes a single search may expand
    pub budget: usize,
    /// Jitter bound at a wiggle of 1.0
    pub max_jitter: u32,
}

impl<'a> PathSearch<'a> {
    /// Find a route for a path. Endpoints are first snapped to their
    /// anchors, then A* runs between them. Each time a node is expanded,
    /// every passable neighbor gets a random jitter added to its step cost,
    /// which is what makes routes meander. That means one RNG draw per
    /// passable neighbor of each expanded node, in [Direction] order, as
    /// long as the jitter bound is nonzero. A wiggle that rounds to no jitter
    /// doesn't touch the RNG at all.
    ///
    /// [Direction]: crate::map::grid::Direction
    pub fn find_route(
        &self,
        request: &PathRequest,
        rng: &mut impl Rng,
    ) -> Route {
        let failed = |outcome| Route {
            kind: request.kind,
            cells: Vec::new(),
            outcome,
        };

        let (start, end) = match (
            self.snap(request.anchor_start, request.start),
            self.snap(request.anchor_end, request.end),
        ) {
            (Some(start), Some(end)) => (start, end),
            _ => return failed(RouteOutcome::AnchorNotFound),
        };

        // Step costs stay within u32, route totals are summed as u64
        let jitter_bound = request.wiggle * self.max_jitter as f64;
        let jitter_max =
            (jitter_bound.round() as u32).min(u32::MAX - IMPASSABLE_COST);
        let mut expansions = 0;
        let mut exhausted = false;
        let result = astar(
            &start,
            |&cell| {
                expansions += 1;
                if expansions > self.budget {
                    exhausted = true;
                    return Vec::new();
                }
                self.cells
                    .neighbors(cell)
                    .filter_map(|next| {
                        let cost = request.costs[self.cells[next].index()];
                        if cost >= IMPASSABLE_COST {
                            return None;
                        }
                        let jitter = if jitter_max > 0 {
                            rng.gen_range(0..=jitter_max)
                        } else {
                            0
                        };
                        Some((next, u64::from(cost + jitter)))
                    })
                    .collect::<Vec<_>>()
            },
            |cell| u64::from(cell.manhattan_distance(end)),
            |cell| *cell == end,
        );

        match result {
            Some((cells, _)) => Route {
                kind: request.kind,
                cells,
                outcome: RouteOutcome::Carved,
            },
            None if exhausted => failed(RouteOutcome::BudgetExhausted),
            None => failed(RouteOutcome::Unreachable),
        }
    }

    /// Move a requested endpoint to the nearest cell that satisfies its
    /// anchor rule, by breadth-first search. Returns `None` if no cell on
    /// the map qualifies.
    pub fn snap(
        &self,
        anchor: Anchor,
        requested: GridPoint,
    ) -> Option<GridPoint> {
        if anchor == Anchor::Anywhere {
            return Some(requested);
        }
        let touches = |cell: GridPoint, biome: BiomeId| {
            cell.corners()
                .iter()
                .any(|corner| self.corners[*corner] == biome)
        };
        let accepts = |cell: &GridPoint| match anchor {
            Anchor::Anywhere => true,
            Anchor::Biome(biome) => touches(*cell, biome),
            Anchor::Edge => self.cells.is_boundary(*cell),
            Anchor::BiomeOrEdge(biome) => {
                touches(*cell, biome) || self.cells.is_boundary(*cell)
            }
        };
        bfs(&requested, |cell| self.cells.neighbors(*cell), accepts)
            .and_then(|path| path.last().copied())
    }
}

/// Mark every corner of every route cell in an overlay mask. Corners are
/// only ever set, so carving the same route again changes nothing.
pub fn carve(mask: &mut Grid<bool>, cells: &[GridPoint]) {
    for cell in cells {
        for corner in cell.corners() {
            mask[corner] = true;
        }
    }
}

/// Carve every configured path into its overlay mask, in declaration order.
/// Paths that can't be routed are skipped and reported.
#[derive(Debug)]
pub struct PathEngine;

impl Generate for PathEngine {
    fn generate(&self, map: &mut MapBuilder) -> anyhow::Result<()> {
        let config = map.config;
        let search = PathSearch {
            cells: stage(&map.cell_biomes, "cell biomes")?,
            corners: stage(&map.corners, "corners")?,
            budget: config.search.expansions_per_cell as usize
                * config.width as usize
                * config.height as usize,
            max_jitter: config.search.max_jitter,
        };

        for request in &map.paths {
            let route = search.find_route(request, &mut map.rng);
            match route.outcome {
                RouteOutcome::Carved => {
                    debug!(
                        "Carved {} path of {} cells",
                        request.label,
                        route.cells.len()
                    );
                    let mask = &mut map.masks[request.kind.index()];
                    carve(&mut mask.corners, &route.cells);
                    map.report.carved_paths += 1;
                }
                outcome => {
                    warn!(
                        "Skipping {} path from {} to {}: {}",
                        request.label, request.start, request.end, outcome
                    );
                    map.report.unreachable_paths += 1;
                }
            }
            map.routes.push(route);
        }
        Ok(())
    }
}
