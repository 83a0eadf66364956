use crate::{
    config::SeparationConfig,
    error::ConfigError,
    map::{
        biome::{BiomeCatalogue, BiomeId},
        generate::{stage_mut, Generate, MapBuilder},
        grid::{Direction, Grid, GridPoint},
    },
};
use log::debug;
use std::iter;
use strum::IntoEnumIterator;

/// A [SeparationConfig] with its labels resolved
#[derive(Copy, Clone, Debug)]
pub struct SeparationRule {
    pub near: BiomeId,
    pub demote: BiomeId,
    /// What `demote` corners turn into
    pub replacement: BiomeId,
    pub distance: u32,
}

impl SeparationRule {
    pub fn resolve(
        config: &SeparationConfig,
        catalogue: &BiomeCatalogue,
    ) -> Result<Self, ConfigError> {
        let near = catalogue.id(&config.near)?;
        let demote = catalogue.id(&config.demote)?;
        let replacement = catalogue[demote]
            .fallback
            .ok_or_else(|| {
                ConfigError::MissingFallback(config.demote.clone())
            })?;
        Ok(Self {
            near,
            demote,
            replacement,
            distance: config.distance,
        })
    }

    /// Apply this rule to a grid. Distances are measured against the grid as
    /// it was before the rule started, so demotions don't cascade. Returns
    /// the number of demoted corners.
    pub fn apply(&self, corners: &mut Grid<BiomeId>) -> usize {
        let snapshot = corners.clone();
        let mut demoted = 0;
        for point in snapshot.points() {
            if snapshot[point] == self.demote
                && self.near_within(&snapshot, point)
            {
                corners[point] = self.replacement;
                demoted += 1;
            }
        }
        demoted
    }

    /// Is there a `near` corner within range of this point, along any axis?
    fn near_within(&self, corners: &Grid<BiomeId>, point: GridPoint) -> bool {
        Direction::iter().any(|direction| {
            iter::successors(point.step(direction), |p| p.step(direction))
                .take(self.distance as usize)
                .take_while(|p| corners.contains(*p))
                .any(|p| corners[p] == self.near)
        })
    }
}

/// Keep biomes that shouldn't touch at a distance from each other. This runs
/// before adjacency repair, and is stricter than it: repair only cares about
/// direct neighbors.
#[derive(Debug)]
pub struct SeparationPass;

impl Generate for SeparationPass {
    fn generate(&self, map: &mut MapBuilder) -> anyhow::Result<()> {
        let corners = stage_mut(&mut map.corners, "corners")?;
        for rule in &map.separations {
            let demoted = rule.apply(corners);
            debug!(
                "Demoted {} {} corners near {}",
                demoted,
                map.catalogue.label(rule.demote),
                map.catalogue.label(rule.near)
            );
            map.report.separated_corners += demoted;
        }
        Ok(())
    }
}
