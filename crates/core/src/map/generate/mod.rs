mod classify;
mod composite;
pub mod noise;
mod overlay;
mod path;
mod repair;
mod separate;

use crate::{
    config::MapConfig,
    map::{
        biome::{BiomeCatalogue, BiomeId},
        generate::{
            classify::BiomeClassifier,
            composite::TileCompositor,
            noise::NoiseField,
            overlay::{OverlayCompositor, OverlayKind},
            path::{PathEngine, PathRequest},
            repair::AdjacencyRepair,
            separate::{SeparationPass, SeparationRule},
        },
        grid::Grid,
        BaseTile, GenerationReport, OverlayMask, OverlayTile, Route, TileMap,
    },
    tiles::{TileLibrary, TileSheetProvider},
    timed,
};
use anyhow::{anyhow, Context};
use log::info;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use std::fmt::Debug;

/// A container for generating a new map. This applies a series of generators
/// in sequence, each of which fills in one more layer. Fields are public to
/// allow for disjoint borrowing of multiple fields at once.
///
/// Everything that can be checked against the config is resolved in
/// [MapBuilder::new]: biome labels become IDs, tile art is looked up, path
/// endpoints are bounds-checked. Once a builder exists, generation itself
/// can't fail on account of bad input.
pub struct MapBuilder<'a> {
    /// This config deterministically controls generation. Please **do not
    /// mutate the config**.
    pub config: &'a MapConfig,

    pub catalogue: BiomeCatalogue,

    /// Every tile the compositors could ask for
    pub tiles: TileLibrary,

    /// Overlay kinds, in draw order
    pub overlay_kinds: Vec<OverlayKind>,

    pub separations: Vec<SeparationRule>,

    /// Paths to carve, in carving order
    pub paths: Vec<PathRequest>,

    /// The one shared RNG stream. Only path jitter draws from it, in path
    /// declaration order. Anything else that needs randomness uses a
    /// per-cell hash instead, so it doesn't disturb the stream.
    pub rng: Pcg64,

    pub noise: NoiseField,

    /// Corner biomes. Initialized by [BiomeClassifier], then mutated in
    /// place by [SeparationPass] and [AdjacencyRepair].
    pub corners: Option<Grid<BiomeId>>,

    /// Dominant biome of each cell. Initialized by [TileCompositor].
    pub cell_biomes: Option<Grid<BiomeId>>,

    /// Base terrain tiles. Initialized by [TileCompositor].
    pub base: Option<Grid<BaseTile>>,

    /// One carve mask per overlay kind, indexed by
    /// [OverlayId](crate::map::OverlayId). These start out empty and are
    /// filled in by [PathEngine].
    pub masks: Vec<OverlayMask>,

    /// Search results, in carving order. Populated by [PathEngine].
    pub routes: Vec<Route>,

    /// Composited overlay tiles. Initialized by [OverlayCompositor].
    pub overlays: Option<Grid<Option<OverlayTile>>>,

    pub report: GenerationReport,
}

impl<'a> MapBuilder<'a> {
    /// Resolve a config against a tile provider. Any structural problem
    /// with the config comes back as a
    /// [ConfigError](crate::ConfigError).
    pub fn new(
        config: &'a MapConfig,
        provider: &dyn TileSheetProvider,
    ) -> anyhow::Result<Self> {
        let catalogue = BiomeCatalogue::new(&config.biomes)?;
        let overlay_kinds =
            OverlayKind::resolve_all(&config.overlays, &catalogue)?;
        let kind_labels: Vec<String> =
            overlay_kinds.iter().map(|kind| kind.label.clone()).collect();
        let tiles = TileLibrary::resolve(&catalogue, &kind_labels, provider)?;
        let separations = config
            .separations
            .iter()
            .map(|separation| SeparationRule::resolve(separation, &catalogue))
            .collect::<Result<Vec<_>, _>>()?;
        let paths = config
            .paths
            .iter()
            .map(|path| {
                PathRequest::resolve(path, config, &catalogue, &overlay_kinds)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let seed = config.seed.to_u64();
        let noise = NoiseField::new(
            seed,
            config.noise,
            config.width.max(config.height),
            catalogue.seed_offsets(),
        );
        let masks = overlay_kinds
            .iter()
            .map(|kind| OverlayMask {
                kind: kind.id,
                corners: Grid::filled(
                    config.width + 1,
                    config.height + 1,
                    false,
                ),
            })
            .collect();

        info!(
            "Initialized {}x{} map with {} biomes, {} overlay kinds, {} paths",
            config.width,
            config.height,
            catalogue.len(),
            overlay_kinds.len(),
            paths.len()
        );
        Ok(Self {
            config,
            catalogue,
            tiles,
            overlay_kinds,
            separations,
            paths,
            rng: Pcg64::seed_from_u64(seed),
            noise,
            corners: None,
            cell_biomes: None,
            base: None,
            masks,
            routes: Vec::new(),
            overlays: None,
            report: GenerationReport::default(),
        })
    }

    /// Generate a map by running each generation step sequentially. Must be
    /// run from a blank slate.
    pub fn generate_map(mut self) -> anyhow::Result<TileMap> {
        // The order here is very important!
        self.apply_generator(BiomeClassifier)?;
        self.apply_generator(SeparationPass)?;
        self.apply_generator(AdjacencyRepair)?;
        self.apply_generator(TileCompositor)?;
        self.apply_generator(PathEngine)?;
        self.apply_generator(OverlayCompositor)?;

        let corners = take_stage(self.corners, "corners")?;
        for biome in self.catalogue.iter() {
            let count = corners.values().filter(|id| **id == biome.id).count();
            info!("{}: {} corners", biome.label, count);
            self.report.biome_counts.insert(biome.label.clone(), count);
        }
        info!("Generation report: {:?}", self.report);

        Ok(TileMap::from_layers(
            self.config.clone(),
            corners,
            take_stage(self.base, "base tiles")?,
            self.masks,
            take_stage(self.overlays, "overlay tiles")?,
            self.routes,
            self.report,
        ))
    }

    /// A helper to run a generation step on this builder.
    fn apply_generator(
        &mut self,
        generator: impl Debug + Generate,
    ) -> anyhow::Result<()> {
        timed!(&format!("{:?}", generator), generator.generate(self))
            .with_context(|| format!("error in {:?}", generator))
    }
}

/// Get a reference to a layer that an earlier step should have initialized.
/// This is a free function rather than a method so that callers can still
/// mutably borrow other fields of the builder.
fn stage<'b, T>(value: &'b Option<T>, name: &str) -> anyhow::Result<&'b T> {
    value
        .as_ref()
        .ok_or_else(|| anyhow!("{} not initialized", name))
}

/// Mutable version of [stage]
fn stage_mut<'b, T>(
    value: &'b mut Option<T>,
    name: &str,
) -> anyhow::Result<&'b mut T> {
    value
        .as_mut()
        .ok_or_else(|| anyhow!("{} not initialized", name))
}

/// Owned version of [stage]
fn take_stage<T>(value: Option<T>, name: &str) -> anyhow::Result<T> {
    value.ok_or_else(|| anyhow!("{} not initialized", name))
}

/// A type that generates one layer of the map. Generators are chained
/// together, each one reading the layers before it and adding its own.
trait Generate {
    /// Apply some generation step to the given map. Any failure here should
    /// be considered an internal failure, meaning a bug in the code, rather
    /// than anything invalid about the input. Input problems are caught
    /// when the builder is created.
    fn generate(&self, map: &mut MapBuilder) -> anyhow::Result<()>;
}
