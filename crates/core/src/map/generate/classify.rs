use crate::map::{
    generate::{Generate, MapBuilder},
    grid::Grid,
};
use log::debug;

/// Assign a biome to every corner of the map by running the biome table
/// against the noise field. Corners are sampled at their integer lattice
/// coordinates.
#[derive(Debug)]
pub struct BiomeClassifier;

impl Generate for BiomeClassifier {
    fn generate(&self, map: &mut MapBuilder) -> anyhow::Result<()> {
        let catalogue = &map.catalogue;
        let noise = &map.noise;
        let corners = Grid::from_fn(
            map.config.width + 1,
            map.config.height + 1,
            |point| catalogue.classify(noise, point.as_f64()),
        );
        debug!("Classified {} corners", corners.len());
        map.corners = Some(corners);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{MapConfig, Seed},
        tiles::Atlas,
    };

    fn classify(config: &MapConfig) -> Grid<crate::map::biome::BiomeId> {
        let mut builder = MapBuilder::new(config, &Atlas::default()).unwrap();
        BiomeClassifier.generate(&mut builder).unwrap();
        builder.corners.unwrap()
    }

    #[test]
    fn test_dimensions() {
        let config = MapConfig {
            width: 10,
            height: 4,
            paths: vec![],
            ..Default::default()
        };
        let corners = classify(&config);
        assert_eq!(corners.width(), 11);
        assert_eq!(corners.height(), 5);
    }

    #[test]
    fn test_deterministic() {
        let config = MapConfig::default();
        assert_eq!(classify(&config), classify(&config));
    }

    #[test]
    fn test_seed_matters() {
        let a = MapConfig::default();
        let b = MapConfig {
            seed: Seed::Int(1234),
            ..Default::default()
        };
        assert_ne!(classify(&a), classify(&b));
    }
}
