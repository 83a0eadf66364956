use crate::{
    config::{BiomeConfig, BiomeRule, DecorationConfig},
    error::ConfigError,
    map::generate::noise::NoiseField,
};
use derive_more::Display;
use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, ops::Index};

/// A handle to one biome in a [BiomeCatalogue]. IDs are assigned in
/// declaration order, so a lower ID means the biome was declared earlier.
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[display(fmt = "{}", _0)]
pub struct BiomeId(u16);

impl BiomeId {
    pub const fn new(index: usize) -> Self {
        Self(index as u16)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An unordered pair of biomes. `BiomePair::new(a, b) == BiomePair::new(b, a)`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BiomePair(BiomeId, BiomeId);

impl BiomePair {
    pub fn new(a: BiomeId, b: BiomeId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// Both members, lower ID first
    pub fn biomes(self) -> [BiomeId; 2] {
        [self.0, self.1]
    }

    pub fn contains(self, biome: BiomeId) -> bool {
        self.0 == biome || self.1 == biome
    }

    /// Get the member of the pair that isn't the given one
    pub fn other(self, biome: BiomeId) -> BiomeId {
        if self.0 == biome {
            self.1
        } else {
            self.0
        }
    }
}

/// A fully resolved biome. Fallbacks are stored as IDs, so following a
/// fallback chain never has to go through a label lookup.
#[derive(Clone, Debug)]
pub struct Biome {
    pub id: BiomeId,
    pub label: String,
    pub priority: u32,
    pub fallback: Option<BiomeId>,
    pub rule: BiomeRule,
    pub decoration: Option<DecorationConfig>,
}

impl Biome {
    /// Does this biome's rule match a sample point?
    fn matches(&self, noise: &NoiseField, point: [f64; 2]) -> bool {
        match self.rule {
            BiomeRule::Always => true,
            BiomeRule::NoiseBelow {
                frequency,
                seed_offset,
                threshold,
            } => noise.evaluate(point, frequency, seed_offset) < threshold,
            BiomeRule::NoiseAbove {
                frequency,
                seed_offset,
                threshold,
            } => noise.evaluate(point, frequency, seed_offset) > threshold,
        }
    }
}

/// The ordered biome table. Classification walks the table top-down and
/// takes the first biome whose rule matches. The last biome is always the
/// catch-all, so every point gets classified.
#[derive(Clone, Debug)]
pub struct BiomeCatalogue {
    biomes: IndexMap<String, Biome, FnvBuildHasher>,
}

impl BiomeCatalogue {
    /// Build a catalogue from config. Fails if labels are duplicated, the
    /// catch-all is missing/misplaced, or any fallback chain is broken.
    pub fn new(configs: &[BiomeConfig]) -> Result<Self, ConfigError> {
        let mut biomes: IndexMap<String, Biome, FnvBuildHasher> =
            IndexMap::default();

        // First pass registers every label, so fallbacks can point forward
        for (i, config) in configs.iter().enumerate() {
            if biomes.contains_key(&config.label) {
                return Err(ConfigError::DuplicateBiome(config.label.clone()));
            }
            biomes.insert(
                config.label.clone(),
                Biome {
                    id: BiomeId::new(i),
                    label: config.label.clone(),
                    priority: config.priority,
                    fallback: None,
                    rule: config.rule,
                    decoration: config.decoration,
                },
            );
        }

        for config in configs {
            if let Some(fallback) = &config.fallback {
                let fallback_id = biomes
                    .get(fallback)
                    .map(|biome| biome.id)
                    .ok_or_else(|| {
                        ConfigError::UnknownBiome(fallback.clone())
                    })?;
                // Safe because we inserted every label above
                if let Some(biome) = biomes.get_mut(&config.label) {
                    biome.fallback = Some(fallback_id);
                }
            }
        }

        let catalogue = Self { biomes };
        catalogue.check_catch_all()?;
        catalogue.check_fallback_chains()?;
        Ok(catalogue)
    }

    fn check_catch_all(&self) -> Result<(), ConfigError> {
        let mut catch_alls = self
            .biomes
            .values()
            .filter(|biome| biome.rule == BiomeRule::Always);
        let catch_all = catch_alls.next().ok_or(ConfigError::MissingCatchAll)?;
        if let Some(other) = catch_alls.next() {
            return Err(ConfigError::MultipleCatchAll(
                catch_all.label.clone(),
                other.label.clone(),
            ));
        }
        // Anything after the catch-all could never be classified
        if catch_all.id.index() != self.biomes.len() - 1 {
            return Err(ConfigError::CatchAllNotLast(catch_all.label.clone()));
        }
        Ok(())
    }

    /// Make sure every fallback chain terminates. Each step of a chain
    /// visits a new biome, so any chain longer than the catalogue must have
    /// looped.
    fn check_fallback_chains(&self) -> Result<(), ConfigError> {
        for biome in self.biomes.values() {
            let mut current = biome.fallback;
            let mut steps = 0;
            while let Some(id) = current {
                steps += 1;
                if id == biome.id || steps > self.biomes.len() {
                    return Err(ConfigError::FallbackCycle(biome.label.clone()));
                }
                current = self[id].fallback;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    /// Iterate over all biomes, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Biome> {
        self.biomes.values()
    }

    pub fn get(&self, id: BiomeId) -> Option<&Biome> {
        self.biomes.get_index(id.index()).map(|(_, biome)| biome)
    }

    /// Look up a biome by label
    pub fn id(&self, label: &str) -> Result<BiomeId, ConfigError> {
        self.biomes
            .get(label)
            .map(|biome| biome.id)
            .ok_or_else(|| ConfigError::UnknownBiome(label.into()))
    }

    pub fn label(&self, id: BiomeId) -> &str {
        &self[id].label
    }

    /// Every seed offset referenced by a biome rule or decoration, so the
    /// noise field can be built up front
    pub fn seed_offsets(&self) -> Vec<u32> {
        let mut offsets = Vec::new();
        for biome in self.iter() {
            match biome.rule {
                BiomeRule::Always => {}
                BiomeRule::NoiseBelow { seed_offset, .. }
                | BiomeRule::NoiseAbove { seed_offset, .. } => {
                    offsets.push(seed_offset)
                }
            }
            if let Some(decoration) = biome.decoration {
                offsets.push(decoration.seed_offset);
            }
        }
        offsets
    }

    /// Classify a sample point: the first biome whose rule matches wins.
    pub fn classify(&self, noise: &NoiseField, point: [f64; 2]) -> BiomeId {
        self.iter()
            .find(|biome| biome.matches(noise, point))
            .map(|biome| biome.id)
            // The catch-all is validated to be last, so this only triggers
            // if the catalogue was somehow built without one
            .unwrap_or_else(|| BiomeId::new(self.biomes.len() - 1))
    }

    /// Compare the dominance of two biomes. [Ordering::Less] means `a` is
    /// more dominant. A lower priority value is more dominant, and equal
    /// priorities go to whichever biome was declared first.
    pub fn dominance(&self, a: BiomeId, b: BiomeId) -> Ordering {
        self[a]
            .priority
            .cmp(&self[b].priority)
            .then_with(|| a.cmp(&b))
    }

    /// Of two biomes, get the one that loses a dominance contest
    pub fn loser(&self, a: BiomeId, b: BiomeId) -> BiomeId {
        match self.dominance(a, b) {
            Ordering::Greater => a,
            _ => b,
        }
    }
}

impl Index<BiomeId> for BiomeCatalogue {
    type Output = Biome;

    fn index(&self, id: BiomeId) -> &Biome {
        self.get(id)
            .unwrap_or_else(|| panic!("biome {} not in catalogue", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;

    fn biome(
        label: &str,
        priority: u32,
        fallback: Option<&str>,
        rule: BiomeRule,
    ) -> BiomeConfig {
        BiomeConfig {
            label: label.into(),
            priority,
            fallback: fallback.map(String::from),
            rule,
            decoration: None,
            color: "#000000".into(),
        }
    }

    fn below(threshold: f64) -> BiomeRule {
        BiomeRule::NoiseBelow {
            frequency: 1.0,
            seed_offset: 1,
            threshold,
        }
    }

    #[test]
    fn test_default_catalogue() {
        let catalogue = BiomeCatalogue::new(&MapConfig::default().biomes)
            .expect("default config should be valid");
        assert_eq!(catalogue.len(), 3);
        let water = catalogue.id("water").unwrap();
        let desert = catalogue.id("desert").unwrap();
        let grass = catalogue.id("grass").unwrap();
        assert_eq!(catalogue[water].fallback, Some(grass));
        assert_eq!(catalogue[desert].fallback, Some(grass));
        assert_eq!(catalogue[grass].fallback, None);
        assert_eq!(catalogue.label(desert), "desert");
        assert_eq!(
            catalogue.id("lava"),
            Err(ConfigError::UnknownBiome("lava".into()))
        );
    }

    #[test]
    fn test_duplicate() {
        let result = BiomeCatalogue::new(&[
            biome("grass", 0, None, below(0.0)),
            biome("grass", 1, None, BiomeRule::Always),
        ]);
        assert_eq!(
            result.unwrap_err(),
            ConfigError::DuplicateBiome("grass".into())
        );
    }

    #[test]
    fn test_catch_all() {
        assert_eq!(
            BiomeCatalogue::new(&[biome("water", 0, None, below(0.0))])
                .unwrap_err(),
            ConfigError::MissingCatchAll
        );
        assert_eq!(
            BiomeCatalogue::new(&[
                biome("grass", 0, None, BiomeRule::Always),
                biome("sand", 1, None, BiomeRule::Always),
            ])
            .unwrap_err(),
            ConfigError::MultipleCatchAll("grass".into(), "sand".into())
        );
        assert_eq!(
            BiomeCatalogue::new(&[
                biome("grass", 0, None, BiomeRule::Always),
                biome("water", 1, None, below(0.0)),
            ])
            .unwrap_err(),
            ConfigError::CatchAllNotLast("grass".into())
        );
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(
            BiomeCatalogue::new(&[
                biome("water", 0, Some("lava"), below(0.0)),
                biome("grass", 1, None, BiomeRule::Always),
            ])
            .unwrap_err(),
            ConfigError::UnknownBiome("lava".into())
        );
        // Self-loop
        assert_eq!(
            BiomeCatalogue::new(&[
                biome("water", 0, Some("water"), below(0.0)),
                biome("grass", 1, None, BiomeRule::Always),
            ])
            .unwrap_err(),
            ConfigError::FallbackCycle("water".into())
        );
        // Longer loop
        assert_eq!(
            BiomeCatalogue::new(&[
                biome("water", 0, Some("sand"), below(-0.5)),
                biome("sand", 1, Some("grass"), below(0.0)),
                biome("grass", 2, Some("water"), BiomeRule::Always),
            ])
            .unwrap_err(),
            ConfigError::FallbackCycle("water".into())
        );
    }

    #[test]
    fn test_dominance() {
        let catalogue = BiomeCatalogue::new(&[
            biome("water", 0, None, below(-0.5)),
            biome("sand", 2, None, below(0.0)),
            biome("mud", 2, None, below(0.5)),
            biome("grass", 3, None, BiomeRule::Always),
        ])
        .unwrap();
        let [water, sand, mud, grass] =
            [0, 1, 2, 3].map(BiomeId::new);
        assert_eq!(catalogue.dominance(water, grass), Ordering::Less);
        assert_eq!(catalogue.dominance(grass, sand), Ordering::Greater);
        assert_eq!(catalogue.loser(water, grass), grass);
        assert_eq!(catalogue.loser(grass, water), grass);
        // Equal priority -> the later declaration loses
        assert_eq!(catalogue.loser(sand, mud), mud);
        assert_eq!(catalogue.loser(mud, sand), mud);
    }

    #[test]
    fn test_classify_order() {
        // Both noise rules always match, so the first one declared wins
        let catalogue = BiomeCatalogue::new(&[
            biome("water", 5, None, below(2.0)),
            biome("sand", 0, None, below(2.0)),
            biome("grass", 1, None, BiomeRule::Always),
        ])
        .unwrap();
        let noise = NoiseField::new(
            1,
            Default::default(),
            16,
            catalogue.seed_offsets(),
        );
        for x in 0..16 {
            let point = [x as f64, 3.0];
            assert_eq!(catalogue.classify(&noise, point), BiomeId::new(0));
        }

        // Nothing matches -> catch-all
        let catalogue = BiomeCatalogue::new(&[
            biome("water", 0, None, below(-2.0)),
            biome("grass", 1, None, BiomeRule::Always),
        ])
        .unwrap();
        for x in 0..16 {
            let point = [x as f64, 3.0];
            assert_eq!(catalogue.classify(&noise, point), BiomeId::new(1));
        }
    }

    #[test]
    fn test_pair() {
        let a = BiomeId::new(0);
        let b = BiomeId::new(4);
        assert_eq!(BiomePair::new(a, b), BiomePair::new(b, a));
        assert!(BiomePair::new(b, a).contains(a));
        assert!(!BiomePair::new(b, a).contains(BiomeId::new(1)));
        assert_eq!(BiomePair::new(a, b).other(a), b);
        assert_eq!(BiomePair::new(a, b).other(b), a);
    }
}
