use crate::{config::NoiseConfig, util::hash};
use fnv::FnvHashMap;
use noise::{Fbm, MultiFractal, NoiseFn, Seedable};

/// A deterministic, coherent scalar field over the map. Every consumer picks
/// its own frequency and seed offset, so one field can back any number of
/// independent-looking layers (water, desert, decoration patches...).
///
/// Inputs are normalized by the larger map dimension before frequency is
/// applied, so a frequency of 1.0 spans the whole map regardless of size.
pub struct NoiseField {
    seed: u64,
    config: NoiseConfig,
    extent: f64,
    /// One noise fn per seed offset. These are expensive to build (each
    /// octave generates its own permutation table), so we build them once.
    fns: FnvHashMap<u32, Fbm>,
}

impl NoiseField {
    /// Create a new field. `offsets` lists the seed offsets that will be
    /// queried, so their noise functions can be built up front. Querying an
    /// offset that wasn't listed still works, it's just slower.
    pub fn new(
        seed: u64,
        config: NoiseConfig,
        extent: u32,
        offsets: impl IntoIterator<Item = u32>,
    ) -> Self {
        let fns = offsets
            .into_iter()
            .map(|offset| (offset, Self::make_noise_fn(seed, config, offset)))
            .collect();
        Self {
            seed,
            config,
            extent: extent.max(1) as f64,
            fns,
        }
    }

    /// Sample the field. Output is always in `[-1, 1]`.
    pub fn evaluate(
        &self,
        point: [f64; 2],
        frequency: f64,
        seed_offset: u32,
    ) -> f64 {
        let scaled = [
            point[0] / self.extent * frequency,
            point[1] / self.extent * frequency,
        ];
        let value = match self.fns.get(&seed_offset) {
            Some(noise_fn) => noise_fn.get(scaled),
            None => Self::make_noise_fn(self.seed, self.config, seed_offset)
                .get(scaled),
        };
        // Fractal noise can overshoot a little when octaves line up
        value.clamp(-1.0, 1.0)
    }

    fn make_noise_fn(seed: u64, config: NoiseConfig, seed_offset: u32) -> Fbm {
        Fbm::default()
            .set_seed(hash::noise_seed(seed, seed_offset))
            .set_octaves(config.octaves)
            .set_lacunarity(config.lacunarity)
            .set_persistence(config.persistence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn field(seed: u64) -> NoiseField {
        NoiseField::new(seed, NoiseConfig::default(), 64, vec![101, 202])
    }

    #[test]
    fn test_deterministic() {
        let a = field(42);
        let b = field(42);
        for x in 0..32 {
            let point = [x as f64 * 1.7, x as f64 * 0.3];
            assert_eq!(
                a.evaluate(point, 1.2, 101),
                b.evaluate(point, 1.2, 101)
            );
        }
    }

    #[test]
    fn test_range() {
        let noise = field(7);
        for x in 0..64 {
            for y in 0..64 {
                let value =
                    noise.evaluate([x as f64, y as f64], 3.0, 202);
                assert!((-1.0..=1.0).contains(&value), "{}", value);
            }
        }
    }

    #[test]
    fn test_offsets_independent() {
        let noise = field(42);
        let differs = (0..64).any(|x| {
            let point = [x as f64 + 0.5, 10.5];
            noise.evaluate(point, 1.0, 101) != noise.evaluate(point, 1.0, 202)
        });
        assert!(differs);
    }

    #[test]
    fn test_unlisted_offset() {
        // An offset that wasn't pre-built should give the same values as one
        // that was
        let listed = NoiseField::new(3, NoiseConfig::default(), 64, vec![5]);
        let unlisted = NoiseField::new(3, NoiseConfig::default(), 64, vec![]);
        let point = [12.5, 40.25];
        assert_approx_eq!(
            listed.evaluate(point, 2.0, 5),
            unlisted.evaluate(point, 2.0, 5)
        );
    }

    #[test]
    fn test_coherent() {
        // Neighboring samples should be close together
        let noise = field(42);
        for x in 0..63 {
            let a = noise.evaluate([x as f64, 20.0], 1.0, 101);
            let b = noise.evaluate([x as f64 + 1.0, 20.0], 1.0, 101);
            assert!((a - b).abs() < 0.25, "{} vs {}", a, b);
        }
    }
}
