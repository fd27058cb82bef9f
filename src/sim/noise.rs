//! Seeded Gaussian noise for the simulator.

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;

/// Noise generator with configurable seed for reproducibility
#[derive(Clone)]
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    /// Create a new noise generator
    ///
    /// A seed of 0 draws from entropy; any other seed is reproducible.
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng }
    }

    /// Gaussian sample with the given standard deviation
    #[inline]
    pub fn gaussian(&mut self, stddev: f64) -> f64 {
        if stddev == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Multiplicative slip factor `1 + N(0, stddev)`
    #[inline]
    pub fn slip(&mut self, stddev: f64) -> f64 {
        1.0 + self.gaussian(stddev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_seed() {
        let mut noise1 = NoiseGenerator::new(42);
        let mut noise2 = NoiseGenerator::new(42);

        for _ in 0..100 {
            assert_eq!(noise1.gaussian(1.0), noise2.gaussian(1.0));
        }
    }

    #[test]
    fn test_zero_stddev() {
        let mut noise = NoiseGenerator::new(42);
        for _ in 0..10 {
            assert_eq!(noise.gaussian(0.0), 0.0);
            assert_eq!(noise.slip(0.0), 1.0);
        }
    }

    #[test]
    fn test_gaussian_spread() {
        let mut noise = NoiseGenerator::new(7);
        let samples: Vec<f64> = (0..10_000).map(|_| noise.gaussian(2.0)).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / samples.len() as f64;

        assert!(mean.abs() < 0.1, "mean={}", mean);
        assert!((var.sqrt() - 2.0).abs() < 0.1, "stddev={}", var.sqrt());
    }
}
