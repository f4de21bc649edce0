//! Seeded track shapes for stress scenarios.
//!
//! A wobbly track is the seed circle with its radius modulated by a handful
//! of integer harmonics. Integer frequencies keep the outline closed, and
//! every amplitude and phase comes from a ChaCha8 stream, so the same seed
//! always yields the same track.

use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::TAU;
use trackview_core::{Path, PathGenerator, PathPoint};

/// The radius never shrinks below this fraction of the nominal radius.
const MIN_RADIUS_FACTOR: f64 = 0.2;

/// One sinusoidal radius term.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Harmonic {
    frequency: f64,
    amplitude: f64,
    phase: f64,
}

/// Circle with a seeded, closed radial wobble.
#[derive(Debug, Clone, PartialEq)]
pub struct WobbleGenerator {
    seed: u64,
    harmonics: Vec<Harmonic>,
}

impl WobbleGenerator {
    /// Creates a generator with `count` harmonics (frequencies 2, 3, ...).
    ///
    /// Harmonic `k` draws its relative amplitude from `Normal(0, strength / k)`.
    /// A non-finite or negative strength yields a plain circle.
    pub fn new(seed: u64, count: usize, strength: f64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut harmonics = Vec::with_capacity(count);

        for k in 2..(2 + count) {
            let frequency = k as f64;
            let Ok(normal) = Normal::new(0.0, strength / frequency) else {
                break;
            };
            harmonics.push(Harmonic {
                frequency,
                amplitude: normal.sample(&mut rng),
                phase: rng.gen_range(0.0..TAU),
            });
        }

        Self { seed, harmonics }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Radius multiplier at `angle`.
    fn radius_factor(&self, angle: f64) -> f64 {
        let wobble: f64 = self
            .harmonics
            .iter()
            .map(|h| h.amplitude * (h.frequency * angle + h.phase).sin())
            .sum();
        (1.0 + wobble).max(MIN_RADIUS_FACTOR)
    }
}

impl PathGenerator for WobbleGenerator {
    fn generate(&self, sample_count: usize, radius: f64, total_duration: f64) -> Path {
        if sample_count < 2 || !(radius > 0.0) || !(total_duration > 0.0) {
            return Path::empty();
        }

        let last = (sample_count - 1) as f64;
        let step = total_duration / sample_count as f64;
        let points = (0..sample_count)
            .map(|i| {
                let angle = (i as f64 / last) * TAU;
                let r = radius * self.radius_factor(angle);
                let position = Vector3::new(r * angle.cos(), 0.0, r * angle.sin());
                PathPoint::new(position, i as f64 * step)
            })
            .collect();

        Path::new(points)
    }
}
