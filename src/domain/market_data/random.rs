use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Layer-local source of uniform draws. Everything stochastic in the engine
/// goes through this seam so runs can be replayed from a seed or a script.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;

    fn uniform_in(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_uniform()
    }

    /// Uniform draw in `[-1, 1)`.
    fn signed_unit(&mut self) -> f64 {
        self.next_uniform() * 2.0 - 1.0
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_uniform(&mut self) -> f64 {
        (**self).next_uniform()
    }
}

/// Seedable pseudo-random source used by every live layer.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Independent stream for the `stream`-th consumer of a scene seed.
    pub fn derived(seed: u64, stream: u64) -> Self {
        const GOLDEN: u64 = 0x9E37_79B9_7F4A_7C15;
        Self::new(seed ^ GOLDEN.wrapping_mul(stream.wrapping_add(1)))
    }
}

impl RandomSource for SeededRandom {
    fn next_uniform(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}

/// Replays a fixed cycle of draws. Handy for pinning the process in tests.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(values: Vec<f64>) -> Self {
        let values = if values.is_empty() { vec![0.5] } else { values };
        Self { values, cursor: 0 }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for SequenceRandom {
    fn next_uniform(&mut self) -> f64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.wrapping_add(1);
        value
    }
}

const NONZERO_ATTEMPTS: usize = 8;

fn nonzero_uniform<R: RandomSource + ?Sized>(rng: &mut R) -> f64 {
    for _ in 0..NONZERO_ATTEMPTS {
        let u = rng.next_uniform();
        if u > 0.0 {
            return u;
        }
    }
    f64::EPSILON
}

/// Standard normal draw via Box–Muller. Exact zeros are redrawn so the
/// logarithm stays finite.
pub fn gaussian<R: RandomSource + ?Sized>(rng: &mut R) -> f64 {
    let u = nonzero_uniform(rng);
    let v = nonzero_uniform(rng);
    (-2.0 * u.ln()).sqrt() * (std::f64::consts::TAU * v).cos()
}
