//! Simulated-annealing hyperparameters: temperature, cooling rate, and
//! per-bit mutation probability. Each is drawn from a distribution
//! specifier at worker startup and perturbed multiplicatively after a
//! losing worker is reset from a winner.

use rand::Rng;

use crate::config::DistSpec;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    pub temperature: f64,
    pub cooling_rate: f64,
    pub p_mutations: f64,
}

/// Explore jitter scale per hyperparameter, read straight from the
/// configured `scales` map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scales {
    pub temperature: f64,
    pub cooling_rate: f64,
    pub p_mutations: f64,
}

impl Scales {
    /// Looks each field up in the configured `scales` map by name, falling
    /// back to zero jitter for any hyperparameter the map omits.
    pub fn from_map(map: &std::collections::BTreeMap<String, f64>) -> Self {
        Self {
            temperature: map.get("temperature").copied().unwrap_or(0.0),
            cooling_rate: map.get("cooling_rate").copied().unwrap_or(0.0),
            p_mutations: map.get("p_mutations").copied().unwrap_or(0.0),
        }
    }
}

/// One draw from the standard normal distribution via Box-Muller. Kept
/// local to this module rather than pulled from `crate::config::DistSpec`,
/// since `perturb` needs an unparameterized `N(0,1)` and not a configured
/// distribution.
fn standard_normal(rng: &mut impl Rng) -> f64 {
    let u1: f64 = rng.random_range(f64::EPSILON..1.0);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

impl Hyperparameters {
    /// Draws each field from its own configured distribution, in this
    /// worker's own PRNG context.
    pub fn sample(
        temperature: &DistSpec,
        cooling_rate: &DistSpec,
        p_mutations: &DistSpec,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            temperature: temperature.sample(rng),
            cooling_rate: cooling_rate.sample(rng),
            p_mutations: p_mutations.sample(rng).clamp(0.0, 1.0),
        }
    }

    /// Multiplicatively jitter each field by `1 + scale * N(0,1)`.
    /// `p_mutations` is clamped back into `[0,1]` since it is used directly
    /// as a Bernoulli parameter; temperature is floored above zero so an
    /// unlucky large negative draw can't flip its sign. `cooling_rate`
    /// ranges over all of `ℝ`, so it is jittered with no floor or clamp.
    pub fn perturb(&self, scales: &Scales, rng: &mut impl Rng) -> Self {
        let jitter = |value: f64, scale: f64, rng: &mut impl Rng| {
            value * (1.0 + scale * standard_normal(rng))
        };
        Self {
            temperature: jitter(self.temperature, scales.temperature, rng).max(f64::MIN_POSITIVE),
            cooling_rate: jitter(self.cooling_rate, scales.cooling_rate, rng),
            p_mutations: jitter(self.p_mutations, scales.p_mutations, rng).clamp(0.0, 1.0),
        }
    }

    /// One exponential cooling step: `temperature *= (1 - cooling_rate)`.
    pub fn cool(&mut self) {
        self.temperature *= 1.0 - self.cooling_rate;
    }
}
