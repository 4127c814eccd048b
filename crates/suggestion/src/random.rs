//! Uniform random sampling over declared parameter spaces.

use std::sync::Mutex;

use hypertune_domain::{ParameterConfig, ParameterType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

/// Draws uniform values from a parameter's feasible space. Owned by the
/// Hyperband service for cold-start brackets; seedable for deterministic
/// tests.
pub struct RandomSampler {
    rng: Mutex<StdRng>,
}

impl RandomSampler {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Sample one value for `config`, formatted for the trial wire: integers
    /// decimal, doubles fixed 4-decimal, categoricals verbatim. Unparseable
    /// numeric bounds degrade to 0 so a single bad config entry cannot stall
    /// a bracket.
    pub fn sample(&self, config: &ParameterConfig) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        match config.parameter_type {
            ParameterType::Int => {
                let min = parse_bound_i64(&config.feasible.min, &config.name);
                let max = parse_bound_i64(&config.feasible.max, &config.name);
                if min >= max {
                    return min.to_string();
                }
                rng.random_range(min..=max).to_string()
            }
            ParameterType::Double => {
                let min = parse_bound_f64(&config.feasible.min, &config.name);
                let max = parse_bound_f64(&config.feasible.max, &config.name);
                let value = if min >= max {
                    min
                } else {
                    min + rng.random::<f64>() * (max - min)
                };
                format!("{value:.4}")
            }
            ParameterType::Categorical => {
                let list = &config.feasible.list;
                if list.is_empty() {
                    warn!("empty categorical list for parameter {}", config.name);
                    return String::new();
                }
                let idx = rng.random_range(0..list.len());
                list[idx].clone()
            }
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bound_i64(value: &str, name: &str) -> i64 {
    value.parse().unwrap_or_else(|_| {
        warn!("unparseable bound {value:?} for parameter {name}");
        0
    })
}

fn parse_bound_f64(value: &str, name: &str) -> f64 {
    value.parse().unwrap_or_else(|_| {
        warn!("unparseable bound {value:?} for parameter {name}");
        0.0
    })
}
