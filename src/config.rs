//! Tunable parameters of a [crate::Pool], loadable from JSON.

use crate::{constants::*, genome::MutationRates, Error};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub population: usize,
    pub delta_disjoint: f64,
    pub delta_weights: f64,
    pub delta_threshold: f64,
    pub stale_species: usize,
    pub crossover_prob: f64,
    pub perturb_prob: f64,
    pub keep_disabled_prob: f64,
    pub pick_tied_prob: f64,
    pub step_size: f64,
    pub weight_range: f64,
    pub rate_decay: f64,
    pub rate_growth: f64,
    pub relaxation_passes: usize,
    /// Mutation rates handed to every freshly seeded genome
    pub rates: MutationRates,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            population: NEATPOOL_POPULATION,
            delta_disjoint: NEATPOOL_DELTA_DISJOINT,
            delta_weights: NEATPOOL_DELTA_WEIGHTS,
            delta_threshold: NEATPOOL_DELTA_THRESHOLD,
            stale_species: NEATPOOL_STALE_SPECIES,
            crossover_prob: NEATPOOL_CROSSOVER_PROB,
            perturb_prob: NEATPOOL_PERTURB_PROB,
            keep_disabled_prob: NEATPOOL_KEEP_DISABLED_PROB,
            pick_tied_prob: NEATPOOL_PICK_TIED_PROB,
            step_size: NEATPOOL_STEP_SIZE,
            weight_range: NEATPOOL_WEIGHT_RANGE,
            rate_decay: NEATPOOL_RATE_DECAY,
            rate_growth: NEATPOOL_RATE_GROWTH,
            relaxation_passes: NEATPOOL_RELAXATION_PASSES,
            rates: MutationRates::default(),
        }
    }
}

impl Config {
    pub fn validate(self) -> Result<Self, Error> {
        if self.population == 0 {
            return Err(Error::Config("population must be non-zero".into()));
        }
        if self.relaxation_passes == 0 {
            return Err(Error::Config("relaxation_passes must be non-zero".into()));
        }
        for (name, p) in [
            ("crossover_prob", self.crossover_prob),
            ("perturb_prob", self.perturb_prob),
            ("keep_disabled_prob", self.keep_disabled_prob),
            ("pick_tied_prob", self.pick_tied_prob),
        ] {
            if !(0. ..=1.).contains(&p) {
                return Err(Error::Config(format!("{name} {p} must be between 0.0 and 1.0")));
            }
        }
        for (name, v) in [
            ("rate_decay", self.rate_decay),
            ("rate_growth", self.rate_growth),
            ("delta_threshold", self.delta_threshold),
        ] {
            if !(v.is_finite() && v > 0.) {
                return Err(Error::Config(format!("{name} {v} must be positive")));
            }
        }
        if self.weight_range <= 0. || self.step_size < 0. {
            return Err(Error::Config(
                "weight_range must be positive and step_size non-negative".into(),
            ));
        }
        if let Some((kind, rate)) = self.rates.iter().find(|(_, r)| !r.is_finite() || *r < 0.) {
            return Err(Error::Config(format!("rate {kind:?} {rate} must be non-negative")));
        }
        Ok(self)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, Error> {
        serde_json::from_str::<Self>(s)?.validate()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}
