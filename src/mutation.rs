//! Mutation of genomes. Which operators fire, and how often, is decided by the rates each genome
//! carries; how weights move is decided by the [Mutation] policy.

use crate::{
    config::Config,
    constants::*,
    genome::{Gene, Genome, InnoGen, MutationKind},
    random::{rolls, unit, EvolutionEvent, Happens},
};
use rand::{seq::IteratorRandom, RngCore};
use rand_distr::{Distribution, Uniform};

#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub step_size: f64,
    pub weight_range: f64,
    pub rate_decay: f64,
    pub rate_growth: f64,
}

impl Default for Mutation {
    fn default() -> Self {
        Self {
            step_size: NEATPOOL_STEP_SIZE,
            weight_range: NEATPOOL_WEIGHT_RANGE,
            rate_decay: NEATPOOL_RATE_DECAY,
            rate_growth: NEATPOOL_RATE_GROWTH,
        }
    }
}

impl From<&Config> for Mutation {
    fn from(config: &Config) -> Self {
        Self {
            step_size: config.step_size,
            weight_range: config.weight_range,
            rate_decay: config.rate_decay,
            rate_growth: config.rate_growth,
        }
    }
}

impl Mutation {
    fn new_weight(&self, rng: &mut impl RngCore) -> f64 {
        match Uniform::new(-self.weight_range, self.weight_range) {
            Ok(dist) => dist.sample(rng),
            Err(_) => 0.,
        }
    }

    /// Perform 0 or more mutations on this genome, drawing each operator's count from the
    /// genome's own rates after they have been adapted
    pub fn mutate(&self, genome: &mut Genome, inno: &mut InnoGen, rng: &mut impl Happens) {
        self.adapt_rates(genome, rng);
        let rates = genome.rates().clone();

        for kind in MutationKind::ALL {
            for _ in 0..rolls(rng, rates.get(kind)) {
                let applied = match kind {
                    MutationKind::Connections => self.mutate_weights(genome, rng),
                    MutationKind::Link => self.add_link(genome, inno, rng, false),
                    MutationKind::Bias => self.add_link(genome, inno, rng, true),
                    MutationKind::Node => self.add_node(genome, inno, rng),
                    MutationKind::Enable => self.toggle(genome, rng, true),
                    MutationKind::Disable => self.toggle(genome, rng, false),
                };
                log::trace!("mutation {kind:?} applied: {applied}");
            }
        }
    }

    /// Nudge every rate of the genome up or down
    pub fn adapt_rates(&self, genome: &mut Genome, rng: &mut impl RngCore) {
        let rates = genome.rates_mut();
        for kind in MutationKind::ALL {
            let rate = rates.get_mut(kind);
            if rng.next_u32() & 1 == 0 {
                *rate *= self.rate_decay;
            } else {
                *rate *= self.rate_growth;
            }
        }
    }

    /// Perturb or replace the weight of every enabled gene
    pub fn mutate_weights(&self, genome: &mut Genome, rng: &mut impl Happens) -> bool {
        let mut any = false;
        for gene in genome.genes_mut().iter_mut().filter(|g| g.enabled) {
            if rng.happens(EvolutionEvent::PerturbWeight) {
                gene.weight += unit(rng) * self.step_size * 2. - self.step_size;
            } else {
                gene.weight = self.new_weight(rng);
            }
            any = true;
        }
        any
    }

    /// Connect an open path with a fresh gene. With `from_bias`, the path starts at the bias node
    pub fn add_link(
        &self,
        genome: &mut Genome,
        inno: &mut InnoGen,
        rng: &mut impl RngCore,
        from_bias: bool,
    ) -> bool {
        let from = from_bias.then(|| genome.bias());
        match genome.open_path(rng, from) {
            Some((from, to)) => {
                let weight = self.new_weight(rng);
                genome.push_gene(Gene::new(from, to, weight, inno));
                true
            }
            None => false,
        }
    }

    /// Split a random enabled gene through a new hidden node
    pub fn add_node(
        &self,
        genome: &mut Genome,
        inno: &mut InnoGen,
        rng: &mut impl RngCore,
    ) -> bool {
        let Some(idx) = genome
            .genes()
            .iter()
            .enumerate()
            .filter_map(|(idx, g)| g.enabled.then_some(idx))
            .choose(rng)
        else {
            return false;
        };

        let center = genome.next_node();
        let (first, second) = genome.genes_mut()[idx].bisect(center, inno);
        genome.push_2_genes(first, second);
        true
    }

    /// Enable a random disabled gene, or disable a random enabled one. A gene is never enabled
    /// onto a path that another enabled gene already carries.
    pub fn toggle(&self, genome: &mut Genome, rng: &mut impl RngCore, enable: bool) -> bool {
        let Some(idx) = genome
            .genes()
            .iter()
            .enumerate()
            .filter(|(_, g)| {
                g.enabled != enable && !(enable && genome.contains_enabled_path(g.path()))
            })
            .map(|(idx, _)| idx)
            .choose(rng)
        else {
            return false;
        };

        genome.genes_mut()[idx].enabled = enable;
        true
    }
}
