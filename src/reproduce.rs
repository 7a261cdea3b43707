//! Functions related to breeding children from the members of a specie.

use crate::{
    crossover::crossover,
    genome::{Genome, InnoGen},
    mutation::Mutation,
    random::{unit, EvolutionEvent, Happens},
    specie::Specie,
    Error,
};
use rand::RngCore;

/// Index of a random genome, with probability weighted by fitness.
/// Fitness values are shifted so negative fitnesses are handled properly.
fn weighted_index<'a>(
    genomes: impl Iterator<Item = (usize, &'a Genome)> + Clone,
    rng: &mut impl RngCore,
) -> Option<usize> {
    let min_fitness = genomes
        .clone()
        .map(|(_, g)| g.fitness())
        .reduce(f64::min)?;

    // shift to non-negative, and keep every weight above zero
    let shift = if min_fitness < 0. { -min_fitness } else { 0. };
    let epsilon = 1e-6;
    let weight = |g: &Genome| g.fitness() + shift + epsilon;

    let total_weight = genomes.clone().map(|(_, g)| weight(g)).sum::<f64>();
    let mut threshold = unit(rng) * total_weight;

    let mut last = None;
    for (idx, genome) in genomes {
        threshold -= weight(genome);
        if threshold <= 0. {
            return Some(idx);
        }
        last = Some(idx);
    }

    // float rounding may leave a sliver of threshold
    last
}

/// Select a random genome with probability weighted by fitness
pub fn weighted_select<'a>(genomes: &'a [Genome], rng: &mut impl RngCore) -> Option<&'a Genome> {
    weighted_index(genomes.iter().enumerate(), rng).map(|idx| &genomes[idx])
}

/// Select two distinct members, each weighted by fitness
pub fn weighted_uniq_2<'a>(
    genomes: &'a [Genome],
    rng: &mut impl RngCore,
) -> Option<(&'a Genome, &'a Genome)> {
    if genomes.len() < 2 {
        return None;
    }

    let l = weighted_index(genomes.iter().enumerate(), rng)?;
    let r = weighted_index(
        genomes.iter().enumerate().filter(move |(idx, _)| *idx != l),
        rng,
    )?;
    Some((&genomes[l], &genomes[r]))
}

/// Breed and mutate a single child of `specie`. With [EvolutionEvent::Crossover] and enough
/// members the child is a crossover of two distinct parents, otherwise a copy of one.
/// Returns None only for an empty specie.
pub fn breed_child(
    specie: &Specie,
    mutation: &Mutation,
    inno: &mut InnoGen,
    rng: &mut impl Happens,
) -> Option<Genome> {
    let members = specie.genomes();
    let mut child = if members.len() >= 2 && rng.happens(EvolutionEvent::Crossover) {
        let (l, r) = weighted_uniq_2(members, rng)?;
        match crossover(l, r, rng) {
            Ok(child) => child,
            Err(Error::InvalidCrossover) => {
                log::warn!("parents have no genes to cross, copying the fitter one");
                if l.fitness() >= r.fitness() {
                    l.clone()
                } else {
                    r.clone()
                }
            }
            Err(e) => {
                log::error!("crossover failed: {e}");
                l.clone()
            }
        }
    } else {
        weighted_select(members, rng)?.clone()
    };

    child.clear_fitness();
    child.set_global_rank(0);
    mutation.mutate(&mut child, inno, rng);
    Some(child)
}
