//! A collection of [Genome]s who are closely related to the same representative.

use crate::{genome::Genome, Error};
use core::cmp::Ordering;
use serde::{Deserialize, Serialize};

fn fitness_desc(l: &Genome, r: &Genome) -> Ordering {
    r.fitness().total_cmp(&l.fitness())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specie {
    genomes: Vec<Genome>,
    /// Best fitness any member has reached while this specie existed
    pub top_fitness: f64,
    /// Mean global rank of the members
    pub average_fitness: f64,
    /// Generations since top_fitness last improved
    pub staleness: usize,
}

impl Default for Specie {
    fn default() -> Self {
        Self::new()
    }
}

impl Specie {
    pub fn new() -> Self {
        Self {
            genomes: Vec::new(),
            top_fitness: f64::MIN,
            average_fitness: 0.,
            staleness: 0,
        }
    }

    pub fn with_genome(genome: Genome) -> Self {
        let mut specie = Self::new();
        specie.add(genome);
        specie
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    #[inline]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    #[inline]
    pub fn genomes_mut(&mut self) -> &mut [Genome] {
        &mut self.genomes
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&Genome> {
        self.genomes.get(idx)
    }

    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Genome> {
        self.genomes.get_mut(idx)
    }

    /// Take ownership of a genome as the last member
    pub fn add(&mut self, genome: Genome) {
        self.genomes.push(genome);
    }

    /// Give up ownership of the member at `idx`, keeping the order of the rest
    pub fn remove(&mut self, idx: usize) -> Option<Genome> {
        (idx < self.genomes.len()).then(|| self.genomes.remove(idx))
    }

    /// The member new genomes are compared against. This is always the first member
    #[inline]
    pub fn representative(&self) -> Option<&Genome> {
        self.genomes.first()
    }

    /// Set and return the mean global rank of the members
    pub fn calculate_average_fitness(&mut self) -> Result<f64, Error> {
        if self.genomes.is_empty() {
            return Err(Error::EmptySpecie);
        }

        let total = self
            .genomes
            .iter()
            .map(|g| g.global_rank() as f64)
            .sum::<f64>();
        self.average_fitness = total / self.genomes.len() as f64;
        Ok(self.average_fitness)
    }

    /// First member whose fitness is the specie's top fitness. A specie whose record was set
    /// by a member no longer present gives its fittest current member
    pub fn best_genome(&self) -> Option<&Genome> {
        self.genomes
            .iter()
            .find(|g| g.fitness() == self.top_fitness)
            .or_else(|| {
                self.genomes.iter().reduce(|best, g| {
                    if g.fitness() > best.fitness() {
                        g
                    } else {
                        best
                    }
                })
            })
    }

    /// Sort members fittest first, then either adopt a new top fitness or age by a generation
    pub fn update_staleness(&mut self) {
        self.genomes.sort_by(fitness_desc);
        match self.genomes.first() {
            Some(best) if best.fitness() > self.top_fitness => {
                self.top_fitness = best.fitness();
                self.staleness = 0;
            }
            _ => self.staleness += 1,
        }
    }

    /// Sort members fittest first and drop the weaker half, or all but the fittest
    pub fn cull(&mut self, cut_to_one: bool) {
        self.genomes.sort_by(fitness_desc);
        let keep = if cut_to_one {
            1
        } else {
            self.genomes.len().div_ceil(2)
        };
        self.genomes.truncate(keep);
    }
}
