//! The population of a run, split into species, and the generation state machine driving it.

use crate::{
    config::Config,
    genome::{Genome, InnoGen},
    mutation::Mutation,
    random::{ProbBinding, ProbStatic},
    reproduce::breed_child,
    specie::Specie,
    Error,
};
use rand::{seq::IndexedRandom, RngCore};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Stage of the generation cycle. Ranking and breeding both run inside a single
/// [Pool::next_generation] call, which always returns the pool to `Evaluating`, so a caller or a
/// saved snapshot only observes the other two if that call fails partway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Genomes are being measured one at a time
    Evaluating,
    Ranking,
    Breeding,
}

/// Where the cursor went after a genome was measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { specie: usize, genome: usize },
    /// Every genome was measured, and the pool bred the generation with this index
    Generation(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    species: Vec<Specie>,
    generation: usize,
    innovation: u64,
    current_specie: usize,
    current_genome: usize,
    max_fitness: f64,
    #[serde(default)]
    champion: Option<Genome>,
    sensory: usize,
    action: usize,
    config: Config,
    phase: Phase,
}

impl Pool {
    /// Seed a pool of `config.population` basic genomes, all in a single specie
    pub fn init(
        sensory: usize,
        action: usize,
        config: Config,
        rng: &mut impl RngCore,
    ) -> Result<Self, Error> {
        let config = config.validate()?;
        let mut pool = Self {
            species: Vec::new(),
            generation: 0,
            innovation: 0,
            current_specie: 0,
            current_genome: 0,
            max_fitness: f64::MIN,
            champion: None,
            sensory,
            action,
            config,
            phase: Phase::Evaluating,
        };

        let mut inno = InnoGen::new(pool.innovation);
        let mut specie = Specie::new();
        for _ in 0..pool.config.population {
            specie.add(pool.create_basic_genome(&mut inno, rng));
        }
        pool.species.push(specie);
        pool.innovation = inno.head;

        log::debug!(
            "seeded {} genomes with {sensory} sensory and {action} action nodes",
            pool.population()
        );
        Ok(pool)
    }

    /// A basic genome given its first structure by one mutation pass
    pub fn create_basic_genome(&self, inno: &mut InnoGen, rng: &mut impl RngCore) -> Genome {
        let mut rng = ProbBinding::new(ProbStatic::from(&self.config), rng);
        let mut genome = Genome::basic(self.sensory, self.action, self.config.rates.clone());
        Mutation::from(&self.config).mutate(&mut genome, inno, &mut rng);
        genome
    }

    /// Place a genome in the first specie whose representative it is compatible with, or found a
    /// new specie for it
    pub fn add_to_species(&mut self, genome: Genome) {
        let config = &self.config;
        match self.species.iter_mut().find(|s| {
            s.representative()
                .is_some_and(|repr| repr.same_specie(&genome, config))
        }) {
            Some(specie) => specie.add(genome),
            None => self.species.push(Specie::with_genome(genome)),
        }
    }

    #[inline]
    pub fn species(&self) -> &[Specie] {
        &self.species
    }

    #[inline]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Head of the innovation registry, where the next generation continues from
    #[inline]
    pub fn innovation(&self) -> u64 {
        self.innovation
    }

    /// Best fitness ever recorded in this pool
    #[inline]
    pub fn max_fitness(&self) -> f64 {
        self.max_fitness
    }

    #[inline]
    pub fn sensory(&self) -> usize {
        self.sensory
    }

    #[inline]
    pub fn action(&self) -> usize {
        self.action
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn population(&self) -> usize {
        self.species.iter().map(Specie::len).sum()
    }

    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.species.iter().flat_map(|s| s.genomes().iter())
    }

    fn unmeasured(&self) -> usize {
        self.genomes().filter(|g| !g.is_measured()).count()
    }

    /// (specie, genome) indices of the genome being measured
    #[inline]
    pub fn cursor(&self) -> (usize, usize) {
        (self.current_specie, self.current_genome)
    }

    pub fn current(&self) -> Option<&Genome> {
        self.species
            .get(self.current_specie)
            .and_then(|s| s.get(self.current_genome))
    }

    pub fn fitness_already_measured(&self) -> bool {
        self.current().is_some_and(Genome::is_measured)
    }

    /// Record the fitness of the genome at the cursor. A non-finite fitness is rejected and the
    /// genome stays unmeasured
    pub fn record_fitness(&mut self, fitness: f64) -> Result<(), Error> {
        if !fitness.is_finite() {
            return Err(Error::NonFiniteFitness { fitness });
        }
        let (s, g) = self.cursor();
        let genome = self
            .species
            .get_mut(s)
            .and_then(|specie| specie.get_mut(g))
            .ok_or(Error::MissingCurrentGenome)?;
        genome.set_fitness(fitness);
        log::trace!("genome ({s}, {g}) of generation {} scored {fitness}", self.generation);

        if fitness > self.max_fitness {
            self.max_fitness = fitness;
            self.champion = Some(genome.clone());
            log::info!("generation {} reached a record fitness of {fitness}", self.generation);
        }
        Ok(())
    }

    fn next_unmeasured(&self) -> Option<(usize, usize)> {
        let positions = self
            .species
            .iter()
            .enumerate()
            .flat_map(|(s, specie)| (0..specie.len()).map(move |g| (s, g)))
            .collect::<Vec<_>>();
        let start = positions
            .iter()
            .position(|p| *p == self.cursor())
            .map_or(0, |idx| idx + 1);

        positions
            .iter()
            .cycle()
            .skip(start)
            .take(positions.len())
            .find(|(s, g)| !self.species[*s].genomes()[*g].is_measured())
            .copied()
    }

    /// Move the cursor to the next unmeasured genome. Once every genome is measured the next
    /// generation is bred and the cursor returns to its start
    pub fn advance(&mut self, rng: &mut impl RngCore) -> Result<Advance, Error> {
        if self.species.iter().all(Specie::is_empty) {
            return Err(Error::MissingCurrentGenome);
        }

        match self.next_unmeasured() {
            Some((specie, genome)) => {
                (self.current_specie, self.current_genome) = (specie, genome);
                Ok(Advance::Next { specie, genome })
            }
            None => self.next_generation(rng).map(Advance::Generation),
        }
    }

    /// Measure every unmeasured genome with `f`, returning how many were measured. Genomes
    /// scoring a non-finite fitness stay unmeasured, and the first such score is returned as an
    /// error once the rest were measured
    #[cfg(not(feature = "parallel"))]
    pub fn evaluate_all<F>(&mut self, f: F) -> Result<usize, Error>
    where
        F: Fn(&Genome) -> f64 + Sync,
    {
        let mut measured = 0;
        let mut rejected = None;
        for genome in self
            .species
            .iter_mut()
            .flat_map(|s| s.genomes_mut().iter_mut())
            .filter(|g| !g.is_measured())
        {
            let fitness = f(genome);
            if fitness.is_finite() {
                genome.set_fitness(fitness);
                measured += 1;
            } else {
                rejected.get_or_insert(fitness);
            }
        }
        self.track_max_fitness();
        match rejected {
            Some(fitness) => Err(Error::NonFiniteFitness { fitness }),
            None => Ok(measured),
        }
    }

    /// Measure every unmeasured genome with `f`, returning how many were measured. Genomes
    /// scoring a non-finite fitness stay unmeasured, and the first such score is returned as an
    /// error once the rest were measured
    #[cfg(feature = "parallel")]
    pub fn evaluate_all<F>(&mut self, f: F) -> Result<usize, Error>
    where
        F: Fn(&Genome) -> f64 + Sync,
    {
        let (measured, rejected) = self
            .species
            .par_iter_mut()
            .map(|specie| {
                let mut rejected = None;
                let measured = specie
                    .genomes_mut()
                    .iter_mut()
                    .filter(|g| !g.is_measured())
                    .map(|genome| {
                        let fitness = f(genome);
                        if fitness.is_finite() {
                            genome.set_fitness(fitness);
                        } else {
                            rejected.get_or_insert(fitness);
                        }
                        fitness.is_finite()
                    })
                    .filter(|finite| *finite)
                    .count();
                (measured, rejected)
            })
            .reduce(|| (0, None), |(l, l_rej), (r, r_rej)| (l + r, l_rej.or(r_rej)));
        self.track_max_fitness();
        match rejected {
            Some(fitness) => Err(Error::NonFiniteFitness { fitness }),
            None => Ok(measured),
        }
    }

    fn track_max_fitness(&mut self) {
        let record = self
            .fittest()
            .filter(|g| g.fitness() > self.max_fitness)
            .cloned();
        if let Some(best) = record {
            log::info!(
                "generation {} reached a record fitness of {}",
                self.generation,
                best.fitness()
            );
            self.max_fitness = best.fitness();
            self.champion = Some(best);
        }
    }

    /// First measured genome of the highest fitness, in species order
    fn fittest(&self) -> Option<&Genome> {
        self.genomes()
            .filter(|g| g.is_measured())
            .reduce(|best, g| if g.fitness() > best.fitness() { g } else { best })
    }

    /// The fittest genome measured this generation, or the record holder of the run before
    /// anything was measured
    pub fn best_genome(&self) -> Option<&Genome> {
        self.fittest()
            .or(self.champion.as_ref())
            .or_else(|| self.genomes().next())
    }

    /// Rank every genome 1..=N by ascending fitness, ties in species order
    pub fn rank_globally(&mut self) {
        let mut all = self
            .species
            .iter_mut()
            .flat_map(|s| s.genomes_mut().iter_mut())
            .collect::<Vec<_>>();
        all.sort_by(|l, r| l.fitness().total_cmp(&r.fitness()));
        for (idx, genome) in all.into_iter().enumerate() {
            genome.set_global_rank(idx + 1);
        }
    }

    fn cull_species(&mut self, cut_to_one: bool) {
        for specie in self.species.iter_mut() {
            specie.cull(cut_to_one);
        }
    }

    /// Keep the species flagged in `keep`, returning how many were removed. Should none be
    /// flagged, the best specie by `key` survives
    fn retain_species(&mut self, mut keep: Vec<bool>, key: impl Fn(&Specie) -> f64) -> usize {
        if !keep.iter().any(|k| *k) {
            let best = self
                .species
                .iter()
                .enumerate()
                .reduce(|best, s| if key(s.1) > key(best.1) { s } else { best })
                .map(|(idx, _)| idx);
            if let Some(idx) = best {
                keep[idx] = true;
            }
        }

        let before = self.species.len();
        let mut keep = keep.into_iter();
        self.species.retain(|_| keep.next().unwrap_or(false));
        before - self.species.len()
    }

    fn remove_stale_species(&mut self) {
        for specie in self.species.iter_mut() {
            specie.update_staleness();
        }

        let (stale, record) = (self.config.stale_species, self.max_fitness);
        let keep = self
            .species
            .iter()
            .map(|s| s.staleness < stale || s.top_fitness >= record)
            .collect();
        let removed = self.retain_species(keep, |s| s.top_fitness);
        log::debug!("removed {removed} stale species");
    }

    fn calculate_average_fitness(&mut self) {
        for specie in self.species.iter_mut() {
            if let Err(e) = specie.calculate_average_fitness() {
                log::error!("{e}");
            }
        }
    }

    fn total_average_fitness(&self) -> f64 {
        self.species.iter().map(|s| s.average_fitness).sum()
    }

    fn breed_share(&self, specie: &Specie, total: f64) -> usize {
        if total <= 0. {
            0
        } else {
            (specie.average_fitness / total * self.config.population as f64).floor() as usize
        }
    }

    fn remove_weak_species(&mut self) {
        let total = self.total_average_fitness();
        let keep = self
            .species
            .iter()
            .map(|s| self.breed_share(s, total) >= 1)
            .collect();
        let removed = self.retain_species(keep, |s| s.average_fitness);
        log::debug!("removed {removed} weak species");
    }

    /// Breed the next generation from a fully measured one, returning the new generation index
    pub fn next_generation(&mut self, rng: &mut impl RngCore) -> Result<usize, Error> {
        let count = self.unmeasured();
        if count > 0 {
            log::warn!(
                "refusing to breed generation {} with {count} unmeasured genomes",
                self.generation
            );
            return Err(Error::Unmeasured { count });
        }

        let mut rng = ProbBinding::new(ProbStatic::from(&self.config), rng);
        let mutation = Mutation::from(&self.config);
        let mut inno = InnoGen::new(self.innovation);
        let population = self.config.population;

        self.phase = Phase::Ranking;
        self.cull_species(false);
        self.rank_globally();
        self.remove_stale_species();
        self.rank_globally();
        self.calculate_average_fitness();
        self.remove_weak_species();

        self.phase = Phase::Breeding;
        let total = self.total_average_fitness();
        let mut children = Vec::with_capacity(population);
        for specie in self.species.iter() {
            for _ in 1..self.breed_share(specie, total) {
                if let Some(child) = breed_child(specie, &mutation, &mut inno, &mut rng) {
                    children.push(child);
                }
            }
        }

        self.cull_species(true);
        while children.len() + self.species.len() < population {
            let Some(child) = self
                .species
                .choose(&mut rng)
                .and_then(|specie| breed_child(specie, &mutation, &mut inno, &mut rng))
            else {
                log::error!("no specie left to breed from");
                break;
            };
            children.push(child);
        }

        // champions are measured again alongside their children
        for genome in self
            .species
            .iter_mut()
            .flat_map(|s| s.genomes_mut().iter_mut())
        {
            genome.clear_fitness();
        }
        for child in children {
            self.add_to_species(child);
        }

        self.generation += 1;
        self.innovation = inno.head;
        (self.current_specie, self.current_genome) = (0, 0);
        self.phase = Phase::Evaluating;

        log::info!(
            "generation {}: {} species, {} genomes, max fitness {}",
            self.generation,
            self.species.len(),
            self.population(),
            self.max_fitness
        );
        Ok(self.generation)
    }

    pub fn to_string(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}
