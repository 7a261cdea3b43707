pub mod gene;
pub mod innogen;

pub use gene::Gene;
pub use innogen::InnoGen;

use crate::{config::Config, constants::*, crossover::delta, network::Network, Error};
use core::{cmp::max, iter::once, ops::Range};
use fxhash::FxHashSet;
use rand::{seq::IteratorRandom, RngCore};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fs, path::Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Sensory,
    Action,
    Bias,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    Connections,
    Link,
    Bias,
    Node,
    Enable,
    Disable,
}

impl MutationKind {
    pub const ALL: [MutationKind; 6] = [
        Self::Connections,
        Self::Link,
        Self::Bias,
        Self::Node,
        Self::Enable,
        Self::Disable,
    ];
}

/// Per-genome rate of every [MutationKind]. Rates above 1 mean more than one application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationRates {
    pub connections: f64,
    pub link: f64,
    pub bias: f64,
    pub node: f64,
    pub enable: f64,
    pub disable: f64,
}

impl MutationRates {
    pub fn get(&self, kind: MutationKind) -> f64 {
        match kind {
            MutationKind::Connections => self.connections,
            MutationKind::Link => self.link,
            MutationKind::Bias => self.bias,
            MutationKind::Node => self.node,
            MutationKind::Enable => self.enable,
            MutationKind::Disable => self.disable,
        }
    }

    pub fn get_mut(&mut self, kind: MutationKind) -> &mut f64 {
        match kind {
            MutationKind::Connections => &mut self.connections,
            MutationKind::Link => &mut self.link,
            MutationKind::Bias => &mut self.bias,
            MutationKind::Node => &mut self.node,
            MutationKind::Enable => &mut self.enable,
            MutationKind::Disable => &mut self.disable,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MutationKind, f64)> + '_ {
        MutationKind::ALL.iter().map(move |kind| (*kind, self.get(*kind)))
    }
}

impl Default for MutationRates {
    fn default() -> Self {
        Self {
            connections: NEATPOOL_CONNECTIONS_RATE,
            link: NEATPOOL_LINK_RATE,
            bias: NEATPOOL_BIAS_RATE,
            node: NEATPOOL_NODE_RATE,
            enable: NEATPOOL_ENABLE_RATE,
            disable: NEATPOOL_DISABLE_RATE,
        }
    }
}

/// A genome over a fixed sensory and action interface. Node ids are laid out as
/// sensory `0..S`, action `S..S+A`, bias `S+A`, and hidden nodes above that. Hidden nodes
/// exist only as gene endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    sensory: usize,
    action: usize,
    genes: Vec<Gene>,
    max_node: usize,
    fitness: Option<f64>,
    global_rank: usize,
    rates: MutationRates,
}

impl Genome {
    /// A genome with only its reserved nodes and no genes
    pub fn basic(sensory: usize, action: usize, rates: MutationRates) -> Self {
        Self {
            sensory,
            action,
            genes: Vec::new(),
            max_node: sensory + action,
            fitness: None,
            global_rank: 0,
            rates,
        }
    }

    pub fn from_genes(
        sensory: usize,
        action: usize,
        genes: Vec<Gene>,
        rates: MutationRates,
    ) -> Self {
        let max_node = genes
            .iter()
            .fold(sensory + action, |acc, g| max(acc, max(g.from, g.to)));
        Self {
            sensory,
            action,
            genes,
            max_node,
            fitness: None,
            global_rank: 0,
            rates,
        }
    }

    /// Raise max_node to at least `node`, so that later hidden nodes are never reused
    pub fn with_max_node(mut self, node: usize) -> Self {
        self.max_node = max(self.max_node, node);
        self
    }

    #[inline]
    pub fn sensory(&self) -> Range<usize> {
        0..self.sensory
    }

    #[inline]
    pub fn action(&self) -> Range<usize> {
        self.sensory..self.sensory + self.action
    }

    #[inline]
    pub fn bias(&self) -> usize {
        self.sensory + self.action
    }

    pub fn node_kind(&self, id: usize) -> NodeKind {
        if id < self.sensory {
            NodeKind::Sensory
        } else if id < self.sensory + self.action {
            NodeKind::Action
        } else if id == self.bias() {
            NodeKind::Bias
        } else {
            NodeKind::Internal
        }
    }

    /// Every node id of this genome in ascending order: the reserved nodes, then every hidden
    /// node that is the endpoint of some gene
    pub fn nodes(&self) -> Vec<usize> {
        let bias = self.bias();
        (0..=bias)
            .chain(
                self.genes
                    .iter()
                    .flat_map(|g| [g.from, g.to])
                    .filter(|n| *n > bias)
                    .collect::<BTreeSet<_>>(),
            )
            .collect()
    }

    #[inline]
    pub fn max_node(&self) -> usize {
        self.max_node
    }

    /// Allocate a fresh hidden node id
    #[inline]
    pub fn next_node(&mut self) -> usize {
        self.max_node += 1;
        self.max_node
    }

    #[inline]
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    #[inline]
    pub fn genes_mut(&mut self) -> &mut [Gene] {
        &mut self.genes
    }

    pub fn push_gene(&mut self, gene: Gene) {
        self.max_node = max(self.max_node, max(gene.from, gene.to));
        self.genes.push(gene);
    }

    pub fn push_2_genes(&mut self, first: Gene, second: Gene) {
        self.genes.reserve(2);
        self.push_gene(first);
        self.push_gene(second);
    }

    /// Whether any gene, enabled or not, already describes `path`
    pub fn contains_path(&self, path: (usize, usize)) -> bool {
        self.genes.iter().any(|g| g.path() == path)
    }

    pub fn contains_enabled_path(&self, path: (usize, usize)) -> bool {
        self.genes.iter().any(|g| g.enabled && g.path() == path)
    }

    /// Pick an unconnected (from, to) pair. `from` may be any sensory, bias or hidden node,
    /// `to` any action or hidden node other than `from`. When `from` is given, only paths out
    /// of it are considered.
    pub fn open_path(&self, rng: &mut impl RngCore, from: Option<usize>) -> Option<(usize, usize)> {
        let nodes = self.nodes();
        let mut saturated = FxHashSet::default();
        loop {
            let from = match from {
                Some(from) if saturated.contains(&from) => return None,
                Some(from) => from,
                None => nodes
                    .iter()
                    .copied()
                    .filter(|n| {
                        !matches!(self.node_kind(*n), NodeKind::Action) && !saturated.contains(n)
                    })
                    .choose(rng)?,
            };

            let exclude = self
                .genes
                .iter()
                .filter_map(|g| (g.from == from).then_some(g.to))
                .chain(once(from))
                .collect::<FxHashSet<_>>();

            if let Some(to) = nodes
                .iter()
                .copied()
                .filter(|n| {
                    matches!(self.node_kind(*n), NodeKind::Action | NodeKind::Internal)
                        && !exclude.contains(n)
                })
                .choose(rng)
            {
                break Some((from, to));
            }

            saturated.insert(from);
        }
    }

    /// Recorded fitness, or 0 for a genome not yet measured this generation
    #[inline]
    pub fn fitness(&self) -> f64 {
        self.fitness.unwrap_or(0.)
    }

    #[inline]
    pub fn is_measured(&self) -> bool {
        self.fitness.is_some()
    }

    #[inline]
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    #[inline]
    pub fn clear_fitness(&mut self) {
        self.fitness = None;
    }

    #[inline]
    pub fn global_rank(&self) -> usize {
        self.global_rank
    }

    #[inline]
    pub fn set_global_rank(&mut self, rank: usize) {
        self.global_rank = rank;
    }

    #[inline]
    pub fn rates(&self) -> &MutationRates {
        &self.rates
    }

    #[inline]
    pub fn rates_mut(&mut self) -> &mut MutationRates {
        &mut self.rates
    }

    pub fn compatibility_distance(&self, other: &Self, config: &Config) -> f64 {
        delta(
            &self.genes,
            &other.genes,
            config.delta_disjoint,
            config.delta_weights,
        )
    }

    pub fn same_specie(&self, other: &Self, config: &Config) -> bool {
        self.compatibility_distance(other, config) < config.delta_threshold
    }

    pub fn network(&self, passes: usize) -> Network {
        Network::from_genome(self, passes)
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

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        assert_f64_approx,
        mutation::Mutation,
        random::{default_rng, ProbBinding, ProbStatic, WyRng},
    };

    fn gene(inno: u64, from: usize, to: usize, weight: f64) -> Gene {
        Gene {
            inno,
            from,
            to,
            weight,
            enabled: true,
        }
    }

    #[test]
    fn test_genome_creation() {
        let genome = Genome::basic(3, 2, MutationRates::default());
        assert_eq!(genome.sensory().len(), 3);
        assert_eq!(genome.action().len(), 2);
        assert_eq!(genome.bias(), 5);
        assert_eq!(genome.max_node(), 5);
        assert_eq!(genome.nodes(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(genome.node_kind(0), NodeKind::Sensory);
        assert_eq!(genome.node_kind(3), NodeKind::Action);
        assert_eq!(genome.node_kind(5), NodeKind::Bias);
        assert_eq!(genome.node_kind(6), NodeKind::Internal);
        assert!(genome.genes().is_empty());
        assert!(!genome.is_measured());
        assert_eq!(genome.fitness(), 0.);
    }

    #[test]
    fn test_genome_creation_empty() {
        let genome = Genome::basic(0, 0, MutationRates::default());
        assert_eq!(genome.nodes(), vec![0]);
        assert_eq!(genome.node_kind(0), NodeKind::Bias);
    }

    #[test]
    fn test_from_genes_max_node() {
        let genome = Genome::from_genes(
            2,
            1,
            vec![gene(0, 0, 9, 1.), gene(1, 9, 2, 1.), gene(2, 1, 4, 1.)],
            MutationRates::default(),
        );
        assert_eq!(genome.max_node(), 9);
        assert_eq!(genome.nodes(), vec![0, 1, 2, 3, 4, 9]);
        assert_eq!(genome.clone().with_max_node(4).max_node(), 9);
        assert_eq!(genome.with_max_node(12).max_node(), 12);
    }

    #[test]
    fn test_open_path() {
        let mut genome = Genome::basic(1, 1, MutationRates::default());
        let mut rng = default_rng();
        for _ in 0..100 {
            match genome.open_path(&mut rng, None) {
                Some((0, 1)) | Some((2, 1)) => {} // sensory -> action, bias -> action
                Some(p) => unreachable!("invalid pair {p:?} gen'd"),
                None => unreachable!("no path gen'd"),
            }
        }

        genome.push_gene(Gene::new(2, 1, 1., &mut InnoGen::new(0)));
        for _ in 0..100 {
            assert_eq!(genome.open_path(&mut rng, None), Some((0, 1)));
            assert_eq!(genome.open_path(&mut rng, Some(2)), None);
        }
    }

    #[test]
    fn test_open_path_hidden() {
        let genome = Genome::from_genes(
            1,
            1,
            vec![gene(0, 0, 3, 1.), gene(1, 3, 1, 1.)],
            MutationRates::default(),
        );
        let mut rng = default_rng();
        for _ in 0..500 {
            let (from, to) = genome.open_path(&mut rng, None).unwrap();
            assert_ne!(from, to);
            assert!(!genome.contains_path((from, to)));
            assert!(matches!(
                genome.node_kind(from),
                NodeKind::Sensory | NodeKind::Bias | NodeKind::Internal
            ));
            assert!(matches!(
                genome.node_kind(to),
                NodeKind::Action | NodeKind::Internal
            ));
        }
    }

    #[test]
    fn test_open_path_none_possible() {
        let genome = Genome::basic(0, 0, MutationRates::default());
        assert_eq!(genome.open_path(&mut default_rng(), None), None);

        let mut inno = InnoGen::new(0);
        let mut saturated = Genome::basic(2, 1, MutationRates::default());
        for from in 0..=3 {
            if from != 2 {
                saturated.push_gene(Gene::new(from, 2, 1., &mut inno));
            }
        }
        assert_eq!(saturated.open_path(&mut default_rng(), None), None);
    }

    #[test]
    fn test_fitness_measurement() {
        let mut genome = Genome::basic(1, 1, MutationRates::default());
        genome.set_fitness(0.);
        assert!(genome.is_measured());
        assert_eq!(genome.fitness(), 0.);
        genome.set_fitness(-3.);
        assert_eq!(genome.fitness(), -3.);
        genome.clear_fitness();
        assert!(!genome.is_measured());
    }

    #[test]
    fn test_distance_symmetric() {
        let config = Config::default();
        let l = Genome::from_genes(
            2,
            1,
            vec![gene(0, 0, 2, 0.3), gene(1, 1, 2, -0.8), gene(4, 3, 2, 1.1)],
            MutationRates::default(),
        );
        let r = Genome::from_genes(
            2,
            1,
            vec![gene(0, 0, 2, -0.1), gene(1, 1, 2, 0.4), gene(7, 0, 5, 2.)],
            MutationRates::default(),
        );
        assert_eq!(
            l.compatibility_distance(&r, &config),
            r.compatibility_distance(&l, &config)
        );
        assert_eq!(l.compatibility_distance(&l, &config), 0.);
        assert!(l.same_specie(&l, &config));
        // 2 disjoint of 3 genes, avg diff (0.4 + 1.2) / 2
        let want = 2. * 2. / 3. + 0.4 * 0.8;
        assert!((l.compatibility_distance(&r, &config) - want).abs() < 1e-12);
    }

    #[test]
    fn test_distance_symmetric_mutated() {
        let config = Config::default();
        let mutation = Mutation::default();
        let mut inno = InnoGen::new(0);
        let mut rng = ProbBinding::new(ProbStatic::default(), WyRng::seeded(21));
        let mut genomes = Vec::new();
        for rounds in 1..=8 {
            let mut genome = Genome::basic(3, 2, MutationRates::default());
            for _ in 0..rounds * 3 {
                mutation.mutate(&mut genome, &mut inno, &mut rng);
            }
            genomes.push(genome);
        }

        for l in genomes.iter() {
            assert_eq!(l.compatibility_distance(l, &config), 0.);
            for r in genomes.iter() {
                assert_f64_approx!(
                    l.compatibility_distance(r, &config),
                    r.compatibility_distance(l, &config),
                    1e-12
                );
            }
        }
    }

    #[test]
    fn test_serialize() {
        let mut genome = Genome::from_genes(
            2,
            1,
            vec![gene(0, 0, 2, 0.3), gene(1, 1, 2, -0.8)],
            MutationRates::default(),
        );
        genome.set_fitness(12.5);
        assert_eq!(Genome::from_str(&genome.to_string().unwrap()).unwrap(), genome);
    }
}
