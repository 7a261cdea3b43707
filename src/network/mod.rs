//! Networks compiled from a [Genome] in order to express its behaviour. A network is stateless:
//! every evaluation starts from zeroed nodes, so the same input always gives the same output.

use crate::{constants::NEATPOOL_BIAS_VALUE, genome::Genome};
use core::{cmp::Reverse, ops::Range};
use fxhash::FxHashMap;
use std::collections::BinaryHeap;

pub mod activate {
    use core::f64::consts::E;

    /// Steepened sigmoid rescaled to (-1, 1), so that σ(0) = 0
    pub fn sigmoid(x: f64) -> f64 {
        2. / (1. + E.powf(-4.9 * x)) - 1.
    }
}

#[derive(Debug, Clone)]
pub struct Network {
    sensory: Range<usize>,
    action: Range<usize>,
    bias: usize,
    /// slot -> node id
    ids: Vec<usize>,
    /// slots of every non-input node, in evaluation order
    order: Vec<usize>,
    /// per slot, the (source slot, weight) of every enabled incoming gene
    incoming: Vec<Vec<(usize, f64)>>,
    passes: usize,
    cyclic: bool,
}

impl Network {
    /// Compile the enabled genes of `genome`. A cyclic network relaxes over `passes` passes
    pub fn from_genome(genome: &Genome, passes: usize) -> Self {
        let bias = genome.bias();
        let ids = genome.nodes();
        let slots = ids
            .iter()
            .enumerate()
            .map(|(slot, id)| (*id, slot))
            .collect::<FxHashMap<_, _>>();

        let mut incoming = vec![Vec::new(); ids.len()];
        let mut dependents = vec![Vec::new(); ids.len()];
        let mut pending = vec![0usize; ids.len()];
        for gene in genome.genes().iter().filter(|g| g.enabled) {
            let (Some(&from), Some(&to)) = (slots.get(&gene.from), slots.get(&gene.to)) else {
                continue;
            };
            incoming[to].push((from, gene.weight));
            if from > bias || genome.action().contains(&from) {
                dependents[from].push(to);
                pending[to] += 1;
            }
        }

        let is_input = |slot: usize| slot <= bias && !genome.action().contains(&slot);
        let mut ready = (0..ids.len())
            .filter(|slot| !is_input(*slot) && pending[*slot] == 0)
            .map(Reverse)
            .collect::<BinaryHeap<_>>();

        let mut order = Vec::with_capacity(ids.len());
        let mut placed = vec![false; ids.len()];
        while let Some(Reverse(slot)) = ready.pop() {
            order.push(slot);
            placed[slot] = true;
            for dependent in dependents[slot].iter() {
                pending[*dependent] -= 1;
                if pending[*dependent] == 0 {
                    ready.push(Reverse(*dependent));
                }
            }
        }

        let cyclic = (0..ids.len()).any(|slot| !is_input(slot) && !placed[slot]);
        order.extend((0..ids.len()).filter(|slot| !is_input(*slot) && !placed[*slot]));

        Self {
            sensory: genome.sensory(),
            action: genome.action(),
            bias,
            ids,
            order,
            incoming,
            passes: if cyclic { passes.max(1) } else { 1 },
            cyclic,
        }
    }

    #[inline]
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    #[inline]
    pub fn passes(&self) -> usize {
        self.passes
    }

    fn run(&self, inputs: &[f64]) -> Vec<f64> {
        debug_assert!(inputs.len() == self.sensory.len());
        let mut values = vec![0.; self.ids.len()];
        for (slot, v) in self.sensory.clone().zip(inputs) {
            values[slot] = *v;
        }
        values[self.bias] = NEATPOOL_BIAS_VALUE;

        for _ in 0..self.passes {
            for slot in self.order.iter() {
                let edges = &self.incoming[*slot];
                if edges.is_empty() {
                    continue;
                }
                let sum = edges
                    .iter()
                    .map(|(from, weight)| values[*from] * weight)
                    .sum::<f64>();
                values[*slot] = activate::sigmoid(sum);
            }
        }
        values
    }

    /// Evaluate on `inputs`, ordered by sensory id, and return the action values in action id order
    pub fn evaluate(&self, inputs: &[f64]) -> Vec<f64> {
        let values = self.run(inputs);
        values[self.action.clone()].to_vec()
    }

    /// Evaluate on `inputs` and return the value of every node by id
    pub fn activations(&self, inputs: &[f64]) -> FxHashMap<usize, f64> {
        self.run(inputs)
            .into_iter()
            .enumerate()
            .map(|(slot, v)| (self.ids[slot], v))
            .collect()
    }
}
