//! Genetic distance and crossover between genomes, keyed by innovation number.

use crate::{
    genome::{Gene, Genome},
    random::{EvolutionEvent, Happens},
    Error,
};
use core::cmp::{max, Ordering};
use fxhash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

fn by_inno(genes: &[Gene]) -> BTreeMap<u64, &Gene> {
    genes.iter().map(|g| (g.inno, g)).collect()
}

/// Number of innovation ids present in exactly one of `l` and `r`
pub fn disjoint_count(l: &[Gene], r: &[Gene]) -> usize {
    let l_innos = l.iter().map(|g| g.inno).collect::<FxHashSet<_>>();
    let r_innos = r.iter().map(|g| g.inno).collect::<FxHashSet<_>>();
    l_innos.symmetric_difference(&r_innos).count()
}

/// Mean absolute weight difference of genes sharing an innovation id. Matching ids are summed in
/// ascending order, so the result is identical whichever side is `l`.
/// If genomes share no innovation ids, their average diff is 0
pub fn avg_weight_diff(l: &[Gene], r: &[Gene]) -> f64 {
    let (l, r) = (by_inno(l), by_inno(r));
    let (count, sum) = l
        .iter()
        .filter_map(|(inno, l_gene)| r.get(inno).map(|r_gene| l_gene.weight_diff(r_gene)))
        .fold((0usize, 0.), |(count, sum), diff| (count + 1, sum + diff));

    if count == 0 {
        0.
    } else {
        sum / count as f64
    }
}

/// Compatibility distance between two gene sets
pub fn delta(l: &[Gene], r: &[Gene], disjoint_coefficient: f64, weight_coefficient: f64) -> f64 {
    let size = max(l.len(), r.len());
    let disjoint = if size == 0 {
        0.
    } else {
        disjoint_count(l, r) as f64 / size as f64
    };

    disjoint_coefficient * disjoint + weight_coefficient * avg_weight_diff(l, r)
}

/// Cross the genes of `l` with those of `r`, where `l_fit` is how `l`'s fitness compares with
/// `r`'s. Matching genes come from the fitter side (either side on a tie), disjoint genes from
/// the fitter side only (both sides on a tie). A gene disabled in either parent stays disabled
/// with [EvolutionEvent::KeepDisabled]. Genes whose enabled path is already in the child are
/// skipped.
pub fn crossover_genes(
    l: &[Gene],
    r: &[Gene],
    l_fit: Ordering,
    rng: &mut impl Happens,
) -> Vec<Gene> {
    let (fitter, other) = match l_fit {
        Ordering::Less => (r, l),
        _ => (l, r),
    };
    let tied = l_fit == Ordering::Equal;
    let other_innos = other
        .iter()
        .map(|g| (g.inno, g))
        .collect::<FxHashMap<_, _>>();

    let mut child = Vec::with_capacity(if tied {
        max(fitter.len(), other.len())
    } else {
        fitter.len()
    });
    let mut enabled_paths = FxHashSet::default();
    let mut push = |gene: Gene, child: &mut Vec<Gene>| {
        if gene.enabled && !enabled_paths.insert(gene.path()) {
            return;
        }
        child.push(gene);
    };

    for gene in fitter {
        let inherited = match other_innos.get(&gene.inno) {
            Some(matched) => {
                let mut pick = if tied && rng.happens(EvolutionEvent::PickTied) {
                    (*matched).clone()
                } else {
                    gene.clone()
                };
                if !gene.enabled || !matched.enabled {
                    pick.enabled = !rng.happens(EvolutionEvent::KeepDisabled);
                }
                pick
            }
            None => gene.clone(),
        };
        push(inherited, &mut child);
    }

    if tied {
        let fitter_innos = fitter.iter().map(|g| g.inno).collect::<FxHashSet<_>>();
        for gene in other.iter().filter(|g| !fitter_innos.contains(&g.inno)) {
            push(gene.clone(), &mut child);
        }
    }

    child
}

/// Breed a child from two genomes. The child takes the fitter parent's mutation rates, and
/// enough node ids to never reuse either parent's hidden nodes.
pub fn crossover(l: &Genome, r: &Genome, rng: &mut impl Happens) -> Result<Genome, Error> {
    if l.genes().is_empty() && r.genes().is_empty() {
        return Err(Error::InvalidCrossover);
    }

    let l_fit = l
        .fitness()
        .partial_cmp(&r.fitness())
        .unwrap_or(Ordering::Equal);
    let fitter = if l_fit == Ordering::Less { r } else { l };
    let genes = crossover_genes(l.genes(), r.genes(), l_fit, rng);

    Ok(Genome::from_genes(
        fitter.sensory().len(),
        fitter.action().len(),
        genes,
        fitter.rates().clone(),
    )
    .with_max_node(max(l.max_node(), r.max_node())))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        genome::MutationRates,
        random::{ProbBinding, ProbStatic, WyRng},
        test_t,
    };
    use rand::{rngs::StdRng, SeedableRng};

    fn gene(inno: u64, from: usize, to: usize, weight: f64, enabled: bool) -> Gene {
        Gene {
            inno,
            from,
            to,
            weight,
            enabled,
        }
    }

    fn innos(genes: &[Gene]) -> Vec<u64> {
        let mut innos = genes.iter().map(|g| g.inno).collect::<Vec<_>>();
        innos.sort();
        innos
    }

    fn parents() -> (Genome, Genome) {
        let mut l = Genome::from_genes(
            2,
            1,
            vec![
                gene(1, 0, 2, 0.5, true),
                gene(2, 1, 2, -0.5, false),
                gene(3, 3, 2, 1.0, true),
            ],
            MutationRates::default(),
        );
        let mut r = Genome::from_genes(
            2,
            1,
            vec![
                gene(1, 0, 2, 0.0, true),
                gene(2, 1, 2, -1.0, true),
                gene(5, 0, 4, 2.0, true),
                gene(6, 4, 2, 2.0, true),
            ],
            MutationRates::default(),
        );
        l.set_fitness(10.);
        r.set_fitness(5.);
        (l, r)
    }

    #[test]
    fn test_avg_weight_diff() {
        let (l, r) = parents();
        // matching 1 and 2: (0.5 + 0.5) / 2
        assert_eq!(avg_weight_diff(l.genes(), r.genes()), 0.5);
        assert_eq!(avg_weight_diff(l.genes(), &[]), 0.);
        assert_eq!(avg_weight_diff(&[], &[]), 0.);
        assert_eq!(
            avg_weight_diff(l.genes(), &[gene(9, 0, 0, 1., true)]),
            0.,
            "no overlapping innovation"
        );
        assert_eq!(avg_weight_diff(l.genes(), l.genes()), 0.);
    }

    #[test]
    fn test_disjoint_count() {
        let (l, r) = parents();
        assert_eq!(disjoint_count(l.genes(), r.genes()), 3);
        assert_eq!(disjoint_count(r.genes(), l.genes()), 3);
        assert_eq!(disjoint_count(l.genes(), &[]), 3);
        assert_eq!(disjoint_count(&[], &[]), 0);
    }

    #[test]
    fn test_delta() {
        let (l, r) = parents();
        assert_eq!(delta(&[], &[], 2., 0.4), 0.);
        assert_eq!(
            delta(l.genes(), r.genes(), 2., 0.4),
            delta(r.genes(), l.genes(), 2., 0.4)
        );
        assert_eq!(delta(l.genes(), r.genes(), 2., 0.4), 2. * 3. / 4. + 0.4 * 0.5);
    }

    test_t!(
    crossover_fitter_side[T: WyRng | StdRng]() {
        let mut rng = ProbBinding::new(ProbStatic::default(), T::seed_from_u64(1));
        let (l, r) = parents();
        for _ in 0..100 {
            let child = crossover(&l, &r, &mut rng).unwrap();
            assert_eq!(innos(child.genes()), vec![1, 2, 3]);
            assert_eq!(child.genes()[0].weight, 0.5, "matching genes come from the fitter");
            assert_eq!(child.max_node(), 4);
            assert!(!child.is_measured());

            let flipped = crossover(&r, &l, &mut rng).unwrap();
            assert_eq!(innos(flipped.genes()), vec![1, 2, 3]);
        }
    });

    test_t!(
    crossover_tied[T: WyRng | StdRng]() {
        let mut rng = ProbBinding::new(ProbStatic::default(), T::seed_from_u64(2));
        let (mut l, r) = parents();
        l.set_fitness(r.fitness());
        for _ in 0..100 {
            let child = crossover(&l, &r, &mut rng).unwrap();
            assert_eq!(innos(child.genes()), vec![1, 2, 3, 5, 6]);
        }
    });

    test_t!(
    crossover_keep_disabled[T: WyRng | StdRng]() {
        let mut rng = ProbBinding::new(ProbStatic::default(), T::seed_from_u64(3));
        let (l, r) = parents();
        let trials = 10_000;
        let disabled = (0..trials)
            .filter(|_| !crossover(&l, &r, &mut rng).unwrap().genes()[1].enabled)
            .count() as f64;
        let expected = 0.75 * trials as f64;
        assert!((disabled - expected).abs() < 0.05 * expected, "{disabled}");
    });

    test_t!(
    crossover_self[T: WyRng | StdRng]() {
        let mut rng = ProbBinding::new(ProbStatic::default(), T::seed_from_u64(4));
        let (l, _) = parents();
        let mut enabled = 0;
        let trials = 1000;
        for _ in 0..trials {
            let child = crossover(&l, &l, &mut rng).unwrap();
            assert_eq!(innos(child.genes()), innos(l.genes()));
            for (c, g) in child.genes().iter().zip(l.genes()) {
                assert_eq!(c.path(), g.path());
                assert_eq!(c.weight, g.weight);
                if g.enabled {
                    assert!(c.enabled);
                }
            }
            enabled += child.genes().iter().filter(|g| g.enabled).count();
        }
        let own = l.genes().iter().filter(|g| g.enabled).count();
        assert!(enabled >= own * trials);
    });

    #[test]
    fn test_crossover_skips_duplicate_paths() {
        let mut rng = ProbBinding::new(ProbStatic::default(), WyRng::seeded(5));
        let mut l = Genome::from_genes(
            1,
            1,
            vec![gene(1, 0, 1, 1.0, true)],
            MutationRates::default(),
        );
        let mut r = Genome::from_genes(
            1,
            1,
            vec![gene(8, 0, 1, -1.0, true)],
            MutationRates::default(),
        );
        l.set_fitness(1.);
        r.set_fitness(1.);
        let child = crossover(&l, &r, &mut rng).unwrap();
        assert_eq!(child.genes().len(), 1);
        assert_eq!(child.genes()[0].inno, 1);
    }

    #[test]
    fn test_crossover_empty() {
        let mut rng = ProbBinding::new(ProbStatic::default(), WyRng::seeded(6));
        let empty = Genome::basic(2, 1, MutationRates::default());
        assert!(matches!(
            crossover(&empty, &empty, &mut rng),
            Err(Error::InvalidCrossover)
        ));

        let (l, _) = parents();
        assert!(crossover(&empty, &l, &mut rng).is_ok());
    }
}
