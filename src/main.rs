use neatpool::{random::default_rng, Config, Genome, Pool};
use std::{env, error::Error};

const GENERATIONS: usize = 500;
const TARGET: f64 = 3.9;

const XOR: [([f64; 2], f64); 4] = [
    ([0., 0.], -1.),
    ([1., 1.], -1.),
    ([1., 0.], 1.),
    ([0., 1.], 1.),
];

/// 4 for a perfect xor, where outputs are read as -1 for false and 1 for true
fn xor(genome: &Genome, passes: usize) -> f64 {
    let network = genome.network(passes);
    XOR.iter().fold(4., |fit, (input, want)| {
        let v = network.evaluate(input)[0];
        fit - (want - v).abs() / 2.
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let passes = config.relaxation_passes;

    let mut rng = default_rng();
    let mut pool = Pool::init(2, 1, config, &mut rng)?;

    for _ in 0..GENERATIONS {
        pool.evaluate_all(|genome| xor(genome, passes))?;
        if pool.max_fitness() >= TARGET {
            break;
        }
        pool.next_generation(&mut rng)?;
    }

    let best = pool
        .best_genome()
        .ok_or("the pool holds no genomes")?;
    println!(
        "best of generation {}: {:.4} with {} genes",
        pool.generation(),
        best.fitness(),
        best.genes().len()
    );
    for (input, want) in XOR {
        let v = best.network(passes).evaluate(&input)[0];
        println!("{input:?} -> {v:.4} (want {want})");
    }
    Ok(())
}
