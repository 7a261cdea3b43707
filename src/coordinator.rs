//! Stepwise evaluation of a [Pool] against the outside world, one genome per tick.
//! A host reads the sensors, steps the current genome as often as its scenario needs, and
//! finishes the genome with the fitness it earned.

use crate::{
    config::Config,
    error::BoxError,
    genome::Genome,
    pool::{Advance, Pool},
    store::PoolStore,
    Error,
};
use rand::RngCore;

/// Named sensor readings. The number and order of readings is fixed for a run
pub trait Inputs {
    fn current_values(&mut self) -> Vec<(String, f64)>;
}

/// A named output accepting one numeric command per step
pub trait Actuator {
    fn name(&self) -> &str;
    fn apply(&mut self, value: f64) -> Result<(), BoxError>;
}

/// The outcome of one step. Actuators are applied in order until the first failure
#[derive(Debug)]
pub struct StepReport {
    pub outputs: Vec<f64>,
    /// How many actuators accepted their command
    pub applied: usize,
    pub failure: Option<Error>,
}

impl StepReport {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }
}

fn drive<I: Inputs>(
    genome: &Genome,
    passes: usize,
    inputs: &mut I,
    actuators: &mut [Box<dyn Actuator>],
) -> Result<StepReport, Error> {
    let values = inputs
        .current_values()
        .into_iter()
        .map(|(_, v)| v)
        .collect::<Vec<_>>();
    if values.len() != genome.sensory().len() {
        return Err(Error::Shape {
            expected: genome.sensory().len(),
            got: values.len(),
        });
    }

    let outputs = genome.network(passes).evaluate(&values);
    let mut report = StepReport {
        outputs,
        applied: 0,
        failure: None,
    };
    for (actuator, value) in actuators.iter_mut().zip(report.outputs.iter()) {
        if let Err(source) = actuator.apply(*value) {
            let failure = Error::ActuatorApply {
                name: actuator.name().to_string(),
                source,
            };
            log::warn!("{failure}");
            report.failure = Some(failure);
            break;
        }
        report.applied += 1;
    }
    Ok(report)
}

pub struct Coordinator<S: PoolStore, I: Inputs, R: RngCore> {
    store: S,
    inputs: I,
    actuators: Vec<Box<dyn Actuator>>,
    pool: Pool,
    rng: R,
}

impl<S: PoolStore, I: Inputs, R: RngCore> Coordinator<S, I, R> {
    /// Resume the pool saved in `store`, or seed and save a fresh one shaped after `inputs` and
    /// `actuators`
    pub fn new(
        mut store: S,
        mut inputs: I,
        actuators: Vec<Box<dyn Actuator>>,
        config: Config,
        mut rng: R,
    ) -> Result<Self, Error> {
        let sensory = inputs.current_values().len();
        let action = actuators.len();

        let pool = match store.load_pool()? {
            Some(pool) => {
                if pool.sensory() != sensory {
                    return Err(Error::Shape {
                        expected: pool.sensory(),
                        got: sensory,
                    });
                }
                if pool.action() != action {
                    return Err(Error::Shape {
                        expected: pool.action(),
                        got: action,
                    });
                }
                log::info!(
                    "resuming generation {} at {:?}",
                    pool.generation(),
                    pool.cursor()
                );
                pool
            }
            None => {
                let pool = Pool::init(sensory, action, config, &mut rng)?;
                store.save_pool(&pool)?;
                pool
            }
        };

        Ok(Self {
            store,
            inputs,
            actuators,
            pool,
            rng,
        })
    }

    /// Evaluate the genome at the cursor once and apply its outputs
    pub fn step(&mut self) -> Result<StepReport, Error> {
        let genome = self.pool.current().ok_or(Error::MissingCurrentGenome)?;
        drive(
            genome,
            self.pool.config().relaxation_passes,
            &mut self.inputs,
            &mut self.actuators,
        )
    }

    /// Evaluate the best genome of the pool once and apply its outputs
    pub fn step_best(&mut self) -> Result<StepReport, Error> {
        let genome = self.pool.best_genome().ok_or(Error::MissingCurrentGenome)?;
        drive(
            genome,
            self.pool.config().relaxation_passes,
            &mut self.inputs,
            &mut self.actuators,
        )
    }

    pub fn fitness_already_measured(&self) -> bool {
        self.pool.fitness_already_measured()
    }

    /// Record the fitness of the genome at the cursor and move on, breeding the next
    /// generation when this was the last genome to measure. The pool is saved after both
    pub fn finish(&mut self, fitness: f64) -> Result<Advance, Error> {
        self.pool.record_fitness(fitness)?;
        self.store.save_pool(&self.pool)?;
        let advance = self.pool.advance(&mut self.rng)?;
        self.store.save_pool(&self.pool)?;
        Ok(advance)
    }

    #[inline]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
