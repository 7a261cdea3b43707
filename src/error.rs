use thiserror::Error;

/// Boxed error returned by external collaborators, such as an [crate::Actuator]
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    /// Both parents of a crossover had no genes
    #[error("cannot crossover two genomes without genes")]
    InvalidCrossover,

    #[error("cannot average the fitness of an empty specie")]
    EmptySpecie,

    #[error("actuator {name} failed to apply: {source}")]
    ActuatorApply {
        name: String,
        #[source]
        source: BoxError,
    },

    /// The pool holds no genome at its cursor
    #[error("no genome at the pool cursor")]
    MissingCurrentGenome,

    /// Fitness must be finite to be ranked and persisted
    #[error("fitness {fitness} is not a finite number")]
    NonFiniteFitness { fitness: f64 },

    #[error("{count} genomes have no fitness recorded for this generation")]
    Unmeasured { count: usize },

    #[error("expected {expected} values, got {got}")]
    Shape { expected: usize, got: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
