//! A stepwise NEAT population. Genomes are grouped into species, compiled into networks and
//! measured one at a time by a host, and bred into a new generation once all were measured.

mod macros;

pub mod config;
pub mod constants;
pub mod coordinator;
pub mod crossover;
pub mod error;
pub mod genome;
pub mod mutation;
pub mod network;
pub mod pool;
pub mod random;
pub mod reproduce;
pub mod specie;
pub mod store;

pub use config::Config;
pub use coordinator::{Actuator, Coordinator, Inputs, StepReport};
pub use error::{BoxError, Error};
pub use genome::{Gene, Genome, InnoGen, MutationKind, MutationRates};
pub use mutation::Mutation;
pub use network::{activate, Network};
pub use pool::{Advance, Phase, Pool};
pub use random::{Happens, Probabilities};
pub use specie::Specie;
pub use store::{JsonStore, MemoryStore, PoolStore};
