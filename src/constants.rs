//! Centralized constants for neatpool evolution parameters.
//!
//! All defaults are defined here with the `NEATPOOL_` prefix. [crate::Config] starts from these,
//! so a config file only needs to name the values it changes.

// ============================================================================
// Population Parameters
// ============================================================================

/// Number of genomes alive after every generation transition
pub const NEATPOOL_POPULATION: usize = 300;

/// Coefficient for the normalized disjoint gene count in compatibility distance
pub const NEATPOOL_DELTA_DISJOINT: f64 = 2.0;

/// Coefficient for the average weight difference of matching genes
pub const NEATPOOL_DELTA_WEIGHTS: f64 = 0.4;

/// Genomes closer than this to a specie representative join that specie
pub const NEATPOOL_DELTA_THRESHOLD: f64 = 1.0;

/// Generations without improvement before a specie is removed
pub const NEATPOOL_STALE_SPECIES: usize = 15;

// ============================================================================
// Breeding Parameters
// ============================================================================

/// Probability that a child is bred by crossover rather than cloned
pub const NEATPOOL_CROSSOVER_PROB: f64 = 0.75;

/// Probability that a gene disabled in either parent stays disabled in the child
pub const NEATPOOL_KEEP_DISABLED_PROB: f64 = 0.75;

/// Probability of taking a matching gene from the second parent when fitness is tied
pub const NEATPOOL_PICK_TIED_PROB: f64 = 0.5;

// ============================================================================
// Weight Mutation Parameters
// ============================================================================

/// Probability of perturbing a weight vs replacing it
pub const NEATPOOL_PERTURB_PROB: f64 = 0.90;

/// Perturbations are drawn from [-step, step)
pub const NEATPOOL_STEP_SIZE: f64 = 0.1;

/// New weights are drawn from [-range, range)
pub const NEATPOOL_WEIGHT_RANGE: f64 = 2.0;

/// Rate self-adaptation factors, one of which is applied to every rate on each mutation
pub const NEATPOOL_RATE_DECAY: f64 = 0.95;
pub const NEATPOOL_RATE_GROWTH: f64 = 1.05263;

// ============================================================================
// Genome Mutation Rates
// ============================================================================

pub const NEATPOOL_CONNECTIONS_RATE: f64 = 0.25;
pub const NEATPOOL_LINK_RATE: f64 = 2.0;
pub const NEATPOOL_BIAS_RATE: f64 = 0.40;
pub const NEATPOOL_NODE_RATE: f64 = 0.50;
pub const NEATPOOL_ENABLE_RATE: f64 = 0.2;
pub const NEATPOOL_DISABLE_RATE: f64 = 0.4;

// ============================================================================
// Network Parameters
// ============================================================================

/// Relaxation passes for networks whose enabled connections form a cycle
pub const NEATPOOL_RELAXATION_PASSES: usize = 8;

/// Constant value of the bias node
pub const NEATPOOL_BIAS_VALUE: f64 = 1.0;
