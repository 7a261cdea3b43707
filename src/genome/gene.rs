use super::InnoGen;
use serde::{Deserialize, Serialize};

/// A single weighted connection between two nodes of a genome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub inno: u64,
    pub from: usize,
    pub to: usize,
    pub weight: f64,
    pub enabled: bool,
}

impl Gene {
    pub fn new(from: usize, to: usize, weight: f64, inno: &mut InnoGen) -> Self {
        Self {
            inno: inno.path((from, to)),
            from,
            to,
            weight,
            enabled: true,
        }
    }

    #[inline]
    pub fn path(&self) -> (usize, usize) {
        (self.from, self.to)
    }

    #[inline]
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    #[inline]
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Absolute weight difference to a gene of the same innovation
    #[inline]
    pub fn weight_diff(&self, other: &Self) -> f64 {
        (self.weight - other.weight).abs()
    }

    /// Split this gene through `center`, disabling it. Returns the genes
    /// from -{1.}> center and center -{w}> to
    pub fn bisect(&mut self, center: usize, inno: &mut InnoGen) -> (Self, Self) {
        self.disable();
        (
            Self {
                inno: inno.path((self.from, center)),
                from: self.from,
                to: center,
                weight: 1.,
                enabled: true,
            },
            Self {
                inno: inno.path((center, self.to)),
                from: center,
                to: self.to,
                weight: self.weight,
                enabled: true,
            },
        )
    }
}

impl Default for Gene {
    fn default() -> Self {
        Self {
            inno: 0,
            from: 0,
            to: 0,
            weight: 0.,
            enabled: true,
        }
    }
}
