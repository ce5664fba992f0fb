// Weight tables - integer weights normalized into cumulative probabilities
// Discrete sampling resolves a uniform draw in [0,1) by linear scan

use thiserror::Error;

/// Errors raised while normalizing or validating a weight table
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeightError {
    #[error("weight table is empty")]
    Empty,

    #[error("weight table sums to zero")]
    ZeroSum,

    #[error("duration table has {got} entries but only {max} durations exist")]
    TooManyDurations { got: usize, max: usize },

    #[error("function table has {got} entries but the policy defines {expected} functions")]
    FunctionCount { got: usize, expected: usize },

    #[error("state table has {got} entries but the looper defines {expected} states")]
    StateCount { got: usize, expected: usize },
}

/// A normalized discrete distribution over table indices
///
/// Stores the cumulative form of the raw integer weights: non-decreasing
/// floats in (0, 1] with the last entry exactly 1.0. A zero-weight entry
/// repeats the previous cumulative value and is therefore unreachable.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    cumulative: Vec<f64>,
}

impl WeightTable {
    /// Normalize raw integer weights into a cumulative table
    pub fn normalize(weights: &[u32]) -> Result<Self, WeightError> {
        if weights.is_empty() {
            return Err(WeightError::Empty);
        }
        let sum: u64 = weights.iter().map(|&w| w as u64).sum();
        if sum == 0 {
            return Err(WeightError::ZeroSum);
        }

        let mut cumulative = Vec::with_capacity(weights.len());
        let mut acc = 0u64;
        for &w in weights {
            acc += w as u64;
            cumulative.push(acc as f64 / sum as f64);
        }
        // The integer accumulation makes the final ratio exactly sum/sum
        debug_assert_eq!(*cumulative.last().unwrap(), 1.0);
        Ok(Self { cumulative })
    }

    /// Smallest index `i` such that `r < cumulative[i]`
    ///
    /// `r` must be in [0, 1); the final cumulative entry is 1.0, so the
    /// scan always terminates on a valid index.
    pub fn resolve(&self, r: f64) -> usize {
        self.cumulative
            .iter()
            .position(|&p| r < p)
            .unwrap_or(self.cumulative.len() - 1)
    }

    /// Number of entries in the table
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    /// True when the table has no entries (never, by construction)
    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }
}
