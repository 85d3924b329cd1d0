//! Externally imposed structure constraints.
//!
//! A caller (typically a front end that parsed a dot-parens string) may pin
//! parts of the structure before the calculation runs. Constraints never
//! raise errors inside the recursions; a candidate structure that violates
//! them simply contributes zero.

use crate::types::{Pos, RingfoldError};

/// Structure constraints applied to one calculation.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    /// When present, `allowed[i][j]` must be true for positions `i` and `j`
    /// to pair. Absent means every pair is allowed.
    force_base_pair: Option<Vec<Vec<bool>>>,
    /// When present, position `i` being flagged means it must end up paired,
    /// so loop extension over it is disallowed.
    in_forced_base_pair: Option<Vec<bool>>,
}

impl Constraints {
    /// No constraints: every pair allowed, every position free.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Constrains the structure to contain exactly the given pairs.
    ///
    /// Each listed `(i, j)` pair is forced: both orientations are marked
    /// allowed, every other pairing of a listed position is forbidden, and
    /// the listed positions are flagged as committed so loop extension
    /// cannot skip them. Unlisted positions remain free to pair with each
    /// other.
    ///
    /// # Errors
    ///
    /// Returns [`RingfoldError::InvalidConstraint`] if a position is out of
    /// range or listed twice.
    pub fn with_forced_pairs(n: usize, pairs: &[(usize, usize)]) -> Result<Self, RingfoldError> {
        let mut allowed = vec![vec![true; n]; n];
        let mut committed = vec![false; n];
        for &(i, j) in pairs {
            if i >= n || j >= n || i == j {
                return Err(RingfoldError::InvalidConstraint(format!(
                    "forced pair ({i}, {j}) is out of range for length {n}"
                )));
            }
            if committed[i] || committed[j] {
                return Err(RingfoldError::InvalidConstraint(format!(
                    "position {} is forced into more than one pair",
                    if committed[i] { i } else { j }
                )));
            }
            committed[i] = true;
            committed[j] = true;
        }
        for i in 0..n {
            for j in 0..n {
                if committed[i] || committed[j] {
                    allowed[i][j] = false;
                }
            }
        }
        for &(i, j) in pairs {
            allowed[i][j] = true;
            allowed[j][i] = true;
        }
        Ok(Self {
            force_base_pair: Some(allowed),
            in_forced_base_pair: Some(committed),
        })
    }

    /// Whether positions `i` and `j` are permitted to pair.
    #[inline]
    #[must_use]
    pub fn pair_allowed(&self, n: usize, i: Pos, j: Pos) -> bool {
        match &self.force_base_pair {
            Some(allowed) => allowed[crate::topology::wrap(i, n)][crate::topology::wrap(j, n)],
            None => true,
        }
    }

    /// Whether position `j` may be left unpaired by a loop extension.
    #[inline]
    #[must_use]
    pub fn loop_extension_allowed(&self, n: usize, j: Pos) -> bool {
        match &self.in_forced_base_pair {
            Some(committed) => !committed[crate::topology::wrap(j, n)],
            None => true,
        }
    }

    /// Checks the constraint tables match the sequence length.
    ///
    /// # Errors
    ///
    /// Returns [`RingfoldError::InvalidConstraint`] on a dimension mismatch.
    pub fn validate(&self, n: usize) -> Result<(), RingfoldError> {
        if let Some(allowed) = &self.force_base_pair {
            if allowed.len() != n || allowed.iter().any(|row| row.len() != n) {
                return Err(RingfoldError::InvalidConstraint(format!(
                    "forced-pair matrix does not match sequence length {n}"
                )));
            }
        }
        if let Some(committed) = &self.in_forced_base_pair {
            if committed.len() != n {
                return Err(RingfoldError::InvalidConstraint(format!(
                    "forced-position vector does not match sequence length {n}"
                )));
            }
        }
        Ok(())
    }
}
