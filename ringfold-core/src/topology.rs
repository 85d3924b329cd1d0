//! Sequence and strand-connectivity model.
//!
//! A calculation operates on a single circular coordinate system of `N`
//! positions, regardless of how many physical strands are present. Strand
//! boundaries are encoded in the ligation vector: `ligated[i]` is true iff
//! position `i` is covalently bonded to position `(i + 1) mod N`. A single
//! circular strand has every position ligated; a linear strand leaves the
//! wrap-around bond open; a multi-strand complex leaves one bond open per
//! strand boundary.

use bio::alphabets::rna;

use crate::types::{Pos, RingfoldError};

/// Wrap a signed circular position into `0..n`.
///
/// All circular arithmetic in the crate funnels through this function so the
/// modular-index convention lives in exactly one place.
#[inline]
pub fn wrap(i: Pos, n: usize) -> usize {
    i.rem_euclid(n as Pos) as usize
}

/// Immutable sequence plus strand connectivity for one calculation.
#[derive(Debug, Clone)]
pub struct Topology {
    sequence: Vec<u8>,
    ligated: Vec<bool>,
    all_ligated: Vec<Vec<bool>>,
}

impl Topology {
    /// Builds a topology from one or more strands.
    ///
    /// Strands are concatenated onto the circular coordinate system in order;
    /// the bond at the 3' end of each strand is left open. When
    /// `circularized` is true the input must be a single strand, and its
    /// wrap-around bond is closed as well.
    ///
    /// Uppercase residues must belong to the RNA alphabet; lowercase letters
    /// are accepted anywhere and act as wildcard markers that pair only with
    /// an identical lowercase letter.
    ///
    /// # Errors
    ///
    /// Returns [`RingfoldError::InvalidSequence`] for an empty input or a
    /// residue outside the accepted alphabet, and
    /// [`RingfoldError::InvalidTopology`] when circularization is requested
    /// for a multi-strand input.
    pub fn from_strands(strands: &[&str], circularized: bool) -> Result<Self, RingfoldError> {
        if strands.is_empty() || strands.iter().any(|s| s.is_empty()) {
            return Err(RingfoldError::InvalidSequence(
                "at least one non-empty strand is required".to_string(),
            ));
        }
        if circularized && strands.len() > 1 {
            return Err(RingfoldError::InvalidTopology(format!(
                "a circularized molecule must be a single strand, got {}",
                strands.len()
            )));
        }

        let rna_alphabet = rna::alphabet();
        let mut sequence = Vec::new();
        let mut ligated = Vec::new();
        for strand in strands {
            for (position_in_strand, &residue) in strand.as_bytes().iter().enumerate() {
                if !residue.is_ascii_lowercase() && !rna_alphabet.is_word([residue]) {
                    return Err(RingfoldError::InvalidSequence(format!(
                        "residue '{}' is not an RNA base or lowercase wildcard",
                        residue as char
                    )));
                }
                sequence.push(residue);
                ligated.push(position_in_strand + 1 < strand.len());
            }
        }
        // The last strand's 3' bond wraps around to position 0.
        if circularized {
            let n = ligated.len();
            ligated[n - 1] = true;
        }

        let all_ligated = compute_all_ligated(&ligated);
        Ok(Self {
            sequence,
            ligated,
            all_ligated,
        })
    }

    /// Number of positions on the circular coordinate system.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// True for the (disallowed) zero-length topology; present for symmetry
    /// with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Residue at circular position `i`.
    #[inline]
    #[must_use]
    pub fn residue(&self, i: Pos) -> u8 {
        self.sequence[wrap(i, self.len())]
    }

    /// Whether position `i` is covalently bonded to position `i + 1`.
    #[inline]
    #[must_use]
    pub fn is_ligated(&self, i: Pos) -> bool {
        self.ligated[wrap(i, self.len())]
    }

    /// Whether the forward circular span from `i` to `j` crosses no strand
    /// break.
    ///
    /// The two directions are independent: `all_ligated(i, j)` walks the
    /// bonds `i, i+1, ..., j-1` while `all_ligated(j, i)` walks the
    /// complementary arc.
    #[inline]
    #[must_use]
    pub fn all_ligated(&self, i: Pos, j: Pos) -> bool {
        let n = self.len();
        self.all_ligated[wrap(i, n)][wrap(j, n)]
    }

    /// Whether every position of the system is ligated (a closed circle).
    #[must_use]
    pub fn is_closed_circle(&self) -> bool {
        self.ligated.iter().all(|&bond| bond)
    }

    /// Wrap a signed position into this topology's coordinate range.
    #[inline]
    #[must_use]
    pub fn wrap(&self, i: Pos) -> usize {
        wrap(i, self.len())
    }
}

/// Precomputes, for every ordered pair `(i, j)`, whether the forward arc
/// from `i` to `j` is free of strand breaks.
fn compute_all_ligated(ligated: &[bool]) -> Vec<Vec<bool>> {
    let n = ligated.len();
    let mut all_ligated = vec![vec![false; n]; n];
    for i in 0..n {
        // Walking forward from i, the arc stays unbroken until the first
        // open bond is crossed.
        all_ligated[i][i] = true;
        let mut unbroken = true;
        for offset in 1..n {
            unbroken = unbroken && ligated[(i + offset - 1) % n];
            all_ligated[i][(i + offset) % n] = unbroken;
        }
    }
    all_ligated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_negative_and_overflow() {
        assert_eq!(wrap(-1, 5), 4);
        assert_eq!(wrap(-6, 5), 4);
        assert_eq!(wrap(5, 5), 0);
        assert_eq!(wrap(7, 5), 2);
        assert_eq!(wrap(3, 5), 3);
    }

    #[test]
    fn test_single_linear_strand_ligation() {
        let topology = Topology::from_strands(&["ACGU"], false).unwrap();
        assert_eq!(topology.len(), 4);
        assert!(topology.is_ligated(0));
        assert!(topology.is_ligated(2));
        assert!(!topology.is_ligated(3)); // open wrap-around bond
        assert!(!topology.is_closed_circle());
    }

    #[test]
    fn test_circularized_strand_is_fully_ligated() {
        let topology = Topology::from_strands(&["ACGU"], true).unwrap();
        assert!(topology.is_closed_circle());
        assert!(topology.is_ligated(3));
        assert!(topology.is_ligated(-1));
    }

    #[test]
    fn test_two_strands_have_two_breaks() {
        let topology = Topology::from_strands(&["ACG", "UAC"], false).unwrap();
        assert_eq!(topology.len(), 6);
        assert!(!topology.is_ligated(2));
        assert!(!topology.is_ligated(5));
        assert!(topology.is_ligated(0));
        assert!(topology.is_ligated(3));
    }

    #[test]
    fn test_all_ligated_is_direction_dependent() {
        // Break between positions 2 and 3.
        let topology = Topology::from_strands(&["ACG", "UAC"], false).unwrap();
        // 0 -> 2 crosses bonds 0 and 1 only.
        assert!(topology.all_ligated(0, 2));
        // 0 -> 4 crosses the open bond at 2.
        assert!(!topology.all_ligated(0, 4));
        // 3 -> 5 stays within the second strand.
        assert!(topology.all_ligated(3, 5));
        // 5 -> 0 crosses the open bond at 5.
        assert!(!topology.all_ligated(5, 0));
    }

    #[test]
    fn test_all_ligated_closed_circle() {
        let topology = Topology::from_strands(&["ACGU"], true).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                assert!(topology.all_ligated(i, j));
            }
        }
    }

    #[test]
    fn test_lowercase_wildcards_accepted() {
        let topology = Topology::from_strands(&["AxCGy"], false).unwrap();
        assert_eq!(topology.residue(1), b'x');
    }

    #[test]
    fn test_invalid_residue_rejected() {
        assert!(Topology::from_strands(&["AC*G"], false).is_err());
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(Topology::from_strands(&[], false).is_err());
        assert!(Topology::from_strands(&[""], false).is_err());
    }

    #[test]
    fn test_circularized_multi_strand_rejected() {
        assert!(Topology::from_strands(&["ACG", "UAC"], true).is_err());
    }
}
