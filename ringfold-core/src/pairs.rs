//! Base-pair-type registry.
//!
//! Each pairing rule the model recognizes is registered as its own type with
//! its own dissociation constant. Ordered-nucleotide rules are registered in
//! both orientations, and the two orientations point at each other through
//! [`BasePairType::flipped`]; symmetric decompositions (base-pair
//! probabilities, stacked-motif sums) rely on that wiring.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_KD_AU, DEFAULT_KD_CG, DEFAULT_KD_GU, DEFAULT_KD_LOWERCASE,
    MIN_DISSOCIATION_CONSTANT,
};
use crate::types::RingfoldError;

/// Index of a registered base-pair type.
pub type PairTypeId = usize;

/// The matching rule of one registered base-pair type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairRule {
    /// Matches an ordered pair of specific nucleotide identities.
    Nucleotides {
        /// Identity required at the 5' position
        nt1: u8,
        /// Identity required at the 3' position
        nt2: u8,
    },
    /// Matches two positions carrying the same lowercase wildcard marker.
    MatchLowercase,
}

/// One registered pairing rule together with its dissociation constant.
#[derive(Debug, Clone)]
pub struct BasePairType {
    /// Matching rule for the two positions
    pub rule: PairRule,
    /// Dissociation constant (M); smaller means a more stable pair
    pub kd: f64,
    /// The nt1/nt2-swapped partner type (self for symmetric rules)
    pub flipped: PairTypeId,
}

impl BasePairType {
    /// Whether residues `s1` (5') and `s2` (3') satisfy this type's rule.
    #[inline]
    #[must_use]
    pub fn is_match(&self, s1: u8, s2: u8) -> bool {
        match self.rule {
            PairRule::Nucleotides { nt1, nt2 } => s1 == nt1 && s2 == nt2,
            PairRule::MatchLowercase => {
                s1.is_ascii_lowercase() && s2.is_ascii_lowercase() && s1 == s2
            }
        }
    }

    /// Short tag naming this type, e.g. `CG` or `matchlowercase`.
    #[must_use]
    pub fn tag(&self) -> String {
        match self.rule {
            PairRule::Nucleotides { nt1, nt2 } => {
                format!("{}{}", nt1 as char, nt2 as char)
            }
            PairRule::MatchLowercase => "matchlowercase".to_string(),
        }
    }
}

/// The fixed set of base-pair types active in one calculation.
#[derive(Debug, Clone, Default)]
pub struct BasePairRegistry {
    types: Vec<BasePairType>,
}

impl BasePairRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { types: Vec::new() }
    }

    /// Registry with the Watson-Crick rules (C-G, A-U) at default strengths.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in constants; the `Result` mirrors the
    /// fallible builder methods.
    pub fn watson_crick() -> Result<Self, RingfoldError> {
        let mut registry = Self::new();
        registry.register_nucleotides(b'C', b'G', DEFAULT_KD_CG)?;
        registry.register_nucleotides(b'A', b'U', DEFAULT_KD_AU)?;
        Ok(registry)
    }

    /// Watson-Crick rules plus G-U wobble pairs.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in constants.
    pub fn with_wobble() -> Result<Self, RingfoldError> {
        let mut registry = Self::watson_crick()?;
        registry.register_nucleotides(b'G', b'U', DEFAULT_KD_GU)?;
        Ok(registry)
    }

    /// Registers an ordered nucleotide rule in both orientations and wires
    /// the two as each other's flipped partner. Returns the id of the
    /// `(nt1, nt2)` orientation.
    ///
    /// # Errors
    ///
    /// Returns [`RingfoldError::InvalidParameter`] for a dissociation
    /// constant at or below [`MIN_DISSOCIATION_CONSTANT`], or if not finite.
    pub fn register_nucleotides(
        &mut self,
        nt1: u8,
        nt2: u8,
        kd: f64,
    ) -> Result<PairTypeId, RingfoldError> {
        validate_kd(kd)?;
        let forward = self.types.len();
        if nt1 == nt2 {
            self.types.push(BasePairType {
                rule: PairRule::Nucleotides { nt1, nt2 },
                kd,
                flipped: forward,
            });
        } else {
            let reverse = forward + 1;
            self.types.push(BasePairType {
                rule: PairRule::Nucleotides { nt1, nt2 },
                kd,
                flipped: reverse,
            });
            self.types.push(BasePairType {
                rule: PairRule::Nucleotides {
                    nt1: nt2,
                    nt2: nt1,
                },
                kd,
                flipped: forward,
            });
        }
        Ok(forward)
    }

    /// Registers the lowercase-wildcard rule (symmetric, flipped to itself).
    ///
    /// # Errors
    ///
    /// Returns [`RingfoldError::InvalidParameter`] for an invalid Kd.
    pub fn register_lowercase(&mut self, kd: f64) -> Result<PairTypeId, RingfoldError> {
        validate_kd(kd)?;
        let id = self.types.len();
        self.types.push(BasePairType {
            rule: PairRule::MatchLowercase,
            kd,
            flipped: id,
        });
        Ok(id)
    }

    /// Registers the lowercase-wildcard rule at its default strength.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in constant.
    pub fn register_default_lowercase(&mut self) -> Result<PairTypeId, RingfoldError> {
        self.register_lowercase(DEFAULT_KD_LOWERCASE)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The type with the given id.
    ///
    /// # Panics
    ///
    /// Panics on an unregistered id; ids only come from this registry.
    #[must_use]
    pub fn get(&self, id: PairTypeId) -> &BasePairType {
        &self.types[id]
    }

    /// Iterator over `(id, type)` for all registered types.
    pub fn iter(&self) -> impl Iterator<Item = (PairTypeId, &BasePairType)> {
        self.types.iter().enumerate()
    }

    /// Finds the type registered for an exact ordered tag such as `CG`, or
    /// `matchlowercase`.
    #[must_use]
    pub fn find_by_tag(&self, tag: &str) -> Option<PairTypeId> {
        self.iter()
            .find(|(_, pair_type)| pair_type.tag() == tag)
            .map(|(id, _)| id)
    }

    /// All orientations of the type with the given id: the id itself plus
    /// its flipped partner when distinct.
    #[must_use]
    pub fn orientations(&self, id: PairTypeId) -> Vec<PairTypeId> {
        let flipped = self.get(id).flipped;
        if flipped == id {
            vec![id]
        } else {
            vec![id, flipped]
        }
    }
}

fn validate_kd(kd: f64) -> Result<(), RingfoldError> {
    if !kd.is_finite() || kd <= MIN_DISSOCIATION_CONSTANT {
        return Err(RingfoldError::InvalidParameter(format!(
            "dissociation constant {kd:e} must be finite and above {MIN_DISSOCIATION_CONSTANT:e}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_nucleotides_wires_flipped_pair() {
        let mut registry = BasePairRegistry::new();
        let cg = registry.register_nucleotides(b'C', b'G', 1e-3).unwrap();
        assert_eq!(registry.len(), 2);
        let gc = registry.get(cg).flipped;
        assert_ne!(cg, gc);
        assert_eq!(registry.get(gc).flipped, cg);
        assert!(registry.get(cg).is_match(b'C', b'G'));
        assert!(!registry.get(cg).is_match(b'G', b'C'));
        assert!(registry.get(gc).is_match(b'G', b'C'));
    }

    #[test]
    fn test_palindromic_rule_is_self_flipped() {
        let mut registry = BasePairRegistry::new();
        let uu = registry.register_nucleotides(b'U', b'U', 1e-2).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(uu).flipped, uu);
    }

    #[test]
    fn test_lowercase_rule_matches_identical_markers_only() {
        let mut registry = BasePairRegistry::new();
        let id = registry.register_lowercase(1e-5).unwrap();
        let pair_type = registry.get(id);
        assert_eq!(pair_type.flipped, id);
        assert!(pair_type.is_match(b'x', b'x'));
        assert!(!pair_type.is_match(b'x', b'y'));
        assert!(!pair_type.is_match(b'X', b'X'));
    }

    #[test]
    fn test_invalid_kd_rejected() {
        let mut registry = BasePairRegistry::new();
        assert!(registry.register_nucleotides(b'C', b'G', 0.0).is_err());
        assert!(registry.register_nucleotides(b'C', b'G', -1.0).is_err());
        assert!(registry
            .register_nucleotides(b'C', b'G', f64::NAN)
            .is_err());
    }

    #[test]
    fn test_find_by_tag() {
        let registry = BasePairRegistry::with_wobble().unwrap();
        let cg = registry.find_by_tag("CG").unwrap();
        let gc = registry.find_by_tag("GC").unwrap();
        assert_eq!(registry.get(cg).flipped, gc);
        assert!(registry.find_by_tag("CA").is_none());
    }

    #[test]
    fn test_orientations() {
        let registry = BasePairRegistry::watson_crick().unwrap();
        let cg = registry.find_by_tag("CG").unwrap();
        assert_eq!(registry.orientations(cg).len(), 2);
    }
}
