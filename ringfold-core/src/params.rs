//! Thermodynamic parameter bundle.
//!
//! The model weighs every structure by a product of a small set of named
//! constants; the recursion engine consumes them read-only. Loading fitted
//! parameter sets from files is a front-end concern (the CLI reads a JSON
//! rendering of this struct); the library only defines the bundle itself.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_C_EFF_STACKED_PAIR, DEFAULT_C_INIT, DEFAULT_C_STD, DEFAULT_K_COAX, DEFAULT_L,
    DEFAULT_L_BP, DEFAULT_L_COAX, DEFAULT_MIN_LOOP_LENGTH,
};
use crate::pairs::PairTypeId;
use crate::types::RingfoldError;

/// Numeric constants of the nearest-neighbor model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Effective concentration for initiating a loop (M)
    pub c_init: f64,
    /// Multiplicative cost per linkage inside a loop
    pub l: f64,
    /// Extra multiplicative cost for a linkage closing onto a helix
    pub l_bp: f64,
    /// Effective concentration rewarding two directly stacked pairs (M)
    pub c_eff_stacked_pair: f64,
    /// Equilibrium constant for coaxial stacking of two helices
    pub k_coax: f64,
    /// Extra multiplicative cost for a linkage closing onto a coaxial stack
    pub l_coax: f64,
    /// Standard-state concentration scaling strand association (M)
    pub c_std: f64,
    /// Minimum number of residues a contiguous loop must enclose
    pub min_loop_length: usize,
    /// Whether a three-way junction may close with a lone helix against a
    /// lone coaxial stack and no intervening loop residues
    pub allow_strained_3wj: bool,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            c_init: DEFAULT_C_INIT,
            l: DEFAULT_L,
            l_bp: DEFAULT_L_BP,
            c_eff_stacked_pair: DEFAULT_C_EFF_STACKED_PAIR,
            k_coax: DEFAULT_K_COAX,
            l_coax: DEFAULT_L_COAX,
            c_std: DEFAULT_C_STD,
            min_loop_length: DEFAULT_MIN_LOOP_LENGTH,
            allow_strained_3wj: false,
        }
    }
}

impl ModelParams {
    /// Stacked-motif effective concentration for an ordered pair of
    /// base-pair types.
    ///
    /// The current model applies one constant to every motif; the per-type
    /// accessor is the seam through which a fitted motif table would enter.
    #[inline]
    #[must_use]
    pub fn c_eff_stack(&self, _closing: PairTypeId, _inner: PairTypeId) -> f64 {
        self.c_eff_stacked_pair
    }

    /// Checks every constant is finite and in its physical range.
    ///
    /// # Errors
    ///
    /// Returns [`RingfoldError::InvalidParameter`] naming the first
    /// offending constant.
    pub fn validate(&self) -> Result<(), RingfoldError> {
        let positives = [
            ("c_init", self.c_init),
            ("l", self.l),
            ("l_bp", self.l_bp),
            ("c_eff_stacked_pair", self.c_eff_stacked_pair),
            ("l_coax", self.l_coax),
            ("c_std", self.c_std),
        ];
        for (name, value) in positives {
            if !value.is_finite() || value <= 0.0 {
                return Err(RingfoldError::InvalidParameter(format!(
                    "{name} = {value:e} must be finite and positive"
                )));
            }
        }
        // Zero is meaningful for k_coax: it switches coaxial stacking off.
        if !self.k_coax.is_finite() || self.k_coax < 0.0 {
            return Err(RingfoldError::InvalidParameter(format!(
                "k_coax = {:e} must be finite and non-negative",
                self.k_coax
            )));
        }
        Ok(())
    }
}
