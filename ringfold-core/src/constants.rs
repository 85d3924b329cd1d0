// =============================================================================
// =============================================================================

/// Version string for ringfold
pub const VERSION: &str = "0.1.0";

// =============================================================================
// =============================================================================

/// Smallest dissociation constant accepted by the registry.
///
/// Values below this would make `1/Kd` factors overflow long before the
/// model stops being physically meaningful.
pub const MIN_DISSOCIATION_CONSTANT: f64 = 1e-12;

/// Relative tolerance for the per-root agreement of the final totals
pub const ROOT_INVARIANCE_TOLERANCE: f64 = 1e-5;

/// Minimum number of unpaired residues enclosed by a contiguous loop
pub const DEFAULT_MIN_LOOP_LENGTH: usize = 3;

// =============================================================================
// =============================================================================

/// Default loop initiation effective concentration (M)
pub const DEFAULT_C_INIT: f64 = 1.0;

/// Default cost per loop-closure linkage
pub const DEFAULT_L: f64 = 0.5;

/// Default extra cost for a linkage that closes onto a helix
pub const DEFAULT_L_BP: f64 = 0.2;

/// Default effective concentration for a stacked pair motif (M)
pub const DEFAULT_C_EFF_STACKED_PAIR: f64 = 1.0e4;

/// Default coaxial stacking equilibrium constant
pub const DEFAULT_K_COAX: f64 = 10.0;

/// Default extra cost for a linkage that closes onto a coaxial stack
pub const DEFAULT_L_COAX: f64 = 1.0;

/// Standard-state concentration (M); scales strand-association terms
pub const DEFAULT_C_STD: f64 = 1.0;

/// Default dissociation constant for Watson-Crick C-G pairs (M)
pub const DEFAULT_KD_CG: f64 = 1.0e-3;

/// Default dissociation constant for Watson-Crick A-U pairs (M)
pub const DEFAULT_KD_AU: f64 = 1.0e-2;

/// Default dissociation constant for G-U wobble pairs (M)
pub const DEFAULT_KD_GU: f64 = 1.0e-1;

/// Default dissociation constant for designed lowercase-wildcard pairs (M)
pub const DEFAULT_KD_LOWERCASE: f64 = 1.0e-5;
