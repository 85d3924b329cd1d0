/// Configuration settings for a partition function calculation.
///
/// Controls which optional shadow computations run alongside the main
/// recursion and how chatty the engine is. Thermodynamic constants live in
/// [`crate::params::ModelParams`], not here.
///
/// # Examples
///
/// ```rust
/// use ringfold_core::config::RingfoldConfig;
///
/// let config = RingfoldConfig {
///     calc_contrib: true,
///     quiet: true,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct RingfoldConfig {
    /// Track the derivative shadow of every table entry.
    ///
    /// When `true`, each entry carries d(entry)/d(Kd) alongside its value,
    /// propagated term-for-term with the value recursion. The derivative is
    /// taken with respect to a common scale on all dissociation constants.
    ///
    /// **Default**: `false`
    pub calc_deriv: bool,

    /// Record, per entry, how it decomposes into sub-entries.
    ///
    /// When `true`, each table entry keeps a list of weighted decompositions
    /// into the sub-entries it was built from, for consumption by
    /// backtracking and sampling layers. Memory grows accordingly.
    ///
    /// **Default**: `false`
    pub calc_contrib: bool,

    /// Suppress progress messages on stderr.
    ///
    /// **Default**: `false`
    pub quiet: bool,
}

impl Default for RingfoldConfig {
    fn default() -> Self {
        Self {
            calc_deriv: false,
            calc_contrib: false,
            quiet: false,
        }
    }
}
