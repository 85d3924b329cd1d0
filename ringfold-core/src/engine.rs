//! Calculation driver: matrix ownership, fill order, and cross-checks.
//!
//! [`PartitionCalculation`] holds every input and every DP table for one
//! calculation explicitly; there is no ambient state, so independent
//! calculations can coexist and individual recursions are unit-testable
//! against a hand-built instance.

use crate::config::RingfoldConfig;
use crate::constraints::Constraints;
use crate::constants::ROOT_INVARIANCE_TOLERANCE;
use crate::derivs::{self, DerivParameter};
use crate::matrix::{DpMatrix, DpVector, MatrixId};
use crate::pairs::BasePairRegistry;
use crate::params::ModelParams;
use crate::recursion::{
    update_c_eff, update_c_eff_basic, update_c_eff_no_bp_singlet, update_c_eff_no_coax_singlet,
    update_z_bp, update_z_bpq, update_z_coax, update_z_cut, update_z_final, update_z_linear,
    RecursionEnv,
};
use crate::results::PartitionResults;
use crate::topology::Topology;
use crate::types::{Pos, RingfoldError};

use rayon::prelude::*;

/// The full set of DP tables for one calculation.
#[derive(Debug)]
pub struct Matrices {
    /// Split-at-a-strand-break partition function
    pub z_cut: DpMatrix,
    /// One pair-restricted table per registered base-pair type
    pub z_bpq: Vec<DpMatrix>,
    /// Base-pairing partition function summed over types
    pub z_bp: DpMatrix,
    /// Coaxial-stack partition function
    pub z_coax: DpMatrix,
    /// Effective concentration, shared core terms
    pub c_eff_basic: DpMatrix,
    /// Effective concentration without the lone-coax closure
    pub c_eff_no_coax_singlet: DpMatrix,
    /// Effective concentration without the lone-helix closure
    pub c_eff_no_bp_singlet: DpMatrix,
    /// Effective concentration, all closures
    pub c_eff: DpMatrix,
    /// Unrestricted span partition function
    pub z_linear: DpMatrix,
    /// Per-root totals
    pub z_final: DpVector,
}

impl Matrices {
    fn new(n: usize, num_pair_types: usize, track_deriv: bool, track_contribs: bool) -> Self {
        let matrix = |id| DpMatrix::new(id, n, track_deriv, track_contribs);
        Self {
            z_cut: matrix(MatrixId::ZCut),
            z_bpq: (0..num_pair_types)
                .map(|t| DpMatrix::new(MatrixId::ZBpq(t), n, track_deriv, track_contribs))
                .collect(),
            z_bp: matrix(MatrixId::ZBp),
            z_coax: matrix(MatrixId::ZCoax),
            c_eff_basic: matrix(MatrixId::CEffBasic),
            c_eff_no_coax_singlet: matrix(MatrixId::CEffNoCoaxSinglet),
            c_eff_no_bp_singlet: matrix(MatrixId::CEffNoBpSinglet),
            c_eff: matrix(MatrixId::CEff),
            z_linear: matrix(MatrixId::ZLinear),
            z_final: DpVector::new(MatrixId::ZFinal, n, track_deriv, track_contribs),
        }
    }

    /// Two-index tables with their conventional names, in fill order.
    #[must_use]
    pub fn named(&self) -> Vec<(String, &DpMatrix)> {
        let mut named = vec![("Z_cut".to_string(), &self.z_cut)];
        for (type_index, table) in self.z_bpq.iter().enumerate() {
            named.push((format!("Z_BPq[{type_index}]"), table));
        }
        named.extend([
            ("Z_BP".to_string(), &self.z_bp),
            ("Z_coax".to_string(), &self.z_coax),
            ("C_eff_basic".to_string(), &self.c_eff_basic),
            ("C_eff_no_coax_singlet".to_string(), &self.c_eff_no_coax_singlet),
            ("C_eff_no_BP_singlet".to_string(), &self.c_eff_no_bp_singlet),
            ("C_eff".to_string(), &self.c_eff),
            ("Z_linear".to_string(), &self.z_linear),
        ]);
        named
    }
}

/// One partition function calculation: inputs, tables, and derived outputs.
///
/// # Examples
///
/// ```rust
/// use ringfold_core::engine::PartitionCalculation;
/// use ringfold_core::config::RingfoldConfig;
/// use ringfold_core::constraints::Constraints;
/// use ringfold_core::pairs::BasePairRegistry;
/// use ringfold_core::params::ModelParams;
/// use ringfold_core::topology::Topology;
///
/// let topology = Topology::from_strands(&["CAAAG"], false)?;
/// let registry = BasePairRegistry::watson_crick()?;
/// let mut calculation = PartitionCalculation::new(
///     topology,
///     registry,
///     ModelParams::default(),
///     Constraints::none(),
///     RingfoldConfig { quiet: true, ..Default::default() },
/// )?;
/// calculation.execute()?;
/// assert!(calculation.z() >= 1.0);
/// # Ok::<(), ringfold_core::types::RingfoldError>(())
/// ```
#[derive(Debug)]
pub struct PartitionCalculation {
    topology: Topology,
    registry: BasePairRegistry,
    params: ModelParams,
    constraints: Constraints,
    config: RingfoldConfig,
    matrices: Matrices,
    filled: bool,
}

impl PartitionCalculation {
    /// Assembles a calculation over validated inputs; tables are allocated
    /// zero-initialized and nothing runs until [`Self::execute`].
    ///
    /// # Errors
    ///
    /// Returns [`RingfoldError::InvalidParameter`] or
    /// [`RingfoldError::InvalidConstraint`] when an input fails validation.
    pub fn new(
        topology: Topology,
        registry: BasePairRegistry,
        params: ModelParams,
        constraints: Constraints,
        config: RingfoldConfig,
    ) -> Result<Self, RingfoldError> {
        params.validate()?;
        constraints.validate(topology.len())?;
        let matrices = Matrices::new(
            topology.len(),
            registry.len(),
            config.calc_deriv,
            config.calc_contrib,
        );
        Ok(Self {
            topology,
            registry,
            params,
            constraints,
            config,
            matrices,
            filled: false,
        })
    }

    /// Fills every table in strictly increasing span order, computes the
    /// per-root totals, and verifies their agreement.
    ///
    /// Running twice is a no-op: tables are add-only and must not be
    /// re-accumulated.
    ///
    /// # Errors
    ///
    /// Returns [`RingfoldError::DegenerateResult`] when the total vanishes
    /// or is non-finite, and [`RingfoldError::RootInvariance`] when the
    /// per-root totals disagree beyond tolerance.
    pub fn execute(&mut self) -> Result<(), RingfoldError> {
        if self.filled {
            return Ok(());
        }
        let n = self.topology.len();
        if !self.config.quiet {
            eprintln!(
                "Computing partition function over {} positions, {} pair types...",
                n,
                self.registry.len()
            );
        }

        self.initialize_diagonals();

        let env = RecursionEnv {
            topology: &self.topology,
            params: &self.params,
            registry: &self.registry,
            constraints: &self.constraints,
        };
        // Each recursion only consumes entries of smaller span, or entries
        // produced earlier in this fixed order for the same (i, j).
        for offset in 1..n as Pos {
            for i in 0..n as Pos {
                let j = i + offset;
                update_z_cut(&env, &mut self.matrices, i, j);
                for type_id in 0..self.registry.len() {
                    update_z_bpq(&env, &mut self.matrices, i, j, type_id);
                }
                update_z_bp(&env, &mut self.matrices, i, j);
                update_z_coax(&env, &mut self.matrices, i, j);
                update_c_eff_basic(&env, &mut self.matrices, i, j);
                update_c_eff_no_coax_singlet(&env, &mut self.matrices, i, j);
                update_c_eff_no_bp_singlet(&env, &mut self.matrices, i, j);
                update_c_eff(&env, &mut self.matrices, i, j);
                update_z_linear(&env, &mut self.matrices, i, j);
            }
        }
        for i in 0..n as Pos {
            update_z_final(&env, &mut self.matrices, i);
        }

        self.run_cross_checks()?;
        self.filled = true;
        if !self.config.quiet {
            eprintln!("Z = {:e}", self.z());
        }
        Ok(())
    }

    /// Seeds the span-zero entries every recursion builds on: an empty span
    /// folds to exactly one state, and a loop starting and ending at the
    /// same position carries the initiation concentration.
    fn initialize_diagonals(&mut self) {
        for i in 0..self.topology.len() as Pos {
            let mut acc = self.matrices.z_linear.accumulator();
            acc.add_term(1.0, &[]);
            self.matrices.z_linear.add(i, i, acc);

            let c_init = self.params.c_init;
            for table in [
                &mut self.matrices.c_eff_basic,
                &mut self.matrices.c_eff_no_coax_singlet,
                &mut self.matrices.c_eff_no_bp_singlet,
                &mut self.matrices.c_eff,
            ] {
                let mut acc = table.accumulator();
                acc.add_term(c_init, &[]);
                table.add(i, i, acc);
            }
        }
    }

    /// The same total is expressible from every root; disagreement means
    /// the tables are internally inconsistent.
    fn run_cross_checks(&self) -> Result<(), RingfoldError> {
        let z_reference = self.matrices.z_final.q(0);
        if !z_reference.is_finite() || z_reference <= 0.0 {
            return Err(RingfoldError::DegenerateResult(format!(
                "Z = {z_reference:e}; the input admits no structure with nonzero weight"
            )));
        }
        for root in 0..self.topology.len() {
            let z_root = self.matrices.z_final.q(root as Pos);
            if ((z_root - z_reference) / z_reference).abs() > ROOT_INVARIANCE_TOLERANCE {
                return Err(RingfoldError::RootInvariance {
                    root,
                    found: z_root,
                    expected: z_reference,
                });
            }
        }
        Ok(())
    }

    /// Total partition function (the root-0 reading).
    ///
    /// # Panics
    ///
    /// Panics if called before [`Self::execute`].
    #[must_use]
    pub fn z(&self) -> f64 {
        assert!(self.filled, "execute() must run before reading results");
        self.matrices.z_final.q(0)
    }

    /// dZ/dKd under a common scale on all dissociation constants; zero
    /// unless the derivative shadow was enabled in the configuration.
    ///
    /// # Panics
    ///
    /// Panics if called before [`Self::execute`].
    #[must_use]
    pub fn kd_derivative(&self) -> f64 {
        assert!(self.filled, "execute() must run before reading results");
        self.matrices.z_final.dq(0)
    }

    /// Probability that positions `i` and `j` pair, for every ordered pair.
    ///
    /// # Panics
    ///
    /// Panics if called before [`Self::execute`].
    #[must_use]
    pub fn base_pair_probabilities(&self) -> Vec<Vec<f64>> {
        assert!(self.filled, "execute() must run before reading results");
        let n = self.topology.len();
        let z = self.matrices.z_final.q(0);
        (0..n)
            .into_par_iter()
            .map(|i| {
                (0..n)
                    .map(|j| {
                        self.registry
                            .iter()
                            .map(|(type_id, pair_type)| {
                                let forward = self.matrices.z_bpq[type_id].q(i as Pos, j as Pos);
                                if forward == 0.0 {
                                    return 0.0;
                                }
                                let reverse = self.matrices.z_bpq[pair_type.flipped]
                                    .q(j as Pos, i as Pos);
                                forward * reverse * pair_type.kd / z
                            })
                            .sum()
                    })
                    .collect()
            })
            .collect()
    }

    /// Closed-form `d(log Z)/d(log parameter)` for each requested parameter.
    ///
    /// # Errors
    ///
    /// Returns [`RingfoldError::InvalidParameter`] for an aggregate-Kd
    /// request when the registered types do not share one Kd.
    ///
    /// # Panics
    ///
    /// Panics if called before [`Self::execute`].
    pub fn log_derivatives(
        &self,
        parameters: &[DerivParameter],
    ) -> Result<Vec<f64>, RingfoldError> {
        assert!(self.filled, "execute() must run before reading results");
        derivs::log_derivatives(self, parameters)
    }

    /// The filled tables.
    #[must_use]
    pub fn matrices(&self) -> &Matrices {
        &self.matrices
    }

    /// The calculation's topology.
    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The calculation's parameter bundle.
    #[must_use]
    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    /// The calculation's base-pair-type registry.
    #[must_use]
    pub fn registry(&self) -> &BasePairRegistry {
        &self.registry
    }
}

/// High-level entry point pairing a configuration with a parameter bundle
/// and registry, producing [`PartitionResults`] per analyzed input.
///
/// # Examples
///
/// ```rust
/// use ringfold_core::PartitionAnalyzer;
/// use ringfold_core::config::RingfoldConfig;
///
/// let analyzer = PartitionAnalyzer::new(RingfoldConfig {
///     quiet: true,
///     ..Default::default()
/// })?;
/// let results = analyzer.analyze_strands(&["CAAAG"], false)?;
/// println!("Z = {:e}", results.z);
/// # Ok::<(), ringfold_core::types::RingfoldError>(())
/// ```
#[derive(Debug)]
pub struct PartitionAnalyzer {
    /// Engine configuration applied to every analysis
    pub config: RingfoldConfig,
    /// Thermodynamic constants applied to every analysis
    pub params: ModelParams,
    /// Base-pair types recognized during analysis
    pub registry: BasePairRegistry,
    /// Parameters whose log-derivatives are reported with each result
    pub deriv_parameters: Vec<DerivParameter>,
}

impl PartitionAnalyzer {
    /// Analyzer with default parameters and the default registry
    /// (Watson-Crick, wobble, and lowercase-wildcard pairs).
    ///
    /// # Errors
    ///
    /// Never fails for the built-in defaults; the `Result` mirrors the
    /// fallible registry builders.
    pub fn new(config: RingfoldConfig) -> Result<Self, RingfoldError> {
        let mut registry = BasePairRegistry::with_wobble()?;
        registry.register_default_lowercase()?;
        Ok(Self {
            config,
            params: ModelParams::default(),
            registry,
            deriv_parameters: Vec::new(),
        })
    }

    /// Runs one full calculation over the given strands.
    ///
    /// # Errors
    ///
    /// Propagates topology, validation, and cross-check failures from the
    /// underlying calculation.
    pub fn analyze_strands(
        &self,
        strands: &[&str],
        circularized: bool,
    ) -> Result<PartitionResults, RingfoldError> {
        self.analyze_with_constraints(strands, circularized, Constraints::none())
    }

    /// Runs one full calculation with externally imposed constraints.
    ///
    /// # Errors
    ///
    /// Propagates topology, validation, and cross-check failures from the
    /// underlying calculation.
    pub fn analyze_with_constraints(
        &self,
        strands: &[&str],
        circularized: bool,
        constraints: Constraints,
    ) -> Result<PartitionResults, RingfoldError> {
        let topology = Topology::from_strands(strands, circularized)?;
        let sequence_length = topology.len();
        let mut calculation = PartitionCalculation::new(
            topology,
            self.registry.clone(),
            self.params.clone(),
            constraints,
            self.config.clone(),
        )?;
        calculation.execute()?;

        let log_derivatives = if self.deriv_parameters.is_empty() {
            Vec::new()
        } else {
            let values = calculation.log_derivatives(&self.deriv_parameters)?;
            self.deriv_parameters
                .iter()
                .cloned()
                .zip(values)
                .collect()
        };

        Ok(PartitionResults {
            sequence_length,
            num_strands: strands.len(),
            circularized,
            z: calculation.z(),
            z_final: calculation.matrices().z_final.values().to_vec(),
            base_pair_probabilities: calculation.base_pair_probabilities(),
            log_derivatives,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> RingfoldConfig {
        RingfoldConfig {
            quiet: true,
            ..Default::default()
        }
    }

    fn single_pair_registry(kd: f64) -> BasePairRegistry {
        let mut registry = BasePairRegistry::new();
        registry.register_nucleotides(b'C', b'G', kd).unwrap();
        registry
    }

    fn hairpin_params() -> ModelParams {
        ModelParams {
            c_init: 1.0,
            l: 0.5,
            l_bp: 0.2,
            c_eff_stacked_pair: 1.0e4,
            k_coax: 10.0,
            l_coax: 1.0,
            c_std: 1.0,
            min_loop_length: 3,
            allow_strained_3wj: false,
        }
    }

    fn executed(
        strands: &[&str],
        circularized: bool,
        registry: BasePairRegistry,
        params: ModelParams,
    ) -> PartitionCalculation {
        let topology = Topology::from_strands(strands, circularized).unwrap();
        let mut calculation = PartitionCalculation::new(
            topology,
            registry,
            params,
            Constraints::none(),
            quiet_config(),
        )
        .unwrap();
        calculation.execute().unwrap();
        calculation
    }

    #[test]
    fn test_single_hairpin_closed_form() {
        let kd = 1.0e-3;
        let params = hairpin_params();
        let calculation = executed(&["CAAAG"], false, single_pair_registry(kd), params.clone());
        // One possible pair (0, 4): Z = 1 + C_init * l^4 * l_BP / Kd.
        let expected = 1.0 + params.c_init * params.l.powi(4) * params.l_bp / kd;
        assert!(((calculation.z() - expected) / expected).abs() < 1e-12);
    }

    #[test]
    fn test_hairpin_base_pair_probability_closed_form() {
        let calculation = executed(
            &["CAAAG"],
            false,
            single_pair_registry(1.0e-3),
            hairpin_params(),
        );
        let z = calculation.z();
        let bpp = calculation.base_pair_probabilities();
        let expected = (z - 1.0) / z;
        assert!(((bpp[0][4] - expected) / expected).abs() < 1e-9);
        assert!(((bpp[4][0] - expected) / expected).abs() < 1e-9);
        assert_eq!(bpp[0][3], 0.0);
    }

    #[test]
    fn test_unstructured_circle_closed_form() {
        let params = hairpin_params();
        let calculation = executed(
            &["AAAAA"],
            true,
            single_pair_registry(1.0e-3),
            params.clone(),
        );
        // A closed circle with no pairs is a single loop of N linkages.
        let expected = params.c_init * params.l.powi(5) / params.c_std;
        assert!(((calculation.z() - expected) / expected).abs() < 1e-12);
    }

    #[test]
    fn test_unstructured_linear_strand_is_unity() {
        let calculation = executed(
            &["AAAAA"],
            false,
            single_pair_registry(1.0e-3),
            hairpin_params(),
        );
        for &z_root in calculation.matrices().z_final.values() {
            assert!((z_root - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_execute_is_idempotent() {
        let topology = Topology::from_strands(&["CAAAG"], false).unwrap();
        let mut calculation = PartitionCalculation::new(
            topology,
            single_pair_registry(1.0e-3),
            hairpin_params(),
            Constraints::none(),
            quiet_config(),
        )
        .unwrap();
        calculation.execute().unwrap();
        let z_first = calculation.z();
        calculation.execute().unwrap();
        assert_eq!(calculation.z(), z_first);
    }

    #[test]
    fn test_kd_derivative_matches_closed_form() {
        let kd = 1.0e-3;
        let params = hairpin_params();
        let topology = Topology::from_strands(&["CAAAG"], false).unwrap();
        let mut calculation = PartitionCalculation::new(
            topology,
            single_pair_registry(kd),
            params.clone(),
            Constraints::none(),
            RingfoldConfig {
                calc_deriv: true,
                quiet: true,
                ..Default::default()
            },
        )
        .unwrap();
        calculation.execute().unwrap();
        // dZ/dKd = -C_init * l^4 * l_BP / Kd^2 for the lone-hairpin case.
        let expected = -params.c_init * params.l.powi(4) * params.l_bp / (kd * kd);
        let found = calculation.kd_derivative();
        assert!(((found - expected) / expected).abs() < 1e-9);
    }

    #[test]
    fn test_analyzer_reports_results() {
        let analyzer = PartitionAnalyzer::new(quiet_config()).unwrap();
        let results = analyzer.analyze_strands(&["GGGGAAAACCCC"], false).unwrap();
        assert_eq!(results.sequence_length, 12);
        assert_eq!(results.num_strands, 1);
        assert!(results.z > 1.0);
        assert_eq!(results.z_final.len(), 12);
        assert_eq!(results.base_pair_probabilities.len(), 12);
    }
}
