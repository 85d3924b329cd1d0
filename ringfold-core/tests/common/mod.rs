#![allow(dead_code)]

use ringfold_core::config::RingfoldConfig;
use ringfold_core::constraints::Constraints;
use ringfold_core::engine::PartitionCalculation;
use ringfold_core::pairs::BasePairRegistry;
use ringfold_core::params::ModelParams;
use ringfold_core::topology::Topology;

/// Configuration used by every test: silent, no optional shadows.
pub fn quiet_config() -> RingfoldConfig {
    RingfoldConfig {
        quiet: true,
        ..Default::default()
    }
}

/// A small, fully exercised parameter set with every model feature on.
pub fn test_params() -> ModelParams {
    ModelParams {
        c_init: 1.0,
        l: 0.5,
        l_bp: 0.2,
        c_eff_stacked_pair: 100.0,
        k_coax: 10.0,
        l_coax: 2.0,
        c_std: 1.0,
        min_loop_length: 3,
        allow_strained_3wj: false,
    }
}

/// Registry containing only the C-G rule (both orientations).
pub fn cg_registry(kd: f64) -> BasePairRegistry {
    let mut registry = BasePairRegistry::new();
    registry.register_nucleotides(b'C', b'G', kd).unwrap();
    registry
}

/// Runs one complete calculation and returns it filled.
pub fn run(
    strands: &[&str],
    circularized: bool,
    registry: BasePairRegistry,
    params: ModelParams,
    config: RingfoldConfig,
) -> PartitionCalculation {
    let topology = Topology::from_strands(strands, circularized).unwrap();
    let mut calculation =
        PartitionCalculation::new(topology, registry, params, Constraints::none(), config)
            .unwrap();
    calculation.execute().unwrap();
    calculation
}

/// Runs one complete calculation with constraints applied.
pub fn run_constrained(
    strands: &[&str],
    circularized: bool,
    registry: BasePairRegistry,
    params: ModelParams,
    constraints: Constraints,
) -> PartitionCalculation {
    let topology = Topology::from_strands(strands, circularized).unwrap();
    let mut calculation =
        PartitionCalculation::new(topology, registry, params, constraints, quiet_config())
            .unwrap();
    calculation.execute().unwrap();
    calculation
}
