//! Closed-form log-derivatives over the filled tables.
//!
//! Once the O(N^3) fill is done, `d(log Z)/d(log p)` for every supported
//! parameter family reduces to an O(N^2) probability-weighted sum over two
//! of the tables; nothing here re-runs the recursion engine. Each family's
//! sum is a known identity of the model: a length-scale derivative counts
//! the expected number of linkages it weighs, a Kd derivative counts pairs,
//! a motif derivative counts motif occurrences.

use rayon::prelude::*;

use crate::engine::PartitionCalculation;
use crate::pairs::{BasePairRegistry, PairTypeId};
use crate::types::{Pos, RingfoldError};

/// A parameter family the post-processor can differentiate against.
///
/// The set is closed: requests arrive as enum values, so an unsupported
/// family cannot be expressed. The string layer used by front ends parses
/// into this enum and reports anything it does not recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivParameter {
    /// Loop-closure length scale `l`
    LoopClosure,
    /// Base-pair length scale `l_BP`
    BasePairLength,
    /// Loop-initiation concentration `C_init`
    LoopInitiation,
    /// Dissociation constant: one type, or all types moving together
    Dissociation(Option<PairTypeId>),
    /// Stacked-motif concentration: one ordered type pair, or all pairs
    StackedPair(Option<(PairTypeId, PairTypeId)>),
    /// Coaxial-stacking equilibrium constant `K_coax`
    CoaxialStack,
    /// Coaxial loop-closure length scale `l_coax`
    CoaxialLoopClosure,
}

impl DerivParameter {
    /// Parses a parameter name as used by front ends: the bare family names
    /// plus `Kd_<tag>` and `C_eff_stack_<tag>_<tag>` forms. Returns `None`
    /// for anything unrecognized; callers report and skip those.
    #[must_use]
    pub fn parse(name: &str, registry: &BasePairRegistry) -> Option<Self> {
        match name {
            "l" => Some(Self::LoopClosure),
            "l_BP" => Some(Self::BasePairLength),
            "C_init" => Some(Self::LoopInitiation),
            "Kd" => Some(Self::Dissociation(None)),
            "C_eff_stacked_pair" => Some(Self::StackedPair(None)),
            "K_coax" => Some(Self::CoaxialStack),
            "l_coax" => Some(Self::CoaxialLoopClosure),
            _ => {
                if let Some(tag) = name.strip_prefix("Kd_") {
                    return registry.find_by_tag(tag).map(|id| Self::Dissociation(Some(id)));
                }
                if let Some(tags) = name.strip_prefix("C_eff_stack_") {
                    let (first, second) = tags.split_once('_')?;
                    let closing = registry.find_by_tag(first)?;
                    let inner = registry.find_by_tag(second)?;
                    return Some(Self::StackedPair(Some((closing, inner))));
                }
                None
            }
        }
    }

    /// Display name in the same vocabulary `parse` accepts.
    #[must_use]
    pub fn label(&self, registry: &BasePairRegistry) -> String {
        match self {
            Self::LoopClosure => "l".to_string(),
            Self::BasePairLength => "l_BP".to_string(),
            Self::LoopInitiation => "C_init".to_string(),
            Self::Dissociation(None) => "Kd".to_string(),
            Self::Dissociation(Some(id)) => format!("Kd_{}", registry.get(*id).tag()),
            Self::StackedPair(None) => "C_eff_stacked_pair".to_string(),
            Self::StackedPair(Some((closing, inner))) => format!(
                "C_eff_stack_{}_{}",
                registry.get(*closing).tag(),
                registry.get(*inner).tag()
            ),
            Self::CoaxialStack => "K_coax".to_string(),
            Self::CoaxialLoopClosure => "l_coax".to_string(),
        }
    }
}

/// Evaluates `d(log Z)/d(log p)` for each requested parameter.
pub(crate) fn log_derivatives(
    calc: &PartitionCalculation,
    parameters: &[DerivParameter],
) -> Result<Vec<f64>, RingfoldError> {
    parameters
        .iter()
        .map(|parameter| match parameter {
            DerivParameter::LoopClosure => Ok(num_internal_linkages(calc)),
            DerivParameter::BasePairLength => Ok(num_base_pairs_closed_by_loops(calc)),
            DerivParameter::LoopInitiation => Ok(num_loops(calc)),
            DerivParameter::Dissociation(Some(type_id)) => {
                Ok(-base_pair_prob_total_for_type(calc, *type_id))
            }
            DerivParameter::Dissociation(None) => {
                let registry = calc.registry();
                if registry.is_empty() {
                    return Ok(0.0);
                }
                let kd_reference = registry.get(0).kd;
                if registry.iter().any(|(_, t)| t.kd != kd_reference) {
                    return Err(RingfoldError::InvalidParameter(
                        "aggregate Kd derivative requires all pair types to share one Kd"
                            .to_string(),
                    ));
                }
                let total: f64 = registry
                    .iter()
                    .map(|(id, _)| base_pair_prob_total_for_type(calc, id))
                    .sum();
                Ok(-total / 2.0)
            }
            DerivParameter::StackedPair(Some((closing, inner))) => Ok(stacked_motif_prob(
                calc,
                &calc.registry().orientations(*closing),
                &calc.registry().orientations(*inner),
            )),
            DerivParameter::StackedPair(None) => {
                let all: Vec<PairTypeId> = calc.registry().iter().map(|(id, _)| id).collect();
                Ok(stacked_motif_prob(calc, &all, &all))
            }
            DerivParameter::CoaxialStack => {
                Ok(loop_closed_coax_prob(calc) + loop_open_coax_prob(calc))
            }
            DerivParameter::CoaxialLoopClosure => Ok(loop_closed_coax_prob(calc)),
        })
        .collect()
}

/// Expected number of ligated junctions sitting inside a loop: the `l`
/// derivative. O(N), summing over the full-span effective concentrations.
fn num_internal_linkages(calc: &PartitionCalculation) -> f64 {
    let n = calc.topology().len();
    let params = calc.params();
    let z = calc.matrices().z_final.q(0);
    (0..n as Pos)
        .filter(|&i| calc.topology().is_ligated(i))
        .map(|i| {
            params.l * calc.matrices().c_eff_no_coax_singlet.q(i + 1, i) / params.c_std / z
        })
        .sum()
}

/// Expected number of base pairs closing a contiguous loop, counting each
/// direction independently: the `l_BP` derivative.
fn num_base_pairs_closed_by_loops(calc: &PartitionCalculation) -> f64 {
    let n = calc.topology().len();
    let params = calc.params();
    let mats = calc.matrices();
    let z = mats.z_final.q(0);
    (0..n)
        .into_par_iter()
        .map(|i| {
            let i = i as Pos;
            if !calc.topology().is_ligated(i) {
                return 0.0;
            }
            (0..n as Pos)
                .filter(|&j| (j - i).rem_euclid(n as Pos) >= 2)
                .filter(|&j| calc.topology().is_ligated(j - 1))
                .map(|j| {
                    params.l * params.l * params.l_bp * mats.c_eff.q(i + 1, j - 1)
                        * mats.z_bp.q(j, i)
                        / z
                })
                .sum()
        })
        .sum()
}

/// Expected number of closed loops: the `C_init` derivative. Counts each
/// loop once via its closing pair `(i, j)` with `i < j`, plus the whole
/// molecule when it is a closed circle.
fn num_loops(calc: &PartitionCalculation) -> f64 {
    let n = calc.topology().len();
    let params = calc.params();
    let mats = calc.matrices();
    let z = mats.z_final.q(0);
    let mut loops: f64 = (0..n)
        .into_par_iter()
        .map(|i| {
            let i = i as Pos;
            if !calc.topology().is_ligated(i) {
                return 0.0;
            }
            ((i + 2)..n as Pos)
                .filter(|&j| calc.topology().is_ligated(j - 1))
                .map(|j| {
                    params.l * params.l * params.l_bp * mats.c_eff.q(i + 1, j - 1)
                        * mats.z_bp.q(j, i)
                        / z
                })
                .sum()
        })
        .sum();
    if calc.topology().is_ligated(n as Pos - 1) {
        loops += 1.0;
    }
    loops
}

/// Total pairing probability carried by one type, summed over all ordered
/// position pairs.
fn base_pair_prob_total_for_type(calc: &PartitionCalculation, type_id: PairTypeId) -> f64 {
    let n = calc.topology().len();
    let pair_type = calc.registry().get(type_id);
    let mats = calc.matrices();
    let z = mats.z_final.q(0);
    (0..n)
        .into_par_iter()
        .map(|i| {
            let i = i as Pos;
            (0..n as Pos)
                .map(|j| {
                    let forward = mats.z_bpq[type_id].q(i, j);
                    if forward == 0.0 {
                        return 0.0;
                    }
                    forward * mats.z_bpq[pair_type.flipped].q(j, i) * pair_type.kd / z
                })
                .sum::<f64>()
        })
        .sum()
}

/// Expected number of occurrences of the stacked motif with closing pair
/// `closing` directly outside inner pair `inner`.
fn motif_prob(calc: &PartitionCalculation, closing: PairTypeId, inner: PairTypeId) -> f64 {
    let n = calc.topology().len();
    let registry = calc.registry();
    let params = calc.params();
    let mats = calc.matrices();
    let z = mats.z_final.q(0);
    let closing_flipped = registry.get(closing).flipped;
    let outside = &mats.z_bpq[closing_flipped];
    let inside = &mats.z_bpq[inner];

    let mut total: f64 = (0..n)
        .into_par_iter()
        .map(|i| {
            let i = i as Pos;
            if !calc.topology().is_ligated(i) {
                return 0.0;
            }
            (0..n as Pos)
                .filter(|&j| (j - i).rem_euclid(n as Pos) >= 3)
                .filter(|&j| calc.topology().is_ligated(j - 1))
                .filter(|&j| {
                    registry
                        .get(closing_flipped)
                        .is_match(calc.topology().residue(j), calc.topology().residue(i))
                })
                .filter(|&j| {
                    registry
                        .get(inner)
                        .is_match(calc.topology().residue(i + 1), calc.topology().residue(j - 1))
                })
                .map(|j| {
                    params.c_eff_stack(closing, inner) * outside.q(j, i)
                        * inside.q(i + 1, j - 1)
                        / z
                })
                .sum::<f64>()
        })
        .sum();
    // A motif identical to its own flip would otherwise be counted from
    // both directions.
    if closing == registry.get(inner).flipped {
        total /= 2.0;
    }
    total
}

/// Motif probability summed over the cross product of two orientation
/// lists, visiting each distinct motif once.
fn stacked_motif_prob(
    calc: &PartitionCalculation,
    closing_types: &[PairTypeId],
    inner_types: &[PairTypeId],
) -> f64 {
    let registry = calc.registry();
    let mut computed: Vec<(PairTypeId, PairTypeId)> = Vec::new();
    let mut total = 0.0;
    for &closing in closing_types {
        for &inner in inner_types {
            if computed.contains(&(closing, inner)) {
                continue;
            }
            total += motif_prob(calc, closing, inner);
            computed.push((closing, inner));
            // The flipped combination names the same physical motif.
            computed.push((registry.get(inner).flipped, registry.get(closing).flipped));
        }
    }
    total
}

/// Probability mass of coaxial stacks whose outer ends are joined by a
/// loop: the `l_coax` derivative, and half of the `K_coax` one.
fn loop_closed_coax_prob(calc: &PartitionCalculation) -> f64 {
    let n = calc.topology().len();
    let params = calc.params();
    let mats = calc.matrices();
    let z = mats.z_final.q(0);
    let c_eff_for_coax = if params.allow_strained_3wj {
        &mats.c_eff
    } else {
        &mats.c_eff_no_bp_singlet
    };
    (0..n)
        .into_par_iter()
        .map(|i| {
            let i = i as Pos;
            if !calc.topology().is_ligated(i - 1) {
                return 0.0;
            }
            (0..n as Pos)
                .filter(|&j| (i - j).rem_euclid(n as Pos) >= 2)
                .filter(|&j| calc.topology().is_ligated(j))
                .map(|j| {
                    mats.z_coax.q(i, j) * params.l_coax * params.l * params.l
                        * c_eff_for_coax.q(j + 1, i - 1)
                        / z
                })
                .sum::<f64>()
        })
        .sum()
}

/// Probability mass of coaxial stacks whose outer ends sit in split
/// segments.
fn loop_open_coax_prob(calc: &PartitionCalculation) -> f64 {
    let n = calc.topology().len();
    let mats = calc.matrices();
    let z = mats.z_final.q(0);
    (0..n)
        .into_par_iter()
        .map(|i| {
            let i = i as Pos;
            (0..n as Pos)
                .map(|j| mats.z_coax.q(i, j) * mats.z_cut.q(j, i) / z)
                .sum::<f64>()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairs::BasePairRegistry;

    fn registry() -> BasePairRegistry {
        let mut registry = BasePairRegistry::with_wobble().unwrap();
        registry.register_default_lowercase().unwrap();
        registry
    }

    #[test]
    fn test_parse_bare_family_names() {
        let registry = registry();
        assert_eq!(
            DerivParameter::parse("l", &registry),
            Some(DerivParameter::LoopClosure)
        );
        assert_eq!(
            DerivParameter::parse("Kd", &registry),
            Some(DerivParameter::Dissociation(None))
        );
        assert_eq!(
            DerivParameter::parse("C_eff_stacked_pair", &registry),
            Some(DerivParameter::StackedPair(None))
        );
    }

    #[test]
    fn test_parse_tagged_names() {
        let registry = registry();
        let cg = registry.find_by_tag("CG").unwrap();
        assert_eq!(
            DerivParameter::parse("Kd_CG", &registry),
            Some(DerivParameter::Dissociation(Some(cg)))
        );
        let au = registry.find_by_tag("AU").unwrap();
        assert_eq!(
            DerivParameter::parse("C_eff_stack_CG_AU", &registry),
            Some(DerivParameter::StackedPair(Some((cg, au))))
        );
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        let registry = registry();
        assert_eq!(DerivParameter::parse("Kd_XZ", &registry), None);
        assert_eq!(DerivParameter::parse("temperature", &registry), None);
    }

    #[test]
    fn test_label_round_trips_through_parse() {
        let registry = registry();
        for name in ["l", "l_BP", "C_init", "Kd", "Kd_GC", "C_eff_stacked_pair", "K_coax", "l_coax"]
        {
            let parameter = DerivParameter::parse(name, &registry).unwrap();
            assert_eq!(parameter.label(&registry), name);
        }
    }
}
