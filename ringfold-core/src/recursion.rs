//! The nine mutually dependent recurrences of the partition function fill.
//!
//! Each function accumulates every structural case for one ordered index
//! pair `(i, j)` into its table, reading only entries of strictly smaller
//! circular span or entries already finalized for the same pair. The driver
//! in [`crate::engine`] is responsible for calling them in dependency order
//! for strictly increasing span; nothing here checks that order.
//!
//! Guard failures (a pair the sequence cannot form, a loop below the minimum
//! length, a constraint violation) are silent early returns: the structural
//! class contributes zero, which is not an error.

use crate::constraints::Constraints;
use crate::engine::Matrices;
use crate::pairs::{BasePairRegistry, PairTypeId};
use crate::params::ModelParams;
use crate::topology::Topology;
use crate::types::Pos;

/// Read-only inputs shared by every recursion call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecursionEnv<'a> {
    pub topology: &'a Topology,
    pub params: &'a ModelParams,
    pub registry: &'a BasePairRegistry,
    pub constraints: &'a Constraints,
}

impl RecursionEnv<'_> {
    #[inline]
    fn n(&self) -> Pos {
        self.topology.len() as Pos
    }

    #[inline]
    fn offset(&self, i: Pos, j: Pos) -> Pos {
        (j - i).rem_euclid(self.n())
    }
}

/// Partition function for splitting the span at a strand break.
///
/// Sums, over every non-ligated cut point `c` strictly inside the span, the
/// independent folds of the two sub-segments `i+1..c` and `c+1..j-1`. A cut
/// directly at `i` or directly before `j` degenerates to a single segment,
/// and both at once to the empty constant.
pub(crate) fn update_z_cut(env: &RecursionEnv, mats: &mut Matrices, i: Pos, j: Pos) {
    let n = env.n();
    let offset = env.offset(i, j);

    let mut acc = mats.z_cut.accumulator();
    for c in i..i + offset {
        if env.topology.is_ligated(c) {
            continue;
        }
        let cut_touches_i = c == i;
        let cut_touches_j = (c + 1 - j).rem_euclid(n) == 0;
        match (cut_touches_i, cut_touches_j) {
            (true, true) => acc.add_term(1.0, &[]),
            (true, false) => acc.add_term(1.0, &[mats.z_linear.entry(c + 1, j - 1)]),
            (false, true) => acc.add_term(1.0, &[mats.z_linear.entry(i + 1, c)]),
            (false, false) => acc.add_term(
                1.0,
                &[
                    mats.z_linear.entry(i + 1, c),
                    mats.z_linear.entry(c + 1, j - 1),
                ],
            ),
        }
    }
    mats.z_cut.add(i, j, acc);
}

/// Partition function for structures pairing `i` with `j` under one
/// registered pair type.
///
/// Five structural contexts contribute, all carrying the type's `1/Kd`:
/// closing a loop, stacking on the immediately interior pair, joining two
/// disconnected strands, and coaxially stacking against another helix with
/// the flanking loop either closed or cut open.
pub(crate) fn update_z_bpq(
    env: &RecursionEnv,
    mats: &mut Matrices,
    i: Pos,
    j: Pos,
    type_id: PairTypeId,
) {
    let n = env.n();
    let offset = env.offset(i, j);
    let topology = env.topology;
    let params = env.params;

    if !env.constraints.pair_allowed(topology.len(), i, j) {
        return;
    }
    // A contiguous loop on either side of the pair must enclose at least
    // min_loop_length residues; the minimum applies in each circular
    // direction independently.
    let min_loop = params.min_loop_length as Pos;
    if topology.all_ligated(i, j) && (j - i - 1).rem_euclid(n) < min_loop {
        return;
    }
    if topology.all_ligated(j, i) && (i - j - 1).rem_euclid(n) < min_loop {
        return;
    }
    let pair_type = env.registry.get(type_id);
    if !pair_type.is_match(topology.residue(i), topology.residue(j)) {
        return;
    }
    let kd = pair_type.kd;

    let (c_eff_for_coax, c_eff_for_bp) = if params.allow_strained_3wj {
        (&mats.c_eff, &mats.c_eff)
    } else {
        (&mats.c_eff_no_bp_singlet, &mats.c_eff_no_coax_singlet)
    };

    let mut acc = mats.z_bpq[type_id].accumulator();
    let closes_contiguously = topology.is_ligated(i) && topology.is_ligated(j - 1);

    if closes_contiguously {
        // (i, j) closes a loop spanning i+1..j-1.
        acc.add_term(
            params.l * params.l * params.l_bp / kd,
            &[c_eff_for_bp.entry(i + 1, j - 1)],
        );
        // (i, j) stacks directly on the pair at (i+1, j-1).
        acc.add_term(
            params.c_eff_stacked_pair / kd,
            &[mats.z_bp.entry(i + 1, j - 1)],
        );
    }

    // (i, j) joins two otherwise disconnected strands.
    acc.add_term(params.c_std / kd, &[mats.z_cut.entry(i, j)]);

    if closes_contiguously {
        let coax_in_loop = params.l * params.l * params.l_coax * params.k_coax / kd;
        // Stack against a helix at (i+1, k), closing a loop on the right.
        for k in (i + 2)..(i + offset - 1) {
            if topology.is_ligated(k) {
                acc.add_term(
                    coax_in_loop,
                    &[
                        mats.z_bp.entry(i + 1, k),
                        c_eff_for_coax.entry(k + 1, j - 1),
                    ],
                );
            }
        }
        // Stack against a helix at (k, j-1), closing a loop on the left.
        for k in (i + 2)..(i + offset - 1) {
            if topology.is_ligated(k - 1) {
                acc.add_term(
                    coax_in_loop,
                    &[
                        c_eff_for_coax.entry(i + 1, k - 1),
                        mats.z_bp.entry(k, j - 1),
                    ],
                );
            }
        }
    }

    // Stack against a helix at (i+1, k) with free strand ends past k.
    if topology.is_ligated(i) {
        for k in (i + 2)..(i + offset) {
            acc.add_term(
                params.c_std * params.k_coax / kd,
                &[mats.z_bp.entry(i + 1, k), mats.z_cut.entry(k, j)],
            );
        }
    }
    // Stack against a helix at (k, j-1) with free strand ends before k.
    if topology.is_ligated(j - 1) {
        for k in i..(i + offset - 1) {
            acc.add_term(
                params.c_std * params.k_coax / kd,
                &[mats.z_cut.entry(i, k), mats.z_bp.entry(k, j - 1)],
            );
        }
    }

    // Kd multiplies every term above, so the entry's own derivative with
    // respect to Kd needs the extra -Q/Kd beyond the product rule.
    acc.add_self_derivative(-1.0 / kd);
    mats.z_bpq[type_id].add(i, j, acc);
}

/// Base-pairing partition function summed over all registered types.
pub(crate) fn update_z_bp(env: &RecursionEnv, mats: &mut Matrices, i: Pos, j: Pos) {
    let mut acc = mats.z_bp.accumulator();
    for (type_id, _) in env.registry.iter() {
        acc.add_term(1.0, &[mats.z_bpq[type_id].entry(i, j)]);
    }
    mats.z_bp.add(i, j, acc);
}

/// Partition function for two helices stacking coaxially at some internal
/// split point, with no loop between them.
pub(crate) fn update_z_coax(env: &RecursionEnv, mats: &mut Matrices, i: Pos, j: Pos) {
    let offset = env.offset(i, j);
    let mut acc = mats.z_coax.accumulator();
    for k in (i + 1)..(i + offset - 1) {
        if env.topology.is_ligated(k) {
            acc.add_term(
                env.params.k_coax,
                &[mats.z_bp.entry(i, k), mats.z_bp.entry(k + 1, j)],
            );
        }
    }
    mats.z_coax.add(i, j, acc);
}

/// Shared core of the effective-concentration tables.
///
/// Covers extension by one unpaired residue and attachment of a helix or
/// coaxial stack whose far end is `j`; the direct closures onto `(i, j)`
/// itself are added by the variant tables. On the full-circle span the
/// strained-junction guard swaps in the singlet-excluded tables so that a
/// three-way junction of one lone helix and one lone stack is not counted
/// twice.
pub(crate) fn update_c_eff_basic(env: &RecursionEnv, mats: &mut Matrices, i: Pos, j: Pos) {
    let n = env.n();
    let offset = env.offset(i, j);
    let topology = env.topology;
    let params = env.params;

    let mut acc = mats.c_eff_basic.accumulator();

    // j stays unpaired: extension from j-1.
    if topology.is_ligated(j - 1) && env.constraints.loop_extension_allowed(topology.len(), j) {
        acc.add_term(params.l, &[mats.c_eff.entry(i, j - 1)]);
    }

    let exclude_strained_3wj =
        !params.allow_strained_3wj && offset == n - 1 && topology.is_ligated(j);

    // j pairs with some k > i.
    let c_eff_for_bp = if exclude_strained_3wj {
        &mats.c_eff_no_coax_singlet
    } else {
        &mats.c_eff
    };
    for k in (i + 1)..(i + offset) {
        if topology.is_ligated(k - 1) {
            acc.add_term(
                params.l * params.l_bp,
                &[c_eff_for_bp.entry(i, k - 1), mats.z_bp.entry(k, j)],
            );
        }
    }

    // j coaxially stacks with some k > i.
    let c_eff_for_coax = if exclude_strained_3wj {
        &mats.c_eff_no_bp_singlet
    } else {
        &mats.c_eff
    };
    for k in (i + 1)..(i + offset) {
        if topology.is_ligated(k - 1) {
            acc.add_term(
                params.l * params.l_coax,
                &[c_eff_for_coax.entry(i, k - 1), mats.z_coax.entry(k, j)],
            );
        }
    }

    mats.c_eff_basic.add(i, j, acc);
}

/// Effective concentration missing the lone-coax closure.
pub(crate) fn update_c_eff_no_coax_singlet(
    env: &RecursionEnv,
    mats: &mut Matrices,
    i: Pos,
    j: Pos,
) {
    let params = env.params;
    let mut acc = mats.c_eff_no_coax_singlet.accumulator();
    acc.add_term(1.0, &[mats.c_eff_basic.entry(i, j)]);
    acc.add_term(params.c_init * params.l_bp, &[mats.z_bp.entry(i, j)]);
    mats.c_eff_no_coax_singlet.add(i, j, acc);
}

/// Effective concentration missing the lone-helix closure.
pub(crate) fn update_c_eff_no_bp_singlet(
    env: &RecursionEnv,
    mats: &mut Matrices,
    i: Pos,
    j: Pos,
) {
    let params = env.params;
    let mut acc = mats.c_eff_no_bp_singlet.accumulator();
    acc.add_term(1.0, &[mats.c_eff_basic.entry(i, j)]);
    acc.add_term(params.c_init * params.l_coax, &[mats.z_coax.entry(i, j)]);
    mats.c_eff_no_bp_singlet.add(i, j, acc);
}

/// Effective concentration with every closure allowed: the shared core plus
/// the direct helix closure and the direct coaxial closure onto `(i, j)`.
pub(crate) fn update_c_eff(env: &RecursionEnv, mats: &mut Matrices, i: Pos, j: Pos) {
    let params = env.params;
    let mut acc = mats.c_eff.accumulator();
    acc.add_term(1.0, &[mats.c_eff_basic.entry(i, j)]);
    acc.add_term(params.c_init * params.l_bp, &[mats.z_bp.entry(i, j)]);
    acc.add_term(params.c_init * params.l_coax, &[mats.z_coax.entry(i, j)]);
    mats.c_eff.add(i, j, acc);
}

/// Unrestricted partition function over the span entered at `i` and exited
/// at `j`, assuming no external cut inside.
pub(crate) fn update_z_linear(env: &RecursionEnv, mats: &mut Matrices, i: Pos, j: Pos) {
    let offset = env.offset(i, j);
    let topology = env.topology;

    let mut acc = mats.z_linear.accumulator();

    // j stays unpaired: extension from j-1.
    if topology.is_ligated(j - 1) && env.constraints.loop_extension_allowed(topology.len(), j) {
        acc.add_term(1.0, &[mats.z_linear.entry(i, j - 1)]);
    }
    // j pairs with i.
    acc.add_term(1.0, &[mats.z_bp.entry(i, j)]);
    // j pairs with some k > i.
    for k in (i + 1)..(i + offset) {
        if topology.is_ligated(k - 1) {
            acc.add_term(
                1.0,
                &[mats.z_linear.entry(i, k - 1), mats.z_bp.entry(k, j)],
            );
        }
    }
    // j coaxially stacks with i.
    acc.add_term(1.0, &[mats.z_coax.entry(i, j)]);
    // j coaxially stacks with some k > i.
    for k in (i + 1)..(i + offset) {
        if topology.is_ligated(k - 1) {
            acc.add_term(
                1.0,
                &[mats.z_linear.entry(i, k - 1), mats.z_coax.entry(k, j)],
            );
        }
    }

    mats.z_linear.add(i, j, acc);
}

/// Total partition function read from root `i`, evaluated after every
/// two-index table is complete.
///
/// When the bond into `i` is open the total is just the full-span linear
/// partition function. Otherwise the junction `i-1`/`i` must be ligated
/// explicitly: the full-circle loop term (with the coaxial closure removed,
/// since the stacked-pair sum below covers it), every split across a strand
/// break, every stacked pair bridging the junction, and every coaxial stack
/// newly formed across the junction, loop-connected or cut-connected.
pub(crate) fn update_z_final(env: &RecursionEnv, mats: &mut Matrices, i: Pos) {
    let n = env.n();
    let topology = env.topology;
    let params = env.params;

    let mut acc = mats.z_final.accumulator();

    if !topology.is_ligated(i - 1) {
        acc.add_term(1.0, &[mats.z_linear.entry(i, i - 1)]);
        mats.z_final.add(i, acc);
        return;
    }

    // Totals are scaled by 1/C_std to keep strand-association conventions
    // consistent across the ligated and unligated regimes.
    acc.add_term(
        params.l / params.c_std,
        &[mats.c_eff_no_coax_singlet.entry(i, i - 1)],
    );

    // Split segments on either side of any strand break, folded
    // independently.
    if env.constraints.loop_extension_allowed(topology.len(), i) {
        for c in i..(i + n - 1) {
            if !topology.is_ligated(c) {
                acc.add_term(
                    1.0,
                    &[
                        mats.z_linear.entry(i, c),
                        mats.z_linear.entry(c + 1, i - 1),
                    ],
                );
            }
        }
    }

    // A stacked pair bridging the i-1/i junction.
    for j in (i + 1)..(i + n - 1) {
        if topology.is_ligated(j) {
            acc.add_term(
                params.c_eff_stacked_pair,
                &[mats.z_bp.entry(i, j), mats.z_bp.entry(j + 1, i - 1)],
            );
        }
    }

    let c_eff_for_coax = if params.allow_strained_3wj {
        &mats.c_eff
    } else {
        &mats.c_eff_no_bp_singlet
    };

    for j in (i + 1)..(i + n - 2) {
        // Coaxial stack across the junction, the two helices joined by a
        // loop.
        for k in (j + 2)..(i + n - 1) {
            if !topology.is_ligated(j) || !topology.is_ligated(k - 1) {
                continue;
            }
            acc.add_term(
                params.l * params.l * params.l_coax * params.k_coax,
                &[
                    mats.z_bp.entry(i, j),
                    c_eff_for_coax.entry(j + 1, k - 1),
                    mats.z_bp.entry(k, i - 1),
                ],
            );
        }
        // Coaxial stack across the junction, the two helices in split
        // segments.
        for k in (j + 1)..(i + n - 1) {
            acc.add_term(
                params.k_coax,
                &[
                    mats.z_bp.entry(i, j),
                    mats.z_cut.entry(j, k),
                    mats.z_bp.entry(k, i - 1),
                ],
            );
        }
    }

    mats.z_final.add(i, acc);
}
