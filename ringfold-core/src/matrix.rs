//! Dynamic-programming table abstraction.
//!
//! Every recursion writes into a [`DpMatrix`] (or the one-dimensional
//! [`DpVector`]) through a [`TermAccumulator`]. A term is stated once — a
//! scalar coefficient times a product of already-finalized sub-entries — and
//! the accumulator derives all three shadows from it: the value, the
//! derivative by the product rule, and the recorded decomposition. Keeping a
//! single term list is what guarantees the three stay consistent; there is no
//! second copy of any recursion to drift.

use crate::topology::wrap;
use crate::types::Pos;

/// Identifies one of the named DP tables.
///
/// Contribution lists refer to sub-entries by `(table, i, j)`; this is the
/// table half of that address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixId {
    /// Split-at-a-strand-break partition function
    ZCut,
    /// Pair-type-restricted base-pairing partition function
    ZBpq(usize),
    /// Base-pairing partition function summed over types
    ZBp,
    /// Coaxial-stack partition function
    ZCoax,
    /// Effective concentration, shared core terms
    CEffBasic,
    /// Effective concentration without the lone-coax closure
    CEffNoCoaxSinglet,
    /// Effective concentration without the lone-helix closure
    CEffNoBpSinglet,
    /// Effective concentration, all closures
    CEff,
    /// Unrestricted span partition function
    ZLinear,
    /// Per-root total partition function
    ZFinal,
}

/// One recorded decomposition of an entry.
///
/// `weight` equals the term's scalar coefficient times the product of the
/// referenced sub-entry values; an empty factor list marks a constant term.
#[derive(Debug, Clone)]
pub struct Contribution {
    /// The term's numeric weight
    pub weight: f64,
    /// Addresses of the sub-entries whose product (times a scalar) gives
    /// the weight
    pub factors: Vec<(MatrixId, usize, usize)>,
}

/// Scalar snapshot of one finalized sub-entry, used as a term factor.
#[derive(Debug, Clone, Copy)]
pub struct EntryRef {
    /// Table the entry lives in
    pub id: MatrixId,
    /// Wrapped row index
    pub i: usize,
    /// Wrapped column index
    pub j: usize,
    /// Entry value
    pub q: f64,
    /// Entry derivative (zero when the derivative shadow is off)
    pub dq: f64,
}

/// Accumulates the terms of one recursion call before they are committed to
/// a single target entry.
#[derive(Debug)]
pub struct TermAccumulator {
    q: f64,
    dq: f64,
    contribs: Option<Vec<Contribution>>,
}

impl TermAccumulator {
    fn new(track_contribs: bool) -> Self {
        Self {
            q: 0.0,
            dq: 0.0,
            contribs: track_contribs.then(Vec::new),
        }
    }

    /// Adds one term: `coeff` times the product of the factor values.
    ///
    /// The derivative shadow receives the product rule applied to the same
    /// factors; the contribution shadow receives the term's weight and
    /// factor addresses. An empty factor list adds the constant `coeff`.
    pub fn add_term(&mut self, coeff: f64, factors: &[EntryRef]) {
        let mut product = coeff;
        for factor in factors {
            product *= factor.q;
        }
        self.q += product;

        // d(coeff * prod q_k) = coeff * sum_k dq_k * prod_{m != k} q_m
        for k in 0..factors.len() {
            let mut derivative_term = coeff * factors[k].dq;
            for (m, factor) in factors.iter().enumerate() {
                if m != k {
                    derivative_term *= factor.q;
                }
            }
            self.dq += derivative_term;
        }

        if let Some(contribs) = &mut self.contribs {
            if product != 0.0 {
                contribs.push(Contribution {
                    weight: product,
                    factors: factors.iter().map(|f| (f.id, f.i, f.j)).collect(),
                });
            }
        }
    }

    /// Adds `scale * q_accumulated_so_far` to the derivative shadow only.
    ///
    /// Used by the pair-type recursion, where the dissociation constant is a
    /// multiplicative factor of every term and therefore contributes an
    /// extra `-Q/Kd` to the entry's own derivative.
    pub fn add_self_derivative(&mut self, scale: f64) {
        self.dq += scale * self.q;
    }

    /// Value accumulated so far.
    #[must_use]
    pub fn q(&self) -> f64 {
        self.q
    }
}

/// A 2D circular-indexed DP table with optional derivative and contribution
/// shadows.
///
/// Entries are zero-initialized and only ever grow by [`DpMatrix::add`];
/// reads of entries the fill order has not reached yet return the zero they
/// were initialized with.
#[derive(Debug)]
pub struct DpMatrix {
    id: MatrixId,
    n: usize,
    q: Vec<f64>,
    dq: Option<Vec<f64>>,
    contribs: Option<Vec<Vec<Contribution>>>,
}

impl DpMatrix {
    /// Allocates an `n x n` zero table.
    #[must_use]
    pub fn new(id: MatrixId, n: usize, track_deriv: bool, track_contribs: bool) -> Self {
        Self {
            id,
            n,
            q: vec![0.0; n * n],
            dq: track_deriv.then(|| vec![0.0; n * n]),
            contribs: track_contribs.then(|| vec![Vec::new(); n * n]),
        }
    }

    #[inline]
    fn index(&self, i: Pos, j: Pos) -> usize {
        wrap(i, self.n) * self.n + wrap(j, self.n)
    }

    /// Entry value at `(i, j)`, indices wrapped.
    #[inline]
    #[must_use]
    pub fn q(&self, i: Pos, j: Pos) -> f64 {
        self.q[self.index(i, j)]
    }

    /// Entry derivative at `(i, j)`, zero when the shadow is off.
    #[inline]
    #[must_use]
    pub fn dq(&self, i: Pos, j: Pos) -> f64 {
        match &self.dq {
            Some(dq) => dq[self.index(i, j)],
            None => 0.0,
        }
    }

    /// Snapshot of the entry at `(i, j)` for use as a term factor.
    #[inline]
    #[must_use]
    pub fn entry(&self, i: Pos, j: Pos) -> EntryRef {
        let (wi, wj) = (wrap(i, self.n), wrap(j, self.n));
        EntryRef {
            id: self.id,
            i: wi,
            j: wj,
            q: self.q[wi * self.n + wj],
            dq: self.dq.as_ref().map_or(0.0, |dq| dq[wi * self.n + wj]),
        }
    }

    /// Fresh accumulator configured for this table's shadows.
    #[must_use]
    pub fn accumulator(&self) -> TermAccumulator {
        TermAccumulator::new(self.contribs.is_some())
    }

    /// Commits an accumulated sum of terms into entry `(i, j)`.
    ///
    /// This is the table's only mutator; entries grow monotonically.
    pub fn add(&mut self, i: Pos, j: Pos, accumulated: TermAccumulator) {
        let index = self.index(i, j);
        self.q[index] += accumulated.q;
        if let Some(dq) = &mut self.dq {
            dq[index] += accumulated.dq;
        }
        if let (Some(contribs), Some(new_contribs)) = (&mut self.contribs, accumulated.contribs) {
            contribs[index].extend(new_contribs);
        }
    }

    /// Recorded decompositions of entry `(i, j)`; empty when the shadow is
    /// off or the entry is zero.
    #[must_use]
    pub fn contributions(&self, i: Pos, j: Pos) -> &[Contribution] {
        match &self.contribs {
            Some(contribs) => &contribs[self.index(i, j)],
            None => &[],
        }
    }

    /// Table identity.
    #[must_use]
    pub fn id(&self) -> MatrixId {
        self.id
    }

    /// Side length of the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether the table has zero side length.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}

/// The 1D analogue of [`DpMatrix`], used for the per-root totals.
#[derive(Debug)]
pub struct DpVector {
    id: MatrixId,
    n: usize,
    q: Vec<f64>,
    dq: Option<Vec<f64>>,
    contribs: Option<Vec<Vec<Contribution>>>,
}

impl DpVector {
    /// Allocates a length-`n` zero vector.
    #[must_use]
    pub fn new(id: MatrixId, n: usize, track_deriv: bool, track_contribs: bool) -> Self {
        Self {
            id,
            n,
            q: vec![0.0; n],
            dq: track_deriv.then(|| vec![0.0; n]),
            contribs: track_contribs.then(|| vec![Vec::new(); n]),
        }
    }

    /// Entry value at `i`, index wrapped.
    #[inline]
    #[must_use]
    pub fn q(&self, i: Pos) -> f64 {
        self.q[wrap(i, self.n)]
    }

    /// Entry derivative at `i`, zero when the shadow is off.
    #[inline]
    #[must_use]
    pub fn dq(&self, i: Pos) -> f64 {
        match &self.dq {
            Some(dq) => dq[wrap(i, self.n)],
            None => 0.0,
        }
    }

    /// Fresh accumulator configured for this vector's shadows.
    #[must_use]
    pub fn accumulator(&self) -> TermAccumulator {
        TermAccumulator::new(self.contribs.is_some())
    }

    /// Commits an accumulated sum of terms into entry `i`.
    pub fn add(&mut self, i: Pos, accumulated: TermAccumulator) {
        let index = wrap(i, self.n);
        self.q[index] += accumulated.q;
        if let Some(dq) = &mut self.dq {
            dq[index] += accumulated.dq;
        }
        if let (Some(contribs), Some(new_contribs)) = (&mut self.contribs, accumulated.contribs) {
            contribs[index].extend(new_contribs);
        }
    }

    /// Recorded decompositions of entry `i`.
    #[must_use]
    pub fn contributions(&self, i: Pos) -> &[Contribution] {
        match &self.contribs {
            Some(contribs) => &contribs[wrap(i, self.n)],
            None => &[],
        }
    }

    /// Vector identity.
    #[must_use]
    pub fn id(&self) -> MatrixId {
        self.id
    }

    /// All values in index order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.q
    }
}
