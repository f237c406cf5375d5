//! The recursive apply family
//!
//! Every compound operation is a structural recursion over the operand DAGs,
//! splitting at the topmost level among the operands and memoized through the
//! operator cache. Results are canonical by construction: the recursion
//! bottoms out in terminal shortcuts and rebuilds through the hash-consing
//! `mk`, so identical functions always land on identical node ids.
//!
//! In ZDD mode the one terminal is the family `{{}}`, not the constant-true
//! function, so the operators that produce complements (`nand`, `nor`, `imp`,
//! `biimp`, `less`, `invimp`) are rewritten over the family operators plus
//! complement against the universe before the recursion starts.

use std::fmt;

use crate::cache::{CacheKey, CacheOp, QuantOp};
use crate::error::{BddError, DomainError};
use crate::node::{DiagramKind, Level, NodeId, ONE_NODE, ZERO_NODE};

use super::FactoryInner;

/// The dyadic operator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    /// Conjunction `a ∧ b`.
    And,
    /// Exclusive or `a ⊕ b`.
    Xor,
    /// Disjunction `a ∨ b`.
    Or,
    /// Negated conjunction `¬(a ∧ b)`.
    Nand,
    /// Negated disjunction `¬(a ∨ b)`.
    Nor,
    /// Implication `a → b`.
    Imp,
    /// Biconditional `a ↔ b`.
    Biimp,
    /// Difference `a ∧ ¬b`.
    Diff,
    /// Strict inverse implication `¬a ∧ b`.
    Less,
    /// Inverse implication `a ∨ ¬b`.
    InvImp,
}

impl BinOp {
    /// Truth table of the operator.
    pub fn eval(self, a: bool, b: bool) -> bool {
        match self {
            BinOp::And => a && b,
            BinOp::Xor => a != b,
            BinOp::Or => a || b,
            BinOp::Nand => !(a && b),
            BinOp::Nor => !(a || b),
            BinOp::Imp => !a || b,
            BinOp::Biimp => a == b,
            BinOp::Diff => a && !b,
            BinOp::Less => !a && b,
            BinOp::InvImp => a || !b,
        }
    }

    /// Operators that commute; their operands are normalized in cache keys.
    fn commutative(self) -> bool {
        matches!(
            self,
            BinOp::And | BinOp::Xor | BinOp::Or | BinOp::Nand | BinOp::Nor | BinOp::Biimp
        )
    }

    /// Operators that are pointwise-closed over the ZDD terminals; the rest
    /// are rewritten before recursing in ZDD mode.
    fn zdd_family(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or | BinOp::Xor | BinOp::Diff)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinOp::And => "and",
            BinOp::Xor => "xor",
            BinOp::Or => "or",
            BinOp::Nand => "nand",
            BinOp::Nor => "nor",
            BinOp::Imp => "imp",
            BinOp::Biimp => "biimp",
            BinOp::Diff => "diff",
            BinOp::Less => "less",
            BinOp::InvImp => "invimp",
        };
        write!(f, "{}", name)
    }
}

impl FactoryInner {
    /// Dyadic apply entry point.
    pub(crate) fn apply(&mut self, op: BinOp, f: NodeId, g: NodeId) -> Result<NodeId, BddError> {
        if self.kind() == DiagramKind::Zdd && !op.zdd_family() {
            return match op {
                BinOp::Nand => {
                    let r = self.apply_rec(BinOp::And, f, g)?;
                    self.not_node(r)
                }
                BinOp::Nor => {
                    let r = self.apply_rec(BinOp::Or, f, g)?;
                    self.not_node(r)
                }
                BinOp::Biimp => {
                    let r = self.apply_rec(BinOp::Xor, f, g)?;
                    self.not_node(r)
                }
                BinOp::Imp => {
                    let nf = self.not_node(f)?;
                    self.apply_rec(BinOp::Or, nf, g)
                }
                BinOp::Less => self.apply_rec(BinOp::Diff, g, f),
                BinOp::InvImp => {
                    let ng = self.not_node(g)?;
                    self.apply_rec(BinOp::Or, f, ng)
                }
                _ => unreachable!(),
            };
        }
        self.apply_rec(op, f, g)
    }

    fn apply_rec(&mut self, op: BinOp, f: NodeId, g: NodeId) -> Result<NodeId, BddError> {
        if let Some(r) = self.terminal_shortcut(op, f, g) {
            return Ok(r);
        }
        let (f, g) = if op.commutative() && f > g { (g, f) } else { (f, g) };
        let key = CacheKey::binary(CacheOp::Apply(op), f, g);
        if let Some(r) = self.cache.lookup(&key) {
            return Ok(r);
        }

        let v = self.store.level(f).min(self.store.level(g));
        let (f0, f1) = self.store.cofactors(f, v);
        let (g0, g1) = self.store.cofactors(g, v);
        let lo = self.apply_rec(op, f0, g0)?;
        let hi = self.apply_rec(op, f1, g1)?;
        let r = self.store.mk(v, lo, hi)?;

        self.cache.insert(key, r);
        Ok(r)
    }

    /// Terminal cases that settle `op(f, g)` without recursing.
    fn terminal_shortcut(&self, op: BinOp, f: NodeId, g: NodeId) -> Option<NodeId> {
        let terminal = |b: bool| if b { ONE_NODE } else { ZERO_NODE };
        if f <= ONE_NODE && g <= ONE_NODE {
            return Some(terminal(op.eval(f == ONE_NODE, g == ONE_NODE)));
        }
        if self.kind() == DiagramKind::Zdd {
            // Only identities that hold for the family reading, where the
            // one terminal is {{}} rather than the constant true.
            return match op {
                BinOp::And if f == g => Some(f),
                BinOp::And if f == ZERO_NODE || g == ZERO_NODE => Some(ZERO_NODE),
                BinOp::Or if f == g => Some(f),
                BinOp::Or if f == ZERO_NODE => Some(g),
                BinOp::Or if g == ZERO_NODE => Some(f),
                BinOp::Xor if f == g => Some(ZERO_NODE),
                BinOp::Xor if f == ZERO_NODE => Some(g),
                BinOp::Xor if g == ZERO_NODE => Some(f),
                BinOp::Diff if f == g => Some(ZERO_NODE),
                BinOp::Diff if f == ZERO_NODE => Some(ZERO_NODE),
                BinOp::Diff if g == ZERO_NODE => Some(f),
                _ => None,
            };
        }
        match op {
            BinOp::And if f == g => Some(f),
            BinOp::And if f == ZERO_NODE || g == ZERO_NODE => Some(ZERO_NODE),
            BinOp::And if f == ONE_NODE => Some(g),
            BinOp::And if g == ONE_NODE => Some(f),
            BinOp::Or if f == g => Some(f),
            BinOp::Or if f == ONE_NODE || g == ONE_NODE => Some(ONE_NODE),
            BinOp::Or if f == ZERO_NODE => Some(g),
            BinOp::Or if g == ZERO_NODE => Some(f),
            BinOp::Xor if f == g => Some(ZERO_NODE),
            BinOp::Xor if f == ZERO_NODE => Some(g),
            BinOp::Xor if g == ZERO_NODE => Some(f),
            BinOp::Nand if f == ZERO_NODE || g == ZERO_NODE => Some(ONE_NODE),
            BinOp::Nor if f == ONE_NODE || g == ONE_NODE => Some(ZERO_NODE),
            BinOp::Imp if f == ZERO_NODE || g == ONE_NODE => Some(ONE_NODE),
            BinOp::Imp if f == g => Some(ONE_NODE),
            BinOp::Imp if f == ONE_NODE => Some(g),
            BinOp::Biimp if f == g => Some(ONE_NODE),
            BinOp::Biimp if f == ONE_NODE => Some(g),
            BinOp::Biimp if g == ONE_NODE => Some(f),
            BinOp::Diff if f == g => Some(ZERO_NODE),
            BinOp::Diff if f == ZERO_NODE || g == ONE_NODE => Some(ZERO_NODE),
            BinOp::Diff if g == ZERO_NODE => Some(f),
            BinOp::Less if f == g => Some(ZERO_NODE),
            BinOp::Less if f == ONE_NODE || g == ZERO_NODE => Some(ZERO_NODE),
            BinOp::Less if f == ZERO_NODE => Some(g),
            BinOp::InvImp if f == ONE_NODE || g == ZERO_NODE => Some(ONE_NODE),
            BinOp::InvImp if f == g => Some(ONE_NODE),
            BinOp::InvImp if g == ONE_NODE => Some(f),
            _ => None,
        }
    }

    /// Negation. Structural terminal swap in BDD mode, complement against
    /// the universe in ZDD mode.
    pub(crate) fn not_node(&mut self, f: NodeId) -> Result<NodeId, BddError> {
        match self.kind() {
            DiagramKind::Bdd => self.not_rec(f),
            DiagramKind::Zdd => {
                let u = self.universe_id()?;
                self.apply_rec(BinOp::Diff, u, f)
            }
        }
    }

    fn not_rec(&mut self, f: NodeId) -> Result<NodeId, BddError> {
        if f == ZERO_NODE {
            return Ok(ONE_NODE);
        }
        if f == ONE_NODE {
            return Ok(ZERO_NODE);
        }
        let key = CacheKey::unary(CacheOp::Not, f);
        if let Some(r) = self.cache.lookup(&key) {
            return Ok(r);
        }
        let (low, high) = (self.store.low(f), self.store.high(f));
        let level = self.store.level(f);
        let lo = self.not_rec(low)?;
        let hi = self.not_rec(high)?;
        let r = self.store.mk(level, lo, hi)?;
        self.cache.insert(key, r);
        Ok(r)
    }

    /// If-then-else `if f then g else h`.
    pub(crate) fn ite(&mut self, f: NodeId, g: NodeId, h: NodeId) -> Result<NodeId, BddError> {
        if self.kind() == DiagramKind::Zdd {
            // (f ∧ g) ∨ (¬f ∧ h), with ¬f ∧ h as h \ f.
            let t = self.apply_rec(BinOp::And, f, g)?;
            let e = self.apply_rec(BinOp::Diff, h, f)?;
            return self.apply_rec(BinOp::Or, t, e);
        }
        self.ite_rec(f, g, h)
    }

    fn ite_rec(&mut self, f: NodeId, g: NodeId, h: NodeId) -> Result<NodeId, BddError> {
        if f == ONE_NODE {
            return Ok(g);
        }
        if f == ZERO_NODE {
            return Ok(h);
        }
        if g == h {
            return Ok(g);
        }
        if g == ONE_NODE && h == ZERO_NODE {
            return Ok(f);
        }

        let key = CacheKey::ternary(CacheOp::Ite, f, g, h);
        if let Some(r) = self.cache.lookup(&key) {
            return Ok(r);
        }

        let v = self
            .store
            .level(f)
            .min(self.store.level(g))
            .min(self.store.level(h));
        let (f0, f1) = self.store.cofactors(f, v);
        let (g0, g1) = self.store.cofactors(g, v);
        let (h0, h1) = self.store.cofactors(h, v);
        let lo = self.ite_rec(f0, g0, h0)?;
        let hi = self.ite_rec(f1, g1, h1)?;
        let r = self.store.mk(v, lo, hi)?;

        self.cache.insert(key, r);
        Ok(r)
    }

    /// Quantify the levels of `set` out of `f` with quantifier `q`.
    ///
    /// `set` is ascending; `set_id` is the id of the set's cube, used only in
    /// cache keys.
    pub(crate) fn quantify(
        &mut self,
        f: NodeId,
        set: &[Level],
        q: QuantOp,
        set_id: NodeId,
    ) -> Result<NodeId, BddError> {
        self.quant_rec(f, set, 0, q, set_id)
    }

    fn quant_rec(
        &mut self,
        f: NodeId,
        set: &[Level],
        i: usize,
        q: QuantOp,
        set_id: NodeId,
    ) -> Result<NodeId, BddError> {
        if i >= set.len() {
            return Ok(f);
        }
        let fl = self.store.level(f);
        let v = set[i];
        // A BDD skips levels it does not depend on, and ∨/∧ are idempotent;
        // the parity quantifier is not (⊕v.f = 0 for untouched v).
        if v < fl && self.kind() == DiagramKind::Bdd && q != QuantOp::Unique {
            return self.quant_rec(f, set, i + 1, q, set_id);
        }

        let key = CacheKey::binary(CacheOp::Quant(q), f, i).with_aux(set_id as u64);
        if let Some(r) = self.cache.lookup(&key) {
            return Ok(r);
        }

        let r = if v < fl {
            let (c0, c1) = self.store.cofactors(f, v);
            let r0 = self.quant_rec(c0, set, i + 1, q, set_id)?;
            let r1 = self.quant_rec(c1, set, i + 1, q, set_id)?;
            let combined = self.apply_rec(q.combiner(), r0, r1)?;
            // The result no longer depends on v. A BDD expresses that by
            // eliding the level; a ZDD needs an explicit don't-care branch
            // (absent means fixed zero there). mk does the right thing in
            // both modes.
            self.store.mk(v, combined, combined)?
        } else if fl < v {
            let (low, high) = (self.store.low(f), self.store.high(f));
            let lo = self.quant_rec(low, set, i, q, set_id)?;
            let hi = self.quant_rec(high, set, i, q, set_id)?;
            self.store.mk(fl, lo, hi)?
        } else {
            let (low, high) = (self.store.low(f), self.store.high(f));
            let r0 = self.quant_rec(low, set, i + 1, q, set_id)?;
            let r1 = self.quant_rec(high, set, i + 1, q, set_id)?;
            let combined = self.apply_rec(q.combiner(), r0, r1)?;
            self.store.mk(v, combined, combined)?
        };

        self.cache.insert(key, r);
        Ok(r)
    }

    /// Fused `Q set . (f op g)`: one recursion over the combined levels.
    pub(crate) fn apply_quant(
        &mut self,
        op: BinOp,
        f: NodeId,
        g: NodeId,
        set: &[Level],
        q: QuantOp,
        set_id: NodeId,
    ) -> Result<NodeId, BddError> {
        if self.kind() == DiagramKind::Zdd && !op.zdd_family() {
            // The rewrite of complement-producing operators does not fuse;
            // fall back to apply followed by quantification.
            let t = self.apply(op, f, g)?;
            return self.quantify(t, set, q, set_id);
        }
        self.appquant_rec(op, f, g, set, 0, q, set_id)
    }

    #[allow(clippy::too_many_arguments)]
    fn appquant_rec(
        &mut self,
        op: BinOp,
        f: NodeId,
        g: NodeId,
        set: &[Level],
        i: usize,
        q: QuantOp,
        set_id: NodeId,
    ) -> Result<NodeId, BddError> {
        if i >= set.len() {
            return self.apply_rec(op, f, g);
        }
        if let Some(t) = self.terminal_shortcut(op, f, g) {
            // The operator collapsed structurally; quantify what remains.
            return self.quant_rec(t, set, i, q, set_id);
        }

        let (f, g) = if op.commutative() && f > g { (g, f) } else { (f, g) };
        let key = CacheKey::ternary(CacheOp::ApplyQuant(op, q), f, g, i).with_aux(set_id as u64);
        if let Some(r) = self.cache.lookup(&key) {
            return Ok(r);
        }

        let v = self.store.level(f).min(self.store.level(g));
        let qv = set[i];
        let r = if qv < v {
            if self.kind() == DiagramKind::Bdd && q != QuantOp::Unique {
                self.appquant_rec(op, f, g, set, i + 1, q, set_id)?
            } else {
                let (f0, f1) = self.store.cofactors(f, qv);
                let (g0, g1) = self.store.cofactors(g, qv);
                let r0 = self.appquant_rec(op, f0, g0, set, i + 1, q, set_id)?;
                let r1 = self.appquant_rec(op, f1, g1, set, i + 1, q, set_id)?;
                let combined = self.apply_rec(q.combiner(), r0, r1)?;
                // See quant_rec: reintroduce the quantified level as a
                // don't-care; collapses to `combined` in BDD mode.
                self.store.mk(qv, combined, combined)?
            }
        } else {
            let (f0, f1) = self.store.cofactors(f, v);
            let (g0, g1) = self.store.cofactors(g, v);
            if v < qv {
                let lo = self.appquant_rec(op, f0, g0, set, i, q, set_id)?;
                let hi = self.appquant_rec(op, f1, g1, set, i, q, set_id)?;
                self.store.mk(v, lo, hi)?
            } else {
                let r0 = self.appquant_rec(op, f0, g0, set, i + 1, q, set_id)?;
                let r1 = self.appquant_rec(op, f1, g1, set, i + 1, q, set_id)?;
                let combined = self.apply_rec(q.combiner(), r0, r1)?;
                self.store.mk(qv, combined, combined)?
            }
        };

        self.cache.insert(key, r);
        Ok(r)
    }

    /// Restriction by a cube: fix each of the cube's variables to its
    /// literal polarity.
    pub(crate) fn restrict(&mut self, f: NodeId, cube: NodeId) -> Result<NodeId, BddError> {
        if cube == ZERO_NODE {
            return Err(DomainError::NotACube.into());
        }
        self.restrict_rec(f, cube)
    }

    fn restrict_rec(&mut self, f: NodeId, c: NodeId) -> Result<NodeId, BddError> {
        if c == ONE_NODE || f <= ONE_NODE {
            return Ok(f);
        }
        let key = CacheKey::binary(CacheOp::Restrict, f, c);
        if let Some(r) = self.cache.lookup(&key) {
            return Ok(r);
        }

        let fl = self.store.level(f);
        let cl = self.store.level(c);
        let r = if cl < fl {
            // f does not mention this literal's variable; drop it.
            let (_, next) = self.cube_literal(c)?;
            self.restrict_rec(f, next)?
        } else if fl < cl {
            let (low, high) = (self.store.low(f), self.store.high(f));
            let lo = self.restrict_rec(low, c)?;
            let hi = self.restrict_rec(high, c)?;
            self.store.mk(fl, lo, hi)?
        } else {
            let (polarity, next) = self.cube_literal(c)?;
            let child = if polarity {
                self.store.high(f)
            } else {
                self.store.low(f)
            };
            self.restrict_rec(child, next)?
        };

        self.cache.insert(key, r);
        Ok(r)
    }

    /// Split one literal off a cube: (polarity, rest). Fails when the node
    /// is not a literal.
    pub(crate) fn cube_literal(&self, c: NodeId) -> Result<(bool, NodeId), BddError> {
        let (low, high) = (self.store.low(c), self.store.high(c));
        if low == ZERO_NODE && high != ZERO_NODE {
            Ok((true, high))
        } else if high == ZERO_NODE && low != ZERO_NODE {
            Ok((false, low))
        } else {
            Err(DomainError::NotACube.into())
        }
    }

    /// Generalized cofactor `f ⇓ c`.
    pub(crate) fn constrain(&mut self, f: NodeId, c: NodeId) -> Result<NodeId, BddError> {
        if c == ZERO_NODE {
            return Ok(ZERO_NODE);
        }
        if c == ONE_NODE || f <= ONE_NODE {
            return Ok(f);
        }
        let key = CacheKey::binary(CacheOp::Constrain, f, c);
        if let Some(r) = self.cache.lookup(&key) {
            return Ok(r);
        }

        let v = self.store.level(f).min(self.store.level(c));
        let (f0, f1) = self.store.cofactors(f, v);
        let (c0, c1) = self.store.cofactors(c, v);
        let r = if c0 == ZERO_NODE {
            self.constrain(f1, c1)?
        } else if c1 == ZERO_NODE {
            self.constrain(f0, c0)?
        } else {
            let lo = self.constrain(f0, c0)?;
            let hi = self.constrain(f1, c1)?;
            self.store.mk(v, lo, hi)?
        };

        self.cache.insert(key, r);
        Ok(r)
    }

    /// Coudert–Madre restrict: simplify `f` against the care set `d`.
    pub(crate) fn simplify(&mut self, f: NodeId, d: NodeId) -> Result<NodeId, BddError> {
        if d == ZERO_NODE {
            return Ok(ZERO_NODE);
        }
        if d == ONE_NODE || f <= ONE_NODE {
            return Ok(f);
        }
        let key = CacheKey::binary(CacheOp::Simplify, f, d);
        if let Some(r) = self.cache.lookup(&key) {
            return Ok(r);
        }

        let fl = self.store.level(f);
        let dl = self.store.level(d);
        let r = if dl < fl {
            // f is indifferent to d's top variable; merge its cofactors.
            let (d0, d1) = (self.store.low(d), self.store.high(d));
            let dn = self.apply_rec(BinOp::Or, d0, d1)?;
            self.simplify(f, dn)?
        } else if fl < dl {
            let (low, high) = (self.store.low(f), self.store.high(f));
            let lo = self.simplify(low, d)?;
            let hi = self.simplify(high, d)?;
            self.store.mk(fl, lo, hi)?
        } else {
            let (f0, f1) = (self.store.low(f), self.store.high(f));
            let (d0, d1) = (self.store.low(d), self.store.high(d));
            if d0 == ZERO_NODE {
                self.simplify(f1, d1)?
            } else if d1 == ZERO_NODE {
                self.simplify(f0, d0)?
            } else {
                let lo = self.simplify(f0, d0)?;
                let hi = self.simplify(f1, d1)?;
                self.store.mk(fl, lo, hi)?
            }
        };

        self.cache.insert(key, r);
        Ok(r)
    }

    /// Substitute `g` for the variable at `level` in `f`.
    pub(crate) fn compose(
        &mut self,
        f: NodeId,
        g: NodeId,
        level: Level,
    ) -> Result<NodeId, BddError> {
        if self.store.level(f) > level {
            // f does not mention the variable.
            return Ok(f);
        }
        let key = CacheKey::binary(CacheOp::Compose, f, g).with_aux(level as u64);
        if let Some(r) = self.cache.lookup(&key) {
            return Ok(r);
        }

        let fl = self.store.level(f);
        let (low, high) = (self.store.low(f), self.store.high(f));
        let r = if fl < level {
            let lo = self.compose(low, g, level)?;
            let hi = self.compose(high, g, level)?;
            self.rebuild(fl, lo, hi)?
        } else {
            self.ite(g, high, low)?
        };

        self.cache.insert(key, r);
        Ok(r)
    }

    /// Simultaneous substitution: `reps[level]` replaces the variable at
    /// each level. `generation` is the pairing stamp for cache keys.
    pub(crate) fn veccompose(
        &mut self,
        f: NodeId,
        reps: &[NodeId],
        generation: u64,
    ) -> Result<NodeId, BddError> {
        if f <= ONE_NODE {
            return Ok(f);
        }
        let key = CacheKey::unary(CacheOp::VecCompose, f).with_aux(generation);
        if let Some(r) = self.cache.lookup(&key) {
            return Ok(r);
        }

        let fl = self.store.level(f);
        let (low, high) = (self.store.low(f), self.store.high(f));
        let lo = self.veccompose(low, reps, generation)?;
        let hi = self.veccompose(high, reps, generation)?;
        let r = self.ite(reps[fl], hi, lo)?;

        self.cache.insert(key, r);
        Ok(r)
    }

    /// Rename variables: `map[level]` is the replacement level.
    ///
    /// Rebuilds nodes directly while the replacement level stays above both
    /// rebuilt children; otherwise the ordering constraint would break and
    /// the rebuild falls back to `ite` on the replacement variable.
    pub(crate) fn replace(
        &mut self,
        f: NodeId,
        map: &[Level],
        generation: u64,
    ) -> Result<NodeId, BddError> {
        if f <= ONE_NODE {
            return Ok(f);
        }
        let key = CacheKey::unary(CacheOp::Replace, f).with_aux(generation);
        if let Some(r) = self.cache.lookup(&key) {
            return Ok(r);
        }

        let fl = self.store.level(f);
        let (low, high) = (self.store.low(f), self.store.high(f));
        let lo = self.replace(low, map, generation)?;
        let hi = self.replace(high, map, generation)?;
        let r = self.rebuild(map[fl], lo, hi)?;

        self.cache.insert(key, r);
        Ok(r)
    }

    /// Hash-cons `(level, lo, hi)` when the ordering allows it, otherwise
    /// route through `ite` on the variable at `level`.
    fn rebuild(&mut self, level: Level, lo: NodeId, hi: NodeId) -> Result<NodeId, BddError> {
        if self.store.level(lo) > level && self.store.level(hi) > level {
            Ok(self.store.mk(level, lo, hi)?)
        } else {
            let v = self.var_function(level)?;
            self.ite(v, hi, lo)
        }
    }
}
