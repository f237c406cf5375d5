//! Diagram factory, handles, and variable sets
//!
//! A [`BddFactory`] owns the node store, the operator cache, the variable
//! ordering, and the finite-domain table. Everything it hands out ([`Bdd`]
//! handles, [`BddVarSet`]s, pairings, domains) stays tied to it and forms a
//! single-owner domain: the internals live behind `Rc<RefCell<…>>`, so
//! handles are deliberately not `Send`/`Sync` while independent factories may
//! run on separate threads.
//!
//! # Reference counting
//!
//! Every handle contributes exactly one external reference to its root node.
//! `Clone` acquires a reference, `Drop` releases it; the consuming `…_with`
//! operations take their operands by value, so a consumed handle cannot be
//! used again. Garbage collection runs on explicit request and at operation
//! entry once the arena has grown past the configured threshold, never while
//! a recursion is in flight.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::cache::{CacheStats, OpCache, QuantOp};
use crate::domain::DomainData;
use crate::error::{BddError, DomainError, NodeError};
use crate::node::{DiagramKind, Level, NodeId, Var, ONE_NODE, ZERO_NODE};
use crate::store::NodeTable;

pub(crate) mod apply;
pub(crate) mod stats;

#[cfg(test)]
mod tests;

pub use apply::BinOp;

/// Tuning knobs for a factory.
///
/// The defaults are sized for small to medium problems; embedders running
/// large fixpoints should raise `initial_capacity` and `cache_capacity`.
#[derive(Debug, Clone)]
pub struct FactoryConfig {
    /// Initial node arena capacity (slots are reserved, not allocated).
    pub initial_capacity: usize,
    /// Maximum entries in the operator cache before it is flushed.
    pub cache_capacity: usize,
    /// Hard cap on node arena slots; allocation past it reports
    /// [`StoreError::TableFull`](crate::error::StoreError::TableFull).
    pub max_nodes: usize,
    /// Run an opportunistic collection at operation entry after this many
    /// fresh slots have been allocated since the last sweep.
    pub gc_growth: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        FactoryConfig {
            initial_capacity: 1 << 10,
            cache_capacity: 1 << 16,
            max_nodes: usize::MAX,
            gc_growth: 1 << 16,
        }
    }
}

/// Shared state behind a factory: store, cache, ordering, domains.
pub(crate) struct FactoryInner {
    pub(crate) store: NodeTable,
    pub(crate) cache: OpCache,
    /// Variable index to level (position in the ordering).
    pub(crate) var2level: Vec<Level>,
    /// Level back to variable index.
    pub(crate) level2var: Vec<Var>,
    /// Pinned `(level, zero, one)` node per variable, by variable index.
    ///
    /// Variables live for the factory's lifetime, so these are permanent
    /// GC roots.
    pub(crate) var_nodes: Vec<NodeId>,
    /// Pinned `(level, one, zero)` node per variable (BDD mode only; the
    /// triple collapses under the ZDD reduction).
    pub(crate) nvar_nodes: Vec<NodeId>,
    /// Cached, pinned ZDD universe chain; rebuilt when variables grow.
    pub(crate) universe: Option<NodeId>,
    pub(crate) domains: Vec<DomainData>,
    /// Monotone source for pairing generation stamps.
    pub(crate) pairing_stamp: u64,
    gc_growth: usize,
    last_gc_size: usize,
}

impl FactoryInner {
    fn new(kind: DiagramKind, config: &FactoryConfig) -> Self {
        FactoryInner {
            store: NodeTable::new(kind, config.initial_capacity, config.max_nodes),
            cache: OpCache::new(config.cache_capacity),
            var2level: Vec::new(),
            level2var: Vec::new(),
            var_nodes: Vec::new(),
            nvar_nodes: Vec::new(),
            universe: None,
            domains: Vec::new(),
            pairing_stamp: 0,
            gc_growth: config.gc_growth.max(1),
            last_gc_size: 2,
        }
    }

    pub(crate) fn kind(&self) -> DiagramKind {
        self.store.kind()
    }

    pub(crate) fn var_num(&self) -> usize {
        self.var2level.len()
    }

    /// Declare variables up to `n`, pinning their base nodes.
    pub(crate) fn grow_vars(&mut self, n: usize) -> Result<(), BddError> {
        while self.var_num() < n {
            let var = self.var_num();
            let level = var; // identity order at creation
            self.var2level.push(level);
            self.level2var.push(var);
            let pos = self.store.mk(level, ZERO_NODE, ONE_NODE)?;
            self.store.incref(pos);
            self.var_nodes.push(pos);
            if self.kind() == DiagramKind::Bdd {
                let neg = self.store.mk(level, ONE_NODE, ZERO_NODE)?;
                self.store.incref(neg);
                self.nvar_nodes.push(neg);
            }
        }
        // The universe spans every level; growing invalidates the chain.
        if let Some(u) = self.universe.take() {
            self.store.decref(u);
        }
        Ok(())
    }

    pub(crate) fn level_of_var(&self, var: Var) -> Result<Level, BddError> {
        self.var2level
            .get(var)
            .copied()
            .ok_or_else(|| {
                DomainError::UnknownVariable {
                    var,
                    var_num: self.var_num(),
                }
                .into()
            })
    }

    pub(crate) fn var_at_level(&self, level: Level) -> Var {
        self.level2var[level]
    }

    /// The diagram of the plain variable at `level`, used by the ite
    /// fallbacks in `compose`/`replace`.
    ///
    /// In BDD mode this is the pinned base node. In ZDD mode the function
    /// `v` is a chain over every level, built on demand; the caller pins it
    /// through whatever it constructs next.
    pub(crate) fn var_function(&mut self, level: Level) -> Result<NodeId, BddError> {
        match self.kind() {
            DiagramKind::Bdd => Ok(self.var_nodes[self.level2var[level]]),
            DiagramKind::Zdd => {
                let mut c = ONE_NODE;
                for l in (0..self.var_num()).rev() {
                    c = if l == level {
                        self.store.mk(l, ZERO_NODE, c)?
                    } else {
                        self.store.mk(l, c, c)?
                    };
                }
                Ok(c)
            }
        }
    }

    /// Id of the universe: the constant-true function.
    ///
    /// In BDD mode that is the one terminal. In ZDD mode it is the chain of
    /// don't-care branches over every level, cached and pinned until the
    /// variable count changes.
    pub(crate) fn universe_id(&mut self) -> Result<NodeId, BddError> {
        match self.kind() {
            DiagramKind::Bdd => Ok(ONE_NODE),
            DiagramKind::Zdd => {
                if let Some(u) = self.universe {
                    return Ok(u);
                }
                let mut u = ONE_NODE;
                for l in (0..self.var_num()).rev() {
                    u = self.store.mk(l, u, u)?;
                }
                self.store.incref(u);
                self.universe = Some(u);
                Ok(u)
            }
        }
    }

    pub(crate) fn next_pairing_stamp(&mut self) -> u64 {
        self.pairing_stamp += 1;
        self.pairing_stamp
    }

    /// Opportunistic collection at operation entry. Never runs while a
    /// recursion is in flight, so intermediate results need no pinning.
    pub(crate) fn maybe_gc(&mut self) {
        if self.store.arena_size() - self.last_gc_size >= self.gc_growth {
            self.run_gc();
        }
    }

    pub(crate) fn run_gc(&mut self) -> usize {
        let freed = self.store.gc();
        // Entries may refer to swept ids; drop everything.
        self.cache.clear();
        self.last_gc_size = self.store.arena_size();
        freed
    }

    /// Build the cube of `literals` (level, polarity), sorted by ascending
    /// level. In ZDD mode a negative literal is the absent-level default and
    /// adds no node.
    pub(crate) fn make_cube(&mut self, literals: &[(Level, bool)]) -> Result<NodeId, BddError> {
        let mut c = ONE_NODE;
        for &(level, polarity) in literals.iter().rev() {
            c = match (self.kind(), polarity) {
                (_, true) => self.store.mk(level, ZERO_NODE, c)?,
                (DiagramKind::Bdd, false) => self.store.mk(level, c, ZERO_NODE)?,
                (DiagramKind::Zdd, false) => c,
            };
        }
        Ok(c)
    }
}

/// A handle to one diagram in a factory.
///
/// `Bdd` is a reference-counted view of a node: cloning acquires a reference,
/// dropping releases it, and equality is node identity: two handles compare
/// equal exactly when they denote the same function, thanks to hash-consing.
///
/// # Examples
///
/// ```
/// use shannon_bdd::BddFactory;
///
/// # fn main() -> Result<(), shannon_bdd::BddError> {
/// let factory = BddFactory::new_bdd(2);
/// let a = factory.ith_var(0)?;
/// let b = factory.ith_var(1)?;
///
/// let f = a.and(&b)?;
/// let g = b.and(&a)?;
/// assert_eq!(f, g); // canonical: same node
/// # Ok(())
/// # }
/// ```
pub struct Bdd {
    pub(crate) factory: Rc<RefCell<FactoryInner>>,
    pub(crate) root: NodeId,
}

impl Bdd {
    /// Wrap `root` in a new handle, acquiring one reference.
    ///
    /// Must be called while `inner` is the borrowed state of `factory`.
    pub(crate) fn wrap(
        factory: &Rc<RefCell<FactoryInner>>,
        inner: &mut FactoryInner,
        root: NodeId,
    ) -> Bdd {
        inner.store.incref(root);
        Bdd {
            factory: Rc::clone(factory),
            root,
        }
    }

    pub(crate) fn check_factory(&self, other: &Bdd) -> Result<(), BddError> {
        if Rc::ptr_eq(&self.factory, &other.factory) {
            Ok(())
        } else {
            Err(NodeError::MismatchedFactories.into())
        }
    }

    /// True if this is the zero terminal (the constant false / empty family).
    pub fn is_zero(&self) -> bool {
        self.root == ZERO_NODE
    }

    /// True if this is the one terminal.
    ///
    /// Note that in ZDD mode the one terminal is the family `{{}}`, not the
    /// constant-true function; see [`is_universe`](Self::is_universe).
    pub fn is_one(&self) -> bool {
        self.root == ONE_NODE
    }

    /// True if this diagram is the constant-true function.
    ///
    /// Coincides with [`is_one`](Self::is_one) in BDD mode; in ZDD mode the
    /// universe is the full don't-care chain and is checked structurally,
    /// without allocating.
    pub fn is_universe(&self) -> bool {
        let inner = self.factory.borrow();
        match inner.kind() {
            DiagramKind::Bdd => self.root == ONE_NODE,
            DiagramKind::Zdd => {
                let mut id = self.root;
                for level in 0..inner.var_num() {
                    if inner.store.is_terminal(id) || inner.store.level(id) != level {
                        return false;
                    }
                    let (low, high) = (inner.store.low(id), inner.store.high(id));
                    if low != high {
                        return false;
                    }
                    id = low;
                }
                id == ONE_NODE
            }
        }
    }

    /// Variable index tested at the root. Fails on terminals.
    pub fn var(&self) -> Result<Var, BddError> {
        let inner = self.factory.borrow();
        if inner.store.is_terminal(self.root) {
            return Err(NodeError::TerminalNode { operation: "var" }.into());
        }
        Ok(inner.var_at_level(inner.store.level(self.root)))
    }

    /// Level of the root in the current ordering. Fails on terminals.
    pub fn level(&self) -> Result<Level, BddError> {
        let inner = self.factory.borrow();
        if inner.store.is_terminal(self.root) {
            return Err(NodeError::TerminalNode { operation: "level" }.into());
        }
        Ok(inner.store.level(self.root))
    }

    /// Handle to the low (else) child. Fails on terminals.
    pub fn low(&self) -> Result<Bdd, BddError> {
        let mut inner = self.factory.borrow_mut();
        if inner.store.is_terminal(self.root) {
            return Err(NodeError::TerminalNode { operation: "low" }.into());
        }
        let child = inner.store.low(self.root);
        Ok(Bdd::wrap(&self.factory, &mut inner, child))
    }

    /// Handle to the high (then) child. Fails on terminals.
    pub fn high(&self) -> Result<Bdd, BddError> {
        let mut inner = self.factory.borrow_mut();
        if inner.store.is_terminal(self.root) {
            return Err(NodeError::TerminalNode { operation: "high" }.into());
        }
        let child = inner.store.high(self.root);
        Ok(Bdd::wrap(&self.factory, &mut inner, child))
    }

    /// A new handle to the same node (one fresh reference). Same as `clone`.
    pub fn id(&self) -> Bdd {
        self.clone()
    }

    /// Release this handle. Equivalent to dropping it.
    pub fn free(self) {}

    /// The factory this handle belongs to.
    pub fn factory(&self) -> BddFactory {
        BddFactory {
            inner: Rc::clone(&self.factory),
        }
    }

    /// Negation: `¬self`.
    ///
    /// In ZDD mode this is the complement against the universe.
    pub fn not(&self) -> Result<Bdd, BddError> {
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let r = inner.not_node(self.root)?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: Rc::clone(&self.factory),
            root,
        })
    }

    /// Conjunction: `self ∧ that`.
    pub fn and(&self, that: &Bdd) -> Result<Bdd, BddError> {
        self.apply(BinOp::And, that)
    }

    /// Disjunction: `self ∨ that`.
    pub fn or(&self, that: &Bdd) -> Result<Bdd, BddError> {
        self.apply(BinOp::Or, that)
    }

    /// Exclusive or: `self ⊕ that`.
    pub fn xor(&self, that: &Bdd) -> Result<Bdd, BddError> {
        self.apply(BinOp::Xor, that)
    }

    /// Implication: `self → that`.
    pub fn imp(&self, that: &Bdd) -> Result<Bdd, BddError> {
        self.apply(BinOp::Imp, that)
    }

    /// Biconditional: `self ↔ that`.
    pub fn biimp(&self, that: &Bdd) -> Result<Bdd, BddError> {
        self.apply(BinOp::Biimp, that)
    }

    /// Difference: `self ∧ ¬that`.
    pub fn diff(&self, that: &Bdd) -> Result<Bdd, BddError> {
        self.apply(BinOp::Diff, that)
    }

    /// Generic dyadic apply.
    pub fn apply(&self, op: BinOp, that: &Bdd) -> Result<Bdd, BddError> {
        self.check_factory(that)?;
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let r = inner.apply(op, self.root, that.root)?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: Rc::clone(&self.factory),
            root,
        })
    }

    /// Consuming apply: computes `self op that` and releases both inputs.
    ///
    /// The operands are moved, so the type system rules out any further use
    /// of a consumed handle.
    pub fn apply_with(self, op: BinOp, that: Bdd) -> Result<Bdd, BddError> {
        self.apply(op, &that)
    }

    /// If-then-else: `if self then g else h`, the ternary core operation.
    pub fn ite(&self, g: &Bdd, h: &Bdd) -> Result<Bdd, BddError> {
        self.check_factory(g)?;
        self.check_factory(h)?;
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let r = inner.ite(self.root, g.root, h.root)?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: Rc::clone(&self.factory),
            root,
        })
    }

    /// Existential quantification: `∃ set . self`.
    pub fn exist(&self, set: &BddVarSet) -> Result<Bdd, BddError> {
        self.quantify(set, QuantOp::Exist)
    }

    /// Universal quantification: `∀ set . self`.
    pub fn for_all(&self, set: &BddVarSet) -> Result<Bdd, BddError> {
        self.quantify(set, QuantOp::ForAll)
    }

    /// Unique quantification: `⊕ set . self` (parity over the cofactors).
    pub fn unique(&self, set: &BddVarSet) -> Result<Bdd, BddError> {
        self.quantify(set, QuantOp::Unique)
    }

    fn quantify(&self, set: &BddVarSet, q: QuantOp) -> Result<Bdd, BddError> {
        self.check_factory(&set.cube)?;
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let r = inner.quantify(self.root, &set.levels, q, set.cube.root)?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: Rc::clone(&self.factory),
            root,
        })
    }

    /// Fused apply-and-exists: `∃ set . (self op that)`.
    ///
    /// One recursion over the combined levels; asymptotically faster than
    /// `apply` followed by `exist`.
    pub fn apply_ex(&self, op: BinOp, that: &Bdd, set: &BddVarSet) -> Result<Bdd, BddError> {
        self.apply_quant(op, that, set, QuantOp::Exist)
    }

    /// Fused apply-and-forall: `∀ set . (self op that)`.
    pub fn apply_all(&self, op: BinOp, that: &Bdd, set: &BddVarSet) -> Result<Bdd, BddError> {
        self.apply_quant(op, that, set, QuantOp::ForAll)
    }

    /// Fused apply-and-unique: `⊕ set . (self op that)`.
    pub fn apply_uni(&self, op: BinOp, that: &Bdd, set: &BddVarSet) -> Result<Bdd, BddError> {
        self.apply_quant(op, that, set, QuantOp::Unique)
    }

    fn apply_quant(
        &self,
        op: BinOp,
        that: &Bdd,
        set: &BddVarSet,
        q: QuantOp,
    ) -> Result<Bdd, BddError> {
        self.check_factory(that)?;
        self.check_factory(&set.cube)?;
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let r = inner.apply_quant(op, self.root, that.root, &set.levels, q, set.cube.root)?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: Rc::clone(&self.factory),
            root,
        })
    }

    /// Relational product: `∃ set . (self ∧ that)`.
    pub fn rel_prod(&self, that: &Bdd, set: &BddVarSet) -> Result<Bdd, BddError> {
        self.apply_ex(BinOp::And, that, set)
    }

    /// Restriction by a cube of literals: fixes each variable of `cube` to
    /// its polarity. Fails with `NotACube` when `cube` is not a conjunction
    /// of literals.
    pub fn restrict(&self, cube: &Bdd) -> Result<Bdd, BddError> {
        self.check_factory(cube)?;
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let r = inner.restrict(self.root, cube.root)?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: Rc::clone(&self.factory),
            root,
        })
    }

    /// Consuming restriction: releases `self` and `cube`.
    pub fn restrict_with(self, cube: Bdd) -> Result<Bdd, BddError> {
        self.restrict(&cube)
    }

    /// Generalized cofactor of `self` by `c`.
    pub fn constrain(&self, c: &Bdd) -> Result<Bdd, BddError> {
        self.check_factory(c)?;
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let r = inner.constrain(self.root, c.root)?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: Rc::clone(&self.factory),
            root,
        })
    }

    /// Coudert–Madre restrict: simplifies `self` inside the care set `d`.
    ///
    /// The result agrees with `self` wherever `d` holds; no size check is
    /// performed, callers keep whichever diagram suits them.
    pub fn simplify(&self, d: &Bdd) -> Result<Bdd, BddError> {
        self.check_factory(d)?;
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let r = inner.simplify(self.root, d.root)?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: Rc::clone(&self.factory),
            root,
        })
    }

    /// Substitute the diagram `g` for variable `var` in `self`.
    pub fn compose(&self, g: &Bdd, var: Var) -> Result<Bdd, BddError> {
        self.check_factory(g)?;
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let level = inner.level_of_var(var)?;
            let r = inner.compose(self.root, g.root, level)?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: Rc::clone(&self.factory),
            root,
        })
    }

    /// Simultaneous substitution through a pairing: each variable paired to
    /// a diagram (or another variable) is replaced in one pass.
    pub fn veccompose(&self, pairing: &crate::pairing::BddPairing) -> Result<Bdd, BddError> {
        pairing.check_factory(self)?;
        // Collect before any sweep could run: replacement chains built for
        // ZDD identities are not yet pinned by anything.
        self.factory.borrow_mut().maybe_gc();
        let reps = pairing.replacement_roots()?;
        let root = {
            let mut inner = self.factory.borrow_mut();
            let r = inner.veccompose(self.root, &reps, pairing.generation())?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: Rc::clone(&self.factory),
            root,
        })
    }

    /// Rename variables according to a variable-to-variable pairing.
    ///
    /// Fails when the pairing maps any variable to a full diagram; use
    /// [`veccompose`](Self::veccompose) for that.
    pub fn replace(&self, pairing: &crate::pairing::BddPairing) -> Result<Bdd, BddError> {
        pairing.check_factory(self)?;
        let map = pairing.level_map()?;
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let r = inner.replace(self.root, &map, pairing.generation())?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: Rc::clone(&self.factory),
            root,
        })
    }

    /// Consuming rename: releases `self`.
    pub fn replace_with(self, pairing: &crate::pairing::BddPairing) -> Result<Bdd, BddError> {
        self.replace(pairing)
    }

    /// The set of variables this function depends on.
    pub fn support(&self) -> Result<BddVarSet, BddError> {
        let levels = {
            let inner = self.factory.borrow();
            inner.support_levels(self.root)
        };
        BddVarSet::from_levels(&self.factory, levels)
    }
}

impl Clone for Bdd {
    fn clone(&self) -> Bdd {
        self.factory.borrow_mut().store.incref(self.root);
        Bdd {
            factory: Rc::clone(&self.factory),
            root: self.root,
        }
    }
}

impl Drop for Bdd {
    fn drop(&mut self) {
        // Handles are only dropped outside factory operations; a failed
        // borrow would mean a drop from within one, which cannot happen
        // through the public API.
        if let Ok(mut inner) = self.factory.try_borrow_mut() {
            inner.store.decref(self.root);
        }
    }
}

impl PartialEq for Bdd {
    fn eq(&self, other: &Self) -> bool {
        // Hash-consing makes node identity function equality.
        Rc::ptr_eq(&self.factory, &other.factory) && self.root == other.root
    }
}

impl Eq for Bdd {}

impl fmt::Debug for Bdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bdd").field("root", &self.root).finish()
    }
}

/// A set of variables, canonically held as the cube of their conjunction.
///
/// VarSets are handles: the underlying cube participates in reference
/// counting like any other diagram.
pub struct BddVarSet {
    pub(crate) cube: Bdd,
    /// Levels of the members, ascending.
    pub(crate) levels: Vec<Level>,
}

impl BddVarSet {
    pub(crate) fn from_levels(
        factory: &Rc<RefCell<FactoryInner>>,
        mut levels: Vec<Level>,
    ) -> Result<BddVarSet, BddError> {
        levels.sort_unstable();
        levels.dedup();
        let cube = {
            let mut inner = factory.borrow_mut();
            inner.maybe_gc();
            let literals: Vec<(Level, bool)> = levels.iter().map(|&l| (l, true)).collect();
            let root = inner.make_cube(&literals)?;
            Bdd::wrap(factory, &mut inner, root)
        };
        Ok(BddVarSet { cube, levels })
    }

    /// Number of variables in the set.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Membership test by variable index.
    pub fn contains(&self, var: Var) -> bool {
        let inner = self.cube.factory.borrow();
        match inner.var2level.get(var) {
            Some(level) => self.levels.binary_search(level).is_ok(),
            None => false,
        }
    }

    /// Member levels in ascending order.
    pub fn to_level_array(&self) -> Vec<Level> {
        self.levels.clone()
    }

    /// Member variable indices, ordered by level.
    pub fn vars(&self) -> Vec<Var> {
        let inner = self.cube.factory.borrow();
        self.levels.iter().map(|&l| inner.var_at_level(l)).collect()
    }

    /// The conjunction cube representing this set.
    pub fn cube(&self) -> Bdd {
        self.cube.clone()
    }

    /// Set union.
    pub fn union(&self, other: &BddVarSet) -> Result<BddVarSet, BddError> {
        self.cube.check_factory(&other.cube)?;
        let mut levels = self.levels.clone();
        levels.extend_from_slice(&other.levels);
        BddVarSet::from_levels(&self.cube.factory, levels)
    }

    /// Set intersection.
    pub fn intersect(&self, other: &BddVarSet) -> Result<BddVarSet, BddError> {
        self.cube.check_factory(&other.cube)?;
        let levels = self
            .levels
            .iter()
            .copied()
            .filter(|l| other.levels.binary_search(l).is_ok())
            .collect();
        BddVarSet::from_levels(&self.cube.factory, levels)
    }

    /// Set difference: members of `self` not in `other`.
    pub fn difference(&self, other: &BddVarSet) -> Result<BddVarSet, BddError> {
        self.cube.check_factory(&other.cube)?;
        let levels = self
            .levels
            .iter()
            .copied()
            .filter(|l| other.levels.binary_search(l).is_err())
            .collect();
        BddVarSet::from_levels(&self.cube.factory, levels)
    }
}

impl Clone for BddVarSet {
    fn clone(&self) -> Self {
        BddVarSet {
            cube: self.cube.clone(),
            levels: self.levels.clone(),
        }
    }
}

impl fmt::Debug for BddVarSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BddVarSet")
            .field("levels", &self.levels)
            .finish()
    }
}

/// Factory for diagrams sharing one node store and variable ordering.
///
/// # Examples
///
/// ```
/// use shannon_bdd::BddFactory;
///
/// # fn main() -> Result<(), shannon_bdd::BddError> {
/// let factory = BddFactory::new_bdd(3);
/// let a = factory.ith_var(0)?;
/// let c = factory.ith_var(2)?;
/// let f = a.or(&c)?;
/// assert_eq!(f.sat_count(), 6u32.into());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BddFactory {
    pub(crate) inner: Rc<RefCell<FactoryInner>>,
}

impl BddFactory {
    /// A BDD-mode factory with `var_num` variables in identity order.
    pub fn new_bdd(var_num: usize) -> BddFactory {
        BddFactory::with_config(DiagramKind::Bdd, var_num, FactoryConfig::default())
    }

    /// A ZDD-mode factory with `var_num` variables in identity order.
    pub fn new_zdd(var_num: usize) -> BddFactory {
        BddFactory::with_config(DiagramKind::Zdd, var_num, FactoryConfig::default())
    }

    /// A factory with explicit tuning. The mode is fixed for its lifetime.
    ///
    /// # Panics
    ///
    /// Panics when `config.max_nodes` is too small to hold the terminals and
    /// the pinned variable nodes.
    pub fn with_config(kind: DiagramKind, var_num: usize, config: FactoryConfig) -> BddFactory {
        let mut inner = FactoryInner::new(kind, &config);
        inner
            .grow_vars(var_num)
            .expect("initial variable nodes exceed the configured node cap");
        BddFactory {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// The reduction mode this factory was created with.
    pub fn kind(&self) -> DiagramKind {
        self.inner.borrow().kind()
    }

    /// Number of declared variables.
    pub fn var_num(&self) -> usize {
        self.inner.borrow().var_num()
    }

    /// Grow the variable ordering to `n` variables. Shrinking is an error.
    pub fn set_var_num(&self, n: usize) -> Result<(), BddError> {
        let mut inner = self.inner.borrow_mut();
        if n < inner.var_num() {
            return Err(DomainError::CannotShrinkVarNum {
                current: inner.var_num(),
                requested: n,
            }
            .into());
        }
        inner.grow_vars(n)
    }

    /// The zero terminal (constant false / the empty family).
    pub fn zero(&self) -> Bdd {
        let mut inner = self.inner.borrow_mut();
        Bdd::wrap(&self.inner, &mut inner, ZERO_NODE)
    }

    /// The one terminal (constant true in BDD mode, `{{}}` in ZDD mode).
    pub fn one(&self) -> Bdd {
        let mut inner = self.inner.borrow_mut();
        Bdd::wrap(&self.inner, &mut inner, ONE_NODE)
    }

    /// The constant-true function: the one terminal in BDD mode, the full
    /// don't-care chain in ZDD mode.
    pub fn universe(&self) -> Result<Bdd, BddError> {
        let mut inner = self.inner.borrow_mut();
        inner.maybe_gc();
        let u = inner.universe_id()?;
        Ok(Bdd::wrap(&self.inner, &mut inner, u))
    }

    /// The function of variable `var` (true exactly when `var` is set).
    pub fn ith_var(&self, var: Var) -> Result<Bdd, BddError> {
        let mut inner = self.inner.borrow_mut();
        let level = inner.level_of_var(var)?;
        let id = inner.var_function(level)?;
        Ok(Bdd::wrap(&self.inner, &mut inner, id))
    }

    /// The negated function of variable `var`.
    pub fn nith_var(&self, var: Var) -> Result<Bdd, BddError> {
        let mut inner = self.inner.borrow_mut();
        let level = inner.level_of_var(var)?;
        match inner.kind() {
            DiagramKind::Bdd => {
                let id = inner.nvar_nodes[var];
                Ok(Bdd::wrap(&self.inner, &mut inner, id))
            }
            DiagramKind::Zdd => {
                // ¬v is the don't-care chain with v's level elided: the
                // zero-suppressed default already pins v to 0.
                let mut c = ONE_NODE;
                for l in (0..inner.var_num()).rev() {
                    if l != level {
                        c = inner.store.mk(l, c, c)?;
                    }
                }
                Ok(Bdd::wrap(&self.inner, &mut inner, c))
            }
        }
    }

    /// Build a variable set from variable indices.
    pub fn var_set(&self, vars: &[Var]) -> Result<BddVarSet, BddError> {
        let levels = {
            let inner = self.inner.borrow();
            let mut levels = Vec::with_capacity(vars.len());
            for &v in vars {
                levels.push(inner.level_of_var(v)?);
            }
            levels
        };
        BddVarSet::from_levels(&self.inner, levels)
    }

    /// A fresh identity pairing.
    pub fn make_pairing(&self) -> crate::pairing::BddPairing {
        crate::pairing::BddPairing::new(&self.inner)
    }

    /// Translate a variable index to its level.
    pub fn var_to_level(&self, var: Var) -> Result<Level, BddError> {
        self.inner.borrow().level_of_var(var)
    }

    /// Translate a level back to its variable index.
    pub fn level_to_var(&self, level: Level) -> Result<Var, BddError> {
        let inner = self.inner.borrow();
        if level >= inner.var_num() {
            return Err(DomainError::UnknownVariable {
                var: level,
                var_num: inner.var_num(),
            }
            .into());
        }
        Ok(inner.var_at_level(level))
    }

    /// Run a full mark-and-sweep collection; returns the number of freed
    /// slots. The operator cache is cleared as part of the sweep.
    pub fn gc(&self) -> usize {
        self.inner.borrow_mut().run_gc()
    }

    /// Total arena slots, including terminals and free slots.
    pub fn node_table_size(&self) -> usize {
        self.inner.borrow().store.arena_size()
    }

    /// Live nodes, terminals included.
    pub fn live_node_count(&self) -> usize {
        self.inner.borrow().store.live_count()
    }

    /// Swept slots currently awaiting reuse.
    pub fn free_node_count(&self) -> usize {
        self.inner.borrow().store.free_count()
    }

    /// Operator-cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.borrow().cache.stats()
    }
}

impl fmt::Debug for BddFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("BddFactory")
            .field("kind", &inner.kind())
            .field("var_num", &inner.var_num())
            .field("nodes", &inner.store.live_count())
            .finish()
    }
}
