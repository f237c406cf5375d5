//! Counting, support, and single-model extraction
//!
//! All counts are exact: satisfying assignments and paths are returned as
//! arbitrary-precision integers, weighted by the levels a diagram skips. The
//! traversals memoize per call over the shared DAG, so each reachable node is
//! visited once.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{BddError, DomainError};
use crate::node::{DiagramKind, Level, NodeId, ONE_NODE, ZERO_NODE};

use super::{Bdd, BddVarSet, FactoryInner};

impl FactoryInner {
    /// Levels this function depends on, ascending.
    pub(crate) fn support_levels(&self, f: NodeId) -> Vec<Level> {
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        let mut levels: FxHashSet<Level> = FxHashSet::default();
        let mut work = vec![f];
        while let Some(id) = work.pop() {
            if id <= ONE_NODE || !seen.insert(id) {
                continue;
            }
            levels.insert(self.store.level(id));
            work.push(self.store.low(id));
            work.push(self.store.high(id));
        }
        let mut levels: Vec<Level> = levels.into_iter().collect();
        levels.sort_unstable();
        levels
    }

    /// Number of branch nodes reachable from `f` (terminals excluded).
    pub(crate) fn node_count(&self, f: NodeId) -> usize {
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        let mut work = vec![f];
        let mut count = 0;
        while let Some(id) = work.pop() {
            if id <= ONE_NODE || !seen.insert(id) {
                continue;
            }
            count += 1;
            work.push(self.store.low(id));
            work.push(self.store.high(id));
        }
        count
    }

    /// Number of root-to-one paths.
    pub(crate) fn path_count(&self, f: NodeId) -> BigUint {
        let mut memo: FxHashMap<NodeId, BigUint> = FxHashMap::default();
        self.path_count_rec(f, &mut memo)
    }

    fn path_count_rec(&self, f: NodeId, memo: &mut FxHashMap<NodeId, BigUint>) -> BigUint {
        if f == ZERO_NODE {
            return BigUint::zero();
        }
        if f == ONE_NODE {
            return BigUint::one();
        }
        if let Some(c) = memo.get(&f) {
            return c.clone();
        }
        let lo = self.path_count_rec(self.store.low(f), memo);
        let hi = self.path_count_rec(self.store.high(f), memo);
        let c = lo + hi;
        memo.insert(f, c.clone());
        c
    }

    /// Exact number of satisfying assignments over all declared variables.
    ///
    /// In ZDD mode this is the number of sets in the family: skipped levels
    /// are fixed to zero rather than free.
    pub(crate) fn sat_count(&self, f: NodeId) -> BigUint {
        let mut memo: FxHashMap<NodeId, BigUint> = FxHashMap::default();
        match self.kind() {
            DiagramKind::Bdd => {
                let n = self.var_num();
                let below = self.sat_count_rec(f, &mut memo, n);
                below << self.effective_level(f, n)
            }
            DiagramKind::Zdd => self.zdd_count_rec(f, &mut memo),
        }
    }

    fn effective_level(&self, id: NodeId, n: usize) -> Level {
        if id <= ONE_NODE {
            n
        } else {
            self.store.level(id)
        }
    }

    /// Assignments over the levels below (and including) `f`'s own level.
    fn sat_count_rec(
        &self,
        f: NodeId,
        memo: &mut FxHashMap<NodeId, BigUint>,
        n: usize,
    ) -> BigUint {
        if f == ZERO_NODE {
            return BigUint::zero();
        }
        if f == ONE_NODE {
            return BigUint::one();
        }
        if let Some(c) = memo.get(&f) {
            return c.clone();
        }
        let level = self.store.level(f);
        let (low, high) = (self.store.low(f), self.store.high(f));
        let lo = self.sat_count_rec(low, memo, n) << (self.effective_level(low, n) - level - 1);
        let hi = self.sat_count_rec(high, memo, n) << (self.effective_level(high, n) - level - 1);
        let c = lo + hi;
        memo.insert(f, c.clone());
        c
    }

    fn zdd_count_rec(&self, f: NodeId, memo: &mut FxHashMap<NodeId, BigUint>) -> BigUint {
        if f == ZERO_NODE {
            return BigUint::zero();
        }
        if f == ONE_NODE {
            return BigUint::one();
        }
        if let Some(c) = memo.get(&f) {
            return c.clone();
        }
        let lo = self.zdd_count_rec(self.store.low(f), memo);
        let hi = self.zdd_count_rec(self.store.high(f), memo);
        let c = lo + hi;
        memo.insert(f, c.clone());
        c
    }

    /// Nodes per variable index.
    pub(crate) fn var_profile(&self, f: NodeId) -> Vec<usize> {
        let mut profile = vec![0usize; self.var_num()];
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        let mut work = vec![f];
        while let Some(id) = work.pop() {
            if id <= ONE_NODE || !seen.insert(id) {
                continue;
            }
            profile[self.var_at_level(self.store.level(id))] += 1;
            work.push(self.store.low(id));
            work.push(self.store.high(id));
        }
        profile
    }

    /// One path from `f` to the one terminal, as literals ascending by
    /// level. The low branch is preferred where both lead somewhere.
    fn model_path(&self, f: NodeId) -> Vec<(Level, bool)> {
        let mut lits = Vec::new();
        let mut id = f;
        while id > ONE_NODE {
            let (low, high) = (self.store.low(id), self.store.high(id));
            if low != ZERO_NODE {
                lits.push((self.store.level(id), false));
                id = low;
            } else {
                lits.push((self.store.level(id), true));
                id = high;
            }
        }
        debug_assert_eq!(id, ONE_NODE, "canonical nonzero diagrams reach one");
        lits
    }

    /// One satisfying cube of `f`; unconstrained variables stay absent.
    pub(crate) fn sat_one(&mut self, f: NodeId) -> Result<NodeId, BddError> {
        if f == ZERO_NODE {
            return Ok(ZERO_NODE);
        }
        let lits = self.model_path(f);
        self.make_cube(&lits)
    }

    /// One satisfying minterm covering every declared variable; variables
    /// the chosen path does not constrain default to false.
    pub(crate) fn full_sat_one(&mut self, f: NodeId) -> Result<NodeId, BddError> {
        if f == ZERO_NODE {
            return Ok(ZERO_NODE);
        }
        let path = self.model_path(f);
        let mut lits = Vec::with_capacity(self.var_num());
        let mut on_path = path.iter().peekable();
        for level in 0..self.var_num() {
            match on_path.peek() {
                Some(&&(l, pol)) if l == level => {
                    lits.push((level, pol));
                    on_path.next();
                }
                _ => lits.push((level, false)),
            }
        }
        self.make_cube(&lits)
    }

    /// One satisfying cube forcing polarity `pol` on the variables of
    /// `set_levels` that `f` leaves unconstrained.
    pub(crate) fn sat_one_set(
        &mut self,
        f: NodeId,
        set_levels: &[Level],
        pol: bool,
    ) -> Result<NodeId, BddError> {
        if f == ZERO_NODE {
            return Ok(ZERO_NODE);
        }
        let path = self.model_path(f);
        let mut lits = path.clone();
        for &level in set_levels {
            if path.binary_search_by_key(&level, |&(l, _)| l).is_err() {
                lits.push((level, pol));
            }
        }
        lits.sort_unstable_by_key(|&(l, _)| l);
        self.make_cube(&lits)
    }
}

impl Bdd {
    /// Number of branch nodes in this diagram; terminals count zero.
    pub fn node_count(&self) -> usize {
        self.factory.borrow().node_count(self.root)
    }

    /// Number of distinct root-to-one paths.
    pub fn path_count(&self) -> BigUint {
        self.factory.borrow().path_count(self.root)
    }

    /// Exact number of satisfying assignments over all declared variables.
    ///
    /// `sat_count(one) == 2^var_num` in BDD mode; in ZDD mode the count is
    /// the family's cardinality, so the universe counts `2^var_num` and the
    /// one terminal counts a single (empty) set.
    pub fn sat_count(&self) -> BigUint {
        self.factory.borrow().sat_count(self.root)
    }

    /// Satisfying assignments counted over the variables of `set` only.
    ///
    /// `set` must cover the support. In ZDD mode variables outside the
    /// support are already fixed, so the count equals [`sat_count`].
    ///
    /// [`sat_count`]: Self::sat_count
    pub fn sat_count_set(&self, set: &BddVarSet) -> Result<BigUint, BddError> {
        self.check_factory(&set.cube)?;
        let inner = self.factory.borrow();
        for level in inner.support_levels(self.root) {
            if set.levels.binary_search(&level).is_err() {
                return Err(DomainError::SupportNotCovered {
                    var: inner.var_at_level(level),
                }
                .into());
            }
        }
        let full = inner.sat_count(self.root);
        Ok(match inner.kind() {
            DiagramKind::Bdd => full >> (inner.var_num() - set.levels.len()),
            DiagramKind::Zdd => full,
        })
    }

    /// Per-variable node counts, indexed by variable index.
    pub fn var_profile(&self) -> Vec<usize> {
        self.factory.borrow().var_profile(self.root)
    }

    /// One implicant cube of this function; unconstrained variables are
    /// absent. Returns the zero handle when the function is unsatisfiable.
    pub fn sat_one(&self) -> Result<Bdd, BddError> {
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let r = inner.sat_one(self.root)?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: std::rc::Rc::clone(&self.factory),
            root,
        })
    }

    /// One satisfying minterm mentioning every declared variable.
    pub fn full_sat_one(&self) -> Result<Bdd, BddError> {
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let r = inner.full_sat_one(self.root)?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: std::rc::Rc::clone(&self.factory),
            root,
        })
    }

    /// One satisfying cube with polarity `pol` forced on the variables of
    /// `set` that the function leaves unconstrained.
    pub fn sat_one_set(&self, set: &BddVarSet, pol: bool) -> Result<Bdd, BddError> {
        self.check_factory(&set.cube)?;
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let r = inner.sat_one_set(self.root, &set.levels, pol)?;
            inner.store.incref(r);
            r
        };
        Ok(Bdd {
            factory: std::rc::Rc::clone(&self.factory),
            root,
        })
    }
}
