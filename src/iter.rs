//! Satisfying-assignment enumeration
//!
//! [`AllSatIter`] walks the diagram depth-first (low child before high) and
//! yields one ternary vector per root-to-one path: `Some(bool)` for a decided
//! variable, `None` for a don't-care. In BDD mode a skipped level is a
//! don't-care; in ZDD mode a skipped level is a fixed zero and a level is a
//! don't-care exactly when the node's children coincide.
//!
//! [`MintermIter`] expands those vectors into concrete minterms over a chosen
//! variable set, counting the don't-cares up odometer-style in descending
//! level order. Its [`remove`](MintermIter::remove) subtracts the last
//! minterm from the iterator's own copy of the diagram, **not** from the
//! handle the iterator was created from; read the shrunken diagram back with
//! [`remaining`](MintermIter::remaining).

use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::Fdd;
use crate::error::{BddError, IteratorError};
use crate::factory::{Bdd, BddVarSet, FactoryInner};
use crate::node::{DiagramKind, Level, NodeId, Var, ONE_NODE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Low,
    High,
    DontCare,
}

#[derive(Debug)]
struct Frame {
    node: NodeId,
    branch: Branch,
}

/// Depth-first iterator over the satisfying ternary vectors of a diagram.
///
/// Each item is indexed by variable index; restart by creating a new
/// iterator. The iterator holds its own handle, so the diagram stays pinned
/// while enumeration runs.
pub struct AllSatIter {
    factory: Rc<RefCell<FactoryInner>>,
    _root: Bdd,
    stack: Vec<Frame>,
    leaf: NodeId,
    started: bool,
    finished: bool,
}

impl AllSatIter {
    fn new(root: &Bdd) -> AllSatIter {
        AllSatIter {
            factory: Rc::clone(&root.factory),
            _root: root.clone(),
            stack: Vec::new(),
            leaf: root.root,
            started: false,
            finished: false,
        }
    }

    /// Push frames down the leftmost spine from `id`, leaving the reached
    /// terminal in `self.leaf`.
    fn descend(&mut self, mut id: NodeId) {
        let inner = self.factory.borrow();
        while id > ONE_NODE {
            let (low, high) = (inner.store.low(id), inner.store.high(id));
            let branch = if low == high {
                // Only possible in ZDD mode; the level decides nothing.
                Branch::DontCare
            } else {
                Branch::Low
            };
            self.stack.push(Frame { node: id, branch });
            id = low;
        }
        self.leaf = id;
    }

    /// Backtrack to the next unexplored branch; false when exhausted.
    fn advance(&mut self) -> bool {
        loop {
            let high = {
                let inner = self.factory.borrow();
                match self.stack.last_mut() {
                    None => return false,
                    Some(frame) if frame.branch == Branch::Low => {
                        frame.branch = Branch::High;
                        Some(inner.store.high(frame.node))
                    }
                    Some(_) => None,
                }
            };
            match high {
                Some(h) => {
                    self.descend(h);
                    return true;
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }

    fn snapshot(&self) -> Vec<Option<bool>> {
        let inner = self.factory.borrow();
        let default = match inner.kind() {
            DiagramKind::Bdd => None,
            DiagramKind::Zdd => Some(false),
        };
        let mut assignment = vec![default; inner.var_num()];
        for frame in &self.stack {
            let var = inner.var_at_level(inner.store.level(frame.node));
            assignment[var] = match frame.branch {
                Branch::Low => Some(false),
                Branch::High => Some(true),
                Branch::DontCare => None,
            };
        }
        assignment
    }
}

impl Iterator for AllSatIter {
    type Item = Vec<Option<bool>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            let root = self.leaf;
            self.descend(root);
        } else if !self.advance() {
            self.finished = true;
            return None;
        }
        loop {
            if self.leaf == ONE_NODE {
                return Some(self.snapshot());
            }
            if !self.advance() {
                self.finished = true;
                return None;
            }
        }
    }
}

/// Iterator over concrete minterms of a diagram, restricted to a variable
/// set.
///
/// Wraps [`AllSatIter`] and expands don't-cares within the set by binary
/// counting in descending level order. Distinct paths yield distinct
/// minterms whenever the set covers the diagram's support.
pub struct MintermIter {
    factory: Rc<RefCell<FactoryInner>>,
    base: AllSatIter,
    /// Set members: levels ascending, with the matching variable indices.
    set_levels: Vec<Level>,
    set_vars: Vec<Var>,
    /// Current ternary vector, if one is being expanded.
    cur: Option<Vec<Option<bool>>>,
    /// Positions (into `set_vars`) that are don't-care in `cur`.
    dc: Vec<usize>,
    /// Odometer over `dc`; the last entry is the deepest level.
    bits: Vec<bool>,
    /// Positions forced to one for the rest of the current expansion.
    ///
    /// Kept apart from `dc`/`bits` so a carry in the odometer can never
    /// reset a forced position back to zero.
    forced: Vec<usize>,
    last: Option<Bdd>,
    remaining: Bdd,
}

impl MintermIter {
    fn new(root: &Bdd, set: &BddVarSet) -> Result<MintermIter, BddError> {
        root.check_factory(&set.cube)?;
        let set_vars = set.vars();
        Ok(MintermIter {
            factory: Rc::clone(&root.factory),
            base: root.all_sat(),
            set_levels: set.levels.clone(),
            set_vars,
            cur: None,
            dc: Vec::new(),
            bits: Vec::new(),
            forced: Vec::new(),
            last: None,
            remaining: root.clone(),
        })
    }

    /// The next minterm, or `None` when enumeration is complete.
    pub fn next_minterm(&mut self) -> Result<Option<Bdd>, BddError> {
        if self.cur.is_none() {
            match self.base.next() {
                Some(vec) => {
                    self.dc = self
                        .set_vars
                        .iter()
                        .enumerate()
                        .filter(|&(_, &var)| vec[var].is_none())
                        .map(|(idx, _)| idx)
                        .collect();
                    self.bits = vec![false; self.dc.len()];
                    self.forced.clear();
                    self.cur = Some(vec);
                }
                None => return Ok(None),
            }
        }
        let minterm = self.build_minterm()?;
        self.last = Some(minterm.clone());
        self.step_odometer();
        Ok(Some(minterm))
    }

    fn build_minterm(&mut self) -> Result<Bdd, BddError> {
        let cur = self.cur.as_ref().expect("expansion state present");
        let mut literals: Vec<(Level, bool)> = Vec::with_capacity(self.set_vars.len());
        for (idx, &var) in self.set_vars.iter().enumerate() {
            let value = if self.forced.contains(&idx) {
                true
            } else {
                match self.dc.iter().position(|&d| d == idx) {
                    Some(pos) => self.bits[pos],
                    None => cur[var].expect("non-don't-care member is decided"),
                }
            };
            literals.push((self.set_levels[idx], value));
        }
        let mut inner = self.factory.borrow_mut();
        let root = inner.make_cube(&literals)?;
        Ok(Bdd::wrap(&self.factory, &mut inner, root))
    }

    /// Count the don't-care odometer up once; on overflow the current
    /// ternary vector is exhausted.
    fn step_odometer(&mut self) {
        for i in (0..self.bits.len()).rev() {
            if !self.bits[i] {
                self.bits[i] = true;
                for bit in &mut self.bits[i + 1..] {
                    *bit = false;
                }
                return;
            }
        }
        self.cur = None;
    }

    /// Force the don't-care `var` to one, skipping the half of the current
    /// expansion where it is zero. The forced value persists until the next
    /// ternary vector is fetched. Fails when `var` is not a don't-care of
    /// the current expansion.
    pub fn fast_forward(&mut self, var: Var) -> Result<(), BddError> {
        let idx = match self.set_vars.iter().position(|&v| v == var) {
            Some(idx) if self.cur.is_some() => idx,
            _ => return Err(IteratorError::NotDontCare { var }.into()),
        };
        if self.forced.contains(&idx) {
            return Ok(());
        }
        match self.dc.iter().position(|&d| d == idx) {
            Some(pos) => {
                // Retire the position from the odometer so no later carry
                // can flip it back to zero.
                self.dc.remove(pos);
                self.bits.remove(pos);
                self.forced.push(idx);
                Ok(())
            }
            None => Err(IteratorError::NotDontCare { var }.into()),
        }
    }

    /// Advance past an entirely unconstrained finite domain: every
    /// don't-care bit of `domain` in the current expansion is forced to one
    /// for the rest of the expansion.
    pub fn skip_dont_care(&mut self, domain: &Fdd) -> Result<(), BddError> {
        for var in domain.vars() {
            if let Some(idx) = self.set_vars.iter().position(|&v| v == var) {
                if let Some(pos) = self.dc.iter().position(|&d| d == idx) {
                    self.dc.remove(pos);
                    self.bits.remove(pos);
                    self.forced.push(idx);
                }
            }
        }
        Ok(())
    }

    /// Subtract the most recently returned minterm from the iterator's copy
    /// of the diagram and return the shrunken diagram.
    ///
    /// This does **not** mutate the handle the iterator was created from;
    /// enumeration itself continues over the original diagram.
    pub fn remove(&mut self) -> Result<Bdd, BddError> {
        let last = match &self.last {
            Some(m) => m.clone(),
            None => return Err(IteratorError::RemoveBeforeNext.into()),
        };
        self.remaining = self.remaining.diff(&last)?;
        Ok(self.remaining.clone())
    }

    /// The diagram minus every minterm removed so far.
    pub fn remaining(&self) -> Bdd {
        self.remaining.clone()
    }
}

impl Iterator for MintermIter {
    type Item = Result<Bdd, BddError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_minterm().transpose()
    }
}

impl Bdd {
    /// Iterate the satisfying ternary vectors of this diagram.
    pub fn all_sat(&self) -> AllSatIter {
        AllSatIter::new(self)
    }

    /// Iterate the concrete minterms of this diagram over the variables of
    /// `set`. Minterms are distinct when `set` covers the support.
    pub fn iterator(&self, set: &BddVarSet) -> Result<MintermIter, BddError> {
        MintermIter::new(self, set)
    }
}
