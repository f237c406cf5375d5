//! Substitution tables for `replace` and `veccompose`
//!
//! A pairing maps old variables to replacements: another variable for the
//! classical rename, or an arbitrary diagram for vector composition. Every
//! mutation draws a fresh generation stamp from the factory, which the
//! operator cache uses to key memoized substitutions; stale entries from an
//! earlier shape of the pairing can never be returned.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{BddError, NodeError, PairingError};
use crate::factory::FactoryInner;
use crate::node::{Level, NodeId, Var};
use crate::Bdd;

/// One replacement entry.
enum Replacement {
    /// Identity (the variable replaces itself).
    Identity,
    /// Rename to another variable.
    Var(Var),
    /// Substitute a full diagram.
    Diagram(Bdd),
}

/// A mutable substitution table tied to one factory.
pub struct BddPairing {
    factory: Rc<RefCell<FactoryInner>>,
    /// Indexed by old variable; entries past the end are identity.
    map: Vec<Replacement>,
    generation: u64,
}

impl BddPairing {
    pub(crate) fn new(factory: &Rc<RefCell<FactoryInner>>) -> BddPairing {
        let generation = factory.borrow_mut().next_pairing_stamp();
        BddPairing {
            factory: Rc::clone(factory),
            map: Vec::new(),
            generation,
        }
    }

    pub(crate) fn check_factory(&self, bdd: &Bdd) -> Result<(), BddError> {
        if Rc::ptr_eq(&self.factory, &bdd.factory) {
            Ok(())
        } else {
            Err(NodeError::MismatchedFactories.into())
        }
    }

    /// Current generation stamp; used in operator-cache keys.
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation = self.factory.borrow_mut().next_pairing_stamp();
    }

    fn ensure_len(&mut self, var: Var) {
        while self.map.len() <= var {
            self.map.push(Replacement::Identity);
        }
    }

    /// Pair `old` with the variable `new`.
    pub fn set(&mut self, old: Var, new: Var) -> Result<(), BddError> {
        {
            let inner = self.factory.borrow();
            inner.level_of_var(old)?;
            inner.level_of_var(new)?;
        }
        self.ensure_len(old);
        self.map[old] = Replacement::Var(new);
        self.touch();
        Ok(())
    }

    /// Pair each `olds[i]` with `news[i]`.
    pub fn set_pairs(&mut self, olds: &[Var], news: &[Var]) -> Result<(), BddError> {
        for (&old, &new) in olds.iter().zip(news.iter()) {
            self.set(old, new)?;
        }
        Ok(())
    }

    /// Pair `old` with an arbitrary diagram, for use with `veccompose`.
    pub fn set_diagram(&mut self, old: Var, g: &Bdd) -> Result<(), BddError> {
        self.check_factory(g)?;
        self.factory.borrow().level_of_var(old)?;
        self.ensure_len(old);
        self.map[old] = Replacement::Diagram(g.clone());
        self.touch();
        Ok(())
    }

    /// Reset every entry back to identity.
    pub fn reset(&mut self) {
        self.map.clear();
        self.touch();
    }

    /// Level-indexed rename table for `replace`. Fails when any entry pairs
    /// a variable with a diagram.
    pub(crate) fn level_map(&self) -> Result<Vec<Level>, BddError> {
        let inner = self.factory.borrow();
        let n = inner.var_num();
        let mut map: Vec<Level> = (0..n).collect();
        for level in 0..n {
            let var = inner.var_at_level(level);
            match self.map.get(var) {
                None | Some(Replacement::Identity) => {}
                Some(Replacement::Var(new)) => map[level] = inner.level_of_var(*new)?,
                Some(Replacement::Diagram(_)) => {
                    return Err(PairingError::NotVariablePairing { var }.into());
                }
            }
        }
        Ok(map)
    }

    /// Level-indexed replacement roots for `veccompose`: the paired diagram,
    /// the paired variable's function, or the level's own variable.
    pub(crate) fn replacement_roots(&self) -> Result<Vec<NodeId>, BddError> {
        let mut inner = self.factory.borrow_mut();
        let n = inner.var_num();
        let mut reps = Vec::with_capacity(n);
        for level in 0..n {
            let var = inner.var_at_level(level);
            let root = match self.map.get(var) {
                None | Some(Replacement::Identity) => inner.var_function(level)?,
                Some(Replacement::Var(new)) => {
                    let new_level = inner.level_of_var(*new)?;
                    inner.var_function(new_level)?
                }
                Some(Replacement::Diagram(g)) => g.root,
            };
            reps.push(root);
        }
        Ok(reps)
    }
}

impl fmt::Debug for BddPairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .map
            .iter()
            .enumerate()
            .filter_map(|(var, rep)| match rep {
                Replacement::Identity => None,
                Replacement::Var(new) => Some(format!("{}->{}", var, new)),
                Replacement::Diagram(_) => Some(format!("{}->diagram", var)),
            })
            .collect();
        f.debug_struct("BddPairing")
            .field("pairs", &pairs)
            .field("generation", &self.generation)
            .finish()
    }
}
