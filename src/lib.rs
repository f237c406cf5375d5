//! # Shannon-BDD
//!
//! Reduced ordered binary decision diagrams (BDDs) and their zero-suppressed
//! variant (ZDDs) for symbolic manipulation of Boolean functions
//! `f: {0,1}^n -> {0,1}`, with a finite-domain layer for integer-valued
//! variables.
//!
//! ## Overview
//!
//! A [`BddFactory`] owns a hash-consed node store, so every Boolean function
//! has exactly one representation: equivalence checks are pointer
//! comparisons, and the recursive operator algorithms share work through a
//! computed cache. Handles are reference counted; dropping the last handle
//! to a subgraph makes it collectible by the mark-and-sweep GC.
//!
//! - **[`Bdd`]** - a handle to one diagram, with the full operator family:
//!   `and`/`or`/`xor`/…, if-then-else, quantification, substitution,
//!   cofactors, counting, and model enumeration
//! - **[`BddVarSet`]** - a set of variables, held as the cube of their
//!   conjunction
//! - **[`BddPairing`]** - a substitution table for `replace`/`veccompose`
//! - **[`Fdd`]** - an integer variable encoded across diagram bits
//!
//! ## Quick start
//!
//! ```
//! use shannon_bdd::BddFactory;
//!
//! # fn main() -> Result<(), shannon_bdd::BddError> {
//! let factory = BddFactory::new_bdd(3);
//! let a = factory.ith_var(0)?;
//! let b = factory.ith_var(1)?;
//! let c = factory.ith_var(2)?;
//!
//! // (a ∧ b) ∨ c
//! let f = a.and(&b)?.or(&c)?;
//! assert_eq!(f.node_count(), 3);
//! assert_eq!(f.sat_count(), 5u32.into());
//!
//! // Quantify a out: ∃a. f
//! let set = factory.var_set(&[0])?;
//! let g = f.exist(&set)?;
//! assert_eq!(g, b.or(&c)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Finite domains
//!
//! Integer variables are declared through [`BddFactory::ext_domain`] and
//! encoded binary, least-significant bit first:
//!
//! ```
//! use shannon_bdd::BddFactory;
//!
//! # fn main() -> Result<(), shannon_bdd::BddError> {
//! let factory = BddFactory::new_bdd(0);
//! let domains = factory.ext_domain(&[8, 8])?;
//! let (x, y) = (&domains[0], &domains[1]);
//!
//! // x in {2..5}, as a union of aligned blocks
//! let range = x.var_range(2, 5)?;
//! assert_eq!(range.sat_count_set(&x.var_set()?)?, 4u32.into());
//!
//! // x == y bit by bit
//! let eq = x.build_equals(y)?;
//! assert!(eq.and(&x.ith_var(3)?)?.scan_var(y)?.unwrap() == 3u32.into());
//! # Ok(())
//! # }
//! ```
//!
//! ## BDD vs ZDD mode
//!
//! The reduction rule is fixed per factory: [`BddFactory::new_bdd`] elides
//! branches whose children coincide, [`BddFactory::new_zdd`] elides branches
//! whose high edge is zero, which is compact for sparse set families. The
//! mode changes what the one terminal means - in ZDD mode it is the family
//! `{{}}`, and the constant-true function is the separate
//! [`universe`](BddFactory::universe) - as well as the polarity of absent
//! variables and don't-care detection during enumeration.
//!
//! ## Ownership and lifetime
//!
//! Every operation that returns a [`Bdd`] acquires one reference on the
//! result; `Clone` is `id()`, `Drop` is `free()`. The consuming `…_with`
//! operations (`apply_with`, `restrict_with`, `replace_with`) take their
//! operands by value - the borrow checker makes use-after-consumption
//! unrepresentable. Garbage collection runs on [`BddFactory::gc`] or
//! opportunistically at operation entry, and never invalidates anything a
//! live handle can reach.
//!
//! A factory and everything it hands out form a single-owner domain: handles
//! are intentionally not `Send`/`Sync`. Run independent factories on
//! independent threads.

pub mod error;

mod cache;
mod domain;
mod factory;
mod iter;
mod node;
mod pairing;
mod printer;
mod store;

pub use cache::CacheStats;
pub use domain::Fdd;
pub use error::{BddError, DomainError, IteratorError, NodeError, PairingError, StoreError};
pub use factory::{Bdd, BddFactory, BddVarSet, BinOp, FactoryConfig};
pub use iter::{AllSatIter, MintermIter};
pub use node::{DiagramKind, Level, NodeId, Var};
pub use pairing::BddPairing;
