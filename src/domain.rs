//! Finite-domain variables over diagram bits
//!
//! A finite domain (FDD) packs an integer-valued variable into
//! `ceil(log2(range))` diagram variables, least-significant bit first.
//! Domains are created in bulk through [`BddFactory::ext_domain`], which
//! interleaves the bits of domains created in one call, and live
//! for the factory's lifetime. Ranges and values are arbitrary-precision.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::error::{BddError, DomainError, NodeError};
use crate::factory::{Bdd, BddFactory, BddVarSet, FactoryInner};
use crate::node::{Level, Var};

/// Per-domain record held by the factory.
pub(crate) struct DomainData {
    pub(crate) name: String,
    /// Exclusive upper bound of the encoded values.
    pub(crate) range: BigUint,
    /// Bound diagram variables, least-significant first.
    pub(crate) vars: Vec<Var>,
}

/// Bits needed to encode `[0, range)`; at least one.
fn bits_for(range: &BigUint) -> usize {
    let max = range - 1u32;
    (max.bits() as usize).max(1)
}

impl BddFactory {
    /// Create finite domains of the given `sizes`, allocating fresh
    /// variables. The bits of domains created together are interleaved.
    pub fn ext_domain(&self, sizes: &[u64]) -> Result<Vec<Fdd>, BddError> {
        let sizes: Vec<BigUint> = sizes.iter().map(|&s| BigUint::from(s)).collect();
        self.ext_domain_big(&sizes)
    }

    /// [`ext_domain`](Self::ext_domain) with arbitrary-precision sizes.
    pub fn ext_domain_big(&self, sizes: &[BigUint]) -> Result<Vec<Fdd>, BddError> {
        let base_index = {
            let mut inner = self.inner.borrow_mut();
            let mut widths = Vec::with_capacity(sizes.len());
            for range in sizes {
                if range.is_zero() {
                    return Err(DomainError::EmptyRange.into());
                }
                widths.push(bits_for(range));
            }

            let first_var = inner.var_num();
            let total: usize = widths.iter().sum();
            inner.grow_vars(first_var + total)?;

            // Round-robin allocation: bit 0 of every domain first, then
            // bit 1, and so on.
            let mut var_lists: Vec<Vec<Var>> = vec![Vec::new(); sizes.len()];
            let mut next = first_var;
            let max_width = widths.iter().copied().max().unwrap_or(0);
            for bit in 0..max_width {
                for (i, &width) in widths.iter().enumerate() {
                    if bit < width {
                        var_lists[i].push(next);
                        next += 1;
                    }
                }
            }

            let base_index = inner.domains.len();
            for (i, range) in sizes.iter().enumerate() {
                inner.domains.push(DomainData {
                    name: format!("d{}", base_index + i),
                    range: range.clone(),
                    vars: std::mem::take(&mut var_lists[i]),
                });
            }
            base_index
        };
        Ok((0..sizes.len())
            .map(|i| Fdd {
                factory: Rc::clone(&self.inner),
                index: base_index + i,
            })
            .collect())
    }

    /// Handle to an already-created domain.
    pub fn domain(&self, index: usize) -> Result<Fdd, BddError> {
        let count = self.inner.borrow().domains.len();
        if index >= count {
            return Err(DomainError::UnknownDomain { index, count }.into());
        }
        Ok(Fdd {
            factory: Rc::clone(&self.inner),
            index,
        })
    }

    /// Number of domains created so far.
    pub fn domain_num(&self) -> usize {
        self.inner.borrow().domains.len()
    }
}

/// Handle to one finite domain of a factory.
#[derive(Clone)]
pub struct Fdd {
    factory: Rc<RefCell<FactoryInner>>,
    index: usize,
}

impl Fdd {
    fn handle(&self) -> BddFactory {
        BddFactory {
            inner: Rc::clone(&self.factory),
        }
    }

    fn with_data<T>(&self, f: impl FnOnce(&DomainData) -> T) -> T {
        let inner = self.factory.borrow();
        f(&inner.domains[self.index])
    }

    fn check_factory(&self, bdd: &Bdd) -> Result<(), BddError> {
        if Rc::ptr_eq(&self.factory, &bdd.factory) {
            Ok(())
        } else {
            Err(NodeError::MismatchedFactories.into())
        }
    }

    /// Index of this domain within the factory.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> String {
        self.with_data(|d| d.name.clone())
    }

    pub fn set_name(&self, name: &str) {
        let mut inner = self.factory.borrow_mut();
        inner.domains[self.index].name = name.to_string();
    }

    /// Exclusive upper bound of the encoded values.
    pub fn size(&self) -> BigUint {
        self.with_data(|d| d.range.clone())
    }

    /// Number of diagram variables backing this domain.
    pub fn var_num(&self) -> usize {
        self.with_data(|d| d.vars.len())
    }

    /// Backing variables, least-significant first.
    pub fn vars(&self) -> Vec<Var> {
        self.with_data(|d| d.vars.clone())
    }

    /// The backing variables as a set.
    pub fn var_set(&self) -> Result<BddVarSet, BddError> {
        let vars = self.vars();
        self.handle().var_set(&vars)
    }

    /// Widen the recorded range. Fails when the new range needs more bits
    /// than were allocated at creation; a smaller range is a no-op.
    pub fn ensure_capacity(&self, range: u64) -> Result<(), BddError> {
        self.ensure_capacity_big(&BigUint::from(range))
    }

    /// [`ensure_capacity`](Self::ensure_capacity) with an arbitrary-precision
    /// range.
    pub fn ensure_capacity_big(&self, range: &BigUint) -> Result<(), BddError> {
        if range.is_zero() {
            return Err(DomainError::EmptyRange.into());
        }
        let mut inner = self.factory.borrow_mut();
        let data = &mut inner.domains[self.index];
        let needed = bits_for(range);
        if needed > data.vars.len() {
            return Err(DomainError::BitsExceedDomain {
                requested: needed,
                allocated: data.vars.len(),
            }
            .into());
        }
        if *range > data.range {
            data.range = range.clone();
        }
        Ok(())
    }

    /// The cube asserting this domain equals `value`.
    pub fn ith_var(&self, value: u64) -> Result<Bdd, BddError> {
        self.ith_var_big(&BigUint::from(value))
    }

    /// [`ith_var`](Self::ith_var) with an arbitrary-precision value.
    pub fn ith_var_big(&self, value: &BigUint) -> Result<Bdd, BddError> {
        let (range, vars) = self.with_data(|d| (d.range.clone(), d.vars.clone()));
        if *value >= range {
            return Err(DomainError::ValueOutOfRange {
                value: value.clone(),
                range,
            }
            .into());
        }
        let root = {
            let mut inner = self.factory.borrow_mut();
            inner.maybe_gc();
            let mut literals: Vec<(Level, bool)> = Vec::with_capacity(vars.len());
            for (i, &var) in vars.iter().enumerate() {
                literals.push((inner.level_of_var(var)?, value.bit(i as u64)));
            }
            literals.sort_unstable_by_key(|&(level, _)| level);
            inner.make_cube(&literals)?
        };
        let mut inner = self.factory.borrow_mut();
        Ok(Bdd::wrap(&self.factory, &mut inner, root))
    }

    /// The constraint `value < range`: the disjunction of every encodable
    /// value of this domain.
    pub fn domain_constraint(&self) -> Result<Bdd, BddError> {
        let range = self.size();
        self.var_range_big(&BigUint::zero(), &(range - 1u32))
    }

    /// The disjunction of `ith_var(v)` for `lo <= v <= hi`, built as a union
    /// of aligned interval cubes: each step peels off the largest block
    /// `[cur, cur + 2^k - 1]` such that `cur` has `k` trailing zero bits and
    /// the block stays inside the interval.
    pub fn var_range(&self, lo: u64, hi: u64) -> Result<Bdd, BddError> {
        self.var_range_big(&BigUint::from(lo), &BigUint::from(hi))
    }

    /// [`var_range`](Self::var_range) with arbitrary-precision bounds.
    pub fn var_range_big(&self, lo: &BigUint, hi: &BigUint) -> Result<Bdd, BddError> {
        let (range, vars) = self.with_data(|d| (d.range.clone(), d.vars.clone()));
        if lo > hi {
            return Err(DomainError::InvalidRange {
                lo: lo.clone(),
                hi: hi.clone(),
            }
            .into());
        }
        if *hi >= range {
            return Err(DomainError::ValueOutOfRange {
                value: hi.clone(),
                range,
            }
            .into());
        }

        let factory = self.handle();
        let width = vars.len();
        let levels: Vec<Level> = {
            let inner = self.factory.borrow();
            vars.iter()
                .map(|&v| inner.level_of_var(v))
                .collect::<Result<_, _>>()?
        };

        let mut result = factory.zero();
        let mut cur = lo.clone();
        while cur <= *hi {
            let aligned = match cur.trailing_zeros() {
                Some(tz) => (tz as usize).min(width),
                None => width, // cur == 0 is aligned to every block size
            };
            let mut k = aligned;
            while k > 0 {
                let block_end = &cur + ((BigUint::one() << k) - 1u32);
                if block_end <= *hi {
                    break;
                }
                k -= 1;
            }

            let cube = {
                let mut inner = self.factory.borrow_mut();
                let mut literals: Vec<(Level, bool)> = (k..width)
                    .map(|i| (levels[i], cur.bit(i as u64)))
                    .collect();
                literals.sort_unstable_by_key(|&(level, _)| level);
                let root = inner.make_cube(&literals)?;
                Bdd::wrap(&self.factory, &mut inner, root)
            };
            result = result.or(&cube)?;
            cur += BigUint::one() << k;
        }
        Ok(result)
    }

    /// The relation `self == other`, as a biconditional per bit. The domains
    /// must have the same bit width.
    pub fn build_equals(&self, other: &Fdd) -> Result<Bdd, BddError> {
        let (left, right) = (self.vars(), other.vars());
        if !Rc::ptr_eq(&self.factory, &other.factory) {
            return Err(NodeError::MismatchedFactories.into());
        }
        if left.len() != right.len() {
            return Err(DomainError::SizeMismatch {
                left: left.len(),
                right: right.len(),
            }
            .into());
        }
        let factory = self.handle();
        let mut result = factory.universe()?;
        for (&a, &b) in left.iter().zip(right.iter()) {
            let bit = factory.ith_var(a)?.biimp(&factory.ith_var(b)?)?;
            result = result.and(&bit)?;
        }
        Ok(result)
    }

    /// The relation `self == other + value (mod 2^bits)`, as a ripple-carry
    /// bit-vector equivalence; bits beyond `bits` are constrained equal.
    /// With `value == 0` this reduces to [`build_equals`](Self::build_equals).
    pub fn build_add(&self, other: &Fdd, bits: usize, value: u64) -> Result<Bdd, BddError> {
        let (left, right) = (self.vars(), other.vars());
        if !Rc::ptr_eq(&self.factory, &other.factory) {
            return Err(NodeError::MismatchedFactories.into());
        }
        if left.len() != right.len() {
            return Err(DomainError::SizeMismatch {
                left: left.len(),
                right: right.len(),
            }
            .into());
        }
        if bits > left.len() {
            return Err(DomainError::BitsExceedDomain {
                requested: bits,
                allocated: left.len(),
            }
            .into());
        }

        let factory = self.handle();
        let mut result = factory.universe()?;
        let mut carry = factory.zero();
        for i in 0..bits {
            let a = factory.ith_var(left[i])?;
            let b = factory.ith_var(right[i])?;
            let v = if (value >> i) & 1 == 1 {
                factory.universe()?
            } else {
                factory.zero()
            };
            let sum = b.xor(&v)?.xor(&carry)?;
            result = result.and(&a.biimp(&sum)?)?;
            // Carry out: majority of (b, v, carry).
            let bv = b.and(&v)?;
            let bc = b.and(&carry)?;
            let vc = v.and(&carry)?;
            carry = bv.or(&bc)?.or(&vc)?;
        }
        for i in bits..left.len() {
            let a = factory.ith_var(left[i])?;
            let b = factory.ith_var(right[i])?;
            result = result.and(&a.biimp(&b)?)?;
        }
        Ok(result)
    }

    /// Up to `max` values of this domain present in `f`, ascending by
    /// enumeration order of the projected minterms.
    pub fn var_indices(&self, f: &Bdd, max: usize) -> Result<Vec<BigUint>, BddError> {
        self.check_factory(f)?;
        let factory = self.handle();
        let mine = self.var_set()?;
        let others: Vec<Var> = {
            let inner = self.factory.borrow();
            let my_vars = &inner.domains[self.index].vars;
            (0..inner.var_num()).filter(|v| !my_vars.contains(v)).collect()
        };
        let other_set = factory.var_set(&others)?;
        let projected = f.exist(&other_set)?;

        let mut values = Vec::new();
        let mut iter = projected.iterator(&mine)?;
        while values.len() < max {
            match iter.next_minterm()? {
                Some(minterm) => values.push(self.value_of_cube(&minterm)?),
                None => break,
            }
        }
        Ok(values)
    }

    /// Decode the value of this domain from a cube; bits the cube leaves
    /// unconstrained read as zero.
    fn value_of_cube(&self, cube: &Bdd) -> Result<BigUint, BddError> {
        let inner = self.factory.borrow();
        let mut lits = Vec::new();
        let mut c = cube.root;
        while c > crate::node::ONE_NODE {
            let (pol, next) = inner.cube_literal(c)?;
            lits.push((inner.store.level(c), pol));
            c = next;
        }
        let mut value = BigUint::zero();
        for (i, &var) in inner.domains[self.index].vars.iter().enumerate() {
            let level = inner.level_of_var(var)?;
            if lits.iter().any(|&(l, pol)| l == level && pol) {
                value.set_bit(i as u64, true);
            }
        }
        Ok(value)
    }
}

impl fmt::Debug for Fdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.factory.borrow();
        let data = &inner.domains[self.index];
        f.debug_struct("Fdd")
            .field("name", &data.name)
            .field("range", &data.range)
            .field("vars", &data.vars)
            .finish()
    }
}

impl Bdd {
    /// Value of domain `d` in one satisfying assignment of this diagram, or
    /// `None` when the diagram is unsatisfiable. Bits the chosen assignment
    /// leaves unconstrained read as zero.
    pub fn scan_var(&self, d: &Fdd) -> Result<Option<BigUint>, BddError> {
        d.check_factory(self)?;
        if self.is_zero() {
            return Ok(None);
        }
        let model = self.sat_one()?;
        Ok(Some(d.value_of_cube(&model)?))
    }

    /// Values of every domain in one satisfying assignment, or `None` when
    /// the diagram is unsatisfiable.
    pub fn scan_all_var(&self) -> Result<Option<Vec<BigUint>>, BddError> {
        if self.is_zero() {
            return Ok(None);
        }
        let model = self.sat_one()?;
        let count = self.factory.borrow().domains.len();
        let factory = self.factory();
        let mut values = Vec::with_capacity(count);
        for i in 0..count {
            let d = factory.domain(i)?;
            values.push(d.value_of_cube(&model)?);
        }
        Ok(Some(values))
    }
}
