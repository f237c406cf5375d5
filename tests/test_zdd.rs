//! Zero-suppressed mode: reduction rule, universe, family operations

use num_bigint::BigUint;
use shannon_bdd::{BddError, BddFactory, DiagramKind};

fn big(n: u64) -> BigUint {
    BigUint::from(n)
}

#[test]
fn empty_family_and_universe_counts() -> Result<(), BddError> {
    let factory = BddFactory::new_zdd(4);
    assert_eq!(factory.kind(), DiagramKind::Zdd);

    // The empty family has no members.
    assert_eq!(factory.zero().sat_count(), big(0));

    // The universe holds all 2^n subsets and is not the one terminal.
    let universe = factory.universe()?;
    assert_eq!(universe.sat_count(), big(16));
    assert!(!universe.is_one());
    assert!(universe.is_universe());
    assert!(!factory.one().is_universe());

    // The one terminal is the family containing only the empty set.
    assert_eq!(factory.one().sat_count(), big(1));
    Ok(())
}

#[test]
fn singleton_families_and_union() -> Result<(), BddError> {
    let factory = BddFactory::new_zdd(3);
    let a = factory.ith_var(0)?;
    let b = factory.ith_var(1)?;

    // ith_var is the function of that variable: half the assignments.
    assert_eq!(a.sat_count(), big(4));

    let both = a.and(&b)?;
    assert_eq!(both.sat_count(), big(2));

    let either = a.or(&b)?;
    assert_eq!(either.sat_count(), big(6));

    // Inclusion-exclusion holds in family terms too.
    assert_eq!(
        either.sat_count() + both.sat_count(),
        a.sat_count() + b.sat_count()
    );
    Ok(())
}

#[test]
fn zdd_reduction_elides_zero_high() -> Result<(), BddError> {
    let factory = BddFactory::new_zdd(2);

    // ¬a in ZDD mode needs no node for a at all: the zero-suppressed
    // default already fixes a to 0.
    let na = factory.nith_var(0)?;
    assert_eq!(na, factory.ith_var(0)?.not()?);
    assert_eq!(na.sat_count(), big(2));
    Ok(())
}

#[test]
fn complement_is_against_the_universe() -> Result<(), BddError> {
    let factory = BddFactory::new_zdd(3);
    let a = factory.ith_var(0)?;

    let complement = a.not()?;
    assert!(complement.and(&a)?.is_zero());
    assert_eq!(complement.or(&a)?, factory.universe()?);
    assert_eq!(complement.not()?, a);
    assert_eq!(
        complement.sat_count() + a.sat_count(),
        factory.universe()?.sat_count()
    );
    Ok(())
}

#[test]
fn derived_operators_in_family_terms() -> Result<(), BddError> {
    let factory = BddFactory::new_zdd(2);
    let a = factory.ith_var(0)?;
    let b = factory.ith_var(1)?;

    let diff = a.diff(&b)?;
    assert_eq!(diff.sat_count(), big(1)); // {a} alone: a=1, b=0

    let imp = a.imp(&b)?;
    assert_eq!(imp, a.not()?.or(&b)?);

    let biimp = a.biimp(&b)?;
    assert_eq!(biimp, a.xor(&b)?.not()?);
    assert_eq!(biimp.sat_count(), big(2)); // both set or neither
    Ok(())
}

#[test]
fn zdd_all_sat_dont_care_detection() -> Result<(), BddError> {
    let factory = BddFactory::new_zdd(2);

    // The universe over two variables is one cube of don't-cares.
    let universe = factory.universe()?;
    let cubes: Vec<_> = universe.all_sat().collect();
    assert_eq!(cubes, vec![vec![None, None]]);

    // A skipped level reads as fixed zero.
    let a = factory.ith_var(0)?;
    let cubes: Vec<_> = a.and(&factory.universe()?)?.all_sat().collect();
    assert_eq!(cubes, vec![vec![Some(true), None]]);

    let one_cubes: Vec<_> = factory.one().all_sat().collect();
    assert_eq!(one_cubes, vec![vec![Some(false), Some(false)]]);
    Ok(())
}

#[test]
fn zdd_quantification() -> Result<(), BddError> {
    let factory = BddFactory::new_zdd(2);
    let a = factory.ith_var(0)?;
    let b = factory.ith_var(1)?;
    let set = factory.var_set(&[0])?;

    let f = a.and(&b)?;
    // ∃a. (a ∧ b) == b
    assert_eq!(f.exist(&set)?, b);
    // ∀a. (a ∧ b) == 0
    assert!(f.for_all(&set)?.is_zero());
    Ok(())
}

#[test]
fn zdd_minterm_iteration_and_counting_agree() -> Result<(), BddError> {
    let factory = BddFactory::new_zdd(3);
    let a = factory.ith_var(0)?;
    let c = factory.ith_var(2)?;
    let f = a.xor(&c)?;

    let set = factory.var_set(&[0, 1, 2])?;
    let mut iter = f.iterator(&set)?;
    let mut count = 0u64;
    while let Some(minterm) = iter.next_minterm()? {
        assert_eq!(minterm.and(&f)?, minterm);
        count += 1;
    }
    assert_eq!(BigUint::from(count), f.sat_count());
    Ok(())
}

#[test]
fn zdd_refcount_round_trip() -> Result<(), BddError> {
    let factory = BddFactory::new_zdd(3);
    // Materialize the universe first so its pinned chain is part of the
    // baseline.
    factory.universe()?.free();
    let baseline = factory.live_node_count();

    {
        let a = factory.ith_var(0)?;
        let b = factory.ith_var(1)?;
        let _f = a.or(&b)?.not()?;
    }
    factory.gc();
    assert_eq!(factory.live_node_count(), baseline);
    Ok(())
}
