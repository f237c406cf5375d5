//! Tests for the factory module

use super::*;
use num_bigint::BigUint;

fn big(n: u64) -> BigUint {
    BigUint::from(n)
}

#[test]
fn test_terminals() {
    let factory = BddFactory::new_bdd(2);
    let t = factory.one();
    let f = factory.zero();

    assert!(t.is_one());
    assert!(t.is_universe());
    assert!(!t.is_zero());
    assert!(f.is_zero());
    assert!(!f.is_one());
    assert!(t.var().is_err());
    assert!(f.level().is_err());
    assert!(f.low().is_err());
    assert!(t.high().is_err());
}

#[test]
fn test_variable_creation() {
    let factory = BddFactory::new_bdd(2);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();

    assert_ne!(a, b);
    assert_eq!(a.var().unwrap(), 0);
    assert_eq!(b.var().unwrap(), 1);
    assert_eq!(a.level().unwrap(), 0);
    assert!(a.low().unwrap().is_zero());
    assert!(a.high().unwrap().is_one());
    assert!(factory.ith_var(2).is_err());
}

#[test]
fn test_nith_var_is_negation() {
    let factory = BddFactory::new_bdd(2);
    let a = factory.ith_var(0).unwrap();
    let na = factory.nith_var(0).unwrap();
    assert_eq!(na, a.not().unwrap());
}

#[test]
fn test_hash_consing() {
    let factory = BddFactory::new_bdd(2);
    let a1 = factory.ith_var(0).unwrap();
    let a2 = factory.ith_var(0).unwrap();
    assert_eq!(a1, a2);

    let b = factory.ith_var(1).unwrap();
    let ab1 = a1.and(&b).unwrap();
    let ab2 = a2.and(&b).unwrap();
    assert_eq!(ab1, ab2);
}

#[test]
fn test_and_terminal_cases() {
    let factory = BddFactory::new_bdd(2);
    let t = factory.one();
    let f = factory.zero();
    let a = factory.ith_var(0).unwrap();

    assert_eq!(a.and(&t).unwrap(), a);
    assert!(a.and(&f).unwrap().is_zero());
    assert_eq!(t.and(&a).unwrap(), a);
    assert!(f.and(&a).unwrap().is_zero());
    assert_eq!(a.and(&a).unwrap(), a);
}

#[test]
fn test_or_terminal_cases() {
    let factory = BddFactory::new_bdd(2);
    let t = factory.one();
    let f = factory.zero();
    let a = factory.ith_var(0).unwrap();

    assert_eq!(a.or(&f).unwrap(), a);
    assert!(a.or(&t).unwrap().is_one());
    assert_eq!(f.or(&a).unwrap(), a);
    assert!(t.or(&a).unwrap().is_one());
    assert_eq!(a.or(&a).unwrap(), a);
}

#[test]
fn test_not_involution() {
    let factory = BddFactory::new_bdd(2);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let f = a.xor(&b).unwrap();

    assert!(factory.one().not().unwrap().is_zero());
    assert!(factory.zero().not().unwrap().is_one());
    assert_eq!(f.not().unwrap().not().unwrap(), f);
}

#[test]
fn test_de_morgan() {
    let factory = BddFactory::new_bdd(2);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();

    let left = a.and(&b).unwrap().not().unwrap();
    let right = a.not().unwrap().or(&b.not().unwrap()).unwrap();
    assert_eq!(left, right);

    let left = a.or(&b).unwrap().not().unwrap();
    let right = a.not().unwrap().and(&b.not().unwrap()).unwrap();
    assert_eq!(left, right);
}

#[test]
fn test_commutativity_is_canonical() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();

    assert_eq!(a.and(&b).unwrap(), b.and(&a).unwrap());
    assert_eq!(a.or(&b).unwrap(), b.or(&a).unwrap());
    assert_eq!(a.xor(&b).unwrap(), b.xor(&a).unwrap());
}

#[test]
fn test_distributivity() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let c = factory.ith_var(2).unwrap();

    let left = a.and(&b.or(&c).unwrap()).unwrap();
    let right = a.and(&b).unwrap().or(&a.and(&c).unwrap()).unwrap();
    assert_eq!(left, right);
}

#[test]
fn test_derived_operators() {
    let factory = BddFactory::new_bdd(2);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();

    let nand = a.apply(BinOp::Nand, &b).unwrap();
    assert_eq!(nand, a.and(&b).unwrap().not().unwrap());

    let nor = a.apply(BinOp::Nor, &b).unwrap();
    assert_eq!(nor, a.or(&b).unwrap().not().unwrap());

    let imp = a.imp(&b).unwrap();
    assert_eq!(imp, a.not().unwrap().or(&b).unwrap());

    let biimp = a.biimp(&b).unwrap();
    assert_eq!(biimp, a.xor(&b).unwrap().not().unwrap());

    let diff = a.apply(BinOp::Diff, &b).unwrap();
    assert_eq!(diff, a.and(&b.not().unwrap()).unwrap());

    let less = a.apply(BinOp::Less, &b).unwrap();
    assert_eq!(less, a.not().unwrap().and(&b).unwrap());

    let invimp = a.apply(BinOp::InvImp, &b).unwrap();
    assert_eq!(invimp, a.or(&b.not().unwrap()).unwrap());
}

#[test]
fn test_apply_with_consumes() {
    let factory = BddFactory::new_bdd(2);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let expected = a.and(&b).unwrap();

    let before = factory.live_node_count();
    let result = a.clone().apply_with(BinOp::And, b.clone()).unwrap();
    assert_eq!(result, expected);

    // The consumed clones released their references.
    drop(result);
    factory.gc();
    assert!(factory.live_node_count() <= before);
}

#[test]
fn test_ite_laws() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let c = factory.ith_var(2).unwrap();
    let t = factory.one();
    let f = factory.zero();

    assert_eq!(a.ite(&t, &f).unwrap(), a);
    assert_eq!(a.ite(&b, &b).unwrap(), b);
    assert_eq!(t.ite(&b, &c).unwrap(), b);
    assert_eq!(f.ite(&b, &c).unwrap(), c);

    // ite(f, g, h) == (f ∧ g) ∨ (¬f ∧ h)
    let via_ite = a.ite(&b, &c).unwrap();
    let expanded = a
        .and(&b)
        .unwrap()
        .or(&a.not().unwrap().and(&c).unwrap())
        .unwrap();
    assert_eq!(via_ite, expanded);
}

#[test]
fn test_quantification() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let set = factory.var_set(&[0]).unwrap();

    let f = a.and(&b).unwrap();
    assert_eq!(f.exist(&set).unwrap(), b);
    assert!(f.for_all(&set).unwrap().is_zero());

    // ∀V.f == ¬∃V.¬f
    let g = a.or(&b).unwrap();
    let forall = g.for_all(&set).unwrap();
    let dual = g.not().unwrap().exist(&set).unwrap().not().unwrap();
    assert_eq!(forall, dual);
}

#[test]
fn test_unique_quantification() {
    let factory = BddFactory::new_bdd(2);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let set_a = factory.var_set(&[0]).unwrap();

    // ⊕a. (a ∧ b) == b
    assert_eq!(a.and(&b).unwrap().unique(&set_a).unwrap(), b);
    // ⊕a. b == 0: the quantified variable is untouched.
    assert!(b.unique(&set_a).unwrap().is_zero());
}

#[test]
fn test_fused_apply_quant_matches_composition() {
    let factory = BddFactory::new_bdd(4);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let c = factory.ith_var(2).unwrap();
    let d = factory.ith_var(3).unwrap();
    let set = factory.var_set(&[1, 2]).unwrap();

    let f = a.xor(&b).unwrap().or(&c).unwrap();
    let g = b.imp(&d).unwrap();

    for op in [BinOp::And, BinOp::Or, BinOp::Xor] {
        let fused = f.apply_ex(op, &g, &set).unwrap();
        let composed = f.apply(op, &g).unwrap().exist(&set).unwrap();
        assert_eq!(fused, composed);

        let fused = f.apply_all(op, &g, &set).unwrap();
        let composed = f.apply(op, &g).unwrap().for_all(&set).unwrap();
        assert_eq!(fused, composed);

        let fused = f.apply_uni(op, &g, &set).unwrap();
        let composed = f.apply(op, &g).unwrap().unique(&set).unwrap();
        assert_eq!(fused, composed);
    }
}

#[test]
fn test_rel_prod() {
    let factory = BddFactory::new_bdd(2);
    let x = factory.ith_var(0).unwrap();
    let y = factory.ith_var(1).unwrap();
    let set = factory.var_set(&[0]).unwrap();

    // ∃x. (x ∧ y) == y
    assert_eq!(x.rel_prod(&y, &set).unwrap(), y);
    // relprod is the fused form of exist-of-and.
    let f = x.biimp(&y).unwrap();
    let g = x.or(&y).unwrap();
    assert_eq!(
        f.rel_prod(&g, &set).unwrap(),
        f.and(&g).unwrap().exist(&set).unwrap()
    );
}

#[test]
fn test_compose() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let c = factory.ith_var(2).unwrap();

    // compose(f, ith_var(v), v) == f
    let f = a.xor(&b).unwrap();
    assert_eq!(f.compose(&b, 1).unwrap(), f);

    // Substituting c for b in a ⊕ b gives a ⊕ c.
    assert_eq!(f.compose(&c, 1).unwrap(), a.xor(&c).unwrap());

    // Substituting a full diagram.
    let g = b.and(&c).unwrap();
    let expected = a.xor(&g).unwrap();
    assert_eq!(f.compose(&g, 1).unwrap(), expected);
}

#[test]
fn test_replace_identity_and_rename() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let c = factory.ith_var(2).unwrap();
    let f = a.and(&b).unwrap();

    let identity = factory.make_pairing();
    assert_eq!(f.replace(&identity).unwrap(), f);

    let mut rename = factory.make_pairing();
    rename.set(1, 2).unwrap();
    assert_eq!(f.replace(&rename).unwrap(), a.and(&c).unwrap());
}

#[test]
fn test_replace_against_the_ordering() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let c = factory.ith_var(2).unwrap();

    // Renaming the topmost variable below its children exercises the ite
    // fallback; a naive rebuild would emit an out-of-order node.
    let f = a.and(&b).unwrap();
    let mut pairing = factory.make_pairing();
    pairing.set(0, 2).unwrap();
    assert_eq!(f.replace(&pairing).unwrap(), c.and(&b).unwrap());

    // Swap both variables at once.
    let g = a.diff(&b).unwrap();
    let mut swap = factory.make_pairing();
    swap.set_pairs(&[0, 1], &[1, 0]).unwrap();
    assert_eq!(g.replace(&swap).unwrap(), b.diff(&a).unwrap());
}

#[test]
fn test_replace_rejects_diagram_pairings() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let g = a.or(&b).unwrap();

    let mut pairing = factory.make_pairing();
    pairing.set_diagram(1, &g).unwrap();
    let err = a.and(&b).unwrap().replace(&pairing).unwrap_err();
    assert!(matches!(
        err,
        crate::error::BddError::Pairing(crate::error::PairingError::NotVariablePairing { var: 1 })
    ));
}

#[test]
fn test_veccompose() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let c = factory.ith_var(2).unwrap();

    let f = a.and(&b).unwrap();
    let g = b.or(&c).unwrap();

    let mut pairing = factory.make_pairing();
    pairing.set_diagram(0, &g).unwrap();
    assert_eq!(f.veccompose(&pairing).unwrap(), g.and(&b).unwrap());

    // Mutating the pairing invalidates its cached substitutions.
    pairing.set_diagram(0, &c).unwrap();
    assert_eq!(f.veccompose(&pairing).unwrap(), c.and(&b).unwrap());
}

#[test]
fn test_restrict() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let c = factory.ith_var(2).unwrap();

    let f = a.and(&b).unwrap().or(&c).unwrap();

    // Restrict a=1: b ∨ c. Restrict a=1, b=0: c.
    assert_eq!(f.restrict(&a).unwrap(), b.or(&c).unwrap());
    let cube = a.and(&b.not().unwrap()).unwrap();
    assert_eq!(f.restrict(&cube).unwrap(), c);

    // Not a cube.
    let not_cube = a.or(&b).unwrap();
    assert!(f.restrict(&not_cube).is_err());
}

#[test]
fn test_constrain_agrees_under_the_care_set() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let c = factory.ith_var(2).unwrap();

    let f = a.xor(&b).unwrap().or(&c).unwrap();
    let care = a.or(&b).unwrap();

    let constrained = f.constrain(&care).unwrap();
    assert_eq!(
        constrained.and(&care).unwrap(),
        f.and(&care).unwrap()
    );
    assert_eq!(f.constrain(&factory.one()).unwrap(), f);
    assert!(f.constrain(&factory.zero()).unwrap().is_zero());
}

#[test]
fn test_simplify_agrees_under_the_care_set() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let c = factory.ith_var(2).unwrap();

    let f = a.and(&b).unwrap().or(&b.and(&c).unwrap()).unwrap();
    let d = b.clone();

    let simplified = f.simplify(&d).unwrap();
    assert_eq!(simplified.and(&d).unwrap(), f.and(&d).unwrap());
    // Inside b, f collapses to a ∨ c.
    assert_eq!(simplified, a.or(&c).unwrap());
}

#[test]
fn test_support() {
    let factory = BddFactory::new_bdd(4);
    let a = factory.ith_var(0).unwrap();
    let c = factory.ith_var(2).unwrap();

    let f = a.xor(&c).unwrap();
    let support = f.support().unwrap();
    assert_eq!(support.vars(), vec![0, 2]);
    assert_eq!(support.to_level_array(), vec![0, 2]);
    assert!(support.contains(0));
    assert!(!support.contains(1));
    assert!(factory.one().support().unwrap().is_empty());
}

#[test]
fn test_var_set_operations() {
    let factory = BddFactory::new_bdd(4);
    let s1 = factory.var_set(&[0, 1, 2]).unwrap();
    let s2 = factory.var_set(&[2, 3]).unwrap();

    assert_eq!(s1.len(), 3);
    assert_eq!(s1.union(&s2).unwrap().to_level_array(), vec![0, 1, 2, 3]);
    assert_eq!(s1.intersect(&s2).unwrap().to_level_array(), vec![2]);
    assert_eq!(s1.difference(&s2).unwrap().to_level_array(), vec![0, 1]);

    // The cube is the conjunction of the members.
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let c = factory.ith_var(2).unwrap();
    let cube = a.and(&b).unwrap().and(&c).unwrap();
    assert_eq!(s1.cube(), cube);
}

#[test]
fn test_counts() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let c = factory.ith_var(2).unwrap();

    let f = a.and(&b).unwrap().or(&c).unwrap();
    assert_eq!(f.node_count(), 3);
    assert_eq!(f.sat_count(), big(5));
    assert_eq!(f.path_count(), big(3));

    assert_eq!(factory.zero().node_count(), 0);
    assert_eq!(factory.one().node_count(), 0);
    assert_eq!(factory.zero().sat_count(), big(0));
    assert_eq!(factory.one().sat_count(), big(8));

    // Tautology counts the whole cube space.
    let taut = a.or(&a.not().unwrap()).unwrap();
    assert_eq!(taut.sat_count(), big(8));

    // Inclusion-exclusion.
    let g = b.xor(&c).unwrap();
    let sum = f.or(&g).unwrap().sat_count() + f.and(&g).unwrap().sat_count();
    assert_eq!(sum, f.sat_count() + g.sat_count());
}

#[test]
fn test_sat_count_set() {
    let factory = BddFactory::new_bdd(4);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();

    let f = a.and(&b).unwrap();
    let exact = factory.var_set(&[0, 1]).unwrap();
    assert_eq!(f.sat_count_set(&exact).unwrap(), big(1));

    let wider = factory.var_set(&[0, 1, 2]).unwrap();
    assert_eq!(f.sat_count_set(&wider).unwrap(), big(2));

    let missing = factory.var_set(&[0]).unwrap();
    assert!(f.sat_count_set(&missing).is_err());
}

#[test]
fn test_var_profile() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let c = factory.ith_var(2).unwrap();

    let f = a.and(&b).unwrap().or(&c).unwrap();
    assert_eq!(f.var_profile(), vec![1, 1, 1]);

    let g = a.ite(&b, &b.not().unwrap()).unwrap();
    assert_eq!(g.var_profile(), vec![1, 2, 0]);
}

#[test]
fn test_sat_one_family() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let f = a.and(&b).unwrap();

    // A model implies the function.
    let model = f.sat_one().unwrap();
    assert_eq!(model.and(&f).unwrap(), model);
    assert!(factory.zero().sat_one().unwrap().is_zero());

    // The full model decides every variable.
    let full = f.full_sat_one().unwrap();
    assert_eq!(full.support().unwrap().len(), 3);
    assert_eq!(full.sat_count(), big(1));
    assert_eq!(full.and(&f).unwrap(), full);

    // Forced polarity on unconstrained set members.
    let set = factory.var_set(&[2]).unwrap();
    let forced = f.sat_one_set(&set, true).unwrap();
    let c = factory.ith_var(2).unwrap();
    assert_eq!(forced.and(&c).unwrap(), forced);
}

#[test]
fn test_mismatched_factories() {
    let f1 = BddFactory::new_bdd(2);
    let f2 = BddFactory::new_bdd(2);
    let a = f1.ith_var(0).unwrap();
    let b = f2.ith_var(0).unwrap();

    assert!(matches!(
        a.and(&b),
        Err(crate::error::BddError::Node(
            crate::error::NodeError::MismatchedFactories
        ))
    ));
    assert_ne!(a, b);
}

#[test]
fn test_refcount_round_trip() {
    let factory = BddFactory::new_bdd(3);
    let baseline = factory.live_node_count();

    {
        let a = factory.ith_var(0).unwrap();
        let b = factory.ith_var(1).unwrap();
        let c = factory.ith_var(2).unwrap();
        let f = a.and(&b).unwrap().or(&c).unwrap();
        let _g = f.xor(&c).unwrap();
        assert!(factory.live_node_count() > baseline);
    }

    // All handles dropped: a sweep restores the initial live count; the
    // swept slots line up on the free list for reuse.
    let freed = factory.gc();
    assert_eq!(factory.live_node_count(), baseline);
    assert_eq!(factory.free_node_count(), freed);
}

#[test]
fn test_gc_keeps_reachable_nodes() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();
    let f = a.and(&b).unwrap();

    let _dead = f.xor(&a).unwrap();
    factory.gc();

    // f survived and still evaluates correctly.
    assert_eq!(f.sat_count(), big(2));
    assert_eq!(f.restrict(&a).unwrap(), b);
}

#[test]
fn test_set_var_num() {
    let factory = BddFactory::new_bdd(2);
    assert_eq!(factory.var_num(), 2);
    factory.set_var_num(4).unwrap();
    assert_eq!(factory.var_num(), 4);
    assert!(factory.ith_var(3).is_ok());
    assert!(factory.set_var_num(1).is_err());
}

#[test]
fn test_var_level_translation() {
    let factory = BddFactory::new_bdd(3);
    for var in 0..3 {
        let level = factory.var_to_level(var).unwrap();
        assert_eq!(factory.level_to_var(level).unwrap(), var);
    }
    assert!(factory.var_to_level(7).is_err());
    assert!(factory.level_to_var(7).is_err());
}

#[test]
fn test_cache_is_transparent() {
    let factory = BddFactory::new_bdd(3);
    let a = factory.ith_var(0).unwrap();
    let b = factory.ith_var(1).unwrap();

    let first = a.and(&b).unwrap();
    let hits_before = factory.cache_stats().hits;
    let second = a.and(&b).unwrap();
    assert_eq!(first, second);
    assert!(factory.cache_stats().hits > hits_before);

    // After a sweep the cache is cold but results are identical.
    factory.gc();
    let third = a.and(&b).unwrap();
    assert_eq!(first, third);
}
