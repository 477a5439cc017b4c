use super::*;

// ── Type lattice ─────────────────────────────────────────────────

#[test]
fn par_int_widens_to_par_float() {
    assert!(Type::par_int().is_subtype_of(Type::par_float()));
    assert!(!Type::par_float().is_subtype_of(Type::par_int()));
    assert!(Type::par_bool().is_subtype_of(Type::par_int()));
}

#[test]
fn par_is_subtype_of_var() {
    assert!(Type::par_int().is_subtype_of(Type::var_int()));
    assert!(!Type::var_int().is_subtype_of(Type::par_int()));
}

#[test]
fn bottom_absorbs_into_plain_types() {
    assert!(Type::bot().is_subtype_of(Type::par_int()));
    assert!(Type::bot().is_subtype_of(Type::var_float()));
    assert!(Type::bot().is_subtype_of(Type::par_set_int()));
    let empty_set = Type::bot().with_set(SetType::Set);
    assert!(empty_set.is_subtype_of(Type::par_set_int()));
    assert!(!empty_set.is_subtype_of(Type::par_int()));
}

#[test]
fn par_top_absorbs_into_var_target() {
    assert!(Type::par_int().is_subtype_of(Type::var_top()));
    assert!(Type::var_bool().is_subtype_of(Type::var_top()));
    assert!(!Type::var_bool().is_subtype_of(Type::top()));
}

#[test]
fn par_set_coerces_to_array() {
    let arr = Type::par_int().with_dim(1);
    assert!(Type::par_set_int().is_subtype_of(arr));
    assert!(!Type::var_set_int().is_subtype_of(arr));
    assert!(Type::par_set_int().is_subtype_of(Type::par_float().with_dim(1)));
}

#[test]
fn generic_rank_accepts_any_array() {
    let generic = Type::par_int().with_dim(-1);
    assert!(Type::par_int().with_dim(2).is_subtype_of(generic));
    assert!(!Type::par_int().is_subtype_of(generic));
    assert!(!Type::par_int().with_dim(1).is_subtype_of(Type::par_int().with_dim(2)));
}

#[test]
fn optional_needs_optional_target() {
    let opt_int = Type::par_int().with_opt(OptType::Optional);
    assert!(Type::par_int().is_subtype_of(opt_int));
    assert!(!opt_int.is_subtype_of(Type::par_int()));
    assert!(opt_int.is_subtype_of(opt_int));
}

#[test]
fn var_forces_contains_var() {
    assert!(Type::var_int().cv());
    assert!(Type::par_int().with_inst(Inst::Var).cv());
    assert!(Type::var_int().with_cv(false).cv());
    assert!(!Type::par_int().cv());
}

#[test]
fn equality_ignores_contains_var() {
    assert_eq!(Type::par_int().with_cv(true), Type::par_int());
}

#[test]
fn display_types() {
    assert_eq!(Type::par_int().to_string(), "int");
    assert_eq!(Type::var_set_int().to_string(), "var set of int");
    assert_eq!(Type::par_float().with_dim(2).to_string(), "array[int,int] of float");
    assert_eq!(
        Type::var_int().with_opt(OptType::Optional).with_dim(-1).to_string(),
        "array[$_] of var opt int"
    );
}

#[test]
fn ordering_follows_encoding() {
    assert!(Type::par_bool() < Type::par_int());
    assert!(Type::par_int() < Type::var_int());
    assert!(Type::par_set_int() < Type::par_int());
}

#[test]
fn decode_rejects_bad_inst_bits() {
    assert_eq!(Type::decode(3 << 21), None);
    assert_eq!(Type::decode(1 << 30), None);
}

#[test]
fn plain_means_present_scalar() {
    assert!(Type::par_int().is_plain());
    assert!(Type::var_bool().is_plain());
    assert!(!Type::par_set_int().is_plain());
    assert!(!Type::par_int().with_dim(1).is_plain());
    assert!(!Type::par_int().with_opt(OptType::Optional).is_plain());

    assert!(Type::ann().is_ann());
    assert!(!Type::ann().with_opt(OptType::Optional).is_ann());
    assert!(!Type::ann().with_dim(1).is_ann());
}

// ── Int sets ─────────────────────────────────────────────────────

#[test]
fn intset_normalises_adjacent_ranges() {
    let s = IntSetVal::from_ranges(vec![(5, 7), (1, 2), (3, 3), (10, 9)]);
    assert_eq!(s.ranges(), &[(1, 3), (5, 7)]);
    assert_eq!(s.card(), 6);
    assert_eq!(s.min(), Some(1));
    assert_eq!(s.max(), Some(7));
}

#[test]
fn intset_operations() {
    let a = IntSetVal::from_values([1, 2]);
    let b = IntSetVal::from_values([2, 3]);
    assert_eq!(a.union(&b), IntSetVal::range(1, 3));
    assert_eq!(a.intersect(&b), IntSetVal::from_values([2]));
    assert_eq!(a.diff(&b), IntSetVal::from_values([1]));
    assert_eq!(a.symdiff(&b), IntSetVal::from_values([1, 3]));
    assert!(IntSetVal::from_values([2]).is_subset_of(&a));
    assert!(!b.is_subset_of(&a));
}

#[test]
fn intset_diff_splits_range() {
    let s = IntSetVal::range(1, 10).diff(&IntSetVal::from_ranges(vec![(3, 4), (8, 20)]));
    assert_eq!(s.ranges(), &[(1, 2), (5, 7)]);
}

#[test]
fn intset_display() {
    assert_eq!(IntSetVal::range(1, 5).to_string(), "1..5");
    assert_eq!(IntSetVal::from_values([1, 3]).to_string(), "{1,3}");
    assert_eq!(IntSetVal::empty().to_string(), "{}");
}

// ── Model ────────────────────────────────────────────────────────

#[test]
fn item_paths_visit_includes_once() {
    let mut m = Model::new();
    let ti = m.type_inst(Type::par_int(), None);
    let one = m.int(1);
    let inner = m.var_decl("n", ti, Some(one));
    let inc = m.include("globals.mzn", vec![Item::VarDecl(inner)]);
    m.push_item(Item::Include(inc));
    let c = m.bool(true);
    m.constrain(c);

    let paths = m.item_paths();
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].include, Some(inc));
    assert!(m.decls[inner].toplevel);
    assert!(matches!(m.slot(paths[1]).item, Item::Constraint(_)));
}

#[test]
fn compaction_waits_for_gc_lock() {
    let mut m = Model::new();
    let v = m.int(3);
    let p = m.assign("x", v);
    m.slot_mut(p).removed = true;
    {
        let _lock = m.gc_lock();
        assert!(m.gc_paused());
        assert!(!m.compact());
        assert_eq!(m.items.len(), 1);
    }
    assert!(!m.gc_paused());
    assert!(m.compact());
    assert!(m.items.is_empty());
}

#[test]
fn structural_equality() {
    let mut m = Model::new();
    let a = {
        let one = m.int(1);
        let two = m.int(2);
        m.array(vec![one, two])
    };
    let b = {
        let one = m.int(1);
        let two = m.int(2);
        m.array(vec![one, two])
    };
    let c = {
        let one = m.int(1);
        m.array(vec![one])
    };
    assert!(m.expr_equal(a, b));
    assert!(!m.expr_equal(a, c));
    let x = m.anon();
    let y = m.anon();
    assert!(!m.expr_equal(x, y));
}

#[test]
fn follow_flat_chain() {
    let mut m = Model::new();
    let ti = m.type_inst(Type::var_int(), None);
    let a = m.var_decl("a", ti, None);
    let b = m.var_decl("b", ti, None);
    let c = m.var_decl("c", ti, None);
    m.decls[a].flat = Some(b);
    m.decls[b].flat = Some(c);
    m.decls[c].flat = Some(c);
    assert_eq!(m.follow_flat(a), c);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_type() -> impl Strategy<Value = Type> {
        let inst = prop_oneof![Just(Inst::Par), Just(Inst::Var)];
        let base = prop_oneof![
            Just(BaseType::Top),
            Just(BaseType::Bool),
            Just(BaseType::Int),
            Just(BaseType::Float),
            Just(BaseType::String),
            Just(BaseType::Ann),
            Just(BaseType::Bot),
            Just(BaseType::Unknown),
        ];
        let set = prop_oneof![Just(SetType::Plain), Just(SetType::Set)];
        let opt = prop_oneof![Just(OptType::Present), Just(OptType::Optional)];
        (inst, base, set, opt, -1i32..6, any::<bool>()).prop_map(
            |(inst, base, set, opt, dim, cv)| {
                Type::new(inst, base, set, dim).with_opt(opt).with_cv(cv)
            },
        )
    }

    proptest! {
        #[test]
        fn encoding_round_trips(t in any_type()) {
            prop_assert_eq!(Type::decode(t.encode()), Some(t));
        }

        #[test]
        fn subtyping_is_reflexive(t in any_type()) {
            prop_assert!(t.is_subtype_of(t));
        }

        #[test]
        fn union_contains_both_operands(
            a in proptest::collection::vec(-50i64..50, 0..12),
            b in proptest::collection::vec(-50i64..50, 0..12),
        ) {
            let sa = IntSetVal::from_values(a.iter().copied());
            let sb = IntSetVal::from_values(b.iter().copied());
            let u = sa.union(&sb);
            prop_assert!(sa.is_subset_of(&u));
            prop_assert!(sb.is_subset_of(&u));
            prop_assert_eq!(u.diff(&sb).union(&sa.intersect(&sb)), sa.clone());
        }
    }
}
