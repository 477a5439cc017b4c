use mzn_ast::*;
use mzn_eval::{compute_int_bounds, eval_bool, eval_int, Evaluator};
use mzn_typeck::{check, typecheck, typecheck_assignment, CheckOptions};

fn range(m: &mut Model, lo: i64, hi: i64) -> ExprId {
    let (lo, hi) = (m.int(lo), m.int(hi));
    m.binop(lo, BinOpKind::DotDot, hi)
}

fn var_int(m: &mut Model, name: &str, lo: i64, hi: i64) -> DeclId {
    let dom = range(m, lo, hi);
    let ti = m.domain_type_inst(Inst::Var, dom);
    m.declare(name, ti, None)
}

// ── checked models ──────────────────────────────────────────

#[test]
fn bounds_of_a_checked_constraint() {
    // var 1..10: x; var 1..10: y; constraint x + y <= 12;
    let mut m = Model::new();
    var_int(&mut m, "x", 1, 10);
    var_int(&mut m, "y", 1, 10);
    let (x, y) = (m.ident("x"), m.ident("y"));
    let sum = m.binop(x, BinOpKind::Plus, y);
    let twelve = m.int(12);
    let c = m.binop(sum, BinOpKind::Le, twelve);
    m.constrain(c);

    let result = check(&mut m).unwrap();
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert!(m.exprs[c].ty.is_var_bool());

    let b = compute_int_bounds(&mut m, sum);
    assert!(b.valid);
    assert_eq!((b.lo, b.hi), (2.into(), 20.into()));
}

#[test]
fn parameters_evaluate_in_dependency_order() {
    // int: m = n * 2; int: n = 3 + k; int: k = 4;
    let mut m = Model::new();
    let (n, two) = (m.ident("n"), m.int(2));
    let init = m.binop(n, BinOpKind::Mult, two);
    let ti = m.type_inst(Type::par_int(), None);
    let md = m.declare("m", ti, Some(init));
    let (three, k) = (m.int(3), m.ident("k"));
    let init = m.binop(three, BinOpKind::Plus, k);
    let ti = m.type_inst(Type::par_int(), None);
    m.declare("n", ti, Some(init));
    let four = m.int(4);
    let ti = m.type_inst(Type::par_int(), None);
    m.declare("k", ti, Some(four));

    let result = check(&mut m).unwrap();
    assert!(result.errors.is_empty(), "{:?}", result.errors);

    let r = m.ident_of(md);
    assert_eq!(eval_int(&mut m, r).unwrap(), 14);
}

#[test]
fn late_assignment_is_evaluated() {
    let mut m = Model::new();
    let ti = m.type_inst(Type::par_int(), None);
    let n = m.declare("n", ti, None);
    let (nref, five) = (m.ident("n"), m.int(5));
    let c = m.binop(nref, BinOpKind::Gt, five);
    m.constrain(c);

    let opts = CheckOptions {
        ignore_undefined_parameters: true,
        ..CheckOptions::default()
    };
    let result = typecheck(&mut m, &opts).unwrap();
    assert!(result.errors.is_empty(), "{:?}", result.errors);

    let ten = m.int(10);
    let path = m.assign("n", ten);
    typecheck_assignment(&mut m, path).unwrap();
    assert!(m.decls[n].init.is_some());
    assert!(eval_bool(&mut m, c).unwrap());
}

#[test]
fn evaluator_keeps_the_model_usable() {
    let mut m = Model::new();
    let x = var_int(&mut m, "x", -3, 3);
    check(&mut m).unwrap();

    let r = m.ident_of(x);
    let neg = m.unop(UnOpKind::Minus, r);
    mzn_typeck::typecheck_expr(&mut m, neg).unwrap();

    let mut ev = Evaluator::new(&mut m);
    let b = ev.int_bounds(neg);
    assert!(b.valid);
    assert_eq!((b.lo, b.hi), ((-3).into(), 3.into()));
    assert!(ev.model().decls[x].init.is_none());
}
