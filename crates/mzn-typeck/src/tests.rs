use super::*;

fn check_ok(m: &mut Model) -> TypeCheckResult {
    let result = check(m).expect("structural error");
    assert!(result.errors.is_empty(), "unexpected type errors: {:?}", result.errors);
    result
}

fn check_err(m: &mut Model) -> String {
    let result = check(m).expect("structural error");
    assert!(!result.errors.is_empty(), "expected type errors, got none");
    result
        .errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("\n")
}

fn expr_type(m: &mut Model, e: ExprId) -> Type {
    typecheck_expr(m, e).expect("type error")
}

fn range(m: &mut Model, lo: i64, hi: i64) -> ExprId {
    let (lo, hi) = (m.int(lo), m.int(hi));
    m.binop(lo, BinOpKind::DotDot, hi)
}

fn var_int(m: &mut Model, name: &str, lo: i64, hi: i64) -> DeclId {
    let dom = range(m, lo, hi);
    let ti = m.domain_type_inst(Inst::Var, dom);
    m.declare(name, ti, None)
}

fn par_int(m: &mut Model, name: &str, init: Option<ExprId>) -> DeclId {
    let ti = m.type_inst(Type::par_int(), None);
    m.declare(name, ti, init)
}

fn is_call_to(m: &Model, e: ExprId, name: &str) -> bool {
    matches!(&m.exprs[e].kind, ExprKind::Call { name: n, .. } if n == name)
}

// ── Resolver ─────────────────────────────────────────────────────

#[test]
fn circular_definition_is_structural() {
    let mut m = Model::new();
    let b = m.ident("b");
    par_int(&mut m, "a", Some(b));
    let a = m.ident("a");
    par_int(&mut m, "b", Some(a));
    let err = check(&mut m).unwrap_err();
    assert_eq!(err.kind, TypeErrorKind::CircularDefinition);
    assert!(err.is_structural());
    assert!(err.message.contains("circular definition"));
}

#[test]
fn duplicate_declaration() {
    let mut m = Model::new();
    par_int(&mut m, "n", None);
    par_int(&mut m, "n", None);
    let err = check(&mut m).unwrap_err();
    assert_eq!(err.kind, TypeErrorKind::DuplicateIdentifier);
    assert_eq!(err.ident.as_deref(), Some("n"));
}

#[test]
fn undefined_identifier() {
    let mut m = Model::new();
    let q = m.ident("q");
    m.constrain(q);
    let err = check(&mut m).unwrap_err();
    assert_eq!(err.kind, TypeErrorKind::UndefinedIdentifier);
    assert_eq!(err.message, "undefined identifier `q'");
}

#[test]
fn declarations_follow_dependencies() {
    let mut m = Model::new();
    let b = m.ident("b");
    let one = m.int(1);
    let init = m.binop(b, BinOpKind::Plus, one);
    let a = par_int(&mut m, "a", Some(init));
    let five = m.int(5);
    let b = par_int(&mut m, "b", Some(five));
    let result = check_ok(&mut m);
    let pos = |d| result.decl_order.iter().position(|x| *x == d).unwrap();
    assert!(pos(b) < pos(a));
    // root items are reordered the same way
    assert!(matches!(m.items[0].item, Item::VarDecl(d) if d == b));
}

#[test]
fn let_shadows_toplevel() {
    let mut m = Model::new();
    var_int(&mut m, "x", 1, 3);
    let two = m.int(2);
    let ti = m.type_inst(Type::par_int(), None);
    let inner = m.var_decl("x", ti, Some(two));
    let x = m.ident("x");
    let one = m.int(1);
    let body = m.binop(x, BinOpKind::Plus, one);
    let e = m.let_in(vec![LetItem::Decl(inner)], body);
    check_ok(&mut m);
    assert_eq!(expr_type(&mut m, e), Type::par_int());
    assert_eq!(m.id_decl(x), Some(inner));
}

#[test]
fn let_binding_ends_with_the_let() {
    // constraint (let { int: y = 1 } in y) = y;
    let mut m = Model::new();
    let one = m.int(1);
    let ti = m.type_inst(Type::par_int(), None);
    let y = m.var_decl("y", ti, Some(one));
    let body = m.ident("y");
    let scoped = m.let_in(vec![LetItem::Decl(y)], body);
    let outside = m.ident("y");
    let c = m.binop(scoped, BinOpKind::Eq, outside);
    m.constrain(c);
    let err = check(&mut m).unwrap_err();
    assert_eq!(err.kind, TypeErrorKind::UndefinedIdentifier);
    assert_eq!(err.ident.as_deref(), Some("y"));
}

#[test]
fn shadowed_name_resolves_to_toplevel_after_let() {
    // var 1..3: x; constraint (let { int: x = 2 } in x) < x;
    let mut m = Model::new();
    let outer = var_int(&mut m, "x", 1, 3);
    let two = m.int(2);
    let ti = m.type_inst(Type::par_int(), None);
    let inner = m.var_decl("x", ti, Some(two));
    let body = m.ident("x");
    let scoped = m.let_in(vec![LetItem::Decl(inner)], body);
    let after = m.ident("x");
    let c = m.binop(scoped, BinOpKind::Lt, after);
    m.constrain(c);
    check_ok(&mut m);
    assert_eq!(m.id_decl(body), Some(inner));
    assert_eq!(m.id_decl(after), Some(outer));
}

#[test]
fn generator_binding_ends_with_the_comprehension() {
    // constraint sum(i in 1..3)(i) > i;
    let mut m = Model::new();
    let src = range(&mut m, 1, 3);
    let g = m.generator(&["i"], src);
    let body = m.ident("i");
    let comp = m.comprehension(body, vec![g], None, false);
    let total = m.call("sum", vec![comp]);
    let outside = m.ident("i");
    let c = m.binop(total, BinOpKind::Gt, outside);
    m.constrain(c);
    let err = check(&mut m).unwrap_err();
    assert_eq!(err.kind, TypeErrorKind::UndefinedIdentifier);
    assert_eq!(err.ident.as_deref(), Some("i"));
}

#[test]
fn let_orders_declarations_before_constraints() {
    let mut m = Model::new();
    let ti = m.type_inst(Type::par_int(), None);
    let one = m.int(1);
    let y = m.var_decl("y", ti, Some(one));
    let (yref, zero) = (m.ident("y"), m.int(0));
    let guard = m.binop(yref, BinOpKind::Gt, zero);
    let ti = m.type_inst(Type::par_int(), None);
    let (yref, two) = (m.ident("y"), m.int(2));
    let z_init = m.binop(yref, BinOpKind::Plus, two);
    let z = m.var_decl("z", ti, Some(z_init));
    let body = m.ident("z");
    let items = vec![LetItem::Decl(y), LetItem::Constraint(guard), LetItem::Decl(z)];
    let e = m.let_in(items, body);
    assert_eq!(expr_type(&mut m, e), Type::par_int());
    let ExprKind::Let(l) = &m.exprs[e].kind else {
        panic!("not a let");
    };
    assert!(matches!(l.items[1], LetItem::Decl(d) if d == z));
    assert!(matches!(l.items[2], LetItem::Constraint(c) if c == guard));
    assert_eq!(l.orig[1], Some(z_init));
}

#[test]
fn let_variable_must_be_initialised() {
    let mut m = Model::new();
    let ti = m.type_inst(Type::par_int(), None);
    let y = m.var_decl("y", ti, None);
    let body = m.ident("y");
    let e = m.let_in(vec![LetItem::Decl(y)], body);
    let err = typecheck_expr(&mut m, e).unwrap_err();
    assert_eq!(err.message, "let variable `y' must be initialised");
}

// ── Literals and operators ───────────────────────────────────────

#[test]
fn int_array_literal() {
    let mut m = Model::new();
    let elems = vec![m.int(1), m.int(2), m.int(3)];
    let e = m.array(elems);
    let ty = expr_type(&mut m, e);
    assert_eq!(ty, Type::par_int().with_dim(1));
    assert_eq!(ty.to_string(), "array[int] of int");
}

#[test]
fn mixed_int_and_bool_array_is_rejected() {
    let mut m = Model::new();
    let elems = vec![m.int(1), m.bool(true)];
    let e = m.array(elems);
    let err = typecheck_expr(&mut m, e).unwrap_err();
    assert_eq!(err.kind, TypeErrorKind::Type);
    assert!(!err.is_structural());
    insta::assert_snapshot!(err.message, @"non-uniform array literal");
}

#[test]
fn non_uniform_array_literal() {
    let mut m = Model::new();
    let elems = vec![m.int(1), m.string("a")];
    let e = m.array(elems);
    let err = typecheck_expr(&mut m, e).unwrap_err();
    insta::assert_snapshot!(err.message, @"non-uniform array literal");
}

#[test]
fn empty_literals_are_bot() {
    let mut m = Model::new();
    let s = m.set_lit(vec![]);
    let a = m.array(vec![]);
    assert_eq!(expr_type(&mut m, s), Type::bot().with_set(SetType::Set));
    assert_eq!(expr_type(&mut m, a), Type::bot().with_dim(1));
}

#[test]
fn anonymous_array_elements_take_var_type() {
    let mut m = Model::new();
    let anon = m.anon();
    let one = m.int(1);
    let e = m.array(vec![anon, one]);
    assert_eq!(expr_type(&mut m, e), Type::var_int().with_dim(1));
    assert_eq!(m.exprs[anon].ty, Type::var_int());

    let only = m.anon();
    let e = m.array(vec![only]);
    let err = typecheck_expr(&mut m, e).unwrap_err();
    assert!(err.message.contains("at least one non-anonymous"));
}

#[test]
fn set_literal_of_var_is_var_set() {
    let mut m = Model::new();
    var_int(&mut m, "x", 1, 3);
    check_ok(&mut m);
    let x = m.ident("x");
    let two = m.int(2);
    let e = m.set_lit(vec![x, two]);
    assert_eq!(expr_type(&mut m, e), Type::var_set_int());
}

#[test]
fn ite_coerces_int_branch_to_float() {
    let mut m = Model::new();
    let cond = m.bool(true);
    let then = m.int(1);
    let els = m.float(2.0);
    let e = m.ite(vec![(cond, then)], els);
    assert_eq!(expr_type(&mut m, e), Type::par_float());
    let ExprKind::Ite { branches, .. } = &m.exprs[e].kind else {
        panic!("not a conditional");
    };
    assert!(is_call_to(&m, branches[0].1, "int2float"));
}

#[test]
fn ite_with_var_condition_is_var() {
    let mut m = Model::new();
    var_int(&mut m, "x", 1, 3);
    let x = m.ident("x");
    let two = m.int(2);
    let cond = m.binop(x, BinOpKind::Gt, two);
    let (a, b) = (m.int(1), m.int(0));
    let e = m.ite(vec![(cond, a)], b);
    assert_eq!(expr_type(&mut m, e), Type::var_int());
}

#[test]
fn mixed_arithmetic_widens_to_float() {
    let mut m = Model::new();
    let (a, b) = (m.int(1), m.float(2.5));
    let e = m.binop(a, BinOpKind::Plus, b);
    assert_eq!(expr_type(&mut m, e), Type::par_float());
    let ExprKind::BinOp { lhs, .. } = m.exprs[e].kind else {
        panic!("not a binop");
    };
    assert!(is_call_to(&m, lhs, "int2float"));
}

#[test]
fn var_operand_selects_var_overload() {
    let mut m = Model::new();
    var_int(&mut m, "x", 1, 3);
    let x = m.ident("x");
    let one = m.int(1);
    let e = m.binop(x, BinOpKind::Plus, one);
    assert_eq!(expr_type(&mut m, e), Type::var_int());
}

#[test]
fn operator_without_overload() {
    let mut m = Model::new();
    let (a, b) = (m.string("a"), m.int(1));
    let e = m.binop(a, BinOpKind::Mult, b);
    let err = typecheck_expr(&mut m, e).unwrap_err();
    assert!(err.message.starts_with("type error in operator application for `*'"));
}

#[test]
fn generic_calls() {
    let mut m = Model::new();
    let elems = vec![m.int(1), m.int(2)];
    let arr = m.array(elems);
    let e = m.call("sum", vec![arr]);
    assert_eq!(expr_type(&mut m, e), Type::par_int());

    let elems = vec![m.bool(true)];
    let arr = m.array(elems);
    let e = m.call("length", vec![arr]);
    assert_eq!(expr_type(&mut m, e), Type::par_int());

    let (a, b) = (m.int(1), m.int(2));
    let (l, r) = (m.array(vec![a]), m.array(vec![b]));
    let e = m.binop(l, BinOpKind::PlusPlus, r);
    assert_eq!(expr_type(&mut m, e), Type::par_int().with_dim(1));
}

#[test]
fn unknown_function() {
    let mut m = Model::new();
    let arg = m.int(1);
    let e = m.call("frobnicate", vec![arg]);
    let err = typecheck_expr(&mut m, e).unwrap_err();
    assert_eq!(
        err.message,
        "no function or predicate with this signature found: `frobnicate(int)'"
    );
}

// ── Arrays and comprehensions ────────────────────────────────────

#[test]
fn array_access_element_type() {
    let mut m = Model::new();
    let elems = vec![m.float(1.0), m.float(2.0)];
    let arr = m.array(elems);
    let ti = m.array_type_inst(vec![], Type::par_float().with_dim(1), None);
    let idx = m.index_int();
    m.type_insts[ti].ranges.push(idx);
    m.declare("a", ti, Some(arr));
    check_ok(&mut m);

    let a = m.ident("a");
    let i = m.int(2);
    let e = m.access(a, vec![i]);
    assert_eq!(expr_type(&mut m, e), Type::par_float());

    let a = m.ident("a");
    let (i, j) = (m.int(1), m.int(1));
    let e = m.access(a, vec![i, j]);
    let err = typecheck_expr(&mut m, e).unwrap_err();
    assert_eq!(err.message, "array dimensions do not match");
}

#[test]
fn access_into_scalar() {
    let mut m = Model::new();
    let (n, i) = (m.int(3), m.int(1));
    let e = m.access(n, vec![i]);
    let err = typecheck_expr(&mut m, e).unwrap_err();
    assert_eq!(err.message, "not an array in array access");
}

#[test]
fn array_comprehension() {
    let mut m = Model::new();
    let src = range(&mut m, 1, 3);
    let g = m.generator(&["i"], src);
    let i = m.ident("i");
    let two = m.int(2);
    let body = m.binop(i, BinOpKind::Mult, two);
    let e = m.comprehension(body, vec![g], None, false);
    assert_eq!(expr_type(&mut m, e), Type::par_int().with_dim(1));
}

#[test]
fn var_where_clause_makes_elements_optional() {
    let mut m = Model::new();
    var_int(&mut m, "x", 1, 3);
    let src = range(&mut m, 1, 3);
    let g = m.generator(&["i"], src);
    let x = m.ident("x");
    let i = m.ident("i");
    let w = m.binop(x, BinOpKind::Gt, i);
    let body = m.ident("i");
    let e = m.comprehension(body, vec![g], Some(w), false);
    assert_eq!(
        expr_type(&mut m, e),
        Type::var_int().with_opt(OptType::Optional).with_dim(1)
    );
}

#[test]
fn generator_names_stay_uninitialized() {
    let mut m = Model::new();
    let src = range(&mut m, 1, 3);
    let g = m.generator(&["i"], src);
    let i = g.decls[0];
    let body = m.ident("i");
    let e = m.comprehension(body, vec![g], None, false);
    assert_eq!(expr_type(&mut m, e), Type::par_int().with_dim(1));
    assert_eq!(m.decls[i].ty, Type::par_int());
    assert_eq!(m.decls[i].init, None);
}

#[test]
fn generator_over_scalar_is_rejected() {
    let mut m = Model::new();
    let src = m.int(3);
    let g = m.generator(&["i"], src);
    let body = m.ident("i");
    let e = m.comprehension(body, vec![g], None, true);
    let err = typecheck_expr(&mut m, e).unwrap_err();
    assert!(err.message.starts_with("generator expression must be"));
}

// ── Items ────────────────────────────────────────────────────────

#[test]
fn well_typed_model() {
    let mut m = Model::new();
    var_int(&mut m, "x", 1, 10);
    var_int(&mut m, "y", 1, 10);
    let (x, y) = (m.ident("x"), m.ident("y"));
    let sum = m.binop(x, BinOpKind::Plus, y);
    let ten = m.int(10);
    let c = m.binop(sum, BinOpKind::Eq, ten);
    m.constrain(c);
    let x = m.ident("x");
    m.solve(SolveGoal::Maximize(x));
    let s = m.string("done");
    let out = m.array(vec![s]);
    m.output(out);
    check_ok(&mut m);
    assert_eq!(m.exprs[c].ty, Type::var_bool());
}

#[test]
fn constraint_must_be_bool() {
    let mut m = Model::new();
    let three = m.int(3);
    m.constrain(three);
    insta::assert_snapshot!(check_err(&mut m), @"invalid type of constraint, expected `var bool', actual `int'");
}

#[test]
fn objective_must_be_numeric() {
    let mut m = Model::new();
    let s = m.string("x");
    m.solve(SolveGoal::Minimize(s));
    assert!(check_err(&mut m).starts_with("objective has invalid type"));
}

#[test]
fn single_solve_and_output_items() {
    let mut m = Model::new();
    m.solve(SolveGoal::Satisfy);
    m.solve(SolveGoal::Satisfy);
    let out = m.array(vec![]);
    m.output(out);
    insta::assert_snapshot!(check_err(&mut m), @"Only one solve item allowed");
}

#[test]
fn output_must_be_strings() {
    let mut m = Model::new();
    let one = m.int(1);
    let out = m.array(vec![one]);
    m.output(out);
    assert!(check_err(&mut m).starts_with("invalid type in output item"));
}

#[test]
fn init_value_type_mismatch_is_collected() {
    let mut m = Model::new();
    let f = m.float(1.5);
    par_int(&mut m, "n", Some(f));
    let t = m.bool(true);
    m.constrain(t);
    insta::assert_snapshot!(
        check_err(&mut m),
        @"initialisation value for `n' has invalid type-inst: expected `int', actual `float'"
    );
}

#[test]
fn errors_in_one_item_do_not_stop_the_next() {
    let mut m = Model::new();
    let one = m.int(1);
    m.constrain(one);
    let s = m.string("s");
    m.constrain(s);
    let result = check(&mut m).unwrap();
    assert_eq!(result.errors.len(), 2);
}

#[test]
fn undefined_parameter() {
    let mut m = Model::new();
    par_int(&mut m, "n", None);
    assert!(check_err(&mut m).contains("variable `n' must be defined"));

    let mut m = Model::new();
    par_int(&mut m, "n", None);
    let opts = CheckOptions {
        ignore_undefined_parameters: true,
        ..CheckOptions::default()
    };
    assert!(typecheck(&mut m, &opts).unwrap().is_ok());
}

#[test]
fn optional_parameter_defaults_to_absent() {
    let mut m = Model::new();
    let ti = m.type_inst(Type::par_int().with_opt(OptType::Optional), None);
    let n = m.declare("n", ti, None);
    check_ok(&mut m);
    let init = m.decls[n].init.expect("absent value");
    assert!(matches!(m.exprs[init].kind, ExprKind::Absent));
}

#[test]
fn assignment_is_merged_into_declaration() {
    let mut m = Model::new();
    let n = par_int(&mut m, "n", None);
    let three = m.int(3);
    let path = m.assign("n", three);
    check_ok(&mut m);
    assert_eq!(m.decls[n].init, Some(three));
    assert!(m.slot(path).removed);
    assert!(m.compact());
    assert_eq!(m.items.len(), 1);
}

#[test]
fn multiple_assignment_is_fatal() {
    let mut m = Model::new();
    let two = m.int(2);
    par_int(&mut m, "n", Some(two));
    let three = m.int(3);
    m.assign("n", three);
    let err = check(&mut m).unwrap_err();
    assert_eq!(err.message, "multiple assignment to the same variable");
}

#[test]
fn late_assignment() {
    let mut m = Model::new();
    let n = par_int(&mut m, "n", None);
    let opts = CheckOptions {
        ignore_undefined_parameters: true,
        ..CheckOptions::default()
    };
    assert!(typecheck(&mut m, &opts).unwrap().is_ok());

    let t = m.bool(true);
    let path = m.assign("n", t);
    typecheck_assignment(&mut m, path).unwrap();
    let init = m.decls[n].init.unwrap();
    assert!(is_call_to(&m, init, "bool2int"));

    let s = m.string("x");
    let path = m.assign("n", s);
    assert!(typecheck_assignment(&mut m, path).is_err());
}

#[test]
fn var_set_needs_finite_domain() {
    let mut m = Model::new();
    let ti = m.type_inst(Type::var_set_int(), None);
    m.declare("s", ti, None);
    insta::assert_snapshot!(check_err(&mut m), @"set element type for `s' is not finite");
}

#[test]
fn var_set_of_float_is_rejected() {
    let mut m = Model::new();
    let (lo, hi) = (m.float(0.0), m.float(1.0));
    let dom = m.binop(lo, BinOpKind::DotDot, hi);
    let ti = m.type_inst(Type::unknown().with_inst(Inst::Var).with_set(SetType::Set), Some(dom));
    m.declare("s", ti, None);
    assert!(check_err(&mut m).contains("var set element types other than `int' not allowed"));
}

#[test]
fn empty_domain_is_int() {
    let mut m = Model::new();
    let dom = m.set_lit(vec![]);
    let ti = m.domain_type_inst(Inst::Var, dom);
    let x = m.declare("x", ti, None);
    check_ok(&mut m);
    assert_eq!(m.decls[x].ty, Type::var_int());
}

#[test]
fn user_function_call() {
    let mut m = Model::new();
    let x = m.ident("x");
    let two = m.int(2);
    let body = m.binop(x, BinOpKind::Mult, two);
    let param = m.type_inst(Type::par_int(), None);
    let ret = m.type_inst(Type::par_int(), None);
    let f = m.function("double", vec![("x", param)], ret, Some(body));
    let three = m.int(3);
    let call = m.call("double", vec![three]);
    let y = par_int(&mut m, "y", Some(call));
    check_ok(&mut m);
    assert!(matches!(m.exprs[call].kind, ExprKind::Call { decl: Some(d), .. } if d == f));
    assert_eq!(m.decls[y].ty, Type::par_int());
}

#[test]
fn function_body_must_match_return_type() {
    let mut m = Model::new();
    let body = m.float(1.5);
    let ret = m.type_inst(Type::par_int(), None);
    m.function("f", vec![], ret, Some(body));
    assert!(check_err(&mut m).starts_with("return type of function does not match body"));
}

#[test]
fn array_index_must_be_int_set() {
    let mut m = Model::new();
    let dom = m.float(1.0);
    let ti = m.type_inst(Type::unknown(), Some(dom));
    let r = m.array_type_inst(vec![ti], Type::par_int(), None);
    m.declare("a", r, None);
    let err = check_err(&mut m);
    assert!(err.contains("type-inst must be par set"), "{}", err);
}

#[test]
fn annotations_must_be_ann() {
    let mut m = Model::new();
    let one = m.int(1);
    let t = m.bool(true);
    let c = m.annotate(t, one);
    m.constrain(c);
    insta::assert_snapshot!(check_err(&mut m), @"expected annotation, got `int'");
}

#[test]
fn stdlib_registration_is_idempotent() {
    let mut m = Model::new();
    stdlib::register(&mut m);
    let count = m.functions.len();
    stdlib::register(&mut m);
    assert_eq!(m.functions.len(), count);
}

#[test]
fn par_overload_precedes_var() {
    let mut m = Model::new();
    stdlib::register(&mut m);
    functions::sort_overloads(&mut m);
    let f = functions::match_fn(&m, "+", &[Type::par_int(), Type::par_int()]).unwrap();
    let ret = m.functions[f].ret;
    assert_eq!(m.type_insts[ret].ty, Type::par_int());
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn arrays_mixing_int_and_bool_are_rejected(values in prop::collection::vec(any::<Option<bool>>(), 1..8)) {
            let mut m = Model::new();
            let elems = values
                .iter()
                .enumerate()
                .map(|(i, v)| match v {
                    Some(b) => m.bool(*b),
                    None => m.int(i as i64),
                })
                .collect::<Vec<_>>();
            let has_int = values.iter().any(Option::is_none);
            let has_bool = values.iter().any(Option::is_some);
            let e = m.array(elems);
            match typecheck_expr(&mut m, e) {
                Ok(ty) => {
                    prop_assert!(!(has_int && has_bool));
                    let base = if has_int { Type::par_int() } else { Type::par_bool() };
                    prop_assert_eq!(ty, base.with_dim(1));
                }
                Err(err) => {
                    prop_assert!(has_int && has_bool);
                    prop_assert_eq!(err.message, "non-uniform array literal");
                }
            }
        }

        #[test]
        fn coercion_target_is_reached(value in any::<i32>(), to_float in any::<bool>()) {
            let mut m = Model::new();
            stdlib::register(&mut m);
            functions::sort_overloads(&mut m);
            let e = m.int(value as i64);
            let target = if to_float { Type::par_float() } else { Type::par_int() };
            let c = add_coercion(&mut m, e, target).unwrap();
            prop_assert_eq!(m.exprs[c].ty, target);
            prop_assert_eq!(c == e, !to_float);
        }
    }
}
