//! Per-kind evaluation rules. [`Evaluator::eval`] handles the constructs
//! every kind shares (identifiers, conditionals, lets, array access and user
//! calls); a kind supplies its literals, operators and native functions.

use std::cmp::Ordering;

use mzn_ast::*;

use crate::builtins;
use crate::error::EvalError;
use crate::Evaluator;

pub(crate) trait EvalKind {
    type Val;
    /// Used in "not ... expression" errors.
    const NAME: &'static str;

    /// Evaluate `e` as a narrower kind when its type calls for it.
    fn redirect(_ev: &mut Evaluator<'_>, _e: ExprId) -> Option<Result<Self::Val, EvalError>> {
        None
    }

    fn literal(model: &Model, e: ExprId) -> Option<Self::Val>;

    /// Allocate a literal holding `v`; memoized declarations point at it.
    fn store(model: &mut Model, v: &Self::Val) -> ExprId;

    fn node(ev: &mut Evaluator<'_>, e: ExprId) -> Result<Self::Val, EvalError>;

    fn native(
        ev: &mut Evaluator<'_>,
        name: &str,
        args: &[ExprId],
        span: Span,
    ) -> Result<Self::Val, EvalError>;
}

// ── int ──────────────────────────────────────────────────────────

pub(crate) struct IntKind;

impl EvalKind for IntKind {
    type Val = i64;
    const NAME: &'static str = "an integer";

    fn redirect(ev: &mut Evaluator<'_>, e: ExprId) -> Option<Result<i64, EvalError>> {
        if ev.ty(e).is_bool() {
            Some(ev.eval::<BoolKind>(e).map(i64::from))
        } else {
            None
        }
    }

    fn literal(model: &Model, e: ExprId) -> Option<i64> {
        match model.exprs[e].kind {
            ExprKind::IntLit(v) => Some(v),
            _ => None,
        }
    }

    fn store(model: &mut Model, v: &i64) -> ExprId {
        model.int(*v)
    }

    fn node(ev: &mut Evaluator<'_>, e: ExprId) -> Result<i64, EvalError> {
        let span = ev.span(e);
        match ev.model.exprs[e].kind.clone() {
            ExprKind::BinOp { op, lhs, rhs, .. } => {
                let a = ev.eval::<IntKind>(lhs)?;
                let b = ev.eval::<IntKind>(rhs)?;
                int_arith(op, a, b, span)
            }
            ExprKind::UnOp {
                op: UnOpKind::Plus,
                arg,
                ..
            } => ev.eval::<IntKind>(arg),
            ExprKind::UnOp {
                op: UnOpKind::Minus,
                arg,
                ..
            } => ev
                .eval::<IntKind>(arg)?
                .checked_neg()
                .ok_or_else(|| EvalError::overflow(span)),
            _ => Err(EvalError::not_kind(Self::NAME, span)),
        }
    }

    fn native(ev: &mut Evaluator<'_>, name: &str, args: &[ExprId], span: Span) -> Result<i64, EvalError> {
        builtins::int(ev, name, args, span)
    }
}

pub(crate) fn int_arith(op: BinOpKind, a: i64, b: i64, span: Span) -> Result<i64, EvalError> {
    let r = match op {
        BinOpKind::Plus => a.checked_add(b),
        BinOpKind::Minus => a.checked_sub(b),
        BinOpKind::Mult => a.checked_mul(b),
        BinOpKind::IDiv | BinOpKind::Mod if b == 0 => return Err(EvalError::division_by_zero(span)),
        BinOpKind::IDiv => a.checked_div(b),
        BinOpKind::Mod => a.checked_rem(b),
        _ => return Err(EvalError::not_kind(IntKind::NAME, span)),
    };
    r.ok_or_else(|| EvalError::overflow(span))
}

// ── float ────────────────────────────────────────────────────────

pub(crate) struct FloatKind;

impl EvalKind for FloatKind {
    type Val = f64;
    const NAME: &'static str = "a float";

    fn redirect(ev: &mut Evaluator<'_>, e: ExprId) -> Option<Result<f64, EvalError>> {
        let ty = ev.ty(e);
        if ty.is_int() {
            Some(ev.eval::<IntKind>(e).map(|v| v as f64))
        } else if ty.is_bool() {
            Some(ev.eval::<BoolKind>(e).map(|b| if b { 1.0 } else { 0.0 }))
        } else {
            None
        }
    }

    fn literal(model: &Model, e: ExprId) -> Option<f64> {
        match model.exprs[e].kind {
            ExprKind::FloatLit(v) => Some(v),
            _ => None,
        }
    }

    fn store(model: &mut Model, v: &f64) -> ExprId {
        model.float(*v)
    }

    fn node(ev: &mut Evaluator<'_>, e: ExprId) -> Result<f64, EvalError> {
        let span = ev.span(e);
        match ev.model.exprs[e].kind.clone() {
            ExprKind::BinOp { op, lhs, rhs, .. } => {
                let a = ev.eval::<FloatKind>(lhs)?;
                let b = ev.eval::<FloatKind>(rhs)?;
                match op {
                    BinOpKind::Plus => Ok(a + b),
                    BinOpKind::Minus => Ok(a - b),
                    BinOpKind::Mult => Ok(a * b),
                    BinOpKind::Div if b == 0.0 => Err(EvalError::division_by_zero(span)),
                    BinOpKind::Div => Ok(a / b),
                    _ => Err(EvalError::not_kind(Self::NAME, span)),
                }
            }
            ExprKind::UnOp {
                op: UnOpKind::Plus,
                arg,
                ..
            } => ev.eval::<FloatKind>(arg),
            ExprKind::UnOp {
                op: UnOpKind::Minus,
                arg,
                ..
            } => Ok(-ev.eval::<FloatKind>(arg)?),
            _ => Err(EvalError::not_kind(Self::NAME, span)),
        }
    }

    fn native(ev: &mut Evaluator<'_>, name: &str, args: &[ExprId], span: Span) -> Result<f64, EvalError> {
        builtins::float(ev, name, args, span)
    }
}

// ── bool ─────────────────────────────────────────────────────────

pub(crate) struct BoolKind;

impl EvalKind for BoolKind {
    type Val = bool;
    const NAME: &'static str = "a bool";

    fn literal(model: &Model, e: ExprId) -> Option<bool> {
        match model.exprs[e].kind {
            ExprKind::BoolLit(v) => Some(v),
            _ => None,
        }
    }

    fn store(model: &mut Model, v: &bool) -> ExprId {
        model.bool(*v)
    }

    fn node(ev: &mut Evaluator<'_>, e: ExprId) -> Result<bool, EvalError> {
        let span = ev.span(e);
        match ev.model.exprs[e].kind.clone() {
            ExprKind::BinOp { op, lhs, rhs, .. } => bool_binop(ev, op, lhs, rhs, span),
            ExprKind::UnOp {
                op: UnOpKind::Not,
                arg,
                ..
            } => Ok(!ev.eval::<BoolKind>(arg)?),
            _ => Err(EvalError::not_kind(Self::NAME, span)),
        }
    }

    fn native(ev: &mut Evaluator<'_>, name: &str, args: &[ExprId], span: Span) -> Result<bool, EvalError> {
        builtins::bool(ev, name, args, span)
    }
}

fn bool_binop(
    ev: &mut Evaluator<'_>,
    op: BinOpKind,
    lhs: ExprId,
    rhs: ExprId,
    span: Span,
) -> Result<bool, EvalError> {
    let (lt, rt) = (ev.ty(lhs), ev.ty(rhs));

    // connectives only look at the right operand when they must
    if lt.is_bool() && rt.is_bool() && !lt.is_opt() && !rt.is_opt() {
        match op {
            BinOpKind::And => return Ok(ev.eval::<BoolKind>(lhs)? && ev.eval::<BoolKind>(rhs)?),
            BinOpKind::Or => return Ok(ev.eval::<BoolKind>(lhs)? || ev.eval::<BoolKind>(rhs)?),
            BinOpKind::Impl => return Ok(!ev.eval::<BoolKind>(lhs)? || ev.eval::<BoolKind>(rhs)?),
            BinOpKind::RImpl => return Ok(!ev.eval::<BoolKind>(rhs)? || ev.eval::<BoolKind>(lhs)?),
            _ => {}
        }
    }

    let l = ev.par(lhs)?;
    let r = ev.par(rhs)?;
    let model = &*ev.model;
    let (lk, rk) = (&model.exprs[l].kind, &model.exprs[r].kind);

    if matches!(op, BinOpKind::Eq | BinOpKind::Ne)
        && (matches!(lk, ExprKind::Absent) || matches!(rk, ExprKind::Absent))
    {
        let both = matches!(lk, ExprKind::Absent) && matches!(rk, ExprKind::Absent);
        return Ok(both == (op == BinOpKind::Eq));
    }

    match (lk, rk) {
        (ExprKind::BoolLit(a), ExprKind::BoolLit(b)) => {
            let (a, b) = (*a, *b);
            match op {
                BinOpKind::Equiv => Ok(a == b),
                BinOpKind::Xor => Ok(a != b),
                BinOpKind::And => Ok(a && b),
                BinOpKind::Or => Ok(a || b),
                BinOpKind::Impl => Ok(!a || b),
                BinOpKind::RImpl => Ok(!b || a),
                _ => compare(op, Some(a.cmp(&b)), span),
            }
        }
        (ExprKind::IntLit(a), ExprKind::IntLit(b)) => compare(op, Some(a.cmp(b)), span),
        (ExprKind::FloatLit(a), ExprKind::FloatLit(b)) => compare(op, a.partial_cmp(b), span),
        (ExprKind::StringLit(a), ExprKind::StringLit(b)) => compare(op, Some(a.cmp(b)), span),
        (ExprKind::IntLit(v), ExprKind::IntSetLit(s)) if op == BinOpKind::In => Ok(s.contains(*v)),
        (ExprKind::BoolLit(v), ExprKind::IntSetLit(s)) if op == BinOpKind::In => {
            Ok(s.contains(i64::from(*v)))
        }
        (ExprKind::IntSetLit(a), ExprKind::IntSetLit(b)) => match op {
            BinOpKind::Subset => Ok(a.is_subset_of(b)),
            BinOpKind::Superset => Ok(b.is_subset_of(a)),
            _ => compare(op, Some(a.values().cmp(b.values())), span),
        },
        (ExprKind::ArrayLit { elems: a, .. }, ExprKind::ArrayLit { elems: b, .. })
            if matches!(op, BinOpKind::Eq | BinOpKind::Ne) =>
        {
            let equal = a.len() == b.len() && a.iter().zip(b).all(|(x, y)| model.expr_equal(*x, *y));
            Ok(equal == (op == BinOpKind::Eq))
        }
        _ if lt.is_ann() && matches!(op, BinOpKind::Eq | BinOpKind::Ne) => {
            Ok(model.expr_equal(l, r) == (op == BinOpKind::Eq))
        }
        _ => Err(EvalError::not_kind(BoolKind::NAME, span)),
    }
}

fn compare(op: BinOpKind, ord: Option<Ordering>, span: Span) -> Result<bool, EvalError> {
    // unordered floats are only ever unequal
    let Some(ord) = ord else {
        return match op {
            BinOpKind::Lt | BinOpKind::Le | BinOpKind::Gt | BinOpKind::Ge | BinOpKind::Eq => Ok(false),
            BinOpKind::Ne => Ok(true),
            _ => Err(EvalError::not_kind(BoolKind::NAME, span)),
        };
    };
    match op {
        BinOpKind::Lt => Ok(ord.is_lt()),
        BinOpKind::Le => Ok(ord.is_le()),
        BinOpKind::Gt => Ok(ord.is_gt()),
        BinOpKind::Ge => Ok(ord.is_ge()),
        BinOpKind::Eq => Ok(ord.is_eq()),
        BinOpKind::Ne => Ok(ord.is_ne()),
        _ => Err(EvalError::not_kind(BoolKind::NAME, span)),
    }
}

// ── string ───────────────────────────────────────────────────────

pub(crate) struct StringKind;

impl EvalKind for StringKind {
    type Val = String;
    const NAME: &'static str = "a string";

    fn literal(model: &Model, e: ExprId) -> Option<String> {
        match &model.exprs[e].kind {
            ExprKind::StringLit(s) => Some(s.to_string()),
            _ => None,
        }
    }

    fn store(model: &mut Model, v: &String) -> ExprId {
        model.string(v.as_str())
    }

    fn node(ev: &mut Evaluator<'_>, e: ExprId) -> Result<String, EvalError> {
        let span = ev.span(e);
        match ev.model.exprs[e].kind.clone() {
            ExprKind::BinOp {
                op: BinOpKind::PlusPlus,
                lhs,
                rhs,
                ..
            } => {
                let mut s = ev.eval::<StringKind>(lhs)?;
                s.push_str(&ev.eval::<StringKind>(rhs)?);
                Ok(s)
            }
            _ => Err(EvalError::not_kind(Self::NAME, span)),
        }
    }

    fn native(ev: &mut Evaluator<'_>, name: &str, args: &[ExprId], span: Span) -> Result<String, EvalError> {
        builtins::string(ev, name, args, span)
    }
}

// ── sets ─────────────────────────────────────────────────────────

pub(crate) struct IntSetKind;

impl EvalKind for IntSetKind {
    type Val = IntSetVal;
    const NAME: &'static str = "a set of int";

    fn literal(model: &Model, e: ExprId) -> Option<IntSetVal> {
        match &model.exprs[e].kind {
            ExprKind::IntSetLit(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn store(model: &mut Model, v: &IntSetVal) -> ExprId {
        model.int_set(v.clone())
    }

    fn node(ev: &mut Evaluator<'_>, e: ExprId) -> Result<IntSetVal, EvalError> {
        let span = ev.span(e);
        match ev.model.exprs[e].kind.clone() {
            ExprKind::SetLit(elems) | ExprKind::ArrayLit { elems, .. } => {
                let mut values = Vec::with_capacity(elems.len());
                for x in elems {
                    values.push(ev.eval::<IntKind>(x)?);
                }
                Ok(IntSetVal::from_values(values))
            }
            ExprKind::Comprehension(c) => {
                let values = ev.comprehension(&c, |ev, body| ev.eval::<IntKind>(body))?;
                Ok(IntSetVal::from_values(values))
            }
            ExprKind::BinOp {
                op: BinOpKind::DotDot,
                lhs,
                rhs,
                ..
            } => {
                let lo = ev.eval::<IntKind>(lhs)?;
                let hi = ev.eval::<IntKind>(rhs)?;
                Ok(IntSetVal::range(lo, hi))
            }
            ExprKind::BinOp { op, lhs, rhs, .. } => {
                let a = ev.eval::<IntSetKind>(lhs)?;
                let b = ev.eval::<IntSetKind>(rhs)?;
                set_op(op, &a, &b).ok_or_else(|| EvalError::not_kind(Self::NAME, span))
            }
            _ => Err(EvalError::not_kind(Self::NAME, span)),
        }
    }

    fn native(ev: &mut Evaluator<'_>, name: &str, args: &[ExprId], span: Span) -> Result<IntSetVal, EvalError> {
        builtins::int_set(ev, name, args, span)
    }
}

pub(crate) fn set_op(op: BinOpKind, a: &IntSetVal, b: &IntSetVal) -> Option<IntSetVal> {
    match op {
        BinOpKind::Union => Some(a.union(b)),
        BinOpKind::Intersect => Some(a.intersect(b)),
        BinOpKind::Diff => Some(a.diff(b)),
        BinOpKind::SymDiff => Some(a.symdiff(b)),
        _ => None,
    }
}

/// Sets of bool, with `false` as 0 and `true` as 1.
pub(crate) struct BoolSetKind;

impl EvalKind for BoolSetKind {
    type Val = IntSetVal;
    const NAME: &'static str = "a set of bool";

    fn literal(model: &Model, e: ExprId) -> Option<IntSetVal> {
        IntSetKind::literal(model, e)
    }

    fn store(model: &mut Model, v: &IntSetVal) -> ExprId {
        let e = model.int_set(v.clone());
        model.exprs[e].ty = Type::par_set_bool();
        e
    }

    fn node(ev: &mut Evaluator<'_>, e: ExprId) -> Result<IntSetVal, EvalError> {
        let span = ev.span(e);
        match ev.model.exprs[e].kind.clone() {
            ExprKind::SetLit(elems) | ExprKind::ArrayLit { elems, .. } => {
                let mut values = Vec::with_capacity(elems.len());
                for x in elems {
                    values.push(i64::from(ev.eval::<BoolKind>(x)?));
                }
                Ok(IntSetVal::from_values(values))
            }
            ExprKind::Comprehension(c) => {
                let values = ev.comprehension(&c, |ev, body| ev.eval::<BoolKind>(body))?;
                Ok(IntSetVal::from_values(values.into_iter().map(i64::from)))
            }
            ExprKind::BinOp { op, lhs, rhs, .. } => {
                let a = ev.eval::<BoolSetKind>(lhs)?;
                let b = ev.eval::<BoolSetKind>(rhs)?;
                set_op(op, &a, &b).ok_or_else(|| EvalError::not_kind(Self::NAME, span))
            }
            _ => Err(EvalError::not_kind(Self::NAME, span)),
        }
    }

    fn native(_ev: &mut Evaluator<'_>, name: &str, _args: &[ExprId], span: Span) -> Result<IntSetVal, EvalError> {
        Err(builtins::missing(name, span))
    }
}

// ── arrays ───────────────────────────────────────────────────────

/// Arrays evaluate to an array literal node; elements stay unevaluated.
pub(crate) struct ArrayKind;

impl EvalKind for ArrayKind {
    type Val = ExprId;
    const NAME: &'static str = "an array";

    fn literal(model: &Model, e: ExprId) -> Option<ExprId> {
        match model.exprs[e].kind {
            ExprKind::ArrayLit { .. } => Some(e),
            _ => None,
        }
    }

    fn store(_model: &mut Model, v: &ExprId) -> ExprId {
        *v
    }

    fn node(ev: &mut Evaluator<'_>, e: ExprId) -> Result<ExprId, EvalError> {
        let (span, ty) = (ev.span(e), ev.ty(e));
        match ev.model.exprs[e].kind.clone() {
            ExprKind::Comprehension(c) if !c.is_set => {
                let elems = ev.comprehension(&c, |ev, body| ev.par(body))?;
                Ok(ev.array_lit(elems, None, ty, span))
            }
            ExprKind::BinOp {
                op: BinOpKind::PlusPlus,
                lhs,
                rhs,
                ..
            } => {
                let (mut elems, _) = ev.array_elems(lhs)?;
                let (tail, _) = ev.array_elems(rhs)?;
                elems.extend(tail);
                Ok(ev.array_lit(elems, None, ty, span))
            }
            _ => Err(EvalError::not_kind(Self::NAME, span)),
        }
    }

    fn native(ev: &mut Evaluator<'_>, name: &str, args: &[ExprId], span: Span) -> Result<ExprId, EvalError> {
        builtins::array(ev, name, args, span)
    }
}
