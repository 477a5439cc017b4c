//! Builtins without a body in the model, dispatched by name.

use mzn_ast::*;

use crate::error::{EvalError, EvalErrorKind};
use crate::kinds::{int_arith, BoolKind, BoolSetKind, FloatKind, IntKind, IntSetKind, StringKind};
use crate::Evaluator;

pub(crate) fn missing(name: &str, span: Span) -> EvalError {
    EvalError::new(
        EvalErrorKind::MissingBuiltin,
        format!("internal error: missing builtin `{}'", name),
        span,
    )
}

fn empty_array(name: &str, span: Span) -> EvalError {
    EvalError::new(
        EvalErrorKind::CannotEvaluate,
        format!("`{}' of an empty array", name),
        span,
    )
}

/// The coefficient and variable arrays of `lin_exp` must line up.
fn check_lengths(coeffs: usize, xs: usize, span: Span) -> Result<(), EvalError> {
    if coeffs == xs {
        return Ok(());
    }
    Err(EvalError::new(
        EvalErrorKind::CannotEvaluate,
        format!("`lin_exp' with {} coefficients for {} variables", coeffs, xs),
        span,
    ))
}

pub(crate) fn int(ev: &mut Evaluator<'_>, name: &str, args: &[ExprId], span: Span) -> Result<i64, EvalError> {
    match (name, args) {
        ("bool2int", [b]) => Ok(i64::from(ev.eval::<BoolKind>(*b)?)),
        ("abs", [x]) => ev
            .eval::<IntKind>(*x)?
            .checked_abs()
            .ok_or_else(|| EvalError::overflow(span)),
        ("min" | "max", [a, b]) => {
            let a = ev.eval::<IntKind>(*a)?;
            let b = ev.eval::<IntKind>(*b)?;
            Ok(if name == "min" { a.min(b) } else { a.max(b) })
        }
        ("min" | "max", [arr]) => {
            let values = int_values(ev, *arr)?;
            let m = if name == "min" {
                values.iter().min()
            } else {
                values.iter().max()
            };
            m.copied().ok_or_else(|| empty_array(name, span))
        }
        ("sum", [arr]) => int_values(ev, *arr)?
            .into_iter()
            .try_fold(0i64, |acc, v| acc.checked_add(v))
            .ok_or_else(|| EvalError::overflow(span)),
        ("product", [arr]) => int_values(ev, *arr)?
            .into_iter()
            .try_fold(1i64, |acc, v| acc.checked_mul(v))
            .ok_or_else(|| EvalError::overflow(span)),
        ("lin_exp", [coeffs, xs, c]) => {
            let coeffs = int_values(ev, *coeffs)?;
            let xs = int_values(ev, *xs)?;
            check_lengths(coeffs.len(), xs.len(), span)?;
            let c = ev.eval::<IntKind>(*c)?;
            coeffs
                .iter()
                .zip(&xs)
                .try_fold(c, |acc, (a, x)| acc.checked_add(a.checked_mul(*x)?))
                .ok_or_else(|| EvalError::overflow(span))
        }
        ("int_times", [a, b]) => {
            let a = ev.eval::<IntKind>(*a)?;
            let b = ev.eval::<IntKind>(*b)?;
            int_arith(BinOpKind::Mult, a, b, span)
        }
        ("card", [s]) => {
            let set = if ev.ty(*s).base() == BaseType::Bool {
                ev.eval::<BoolSetKind>(*s)?
            } else {
                ev.eval::<IntSetKind>(*s)?
            };
            i64::try_from(set.card()).map_err(|_| EvalError::overflow(span))
        }
        ("length", [arr]) => {
            let (elems, _) = ev.array_elems(*arr)?;
            i64::try_from(elems.len()).map_err(|_| EvalError::overflow(span))
        }
        _ => Err(missing(name, span)),
    }
}

pub(crate) fn float(ev: &mut Evaluator<'_>, name: &str, args: &[ExprId], span: Span) -> Result<f64, EvalError> {
    match (name, args) {
        ("int2float", [x]) => Ok(ev.eval::<IntKind>(*x)? as f64),
        ("bool2float", [b]) => Ok(if ev.eval::<BoolKind>(*b)? { 1.0 } else { 0.0 }),
        ("abs", [x]) => Ok(ev.eval::<FloatKind>(*x)?.abs()),
        ("min" | "max", [a, b]) => {
            let a = ev.eval::<FloatKind>(*a)?;
            let b = ev.eval::<FloatKind>(*b)?;
            Ok(if name == "min" { a.min(b) } else { a.max(b) })
        }
        ("min" | "max", [arr]) => {
            let values = float_values(ev, *arr)?;
            let pick = if name == "min" { f64::min } else { f64::max };
            values
                .into_iter()
                .reduce(pick)
                .ok_or_else(|| empty_array(name, span))
        }
        ("sum", [arr]) => Ok(float_values(ev, *arr)?.into_iter().sum()),
        ("product", [arr]) => Ok(float_values(ev, *arr)?.into_iter().product()),
        ("lin_exp", [coeffs, xs, c]) => {
            let coeffs = float_values(ev, *coeffs)?;
            let xs = float_values(ev, *xs)?;
            check_lengths(coeffs.len(), xs.len(), span)?;
            let c = ev.eval::<FloatKind>(*c)?;
            Ok(coeffs.iter().zip(&xs).fold(c, |acc, (a, x)| acc + a * x))
        }
        _ => Err(missing(name, span)),
    }
}

pub(crate) fn bool(ev: &mut Evaluator<'_>, name: &str, args: &[ExprId], span: Span) -> Result<bool, EvalError> {
    match (name, args) {
        ("forall", [arr]) => {
            let (elems, _) = ev.array_elems(*arr)?;
            for x in elems {
                if !ev.eval::<BoolKind>(x)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        ("exists", [arr]) => {
            let (elems, _) = ev.array_elems(*arr)?;
            for x in elems {
                if ev.eval::<BoolKind>(x)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        _ => Err(missing(name, span)),
    }
}

pub(crate) fn string(ev: &mut Evaluator<'_>, name: &str, args: &[ExprId], span: Span) -> Result<String, EvalError> {
    match (name, args) {
        ("show", [x]) => {
            let v = ev.par(*x)?;
            show(&*ev.model, v).ok_or_else(|| {
                EvalError::new(
                    EvalErrorKind::CannotEvaluate,
                    "cannot show a value that is not fixed",
                    span,
                )
            })
        }
        ("concat", [arr]) => {
            let (elems, _) = ev.array_elems(*arr)?;
            let mut out = String::new();
            for x in elems {
                out.push_str(&ev.eval::<StringKind>(x)?);
            }
            Ok(out)
        }
        _ => Err(missing(name, span)),
    }
}

pub(crate) fn int_set(
    ev: &mut Evaluator<'_>,
    name: &str,
    args: &[ExprId],
    span: Span,
) -> Result<IntSetVal, EvalError> {
    match (name, args) {
        ("set_union" | "set_intersect" | "set_diff", [a, b]) => {
            let a = ev.eval::<IntSetKind>(*a)?;
            let b = ev.eval::<IntSetKind>(*b)?;
            Ok(match name {
                "set_union" => a.union(&b),
                "set_intersect" => a.intersect(&b),
                _ => a.diff(&b),
            })
        }
        _ => Err(missing(name, span)),
    }
}

pub(crate) fn array(ev: &mut Evaluator<'_>, name: &str, args: &[ExprId], span: Span) -> Result<ExprId, EvalError> {
    match (name, args) {
        ("set2array", [s]) => {
            let set = ev.eval::<IntSetKind>(*s)?;
            let elems = set.values().collect::<Vec<_>>();
            let elems = elems.into_iter().map(|v| ev.model.int(v)).collect();
            Ok(ev.array_lit(elems, None, Type::par_int().with_dim(1), span))
        }
        _ => Err(missing(name, span)),
    }
}

fn int_values(ev: &mut Evaluator<'_>, arr: ExprId) -> Result<Vec<i64>, EvalError> {
    let (elems, _) = ev.array_elems(arr)?;
    elems.into_iter().map(|x| ev.eval::<IntKind>(x)).collect()
}

fn float_values(ev: &mut Evaluator<'_>, arr: ExprId) -> Result<Vec<f64>, EvalError> {
    let (elems, _) = ev.array_elems(arr)?;
    elems.into_iter().map(|x| ev.eval::<FloatKind>(x)).collect()
}

/// Render a fixed value the way `show` prints it; `None` if it is not fixed.
pub(crate) fn show(model: &Model, e: ExprId) -> Option<String> {
    let expr = &model.exprs[e];
    match &expr.kind {
        ExprKind::IntLit(v) => Some(v.to_string()),
        ExprKind::FloatLit(v) => {
            if v.fract() == 0.0 && v.is_finite() {
                Some(format!("{:.1}", v))
            } else {
                Some(v.to_string())
            }
        }
        ExprKind::BoolLit(b) => Some(b.to_string()),
        ExprKind::StringLit(s) => Some(format!("{:?}", s.as_str())),
        ExprKind::Absent => Some("<>".to_string()),
        ExprKind::IntSetLit(s) if expr.ty.base() == BaseType::Bool => {
            let items: Vec<_> = s.values().map(|v| (v != 0).to_string()).collect();
            Some(format!("{{{}}}", items.join(",")))
        }
        ExprKind::IntSetLit(s) => Some(s.to_string()),
        ExprKind::ArrayLit { elems, .. } => {
            let items = elems
                .iter()
                .map(|x| show(model, *x))
                .collect::<Option<Vec<_>>>()?;
            Some(format!("[{}]", items.join(", ")))
        }
        _ => None,
    }
}
