use mzn_ast::*;

use crate::error::TypeError;
use crate::functions::{match_fn, return_type};

/// Make `e` usable where a value of type `target` is expected, wrapping it
/// in `set2array` and/or a numeric widening call. Returns the expression to
/// put in place of `e`.
pub fn add_coercion(model: &mut Model, e: ExprId, target: Type) -> Result<ExprId, TypeError> {
    let ty = model.exprs[e].ty;
    if ty.dim() == target.dim()
        && (matches!(target.base(), BaseType::Bot | BaseType::Top)
            || ty.base() == target.base()
            || ty.base() == BaseType::Bot)
    {
        return Ok(e);
    }
    let _lock = model.gc_lock();
    let span = model.exprs[e].span;

    let mut e = e;
    if ty.dim() == 0 && target.dim() != 0 {
        if ty.is_var() {
            return Err(TypeError::new("cannot coerce var set into array", span));
        }
        e = synthesize(model, "set2array", e)?;
    }

    let ty = model.exprs[e].ty;
    if target.base() == BaseType::Top || ty.base() == target.base() || ty.base() == BaseType::Bot {
        return Ok(e);
    }
    let widening = match (ty.base(), target.base()) {
        (BaseType::Bool, BaseType::Int) => "bool2int",
        (BaseType::Bool, BaseType::Float) => "bool2float",
        (BaseType::Int, BaseType::Float) => "int2float",
        _ => {
            return Err(TypeError::new(
                format!(
                    "cannot determine coercion from type {} to type {}",
                    ty, target
                ),
                span,
            ))
        }
    };
    synthesize(model, widening, e)
}

/// Unary call to a builtin, resolved and typed.
fn synthesize(model: &mut Model, name: &str, arg: ExprId) -> Result<ExprId, TypeError> {
    let (ty, span) = {
        let arg = &model.exprs[arg];
        (arg.ty, arg.span)
    };
    let f = match_fn(model, name, &[ty]).ok_or_else(|| {
        TypeError::new(
            format!(
                "no function or predicate with this signature found: `{}({})'",
                name, ty
            ),
            span,
        )
    })?;
    let rty = return_type(model, f, &[ty], span)?.with_cv(ty.cv());
    let call = model.alloc(
        ExprKind::Call {
            name: name.into(),
            args: vec![arg],
            decl: Some(f),
        },
        rty,
    );
    Ok(model.spanned(call, span))
}
