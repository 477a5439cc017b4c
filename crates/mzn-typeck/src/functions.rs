//! Function table: overload ordering, matching, and the argument and
//! return type rules of a matched declaration.

use mzn_ast::*;
use smol_str::SmolStr;
use std::collections::HashMap;
use tracing::trace;

use crate::error::TypeError;

/// Declared type of a parameter. Falls back to the type-inst while the
/// parameter has not been through pass 1 yet.
fn param_type(model: &Model, p: DeclId) -> Type {
    let decl = &model.decls[p];
    if decl.ty.is_unknown() {
        model.type_insts[decl.ti].ty
    } else {
        decl.ty
    }
}

/// Name of the type-inst variable in a parameter's domain (`$T`).
fn ti_var(model: &Model, ti: TypeInstId) -> Option<SmolStr> {
    let domain = model.type_insts[ti].domain?;
    match &model.exprs[domain].kind {
        ExprKind::TiId(name) => Some(name.clone()),
        _ => None,
    }
}

/// Ordering key of one parameter: par before var, narrower base first,
/// then set-ness, optionality and rank (generic rank last).
fn param_key(t: Type) -> (u8, u8, u8, u8, i32) {
    let base = match t.base() {
        BaseType::Bot => 0,
        BaseType::Bool => 1,
        BaseType::Int => 2,
        BaseType::Float => 3,
        BaseType::String => 4,
        BaseType::Ann => 5,
        BaseType::Top => 6,
        BaseType::Unknown => 7,
    };
    let dim = if t.dim() < 0 { i32::MAX } else { t.dim() };
    (
        t.inst() as u8,
        base,
        t.set_type() as u8,
        t.opt() as u8,
        dim,
    )
}

/// Sort every overload list so the first match is the most specific one.
pub fn sort_overloads(model: &mut Model) {
    let mut table = std::mem::take(&mut model.fn_table);
    for overloads in table.values_mut() {
        overloads.sort_by_cached_key(|f| {
            let params = &model.functions[*f].params;
            (
                params.len(),
                params
                    .iter()
                    .map(|p| param_key(param_type(model, *p)))
                    .collect::<Vec<_>>(),
            )
        });
    }
    model.fn_table = table;
}

/// First overload of `name` whose parameters accept `args`.
pub fn match_fn(model: &Model, name: &str, args: &[Type]) -> Option<FnId> {
    let overloads = model.fn_table.get(name)?;
    let found = overloads.iter().copied().find(|f| {
        let params = &model.functions[*f].params;
        params.len() == args.len()
            && params
                .iter()
                .zip(args)
                .all(|(p, a)| a.is_subtype_of(param_type(model, *p)))
    });
    if let Some(f) = found {
        trace!(name, overload = ?f, "matched function");
    }
    found
}

/// Type an argument is coerced to when passed as parameter `i` of `f`.
pub fn arg_type(model: &Model, f: FnId, args: &[Type], i: usize) -> Type {
    let p = model.functions[f].params[i];
    let pt = param_type(model, p);
    let at = args[i];
    let dim = if pt.dim() == -1 { at.dim() } else { pt.dim() };
    if ti_var(model, model.decls[p].ti).is_some() || pt.base() == BaseType::Top {
        at.with_set(pt.set_type()).with_dim(dim)
    } else {
        pt.with_dim(dim)
    }
}

/// Result type of calling `f` with arguments of types `args`: type-inst
/// variables in the return type take the types bound by the arguments.
pub fn return_type(model: &Model, f: FnId, args: &[Type], span: Span) -> Result<Type, TypeError> {
    let func = &model.functions[f];
    let mut ret = model.type_insts[func.ret].ty;
    let mut bound: HashMap<SmolStr, Type> = HashMap::new();
    let mut generic_rank = None;

    for (p, at) in func.params.iter().zip(args) {
        let pti = model.decls[*p].ti;
        let pt = param_type(model, *p);
        if let Some(name) = ti_var(model, pti) {
            let mut elem = at.elem();
            if pt.set_type() == SetType::Set {
                elem = elem.with_set(SetType::Plain);
            }
            bound
                .entry(name)
                .and_modify(|prev| {
                    if prev.base().is_subtype_of(elem.base()) {
                        *prev = prev.with_base(elem.base());
                    }
                    if elem.is_var() {
                        *prev = prev.with_inst(Inst::Var);
                    }
                })
                .or_insert(elem);
        }
        if pt.dim() == -1 && generic_rank.is_none() {
            generic_rank = Some(at.dim());
        }
    }

    if let Some(name) = ti_var(model, func.ret) {
        let t = bound.get(&name).ok_or_else(|| {
            TypeError::new(
                format!("type-inst variable ${} used but not defined", name),
                span,
            )
        })?;
        ret = ret.with_base(t.base());
        if ret.set_type() == SetType::Plain {
            ret = ret.with_set(t.set_type());
        }
        if t.is_var() && ret.dim() == 0 {
            ret = ret.with_inst(Inst::Var);
        }
    }
    if ret.dim() == -1 {
        ret = ret.with_dim(generic_rank.unwrap_or(1));
    }
    Ok(ret)
}
