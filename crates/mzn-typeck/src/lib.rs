mod checker;
mod coerce;
mod error;
pub mod functions;
mod result;
pub mod stdlib;
mod topo;

pub use coerce::add_coercion;
pub use error::{TypeError, TypeErrorKind};
pub use result::TypeCheckResult;
pub use topo::TopoSorter;

use mzn_ast::*;
use tracing::{debug, debug_span};

use checker::{DeclMode, Typer};

#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Leave toplevel par declarations without a value unreported.
    pub ignore_undefined_parameters: bool,
    /// Declare the builtin operators and functions before checking.
    pub register_stdlib: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            ignore_undefined_parameters: false,
            register_stdlib: true,
        }
    }
}

/// Type-check a model with default options.
pub fn check(model: &mut Model) -> Result<TypeCheckResult, TypeError> {
    typecheck(model, &CheckOptions::default())
}

/// Resolve, order and type every item of `model`, inserting coercions.
///
/// Resolver errors (duplicate, undefined or circular identifiers) and
/// conflicting assignments abort with `Err`. All other errors are collected
/// per item in the result, and checking continues with the next item.
pub fn typecheck(model: &mut Model, opts: &CheckOptions) -> Result<TypeCheckResult, TypeError> {
    let _span = debug_span!("typecheck").entered();
    if opts.register_stdlib {
        stdlib::register(model);
    }

    let mut ts = TopoSorter::new();
    let mut errors = Vec::new();
    let mut fns = Vec::new();
    let mut assigns = Vec::new();
    let (mut solve_seen, mut output_seen) = (false, false);

    let paths = model.item_paths();
    for &path in &paths {
        let slot = model.slot(path);
        let span = slot.span;
        match slot.item.clone() {
            Item::VarDecl(d) => ts.add(model, d, true)?,
            Item::Function(f) => {
                model.register_fn(f);
                fns.push(f);
            }
            Item::Assign(_) => assigns.push(path),
            Item::Solve(_) => {
                if solve_seen {
                    errors.push(TypeError::new("Only one solve item allowed", span));
                }
                solve_seen = true;
            }
            Item::Output(_) => {
                if output_seen {
                    errors.push(TypeError::new("Only one output item allowed", span));
                }
                output_seen = true;
            }
            Item::Include(_) | Item::Constraint(_) => {}
        }
    }

    for path in assigns {
        merge_assignment(model, &ts, path)?;
    }

    for &path in &paths {
        if model.slot(path).removed {
            continue;
        }
        resolve_item(model, &mut ts, path)?;
    }
    debug!(decls = ts.decls.len(), functions = fns.len(), "resolved model");

    functions::sort_overloads(model);
    sort_root_items(model, &ts);

    // pass 1: declarations take the types of their type-insts
    let mut typer = Typer::new(model, DeclMode::Declare);
    for &d in &ts.decls {
        if let Err(e) = typer.declare(d) {
            typer.errors.push(e);
        }
    }
    for &f in &fns {
        if let Err(e) = typer.declare_function(f) {
            typer.errors.push(e);
        }
    }
    errors.append(&mut typer.errors);
    debug!(errors = errors.len(), "declarations typed");

    // pass 2: every item, bottom up
    let mut typer = Typer::new(model, DeclMode::Check);
    for path in typer.model.item_paths() {
        if let Err(e) = typer.check_item(path) {
            typer.errors.push(e);
        }
    }
    errors.append(&mut typer.errors);
    debug!(errors = errors.len(), "items checked");

    for &d in &ts.decls {
        let decl = &model.decls[d];
        if !decl.toplevel || !decl.ty.is_par() || decl.ty.is_ann() || decl.init.is_some() {
            continue;
        }
        if decl.ty.is_opt() {
            let absent = model.absent();
            model.decls[d].init = Some(absent);
        } else if !opts.ignore_undefined_parameters {
            errors.push(TypeError::new(
                format!(
                    "symbol error: variable `{}' must be defined (did you forget to specify a data file?)",
                    decl.name
                ),
                decl.span,
            ));
        }
    }

    Ok(TypeCheckResult {
        errors,
        decl_order: ts.decls,
    })
}

/// Type-check a single expression against an already checked model.
/// Fails on the first error.
pub fn typecheck_expr(model: &mut Model, e: ExprId) -> Result<Type, TypeError> {
    let _span = debug_span!("typecheck_expr").entered();
    let mut ts = toplevel_scope(model)?;
    ts.run(model, e)?;
    check_fresh(model, &ts.decls, |typer| typer.check_expr(e))?;
    Ok(model.exprs[e].ty)
}

/// Type-check an assignment item added after the model was checked, and
/// merge its value into the declaration it assigns. Fails on the first
/// error.
pub fn typecheck_assignment(model: &mut Model, path: ItemPath) -> Result<(), TypeError> {
    let _span = debug_span!("typecheck_assignment").entered();
    let span = model.slot(path).span;
    let Item::Assign(assign) = model.slot(path).item.clone() else {
        return Err(TypeError::new("not an assignment item", span));
    };
    let mut ts = toplevel_scope(model)?;
    let d = match assign.decl {
        Some(d) => d,
        None => ts.get(&assign.name, span)?,
    };
    ts.run(model, assign.value)?;
    check_fresh(model, &ts.decls, |typer| typer.check_expr(assign.value))?;

    let declared = model.decls[d].ty;
    let actual = model.exprs[assign.value].ty;
    if !actual.is_subtype_of(declared) {
        return Err(TypeError::new(
            format!(
                "assignment value for `{}' has invalid type-inst: expected `{}', actual `{}'",
                assign.name, declared, actual
            ),
            model.exprs[assign.value].span,
        ));
    }
    if model.decls[d].init.is_some() {
        return Err(TypeError::new("multiple assignment to the same variable", span));
    }
    let value = add_coercion(model, assign.value, declared)?;
    model.decls[d].init = Some(value);
    let slot = model.slot_mut(path);
    slot.removed = true;
    if let Item::Assign(a) = &mut slot.item {
        a.decl = Some(d);
    }
    Ok(())
}

// ── Driver helpers ───────────────────────────────────────────────

fn merge_assignment(model: &mut Model, ts: &TopoSorter, path: ItemPath) -> Result<(), TypeError> {
    let span = model.slot(path).span;
    let Item::Assign(assign) = model.slot(path).item.clone() else {
        return Ok(());
    };
    let d = ts.get(&assign.name, span)?;
    if model.decls[d].init.is_some() {
        return Err(TypeError::new("multiple assignment to the same variable", span));
    }
    model.decls[d].init = Some(assign.value);
    let slot = model.slot_mut(path);
    slot.removed = true;
    if let Item::Assign(a) = &mut slot.item {
        a.decl = Some(d);
    }
    Ok(())
}

fn resolve_item(model: &mut Model, ts: &mut TopoSorter, path: ItemPath) -> Result<(), TypeError> {
    match model.slot(path).item.clone() {
        Item::VarDecl(d) => ts.run_decl(model, d),
        Item::Constraint(e) | Item::Output(e) => ts.run(model, e),
        Item::Solve(solve) => {
            for a in solve.ann {
                ts.run(model, a)?;
            }
            match solve.goal {
                SolveGoal::Satisfy => Ok(()),
                SolveGoal::Minimize(e) | SolveGoal::Maximize(e) => ts.run(model, e),
            }
        }
        Item::Function(f) => {
            let func = model.functions[f].clone();
            ts.run_type_inst(model, func.ret)?;
            for &p in &func.params {
                ts.run_decl(model, p)?;
            }
            for &a in &func.ann {
                ts.run(model, a)?;
            }
            for &p in &func.params {
                ts.add(model, p, false)?;
            }
            let body = func.body.map(|b| ts.run(model, b)).transpose();
            for &p in &func.params {
                ts.remove(model, p);
            }
            body.map(|_| ())
        }
        Item::Include(_) | Item::Assign(_) => Ok(()),
    }
}

/// Includes first, then declarations in dependency order, then the rest.
fn sort_root_items(model: &mut Model, ts: &TopoSorter) {
    model.items.sort_by_key(|slot| match slot.item {
        Item::Include(_) => (0, 0),
        Item::VarDecl(d) => (1, ts.position(d).unwrap_or(usize::MAX)),
        _ => (2, 0),
    });
}

fn toplevel_scope(model: &mut Model) -> Result<TopoSorter, TypeError> {
    stdlib::register(model);
    functions::sort_overloads(model);
    let mut ts = TopoSorter::new();
    for path in model.item_paths() {
        if let Item::VarDecl(d) = model.slot(path).item {
            ts.add(model, d, true)?;
        }
    }
    Ok(ts)
}

/// Declare whatever the resolver reached that has no type yet (let
/// variables of the new expression), then run `f` in checking mode.
fn check_fresh(
    model: &mut Model,
    decls: &[DeclId],
    f: impl FnOnce(&mut Typer) -> Result<(), TypeError>,
) -> Result<(), TypeError> {
    let mut typer = Typer::new(model, DeclMode::Declare);
    for &d in decls {
        if typer.model.decls[d].ty.is_unknown() {
            typer.declare(d)?;
        }
    }
    let mut typer = Typer::new(model, DeclMode::Check);
    f(&mut typer)?;
    match typer.errors.into_iter().next() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests;
