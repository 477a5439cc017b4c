//! Constant evaluation of typed model expressions.
//!
//! The evaluator works directly on the model arena. Declarations are bound
//! by setting their initializer: function parameters, let variables and
//! comprehension generators are saved, rebound and restored around their
//! scope. Toplevel and array declarations are memoized by replacing their
//! initializer with the evaluated literal.

mod bounds;
mod builtins;
mod error;
mod kinds;

pub use bounds::{FloatBounds, IntBounds, IntVal};
pub use error::{EvalError, EvalErrorKind, Frame};

use mzn_ast::*;
use tracing::{debug_span, trace};

use kinds::{ArrayKind, BoolKind, BoolSetKind, EvalKind, FloatKind, IntKind, IntSetKind, StringKind};

#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Nesting limit for calls to functions with a body.
    pub max_call_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self { max_call_depth: 256 }
    }
}

/// Saved binding of a declaration, restored when its scope ends.
#[derive(Debug, Clone, Copy)]
struct Saved {
    decl: DeclId,
    init: Option<ExprId>,
    flat: Option<DeclId>,
    evaluated: bool,
}

pub struct Evaluator<'m> {
    pub(crate) model: &'m mut Model,
    opts: EvalOptions,
    depth: usize,
}

// ── Entry points ─────────────────────────────────────────────────

pub fn eval_int(model: &mut Model, e: ExprId) -> Result<i64, EvalError> {
    Evaluator::new(model).eval_int(e)
}

pub fn eval_bool(model: &mut Model, e: ExprId) -> Result<bool, EvalError> {
    Evaluator::new(model).eval_bool(e)
}

pub fn eval_float(model: &mut Model, e: ExprId) -> Result<f64, EvalError> {
    Evaluator::new(model).eval_float(e)
}

pub fn eval_string(model: &mut Model, e: ExprId) -> Result<String, EvalError> {
    Evaluator::new(model).eval_string(e)
}

pub fn eval_intset(model: &mut Model, e: ExprId) -> Result<IntSetVal, EvalError> {
    Evaluator::new(model).eval_intset(e)
}

pub fn eval_boolset(model: &mut Model, e: ExprId) -> Result<IntSetVal, EvalError> {
    Evaluator::new(model).eval_boolset(e)
}

pub fn eval_array(model: &mut Model, e: ExprId) -> Result<ExprId, EvalError> {
    Evaluator::new(model).eval_array(e)
}

pub fn eval_par(model: &mut Model, e: ExprId) -> Result<ExprId, EvalError> {
    Evaluator::new(model).eval_par(e)
}

pub fn compute_int_bounds(model: &mut Model, e: ExprId) -> IntBounds {
    Evaluator::new(model).int_bounds(e)
}

pub fn compute_float_bounds(model: &mut Model, e: ExprId) -> FloatBounds {
    Evaluator::new(model).float_bounds(e)
}

pub fn compute_intset_bounds(model: &mut Model, e: ExprId) -> Option<IntSetVal> {
    Evaluator::new(model).intset_bounds(e)
}

impl<'m> Evaluator<'m> {
    pub fn new(model: &'m mut Model) -> Self {
        Self::with_options(model, EvalOptions::default())
    }

    pub fn with_options(model: &'m mut Model, opts: EvalOptions) -> Self {
        Self {
            model,
            opts,
            depth: 0,
        }
    }

    pub fn model(&self) -> &Model {
        &*self.model
    }

    pub fn eval_int(&mut self, e: ExprId) -> Result<i64, EvalError> {
        let _span = debug_span!("eval_int").entered();
        self.eval::<IntKind>(e)
    }

    pub fn eval_bool(&mut self, e: ExprId) -> Result<bool, EvalError> {
        let _span = debug_span!("eval_bool").entered();
        self.eval::<BoolKind>(e)
    }

    pub fn eval_float(&mut self, e: ExprId) -> Result<f64, EvalError> {
        let _span = debug_span!("eval_float").entered();
        self.eval::<FloatKind>(e)
    }

    pub fn eval_string(&mut self, e: ExprId) -> Result<String, EvalError> {
        let _span = debug_span!("eval_string").entered();
        self.eval::<StringKind>(e)
    }

    pub fn eval_intset(&mut self, e: ExprId) -> Result<IntSetVal, EvalError> {
        let _span = debug_span!("eval_intset").entered();
        self.eval::<IntSetKind>(e)
    }

    /// Set of bool, with `false` as 0 and `true` as 1.
    pub fn eval_boolset(&mut self, e: ExprId) -> Result<IntSetVal, EvalError> {
        let _span = debug_span!("eval_boolset").entered();
        self.eval::<BoolSetKind>(e)
    }

    /// Evaluate to an array literal. The elements are not evaluated; use
    /// [`Evaluator::eval_par`] for that.
    pub fn eval_array(&mut self, e: ExprId) -> Result<ExprId, EvalError> {
        let _span = debug_span!("eval_array").entered();
        self.eval::<ArrayKind>(e)
    }

    /// Evaluate every fixed part of `e`. Fixed expressions become literals;
    /// expressions over decision variables are rebuilt around their
    /// evaluated fixed parts.
    pub fn eval_par(&mut self, e: ExprId) -> Result<ExprId, EvalError> {
        let _span = debug_span!("eval_par").entered();
        self.par(e)
    }
}

// ── Shared rules ─────────────────────────────────────────────────

impl Evaluator<'_> {
    pub(crate) fn ty(&self, e: ExprId) -> Type {
        self.model.exprs[e].ty
    }

    pub(crate) fn span(&self, e: ExprId) -> Span {
        self.model.exprs[e].span
    }

    pub(crate) fn eval<K: EvalKind>(&mut self, e: ExprId) -> Result<K::Val, EvalError> {
        if let Some(v) = K::redirect(self, e) {
            return v;
        }
        if let Some(v) = K::literal(&*self.model, e) {
            return Ok(v);
        }
        let span = self.span(e);
        match self.model.exprs[e].kind.clone() {
            ExprKind::Id { name, decl } => self
                .eval_id::<K>(decl, &name, span)
                .map_err(|err| err.within(span, format!("evaluating `{}'", name))),
            ExprKind::Ite {
                branches,
                else_branch,
            } => {
                let taken = self.select_branch(&branches, else_branch)?;
                self.eval::<K>(taken)
            }
            ExprKind::ArrayAccess { array, indices } => {
                let elem = self.access(array, &indices, span)?;
                self.eval::<K>(elem)
            }
            ExprKind::Let(l) => self
                .with_let(&l, |ev| ev.eval::<K>(l.body))
                .map_err(|err| err.within(span, "let expression")),
            ExprKind::Call { name, args, decl } => {
                let result = match self.with_body(decl) {
                    Some(f) => self.call_fn(f, &args, span, |ev, body| ev.eval::<K>(body)),
                    None => K::native(self, &name, &args, span),
                };
                result.map_err(|err| err.within(span, format!("call to `{}'", name)))
            }
            ExprKind::BinOp {
                op,
                lhs,
                rhs,
                decl: Some(f),
            } => self
                .call_fn(f, &[lhs, rhs], span, |ev, body| ev.eval::<K>(body))
                .map_err(|err| err.within(span, format!("operator `{}'", op.as_str()))),
            ExprKind::UnOp {
                op,
                arg,
                decl: Some(f),
            } => self
                .call_fn(f, &[arg], span, |ev, body| ev.eval::<K>(body))
                .map_err(|err| err.within(span, format!("operator `{}'", op.as_str()))),
            _ => K::node(self, e),
        }
    }

    fn decl_of(&self, decl: Option<DeclId>, name: &str, span: Span) -> Result<DeclId, EvalError> {
        decl.ok_or_else(|| {
            EvalError::new(
                EvalErrorKind::UndeclaredIdentifier,
                format!("undeclared identifier `{}'", name),
                span,
            )
        })
    }

    fn eval_id<K: EvalKind>(
        &mut self,
        decl: Option<DeclId>,
        name: &str,
        span: Span,
    ) -> Result<K::Val, EvalError> {
        let d = self.decl_of(decl, name, span)?;
        let d = self.model.follow_flat(d);
        let Some(init) = self.model.decls[d].init else {
            return Err(EvalError::new(
                EvalErrorKind::CannotEvaluate,
                format!("cannot evaluate expression `{}'", name),
                span,
            ));
        };
        let v = self.eval::<K>(init)?;
        let decl = &self.model.decls[d];
        if !decl.evaluated && (decl.toplevel || decl.ty.dim() > 0) {
            let lit = K::store(self.model, &v);
            let decl = &mut self.model.decls[d];
            decl.init = Some(lit);
            decl.evaluated = true;
            trace!(name, "memoized");
        }
        Ok(v)
    }

    fn select_branch(&mut self, branches: &[(ExprId, ExprId)], else_branch: ExprId) -> Result<ExprId, EvalError> {
        for &(cond, then) in branches {
            if self.eval::<BoolKind>(cond)? {
                return Ok(then);
            }
        }
        Ok(else_branch)
    }

    fn with_body(&self, decl: Option<FnId>) -> Option<FnId> {
        decl.filter(|&f| self.model.functions[f].body.is_some())
    }

    // ── Bindings ─────────────────────────────────────────────────

    fn bind(&mut self, d: DeclId, value: Option<ExprId>) -> Saved {
        let decl = &mut self.model.decls[d];
        let saved = Saved {
            decl: d,
            init: decl.init,
            flat: decl.flat,
            evaluated: decl.evaluated,
        };
        decl.init = value;
        decl.flat = None;
        decl.evaluated = false;
        saved
    }

    fn restore(&mut self, saved: Vec<Saved>) {
        for s in saved.into_iter().rev() {
            let decl = &mut self.model.decls[s.decl];
            decl.init = s.init;
            decl.flat = s.flat;
            decl.evaluated = s.evaluated;
        }
    }

    /// Run `f` with the let's declarations bound to their original
    /// initializers. Constraints of the let do not take part.
    fn with_let<T>(
        &mut self,
        l: &Let,
        f: impl FnOnce(&mut Self) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        let mut saved = Vec::new();
        for (i, item) in l.items.iter().enumerate() {
            if let LetItem::Decl(d) = *item {
                let init = l.orig.get(i).copied().flatten().or(self.model.decls[d].init);
                saved.push(self.bind(d, init));
            }
        }
        let result = f(self);
        self.restore(saved);
        result
    }

    /// Call `f`: arguments are evaluated in the caller's bindings, then
    /// bound to the parameters for the duration of the body.
    fn call_fn<T>(
        &mut self,
        f: FnId,
        args: &[ExprId],
        span: Span,
        body_eval: impl FnOnce(&mut Self, ExprId) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        let func = &self.model.functions[f];
        let (name, params) = (func.name.clone(), func.params.clone());
        let Some(body) = func.body else {
            return Err(builtins::missing(&name, span));
        };
        if params.len() != args.len() {
            return Err(EvalError::new(
                EvalErrorKind::CannotEvaluate,
                format!("`{}' expects {} arguments, got {}", name, params.len(), args.len()),
                span,
            ));
        }
        if self.depth >= self.opts.max_call_depth {
            return Err(EvalError::new(
                EvalErrorKind::StackOverflow,
                format!("call depth limit of {} exceeded in `{}'", self.opts.max_call_depth, name),
                span,
            ));
        }

        let mut values = Vec::with_capacity(args.len());
        for &a in args {
            values.push(self.par(a)?);
        }
        let saved: Vec<Saved> = params
            .iter()
            .zip(values)
            .map(|(&p, v)| self.bind(p, Some(v)))
            .collect();

        self.depth += 1;
        trace!(function = %name, depth = self.depth, "call");
        let result = self
            .check_params(&params, span)
            .and_then(|()| self.detach_array(body))
            .and_then(|body| body_eval(self, body));
        self.depth -= 1;
        self.restore(saved);
        result
    }

    /// An array body's elements may mention the parameters, which are
    /// unbound once the call returns; copy their values into a fresh
    /// literal while the arguments are still in place.
    fn detach_array(&mut self, body: ExprId) -> Result<ExprId, EvalError> {
        let ty = self.ty(body);
        if ty.dim() <= 0 {
            return Ok(body);
        }
        let (elems, dims) = self.array_elems(body)?;
        let mut values = Vec::with_capacity(elems.len());
        for x in elems {
            values.push(self.par(x)?);
        }
        let span = self.span(body);
        Ok(self.array_lit(values, Some(dims), ty, span))
    }

    /// Check bound parameter values against the domains of their
    /// type-insts.
    fn check_params(&mut self, params: &[DeclId], span: Span) -> Result<(), EvalError> {
        for &p in params {
            let decl = &self.model.decls[p];
            let (ty, value) = (decl.ty, decl.init);
            let Some(dom) = self.model.type_insts[decl.ti].domain else {
                continue;
            };
            let Some(value) = value else {
                continue;
            };
            if !ty.is_par()
                || matches!(self.model.exprs[dom].kind, ExprKind::TiId(_))
                || matches!(self.model.exprs[value].kind, ExprKind::Absent)
            {
                continue;
            }
            let name = decl.name.clone();

            let values = if ty.dim() > 0 {
                self.array_elems(value)?.0
            } else {
                vec![value]
            };
            let ok = match ty.base() {
                BaseType::Int => {
                    let dom = self.eval::<IntSetKind>(dom)?;
                    let mut ok = true;
                    for v in values {
                        ok &= if ty.is_set() {
                            self.eval::<IntSetKind>(v)?.is_subset_of(&dom)
                        } else {
                            dom.contains(self.eval::<IntKind>(v)?)
                        };
                    }
                    ok
                }
                BaseType::Float => match self.model.exprs[dom].kind {
                    ExprKind::BinOp {
                        op: BinOpKind::DotDot,
                        lhs,
                        rhs,
                        ..
                    } => {
                        let lo = self.eval::<FloatKind>(lhs)?;
                        let hi = self.eval::<FloatKind>(rhs)?;
                        let mut ok = true;
                        for v in values {
                            let v = self.eval::<FloatKind>(v)?;
                            ok &= lo <= v && v <= hi;
                        }
                        ok
                    }
                    _ => true,
                },
                _ => true,
            };
            if !ok {
                return Err(EvalError::new(
                    EvalErrorKind::OutOfDomain,
                    format!("value for argument `{}' out of bounds", name),
                    span,
                ));
            }
        }
        Ok(())
    }

    // ── Arrays ───────────────────────────────────────────────────

    pub(crate) fn array_lit(
        &mut self,
        elems: Vec<ExprId>,
        dims: Option<Vec<(i64, i64)>>,
        ty: Type,
        span: Span,
    ) -> ExprId {
        let dims = dims.unwrap_or_else(|| vec![(1, elems.len() as i64)]);
        let e = self.model.alloc(ExprKind::ArrayLit { elems, dims }, ty);
        self.model.spanned(e, span)
    }

    /// Elements and index ranges of an array expression.
    pub(crate) fn array_elems(&mut self, e: ExprId) -> Result<(Vec<ExprId>, Vec<(i64, i64)>), EvalError> {
        let arr = self.eval::<ArrayKind>(e)?;
        match &self.model.exprs[arr].kind {
            ExprKind::ArrayLit { elems, dims } => Ok((elems.clone(), dims.clone())),
            _ => Err(EvalError::not_kind(ArrayKind::NAME, self.span(e))),
        }
    }

    pub(crate) fn access(&mut self, array: ExprId, indices: &[ExprId], span: Span) -> Result<ExprId, EvalError> {
        let arr = self.eval::<ArrayKind>(array)?;
        let mut idx = Vec::with_capacity(indices.len());
        for &i in indices {
            idx.push(self.eval::<IntKind>(i)?);
        }
        self.element(arr, &idx)
            .ok_or_else(|| EvalError::new(EvalErrorKind::OutOfBounds, "array access out of bounds", span))
    }

    /// Row-major lookup in an array literal; `None` when an index is outside
    /// its dimension.
    pub(crate) fn element(&self, arr: ExprId, idx: &[i64]) -> Option<ExprId> {
        let ExprKind::ArrayLit { elems, dims } = &self.model.exprs[arr].kind else {
            return None;
        };
        if dims.len() != idx.len() {
            return None;
        }
        let mut pos: i64 = 0;
        for (&(lo, hi), &i) in dims.iter().zip(idx) {
            if i < lo || i > hi {
                return None;
            }
            pos = pos.checked_mul(hi - lo + 1)?.checked_add(i - lo)?;
        }
        elems.get(usize::try_from(pos).ok()?).copied()
    }

    // ── Comprehensions ───────────────────────────────────────────

    /// Evaluate `each` on the body for every generator assignment that
    /// passes the where clause, in generator order.
    pub(crate) fn comprehension<T, F>(&mut self, c: &Comprehension, mut each: F) -> Result<Vec<T>, EvalError>
    where
        F: FnMut(&mut Self, ExprId) -> Result<T, EvalError>,
    {
        let decls: Vec<DeclId> = c.generators.iter().flat_map(|g| g.decls.iter().copied()).collect();
        let saved: Vec<Saved> = decls.into_iter().map(|d| self.bind(d, None)).collect();
        let mut out = Vec::new();
        let result = self.expand(c, 0, &mut each, &mut out);
        self.restore(saved);
        result.map(|()| out)
    }

    fn expand<T, F>(&mut self, c: &Comprehension, g: usize, each: &mut F, out: &mut Vec<T>) -> Result<(), EvalError>
    where
        F: FnMut(&mut Self, ExprId) -> Result<T, EvalError>,
    {
        let Some(generator) = c.generators.get(g) else {
            if let Some(w) = c.where_clause {
                if !self.eval::<BoolKind>(w)? {
                    return Ok(());
                }
            }
            out.push(each(self, c.body)?);
            return Ok(());
        };
        let values = self.generator_values(generator.source)?;
        self.assign_generator(c, g, &generator.decls, &values, each, out)
    }

    fn assign_generator<T, F>(
        &mut self,
        c: &Comprehension,
        g: usize,
        decls: &[DeclId],
        values: &[ExprId],
        each: &mut F,
        out: &mut Vec<T>,
    ) -> Result<(), EvalError>
    where
        F: FnMut(&mut Self, ExprId) -> Result<T, EvalError>,
    {
        let Some((&d, rest)) = decls.split_first() else {
            return self.expand(c, g + 1, each, out);
        };
        for &v in values {
            let decl = &mut self.model.decls[d];
            decl.init = Some(v);
            decl.evaluated = false;
            self.assign_generator(c, g, rest, values, each, out)?;
        }
        Ok(())
    }

    fn generator_values(&mut self, source: ExprId) -> Result<Vec<ExprId>, EvalError> {
        if !self.ty(source).is_set() {
            return Ok(self.array_elems(source)?.0);
        }
        let set = self.eval::<IntSetKind>(source)?;
        let values: Vec<i64> = set.values().collect();
        Ok(values.into_iter().map(|v| self.model.int(v)).collect())
    }

    // ── Partial evaluation ───────────────────────────────────────

    /// Types whose values the kind evaluators produce in full.
    fn fixed_kind(ty: Type) -> bool {
        ty.is_par()
            && ty.is_present()
            && (ty.dim() > 0
                || ty.is_int_set()
                || ty.is_bool_set()
                || ty.is_int()
                || ty.is_bool()
                || ty.is_float()
                || ty.is_string())
    }

    pub(crate) fn par(&mut self, e: ExprId) -> Result<ExprId, EvalError> {
        let (ty, span) = (self.ty(e), self.span(e));
        let kind = self.model.exprs[e].kind.clone();
        match &kind {
            ExprKind::AnonVar | ExprKind::TiId(_) | ExprKind::Absent | ExprKind::StringLit(_) => {
                return Ok(e)
            }
            ExprKind::Id { name, decl } => {
                let d = self.model.follow_flat(self.decl_of(*decl, name, span)?);
                if let Some(v) = self.fixed_value(d) {
                    return Ok(v);
                }
                let Some(init) = self.model.decls[d].init else {
                    return Ok(e);
                };
                if !Self::fixed_kind(ty) {
                    return self
                        .par(init)
                        .map_err(|err| err.within(span, format!("evaluating `{}'", name)));
                }
            }
            ExprKind::Comprehension(c) if c.is_set => {
                return if ty.base() == BaseType::Bool {
                    let v = self.eval::<BoolSetKind>(e)?;
                    Ok(BoolSetKind::store(self.model, &v))
                } else {
                    let v = self.eval::<IntSetKind>(e)?;
                    Ok(IntSetKind::store(self.model, &v))
                };
            }
            _ => {}
        }

        let whole_array = ty.dim() > 0
            && (ty.is_par() || matches!(kind, ExprKind::ArrayLit { .. } | ExprKind::Comprehension(_)));
        if whole_array {
            let (elems, dims) = self.array_elems(e)?;
            let mut values = Vec::with_capacity(elems.len());
            for x in elems {
                values.push(self.par(x)?);
            }
            return Ok(self.array_lit(values, Some(dims), ty, span));
        }
        if Self::fixed_kind(ty) {
            return if ty.is_int_set() {
                let v = self.eval::<IntSetKind>(e)?;
                Ok(IntSetKind::store(self.model, &v))
            } else if ty.is_bool_set() {
                let v = self.eval::<BoolSetKind>(e)?;
                Ok(BoolSetKind::store(self.model, &v))
            } else if ty.is_int() {
                let v = self.eval::<IntKind>(e)?;
                Ok(IntKind::store(self.model, &v))
            } else if ty.is_bool() {
                let v = self.eval::<BoolKind>(e)?;
                Ok(BoolKind::store(self.model, &v))
            } else if ty.is_float() {
                let v = self.eval::<FloatKind>(e)?;
                Ok(FloatKind::store(self.model, &v))
            } else {
                let v = self.eval::<StringKind>(e)?;
                Ok(StringKind::store(self.model, &v))
            };
        }

        // not fixed: rebuild around the evaluated fixed parts
        match kind {
            ExprKind::Ite {
                branches,
                else_branch,
            } => {
                let mut kept = Vec::new();
                for (cond, then) in branches {
                    if kept.is_empty() && self.ty(cond).is_par() {
                        if self.eval::<BoolKind>(cond)? {
                            return self.par(then);
                        }
                        continue;
                    }
                    kept.push((self.par(cond)?, self.par(then)?));
                }
                let else_branch = self.par(else_branch)?;
                if kept.is_empty() {
                    return Ok(else_branch);
                }
                Ok(self.rebuild(
                    e,
                    ExprKind::Ite {
                        branches: kept,
                        else_branch,
                    },
                ))
            }
            ExprKind::Call { name, args, decl } => {
                if let Some(f) = self.with_body(decl) {
                    return self
                        .call_fn(f, &args, span, |ev, body| ev.par(body))
                        .map_err(|err| err.within(span, format!("call to `{}'", name)));
                }
                let mut evaluated = Vec::with_capacity(args.len());
                for a in args {
                    evaluated.push(self.par(a)?);
                }
                Ok(self.rebuild(
                    e,
                    ExprKind::Call {
                        name,
                        args: evaluated,
                        decl,
                    },
                ))
            }
            ExprKind::BinOp {
                op,
                lhs,
                rhs,
                decl,
            } => {
                if let Some(f) = self.with_body(decl) {
                    return self.call_fn(f, &[lhs, rhs], span, |ev, body| ev.par(body));
                }
                let lhs = self.par(lhs)?;
                let rhs = self.par(rhs)?;
                Ok(self.rebuild(e, ExprKind::BinOp { op, lhs, rhs, decl }))
            }
            ExprKind::UnOp { op, arg, decl } => {
                if let Some(f) = self.with_body(decl) {
                    return self.call_fn(f, &[arg], span, |ev, body| ev.par(body));
                }
                let arg = self.par(arg)?;
                Ok(self.rebuild(e, ExprKind::UnOp { op, arg, decl }))
            }
            ExprKind::ArrayAccess { array, indices } => {
                if indices.iter().all(|&i| self.ty(i).is_par()) {
                    let elem = self.access(array, &indices, span)?;
                    return self.par(elem);
                }
                let array = self.par(array)?;
                let mut evaluated = Vec::with_capacity(indices.len());
                for i in indices {
                    evaluated.push(self.par(i)?);
                }
                Ok(self.rebuild(
                    e,
                    ExprKind::ArrayAccess {
                        array,
                        indices: evaluated,
                    },
                ))
            }
            ExprKind::SetLit(elems) => {
                let mut evaluated = Vec::with_capacity(elems.len());
                for x in elems {
                    evaluated.push(self.par(x)?);
                }
                Ok(self.rebuild(e, ExprKind::SetLit(evaluated)))
            }
            ExprKind::Let(l) => self.with_let(&l, |ev| ev.par(l.body)),
            _ => Ok(e),
        }
    }

    fn rebuild(&mut self, like: ExprId, kind: ExprKind) -> ExprId {
        let (ty, span) = (self.ty(like), self.span(like));
        let e = self.model.alloc(kind, ty);
        self.model.spanned(e, span)
    }

    /// The single value a declaration's domain admits, if it admits one.
    fn fixed_value(&mut self, d: DeclId) -> Option<ExprId> {
        let decl = &self.model.decls[d];
        if decl.ty.dim() != 0 {
            return None;
        }
        let dom = self.model.type_insts[decl.ti].domain?;
        match &self.model.exprs[dom].kind {
            ExprKind::IntSetLit(s) if s.card() == 1 => {
                let v = s.min()?;
                Some(self.model.int(v))
            }
            ExprKind::BinOp {
                op: BinOpKind::DotDot,
                lhs,
                rhs,
                ..
            } => match (&self.model.exprs[*lhs].kind, &self.model.exprs[*rhs].kind) {
                (ExprKind::IntLit(a), ExprKind::IntLit(b)) if a == b => Some(*lhs),
                (ExprKind::FloatLit(a), ExprKind::FloatLit(b)) if a == b => Some(*lhs),
                _ => None,
            },
            _ => None,
        }
    }
}
