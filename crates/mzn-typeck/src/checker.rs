use mzn_ast::*;

use crate::coerce::add_coercion;
use crate::error::TypeError;
use crate::functions::{arg_type, match_fn, return_type};

/// How the typer treats declarations it walks over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclMode {
    /// Give each declaration the type of its type-inst (pass 1).
    Declare,
    /// Declarations are typed already; check and coerce initializers (pass 2).
    Check,
}

// ── Typer ────────────────────────────────────────────────────────

/// Bottom-up typer. A returned `Err` aborts the current item; errors that
/// do not invalidate the surrounding expression are pushed to `errors`.
pub(crate) struct Typer<'a> {
    pub(crate) model: &'a mut Model,
    mode: DeclMode,
    pub(crate) errors: Vec<TypeError>,
}

type Check<T = ()> = Result<T, TypeError>;

impl<'a> Typer<'a> {
    pub(crate) fn new(model: &'a mut Model, mode: DeclMode) -> Self {
        Self {
            model,
            mode,
            errors: Vec::new(),
        }
    }

    fn ty(&self, e: ExprId) -> Type {
        self.model.exprs[e].ty
    }

    fn set_ty(&mut self, e: ExprId, ty: Type) {
        self.model.exprs[e].ty = ty;
    }

    fn span(&self, e: ExprId) -> Span {
        self.model.exprs[e].span
    }

    fn is_anon(&self, e: ExprId) -> bool {
        matches!(self.model.exprs[e].kind, ExprKind::AnonVar)
    }

    fn coerce(&mut self, e: ExprId, target: Type) -> Check<ExprId> {
        add_coercion(self.model, e, target)
    }

    // ── Items ───────────────────────────────────────────────────

    /// Pass 1 for one declaration: type its type-inst and take that type.
    pub(crate) fn declare(&mut self, d: DeclId) -> Check {
        let ti = self.model.decls[d].ti;
        self.check_type_inst(ti)?;
        self.model.decls[d].ty = self.model.type_insts[ti].ty;
        Ok(())
    }

    pub(crate) fn check_item(&mut self, path: ItemPath) -> Check {
        match self.model.slot(path).item.clone() {
            Item::Include(_) | Item::Assign(_) => Ok(()),
            Item::VarDecl(d) => {
                self.check_decl(d)?;
                let decl = &self.model.decls[d];
                if has_ti_variable(self.model, decl.ti) {
                    self.errors.push(TypeError::new(
                        format!("type-inst variables not allowed in type-inst for `{}'", decl.name),
                        decl.span,
                    ));
                }
                self.check_set_finite(d);
                Ok(())
            }
            Item::Constraint(e) => {
                self.check_expr(e)?;
                let t = self.ty(e);
                if !t.is_subtype_of(Type::var_bool()) {
                    return Err(TypeError::new(
                        format!(
                            "invalid type of constraint, expected `{}', actual `{}'",
                            Type::var_bool(),
                            t
                        ),
                        self.span(e),
                    ));
                }
                Ok(())
            }
            Item::Solve(solve) => {
                self.check_annotation_list(&solve.ann)?;
                let goal = match solve.goal {
                    SolveGoal::Satisfy => return Ok(()),
                    SolveGoal::Minimize(e) | SolveGoal::Maximize(e) => e,
                };
                self.check_expr(goal)?;
                let t = self.ty(goal);
                if !(t.is_subtype_of(Type::var_int()) || t.is_subtype_of(Type::var_float())) {
                    return Err(TypeError::new(
                        format!(
                            "objective has invalid type, expected int or float, actual `{}'",
                            t
                        ),
                        self.span(goal),
                    ));
                }
                Ok(())
            }
            Item::Output(e) => {
                self.check_expr(e)?;
                let t = self.ty(e);
                let expected = Type::par_string().with_dim(1);
                if t != expected && t != Type::bot().with_dim(1) {
                    return Err(TypeError::new(
                        format!(
                            "invalid type in output item, expected `{}', actual `{}'",
                            expected, t
                        ),
                        self.span(e),
                    ));
                }
                Ok(())
            }
            Item::Function(f) => self.check_function(f),
        }
    }

    /// Pass 1 for a function: its return type-inst and parameters.
    pub(crate) fn declare_function(&mut self, f: FnId) -> Check {
        let (ret, params) = {
            let func = &self.model.functions[f];
            (func.ret, func.params.clone())
        };
        self.check_type_inst(ret)?;
        for p in params {
            self.check_decl(p)?;
        }
        Ok(())
    }

    fn check_function(&mut self, f: FnId) -> Check {
        let func = self.model.functions[f].clone();
        self.check_annotation_list(&func.ann)?;
        self.check_type_inst(func.ret)?;
        let Some(body) = func.body else {
            return Ok(());
        };
        self.check_expr(body)?;
        let declared = self.model.type_insts[func.ret].ty;
        let actual = self.ty(body);
        if !actual.is_subtype_of(declared) {
            return Err(TypeError::new(
                format!(
                    "return type of function does not match body, declared type is `{}', body type is `{}'",
                    declared, actual
                ),
                self.span(body),
            ));
        }
        let body = self.coerce(body, declared)?;
        self.model.functions[f].body = Some(body);
        Ok(())
    }

    fn check_set_finite(&mut self, d: DeclId) {
        let decl = &self.model.decls[d];
        if decl.init.is_none()
            && decl.ty.is_set()
            && decl.ty.is_var()
            && self.model.type_insts[decl.ti].domain.is_none()
        {
            self.errors.push(TypeError::new(
                format!("set element type for `{}' is not finite", decl.name),
                decl.span,
            ));
        }
    }

    // ── Declarations and type-insts ─────────────────────────────

    pub(crate) fn check_decl(&mut self, d: DeclId) -> Check {
        let (ti, init, ann) = {
            let decl = &self.model.decls[d];
            (decl.ti, decl.init, decl.ann.clone())
        };
        self.check_type_inst(ti)?;
        if let Some(init) = init {
            self.check_expr(init)?;
        }
        self.check_annotation_list(&ann)?;

        let declared = self.model.type_insts[ti].ty;
        match self.mode {
            DeclMode::Declare => self.model.decls[d].ty = declared,
            DeclMode::Check => {
                if self.model.decls[d].ty.is_unknown() {
                    self.model.decls[d].ty = declared;
                }
                if let Some(init) = init {
                    let actual = self.ty(init);
                    if !actual.is_subtype_of(declared) {
                        self.errors.push(TypeError::new(
                            format!(
                                "initialisation value for `{}' has invalid type-inst: expected `{}', actual `{}'",
                                self.model.decls[d].name, declared, actual
                            ),
                            self.span(init),
                        ));
                    } else {
                        let init = self.coerce(init, declared)?;
                        self.model.decls[d].init = Some(init);
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn check_type_inst(&mut self, ti: TypeInstId) -> Check {
        let (ranges, domain, mut tt, span) = {
            let t = &self.model.type_insts[ti];
            (t.ranges.clone(), t.domain, t.ty, t.span)
        };
        for &r in &ranges {
            self.check_type_inst(r)?;
        }
        if let Some(dom) = domain {
            self.check_expr(dom)?;
        }

        if !ranges.is_empty() {
            let mut generic = false;
            for &r in &ranges {
                let rt = self.model.type_insts[r].ty;
                let rspan = self.model.type_insts[r].span;
                if rt.cv() {
                    tt = tt.with_cv(true);
                }
                if rt == Type::top() {
                    if generic {
                        return Err(TypeError::new(
                            "only one type-inst variable allowed in array index",
                            rspan,
                        ));
                    }
                    generic = true;
                } else if rt != Type::par_int() {
                    return Err(TypeError::new(
                        format!(
                            "invalid type in array index, expected `set of int', actual `{}'",
                            rt
                        ),
                        rspan,
                    ));
                }
            }
            tt = tt.with_dim(if generic { -1 } else { ranges.len() as i32 });
        }

        if let Some(dom) = domain {
            let dt = self.ty(dom);
            if dt.cv() {
                tt = tt.with_cv(true);
            }
            if !matches!(self.model.exprs[dom].kind, ExprKind::TiId(_)) {
                if !dt.is_par() || dt.set_type() != SetType::Set {
                    return Err(TypeError::new("type-inst must be par set", self.span(dom)));
                }
                if dt.dim() != 0 {
                    return Err(TypeError::new("type-inst cannot be an array", self.span(dom)));
                }
            }
        }

        if tt.is_unknown() {
            let Some(dom) = domain else {
                return Err(TypeError::new("type-inst must be int or float", span));
            };
            let dt = self.ty(dom);
            match dt.base() {
                BaseType::Int | BaseType::Float => {}
                // the empty set as a domain
                BaseType::Bot => self.set_ty(dom, dt.with_base(BaseType::Int)),
                _ => {
                    return Err(TypeError::new("type-inst must be int or float", self.span(dom)))
                }
            }
            tt = tt.with_base(self.ty(dom).base());
        }
        if tt.set_type() == SetType::Set
            && tt.is_var()
            && !matches!(tt.base(), BaseType::Int | BaseType::Top)
        {
            return Err(TypeError::new(
                "var set element types other than `int' not allowed",
                span,
            ));
        }
        self.model.type_insts[ti].ty = tt;
        Ok(())
    }

    // ── Expressions ─────────────────────────────────────────────

    pub(crate) fn check_expr(&mut self, e: ExprId) -> Check {
        match self.model.exprs[e].kind.clone() {
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::StringLit(_)
            | ExprKind::IntSetLit(_)
            | ExprKind::Absent
            | ExprKind::AnonVar
            | ExprKind::TiId(_) => {}
            ExprKind::SetLit(elems) => {
                for &x in &elems {
                    self.check_expr(x)?;
                }
                self.set_lit(e, elems)?;
            }
            ExprKind::Id { name, decl } => {
                let Some(d) = decl else {
                    return Err(TypeError::undefined(&name, self.span(e)));
                };
                let t = self.model.decls[d].ty;
                if t.is_unknown() {
                    return Err(TypeError::new(
                        format!("cannot determine type of `{}'", name),
                        self.span(e),
                    ));
                }
                self.set_ty(e, t);
            }
            ExprKind::ArrayLit { elems, dims } => {
                for &x in &elems {
                    self.check_expr(x)?;
                }
                self.array_lit(e, elems, dims)?;
            }
            ExprKind::ArrayAccess { array, indices } => {
                self.check_expr(array)?;
                for &i in &indices {
                    self.check_expr(i)?;
                }
                self.array_access(e, array, indices)?;
            }
            ExprKind::Comprehension(c) => self.comprehension(e, c)?,
            ExprKind::Ite {
                branches,
                else_branch,
            } => {
                for &(c, t) in &branches {
                    self.check_expr(c)?;
                    self.check_expr(t)?;
                }
                self.check_expr(else_branch)?;
                self.ite(e, branches, else_branch)?;
            }
            ExprKind::BinOp { op, lhs, rhs, .. } => {
                self.check_expr(lhs)?;
                self.check_expr(rhs)?;
                self.binop(e, op, lhs, rhs)?;
            }
            ExprKind::UnOp { op, arg, .. } => {
                self.check_expr(arg)?;
                self.unop(e, op, arg)?;
            }
            ExprKind::Call { name, args, .. } => {
                for &a in &args {
                    self.check_expr(a)?;
                }
                self.call(e, name, args)?;
            }
            ExprKind::Let(l) => self.let_expr(e, l)?,
        }
        let ann = self.model.exprs[e].ann.clone();
        self.check_annotation_list(&ann)
    }

    fn check_annotation_list(&mut self, anns: &[ExprId]) -> Check {
        for &a in anns {
            self.check_expr(a)?;
            let t = self.ty(a);
            if !t.is_ann() {
                return Err(TypeError::new(
                    format!("expected annotation, got `{}'", t),
                    self.span(a),
                ));
            }
        }
        Ok(())
    }

    fn set_lit(&mut self, e: ExprId, elems: Vec<ExprId>) -> Check {
        let mut ty = Type::unknown().with_set(SetType::Set);
        for &x in &elems {
            let xt = self.ty(x);
            if xt.dim() > 0 {
                return Err(TypeError::new("set literals cannot contain arrays", self.span(x)));
            }
            if xt.is_var() {
                ty = ty.with_inst(Inst::Var);
            }
            if xt.cv() {
                ty = ty.with_cv(true);
            }
            if !xt.base().is_subtype_of(ty.base()) {
                if ty.base() == BaseType::Unknown || ty.base().is_subtype_of(xt.base()) {
                    ty = ty.with_base(xt.base());
                } else {
                    return Err(TypeError::new("non-uniform set literal", self.span(e)));
                }
            }
        }
        if ty.base() == BaseType::Unknown {
            ty = ty.with_base(BaseType::Bot);
        } else {
            if ty.is_var() && ty.base() != BaseType::Int {
                if ty.base() == BaseType::Bool {
                    ty = ty.with_base(BaseType::Int);
                } else {
                    return Err(TypeError::new(
                        "cannot coerce set literal element to var int",
                        self.span(e),
                    ));
                }
            }
            let mut coerced = Vec::with_capacity(elems.len());
            for x in elems {
                coerced.push(self.coerce(x, ty)?);
            }
            self.model.exprs[e].kind = ExprKind::SetLit(coerced);
        }
        self.set_ty(e, ty);
        Ok(())
    }

    fn array_lit(&mut self, e: ExprId, elems: Vec<ExprId>, dims: Vec<(i64, i64)>) -> Check {
        let mut ty = Type::unknown().with_dim(dims.len() as i32);
        let mut anons = Vec::new();
        let mut inferred = false;
        for &x in &elems {
            let xt = self.ty(x);
            if xt.dim() > 0 {
                return Err(TypeError::new("arrays cannot be elements of arrays", self.span(x)));
            }
            let anon = self.is_anon(x);
            if anon {
                ty = ty.with_inst(Inst::Var);
                anons.push(x);
            } else if xt.is_var() {
                ty = ty.with_inst(Inst::Var);
            }
            if xt.cv() {
                ty = ty.with_cv(true);
            }
            if xt.is_opt() {
                ty = ty.with_opt(OptType::Optional);
            }
            if anon {
                continue;
            }
            let non_uniform = || TypeError::new("non-uniform array literal", self.span(e));
            if ty.base() == BaseType::Unknown {
                if inferred {
                    if ty.set_type() != xt.set_type() {
                        return Err(non_uniform());
                    }
                } else {
                    inferred = true;
                    ty = ty.with_set(xt.set_type());
                }
                if xt.base() != BaseType::Bot {
                    ty = ty.with_base(xt.base());
                }
            } else if xt.base() == BaseType::Bot {
                if xt.set_type() != ty.set_type() {
                    return Err(non_uniform());
                }
            } else if xt.base() != ty.base() || xt.set_type() != ty.set_type() {
                // elements are not widened: `[1, true]` is rejected
                return Err(non_uniform());
            }
        }

        if ty.base() == BaseType::Unknown {
            ty = ty.with_base(BaseType::Bot);
            if !anons.is_empty() {
                return Err(TypeError::new(
                    "array literal must contain at least one non-anonymous variable",
                    self.span(e),
                ));
            }
        } else {
            let mut elem = ty.elem();
            if elem.is_var() && elem.set_type() == SetType::Set && elem.base() != BaseType::Int {
                if elem.base() == BaseType::Bool {
                    ty = ty.with_base(BaseType::Int);
                    elem = elem.with_base(BaseType::Int);
                } else {
                    return Err(TypeError::new(
                        "cannot coerce array element to var set of int",
                        self.span(e),
                    ));
                }
            }
            for &a in &anons {
                self.set_ty(a, elem);
            }
            let mut coerced = Vec::with_capacity(elems.len());
            for x in elems {
                coerced.push(self.coerce(x, elem)?);
            }
            self.model.exprs[e].kind = ExprKind::ArrayLit {
                elems: coerced,
                dims,
            };
        }
        self.set_ty(e, ty);
        Ok(())
    }

    fn array_access(&mut self, e: ExprId, array: ExprId, indices: Vec<ExprId>) -> Check {
        let mut array = array;
        let at = self.ty(array);
        if at.dim() == 0 {
            if at.set_type() != SetType::Set {
                return Err(TypeError::new("not an array in array access", self.span(array)));
            }
            array = self.coerce(array, at.with_set(SetType::Plain).with_dim(1))?;
        }
        let at = self.ty(array);
        if at.dim() != indices.len() as i32 {
            return Err(TypeError::new("array dimensions do not match", self.span(array)));
        }
        let mut tt = at.elem();
        let mut coerced = Vec::with_capacity(indices.len());
        for idx in indices {
            if self.is_anon(idx) {
                self.set_ty(idx, Type::var_int());
            }
            let it = self.ty(idx);
            if it.is_set()
                || !matches!(it.base(), BaseType::Int | BaseType::Bool)
                || it.dim() != 0
            {
                return Err(TypeError::new(
                    format!("array index must be `int', but is `{}'", it),
                    self.span(idx),
                ));
            }
            coerced.push(self.coerce(idx, Type::var_int())?);
            if it.is_opt() {
                tt = tt.with_opt(OptType::Optional);
            }
            if it.is_var() {
                tt = tt.with_inst(Inst::Var);
            }
            if it.cv() {
                tt = tt.with_cv(true);
            }
        }
        self.model.exprs[e].kind = ExprKind::ArrayAccess {
            array,
            indices: coerced,
        };
        self.set_ty(e, tt);
        Ok(())
    }

    fn generator(&mut self, g: &Generator) -> Check {
        let src = self.ty(g.source);
        if src != Type::var_set_int() && src != Type::par_set_int() && src.dim() != 1 {
            return Err(TypeError::new(
                format!(
                    "generator expression must be (par or var) set of int or one-dimensional array, but is `{}'",
                    src
                ),
                self.span(g.source),
            ));
        }
        let decl_ty = if src.dim() == 0 {
            Type::par_int()
        } else {
            src.elem()
        };
        // no placeholder initializer: the evaluator binds each value as it
        // iterates, and an unbound generator reads as "cannot evaluate"
        for &d in &g.decls {
            self.model.decls[d].ty = decl_ty;
            let ti = self.model.decls[d].ti;
            self.model.type_insts[ti].ty = decl_ty;
        }
        Ok(())
    }

    fn comprehension(&mut self, e: ExprId, c: Comprehension) -> Check {
        for g in &c.generators {
            self.check_expr(g.source)?;
            self.generator(g)?;
        }
        if let Some(w) = c.where_clause {
            self.check_expr(w)?;
        }
        self.check_expr(c.body)?;

        let body = self.ty(c.body);
        let mut tt = body;
        for g in &c.generators {
            let src = self.ty(g.source);
            if src == Type::var_set_int() {
                tt = tt.with_opt(OptType::Optional).with_inst(Inst::Var);
            }
            if src.cv() {
                tt = tt.with_cv(true);
            }
        }
        if let Some(w) = c.where_clause {
            let wt = self.ty(w);
            if wt == Type::var_bool() {
                tt = tt.with_opt(OptType::Optional).with_inst(Inst::Var);
            } else if wt != Type::par_bool() {
                return Err(TypeError::new(
                    format!("where clause must be bool, but is `{}'", wt),
                    self.span(w),
                ));
            }
            if wt.cv() {
                tt = tt.with_cv(true);
            }
        }
        if c.is_set {
            if body.dim() != 0 || body.set_type() == SetType::Set {
                return Err(TypeError::new(
                    format!("set comprehension expression must be scalar, but is `{}'", body),
                    self.span(c.body),
                ));
            }
            tt = tt.with_set(SetType::Set);
        } else {
            if body.dim() != 0 {
                return Err(TypeError::new(
                    "array comprehension expression cannot be an array",
                    self.span(c.body),
                ));
            }
            tt = tt.with_dim(1);
        }
        self.set_ty(e, tt);
        Ok(())
    }

    fn ite(&mut self, e: ExprId, branches: Vec<(ExprId, ExprId)>, else_branch: ExprId) -> Check {
        let mut tret = self.ty(else_branch);
        let mut anons = Vec::new();
        let mut all_par = !tret.is_var();
        if tret.is_unknown() {
            if !self.is_anon(else_branch) {
                return Err(TypeError::new(
                    "cannot infer type of expression in else branch of conditional",
                    self.span(else_branch),
                ));
            }
            all_par = false;
            anons.push(else_branch);
        }
        let mut all_present = !tret.is_opt();
        let mut var_cond = false;
        let mut all_ann = true;

        for &(cond, then) in &branches {
            let ct = self.ty(cond);
            var_cond = var_cond || ct == Type::var_bool();
            if ct == Type::ann() {
                if !all_ann {
                    return Err(TypeError::new("expected combinator condition", self.span(cond)));
                }
                if tret != Type::ann() {
                    return Err(TypeError::new(
                        "combinator conditional must have type ann",
                        self.span(cond),
                    ));
                }
            } else if ct != Type::par_bool() && ct != Type::var_bool() {
                return Err(TypeError::new(
                    format!("expected bool conditional expression, got `{}'", ct),
                    self.span(cond),
                ));
            } else {
                all_ann = false;
            }
            if ct.cv() {
                tret = tret.with_cv(true);
            }

            let tt = self.ty(then);
            if tt.is_unknown() {
                if !self.is_anon(then) {
                    return Err(TypeError::new(
                        "cannot infer type of expression in then branch of conditional",
                        self.span(then),
                    ));
                }
                all_par = false;
                anons.push(then);
                continue;
            }
            if tret.is_bot() || tret.is_unknown() {
                tret = tret.with_base(tt.base());
            }
            let widens = tt.base().is_subtype_of(tret.base()) || tret.base().is_subtype_of(tt.base());
            if (!tt.is_bot() && !widens)
                || tt.set_type() != tret.set_type()
                || tt.dim() != tret.dim()
            {
                return Err(TypeError::new(
                    format!(
                        "type mismatch in branches of conditional. Then-branch has type `{}', but else branch has type `{}'",
                        tt, tret
                    ),
                    self.span(then),
                ));
            }
            if tret.base().is_subtype_of(tt.base()) {
                tret = tret.with_base(tt.base());
            }
            if tt.is_var() {
                all_par = false;
            }
            if tt.is_opt() {
                all_present = false;
            }
            if tt.cv() {
                tret = tret.with_cv(true);
            }
        }

        let tret_var = tret.with_inst(Inst::Var);
        for &a in &anons {
            self.set_ty(a, tret_var);
        }
        let mut coerced = Vec::with_capacity(branches.len());
        for (cond, then) in branches {
            coerced.push((cond, self.coerce(then, tret)?));
        }
        let else_branch = self.coerce(else_branch, tret)?;
        self.model.exprs[e].kind = ExprKind::Ite {
            branches: coerced,
            else_branch,
        };
        if var_cond && tret.dim() > 0 {
            return Err(TypeError::new(
                "conditional with var condition cannot have array type",
                self.span(e),
            ));
        }
        if var_cond || !all_par {
            tret = tret.with_inst(Inst::Var);
        }
        if !all_present {
            tret = tret.with_opt(OptType::Optional);
        }
        self.set_ty(e, tret);
        Ok(())
    }

    fn binop(&mut self, e: ExprId, op: BinOpKind, lhs: ExprId, rhs: ExprId) -> Check {
        let args = [self.ty(lhs), self.ty(rhs)];
        let Some(f) = match_fn(self.model, op.as_str(), &args) else {
            return Err(TypeError::new(
                format!(
                    "type error in operator application for `{}'. No matching operator found with left-hand side type `{}' and right-hand side type `{}'",
                    op.as_str(),
                    args[0],
                    args[1]
                ),
                self.span(e),
            ));
        };
        let lhs = self.coerce(lhs, arg_type(self.model, f, &args, 0))?;
        let rhs = self.coerce(rhs, arg_type(self.model, f, &args, 1))?;
        let args = [self.ty(lhs), self.ty(rhs)];
        let ty = return_type(self.model, f, &args, self.span(e))?.with_cv(args[0].cv() || args[1].cv());
        let decl = self.model.functions[f].body.map(|_| f);
        self.model.exprs[e].kind = ExprKind::BinOp { op, lhs, rhs, decl };
        self.set_ty(e, ty);
        Ok(())
    }

    fn unop(&mut self, e: ExprId, op: UnOpKind, arg: ExprId) -> Check {
        let args = [self.ty(arg)];
        let Some(f) = match_fn(self.model, op.as_str(), &args) else {
            return Err(TypeError::new(
                format!(
                    "type error in operator application for `{}'. No matching operator found with type `{}'",
                    op.as_str(),
                    args[0]
                ),
                self.span(e),
            ));
        };
        let arg = self.coerce(arg, arg_type(self.model, f, &args, 0))?;
        let args = [self.ty(arg)];
        let ty = return_type(self.model, f, &args, self.span(e))?.with_cv(args[0].cv());
        let decl = self.model.functions[f].body.map(|_| f);
        self.model.exprs[e].kind = ExprKind::UnOp { op, arg, decl };
        self.set_ty(e, ty);
        Ok(())
    }

    fn call(&mut self, e: ExprId, name: smol_str::SmolStr, args: Vec<ExprId>) -> Check {
        let tys: Vec<Type> = args.iter().map(|a| self.ty(*a)).collect();
        let Some(f) = match_fn(self.model, &name, &tys) else {
            let sig = tys.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(",");
            return Err(TypeError::new(
                format!(
                    "no function or predicate with this signature found: `{}({})'",
                    name, sig
                ),
                self.span(e),
            ));
        };
        let mut cv = false;
        let mut coerced = Vec::with_capacity(args.len());
        for (i, a) in args.into_iter().enumerate() {
            let a = self.coerce(a, arg_type(self.model, f, &tys, i))?;
            cv = cv || self.ty(a).cv();
            coerced.push(a);
        }
        let tys: Vec<Type> = coerced.iter().map(|a| self.ty(*a)).collect();
        let ty = return_type(self.model, f, &tys, self.span(e))?.with_cv(cv);
        self.model.exprs[e].kind = ExprKind::Call {
            name,
            args: coerced,
            decl: Some(f),
        };
        self.set_ty(e, ty);
        Ok(())
    }

    fn let_expr(&mut self, e: ExprId, l: Let) -> Check {
        for item in &l.items {
            match *item {
                LetItem::Decl(d) => self.check_decl(d)?,
                LetItem::Constraint(c) => self.check_expr(c)?,
            }
        }
        self.check_expr(l.body)?;

        let mut cv = false;
        let mut orig = l.orig.clone();
        orig.resize(l.items.len(), None);
        for (i, item) in l.items.iter().enumerate() {
            match *item {
                LetItem::Decl(d) => {
                    let decl = &self.model.decls[d];
                    let (name, span, ty, init, ti) =
                        (decl.name.clone(), decl.span, decl.ty, decl.init, decl.ti);
                    cv = cv || ty.cv();
                    self.check_set_finite(d);
                    if ty.is_par() && init.is_none() {
                        return Err(TypeError::new(
                            format!("let variable `{}' must be initialised", name),
                            span,
                        ));
                    }
                    if has_ti_variable(self.model, ti) {
                        self.errors.push(TypeError::new(
                            format!(
                                "type-inst variables not allowed in type-inst for let variable `{}'",
                                name
                            ),
                            span,
                        ));
                    }
                    orig[i] = init;
                }
                LetItem::Constraint(c) => cv = cv || self.ty(c).cv(),
            }
        }
        if let ExprKind::Let(slot) = &mut self.model.exprs[e].kind {
            slot.orig = orig;
        }
        let body = self.ty(l.body);
        self.set_ty(e, body.with_cv(cv || body.cv()));
        Ok(())
    }
}

/// A type-inst mentions `$T` or a generic rank `$_`.
pub(crate) fn has_ti_variable(model: &Model, ti: TypeInstId) -> bool {
    let t = &model.type_insts[ti];
    let domain_var = t
        .domain
        .is_some_and(|d| matches!(model.exprs[d].kind, ExprKind::TiId(_)));
    domain_var || t.ranges.iter().any(|r| has_ti_variable(model, *r))
}
