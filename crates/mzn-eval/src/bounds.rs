//! Conservative bounds of expressions over decision variables.
//!
//! Each analysis walks the expression bottom-up with an explicit stack:
//! every visited node pushes exactly one bound and operators pop the bounds
//! of their operands. Fixed subexpressions are evaluated and push their
//! exact value. A construct without a rule marks the whole result invalid.

use std::fmt;

use mzn_ast::*;
use tracing::debug_span;

use crate::kinds::{BoolKind, FloatKind, IntKind, IntSetKind};
use crate::Evaluator;

/// An integer bound; infinities stand for a missing bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntVal {
    NegInfinity,
    Finite(i64),
    PosInfinity,
}

impl IntVal {
    pub fn is_finite(self) -> bool {
        matches!(self, IntVal::Finite(_))
    }

    pub fn finite(self) -> Option<i64> {
        match self {
            IntVal::Finite(v) => Some(v),
            _ => None,
        }
    }

    fn neg(self) -> IntVal {
        match self {
            IntVal::NegInfinity => IntVal::PosInfinity,
            IntVal::PosInfinity => IntVal::NegInfinity,
            // -i64::MIN does not fit
            IntVal::Finite(v) => v.checked_neg().map_or(IntVal::PosInfinity, IntVal::Finite),
        }
    }

    fn infinity(negative: bool) -> IntVal {
        if negative {
            IntVal::NegInfinity
        } else {
            IntVal::PosInfinity
        }
    }

    /// `k * self`; a product past `i64` saturates to the infinity of its
    /// sign.
    fn scale(self, k: i64) -> IntVal {
        match self {
            _ if k == 0 => IntVal::Finite(0),
            IntVal::Finite(v) => v
                .checked_mul(k)
                .map_or_else(|| IntVal::infinity((v < 0) != (k < 0)), IntVal::Finite),
            IntVal::PosInfinity => IntVal::infinity(k < 0),
            IntVal::NegInfinity => IntVal::infinity(k > 0),
        }
    }

    /// Saturating sum; `None` for `infinity + -infinity`.
    fn plus(self, other: IntVal) -> Option<IntVal> {
        match (self, other) {
            (IntVal::Finite(a), IntVal::Finite(b)) => {
                Some(a.checked_add(b).map_or_else(|| IntVal::infinity(a < 0), IntVal::Finite))
            }
            (IntVal::PosInfinity, IntVal::NegInfinity) | (IntVal::NegInfinity, IntVal::PosInfinity) => None,
            (IntVal::Finite(_), inf) | (inf, _) => Some(inf),
        }
    }
}

impl From<i64> for IntVal {
    fn from(v: i64) -> Self {
        IntVal::Finite(v)
    }
}

impl fmt::Display for IntVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntVal::NegInfinity => write!(f, "-infinity"),
            IntVal::Finite(v) => write!(f, "{}", v),
            IntVal::PosInfinity => write!(f, "infinity"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntBounds {
    pub lo: IntVal,
    pub hi: IntVal,
    /// False when the bounds could not be determined; `lo` and `hi` are
    /// meaningless then.
    pub valid: bool,
}

impl IntBounds {
    fn invalid() -> Self {
        Self {
            lo: IntVal::Finite(0),
            hi: IntVal::Finite(0),
            valid: false,
        }
    }

    fn finite(self) -> Option<(i64, i64)> {
        if !self.valid {
            return None;
        }
        Some((self.lo.finite()?, self.hi.finite()?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatBounds {
    pub lo: f64,
    pub hi: f64,
    pub valid: bool,
}

impl FloatBounds {
    fn invalid() -> Self {
        Self {
            lo: 0.0,
            hi: 0.0,
            valid: false,
        }
    }
}

impl Evaluator<'_> {
    pub fn int_bounds(&mut self, e: ExprId) -> IntBounds {
        let _span = debug_span!("int_bounds").entered();
        let mut walk: Walk<'_, '_, IntRange> = Walk::new(self);
        walk.run_int(e);
        match walk.result() {
            Some((lo, hi)) => IntBounds { lo, hi, valid: true },
            None => IntBounds::invalid(),
        }
    }

    pub fn float_bounds(&mut self, e: ExprId) -> FloatBounds {
        let _span = debug_span!("float_bounds").entered();
        let mut walk: Walk<'_, '_, FloatRange> = Walk::new(self);
        walk.run_float(e);
        match walk.result() {
            Some((lo, hi)) => FloatBounds { lo, hi, valid: true },
            None => FloatBounds::invalid(),
        }
    }

    /// A superset of the values a set expression can take; `None` when no
    /// finite superset is known.
    pub fn intset_bounds(&mut self, e: ExprId) -> Option<IntSetVal> {
        let _span = debug_span!("intset_bounds").entered();
        let mut walk: Walk<'_, '_, IntSetVal> = Walk::new(self);
        walk.run_set(e);
        walk.result()
    }
}

// ── Walker ───────────────────────────────────────────────────────

trait Bound: Clone {
    /// Pushed in place of a bound that could not be computed.
    fn placeholder() -> Self;
}

impl Bound for (IntVal, IntVal) {
    fn placeholder() -> Self {
        (IntVal::Finite(0), IntVal::Finite(0))
    }
}

impl Bound for (f64, f64) {
    fn placeholder() -> Self {
        (0.0, 0.0)
    }
}

impl Bound for IntSetVal {
    fn placeholder() -> Self {
        IntSetVal::empty()
    }
}

struct Walk<'a, 'm, B> {
    ev: &'a mut Evaluator<'m>,
    stack: Vec<B>,
    valid: bool,
}

impl<'a, 'm, B: Bound> Walk<'a, 'm, B> {
    fn new(ev: &'a mut Evaluator<'m>) -> Self {
        Self {
            ev,
            stack: Vec::new(),
            valid: true,
        }
    }

    fn push(&mut self, b: B) {
        self.stack.push(b);
    }

    fn pop(&mut self) -> B {
        match self.stack.pop() {
            Some(b) => b,
            None => {
                self.valid = false;
                B::placeholder()
            }
        }
    }

    fn fail(&mut self) {
        self.valid = false;
        self.stack.push(B::placeholder());
    }

    fn result(self) -> Option<B> {
        if self.valid {
            self.stack.last().cloned()
        } else {
            None
        }
    }

    /// Annotations and arrays have no bounds of their own.
    fn skipped(&self, e: ExprId) -> bool {
        let ty = self.ev.ty(e);
        ty.is_ann() || ty.dim() > 0
    }

    /// Declaration an array expression reads from, following identifiers
    /// bound to other arrays.
    fn array_decl(&self, array: ExprId) -> Option<DeclId> {
        let model = &*self.ev.model;
        let mut d = model.follow_flat(model.id_decl(array)?);
        for _ in 0..model.decls.len() {
            match model.decls[d].init.and_then(|init| model.id_decl(init)) {
                Some(next) => d = model.follow_flat(next),
                None => break,
            }
        }
        Some(d)
    }

    /// Element of a declared array literal at fixed indices.
    fn fixed_element(&mut self, d: DeclId, indices: &[ExprId]) -> Option<ExprId> {
        if !indices.iter().all(|&i| self.ev.ty(i).is_par()) {
            return None;
        }
        let init = self.ev.model.decls[d].init?;
        if !matches!(self.ev.model.exprs[init].kind, ExprKind::ArrayLit { .. }) {
            return None;
        }
        let mut idx = Vec::with_capacity(indices.len());
        for &i in indices {
            idx.push(self.ev.eval::<IntKind>(i).ok()?);
        }
        self.ev.element(init, &idx)
    }

    fn domain(&self, d: DeclId) -> Option<ExprId> {
        self.ev.model.type_insts[self.ev.model.decls[d].ti].domain
    }
}

// ── Integer bounds ───────────────────────────────────────────────

type IntRange = (IntVal, IntVal);

impl Walk<'_, '_, IntRange> {
    fn run_int(&mut self, e: ExprId) {
        if !self.enter_int(e) {
            return;
        }
        let kind = self.ev.model.exprs[e].kind.clone();
        match &kind {
            ExprKind::BinOp { lhs, rhs, .. } => {
                self.run_int(*lhs);
                self.run_int(*rhs);
            }
            ExprKind::UnOp { arg, .. } => self.run_int(*arg),
            ExprKind::ArrayAccess { indices, .. } => {
                for &i in indices {
                    self.run_int(i);
                }
            }
            _ => {}
        }
        self.visit_int(kind);
    }

    fn enter_int(&mut self, e: ExprId) -> bool {
        if self.skipped(e) {
            return false;
        }
        let ty = self.ev.ty(e);
        if ty.is_par() {
            let value = if ty.is_int() { self.ev.eval::<IntKind>(e).ok() } else { None };
            match value {
                Some(v) => self.push((v.into(), v.into())),
                None => self.fail(),
            }
            return false;
        }
        if let ExprKind::Ite {
            branches,
            else_branch,
        } = self.ev.model.exprs[e].kind.clone()
        {
            self.ite_int(&branches, else_branch);
            return false;
        }
        ty.is_int()
    }

    fn bounds_of(&mut self, e: ExprId) -> IntRange {
        self.run_int(e);
        self.pop()
    }

    /// Branches under a fixed false condition are never taken; a fixed true
    /// condition cuts off the branches after it.
    fn ite_int(&mut self, branches: &[(ExprId, ExprId)], else_branch: ExprId) {
        let (mut lo, mut hi) = (IntVal::PosInfinity, IntVal::NegInfinity);
        for &(cond, then) in branches {
            let cty = self.ev.ty(cond);
            if cty.is_par() && !cty.cv() {
                match self.ev.eval::<BoolKind>(cond) {
                    Ok(true) => {
                        let (l, h) = self.bounds_of(then);
                        self.push((lo.min(l), hi.max(h)));
                        return;
                    }
                    Ok(false) => continue,
                    Err(_) => return self.fail(),
                }
            }
            let (l, h) = self.bounds_of(then);
            lo = lo.min(l);
            hi = hi.max(h);
        }
        let (l, h) = self.bounds_of(else_branch);
        self.push((lo.min(l), hi.max(h)));
    }

    fn visit_int(&mut self, kind: ExprKind) {
        match kind {
            ExprKind::Id { decl: Some(d), .. } => self.id_int(d),
            ExprKind::ArrayAccess { array, indices } => {
                for _ in &indices {
                    self.pop();
                }
                self.access_int(array, &indices);
            }
            ExprKind::BinOp { op, .. } => {
                let b = self.pop();
                let a = self.pop();
                self.binop_int(op, a, b);
            }
            ExprKind::UnOp {
                op: UnOpKind::Minus,
                ..
            } => {
                let (lo, hi) = self.pop();
                self.push((hi.neg(), lo.neg()));
            }
            ExprKind::UnOp {
                op: UnOpKind::Plus, ..
            } => {}
            ExprKind::Call { name, args, .. } => self.call_int(&name, &args),
            _ => self.fail(),
        }
    }

    fn id_int(&mut self, d: DeclId) {
        let d = self.ev.model.follow_flat(d);
        if let Some(dom) = self.domain(d) {
            match self.ev.eval::<IntSetKind>(dom) {
                Ok(set) => match (set.min(), set.max()) {
                    (Some(lo), Some(hi)) => self.push((lo.into(), hi.into())),
                    _ => self.fail(),
                },
                Err(_) => self.fail(),
            }
        } else if let Some(init) = self.ev.model.decls[d].init {
            let b = self.bounds_of(init);
            self.push(b);
        } else {
            // unconstrained
            self.valid = false;
            self.push((IntVal::NegInfinity, IntVal::PosInfinity));
        }
    }

    fn access_int(&mut self, array: ExprId, indices: &[ExprId]) {
        let Some(d) = self.array_decl(array) else {
            return self.fail();
        };
        if let Some(elem) = self.fixed_element(d, indices) {
            let b = self.bounds_of(elem);
            return self.push(b);
        }
        let set = match self.domain(d) {
            Some(dom) => self.ev.eval::<IntSetKind>(dom).ok(),
            None => None,
        };
        match set.and_then(|s| Some((s.min()?, s.max()?))) {
            Some((lo, hi)) => self.push((lo.into(), hi.into())),
            None => self.fail(),
        }
    }

    fn binop_int(&mut self, op: BinOpKind, a: IntRange, b: IntRange) {
        let (Some(a0), Some(a1), Some(b0), Some(b1)) =
            (a.0.finite(), a.1.finite(), b.0.finite(), b.1.finite())
        else {
            return self.fail();
        };
        let r = match op {
            BinOpKind::Plus => a0.checked_add(b0).zip(a1.checked_add(b1)),
            BinOpKind::Minus => a0.checked_sub(b1).zip(a1.checked_sub(b0)),
            BinOpKind::Mult => corners(&[a0, a1], &[b0, b1], i64::checked_mul),
            BinOpKind::IDiv => {
                // extremes sit at the ends of the negative and positive
                // parts of the divisor
                let divisors: Vec<i64> = [b0, b1, -1, 1]
                    .into_iter()
                    .filter(|&v| v != 0 && b0 <= v && v <= b1)
                    .collect();
                corners(&[a0, a1], &divisors, i64::checked_div)
            }
            BinOpKind::Mod => {
                let m = b0.unsigned_abs().max(b1.unsigned_abs());
                if m == 0 {
                    None
                } else {
                    let m = i64::try_from(m - 1).unwrap_or(i64::MAX);
                    let lo = if a0 >= 0 { 0 } else { a0.max(-m) };
                    let hi = if a1 <= 0 { 0 } else { a1.min(m) };
                    Some((lo, hi))
                }
            }
            _ => None,
        };
        match r {
            Some((lo, hi)) => self.push((lo.into(), hi.into())),
            None => self.fail(),
        }
    }

    fn call_int(&mut self, name: &str, args: &[ExprId]) {
        match (name, args) {
            ("lin_exp", [coeffs, xs, c]) => self.linear_int(Some(*coeffs), *xs, Some(*c)),
            ("sum", [xs]) => self.linear_int(None, *xs, None),
            ("card", [s]) => match self.ev.intset_bounds(*s) {
                Some(set) => {
                    let card = i64::try_from(set.card()).map_or(IntVal::PosInfinity, IntVal::Finite);
                    self.push((IntVal::Finite(0), card));
                }
                None => self.fail(),
            },
            ("int_times", [a, b]) => {
                let a = self.bounds_of(*a);
                let b = self.bounds_of(*b);
                self.binop_int(BinOpKind::Mult, a, b);
            }
            ("bool2int", [_]) => self.push((IntVal::Finite(0), IntVal::Finite(1))),
            ("abs", [x]) => {
                let (lo, hi) = self.bounds_of(*x);
                let zero = IntVal::Finite(0);
                if lo >= zero {
                    self.push((lo, hi));
                } else if hi < zero {
                    self.push((hi.neg(), lo.neg()));
                } else {
                    self.push((zero, lo.neg().max(hi)));
                }
            }
            ("min" | "max", [a, b]) => {
                let (a0, a1) = self.bounds_of(*a);
                let (b0, b1) = self.bounds_of(*b);
                if name == "min" {
                    self.push((a0.min(b0), a1.min(b1)));
                } else {
                    self.push((a0.max(b0), a1.max(b1)));
                }
            }
            _ => self.fail(),
        }
    }

    /// `sum(xs)` or `lin_exp(coeffs, xs, c)`.
    fn linear_int(&mut self, coeffs: Option<ExprId>, xs: ExprId, c: Option<ExprId>) {
        match self.linear_int_range(coeffs, xs, c) {
            Some(b) => self.push(b),
            None => self.fail(),
        }
    }

    /// Infinite element bounds carry through to the side the coefficient's
    /// sign puts them on.
    fn linear_int_range(&mut self, coeffs: Option<ExprId>, xs: ExprId, c: Option<ExprId>) -> Option<IntRange> {
        if self.ev.ty(xs).is_opt() {
            return None;
        }
        let (elems, _) = self.ev.array_elems(xs).ok()?;
        let coeffs = match coeffs {
            Some(a) => {
                let (cs, _) = self.ev.array_elems(a).ok()?;
                let mut values = Vec::with_capacity(cs.len());
                for x in cs {
                    values.push(self.ev.eval::<IntKind>(x).ok()?);
                }
                values
            }
            None => vec![1; elems.len()],
        };
        let d = match c {
            Some(c) => self.ev.eval::<IntKind>(c).ok()?,
            None => 0,
        };
        if coeffs.len() != elems.len() {
            return None;
        }
        let (mut lo, mut hi) = (IntVal::Finite(d), IntVal::Finite(d));
        for (k, x) in coeffs.into_iter().zip(elems) {
            let b = self.ev.int_bounds(x);
            if !b.valid {
                return None;
            }
            let (l, h) = (b.lo.scale(k), b.hi.scale(k));
            lo = lo.plus(l.min(h))?;
            hi = hi.plus(l.max(h))?;
        }
        Some((lo, hi))
    }
}

/// Smallest and largest `f(a, b)` over the given candidates.
fn corners(xs: &[i64], ys: &[i64], f: fn(i64, i64) -> Option<i64>) -> Option<(i64, i64)> {
    let mut out: Option<(i64, i64)> = None;
    for &x in xs {
        for &y in ys {
            let v = f(x, y)?;
            out = Some(match out {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
    }
    out
}

// ── Float bounds ─────────────────────────────────────────────────

type FloatRange = (f64, f64);

impl Walk<'_, '_, FloatRange> {
    fn run_float(&mut self, e: ExprId) {
        if !self.enter_float(e) {
            return;
        }
        let kind = self.ev.model.exprs[e].kind.clone();
        match &kind {
            ExprKind::BinOp { lhs, rhs, .. } => {
                self.run_float(*lhs);
                self.run_float(*rhs);
            }
            ExprKind::UnOp { arg, .. } => self.run_float(*arg),
            _ => {}
        }
        self.visit_float(kind);
    }

    fn enter_float(&mut self, e: ExprId) -> bool {
        if self.skipped(e) {
            return false;
        }
        let ty = self.ev.ty(e);
        if ty.is_par() {
            let value = if ty.is_float() || ty.is_int() {
                self.ev.eval::<FloatKind>(e).ok()
            } else {
                None
            };
            match value {
                Some(v) => self.push((v, v)),
                None => self.fail(),
            }
            return false;
        }
        if let ExprKind::Ite {
            branches,
            else_branch,
        } = self.ev.model.exprs[e].kind.clone()
        {
            self.ite_float(&branches, else_branch);
            return false;
        }
        ty.is_float()
    }

    fn bounds_of(&mut self, e: ExprId) -> FloatRange {
        self.run_float(e);
        self.pop()
    }

    fn ite_float(&mut self, branches: &[(ExprId, ExprId)], else_branch: ExprId) {
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(cond, then) in branches {
            let cty = self.ev.ty(cond);
            if cty.is_par() && !cty.cv() {
                match self.ev.eval::<BoolKind>(cond) {
                    Ok(true) => {
                        let (l, h) = self.bounds_of(then);
                        self.push((lo.min(l), hi.max(h)));
                        return;
                    }
                    Ok(false) => continue,
                    Err(_) => return self.fail(),
                }
            }
            let (l, h) = self.bounds_of(then);
            lo = lo.min(l);
            hi = hi.max(h);
        }
        let (l, h) = self.bounds_of(else_branch);
        self.push((lo.min(l), hi.max(h)));
    }

    fn visit_float(&mut self, kind: ExprKind) {
        match kind {
            ExprKind::Id { decl: Some(d), .. } => {
                let d = self.ev.model.follow_flat(d);
                if let Some(dom) = self.domain(d) {
                    match self.float_domain(dom) {
                        Some(b) => self.push(b),
                        None => self.fail(),
                    }
                } else if let Some(init) = self.ev.model.decls[d].init {
                    let b = self.bounds_of(init);
                    self.push(b);
                } else {
                    self.fail();
                }
            }
            ExprKind::ArrayAccess { array, indices } => self.access_float(array, &indices),
            ExprKind::BinOp { op, .. } => {
                let (b0, b1) = self.pop();
                let (a0, a1) = self.pop();
                let r = match op {
                    BinOpKind::Plus => Some((a0 + b0, a1 + b1)),
                    BinOpKind::Minus => Some((a0 - b1, a1 - b0)),
                    BinOpKind::Mult => Some(float_hull(&[a0 * b0, a0 * b1, a1 * b0, a1 * b1])),
                    // divisor range must exclude zero
                    BinOpKind::Div if b0 > 0.0 || b1 < 0.0 => {
                        Some(float_hull(&[a0 / b0, a0 / b1, a1 / b0, a1 / b1]))
                    }
                    _ => None,
                };
                match r {
                    Some(b) => self.push(b),
                    None => self.fail(),
                }
            }
            ExprKind::UnOp {
                op: UnOpKind::Minus,
                ..
            } => {
                let (lo, hi) = self.pop();
                self.push((-hi, -lo));
            }
            ExprKind::UnOp {
                op: UnOpKind::Plus, ..
            } => {}
            ExprKind::Call { name, args, .. } => self.call_float(&name, &args),
            _ => self.fail(),
        }
    }

    /// `lo..hi` domain of a float declaration.
    fn float_domain(&mut self, dom: ExprId) -> Option<FloatRange> {
        let ExprKind::BinOp {
            op: BinOpKind::DotDot,
            lhs,
            rhs,
            ..
        } = self.ev.model.exprs[dom].kind
        else {
            return None;
        };
        let lo = self.ev.eval::<FloatKind>(lhs).ok()?;
        let hi = self.ev.eval::<FloatKind>(rhs).ok()?;
        Some((lo, hi))
    }

    fn access_float(&mut self, array: ExprId, indices: &[ExprId]) {
        let Some(d) = self.array_decl(array) else {
            return self.fail();
        };
        if let Some(elem) = self.fixed_element(d, indices) {
            let b = self.bounds_of(elem);
            return self.push(b);
        }
        match self.domain(d).and_then(|dom| self.float_domain(dom)) {
            Some(b) => self.push(b),
            None => self.fail(),
        }
    }

    fn call_float(&mut self, name: &str, args: &[ExprId]) {
        match (name, args) {
            ("int2float", [x]) => match self.ev.int_bounds(*x).finite() {
                Some((lo, hi)) => self.push((lo as f64, hi as f64)),
                None => self.fail(),
            },
            ("bool2float", [_]) => self.push((0.0, 1.0)),
            ("abs", [x]) => {
                let (lo, hi) = self.bounds_of(*x);
                if lo >= 0.0 {
                    self.push((lo, hi));
                } else if hi < 0.0 {
                    self.push((-hi, -lo));
                } else {
                    self.push((0.0, (-lo).max(hi)));
                }
            }
            ("lin_exp", [coeffs, xs, c]) => self.linear_float(Some(*coeffs), *xs, Some(*c)),
            ("sum", [xs]) => self.linear_float(None, *xs, None),
            _ => self.fail(),
        }
    }

    fn linear_float(&mut self, coeffs: Option<ExprId>, xs: ExprId, c: Option<ExprId>) {
        match self.linear_float_range(coeffs, xs, c) {
            Some(b) => self.push(b),
            None => self.fail(),
        }
    }

    fn linear_float_range(&mut self, coeffs: Option<ExprId>, xs: ExprId, c: Option<ExprId>) -> Option<FloatRange> {
        if self.ev.ty(xs).is_opt() {
            return None;
        }
        let (elems, _) = self.ev.array_elems(xs).ok()?;
        let coeffs = match coeffs {
            Some(a) => {
                let (cs, _) = self.ev.array_elems(a).ok()?;
                let mut values = Vec::with_capacity(cs.len());
                for x in cs {
                    values.push(self.ev.eval::<FloatKind>(x).ok()?);
                }
                values
            }
            None => vec![1.0; elems.len()],
        };
        let d = match c {
            Some(c) => self.ev.eval::<FloatKind>(c).ok()?,
            None => 0.0,
        };
        if coeffs.len() != elems.len() {
            return None;
        }
        let (mut lo, mut hi) = (d, d);
        for (k, x) in coeffs.into_iter().zip(elems) {
            let b = self.ev.float_bounds(x);
            if !b.valid {
                return None;
            }
            // 0 * infinity is NaN; the term contributes nothing
            if k == 0.0 {
                continue;
            }
            let (l, h) = (k * b.lo, k * b.hi);
            lo += l.min(h);
            hi += l.max(h);
        }
        // infinity - infinity
        if lo.is_nan() || hi.is_nan() {
            return None;
        }
        Some((lo, hi))
    }
}

fn float_hull(values: &[f64]) -> FloatRange {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

// ── Set bounds ───────────────────────────────────────────────────

impl Walk<'_, '_, IntSetVal> {
    fn run_set(&mut self, e: ExprId) {
        if !self.enter_set(e) {
            return;
        }
        let kind = self.ev.model.exprs[e].kind.clone();
        if let ExprKind::BinOp {
            op, lhs, rhs, ..
        } = &kind
        {
            if *op != BinOpKind::DotDot {
                self.run_set(*lhs);
                self.run_set(*rhs);
            }
        }
        self.visit_set(kind);
    }

    fn enter_set(&mut self, e: ExprId) -> bool {
        if self.skipped(e) {
            return false;
        }
        let ty = self.ev.ty(e);
        if !ty.is_int_set() {
            self.fail();
            return false;
        }
        if ty.is_par() {
            match self.ev.eval::<IntSetKind>(e) {
                Ok(set) => self.push(set),
                Err(_) => self.fail(),
            }
            return false;
        }
        true
    }

    fn bounds_of(&mut self, e: ExprId) -> IntSetVal {
        self.run_set(e);
        self.pop()
    }

    fn visit_set(&mut self, kind: ExprKind) {
        match kind {
            ExprKind::SetLit(elems) => {
                let mut ranges = Vec::with_capacity(elems.len());
                for x in elems {
                    match self.ev.int_bounds(x).finite() {
                        Some(r) => ranges.push(r),
                        None => return self.fail(),
                    }
                }
                self.push(IntSetVal::from_ranges(ranges));
            }
            ExprKind::Id { decl: Some(d), .. } => {
                let d = self.ev.model.follow_flat(d);
                if let Some(dom) = self.domain(d) {
                    match self.ev.eval::<IntSetKind>(dom) {
                        Ok(set) => self.push(set),
                        Err(_) => self.fail(),
                    }
                } else if let Some(init) = self.ev.model.decls[d].init {
                    let b = self.bounds_of(init);
                    self.push(b);
                } else {
                    self.fail();
                }
            }
            ExprKind::ArrayAccess { array, indices } => {
                let Some(d) = self.array_decl(array) else {
                    return self.fail();
                };
                if let Some(elem) = self.fixed_element(d, &indices) {
                    let b = self.bounds_of(elem);
                    return self.push(b);
                }
                let set = self.domain(d).and_then(|dom| self.ev.eval::<IntSetKind>(dom).ok());
                match set {
                    Some(set) => self.push(set),
                    None => self.fail(),
                }
            }
            ExprKind::BinOp {
                op: BinOpKind::DotDot,
                lhs,
                rhs,
                ..
            } => {
                let lo = self.ev.int_bounds(lhs);
                let hi = self.ev.int_bounds(rhs);
                match (lo.valid, lo.lo.finite(), hi.valid, hi.hi.finite()) {
                    (true, Some(lo), true, Some(hi)) => self.push(IntSetVal::range(lo, hi)),
                    _ => self.fail(),
                }
            }
            ExprKind::BinOp { op, .. } => {
                let b = self.pop();
                let a = self.pop();
                match op {
                    BinOpKind::Union | BinOpKind::Intersect => self.push(a.union(&b)),
                    BinOpKind::Diff => self.push(a),
                    _ => self.fail(),
                }
            }
            ExprKind::Call { name, args, .. } => match (name.as_str(), args.as_slice()) {
                ("set_union" | "set_intersect", [a, b]) => {
                    let a = self.bounds_of(*a);
                    let b = self.bounds_of(*b);
                    self.push(a.union(&b));
                }
                ("set_diff", [a, _]) => {
                    let a = self.bounds_of(*a);
                    self.push(a);
                }
                _ => self.fail(),
            },
            _ => self.fail(),
        }
    }
}
