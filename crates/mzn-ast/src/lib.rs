pub mod build;
pub mod intset;
pub mod types;

use la_arena::{Arena, Idx};
use smol_str::SmolStr;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

pub use intset::IntSetVal;
pub use types::{BaseType, Inst, OptType, SetType, Type};

// ── Source locations ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

// ── ID types ──────────────────────────────────────────────────────

pub type ExprId = Idx<Expr>;
pub type DeclId = Idx<VarDecl>;
pub type TypeInstId = Idx<TypeInst>;
pub type FnId = Idx<FunctionItem>;

// ── Expressions ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    /// Assigned by the type checker; literals are typed at construction.
    pub ty: Type,
    pub span: Span,
    pub ann: Vec<ExprId>,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    StringLit(SmolStr),
    /// Set literal with element expressions: `{1, x, 3}`
    SetLit(Vec<ExprId>),
    /// Set of int in range form, produced by evaluation.
    IntSetLit(IntSetVal),
    /// The absent value `<>`
    Absent,
    /// Anonymous variable `_`
    AnonVar,
    /// Identifier, bound to its declaration by the dependency resolver.
    Id {
        name: SmolStr,
        decl: Option<DeclId>,
    },
    /// Type-inst variable (`$T`, or `$_` for a generic array rank)
    TiId(SmolStr),
    /// Array literal; `dims` holds one index range per dimension.
    ArrayLit {
        elems: Vec<ExprId>,
        dims: Vec<(i64, i64)>,
    },
    ArrayAccess {
        array: ExprId,
        indices: Vec<ExprId>,
    },
    Comprehension(Comprehension),
    /// `if c1 then e1 elseif c2 then e2 ... else e endif`
    Ite {
        branches: Vec<(ExprId, ExprId)>,
        else_branch: ExprId,
    },
    /// Binary operator; `decl` is set when the operator resolves to a
    /// user function with a body.
    BinOp {
        op: BinOpKind,
        lhs: ExprId,
        rhs: ExprId,
        decl: Option<FnId>,
    },
    UnOp {
        op: UnOpKind,
        arg: ExprId,
        decl: Option<FnId>,
    },
    /// Function, predicate or annotation call; `decl` is the resolved overload.
    Call {
        name: SmolStr,
        args: Vec<ExprId>,
        decl: Option<FnId>,
    },
    Let(Let),
}

#[derive(Debug, Clone)]
pub struct Comprehension {
    pub body: ExprId,
    pub generators: Vec<Generator>,
    pub where_clause: Option<ExprId>,
    /// `{ e | ... }` rather than `[ e | ... ]`
    pub is_set: bool,
}

/// `i, j in S`: every declaration ranges over the same source.
#[derive(Debug, Clone)]
pub struct Generator {
    pub decls: Vec<DeclId>,
    pub source: ExprId,
}

#[derive(Debug, Clone)]
pub struct Let {
    pub items: Vec<LetItem>,
    pub body: ExprId,
    /// Pristine initializer of each binding, parallel to `items`.
    /// Filled in by the dependency resolver.
    pub orig: Vec<Option<ExprId>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetItem {
    Decl(DeclId),
    Constraint(ExprId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOpKind {
    Plus,
    Minus,
    Mult,
    Div,
    IDiv,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    In,
    Subset,
    Superset,
    Union,
    Diff,
    SymDiff,
    Intersect,
    PlusPlus,
    Equiv,
    Impl,
    RImpl,
    Or,
    And,
    Xor,
    DotDot,
}

impl BinOpKind {
    /// Operator name as it appears in the function table.
    pub fn as_str(self) -> &'static str {
        match self {
            BinOpKind::Plus => "+",
            BinOpKind::Minus => "-",
            BinOpKind::Mult => "*",
            BinOpKind::Div => "/",
            BinOpKind::IDiv => "div",
            BinOpKind::Mod => "mod",
            BinOpKind::Lt => "<",
            BinOpKind::Le => "<=",
            BinOpKind::Gt => ">",
            BinOpKind::Ge => ">=",
            BinOpKind::Eq => "=",
            BinOpKind::Ne => "!=",
            BinOpKind::In => "in",
            BinOpKind::Subset => "subset",
            BinOpKind::Superset => "superset",
            BinOpKind::Union => "union",
            BinOpKind::Diff => "diff",
            BinOpKind::SymDiff => "symdiff",
            BinOpKind::Intersect => "intersect",
            BinOpKind::PlusPlus => "++",
            BinOpKind::Equiv => "<->",
            BinOpKind::Impl => "->",
            BinOpKind::RImpl => "<-",
            BinOpKind::Or => "\\/",
            BinOpKind::And => "/\\",
            BinOpKind::Xor => "xor",
            BinOpKind::DotDot => "..",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOpKind {
    Not,
    Plus,
    Minus,
}

impl UnOpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UnOpKind::Not => "not",
            UnOpKind::Plus => "+",
            UnOpKind::Minus => "-",
        }
    }
}

// ── Declarations ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: SmolStr,
    pub ti: TypeInstId,
    pub init: Option<ExprId>,
    pub ty: Type,
    pub span: Span,
    pub ann: Vec<ExprId>,
    /// Declared directly in the item list of a model.
    pub toplevel: bool,
    /// Synthesised by a compilation stage rather than written by the author.
    pub introduced: bool,
    /// Value fixed by a functional constraint.
    pub defined: bool,
    /// `init` holds a memoised literal.
    pub evaluated: bool,
    /// Stand-in declaration after lowering; the evaluator follows this chain.
    pub flat: Option<DeclId>,
}

/// Type-instance expression: `array[1..3] of var 0..9`.
#[derive(Debug, Clone)]
pub struct TypeInst {
    /// Declared inst, set-ness and optionality; the base may be unknown
    /// until the domain has been typed.
    pub ty: Type,
    pub ranges: Vec<TypeInstId>,
    pub domain: Option<ExprId>,
    pub span: Span,
}

/// Function, predicate, test or operator declaration. Builtins have no body.
#[derive(Debug, Clone)]
pub struct FunctionItem {
    pub name: SmolStr,
    pub params: Vec<DeclId>,
    pub ret: TypeInstId,
    pub body: Option<ExprId>,
    pub ann: Vec<ExprId>,
    pub span: Span,
}

// ── Items ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Item {
    /// Index into [`Model::includes`].
    Include(usize),
    VarDecl(DeclId),
    Assign(AssignItem),
    Constraint(ExprId),
    Solve(SolveItem),
    Output(ExprId),
    Function(FnId),
}

/// `x = e;` given separately from the declaration of `x`.
#[derive(Debug, Clone)]
pub struct AssignItem {
    pub name: SmolStr,
    pub value: ExprId,
    pub decl: Option<DeclId>,
}

#[derive(Debug, Clone)]
pub struct SolveItem {
    pub goal: SolveGoal,
    pub ann: Vec<ExprId>,
}

#[derive(Debug, Clone, Copy)]
pub enum SolveGoal {
    Satisfy,
    Minimize(ExprId),
    Maximize(ExprId),
}

#[derive(Debug, Clone)]
pub struct ItemSlot {
    pub item: Item,
    pub span: Span,
    /// Merged into another item; dropped by [`Model::compact`].
    pub removed: bool,
}

/// An included sub-model. Its nodes live in the including model's arenas.
#[derive(Debug, Clone)]
pub struct Included {
    pub name: SmolStr,
    pub items: Vec<ItemSlot>,
}

/// Location of an item: in the root model or in one of its includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemPath {
    pub include: Option<usize>,
    pub index: usize,
}

// ── GC pause ──────────────────────────────────────────────────────

/// Scoped pause of [`Model::compact`]. Released on drop.
#[derive(Debug)]
pub struct GcLock {
    pauses: Rc<Cell<u32>>,
}

impl Drop for GcLock {
    fn drop(&mut self) {
        self.pauses.set(self.pauses.get().saturating_sub(1));
    }
}

// ── Model ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Model {
    pub items: Vec<ItemSlot>,
    pub includes: Vec<Included>,
    pub exprs: Arena<Expr>,
    pub decls: Arena<VarDecl>,
    pub type_insts: Arena<TypeInst>,
    pub functions: Arena<FunctionItem>,
    /// Overloads per name, kept most specific first by the type checker.
    pub fn_table: HashMap<SmolStr, Vec<FnId>>,
    gc_pauses: Rc<Cell<u32>>,
}

impl Model {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            includes: Vec::new(),
            exprs: Arena::new(),
            decls: Arena::new(),
            type_insts: Arena::new(),
            functions: Arena::new(),
            fn_table: HashMap::new(),
            gc_pauses: Rc::new(Cell::new(0)),
        }
    }

    pub fn gc_lock(&self) -> GcLock {
        self.gc_pauses.set(self.gc_pauses.get() + 1);
        GcLock {
            pauses: Rc::clone(&self.gc_pauses),
        }
    }

    pub fn gc_paused(&self) -> bool {
        self.gc_pauses.get() > 0
    }

    /// Drop removed items. Returns `false` (and does nothing) while a
    /// [`GcLock`] is held.
    pub fn compact(&mut self) -> bool {
        if self.gc_paused() {
            return false;
        }
        self.items.retain(|slot| !slot.removed);
        for inc in &mut self.includes {
            inc.items.retain(|slot| !slot.removed);
        }
        true
    }

    /// Every item of the model, depth first through includes. Each
    /// included sub-model is visited once; removed items are skipped.
    pub fn item_paths(&self) -> Vec<ItemPath> {
        let mut out = Vec::new();
        let mut seen = vec![false; self.includes.len()];
        self.collect_paths(None, &mut seen, &mut out);
        out
    }

    fn collect_paths(&self, include: Option<usize>, seen: &mut [bool], out: &mut Vec<ItemPath>) {
        let items = match include {
            None => &self.items,
            Some(i) => &self.includes[i].items,
        };
        for (index, slot) in items.iter().enumerate() {
            if slot.removed {
                continue;
            }
            if let Item::Include(sub) = slot.item {
                if sub < seen.len() && !seen[sub] {
                    seen[sub] = true;
                    self.collect_paths(Some(sub), seen, out);
                }
                continue;
            }
            out.push(ItemPath { include, index });
        }
    }

    pub fn slot(&self, path: ItemPath) -> &ItemSlot {
        match path.include {
            None => &self.items[path.index],
            Some(i) => &self.includes[i].items[path.index],
        }
    }

    pub fn slot_mut(&mut self, path: ItemPath) -> &mut ItemSlot {
        match path.include {
            None => &mut self.items[path.index],
            Some(i) => &mut self.includes[i].items[path.index],
        }
    }

    /// Register a function under its name. Ordering among overloads is
    /// left to the type checker.
    pub fn register_fn(&mut self, f: FnId) {
        let name = self.functions[f].name.clone();
        let overloads = self.fn_table.entry(name).or_default();
        if !overloads.contains(&f) {
            overloads.push(f);
        }
    }

    /// Follow `flat` links to the declaration that currently stands for `d`.
    pub fn follow_flat(&self, mut d: DeclId) -> DeclId {
        // bounded by the number of decls so a malformed cycle cannot hang
        for _ in 0..self.decls.len() {
            match self.decls[d].flat {
                Some(next) if next != d => d = next,
                _ => break,
            }
        }
        d
    }

    /// Decl bound to an identifier expression, if any.
    pub fn id_decl(&self, e: ExprId) -> Option<DeclId> {
        match &self.exprs[e].kind {
            ExprKind::Id { decl, .. } => *decl,
            _ => None,
        }
    }

    /// Structural equality of two expressions. Identifiers are equal when
    /// they refer to the same declaration.
    pub fn expr_equal(&self, a: ExprId, b: ExprId) -> bool {
        if a == b {
            return true;
        }
        let (ea, eb) = (&self.exprs[a], &self.exprs[b]);
        match (&ea.kind, &eb.kind) {
            (ExprKind::IntLit(x), ExprKind::IntLit(y)) => x == y,
            (ExprKind::FloatLit(x), ExprKind::FloatLit(y)) => x == y,
            (ExprKind::BoolLit(x), ExprKind::BoolLit(y)) => x == y,
            (ExprKind::StringLit(x), ExprKind::StringLit(y)) => x == y,
            (ExprKind::IntSetLit(x), ExprKind::IntSetLit(y)) => x == y,
            (ExprKind::SetLit(x), ExprKind::SetLit(y)) => self.all_equal(x, y),
            (ExprKind::Absent, ExprKind::Absent) => true,
            (ExprKind::AnonVar, ExprKind::AnonVar) => false,
            (ExprKind::TiId(x), ExprKind::TiId(y)) => x == y,
            (
                ExprKind::Id { name: na, decl: da },
                ExprKind::Id { name: nb, decl: db },
            ) => match (da, db) {
                (Some(da), Some(db)) => self.follow_flat(*da) == self.follow_flat(*db),
                _ => na == nb,
            },
            (
                ExprKind::ArrayLit { elems: xa, dims: da },
                ExprKind::ArrayLit { elems: xb, dims: db },
            ) => da == db && self.all_equal(xa, xb),
            (
                ExprKind::ArrayAccess { array: aa, indices: ia },
                ExprKind::ArrayAccess { array: ab, indices: ib },
            ) => self.expr_equal(*aa, *ab) && self.all_equal(ia, ib),
            (
                ExprKind::Ite { branches: ba, else_branch: xa },
                ExprKind::Ite { branches: bb, else_branch: xb },
            ) => {
                ba.len() == bb.len()
                    && ba.iter().zip(bb).all(|((ca, ta), (cb, tb))| {
                        self.expr_equal(*ca, *cb) && self.expr_equal(*ta, *tb)
                    })
                    && self.expr_equal(*xa, *xb)
            }
            (
                ExprKind::BinOp { op: oa, lhs: la, rhs: ra, .. },
                ExprKind::BinOp { op: ob, lhs: lb, rhs: rb, .. },
            ) => oa == ob && self.expr_equal(*la, *lb) && self.expr_equal(*ra, *rb),
            (
                ExprKind::UnOp { op: oa, arg: xa, .. },
                ExprKind::UnOp { op: ob, arg: xb, .. },
            ) => oa == ob && self.expr_equal(*xa, *xb),
            (
                ExprKind::Call { name: na, args: xa, .. },
                ExprKind::Call { name: nb, args: xb, .. },
            ) => na == nb && self.all_equal(xa, xb),
            // comprehensions and lets bind fresh declarations
            _ => false,
        }
    }

    fn all_equal(&self, a: &[ExprId], b: &[ExprId]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.expr_equal(*x, *y))
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
