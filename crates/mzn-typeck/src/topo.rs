use la_arena::ArenaMap;
use mzn_ast::*;
use smol_str::SmolStr;
use std::collections::HashMap;
use tracing::trace;

use crate::error::TypeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    InProgress,
    Done(usize),
}

/// Dependency resolver: binds identifiers to declarations and orders
/// declarations so that each comes after everything its type-inst and
/// initializer refer to.
#[derive(Debug, Default)]
pub struct TopoSorter {
    /// Declarations in scope per name; the last entry shadows the rest.
    scopes: HashMap<SmolStr, Vec<DeclId>>,
    pos: ArenaMap<DeclId, Position>,
    /// Emitted order.
    pub decls: Vec<DeclId>,
}

impl TopoSorter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, model: &Model, d: DeclId, unique: bool) -> Result<(), TypeError> {
        let decl = &model.decls[d];
        let stack = self.scopes.entry(decl.name.clone()).or_default();
        if unique && !stack.is_empty() {
            return Err(TypeError::duplicate(&decl.name, decl.span));
        }
        stack.push(d);
        Ok(())
    }

    pub fn remove(&mut self, model: &Model, d: DeclId) {
        let name = &model.decls[d].name;
        if let Some(stack) = self.scopes.get_mut(name) {
            stack.pop();
            if stack.is_empty() {
                self.scopes.remove(name);
            }
        }
    }

    /// Innermost declaration of `name`.
    pub fn get(&self, name: &SmolStr, span: Span) -> Result<DeclId, TypeError> {
        self.scopes
            .get(name)
            .and_then(|stack| stack.last().copied())
            .ok_or_else(|| TypeError::undefined(name, span))
    }

    /// Order index of a finished declaration.
    pub fn position(&self, d: DeclId) -> Option<usize> {
        match self.pos.get(d) {
            Some(Position::Done(i)) => Some(*i),
            _ => None,
        }
    }

    fn check_id(&mut self, model: &mut Model, name: &SmolStr, span: Span) -> Result<DeclId, TypeError> {
        let d = self.get(name, span)?;
        match self.pos.get(d) {
            None => self.run_decl(model, d)?,
            Some(Position::InProgress) => return Err(TypeError::circular(name, span)),
            Some(Position::Done(_)) => {}
        }
        trace!(%name, "resolved identifier");
        Ok(d)
    }

    /// Visit a declaration once: its type-inst and initializer first, then
    /// the declaration itself takes the next position.
    pub fn run_decl(&mut self, model: &mut Model, d: DeclId) -> Result<(), TypeError> {
        if self.pos.get(d).is_some() {
            return Ok(());
        }
        self.pos.insert(d, Position::InProgress);
        let (ti, init, ann) = {
            let decl = &model.decls[d];
            (decl.ti, decl.init, decl.ann.clone())
        };
        self.run_type_inst(model, ti)?;
        if let Some(init) = init {
            self.run(model, init)?;
        }
        self.decls.push(d);
        self.pos.insert(d, Position::Done(self.decls.len() - 1));
        for a in ann {
            self.run(model, a)?;
        }
        Ok(())
    }

    pub fn run_type_inst(&mut self, model: &mut Model, ti: TypeInstId) -> Result<(), TypeError> {
        let (ranges, domain) = {
            let ti = &model.type_insts[ti];
            (ti.ranges.clone(), ti.domain)
        };
        for r in ranges {
            self.run_type_inst(model, r)?;
        }
        if let Some(domain) = domain {
            self.run(model, domain)?;
        }
        Ok(())
    }

    /// Resolve every identifier below `e`, binding it in place.
    pub fn run(&mut self, model: &mut Model, e: ExprId) -> Result<(), TypeError> {
        let span = model.exprs[e].span;
        match model.exprs[e].kind.clone() {
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::StringLit(_)
            | ExprKind::IntSetLit(_)
            | ExprKind::Absent
            | ExprKind::AnonVar
            | ExprKind::TiId(_) => {}
            ExprKind::SetLit(elems) | ExprKind::ArrayLit { elems, .. } => {
                for x in elems {
                    self.run(model, x)?;
                }
            }
            ExprKind::Id { name, .. } => {
                let d = self.check_id(model, &name, span)?;
                if let ExprKind::Id { decl, .. } = &mut model.exprs[e].kind {
                    *decl = Some(d);
                }
            }
            ExprKind::ArrayAccess { array, indices } => {
                self.run(model, array)?;
                for i in indices {
                    self.run(model, i)?;
                }
            }
            ExprKind::Comprehension(c) => {
                for g in &c.generators {
                    self.run(model, g.source)?;
                    for d in &g.decls {
                        self.add(model, *d, false)?;
                    }
                }
                if let Some(w) = c.where_clause {
                    self.run(model, w)?;
                }
                self.run(model, c.body)?;
                for g in &c.generators {
                    for d in &g.decls {
                        self.remove(model, *d);
                    }
                }
            }
            ExprKind::Ite {
                branches,
                else_branch,
            } => {
                for (cond, then) in branches {
                    self.run(model, cond)?;
                    self.run(model, then)?;
                }
                self.run(model, else_branch)?;
            }
            ExprKind::BinOp { lhs, rhs, .. } => {
                self.run(model, lhs)?;
                self.run(model, rhs)?;
            }
            ExprKind::UnOp { arg, .. } => self.run(model, arg)?,
            ExprKind::Call { args, .. } => {
                for a in args {
                    self.run(model, a)?;
                }
            }
            ExprKind::Let(l) => self.run_let(model, e, l)?,
        }
        let ann = model.exprs[e].ann.clone();
        for a in ann {
            self.run(model, a)?;
        }
        Ok(())
    }

    fn run_let(&mut self, model: &mut Model, e: ExprId, l: Let) -> Result<(), TypeError> {
        for item in &l.items {
            match *item {
                LetItem::Decl(d) => {
                    self.run_decl(model, d)?;
                    self.add(model, d, false)?;
                }
                LetItem::Constraint(c) => self.run(model, c)?,
            }
        }
        self.run(model, l.body)?;

        // declarations first, in resolution order; constraints keep their order
        let mut items = l.items.clone();
        items.sort_by_key(|item| match item {
            LetItem::Decl(d) => (0, self.position(*d).unwrap_or(usize::MAX)),
            LetItem::Constraint(_) => (1, 0),
        });
        let orig = items
            .iter()
            .map(|item| match item {
                LetItem::Decl(d) => model.decls[*d].init,
                LetItem::Constraint(_) => None,
            })
            .collect();
        for item in &items {
            if let LetItem::Decl(d) = item {
                self.remove(model, *d);
            }
        }
        if let ExprKind::Let(slot) = &mut model.exprs[e].kind {
            slot.items = items;
            slot.orig = orig;
        }
        Ok(())
    }
}
