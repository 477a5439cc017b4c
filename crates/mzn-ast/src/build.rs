//! Node construction. A parser (or a test) builds models through these
//! helpers; literals receive their type here, everything else starts out
//! unknown and is typed by the checker.

use smol_str::SmolStr;

use crate::*;

impl Model {
    pub fn alloc(&mut self, kind: ExprKind, ty: Type) -> ExprId {
        self.exprs.alloc(Expr {
            kind,
            ty,
            span: Span::default(),
            ann: Vec::new(),
        })
    }

    pub fn spanned(&mut self, e: ExprId, span: Span) -> ExprId {
        self.exprs[e].span = span;
        e
    }

    pub fn annotate(&mut self, e: ExprId, ann: ExprId) -> ExprId {
        self.exprs[e].ann.push(ann);
        e
    }

    // ── Literals ────────────────────────────────────────────────

    pub fn int(&mut self, v: i64) -> ExprId {
        self.alloc(ExprKind::IntLit(v), Type::par_int())
    }

    pub fn float(&mut self, v: f64) -> ExprId {
        self.alloc(ExprKind::FloatLit(v), Type::par_float())
    }

    pub fn bool(&mut self, v: bool) -> ExprId {
        self.alloc(ExprKind::BoolLit(v), Type::par_bool())
    }

    pub fn string(&mut self, s: impl Into<SmolStr>) -> ExprId {
        self.alloc(ExprKind::StringLit(s.into()), Type::par_string())
    }

    pub fn int_set(&mut self, isv: IntSetVal) -> ExprId {
        self.alloc(ExprKind::IntSetLit(isv), Type::par_set_int())
    }

    pub fn absent(&mut self) -> ExprId {
        self.alloc(ExprKind::Absent, Type::bot().with_opt(OptType::Optional))
    }

    pub fn anon(&mut self) -> ExprId {
        self.alloc(ExprKind::AnonVar, Type::unknown())
    }

    // ── Compound expressions ────────────────────────────────────

    pub fn ident(&mut self, name: impl Into<SmolStr>) -> ExprId {
        self.alloc(
            ExprKind::Id {
                name: name.into(),
                decl: None,
            },
            Type::unknown(),
        )
    }

    /// Identifier already bound to `decl`, as produced by lowering passes.
    pub fn ident_of(&mut self, decl: DeclId) -> ExprId {
        let name = self.decls[decl].name.clone();
        let ty = self.decls[decl].ty;
        self.alloc(
            ExprKind::Id {
                name,
                decl: Some(decl),
            },
            ty,
        )
    }

    pub fn ti_id(&mut self, name: impl Into<SmolStr>) -> ExprId {
        self.alloc(ExprKind::TiId(name.into()), Type::top())
    }

    pub fn set_lit(&mut self, elems: Vec<ExprId>) -> ExprId {
        self.alloc(ExprKind::SetLit(elems), Type::unknown())
    }

    /// One-dimensional array literal indexed from 1.
    pub fn array(&mut self, elems: Vec<ExprId>) -> ExprId {
        let dims = vec![(1, elems.len() as i64)];
        self.array_with_dims(elems, dims)
    }

    pub fn array_with_dims(&mut self, elems: Vec<ExprId>, dims: Vec<(i64, i64)>) -> ExprId {
        self.alloc(ExprKind::ArrayLit { elems, dims }, Type::unknown())
    }

    pub fn access(&mut self, array: ExprId, indices: Vec<ExprId>) -> ExprId {
        self.alloc(ExprKind::ArrayAccess { array, indices }, Type::unknown())
    }

    pub fn ite(&mut self, branches: Vec<(ExprId, ExprId)>, else_branch: ExprId) -> ExprId {
        self.alloc(
            ExprKind::Ite {
                branches,
                else_branch,
            },
            Type::unknown(),
        )
    }

    pub fn binop(&mut self, lhs: ExprId, op: BinOpKind, rhs: ExprId) -> ExprId {
        self.alloc(
            ExprKind::BinOp {
                op,
                lhs,
                rhs,
                decl: None,
            },
            Type::unknown(),
        )
    }

    pub fn unop(&mut self, op: UnOpKind, arg: ExprId) -> ExprId {
        self.alloc(ExprKind::UnOp { op, arg, decl: None }, Type::unknown())
    }

    pub fn call(&mut self, name: impl Into<SmolStr>, args: Vec<ExprId>) -> ExprId {
        self.alloc(
            ExprKind::Call {
                name: name.into(),
                args,
                decl: None,
            },
            Type::unknown(),
        )
    }

    pub fn let_in(&mut self, items: Vec<LetItem>, body: ExprId) -> ExprId {
        let orig = vec![None; items.len()];
        self.alloc(ExprKind::Let(Let { items, body, orig }), Type::unknown())
    }

    /// Generator `names in source`; its declarations are typed by the checker.
    pub fn generator(&mut self, names: &[&str], source: ExprId) -> Generator {
        let decls = names
            .iter()
            .map(|name| {
                let ti = self.type_inst(Type::par_int(), None);
                self.var_decl(*name, ti, None)
            })
            .collect();
        Generator { decls, source }
    }

    pub fn comprehension(
        &mut self,
        body: ExprId,
        generators: Vec<Generator>,
        where_clause: Option<ExprId>,
        is_set: bool,
    ) -> ExprId {
        self.alloc(
            ExprKind::Comprehension(Comprehension {
                body,
                generators,
                where_clause,
                is_set,
            }),
            Type::unknown(),
        )
    }

    // ── Type-insts ──────────────────────────────────────────────

    pub fn type_inst(&mut self, ty: Type, domain: Option<ExprId>) -> TypeInstId {
        self.array_type_inst(Vec::new(), ty, domain)
    }

    pub fn array_type_inst(
        &mut self,
        ranges: Vec<TypeInstId>,
        ty: Type,
        domain: Option<ExprId>,
    ) -> TypeInstId {
        self.type_insts.alloc(TypeInst {
            ty,
            ranges,
            domain,
            span: Span::default(),
        })
    }

    /// `var lo..hi` style type-inst whose base comes from the domain.
    pub fn domain_type_inst(&mut self, inst: Inst, domain: ExprId) -> TypeInstId {
        self.type_inst(Type::unknown().with_inst(inst), Some(domain))
    }

    /// `int` as an array index.
    pub fn index_int(&mut self) -> TypeInstId {
        self.type_inst(Type::par_int(), None)
    }

    /// `$_` as an array index: an array of any rank.
    pub fn index_generic(&mut self) -> TypeInstId {
        let marker = self.ti_id("_");
        self.type_inst(Type::top(), Some(marker))
    }

    // ── Declarations and items ──────────────────────────────────

    pub fn var_decl(
        &mut self,
        name: impl Into<SmolStr>,
        ti: TypeInstId,
        init: Option<ExprId>,
    ) -> DeclId {
        self.decls.alloc(VarDecl {
            name: name.into(),
            ti,
            init,
            ty: Type::unknown(),
            span: Span::default(),
            ann: Vec::new(),
            toplevel: false,
            introduced: false,
            defined: false,
            evaluated: false,
            flat: None,
        })
    }

    pub fn push_item(&mut self, item: Item) -> ItemPath {
        self.items.push(ItemSlot {
            item,
            span: Span::default(),
            removed: false,
        });
        ItemPath {
            include: None,
            index: self.items.len() - 1,
        }
    }

    /// Toplevel declaration item.
    pub fn declare(
        &mut self,
        name: impl Into<SmolStr>,
        ti: TypeInstId,
        init: Option<ExprId>,
    ) -> DeclId {
        let d = self.var_decl(name, ti, init);
        self.decls[d].toplevel = true;
        self.push_item(Item::VarDecl(d));
        d
    }

    pub fn assign(&mut self, name: impl Into<SmolStr>, value: ExprId) -> ItemPath {
        self.push_item(Item::Assign(AssignItem {
            name: name.into(),
            value,
            decl: None,
        }))
    }

    pub fn constrain(&mut self, e: ExprId) -> ItemPath {
        self.push_item(Item::Constraint(e))
    }

    pub fn solve(&mut self, goal: SolveGoal) -> ItemPath {
        self.push_item(Item::Solve(SolveItem {
            goal,
            ann: Vec::new(),
        }))
    }

    pub fn output(&mut self, e: ExprId) -> ItemPath {
        self.push_item(Item::Output(e))
    }

    /// Function item with parameters `(name, type-inst)`.
    pub fn function(
        &mut self,
        name: impl Into<SmolStr>,
        params: Vec<(&str, TypeInstId)>,
        ret: TypeInstId,
        body: Option<ExprId>,
    ) -> FnId {
        let params = params
            .into_iter()
            .map(|(p, ti)| self.var_decl(p, ti, None))
            .collect();
        let f = self.functions.alloc(FunctionItem {
            name: name.into(),
            params,
            ret,
            body,
            ann: Vec::new(),
            span: Span::default(),
        });
        self.push_item(Item::Function(f));
        f
    }

    /// Attach an included sub-model; returns its index.
    pub fn include(&mut self, name: impl Into<SmolStr>, items: Vec<Item>) -> usize {
        for item in &items {
            if let Item::VarDecl(d) = item {
                self.decls[*d].toplevel = true;
            }
        }
        self.includes.push(Included {
            name: name.into(),
            items: items
                .into_iter()
                .map(|item| ItemSlot {
                    item,
                    span: Span::default(),
                    removed: false,
                })
                .collect(),
        });
        let idx = self.includes.len() - 1;
        self.push_item(Item::Include(idx));
        idx
    }
}
