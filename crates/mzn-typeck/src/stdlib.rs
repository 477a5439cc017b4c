//! Signatures of the builtin operators and functions. Builtins have no
//! body; the evaluator provides their semantics.

use mzn_ast::*;

struct Lib<'m> {
    model: &'m mut Model,
}

impl Lib<'_> {
    fn type_inst(&mut self, t: Type) -> TypeInstId {
        let ranges = if t.dim() == -1 {
            vec![self.model.index_generic()]
        } else {
            (0..t.dim()).map(|_| self.model.index_int()).collect()
        };
        let domain = (t.base() == BaseType::Top).then(|| self.model.ti_id("T"));
        self.model.array_type_inst(ranges, t, domain)
    }

    fn def(&mut self, name: &str, params: &[Type], ret: Type) {
        let params = params
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let ti = self.type_inst(*t);
                let d = self.model.var_decl(format!("x{}", i), ti, None);
                self.model.decls[d].ty = *t;
                d
            })
            .collect();
        let ret = self.type_inst(ret);
        let f = self.model.functions.alloc(FunctionItem {
            name: name.into(),
            params,
            ret,
            body: None,
            ann: Vec::new(),
            span: Span::default(),
        });
        self.model.register_fn(f);
    }
}

/// Declare the builtin library into `model`, unless already present.
pub fn register(model: &mut Model) {
    if model.fn_table.contains_key("int2float") {
        return;
    }
    let mut lib = Lib { model };

    for inst in [Inst::Par, Inst::Var] {
        let b = Type::par_bool().with_inst(inst);
        let i = Type::par_int().with_inst(inst);
        let f = Type::par_float().with_inst(inst);
        let s = Type::par_set_int().with_inst(inst);

        for num in [i, f] {
            for op in ["+", "-", "*", "min", "max"] {
                lib.def(op, &[num, num], num);
            }
            for op in ["+", "-", "abs"] {
                lib.def(op, &[num], num);
            }
            for op in ["<", "<=", ">", ">=", "=", "!="] {
                lib.def(op, &[num, num], b);
            }
            for op in ["sum", "product", "min", "max"] {
                lib.def(op, &[num.with_dim(-1)], num);
            }
        }
        lib.def("div", &[i, i], i);
        lib.def("mod", &[i, i], i);
        lib.def("/", &[f, f], f);

        for op in ["/\\", "\\/", "->", "<-", "<->", "xor", "=", "!=", "<", "<=", ">", ">="] {
            lib.def(op, &[b, b], b);
        }
        lib.def("not", &[b], b);
        lib.def("forall", &[b.with_dim(-1)], b);
        lib.def("exists", &[b.with_dim(-1)], b);

        lib.def("bool2int", &[b], i);
        lib.def("bool2float", &[b], f);
        lib.def("int2float", &[i], f);

        for op in ["union", "intersect", "diff", "symdiff"] {
            lib.def(op, &[s, s], s);
        }
        for op in ["subset", "superset", "=", "!="] {
            lib.def(op, &[s, s], b);
        }
        lib.def("in", &[i, s], b);
        lib.def("card", &[s], i);

        let elem = Type::top().with_inst(inst);
        lib.def("++", &[elem.with_dim(1), elem.with_dim(1)], elem.with_dim(1));
        let any = elem.with_opt(OptType::Optional);
        lib.def("=", &[any.with_dim(-1), any.with_dim(-1)], b);
        lib.def("!=", &[any.with_dim(-1), any.with_dim(-1)], b);
        lib.def("=", &[any, any], b);
        lib.def("!=", &[any, any], b);
    }
    lib.def("in", &[Type::var_int(), Type::par_set_int()], Type::var_bool());

    lib.def("..", &[Type::par_int(), Type::par_int()], Type::par_set_int());
    lib.def("..", &[Type::par_float(), Type::par_float()], Type::par_set_float());
    lib.def(
        "set2array",
        &[Type::top().with_set(SetType::Set)],
        Type::top().with_dim(1),
    );

    let string = Type::par_string();
    lib.def("++", &[string, string], string);
    for op in ["<", "<=", ">", ">=", "=", "!="] {
        lib.def(op, &[string, string], Type::par_bool());
    }
    lib.def("concat", &[string.with_dim(-1)], string);
    lib.def("show", &[Type::top()], string);
    lib.def("=", &[Type::ann(), Type::ann()], Type::par_bool());
    lib.def("length", &[Type::opt_var_top().with_dim(-1)], Type::par_int());

    lib.def(
        "lin_exp",
        &[Type::par_int().with_dim(1), Type::var_int().with_dim(1), Type::par_int()],
        Type::var_int(),
    );
    lib.def(
        "lin_exp",
        &[Type::par_float().with_dim(1), Type::var_float().with_dim(1), Type::par_float()],
        Type::var_float(),
    );
    lib.def("int_times", &[Type::var_int(), Type::var_int()], Type::var_int());
    for op in ["set_union", "set_intersect", "set_diff"] {
        lib.def(op, &[Type::var_set_int(), Type::var_set_int()], Type::var_set_int());
    }
}
