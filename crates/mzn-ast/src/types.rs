use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

// ── Components ───────────────────────────────────────────────────

/// Instantiation: known at compile time (`par`) or a decision variable (`var`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Inst {
    Par = 0,
    Var = 1,
}

/// Base type. The discriminants are part of the canonical encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BaseType {
    Top = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
    String = 4,
    Ann = 5,
    Bot = 6,
    Unknown = 7,
}

impl BaseType {
    fn from_bits(bits: u32) -> BaseType {
        match bits & 0xF {
            0 => BaseType::Top,
            1 => BaseType::Bool,
            2 => BaseType::Int,
            3 => BaseType::Float,
            4 => BaseType::String,
            5 => BaseType::Ann,
            6 => BaseType::Bot,
            _ => BaseType::Unknown,
        }
    }

    /// Numeric widening only: `bool ⊂ int ⊂ float`.
    pub fn is_subtype_of(self, other: BaseType) -> bool {
        if self == other {
            return true;
        }
        match self {
            BaseType::Bool => matches!(other, BaseType::Int | BaseType::Float),
            BaseType::Int => other == BaseType::Float,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SetType {
    Plain = 0,
    Set = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OptType {
    Present = 0,
    Optional = 1,
}

// ── Type ─────────────────────────────────────────────────────────

/// Type of an expression or declaration.
///
/// `dim` is 0 for scalars, the array rank for arrays, and -1 for an array
/// of unknown (generic) rank. `cv` records that a par-typed expression
/// syntactically contains a decision variable; it is always set for `var`
/// types and does not take part in equality, ordering or the encoding.
#[derive(Debug, Clone, Copy)]
pub struct Type {
    inst: Inst,
    base: BaseType,
    set: SetType,
    opt: OptType,
    cv: bool,
    dim: i32,
}

const DIM_MASK: u32 = 0xF_FFFF;

impl Type {
    pub const fn new(inst: Inst, base: BaseType, set: SetType, dim: i32) -> Type {
        Type {
            inst,
            base,
            set,
            opt: OptType::Present,
            cv: matches!(inst, Inst::Var),
            dim,
        }
    }

    pub const fn unknown() -> Type {
        Type::new(Inst::Par, BaseType::Unknown, SetType::Plain, 0)
    }

    pub const fn par_int() -> Type {
        Type::new(Inst::Par, BaseType::Int, SetType::Plain, 0)
    }

    pub const fn par_bool() -> Type {
        Type::new(Inst::Par, BaseType::Bool, SetType::Plain, 0)
    }

    pub const fn par_float() -> Type {
        Type::new(Inst::Par, BaseType::Float, SetType::Plain, 0)
    }

    pub const fn par_string() -> Type {
        Type::new(Inst::Par, BaseType::String, SetType::Plain, 0)
    }

    pub const fn ann() -> Type {
        Type::new(Inst::Par, BaseType::Ann, SetType::Plain, 0)
    }

    pub const fn par_set_int() -> Type {
        Type::new(Inst::Par, BaseType::Int, SetType::Set, 0)
    }

    pub const fn par_set_bool() -> Type {
        Type::new(Inst::Par, BaseType::Bool, SetType::Set, 0)
    }

    pub const fn par_set_float() -> Type {
        Type::new(Inst::Par, BaseType::Float, SetType::Set, 0)
    }

    pub const fn par_set_string() -> Type {
        Type::new(Inst::Par, BaseType::String, SetType::Set, 0)
    }

    pub const fn var_int() -> Type {
        Type::new(Inst::Var, BaseType::Int, SetType::Plain, 0)
    }

    pub const fn var_bool() -> Type {
        Type::new(Inst::Var, BaseType::Bool, SetType::Plain, 0)
    }

    pub const fn var_float() -> Type {
        Type::new(Inst::Var, BaseType::Float, SetType::Plain, 0)
    }

    pub const fn var_set_int() -> Type {
        Type::new(Inst::Var, BaseType::Int, SetType::Set, 0)
    }

    pub const fn var_bot() -> Type {
        Type::new(Inst::Var, BaseType::Bot, SetType::Plain, 0)
    }

    pub const fn bot() -> Type {
        Type::new(Inst::Par, BaseType::Bot, SetType::Plain, 0)
    }

    pub const fn top() -> Type {
        Type::new(Inst::Par, BaseType::Top, SetType::Plain, 0)
    }

    pub const fn var_top() -> Type {
        Type::new(Inst::Var, BaseType::Top, SetType::Plain, 0)
    }

    pub const fn opt_var_top() -> Type {
        Type::var_top().with_opt(OptType::Optional)
    }

    // ── Accessors ───────────────────────────────────────────────

    pub const fn inst(self) -> Inst {
        self.inst
    }

    pub const fn base(self) -> BaseType {
        self.base
    }

    pub const fn set_type(self) -> SetType {
        self.set
    }

    pub const fn opt(self) -> OptType {
        self.opt
    }

    pub const fn cv(self) -> bool {
        self.cv
    }

    pub const fn dim(self) -> i32 {
        self.dim
    }

    /// Changing the inst to `var` also sets the contains-var flag.
    pub const fn with_inst(mut self, inst: Inst) -> Type {
        self.inst = inst;
        if matches!(inst, Inst::Var) {
            self.cv = true;
        }
        self
    }

    pub const fn with_base(mut self, base: BaseType) -> Type {
        self.base = base;
        self
    }

    pub const fn with_set(mut self, set: SetType) -> Type {
        self.set = set;
        self
    }

    pub const fn with_opt(mut self, opt: OptType) -> Type {
        self.opt = opt;
        self
    }

    /// The contains-var flag cannot be cleared on a `var` type.
    pub const fn with_cv(mut self, cv: bool) -> Type {
        self.cv = cv || matches!(self.inst, Inst::Var);
        self
    }

    pub const fn with_dim(mut self, dim: i32) -> Type {
        self.dim = dim;
        self
    }

    /// Element type of an array (or the type itself for scalars).
    pub const fn elem(self) -> Type {
        self.with_dim(0)
    }

    // ── Predicates ──────────────────────────────────────────────

    pub fn is_unknown(self) -> bool {
        self.base == BaseType::Unknown
    }

    /// A present scalar that is not a set.
    pub fn is_plain(self) -> bool {
        self.dim == 0 && self.set == SetType::Plain && self.opt == OptType::Present
    }

    pub fn is_par(self) -> bool {
        self.inst == Inst::Par
    }

    pub fn is_var(self) -> bool {
        self.inst == Inst::Var
    }

    pub fn is_opt(self) -> bool {
        self.opt == OptType::Optional
    }

    pub fn is_present(self) -> bool {
        self.opt == OptType::Present
    }

    pub fn is_int(self) -> bool {
        self.dim == 0 && self.set == SetType::Plain && self.base == BaseType::Int
    }

    pub fn is_bool(self) -> bool {
        self.dim == 0 && self.set == SetType::Plain && self.base == BaseType::Bool
    }

    pub fn is_float(self) -> bool {
        self.dim == 0 && self.set == SetType::Plain && self.base == BaseType::Float
    }

    pub fn is_string(self) -> bool {
        self.dim == 0 && self.set == SetType::Plain && self.base == BaseType::String
    }

    pub fn is_bot(self) -> bool {
        self.base == BaseType::Bot
    }

    pub fn is_ann(self) -> bool {
        self.is_plain() && self.base == BaseType::Ann
    }

    pub fn is_set(self) -> bool {
        self.dim == 0 && self.set == SetType::Set
    }

    /// A set of int; the empty set (`set of bot`) counts.
    pub fn is_int_set(self) -> bool {
        self.is_set() && matches!(self.base, BaseType::Int | BaseType::Bot)
    }

    pub fn is_bool_set(self) -> bool {
        self.is_set() && matches!(self.base, BaseType::Bool | BaseType::Bot)
    }

    pub fn is_var_int(self) -> bool {
        self.is_var() && self.is_present() && self.is_int()
    }

    pub fn is_var_bool(self) -> bool {
        self.is_var() && self.is_present() && self.is_bool()
    }

    pub fn is_var_float(self) -> bool {
        self.is_var() && self.is_present() && self.is_float()
    }

    pub fn is_int_array(self) -> bool {
        self.dim == 1
            && self.set == SetType::Plain
            && self.opt == OptType::Present
            && self.base == BaseType::Int
    }

    // ── Encoding ────────────────────────────────────────────────

    /// Canonical integer encoding, used for hashing and ordering.
    pub fn encode(self) -> u32 {
        let dim = match self.dim {
            -1 => 1,
            0 => 0,
            d => (d as u32 + 1) & DIM_MASK,
        };
        ((1 - self.set as u32) << 28)
            | ((self.base as u32) << 24)
            | ((self.inst as u32) << 21)
            | ((self.opt as u32) << 20)
            | dim
    }

    /// Inverse of [`Type::encode`]. Returns `None` for codes no type encodes to.
    pub fn decode(code: u32) -> Option<Type> {
        if code >> 29 != 0 {
            return None;
        }
        let set = if (code >> 28) & 1 == 1 {
            SetType::Plain
        } else {
            SetType::Set
        };
        let inst = match (code >> 21) & 7 {
            0 => Inst::Par,
            1 => Inst::Var,
            _ => return None,
        };
        let opt = if (code >> 20) & 1 == 1 {
            OptType::Optional
        } else {
            OptType::Present
        };
        let dim = match code & DIM_MASK {
            0 => 0,
            1 => -1,
            d => d as i32 - 1,
        };
        Some(
            Type::new(inst, BaseType::from_bits(code >> 24), set, dim).with_opt(opt),
        )
    }

    // ── Subtyping ───────────────────────────────────────────────

    pub fn is_subtype_of(self, t: Type) -> bool {
        let opt_ok = self.opt == OptType::Present || self.opt == t.opt;
        let bt_sub = self.base.is_subtype_of(t.base);

        // a par set may stand in for a one-dimensional array
        if self.dim == 0
            && t.dim != 0
            && self.set == SetType::Set
            && t.set == SetType::Plain
            && (self.base == BaseType::Bot || bt_sub || t.base == BaseType::Top)
            && self.inst == Inst::Par
            && opt_ok
        {
            return true;
        }
        if self.dim != t.dim && (self.dim == 0 || t.dim != -1) {
            return false;
        }
        if self.inst == t.inst && bt_sub && self.set == t.set {
            return opt_ok;
        }
        if self.inst == Inst::Par && bt_sub && self.set == t.set {
            return opt_ok;
        }
        if self.inst == Inst::Par && t.base == BaseType::Bot {
            return true;
        }
        if (self.inst == t.inst || self.inst == Inst::Par)
            && self.base == BaseType::Bot
            && (self.set == t.set || self.set == SetType::Plain)
        {
            return opt_ok;
        }
        t.base == BaseType::Top
            && opt_ok
            && (t.set == SetType::Plain || self.set == t.set)
            && (self.inst == Inst::Par || t.inst == Inst::Var)
    }
}

impl Default for Type {
    fn default() -> Self {
        Type::unknown()
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        self.encode() == other.encode()
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encode().hash(state);
    }
}

impl PartialOrd for Type {
    fn partial_cmp(&self, other: &Type) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Type {
    fn cmp(&self, other: &Type) -> Ordering {
        self.encode().cmp(&other.encode())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dim > 0 {
            write!(f, "array[int")?;
            for _ in 1..self.dim {
                write!(f, ",int")?;
            }
            write!(f, "] of ")?;
        } else if self.dim < 0 {
            write!(f, "array[$_] of ")?;
        }
        if self.inst == Inst::Var {
            write!(f, "var ")?;
        }
        if self.opt == OptType::Optional {
            write!(f, "opt ")?;
        }
        if self.set == SetType::Set {
            write!(f, "set of ")?;
        }
        let name = match self.base {
            BaseType::Int => "int",
            BaseType::Bool => "bool",
            BaseType::Float => "float",
            BaseType::String => "string",
            BaseType::Ann => "ann",
            BaseType::Bot => "bot",
            BaseType::Top => "top",
            BaseType::Unknown => "???",
        };
        write!(f, "{}", name)
    }
}
