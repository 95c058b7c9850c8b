//! The syntax tree produced by [`crate::Parser`].
//!
//! Every node is one of a closed set of variants matched structurally;
//! there is no open class hierarchy and no visitor double-dispatch here.

use hexc_util::{Span, Symbol};

/// The closed set of Hexenwerk types. Equality is structural, including a
/// full element-wise comparison of `Function`'s parameter list.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Void,
    Bool,
    Int32,
    Double,
    StrLit,
    /// `variadic` is only ever `true` for the builtin `printf`; user
    /// function declarations have no surface syntax for variadic
    /// parameters and always construct this with `variadic: false`.
    Function { params: Vec<Type>, ret: Box<Type>, variadic: bool },
}

impl Type {
    /// Resolves a type keyword spelled in source (`bool`, `i32`, `double`,
    /// `void`) to its `Type`. Returns `None` for anything else, including
    /// `Function`, which has no surface syntax of its own.
    pub fn from_name(name: &str) -> Option<Type> {
        match name {
            "void" => Some(Type::Void),
            "bool" => Some(Type::Bool),
            "i32" => Some(Type::Int32),
            "double" => Some(Type::Double),
            _ => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int32 => write!(f, "i32"),
            Type::Double => write!(f, "double"),
            Type::StrLit => write!(f, "strlit"),
            Type::Function { params, ret, .. } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {ret}")
            }
        }
    }
}

/// A binary operator. `describe_code` gives the numeric tag used by the
/// pretty-printer's `[Operator N]` rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Assign,
    Lt,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn code(self) -> u8 {
        match self {
            BinOp::Assign => 0,
            BinOp::Lt => 1,
            BinOp::Add => 2,
            BinOp::Sub => 3,
            BinOp::Mul => 4,
            BinOp::Div => 5,
        }
    }
}

/// One declared parameter, `name: Type`.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Symbol,
    pub ty: Type,
}

/// A `{ ... }` block: an ordered list of statements whose value is the
/// value of the last one (`Void` if empty).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope {
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    LitInt32(i32),
    LitDouble(f64),
    LitStr(Symbol),
    Id(Symbol),
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Call { callee: Symbol, args: Vec<Expr> },
    Scope(Scope),
    If { cond: Box<Expr>, then_scope: Scope, else_scope: Scope },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Expr(Expr),
    VarDecl { name: Symbol, rhs: Expr },
    FnDecl { name: Symbol, params: Vec<Param>, ret: Type },
    FnDef { decl: Box<Statement>, body: Scope },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}
