//! Expression AST nodes

use serde::{Deserialize, Serialize};
use crate::{Block, Span, TypeId, TypeRef};

/// An expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Literal value: `42`, `"hello"`, `true`, `null`
    Literal(Literal),

    /// Local variable, parameter or field by simple name: `x`
    Var(String),

    /// The receiver: `this`
    This,

    /// Method call with an optional receiver: `list.add(x)`, `compute(a)`
    Call {
        receiver: Option<Box<Expr>>,
        method: String,
        args: Vec<Expr>,
    },

    /// Static call on a named type: `Math.max(a, b)`
    StaticCall {
        owner: String,
        method: String,
        args: Vec<Expr>,
    },

    /// Field access: `user.name`
    Field {
        object: Box<Expr>,
        field: String,
    },

    /// Binary operation: `a + b`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation: `!x`, `-y`
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    /// Class literal: `String.class`
    ClassLiteral(TypeRef),

    /// Array creation with initializer: `new Object[] { a, b }`
    NewArray {
        element: TypeRef,
        items: Vec<Expr>,
    },

    /// Cast: `(Integer) value`
    Cast {
        ty: TypeRef,
        expr: Box<Expr>,
    },

    /// Lambda with a block body: `(a, b) -> { ... }`
    ///
    /// Returns inside the body exit the lambda, not the enclosing method.
    Lambda {
        params: Vec<String>,
        body: Block,
    },

    /// Anonymous class instance: `new Runnable() { ... }`.
    /// The class body lives in the unit arena under `class`.
    AnonymousClass {
        base: String,
        args: Vec<Expr>,
        class: TypeId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Long(i64),
    Double(f64),
    Char(char),
    String(String),
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Binding strength, higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// An expression created by the weaver rather than parsed from source
    pub fn synthetic(kind: ExprKind) -> Self {
        Self::new(kind, Span::synthetic())
    }

    pub fn lit(value: Literal) -> Self {
        Self::synthetic(ExprKind::Literal(value))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::synthetic(ExprKind::Var(name.into()))
    }

    pub fn this() -> Self {
        Self::synthetic(ExprKind::This)
    }

    pub fn null() -> Self {
        Self::lit(Literal::Null)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::lit(Literal::String(value.into()))
    }

    pub fn method_call(receiver: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::synthetic(ExprKind::Call {
            receiver: Some(Box::new(receiver)),
            method: method.into(),
            args,
        })
    }

    pub fn static_call(
        owner: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Expr>,
    ) -> Self {
        Self::synthetic(ExprKind::StaticCall {
            owner: owner.into(),
            method: method.into(),
            args,
        })
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::synthetic(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn cast(ty: TypeRef, expr: Expr) -> Self {
        Self::synthetic(ExprKind::Cast {
            ty,
            expr: Box::new(expr),
        })
    }
}
