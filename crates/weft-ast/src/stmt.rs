//! Statement AST nodes

use serde::{Deserialize, Serialize};
use crate::{Expr, Span, TypeRef};

/// A block of statements
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            statements,
            span: Span::synthetic(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// A statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    /// Local variable declaration: `final int x = 5;`
    Local {
        name: String,
        ty: TypeRef,
        value: Option<Expr>,
        is_final: bool,
    },

    /// Assignment to a local or field: `x = y;`
    Assign { target: String, value: Expr },

    /// Expression statement: `foo();`
    Expr(Expr),

    /// Return statement: `return x;`
    Return(Option<Expr>),

    /// `if (cond) { ... } else { ... }`
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },

    /// `while (cond) { ... }`
    While { condition: Expr, body: Block },

    /// Nested scope: `{ ... }`
    Block(Block),

    /// Labelled block: `exit: { ... }`
    Labeled { label: String, body: Block },

    /// `break;` or `break label;`
    Break(Option<String>),

    /// `continue;` or `continue label;`
    Continue(Option<String>),

    /// `throw e;`
    Throw(Expr),

    /// `try { ... } catch (T e) { ... } finally { ... }`
    Try {
        body: Block,
        catch: Option<CatchClause>,
        finally: Option<Block>,
    },
}

/// A single catch clause: `catch (Throwable e) { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub ty: TypeRef,
    pub name: String,
    pub body: Block,
}

impl Statement {
    pub fn new(kind: StatementKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn synthetic(kind: StatementKind) -> Self {
        Self::new(kind, Span::synthetic())
    }

    pub fn local(
        name: impl Into<String>,
        ty: TypeRef,
        value: Option<Expr>,
        is_final: bool,
    ) -> Self {
        Self::synthetic(StatementKind::Local {
            name: name.into(),
            ty,
            value,
            is_final,
        })
    }

    pub fn assign(target: impl Into<String>, value: Expr) -> Self {
        Self::synthetic(StatementKind::Assign {
            target: target.into(),
            value,
        })
    }

    pub fn expr(expr: Expr) -> Self {
        Self::synthetic(StatementKind::Expr(expr))
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Self::synthetic(StatementKind::Return(value))
    }

    /// Whether control can never fall through past this statement
    pub fn always_exits(&self) -> bool {
        match &self.kind {
            StatementKind::Return(_)
            | StatementKind::Throw(_)
            | StatementKind::Break(_)
            | StatementKind::Continue(_) => true,
            StatementKind::If {
                then_block,
                else_block: Some(else_block),
                ..
            } => block_always_exits(then_block) && block_always_exits(else_block),
            StatementKind::Block(block) => block_always_exits(block),
            StatementKind::While { condition, body } => {
                matches!(
                    condition.kind,
                    crate::ExprKind::Literal(crate::Literal::Bool(true))
                ) && !breaks_enclosing_loop(body)
            }
            StatementKind::Labeled { label, body } => {
                block_always_exits(body) && !breaks_to(body, label)
            }
            StatementKind::Try {
                body,
                catch,
                finally,
            } => {
                finally.as_ref().is_some_and(block_always_exits)
                    || (block_always_exits(body)
                        && catch.as_ref().map_or(true, |c| block_always_exits(&c.body)))
            }
            _ => false,
        }
    }
}

fn block_always_exits(block: &Block) -> bool {
    block.statements.last().is_some_and(Statement::always_exits)
}

/// Whether some `break label;` inside `block` targets `label`
fn breaks_to(block: &Block, label: &str) -> bool {
    block.statements.iter().any(|stmt| match &stmt.kind {
        StatementKind::Break(Some(target)) => target == label,
        StatementKind::If {
            then_block,
            else_block,
            ..
        } => {
            breaks_to(then_block, label)
                || else_block.as_ref().is_some_and(|b| breaks_to(b, label))
        }
        StatementKind::While { body: inner, .. }
        | StatementKind::Block(inner)
        | StatementKind::Labeled { body: inner, .. } => breaks_to(inner, label),
        StatementKind::Try {
            body,
            catch,
            finally,
        } => {
            breaks_to(body, label)
                || catch.as_ref().is_some_and(|c| breaks_to(&c.body, label))
                || finally.as_ref().is_some_and(|f| breaks_to(f, label))
        }
        _ => false,
    })
}

/// Whether an unlabelled `break` in `block` leaves the loop that owns it.
/// Nested loops capture their own unlabelled breaks.
fn breaks_enclosing_loop(block: &Block) -> bool {
    block.statements.iter().any(|stmt| match &stmt.kind {
        StatementKind::Break(None) => true,
        StatementKind::If {
            then_block,
            else_block,
            ..
        } => {
            breaks_enclosing_loop(then_block)
                || else_block.as_ref().is_some_and(breaks_enclosing_loop)
        }
        StatementKind::Block(inner) | StatementKind::Labeled { body: inner, .. } => {
            breaks_enclosing_loop(inner)
        }
        StatementKind::Try {
            body,
            catch,
            finally,
        } => {
            breaks_enclosing_loop(body)
                || catch.as_ref().is_some_and(|c| breaks_enclosing_loop(&c.body))
                || finally.as_ref().is_some_and(breaks_enclosing_loop)
        }
        _ => false,
    })
}
