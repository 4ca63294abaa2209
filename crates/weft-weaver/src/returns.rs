//! Return normalization
//!
//! Redirects every exit of the original statements to the single shared
//! exit after the labelled block: `return expr;` becomes
//! `__weft_result = expr; break __weft_exit;` and a bare `return;` becomes
//! `break __weft_exit;`. Lambda bodies and anonymous class members are
//! separate methods and are left alone. Top-level local declarations keep
//! their position inside the exit block, so their scope and initialization
//! order do not change.

use weft_ast::{Block, CompilationUnit, Span, Statement, StatementKind};

use crate::body::exit_block_mut;
use crate::{WeaveContext, WeaveError, WeaveStage, WeaveState};

pub struct ReturnRewriter;

impl ReturnRewriter {
    /// Number of `return` statements belonging to the method itself
    pub fn count_exits(block: &Block) -> usize {
        block.statements.iter().map(count_in_statement).sum()
    }

    /// Rewrite every return in `block`; `result` is `None` for void
    /// methods. Returns the number of exits rewritten.
    pub fn rewrite(block: &mut Block, result: Option<&str>, exit_label: &str) -> usize {
        let mut rewritten = 0;
        let statements = std::mem::take(&mut block.statements);
        for stmt in statements {
            let span = stmt.span;
            match stmt.kind {
                StatementKind::Return(value) => {
                    rewritten += 1;
                    match (value, result) {
                        (Some(value), Some(holder)) => {
                            block.statements.push(Statement::new(
                                StatementKind::Assign {
                                    target: holder.to_string(),
                                    value,
                                },
                                span,
                            ));
                        }
                        // A value in a void method can't type-check; keep
                        // its evaluation so side effects survive.
                        (Some(value), None) => {
                            block.statements.push(Statement::new(StatementKind::Expr(value), span));
                        }
                        (None, _) => {}
                    }
                    block.statements.push(Statement::new(
                        StatementKind::Break(Some(exit_label.to_string())),
                        if span.is_synthetic() { Span::synthetic() } else { span },
                    ));
                }
                mut kind => {
                    rewritten += rewrite_nested(&mut kind, result, exit_label);
                    block.statements.push(Statement::new(kind, span));
                }
            }
        }
        rewritten
    }
}

fn rewrite_nested(kind: &mut StatementKind, result: Option<&str>, exit_label: &str) -> usize {
    match kind {
        StatementKind::If {
            then_block,
            else_block,
            ..
        } => {
            ReturnRewriter::rewrite(then_block, result, exit_label)
                + else_block
                    .as_mut()
                    .map_or(0, |b| ReturnRewriter::rewrite(b, result, exit_label))
        }
        StatementKind::While { body, .. }
        | StatementKind::Block(body)
        | StatementKind::Labeled { body, .. } => ReturnRewriter::rewrite(body, result, exit_label),
        StatementKind::Try {
            body,
            catch,
            finally,
        } => {
            ReturnRewriter::rewrite(body, result, exit_label)
                + catch
                    .as_mut()
                    .map_or(0, |c| ReturnRewriter::rewrite(&mut c.body, result, exit_label))
                + finally
                    .as_mut()
                    .map_or(0, |f| ReturnRewriter::rewrite(f, result, exit_label))
        }
        _ => 0,
    }
}

fn count_in_statement(stmt: &Statement) -> usize {
    match &stmt.kind {
        StatementKind::Return(_) => 1,
        StatementKind::If {
            then_block,
            else_block,
            ..
        } => {
            ReturnRewriter::count_exits(then_block)
                + else_block.as_ref().map_or(0, ReturnRewriter::count_exits)
        }
        StatementKind::While { body, .. }
        | StatementKind::Block(body)
        | StatementKind::Labeled { body, .. } => ReturnRewriter::count_exits(body),
        StatementKind::Try {
            body,
            catch,
            finally,
        } => {
            ReturnRewriter::count_exits(body)
                + catch.as_ref().map_or(0, |c| ReturnRewriter::count_exits(&c.body))
                + finally.as_ref().map_or(0, ReturnRewriter::count_exits)
        }
        _ => 0,
    }
}

impl WeaveStage for ReturnRewriter {
    fn name(&self) -> &'static str {
        "returns"
    }

    fn completes(&self) -> WeaveState {
        WeaveState::ReturnsNormalized
    }

    fn run(&self, unit: &mut CompilationUnit, cx: &mut WeaveContext) -> Result<(), WeaveError> {
        let names = cx.names.clone().ok_or(WeaveError::MissingStageInput {
            stage: self.name(),
            input: "synthetic names",
        })?;
        let method = unit
            .method_mut(cx.binding.method)
            .ok_or(WeaveError::UnknownMethod { id: cx.binding.method.0 })?;
        let result = if method.is_void() { None } else { Some(names.result.as_str()) };
        let missing = WeaveError::MissingStageInput {
            stage: "returns",
            input: "exit block",
        };
        let body = method.body.as_mut().ok_or(missing.clone())?;
        let exit = exit_block_mut(body, &names.exit_label).ok_or(missing)?;
        cx.exits_rewritten = ReturnRewriter::rewrite(exit, result, &names.exit_label);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_ast::{BinaryOp, Expr, ExprKind, Literal};

    fn ret(n: i64) -> Statement {
        Statement::ret(Some(Expr::lit(Literal::Int(n))))
    }

    #[test]
    fn three_returns_collapse_to_one_exit() {
        let mut block = Block::new(vec![
            Statement::synthetic(StatementKind::If {
                condition: Expr::var("first"),
                then_block: Block::new(vec![ret(1)]),
                else_block: None,
            }),
            Statement::synthetic(StatementKind::If {
                condition: Expr::var("second"),
                then_block: Block::new(vec![ret(2)]),
                else_block: None,
            }),
            ret(3),
        ]);
        assert_eq!(ReturnRewriter::count_exits(&block), 3);

        let rewritten = ReturnRewriter::rewrite(&mut block, Some("r"), "out");
        assert_eq!(rewritten, 3);
        assert_eq!(ReturnRewriter::count_exits(&block), 0);

        let tail: Vec<_> = block.statements[2..].iter().map(|s| s.kind.clone()).collect();
        assert_eq!(
            tail,
            vec![
                StatementKind::Assign {
                    target: "r".into(),
                    value: Expr::lit(Literal::Int(3)),
                },
                StatementKind::Break(Some("out".into())),
            ]
        );
    }

    #[test]
    fn void_returns_become_breaks() {
        let mut block = Block::new(vec![
            Statement::synthetic(StatementKind::While {
                condition: Expr::var("more"),
                body: Block::new(vec![Statement::synthetic(StatementKind::If {
                    condition: Expr::var("done"),
                    then_block: Block::new(vec![Statement::ret(None)]),
                    else_block: None,
                })]),
            }),
        ]);
        assert_eq!(ReturnRewriter::rewrite(&mut block, None, "out"), 1);
        let StatementKind::While { body, .. } = &block.statements[0].kind else {
            panic!("expected loop");
        };
        let StatementKind::If { then_block, .. } = &body.statements[0].kind else {
            panic!("expected if");
        };
        assert_eq!(then_block.statements[0].kind, StatementKind::Break(Some("out".into())));
    }

    #[test]
    fn lambda_returns_are_untouched() {
        let lambda = Expr::synthetic(ExprKind::Lambda {
            params: vec!["x".into()],
            body: Block::new(vec![Statement::ret(Some(Expr::binary(
                BinaryOp::Add,
                Expr::var("x"),
                Expr::lit(Literal::Int(1)),
            )))]),
        });
        let mut block = Block::new(vec![
            Statement::local(
                "f",
                weft_ast::TypeRef::named("IntUnaryOperator"),
                Some(lambda.clone()),
                false,
            ),
            Statement::ret(Some(Expr::var("f"))),
        ]);
        assert_eq!(ReturnRewriter::count_exits(&block), 1);
        assert_eq!(ReturnRewriter::rewrite(&mut block, Some("r"), "out"), 1);
        assert!(matches!(
            &block.statements[0].kind,
            StatementKind::Local { value: Some(v), .. } if *v == lambda
        ));
    }

    #[test]
    fn rewrites_inside_try_and_finally() {
        let mut block = Block::new(vec![Statement::synthetic(StatementKind::Try {
            body: Block::new(vec![ret(1)]),
            catch: Some(weft_ast::CatchClause {
                ty: weft_ast::TypeRef::named("Exception"),
                name: "e".into(),
                body: Block::new(vec![ret(2)]),
            }),
            finally: Some(Block::new(vec![Statement::expr(Expr::var("cleanup"))])),
        })]);
        assert_eq!(ReturnRewriter::rewrite(&mut block, Some("r"), "out"), 2);
    }
}
