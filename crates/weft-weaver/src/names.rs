//! Collision-free names for generated locals and labels

use std::collections::HashSet;

use weft_ast::{Block, Expr, ExprKind, MethodDecl, StatementKind};

/// Names of the locals and label generated into one woven method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticNames {
    pub context: String,
    pub result: String,
    pub error: String,
    pub exit_label: String,
}

impl SyntheticNames {
    /// Pick names under `prefix` that no parameter, local, lambda parameter
    /// or label of `method` already uses.
    pub fn for_method(prefix: &str, method: &MethodDecl) -> Self {
        let mut taken: HashSet<String> = method.params.iter().map(|p| p.name.clone()).collect();
        if let Some(body) = &method.body {
            collect_block(body, &mut taken);
        }
        let mut fresh = |base: &str| {
            let base = format!("{}_{}", prefix, base);
            let mut name = base.clone();
            let mut suffix = 1;
            while taken.contains(&name) {
                name = format!("{}{}", base, suffix);
                suffix += 1;
            }
            taken.insert(name.clone());
            name
        };
        Self {
            context: fresh("ctx"),
            result: fresh("result"),
            error: fresh("error"),
            exit_label: fresh("exit"),
        }
    }
}

fn collect_block(block: &Block, taken: &mut HashSet<String>) {
    for stmt in &block.statements {
        match &stmt.kind {
            StatementKind::Local { name, value, .. } => {
                taken.insert(name.clone());
                if let Some(value) = value {
                    collect_expr(value, taken);
                }
            }
            StatementKind::Assign { value, .. } => collect_expr(value, taken),
            StatementKind::Expr(e) | StatementKind::Throw(e) | StatementKind::Return(Some(e)) => {
                collect_expr(e, taken)
            }
            StatementKind::If {
                condition,
                then_block,
                else_block,
            } => {
                collect_expr(condition, taken);
                collect_block(then_block, taken);
                if let Some(else_block) = else_block {
                    collect_block(else_block, taken);
                }
            }
            StatementKind::While { condition, body } => {
                collect_expr(condition, taken);
                collect_block(body, taken);
            }
            StatementKind::Block(body) => collect_block(body, taken),
            StatementKind::Labeled { label, body } => {
                taken.insert(label.clone());
                collect_block(body, taken);
            }
            StatementKind::Try {
                body,
                catch,
                finally,
            } => {
                collect_block(body, taken);
                if let Some(catch) = catch {
                    taken.insert(catch.name.clone());
                    collect_block(&catch.body, taken);
                }
                if let Some(finally) = finally {
                    collect_block(finally, taken);
                }
            }
            StatementKind::Return(None) | StatementKind::Break(_) | StatementKind::Continue(_) => {}
        }
    }
}

fn collect_expr(expr: &Expr, taken: &mut HashSet<String>) {
    match &expr.kind {
        ExprKind::Lambda { params, body } => {
            taken.extend(params.iter().cloned());
            collect_block(body, taken);
        }
        ExprKind::Call { receiver, args, .. } => {
            if let Some(receiver) = receiver {
                collect_expr(receiver, taken);
            }
            args.iter().for_each(|a| collect_expr(a, taken));
        }
        ExprKind::StaticCall { args, .. }
        | ExprKind::AnonymousClass { args, .. }
        | ExprKind::NewArray { items: args, .. } => {
            args.iter().for_each(|a| collect_expr(a, taken))
        }
        ExprKind::Field { object, .. } => collect_expr(object, taken),
        ExprKind::Binary { left, right, .. } => {
            collect_expr(left, taken);
            collect_expr(right, taken);
        }
        ExprKind::Unary { operand, .. } | ExprKind::Cast { expr: operand, .. } => {
            collect_expr(operand, taken)
        }
        ExprKind::Literal(_) | ExprKind::Var(_) | ExprKind::This | ExprKind::ClassLiteral(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_ast::{Statement, TypeId, TypeRef};

    #[test]
    fn clashing_names_get_a_suffix() {
        let body = Block::new(vec![
            Statement::local("__weft_result", TypeRef::Int, None, false),
            Statement::expr(Expr::synthetic(ExprKind::Lambda {
                params: vec!["__weft_ctx".into()],
                body: Block::new(vec![Statement::local("__weft_ctx1", TypeRef::Int, None, false)]),
            })),
        ]);
        let method = MethodDecl::new(TypeId(0), "f", TypeRef::Int, body)
            .with_param("__weft_exit", TypeRef::Int);

        let names = SyntheticNames::for_method("__weft", &method);
        assert_eq!(names.context, "__weft_ctx2");
        assert_eq!(names.result, "__weft_result1");
        assert_eq!(names.error, "__weft_error");
        assert_eq!(names.exit_label, "__weft_exit1");
    }
}
