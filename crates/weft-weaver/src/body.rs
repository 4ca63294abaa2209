//! Method body weaving
//!
//! Wraps the original statements of a method in the interception
//! scaffolding. A woven body has this shape (value-returning method):
//!
//! ```text
//! final AspectContext __weft_ctx =
//!     AspectContext.create(owner_meta, method_meta, this, new Object[] { args });
//! __weft_ctx.before();
//! int __weft_result = 0;
//! try {
//!     __weft_exit: {
//!         <original statements, exits redirected>
//!     }
//! } catch (Throwable __weft_error) {
//!     __weft_ctx.error(__weft_error);
//!     throw __weft_error;
//! }
//! return (Integer) __weft_ctx.after(__weft_result);
//! ```
//!
//! Void methods have no result holder and end with `__weft_ctx.after(null);`.
//! The exits themselves are redirected by [`crate::ReturnRewriter`].

use weft_ast::{
    Block, CatchClause, CompilationUnit, Expr, ExprKind, Literal, MethodDecl, Statement,
    StatementKind, TypeRef,
};

use crate::{
    CacheRef, ReturnRewriter, Strategy, SyntheticNames, WeaveContext, WeaveError, WeaveSettings,
    WeaveStage, WeaveState,
};

pub struct MethodBodyWeaver<'a> {
    settings: &'a WeaveSettings,
}

impl<'a> MethodBodyWeaver<'a> {
    pub fn new(settings: &'a WeaveSettings) -> Self {
        Self { settings }
    }

    /// Whether `body` already starts with this weaver's context declaration
    pub fn is_woven(&self, body: &Block) -> bool {
        match body.statements.first().map(|s| &s.kind) {
            Some(StatementKind::Local { name, ty, .. }) => {
                *ty == TypeRef::Named(self.settings.context_type.clone())
                    && name.starts_with(&self.settings.synthetic_prefix)
            }
            _ => false,
        }
    }

    /// Build the woven body around `original`
    pub fn wrap(
        &self,
        method: &MethodDecl,
        original: Block,
        cache: &CacheRef,
        strategy: Option<&Strategy>,
        names: &SyntheticNames,
    ) -> Block {
        let return_type = method.return_type.clone().unwrap_or(TypeRef::Void);
        let ctx = || Expr::var(&names.context);

        // A body that can only leave by throwing must not get a reachable
        // tail after the exit block.
        let needs_tail = ReturnRewriter::count_exits(&original) > 0
            || !original.statements.last().is_some_and(Statement::always_exits);

        let mut statements = vec![
            Statement::local(
                &names.context,
                TypeRef::Named(self.settings.context_type.clone()),
                Some(self.context_init(method, cache, strategy)),
                true,
            ),
            Statement::expr(Expr::method_call(ctx(), "before", vec![])),
        ];

        if !return_type.is_void() {
            statements.push(Statement::local(
                &names.result,
                return_type.clone(),
                Some(Expr::lit(return_type.default_value())),
                false,
            ));
        }

        let span = original.span;
        let exit_block = Statement::synthetic(StatementKind::Labeled {
            label: names.exit_label.clone(),
            body: original,
        });
        statements.push(Statement::synthetic(StatementKind::Try {
            body: Block::new(vec![exit_block]),
            catch: Some(CatchClause {
                ty: TypeRef::named("Throwable"),
                name: names.error.clone(),
                body: Block::new(vec![
                    Statement::expr(Expr::method_call(
                        ctx(),
                        "error",
                        vec![Expr::var(&names.error)],
                    )),
                    Statement::synthetic(StatementKind::Throw(Expr::var(&names.error))),
                ]),
            }),
            finally: None,
        }));

        if needs_tail {
            if return_type.is_void() {
                let after = Expr::method_call(ctx(), "after", vec![Expr::null()]);
                statements.push(Statement::expr(after));
            } else {
                let after = Expr::method_call(ctx(), "after", vec![Expr::var(&names.result)]);
                statements.push(Statement::ret(Some(Expr::cast(return_type.boxed(), after))));
            }
        }

        Block { statements, span }
    }

    /// `AspectContext.create(owner_meta, method_meta, this, new Object[] { params }[, "builder"])`
    fn context_init(
        &self,
        method: &MethodDecl,
        cache: &CacheRef,
        strategy: Option<&Strategy>,
    ) -> Expr {
        let receiver = if method.is_static { Expr::null() } else { Expr::this() };
        let mut args = vec![
            Expr::var(&cache.owner_field),
            Expr::var(&cache.method_field),
            receiver,
            Expr::synthetic(ExprKind::NewArray {
                element: TypeRef::named("Object"),
                items: method.params.iter().map(|p| Expr::var(&p.name)).collect(),
            }),
        ];
        if let Some(Strategy::Named(builder)) = strategy {
            args.push(Expr::lit(Literal::String(builder.clone())));
        }
        Expr::static_call(self.settings.context_type.clone(), "create", args)
    }
}

/// The labelled block holding the original statements of a woven body
pub(crate) fn exit_block_mut<'b>(body: &'b mut Block, label: &str) -> Option<&'b mut Block> {
    body.statements.iter_mut().find_map(|stmt| match &mut stmt.kind {
        StatementKind::Try { body, .. } => {
            body.statements.iter_mut().find_map(|inner| match &mut inner.kind {
                StatementKind::Labeled { label: l, body } if l == label => Some(body),
                _ => None,
            })
        }
        _ => None,
    })
}

impl WeaveStage for MethodBodyWeaver<'_> {
    fn name(&self) -> &'static str {
        "body"
    }

    fn completes(&self) -> WeaveState {
        WeaveState::BodyWrapped
    }

    fn run(&self, unit: &mut CompilationUnit, cx: &mut WeaveContext) -> Result<(), WeaveError> {
        let cache = cx.cache.clone().ok_or(WeaveError::MissingStageInput {
            stage: self.name(),
            input: "metadata cache",
        })?;
        let method = unit
            .method_mut(cx.binding.method)
            .ok_or(WeaveError::UnknownMethod { id: cx.binding.method.0 })?;
        let names = SyntheticNames::for_method(&self.settings.synthetic_prefix, method);
        let original = method.body.take().ok_or_else(|| WeaveError::MissingTree {
            method: method.name.clone(),
            span: method.span,
        })?;

        let woven = self.wrap(
            method,
            original.clone(),
            &cache,
            cx.binding.strategy.as_ref(),
            &names,
        );
        method.body = Some(woven);
        cx.original = Some(original);
        cx.names = Some(names);
        Ok(())
    }
}
