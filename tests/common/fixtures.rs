//! Builders for the units used across the integration tests

use weft_ast::{
    Annotation, AnnotationTypeDecl, BinaryOp, Block, CompilationUnit, Expr, ExprKind, Literal,
    MethodDecl, MethodId, Statement, StatementKind, TypeDecl, TypeId, TypeRef,
};
use weft_weaver::{TriggerSet, WeaveSession, WeaveSettings};

pub const PRIMARY: &str = "weft.aop.Aspect";
pub const TIMED: &str = "com.acme.Timed";
pub const AUDITED: &str = "com.acme.Audited";
pub const PLAIN: &str = "com.acme.Plain";

/// Session seeded with the primary marker only
pub fn session() -> WeaveSession {
    WeaveSession::with_triggers(WeaveSettings::default(), TriggerSet::with_seed([PRIMARY]))
}

pub fn aspect() -> Annotation {
    Annotation::new(PRIMARY)
}

pub fn aspect_with_builder(builder: &str) -> Annotation {
    Annotation::new(PRIMARY).with_arg("builder", Literal::String(builder.into()))
}

/// `@Timed` is meta-annotated with the primary marker, `@Audited` with
/// `@Timed`, and `@Plain` with nothing relevant.
pub fn annotation_library() -> CompilationUnit {
    let mut unit = CompilationUnit::new("com/acme/Annotations.java").with_package("com.acme");
    unit.add_annotation_type(AnnotationTypeDecl::new(TIMED, vec![Annotation::new(PRIMARY)]));
    unit.add_annotation_type(AnnotationTypeDecl::new(AUDITED, vec![Annotation::new(TIMED)]));
    unit.add_annotation_type(AnnotationTypeDecl::new(
        PLAIN,
        vec![Annotation::new("java.lang.annotation.Documented")],
    ));
    unit
}

pub fn class_unit(path: &str, name: &str) -> (CompilationUnit, TypeId) {
    let mut unit = CompilationUnit::new(path);
    let ty = unit.add_type(TypeDecl::class(name));
    (unit, ty)
}

pub fn int(n: i64) -> Expr {
    Expr::lit(Literal::Int(n))
}

/// Receiver-less call: `name(args)`
pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::synthetic(ExprKind::Call {
        receiver: None,
        method: name.into(),
        args,
    })
}

pub fn effect(name: &str, args: Vec<Expr>) -> Statement {
    Statement::expr(call(name, args))
}

pub fn eq(left: Expr, right: Expr) -> Expr {
    Expr::binary(BinaryOp::Eq, left, right)
}

pub fn if_then(condition: Expr, then: Vec<Statement>) -> Statement {
    Statement::synthetic(StatementKind::If {
        condition,
        then_block: Block::new(then),
        else_block: None,
    })
}

pub fn ret(value: Expr) -> Statement {
    Statement::ret(Some(value))
}

/// ```text
/// int pick(int n) {
///     trace("start");
///     if (n == 1) { return 10; }
///     trace(n);
///     if (n == 2) { return 20; }
///     return 30;
/// }
/// ```
pub fn three_exits(owner: TypeId) -> MethodDecl {
    MethodDecl::new(
        owner,
        "pick",
        TypeRef::Int,
        Block::new(vec![
            effect("trace", vec![Expr::string("start")]),
            if_then(eq(Expr::var("n"), int(1)), vec![ret(int(10))]),
            effect("trace", vec![Expr::var("n")]),
            if_then(eq(Expr::var("n"), int(2)), vec![ret(int(20))]),
            ret(int(30)),
        ]),
    )
    .with_param("n", TypeRef::Int)
}

/// ```text
/// void tick(int n) {
///     if (n < 0) { return; }
///     trace(n);
/// }
/// ```
pub fn early_void(owner: TypeId) -> MethodDecl {
    MethodDecl::new(
        owner,
        "tick",
        TypeRef::Void,
        Block::new(vec![
            if_then(
                Expr::binary(BinaryOp::Lt, Expr::var("n"), int(0)),
                vec![Statement::ret(None)],
            ),
            effect("trace", vec![Expr::var("n")]),
        ]),
    )
    .with_param("n", TypeRef::Int)
}

/// ```text
/// int search(int n) {
///     int i = 0;
///     while (i < 5) {
///         i = i + 1;
///         try {
///             if (i == n) { return i * 100; }
///             if (i == 4 && n > 10) { fail(i); }
///         } finally {
///             trace(i);
///         }
///     }
///     return -1;
/// }
/// ```
pub fn nested_exits(owner: TypeId) -> MethodDecl {
    let i = || Expr::var("i");
    MethodDecl::new(
        owner,
        "search",
        TypeRef::Int,
        Block::new(vec![
            Statement::local("i", TypeRef::Int, Some(int(0)), false),
            Statement::synthetic(StatementKind::While {
                condition: Expr::binary(BinaryOp::Lt, i(), int(5)),
                body: Block::new(vec![
                    Statement::assign("i", Expr::binary(BinaryOp::Add, i(), int(1))),
                    Statement::synthetic(StatementKind::Try {
                        body: Block::new(vec![
                            if_then(
                                eq(i(), Expr::var("n")),
                                vec![ret(Expr::binary(BinaryOp::Mul, i(), int(100)))],
                            ),
                            if_then(
                                Expr::binary(
                                    BinaryOp::And,
                                    eq(i(), int(4)),
                                    Expr::binary(BinaryOp::Gt, Expr::var("n"), int(10)),
                                ),
                                vec![effect("fail", vec![i()])],
                            ),
                        ]),
                        catch: None,
                        finally: Some(Block::new(vec![effect("trace", vec![i()])])),
                    }),
                ]),
            }),
            ret(int(-1)),
        ]),
    )
    .with_param("n", TypeRef::Int)
}

pub fn annotate(mut method: MethodDecl, annotation: Annotation) -> MethodDecl {
    method.annotations.push(annotation);
    method
}

/// Body of a method, panicking when it has none
pub fn body_of(unit: &CompilationUnit, id: MethodId) -> Block {
    unit.method(id)
        .and_then(|m| m.body.clone())
        .expect("method with a body")
}
