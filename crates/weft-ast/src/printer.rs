//! Canonical source printer
//!
//! Serializes a compilation unit back to Java-like source text. Output is
//! fully deterministic: four-space indentation, one statement per line, one
//! blank line between members. Two trees print to the same bytes exactly when
//! they are structurally equal, which is what the weaver's idempotence checks
//! rely on.

use crate::{
    Annotation, BinaryOp, Block, CatchClause, CompilationUnit, Expr, ExprKind, FieldDecl,
    Literal, MethodDecl, MethodKind, Statement, StatementKind, TypeDecl, DeclKind, TypeId,
    UnaryOp,
};

/// Trait for converting AST nodes to canonical source text.
///
/// The unit is passed along so nodes referring to other arena entries
/// (anonymous classes, nested types, methods) can be resolved.
pub trait ToSource {
    fn to_source(&self, unit: &CompilationUnit, indent: usize) -> String;
}

/// Print a whole compilation unit
pub fn print_unit(unit: &CompilationUnit) -> String {
    unit.to_source(unit, 0)
}

/// Print a single type (with its members and nested types)
pub fn print_type(unit: &CompilationUnit, id: TypeId) -> String {
    unit.ty(id)
        .map(|decl| decl.to_source(unit, 0))
        .unwrap_or_default()
}

/// Four spaces per level
fn indent_str(level: usize) -> String {
    "    ".repeat(level)
}

fn escape_string(s: &str) -> String {
    let mut result = String::new();
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            '\r' => result.push_str("\\r"),
            _ => result.push(c),
        }
    }
    result
}

// ===== Unit and declarations =====

impl ToSource for CompilationUnit {
    fn to_source(&self, _unit: &CompilationUnit, indent: usize) -> String {
        let mut parts = Vec::new();
        if let Some(package) = &self.package {
            parts.push(format!("package {};", package));
        }
        if !self.imports.is_empty() {
            parts.push(
                self.imports
                    .iter()
                    .map(|i| format!("import {};", i))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }
        for (_, decl) in self.top_level_types() {
            if !decl.is_anonymous() {
                parts.push(decl.to_source(self, indent));
            }
        }
        let mut out = parts.join("\n\n");
        out.push('\n');
        out
    }
}

impl ToSource for Annotation {
    fn to_source(&self, _unit: &CompilationUnit, indent: usize) -> String {
        let ind = indent_str(indent);
        if self.args.is_empty() {
            return format!("{}@{}", ind, self.name);
        }
        let args = self
            .args
            .iter()
            .map(|a| format!("{} = {}", a.name, literal_source(&a.value)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}@{}({})", ind, self.name, args)
    }
}

/// Member lines of a class body: fields, methods, then nested types
fn type_members(decl: &TypeDecl, unit: &CompilationUnit, indent: usize) -> Vec<String> {
    let mut groups = Vec::new();
    if !decl.fields.is_empty() {
        groups.push(
            decl.fields
                .iter()
                .map(|f| f.to_source(unit, indent))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    for id in &decl.methods {
        if let Some(method) = unit.method(*id) {
            groups.push(method.to_source(unit, indent));
        }
    }
    for id in &decl.nested {
        if let Some(nested) = unit.ty(*id) {
            groups.push(nested.to_source(unit, indent));
        }
    }
    groups
}

impl ToSource for TypeDecl {
    fn to_source(&self, unit: &CompilationUnit, indent: usize) -> String {
        let ind = indent_str(indent);
        let mut lines: Vec<String> = self
            .annotations
            .iter()
            .map(|a| a.to_source(unit, indent))
            .collect();

        let keyword = match self.kind {
            DeclKind::Class => "class",
            DeclKind::Interface => "interface",
            DeclKind::Enum => "enum",
        };
        let name = self.name.as_deref().unwrap_or("");
        lines.push(format!("{}{} {} {{", ind, keyword, name));

        let members = type_members(self, unit, indent + 1);
        if !members.is_empty() {
            lines.push(members.join("\n\n"));
        }
        lines.push(format!("{}}}", ind));
        lines.join("\n")
    }
}

impl ToSource for FieldDecl {
    fn to_source(&self, unit: &CompilationUnit, indent: usize) -> String {
        let mut out = indent_str(indent);
        if self.synthetic {
            out.push_str("private ");
        }
        if self.is_static {
            out.push_str("static ");
        }
        if self.is_final {
            out.push_str("final ");
        }
        out.push_str(&format!("{} {}", self.ty.display(), self.name));
        if let Some(init) = &self.init {
            out.push_str(&format!(" = {}", init.to_source(unit, indent)));
        }
        out.push(';');
        out
    }
}

impl ToSource for MethodDecl {
    fn to_source(&self, unit: &CompilationUnit, indent: usize) -> String {
        let ind = indent_str(indent);
        let mut lines: Vec<String> = self
            .annotations
            .iter()
            .map(|a| a.to_source(unit, indent))
            .collect();

        let params = self
            .params
            .iter()
            .map(|p| format!("{} {}", p.ty.display(), p.name))
            .collect::<Vec<_>>()
            .join(", ");
        let modifiers = match (self.is_static, self.is_abstract) {
            (true, _) => "static ",
            (false, true) => "abstract ",
            (false, false) => "",
        };

        let header = match self.kind {
            MethodKind::Initializer => format!("{}{}", ind, modifiers.trim_end()),
            MethodKind::Constructor => {
                let owner = unit
                    .ty(self.owner)
                    .and_then(|t| t.name.clone())
                    .unwrap_or_default();
                format!("{}{}({})", ind, owner, params)
            }
            MethodKind::Method => {
                let ret = self
                    .return_type
                    .as_ref()
                    .map(|t| t.display())
                    .unwrap_or_else(|| "void".to_string());
                format!("{}{}{} {}({})", ind, modifiers, ret, self.name, params)
            }
        };

        match &self.body {
            Some(body) => {
                let opener = if header.trim().is_empty() {
                    format!("{}{{", ind)
                } else {
                    format!("{} {{", header)
                };
                lines.push(opener);
                lines.extend(block_lines(body, unit, indent + 1));
                lines.push(format!("{}}}", ind));
            }
            None => lines.push(format!("{};", header)),
        }
        lines.join("\n")
    }
}

// ===== Statements =====

fn block_lines(block: &Block, unit: &CompilationUnit, indent: usize) -> Vec<String> {
    block
        .statements
        .iter()
        .map(|s| s.to_source(unit, indent))
        .collect()
}

/// `{`, the block's statements, and the closing brace at `indent`
fn braced(block: &Block, unit: &CompilationUnit, indent: usize) -> String {
    let mut lines = vec!["{".to_string()];
    lines.extend(block_lines(block, unit, indent + 1));
    lines.push(format!("{}}}", indent_str(indent)));
    lines.join("\n")
}

impl ToSource for Block {
    fn to_source(&self, unit: &CompilationUnit, indent: usize) -> String {
        format!("{}{}", indent_str(indent), braced(self, unit, indent))
    }
}

impl ToSource for Statement {
    fn to_source(&self, unit: &CompilationUnit, indent: usize) -> String {
        let ind = indent_str(indent);
        let expr = |e: &Expr| e.to_source(unit, indent);
        match &self.kind {
            StatementKind::Local {
                name,
                ty,
                value,
                is_final,
            } => {
                let modifier = if *is_final { "final " } else { "" };
                match value {
                    Some(v) => {
                        format!("{}{}{} {} = {};", ind, modifier, ty.display(), name, expr(v))
                    }
                    None => format!("{}{}{} {};", ind, modifier, ty.display(), name),
                }
            }
            StatementKind::Assign { target, value } => {
                format!("{}{} = {};", ind, target, expr(value))
            }
            StatementKind::Expr(e) => format!("{}{};", ind, expr(e)),
            StatementKind::Return(None) => format!("{}return;", ind),
            StatementKind::Return(Some(e)) => format!("{}return {};", ind, expr(e)),
            StatementKind::If {
                condition,
                then_block,
                else_block,
            } => {
                let mut out = format!(
                    "{}if ({}) {}",
                    ind,
                    expr(condition),
                    braced(then_block, unit, indent)
                );
                if let Some(else_block) = else_block {
                    out.push_str(&format!(" else {}", braced(else_block, unit, indent)));
                }
                out
            }
            StatementKind::While { condition, body } => {
                format!("{}while ({}) {}", ind, expr(condition), braced(body, unit, indent))
            }
            StatementKind::Block(block) => block.to_source(unit, indent),
            StatementKind::Labeled { label, body } => {
                format!("{}{}: {}", ind, label, braced(body, unit, indent))
            }
            StatementKind::Break(None) => format!("{}break;", ind),
            StatementKind::Break(Some(label)) => format!("{}break {};", ind, label),
            StatementKind::Continue(None) => format!("{}continue;", ind),
            StatementKind::Continue(Some(label)) => format!("{}continue {};", ind, label),
            StatementKind::Throw(e) => format!("{}throw {};", ind, expr(e)),
            StatementKind::Try {
                body,
                catch,
                finally,
            } => {
                let mut out = format!("{}try {}", ind, braced(body, unit, indent));
                if let Some(CatchClause { ty, name, body }) = catch {
                    out.push_str(&format!(
                        " catch ({} {}) {}",
                        ty.display(),
                        name,
                        braced(body, unit, indent)
                    ));
                }
                if let Some(finally) = finally {
                    out.push_str(&format!(" finally {}", braced(finally, unit, indent)));
                }
                out
            }
        }
    }
}

// ===== Expressions =====

fn literal_source(lit: &Literal) -> String {
    match lit {
        Literal::Null => "null".to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::Int(n) => n.to_string(),
        Literal::Long(n) => format!("{}L", n),
        Literal::Double(n) => format!("{:?}", n),
        Literal::Char('\0') => "'\\0'".to_string(),
        Literal::Char('\'') => "'\\''".to_string(),
        Literal::Char(c) => format!("'{}'", escape_string(&c.to_string())),
        Literal::String(s) => format!("\"{}\"", escape_string(s)),
    }
}

fn is_atomic(expr: &Expr) -> bool {
    !matches!(
        expr.kind,
        ExprKind::Binary { .. }
            | ExprKind::Unary { .. }
            | ExprKind::Cast { .. }
            | ExprKind::Lambda { .. }
    )
}

/// Print `expr`, parenthesized when needed
fn operand(expr: &Expr, unit: &CompilationUnit, indent: usize, needs_parens: bool) -> String {
    let text = expr.to_source(unit, indent);
    if needs_parens {
        format!("({})", text)
    } else {
        text
    }
}

fn args_source(args: &[Expr], unit: &CompilationUnit, indent: usize) -> String {
    args.iter()
        .map(|a| a.to_source(unit, indent))
        .collect::<Vec<_>>()
        .join(", ")
}

fn child_needs_parens(parent: BinaryOp, child: &Expr, right: bool) -> bool {
    match &child.kind {
        ExprKind::Binary { op, .. } => {
            op.precedence() < parent.precedence()
                || (right && op.precedence() == parent.precedence())
        }
        ExprKind::Lambda { .. } => true,
        _ => false,
    }
}

impl ToSource for Expr {
    fn to_source(&self, unit: &CompilationUnit, indent: usize) -> String {
        match &self.kind {
            ExprKind::Literal(lit) => literal_source(lit),
            ExprKind::Var(name) => name.clone(),
            ExprKind::This => "this".to_string(),
            ExprKind::Call {
                receiver,
                method,
                args,
            } => {
                let args = args_source(args, unit, indent);
                match receiver {
                    Some(r) => format!(
                        "{}.{}({})",
                        operand(r, unit, indent, !is_atomic(r)),
                        method,
                        args
                    ),
                    None => format!("{}({})", method, args),
                }
            }
            ExprKind::StaticCall {
                owner,
                method,
                args,
            } => format!("{}.{}({})", owner, method, args_source(args, unit, indent)),
            ExprKind::Field { object, field } => {
                format!("{}.{}", operand(object, unit, indent, !is_atomic(object)), field)
            }
            ExprKind::Binary { op, left, right } => format!(
                "{} {} {}",
                operand(left, unit, indent, child_needs_parens(*op, left, false)),
                op.symbol(),
                operand(right, unit, indent, child_needs_parens(*op, right, true)),
            ),
            ExprKind::Unary { op, operand: inner } => {
                let symbol = match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                };
                format!("{}{}", symbol, operand(inner, unit, indent, !is_atomic(inner)))
            }
            ExprKind::ClassLiteral(ty) => format!("{}.class", ty.erasure().display()),
            ExprKind::NewArray { element, items } if items.is_empty() => {
                format!("new {}[] {{}}", element.display())
            }
            ExprKind::NewArray { element, items } => {
                format!("new {}[] {{ {} }}", element.display(), args_source(items, unit, indent))
            }
            ExprKind::Cast { ty, expr } => {
                format!("({}) {}", ty.display(), operand(expr, unit, indent, !is_atomic(expr)))
            }
            ExprKind::Lambda { params, body } => {
                format!("({}) -> {}", params.join(", "), braced(body, unit, indent))
            }
            ExprKind::AnonymousClass { base, args, class } => {
                let ind = indent_str(indent);
                let head = format!("new {}({}) {{", base, args_source(args, unit, indent));
                let mut lines = vec![head];
                if let Some(decl) = unit.ty(*class) {
                    let members = type_members(decl, unit, indent + 1);
                    if !members.is_empty() {
                        lines.push(members.join("\n\n"));
                    }
                }
                lines.push(format!("{}}}", ind));
                lines.join("\n")
            }
        }
    }
}
