//! Tiny interpreter over method bodies.
//!
//! Runs a method with the aspect runtime stubbed out: `AspectContext.create`
//! yields a context value, and every hook call on it is appended to the
//! trace. Calls to anything else are recorded as `name(args)` and return
//! their first argument, except `fail(..)`, which throws.

use std::collections::HashMap;

use weft_ast::{
    BinaryOp, Block, CompilationUnit, Expr, ExprKind, Literal, MethodId, StatementKind, UnaryOp,
};

const CONTEXT_TYPE: &str = "weft.aop.AspectContext";
const LOOP_LIMIT: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Context,
    Object,
    Array(Vec<Value>),
}

impl Value {
    fn render(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Str(s) => s.clone(),
            Value::Context => "ctx".into(),
            Value::Object => "this".into(),
            Value::Array(items) => {
                let items: Vec<_> = items.iter().map(Value::render).collect();
                format!("[{}]", items.join(", "))
            }
        }
    }
}

/// Result of one invocation: the returned or thrown value plus the trace
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub result: Result<Value, Value>,
    pub trace: Vec<String>,
}

impl Run {
    /// Trace entries produced by aspect hooks only
    pub fn hooks(&self) -> Vec<&str> {
        self.trace
            .iter()
            .map(String::as_str)
            .filter(|t| t.starts_with("hook:"))
            .collect()
    }

    /// Trace entries produced by the original body only
    pub fn effects(&self) -> Vec<&str> {
        self.trace
            .iter()
            .map(String::as_str)
            .filter(|t| !t.starts_with("hook:"))
            .collect()
    }
}

enum Flow {
    Normal,
    Return(Value),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Value),
}

struct Machine {
    vars: HashMap<String, Value>,
    trace: Vec<String>,
}

pub fn invoke(unit: &CompilationUnit, id: MethodId, args: Vec<Value>) -> Run {
    let method = unit.method(id).expect("method in unit");
    let body = method.body.as_ref().expect("method with a body");
    assert_eq!(method.params.len(), args.len(), "argument count for {}", method.name);

    let mut machine = Machine {
        vars: method.params.iter().map(|p| p.name.clone()).zip(args).collect(),
        trace: Vec::new(),
    };
    let result = match machine.block(body) {
        Flow::Normal => Ok(Value::Null),
        Flow::Return(value) => Ok(value),
        Flow::Throw(value) => Err(value),
        Flow::Break(label) => panic!("break {:?} escaped the method", label),
        Flow::Continue(label) => panic!("continue {:?} escaped the method", label),
    };
    Run {
        result,
        trace: machine.trace,
    }
}

impl Machine {
    fn block(&mut self, block: &Block) -> Flow {
        for stmt in &block.statements {
            match self.statement(&stmt.kind) {
                Flow::Normal => {}
                other => return other,
            }
        }
        Flow::Normal
    }

    fn statement(&mut self, kind: &StatementKind) -> Flow {
        match kind {
            StatementKind::Local { name, value, .. } => {
                let value = match value {
                    Some(expr) => match self.expr(expr) {
                        Ok(v) => v,
                        Err(thrown) => return Flow::Throw(thrown),
                    },
                    None => Value::Null,
                };
                self.vars.insert(name.clone(), value);
                Flow::Normal
            }
            StatementKind::Assign { target, value } => match self.expr(value) {
                Ok(v) => {
                    self.vars.insert(target.clone(), v);
                    Flow::Normal
                }
                Err(thrown) => Flow::Throw(thrown),
            },
            StatementKind::Expr(expr) => match self.expr(expr) {
                Ok(_) => Flow::Normal,
                Err(thrown) => Flow::Throw(thrown),
            },
            StatementKind::Return(value) => match value {
                None => Flow::Return(Value::Null),
                Some(expr) => match self.expr(expr) {
                    Ok(v) => Flow::Return(v),
                    Err(thrown) => Flow::Throw(thrown),
                },
            },
            StatementKind::If {
                condition,
                then_block,
                else_block,
            } => match self.expr(condition) {
                Ok(Value::Bool(true)) => self.block(then_block),
                Ok(Value::Bool(false)) => {
                    else_block.as_ref().map_or(Flow::Normal, |b| self.block(b))
                }
                Ok(other) => panic!("non-boolean condition {:?}", other),
                Err(thrown) => Flow::Throw(thrown),
            },
            StatementKind::While { condition, body } => {
                for _ in 0..LOOP_LIMIT {
                    match self.expr(condition) {
                        Ok(Value::Bool(true)) => {}
                        Ok(Value::Bool(false)) => return Flow::Normal,
                        Ok(other) => panic!("non-boolean condition {:?}", other),
                        Err(thrown) => return Flow::Throw(thrown),
                    }
                    match self.block(body) {
                        Flow::Normal | Flow::Continue(None) => {}
                        Flow::Break(None) => return Flow::Normal,
                        other => return other,
                    }
                }
                panic!("loop did not terminate");
            }
            StatementKind::Block(body) => self.block(body),
            StatementKind::Labeled { label, body } => match self.block(body) {
                Flow::Break(Some(target)) if target == *label => Flow::Normal,
                other => other,
            },
            StatementKind::Break(label) => Flow::Break(label.clone()),
            StatementKind::Continue(label) => Flow::Continue(label.clone()),
            StatementKind::Throw(expr) => match self.expr(expr) {
                Ok(v) | Err(v) => Flow::Throw(v),
            },
            StatementKind::Try { body, catch, finally } => {
                let mut flow = self.block(body);
                if let Some(clause) = catch {
                    if let Flow::Throw(thrown) = flow {
                        self.vars.insert(clause.name.clone(), thrown);
                        flow = self.block(&clause.body);
                    }
                }
                if let Some(finally) = finally {
                    match self.block(finally) {
                        Flow::Normal => {}
                        other => return other,
                    }
                }
                flow
            }
        }
    }

    fn expr(&mut self, expr: &Expr) -> Result<Value, Value> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(match lit {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(n) | Literal::Long(n) => Value::Int(*n),
                Literal::Double(d) => Value::Int(*d as i64),
                Literal::Char(c) => Value::Str(c.to_string()),
                Literal::String(s) => Value::Str(s.clone()),
            }),
            ExprKind::Var(name) => Ok(self.vars.get(name).cloned().unwrap_or(Value::Null)),
            ExprKind::This => Ok(Value::Object),
            ExprKind::Call { receiver, method, args } => {
                let receiver = match receiver {
                    Some(r) => Some(self.expr(r)?),
                    None => None,
                };
                let args = self.args(args)?;
                if receiver == Some(Value::Context) {
                    let rendered = args.first().map(Value::render).unwrap_or_default();
                    self.trace.push(format!("hook:{}({})", method, rendered));
                    return Ok(args.into_iter().next().unwrap_or(Value::Null));
                }
                self.call(method, args)
            }
            ExprKind::StaticCall { owner, method, args } => {
                let args = self.args(args)?;
                if owner == CONTEXT_TYPE && method == "create" {
                    let builder = args
                        .get(4)
                        .map(Value::render)
                        .unwrap_or_else(|| "default".into());
                    self.trace.push(format!("hook:create({})", builder));
                    return Ok(Value::Context);
                }
                self.call(method, args)
            }
            ExprKind::Field { object, .. } => {
                self.expr(object)?;
                Ok(Value::Null)
            }
            ExprKind::Binary { op, left, right } => {
                let l = self.expr(left)?;
                if let (BinaryOp::And, Value::Bool(false)) | (BinaryOp::Or, Value::Bool(true)) =
                    (op, &l)
                {
                    return Ok(l);
                }
                let r = self.expr(right)?;
                Ok(binary(*op, l, r))
            }
            ExprKind::Unary { op, operand } => Ok(match (op, self.expr(operand)?) {
                (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
                (UnaryOp::Neg, Value::Int(n)) => Value::Int(-n),
                (op, v) => panic!("cannot apply {:?} to {:?}", op, v),
            }),
            ExprKind::ClassLiteral(_)
            | ExprKind::Lambda { .. }
            | ExprKind::AnonymousClass { .. } => Ok(Value::Object),
            ExprKind::NewArray { items, .. } => Ok(Value::Array(self.args(items)?)),
            ExprKind::Cast { expr, .. } => self.expr(expr),
        }
    }

    fn args(&mut self, args: &[Expr]) -> Result<Vec<Value>, Value> {
        args.iter().map(|a| self.expr(a)).collect()
    }

    fn call(&mut self, method: &str, args: Vec<Value>) -> Result<Value, Value> {
        let rendered: Vec<_> = args.iter().map(Value::render).collect();
        self.trace.push(format!("{}({})", method, rendered.join(", ")));
        if method == "fail" {
            return Err(Value::Str(rendered.join(", ")));
        }
        Ok(args.into_iter().next().unwrap_or(Value::Null))
    }
}

fn binary(op: BinaryOp, l: Value, r: Value) -> Value {
    match (op, l, r) {
        (BinaryOp::Eq, l, r) => Value::Bool(l == r),
        (BinaryOp::Ne, l, r) => Value::Bool(l != r),
        (BinaryOp::And | BinaryOp::Or, _, r) => r,
        (op, Value::Int(a), Value::Int(b)) => match op {
            BinaryOp::Add => Value::Int(a + b),
            BinaryOp::Sub => Value::Int(a - b),
            BinaryOp::Mul => Value::Int(a * b),
            BinaryOp::Div => Value::Int(a / b),
            BinaryOp::Rem => Value::Int(a % b),
            BinaryOp::Lt => Value::Bool(a < b),
            BinaryOp::Le => Value::Bool(a <= b),
            BinaryOp::Gt => Value::Bool(a > b),
            BinaryOp::Ge => Value::Bool(a >= b),
            _ => unreachable!(),
        },
        (BinaryOp::Add, Value::Str(a), b) => Value::Str(format!("{}{}", a, b.render())),
        (op, l, r) => panic!("cannot apply {:?} to {:?} and {:?}", op, l, r),
    }
}
