use crate::ast::*;
use crate::compiler::Compilation;
use crate::stdlib::{self, Native};
use crate::types::{resolve_type_expr, Builtin, Type};
use crate::value::{format_float, Value};
use log::trace;
use smol_str::SmolStr;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};
use thiserror::Error;

/// How often, in steps, the wall clock is consulted.
const DEADLINE_CHECK_INTERVAL: u64 = 64;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutionError {
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("evaluation timed out after {0:?}")]
    Timeout(Duration),
    #[error("evaluation exceeded the step limit of {0}")]
    StepLimit(u64),
    #[error("stack overflow: call depth exceeded {0}")]
    CallDepth(usize),
    #[error("entry point `{0}` not found")]
    EntryPoint(SmolStr),
}

impl ExecutionError {
    pub fn runtime(message: impl Into<String>) -> Self {
        ExecutionError::Runtime(message.into())
    }
}

pub type ExecResult<T> = Result<T, ExecutionError>;

/// A mutable variable cell. Closures share cells with the scope that created
/// them.
pub type Slot<'a> = Rc<RefCell<RuntimeValue<'a>>>;

#[derive(Clone)]
pub enum RuntimeValue<'a> {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    /// Result of a call without a value, and the zero value of function types.
    Void,
    Function(Rc<Closure<'a>>),
    Native(Native),
    Builtin(Builtin),
    Package(SmolStr),
}

pub struct Closure<'a> {
    pub name: SmolStr,
    pub params: &'a [Parameter],
    pub body: &'a Block,
    captured: RefCell<Environment<'a>>,
}

impl fmt::Debug for Closure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name)
            .field("params", &self.params.len())
            .finish()
    }
}

impl<'a> RuntimeValue<'a> {
    pub fn type_name(&self) -> &'static str {
        match self {
            RuntimeValue::Int(_) => "int",
            RuntimeValue::Float(_) => "float64",
            RuntimeValue::Bool(_) => "bool",
            RuntimeValue::String(_) => "string",
            RuntimeValue::Void => "nil",
            RuntimeValue::Function(_) | RuntimeValue::Native(_) | RuntimeValue::Builtin(_) => "func",
            RuntimeValue::Package(_) => "package",
        }
    }

    /// The caller-facing scalar, if this is one.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            RuntimeValue::Int(v) => Some(Value::Int(*v)),
            RuntimeValue::Float(v) => Some(Value::Float(*v)),
            RuntimeValue::Bool(v) => Some(Value::Bool(*v)),
            RuntimeValue::String(v) => Some(Value::String(v.clone())),
            _ => None,
        }
    }

    fn zero(ty: &Type) -> Self {
        match ty {
            Type::Int => RuntimeValue::Int(0),
            Type::Float => RuntimeValue::Float(0.0),
            Type::Bool => RuntimeValue::Bool(false),
            Type::String => RuntimeValue::String(String::new()),
            _ => RuntimeValue::Void,
        }
    }
}

impl From<&Value> for RuntimeValue<'_> {
    fn from(value: &Value) -> Self {
        match value {
            Value::Int(v) => RuntimeValue::Int(*v),
            Value::Float(v) => RuntimeValue::Float(*v),
            Value::Bool(v) => RuntimeValue::Bool(*v),
            Value::String(v) => RuntimeValue::String(v.clone()),
        }
    }
}

impl fmt::Debug for RuntimeValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Int(v) => write!(f, "Int({v})"),
            RuntimeValue::Float(v) => write!(f, "Float({v})"),
            RuntimeValue::Bool(v) => write!(f, "Bool({v})"),
            RuntimeValue::String(v) => write!(f, "String({v:?})"),
            RuntimeValue::Void => write!(f, "Void"),
            RuntimeValue::Function(closure) => write!(f, "Function({})", closure.name),
            RuntimeValue::Native(native) => write!(f, "Native({})", native.name()),
            RuntimeValue::Builtin(builtin) => write!(f, "Builtin({})", builtin.name()),
            RuntimeValue::Package(path) => write!(f, "Package({path})"),
        }
    }
}

impl fmt::Display for RuntimeValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Int(v) => write!(f, "{v}"),
            RuntimeValue::Float(v) => f.write_str(&format_float(*v)),
            RuntimeValue::Bool(v) => write!(f, "{v}"),
            RuntimeValue::String(v) => f.write_str(v),
            RuntimeValue::Void => f.write_str("<nil>"),
            RuntimeValue::Function(closure) => write!(f, "func {}", closure.name),
            RuntimeValue::Native(native) => write!(f, "func {}", native.name()),
            RuntimeValue::Builtin(builtin) => write!(f, "func {}", builtin.name()),
            RuntimeValue::Package(path) => write!(f, "package {path}"),
        }
    }
}

impl PartialEq for RuntimeValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuntimeValue::Int(a), RuntimeValue::Int(b)) => a == b,
            (RuntimeValue::Float(a), RuntimeValue::Float(b)) => a == b,
            (RuntimeValue::Bool(a), RuntimeValue::Bool(b)) => a == b,
            (RuntimeValue::String(a), RuntimeValue::String(b)) => a == b,
            (RuntimeValue::Void, RuntimeValue::Void) => true,
            (RuntimeValue::Function(a), RuntimeValue::Function(b)) => Rc::ptr_eq(a, b),
            (RuntimeValue::Native(a), RuntimeValue::Native(b)) => a == b,
            (RuntimeValue::Builtin(a), RuntimeValue::Builtin(b)) => a == b,
            (RuntimeValue::Package(a), RuntimeValue::Package(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Clone, Default)]
pub struct Environment<'a> {
    frames: Vec<HashMap<SmolStr, Slot<'a>>>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        let mut env = Self { frames: Vec::new() };
        env.push();
        env
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn declare(&mut self, name: SmolStr, value: RuntimeValue<'a>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name, Rc::new(RefCell::new(value)));
        }
    }

    pub fn slot(&self, name: &str) -> Option<&Slot<'a>> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }
}

/// Limits applied to a single run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Function invoked once package-level variables are initialised.
    pub entry_point: SmolStr,
    /// Wall-clock budget for the whole run.
    pub timeout: Option<Duration>,
    /// Budget of executed statements, loop iterations and calls.
    pub max_steps: Option<u64>,
    pub max_call_depth: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            entry_point: SmolStr::new_inline("evaluate"),
            timeout: Some(Duration::from_secs(10)),
            max_steps: None,
            max_call_depth: 128,
        }
    }
}

impl ExecutionConfig {
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}

/// Executes compiled programs. Every call to [`Vm::execute`] starts from a
/// fresh interpreter; nothing carries over between runs.
#[derive(Debug, Default, Clone)]
pub struct Vm {
    config: ExecutionConfig,
}

impl Vm {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Runs the program: initialises package-level state, overwrites the
    /// given variables, then calls the entry point and returns its result.
    pub fn execute<'a, 'v, I, N>(
        &self,
        compilation: &'a Compilation,
        bindings: I,
    ) -> ExecResult<RuntimeValue<'a>>
    where
        I: IntoIterator<Item = (N, &'v Value)>,
        N: Into<SmolStr>,
    {
        let started = Instant::now();
        let mut interpreter = Interpreter::new(compilation, &self.config, started);
        interpreter.initialize_globals()?;
        for (name, value) in bindings {
            interpreter.globals.insert(name.into(), RuntimeValue::from(value));
        }
        let entry = interpreter
            .globals
            .get(&self.config.entry_point)
            .cloned()
            .ok_or_else(|| ExecutionError::EntryPoint(self.config.entry_point.clone()))?;
        let result = interpreter.call_value(entry, Vec::new());
        trace!(
            "run finished in {:?} after {} steps",
            started.elapsed(),
            interpreter.steps
        );
        result
    }
}

enum Flow<'a> {
    Normal,
    Break,
    Continue,
    Return(RuntimeValue<'a>),
}

struct Interpreter<'a, 'c> {
    compilation: &'a Compilation,
    config: &'c ExecutionConfig,
    globals: HashMap<SmolStr, RuntimeValue<'a>>,
    env: Environment<'a>,
    steps: u64,
    depth: usize,
    deadline: Option<Instant>,
    /// Function literals created during the run. A literal stored in a
    /// variable it captured forms a cycle, broken when the run ends.
    literals: Vec<Weak<Closure<'a>>>,
}

impl Drop for Interpreter<'_, '_> {
    fn drop(&mut self) {
        for closure in self.literals.drain(..).filter_map(|weak| weak.upgrade()) {
            closure.captured.take();
        }
    }
}

impl<'a, 'c> Interpreter<'a, 'c> {
    fn new(compilation: &'a Compilation, config: &'c ExecutionConfig, started: Instant) -> Self {
        Self {
            compilation,
            config,
            globals: HashMap::new(),
            env: Environment::new(),
            steps: 0,
            depth: 0,
            deadline: config.timeout.map(|timeout| started + timeout),
            literals: Vec::new(),
        }
    }

    fn track(&mut self, closure: &Rc<Closure<'a>>) {
        if self.literals.len() == self.literals.capacity() {
            self.literals.retain(|weak| weak.strong_count() > 0);
        }
        self.literals.push(Rc::downgrade(closure));
    }

    fn initialize_globals(&mut self) -> ExecResult<()> {
        for builtin in Builtin::ALL {
            self.globals
                .insert(builtin.name().into(), RuntimeValue::Builtin(builtin));
        }
        let program = &self.compilation.program;
        for import in &program.imports {
            self.globals.insert(
                import.binding().into(),
                RuntimeValue::Package(import.path.as_str().into()),
            );
        }
        for item in &program.items {
            if let Item::Function(func) = item {
                let closure = Closure {
                    name: func.name.clone(),
                    params: &func.params,
                    body: &func.body,
                    captured: RefCell::new(Environment::new()),
                };
                self.globals
                    .insert(func.name.clone(), RuntimeValue::Function(Rc::new(closure)));
            }
        }
        for item in &program.items {
            if let Item::Var(var) = item {
                let value = self.eval_var_init(var)?;
                self.globals.insert(var.name.clone(), value);
            }
        }
        Ok(())
    }

    fn eval_var_init(&mut self, var: &'a VarDecl) -> ExecResult<RuntimeValue<'a>> {
        match (&var.value, &var.ty) {
            (Some(value), _) => self.eval_expr(value),
            (None, Some(ty)) => {
                let ty = resolve_type_expr(ty).map_err(|err| ExecutionError::runtime(err.message()))?;
                Ok(RuntimeValue::zero(&ty))
            }
            (None, None) => Ok(RuntimeValue::Void),
        }
    }

    fn tick(&mut self) -> ExecResult<()> {
        self.steps += 1;
        if let Some(max) = self.config.max_steps {
            if self.steps > max {
                return Err(ExecutionError::StepLimit(max));
            }
        }
        if self.steps % DEADLINE_CHECK_INTERVAL == 0 {
            if let (Some(deadline), Some(timeout)) = (self.deadline, self.config.timeout) {
                if Instant::now() >= deadline {
                    return Err(ExecutionError::Timeout(timeout));
                }
            }
        }
        Ok(())
    }

    fn exec_block(&mut self, block: &'a Block) -> ExecResult<Flow<'a>> {
        self.env.push();
        let flow = self.exec_statements(&block.statements);
        self.env.pop();
        flow
    }

    fn exec_statements(&mut self, statements: &'a [Stmt]) -> ExecResult<Flow<'a>> {
        for stmt in statements {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &'a Stmt) -> ExecResult<Flow<'a>> {
        self.tick()?;
        match stmt {
            Stmt::Define(define) => {
                let value = self.eval_expr(&define.value)?;
                self.env.declare(define.name.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::Var(var) => {
                let value = self.eval_var_init(var)?;
                self.env.declare(var.name.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::Assign(assign) => {
                let value = self.eval_expr(&assign.value)?;
                let value = match assign.op {
                    Some(op) => {
                        let current = self.lookup(&assign.target)?;
                        eval_binary(op, current, value)?
                    }
                    None => value,
                };
                self.store(&assign.target, value)?;
                Ok(Flow::Normal)
            }
            Stmt::IncDec(inc) => {
                let current = self.lookup(&inc.target)?;
                let next = match (current, inc.increment) {
                    (RuntimeValue::Int(v), true) => RuntimeValue::Int(v.wrapping_add(1)),
                    (RuntimeValue::Int(v), false) => RuntimeValue::Int(v.wrapping_sub(1)),
                    (RuntimeValue::Float(v), true) => RuntimeValue::Float(v + 1.0),
                    (RuntimeValue::Float(v), false) => RuntimeValue::Float(v - 1.0),
                    (other, _) => {
                        return Err(ExecutionError::runtime(format!(
                            "cannot increment value of type {}",
                            other.type_name()
                        )))
                    }
                };
                self.store(&inc.target, next)?;
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval_expr(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Return(ret) => {
                let value = match &ret.value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => RuntimeValue::Void,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Continue(_) => Ok(Flow::Continue),
            Stmt::If(if_stmt) => {
                if self.eval_condition(&if_stmt.condition)? {
                    self.exec_block(&if_stmt.then_branch)
                } else if let Some(else_branch) = &if_stmt.else_branch {
                    self.exec_block(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::For(for_stmt) => {
                self.env.push();
                let flow = self.exec_for(for_stmt);
                self.env.pop();
                flow
            }
            Stmt::Block(block) => self.exec_block(block),
        }
    }

    fn exec_for(&mut self, for_stmt: &'a ForStmt) -> ExecResult<Flow<'a>> {
        if let Some(init) = &for_stmt.init {
            self.exec_stmt(init)?;
        }
        loop {
            self.tick()?;
            if let Some(condition) = &for_stmt.condition {
                if !self.eval_condition(condition)? {
                    break;
                }
            }
            match self.exec_block(&for_stmt.body)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
            if let Some(post) = &for_stmt.post {
                self.exec_stmt(post)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn eval_condition(&mut self, expr: &'a Expr) -> ExecResult<bool> {
        match self.eval_expr(expr)? {
            RuntimeValue::Bool(value) => Ok(value),
            other => Err(ExecutionError::runtime(format!(
                "non-boolean condition of type {}",
                other.type_name()
            ))),
        }
    }

    fn lookup(&self, name: &str) -> ExecResult<RuntimeValue<'a>> {
        if let Some(slot) = self.env.slot(name) {
            return Ok(slot.borrow().clone());
        }
        self.globals
            .get(name)
            .cloned()
            .ok_or_else(|| ExecutionError::runtime(format!("undefined: {name}")))
    }

    fn store(&mut self, name: &str, value: RuntimeValue<'a>) -> ExecResult<()> {
        if let Some(slot) = self.env.slot(name) {
            *slot.borrow_mut() = value;
            return Ok(());
        }
        match self.globals.get_mut(name) {
            Some(global) => {
                *global = value;
                Ok(())
            }
            None => Err(ExecutionError::runtime(format!("undefined: {name}"))),
        }
    }

    fn eval_expr(&mut self, expr: &'a Expr) -> ExecResult<RuntimeValue<'a>> {
        match expr {
            Expr::Literal(lit, span) => Ok(match lit {
                Literal::Int(v) if self.compilation.type_info.is_float_literal(span) => {
                    RuntimeValue::Float(*v as f64)
                }
                Literal::Int(v) => RuntimeValue::Int(*v),
                Literal::Float(v) => RuntimeValue::Float(*v),
                Literal::Bool(v) => RuntimeValue::Bool(*v),
                Literal::String(v) => RuntimeValue::String(v.clone()),
            }),
            Expr::Identifier(name, _) => self.lookup(name),
            Expr::Binary(binary) => match binary.op {
                BinaryOp::And => {
                    if !self.eval_condition(&binary.left)? {
                        return Ok(RuntimeValue::Bool(false));
                    }
                    self.eval_condition(&binary.right).map(RuntimeValue::Bool)
                }
                BinaryOp::Or => {
                    if self.eval_condition(&binary.left)? {
                        return Ok(RuntimeValue::Bool(true));
                    }
                    self.eval_condition(&binary.right).map(RuntimeValue::Bool)
                }
                op => {
                    let left = self.eval_expr(&binary.left)?;
                    let right = self.eval_expr(&binary.right)?;
                    match eval_binary(op, left, right)? {
                        RuntimeValue::Int(v) if self.compilation.type_info.is_float_literal(&binary.span) => {
                            Ok(RuntimeValue::Float(v as f64))
                        }
                        value => Ok(value),
                    }
                }
            },
            Expr::Unary(unary) => {
                let value = self.eval_expr(&unary.expr)?;
                match (unary.op, value) {
                    (UnaryOp::Neg, RuntimeValue::Int(v)) => Ok(RuntimeValue::Int(v.wrapping_neg())),
                    (UnaryOp::Neg, RuntimeValue::Float(v)) => Ok(RuntimeValue::Float(-v)),
                    (UnaryOp::Not, RuntimeValue::Bool(v)) => Ok(RuntimeValue::Bool(!v)),
                    (_, other) => Err(ExecutionError::runtime(format!(
                        "invalid operand of type {}",
                        other.type_name()
                    ))),
                }
            }
            Expr::Call(call) => {
                let callee = self.eval_expr(&call.function)?;
                let mut args = Vec::with_capacity(call.args.len());
                for arg in &call.args {
                    args.push(self.eval_expr(arg)?);
                }
                self.call_value(callee, args)
            }
            Expr::Selector(selector) => match self.lookup(&selector.target)? {
                RuntimeValue::Package(path) => stdlib::lookup(&path, &selector.member)
                    .map(RuntimeValue::Native)
                    .ok_or_else(|| {
                        ExecutionError::runtime(format!(
                            "undefined: {}.{}",
                            selector.target, selector.member
                        ))
                    }),
                other => Err(ExecutionError::runtime(format!(
                    "{}.{} undefined on value of type {}",
                    selector.target,
                    selector.member,
                    other.type_name()
                ))),
            },
            Expr::Func(func) => {
                let closure = Rc::new(Closure {
                    name: SmolStr::new_inline("func literal"),
                    params: &func.params,
                    body: &func.body,
                    captured: RefCell::new(self.env.clone()),
                });
                self.track(&closure);
                Ok(RuntimeValue::Function(closure))
            }
        }
    }

    fn call_value(&mut self, callee: RuntimeValue<'a>, args: Vec<RuntimeValue<'a>>) -> ExecResult<RuntimeValue<'a>> {
        self.tick()?;
        match callee {
            RuntimeValue::Function(closure) => self.call_closure(&closure, args),
            RuntimeValue::Native(native) => native.call(&args),
            RuntimeValue::Builtin(builtin) => call_builtin(builtin, args),
            RuntimeValue::Void => Err(ExecutionError::runtime(
                "invalid memory address or nil pointer dereference",
            )),
            other => Err(ExecutionError::runtime(format!(
                "cannot call value of type {}",
                other.type_name()
            ))),
        }
    }

    fn call_closure(&mut self, closure: &Closure<'a>, args: Vec<RuntimeValue<'a>>) -> ExecResult<RuntimeValue<'a>> {
        if args.len() != closure.params.len() {
            return Err(ExecutionError::runtime(format!(
                "{} expects {} arguments, got {}",
                closure.name,
                closure.params.len(),
                args.len()
            )));
        }
        if self.depth >= self.config.max_call_depth {
            return Err(ExecutionError::CallDepth(self.config.max_call_depth));
        }

        let mut env = closure.captured.borrow().clone();
        env.push();
        for (param, arg) in closure.params.iter().zip(args) {
            env.declare(param.name.clone(), arg);
        }

        let body: &'a Block = closure.body;
        let saved = std::mem::replace(&mut self.env, env);
        self.depth += 1;
        let flow = self.exec_statements(&body.statements);
        self.depth -= 1;
        self.env = saved;

        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break | Flow::Continue => Ok(RuntimeValue::Void),
        }
    }
}

fn call_builtin<'a>(builtin: Builtin, args: Vec<RuntimeValue<'a>>) -> ExecResult<RuntimeValue<'a>> {
    let mut args = args.into_iter();
    let (Some(arg), None) = (args.next(), args.next()) else {
        return Err(ExecutionError::runtime(format!(
            "{} expects exactly 1 argument",
            builtin.name()
        )));
    };
    match (builtin, arg) {
        (Builtin::Int, RuntimeValue::Int(v)) => Ok(RuntimeValue::Int(v)),
        (Builtin::Int, RuntimeValue::Float(v)) => Ok(RuntimeValue::Int(v as i64)),
        (Builtin::Float64, RuntimeValue::Int(v)) => Ok(RuntimeValue::Float(v as f64)),
        (Builtin::Float64, RuntimeValue::Float(v)) => Ok(RuntimeValue::Float(v)),
        (Builtin::String, RuntimeValue::String(s)) => Ok(RuntimeValue::String(s)),
        (Builtin::Len, RuntimeValue::String(s)) => Ok(RuntimeValue::Int(s.len() as i64)),
        (builtin, other) => Err(ExecutionError::runtime(format!(
            "cannot apply {} to value of type {}",
            builtin.name(),
            other.type_name()
        ))),
    }
}

fn eval_binary<'a>(op: BinaryOp, left: RuntimeValue<'a>, right: RuntimeValue<'a>) -> ExecResult<RuntimeValue<'a>> {
    use BinaryOp::*;
    use RuntimeValue as V;

    if op.is_comparison() {
        return compare(op, &left, &right).map(V::Bool);
    }
    match (op, left, right) {
        (Add, V::Int(a), V::Int(b)) => Ok(V::Int(a.wrapping_add(b))),
        (Sub, V::Int(a), V::Int(b)) => Ok(V::Int(a.wrapping_sub(b))),
        (Mul, V::Int(a), V::Int(b)) => Ok(V::Int(a.wrapping_mul(b))),
        (Div | Mod, V::Int(_), V::Int(0)) => Err(ExecutionError::runtime("integer divide by zero")),
        (Div, V::Int(a), V::Int(b)) => Ok(V::Int(a.wrapping_div(b))),
        (Mod, V::Int(a), V::Int(b)) => Ok(V::Int(a.wrapping_rem(b))),
        (Add, V::Float(a), V::Float(b)) => Ok(V::Float(a + b)),
        (Sub, V::Float(a), V::Float(b)) => Ok(V::Float(a - b)),
        (Mul, V::Float(a), V::Float(b)) => Ok(V::Float(a * b)),
        (Div, V::Float(a), V::Float(b)) => Ok(V::Float(a / b)),
        (Add, V::String(a), V::String(b)) => Ok(V::String(a + &b)),
        (And, V::Bool(a), V::Bool(b)) => Ok(V::Bool(a && b)),
        (Or, V::Bool(a), V::Bool(b)) => Ok(V::Bool(a || b)),
        (op, left, right) => Err(ExecutionError::runtime(format!(
            "invalid operation: {} {} {}",
            left.type_name(),
            op.as_str(),
            right.type_name()
        ))),
    }
}

fn compare(op: BinaryOp, left: &RuntimeValue<'_>, right: &RuntimeValue<'_>) -> ExecResult<bool> {
    use std::cmp::Ordering;
    use RuntimeValue as V;

    let ordering = match (left, right) {
        (V::Int(a), V::Int(b)) => a.partial_cmp(b),
        (V::Float(a), V::Float(b)) => a.partial_cmp(b),
        (V::String(a), V::String(b)) => a.partial_cmp(b),
        (V::Bool(a), V::Bool(b)) if matches!(op, BinaryOp::Eq | BinaryOp::NotEq) => a.partial_cmp(b),
        _ => {
            return Err(ExecutionError::runtime(format!(
                "invalid comparison: {} {} {}",
                left.type_name(),
                op.as_str(),
                right.type_name()
            )))
        }
    };
    // NaN compares unequal to everything, itself included.
    Ok(match op {
        BinaryOp::Eq => ordering == Some(Ordering::Equal),
        BinaryOp::NotEq => ordering != Some(Ordering::Equal),
        BinaryOp::Lt => ordering == Some(Ordering::Less),
        BinaryOp::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::Gt => ordering == Some(Ordering::Greater),
        BinaryOp::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        _ => false,
    })
}
