//! Tree-walking evaluator.
//!
//! Statements return a [`Flow`]; expressions return a [`Value`]. Every
//! failure is a located [`RuntimeError`] that unwinds to the current
//! top-level statement or event dispatch. Natives are looked up in the
//! [`SymbolTable`]; the evaluator itself implements no builtins.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::{BuiltinError, ErrorKind, RuntimeError, Warning};
use crate::runtime::environment::Environment;
use crate::runtime::flow::Flow;
use crate::runtime::ops;
use crate::runtime::symbols::{Arity, DefinitionError, NativeFn, PropertySetter, SymbolTable};
use crate::runtime::value::Value;
use crate::syntax::ast::{
    AssignTarget, Expr, FnDef, LogicalOp, NamedArg, Program, ShapeKind, Span, Stmt,
};
use crate::types::color::Color;
use crate::types::shape::Shape;
use crate::types::vector::Vector2;

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Nested user-function calls allowed before a `Limit` error.
    pub max_call_depth: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self { max_call_depth: 256 }
    }
}

// ─── Evaluator ────────────────────────────────────────────────────────────────

/// Owns the global environment and every name table. Not internally
/// synchronised: it is `Send`, so it can be moved to the frame-loop thread
/// once the program has run, but it must only be driven from one thread at
/// a time.
pub struct Evaluator {
    env: Environment,
    symbols: SymbolTable,
    config: EvaluatorConfig,
    call_depth: usize,
    warnings: Vec<Warning>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_config(EvaluatorConfig::default())
    }

    pub fn with_config(config: EvaluatorConfig) -> Self {
        Self {
            env: Environment::new(),
            symbols: SymbolTable::new(),
            config,
            call_depth: 0,
            warnings: Vec::new(),
        }
    }

    // ── Registration ──────────────────────────────────────────────────────────

    pub fn register_builtin<F>(&mut self, name: &str, arity: Arity, func: F) -> Result<(), DefinitionError>
    where
        F: Fn(&[Value]) -> Result<Value, BuiltinError> + Send + Sync + 'static,
    {
        let func: NativeFn = Arc::new(func);
        self.symbols.register_builtin(name, arity, func)
    }

    /// Registering the same property twice replaces the setter with a warning.
    pub fn register_property<F>(&mut self, name: &str, setter: F) -> Result<(), DefinitionError>
    where
        F: Fn(Value) -> Result<(), BuiltinError> + Send + Sync + 'static,
    {
        let setter: PropertySetter = Arc::new(setter);
        if self.symbols.register_property(name, setter)? {
            warn!(property = name, "property is being redefined");
            self.warnings.push(Warning::new(&Span::default(), format!("property `{name}` is being redefined")));
        }
        Ok(())
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.env.get(name)
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.symbols.event(name).is_some()
    }

    pub fn scope_depth(&self) -> usize {
        self.env.depth()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    // ── Entry points ──────────────────────────────────────────────────────────

    /// Run every top-level statement once. A failing statement is reported and
    /// the next one still runs; all failures are returned together. A
    /// top-level `return` stops the program early.
    pub fn execute_program(&mut self, program: &Program) -> Result<(), Vec<RuntimeError>> {
        self.symbols.seal();
        let mut errors = Vec::new();

        for stmt in &program.statements {
            match self.execute_statement(stmt) {
                Ok(Flow::Next) => {}
                Ok(Flow::Return(_)) => {
                    self.warn(stmt.span(), "`return` outside of a function; stopping the program");
                    break;
                }
                Ok(Flow::Break(span)) | Ok(Flow::Continue(span)) => {
                    let e = loop_escape(span);
                    error!(%e, "top-level statement failed");
                    errors.push(e);
                }
                Err(e) => {
                    error!(%e, "top-level statement failed");
                    errors.push(e);
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Invoke the handler registered with `on <name>(...)`. Unknown events are
    /// a no-op. Extra arguments are ignored; too few is an arity error.
    pub fn execute_event(&mut self, name: &str, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
        let Some(def) = self.symbols.event(name).cloned() else { return Ok(None) };

        if args.len() < def.params.len() {
            return Err(RuntimeError::new(
                ErrorKind::Arity { expected: def.params.len(), actual: args.len() },
                &def.span,
                format!(
                    "event `{name}` expects at least {} arguments, got {}",
                    def.params.len(),
                    args.len()
                ),
            ));
        }

        debug!(event = name, args = args.len(), "dispatching event");
        match self.invoke(&def, args, &def.span)? {
            Flow::Return(v) => Ok(Some(v)),
            Flow::Next => Ok(None),
            Flow::Break(span) | Flow::Continue(span) => Err(loop_escape(span)),
        }
    }

    // ── Statements ────────────────────────────────────────────────────────────

    pub fn execute_statement(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::VarDecl(decl) => {
                let value = self.eval_expr(&decl.initializer)?;
                self.declare_variable(&decl.name, value, &decl.span)?;
                Ok(Flow::Next)
            }

            Stmt::Assign(assign) => {
                self.execute_assign(&assign.target, &assign.value)?;
                Ok(Flow::Next)
            }

            Stmt::SetProperty { name, value, span } => {
                let Some(setter) = self.symbols.property(name).cloned() else {
                    return Err(RuntimeError::name(span, format!("unknown property `{name}`; it cannot be set")));
                };
                let value = self.eval_expr(value)?;
                setter(value).map_err(|e| {
                    RuntimeError::new(e.kind, span, format!("error setting property `{name}`: {}", e.message))
                })?;
                Ok(Flow::Next)
            }

            Stmt::FnDef(def) => {
                self.symbols
                    .define_function(Arc::clone(def))
                    .map_err(|e| RuntimeError::name(&def.span, e.to_string()))?;
                Ok(Flow::Next)
            }

            Stmt::EventDef(def) => {
                self.symbols
                    .define_event(Arc::clone(def))
                    .map_err(|e| RuntimeError::name(&def.span, e.to_string()))?;
                Ok(Flow::Next)
            }

            Stmt::If(s) => {
                if self.eval_expr(&s.condition)?.is_truthy() {
                    self.execute_statement(&s.then_branch)
                } else if let Some(else_branch) = &s.else_branch {
                    self.execute_statement(else_branch)
                } else {
                    Ok(Flow::Next)
                }
            }

            Stmt::While(s) => {
                while self.eval_expr(&s.condition)?.is_truthy() {
                    match self.execute_statement(&s.body)? {
                        Flow::Break(_) => break,
                        Flow::Next | Flow::Continue(_) => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Next)
            }

            Stmt::For(s) => {
                let iterable = self.eval_expr(&s.iterable)?;
                let items = iterate(&iterable, &s.iterable.span(), "for loop")?;
                for item in items {
                    let flow = self.scoped(|ev| {
                        ev.declare_variable(&s.var_name, item, &s.span)?;
                        ev.execute_statement(&s.body)
                    })?;
                    match flow {
                        Flow::Break(_) => break,
                        Flow::Next | Flow::Continue(_) => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Next)
            }

            Stmt::Block(stmts, _) => self.scoped(|ev| ev.execute_block(stmts)),

            Stmt::Return(value, _) => {
                let v = match value {
                    Some(e) => self.eval_expr(e)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(v))
            }

            Stmt::Break(span) => Ok(Flow::Break(*span)),
            Stmt::Continue(span) => Ok(Flow::Continue(*span)),

            Stmt::Expr(e) => {
                self.eval_expr(e)?;
                Ok(Flow::Next)
            }
        }
    }

    /// Run statements in the current frame, stopping at the first non-`Next`.
    fn execute_block(&mut self, stmts: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            let flow = self.execute_statement(stmt)?;
            if !flow.is_next() {
                return Ok(flow);
            }
        }
        Ok(Flow::Next)
    }

    /// Base and index are evaluated before the right-hand side, once each.
    fn execute_assign(&mut self, target: &AssignTarget, value: &Expr) -> Result<(), RuntimeError> {
        match target {
            AssignTarget::Ident(name, span) => {
                let v = self.eval_expr(value)?;
                if !self.env.assign(name, v) {
                    return Err(RuntimeError::name(
                        span,
                        format!("variable `{name}` is not defined before assignment"),
                    ));
                }
                Ok(())
            }

            AssignTarget::Index { base, index, span } => {
                let base_v = self.eval_expr(base)?;
                let index_v = self.eval_expr(index)?;
                let v = self.eval_expr(value)?;
                let Value::Array(items) = &base_v else {
                    return Err(RuntimeError::type_error(
                        span,
                        format!("cannot assign by index into {}", base_v.type_name()),
                    ));
                };
                let mut items = items.lock();
                let slot = checked_index(&index_v, items.len(), &index.span())?;
                items[slot] = v;
                Ok(())
            }

            AssignTarget::Property { base, name, span } => {
                let base_v = self.eval_expr(base)?;
                let v = self.eval_expr(value)?;
                match &base_v {
                    Value::Shape(shape) => shape.lock().set(name, v).map_err(|e| e.located(span)),
                    other if other.field(name).is_some() => Err(RuntimeError::type_error(
                        span,
                        format!("`{}.{name}` is read-only", other.type_name()),
                    )),
                    other => Err(RuntimeError::type_error(
                        span,
                        format!("cannot set property `{name}` on {}", other.type_name()),
                    )),
                }
            }
        }
    }

    // ── Expressions ───────────────────────────────────────────────────────────

    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Int(n, _) => Ok(Value::Int(*n)),
            Expr::Float(x, _) => Ok(Value::Float(*x)),
            Expr::Bool(b, _) => Ok(Value::Bool(*b)),
            Expr::StringLit(s, _) => Ok(Value::Str(s.clone())),

            Expr::HexColor(digits, span) => Color::from_hex(digits).map(Value::Color).ok_or_else(|| {
                RuntimeError::new(
                    ErrorKind::Construction,
                    span,
                    format!("invalid color literal `#{digits}`; expected exactly 6 hex digits"),
                )
            }),

            Expr::Ident(name, span) => self.resolve_ident(name, span),

            Expr::Rgb { r, g, b, .. } => {
                let r = self.eval_channel(r)?;
                let g = self.eval_channel(g)?;
                let b = self.eval_channel(b)?;
                Ok(Value::Color(Color::from_channels(r, g, b)))
            }

            Expr::Point { x, y, .. } => {
                let x = self.eval_coordinate(x)?;
                let y = self.eval_coordinate(y)?;
                Ok(Value::Vec2(Vector2::new(x, y)))
            }

            Expr::Logical { left, op, right, .. } => {
                let l = self.eval_expr(left)?;
                match op {
                    LogicalOp::Or if l.is_truthy() => Ok(l),
                    LogicalOp::And if !l.is_truthy() => Ok(l),
                    _ => self.eval_expr(right),
                }
            }

            Expr::Compare { left, op, right, span } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                ops::compare(*op, &l, &r).map(Value::Bool).map_err(|e| e.located(span))
            }

            Expr::Arith { first, rest, .. } => {
                let mut acc = self.eval_expr(first)?;
                for (op, operand) in rest {
                    let r = self.eval_expr(operand)?;
                    acc = ops::arith(*op, acc, r).map_err(|e| e.located(&operand.span()))?;
                }
                Ok(acc)
            }

            Expr::Unary { op, operand, span } => {
                let v = self.eval_expr(operand)?;
                ops::unary(*op, v).map_err(|e| e.located(span))
            }

            Expr::Index { base, index, span } => {
                let base_v = self.eval_expr(base)?;
                let index_v = self.eval_expr(index)?;
                let Value::Array(items) = &base_v else {
                    return Err(RuntimeError::type_error(
                        span,
                        format!("cannot index into {}", base_v.type_name()),
                    ));
                };
                let items = items.lock();
                let slot = checked_index(&index_v, items.len(), &index.span())?;
                Ok(items[slot].clone())
            }

            Expr::Call { callee, args, span } => {
                let Expr::Ident(name, name_span) = callee.as_ref() else {
                    return Err(RuntimeError::type_error(span, "only named functions can be called"));
                };
                if self.symbols.callable(name).is_none() {
                    return Err(if self.env.contains(name) {
                        RuntimeError::type_error(name_span, format!("`{name}` is a variable, not a function"))
                    } else {
                        RuntimeError::name(name_span, format!("function `{name}` is not defined"))
                    });
                }
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg)?);
                }
                self.call_function(name, values, span)
            }

            Expr::Property { base, name, span } => {
                let base_v = self.eval_expr(base)?;
                if let Some(v) = base_v.field(name) {
                    return Ok(v);
                }
                Err(match &base_v {
                    Value::Shape(shape) => {
                        let kind = shape.lock().kind().name();
                        RuntimeError::name(span, format!("shape `{kind}` has no property `{name}`"))
                    }
                    other => RuntimeError::type_error(span, format!("{} has no property `{name}`", other.type_name())),
                })
            }

            Expr::Array(items, _) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                Ok(Value::array(values))
            }

            Expr::Comprehension { output, var_name, iterable, filter, span } => {
                let source = self.eval_expr(iterable)?;
                let items = iterate(&source, &iterable.span(), "list comprehension")?;
                let mut out = Vec::new();
                for item in items {
                    let produced = self.scoped(|ev| {
                        ev.declare_variable(var_name, item, span)?;
                        if let Some(filter) = filter {
                            if !ev.eval_expr(filter)?.is_truthy() {
                                return Ok(None);
                            }
                        }
                        ev.eval_expr(output).map(Some)
                    })?;
                    out.extend(produced);
                }
                Ok(Value::array(out))
            }

            Expr::Shape { kind, args, span } => self.eval_shape(*kind, args, span),
        }
    }

    /// Variables first, then builtins, then user functions.
    fn resolve_ident(&self, name: &str, span: &Span) -> Result<Value, RuntimeError> {
        if let Some(v) = self.env.get(name) {
            return Ok(v.clone());
        }
        if self.symbols.builtin(name).is_some() {
            return Ok(Value::Builtin(name.to_string()));
        }
        if self.symbols.function(name).is_some() {
            return Ok(Value::Function(name.to_string()));
        }
        Err(RuntimeError::name(span, format!("`{name}` is not defined")))
    }

    fn eval_channel(&mut self, expr: &Expr) -> Result<f64, RuntimeError> {
        let v = self.eval_expr(expr)?;
        v.as_number().ok_or_else(|| {
            RuntimeError::new(
                ErrorKind::Construction,
                &expr.span(),
                format!("color channel must be a number, got {}", v.type_name()),
            )
        })
    }

    fn eval_coordinate(&mut self, expr: &Expr) -> Result<f64, RuntimeError> {
        let v = self.eval_expr(expr)?;
        v.as_number().ok_or_else(|| {
            RuntimeError::type_error(&expr.span(), format!("point coordinate must be a number, got {}", v.type_name()))
        })
    }

    fn eval_shape(&mut self, kind: ShapeKind, args: &[NamedArg], span: &Span) -> Result<Value, RuntimeError> {
        let mut values: Vec<(String, Value)> = Vec::with_capacity(args.len());
        for arg in args {
            let v = self.eval_expr(&arg.value)?;
            if values.iter().any(|(name, _)| *name == arg.name) {
                self.warn(
                    arg.span,
                    format!("duplicate argument `{}` for `{}`; the last value wins", arg.name, kind.name()),
                );
            }
            values.push((arg.name.clone(), v));
        }

        let built = Shape::construct(kind, values).map_err(|e| e.located(span))?;
        for name in &built.unknown {
            let at = args.iter().find(|a| a.name == *name).map_or(*span, |a| a.span);
            self.warn(
                at,
                format!("unknown argument `{name}` for `{}`; kept as an extra property", kind.name()),
            );
        }
        Ok(Value::shape(built.shape))
    }

    // ── Calls ─────────────────────────────────────────────────────────────────

    /// Dispatch to a user function, then to a builtin. Arguments are already
    /// evaluated.
    pub fn call_function(&mut self, name: &str, args: Vec<Value>, span: &Span) -> Result<Value, RuntimeError> {
        if let Some(def) = self.symbols.function(name).cloned() {
            if def.params.len() != args.len() {
                return Err(RuntimeError::new(
                    ErrorKind::Arity { expected: def.params.len(), actual: args.len() },
                    span,
                    format!("`{name}` expects {} arguments, got {}", def.params.len(), args.len()),
                ));
            }
            debug!(function = name, "call");
            return match self.invoke(&def, args, span)? {
                Flow::Return(v) => Ok(v),
                Flow::Next => Ok(Value::Nil),
                Flow::Break(at) | Flow::Continue(at) => Err(loop_escape(at)),
            };
        }

        if let Some(builtin) = self.symbols.builtin(name).cloned() {
            if !builtin.arity.accepts(args.len()) {
                return Err(RuntimeError::new(
                    ErrorKind::Arity { expected: builtin.arity.expected(), actual: args.len() },
                    span,
                    format!("`{name}` expects {}, got {}", builtin.arity, args.len()),
                ));
            }
            return (builtin.func)(&args).map_err(|e| e.at(span, name));
        }

        Err(RuntimeError::name(span, format!("function `{name}` is not defined")))
    }

    /// Bind parameters in a fresh frame and run the body.
    fn invoke(&mut self, def: &FnDef, args: Vec<Value>, span: &Span) -> Result<Flow, RuntimeError> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeError::new(
                ErrorKind::Limit,
                span,
                format!("maximum call depth of {} exceeded in `{}`", self.config.max_call_depth, def.name),
            ));
        }

        self.call_depth += 1;
        let result = self.scoped(|ev| {
            for (param, arg) in def.params.iter().zip(args) {
                ev.declare_variable(&param.name, arg, &param.span)?;
            }
            ev.execute_block(&def.body)
        });
        self.call_depth -= 1;
        result
    }

    // ── Scope helpers ─────────────────────────────────────────────────────────

    /// Run `f` inside a new frame. The frame is popped on success and on error.
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, RuntimeError>) -> Result<T, RuntimeError> {
        self.env.enter_scope();
        let result = f(self);
        self.env.exit_scope();
        result
    }

    /// `let` semantics: the name must not belong to a function or builtin;
    /// rebinding in the same frame only warns.
    fn declare_variable(&mut self, name: &str, value: Value, span: &Span) -> Result<(), RuntimeError> {
        if let Some(what) = self.symbols.describe(name) {
            return Err(RuntimeError::name(
                span,
                format!("cannot declare variable `{name}`: it is already defined as {what}"),
            ));
        }
        if self.env.declare(name, value) {
            self.warn(*span, format!("variable `{name}` already declared in this scope (shadowing)"));
        }
        Ok(())
    }

    fn warn(&mut self, span: Span, message: impl Into<String>) {
        let w = Warning::new(&span, message);
        warn!(line = w.line, column = w.column, "{}", w.message);
        self.warnings.push(w);
    }
}

impl Default for Evaluator {
    fn default() -> Self { Self::new() }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn loop_escape(span: Span) -> RuntimeError {
    RuntimeError::new(ErrorKind::Control, &span, "`break`/`continue` used outside of a loop")
}

/// Snapshot of an array's elements, so the loop body may freely mutate the
/// array it is iterating.
fn iterate(v: &Value, span: &Span, what: &str) -> Result<Vec<Value>, RuntimeError> {
    match v {
        Value::Array(items) => Ok(items.lock().clone()),
        other => Err(RuntimeError::type_error(
            span,
            format!("{what} needs an array to iterate over, got {}", other.type_name()),
        )),
    }
}

fn checked_index(index: &Value, len: usize, span: &Span) -> Result<usize, RuntimeError> {
    let Value::Int(i) = index else {
        return Err(RuntimeError::type_error(
            span,
            format!("array index must be an int, got {}", index.type_name()),
        ));
    };
    match usize::try_from(*i) {
        Ok(slot) if slot < len => Ok(slot),
        _ => Err(RuntimeError::new(
            ErrorKind::Index { index: *i, len },
            span,
            format!("index {i} out of range for array of length {len}"),
        )),
    }
}
