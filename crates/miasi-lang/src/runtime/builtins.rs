//! The standard builtin and property set, wired to a [`Surface`].

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;

use crate::error::{BuiltinError, ErrorKind};
use crate::runtime::interpreter::Evaluator;
use crate::runtime::symbols::{Arity, DefinitionError};
use crate::runtime::value::Value;
use crate::types::color::Color;
use crate::types::draw::Surface;

// ─── Console ──────────────────────────────────────────────────────────────────

/// Where `print` writes.
#[derive(Clone)]
pub enum Console {
    Stdout,
    /// Collects lines in memory; used by tests and embedders.
    Capture(Arc<Mutex<Vec<String>>>),
}

impl Console {
    pub fn capture() -> (Self, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        (Console::Capture(lines.clone()), lines)
    }

    fn write_line(&self, line: String) {
        match self {
            Console::Stdout => {
                // a closed stdout is not the script's problem
                let _ = writeln!(std::io::stdout().lock(), "{line}");
            }
            Console::Capture(lines) => lines.lock().push(line),
        }
    }
}

// ─── Install ──────────────────────────────────────────────────────────────────

/// Register every standard builtin, then the settable properties.
pub fn install(ev: &mut Evaluator, surface: Arc<dyn Surface>, console: Console) -> Result<(), DefinitionError> {
    // ── Output ────────────────────────────────────────────────────────────────
    ev.register_builtin("print", Arity::Any, move |args| {
        let line = args.iter().map(Value::to_string).collect::<Vec<_>>().join(" ");
        console.write_line(line);
        Ok(Value::Nil)
    })?;
    ev.register_builtin("str", Arity::Exact(1), |args| Ok(Value::Str(args[0].to_string())))?;

    // ── Arrays ────────────────────────────────────────────────────────────────
    ev.register_builtin("push", Arity::Exact(2), |args| match &args[0] {
        Value::Array(items) => {
            items.lock().push(args[1].clone());
            Ok(Value::Nil)
        }
        other => Err(expected("array", other)),
    })?;
    ev.register_builtin("len", Arity::Exact(1), |args| match &args[0] {
        Value::Array(items) => Ok(Value::Int(items.lock().len() as i64)),
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        other => Err(expected("array", other)),
    })?;
    ev.register_builtin("range", Arity::Exact(2), |args| {
        let start = as_int(&args[0])?;
        let end = as_int(&args[1])?;
        Ok(Value::array((start..end).map(Value::Int).collect()))
    })?;

    // ── Math ──────────────────────────────────────────────────────────────────
    ev.register_builtin("sqrt", Arity::Exact(1), |args| {
        let x = as_number(&args[0])?;
        if x < 0.0 {
            return Err(BuiltinError::new(ErrorKind::Arithmetic, format!("math domain error: sqrt of {x}")));
        }
        Ok(Value::Float(x.sqrt()))
    })?;
    ev.register_builtin("sin", Arity::Exact(1), |args| Ok(Value::Float(as_number(&args[0])?.sin())))?;
    ev.register_builtin("cos", Arity::Exact(1), |args| Ok(Value::Float(as_number(&args[0])?.cos())))?;
    ev.register_builtin("abs", Arity::Exact(1), |args| match &args[0] {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| BuiltinError::new(ErrorKind::Arithmetic, "integer overflow")),
        other => Ok(Value::Float(as_number(other)?.abs())),
    })?;
    ev.register_builtin("floor", Arity::Exact(1), |args| to_int(as_number(&args[0])?.floor()))?;
    ev.register_builtin("round", Arity::Exact(1), |args| to_int(as_number(&args[0])?.round()))?;
    ev.register_builtin("min", Arity::AtLeast(1), |args| pick(args, |candidate, best| candidate < best))?;
    ev.register_builtin("max", Arity::AtLeast(1), |args| pick(args, |candidate, best| candidate > best))?;

    // ── Vectors & colors ──────────────────────────────────────────────────────
    ev.register_builtin("normalize", Arity::Exact(1), |args| match &args[0] {
        Value::Vec2(v) => Ok(Value::Vec2(v.normalized())),
        other => Err(expected("vector", other)),
    })?;
    ev.register_builtin("length", Arity::Exact(1), |args| match &args[0] {
        Value::Vec2(v) => Ok(Value::Float(v.length())),
        other => Err(expected("vector", other)),
    })?;
    ev.register_builtin("random_color", Arity::Exact(0), |_| {
        let mut rng = rand::thread_rng();
        Ok(Value::Color(Color::rgb(rng.r#gen(), rng.r#gen(), rng.r#gen())))
    })?;

    // ── Surface ───────────────────────────────────────────────────────────────
    let s = surface.clone();
    ev.register_builtin("get_mouse_pos", Arity::Exact(0), move |_| Ok(Value::Vec2(s.mouse_position())))?;
    let s = surface.clone();
    ev.register_builtin("get_window_width", Arity::Exact(0), move |_| Ok(Value::Int(s.window_width().round() as i64)))?;
    let s = surface.clone();
    ev.register_builtin("get_window_height", Arity::Exact(0), move |_| Ok(Value::Int(s.window_height().round() as i64)))?;
    let s = surface.clone();
    ev.register_builtin("draw", Arity::Exact(2), move |args| match (&args[0], &args[1]) {
        (Value::Vec2(at), Value::Shape(shape)) => {
            s.draw_shape(*at, Arc::clone(shape));
            Ok(Value::Nil)
        }
        (Value::Vec2(_), other) => Err(expected("shape", other)),
        (other, _) => Err(expected("point", other)),
    })?;
    let s = surface.clone();
    ev.register_builtin("clear", Arity::Exact(0), move |_| {
        s.clear();
        Ok(Value::Nil)
    })?;

    // ── Properties ────────────────────────────────────────────────────────────
    let s = surface.clone();
    ev.register_property("width", move |v| {
        s.set_window_width(window_extent("width", &v)?);
        Ok(())
    })?;
    let s = surface.clone();
    ev.register_property("height", move |v| {
        s.set_window_height(window_extent("height", &v)?);
        Ok(())
    })?;
    ev.register_property("bg_color", move |v| match v {
        Value::Color(c) => {
            surface.set_background(c);
            Ok(())
        }
        other => Err(expected("color", &other)),
    })?;

    Ok(())
}

// ─── Argument helpers ─────────────────────────────────────────────────────────

fn expected(what: &str, got: &Value) -> BuiltinError {
    BuiltinError::type_error(format!("expected {what}, got {}", got.type_name()))
}

fn as_number(v: &Value) -> Result<f64, BuiltinError> {
    v.as_number().ok_or_else(|| expected("number", v))
}

fn as_int(v: &Value) -> Result<i64, BuiltinError> {
    match v {
        Value::Int(n) => Ok(*n),
        other => Err(expected("int", other)),
    }
}

fn to_int(x: f64) -> Result<Value, BuiltinError> {
    if x.is_finite() && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Ok(Value::Int(x as i64))
    } else {
        Err(BuiltinError::new(ErrorKind::Arithmetic, format!("cannot convert {x} to an int")))
    }
}

/// Keep the original value (int or float) of the winning argument.
fn pick(args: &[Value], better: impl Fn(f64, f64) -> bool) -> Result<Value, BuiltinError> {
    let mut best = &args[0];
    let mut best_n = as_number(best)?;
    for candidate in &args[1..] {
        let n = as_number(candidate)?;
        if better(n, best_n) {
            best = candidate;
            best_n = n;
        }
    }
    Ok(best.clone())
}

fn window_extent(name: &str, v: &Value) -> Result<u32, BuiltinError> {
    let x = as_number(v)?;
    if !(x >= 1.0 && x <= f64::from(u32::MAX)) {
        return Err(BuiltinError::type_error(format!("`{name}` must be a positive number, got {v}")));
    }
    Ok(x as u32)
}
