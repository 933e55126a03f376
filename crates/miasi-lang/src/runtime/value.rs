use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::color::Color;
use crate::types::shape::{Shape, SharedShape};
use crate::types::vector::Vector2;

/// Arrays are shared and mutable: `push` through any handle is visible
/// through all of them.
pub type SharedArray = Arc<Mutex<Vec<Value>>>;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Color(Color),
    Vec2(Vector2),
    Array(SharedArray),
    Shape(SharedShape),
    /// Name handle into the function table. Carries no environment.
    Function(String),
    /// Name handle into the builtin table.
    Builtin(String),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(Mutex::new(items)))
    }

    pub fn shape(shape: Shape) -> Self {
        Value::Shape(shape.into_shared())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Color(_) => "color",
            Value::Vec2(_) => "vector",
            Value::Array(_) => "array",
            Value::Shape(_) => "shape",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin",
        }
    }

    /// `nil`, `false`, `0` and `0.0` are false. Everything else, including
    /// empty strings and empty arrays, is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            _ => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Read a named field. Shapes expose their properties; vectors, colors,
    /// arrays and strings expose read-only fields.
    pub fn field(&self, name: &str) -> Option<Value> {
        match self {
            Value::Shape(s) => s.lock().get(name),
            Value::Vec2(v) => v.component(name).map(Value::Float),
            Value::Color(c) => c.channel(name).map(|ch| Value::Int(i64::from(ch))),
            Value::Array(items) if name == "length" => Some(Value::Int(items.lock().len() as i64)),
            Value::Str(s) if name == "length" => Some(Value::Int(s.chars().count() as i64)),
            _ => None,
        }
    }
}

/// Structural equality, used by tests and by `==` on same-typed values.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        structural_eq(self, other, Numbers::Strict, &mut Vec::new())
    }
}

// ─── Equality ─────────────────────────────────────────────────────────────────

impl Value {
    /// Language-level `==`: like structural equality, except ints and floats
    /// compare numerically at any depth.
    pub fn lang_eq(&self, other: &Value) -> bool {
        structural_eq(self, other, Numbers::Loose, &mut Vec::new())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Numbers {
    Strict,
    Loose,
}

/// Pairs of shared containers already under comparison. Meeting a pair again
/// means a cycle, which is assumed equal; any real difference still shows up
/// elsewhere in the walk.
type Seen = Vec<(usize, usize)>;

fn structural_eq(l: &Value, r: &Value, numbers: Numbers, seen: &mut Seen) -> bool {
    match (l, r) {
        (Value::Nil, Value::Nil) => true,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
            numbers == Numbers::Loose && (*a as f64) == *b
        }
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Color(a), Value::Color(b)) => a == b,
        (Value::Vec2(a), Value::Vec2(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            if Arc::ptr_eq(a, b) || !first_visit(seen, Arc::as_ptr(a) as usize, Arc::as_ptr(b) as usize) {
                return true;
            }
            // Snapshot so no lock is held while recursing.
            let (xs, ys) = (a.lock().clone(), b.lock().clone());
            xs.len() == ys.len() && xs.iter().zip(&ys).all(|(x, y)| structural_eq(x, y, numbers, seen))
        }
        (Value::Shape(a), Value::Shape(b)) => {
            if Arc::ptr_eq(a, b) || !first_visit(seen, Arc::as_ptr(a) as usize, Arc::as_ptr(b) as usize) {
                return true;
            }
            let (x, y) = (a.lock().clone(), b.lock().clone());
            x.geometry == y.geometry
                && x.color == y.color
                && x.is_visible == y.is_visible
                && x.extras.len() == y.extras.len()
                && x.extras.iter().zip(&y.extras).all(|((kx, vx), (ky, vy))| {
                    kx == ky && structural_eq(vx, vy, numbers, seen)
                })
        }
        (Value::Function(a), Value::Function(b)) => a == b,
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        _ => false,
    }
}

fn first_visit(seen: &mut Seen, a: usize, b: usize) -> bool {
    if seen.contains(&(a, b)) {
        return false;
    }
    seen.push((a, b));
    true
}

impl From<f64> for Value {
    fn from(x: f64) -> Self { Value::Float(x) }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self { Value::Int(n) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Str(s.to_string()) }
}

// ─── Display ──────────────────────────────────────────────────────────────────

/// Floats always keep a fractional part so they read differently from ints.
pub fn format_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Color(c) => write!(f, "{c}"),
            Value::Vec2(v) => write!(f, "{v}"),
            Value::Array(items) => {
                // An array that contains itself is already locked further up.
                let Some(items) = items.try_lock() else { return write!(f, "[...]") };
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    match item {
                        Value::Str(s) => write!(f, "{s:?}")?,
                        other => write!(f, "{other}")?,
                    }
                }
                write!(f, "]")
            }
            Value::Shape(s) => match s.try_lock() {
                Some(shape) => write!(f, "{shape}"),
                None => write!(f, "<shape>"),
            },
            Value::Function(name) => write!(f, "<function {name}>"),
            Value::Builtin(name) => write!(f, "<builtin {name}>"),
        }
    }
}
