//! Operator semantics on runtime values.
//!
//! Errors carry no position here; the evaluator attaches the span of the
//! offending operand.

use std::cmp::Ordering;

use crate::error::{BuiltinError, ErrorKind};
use crate::runtime::value::Value;
use crate::syntax::ast::{ArithOp, CompareOp, UnaryOp};

// ─── Arithmetic ───────────────────────────────────────────────────────────────

pub fn arith(op: ArithOp, l: Value, r: Value) -> Result<Value, BuiltinError> {
    use Value::*;

    match (op, &l, &r) {
        // `/` always produces a float, so it is handled before int arithmetic.
        (ArithOp::Div, _, _) => divide(&l, &r),

        (_, Int(a), Int(b)) => int_arith(op, *a, *b),
        (_, Int(_) | Float(_), Int(_) | Float(_)) => {
            let (a, b) = (number(&l), number(&r));
            float_arith(op, a, b)
        }

        (ArithOp::Add, Str(a), Str(b)) => Ok(Str(format!("{a}{b}"))),
        (ArithOp::Add, Array(a), Array(b)) => {
            let mut items = a.lock().clone();
            items.extend(b.lock().iter().cloned());
            Ok(Value::array(items))
        }

        (ArithOp::Add, Vec2(a), Vec2(b)) => Ok(Vec2(*a + *b)),
        (ArithOp::Sub, Vec2(a), Vec2(b)) => Ok(Vec2(*a - *b)),
        (ArithOp::Mul, Vec2(v), Int(_) | Float(_)) => Ok(Vec2(*v * number(&r))),
        (ArithOp::Mul, Int(_) | Float(_), Vec2(v)) => Ok(Vec2(*v * number(&l))),

        _ => Err(unsupported(op.symbol(), &l, &r)),
    }
}

fn int_arith(op: ArithOp, a: i64, b: i64) -> Result<Value, BuiltinError> {
    let result = match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Sub => a.checked_sub(b),
        ArithOp::Mul => a.checked_mul(b),
        ArithOp::Mod => {
            if b == 0 {
                return Err(BuiltinError::new(ErrorKind::Arithmetic, "modulo by zero"));
            }
            // result takes the sign of the divisor
            a.checked_rem(b).map(|r| if r != 0 && (r < 0) != (b < 0) { r + b } else { r })
        }
        ArithOp::Div => return divide(&Value::Int(a), &Value::Int(b)),
    };
    result.map(Value::Int).ok_or_else(|| {
        BuiltinError::new(ErrorKind::Arithmetic, format!("integer overflow in `{a} {} {b}`", op.symbol()))
    })
}

fn float_arith(op: ArithOp, a: f64, b: f64) -> Result<Value, BuiltinError> {
    let x = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => return divide(&Value::Float(a), &Value::Float(b)),
        ArithOp::Mod => {
            if b == 0.0 {
                return Err(BuiltinError::new(ErrorKind::Arithmetic, "modulo by zero"));
            }
            let r = a % b;
            if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }
        }
    };
    Ok(Value::Float(x))
}

fn divide(l: &Value, r: &Value) -> Result<Value, BuiltinError> {
    let divisor = match r {
        Value::Int(_) | Value::Float(_) => number(r),
        _ => return Err(unsupported("/", l, r)),
    };
    match l {
        Value::Int(_) | Value::Float(_) | Value::Vec2(_) if divisor == 0.0 => {
            Err(BuiltinError::new(ErrorKind::Arithmetic, "division by zero"))
        }
        Value::Int(_) | Value::Float(_) => Ok(Value::Float(number(l) / divisor)),
        Value::Vec2(v) => Ok(Value::Vec2(*v * (1.0 / divisor))),
        _ => Err(unsupported("/", l, r)),
    }
}

fn number(v: &Value) -> f64 {
    v.as_number().unwrap_or(f64::NAN)
}

fn unsupported(symbol: &str, l: &Value, r: &Value) -> BuiltinError {
    BuiltinError::type_error(format!(
        "unsupported operand types for `{symbol}`: {} and {}",
        l.type_name(),
        r.type_name()
    ))
}

// ─── Comparison ───────────────────────────────────────────────────────────────

/// Language-level `==`: ints and floats compare numerically (inside arrays
/// and shapes too), other types compare structurally, and unrelated types
/// are simply unequal.
pub fn values_equal(l: &Value, r: &Value) -> bool {
    l.lang_eq(r)
}

pub fn compare(op: CompareOp, l: &Value, r: &Value) -> Result<bool, BuiltinError> {
    match op {
        CompareOp::Eq => return Ok(values_equal(l, r)),
        CompareOp::NotEq => return Ok(!values_equal(l, r)),
        _ => {}
    }

    let ordering = match (l, r) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => number(l).partial_cmp(&number(r)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => {
            return Err(BuiltinError::type_error(format!(
                "`{}` is not supported between {} and {}",
                op.symbol(),
                l.type_name(),
                r.type_name()
            )));
        }
    };

    // NaN never orders
    let Some(ordering) = ordering else { return Ok(false) };
    Ok(match op {
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::LtEq => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::GtEq => ordering != Ordering::Less,
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::NotEq => ordering != Ordering::Equal,
    })
}

// ─── Unary ────────────────────────────────────────────────────────────────────

pub fn unary(op: UnaryOp, v: Value) -> Result<Value, BuiltinError> {
    match (op, v) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| BuiltinError::new(ErrorKind::Arithmetic, format!("integer overflow negating {n}"))),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Neg, Value::Vec2(v)) => Ok(Value::Vec2(-v)),
        (UnaryOp::Neg, other) => Err(BuiltinError::type_error(format!(
            "cannot negate {}",
            other.type_name()
        ))),
    }
}
