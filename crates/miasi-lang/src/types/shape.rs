use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{BuiltinError, ErrorKind};
use crate::runtime::value::{Value, format_float};
use crate::syntax::ast::ShapeKind;
use crate::types::color::Color;
use crate::types::vector::Vector2;

/// Shapes are shared: every handle (variables, array slots, the retained
/// scene) sees the same object.
pub type SharedShape = Arc<Mutex<Shape>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Rectangle { width: f64, height: f64 },
    Circle { radius: f64 },
    /// The first vertex is the draw position; `p2`/`p3` are absolute.
    Triangle { p2: Vector2, p3: Vector2 },
    /// Runs from the draw position to `(x2, y2)`.
    Line { x2: f64, y2: f64, thickness: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub geometry: Geometry,
    pub color: Color,
    pub is_visible: bool,
    /// Named arguments the shape kind does not know about.
    pub extras: BTreeMap<String, Value>,
}

/// A freshly built shape plus the names of arguments that ended up in
/// `extras`, so the caller can warn about them.
#[derive(Debug)]
pub struct Constructed {
    pub shape: Shape,
    pub unknown: Vec<String>,
}

impl Shape {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry, color: Color::BLACK, is_visible: true, extras: BTreeMap::new() }
    }

    pub fn into_shared(self) -> SharedShape {
        Arc::new(Mutex::new(self))
    }

    pub fn kind(&self) -> ShapeKind {
        match self.geometry {
            Geometry::Rectangle { .. } => ShapeKind::Rectangle,
            Geometry::Circle { .. } => ShapeKind::Circle,
            Geometry::Triangle { .. } => ShapeKind::Triangle,
            Geometry::Line { .. } => ShapeKind::Line,
        }
    }

    /// Build a shape from already-evaluated named arguments. Later keys
    /// overwrite earlier ones; the caller is expected to have warned about
    /// duplicates.
    pub fn construct(kind: ShapeKind, args: Vec<(String, Value)>) -> Result<Constructed, BuiltinError> {
        let mut args: BTreeMap<String, Value> = args.into_iter().collect();

        let geometry = match kind {
            ShapeKind::Rectangle => Geometry::Rectangle {
                width: required_number(&mut args, kind, "width")?,
                height: required_number(&mut args, kind, "height")?,
            },
            ShapeKind::Circle => Geometry::Circle {
                radius: optional_number(&mut args, kind, "radius", 10.0)?,
            },
            ShapeKind::Triangle => Geometry::Triangle {
                p2: optional_point(&mut args, kind, "p2", Vector2::new(10.0, 0.0))?,
                p3: optional_point(&mut args, kind, "p3", Vector2::new(5.0, 10.0))?,
            },
            ShapeKind::Line => Geometry::Line {
                x2: optional_number(&mut args, kind, "x2", 10.0)?,
                y2: optional_number(&mut args, kind, "y2", 10.0)?,
                thickness: optional_number(&mut args, kind, "thickness", 1.0)?,
            },
        };

        let mut shape = Shape::new(geometry);
        if let Some(v) = args.remove("color") {
            match v {
                Value::Color(c) => shape.color = c,
                other => return Err(construction(kind, "color", "color", &other)),
            }
        }
        if let Some(v) = args.remove("is_visible") {
            match v {
                Value::Bool(b) => shape.is_visible = b,
                other => return Err(construction(kind, "is_visible", "bool", &other)),
            }
        }

        let unknown = args.keys().cloned().collect();
        shape.extras = args;
        Ok(Constructed { shape, unknown })
    }

    /// Property read: known fields for this kind first, then extras.
    pub fn get(&self, name: &str) -> Option<Value> {
        let known = match (&self.geometry, name) {
            (Geometry::Rectangle { width, .. }, "width") => Some(Value::Float(*width)),
            (Geometry::Rectangle { height, .. }, "height") => Some(Value::Float(*height)),
            (Geometry::Circle { radius }, "radius") => Some(Value::Float(*radius)),
            (Geometry::Triangle { p2, .. }, "p2") => Some(Value::Vec2(*p2)),
            (Geometry::Triangle { p3, .. }, "p3") => Some(Value::Vec2(*p3)),
            (Geometry::Line { x2, .. }, "x2") => Some(Value::Float(*x2)),
            (Geometry::Line { y2, .. }, "y2") => Some(Value::Float(*y2)),
            (Geometry::Line { thickness, .. }, "thickness") => Some(Value::Float(*thickness)),
            (_, "color") => Some(Value::Color(self.color)),
            (_, "is_visible") => Some(Value::Bool(self.is_visible)),
            (_, "kind") => Some(Value::Str(self.kind().name().to_string())),
            _ => None,
        };
        known.or_else(|| self.extras.get(name).cloned())
    }

    /// Property write. Known fields are type-checked; any other name lands
    /// in extras.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), BuiltinError> {
        let kind = self.kind();
        match (&mut self.geometry, name) {
            (Geometry::Rectangle { width, .. }, "width") => *width = number(kind, name, &value)?,
            (Geometry::Rectangle { height, .. }, "height") => *height = number(kind, name, &value)?,
            (Geometry::Circle { radius }, "radius") => *radius = number(kind, name, &value)?,
            (Geometry::Triangle { p2, .. }, "p2") => *p2 = point(kind, name, &value)?,
            (Geometry::Triangle { p3, .. }, "p3") => *p3 = point(kind, name, &value)?,
            (Geometry::Line { x2, .. }, "x2") => *x2 = number(kind, name, &value)?,
            (Geometry::Line { y2, .. }, "y2") => *y2 = number(kind, name, &value)?,
            (Geometry::Line { thickness, .. }, "thickness") => *thickness = number(kind, name, &value)?,
            (_, "color") => match value {
                Value::Color(c) => self.color = c,
                other => return Err(mismatch(kind, name, "color", &other)),
            },
            (_, "is_visible") => match value {
                Value::Bool(b) => self.is_visible = b,
                other => return Err(mismatch(kind, name, "bool", &other)),
            },
            (_, "kind") => {
                return Err(BuiltinError::type_error(format!(
                    "`{}.kind` is read-only", kind.name()
                )));
            }
            _ => {
                self.extras.insert(name.to_string(), value);
            }
        }
        Ok(())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind().name())?;
        match &self.geometry {
            Geometry::Rectangle { width, height } => {
                write!(f, "width: {}, height: {}", format_float(*width), format_float(*height))?
            }
            Geometry::Circle { radius } => write!(f, "radius: {}", format_float(*radius))?,
            Geometry::Triangle { p2, p3 } => write!(f, "p2: {p2}, p3: {p3}")?,
            Geometry::Line { x2, y2, thickness } => write!(
                f,
                "x2: {}, y2: {}, thickness: {}",
                format_float(*x2), format_float(*y2), format_float(*thickness)
            )?,
        }
        write!(f, ", color: {})", self.color)
    }
}

// ─── Argument helpers ────────────────────────────────────────────────────────

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Int(n) => Some(*n as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

fn required_number(args: &mut BTreeMap<String, Value>, kind: ShapeKind, name: &str) -> Result<f64, BuiltinError> {
    match args.remove(name) {
        Some(v) => as_number(&v).ok_or_else(|| construction(kind, name, "number", &v)),
        None => Err(BuiltinError::new(
            ErrorKind::Construction,
            format!("`{}` requires a `{name}` argument", kind.name()),
        )),
    }
}

fn optional_number(
    args: &mut BTreeMap<String, Value>,
    kind: ShapeKind,
    name: &str,
    default: f64,
) -> Result<f64, BuiltinError> {
    match args.remove(name) {
        Some(v) => as_number(&v).ok_or_else(|| construction(kind, name, "number", &v)),
        None => Ok(default),
    }
}

fn optional_point(
    args: &mut BTreeMap<String, Value>,
    kind: ShapeKind,
    name: &str,
    default: Vector2,
) -> Result<Vector2, BuiltinError> {
    match args.remove(name) {
        Some(Value::Vec2(p)) => Ok(p),
        Some(v) => Err(construction(kind, name, "point", &v)),
        None => Ok(default),
    }
}

fn number(kind: ShapeKind, name: &str, v: &Value) -> Result<f64, BuiltinError> {
    as_number(v).ok_or_else(|| mismatch(kind, name, "number", v))
}

fn point(kind: ShapeKind, name: &str, v: &Value) -> Result<Vector2, BuiltinError> {
    match v {
        Value::Vec2(p) => Ok(*p),
        _ => Err(mismatch(kind, name, "point", v)),
    }
}

fn construction(kind: ShapeKind, name: &str, expected: &str, got: &Value) -> BuiltinError {
    BuiltinError::new(
        ErrorKind::Construction,
        format!("`{}` argument `{name}` must be a {expected}, got {}", kind.name(), got.type_name()),
    )
}

fn mismatch(kind: ShapeKind, name: &str, expected: &str, got: &Value) -> BuiltinError {
    BuiltinError::type_error(format!(
        "`{}.{name}` must be a {expected}, got {}", kind.name(), got.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn circle_defaults() {
        let c = Shape::construct(ShapeKind::Circle, vec![]).unwrap();
        assert_eq!(c.shape.geometry, Geometry::Circle { radius: 10.0 });
        assert_eq!(c.shape.color, Color::BLACK);
        assert!(c.shape.is_visible);
        assert!(c.unknown.is_empty());
    }

    #[test]
    fn triangle_and_line_defaults() {
        let t = Shape::construct(ShapeKind::Triangle, vec![]).unwrap().shape;
        assert_eq!(t.geometry, Geometry::Triangle { p2: Vector2::new(10.0, 0.0), p3: Vector2::new(5.0, 10.0) });
        let l = Shape::construct(ShapeKind::Line, vec![]).unwrap().shape;
        assert_eq!(l.geometry, Geometry::Line { x2: 10.0, y2: 10.0, thickness: 1.0 });
    }

    #[test]
    fn rectangle_requires_dimensions() {
        let err = Shape::construct(ShapeKind::Rectangle, args(&[("width", Value::Int(4))])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Construction);
        assert!(err.message.contains("height"));
    }

    #[test]
    fn wrong_argument_type_is_construction_error() {
        let err = Shape::construct(ShapeKind::Circle, args(&[("radius", Value::Str("big".into()))])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Construction);
    }

    #[test]
    fn unknown_arguments_become_extras() {
        let c = Shape::construct(ShapeKind::Circle, args(&[("speed", Value::Int(3))])).unwrap();
        assert_eq!(c.unknown, vec!["speed".to_string()]);
        assert_eq!(c.shape.get("speed"), Some(Value::Int(3)));
    }

    #[test]
    fn known_field_wins_over_extra() {
        let mut s = Shape::construct(ShapeKind::Circle, vec![]).unwrap().shape;
        s.set("radius", Value::Int(4)).unwrap();
        assert_eq!(s.get("radius"), Some(Value::Float(4.0)));
        assert!(s.extras.is_empty());
    }

    #[test]
    fn set_unknown_name_adds_extra() {
        let mut s = Shape::new(Geometry::Circle { radius: 1.0 });
        s.set("vx", Value::Float(2.5)).unwrap();
        assert_eq!(s.get("vx"), Some(Value::Float(2.5)));
    }

    #[test]
    fn set_known_field_wrong_type() {
        let mut s = Shape::new(Geometry::Circle { radius: 1.0 });
        let err = s.set("color", Value::Int(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn fields_of_other_kinds_are_not_known() {
        // `radius` on a rectangle is just an extra
        let mut s = Shape::new(Geometry::Rectangle { width: 1.0, height: 2.0 });
        assert_eq!(s.get("radius"), None);
        s.set("radius", Value::Int(3)).unwrap();
        assert_eq!(s.extras.get("radius"), Some(&Value::Int(3)));
    }

    #[test]
    fn display() {
        let s = Shape::new(Geometry::Circle { radius: 5.0 });
        assert_eq!(s.to_string(), "circle(radius: 5.0, color: rgb(0, 0, 0))");
    }
}
