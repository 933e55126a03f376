use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use crate::runtime::value::format_float;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction. A zero-length vector normalizes to
    /// zero instead of producing NaNs.
    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len == 0.0 { Self::ZERO } else { Self::new(self.x / len, self.y / len) }
    }

    pub fn component(&self, name: &str) -> Option<f64> {
        match name {
            "x" => Some(self.x),
            "y" => Some(self.y),
            "length" => Some(self.length()),
            _ => None,
        }
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 { Vector2::new(self.x + rhs.x, self.y + rhs.y) }
}

impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 { Vector2::new(self.x - rhs.x, self.y - rhs.y) }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;
    fn mul(self, k: f64) -> Vector2 { Vector2::new(self.x * k, self.y * k) }
}

impl Neg for Vector2 {
    type Output = Vector2;
    fn neg(self) -> Vector2 { Vector2::new(-self.x, -self.y) }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", format_float(self.x), format_float(self.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_euclidean() {
        assert_eq!(Vector2::new(3.0, 4.0).length(), 5.0);
    }

    #[test]
    fn normalize_unit_length() {
        let n = Vector2::new(0.0, 10.0).normalized();
        assert_eq!(n, Vector2::new(0.0, 1.0));
    }

    #[test]
    fn normalize_zero_is_zero() {
        assert_eq!(Vector2::ZERO.normalized(), Vector2::ZERO);
    }

    #[test]
    fn arithmetic() {
        let a = Vector2::new(1.0, 2.0);
        let b = Vector2::new(3.0, 5.0);
        assert_eq!(a + b, Vector2::new(4.0, 7.0));
        assert_eq!(b - a, Vector2::new(2.0, 3.0));
        assert_eq!(a * 2.0, Vector2::new(2.0, 4.0));
        assert_eq!(-a, Vector2::new(-1.0, -2.0));
    }

    #[test]
    fn display_keeps_decimal_point() {
        assert_eq!(Vector2::new(1.0, 2.5).to_string(), "(1.0, 2.5)");
    }
}
