use std::fmt::Display;
use std::hash::{Hash, Hasher};

use crate::tolerance;

/// A sample `(x, y)` of a tabulated function.
///
/// Points are `Copy`, so a table never hands out a reference into its own storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn with_x(self, x: f64) -> Self {
        Self { x, ..self }
    }

    pub fn with_y(self, y: f64) -> Self {
        Self { y, ..self }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        tolerance::eq(self.x, other.x) && tolerance::eq(self.y, other.y)
    }
}

/// Hashes the exact bit patterns, with `-0.0` folded onto `0.0`.
/// Points that are equal only within tolerance may hash differently.
impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        canonical_bits(self.x).hash(state);
        canonical_bits(self.y).hash(state);
    }
}

fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}; {})", self.x, self.y)
    }
}
