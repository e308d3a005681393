/// Absolute tolerance below which two coordinates are considered equal.
pub const EPSILON: f64 = 1e-9;

pub fn eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

pub fn lt(a: f64, b: f64) -> bool {
    a < b - EPSILON
}

pub fn gt(a: f64, b: f64) -> bool {
    a > b + EPSILON
}

/// `a <= b` where values within [`EPSILON`] count as equal.
pub fn le(a: f64, b: f64) -> bool {
    a < b + EPSILON
}

/// `a >= b` where values within [`EPSILON`] count as equal.
pub fn ge(a: f64, b: f64) -> bool {
    a > b - EPSILON
}
