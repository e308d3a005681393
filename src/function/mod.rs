use crate::error::{Error, Result};

pub mod combinators;

pub use combinators::{Composition, Mult, Power, Scale, Shift, Sum};

/// A real function defined on `[left_border, right_border]`.
pub trait Function {
    fn left_border(&self) -> f64;

    fn right_border(&self) -> f64;

    /// The function value at `x`, NaN where it is undefined.
    fn value_at(&self, x: f64) -> f64;
}

impl<F: Function + ?Sized> Function for &F {
    fn left_border(&self) -> f64 {
        (**self).left_border()
    }

    fn right_border(&self) -> f64 {
        (**self).right_border()
    }

    fn value_at(&self, x: f64) -> f64 {
        (**self).value_at(x)
    }
}

impl<F: Function + ?Sized> Function for Box<F> {
    fn left_border(&self) -> f64 {
        (**self).left_border()
    }

    fn right_border(&self) -> f64 {
        (**self).right_border()
    }

    fn value_at(&self, x: f64) -> f64 {
        (**self).value_at(x)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sin;

impl Function for Sin {
    fn left_border(&self) -> f64 {
        f64::NEG_INFINITY
    }

    fn right_border(&self) -> f64 {
        f64::INFINITY
    }

    fn value_at(&self, x: f64) -> f64 {
        x.sin()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Cos;

impl Function for Cos {
    fn left_border(&self) -> f64 {
        f64::NEG_INFINITY
    }

    fn right_border(&self) -> f64 {
        f64::INFINITY
    }

    fn value_at(&self, x: f64) -> f64 {
        x.cos()
    }
}

/// Logarithm to an arbitrary base.
#[derive(Debug, Clone, Copy)]
pub struct Log {
    base: f64,
}

impl Log {
    pub fn new(base: f64) -> Result<Self> {
        if !(base > 0.0) || base == 1.0 {
            return Err(Error::invalid_argument(format!(
                "logarithm base must be positive and not 1, got {base}"
            )));
        }
        Ok(Self { base })
    }

    pub fn natural() -> Self {
        Self {
            base: std::f64::consts::E,
        }
    }

    pub fn base(&self) -> f64 {
        self.base
    }
}

impl Function for Log {
    fn left_border(&self) -> f64 {
        0.0
    }

    fn right_border(&self) -> f64 {
        f64::INFINITY
    }

    fn value_at(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return f64::NAN;
        }
        x.ln() / self.base.ln()
    }
}

/// Integrate `function` over `[left, right]` with the trapezoid rule.
///
/// The last step is shortened so that it ends exactly at `right`.
pub fn integrate<F: Function + ?Sized>(
    function: &F,
    left: f64,
    right: f64,
    step: f64,
) -> Result<f64> {
    if left < function.left_border() || right > function.right_border() {
        return Err(Error::invalid_argument(format!(
            "integration interval [{left}, {right}] leaves the function domain [{}, {}]",
            function.left_border(),
            function.right_border()
        )));
    }
    if !left.is_finite() || !right.is_finite() {
        return Err(Error::invalid_argument(format!(
            "integration bounds must be finite, got [{left}, {right}]"
        )));
    }
    if !(left < right) {
        return Err(Error::invalid_argument(format!(
            "left bound {left} must be less than right bound {right}"
        )));
    }
    if !(step > 0.0) {
        return Err(Error::invalid_argument(format!(
            "integration step must be positive, got {step}"
        )));
    }

    let mut integral = 0.0;
    let mut x = left;
    let mut y = function.value_at(x);
    while x < right {
        let next_x = (x + step).min(right);
        if next_x <= x {
            return Err(Error::invalid_argument(format!(
                "integration step {step} is lost to rounding at x = {x}"
            )));
        }
        let next_y = function.value_at(next_x);
        integral += (y + next_y) * (next_x - x) / 2.0;
        x = next_x;
        y = next_y;
    }
    Ok(integral)
}
