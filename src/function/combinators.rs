use super::Function;
use crate::error::{Error, Result};

/// `f(x - shift_x) + shift_y`, with the domain moved right by `shift_x`.
#[derive(Debug, Clone, Copy)]
pub struct Shift<F> {
    function: F,
    shift_x: f64,
    shift_y: f64,
}

impl<F: Function> Shift<F> {
    pub fn new(function: F, shift_x: f64, shift_y: f64) -> Self {
        Self {
            function,
            shift_x,
            shift_y,
        }
    }
}

impl<F: Function> Function for Shift<F> {
    fn left_border(&self) -> f64 {
        self.function.left_border() + self.shift_x
    }

    fn right_border(&self) -> f64 {
        self.function.right_border() + self.shift_x
    }

    fn value_at(&self, x: f64) -> f64 {
        self.function.value_at(x - self.shift_x) + self.shift_y
    }
}

/// `f(x / scale_x) * scale_y`, with the domain stretched by `scale_x`.
///
/// A negative `scale_x` mirrors the domain.
#[derive(Debug, Clone, Copy)]
pub struct Scale<F> {
    function: F,
    scale_x: f64,
    scale_y: f64,
}

impl<F: Function> Scale<F> {
    pub fn new(function: F, scale_x: f64, scale_y: f64) -> Result<Self> {
        if scale_x == 0.0 || !scale_x.is_finite() {
            return Err(Error::invalid_argument(format!(
                "x scale factor must be finite and non-zero, got {scale_x}"
            )));
        }
        Ok(Self {
            function,
            scale_x,
            scale_y,
        })
    }

    fn borders(&self) -> (f64, f64) {
        let left = self.function.left_border() * self.scale_x;
        let right = self.function.right_border() * self.scale_x;
        if self.scale_x > 0.0 {
            (left, right)
        } else {
            (right, left)
        }
    }
}

impl<F: Function> Function for Scale<F> {
    fn left_border(&self) -> f64 {
        self.borders().0
    }

    fn right_border(&self) -> f64 {
        self.borders().1
    }

    fn value_at(&self, x: f64) -> f64 {
        self.function.value_at(x / self.scale_x) * self.scale_y
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Power<F> {
    function: F,
    exponent: f64,
}

impl<F: Function> Power<F> {
    pub fn new(function: F, exponent: f64) -> Self {
        Self { function, exponent }
    }
}

impl<F: Function> Function for Power<F> {
    fn left_border(&self) -> f64 {
        self.function.left_border()
    }

    fn right_border(&self) -> f64 {
        self.function.right_border()
    }

    fn value_at(&self, x: f64) -> f64 {
        self.function.value_at(x).powf(self.exponent)
    }
}

/// Pointwise sum, defined where both operands are.
#[derive(Debug, Clone, Copy)]
pub struct Sum<F, G> {
    lhs: F,
    rhs: G,
}

impl<F: Function, G: Function> Sum<F, G> {
    pub fn new(lhs: F, rhs: G) -> Self {
        Self { lhs, rhs }
    }
}

impl<F: Function, G: Function> Function for Sum<F, G> {
    fn left_border(&self) -> f64 {
        self.lhs.left_border().max(self.rhs.left_border())
    }

    fn right_border(&self) -> f64 {
        self.lhs.right_border().min(self.rhs.right_border())
    }

    fn value_at(&self, x: f64) -> f64 {
        self.lhs.value_at(x) + self.rhs.value_at(x)
    }
}

/// Pointwise product, defined where both operands are.
#[derive(Debug, Clone, Copy)]
pub struct Mult<F, G> {
    lhs: F,
    rhs: G,
}

impl<F: Function, G: Function> Mult<F, G> {
    pub fn new(lhs: F, rhs: G) -> Self {
        Self { lhs, rhs }
    }
}

impl<F: Function, G: Function> Function for Mult<F, G> {
    fn left_border(&self) -> f64 {
        self.lhs.left_border().max(self.rhs.left_border())
    }

    fn right_border(&self) -> f64 {
        self.lhs.right_border().min(self.rhs.right_border())
    }

    fn value_at(&self, x: f64) -> f64 {
        self.lhs.value_at(x) * self.rhs.value_at(x)
    }
}

/// `outer(inner(x))` over the domain of `inner`.
#[derive(Debug, Clone, Copy)]
pub struct Composition<F, G> {
    outer: F,
    inner: G,
}

impl<F: Function, G: Function> Composition<F, G> {
    pub fn new(outer: F, inner: G) -> Self {
        Self { outer, inner }
    }
}

impl<F: Function, G: Function> Function for Composition<F, G> {
    fn left_border(&self) -> f64 {
        self.inner.left_border()
    }

    fn right_border(&self) -> f64 {
        self.inner.right_border()
    }

    fn value_at(&self, x: f64) -> f64 {
        self.outer.value_at(self.inner.value_at(x))
    }
}
