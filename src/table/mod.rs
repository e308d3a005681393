use std::any::Any;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::function::Function;
use crate::point::Point;
use crate::tolerance;

pub mod array;
pub mod linked_list;

pub use array::ArrayTabulatedFunction;
pub use linked_list::LinkedListTabulatedFunction;

/// Storage strategy of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Array,
    LinkedList,
}

impl Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Array => write!(f, "array"),
            Backend::LinkedList => write!(f, "linked_list"),
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "array" => Ok(Backend::Array),
            "linked_list" | "linked-list" | "list" => Ok(Backend::LinkedList),
            _ => Err(Error::UnsupportedBackend(name.to_owned())),
        }
    }
}

/// The contract shared by both table backends.
///
/// Points are kept strictly ascending in `x` (within [`tolerance::EPSILON`]).
/// Positional accessors fail with [`Error::IndexOutOfRange`] outside
/// `0..point_count()`. Setters that move a point's `x` only check the immediate
/// neighbours.
pub trait TabulatedFunction: Function + Debug + Display {
    fn backend(&self) -> Backend;

    fn domain_left(&self) -> Result<f64>;

    fn domain_right(&self) -> Result<f64>;

    fn point_count(&self) -> usize;

    fn point(&self, index: usize) -> Result<Point>;

    fn set_point(&mut self, index: usize, point: Point) -> Result<()>;

    fn point_x(&self, index: usize) -> Result<f64> {
        self.point(index).map(|point| point.x())
    }

    fn set_point_x(&mut self, index: usize, x: f64) -> Result<()>;

    fn point_y(&self, index: usize) -> Result<f64> {
        self.point(index).map(|point| point.y())
    }

    fn set_point_y(&mut self, index: usize, y: f64) -> Result<()>;

    fn delete_point(&mut self, index: usize) -> Result<()>;

    fn add_point(&mut self, point: Point) -> Result<()>;

    /// A fresh iterator over copies of the points in index order.
    fn points(&self) -> Box<dyn Iterator<Item = Point> + '_>;

    fn clone_box(&self) -> Box<dyn TabulatedFunction>;

    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn TabulatedFunction> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for dyn TabulatedFunction {
    fn eq(&self, other: &Self) -> bool {
        if self.point_count() != other.point_count() {
            return false;
        }
        if let (Some(lhs), Some(rhs)) = (
            self.as_any().downcast_ref::<ArrayTabulatedFunction>(),
            other.as_any().downcast_ref::<ArrayTabulatedFunction>(),
        ) {
            return lhs == rhs;
        }
        if let (Some(lhs), Some(rhs)) = (
            self.as_any().downcast_ref::<LinkedListTabulatedFunction>(),
            other.as_any().downcast_ref::<LinkedListTabulatedFunction>(),
        ) {
            return lhs == rhs;
        }
        same_points(self, other)
    }
}

impl Hash for dyn TabulatedFunction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_points(self.point_count(), self.points(), state);
    }
}

/// Pointwise comparison through the positional accessors, valid for any pair
/// of backends.
pub fn same_points(lhs: &dyn TabulatedFunction, rhs: &dyn TabulatedFunction) -> bool {
    let count = lhs.point_count();
    count == rhs.point_count()
        && (0..count).all(|index| match (lhs.point(index), rhs.point(index)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        })
}

pub(crate) fn hash_points<H: Hasher>(
    count: usize,
    points: impl Iterator<Item = Point>,
    state: &mut H,
) {
    count.hash(state);
    for point in points {
        point.hash(state);
    }
}

pub(crate) fn fmt_points(
    points: impl Iterator<Item = Point>,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    write!(f, "{{")?;
    for (index, point) in points.enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{point}")?;
    }
    write!(f, "}}")
}

pub(crate) fn check_index(index: usize, count: usize) -> Result<()> {
    if index < count {
        Ok(())
    } else {
        Err(Error::IndexOutOfRange { index, count })
    }
}

/// Validates uniform-grid bounds and returns the grid step.
pub(crate) fn grid_step(left: f64, right: f64, count: usize) -> Result<f64> {
    if !left.is_finite() || !right.is_finite() {
        return Err(Error::invalid_argument(format!(
            "grid bounds must be finite, got [{left}, {right}]"
        )));
    }
    if !(left < right) {
        return Err(Error::invalid_argument(format!(
            "left bound {left} must be less than right bound {right}"
        )));
    }
    if count < 2 {
        return Err(Error::invalid_argument(format!(
            "a table needs at least 2 points, got {count}"
        )));
    }
    let step = (right - left) / (count - 1) as f64;
    if !tolerance::gt(step, 0.0) {
        return Err(Error::invalid_argument(format!(
            "{count} points over [{left}, {right}] would be closer than the comparison tolerance"
        )));
    }
    Ok(step)
}

pub(crate) fn check_ascending(points: &[Point]) -> Result<()> {
    if points.len() < 2 {
        return Err(Error::invalid_argument(format!(
            "a table needs at least 2 points, got {}",
            points.len()
        )));
    }
    if let Some(index) = points.iter().position(|point| point.x().is_nan()) {
        return Err(Error::invalid_argument(format!("x of point {index} is NaN")));
    }
    for (index, pair) in points.windows(2).enumerate() {
        if tolerance::le(pair[1].x(), pair[0].x()) {
            return Err(Error::invalid_argument(format!(
                "abscissas must be strictly ascending, but x = {} at index {} follows x = {}",
                pair[1].x(),
                index + 1,
                pair[0].x()
            )));
        }
    }
    Ok(())
}

/// Checks that `x` fits strictly between the optional neighbouring abscissas.
pub(crate) fn check_neighbours(
    index: usize,
    x: f64,
    previous: Option<f64>,
    next: Option<f64>,
) -> Result<()> {
    if x.is_nan() {
        return Err(Error::OrderingViolation { index, x });
    }
    let after_previous = previous.map_or(true, |previous| !tolerance::le(x, previous));
    let before_next = next.map_or(true, |next| !tolerance::ge(x, next));
    if after_previous && before_next {
        Ok(())
    } else {
        Err(Error::OrderingViolation { index, x })
    }
}

pub(crate) fn check_abscissa(x: f64) -> Result<()> {
    if x.is_nan() {
        Err(Error::invalid_argument("cannot add a point with a NaN abscissa"))
    } else {
        Ok(())
    }
}

/// Linear interpolation between `left` and `right`, returning the endpoint
/// ordinates unchanged on an exact hit.
/// `None` if `x` lies outside the segment.
pub(crate) fn interpolate(left: Point, right: Point, x: f64) -> Option<f64> {
    if tolerance::eq(x, left.x()) {
        Some(left.y())
    } else if tolerance::eq(x, right.x()) {
        Some(right.y())
    } else if tolerance::gt(x, left.x()) && tolerance::lt(x, right.x()) {
        Some(left.y() + (x - left.x()) * (right.y() - left.y()) / (right.x() - left.x()))
    } else {
        None
    }
}
