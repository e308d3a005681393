use std::any::Any;
use std::fmt::Display;
use std::hash::{Hash, Hasher};

use log::trace;

use super::{
    check_abscissa, check_ascending, check_index, check_neighbours, fmt_points, grid_step,
    hash_points, interpolate, same_points, Backend, LinkedListTabulatedFunction, TabulatedFunction,
};
use crate::error::{Error, Result};
use crate::function::Function;
use crate::point::Point;
use crate::tolerance;

/// Slack kept beyond the live points so the first insertions do not reallocate.
const SLACK: usize = 2;

/// Deletion is refused once the table is down to this many points.
const DELETION_FLOOR: usize = 3;

/// A tabulated function backed by a contiguous buffer.
///
/// Insertions and deletions shift the tail, positional access is O(1).
#[derive(Debug)]
pub struct ArrayTabulatedFunction {
    points: Vec<Point>,
}

impl ArrayTabulatedFunction {
    /// `count` points evenly spaced over `[left, right]`, all with `y = 0`.
    pub fn from_grid(left: f64, right: f64, count: usize) -> Result<Self> {
        let step = grid_step(left, right, count)?;
        let mut points = Vec::with_capacity(count + SLACK);
        points.extend((0..count).map(|i| Point::new(left + i as f64 * step, 0.0)));
        Ok(Self { points })
    }

    /// One point per value, with abscissas evenly spaced over `[left, right]`.
    pub fn from_values(left: f64, right: f64, values: &[f64]) -> Result<Self> {
        let step = grid_step(left, right, values.len())?;
        let mut points = Vec::with_capacity(values.len() + SLACK);
        points.extend(
            values
                .iter()
                .enumerate()
                .map(|(i, &y)| Point::new(left + i as f64 * step, y)),
        );
        Ok(Self { points })
    }

    pub fn from_points(points: &[Point]) -> Result<Self> {
        check_ascending(points)?;
        let mut buffer = Vec::with_capacity(points.len() + SLACK);
        buffer.extend_from_slice(points);
        Ok(Self { points: buffer })
    }

    /// Number of points the buffer holds before it has to grow.
    pub fn capacity(&self) -> usize {
        self.points.capacity()
    }

    pub fn iter(&self) -> Points<'_> {
        Points {
            inner: self.points.iter(),
        }
    }

    /// Grows the buffer to at least `2 * capacity + 2`.
    fn grow(&mut self) {
        let additional = self.points.capacity() + SLACK;
        self.points.reserve_exact(additional);
        trace!("Grew array table buffer to {}", self.points.capacity());
    }
}

impl Clone for ArrayTabulatedFunction {
    fn clone(&self) -> Self {
        let mut points = Vec::with_capacity(self.points.capacity());
        points.extend_from_slice(&self.points);
        Self { points }
    }
}

impl Function for ArrayTabulatedFunction {
    fn left_border(&self) -> f64 {
        self.domain_left().unwrap_or(f64::NAN)
    }

    fn right_border(&self) -> f64 {
        self.domain_right().unwrap_or(f64::NAN)
    }

    fn value_at(&self, x: f64) -> f64 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return f64::NAN;
        };
        if tolerance::lt(x, first.x()) || tolerance::gt(x, last.x()) {
            return f64::NAN;
        }
        self.points
            .windows(2)
            .find_map(|pair| interpolate(pair[0], pair[1], x))
            .unwrap_or(f64::NAN)
    }
}

impl TabulatedFunction for ArrayTabulatedFunction {
    fn backend(&self) -> Backend {
        Backend::Array
    }

    fn domain_left(&self) -> Result<f64> {
        self.points.first().map(Point::x).ok_or(Error::EmptyState)
    }

    fn domain_right(&self) -> Result<f64> {
        self.points.last().map(Point::x).ok_or(Error::EmptyState)
    }

    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn point(&self, index: usize) -> Result<Point> {
        check_index(index, self.points.len())?;
        Ok(self.points[index])
    }

    fn set_point(&mut self, index: usize, point: Point) -> Result<()> {
        check_index(index, self.points.len())?;
        let previous = index.checked_sub(1).map(|i| self.points[i].x());
        let next = self.points.get(index + 1).map(Point::x);
        check_neighbours(index, point.x(), previous, next)?;
        self.points[index] = point;
        Ok(())
    }

    fn point_x(&self, index: usize) -> Result<f64> {
        check_index(index, self.points.len())?;
        Ok(self.points[index].x())
    }

    fn set_point_x(&mut self, index: usize, x: f64) -> Result<()> {
        check_index(index, self.points.len())?;
        let point = self.points[index].with_x(x);
        self.set_point(index, point)
    }

    fn point_y(&self, index: usize) -> Result<f64> {
        check_index(index, self.points.len())?;
        Ok(self.points[index].y())
    }

    fn set_point_y(&mut self, index: usize, y: f64) -> Result<()> {
        check_index(index, self.points.len())?;
        self.points[index] = self.points[index].with_y(y);
        Ok(())
    }

    fn delete_point(&mut self, index: usize) -> Result<()> {
        let count = self.points.len();
        if count <= DELETION_FLOOR {
            return Err(Error::TooFewPointsToDelete {
                count,
                floor: DELETION_FLOOR,
            });
        }
        check_index(index, count)?;
        let removed = self.points.remove(index);
        trace!("Deleted {removed} at index {index} from array table");
        Ok(())
    }

    fn add_point(&mut self, point: Point) -> Result<()> {
        check_abscissa(point.x())?;
        let index = self
            .points
            .iter()
            .position(|existing| !tolerance::lt(existing.x(), point.x()))
            .unwrap_or(self.points.len());
        if let Some(existing) = self.points.get(index) {
            if tolerance::eq(existing.x(), point.x()) {
                return Err(Error::DuplicateAbscissa { x: point.x() });
            }
        }
        if self.points.len() == self.points.capacity() {
            self.grow();
        }
        self.points.insert(index, point);
        trace!("Inserted {point} at index {index} into array table");
        Ok(())
    }

    fn points(&self) -> Box<dyn Iterator<Item = Point> + '_> {
        Box::new(self.iter())
    }

    fn clone_box(&self) -> Box<dyn TabulatedFunction> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl PartialEq for ArrayTabulatedFunction {
    fn eq(&self, other: &Self) -> bool {
        self.points.len() == other.points.len()
            && self.points.iter().zip(&other.points).all(|(a, b)| a == b)
    }
}

impl PartialEq<LinkedListTabulatedFunction> for ArrayTabulatedFunction {
    fn eq(&self, other: &LinkedListTabulatedFunction) -> bool {
        same_points(self, other)
    }
}

impl PartialEq<dyn TabulatedFunction> for ArrayTabulatedFunction {
    fn eq(&self, other: &(dyn TabulatedFunction + 'static)) -> bool {
        (self as &dyn TabulatedFunction) == other
    }
}

impl Hash for ArrayTabulatedFunction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_points(self.points.len(), self.iter(), state);
    }
}

impl Display for ArrayTabulatedFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_points(self.iter(), f)
    }
}

/// Iterator over copies of an array table's points.
#[derive(Debug, Clone)]
pub struct Points<'a> {
    inner: std::slice::Iter<'a, Point>,
}

impl Iterator for Points<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        self.inner.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Points<'_> {}

impl<'a> IntoIterator for &'a ArrayTabulatedFunction {
    type Item = Point;
    type IntoIter = Points<'a>;

    fn into_iter(self) -> Points<'a> {
        self.iter()
    }
}
