use std::any::Any;
use std::cell::Cell;
use std::fmt::Display;
use std::hash::{Hash, Hasher};

use log::trace;

use super::{
    check_abscissa, check_ascending, check_index, check_neighbours, fmt_points, grid_step,
    hash_points, interpolate, same_points, ArrayTabulatedFunction, Backend, TabulatedFunction,
};
use crate::error::{Error, Result};
use crate::function::Function;
use crate::point::Point;
use crate::tolerance;

/// Arena slot of the sentinel. Its point is never read.
const HEAD: usize = 0;

/// Deletion is refused once the table is down to this many points.
const DELETION_FLOOR: usize = 2;

#[derive(Debug, Clone, Copy)]
struct Node {
    point: Point,
    previous: usize,
    next: usize,
}

/// The last node reached by a lookup, and its position in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    node: usize,
    index: usize,
}

/// A tabulated function stored in a circular doubly-linked list.
///
/// Nodes live in an arena addressed by slot; slot [`HEAD`] is the sentinel whose
/// `next` and `previous` are the first and last points. Lookups remember the
/// last node they reached, so walking the table in index order or evaluating
/// at ascending abscissas is amortized O(1) per step.
#[derive(Debug)]
pub struct LinkedListTabulatedFunction {
    nodes: Vec<Node>,
    /// Unlinked slots available for reuse.
    free: Vec<usize>,
    count: usize,
    cursor: Cell<Option<Cursor>>,
}

impl LinkedListTabulatedFunction {
    fn empty() -> Self {
        Self {
            nodes: vec![Node {
                point: Point::default(),
                previous: HEAD,
                next: HEAD,
            }],
            free: Vec::new(),
            count: 0,
            cursor: Cell::new(None),
        }
    }

    fn with_points(points: impl IntoIterator<Item = Point>) -> Self {
        let mut list = Self::empty();
        for point in points {
            list.push_back(point);
        }
        list
    }

    /// `count` points evenly spaced over `[left, right]`, all with `y = 0`.
    pub fn from_grid(left: f64, right: f64, count: usize) -> Result<Self> {
        let step = grid_step(left, right, count)?;
        Ok(Self::with_points(
            (0..count).map(|i| Point::new(left + i as f64 * step, 0.0)),
        ))
    }

    /// One point per value, with abscissas evenly spaced over `[left, right]`.
    pub fn from_values(left: f64, right: f64, values: &[f64]) -> Result<Self> {
        let step = grid_step(left, right, values.len())?;
        Ok(Self::with_points(
            values
                .iter()
                .enumerate()
                .map(|(i, &y)| Point::new(left + i as f64 * step, y)),
        ))
    }

    pub fn from_points(points: &[Point]) -> Result<Self> {
        check_ascending(points)?;
        Ok(Self::with_points(points.iter().copied()))
    }

    pub fn iter(&self) -> Points<'_> {
        Points {
            list: self,
            node: self.nodes[HEAD].next,
            remaining: self.count,
        }
    }

    fn allocate(&mut self, point: Point, previous: usize, next: usize) -> usize {
        let node = Node {
            point,
            previous,
            next,
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Links a new node in front of `successor` and returns its slot.
    fn link_before(&mut self, successor: usize, point: Point) -> usize {
        let predecessor = self.nodes[successor].previous;
        let node = self.allocate(point, predecessor, successor);
        self.nodes[predecessor].next = node;
        self.nodes[successor].previous = node;
        self.count += 1;
        node
    }

    fn push_back(&mut self, point: Point) {
        let node = self.link_before(HEAD, point);
        self.cursor.set(Some(Cursor {
            node,
            index: self.count - 1,
        }));
    }

    /// Slot of the node at `index`, stepping from the cursor when it is at or
    /// next to `index`, otherwise walking from the nearer end of the list.
    fn node_at(&self, index: usize) -> Result<usize> {
        check_index(index, self.count)?;

        let node = match self.cursor.get() {
            Some(cursor) if cursor.index == index => cursor.node,
            Some(cursor) if cursor.index + 1 == index => self.nodes[cursor.node].next,
            Some(cursor) if cursor.index == index + 1 => self.nodes[cursor.node].previous,
            _ if index < self.count / 2 => {
                let mut node = self.nodes[HEAD].next;
                for _ in 0..index {
                    node = self.nodes[node].next;
                }
                node
            }
            _ => {
                let mut node = self.nodes[HEAD].previous;
                for _ in index + 1..self.count {
                    node = self.nodes[node].previous;
                }
                node
            }
        };

        self.cursor.set(Some(Cursor { node, index }));
        Ok(node)
    }

    fn insert_at(&mut self, index: usize, point: Point) -> Result<()> {
        if index == self.count {
            self.push_back(point);
            return Ok(());
        }
        let successor = self.node_at(index)?;
        let node = self.link_before(successor, point);
        self.cursor.set(Some(Cursor { node, index }));
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> Result<Point> {
        let before = self.cursor.get();
        let node = self.node_at(index)?;
        let Node {
            point,
            previous,
            next,
        } = self.nodes[node];
        self.nodes[previous].next = next;
        self.nodes[next].previous = previous;
        self.free.push(node);
        self.count -= 1;

        let cursor = match before {
            Some(cursor) if cursor.index == index => None,
            Some(cursor) if cursor.index > index => Some(Cursor {
                index: cursor.index - 1,
                ..cursor
            }),
            cursor => cursor,
        };
        self.cursor.set(cursor);
        Ok(point)
    }

    fn neighbour_abscissas(&self, node: usize) -> (Option<f64>, Option<f64>) {
        let Node { previous, next, .. } = self.nodes[node];
        let previous = (previous != HEAD).then(|| self.nodes[previous].point.x());
        let next = (next != HEAD).then(|| self.nodes[next].point.x());
        (previous, next)
    }
}

impl Clone for LinkedListTabulatedFunction {
    fn clone(&self) -> Self {
        Self::with_points(self.iter())
    }
}

impl Function for LinkedListTabulatedFunction {
    fn left_border(&self) -> f64 {
        self.domain_left().unwrap_or(f64::NAN)
    }

    fn right_border(&self) -> f64 {
        self.domain_right().unwrap_or(f64::NAN)
    }

    fn value_at(&self, x: f64) -> f64 {
        let (Ok(left), Ok(right)) = (self.domain_left(), self.domain_right()) else {
            return f64::NAN;
        };
        if tolerance::lt(x, left) || tolerance::gt(x, right) {
            return f64::NAN;
        }

        // Ascending queries resume from the last node reached. The scan walks
        // segments, so a cursor on the tail steps back onto the last segment.
        let start = match self.cursor.get() {
            Some(cursor) if tolerance::ge(x, self.nodes[cursor.node].point.x()) => {
                if self.nodes[cursor.node].next == HEAD && cursor.index > 0 {
                    Cursor {
                        node: self.nodes[cursor.node].previous,
                        index: cursor.index - 1,
                    }
                } else {
                    cursor
                }
            }
            _ => Cursor {
                node: self.nodes[HEAD].next,
                index: 0,
            },
        };

        let mut current = start;
        while current.node != HEAD && self.nodes[current.node].next != HEAD {
            let next = Cursor {
                node: self.nodes[current.node].next,
                index: current.index + 1,
            };
            let left = self.nodes[current.node].point;
            let right = self.nodes[next.node].point;
            if let Some(y) = interpolate(left, right, x) {
                let hit = if tolerance::eq(x, right.x()) {
                    next
                } else {
                    current
                };
                self.cursor.set(Some(hit));
                return y;
            }
            current = next;
        }
        f64::NAN
    }
}

impl TabulatedFunction for LinkedListTabulatedFunction {
    fn backend(&self) -> Backend {
        Backend::LinkedList
    }

    fn domain_left(&self) -> Result<f64> {
        if self.count == 0 {
            return Err(Error::EmptyState);
        }
        Ok(self.nodes[self.nodes[HEAD].next].point.x())
    }

    fn domain_right(&self) -> Result<f64> {
        if self.count == 0 {
            return Err(Error::EmptyState);
        }
        Ok(self.nodes[self.nodes[HEAD].previous].point.x())
    }

    fn point_count(&self) -> usize {
        self.count
    }

    fn point(&self, index: usize) -> Result<Point> {
        let node = self.node_at(index)?;
        Ok(self.nodes[node].point)
    }

    fn set_point(&mut self, index: usize, point: Point) -> Result<()> {
        let node = self.node_at(index)?;
        let (previous, next) = self.neighbour_abscissas(node);
        check_neighbours(index, point.x(), previous, next)?;
        self.nodes[node].point = point;
        Ok(())
    }

    fn set_point_x(&mut self, index: usize, x: f64) -> Result<()> {
        let node = self.node_at(index)?;
        let point = self.nodes[node].point.with_x(x);
        self.set_point(index, point)
    }

    fn set_point_y(&mut self, index: usize, y: f64) -> Result<()> {
        let node = self.node_at(index)?;
        self.nodes[node].point = self.nodes[node].point.with_y(y);
        Ok(())
    }

    fn delete_point(&mut self, index: usize) -> Result<()> {
        if self.count <= DELETION_FLOOR {
            return Err(Error::TooFewPointsToDelete {
                count: self.count,
                floor: DELETION_FLOOR,
            });
        }
        let removed = self.remove_at(index)?;
        trace!("Deleted {removed} at index {index} from linked list table");
        Ok(())
    }

    fn add_point(&mut self, point: Point) -> Result<()> {
        check_abscissa(point.x())?;
        let mut node = self.nodes[HEAD].next;
        let mut index = 0;
        while node != HEAD && tolerance::lt(self.nodes[node].point.x(), point.x()) {
            node = self.nodes[node].next;
            index += 1;
        }
        if node != HEAD && tolerance::eq(self.nodes[node].point.x(), point.x()) {
            return Err(Error::DuplicateAbscissa { x: point.x() });
        }
        self.insert_at(index, point)?;
        trace!("Inserted {point} at index {index} into linked list table");
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

/// Walks both lists in lock-step.
impl PartialEq for LinkedListTabulatedFunction {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl PartialEq<ArrayTabulatedFunction> for LinkedListTabulatedFunction {
    fn eq(&self, other: &ArrayTabulatedFunction) -> bool {
        same_points(self, other)
    }
}

impl PartialEq<dyn TabulatedFunction> for LinkedListTabulatedFunction {
    fn eq(&self, other: &(dyn TabulatedFunction + 'static)) -> bool {
        (self as &dyn TabulatedFunction) == other
    }
}

impl Hash for LinkedListTabulatedFunction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_points(self.count, self.iter(), state);
    }
}

impl Display for LinkedListTabulatedFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_points(self.iter(), f)
    }
}

/// Iterator over copies of a linked list table's points.
///
/// Follows the links directly and leaves the access cache untouched.
#[derive(Debug, Clone)]
pub struct Points<'a> {
    list: &'a LinkedListTabulatedFunction,
    node: usize,
    remaining: usize,
}

impl Iterator for Points<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.node == HEAD {
            return None;
        }
        let Node { point, next, .. } = self.list.nodes[self.node];
        self.node = next;
        self.remaining -= 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Points<'_> {}

impl<'a> IntoIterator for &'a LinkedListTabulatedFunction {
    type Item = Point;
    type IntoIter = Points<'a>;

    fn into_iter(self) -> Points<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Cursor, LinkedListTabulatedFunction, HEAD};
    use crate::error::Error;
    use crate::function::Function;
    use crate::point::Point;
    use crate::table::TabulatedFunction;

    fn line(count: usize) -> LinkedListTabulatedFunction {
        let values: Vec<f64> = (0..count).map(|i| 2.0 * i as f64).collect();
        LinkedListTabulatedFunction::from_values(0.0, (count - 1) as f64, &values).unwrap()
    }

    #[test]
    fn empty_list_is_a_singleton_sentinel() {
        let list = LinkedListTabulatedFunction::empty();
        assert_eq!(list.nodes.len(), 1);
        assert_eq!(list.nodes[HEAD].next, HEAD);
        assert_eq!(list.nodes[HEAD].previous, HEAD);
        assert!(matches!(list.domain_left(), Err(Error::EmptyState)));
        assert!(matches!(list.domain_right(), Err(Error::EmptyState)));
        assert!(list.value_at(0.0).is_nan());
        assert_eq!(list.iter().count(), 0);
    }

    #[test]
    fn lookup_from_either_end_and_from_cursor() {
        let list = line(10);
        for index in [0, 9, 3, 4, 5, 4, 8, 1, 7, 2, 6] {
            assert_eq!(list.point(index).unwrap(), Point::new(index as f64, 2.0 * index as f64));
            assert_eq!(list.cursor.get().map(|cursor| cursor.index), Some(index));
        }
        assert!(matches!(
            list.point(10),
            Err(Error::IndexOutOfRange { index: 10, count: 10 })
        ));
    }

    #[test]
    fn cursor_follows_structural_edits() {
        let mut list = line(6);
        list.point(4).unwrap();
        list.delete_point(1).unwrap();
        assert_eq!(list.cursor.get().map(|cursor| cursor.index), Some(3));
        assert_eq!(list.point(3).unwrap(), Point::new(4.0, 8.0));

        list.delete_point(3).unwrap();
        assert_eq!(list.cursor.get(), None);
        assert_eq!(list.point(3).unwrap(), Point::new(5.0, 10.0));

        list.add_point(Point::new(1.5, 0.0)).unwrap();
        assert_eq!(list.cursor.get().map(|cursor| cursor.index), Some(1));
        let xs: Vec<f64> = list.iter().map(|point| point.x()).collect();
        assert_eq!(xs, vec![0.0, 1.5, 2.0, 3.0, 5.0]);
        for (index, x) in xs.iter().enumerate() {
            assert_eq!(list.point_x(index).unwrap(), *x);
        }
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut list = line(4);
        list.delete_point(2).unwrap();
        let slots = list.nodes.len();
        list.add_point(Point::new(2.0, 4.0)).unwrap();
        assert_eq!(list.nodes.len(), slots);
        assert_eq!(list, line(4));
    }

    #[test]
    fn deletion_floor_is_two() {
        let mut list = line(3);
        list.delete_point(0).unwrap();
        assert!(matches!(
            list.delete_point(0),
            Err(Error::TooFewPointsToDelete { count: 2, floor: 2 })
        ));
    }

    #[test]
    fn ascending_evaluation_resumes_from_cursor() {
        let list = line(100);
        let mut x = 0.0;
        while x <= 99.0 {
            assert!((list.value_at(x) - 2.0 * x).abs() < 1e-9);
            x += 0.25;
        }
        assert_eq!(
            list.cursor.get(),
            Some(Cursor {
                node: list.nodes[HEAD].previous,
                index: 99
            })
        );
    }

    #[test]
    fn repeated_evaluation_at_the_right_end() {
        let list = line(3);
        assert_eq!(list.value_at(2.0), 4.0);
        assert_eq!(list.value_at(2.0), 4.0);
        assert!((list.value_at(1.5) - 3.0).abs() < 1e-12);
        assert_eq!(list.value_at(2.0), 4.0);
    }

    #[test]
    fn cache_is_transparent() {
        let points: Vec<Point> = (0..50)
            .map(|i| {
                let x = i as f64 * 0.7;
                Point::new(x, (x * 1.3).sin())
            })
            .collect();
        let list = LinkedListTabulatedFunction::from_points(&points).unwrap();
        let fresh = || LinkedListTabulatedFunction::from_points(&points).unwrap();

        let ascending: Vec<f64> = (0..400).map(|i| -1.0 + i as f64 * 0.1).collect();
        let sequential: Vec<f64> = ascending.iter().map(|&x| list.value_at(x)).collect();

        // A fixed permutation of the same queries.
        let mut scrambled: Vec<usize> = (0..ascending.len()).collect();
        let mut state = 17usize;
        for i in (1..scrambled.len()).rev() {
            state = state.wrapping_mul(1103515245).wrapping_add(12345) % 2147483648;
            scrambled.swap(i, state % (i + 1));
        }
        let shuffled = fresh();
        for index in scrambled {
            let expected = sequential[index];
            let actual = shuffled.value_at(ascending[index]);
            assert!(
                (expected.is_nan() && actual.is_nan()) || expected == actual,
                "x = {}: {expected} vs {actual}",
                ascending[index]
            );
        }
    }

    #[test]
    fn setters_check_neighbours() {
        let mut list = line(3);
        assert!(matches!(
            list.set_point_x(0, 1.0),
            Err(Error::OrderingViolation { index: 0, .. })
        ));
        assert!(matches!(
            list.set_point(2, Point::new(0.5, 0.0)),
            Err(Error::OrderingViolation { index: 2, .. })
        ));
        list.set_point_x(2, 10.0).unwrap();
        list.set_point_y(1, -1.0).unwrap();
        assert_eq!(list.domain_right().unwrap(), 10.0);
        assert_eq!(list.point(1).unwrap(), Point::new(1.0, -1.0));
    }

    #[test]
    fn clone_is_compact_and_independent() {
        let mut list = line(5);
        list.delete_point(1).unwrap();
        let mut copy = list.clone();
        assert_eq!(copy.nodes.len(), 5);
        assert!(copy.free.is_empty());
        assert_eq!(copy, list);
        copy.set_point_y(0, 42.0).unwrap();
        assert_ne!(copy, list);
    }
}
