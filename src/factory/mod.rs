use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;
use log::{debug, trace};

use crate::error::{Error, Result};
use crate::function::Function;
use crate::point::Point;
use crate::table::{
    grid_step, ArrayTabulatedFunction, Backend, LinkedListTabulatedFunction, TabulatedFunction,
};

pub trait TabulatedFunctionFactory: Send + Sync {
    fn backend(&self) -> Backend;

    fn from_grid(&self, left: f64, right: f64, count: usize) -> Result<Box<dyn TabulatedFunction>>;

    fn from_values(
        &self,
        left: f64,
        right: f64,
        values: &[f64],
    ) -> Result<Box<dyn TabulatedFunction>>;

    fn from_points(&self, points: &[Point]) -> Result<Box<dyn TabulatedFunction>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayTabulatedFunctionFactory;

impl TabulatedFunctionFactory for ArrayTabulatedFunctionFactory {
    fn backend(&self) -> Backend {
        Backend::Array
    }

    fn from_grid(&self, left: f64, right: f64, count: usize) -> Result<Box<dyn TabulatedFunction>> {
        Ok(Box::new(ArrayTabulatedFunction::from_grid(left, right, count)?))
    }

    fn from_values(
        &self,
        left: f64,
        right: f64,
        values: &[f64],
    ) -> Result<Box<dyn TabulatedFunction>>  {
        Ok(Box::new(ArrayTabulatedFunction::from_values(left, right, values)?))
    }

    fn from_points(&self, points: &[Point]) -> Result<Box<dyn TabulatedFunction>> {
        Ok(Box::new(ArrayTabulatedFunction::from_points(points)?))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedListTabulatedFunctionFactory;

impl TabulatedFunctionFactory for LinkedListTabulatedFunctionFactory {
    fn backend(&self) -> Backend {
        Backend::LinkedList
    }

    fn from_grid(&self, left: f64, right: f64, count: usize) -> Result<Box<dyn TabulatedFunction>> {
        Ok(Box::new(LinkedListTabulatedFunction::from_grid(left, right, count)?))
    }

    fn from_values(
        &self,
        left: f64,
        right: f64,
        values: &[f64],
    ) -> Result<Box<dyn TabulatedFunction>>  {
        Ok(Box::new(LinkedListTabulatedFunction::from_values(left, right, values)?))
    }

    fn from_points(&self, points: &[Point]) -> Result<Box<dyn TabulatedFunction>> {
        Ok(Box::new(LinkedListTabulatedFunction::from_points(points)?))
    }
}

/// The built-in factory for `backend`.
pub fn factory_for(backend: Backend) -> Arc<dyn TabulatedFunctionFactory> {
    match backend {
        Backend::Array => Arc::new(ArrayTabulatedFunctionFactory),
        Backend::LinkedList => Arc::new(LinkedListTabulatedFunctionFactory),
    }
}

lazy_static! {
    static ref DEFAULT_FACTORY: RwLock<Arc<dyn TabulatedFunctionFactory>> =
        RwLock::new(Arc::new(ArrayTabulatedFunctionFactory));
}

/// The factory used by the free construction functions. Starts out as the array factory.
pub fn default_factory() -> Arc<dyn TabulatedFunctionFactory> {
    DEFAULT_FACTORY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replaces the process-wide default factory and returns the previous one.
///
/// Concurrent callers race with last-writer-wins semantics; code that needs a
/// stable choice should hold its own [`Tabulator`] instead.
pub fn set_default_factory(
    factory: Arc<dyn TabulatedFunctionFactory>,
) -> Arc<dyn TabulatedFunctionFactory> {
    let mut current = DEFAULT_FACTORY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    debug!(
        "Default tabulated function factory: {} -> {}",
        current.backend(),
        factory.backend()
    );
    std::mem::replace(&mut *current, factory)
}

pub fn create_from_grid(left: f64, right: f64, count: usize) -> Result<Box<dyn TabulatedFunction>> {
    default_factory().from_grid(left, right, count)
}

pub fn create_from_values(
    left: f64,
    right: f64,
    values: &[f64],
) -> Result<Box<dyn TabulatedFunction>>  {
    default_factory().from_values(left, right, values)
}

pub fn create_from_points(points: &[Point]) -> Result<Box<dyn TabulatedFunction>> {
    default_factory().from_points(points)
}

/// Samples `function` with the default factory. See [`Tabulator::tabulate`].
pub fn tabulate<F: Function + ?Sized>(
    function: &F,
    left: f64,
    right: f64,
    count: usize,
) -> Result<Box<dyn TabulatedFunction>> {
    Tabulator::from_default().tabulate(function, left, right, count)
}

/// Evenly sampled ordinates of `function` over `[left, right]`.
///
/// Fails with [`Error::InvalidArgument`] unless `[left, right]` lies inside the
/// function's domain and is a valid table grid for `count` points.
pub fn sample<F: Function + ?Sized>(
    function: &F,
    left: f64,
    right: f64,
    count: usize,
) -> Result<Vec<f64>> {
    if left < function.left_border() || right > function.right_border() {
        return Err(Error::invalid_argument(format!(
            "[{left}, {right}] leaves the function domain [{}, {}]",
            function.left_border(),
            function.right_border()
        )));
    }

    let step = grid_step(left, right, count)?;
    trace!("Sampling {count} points over [{left}, {right}] with step {step}");
    Ok((0..count)
        .map(|i| function.value_at(left + i as f64 * step))
        .collect())
}

/// Table construction bound to an explicit factory.
#[derive(Clone)]
pub struct Tabulator {
    factory: Arc<dyn TabulatedFunctionFactory>,
}

impl Tabulator {
    pub fn new(factory: Arc<dyn TabulatedFunctionFactory>) -> Self {
        Self { factory }
    }

    pub fn for_backend(backend: Backend) -> Self {
        Self::new(factory_for(backend))
    }

    /// Snapshot of the current process-wide default.
    pub fn from_default() -> Self {
        Self::new(default_factory())
    }

    pub fn backend(&self) -> Backend {
        self.factory.backend()
    }

    pub fn factory(&self) -> &Arc<dyn TabulatedFunctionFactory> {
        &self.factory
    }

    pub fn from_grid(
        &self,
        left: f64,
        right: f64,
        count: usize,
    ) -> Result<Box<dyn TabulatedFunction>>  {
        self.factory.from_grid(left, right, count)
    }

    pub fn from_values(
        &self,
        left: f64,
        right: f64,
        values: &[f64],
    ) -> Result<Box<dyn TabulatedFunction>>  {
        self.factory.from_values(left, right, values)
    }

    pub fn from_points(&self, points: &[Point]) -> Result<Box<dyn TabulatedFunction>> {
        self.factory.from_points(points)
    }

    /// Samples `function` at `count` evenly spaced abscissas over `[left, right]`
    /// and builds a table from the values.
    pub fn tabulate<F: Function + ?Sized>(
        &self,
        function: &F,
        left: f64,
        right: f64,
        count: usize,
    ) -> Result<Box<dyn TabulatedFunction>> {
        let values = sample(function, left, right, count)?;
        self.from_values(left, right, &values)
    }
}

impl std::fmt::Debug for Tabulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tabulator")
            .field("backend", &self.backend())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;
    use std::sync::Arc;

    use super::*;
    use crate::function::{Cos, Log, Sin};

    // The only test in the crate that swaps the process-wide default.
    #[test]
    fn default_factory_swaps() {
        assert_eq!(default_factory().backend(), Backend::Array);

        let previous = set_default_factory(Arc::new(LinkedListTabulatedFunctionFactory));
        assert_eq!(previous.backend(), Backend::Array);
        let table = tabulate(&Cos, 0.0, PI, 11).unwrap();
        assert_eq!(table.backend(), Backend::LinkedList);
        assert_eq!(create_from_grid(0.0, 1.0, 3).unwrap().backend(), Backend::LinkedList);

        set_default_factory(previous);
        let table = tabulate(&Cos, 0.0, PI, 11).unwrap();
        assert_eq!(table.backend(), Backend::Array);
        assert_eq!(
            create_from_points(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)])
                .unwrap()
                .backend(),
            Backend::Array
        );
        assert_eq!(create_from_values(0.0, 1.0, &[1.0, 2.0]).unwrap().point_count(), 2);
    }

    #[test]
    fn tabulator_ignores_default() {
        let tabulator = Tabulator::for_backend(Backend::LinkedList);
        let table = tabulator.tabulate(&Sin, 0.0, PI, 5).unwrap();
        assert_eq!(table.backend(), Backend::LinkedList);
        assert_eq!(table.point_count(), 5);
        assert!((table.point_y(2).unwrap() - 1.0).abs() < 1e-12);
        assert!((table.point_x(4).unwrap() - PI).abs() < 1e-12);
    }

    #[test]
    fn tabulated_values_match_function() {
        let table = Tabulator::for_backend(Backend::Array)
            .tabulate(&Sin, 0.0, PI, 101)
            .unwrap();
        for point in table.points() {
            assert!((point.y() - point.x().sin()).abs() < 1e-12);
        }
        assert!((table.value_at(1.0) - 1.0f64.sin()).abs() < 1e-3);
    }

    #[test]
    fn tabulation_validates_arguments() {
        let tabulator = Tabulator::for_backend(Backend::Array);
        assert!(matches!(
            tabulator.tabulate(&Sin, 1.0, 0.0, 5),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            tabulator.tabulate(&Sin, 0.0, 1.0, 1),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            tabulator.tabulate(&Log::natural(), -1.0, 1.0, 5),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            tabulator.tabulate(&Sin, 0.0, 1e-9, 5),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn both_factories_build_equal_tables() {
        let values = [1.0, -2.0, 0.5, 8.0];
        let array = factory_for(Backend::Array).from_values(-1.0, 2.0, &values).unwrap();
        let list = factory_for(Backend::LinkedList)
            .from_values(-1.0, 2.0, &values)
            .unwrap();
        assert_eq!(array.backend(), Backend::Array);
        assert_eq!(list.backend(), Backend::LinkedList);
        assert!(*array == *list);
    }

    #[test]
    fn tables_can_be_retabulated() {
        let coarse = Tabulator::for_backend(Backend::Array)
            .tabulate(&Cos, 0.0, PI, 21)
            .unwrap();
        let fine = Tabulator::for_backend(Backend::LinkedList)
            .tabulate(coarse.as_ref(), 0.0, 3.0, 41)
            .unwrap();
        for point in fine.points() {
            assert_eq!(point.y(), coarse.value_at(point.x()));
        }
    }
}
