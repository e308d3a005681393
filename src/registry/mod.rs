use std::collections::HashMap;

use log::debug;

use crate::error::{Error, Result};
use crate::factory::{
    sample, ArrayTabulatedFunctionFactory, LinkedListTabulatedFunctionFactory,
    TabulatedFunctionFactory,
};
use crate::function::Function;
use crate::point::Point;
use crate::table::{Backend, TabulatedFunction};

pub type GridConstructor = fn(f64, f64, usize) -> Result<Box<dyn TabulatedFunction>>;
pub type ValuesConstructor = fn(f64, f64, &[f64]) -> Result<Box<dyn TabulatedFunction>>;
pub type PointsConstructor = fn(&[Point]) -> Result<Box<dyn TabulatedFunction>>;

/// The constructors a backend exposes. A `None` entry is a signature the
/// backend does not support.
#[derive(Clone, Copy, Default)]
pub struct Constructors {
    pub from_grid: Option<GridConstructor>,
    pub from_values: Option<ValuesConstructor>,
    pub from_points: Option<PointsConstructor>,
}

impl Constructors {
    /// Every constructor offered by the factory type `F`.
    pub fn of<F: TabulatedFunctionFactory + Default>() -> Self {
        Self {
            from_grid: Some(|left, right, count| F::default().from_grid(left, right, count)),
            from_values: Some(|left, right, values| F::default().from_values(left, right, values)),
            from_points: Some(|points| F::default().from_points(points)),
        }
    }

    pub fn array() -> Self {
        Self::of::<ArrayTabulatedFunctionFactory>()
    }

    pub fn linked_list() -> Self {
        Self::of::<LinkedListTabulatedFunctionFactory>()
    }
}

impl std::fmt::Debug for Constructors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constructors")
            .field("from_grid", &self.from_grid.is_some())
            .field("from_values", &self.from_values.is_some())
            .field("from_points", &self.from_points.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    constructors: HashMap<Backend, Constructors>,
}

impl BackendRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with both built-in backends.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Backend::Array, Constructors::array());
        registry.register(Backend::LinkedList, Constructors::linked_list());
        registry
    }

    /// Registers `constructors` for `backend`, returning what was registered before.
    pub fn register(
        &mut self,
        backend: Backend,
        constructors: Constructors,
    ) -> Option<Constructors>  {
        debug!("Registering constructors for the {backend} backend");
        self.constructors.insert(backend, constructors)
    }

    pub fn unregister(&mut self, backend: Backend) -> Option<Constructors> {
        self.constructors.remove(&backend)
    }

    pub fn contains(&self, backend: Backend) -> bool {
        self.constructors.contains_key(&backend)
    }

    fn constructors(&self, backend: Backend) -> Result<&Constructors> {
        self.constructors
            .get(&backend)
            .ok_or_else(|| Error::UnsupportedBackend(backend.to_string()))
    }

    pub fn create_from_grid(
        &self,
        backend: Backend,
        left: f64,
        right: f64,
        count: usize,
    ) -> Result<Box<dyn TabulatedFunction>> {
        let constructor = self
            .constructors(backend)?
            .from_grid
            .ok_or(Error::MissingConstructor {
                backend,
                signature: "(left, right, count)",
            })?;
        constructor(left, right, count).map_err(|source| construction_failed(backend, source))
    }

    pub fn create_from_values(
        &self,
        backend: Backend,
        left: f64,
        right: f64,
        values: &[f64],
    ) -> Result<Box<dyn TabulatedFunction>> {
        let constructor = self
            .constructors(backend)?
            .from_values
            .ok_or(Error::MissingConstructor {
                backend,
                signature: "(left, right, values)",
            })?;
        constructor(left, right, values).map_err(|source| construction_failed(backend, source))
    }

    pub fn create_from_points(
        &self,
        backend: Backend,
        points: &[Point],
    ) -> Result<Box<dyn TabulatedFunction>> {
        let constructor = self
            .constructors(backend)?
            .from_points
            .ok_or(Error::MissingConstructor {
                backend,
                signature: "(points)",
            })?;
        constructor(points).map_err(|source| construction_failed(backend, source))
    }

    /// Samples `function` and builds a `backend` table from the values.
    ///
    /// The bounds and point count are validated before the registry is consulted.
    pub fn tabulate<F: Function + ?Sized>(
        &self,
        backend: Backend,
        function: &F,
        left: f64,
        right: f64,
        count: usize,
    ) -> Result<Box<dyn TabulatedFunction>> {
        let values = sample(function, left, right, count)?;
        self.create_from_values(backend, left, right, &values)
    }

    /// Like the `create_*` methods, but with the backend given by name.
    pub fn create_by_name(
        &self,
        name: &str,
        points: &[Point],
    ) -> Result<Box<dyn TabulatedFunction>>  {
        self.create_from_points(name.parse()?, points)
    }
}

fn construction_failed(backend: Backend, source: Error) -> Error {
    debug!("The {backend} backend rejected its arguments: {source}");
    Error::Construction {
        backend,
        source: Box::new(source),
    }
}
