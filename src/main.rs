use std::f64::consts::PI;
use std::sync::Arc;

use factory::{
    set_default_factory, tabulate, ArrayTabulatedFunctionFactory,
    LinkedListTabulatedFunctionFactory,
};
use function::{integrate, Cos, Power, Sin, Sum};
use point::Point;
use registry::BackendRegistry;
use table::{ArrayTabulatedFunction, Backend, LinkedListTabulatedFunction};

pub mod error;
pub mod factory;
pub mod function;
pub mod io;
pub mod point;
pub mod registry;
pub mod table;
pub mod tolerance;

fn main() -> Result<(), error::Error> {
    let squares = [
        Point::new(1.0, 1.0),
        Point::new(2.0, 4.0),
        Point::new(3.0, 9.0),
    ];

    println!("Array table:");
    let array = ArrayTabulatedFunction::from_points(&squares)?;
    for point in &array {
        println!("  {point}");
    }

    println!("Linked list table:");
    let list = LinkedListTabulatedFunction::from_points(&squares)?;
    for point in &list {
        println!("  {point}");
    }
    println!("Equal across backends: {}", array == list);

    let table = tabulate(&Cos, 0.0, PI, 11)?;
    println!("Default factory builds: {}", table.backend());
    set_default_factory(Arc::new(LinkedListTabulatedFunctionFactory));
    let table = tabulate(&Cos, 0.0, PI, 11)?;
    println!("After switching: {}", table.backend());
    set_default_factory(Arc::new(ArrayTabulatedFunctionFactory));
    let table = tabulate(&Cos, 0.0, PI, 11)?;
    println!("After switching back: {}", table.backend());

    let registry = BackendRegistry::builtin();
    let table = registry.create_from_grid(Backend::Array, 0.0, 10.0, 3)?;
    println!("{} (left, right, count): {table}", table.backend());
    let table = registry.create_from_values(Backend::Array, 0.0, 10.0, &[0.0, 10.0])?;
    println!("{} (left, right, values): {table}", table.backend());
    let table = registry.create_from_points(
        Backend::LinkedList,
        &[Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
    )?;
    println!("{} (points): {table}", table.backend());
    let table = registry.tabulate(Backend::LinkedList, &Sin, 0.0, PI, 11)?;
    println!("{} tabulated sin: {table}", table.backend());

    println!(
        "Integral of tabulated sin over [0, pi]: {:.6}",
        integrate(table.as_ref(), 0.0, table.domain_right()?, 1e-3)?
    );

    let one = Sum::new(Power::new(Sin, 2.0), Power::new(Cos, 2.0));
    println!("sin^2 + cos^2 tabulated: {}", tabulate(&one, 0.0, PI, 6)?);

    Ok(())
}
