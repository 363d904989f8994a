#[cfg(test)]
#[macro_use]
extern crate quickcheck_macros;

pub mod compare;
pub mod coord;
pub mod cube;
pub mod r#move;
pub mod pattern;
pub mod solver;
pub mod tables;

pub mod prelude;
