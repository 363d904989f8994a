pub use crate::compare::*;
pub use crate::cube::*;
pub use crate::r#move::*;
pub use crate::pattern::*;
pub use crate::solver::*;
pub use crate::tables::*;

#[cfg(test)]
pub use crate::test::*;

pub use std::time::Duration;
