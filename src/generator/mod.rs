pub mod generated;
pub use generated::*;

pub mod sql_generator;
pub use sql_generator::*;

mod columns;
mod dml;
mod paging;
mod relational;
mod scalar;

#[cfg(test)]
mod _tests;
