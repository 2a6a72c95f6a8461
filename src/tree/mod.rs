pub mod literal;
pub use literal::*;

pub mod operators;
pub use operators::*;

pub mod types;
pub use types::*;

pub mod expr;
pub use expr::*;

pub mod command;
pub use command::*;
