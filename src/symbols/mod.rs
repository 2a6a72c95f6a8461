pub mod symbol;
pub use symbol::*;

pub mod symbol_table;
pub use symbol_table::*;

pub mod name_registry;
pub use name_registry::*;

pub mod rename_table;
pub use rename_table::*;
