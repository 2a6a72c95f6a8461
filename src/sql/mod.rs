pub mod fragment;
pub use fragment::*;

pub mod optional_column;
pub use optional_column::*;

pub mod select_statement;
pub use select_statement::*;

pub mod writer;
pub use writer::*;

pub mod render;
pub use render::*;
