pub mod dialect;
pub use dialect::*;

pub mod config;
pub use config::*;
