pub mod fixtures;
pub mod memory;

pub use fixtures::*;
pub use memory::*;
