pub mod engine;
pub mod memory;

pub use engine::*;
pub use memory::*;
