pub mod builder;
pub mod confirm;
pub mod registry;
pub mod resolver;

pub use builder::*;
pub use confirm::*;
pub use registry::*;
pub use resolver::*;
