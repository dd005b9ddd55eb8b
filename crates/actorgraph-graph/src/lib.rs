pub mod builder;
pub mod edge;
pub mod evidence;
pub mod metrics;
pub mod snapshot;
pub mod topology;

pub use builder::*;
pub use edge::*;
pub use evidence::*;
pub use metrics::*;
pub use snapshot::*;
pub use topology::*;
