//! Runtime core: ordering and lifecycle of the units owned by one worker.
//!
//! - [`resolver`]: dependency ordering with cycle and missing-dependency detection;
//! - [`tree`]: flat services plus the component hierarchy, owned by value;
//! - [`invoke`]: one phase call on one unit with deadline and events;
//! - [`loader`]: phase passes over a whole tree (bring-up, teardown, routers);
//! - [`shutdown`]: OS termination signals.

mod invoke;
mod loader;
mod resolver;
mod shutdown;
mod tree;

pub use loader::Loader;
pub use resolver::resolve;
pub use shutdown::shutdown_signal;
pub use tree::{ComponentId, UnitTree, UnitTreeBuilder};
