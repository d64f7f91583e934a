//! # Unit abstractions.
//!
//! - [`Unit`] - async lifecycle contract implemented by services and components
//! - [`UnitDescriptor`] / [`UnitKind`] - identity and declared dependencies
//! - [`Phase`] / [`UnitState`] - the six lifecycle phases and the states between them
//! - [`Dependencies`] - resolved interfaces injected at start
//! - [`Router`] / [`RouteTable`] - mountable component routing handles

mod deps;
mod phase;
mod router;
mod unit;

pub use deps::{Dependencies, Interface};
pub use phase::{Phase, Transition, UnitState};
pub use router::{BoxRouter, RouteTable, Router};
pub use unit::{BoxUnit, LoadContext, Unit, UnitDescriptor, UnitKind};
