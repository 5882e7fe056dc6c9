mod client;
mod coordinator;
mod diff;
pub mod entity;
mod error;
mod integration;
mod logger;
mod normalize;
pub mod protocol;
mod types;

pub use client::{ActronApi, ActronApiBuilder};
pub use coordinator::{Coordinator, CoordinatorBuilder, CoordinatorState};
pub use error::{Error, Result};
pub use integration::{ConfigEntry, Integration};
pub use logger::MessageLogMode;
pub use normalize::{normalize, zone_peripheral};
pub use types::*;
