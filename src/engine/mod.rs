//! Surety engine: the serialized entry point used by display layers, relays
//! and test harnesses.

mod surety;
mod events;

pub use surety::SuretyEngine;
pub use events::SuretyEvent;
