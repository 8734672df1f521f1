//! Flight Registry
//!
//! Flights are identified by their natural key (airline, code, timestamp) and
//! may only be created by operational airlines. Status starts Unknown and is
//! written by the status tally when a request reaches quorum.

mod registry;

pub use registry::{Flight, FlightRegistry};
