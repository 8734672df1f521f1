//! Governance: operational gate and airline admission
//!
//! ## Airline Lifecycle
//!
//! ```text
//!   nominate()            register() (direct, or by vote)        fund() >= threshold
//! ────────────► Nominated ─────────────────────────────► Registered ─────────────────► Operational
//!                    ▲                                        │
//!                    └──── register() below approval ◄────────┘ (members vote)
//! ```
//!
//! Only Registered/Operational airlines count toward the consensus threshold
//! and may cast votes. Only Operational airlines may register flights.

mod airline;
mod gate;
mod registry;

pub use airline::{Airline, AirlineState};
pub use gate::OperationalGate;
pub use registry::{AirlineRegistry, FundingOutcome, NominationOutcome, RegistrationOutcome};
