//! Oracle reporters and flight-status consensus
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐  draws   ┌──────────────┐  finalizes  ┌────────────────┐
//! │ OracleRegistry │◄─────────│ StatusTally  │────────────►│ FlightRegistry │
//! │ (indexes, fee) │ validates│ (per request │   settles   ├────────────────┤
//! └────────────────┘─────────►│  vote sets)  │────────────►│ InsuranceLedger│
//!                             └──────────────┘             └────────────────┘
//! ```
//!
//! Each oracle holds a fixed set of indexes drawn at registration. A status
//! request targets one index; only oracles holding it may answer, and the
//! first status reported by a quorum of distinct oracles is final.

mod indexes;
mod registry;
mod tally;

pub use indexes::IndexDrawer;
pub use registry::{OracleAccount, OracleRegistry};
pub use tally::{RequestKey, RequestOpened, ResponseOutcome, StatusRequest, StatusTally};
