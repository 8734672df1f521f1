//! Flight Surety Engine
//!
//! Governance and oracle-consensus core for decentralized flight-delay
//! insurance: airline admission by escalating consensus, stake-gated
//! operation, flight registration, capped policies, and quorum-based
//! resolution of flight status by pseudo-randomly assigned oracles.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs          - Crate root with re-exports
//! ├── main.rs         - Node entrypoint
//! ├── config.rs       - Configuration management
//! ├── error.rs        - Error taxonomy
//! ├── types.rs        - Addresses, amounts, flight keys and statuses
//! ├── governance/     - Operational gate and airline admission
//! │   ├── gate.rs       - Owner-controlled operational switch
//! │   ├── airline.rs    - Airline record and states
//! │   └── registry.rs   - Bootstrap, voting and funding
//! ├── flights/        - Flight registry
//! ├── insurance/      - Policies, reserve vault, pull-payment settlement
//! ├── oracle/         - Oracle consensus
//! │   ├── indexes.rs    - Deterministic index draws
//! │   ├── registry.rs   - Fee-bearing oracle admission
//! │   └── tally.rs      - Per-request vote tally and finalization
//! └── engine/         - Serialized entry point and event stream
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod flights;
pub mod governance;
pub mod insurance;
pub mod oracle;
pub mod types;

// Re-export main types for convenience
pub use config::{GovernanceConfig, InsuranceConfig, LoggingConfig, OracleConfig, SuretyConfig};
pub use engine::{SuretyEngine, SuretyEvent};
pub use error::{Result, SuretyError};
pub use types::{Address, Amount, FlightKey, FlightStatus, UNIT};

pub use flights::{Flight, FlightRegistry};
pub use governance::{
    Airline, AirlineRegistry, AirlineState, FundingOutcome, NominationOutcome, OperationalGate,
    RegistrationOutcome,
};
pub use insurance::{InsuranceLedger, InsurancePolicy, PayoutCredit, Settlement, Vault};
pub use oracle::{
    IndexDrawer, OracleAccount, OracleRegistry, RequestKey, RequestOpened, ResponseOutcome,
    StatusRequest, StatusTally,
};
