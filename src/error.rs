//! Error taxonomy for the surety engine
//!
//! Every rejected call surfaces one of these synchronously. None of them are
//! retried internally; a failed call leaves no trace in engine state.

use thiserror::Error;

use crate::types::{Address, FlightKey};

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, SuretyError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuretyError {
    // ========== Gate / authorization ==========
    #[error("Contract is currently not operational")]
    Operationality,

    #[error("Caller {caller} is not authorized: {reason}")]
    Unauthorized { caller: Address, reason: &'static str },

    #[error("Airline {airline} is not operational and cannot register flights")]
    NotAuthorized { airline: Address },

    // ========== Duplicates ==========
    #[error("{voter} has already voted on {subject}")]
    DuplicateVote { voter: Address, subject: String },

    /// Also covers oracle re-registration ("already registered")
    #[error("{0} is already registered")]
    DuplicateRegistration(Address),

    #[error("Passenger {passenger} already holds a policy on {flight}")]
    DuplicatePolicy { passenger: Address, flight: FlightKey },

    #[error("Flight {0} is already registered")]
    DuplicateFlight(FlightKey),

    // ========== Money ==========
    #[error("Premium {amount} must be positive and at most {cap}")]
    PremiumExceedsCap { amount: u128, cap: u128 },

    #[error("Registration fee is required: expected {required}, got {provided}")]
    InsufficientFee { required: u128, provided: u128 },

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Nothing to withdraw for {0}")]
    NothingToWithdraw(Address),

    #[error("Reserves {reserves} cannot cover liabilities {liabilities}")]
    InsufficientReserves { reserves: u128, liabilities: u128 },

    #[error("Arithmetic overflow while computing {0}")]
    ArithmeticOverflow(&'static str),

    // ========== Oracles / tally ==========
    #[error("Not registered as an oracle: {0}")]
    NotRegistered(Address),

    #[error("Index {index} does not match any index assigned to {oracle}")]
    IndexMismatch { oracle: Address, index: u8 },

    #[error("No status request with index {index} for {flight}")]
    NoSuchRequest { index: u8, flight: FlightKey },

    #[error("Status request with index {index} for {flight} is closed")]
    RequestClosed { index: u8, flight: FlightKey },

    #[error("Invalid flight status code: {0}")]
    InvalidStatusCode(u8),

    // ========== Flights ==========
    #[error("Unknown flight {0}")]
    UnknownFlight(FlightKey),

    #[error("Flight {0} has already been resolved")]
    FlightResolved(FlightKey),
}

impl SuretyError {
    /// Whether retrying the same call later may succeed (gate reopened,
    /// request opened at that index)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SuretyError::Operationality
                | SuretyError::IndexMismatch { .. }
                | SuretyError::NoSuchRequest { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_message_matches_relay_expectation() {
        let err = SuretyError::InsufficientFee { required: 10, provided: 5 };
        assert!(err.to_string().starts_with("Registration fee is required"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(SuretyError::Operationality.is_transient());
        assert!(!SuretyError::InvalidAmount.is_transient());
        assert!(!SuretyError::NotRegistered(Address::from("0xabc")).is_transient());
    }
}
