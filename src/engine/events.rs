//! Events published for external observers
//!
//! Events are only published after the transition that produced them has
//! committed. The relay learns request indexes solely from `OracleRequest`.

use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, FlightKey, FlightStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SuretyEvent {
    OperationalStatusChanged {
        operational: bool,
    },
    AirlineNominated {
        airline: Address,
    },
    AirlineRegistered {
        airline: Address,
        registered_by: Address,
        members: usize,
    },
    AirlineVoted {
        airline: Address,
        voter: Address,
        votes: usize,
        required: usize,
    },
    AirlineFunded {
        airline: Address,
        amount: Amount,
        stake: Amount,
    },
    AirlineOperational {
        airline: Address,
        stake: Amount,
    },
    FlightRegistered {
        flight: FlightKey,
    },
    InsurancePurchased {
        passenger: Address,
        flight: FlightKey,
        premium: Amount,
    },
    OracleRegistered {
        oracle: Address,
        indexes: Vec<u8>,
    },
    OracleRequest {
        index: u8,
        flight: FlightKey,
        requester: Address,
    },
    OracleReport {
        index: u8,
        flight: FlightKey,
        oracle: Address,
        status: FlightStatus,
        votes: usize,
    },
    FlightStatusFinalized {
        index: u8,
        flight: FlightKey,
        status: FlightStatus,
    },
    PayoutCredited {
        passenger: Address,
        flight: FlightKey,
        amount: Amount,
    },
    PayoutWithdrawn {
        passenger: Address,
        amount: Amount,
    },
}

impl SuretyEvent {
    /// Stable snake_case name, matching the serialized tag
    pub fn name(&self) -> &'static str {
        match self {
            SuretyEvent::OperationalStatusChanged { .. } => "operational_status_changed",
            SuretyEvent::AirlineNominated { .. } => "airline_nominated",
            SuretyEvent::AirlineRegistered { .. } => "airline_registered",
            SuretyEvent::AirlineVoted { .. } => "airline_voted",
            SuretyEvent::AirlineFunded { .. } => "airline_funded",
            SuretyEvent::AirlineOperational { .. } => "airline_operational",
            SuretyEvent::FlightRegistered { .. } => "flight_registered",
            SuretyEvent::InsurancePurchased { .. } => "insurance_purchased",
            SuretyEvent::OracleRegistered { .. } => "oracle_registered",
            SuretyEvent::OracleRequest { .. } => "oracle_request",
            SuretyEvent::OracleReport { .. } => "oracle_report",
            SuretyEvent::FlightStatusFinalized { .. } => "flight_status_finalized",
            SuretyEvent::PayoutCredited { .. } => "payout_credited",
            SuretyEvent::PayoutWithdrawn { .. } => "payout_withdrawn",
        }
    }
}
