//! Airline record and admission states

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{Address, Amount};

/// Admission state of an airline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirlineState {
    /// Known candidate awaiting admission
    Nominated,
    /// Admitted but not yet sufficiently funded
    Registered,
    /// Admitted and funded; may register flights
    Operational,
}

impl AirlineState {
    /// Counts toward the consensus threshold and may vote
    pub fn is_member(&self) -> bool {
        matches!(self, AirlineState::Registered | AirlineState::Operational)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airline {
    pub address: Address,
    pub state: AirlineState,
    /// Accumulated stake
    pub stake: Amount,
    /// Members who have endorsed this candidate while pending
    pub voters: BTreeSet<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Airline {
    pub fn nominated(address: Address) -> Self {
        Self::with_state(address, AirlineState::Nominated)
    }

    pub fn registered(address: Address) -> Self {
        Self::with_state(address, AirlineState::Registered)
    }

    fn with_state(address: Address, state: AirlineState) -> Self {
        let now = Utc::now();
        Self {
            address,
            state,
            stake: 0,
            voters: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_member(&self) -> bool {
        self.state.is_member()
    }

    pub fn is_operational(&self) -> bool {
        self.state == AirlineState::Operational
    }

    pub fn vote_count(&self) -> usize {
        self.voters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_by_state() {
        assert!(!AirlineState::Nominated.is_member());
        assert!(AirlineState::Registered.is_member());
        assert!(AirlineState::Operational.is_member());
    }

    #[test]
    fn test_new_airline_has_no_stake() {
        let airline = Airline::registered(Address::from("0xA"));
        assert_eq!(airline.stake, 0);
        assert!(!airline.is_operational());
        assert_eq!(airline.vote_count(), 0);
    }
}
