//! Insurance policy record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, FlightKey};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsurancePolicy {
    pub passenger: Address,
    pub flight: FlightKey,
    /// Premium paid at purchase; never amended
    pub premium: Amount,
    /// Whether the payout was credited
    pub paid: bool,
    pub purchased_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl InsurancePolicy {
    pub fn new(passenger: Address, flight: FlightKey, premium: Amount) -> Self {
        Self {
            passenger,
            flight,
            premium,
            paid: false,
            purchased_at: Utc::now(),
            paid_at: None,
        }
    }

    pub(crate) fn mark_paid(&mut self) {
        self.paid = true;
        self.paid_at = Some(Utc::now());
    }
}

/// A credit produced by settling one policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutCredit {
    pub passenger: Address,
    pub flight: FlightKey,
    pub premium: Amount,
    pub amount: Amount,
}
