//! Flight records and finalized-status writes
//!
//! Flights are keyed by (airline, flight code, timestamp) and start Unknown.
//! The first status finalized for a flight sticks; later requests may
//! confirm it but never replace it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::error::{Result, SuretyError};
use crate::governance::AirlineRegistry;
use crate::types::{FlightKey, FlightStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub key: FlightKey,
    pub status: FlightStatus,
    pub registered_at: DateTime<Utc>,
    /// Last time a status request finalized for this flight
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Flight {
    fn new(key: FlightKey) -> Self {
        Self {
            key,
            status: FlightStatus::Unknown,
            registered_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status != FlightStatus::Unknown
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlightRegistry {
    flights: HashMap<FlightKey, Flight>,
}

impl FlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &FlightKey) -> Option<&Flight> {
        self.flights.get(key)
    }

    pub fn contains(&self, key: &FlightKey) -> bool {
        self.flights.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    /// Current status, `None` for unknown flights
    pub fn status(&self, key: &FlightKey) -> Option<FlightStatus> {
        self.flights.get(key).map(|flight| flight.status)
    }

    /// Register a flight for `key.airline`, which must be operational
    pub fn register(&mut self, airlines: &AirlineRegistry, key: FlightKey) -> Result<&Flight> {
        if !airlines.is_operational(&key.airline) {
            warn!(airline = %key.airline, flight = %key.flight, "Non-operational airline attempted flight registration");
            return Err(SuretyError::NotAuthorized {
                airline: key.airline,
            });
        }

        if self.flights.contains_key(&key) {
            return Err(SuretyError::DuplicateFlight(key));
        }

        info!(
            airline = %key.airline,
            flight = %key.flight,
            timestamp = key.timestamp,
            "Flight registered"
        );

        let flight = self
            .flights
            .entry(key.clone())
            .or_insert_with(|| Flight::new(key));
        Ok(&*flight)
    }

    /// Write a finalized status. Returns the previous status.
    ///
    /// Fails with `FlightResolved` if a different status was already
    /// finalized; re-finalizing the same status is a no-op.
    pub fn set_status(&mut self, key: &FlightKey, status: FlightStatus) -> Result<FlightStatus> {
        let flight = self
            .flights
            .get_mut(key)
            .ok_or_else(|| SuretyError::UnknownFlight(key.clone()))?;

        let previous = flight.status;
        if flight.is_resolved() && previous != status {
            warn!(flight = %key, ?previous, ?status, "Refusing to overwrite resolved flight status");
            return Err(SuretyError::FlightResolved(key.clone()));
        }

        flight.status = status;
        flight.resolved_at = Some(Utc::now());
        debug!(flight = %key, ?status, "Flight status resolved");

        Ok(previous)
    }

    /// Whether finalizing `status` would conflict with an already resolved one
    pub fn conflicts_with(&self, key: &FlightKey, status: FlightStatus) -> bool {
        self.flights
            .get(key)
            .is_some_and(|flight| flight.is_resolved() && flight.status != status)
    }
}
