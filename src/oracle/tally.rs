//! Status Consensus Tally
//!
//! ## Request Flow
//!
//! ```text
//! open_request ──► StatusRequest{index, flight} ──► OracleRequest event
//!                         │
//!   submit(index, ...) ───┤ oracle registered? holds index? request open? first vote?
//!                         ▼
//!            votes[status] += oracle ── reaches quorum? ──► finalize:
//!                                                           - flight.status = status
//!                                                           - settle policies if payable
//! ```
//!
//! First status to reach quorum wins. A finalized request rejects any further
//! response. If the flight was already resolved to another status by an
//! earlier request, the request still closes but neither the status nor the
//! balances change. Finalization, status write and settlement happen together or not
//! at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

use crate::error::{Result, SuretyError};
use crate::flights::FlightRegistry;
use crate::insurance::{InsuranceLedger, Settlement};
use crate::oracle::registry::OracleRegistry;
use crate::types::{Address, FlightKey, FlightStatus};

/// Identity of a status request: the index is part of the key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub index: u8,
    pub flight: FlightKey,
}

impl RequestKey {
    pub fn new(index: u8, flight: FlightKey) -> Self {
        Self { index, flight }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    pub key: RequestKey,
    pub requester: Address,
    /// status -> oracles who reported it
    pub votes: HashMap<FlightStatus, BTreeSet<Address>>,
    /// Status that reached quorum, once finalized
    pub resolution: Option<FlightStatus>,
    pub opened_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl StatusRequest {
    fn new(key: RequestKey, requester: Address) -> Self {
        Self {
            key,
            requester,
            votes: HashMap::new(),
            resolution: None,
            opened_at: Utc::now(),
            finalized_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.resolution.is_none()
    }

    pub fn vote_count(&self, status: FlightStatus) -> usize {
        self.votes.get(&status).map_or(0, BTreeSet::len)
    }

    pub fn has_responded(&self, oracle: &Address) -> bool {
        self.votes.values().any(|voters| voters.contains(oracle))
    }
}

/// Result of asking for a flight status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOpened {
    pub index: u8,
    /// False when an open request already existed for the drawn key
    pub created: bool,
}

/// Result of an accepted oracle response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Vote recorded, no quorum yet
    Recorded { status: FlightStatus, votes: usize },
    /// Vote reached quorum and finalized the request
    Finalized {
        status: FlightStatus,
        votes: usize,
        settlement: Settlement,
    },
}

impl ResponseOutcome {
    pub fn votes(&self) -> usize {
        match self {
            ResponseOutcome::Recorded { votes, .. } | ResponseOutcome::Finalized { votes, .. } => {
                *votes
            }
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, ResponseOutcome::Finalized { .. })
    }
}

#[derive(Debug, Clone)]
pub struct StatusTally {
    quorum: usize,
    requests: HashMap<RequestKey, StatusRequest>,
}

impl StatusTally {
    pub fn new(quorum: usize) -> Self {
        Self {
            quorum,
            requests: HashMap::new(),
        }
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    pub fn request(&self, index: u8, flight: &FlightKey) -> Option<&StatusRequest> {
        self.requests.get(&RequestKey::new(index, flight.clone()))
    }

    /// Votes for `status` on the request (index, flight); zero if absent
    pub fn vote_count(&self, index: u8, flight: &FlightKey, status: FlightStatus) -> usize {
        self.request(index, flight)
            .map_or(0, |request| request.vote_count(status))
    }

    pub fn open_requests(&self, flight: &FlightKey) -> impl Iterator<Item = &StatusRequest> {
        self.requests
            .values()
            .filter(move |request| &request.key.flight == flight && request.is_open())
    }

    /// Open a status request for a registered flight
    ///
    /// The drawn index comes from the oracle registry. If an open request
    /// already exists at that key it is returned unchanged; finalized keys are
    /// skipped by probing the following indexes.
    pub fn open_request(
        &mut self,
        oracles: &mut OracleRegistry,
        flights: &FlightRegistry,
        requester: &Address,
        flight: &FlightKey,
    ) -> Result<RequestOpened> {
        if !flights.contains(flight) {
            return Err(SuretyError::UnknownFlight(flight.clone()));
        }

        let range = oracles.config().index_range;
        let drawn = oracles.peek_request_index(requester);

        for offset in 0..range {
            let index = ((u16::from(drawn) + u16::from(offset)) % u16::from(range)) as u8;
            let key = RequestKey::new(index, flight.clone());

            match self.requests.get(&key) {
                Some(existing) if existing.is_open() => {
                    debug!(flight = %flight, index, "Status request already open");
                    return Ok(RequestOpened {
                        index,
                        created: false,
                    });
                }
                Some(_) => continue,
                None => {
                    oracles.commit_request_index(requester);
                    self.requests
                        .insert(key.clone(), StatusRequest::new(key, requester.clone()));
                    info!(flight = %flight, index, requester = %requester, "Status request opened");
                    return Ok(RequestOpened {
                        index,
                        created: true,
                    });
                }
            }
        }

        warn!(flight = %flight, "Every index already has a finalized request for this flight");
        Err(SuretyError::RequestClosed {
            index: drawn,
            flight: flight.clone(),
        })
    }

    /// Record an oracle response, finalizing on quorum
    pub fn submit(
        &mut self,
        oracles: &OracleRegistry,
        flights: &mut FlightRegistry,
        ledger: &mut InsuranceLedger,
        oracle: &Address,
        key: RequestKey,
        status: FlightStatus,
    ) -> Result<ResponseOutcome> {
        oracles.authorize_response(oracle, key.index)?;

        let request = self.requests.get(&key).ok_or_else(|| SuretyError::NoSuchRequest {
            index: key.index,
            flight: key.flight.clone(),
        })?;

        if !request.is_open() {
            warn!(oracle = %oracle, index = key.index, flight = %key.flight, "Response to closed request rejected");
            return Err(SuretyError::RequestClosed {
                index: key.index,
                flight: key.flight.clone(),
            });
        }

        if request.has_responded(oracle) {
            warn!(oracle = %oracle, index = key.index, flight = %key.flight, "Duplicate oracle response rejected");
            return Err(SuretyError::DuplicateVote {
                voter: oracle.clone(),
                subject: format!("request {} for {}", key.index, key.flight),
            });
        }

        let votes = request.vote_count(status) + 1;
        let reaches_quorum = votes >= self.quorum;

        // A flight already resolved to another status keeps it and pays nothing
        let conflicting = reaches_quorum && flights.conflicts_with(&key.flight, status);

        // Everything fallible happens before the first write
        let settlement = if reaches_quorum && !conflicting && status.is_payable() {
            Some(ledger.prepare_settlement(&key.flight)?)
        } else {
            None
        };
        if reaches_quorum && !conflicting {
            flights.set_status(&key.flight, status)?;
        }

        let request = self
            .requests
            .get_mut(&key)
            .ok_or_else(|| SuretyError::NoSuchRequest {
                index: key.index,
                flight: key.flight.clone(),
            })?;
        request.votes.entry(status).or_default().insert(oracle.clone());

        if !reaches_quorum {
            debug!(oracle = %oracle, index = key.index, flight = %key.flight, ?status, votes, "Oracle response recorded");
            return Ok(ResponseOutcome::Recorded { status, votes });
        }

        request.resolution = Some(status);
        request.finalized_at = Some(Utc::now());

        let settlement = match settlement {
            Some(settlement) => {
                ledger.apply_settlement(&settlement);
                settlement
            }
            None => Settlement {
                flight: key.flight.clone(),
                credits: Vec::new(),
                total: 0,
            },
        };

        if conflicting {
            warn!(
                flight = %key.flight,
                index = key.index,
                ?status,
                resolved = ?flights.status(&key.flight),
                "Request finalized against an already resolved flight; no payout"
            );
        }

        info!(
            flight = %key.flight,
            index = key.index,
            ?status,
            votes,
            payouts = settlement.credits.len(),
            "Flight status finalized"
        );

        Ok(ResponseOutcome::Finalized {
            status,
            votes,
            settlement,
        })
    }
}
