//! Airline Registry & Governance
//!
//! Admission control for airlines:
//! - Bootstrap airline is registered at construction
//! - Below the consensus threshold any member admits a candidate directly
//! - At or above it, members vote and a candidate is admitted once the distinct
//!   voter count reaches the approval fraction of current members (rounded up)
//! - Funding past the funding threshold makes a member operational, once

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::GovernanceConfig;
use crate::error::{Result, SuretyError};
use crate::governance::airline::{Airline, AirlineState};
use crate::types::{Address, Amount};

/// Result of a nomination call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NominationOutcome {
    /// A new candidate record was created
    Nominated,
    /// Candidate was already pending; nothing changed
    AlreadyPending,
}

/// Result of a register call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Candidate admitted without a vote (below the consensus threshold)
    Registered { members: usize },
    /// The caller's vote completed the approval
    Approved {
        votes: usize,
        required: usize,
        members: usize,
    },
    /// Vote recorded, candidate still pending
    Pending { votes: usize, required: usize },
}

impl RegistrationOutcome {
    pub fn is_registered(&self) -> bool {
        !matches!(self, RegistrationOutcome::Pending { .. })
    }
}

/// Result of a funding call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingOutcome {
    pub stake: Amount,
    /// True only on the call that first crossed the funding threshold
    pub became_operational: bool,
}

#[derive(Debug, Clone)]
pub struct AirlineRegistry {
    config: GovernanceConfig,
    airlines: HashMap<Address, Airline>,
    /// Registered + Operational airlines
    members: usize,
}

impl AirlineRegistry {
    /// Create the registry with `founder` already registered
    pub fn bootstrap(config: GovernanceConfig, founder: Address) -> Self {
        let mut airlines = HashMap::new();
        airlines.insert(founder.clone(), Airline::registered(founder.clone()));

        info!(airline = %founder, "Bootstrap airline registered");

        Self {
            config,
            airlines,
            members: 1,
        }
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn get(&self, address: &Address) -> Option<&Airline> {
        self.airlines.get(address)
    }

    /// Registered + Operational airlines; nominated candidates never count
    pub fn member_count(&self) -> usize {
        self.members
    }

    pub fn is_member(&self, address: &Address) -> bool {
        self.airlines.get(address).is_some_and(Airline::is_member)
    }

    pub fn is_operational(&self, address: &Address) -> bool {
        self.airlines.get(address).is_some_and(Airline::is_operational)
    }

    /// Pending votes recorded for a candidate
    pub fn vote_count(&self, candidate: &Address) -> usize {
        self.airlines
            .get(candidate)
            .filter(|airline| !airline.is_member())
            .map_or(0, Airline::vote_count)
    }

    /// Create a Nominated record for an unknown candidate
    pub fn nominate(&mut self, candidate: &Address) -> Result<NominationOutcome> {
        match self.airlines.get(candidate) {
            Some(existing) if existing.is_member() => {
                Err(SuretyError::DuplicateRegistration(candidate.clone()))
            }
            Some(_) => {
                debug!(candidate = %candidate, "Candidate already nominated");
                Ok(NominationOutcome::AlreadyPending)
            }
            None => {
                self.airlines
                    .insert(candidate.clone(), Airline::nominated(candidate.clone()));
                info!(candidate = %candidate, "Airline nominated");
                Ok(NominationOutcome::Nominated)
            }
        }
    }

    /// Register `candidate` on behalf of member `caller`, directly or by vote
    pub fn register(&mut self, caller: &Address, candidate: &Address) -> Result<RegistrationOutcome> {
        if !self.is_member(caller) {
            warn!(caller = %caller, candidate = %candidate, "Non-member attempted airline registration");
            return Err(SuretyError::Unauthorized {
                caller: caller.clone(),
                reason: "only registered airlines may register airlines",
            });
        }

        if self.is_member(candidate) {
            return Err(SuretyError::DuplicateRegistration(candidate.clone()));
        }

        if self.members < self.config.consensus_threshold {
            self.admit(candidate);
            info!(
                airline = %candidate,
                by = %caller,
                members = self.members,
                "Airline registered without consensus"
            );
            return Ok(RegistrationOutcome::Registered {
                members: self.members,
            });
        }

        if self
            .airlines
            .get(candidate)
            .is_some_and(|airline| airline.voters.contains(caller))
        {
            warn!(voter = %caller, candidate = %candidate, "Duplicate airline vote rejected");
            return Err(SuretyError::DuplicateVote {
                voter: caller.clone(),
                subject: format!("airline {candidate}"),
            });
        }

        let required = self.config.required_votes(self.members);
        let record = self
            .airlines
            .entry(candidate.clone())
            .or_insert_with(|| Airline::nominated(candidate.clone()));
        record.voters.insert(caller.clone());
        record.updated_at = chrono::Utc::now();
        let votes = record.vote_count();

        if votes >= required {
            self.admit(candidate);
            info!(
                airline = %candidate,
                votes,
                required,
                members = self.members,
                "Airline registered by consensus"
            );
            Ok(RegistrationOutcome::Approved {
                votes,
                required,
                members: self.members,
            })
        } else {
            info!(
                airline = %candidate,
                by = %caller,
                votes,
                required,
                "Airline registration vote recorded"
            );
            Ok(RegistrationOutcome::Pending { votes, required })
        }
    }

    /// Add stake for member `caller`; flips Registered -> Operational once
    pub fn fund(&mut self, caller: &Address, amount: Amount) -> Result<FundingOutcome> {
        if amount == 0 {
            return Err(SuretyError::InvalidAmount);
        }

        let threshold = self.config.funding_threshold;
        let airline = self
            .airlines
            .get_mut(caller)
            .filter(|airline| airline.is_member())
            .ok_or_else(|| SuretyError::Unauthorized {
                caller: caller.clone(),
                reason: "only registered airlines may fund themselves",
            })?;

        let stake = airline
            .stake
            .checked_add(amount)
            .ok_or(SuretyError::ArithmeticOverflow("airline stake"))?;

        airline.stake = stake;
        airline.updated_at = chrono::Utc::now();

        let became_operational =
            airline.state == AirlineState::Registered && stake >= threshold;
        if became_operational {
            airline.state = AirlineState::Operational;
            info!(airline = %caller, stake, "Airline is operational");
        } else {
            debug!(airline = %caller, amount, stake, "Airline funded");
        }

        Ok(FundingOutcome {
            stake,
            became_operational,
        })
    }

    fn admit(&mut self, candidate: &Address) {
        let record = self
            .airlines
            .entry(candidate.clone())
            .or_insert_with(|| Airline::nominated(candidate.clone()));
        record.state = AirlineState::Registered;
        record.voters.clear();
        record.updated_at = chrono::Utc::now();
        self.members += 1;
    }
}
