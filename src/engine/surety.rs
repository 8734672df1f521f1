//! Surety Engine - Main Orchestrator
//!
//! Owns every registry behind a single lock. Each mutating call holds the
//! write guard from its gate check to its last write, so votes, funding
//! threshold crossings and quorum detection are read-modify-write atomic and a
//! failed call leaves no partial state. Events are published while the guard
//! is still held so subscribers observe them in commit order.

use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

use crate::config::SuretyConfig;
use crate::engine::events::SuretyEvent;
use crate::error::Result;
use crate::flights::FlightRegistry;
use crate::governance::{
    Airline, AirlineRegistry, NominationOutcome, OperationalGate, RegistrationOutcome,
};
use crate::insurance::{InsuranceLedger, Vault};
use crate::oracle::{OracleRegistry, RequestKey, RequestOpened, ResponseOutcome, StatusTally};
use crate::types::{Address, Amount, FlightKey, FlightStatus};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

struct SuretyState {
    gate: OperationalGate,
    airlines: AirlineRegistry,
    flights: FlightRegistry,
    ledger: InsuranceLedger,
    oracles: OracleRegistry,
    tally: StatusTally,
}

#[derive(Clone)]
pub struct SuretyEngine {
    state: Arc<RwLock<SuretyState>>,
    events: broadcast::Sender<SuretyEvent>,
}

impl SuretyEngine {
    /// Build the engine; the configured owner is both gate controller and
    /// bootstrap airline. Fails if the configuration does not validate.
    pub fn new(config: SuretyConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let state = SuretyState {
            gate: OperationalGate::new(config.owner.clone()),
            airlines: AirlineRegistry::bootstrap(config.governance.clone(), config.owner.clone()),
            flights: FlightRegistry::new(),
            ledger: InsuranceLedger::new(config.insurance.clone()),
            tally: StatusTally::new(config.oracle.quorum),
            oracles: OracleRegistry::new(config.oracle.clone()),
        };

        info!(
            owner = %config.owner,
            consensus_threshold = config.governance.consensus_threshold,
            quorum = config.oracle.quorum,
            "Surety engine initialized"
        );

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SuretyEvent> {
        self.events.subscribe()
    }

    fn publish(&self, events: Vec<SuretyEvent>) {
        for event in events {
            debug!(event = event.name(), "Publishing event");
            // No subscribers is not an error
            let _ = self.events.send(event);
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub async fn is_operational(&self) -> bool {
        self.state.read().await.gate.is_operational()
    }

    pub async fn is_airline_operational(&self, airline: &Address) -> bool {
        self.state.read().await.airlines.is_operational(airline)
    }

    pub async fn airline(&self, airline: &Address) -> Option<Airline> {
        self.state.read().await.airlines.get(airline).cloned()
    }

    pub async fn registered_airline_count(&self) -> usize {
        self.state.read().await.airlines.member_count()
    }

    pub async fn flight_status(&self, flight: &FlightKey) -> Option<FlightStatus> {
        self.state.read().await.flights.status(flight)
    }

    pub async fn premium(&self, passenger: &Address, flight: &FlightKey) -> Amount {
        self.state.read().await.ledger.premium(passenger, flight)
    }

    pub async fn oracle_indexes(&self, oracle: &Address) -> Result<Vec<u8>> {
        let state = self.state.read().await;
        state.oracles.indexes_of(oracle).map(<[u8]>::to_vec)
    }

    pub async fn vote_count(&self, index: u8, flight: &FlightKey, status: FlightStatus) -> usize {
        self.state.read().await.tally.vote_count(index, flight, status)
    }

    pub async fn balance(&self, passenger: &Address) -> Amount {
        self.state.read().await.ledger.balance(passenger)
    }

    pub async fn vault(&self) -> Vault {
        self.state.read().await.ledger.vault()
    }

    // ------------------------------------------------------------------
    // Operational gate
    // ------------------------------------------------------------------

    /// Owner-only; not itself gated so a closed gate can be reopened
    pub async fn set_operational(&self, caller: &Address, operational: bool) -> Result<()> {
        let mut state = self.state.write().await;
        if state.gate.set_operational(caller, operational)? {
            self.publish(vec![SuretyEvent::OperationalStatusChanged { operational }]);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Airlines
    // ------------------------------------------------------------------

    pub async fn nominate_airline(
        &self,
        caller: &Address,
        candidate: &Address,
    ) -> Result<NominationOutcome> {
        let mut state = self.state.write().await;
        state.gate.ensure_operational()?;

        let outcome = state.airlines.nominate(candidate)?;
        if outcome == NominationOutcome::Nominated {
            debug!(candidate = %candidate, by = %caller, "Nomination accepted");
            self.publish(vec![SuretyEvent::AirlineNominated {
                airline: candidate.clone(),
            }]);
        }
        Ok(outcome)
    }

    pub async fn register_airline(
        &self,
        caller: &Address,
        candidate: &Address,
    ) -> Result<RegistrationOutcome> {
        let mut state = self.state.write().await;
        state.gate.ensure_operational()?;

        let outcome = state.airlines.register(caller, candidate)?;
        let events = match outcome {
            RegistrationOutcome::Registered { members } => vec![SuretyEvent::AirlineRegistered {
                airline: candidate.clone(),
                registered_by: caller.clone(),
                members,
            }],
            RegistrationOutcome::Approved {
                votes,
                required,
                members,
            } => vec![
                SuretyEvent::AirlineVoted {
                    airline: candidate.clone(),
                    voter: caller.clone(),
                    votes,
                    required,
                },
                SuretyEvent::AirlineRegistered {
                    airline: candidate.clone(),
                    registered_by: caller.clone(),
                    members,
                },
            ],
            RegistrationOutcome::Pending { votes, required } => vec![SuretyEvent::AirlineVoted {
                airline: candidate.clone(),
                voter: caller.clone(),
                votes,
                required,
            }],
        };
        self.publish(events);
        Ok(outcome)
    }

    /// Add stake for the calling airline; the attached amount enters reserves
    pub async fn fund_airline(&self, caller: &Address, amount: Amount) -> Result<Amount> {
        let mut state = self.state.write().await;
        state.gate.ensure_operational()?;
        state.ledger.ensure_can_deposit(amount)?;

        let outcome = state.airlines.fund(caller, amount)?;
        state.ledger.deposit(amount);

        let mut events = vec![SuretyEvent::AirlineFunded {
            airline: caller.clone(),
            amount,
            stake: outcome.stake,
        }];
        if outcome.became_operational {
            events.push(SuretyEvent::AirlineOperational {
                airline: caller.clone(),
                stake: outcome.stake,
            });
        }
        self.publish(events);
        Ok(outcome.stake)
    }

    // ------------------------------------------------------------------
    // Flights and insurance
    // ------------------------------------------------------------------

    pub async fn register_flight(
        &self,
        caller: &Address,
        flight: &str,
        timestamp: i64,
    ) -> Result<FlightKey> {
        let mut state = self.state.write().await;
        state.gate.ensure_operational()?;

        let SuretyState { airlines, flights, .. } = &mut *state;
        let key = flights
            .register(airlines, FlightKey::new(caller.clone(), flight, timestamp))?
            .key
            .clone();

        self.publish(vec![SuretyEvent::FlightRegistered { flight: key.clone() }]);
        Ok(key)
    }

    pub async fn buy_insurance(
        &self,
        passenger: &Address,
        flight: &FlightKey,
        premium: Amount,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.gate.ensure_operational()?;

        let SuretyState { flights, ledger, .. } = &mut *state;
        ledger.buy(flights, passenger, flight, premium)?;

        self.publish(vec![SuretyEvent::InsurancePurchased {
            passenger: passenger.clone(),
            flight: flight.clone(),
            premium,
        }]);
        Ok(())
    }

    /// Pull the caller's credited payouts
    pub async fn withdraw(&self, passenger: &Address) -> Result<Amount> {
        let mut state = self.state.write().await;
        state.gate.ensure_operational()?;

        let amount = state.ledger.withdraw(passenger)?;
        self.publish(vec![SuretyEvent::PayoutWithdrawn {
            passenger: passenger.clone(),
            amount,
        }]);
        Ok(amount)
    }

    // ------------------------------------------------------------------
    // Oracles
    // ------------------------------------------------------------------

    pub async fn register_oracle(&self, caller: &Address, fee: Amount) -> Result<Vec<u8>> {
        let mut state = self.state.write().await;
        state.gate.ensure_operational()?;
        state.ledger.ensure_can_deposit(fee)?;

        let indexes = state.oracles.register(caller, fee)?.indexes.clone();
        state.ledger.deposit(fee);

        self.publish(vec![SuretyEvent::OracleRegistered {
            oracle: caller.clone(),
            indexes: indexes.clone(),
        }]);
        Ok(indexes)
    }

    /// Solicit a status for `flight`; emits `OracleRequest` with the index
    pub async fn request_status(
        &self,
        requester: &Address,
        flight: &FlightKey,
    ) -> Result<RequestOpened> {
        let mut state = self.state.write().await;
        state.gate.ensure_operational()?;

        let SuretyState { oracles, flights, tally, .. } = &mut *state;
        let opened = tally.open_request(oracles, flights, requester, flight)?;

        if opened.created {
            self.publish(vec![SuretyEvent::OracleRequest {
                index: opened.index,
                flight: flight.clone(),
                requester: requester.clone(),
            }]);
        }
        Ok(opened)
    }

    pub async fn submit_response(
        &self,
        oracle: &Address,
        index: u8,
        flight: &FlightKey,
        status: FlightStatus,
    ) -> Result<ResponseOutcome> {
        let mut state = self.state.write().await;
        state.gate.ensure_operational()?;

        let SuretyState {
            oracles,
            flights,
            ledger,
            tally,
            ..
        } = &mut *state;
        let outcome = tally.submit(
            oracles,
            flights,
            ledger,
            oracle,
            RequestKey::new(index, flight.clone()),
            status,
        )?;

        let mut events = vec![SuretyEvent::OracleReport {
            index,
            flight: flight.clone(),
            oracle: oracle.clone(),
            status,
            votes: outcome.votes(),
        }];
        if let ResponseOutcome::Finalized { settlement, .. } = &outcome {
            events.push(SuretyEvent::FlightStatusFinalized {
                index,
                flight: flight.clone(),
                status,
            });
            events.extend(settlement.credits.iter().map(|credit| SuretyEvent::PayoutCredited {
                passenger: credit.passenger.clone(),
                flight: credit.flight.clone(),
                amount: credit.amount,
            }));
        }
        self.publish(events);
        Ok(outcome)
    }
}
