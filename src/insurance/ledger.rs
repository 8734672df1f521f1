//! Insurance Ledger
//!
//! Holds policies per flight, the reserve vault, and passengers' withdrawable
//! balances. Settlement never pushes funds: it credits balances that
//! passengers later pull with `withdraw`.
//!
//! Settlement is split into `prepare_settlement` (fallible, read-only) and
//! `apply_settlement` (infallible) so a finalizing vote and its payouts commit
//! together or not at all.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::config::InsuranceConfig;
use crate::error::{Result, SuretyError};
use crate::flights::FlightRegistry;
use crate::insurance::policy::{InsurancePolicy, PayoutCredit};
use crate::types::{Address, Amount, FlightKey};

/// Value held by the system against credited payouts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    /// Everything received and not yet withdrawn
    pub reserves: Amount,
    /// Credited payouts not yet withdrawn
    pub liabilities: Amount,
}

impl Vault {
    /// Reserves not already owed to passengers
    pub fn free_reserves(&self) -> Amount {
        self.reserves.saturating_sub(self.liabilities)
    }
}

/// Credits computed for one flight, ready to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub flight: FlightKey,
    pub credits: Vec<PayoutCredit>,
    pub total: Amount,
}

impl Settlement {
    fn empty(flight: FlightKey) -> Self {
        Self {
            flight,
            credits: Vec::new(),
            total: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.credits.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct InsuranceLedger {
    config: InsuranceConfig,
    /// flight -> passenger -> policy
    policies: HashMap<FlightKey, BTreeMap<Address, InsurancePolicy>>,
    balances: HashMap<Address, Amount>,
    vault: Vault,
}

impl InsuranceLedger {
    pub fn new(config: InsuranceConfig) -> Self {
        Self {
            config,
            policies: HashMap::new(),
            balances: HashMap::new(),
            vault: Vault::default(),
        }
    }

    pub fn config(&self) -> &InsuranceConfig {
        &self.config
    }

    pub fn vault(&self) -> Vault {
        self.vault
    }

    pub fn policy(&self, passenger: &Address, flight: &FlightKey) -> Option<&InsurancePolicy> {
        self.policies.get(flight)?.get(passenger)
    }

    /// Premium stored for (passenger, flight); zero when uninsured
    pub fn premium(&self, passenger: &Address, flight: &FlightKey) -> Amount {
        self.policy(passenger, flight).map_or(0, |policy| policy.premium)
    }

    pub fn policies_for(&self, flight: &FlightKey) -> impl Iterator<Item = &InsurancePolicy> {
        self.policies.get(flight).into_iter().flat_map(BTreeMap::values)
    }

    /// Withdrawable balance for a passenger
    pub fn balance(&self, passenger: &Address) -> Amount {
        self.balances.get(passenger).copied().unwrap_or(0)
    }

    pub fn ensure_can_deposit(&self, amount: Amount) -> Result<()> {
        self.vault
            .reserves
            .checked_add(amount)
            .map(|_| ())
            .ok_or(SuretyError::ArithmeticOverflow("vault reserves"))
    }

    /// Add value received by any paying call; check `ensure_can_deposit` first
    pub fn deposit(&mut self, amount: Amount) {
        self.vault.reserves = self.vault.reserves.saturating_add(amount);
        debug!(amount, reserves = self.vault.reserves, "Deposit received");
    }

    /// Underwrite a policy for `passenger` on an existing, unresolved flight
    pub fn buy(
        &mut self,
        flights: &FlightRegistry,
        passenger: &Address,
        flight: &FlightKey,
        premium: Amount,
    ) -> Result<&InsurancePolicy> {
        let record = flights
            .get(flight)
            .ok_or_else(|| SuretyError::UnknownFlight(flight.clone()))?;

        if record.is_resolved() {
            return Err(SuretyError::FlightResolved(flight.clone()));
        }

        if premium == 0 || premium > self.config.premium_cap {
            warn!(passenger = %passenger, premium, cap = self.config.premium_cap, "Premium outside allowed range");
            return Err(SuretyError::PremiumExceedsCap {
                amount: premium,
                cap: self.config.premium_cap,
            });
        }

        if self.policy(passenger, flight).is_some() {
            return Err(SuretyError::DuplicatePolicy {
                passenger: passenger.clone(),
                flight: flight.clone(),
            });
        }

        self.ensure_can_deposit(premium)?;
        self.deposit(premium);

        info!(passenger = %passenger, flight = %flight, premium, "Insurance purchased");

        let policy = self
            .policies
            .entry(flight.clone())
            .or_default()
            .entry(passenger.clone())
            .or_insert_with(|| InsurancePolicy::new(passenger.clone(), flight.clone(), premium));
        Ok(&*policy)
    }

    /// Compute credits for every unpaid policy on `flight` without mutating
    pub fn prepare_settlement(&self, flight: &FlightKey) -> Result<Settlement> {
        let mut settlement = Settlement::empty(flight.clone());

        for policy in self.policies_for(flight).filter(|policy| !policy.paid) {
            let amount = self
                .config
                .payout_for(policy.premium)
                .ok_or(SuretyError::ArithmeticOverflow("payout"))?;

            self.balance(&policy.passenger)
                .checked_add(amount)
                .ok_or(SuretyError::ArithmeticOverflow("passenger balance"))?;

            settlement.total = settlement
                .total
                .checked_add(amount)
                .ok_or(SuretyError::ArithmeticOverflow("settlement total"))?;

            settlement.credits.push(PayoutCredit {
                passenger: policy.passenger.clone(),
                flight: flight.clone(),
                premium: policy.premium,
                amount,
            });
        }

        self.vault
            .liabilities
            .checked_add(settlement.total)
            .ok_or(SuretyError::ArithmeticOverflow("vault liabilities"))?;

        if settlement.total > self.vault.free_reserves() {
            // Credits are owed regardless; withdrawals fail until reserves cover them
            warn!(
                flight = %flight,
                reserves = self.vault.reserves,
                owed = self.vault.liabilities.saturating_add(settlement.total),
                "Credited payouts exceed reserves"
            );
        }

        Ok(settlement)
    }

    /// Apply a settlement produced by `prepare_settlement` on this ledger
    pub fn apply_settlement(&mut self, settlement: &Settlement) {
        for credit in &settlement.credits {
            let Some(policy) = self
                .policies
                .get_mut(&settlement.flight)
                .and_then(|by_passenger| by_passenger.get_mut(&credit.passenger))
            else {
                continue;
            };

            if policy.paid {
                continue;
            }
            policy.mark_paid();

            let balance = self.balances.entry(credit.passenger.clone()).or_insert(0);
            *balance = balance.saturating_add(credit.amount);
            self.vault.liabilities = self.vault.liabilities.saturating_add(credit.amount);

            info!(
                passenger = %credit.passenger,
                flight = %settlement.flight,
                amount = credit.amount,
                "Payout credited"
            );
        }
    }

    /// Prepare and apply in one step
    pub fn settle(&mut self, flight: &FlightKey) -> Result<Settlement> {
        let settlement = self.prepare_settlement(flight)?;
        self.apply_settlement(&settlement);
        Ok(settlement)
    }

    /// Release a passenger's whole balance
    pub fn withdraw(&mut self, passenger: &Address) -> Result<Amount> {
        let amount = self.balance(passenger);
        if amount == 0 {
            return Err(SuretyError::NothingToWithdraw(passenger.clone()));
        }

        let reserves = self.vault.reserves.checked_sub(amount).ok_or_else(|| {
            warn!(passenger = %passenger, amount, reserves = self.vault.reserves, "Withdrawal exceeds reserves");
            SuretyError::InsufficientReserves {
                reserves: self.vault.reserves,
                liabilities: self.vault.liabilities,
            }
        })?;

        self.balances.remove(passenger);
        self.vault.reserves = reserves;
        self.vault.liabilities = self.vault.liabilities.saturating_sub(amount);

        info!(passenger = %passenger, amount, "Payout withdrawn");
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GovernanceConfig;
    use crate::governance::AirlineRegistry;
    use crate::types::{FlightStatus, UNIT};

    fn setup() -> (FlightRegistry, InsuranceLedger, FlightKey) {
        let mut airlines = AirlineRegistry::bootstrap(GovernanceConfig::default(), Address::from("A"));
        airlines.fund(&Address::from("A"), 10 * UNIT).unwrap();

        let mut flights = FlightRegistry::new();
        let key = FlightKey::new("A", "ND1309", 1_700_000_000);
        flights.register(&airlines, key.clone()).unwrap();

        let mut ledger = InsuranceLedger::new(InsuranceConfig::default());
        ledger.deposit(10 * UNIT);
        (flights, ledger, key)
    }

    #[test]
    fn test_buy_and_read_premium() {
        let (flights, mut ledger, key) = setup();
        let passenger = Address::from("P1");

        ledger.buy(&flights, &passenger, &key, UNIT).unwrap();
        assert_eq!(ledger.premium(&passenger, &key), UNIT);
        assert_eq!(ledger.vault().reserves, 11 * UNIT);
    }

    #[test]
    fn test_premium_above_cap_creates_nothing() {
        let (flights, mut ledger, key) = setup();
        let passenger = Address::from("P2");

        let err = ledger.buy(&flights, &passenger, &key, 2 * UNIT).unwrap_err();
        assert!(matches!(err, SuretyError::PremiumExceedsCap { .. }));
        assert!(ledger.policy(&passenger, &key).is_none());
        assert_eq!(ledger.vault().reserves, 10 * UNIT);

        let err = ledger.buy(&flights, &passenger, &key, 0).unwrap_err();
        assert!(matches!(err, SuretyError::PremiumExceedsCap { .. }));
    }

    #[test]
    fn test_one_policy_per_passenger_per_flight() {
        let (flights, mut ledger, key) = setup();
        let passenger = Address::from("P1");

        ledger.buy(&flights, &passenger, &key, UNIT / 2).unwrap();
        let err = ledger.buy(&flights, &passenger, &key, UNIT / 2).unwrap_err();
        assert!(matches!(err, SuretyError::DuplicatePolicy { .. }));
        assert_eq!(ledger.premium(&passenger, &key), UNIT / 2);
    }

    #[test]
    fn test_unknown_flight_rejected() {
        let (flights, mut ledger, _) = setup();
        let missing = FlightKey::new("A", "NOPE", 1);
        let err = ledger
            .buy(&flights, &Address::from("P1"), &missing, UNIT)
            .unwrap_err();
        assert_eq!(err, SuretyError::UnknownFlight(missing));
    }

    #[test]
    fn test_resolved_flight_rejected() {
        let (mut flights, mut ledger, key) = setup();
        flights.set_status(&key, FlightStatus::OnTime).unwrap();
        let err = ledger.buy(&flights, &Address::from("P1"), &key, UNIT).unwrap_err();
        assert_eq!(err, SuretyError::FlightResolved(key));
    }

    #[test]
    fn test_settlement_pays_once() {
        let (flights, mut ledger, key) = setup();
        let p1 = Address::from("P1");
        let p2 = Address::from("P2");
        ledger.buy(&flights, &p1, &key, UNIT).unwrap();
        ledger.buy(&flights, &p2, &key, UNIT / 2).unwrap();

        let settlement = ledger.settle(&key).unwrap();
        assert_eq!(settlement.credits.len(), 2);
        assert_eq!(ledger.balance(&p1), UNIT * 3 / 2);
        assert_eq!(ledger.balance(&p2), UNIT * 3 / 4);
        assert!(ledger.policy(&p1, &key).unwrap().paid);

        let again = ledger.settle(&key).unwrap();
        assert!(again.is_empty());
        assert_eq!(ledger.balance(&p1), UNIT * 3 / 2);
    }

    #[test]
    fn test_every_policy_is_credited_beyond_reserves() {
        let (flights, mut ledger, key) = setup();
        let passengers: Vec<Address> = (0..100).map(|n| Address::from(format!("P{n}"))).collect();
        for passenger in &passengers {
            ledger.buy(&flights, passenger, &key, UNIT).unwrap();
        }

        let settlement = ledger.settle(&key).unwrap();
        assert_eq!(settlement.credits.len(), 100);
        assert_eq!(settlement.total, 150 * UNIT);
        assert!(passengers.iter().all(|p| ledger.balance(p) == UNIT * 3 / 2));
        assert_eq!(ledger.vault().liabilities, 150 * UNIT);
        assert_eq!(ledger.vault().reserves, 110 * UNIT);
        assert_eq!(ledger.vault().free_reserves(), 0);
    }

    #[test]
    fn test_withdraw_beyond_reserves_keeps_balance() {
        let (flights, _, key) = setup();
        let mut ledger = InsuranceLedger::new(InsuranceConfig::default());
        let passenger = Address::from("P1");
        ledger.buy(&flights, &passenger, &key, UNIT).unwrap();
        ledger.settle(&key).unwrap();

        let err = ledger.withdraw(&passenger).unwrap_err();
        assert!(matches!(err, SuretyError::InsufficientReserves { .. }));
        assert_eq!(ledger.balance(&passenger), UNIT * 3 / 2);
        assert_eq!(ledger.vault().reserves, UNIT);

        ledger.deposit(UNIT);
        assert_eq!(ledger.withdraw(&passenger).unwrap(), UNIT * 3 / 2);
        assert_eq!(ledger.vault().reserves, UNIT / 2);
    }

    #[test]
    fn test_withdraw_zeroes_balance() {
        let (flights, mut ledger, key) = setup();
        let passenger = Address::from("P1");
        ledger.buy(&flights, &passenger, &key, UNIT).unwrap();
        ledger.settle(&key).unwrap();

        assert_eq!(ledger.withdraw(&passenger).unwrap(), UNIT * 3 / 2);
        assert_eq!(ledger.balance(&passenger), 0);
        assert_eq!(ledger.vault().liabilities, 0);
        assert_eq!(ledger.vault().reserves, 11 * UNIT - UNIT * 3 / 2);
        assert_eq!(
            ledger.withdraw(&passenger),
            Err(SuretyError::NothingToWithdraw(passenger))
        );
    }
}
