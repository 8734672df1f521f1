//! Oracle Registry
//!
//! Admits reporters against an exact registration fee and assigns each a
//! fixed set of distinct indexes used to filter which status requests it may
//! answer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::OracleConfig;
use crate::error::{Result, SuretyError};
use crate::oracle::indexes::IndexDrawer;
use crate::types::{Address, Amount};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleAccount {
    pub address: Address,
    /// Assigned at registration, never changed
    pub indexes: Vec<u8>,
    pub fee_paid: Amount,
    pub registered_at: DateTime<Utc>,
}

impl OracleAccount {
    pub fn holds(&self, index: u8) -> bool {
        self.indexes.contains(&index)
    }
}

#[derive(Debug, Clone)]
pub struct OracleRegistry {
    config: OracleConfig,
    drawer: IndexDrawer,
    oracles: HashMap<Address, OracleAccount>,
}

impl OracleRegistry {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            drawer: IndexDrawer::new(config.index_range),
            config,
            oracles: HashMap::new(),
        }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }

    pub fn get(&self, address: &Address) -> Option<&OracleAccount> {
        self.oracles.get(address)
    }

    pub fn is_registered(&self, address: &Address) -> bool {
        self.oracles.contains_key(address)
    }

    /// Register `caller` paying `fee`, which must equal the configured fee
    pub fn register(&mut self, caller: &Address, fee: Amount) -> Result<&OracleAccount> {
        if fee != self.config.registration_fee {
            warn!(oracle = %caller, fee, required = self.config.registration_fee, "Oracle registration fee mismatch");
            return Err(SuretyError::InsufficientFee {
                required: self.config.registration_fee,
                provided: fee,
            });
        }

        if self.oracles.contains_key(caller) {
            return Err(SuretyError::DuplicateRegistration(caller.clone()));
        }

        let indexes = self
            .drawer
            .draw_distinct(caller.as_bytes(), self.config.indexes_per_oracle);

        info!(oracle = %caller, ?indexes, "Oracle registered");

        let account = self
            .oracles
            .entry(caller.clone())
            .or_insert_with(|| OracleAccount {
                address: caller.clone(),
                indexes,
                fee_paid: fee,
                registered_at: Utc::now(),
            });
        Ok(&*account)
    }

    /// Indexes assigned to `caller`
    pub fn indexes_of(&self, caller: &Address) -> Result<&[u8]> {
        self.oracles
            .get(caller)
            .map(|account| account.indexes.as_slice())
            .ok_or_else(|| SuretyError::NotRegistered(caller.clone()))
    }

    /// Check that `caller` is registered and holds `index`
    pub fn authorize_response(&self, caller: &Address, index: u8) -> Result<()> {
        let account = self
            .oracles
            .get(caller)
            .ok_or_else(|| SuretyError::NotRegistered(caller.clone()))?;

        if !account.holds(index) {
            debug!(oracle = %caller, index, indexes = ?account.indexes, "Response index not assigned to oracle");
            return Err(SuretyError::IndexMismatch {
                oracle: caller.clone(),
                index,
            });
        }

        Ok(())
    }

    /// Index the next status request from `requester` would target
    pub fn peek_request_index(&self, requester: &Address) -> u8 {
        self.drawer.peek(requester.as_bytes())
    }

    /// Commit the request draw previewed by `peek_request_index`
    pub fn commit_request_index(&mut self, requester: &Address) -> u8 {
        self.drawer.draw(requester.as_bytes())
    }
}
