//! Operational Gate
//!
//! Process-wide switch checked first by every mutating call. Only the
//! designated controller may flip it; reads are never gated.

use tracing::{debug, info, warn};

use crate::error::{Result, SuretyError};
use crate::types::Address;

#[derive(Debug, Clone)]
pub struct OperationalGate {
    controller: Address,
    operational: bool,
}

impl OperationalGate {
    pub fn new(controller: Address) -> Self {
        Self {
            controller,
            operational: true,
        }
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn controller(&self) -> &Address {
        &self.controller
    }

    /// Fail with `Operationality` when the gate is closed
    pub fn ensure_operational(&self) -> Result<()> {
        if self.operational {
            Ok(())
        } else {
            Err(SuretyError::Operationality)
        }
    }

    /// Flip the gate. Returns whether the value actually changed.
    pub fn set_operational(&mut self, caller: &Address, operational: bool) -> Result<bool> {
        if caller != &self.controller {
            warn!(caller = %caller, "Rejected operational status change from non-controller");
            return Err(SuretyError::Unauthorized {
                caller: caller.clone(),
                reason: "only the contract owner may change operational status",
            });
        }

        if self.operational == operational {
            debug!(operational, "Operational status unchanged");
            return Ok(false);
        }

        self.operational = operational;
        info!(operational, "Operational status changed");
        Ok(true)
    }
}
