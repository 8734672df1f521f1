//! Insurance Ledger
//!
//! Capped, non-amendable policies keyed by (passenger, flight), pull-payment
//! settlement for airline-caused delays, and the reserve vault that backs
//! credited payouts.

mod ledger;
mod policy;

pub use ledger::{InsuranceLedger, Settlement, Vault};
pub use policy::{InsurancePolicy, PayoutCredit};
