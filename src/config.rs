use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

use crate::types::{Address, Amount, UNIT};

/// Basis-point denominator for payout multipliers
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Configuration for the surety engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuretyConfig {
    /// Controller allowed to flip the operational gate; also the bootstrap airline
    pub owner: Address,
    /// Airline admission and funding rules
    pub governance: GovernanceConfig,
    /// Policy underwriting rules
    pub insurance: InsuranceConfig,
    /// Oracle admission and quorum rules
    pub oracle: OracleConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Registered airlines below which registration needs no votes
    pub consensus_threshold: usize,
    /// Percentage of registered airlines whose votes admit a candidate (rounded up)
    pub approval_percent: u32,
    /// Stake at which a registered airline becomes operational
    pub funding_threshold: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceConfig {
    /// Maximum premium for a single policy
    pub premium_cap: Amount,
    /// Payout multiplier in basis points (15_000 = 1.5x)
    pub payout_multiplier_bps: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Exact fee an oracle pays to register
    pub registration_fee: Amount,
    /// Number of index buckets (indexes are drawn from 0..index_range)
    pub index_range: u8,
    /// Distinct indexes assigned to each oracle
    pub indexes_per_oracle: usize,
    /// Matching responses required to finalize a status request
    pub quorum: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Emit span open/close events
    pub log_spans: bool,
    /// Log every published engine event
    pub log_events: bool,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            consensus_threshold: 4,
            approval_percent: 50,
            funding_threshold: 10 * UNIT,
        }
    }
}

impl Default for InsuranceConfig {
    fn default() -> Self {
        Self {
            premium_cap: UNIT,
            payout_multiplier_bps: 15_000,
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            registration_fee: UNIT,
            index_range: 10,
            indexes_per_oracle: 3,
            quorum: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_spans: false,
            log_events: true,
        }
    }
}

impl Default for SuretyConfig {
    fn default() -> Self {
        Self {
            owner: Address::from("0x0000000000000000000000000000000000000001"),
            governance: GovernanceConfig::default(),
            insurance: InsuranceConfig::default(),
            oracle: OracleConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GovernanceConfig {
    /// Votes needed to admit a candidate when `registered` airlines exist
    pub fn required_votes(&self, registered: usize) -> usize {
        let scaled = registered * self.approval_percent as usize;
        scaled.div_ceil(100).max(1)
    }
}

impl InsuranceConfig {
    /// Credit owed for a payable delay on a policy with `premium`
    pub fn payout_for(&self, premium: Amount) -> Option<Amount> {
        premium
            .checked_mul(self.payout_multiplier_bps)
            .map(|scaled| scaled / BPS_DENOMINATOR)
    }
}

impl SuretyConfig {
    /// Create a default config controlled by `owner`
    pub fn with_owner(owner: impl Into<Address>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    /// Whether the gate controller is still the built-in placeholder address
    pub fn owner_is_default(&self) -> bool {
        self.owner == Self::default().owner
    }

    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(owner) = env::var("SURETY_OWNER") {
            config.owner = Address::from(owner);
        }

        // Governance
        if let Ok(threshold) = env::var("SURETY_CONSENSUS_THRESHOLD") {
            config.governance.consensus_threshold = threshold
                .parse()
                .context("Invalid SURETY_CONSENSUS_THRESHOLD value")?;
        }

        if let Ok(percent) = env::var("SURETY_APPROVAL_PERCENT") {
            config.governance.approval_percent = percent
                .parse()
                .context("Invalid SURETY_APPROVAL_PERCENT value")?;
        }

        if let Ok(funding) = env::var("SURETY_FUNDING_THRESHOLD") {
            config.governance.funding_threshold = funding
                .parse()
                .context("Invalid SURETY_FUNDING_THRESHOLD value")?;
        }

        // Insurance
        if let Ok(cap) = env::var("SURETY_PREMIUM_CAP") {
            config.insurance.premium_cap =
                cap.parse().context("Invalid SURETY_PREMIUM_CAP value")?;
        }

        if let Ok(bps) = env::var("SURETY_PAYOUT_MULTIPLIER_BPS") {
            config.insurance.payout_multiplier_bps = bps
                .parse()
                .context("Invalid SURETY_PAYOUT_MULTIPLIER_BPS value")?;
        }

        // Oracles
        if let Ok(fee) = env::var("SURETY_ORACLE_FEE") {
            config.oracle.registration_fee =
                fee.parse().context("Invalid SURETY_ORACLE_FEE value")?;
        }

        if let Ok(range) = env::var("SURETY_INDEX_RANGE") {
            config.oracle.index_range =
                range.parse().context("Invalid SURETY_INDEX_RANGE value")?;
        }

        if let Ok(count) = env::var("SURETY_INDEXES_PER_ORACLE") {
            config.oracle.indexes_per_oracle = count
                .parse()
                .context("Invalid SURETY_INDEXES_PER_ORACLE value")?;
        }

        if let Ok(quorum) = env::var("SURETY_QUORUM") {
            config.oracle.quorum = quorum.parse().context("Invalid SURETY_QUORUM value")?;
        }

        // Logging
        if let Ok(level) = env::var("SURETY_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(spans) = env::var("SURETY_LOG_SPANS") {
            config.logging.log_spans = spans.parse().context("Invalid SURETY_LOG_SPANS value")?;
        }

        if let Ok(events) = env::var("SURETY_LOG_EVENTS") {
            config.logging.log_events =
                events.parse().context("Invalid SURETY_LOG_EVENTS value")?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Reject configurations the engine cannot operate under
    pub fn validate(&self) -> Result<()> {
        if self.owner.as_str().is_empty() {
            return Err(anyhow::anyhow!("Owner address cannot be empty"));
        }

        if self.governance.approval_percent == 0 || self.governance.approval_percent > 100 {
            return Err(anyhow::anyhow!(
                "Approval percent must be within 1..=100, got {}",
                self.governance.approval_percent
            ));
        }

        if self.governance.funding_threshold == 0 {
            return Err(anyhow::anyhow!("Funding threshold must be non-zero"));
        }

        if self.insurance.premium_cap == 0 {
            return Err(anyhow::anyhow!("Premium cap must be non-zero"));
        }

        if self.insurance.payout_multiplier_bps < BPS_DENOMINATOR {
            return Err(anyhow::anyhow!(
                "Payout multiplier must be at least 1x ({} bps), got {}",
                BPS_DENOMINATOR,
                self.insurance.payout_multiplier_bps
            ));
        }

        if self.oracle.registration_fee == 0 {
            return Err(anyhow::anyhow!("Oracle registration fee must be non-zero"));
        }

        if self.oracle.index_range == 0 {
            return Err(anyhow::anyhow!("Index range must be non-zero"));
        }

        if self.oracle.indexes_per_oracle == 0
            || self.oracle.indexes_per_oracle > self.oracle.index_range as usize
        {
            return Err(anyhow::anyhow!(
                "Indexes per oracle must be within 1..={}, got {}",
                self.oracle.index_range,
                self.oracle.indexes_per_oracle
            ));
        }

        if self.oracle.quorum == 0 {
            return Err(anyhow::anyhow!("Response quorum must be at least 1"));
        }

        Ok(())
    }
}
