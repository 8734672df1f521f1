use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tracing::{Level, info, warn};
use tracing_subscriber::fmt::format::FmtSpan;

use flight_surety::{SuretyConfig, SuretyEngine, SuretyEvent};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first - validation failures abort startup
    let config = SuretyConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        eprintln!("Please check SURETY_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!("Starting flight surety node");
    if config.owner_is_default() {
        warn!(
            owner = %config.owner,
            "Using default controller address; set SURETY_OWNER to override"
        );
    }
    info!(
        "Governance: consensus_threshold={}, approval_percent={}, funding_threshold={}",
        config.governance.consensus_threshold,
        config.governance.approval_percent,
        config.governance.funding_threshold
    );
    info!(
        "Oracles: fee={}, index_range={}, indexes_per_oracle={}, quorum={}",
        config.oracle.registration_fee,
        config.oracle.index_range,
        config.oracle.indexes_per_oracle,
        config.oracle.quorum
    );

    let engine = SuretyEngine::new(config.clone())?;
    let mut events = engine.subscribe();

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    if config.logging.log_events {
                        log_event(&event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event log fell behind; events skipped");
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Flight surety node stopped");
    Ok(())
}

fn init_logging(config: &SuretyConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(if config.logging.log_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

fn log_event(event: &SuretyEvent) {
    match serde_json::to_string(event) {
        Ok(json) => info!(event = event.name(), "{}", json),
        Err(e) => warn!(event = event.name(), "Failed to serialize event: {}", e),
    }
}
