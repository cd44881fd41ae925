//! tickview - headless session host.
//!
//! Loads configuration, starts a session, logs the derived view after each
//! cycle and stops cleanly on Ctrl-C.

use anyhow::Result;
use clap::Parser;
use tickview::config::{ConfigSource, TOKEN_ENV};
use tickview::{AppConfig, Session, SessionContext, SessionSnapshot};
use tracing::{debug, info, warn};

/// Live quote sync and analytics engine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TICKVIEW_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before any wss:// connection
    tickview_ws::init_crypto();

    let args = Args::parse();
    let (config, source) = AppConfig::load(args.config.as_deref())?;

    tickview_telemetry::init_logging(Some(&config.telemetry.log_level))?;
    info!("Starting tickview v{}", env!("CARGO_PKG_VERSION"));
    match &source {
        ConfigSource::File(path) => info!(path = %path, "Configuration file loaded"),
        ConfigSource::Defaults { missing } => {
            warn!(path = %missing, "Config file not found, using defaults")
        }
    }
    info!(api_url = %config.api_url, push = ?config.push.url, "Configuration loaded");

    let token = std::env::var(TOKEN_ENV).ok();
    let context = SessionContext::new(token, config.session.role);
    let authenticated = context.is_authenticated();

    let handle = Session::start(&config, context)?;

    if authenticated {
        match handle.refresh_portfolio().await {
            Ok(pv) => info!(total_value = %pv.total_value, positions = pv.positions.len(), "Portfolio loaded"),
            Err(e) => warn!(error = %e, "Portfolio unavailable"),
        }
    }

    let mut snapshots = handle.subscribe();
    let mut last_cycle = 0u64;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.cycle != last_cycle {
                    last_cycle = snapshot.cycle;
                    log_view(&snapshot);
                }
            }
        }
    }

    handle.stop().await;
    Ok(())
}

fn log_view(snapshot: &SessionSnapshot) {
    info!(
        cycle = snapshot.cycle,
        transport = %snapshot.transport,
        instruments = snapshot.view.len(),
        "Quotes updated"
    );
    for row in &snapshot.view {
        debug!(
            symbol = %row.symbol,
            price = %row.price,
            change_pct = %row.percent_change.round_dp(2),
            direction = %row.direction,
            "View row"
        );
    }
    if let Some(pv) = &snapshot.portfolio {
        info!(
            total_value = %pv.total_value.round_dp(2),
            unrealized_pl = %pv.total_unrealized_pl.round_dp(2),
            "Portfolio valued"
        );
    }
}
