//! Switchboard - intent routing and live-data orchestration core
//!
//! Standalone entry point: a line-oriented console loop over the router,
//! used for local development against real or stubbed backends. Production
//! deployments embed the library and drive [`switchboard::Router`] from
//! their own transport.

use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

use switchboard::auth::{Role, UserContext};
use switchboard::{logging, AppState, Args};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init(&args.log_level);

    let state = match AppState::new(&args) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("startup failed: {e}");
            std::process::exit(1);
        }
    };

    info!("======================================");
    info!("  Switchboard - agency assistant core");
    info!("======================================");
    info!("Case registry: {}", args.case_registry_url);
    info!(
        "Ledger: {}",
        if args.ledger_enabled { "enabled" } else { "disabled" }
    );
    info!("Fetch timeout: {}ms", args.fetch_timeout_ms);
    info!("Cache ceiling: {} entries", args.cache_max_entries);
    info!("======================================");

    if let Err(e) = console_loop(state).await {
        error!("console loop failed: {e}");
        std::process::exit(1);
    }
}

/// Development console: each line is routed as the current user. `:role` and
/// `:id` switch the simulated session; `:stats` prints cache counters.
async fn console_loop(state: Arc<AppState>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut user = UserContext::guest();

    stdout
        .write_all(b"switchboard console. :role <name>, :id <national_id>, :stats, :quit\n> ")
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line.split_once(' ') {
            _ if line.is_empty() => {}
            _ if line == ":quit" => break,
            _ if line == ":stats" => {
                let stats = state.cache.stats();
                stdout
                    .write_all(
                        format!(
                            "entries={} hits={} misses={} evictions={}\n",
                            stats.entry_count,
                            stats.hit_count,
                            stats.miss_count,
                            stats.eviction_count
                        )
                        .as_bytes(),
                    )
                    .await?;
            }
            Some((":role", value)) => {
                user.role = parse_role(value);
                user.authenticated = user.role != Role::Guest;
                stdout
                    .write_all(format!("role set to {}\n", user.role).as_bytes())
                    .await?;
            }
            Some((":id", value)) => {
                user.national_id = Some(value.to_string());
                user.user_id = Some(value.to_string());
                stdout.write_all(b"identifier set\n").await?;
            }
            _ => {
                let result = state.router.route(line, &user, None).await;
                stdout
                    .write_all(
                        format!(
                            "[{:?} intent={} confidence={:.2} cache_hit={}]\n{}\n",
                            result.source,
                            result.intent,
                            result.confidence,
                            result.cache_hit,
                            result.payload
                        )
                        .as_bytes(),
                    )
                    .await?;
            }
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    Ok(())
}

fn parse_role(value: &str) -> Role {
    match value.trim() {
        "beneficiary" => Role::Beneficiary,
        "employer" => Role::Employer,
        "supplier" => Role::Supplier,
        "staff" => Role::Staff,
        _ => Role::Guest,
    }
}
