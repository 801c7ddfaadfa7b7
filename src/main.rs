//! promo-watch: one pass over every loyalty program with watchers:
//! fetch offers, evaluate them for today, email what matched.

use std::process::ExitCode;

use promo_watch::clock::{Clock, SystemClock};
use promo_watch::config::load_watch_config_default;
use promo_watch::engine::evaluate_all;
use promo_watch::feed::provider_for;
use promo_watch::model::Program;
use promo_watch::notify::{self, Report};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "engine=info,feed=info,notify=info,warn";

/// Compact logs by default; `PROMO_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("PROMO_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = match load_watch_config_default() {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "cannot load watch list");
            return ExitCode::FAILURE;
        }
    };

    let clock = SystemClock;
    let notifier = notify::from_env();
    let mut failed = false;

    for program in [Program::Livelo, Program::Esfera] {
        let watch = config.for_program(program);
        if watch.is_empty() {
            info!(%program, "no watchers; skipping program");
            continue;
        }

        let provider = provider_for(program);
        let offers = match provider.fetch_offers(watch).await {
            Ok(o) => o,
            Err(e) => {
                error!(%program, error = ?e, "feed unusable; aborting program run");
                failed = true;
                continue;
            }
        };

        let outcome = evaluate_all(&offers, watch, &clock);
        info!(
            %program,
            offers = offers.len(),
            evaluated = outcome.decisions.len(),
            matched = outcome.matches().count(),
            skipped = outcome.skipped.len(),
            "run finished"
        );

        let matches: Vec<_> = outcome.matches().collect();
        let report = Report::compose(program, clock.today(), &matches);
        if let Err(e) = notify::deliver(notifier.as_ref(), &report).await {
            warn!(%program, error = ?e, "notification failed");
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
