//! # Example: dashboard
//!
//! Renders a dashboard placeholder right away and delivers the real content once
//! four independent lookups have finished. One lookup fails on every other run.
//!
//! Demonstrates how to:
//! - Install a sized, span-propagating executor as the process default.
//! - Submit independent tasks and hand their promises to an [`OutcomeHandler`].
//! - Receive the single published outcome through a [`BroadcastNotifier`] subscription.
//!
//! ## Flow
//! ```text
//! main ──► set_global(max_workers = 4, SpanPropagation)
//!      ├─► submit(users) submit(orders) submit(revenue) submit(alerts)
//!      ├─► OutcomeHandler::launch()  ─► prints "Loading..."
//!      └─► subscription.blocking_recv()
//!             └─► prints the success table or the failure message
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=framevisor=debug cargo run --example dashboard
//! ```

use std::thread;
use std::time::Duration;

use framevisor::executor::{self, SpanPropagation};
use framevisor::{
    BoundedExecutor, BroadcastNotifier, ExecutorBuilder, ExecutorConfig, HandlerError, OutcomeHandler, Promise,
    TaskError,
};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct Tile {
    name: &'static str,
    value: String,
}

fn lookup(
    exec: &BoundedExecutor,
    name: &'static str,
    delay_ms: u64,
    fail: bool,
) -> anyhow::Result<Promise<Tile>> {
    let promise = exec.submit(move || {
        let _span = tracing::info_span!("lookup", tile = name).entered();
        thread::sleep(Duration::from_millis(delay_ms));
        if fail {
            tracing::warn!("backend timed out");
            return Err(TaskError::fail(format!("{name} backend timed out")));
        }
        tracing::info!("loaded");
        Ok(Tile {
            name,
            value: format!("{}", delay_ms * 7),
        })
    })?;
    Ok(promise)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Size the process default and carry the caller's span into every task
    let cfg = ExecutorConfig {
        max_workers: 4,
        max_queue_depth: 16,
        ..ExecutorConfig::default()
    };
    let exec = ExecutorBuilder::new(cfg).hook(SpanPropagation).build();
    executor::set_global(exec.clone());

    // 2. Fail on odd seconds to show both outcomes
    let fail_alerts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs()
        % 2
        == 1;

    let request = tracing::info_span!("request", page = "dashboard");
    let _guard = request.enter();

    let promises = vec![
        lookup(&exec, "users", 120, false)?,
        lookup(&exec, "orders", 60, false)?,
        lookup(&exec, "revenue", 200, false)?,
        lookup(&exec, "alerts", 90, fail_alerts)?,
    ];

    // 3. Wire the handler and subscribe before launching
    let bus = BroadcastNotifier::default();
    let handler = OutcomeHandler::new("dashboard", bus.clone())
        .on_loading(|| "[ dashboard: loading... ]")
        .on_success(|tiles: &[Tile]| {
            tiles
                .iter()
                .map(|t| format!("{:>8}: {}", t.name, t.value))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .on_failure(|err: &HandlerError| format!("[ dashboard unavailable: {err} ]"));
    let mut subscription = bus.subscribe(handler.channel_id());

    let frame = handler.launch(promises);
    println!("{}", frame.loading);

    // 4. Wait for the single outcome
    match subscription.blocking_recv() {
        Some(outcome) => println!("{} (#{})\n{}", outcome.target, outcome.seq, outcome.payload),
        None => anyhow::bail!("notifier closed before the outcome arrived"),
    }
    println!("final state: {}", frame.status.state().as_label());

    exec.shutdown();
    exec.wait_for_termination(Duration::from_secs(1));
    Ok(())
}
