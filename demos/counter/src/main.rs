//! # Counter Example
//!
//! A typed reducer driven by a store task. The UI side only holds the
//! connected senders; the task owns the state and applies each event.

use std::sync::Arc;

use anyhow::{ensure, Result};
use reduceur_core::{events, reducer, Draft, HandlerRegistry, Reducer};
use tokio::sync::mpsc;
use tracing::{info, warn};

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Changed {
    new_count: i64,
}

events! {
    #[derive(Debug, Clone, PartialEq)]
    enum CounterEvent {
        /// Add one.
        incremented,
        /// Subtract one.
        decremented,
        /// Set the count directly. Negative counts are refused.
        changed(Changed),
    }
}

// ============================================================================
// State + Reducer
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Counter {
    count: i64,
}

fn counter_reducer() -> Reducer<
    Counter,
    CounterEvent,
    impl for<'d, 's> Fn(&'d Draft<'s, Counter>) -> HandlerRegistry<'d, CounterEvent>,
> {
    reducer::<Counter>().name("counter").define(|draft| {
        CounterEvent::handlers()
            .on_incremented(move || draft.write(|s| s.count += 1))
            .on_decremented(move || draft.write(|s| s.count -= 1))
            .on_changed(move |p| -> Result<()> {
                ensure!(p.new_count >= 0, "count cannot go negative (got {})", p.new_count);
                draft.write(|s| s.count = p.new_count);
                Ok(())
            })
    })
}

// ============================================================================
// Store
// ============================================================================

/// Owns the counter until every sender is gone.
async fn run_store<F>(
    counter: Arc<Reducer<Counter, CounterEvent, F>>,
    mut events: mpsc::UnboundedReceiver<CounterEvent>,
) -> Counter
where
    F: for<'d, 's> Fn(&'d Draft<'s, Counter>) -> HandlerRegistry<'d, CounterEvent>
        + Send
        + Sync
        + 'static,
{
    let mut state = Counter::default();
    while let Some(event) = events.recv().await {
        match counter.apply(&mut state, event) {
            Ok(()) => info!(count = state.count, "state updated"),
            Err(error) => warn!(%error, count = state.count, "event rejected"),
        }
    }
    state
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let counter = Arc::new(counter_reducer());
    let (tx, rx) = mpsc::unbounded_channel();
    let store = tokio::spawn(run_store(Arc::clone(&counter), rx));

    let ui = counter.connect(move |event: CounterEvent| {
        if tx.send(event).is_err() {
            warn!("store has shut down, event dropped");
        }
    });

    ui.send_incremented();
    ui.send_incremented();
    ui.send_decremented();
    ui.send_changed(Changed { new_count: 11111 });
    ui.send_changed(Changed { new_count: -1 });

    // Closing the channel ends the store task.
    drop(ui);

    let state = store.await?;
    info!(count = state.count, "store closed");
    ensure!(state.count == 11111, "unexpected final count {}", state.count);

    Ok(())
}
