//! # Todo JSON Example
//!
//! String-tagged events read as JSON lines. Payloads are decoded per handler,
//! unknown tags land in the wildcard, and follow-up events are built through
//! the creators derived from the reducer.

use std::cell::RefCell;
use std::sync::Arc;

use anyhow::{anyhow, ensure, Context, Result};
use reduceur_core::{reducer, Draft, DynamicEvent, HandlerRegistry, Reducer};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

const SCRIPT: &str = r#"
{"type": "added", "id": 1, "title": "write the reducer"}
{"type": "added", "id": 2, "title": "write the tests"}
{"type": "toggled", "id": 1}
{"type": "added", "id": 1, "title": "duplicate id"}
{"type": "archived", "id": 2}
{"type": "removed", "id": 7}
{"type": "toggled", "id": "two"}
"#;

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Todo {
    id: u32,
    title: String,
    done: bool,
}

#[derive(Debug, Clone, Default)]
struct Todos {
    items: Arc<Vec<Todo>>,
    /// Events no handler knew about.
    unknown: u32,
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct Added {
    id: u32,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ById {
    id: u32,
}

// ============================================================================
// Reducer
// ============================================================================

fn position(draft: &Draft<'_, Todos>, id: u32) -> Result<usize> {
    draft
        .read(|s| s.items.iter().position(|todo| todo.id == id))
        .ok_or_else(|| anyhow!("no todo with id {id}"))
}

fn todo_reducer() -> Reducer<
    Todos,
    DynamicEvent,
    impl for<'d, 's> Fn(&'d Draft<'s, Todos>) -> HandlerRegistry<'d, DynamicEvent>,
> {
    reducer::<Todos>().name("todos").define(|draft| {
        DynamicEvent::handlers()
            .on_with("added", move |p: Added| -> Result<()> {
                ensure!(position(draft, p.id).is_err(), "todo {} already exists", p.id);
                draft.write(|s| {
                    Arc::make_mut(&mut s.items).push(Todo {
                        id: p.id,
                        title: p.title,
                        done: false,
                    })
                });
                Ok(())
            })
            .on_with("toggled", move |p: ById| -> Result<()> {
                let index = position(draft, p.id)?;
                draft.write(|s| {
                    let todo = &mut Arc::make_mut(&mut s.items)[index];
                    todo.done = !todo.done;
                });
                Ok(())
            })
            .on_with("removed", move |p: ById| -> Result<()> {
                let index = position(draft, p.id)?;
                draft.write(|s| Arc::make_mut(&mut s.items).remove(index));
                Ok(())
            })
            .on("cleared", move |_| {
                draft.write(|s| Arc::make_mut(&mut s.items).retain(|todo| !todo.done))
            })
            .wildcard(move |_| draft.write(|s| s.unknown += 1))
    })
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let todos = todo_reducer();
    let mut state = Todos::default();

    for line in SCRIPT.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let event: DynamicEvent = serde_json::from_str(line)?;
        let tag = event.tag().to_owned();
        match todos.apply(&mut state, event) {
            Ok(()) => info!(%tag, items = state.items.len(), unknown = state.unknown, "applied"),
            Err(error) => warn!(%error, "rejected"),
        }
    }

    let creators = todos.creators()?;
    info!(names = ?creators.names().collect::<Vec<_>>(), "derived creators");

    let added = creators
        .by_name("createAdded")
        .context("no createAdded creator")?
        .create_with(&json!({ "id": 3, "title": "ship it" }))?;
    todos.apply(&mut state, added)?;

    // Connected senders queue into an outbox that is drained afterwards.
    let outbox = RefCell::new(Vec::new());
    let ui = creators.connect(|event: DynamicEvent| outbox.borrow_mut().push(event));
    ui.by_name("sendToggled")
        .context("no sendToggled sender")?
        .send_with(&json!({ "id": 3 }))?;
    ui.by_name("sendCleared")
        .context("no sendCleared sender")?
        .send();
    drop(ui);

    for event in outbox.into_inner() {
        todos.apply(&mut state, event)?;
    }

    println!("{}", serde_json::to_string_pretty(&*state.items)?);
    info!(unknown = state.unknown, "done");

    Ok(())
}
