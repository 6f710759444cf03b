//! # Reduceur
//!
//! Typed reducers from named event handlers. Handlers mutate a copy-on-write
//! draft; the reducer stays a pure `(state, event) -> state` function.
//!
//! ## Core Concepts
//!
//! - [`Event`] = a tagged value (`{ "type": "changed", ...payload }`)
//! - [`HandlerRegistry`] = tag → handler, plus an optional `"*"` wildcard
//! - [`Draft`] = scoped mutable view over the current state
//! - [`Reducer`] = factory of registries, exposed as `dispatch(state, event)`
//!
//! The key principle: **one dispatch = one draft = one handler**. The draft is
//! opened over the caller's state, the factory builds the handlers around it,
//! exactly one handler runs, and the draft becomes the next state only if that
//! handler succeeds.
//!
//! ## Architecture
//!
//! ```text
//! dispatch(&state, event)
//!     │
//!     ▼ Draft::new(&state)
//! factory(&draft) ──► HandlerRegistry
//!     │
//!     ▼ resolve(event.tag())
//!     ├─► exact tag ─────┐
//!     ├─► wildcard "*" ──┤
//!     └─► nothing ───────┼──► Err(Unmatched { tag })
//!                        ▼
//!               handler(event.into_payload())
//!                        │
//!          Ok ───────────┴──────────── Err
//!           │                           │
//!           ▼                           ▼
//!   draft.finish() → next state   draft dropped, Err(Handler)
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Dispatch is pure** - The input state is never mutated
//! 2. **No partial commits** - A failed handler leaves nothing behind
//! 3. **One handler per dispatch** - Exact match, else wildcard, else error
//! 4. **No retained state** - Registries and drafts live for one call
//! 5. **Tags are unique** - Duplicates are definition errors
//!
//! ## Two Surfaces
//!
//! String-tagged events use [`DynamicEvent`], payloads decoded with serde, and
//! creator tables discovered from the factory ([`Reducer::creators`]).
//!
//! Statically typed events use [`events!`], which generates the enum, its
//! `create_<tag>` creators, `on_<tag>` handler registration and `send_<tag>`
//! senders. Payload types line up at compile time.
//!
//! ## Example
//!
//! ```ignore
//! use reduceur_core::{events, reducer};
//!
//! // 1. Declare events (tag + payload)
//! events! {
//!     #[derive(Debug, Clone)]
//!     pub enum CounterEvent {
//!         incremented,
//!         changed(Changed),
//!     }
//! }
//!
//! // 2. Define the reducer over your state
//! let counter = reducer::<Counter>().define(|draft| {
//!     CounterEvent::handlers()
//!         .on_incremented(move || draft.write(|s| s.count += 1))
//!         .on_changed(move |p| draft.write(|s| s.count = p.new_count))
//! });
//!
//! // 3. Dispatch
//! let next = counter.dispatch(&state, CounterEvent::create_incremented())?;
//!
//! // 4. Or hand the events to whatever owns the state
//! let ui = counter.connect(|event| store.send(event));
//! ui.send_incremented();
//! ```
//!
//! ## What This Is Not
//!
//! Reduceur is **not**:
//! - A store or state container
//! - A middleware pipeline
//! - An effect runner
//! - A way to combine reducers
//!
//! Reduceur **is**:
//! > A convenient, checked way to write reducers as named handlers over a
//! > copy-on-write draft.

// Core modules
mod connect;
mod creators;
mod draft;
mod error;
mod event;
mod events_macro;
mod reducer;
mod registry;

pub mod naming;


// Re-export event types
pub use event::{DynamicEvent, Event, Payload, TAG_FIELD, WILDCARD};

// Re-export draft and registry types
pub use draft::Draft;
pub use registry::{HandlerRegistry, Resolution};

// Re-export reducer types (primary entry point)
pub use reducer::{reducer, Reducer, ReducerBuilder, ReducerOptions};

// Re-export derived function types
pub use connect::{Connected, Sender};
pub use creators::{ConnectedCreators, EventCreator, EventCreators, EventSender};

// Re-export error types
pub use error::{DefinitionError, DispatchError, EventError, HandlerError, HandlerOutput};

#[doc(hidden)]
pub mod __private {
    pub use paste::paste;
}
