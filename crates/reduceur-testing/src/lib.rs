//! Testing utilities for reduceur.
//!
//! - [`TestStore`] owns a state and applies every event it is sent, the way a
//!   UI state hook would (`send = e => state = dispatch(state, e)`).
//! - [`RecordingSender`] collects sent events for assertions.
//! - [`dispatch_all`] folds a sequence of events through a reducer.

use std::cell::RefCell;
use std::sync::{Arc, Mutex, PoisonError};

use reduceur_core::{Connected, DispatchError, Draft, Event, HandlerRegistry, Reducer};
use tracing::warn;

/// Dispatch `events` in order, starting from `initial`.
///
/// Stops at the first failing event.
pub fn dispatch_all<S, E, F, I>(
    reducer: &Reducer<S, E, F>,
    initial: &S,
    events: I,
) -> Result<S, DispatchError>
where
    S: Clone,
    E: Event,
    F: for<'d, 's> Fn(&'d Draft<'s, S>) -> HandlerRegistry<'d, E>,
    I: IntoIterator<Item = E>,
{
    let mut state = initial.clone();
    for event in events {
        reducer.apply(&mut state, event)?;
    }
    Ok(state)
}

/// An external state owner driven through a reducer.
///
/// Failed dispatches leave the state as it was and are kept for inspection.
pub struct TestStore<'r, S, E, F> {
    reducer: &'r Reducer<S, E, F>,
    state: RefCell<S>,
    dispatched: RefCell<Vec<String>>,
    failures: RefCell<Vec<DispatchError>>,
}

impl<'r, S, E, F> TestStore<'r, S, E, F>
where
    S: Clone,
    E: Event,
    F: for<'d, 's> Fn(&'d Draft<'s, S>) -> HandlerRegistry<'d, E>,
{
    pub fn new(reducer: &'r Reducer<S, E, F>, initial: S) -> Self {
        Self {
            reducer,
            state: RefCell::new(initial),
            dispatched: RefCell::new(Vec::new()),
            failures: RefCell::new(Vec::new()),
        }
    }

    pub fn send(&self, event: E) {
        let tag = event.tag().to_owned();
        let result = self.reducer.dispatch(&self.state.borrow(), event);
        match result {
            Ok(next) => {
                *self.state.borrow_mut() = next;
                self.dispatched.borrow_mut().push(tag);
            }
            Err(error) => {
                warn!(%tag, %error, "test store rejected event");
                self.failures.borrow_mut().push(error);
            }
        }
    }

    /// A `send` callback bound to this store.
    pub fn sender(&self) -> impl Fn(E) + '_ {
        move |event| self.send(event)
    }

    /// The reducer's connected senders, wired to this store.
    pub fn connect(&self) -> Connected<E, impl Fn(E) + '_> {
        self.reducer.connect(self.sender())
    }

    pub fn state(&self) -> S {
        self.state.borrow().clone()
    }

    /// Tags of successfully applied events, in order.
    pub fn dispatched(&self) -> Vec<String> {
        self.dispatched.borrow().clone()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.borrow().len()
    }

    pub fn take_failures(&self) -> Vec<DispatchError> {
        std::mem::take(&mut *self.failures.borrow_mut())
    }
}

/// Thread-safe recorder of sent events.
#[derive(Debug)]
pub struct RecordingSender<E> {
    events: Arc<Mutex<Vec<E>>>,
}

impl<E> RecordingSender<E> {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A `send` callback appending to this recorder.
    pub fn sender(&self) -> impl Fn(E) + Clone + Send + Sync + 'static
    where
        E: Send + 'static,
    {
        let events = Arc::clone(&self.events);
        move |event| {
            events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event)
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn events(&self) -> Vec<E>
    where
        E: Clone,
    {
        self.lock().clone()
    }

    pub fn tags(&self) -> Vec<String>
    where
        E: Event,
    {
        self.lock().iter().map(|event| event.tag().to_owned()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<E>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E> Default for RecordingSender<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RecordingSender<E> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
        }
    }
}
