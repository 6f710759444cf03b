//! The reducer: builder, options and dispatch.

use std::marker::PhantomData;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::connect::{Connected, Sender};
use crate::creators::EventCreators;
use crate::draft::Draft;
use crate::error::{DefinitionError, DispatchError};
use crate::event::{DynamicEvent, Event};
use crate::registry::HandlerRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerOptions {
    /// Label attached to the reducer's tracing events.
    pub name: String,
}

impl Default for ReducerOptions {
    fn default() -> Self {
        Self {
            name: "reducer".to_owned(),
        }
    }
}

/// Start defining a reducer over state `S`.
///
/// ```
/// use reduceur_core::{reducer, DynamicEvent};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Counter {
///     count: i64,
/// }
///
/// let counter = reducer::<Counter>().define(|draft| {
///     DynamicEvent::handlers()
///         .on("incremented", move |_| draft.write(|s| s.count += 1))
///         .on("decremented", move |_| draft.write(|s| s.count -= 1))
/// });
///
/// let next = counter
///     .dispatch(&Counter { count: 0 }, DynamicEvent::new("incremented"))
///     .unwrap();
/// assert_eq!(next, Counter { count: 1 });
/// ```
pub fn reducer<S: Clone>() -> ReducerBuilder<S> {
    ReducerBuilder::new()
}

/// Configuration collected before the handler factory is supplied.
#[derive(Debug, Clone)]
pub struct ReducerBuilder<S> {
    options: ReducerOptions,
    _state: PhantomData<fn() -> S>,
}

impl<S: Clone> ReducerBuilder<S> {
    pub fn new() -> Self {
        Self {
            options: ReducerOptions::default(),
            _state: PhantomData,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.options.name = name.into();
        self
    }

    pub fn options(mut self, options: ReducerOptions) -> Self {
        self.options = options;
        self
    }

    /// Finish the definition with the handler factory.
    ///
    /// The factory runs on every dispatch with a fresh [`Draft`] and returns
    /// the handlers for that dispatch. Handlers capture the draft with `move`.
    pub fn define<E, F>(self, factory: F) -> Reducer<S, E, F>
    where
        E: Event,
        F: for<'d, 's> Fn(&'d Draft<'s, S>) -> HandlerRegistry<'d, E>,
    {
        Reducer {
            factory,
            options: self.options,
            creators: OnceLock::new(),
            _marker: PhantomData,
        }
    }
}

impl<S: Clone> Default for ReducerBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// A pure `(state, event) -> state` function built from named handlers.
///
/// The reducer keeps no state between calls; share it freely across threads
/// and hand each call its own state.
pub struct Reducer<S, E, F> {
    factory: F,
    options: ReducerOptions,
    creators: OnceLock<EventCreators>,
    _marker: PhantomData<fn(&S, E) -> S>,
}

impl<S, E, F> Reducer<S, E, F>
where
    S: Clone,
    E: Event,
    F: for<'d, 's> Fn(&'d Draft<'s, S>) -> HandlerRegistry<'d, E>,
{
    /// Apply `event` to `state` and return the next state.
    ///
    /// `state` is never modified. On error nothing is committed and the caller
    /// keeps using its current state.
    pub fn dispatch(&self, state: &S, event: E) -> Result<S, DispatchError> {
        let tag = event.tag().to_owned();
        let draft = Draft::new(state);
        {
            let mut registry = (self.factory)(&draft);
            registry.validate()?;

            let Some((resolution, handler)) = registry.resolve(&tag) else {
                return Err(DispatchError::Unmatched { tag });
            };

            trace!(reducer = %self.options.name, %tag, ?resolution, "invoking handler");
            handler(event.into_payload())
                .map_err(|source| DispatchError::Handler { tag, source })?;
        }
        Ok(draft.finish())
    }

    /// [`dispatch`](Self::dispatch) in place: `state` is replaced only on success.
    pub fn apply(&self, state: &mut S, event: E) -> Result<(), DispatchError> {
        *state = self.dispatch(state, event)?;
        Ok(())
    }

    /// The tags the factory registers, discovered against `probe`.
    ///
    /// The factory runs on a throwaway draft; no handler is invoked. For
    /// event types that declare their tags, every registered tag must be one
    /// of them.
    pub fn tags(&self, probe: &S) -> Result<Vec<String>, DefinitionError> {
        let draft = Draft::new(probe);
        let registry = (self.factory)(&draft);
        registry.validate()?;

        let tags: Vec<String> = registry.tags().map(str::to_owned).collect();
        if let Some(declared) = E::declared_tags() {
            if let Some(undeclared) = tags.iter().find(|tag| !declared.contains(&tag.as_str())) {
                return Err(DefinitionError::UndeclaredTag(undeclared.clone()));
            }
        }
        Ok(tags)
    }

    /// Bind the reducer's events to `sender`.
    pub fn connect<Snd>(&self, sender: Snd) -> Connected<E, Snd>
    where
        Snd: Sender<E>,
    {
        Connected::new(sender)
    }

    pub fn options(&self) -> &ReducerOptions {
        &self.options
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }
}

impl<S, F> Reducer<S, DynamicEvent, F>
where
    S: Clone,
    F: for<'d, 's> Fn(&'d Draft<'s, S>) -> HandlerRegistry<'d, DynamicEvent>,
{
    /// The creator table, discovered against `probe` on first use.
    ///
    /// The table is computed once; later calls return it regardless of the
    /// probe.
    pub fn creators_from(&self, probe: &S) -> Result<&EventCreators, DefinitionError> {
        if let Some(creators) = self.creators.get() {
            return Ok(creators);
        }
        let built = EventCreators::from_tags(self.tags(probe)?)?;
        debug!(reducer = %self.options.name, tags = built.len(), "derived event creators");
        Ok(self.creators.get_or_init(|| built))
    }

    /// [`creators_from`](Self::creators_from) with `S::default()` as the probe.
    pub fn creators(&self) -> Result<&EventCreators, DefinitionError>
    where
        S: Default,
    {
        match self.creators.get() {
            Some(creators) => Ok(creators),
            None => self.creators_from(&S::default()),
        }
    }
}

impl<S, E, F> std::fmt::Debug for Reducer<S, E, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reducer")
            .field("options", &self.options)
            .field("creators", &self.creators.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use serde::Deserialize;
    use serde_json::json;
    use std::panic::{self, AssertUnwindSafe};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        count: i64,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Changed {
        new_count: i64,
    }

    fn event(value: serde_json::Value) -> DynamicEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn handler_failure_commits_nothing() {
        let counter = reducer::<Counter>().define(|draft| {
            DynamicEvent::handlers().on("explode", move |_| -> anyhow::Result<()> {
                draft.write(|s| s.count = 1_000);
                anyhow::bail!("refusing to count that high")
            })
        });
        let mut state = Counter { count: 3 };

        let err = counter
            .apply(&mut state, DynamicEvent::new("explode"))
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Handler {
                ref tag,
                source: HandlerError::Failed(_),
            } if tag == "explode"
        ));
        assert_eq!(state, Counter { count: 3 });
    }

    #[test]
    fn unmatched_tag_fails_even_with_other_handlers() {
        let counter = reducer::<Counter>().define(|draft| {
            DynamicEvent::handlers().on("incremented", move |_| draft.write(|s| s.count += 1))
        });
        let mut state = Counter { count: 5 };

        let err = counter
            .apply(&mut state, DynamicEvent::new("nonexistent"))
            .unwrap_err();

        assert!(err.is_unmatched());
        assert_eq!(state, Counter { count: 5 });
    }

    #[test]
    fn undecodable_payload_is_a_payload_error() {
        let counter = reducer::<Counter>().define(|draft| {
            DynamicEvent::handlers()
                .on_with("changed", move |p: Changed| draft.write(|s| s.count = p.new_count))
        });

        let err = counter
            .dispatch(
                &Counter { count: 1 },
                event(json!({ "type": "changed", "newCount": "lots" })),
            )
            .unwrap_err();

        match err {
            DispatchError::Handler {
                tag,
                source: HandlerError::Payload { tag: payload_tag, .. },
            } => {
                assert_eq!(tag, "changed");
                assert_eq!(payload_tag, "changed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn exploding_factory<'d>(_draft: &'d Draft<'_, Counter>) -> HandlerRegistry<'d, DynamicEvent> {
        panic!("factory exploded")
    }

    #[test]
    #[should_panic(expected = "factory exploded")]
    fn factory_panic_propagates() {
        let counter = reducer::<Counter>().define(exploding_factory);

        let _ = counter.dispatch(&Counter::default(), DynamicEvent::new("incremented"));
    }

    #[test]
    fn factory_panic_leaves_caller_state_alone() {
        let counter = reducer::<Counter>().define(exploding_factory);
        let mut state = Counter { count: 9 };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            counter.apply(&mut state, DynamicEvent::new("incremented"))
        }));

        assert!(outcome.is_err());
        assert_eq!(state, Counter { count: 9 });
    }

    #[test]
    fn panicking_handler_commits_nothing() {
        let counter = reducer::<Counter>().define(|draft| {
            DynamicEvent::handlers().on("incremented", move |_| {
                draft.write(|s| s.count += 1);
                if draft.is_modified() {
                    panic!("handler exploded after writing");
                }
            })
        });
        let mut state = Counter { count: 9 };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            counter.apply(&mut state, DynamicEvent::new("incremented"))
        }));

        assert!(outcome.is_err());
        assert_eq!(state, Counter { count: 9 });
    }

    #[test]
    fn malformed_registry_fails_before_any_handler_runs() {
        let counter = reducer::<Counter>().define(|draft| {
            DynamicEvent::handlers()
                .on("incremented", move |_| draft.write(|s| s.count += 1))
                .on("incremented", move |_| draft.write(|s| s.count += 2))
        });

        let err = counter
            .dispatch(&Counter::default(), DynamicEvent::new("incremented"))
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Definition(DefinitionError::DuplicateTag(ref tag)) if tag == "incremented"
        ));
    }

    #[test]
    fn discovers_tags_without_running_handlers() {
        let counter = reducer::<Counter>().define(|draft| {
            DynamicEvent::handlers()
                .on("incremented", move |_| draft.write(|s| s.count += 1))
                .on_with("changed", move |p: Changed| draft.write(|s| s.count = p.new_count))
                .wildcard(move |_| draft.write(|s| s.count = 0))
        });

        let probe = Counter { count: 42 };
        assert_eq!(counter.tags(&probe).unwrap(), vec!["incremented", "changed"]);
        assert_eq!(probe, Counter { count: 42 });
    }

    #[test]
    fn creators_are_derived_once() {
        let counter = reducer::<Counter>().define(|draft| {
            DynamicEvent::handlers()
                .on("incremented", move |_| draft.write(|s| s.count += 1))
                .on_with("changed", move |p: Changed| draft.write(|s| s.count = p.new_count))
        });

        let first = counter.creators().unwrap() as *const EventCreators;
        let second = counter.creators().unwrap() as *const EventCreators;
        assert_eq!(first, second);

        let creators = counter.creators().unwrap();
        let changed = creators
            .by_name("createChanged")
            .unwrap()
            .create_with(&json!({ "newCount": 11111 }))
            .unwrap();
        assert_eq!(changed, event(json!({ "type": "changed", "newCount": 11111 })));
    }

    #[test]
    fn colliding_tags_fail_creator_derivation() {
        let counter = reducer::<Counter>().define(|draft| {
            DynamicEvent::handlers()
                .on("reset", move |_| draft.write(|s| s.count = 0))
                .on("Reset", move |_| draft.write(|s| s.count = 0))
        });

        assert!(matches!(
            counter.creators(),
            Err(DefinitionError::NameCollision { .. })
        ));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ReducerOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options, ReducerOptions::default());

        let options: ReducerOptions =
            serde_json::from_value(json!({ "name": "todos" })).unwrap();
        assert_eq!(options.name, "todos");

        let counter = reducer::<Counter>()
            .options(options)
            .name("counter")
            .define(|draft| {
                DynamicEvent::handlers().on("incremented", move |_| draft.write(|s| s.count += 1))
            });
        assert_eq!(counter.name(), "counter");
        assert_eq!(counter.options().name, "counter");
    }
}
