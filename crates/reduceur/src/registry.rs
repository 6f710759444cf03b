//! The handler registry a reducer factory returns on every dispatch.

use std::borrow::Cow;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;
use smallvec::SmallVec;

use crate::error::{DefinitionError, HandlerError, HandlerOutput};
use crate::event::{DynamicEvent, Event, Payload, WILDCARD};

type BoxedHandler<'d, P> = Box<dyn FnMut(P) -> Result<(), HandlerError> + 'd>;

/// How a tag was resolved to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Exact,
    Wildcard,
}

/// Tag → handler mapping, plus an optional wildcard.
///
/// Handlers usually close over the [`Draft`](crate::Draft) the factory was
/// given, which is why a registry only lives for one dispatch (`'d`).
/// Registration problems (duplicate or empty tags) do not panic; the first one
/// is kept and reported by [`validate`](Self::validate) before any handler
/// runs.
pub struct HandlerRegistry<'d, E: Event> {
    handlers: SmallVec<[(Cow<'static, str>, BoxedHandler<'d, E::Payload>); 8]>,
    wildcard: Option<BoxedHandler<'d, E::Payload>>,
    conflict: Option<DefinitionError>,
}

impl<'d, E: Event> HandlerRegistry<'d, E> {
    pub fn new() -> Self {
        Self {
            handlers: SmallVec::new(),
            wildcard: None,
            conflict: None,
        }
    }

    /// Register `handler` for `tag`. Registering `"*"` sets the wildcard.
    pub fn on<H, R>(self, tag: impl Into<Cow<'static, str>>, mut handler: H) -> Self
    where
        H: FnMut(E::Payload) -> R + 'd,
        R: HandlerOutput,
    {
        self.insert(
            tag.into(),
            Box::new(move |payload: E::Payload| handler(payload).into_handler_result()),
        )
    }

    /// Register the handler used when no tag matches exactly.
    pub fn wildcard<H, R>(self, mut handler: H) -> Self
    where
        H: FnMut(E::Payload) -> R + 'd,
        R: HandlerOutput,
    {
        self.insert(
            Cow::Borrowed(WILDCARD),
            Box::new(move |payload: E::Payload| handler(payload).into_handler_result()),
        )
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.handlers.iter().map(|(tag, _)| &**tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags().any(|registered| registered == tag)
    }

    pub fn has_wildcard(&self) -> bool {
        self.wildcard.is_some()
    }

    /// Number of tagged handlers, not counting the wildcard.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.wildcard.is_none()
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        match &self.conflict {
            Some(conflict) => Err(conflict.clone()),
            None => Ok(()),
        }
    }

    /// Exact match first, then the wildcard.
    pub(crate) fn resolve(
        &mut self,
        tag: &str,
    ) -> Option<(Resolution, &mut BoxedHandler<'d, E::Payload>)> {
        match self.handlers.iter().position(|(registered, _)| registered == tag) {
            Some(index) => Some((Resolution::Exact, &mut self.handlers[index].1)),
            None => self
                .wildcard
                .as_mut()
                .map(|handler| (Resolution::Wildcard, handler)),
        }
    }

    /// Every registration ends here. Errors raised by the library itself
    /// (payload decoding) are stored as-is, not re-wrapped as handler output.
    fn insert(mut self, tag: Cow<'static, str>, handler: BoxedHandler<'d, E::Payload>) -> Self {
        if tag == WILDCARD {
            if self.wildcard.is_some() {
                self.record(DefinitionError::DuplicateTag(WILDCARD.to_owned()));
            } else {
                self.wildcard = Some(handler);
            }
        } else if tag.is_empty() {
            self.record(DefinitionError::EmptyTag);
        } else if self.handlers.iter().any(|(existing, _)| *existing == tag) {
            self.record(DefinitionError::DuplicateTag(tag.into_owned()));
        } else {
            self.handlers.push((tag, handler));
        }
        self
    }

    fn record(&mut self, conflict: DefinitionError) {
        if self.conflict.is_none() {
            self.conflict = Some(conflict);
        }
    }
}

impl<'d> HandlerRegistry<'d, DynamicEvent> {
    /// Register a handler whose payload is decoded into `T` first.
    ///
    /// A payload that does not fit `T` fails the dispatch with
    /// [`HandlerError::Payload`].
    pub fn on_with<T, H, R>(self, tag: impl Into<Cow<'static, str>>, mut handler: H) -> Self
    where
        T: DeserializeOwned,
        H: FnMut(T) -> R + 'd,
        R: HandlerOutput,
    {
        let tag = tag.into();
        let label = tag.to_string();
        self.insert(
            tag,
            Box::new(move |payload: Payload| -> Result<(), HandlerError> {
                let decoded = serde_json::from_value(Value::Object(payload)).map_err(|source| {
                    HandlerError::Payload {
                        tag: label.clone(),
                        source,
                    }
                })?;
                handler(decoded).into_handler_result()
            }),
        )
    }
}

impl DynamicEvent {
    /// An empty registry for string-tagged events.
    pub fn handlers<'d>() -> HandlerRegistry<'d, DynamicEvent> {
        HandlerRegistry::new()
    }
}

impl<E: Event> Default for HandlerRegistry<'_, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for HandlerRegistry<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("tags", &self.tags().collect::<Vec<_>>())
            .field("wildcard", &self.has_wildcard())
            .field("conflict", &self.conflict)
            .finish()
    }
}
