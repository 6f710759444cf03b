//! Error types for dispatch, reducer definitions and event construction.

use thiserror::Error;

/// Failure of a single [`Reducer::dispatch`](crate::Reducer::dispatch) call.
///
/// Whatever the variant, the state handed to `dispatch` is untouched and no
/// partial update is committed.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The tag matched no handler and the registry has no wildcard.
    #[error("no handler for event `{tag}` and no wildcard handler is registered")]
    Unmatched { tag: String },

    /// The resolved handler failed.
    #[error("handler for event `{tag}` failed")]
    Handler {
        tag: String,
        #[source]
        source: HandlerError,
    },

    /// The handler registry built by the factory is malformed.
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

impl DispatchError {
    /// The tag of the event that failed, when the failure is tied to one.
    pub fn tag(&self) -> Option<&str> {
        match self {
            DispatchError::Unmatched { tag } | DispatchError::Handler { tag, .. } => Some(tag),
            DispatchError::Definition(_) => None,
        }
    }

    pub fn is_unmatched(&self) -> bool {
        matches!(self, DispatchError::Unmatched { .. })
    }
}

/// A reducer definition that cannot be dispatched against.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("event tag `{0}` is registered more than once")]
    DuplicateTag(String),

    #[error("event tags `{first}` and `{second}` both derive the name `{name}`")]
    NameCollision {
        first: String,
        second: String,
        name: String,
    },

    #[error("`*` is reserved for the wildcard handler and cannot be used as an event tag")]
    ReservedTag,

    #[error("event tags must not be empty")]
    EmptyTag,

    #[error("a handler is registered for `{0}`, which the event type does not declare")]
    UndeclaredTag(String),
}

/// Failure raised while running a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler's own error, kept as-is.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),

    /// A dynamic payload could not be decoded into the handler's payload type.
    #[error("payload for `{tag}` does not match the handler's payload type")]
    Payload {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to build a [`DynamicEvent`](crate::DynamicEvent) from serialisable data.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event payload must serialize to an object, got {0}")]
    NotAnObject(&'static str),

    #[error("serialized event has no string `type` field")]
    MissingTag,

    #[error("failed to serialize event payload")]
    Serialize(#[from] serde_json::Error),
}

/// What a handler may return: nothing, or a `Result` whose error converts into
/// [`anyhow::Error`].
pub trait HandlerOutput {
    fn into_handler_result(self) -> Result<(), HandlerError>;
}

impl HandlerOutput for () {
    fn into_handler_result(self) -> Result<(), HandlerError> {
        Ok(())
    }
}

impl<E> HandlerOutput for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_handler_result(self) -> Result<(), HandlerError> {
        self.map_err(|error| HandlerError::Failed(error.into()))
    }
}
