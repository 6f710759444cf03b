//! Forwarding events to an external state owner.

use std::marker::PhantomData;

use tracing::trace;

use crate::event::Event;

/// Receives events on behalf of whatever owns the authoritative state.
///
/// Implemented for every `Fn(E)`, so a closure is the usual sender.
pub trait Sender<E> {
    fn send(&self, event: E);
}

impl<E, F> Sender<E> for F
where
    F: Fn(E),
{
    fn send(&self, event: E) {
        self(event)
    }
}

/// A sender bound to one event type.
///
/// Returned by [`Reducer::connect`](crate::Reducer::connect). Enums generated
/// by [`events!`](crate::events) add one `send_<tag>` method per tag on top
/// of [`send`](Self::send). Every call reaches the sender exactly once; nothing
/// is buffered.
pub struct Connected<E, Snd> {
    sender: Snd,
    _event: PhantomData<fn(E)>,
}

impl<E, Snd> Connected<E, Snd>
where
    E: Event,
    Snd: Sender<E>,
{
    pub fn new(sender: Snd) -> Self {
        Self {
            sender,
            _event: PhantomData,
        }
    }

    pub fn send(&self, event: E) {
        trace!(tag = event.tag(), "sending event");
        self.sender.send(event);
    }

    pub fn sender(&self) -> &Snd {
        &self.sender
    }

    pub fn into_inner(self) -> Snd {
        self.sender
    }
}

impl<E, Snd: Clone> Clone for Connected<E, Snd> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            _event: PhantomData,
        }
    }
}

impl<E, Snd> std::fmt::Debug for Connected<E, Snd> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connected").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DynamicEvent;
    use std::cell::RefCell;

    #[test]
    fn forwards_each_event_once() {
        let sent = RefCell::new(Vec::new());
        let connected = Connected::new(|event: DynamicEvent| sent.borrow_mut().push(event));

        connected.send(DynamicEvent::new("incremented"));
        connected.send(DynamicEvent::new("decremented"));

        let tags: Vec<_> = sent.borrow().iter().map(|e| e.tag().to_owned()).collect();
        assert_eq!(tags, vec!["incremented", "decremented"]);
    }
}
