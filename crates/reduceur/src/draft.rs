//! Scoped copy-on-write view over a state value.

use std::borrow::Cow;
use std::cell::{Ref, RefCell, RefMut};

/// A mutable view over a borrowed state, handed to handler factories.
///
/// Reads see the current value (including earlier writes made through the same
/// draft). The first write clones the base state; later writes mutate that
/// private copy. The base is never modified. Only a successful dispatch turns
/// the draft into the next state; a failed one simply drops it.
///
/// Cloning `S` is the whole copy cost, so states that keep large subtrees behind
/// `Arc` share them with the base until a handler calls `Arc::make_mut` on the
/// subtree it changes.
///
/// The draft hands out `RefCell` borrows, so access must not nest: holding
/// [`Draft::get`] while calling [`Draft::write`] panics, and so does calling
/// `read` or `get` from inside a `write` closure. Read through the closure's
/// argument instead:
///
/// ```ignore
/// draft.write(|s| s.count = s.count + 1);            // fine
/// draft.write(|s| s.count = draft.read(|t| t.count)); // panics
/// ```
#[derive(Debug)]
pub struct Draft<'s, S: Clone> {
    base: &'s S,
    current: RefCell<Cow<'s, S>>,
}

impl<'s, S: Clone> Draft<'s, S> {
    pub fn new(base: &'s S) -> Self {
        Self {
            base,
            current: RefCell::new(Cow::Borrowed(base)),
        }
    }

    /// Run `f` against the current value.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let current = self.current.borrow();
        f(&**current)
    }

    /// Run `f` against the writable copy, cloning the base first if needed.
    pub fn write<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut current = self.current.borrow_mut();
        f(current.to_mut())
    }

    pub fn get(&self) -> Ref<'_, S> {
        Ref::map(self.current.borrow(), |current| &**current)
    }

    pub fn get_mut(&self) -> RefMut<'_, S> {
        RefMut::map(self.current.borrow_mut(), |current| current.to_mut())
    }

    /// The state the draft was opened over, ignoring any writes.
    pub fn original(&self) -> &'s S {
        self.base
    }

    /// Whether a write has happened yet.
    pub fn is_modified(&self) -> bool {
        matches!(*self.current.borrow(), Cow::Owned(_))
    }

    /// Close the scope and materialize the next state.
    pub(crate) fn finish(self) -> S {
        self.current.into_inner().into_owned()
    }
}
