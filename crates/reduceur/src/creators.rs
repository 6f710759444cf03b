//! Creator and sender tables for string-tagged reducers.
//!
//! The set of tags of a [`DynamicEvent`] reducer is only known once its factory
//! has run, so the table is built from the discovered tags
//! (see [`Reducer::creators`](crate::Reducer::creators)) and looked up either
//! by the literal tag or by the derived name from [`naming`](crate::naming).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::connect::{Connected, Sender};
use crate::error::{DefinitionError, EventError};
use crate::event::{DynamicEvent, Payload, WILDCARD};
use crate::naming::{self, CREATE_PREFIX, SEND_PREFIX};

/// The known tags of one reducer, indexed by derived name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCreators {
    tags: Vec<String>,
    /// Capitalized tag → index into `tags`.
    suffixes: BTreeMap<String, usize>,
}

impl EventCreators {
    /// Build the table, rejecting tags that cannot get a creator of their own.
    pub fn from_tags<I, T>(tags: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut table = Self::default();
        for tag in tags {
            let tag = tag.into();
            if tag.is_empty() {
                return Err(DefinitionError::EmptyTag);
            }
            if tag == WILDCARD {
                return Err(DefinitionError::ReservedTag);
            }
            if table.tags.contains(&tag) {
                return Err(DefinitionError::DuplicateTag(tag));
            }

            let suffix = naming::capitalize(&tag);
            if let Some(&index) = table.suffixes.get(&suffix) {
                return Err(DefinitionError::NameCollision {
                    first: table.tags[index].clone(),
                    second: tag,
                    name: naming::creator_name(&suffix),
                });
            }
            table.suffixes.insert(suffix, table.tags.len());
            table.tags.push(tag);
        }
        Ok(table)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.tags.iter().map(String::as_str)
    }

    /// Derived creator names, sorted.
    pub fn names(&self) -> impl Iterator<Item = String> + '_ {
        self.suffixes
            .keys()
            .map(|suffix| format!("{CREATE_PREFIX}{suffix}"))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn creator(&self, tag: &str) -> Option<EventCreator<'_>> {
        self.tags
            .iter()
            .find(|known| *known == tag)
            .map(|tag| EventCreator { tag })
    }

    /// Look a creator up by its derived name, e.g. `createChanged`.
    pub fn by_name(&self, name: &str) -> Option<EventCreator<'_>> {
        self.by_suffix(naming::derived_suffix(CREATE_PREFIX, name)?)
    }

    pub fn connect<Snd>(&self, sender: Snd) -> ConnectedCreators<'_, Snd>
    where
        Snd: Sender<DynamicEvent>,
    {
        ConnectedCreators {
            creators: self,
            connected: Connected::new(sender),
        }
    }

    fn by_suffix(&self, suffix: &str) -> Option<EventCreator<'_>> {
        let index = *self.suffixes.get(suffix)?;
        Some(EventCreator {
            tag: &self.tags[index],
        })
    }
}

/// Builds well-formed events for one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCreator<'a> {
    tag: &'a str,
}

impl<'a> EventCreator<'a> {
    pub fn tag(&self) -> &'a str {
        self.tag
    }

    pub fn name(&self) -> String {
        naming::creator_name(self.tag)
    }

    /// `{ type: tag }`
    pub fn create(&self) -> DynamicEvent {
        DynamicEvent::new(self.tag)
    }

    /// `{ type: tag, ...payload }`
    pub fn create_with<P>(&self, payload: &P) -> Result<DynamicEvent, EventError>
    where
        P: Serialize + ?Sized,
    {
        DynamicEvent::from_payload(self.tag, payload)
    }

    pub fn create_raw(&self, payload: Payload) -> DynamicEvent {
        DynamicEvent::with_payload(self.tag, payload)
    }
}

/// A creator table bound to a sender.
pub struct ConnectedCreators<'a, Snd> {
    creators: &'a EventCreators,
    connected: Connected<DynamicEvent, Snd>,
}

impl<'a, Snd> ConnectedCreators<'a, Snd>
where
    Snd: Sender<DynamicEvent>,
{
    pub fn sender(&self, tag: &str) -> Option<EventSender<'_, Snd>> {
        let creator = self.creators.creator(tag)?;
        Some(EventSender {
            creator,
            connected: &self.connected,
        })
    }

    /// Look a sender up by its derived name, e.g. `sendChanged`.
    pub fn by_name(&self, name: &str) -> Option<EventSender<'_, Snd>> {
        let creator = self
            .creators
            .by_suffix(naming::derived_suffix(SEND_PREFIX, name)?)?;
        Some(EventSender {
            creator,
            connected: &self.connected,
        })
    }

    pub fn creators(&self) -> &'a EventCreators {
        self.creators
    }

    pub fn into_inner(self) -> Snd {
        self.connected.into_inner()
    }
}

/// Sends events for one tag.
pub struct EventSender<'a, Snd> {
    creator: EventCreator<'a>,
    connected: &'a Connected<DynamicEvent, Snd>,
}

impl<Snd> EventSender<'_, Snd>
where
    Snd: Sender<DynamicEvent>,
{
    pub fn tag(&self) -> &str {
        self.creator.tag()
    }

    pub fn name(&self) -> String {
        naming::sender_name(self.creator.tag())
    }

    pub fn send(&self) {
        self.connected.send(self.creator.create());
    }

    /// Nothing is sent when the payload cannot be turned into an event.
    pub fn send_with<P>(&self, payload: &P) -> Result<(), EventError>
    where
        P: Serialize + ?Sized,
    {
        let event = self.creator.create_with(payload)?;
        self.connected.send(event);
        Ok(())
    }

    pub fn send_raw(&self, payload: Payload) {
        self.connected.send(self.creator.create_raw(payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Changed {
        new_count: i64,
    }

    fn counter_table() -> EventCreators {
        EventCreators::from_tags(["incremented", "decremented", "changed"]).unwrap()
    }

    #[test]
    fn creators_build_bare_and_payload_events() {
        let table = counter_table();

        assert_eq!(
            table.creator("incremented").unwrap().create().to_value(),
            json!({ "type": "incremented" })
        );
        assert_eq!(
            table
                .by_name("createChanged")
                .unwrap()
                .create_with(&Changed { new_count: 11111 })
                .unwrap()
                .to_value(),
            json!({ "type": "changed", "newCount": 11111 })
        );
    }

    #[test]
    fn unknown_names_resolve_to_nothing() {
        let table = counter_table();

        assert!(table.creator("reset").is_none());
        assert!(table.by_name("createReset").is_none());
        assert!(table.by_name("sendChanged").is_none());
        assert!(table.by_name("create").is_none());
    }

    #[test]
    fn names_follow_the_convention() {
        let table = counter_table();
        let names: Vec<_> = table.names().collect();

        assert_eq!(
            names,
            vec!["createChanged", "createDecremented", "createIncremented"]
        );
        assert_eq!(table.creator("changed").unwrap().name(), "createChanged");
    }

    #[test]
    fn case_collisions_are_rejected() {
        let err = EventCreators::from_tags(["changed", "Changed"]).unwrap_err();

        assert_eq!(
            err,
            DefinitionError::NameCollision {
                first: "changed".into(),
                second: "Changed".into(),
                name: "createChanged".into(),
            }
        );
    }

    #[test]
    fn wildcard_and_duplicates_are_rejected() {
        assert_eq!(
            EventCreators::from_tags(["*"]).unwrap_err(),
            DefinitionError::ReservedTag
        );
        assert_eq!(
            EventCreators::from_tags(["a", "a"]).unwrap_err(),
            DefinitionError::DuplicateTag("a".into())
        );
    }

    #[test]
    fn connected_senders_forward_once_per_call() {
        let table = counter_table();
        let sent = RefCell::new(Vec::new());
        let connected = table.connect(|event: DynamicEvent| sent.borrow_mut().push(event));

        connected.by_name("sendIncremented").unwrap().send();
        connected
            .sender("changed")
            .unwrap()
            .send_with(&Changed { new_count: 4 })
            .unwrap();

        assert_eq!(
            *sent.borrow(),
            vec![
                DynamicEvent::new("incremented"),
                DynamicEvent::from_payload("changed", &Changed { new_count: 4 }).unwrap(),
            ]
        );
    }

    #[test]
    fn failed_payload_sends_nothing() {
        let table = counter_table();
        let sent = RefCell::new(Vec::new());
        let connected = table.connect(|event: DynamicEvent| sent.borrow_mut().push(event));

        let result = connected.sender("changed").unwrap().send_with(&"not an object");

        assert!(result.is_err());
        assert!(sent.borrow().is_empty());
    }
}
