//! Events: the [`Event`] trait and the string-tagged [`DynamicEvent`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EventError;

/// Name of the discriminator field in serialized events.
pub const TAG_FIELD: &str = "type";

/// Tag under which the catch-all handler is registered.
pub const WILDCARD: &str = "*";

/// Payload fields of a [`DynamicEvent`], i.e. the event without its tag.
pub type Payload = serde_json::Map<String, Value>;

/// A tagged event a reducer can dispatch on.
///
/// `tag` is the discriminator the registry is keyed by. `into_payload` is what
/// the resolved handler receives: the remaining fields for [`DynamicEvent`],
/// the event itself for enums generated by [`events!`](crate::events).
pub trait Event: Sized {
    type Payload;

    fn tag(&self) -> &str;

    fn into_payload(self) -> Self::Payload;

    /// Every tag the type can carry, when known statically.
    fn declared_tags() -> Option<&'static [&'static str]> {
        None
    }
}

/// An event whose tag and payload are only known at runtime.
///
/// Serializes as a flat object: `{"type": "changed", "newCount": 11111}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicEvent {
    #[serde(rename = "type")]
    tag: String,
    #[serde(flatten)]
    payload: Payload,
}

impl DynamicEvent {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            payload: Payload::new(),
        }
    }

    /// A `type` key inside `payload` is dropped; the tag always wins.
    pub fn with_payload(tag: impl Into<String>, mut payload: Payload) -> Self {
        payload.remove(TAG_FIELD);
        Self {
            tag: tag.into(),
            payload,
        }
    }

    /// Build from any value that serializes to an object (or to nothing).
    pub fn from_payload<P>(tag: impl Into<String>, payload: &P) -> Result<Self, EventError>
    where
        P: Serialize + ?Sized,
    {
        match serde_json::to_value(payload)? {
            Value::Object(map) => Ok(Self::with_payload(tag, map)),
            Value::Null => Ok(Self::new(tag)),
            other => Err(EventError::NotAnObject(kind_of(&other))),
        }
    }

    /// Convert an internally tagged event (`#[serde(tag = "type")]`).
    pub fn from_event<T>(event: &T) -> Result<Self, EventError>
    where
        T: Serialize + ?Sized,
    {
        let mut map = match serde_json::to_value(event)? {
            Value::Object(map) => map,
            other => return Err(EventError::NotAnObject(kind_of(&other))),
        };
        match map.remove(TAG_FIELD) {
            Some(Value::String(tag)) => Ok(Self { tag, payload: map }),
            _ => Err(EventError::MissingTag),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }

    pub fn into_parts(self) -> (String, Payload) {
        (self.tag, self.payload)
    }

    pub fn to_value(&self) -> Value {
        let mut map = Payload::with_capacity(self.payload.len() + 1);
        map.insert(TAG_FIELD.to_owned(), Value::String(self.tag.clone()));
        map.extend(self.payload.iter().map(|(k, v)| (k.clone(), v.clone())));
        Value::Object(map)
    }
}

impl Event for DynamicEvent {
    type Payload = Payload;

    fn tag(&self) -> &str {
        &self.tag
    }

    fn into_payload(self) -> Payload {
        self.payload
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Changed {
        new_count: i64,
    }

    #[test]
    fn deserializes_tag_and_payload_from_flat_object() {
        let event: DynamicEvent =
            serde_json::from_value(json!({ "type": "changed", "newCount": 11111 })).unwrap();

        assert_eq!(event.tag(), "changed");
        assert_eq!(event.get("newCount"), Some(&json!(11111)));
        assert!(event.get(TAG_FIELD).is_none());
    }

    #[test]
    fn serializes_back_to_flat_object() {
        let event = DynamicEvent::from_payload("changed", &Changed { new_count: 3 }).unwrap();

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "type": "changed", "newCount": 3 })
        );
        assert_eq!(event.to_value(), json!({ "type": "changed", "newCount": 3 }));
    }

    #[test]
    fn tag_wins_over_type_key_in_payload() {
        let mut payload = Payload::new();
        payload.insert("type".into(), json!("spoofed"));
        payload.insert("by".into(), json!(2));

        let event = DynamicEvent::with_payload("incremented", payload);

        assert_eq!(event.tag(), "incremented");
        assert_eq!(event.to_value(), json!({ "type": "incremented", "by": 2 }));
    }

    #[test]
    fn unit_payload_produces_bare_event() {
        let event = DynamicEvent::from_payload("incremented", &()).unwrap();
        assert_eq!(event, DynamicEvent::new("incremented"));
    }

    #[test]
    fn rejects_non_object_payloads() {
        let err = DynamicEvent::from_payload("changed", &42).unwrap_err();
        assert!(matches!(err, EventError::NotAnObject("a number")));
    }

    #[test]
    fn converts_internally_tagged_enums() {
        #[derive(Serialize)]
        #[serde(tag = "type", rename_all = "snake_case")]
        enum Counter {
            Changed { value: i64 },
        }

        let event = DynamicEvent::from_event(&Counter::Changed { value: 7 }).unwrap();

        assert_eq!(event.tag(), "changed");
        assert_eq!(event.get("value"), Some(&json!(7)));
    }

    #[test]
    fn from_event_requires_a_tag() {
        let err = DynamicEvent::from_event(&json!({ "value": 1 })).unwrap_err();
        assert!(matches!(err, EventError::MissingTag));
    }
}
