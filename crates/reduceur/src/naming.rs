//! Naming convention for derived event functions.
//!
//! A derived name is a prefix followed by the tag with its first character
//! upper-cased: tag `changed` gets the creator `createChanged` and the sender
//! `sendChanged`. Tags are never rewritten otherwise, so two tags that only
//! differ in the case of their first character derive the same name; tables
//! reject that pair when they are built.
//!
//! Code generated by [`events!`](crate::events) spells the same rule the Rust
//! way: `create_changed`, `send_changed`, `on_changed` and the variant
//! `Changed`.

pub const CREATE_PREFIX: &str = "create";
pub const SEND_PREFIX: &str = "send";

pub fn capitalize(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn creator_name(tag: &str) -> String {
    format!("{CREATE_PREFIX}{}", capitalize(tag))
}

pub fn sender_name(tag: &str) -> String {
    format!("{SEND_PREFIX}{}", capitalize(tag))
}

/// The capitalized tag part of a derived name, if `name` carries `prefix`.
pub fn derived_suffix<'a>(prefix: &str, name: &'a str) -> Option<&'a str> {
    name.strip_prefix(prefix).filter(|suffix| !suffix.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalizes_first_character_only() {
        assert_eq!(capitalize("newCount"), "NewCount");
        assert_eq!(capitalize("x"), "X");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("élan"), "Élan");
    }

    #[test]
    fn derives_creator_and_sender_names() {
        assert_eq!(creator_name("incremented"), "createIncremented");
        assert_eq!(sender_name("unknownEvent"), "sendUnknownEvent");
    }

    #[test]
    fn case_variants_collide() {
        assert_eq!(creator_name("changed"), creator_name("Changed"));
    }

    #[test]
    fn suffix_requires_prefix_and_content() {
        assert_eq!(derived_suffix(SEND_PREFIX, "sendChanged"), Some("Changed"));
        assert_eq!(derived_suffix(SEND_PREFIX, "createChanged"), None);
        assert_eq!(derived_suffix(CREATE_PREFIX, "create"), None);
    }
}
