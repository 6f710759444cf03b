//! Macros for declaring typed event enums.

/// Declare an event enum together with its creators, typed handler
/// registration and connected senders.
///
/// Each entry is a tag, optionally followed by its payload type in
/// parentheses. The tag is the wire name (`"changed"`), the variant is the tag
/// in CamelCase (`Changed`).
///
/// For `pub enum CounterEvent` the macro generates:
///
/// - `CounterEvent::TAGS` and an [`Event`](crate::Event) impl,
/// - `CounterEvent::create_<tag>(..)` creators taking the payload (or nothing),
/// - `CounterEvent::handlers()` returning an empty
///   [`HandlerRegistry`](crate::HandlerRegistry),
/// - trait `CounterEventHandlers` with `on_<tag>(handler)` methods whose
///   handler signature is the tag's payload type,
/// - trait `CounterEventSenders` with `send_<tag>(..)` methods on
///   [`Connected<CounterEvent, _>`](crate::Connected).
///
/// A tag listed twice, or a handler whose argument does not match the payload,
/// is a compile error.
///
/// # Example
///
/// ```
/// use reduceur_core::{events, reducer};
///
/// #[derive(Debug, Clone, PartialEq)]
/// pub struct Changed {
///     pub new_count: i64,
/// }
///
/// events! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub enum CounterEvent {
///         incremented,
///         decremented,
///         changed(Changed),
///     }
/// }
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Counter {
///     count: i64,
/// }
///
/// let counter = reducer::<Counter>().define(|draft| {
///     CounterEvent::handlers()
///         .on_incremented(move || draft.write(|s| s.count += 1))
///         .on_decremented(move || draft.write(|s| s.count -= 1))
///         .on_changed(move |p| draft.write(|s| s.count = p.new_count))
/// });
///
/// let next = counter
///     .dispatch(
///         &Counter { count: 10 },
///         CounterEvent::create_changed(Changed { new_count: 11111 }),
///     )
///     .unwrap();
/// assert_eq!(next, Counter { count: 11111 });
/// ```
#[macro_export]
macro_rules! events {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $tag:ident $( ( $payload:ty ) )?
            ),* $(,)?
        }
    ) => {
        $crate::__private::paste! {
            $(#[$meta])*
            $vis enum $name {
                $(
                    $(#[$variant_meta])*
                    [<$tag:camel>] $( ($payload) )?,
                )*
            }

            #[allow(dead_code)]
            impl $name {
                /// Every tag, in declaration order.
                pub const TAGS: &'static [&'static str] = &[$( stringify!($tag) ),*];

                $(
                    $crate::__events_item!(@creator $name, [<$tag:camel>], [<create_ $tag>], $tag $(, $payload)?);
                )*

                /// An empty handler registry for these events.
                pub fn handlers<'d>() -> $crate::HandlerRegistry<'d, $name> {
                    $crate::HandlerRegistry::new()
                }
            }

            impl $crate::Event for $name {
                type Payload = Self;

                fn tag(&self) -> &str {
                    match self {
                        $(
                            $crate::__events_item!(@pattern $name, [<$tag:camel>] $(, $payload)?) => stringify!($tag),
                        )*
                    }
                }

                fn into_payload(self) -> Self {
                    self
                }

                fn declared_tags() -> ::std::option::Option<&'static [&'static str]> {
                    ::std::option::Option::Some(Self::TAGS)
                }
            }

            #[doc = concat!("Typed handler registration for [`", stringify!($name), "`].")]
            #[allow(dead_code)]
            $vis trait [<$name Handlers>]<'d>: Sized {
                $(
                    $crate::__events_item!(@handler_sig 'd, [<on_ $tag>] $(, $payload)?);
                )*
            }

            impl<'d> [<$name Handlers>]<'d> for $crate::HandlerRegistry<'d, $name> {
                $(
                    $crate::__events_item!(@handler_impl 'd, $name, [<$tag:camel>], [<on_ $tag>], $tag $(, $payload)?);
                )*
            }

            #[doc = concat!("Per-tag senders for [`", stringify!($name), "`].")]
            #[allow(dead_code)]
            $vis trait [<$name Senders>] {
                $(
                    $crate::__events_item!(@send_sig [<send_ $tag>] $(, $payload)?);
                )*
            }

            impl<Snd> [<$name Senders>] for $crate::Connected<$name, Snd>
            where
                Snd: $crate::Sender<$name>,
            {
                $(
                    $crate::__events_item!(@send_impl $name, [<$tag:camel>], [<send_ $tag>] $(, $payload)?);
                )*
            }
        }
    };
}

/// Per-tag pieces of [`events!`]; each rule has a bare and a payload form.
#[doc(hidden)]
#[macro_export]
macro_rules! __events_item {
    (@creator $name:ident, $variant:ident, $create:ident, $tag:ident) => {
        #[doc = concat!("`{ type: \"", stringify!($tag), "\" }`")]
        pub fn $create() -> Self {
            $name::$variant
        }
    };
    (@creator $name:ident, $variant:ident, $create:ident, $tag:ident, $payload:ty) => {
        #[doc = concat!("`{ type: \"", stringify!($tag), "\", ...payload }`")]
        pub fn $create(payload: $payload) -> Self {
            $name::$variant(payload)
        }
    };

    (@pattern $name:ident, $variant:ident) => {
        $name::$variant
    };
    (@pattern $name:ident, $variant:ident, $payload:ty) => {
        $name::$variant(..)
    };

    (@handler_sig $lt:lifetime, $on:ident) => {
        fn $on<H, R>(self, handler: H) -> Self
        where
            H: FnMut() -> R + $lt,
            R: $crate::HandlerOutput;
    };
    (@handler_sig $lt:lifetime, $on:ident, $payload:ty) => {
        fn $on<H, R>(self, handler: H) -> Self
        where
            H: FnMut($payload) -> R + $lt,
            R: $crate::HandlerOutput;
    };

    (@handler_impl $lt:lifetime, $name:ident, $variant:ident, $on:ident, $tag:ident) => {
        #[allow(unreachable_patterns)]
        fn $on<H, R>(self, mut handler: H) -> Self
        where
            H: FnMut() -> R + $lt,
            R: $crate::HandlerOutput,
        {
            $crate::HandlerRegistry::on(self, stringify!($tag), move |event: $name| match event {
                $name::$variant => handler(),
                // Resolution is by tag, so only this variant reaches here.
                other => ::core::unreachable!(
                    "`{}` handler resolved for a `{}` event",
                    stringify!($tag),
                    $crate::Event::tag(&other),
                ),
            })
        }
    };
    (@handler_impl $lt:lifetime, $name:ident, $variant:ident, $on:ident, $tag:ident, $payload:ty) => {
        #[allow(unreachable_patterns)]
        fn $on<H, R>(self, mut handler: H) -> Self
        where
            H: FnMut($payload) -> R + $lt,
            R: $crate::HandlerOutput,
        {
            $crate::HandlerRegistry::on(self, stringify!($tag), move |event: $name| match event {
                $name::$variant(payload) => handler(payload),
                // Resolution is by tag, so only this variant reaches here.
                other => ::core::unreachable!(
                    "`{}` handler resolved for a `{}` event",
                    stringify!($tag),
                    $crate::Event::tag(&other),
                ),
            })
        }
    };

    (@send_sig $send:ident) => {
        fn $send(&self);
    };
    (@send_sig $send:ident, $payload:ty) => {
        fn $send(&self, payload: $payload);
    };

    (@send_impl $name:ident, $variant:ident, $send:ident) => {
        fn $send(&self) {
            $crate::Connected::send(self, $name::$variant)
        }
    };
    (@send_impl $name:ident, $variant:ident, $send:ident, $payload:ty) => {
        fn $send(&self, payload: $payload) {
            $crate::Connected::send(self, $name::$variant(payload))
        }
    };
}
