use serde::{Deserialize, Serialize};
use std::ops::Deref;
use uuid::Uuid;

/// Macro to define a newtype ID backed by a plain string.
///
/// The bridge protocol uses short human-readable identifiers on the wire
/// (`run-1a2b3c4d`, `msg-…`), so these types serialize transparently as
/// strings. `random()` produces a fresh id in that format; `new()` accepts
/// any string so ids arriving from upstream systems round-trip untouched.
macro_rules! define_id_type {
    ($name:ident, $prefix:literal) => {
        #[doc = concat!("Type-safe `", $prefix, "-…` identifier.")]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new random `", $prefix, "-xxxxxxxx` ID.")]
            pub fn random() -> Self {
                let hex = Uuid::new_v4().simple().to_string();
                Self(format!(concat!($prefix, "-{}"), &hex[..8]))
            }

            /// Creates an ID from an arbitrary string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

define_id_type!(RunId, "run");
define_id_type!(ThreadId, "thread");
define_id_type!(MessageId, "msg");
define_id_type!(ToolCallId, "tool");
