//! Identifier newtypes.

use std::num::NonZeroU64;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub NonZeroU64);

        impl $name {
            /// Creates an identifier.
            ///
            /// Returns `None` if the value is 0, which is reserved for "unset".
            #[must_use]
            pub const fn new(n: u64) -> Option<Self> {
                match NonZeroU64::new(n) {
                    Some(n) => Some(Self(n)),
                    None => None,
                }
            }

            /// Returns the underlying value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:x}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                u64::from_str_radix(s.trim(), 16)
                    .ok()
                    .and_then(Self::new)
                    .ok_or_else(|| Error::InvalidArgument(format!("{} {s:?}", $label)))
            }
        }
    };
}

hex_id!(
    /// System-assigned message identifier.
    MessageId,
    "message id"
);

hex_id!(
    /// Identifier shared by every message of a thread.
    ThreadId,
    "thread id"
);
