use serde::{Deserialize, Serialize};

/// Sentinel used on disk for "no index" in optional reference fields
pub const NO_INDEX: u32 = u32::MAX;

macro_rules! table_index {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Decode an optional reference, mapping [`NO_INDEX`] to `None`
            pub fn from_raw(raw: u32) -> Option<Self> {
                (raw != NO_INDEX).then_some(Self(raw))
            }

            pub fn get(self) -> u32 {
                self.0
            }

            #[inline]
            pub fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

table_index!(
    /// Position in the string pool
    StringIndex
);
table_index!(
    /// Position in the component table
    ComponentIndex
);
table_index!(
    /// Position in the property table
    PropertyIndex
);
table_index!(
    /// Position in the value table
    ValueIndex
);
table_index!(
    /// Position in the profile table (not the published profile id)
    ProfileIndex
);
table_index!(
    /// Position in the signature table
    SignatureIndex
);
table_index!(
    /// Position in the node table
    NodeIndex
);
