//! Collection kinds.

use serde::{Deserialize, Serialize};

/// The kind of a persisted collection.
///
/// Stored as the `kind` tag of every snapshot so a snapshot can never be
/// rehydrated into the wrong collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Cart,
    Wishlist,
}

impl CollectionKind {
    /// Global persistence key for this collection.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.storage_key())
    }
}

impl std::str::FromStr for CollectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cart" => Ok(Self::Cart),
            "wishlist" => Ok(Self::Wishlist),
            _ => Err(format!("invalid collection kind: {s}")),
        }
    }
}
