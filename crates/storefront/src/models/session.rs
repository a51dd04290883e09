//! Session-related types.
//!
//! The signed-in identity as stored under the `user` key.

use serde::{Deserialize, Serialize};

use keycraft_core::{Email, UserId};

/// The signed-in user.
///
/// Only the email and admin flag are stored; the [`UserId`] is derived from
/// the email so the stored shape stays `{"email": ..., "isAdmin": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// User's email address.
    pub email: Email,
    /// Whether the user may use the back office.
    #[serde(default)]
    pub is_admin: bool,
}

impl Session {
    /// Identity used to scope remote collections.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.email.user_id()
    }
}

/// Global storage keys.
///
/// These are process-wide names on a storage medium, which is why only one
/// provider per key may be mounted at a time.
pub mod storage_keys {
    use keycraft_core::CollectionKind;

    /// Key for the cart snapshot.
    pub const CART: &str = CollectionKind::Cart.storage_key();

    /// Key for the local wishlist snapshot.
    pub const WISHLIST: &str = CollectionKind::Wishlist.storage_key();

    /// Key for the signed-in user.
    pub const USER: &str = "user";
}
