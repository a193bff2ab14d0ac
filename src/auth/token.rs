//! Defines the token stored in the auth cookie.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::user::UserID;

/// A token for authorization and authentication.
///
/// The expiry is stored as a unix timestamp so the cookie stays compact and
/// round-trips through serde without a custom datetime format.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Token {
    pub user_id: UserID,

    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
}
