use sqlx::FromRow;
use time::OffsetDateTime;

use crate::auth::credential::Credential;

/// Raw users row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

/// Domain user. Deliberately not serializable: the credential must never
/// reach a wire format, so responses go through `PublicUser` instead.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub credential: Credential,
    pub created_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            credential: Credential::from_hash(row.password_hash),
            created_at: row.created_at,
        }
    }
}
