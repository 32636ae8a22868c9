use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::repo_types::{User, UserRow};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("email already exists")]
    DuplicateEmail,
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Persistence port for users. `insert` must be atomic with respect to
/// email uniqueness: under concurrent inserts of the same email at most one
/// succeeds and the rest observe `DuplicateEmail`. Callers never pre-check
/// existence before inserting.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn insert(&self, email: &str, password_hash: &str) -> Result<User, RepoError>;
}

/// Postgres-backed repository. Uniqueness rides on the unique index over
/// `email`; a violation surfaces as `DuplicateEmail`.
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn insert(&self, email: &str, password_hash: &str) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::DuplicateEmail,
            _ => RepoError::Storage(e),
        })?;
        Ok(row.into())
    }
}
