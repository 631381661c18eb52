use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// User record. `password_hash` is NULL for accounts created through Google
/// sign-in that never set a password. The admin flag is only ever set
/// out-of-band; no endpoint mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_admin: bool,
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_admin, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_admin, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new user. A duplicate email surfaces as
    /// [`AppError::DuplicateEmail`] via the unique constraint.
    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: Option<&str>,
    ) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, is_admin, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Find-or-create for the external-identity path, keyed by email.
    pub async fn find_or_create_by_email(db: &PgPool, email: &str) -> AppResult<User> {
        if let Some(user) = Self::find_by_email(db, email).await? {
            return Ok(user);
        }
        match Self::create(db, email, None).await {
            Ok(user) => Ok(user),
            // Lost a race with a concurrent first login for the same address
            Err(AppError::DuplicateEmail) => Self::find_by_email(db, email)
                .await?
                .ok_or(AppError::NotFound("user")),
            Err(e) => Err(e),
        }
    }
}
