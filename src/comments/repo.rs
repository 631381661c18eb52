use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppResult;

/// A comment on a card. Immutable once written; there is no edit, delete
/// or moderation path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub trading_card_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: OffsetDateTime,
}

impl Comment {
    pub async fn create(
        db: &PgPool,
        trading_card_id: Uuid,
        user_id: Uuid,
        text: &str,
    ) -> AppResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (trading_card_id, user_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, trading_card_id, user_id, text, created_at
            "#,
        )
        .bind(trading_card_id)
        .bind(user_id)
        .bind(text)
        .fetch_one(db)
        .await?;
        Ok(comment)
    }

    /// The card's thread, oldest first.
    pub async fn list_by_card(db: &PgPool, trading_card_id: Uuid) -> AppResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, trading_card_id, user_id, text, created_at
            FROM comments
            WHERE trading_card_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(trading_card_id)
        .fetch_all(db)
        .await?;
        Ok(comments)
    }
}
