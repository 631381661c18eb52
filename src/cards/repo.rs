use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppResult;

/// A card submission. `approved` starts false and flips once, by an admin;
/// there is no rejected state and no edit or delete path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TradingCard {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_key: Option<String>,
    pub approved: bool,
    pub created_at: OffsetDateTime,
}

impl TradingCard {
    /// Insert a new pending card. The id is chosen by the caller so the
    /// image object key can embed it before the row exists.
    pub async fn create(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        title: &str,
        description: &str,
        image_key: Option<&str>,
    ) -> AppResult<TradingCard> {
        let card = sqlx::query_as::<_, TradingCard>(
            r#"
            INSERT INTO trading_cards (id, user_id, title, description, image_key)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, title, description, image_key, approved, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(image_key)
        .fetch_one(db)
        .await?;
        Ok(card)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> AppResult<Option<TradingCard>> {
        let card = sqlx::query_as::<_, TradingCard>(
            r#"
            SELECT id, user_id, title, description, image_key, approved, created_at
            FROM trading_cards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(card)
    }

    /// The public listing: approved cards only, newest first.
    pub async fn list_approved(db: &PgPool) -> AppResult<Vec<TradingCard>> {
        let cards = sqlx::query_as::<_, TradingCard>(
            r#"
            SELECT id, user_id, title, description, image_key, approved, created_at
            FROM trading_cards
            WHERE approved
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(cards)
    }

    /// Every card regardless of state, pending first, for the admin review
    /// dashboard.
    pub async fn list_all(db: &PgPool) -> AppResult<Vec<TradingCard>> {
        let cards = sqlx::query_as::<_, TradingCard>(
            r#"
            SELECT id, user_id, title, description, image_key, approved, created_at
            FROM trading_cards
            ORDER BY approved ASC, created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(cards)
    }

    pub async fn list_approved_by_user(db: &PgPool, user_id: Uuid) -> AppResult<Vec<TradingCard>> {
        let cards = sqlx::query_as::<_, TradingCard>(
            r#"
            SELECT id, user_id, title, description, image_key, approved, created_at
            FROM trading_cards
            WHERE user_id = $1 AND approved
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(cards)
    }

    /// Case-insensitive substring match over title and description,
    /// approved cards only. `pattern` is a ready-made LIKE pattern.
    pub async fn search_approved(db: &PgPool, pattern: &str) -> AppResult<Vec<TradingCard>> {
        let cards = sqlx::query_as::<_, TradingCard>(
            r#"
            SELECT id, user_id, title, description, image_key, approved, created_at
            FROM trading_cards
            WHERE approved AND (title ILIKE $1 OR description ILIKE $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(pattern)
        .fetch_all(db)
        .await?;
        Ok(cards)
    }

    /// The one-way pending→approved transition. Returns the updated card,
    /// or None when no such card exists. Approving an approved card is a
    /// no-op that returns it unchanged.
    pub async fn approve(db: &PgPool, id: Uuid) -> AppResult<Option<TradingCard>> {
        let card = sqlx::query_as::<_, TradingCard>(
            r#"
            UPDATE trading_cards
            SET approved = TRUE
            WHERE id = $1
            RETURNING id, user_id, title, description, image_key, approved, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(card)
    }
}
