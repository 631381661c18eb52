use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use super::repo::TradingCard;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage::ImageStore;

const PRESIGN_TTL: Duration = Duration::from_secs(30 * 60);

/// An image pulled out of the upload form, not yet stored.
pub struct CardImage {
    pub body: Bytes,
    pub content_type: String,
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Build the LIKE pattern for a search keyword. An empty or missing keyword
/// matches nothing.
pub fn like_pattern(keyword: Option<&str>) -> Option<String> {
    let kw = keyword?.trim();
    if kw.is_empty() {
        None
    } else {
        Some(format!("%{}%", kw))
    }
}

/// Create a pending card for `owner`. The image, when present, is stored
/// first so its object key can embed the card id; if the row insert then
/// fails, the object is removed again rather than left orphaned.
pub async fn create_card(
    state: &AppState,
    owner: Uuid,
    title: &str,
    description: &str,
    image: Option<CardImage>,
) -> AppResult<TradingCard> {
    let card_id = Uuid::new_v4();
    let image_key = match image {
        Some(img) => Some(store_card_image(state, owner, card_id, img).await?),
        None => None,
    };

    match TradingCard::create(
        &state.db,
        card_id,
        owner,
        title,
        description,
        image_key.as_deref(),
    )
    .await
    {
        Ok(card) => Ok(card),
        Err(e) => {
            if let Some(key) = image_key {
                if let Err(cleanup) = state.storage.remove(&key).await {
                    warn!(key = %key, error = ?cleanup, "orphaned card image left behind");
                }
            }
            Err(e)
        }
    }
}

/// Store a card image and return its object key.
pub async fn store_card_image(
    state: &AppState,
    owner: Uuid,
    card_id: Uuid,
    image: CardImage,
) -> AppResult<String> {
    let ext = ext_from_mime(&image.content_type).ok_or_else(|| {
        AppError::Validation(format!("unsupported image type {}", image.content_type))
    })?;
    let key = format!("cards/{}/{}.{}", owner, card_id, ext);
    state
        .storage
        .store(&key, image.body, &image.content_type)
        .await
        .with_context(|| format!("store {}", key))?;
    Ok(key)
}

/// Short-lived GET URL for a stored card image.
pub async fn presign_image(state: &AppState, key: &str) -> AppResult<String> {
    let url = state
        .storage
        .presigned_url(key, PRESIGN_TTL)
        .await
        .with_context(|| format!("presign {}", key))?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[test]
    fn ext_from_mime_known_and_unknown() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/pdf"), None);
        assert_eq!(ext_from_mime("text/html"), None);
    }

    #[test]
    fn like_pattern_wraps_keyword() {
        assert_eq!(like_pattern(Some("cat")), Some("%cat%".to_string()));
        assert_eq!(like_pattern(Some("  cat ")), Some("%cat%".to_string()));
    }

    #[test]
    fn like_pattern_empty_matches_nothing() {
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("")), None);
        assert_eq!(like_pattern(Some("   ")), None);
    }

    #[tokio::test]
    async fn store_card_image_builds_key_from_owner_and_card() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();
        let card_id = Uuid::new_v4();
        let key = store_card_image(
            &state,
            owner,
            card_id,
            CardImage {
                body: Bytes::from_static(b"fake image"),
                content_type: "image/png".into(),
            },
        )
        .await
        .expect("store");
        assert_eq!(key, format!("cards/{}/{}.png", owner, card_id));
    }

    #[tokio::test]
    async fn create_card_rejects_unsupported_image_type() {
        let state = AppState::fake();
        let err = create_card(
            &state,
            Uuid::new_v4(),
            "Ace",
            "a fine card",
            Some(CardImage {
                body: Bytes::from_static(b"zip"),
                content_type: "application/zip".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn presign_image_uses_storage() {
        let state = AppState::fake();
        let url = presign_image(&state, "cards/u/c.jpg").await.expect("presign");
        assert!(url.contains("cards/u/c.jpg"));
    }
}
