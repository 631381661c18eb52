use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header::LOCATION, StatusCode},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CardDetails, CardSummary, CreatedCardResponse, SearchQuery, UserProfile};
use super::repo::TradingCard;
use super::services::{create_card, like_pattern, presign_image, CardImage};
use crate::auth::dto::PublicUser;
use crate::auth::extractors::{AdminUser, CurrentUser};
use crate::auth::repo::User;
use crate::comments::repo::Comment;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/search", get(search))
        .route("/user/:id", get(user_profile))
        .route("/trading_card/:id", get(card_details))
}

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/approve_trading_card/:id", post(approve))
        .route("/admin/dashboard", get(dashboard))
}

/// The public index: approved cards only, so submissions stay invisible
/// until review.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> AppResult<Json<Vec<CardSummary>>> {
    let cards = TradingCard::list_approved(&state.db).await?;
    Ok(Json(cards.into_iter().map(CardSummary::from).collect()))
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> AppResult<Json<Vec<CardSummary>>> {
    let Some(pattern) = like_pattern(q.keyword.as_deref()) else {
        return Ok(Json(Vec::new()));
    };
    let cards = TradingCard::search_approved(&state.db, &pattern).await?;
    Ok(Json(cards.into_iter().map(CardSummary::from).collect()))
}

fn validate_card_fields(title: &str, description: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("title is required".into()));
    }
    if description.trim().is_empty() {
        return Err(AppError::Validation("description is required".into()));
    }
    Ok(())
}

/// POST /upload (multipart): `title`, `description`, optional `image` file.
/// The card always belongs to the caller and starts pending.
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    current: CurrentUser,
    mut mp: Multipart,
) -> AppResult<(StatusCode, [(axum::http::HeaderName, String); 1], Json<CreatedCardResponse>)> {
    let mut title = String::new();
    let mut description = String::new();
    let mut image: Option<CardImage> = None;

    while let Ok(Some(field)) = mp.next_field().await {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("title") => {
                title = field
                    .text()
                    .await
                    .map_err(|_| AppError::Validation("malformed title field".into()))?;
            }
            Some("description") => {
                description = field
                    .text()
                    .await
                    .map_err(|_| AppError::Validation("malformed description field".into()))?;
            }
            Some("image") => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::Validation("malformed image field".into()))?;
                if !body.is_empty() {
                    image = Some(CardImage { body, content_type });
                }
            }
            _ => {}
        }
    }

    let title = title.trim().to_string();
    let description = description.trim().to_string();
    validate_card_fields(&title, &description)?;

    let card = create_card(&state, current.user_id, &title, &description, image).await?;

    info!(card_id = %card.id, user_id = %current.user_id, "card uploaded, pending review");
    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/trading_card/{}", card.id))],
        Json(CreatedCardResponse {
            id: card.id,
            approved: card.approved,
            created_at: card.created_at,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn user_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserProfile>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let cards = TradingCard::list_approved_by_user(&state.db, user.id).await?;
    Ok(Json(UserProfile {
        user: PublicUser {
            id: user.id,
            email: user.email,
        },
        cards: cards.into_iter().map(CardSummary::from).collect(),
    }))
}

/// Card detail plus its comment thread. A pending card is visible only to
/// its owner and to admins; everyone else sees a 404 rather than a hint
/// that the card exists.
#[instrument(skip(state, viewer))]
pub async fn card_details(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CardDetails>> {
    let card = TradingCard::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("trading card"))?;

    if !card.approved {
        let allowed = match viewer {
            Some(v) if v.user_id == card.user_id => true,
            Some(v) => User::find_by_id(&state.db, v.user_id)
                .await?
                .map(|u| u.is_admin)
                .unwrap_or(false),
            None => false,
        };
        if !allowed {
            return Err(AppError::NotFound("trading card"));
        }
    }

    let image_url = match card.image_key.as_deref() {
        Some(key) => Some(presign_image(&state, key).await?),
        None => None,
    };
    let comments = Comment::list_by_card(&state.db, card.id).await?;

    Ok(Json(CardDetails {
        id: card.id,
        user_id: card.user_id,
        title: card.title,
        description: card.description,
        approved: card.approved,
        created_at: card.created_at,
        image_url,
        comments: comments.into_iter().map(Into::into).collect(),
    }))
}

/// The pending→approved transition. Only reachable with the admin flag;
/// a plain session gets 403 from the extractor and the card is untouched.
#[instrument(skip(state, admin))]
pub async fn approve(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    let card = TradingCard::approve(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("trading card"))?;
    info!(card_id = %card.id, admin_id = %admin.0.user_id, "card approved");
    Ok(Redirect::to("/admin/dashboard"))
}

#[instrument(skip(state, _admin))]
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<CardSummary>>> {
    let cards = TradingCard::list_all(&state.db).await?;
    Ok(Json(cards.into_iter().map(CardSummary::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_without_keyword_matches_nothing() {
        // Short-circuits before the database is touched
        let state = crate::state::AppState::fake();
        let Json(cards) = search(State(state), Query(SearchQuery { keyword: None }))
            .await
            .expect("search");
        assert!(cards.is_empty());
    }

    #[tokio::test]
    async fn search_with_blank_keyword_matches_nothing() {
        let state = crate::state::AppState::fake();
        let Json(cards) = search(
            State(state),
            Query(SearchQuery {
                keyword: Some("   ".into()),
            }),
        )
        .await
        .expect("search");
        assert!(cards.is_empty());
    }

    #[test]
    fn card_fields_must_be_non_empty() {
        assert!(validate_card_fields("Ace", "a fine card").is_ok());
        assert!(matches!(
            validate_card_fields("", "d"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_card_fields("t", "   "),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn card_summary_keeps_approval_flag() {
        let card = TradingCard {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Ace".into(),
            description: "a fine card".into(),
            image_key: None,
            approved: false,
            created_at: time::OffsetDateTime::UNIX_EPOCH,
        };
        let summary = CardSummary::from(card);
        assert!(!summary.approved);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"approved\":false"));
    }
}
