use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::post,
    Form, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::CommentForm;
use super::repo::Comment;
use crate::auth::extractors::CurrentUser;
use crate::cards::repo::TradingCard;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/trading_card/:id/add_comment", post(add_comment))
}

/// Append a comment to an existing card (any approval state) and bounce
/// back to the card's detail view.
#[instrument(skip(state, form))]
pub async fn add_comment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Form(form): Form<CommentForm>,
) -> AppResult<Redirect> {
    let card = TradingCard::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("trading card"))?;

    let text = form.comment.trim();
    if text.is_empty() {
        return Err(AppError::Validation("comment text is required".into()));
    }

    let comment = Comment::create(&state.db, card.id, current.user_id, text).await?;
    info!(comment_id = %comment.id, card_id = %card.id, user_id = %current.user_id, "comment added");
    Ok(Redirect::to(&format!("/trading_card/{}", card.id)))
}

#[cfg(test)]
mod tests {
    use super::super::dto::CommentView;
    use super::super::repo::Comment;
    use uuid::Uuid;

    #[test]
    fn comment_view_carries_text_and_author() {
        let comment = Comment {
            id: Uuid::new_v4(),
            trading_card_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            text: "the cat sat".into(),
            created_at: time::OffsetDateTime::UNIX_EPOCH,
        };
        let view = CommentView::from(comment.clone());
        assert_eq!(view.text, "the cat sat");
        assert_eq!(view.user_id, comment.user_id);
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("the cat sat"));
    }
}
