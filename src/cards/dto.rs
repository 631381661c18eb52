use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::TradingCard;
use crate::auth::dto::PublicUser;
use crate::comments::dto::CommentView;

#[derive(Debug, Serialize)]
pub struct CardSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub approved: bool,
    pub created_at: OffsetDateTime,
}

impl From<TradingCard> for CardSummary {
    fn from(c: TradingCard) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            title: c.title,
            description: c.description,
            approved: c.approved,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CardDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub approved: bool,
    pub created_at: OffsetDateTime,
    pub image_url: Option<String>,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
pub struct CreatedCardResponse {
    pub id: Uuid,
    pub approved: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub user: PublicUser,
    pub cards: Vec<CardSummary>,
}
