use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Comment;

/// Form body for posting a comment. The field is named `comment` to match
/// the upload form.
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: OffsetDateTime,
}

impl From<Comment> for CommentView {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            text: c.text,
            created_at: c.created_at,
        }
    }
}
