use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::COOKIE, request::Parts},
};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use super::repo::User;
use super::session::{self, Session, SessionKeys};
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller, resolved from the session cookie.
///
/// Rejection is [`AppError::Unauthenticated`], which renders as a redirect
/// to `/login`.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = parts
            .headers
            .get(COOKIE)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthenticated)?;
        let token = session::token_from_cookies(cookies).ok_or(AppError::Unauthenticated)?;

        let keys = SessionKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired session token");
            AppError::Unauthenticated
        })?;

        // The signature alone is not enough: logout deletes the row, which
        // must revoke the cookie immediately.
        let session = Session::find(&state.db, claims.sid)
            .await?
            .ok_or(AppError::Unauthenticated)?;
        if session.expires_at <= OffsetDateTime::now_utc() {
            return Err(AppError::Unauthenticated);
        }

        Ok(CurrentUser {
            user_id: claims.sub,
            session_id: claims.sid,
        })
    }
}

/// An authenticated caller holding the administrator flag.
///
/// A valid session without the flag rejects with [`AppError::Forbidden`],
/// distinct from the unauthenticated redirect.
pub struct AdminUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        let user = User::find_by_id(&state.db, current.user_id)
            .await?
            .ok_or(AppError::Unauthenticated)?;
        if !user.is_admin {
            warn!(user_id = %user.id, "non-admin hit an admin route");
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(current))
    }
}
