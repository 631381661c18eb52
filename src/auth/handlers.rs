use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::dto::{LoginForm, LoginPage, OauthCallbackQuery, RegisterForm};
use super::extractors::CurrentUser;
use super::google::IdTokenVerifier;
use super::password::{hash_password, verify_password};
use super::repo::User;
use super::session::{self, Session};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .route("/oauth_callback", get(oauth_callback))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(mut form): Form<RegisterForm>,
) -> AppResult<Redirect> {
    form.email = form.email.trim().to_lowercase();

    if !is_valid_email(&form.email) {
        warn!(email = %form.email, "invalid email");
        return Err(AppError::Validation("invalid email".into()));
    }
    if form.password.len() < 8 {
        return Err(AppError::Validation("password too short".into()));
    }

    let hash = hash_password(&form.password)?;
    // The unique constraint is the duplicate check, so a racing second
    // registration fails instead of overwriting.
    let user = User::create(&state.db, &form.email, Some(&hash)).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Redirect::to("/login"))
}

#[instrument(skip(state))]
pub async fn login_page(State(state): State<AppState>) -> Json<LoginPage> {
    Json(LoginPage {
        google_client_id: state.config.google.client_id.clone(),
    })
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(mut form): Form<LoginForm>,
) -> AppResult<impl IntoResponse> {
    form.email = form.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &form.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %form.email, "login unknown email");
            AppError::InvalidCredentials
        })?;

    // Google-only accounts have no password to check against
    let hash = user
        .password_hash
        .as_deref()
        .ok_or(AppError::InvalidCredentials)?;
    if !verify_password(&form.password, hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let cookie = session::establish(&state, user.id).await?;
    info!(user_id = %user.id, "user logged in");
    Ok(([(SET_COOKIE, cookie)], Redirect::to("/")))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<impl IntoResponse> {
    Session::delete(&state.db, current.session_id).await?;
    info!(user_id = %current.user_id, "user logged out");
    Ok((
        [(SET_COOKIE, session::clear_cookie_value())],
        Redirect::to("/"),
    ))
}

#[instrument(skip(state, query))]
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<OauthCallbackQuery>,
) -> AppResult<impl IntoResponse> {
    let claims = state.google.verify(&query.credential).await?;
    let email = claims.email.trim().to_lowercase();

    let user = User::find_or_create_by_email(&state.db, &email).await?;
    let cookie = session::establish(&state, user.id).await?;

    info!(user_id = %user.id, subject = %claims.sub, "google sign-in");
    Ok(([(SET_COOKIE, cookie)], Redirect::to("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_and_rejects() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@x"));
    }

    #[test]
    fn login_page_exposes_client_id() {
        let page = LoginPage {
            google_client_id: "client-123".into(),
        };
        let json = serde_json::to_string(&page).unwrap();
        assert!(json.contains("client-123"));
    }

    #[tokio::test]
    async fn fake_verifier_rejects_tokens() {
        let state = crate::state::AppState::fake();
        let err = state.google.verify("anything").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
