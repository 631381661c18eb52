use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Form body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
}

/// Form body for password login.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// What the login entry point hands the presentation layer.
#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub google_client_id: String,
}

/// Query carried back from the Google sign-in redirect.
#[derive(Debug, Deserialize)]
pub struct OauthCallbackQuery {
    pub credential: String,
}

/// Public part of a user returned to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
}
