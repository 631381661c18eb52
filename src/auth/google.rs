use axum::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;

/// Claims extracted from a verified Google ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleClaims {
    /// Stable subject identifier assigned by Google.
    pub sub: String,
    pub email: String,
}

/// External identity-token verification, behind a trait so tests can stub
/// the network round trip.
#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<GoogleClaims, AppError>;
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

pub struct GoogleVerifier {
    http: reqwest::Client,
    client_id: String,
    jwks_url: String,
}

impl GoogleVerifier {
    pub fn new(client_id: String, jwks_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
            jwks_url,
        }
    }

    /// Look up the RSA public key named by the token header.
    ///
    /// Google rotates keys, so the set is fetched per verification rather
    /// than pinned at startup.
    async fn fetch_key(&self, kid: &str) -> Result<DecodingKey, AppError> {
        let jwks: Jwks = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("fetch jwks: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("parse jwks: {e}")))?;

        let jwk = jwks
            .keys
            .iter()
            .find(|k| k.kid == kid)
            .ok_or(AppError::InvalidToken)?;
        DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| {
            warn!(error = %e, kid = %kid, "unusable jwk");
            AppError::InvalidToken
        })
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleVerifier {
    async fn verify(&self, token: &str) -> Result<GoogleClaims, AppError> {
        let header = decode_header(token).map_err(|e| {
            warn!(error = %e, "malformed id token");
            AppError::InvalidToken
        })?;
        let kid = header.kid.ok_or(AppError::InvalidToken)?;
        let key = self.fetch_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(std::slice::from_ref(&self.client_id));
        validation.set_issuer(&["accounts.google.com", "https://accounts.google.com"]);

        let data = decode::<GoogleClaims>(token, &key, &validation).map_err(|e| {
            warn!(error = %e, "id token rejected");
            AppError::InvalidToken
        })?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_verifier() -> GoogleVerifier {
        GoogleVerifier::new(
            "test-client-id".into(),
            // Never reached in these tests: verification fails before the fetch
            "https://fake.local/certs".into(),
        )
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let err = make_verifier().verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn token_without_kid_is_invalid() {
        // Well-formed JWT, but HS256 and no kid in the header
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &serde_json::json!({ "sub": "123", "email": "a@x.com", "exp": 4102444800u64 }),
            &jsonwebtoken::EncodingKey::from_secret(b"whatever"),
        )
        .expect("encode");
        let err = make_verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn jwks_document_parses() {
        let body = r#"{
            "keys": [
                { "kty": "RSA", "alg": "RS256", "use": "sig",
                  "kid": "abc123", "n": "0vx7agoebGcQSuu", "e": "AQAB" },
                { "kty": "RSA", "alg": "RS256", "use": "sig",
                  "kid": "def456", "n": "4vx7agoebGcQSuu", "e": "AQAB" }
            ]
        }"#;
        let jwks: Jwks = serde_json::from_str(body).expect("parse");
        assert_eq!(jwks.keys.len(), 2);
        assert_eq!(jwks.keys[0].kid, "abc123");
        assert_eq!(jwks.keys[1].e, "AQAB");
    }
}
