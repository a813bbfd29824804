//! Session extraction
//!
//! The identity provider itself is out of scope: it issues signed tokens
//! carrying a stable user id. This module verifies those tokens and turns
//! them into an explicit [`Session`] value that handlers pass into service
//! calls. There is no ambient current-user state anywhere in the process.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims expected in a session token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Stable user id issued by the identity provider
    pub sub: String,
    /// Expiry, seconds since epoch
    pub exp: i64,
}

/// Verifies session tokens against the shared secret
#[derive(Clone)]
pub struct SessionVerifier {
    secret: String,
}

impl SessionVerifier {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Verify a token and extract its claims
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}

/// An authenticated session, extracted per request
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
struct AuthError {
    error: AuthErrorDetails,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetails {
    code: String,
    message: String,
}

impl AuthError {
    fn new(code: &str, message: &str) -> Self {
        Self {
            error: AuthErrorDetails {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    SessionVerifier: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthError::new(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                    .into_response()
                })?;

        let verifier = SessionVerifier::from_ref(state);

        let claims = verifier.verify(bearer.token()).map_err(|e| {
            let (code, message) = match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ("TOKEN_EXPIRED", "Token has expired")
                }
                _ => ("INVALID_TOKEN", "Invalid token"),
            };
            AuthError::new(code, message).into_response()
        })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            AuthError::new("INVALID_TOKEN", "Invalid user ID in token").into_response()
        })?;

        Ok(Session { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn make_token(sub: &str, secret: &str, exp_offset_secs: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: chrono::Utc::now().timestamp() + exp_offset_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        let verifier = SessionVerifier::new("secret".to_string());
        let user_id = Uuid::new_v4();
        let token = make_token(&user_id.to_string(), "secret", 3600);

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let verifier = SessionVerifier::new("secret".to_string());
        let token = make_token("user", "other-secret", 3600);
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let verifier = SessionVerifier::new("secret".to_string());
        let token = make_token("user", "secret", -3600);
        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }
}
