//! Editor access tokens.
//!
//! Quill does not manage accounts. Whatever service logs editors in signs an
//! HS256 token with the shared `JWT_SECRET`, and every write here is
//! attributed to the token's `sub`.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use quill_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_TTL_MINS: i64 = 15;

/// Payload of an editor token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EditorClaims {
    /// `users.id` recorded as `editor_id` on revisions.
    pub sub: DbId,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_mins: i64,
}

impl JwtConfig {
    /// Reads `JWT_SECRET` (required) and `JWT_ACCESS_EXPIRY_MINS` (default 15).
    ///
    /// Panics on a missing or empty secret, like the rest of startup config.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let ttl_mins = match std::env::var("JWT_ACCESS_EXPIRY_MINS") {
            Ok(raw) => raw
                .parse()
                .expect("JWT_ACCESS_EXPIRY_MINS must be a whole number of minutes"),
            Err(_) => DEFAULT_TTL_MINS,
        };

        Self { secret, ttl_mins }
    }

    /// Sign a token for `editor_id`. Used by tests and local tooling.
    pub fn issue(&self, editor_id: DbId, role: &str) -> jsonwebtoken::errors::Result<String> {
        let iat = chrono::Utc::now().timestamp();
        let claims = EditorClaims {
            sub: editor_id,
            role: role.to_owned(),
            exp: iat + self.ttl_mins * 60,
            iat,
            jti: Uuid::new_v4().to_string(),
        };
        self.sign(&claims)
    }

    /// Check signature and expiry.
    pub fn verify(&self, token: &str) -> jsonwebtoken::errors::Result<EditorClaims> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        decode::<EditorClaims>(token, &key, &Validation::default()).map(|data| data.claims)
    }

    fn sign(&self, claims: &EditorClaims) -> jsonwebtoken::errors::Result<String> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }
}
