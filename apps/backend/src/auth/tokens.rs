//! Per-session player credentials.
//!
//! A token proves "I am player X of session Y" and nothing more.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::domain::{DomainError, InfraErrorKind};

pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerClaims {
    /// Player id
    pub sub: String,
    /// Session code the player belongs to
    pub session: String,
    pub iat: i64,
    pub exp: i64,
}

/// Capability check consumed by the session services.
pub trait Authenticator: Send + Sync {
    fn issue(&self, player_id: &str, session_code: &str) -> Result<String, DomainError>;

    /// The player id the token was issued to, if it is valid for this session.
    fn verify(&self, token: &str, session_code: &str) -> Option<String>;
}

/// HS256 JWT credentials.
pub struct TokenAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenAuth {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue_at(
        &self,
        player_id: &str,
        session_code: &str,
        now: SystemTime,
    ) -> Result<String, DomainError> {
        let iat = now
            .duration_since(UNIX_EPOCH)
            .map_err(|_| DomainError::infra(InfraErrorKind::Other("clock".into()), "Clock before epoch"))?
            .as_secs() as i64;

        let claims = PlayerClaims {
            sub: player_id.to_string(),
            session: session_code.to_uppercase(),
            iat,
            exp: iat + TOKEN_TTL_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            DomainError::infra(
                InfraErrorKind::Other("token".into()),
                format!("Failed to encode token: {e}"),
            )
        })
    }

    pub fn decode(&self, token: &str) -> Option<PlayerClaims> {
        // Default validation checks exp; pin the algorithm.
        let validation = Validation::new(Algorithm::HS256);
        match decode::<PlayerClaims>(token, &self.decoding, &validation) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                debug!(reason = ?err.kind(), "Rejected player token");
                None
            }
        }
    }
}

impl Authenticator for TokenAuth {
    fn issue(&self, player_id: &str, session_code: &str) -> Result<String, DomainError> {
        self.issue_at(player_id, session_code, SystemTime::now())
    }

    fn verify(&self, token: &str, session_code: &str) -> Option<String> {
        self.decode(token)
            .filter(|claims| claims.session.eq_ignore_ascii_case(session_code))
            .map(|claims| claims.sub)
    }
}
