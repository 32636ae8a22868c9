use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::state::AppState;

/// JWT payload asserting a signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,     // user ID
    pub email: String,
    pub iss: String,  // issuer
    pub iat: usize,   // issued at (unix timestamp)
    pub exp: usize,   // expires at (unix timestamp)
}

/// Why a token was rejected. All variants collapse to 401 at the HTTP
/// boundary; they are distinguished so callers can log or message them
/// differently.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature or issuer invalid")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("token malformed")]
    Malformed,
}

/// Signs and validates identity tokens. Immutable after construction and
/// cheap to clone; safe to share across request handlers without locking.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
}

impl FromRef<AppState> for TokenIssuer {
    fn from_ref(state: &AppState) -> Self {
        let jwt = &state.config.jwt;
        Self::new(&jwt.secret, jwt.issuer.clone())
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
        }
    }

    /// Sign claims for a user. The token body is fully determined by the
    /// inputs and the clock; the caller picks the TTL.
    pub fn mint(&self, user_id: i64, email: &str, ttl: Duration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iss: self.issuer.clone(),
            iat: now.unix_timestamp() as usize,
            exp: (now + ttl).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    /// Verify signature and issuer, then expiry, and return the embedded
    /// claims. Expiry is checked with zero leeway: a token is rejected the
    /// second `exp` passes, with no skew window.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(classify_jwt_error)?;
        debug!(user_id = data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

fn classify_jwt_error(e: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;
    match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => TokenError::Malformed,
        _ => TokenError::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_issuer() -> TokenIssuer {
        TokenIssuer::new("dev-secret", "test-issuer")
    }

    #[test]
    fn mint_and_validate_roundtrip() {
        let issuer = make_issuer();
        let token = issuer
            .mint(42, "a@x.com", Duration::hours(24))
            .expect("mint");
        let claims = issuer.validate(&token).expect("validate");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.iss, "test-issuer");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let issuer = make_issuer();
        let token = issuer
            .mint(1, "a@x.com", Duration::seconds(-60))
            .expect("mint");
        assert_eq!(issuer.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_signature_is_rejected_as_invalid() {
        let issuer = make_issuer();
        let token = issuer.mint(1, "a@x.com", Duration::hours(1)).expect("mint");
        let dot = token.rfind('.').expect("jwt has three segments");
        let (head, sig) = token.split_at(dot + 1);
        let mut flipped = String::from(head);
        // flip the first signature character to a different base64 digit
        let first = sig.as_bytes()[0];
        flipped.push(if first == b'A' { 'B' } else { 'A' });
        flipped.push_str(&sig[1..]);
        assert_eq!(issuer.validate(&flipped), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_rejected_as_malformed() {
        let issuer = make_issuer();
        assert_eq!(issuer.validate("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(issuer.validate(""), Err(TokenError::Malformed));
    }

    #[test]
    fn wrong_secret_is_rejected_as_invalid() {
        let minter = TokenIssuer::new("secret-a", "test-issuer");
        let verifier = TokenIssuer::new("secret-b", "test-issuer");
        let token = minter.mint(1, "a@x.com", Duration::hours(1)).expect("mint");
        assert_eq!(verifier.validate(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn wrong_issuer_is_rejected_as_invalid() {
        let minter = TokenIssuer::new("same-secret", "issuer-a");
        let verifier = TokenIssuer::new("same-secret", "issuer-b");
        let token = minter.mint(1, "a@x.com", Duration::hours(1)).expect("mint");
        assert_eq!(verifier.validate(&token), Err(TokenError::Invalid));
    }
}
