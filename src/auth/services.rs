use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::Duration;
use tracing::{error, info, warn};

use crate::{
    auth::{
        credential::Credential,
        dto::{AuthResponse, PublicUser},
        repo::{RepoError, UserRepository},
        token::{Claims, TokenIssuer},
    },
    error::AuthError,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Emails are compared and stored in this form only.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Orchestrates registration and sign-in. Collaborators are injected at
/// construction; the service holds no mutable state and is shared across
/// request tasks without locking.
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, tokens: TokenIssuer, token_ttl: Duration) -> Self {
        Self {
            repo,
            tokens,
            token_ttl,
        }
    }

    /// Register a new account. Duplicate detection happens inside the
    /// atomic insert, never as a separate existence check.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            warn!(email = %email, "sign up rejected: invalid email");
            return Err(AuthError::InvalidEmail);
        }
        // An empty password never reaches the hasher; the credential stays
        // Unset and the persistence gate below rejects it.
        let credential = if password.is_empty() {
            Credential::Unset
        } else {
            Credential::set(password).map_err(|e| AuthError::Internal(e.into()))?
        };
        let Some(hash) = credential.hash() else {
            warn!(email = %email, "sign up rejected: no password set");
            return Err(AuthError::PasswordNotSet);
        };

        let user = match self.repo.insert(&email, hash).await {
            Ok(u) => u,
            Err(RepoError::DuplicateEmail) => {
                warn!(email = %email, "sign up rejected: email taken");
                return Err(AuthError::EmailTaken);
            }
            Err(RepoError::Storage(e)) => {
                error!(error = %e, "insert user failed");
                return Err(AuthError::Internal(e.into()));
            }
        };

        let token = self.tokens.mint(user.id, &user.email, self.token_ttl)?;
        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(AuthResponse {
            token,
            user: PublicUser::from(&user),
        })
    }

    /// Verify credentials and mint a fresh token. Unknown email and wrong
    /// password are logged distinctly but surfaced as the same error.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            warn!(email = %email, "sign in rejected: invalid email");
            return Err(AuthError::InvalidEmail);
        }

        let user = match self.repo.find_by_email(&email).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!(email = %email, "sign in unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "find_by_email failed");
                return Err(AuthError::Internal(e.into()));
            }
        };

        if !user.credential.verify(password) {
            warn!(email = %email, user_id = user.id, "sign in invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.mint(user.id, &user.email, self.token_ttl)?;
        info!(user_id = user.id, email = %user.email, "user signed in");
        Ok(AuthResponse {
            token,
            user: PublicUser::from(&user),
        })
    }

    /// Resolve the account behind already-validated claims, for the `/me`
    /// surface. A token whose subject no longer matches a stored user is
    /// rejected the same way bad credentials are.
    pub async fn current_user(&self, claims: &Claims) -> Result<PublicUser, AuthError> {
        match self.repo.find_by_email(&claims.email).await {
            Ok(Some(user)) if user.id == claims.sub => Ok(PublicUser::from(&user)),
            Ok(_) => {
                warn!(user_id = claims.sub, "token subject no longer resolves");
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => {
                error!(error = %e, "find_by_email failed");
                Err(AuthError::Internal(e.into()))
            }
        }
    }
}
