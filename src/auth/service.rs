// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential verification, token issuance and principal resolution.
//!
//! `AuthCore` is built once from [`AuthSettings`] at startup and shared
//! behind an `Arc`. It holds no mutable state. Every request performs a
//! full verify-then-lookup cycle against the [`PrincipalStore`]; nothing
//! is cached between requests.
//!
//! Nothing in this module logs passwords, hashes or token strings.

use std::fmt;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::{
    password::{self, HashingParams},
    AuthError, Claims, IssuedToken, Principal,
};
use crate::storage::{StorageResult, StoredUser};

/// Lookup the core needs from the user store.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Find a user record by exact username.
    async fn find_by_username(&self, username: &str) -> StorageResult<Option<StoredUser>>;
}

/// Immutable auth configuration, injected at startup.
#[derive(Clone)]
pub struct AuthSettings {
    /// HMAC signing secret
    pub secret: String,
    /// Signing algorithm (HS256, HS384 or HS512)
    pub algorithm: Algorithm,
    /// Default lifetime of issued tokens
    pub access_token_ttl: Duration,
    pub hashing: HashingParams,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("hashing", &self.hashing)
            .finish()
    }
}

/// Outcome of checking a username/password pair.
///
/// The two failure variants stay distinct internally and are merged into
/// `AuthError::InvalidCredentials` before leaving the core.
#[derive(Debug)]
enum LoginOutcome {
    Verified(StoredUser),
    UnknownUser,
    WrongPassword,
}

/// The authentication and authorization core.
pub struct AuthCore {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_token_ttl: Duration,
    hashing: HashingParams,
    /// Verified against when the username is unknown, so both login
    /// failures cost one full Argon2 run.
    dummy_hash: String,
}

impl AuthCore {
    /// Build the core from settings.
    ///
    /// # Errors
    /// `AuthError::Internal` if the secret is empty, the algorithm is not an
    /// HMAC algorithm, or the hashing parameters are rejected.
    pub fn new(settings: AuthSettings) -> Result<Self, AuthError> {
        if settings.secret.is_empty() {
            return Err(AuthError::Internal("signing secret is empty".to_string()));
        }
        if !matches!(
            settings.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::Internal(format!(
                "unsupported signing algorithm {:?}",
                settings.algorithm
            )));
        }

        let dummy_hash = password::hash_password(&uuid::Uuid::new_v4().to_string(), &settings.hashing)?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            algorithm: settings.algorithm,
            access_token_ttl: settings.access_token_ttl,
            hashing: settings.hashing,
            dummy_hash,
        })
    }

    /// Default token lifetime.
    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// Hash a password on the blocking pool.
    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        let params = self.hashing;
        tokio::task::spawn_blocking(move || password::hash_password(&password, &params))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {e}")))?
    }

    async fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let stored_hash = stored_hash.to_owned();
        let dummy_hash = self.dummy_hash.clone();
        tokio::task::spawn_blocking(move || {
            password::verify_password_or_dummy(&password, &stored_hash, &dummy_hash)
        })
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task failed: {e}")))
    }

    async fn check_credentials<S>(
        &self,
        store: &S,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthError>
    where
        S: PrincipalStore + ?Sized,
    {
        let record = match store.find_by_username(username).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Principal lookup failed during login");
                None
            }
        };

        match record {
            Some(user) => {
                if self.verify_password(password, &user.password_hash).await? {
                    Ok(LoginOutcome::Verified(user))
                } else {
                    Ok(LoginOutcome::WrongPassword)
                }
            }
            None => {
                self.verify_password(password, &self.dummy_hash).await?;
                Ok(LoginOutcome::UnknownUser)
            }
        }
    }

    /// Verify a username/password pair.
    ///
    /// # Errors
    /// `AuthError::InvalidCredentials` for an unknown user and for a wrong
    /// password alike.
    pub async fn authenticate<S>(
        &self,
        store: &S,
        username: &str,
        password: &str,
    ) -> Result<Principal, AuthError>
    where
        S: PrincipalStore + ?Sized,
    {
        match self.check_credentials(store, username, password).await? {
            LoginOutcome::Verified(user) => {
                tracing::info!(user_id = %user.id, "Login succeeded");
                Ok(user.into())
            }
            LoginOutcome::UnknownUser | LoginOutcome::WrongPassword => {
                tracing::info!("Login rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Sign a token for `principal`, valid for `ttl` or the configured default.
    pub fn issue_token(
        &self,
        principal: &Principal,
        ttl: Option<Duration>,
    ) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl.unwrap_or(self.access_token_ttl))
            .ok_or_else(|| AuthError::Internal("Token expiry out of range".to_string()))?;

        let claims = Claims {
            sub: Some(principal.username.clone()),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token signing failed: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature and expiry. A token is valid strictly before `exp`.
    fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.reject_tokens_expiring_in_less_than = 1;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(reason = ?e.kind(), "Token rejected");
            AuthError::InvalidToken
        })?;

        Ok(data.claims)
    }

    /// Validate a bearer token and load the live principal it names.
    ///
    /// # Errors
    /// `AuthError::InvalidToken` if the token fails validation, carries no
    /// subject, or names a user that no longer exists. A token issued before
    /// the current record with its username was created is also rejected.
    pub async fn resolve<S>(&self, store: &S, token: &str) -> Result<Principal, AuthError>
    where
        S: PrincipalStore + ?Sized,
    {
        let claims = self.decode_claims(token)?;
        let username = claims.sub.ok_or(AuthError::InvalidToken)?;

        match store.find_by_username(&username).await {
            // Issued before this record existed: the name was reused
            Ok(Some(user)) if claims.iat < user.created_at.timestamp() => {
                tracing::info!(user_id = %user.id, "Token predates its subject's account");
                Err(AuthError::InvalidToken)
            }
            Ok(Some(user)) => Ok(user.into()),
            Ok(None) => {
                tracing::info!("Token subject no longer exists");
                Err(AuthError::InvalidToken)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Principal lookup failed during token resolution");
                Err(AuthError::InvalidToken)
            }
        }
    }

    /// Same as the free [`require_admin`].
    pub fn require_admin(&self, principal: &Principal) -> Result<(), AuthError> {
        require_admin(principal)
    }
}

/// Fail unless the principal carries the admin flag.
pub fn require_admin(principal: &Principal) -> Result<(), AuthError> {
    if principal.is_admin {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermission)
    }
}
