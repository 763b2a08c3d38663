// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the authenticated principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::StoredUser;

/// Claims carried by an access token.
///
/// The token asserts identity only. Authorization data such as the admin
/// flag is always read from the store when the token is resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the principal's username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,
    /// Issued at timestamp (seconds since epoch)
    #[serde(default)]
    pub iat: i64,
}

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Opaque bearer string handed to the client
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// An authenticated identity.
///
/// This is the user record minus the password hash, and it is what every
/// handler receives after token resolution.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Principal {
    /// Unique user ID
    pub id: String,
    pub username: String,
    pub email: String,
    /// Whether this user may act on every resource
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredUser> for Principal {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_drops_password_hash() {
        let mut user = StoredUser::new("alice", "alice@example.com", "$argon2id$hash");
        user.is_admin = true;

        let principal = Principal::from(user.clone());
        assert_eq!(principal.id, user.id);
        assert_eq!(principal.username, "alice");
        assert!(principal.is_admin);

        let json = serde_json::to_value(&principal).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn claims_without_subject_deserialize() {
        let claims: Claims = serde_json::from_str(r#"{"exp": 1700000000}"#).unwrap();
        assert_eq!(claims.sub, None);
        assert_eq!(claims.iat, 0);
    }

    #[test]
    fn claims_serialize_standard_names() {
        let claims = Claims {
            sub: Some("alice".to_string()),
            exp: 1700003600,
            iat: 1700000000,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["sub"], "alice");
        assert_eq!(json["exp"], 1700003600);
        assert_eq!(json["iat"], 1700000000);
    }
}
