// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Username/password login, signed bearer tokens and the admin gate.
//!
//! ## Auth Flow
//!
//! 1. Client posts credentials to `/auth/token`
//! 2. [`AuthCore::authenticate`] verifies them against the Argon2 hash in
//!    the user store
//! 3. [`AuthCore::issue_token`] signs `{sub, exp, iat}` with the server
//!    secret
//! 4. Client sends `Authorization: Bearer <token>` on later requests
//! 5. The [`Auth`] extractor calls [`AuthCore::resolve`], which verifies
//!    signature and expiry and then loads the live user record
//!
//! ## Security
//!
//! - Unknown user and wrong password both surface as `InvalidCredentials`
//!   and cost the same Argon2 work
//! - No expiry leeway; expired or tampered tokens are `InvalidToken`
//! - Tokens carry identity only; the admin flag is always read from the store
//! - There is no revocation: a token stays valid until `exp`

pub mod claims;
pub mod error;
pub mod extractor;
pub mod password;
pub mod service;

pub use claims::{Claims, IssuedToken, Principal};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use password::HashingParams;
pub use service::{require_admin, AuthCore, AuthSettings, PrincipalStore};
