// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing with Argon2id.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$<salt>$<hash>`), so
//! the salt and cost parameters travel with the hash and verification needs
//! nothing else. Both functions are CPU-bound; async callers should run them
//! through `spawn_blocking`.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use super::AuthError;

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Iterations
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            time_cost: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashingParams {
    fn hasher(&self) -> Result<Argon2<'static>, AuthError> {
        let params = Params::new(self.memory_kib, self.time_cost, self.parallelism, None)
            .map_err(|e| AuthError::Internal(format!("Invalid Argon2 params: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str, params: &HashingParams) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = params
        .hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

/// Check a password against a stored PHC string.
///
/// Returns `false` for a mismatch and for a malformed stored hash alike.
/// The digest comparison inside `argon2` is constant-time.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };

    // Parameters come from the PHC string, not from the hasher instance.
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Like [`verify_password`], but a malformed stored hash still costs one
/// verification against `dummy_hash` before failing.
pub fn verify_password_or_dummy(password: &str, stored_hash: &str, dummy_hash: &str) -> bool {
    if PasswordHash::new(stored_hash).is_ok() {
        verify_password(password, stored_hash)
    } else {
        let _ = verify_password(password, dummy_hash);
        false
    }
}

#[cfg(test)]
pub(crate) fn test_params() -> HashingParams {
    HashingParams {
        memory_kib: 256,
        time_cost: 1,
        parallelism: 1,
    }
}
