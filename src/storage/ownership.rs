// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for user-owned resources.
//!
//! A principal may act on a resource when it owns the resource or carries
//! the admin flag.

use crate::auth::{AuthError, Principal};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_user_id(&self) -> &str;
}

/// Trait for enforcing ownership on resource access.
pub trait OwnershipEnforcer {
    /// Verify that the principal owns this resource or is an admin.
    ///
    /// # Errors
    /// Returns `AuthError::InsufficientPermission` otherwise.
    fn verify_access(&self, principal: &Principal) -> Result<(), AuthError>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_access(&self, principal: &Principal) -> Result<(), AuthError> {
        if principal.is_admin || self.owner_user_id() == principal.id {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermission)
        }
    }
}
