// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SprintSync - Task Tracking API
//!
//! Username/password login, signed bearer tokens and admin/owner access
//! control in front of a small task tracker.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Password hashing, token issuance and principal resolution
//! - `config` - Environment-driven settings
//! - `storage` - JSON file store for users and tasks

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
