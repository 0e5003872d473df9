//! Token API Library
//!
//! REST service for user-owned tokens: bearer authentication against the
//! user's auth key, CRUD over tokens, and a per-user token-bucket rate
//! limiter persisted on the user record.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
