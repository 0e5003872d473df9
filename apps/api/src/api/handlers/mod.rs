// HTTP handlers grouped by resource

pub mod apis;
pub mod auth;
pub mod tokens;
