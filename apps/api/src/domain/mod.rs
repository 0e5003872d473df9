// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of transport concerns

pub mod errors;
pub mod rate_limit;
pub mod repositories;
pub mod token;
pub mod user;
