// Token-bucket allowance bookkeeping
// Pure arithmetic; callers persist the resulting allowance atomically

/// Permitted requests per window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Maximum requests per window
    pub limit: i64,
    /// Window length in seconds
    pub window: i64,
}

impl RateLimit {
    /// `limit` requests per second
    pub const fn per_second(limit: i64) -> Self {
        Self { limit, window: 1 }
    }
}

/// Persisted allowance state: remaining requests and when that was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allowance {
    pub remaining: i64,
    /// Unix timestamp (seconds)
    pub updated_at: i64,
}

/// Outcome of charging one request against an allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: i64,
    pub remaining: i64,
    /// Seconds until the allowance is fully replenished
    pub reset: i64,
    /// State to persist for the next request
    pub allowance: Allowance,
}

/// Charges one request against `current` at time `now`
///
/// The allowance refills at `limit / window` per second, is capped at
/// `limit`, and a request is rejected once fewer than one remains. A
/// rejected request still records `now` with a zero allowance.
///
/// # Example
/// ```
/// use token_api::domain::rate_limit::{consume, Allowance, RateLimit};
///
/// let decision = consume(
///     RateLimit::per_second(2),
///     Allowance { remaining: 2, updated_at: 100 },
///     100,
/// );
/// assert!(decision.allowed);
/// assert_eq!(decision.remaining, 1);
/// ```
pub fn consume(rate: RateLimit, current: Allowance, now: i64) -> RateLimitDecision {
    let window = rate.window.max(1);
    let elapsed = now.saturating_sub(current.updated_at);
    let refill = elapsed.saturating_mul(rate.limit) / window;
    let allowance = current.remaining.saturating_add(refill).min(rate.limit);

    if allowance < 1 {
        return RateLimitDecision {
            allowed: false,
            limit: rate.limit,
            remaining: 0,
            reset: window,
            allowance: Allowance {
                remaining: 0,
                updated_at: now,
            },
        };
    }

    // allowance >= 1 implies limit >= 1
    let remaining = allowance - 1;
    RateLimitDecision {
        allowed: true,
        limit: rate.limit,
        remaining,
        reset: (rate.limit - allowance + 1) * window / rate.limit,
        allowance: Allowance {
            remaining,
            updated_at: now,
        },
    }
}
