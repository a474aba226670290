//! Rate-limit extraction from response headers.

use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::types::RateLimit;

pub const LIMIT_REQUESTS: &str = "x-ratelimit-limit-requests";
pub const REMAINING_REQUESTS: &str = "x-ratelimit-remaining-requests";
pub const RESET_REQUESTS: &str = "x-ratelimit-reset-requests";
pub const LIMIT_TOKENS: &str = "x-ratelimit-limit-tokens";
pub const REMAINING_TOKENS: &str = "x-ratelimit-remaining-tokens";
pub const RESET_TOKENS: &str = "x-ratelimit-reset-tokens";

/// Reads rate-limit state from response headers.
pub trait RateLimitExtractor: Send + Sync {
    /// `None` when the headers carry no rate-limit information.
    fn extract(&self, headers: &HeaderMap) -> Option<RateLimit>;
}

/// Extractor for the `x-ratelimit-*` header family.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderRateLimitExtractor;

impl RateLimitExtractor for HeaderRateLimitExtractor {
    fn extract(&self, headers: &HeaderMap) -> Option<RateLimit> {
        let text = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim);
        let number = |name: &str| text(name).and_then(|v| v.parse::<u64>().ok());
        let duration = |name: &str| text(name).and_then(parse_duration);

        let rate_limit = RateLimit {
            requests_limit: number(LIMIT_REQUESTS),
            requests_remaining: number(REMAINING_REQUESTS),
            requests_reset: duration(RESET_REQUESTS),
            tokens_limit: number(LIMIT_TOKENS),
            tokens_remaining: number(REMAINING_TOKENS),
            tokens_reset: duration(RESET_TOKENS),
        };

        (rate_limit != RateLimit::default()).then_some(rate_limit)
    }
}

/// Parse a Go-style duration such as `6m0s`, `20ms` or `1h2m3.5s`.
///
/// A bare number is read as seconds.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut total_nanos = 0_u64;
    let mut rest = input;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let value: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "h" => 3_600_000_000_000.0,
            "m" => 60_000_000_000.0,
            "s" => 1_000_000_000.0,
            "ms" => 1_000_000.0,
            "us" | "µs" => 1_000.0,
            "ns" => 1.0,
            _ => return None,
        };
        rest = &rest[unit_len..];
        total_nanos = total_nanos.saturating_add((value * nanos_per_unit).round() as u64);
    }

    Some(Duration::from_nanos(total_nanos))
}
