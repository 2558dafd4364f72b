//! Per-IP rate limiting via governor / `tower_governor`.
//!
//! The write surface gets two tiers: a strict one on the credential
//! endpoints and a looser one on authenticated mutations such as like and
//! bookmark toggles. Reads are not limited.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Resolves the client IP behind a reverse proxy.
///
/// `X-Forwarded-For` wins (first hop in the chain is the client), then
/// `X-Real-IP`. Without either header the request is rejected rather than
/// keyed on the proxy's address, which would throttle everyone together.
#[derive(Clone, Copy)]
pub struct ProxyIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ProxyIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|chain| chain.split(',').next())
            .and_then(|hop| hop.trim().parse::<IpAddr>().ok());

        let real_ip = || {
            req.headers()
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|raw| raw.trim().parse::<IpAddr>().ok())
        };

        forwarded
            .or_else(real_ip)
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// The layer type both tiers produce.
pub type RateLimiterLayer =
    GovernorLayer<ProxyIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn limiter(replenish_secs: u64, burst: u32) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ProxyIpKeyExtractor)
        .per_second(replenish_secs)
        .burst_size(burst)
        .finish()
        // Both call sites pass positive literals, which the builder accepts.
        .expect("governor config");
    GovernorLayer::new(Arc::new(config))
}

/// Login and registration: one token every 6 seconds, burst of 5.
///
/// Roughly ten attempts a minute per address, enough to slow credential
/// stuffing without locking out someone who fat-fingers a password.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    limiter(6, 5)
}

/// Authenticated writes: one token a second, burst of 50.
///
/// Keeps toggle spam from hammering the database while staying invisible
/// to normal browsing.
#[must_use]
pub fn mutation_rate_limiter() -> RateLimiterLayer {
    limiter(1, 50)
}
