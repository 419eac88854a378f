//! Packet rate limiting for the generator using the governor crate

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Paces generated packets to a target rate
#[derive(Clone)]
pub struct PacketRateLimiter {
    /// `None` means unlimited
    limiter: Option<Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
}

impl PacketRateLimiter {
    /// Create a limiter for `packets_per_second` (0 = unlimited).
    /// Rates above `u32::MAX` are clamped.
    pub fn new(packets_per_second: u64) -> Self {
        let rate = u32::try_from(packets_per_second).unwrap_or(u32::MAX);
        let limiter = NonZeroU32::new(rate)
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));

        Self { limiter }
    }

    /// Wait until the next packet may be emitted
    pub async fn wait_for_packet(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_unlimited_rate_limiter() {
        let limiter = PacketRateLimiter::new(0);
        assert!(!limiter.is_enabled());

        let start = Instant::now();
        for _ in 0..10_000 {
            limiter.wait_for_packet().await;
        }
        assert!(start.elapsed().as_millis() < 500);
    }

    #[tokio::test]
    async fn test_zero_means_unlimited() {
        assert!(!PacketRateLimiter::new(0).is_enabled());
        assert!(PacketRateLimiter::new(u64::MAX).is_enabled());
    }

    #[tokio::test]
    async fn test_rate_limited_packets() {
        // 20 packets/s: the burst allowance is spent, then the rest are paced
        let limiter = PacketRateLimiter::new(20);

        let start = Instant::now();
        for _ in 0..25 {
            limiter.wait_for_packet().await;
        }
        let elapsed = start.elapsed();

        assert!(elapsed.as_millis() >= 150, "paced too fast: {elapsed:?}");
        assert!(elapsed.as_millis() < 5000, "rate limiter took too long");
    }
}
