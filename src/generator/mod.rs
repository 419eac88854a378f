pub mod generator;
pub mod rate_limiter;

pub use generator::Generator;
pub use rate_limiter::PacketRateLimiter;
