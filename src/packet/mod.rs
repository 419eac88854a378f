//! Synthetic test packets and the per-packet primitives the harness relies on:
//! integrity stamping/checking, the control-traffic skip filter and the
//! per-port MAC rewrite table.

pub mod error;
pub mod integrity;
pub mod mac;
pub mod skip;
pub mod types;

pub use error::{PacketError, PacketResult};
pub use integrity::{IntegrityOracle, IntegrityStatus};
pub use mac::{LaneEffects, MacEntry, MacRewrite, MacTable};
pub use skip::{NeverSkip, NonTestTraffic, SkipPredicate};
pub use types::{EtherHeader, Ipv4Header, MacAddr, Packet, UdpHeader, DIGEST_LEN, MAX_PAYLOAD};
