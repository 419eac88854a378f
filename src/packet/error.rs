use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Payload size {size} exceeds maximum of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Payload size {size} cannot hold the {min}-byte header digest")]
    PayloadTooSmall { size: usize, min: usize },

    #[error("Truncated frame: need at least {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),
}

pub type PacketResult<T> = Result<T, PacketError>;
