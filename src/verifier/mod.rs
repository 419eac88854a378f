pub mod lane;

pub use lane::{LaneContext, LaneOutcome, LaneVerifier};
