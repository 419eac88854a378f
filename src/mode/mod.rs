//! Test mode selection. Everything that differs between the separate, split
//! and partition tests is resolved here once and handed to the generator,
//! the lane verifiers and the judge as a single [`ModeProfile`].

pub mod error;
pub mod profile;
pub mod types;

pub use error::{ModeError, ModeResult};
pub use profile::{Bounds, ModeProfile};
pub use types::{TagPorts, TestMode};
