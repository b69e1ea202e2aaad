//! glustervol shared code
//!
//! This crate contains the error taxonomy, plugin protocol messages and
//! constants used by both the volume driver library and the CLI.

pub mod constants;
pub mod errors;
pub mod protocol;

pub use errors::{VolumeError, VolumeResult};
pub use protocol::{Capability, Scope, VolumeInfo};
