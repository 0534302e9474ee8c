//! Unified exit codes. Part of the public contract: CI wrappers key off
//! these values.

pub const OK: i32 = 0;
/// Validation found problems with the manifest or the audio files.
pub const VALIDATION_FAILED: i32 = 1;
/// Bad configuration or arguments.
pub const CONFIG_ERROR: i32 = 2;
