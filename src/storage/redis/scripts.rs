//! Server-side Lua scripts
//!
//! The script sources ship with the binary as assets under `scripts/`.
//! [`redis::Script`] hashes each one at startup and invokes it by SHA,
//! re-uploading transparently if the server has evicted it.

use redis::Script;

/// Sliding-window counter script (`scripts/sliding_window.lua`).
pub fn sliding_window() -> Script {
    Script::new(include_str!("scripts/sliding_window.lua"))
}

/// Token-bucket counter script (`scripts/token_bucket.lua`).
pub fn token_bucket() -> Script {
    Script::new(include_str!("scripts/token_bucket.lua"))
}
