//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `SessionState`: per-walker listing session flags (consent handling)
//! - `Checkpoint`: durable record of completed crawl scopes

mod checkpoint;
mod session;

// Re-export main types
pub use checkpoint::Checkpoint;
pub use session::SessionState;
