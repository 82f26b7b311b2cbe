//! depot-scout runtime
//!
//! Hosts the agent for chat front ends:
//! - Sessions holding a bounded window of past exchanges
//! - Graceful replies when a question fails
//! - Slack Events API server with one session per channel

pub mod session;
pub mod slack;

pub use session::*;
pub use slack::*;
