//! Turn context construction.
//!
//! Specialists never see the whole conversation. Each invocation gets a
//! bounded, role-normalised window of recent messages followed by the new
//! user message.
//!
//! | Speaker | Role in context |
//! |---------|-----------------|
//! | user | `user` |
//! | agent (navigator or any specialist) | `agent` |
//! | system error | dropped |

pub mod builder;

pub use builder::{ContextBuilder, DEFAULT_CONTEXT_WINDOW};
