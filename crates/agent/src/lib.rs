//! The routing and dispatch core of hospinav.
//!
//! Every user turn follows the same linear path:
//!
//! 1. **Admit** the message (credential present, non-empty, no turn in flight)
//! 2. **Route**: the navigator classifies the message into one specialist
//! 3. **Build context**: a bounded window of recent history plus the new message
//! 4. **Execute**: the specialist generates a reply with its capability tools
//! 5. **Append** the reply and return to idle
//!
//! Routing and execution each contain their own failures, so an admitted
//! turn always ends with exactly one reply in the conversation.

pub mod context;
pub mod executor;
pub mod orchestrator;
pub mod router;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{ContextBuilder, DEFAULT_CONTEXT_WINDOW};
pub use executor::{APOLOGY_MESSAGE, ExecutionOutcome, SpecialistExecutor};
pub use orchestrator::{Orchestrator, SYSTEM_ERROR_MESSAGE};
pub use router::{IntentRouter, RoutingOutcome};
