//! Multi-agent orchestration for Baton.
//!
//! Three pieces: [`handoff`] is the per-thread protocol state machine for
//! transferring a conversation to another agent and getting it back,
//! [`router`] decides per message whether a thread follows its orchestrator
//! or an active handoff target, and [`sanitizer`] masks sensitive text
//! before it crosses an agent boundary.

pub mod handoff;
pub mod router;
pub mod sanitizer;

pub use handoff::{
    HandoffAccept, HandoffCoordinator, HandoffOutcome, HandoffPhase, HandoffRequest, HandoffReturn,
};
pub use router::{RouteDecision, StreamRouter};
pub use sanitizer::ContextSanitizer;
