pub mod entitlements;
pub mod intents;
pub mod progress;
pub mod replies;
pub mod responder;
pub mod router;
pub mod session;
pub mod throttle;

pub use responder::{Inbound, MessageRef, Responder};
pub use router::Orchestrator;
