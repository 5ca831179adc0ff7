//! Scheduling engine: ready queues, decision policies, and the orchestrator

mod core;
mod policy;
mod queue;

pub use self::core::GameSched;
pub use policy::{Selection, allowed_on_isolated, classify, select_cpu};
pub use queue::DispatchQueues;
