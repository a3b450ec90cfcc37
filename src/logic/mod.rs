pub mod calendar;
pub mod engine;
pub mod orchestrator;
pub mod rain_delay;
pub mod run_lock;
pub mod runtime;

pub use engine::DecisionEngine;
pub use orchestrator::{Orchestrator, RunOutcome};
pub use run_lock::RunLock;
