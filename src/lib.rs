//! NAR (Non-Axiomatic Reasoner) - A Rust implementation of the Non-Axiomatic Reasoning System
//!
//! This crate provides a framework for implementing Non-Axiomatic Logic (NAL), which is the
//! logical foundation of the Non-Axiomatic Reasoning System (NARS). NARS is a general-purpose
//! artificial intelligence system that realizes a methodology of intelligent reasoning that
//! is not based on mathematical logic, but on a novel approach to intelligence.

pub mod bag;
pub mod budget;
pub mod concept;
pub mod config;
pub mod cycle;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod memory;
pub mod nar;
pub mod parser;
pub mod rule;
pub mod stamp;
pub mod stream;
pub mod table;
pub mod task;
pub mod term;
pub mod tracer;
pub mod truth;
pub mod unify;

// Re-export the main components for easier access
pub use concept::Concept;
pub use config::Config;
pub use cycle::{run_cycles, step, StepStats};
pub use error::{DropReason, NarsError};
pub use event::{Event, EventBus, EventKind};
pub use nar::Nar;
pub use stream::{ConsumerFeedback, SchedulerStatsSnapshot, StreamReasoner};
pub use task::Task;
pub use term::Term;
pub use tracer::{TraceEntry, Tracer};
pub use truth::Truth;

#[cfg(test)]
mod tests {
    #[test]
    fn it_works() {
        assert_eq!(2 + 2, 4);
    }
}