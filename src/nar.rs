//! `Nar`: the top-level kernel orchestrator tying memory, the event bus,
//! the parser, and both reasoning drivers (synchronous cycle runner and
//! background stream reasoner) together behind the kernel operations
//! table (spec.md §6).

use std::sync::Arc;

use crossbeam::channel::Receiver;
use parking_lot::Mutex;

use crate::config::Config;
use crate::cycle::{self, StepStats};
use crate::error::NarsError;
use crate::event::{Event, EventBus, EventKind};
use crate::memory::{Memory, MemoryStats};
use crate::parser;
use crate::stream::{ConsumerFeedback, SchedulerStatsSnapshot, StreamReasoner};
use crate::task::Task;
use crate::term::Term;

/// Combined snapshot returned by [`Nar::stats`] — the `stats()` kernel
/// operation (spec.md §6).
#[derive(Debug, Clone, Copy)]
pub struct NarStats {
    pub memory: MemoryStats,
    pub stream_reasoner: Option<SchedulerStatsSnapshot>,
}

/// The reasoner as a whole: shared memory plus whichever driver is
/// currently advancing it. Cycle-mode (`step`/`run_cycles`) and
/// stream-mode (`start`/`stop`) are never mutually exclusive at the type
/// level — both drive the same `Arc<Mutex<Memory>>` through
/// [`cycle::step`], so running one while the other happens to also be
/// running still produces consistent results (spec.md §9's open
/// question on this is resolved by sharing state rather than locking
/// callers out of one mode or the other).
pub struct Nar {
    memory: Arc<Mutex<Memory>>,
    config: Config,
    bus: Arc<EventBus>,
    stream: Option<StreamReasoner>,
}

impl Nar {
    pub fn new(config: Config) -> Self {
        let memory = Arc::new(Mutex::new(Memory::new(config.clone())));
        let bus = Arc::new(EventBus::new(config.emission_channel_capacity.max(16)));
        Nar { memory, config, bus, stream: None }
    }

    /// Parse one Narsese line and file it into memory, emitting
    /// `TaskInput` — the `input(narsese)` kernel operation.
    pub fn input(&mut self, narsese: &str) -> Result<(), NarsError> {
        let task = parser::parse_line(1, narsese)?;
        self.bus.publish(Event::TaskInput { task: task.clone() });
        let mut memory = self.memory.lock();
        memory.insert_task(task);
        Ok(())
    }

    /// Parse and file every non-blank line of `narsese`, stopping at the
    /// first parse error.
    pub fn input_all(&mut self, narsese: &str) -> Result<(), NarsError> {
        for task in parser::parse(narsese)? {
            self.bus.publish(Event::TaskInput { task: task.clone() });
            self.memory.lock().insert_task(task);
        }
        Ok(())
    }

    /// Advance memory by exactly one step, independent of whether the
    /// background stream reasoner is also running.
    pub fn step(&mut self) -> StepStats {
        let mut memory = self.memory.lock();
        cycle::step(&mut memory, &self.config, &self.bus)
    }

    /// Advance memory by `n` steps, returning the number executed.
    pub fn run_cycles(&mut self, n: u32) -> u32 {
        let mut memory = self.memory.lock();
        cycle::run_cycles(&mut memory, &self.config, &self.bus, n)
    }

    /// Start the background stream reasoner, creating it on first use.
    /// Idempotent (spec.md §6's `start()`/`stop()`).
    pub fn start(&mut self) {
        let stream = self.stream.get_or_insert_with(|| {
            StreamReasoner::new(Arc::clone(&self.memory), self.config.clone(), Arc::clone(&self.bus))
        });
        stream.start();
    }

    /// Stop the background stream reasoner, joining its thread. A no-op
    /// if it was never started.
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            stream.stop();
        }
    }

    /// Receiving end of the stream reasoner's derived-task channel, for
    /// callers consuming output as it's produced. Starts the reasoner
    /// (without running it) if it hasn't been created yet.
    pub fn output(&mut self) -> Receiver<Task> {
        let stream = self.stream.get_or_insert_with(|| {
            StreamReasoner::new(Arc::clone(&self.memory), self.config.clone(), Arc::clone(&self.bus))
        });
        stream.receiver()
    }

    /// Report consumer-side load back to the stream reasoner, if running.
    pub fn report_feedback(&self, feedback: ConsumerFeedback) {
        if let Some(stream) = self.stream.as_ref() {
            stream.report_feedback(feedback);
        }
    }

    /// Every concept currently held, across both memory tiers — the
    /// `concepts()` kernel operation.
    pub fn concepts(&self) -> Vec<Term> {
        self.memory.lock().concepts_snapshot()
    }

    /// Belief tasks, optionally restricted to one term's concept — the
    /// `beliefs([term])` kernel operation.
    pub fn beliefs(&self, filter: Option<&Term>) -> Vec<Task> {
        self.memory.lock().beliefs_snapshot(filter)
    }

    /// Subscribe to the event bus, optionally filtered to one kind — the
    /// `subscribe([kind])` kernel operation.
    pub fn subscribe(&self, filter: Option<EventKind>) -> Receiver<Event> {
        self.bus.subscribe(filter)
    }

    pub fn stats(&self) -> NarStats {
        NarStats {
            memory: self.memory.lock().stats(),
            stream_reasoner: self.stream.as_ref().map(|s| s.stats()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for Nar {
    fn default() -> Self {
        Nar::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_then_run_cycles_derives_a_syllogism() {
        let mut config = Config::default();
        config.seed = Some(11);
        let mut nar = Nar::new(config);
        nar.input("<man --> mortal>. %1.0;0.9%").unwrap();
        nar.input("<Socrates --> man>. %1.0;0.8%").unwrap();
        nar.run_cycles(80);
        let derived = nar.beliefs(Some(&parser::parse_term("<Socrates --> mortal>").unwrap()));
        assert!(!derived.is_empty(), "expected Socrates-->mortal to have been derived");
    }

    #[test]
    fn bad_input_is_rejected_without_touching_memory() {
        let mut nar = Nar::default();
        let err = nar.input("not a valid line").unwrap_err();
        assert!(matches!(err, NarsError::Parse { .. }));
        assert!(nar.concepts().is_empty());
    }

    #[test]
    fn start_stop_is_idempotent() {
        let mut config = Config::default();
        config.cpu_throttle_interval = std::time::Duration::from_millis(1);
        let mut nar = Nar::new(config);
        nar.input("<a --> b>.").unwrap();
        nar.start();
        nar.start();
        nar.stop();
        nar.stop();
    }

    #[test]
    fn subscribe_receives_task_input_events() {
        let mut nar = Nar::default();
        let rx = nar.subscribe(Some(EventKind::TaskInput));
        nar.input("<a --> b>.").unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind(), EventKind::TaskInput);
    }

    #[test]
    fn stats_reports_memory_counts() {
        let mut nar = Nar::default();
        nar.input("<a --> b>.").unwrap();
        let stats = nar.stats();
        assert_eq!(stats.memory.focus_concepts, 1);
        assert!(stats.stream_reasoner.is_none());
    }
}
