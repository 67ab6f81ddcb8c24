//! Stream reasoner: a continuous producer running on a background
//! thread, yielding derived tasks at an adaptive rate under backpressure
//! and consumer feedback (spec.md §4.8). Shares [`crate::cycle::step`]
//! with the synchronous cycle runner so the two never diverge on rule
//! dispatch, event ordering, or depth accounting — only on how often
//! `step` is called and how its output is drained.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::config::Config;
use crate::cycle;
use crate::event::EventBus;
use crate::memory::Memory;
use crate::task::Task;

/// Feedback a downstream consumer may report back to the reasoner to tune
/// its sampling aggressiveness (spec.md §4.8's "consumer feedback").
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumerFeedback {
    pub processing_time: std::time::Duration,
    pub consumer_load: f32,
    pub buffer_level: usize,
    pub throughput: f32,
}

/// Running counters exposed by [`StreamReasoner::stats`], the
/// `stream_reasoner_stats` half of the `stats()` kernel operation
/// (spec.md §6).
#[derive(Debug, Default)]
pub struct SchedulerStats {
    pub total_derivations: AtomicU64,
    pub backpressure_events: AtomicU64,
    pub max_depth_reached: AtomicU64,
    pub cycles_run: AtomicU64,
}

/// Point-in-time copy of [`SchedulerStats`], since the atomics themselves
/// aren't `Clone`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerStatsSnapshot {
    pub total_derivations: u64,
    pub backpressure_events: u64,
    pub max_depth_reached: u64,
    pub cycles_run: u64,
}

impl SchedulerStats {
    fn snapshot(&self) -> SchedulerStatsSnapshot {
        SchedulerStatsSnapshot {
            total_derivations: self.total_derivations.load(Ordering::Relaxed),
            backpressure_events: self.backpressure_events.load(Ordering::Relaxed),
            max_depth_reached: self.max_depth_reached.load(Ordering::Relaxed),
            cycles_run: self.cycles_run.load(Ordering::Relaxed),
        }
    }
}

/// A background producer over a shared [`Memory`], emitting derived
/// tasks onto a bounded channel. Restartable (`stop` then `start` again)
/// but not rewindable — stopping drains in-flight emissions rather than
/// discarding them (spec.md §4.8).
pub struct StreamReasoner {
    memory: Arc<Mutex<Memory>>,
    config: Config,
    bus: Arc<EventBus>,
    stats: Arc<SchedulerStats>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    receiver: Receiver<Task>,
    sender: Sender<Task>,
    feedback: Arc<Mutex<ConsumerFeedback>>,
}

impl StreamReasoner {
    pub fn new(memory: Arc<Mutex<Memory>>, config: Config, bus: Arc<EventBus>) -> Self {
        let (sender, receiver) = bounded(config.emission_channel_capacity);
        StreamReasoner {
            memory,
            config,
            bus,
            stats: Arc::new(SchedulerStats::default()),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            receiver,
            sender,
            feedback: Arc::new(Mutex::new(ConsumerFeedback::default())),
        }
    }

    /// Receiving end of the downstream emission channel; consumers pull
    /// derived tasks from here.
    pub fn receiver(&self) -> Receiver<Task> {
        self.receiver.clone()
    }

    /// Report consumer-side load back to the reasoner so it can throttle
    /// or accelerate its own sampling (spec.md §4.8's optional feedback
    /// input).
    pub fn report_feedback(&self, feedback: ConsumerFeedback) {
        *self.feedback.lock() = feedback;
    }

    pub fn stats(&self) -> SchedulerStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start (or restart) the background producer loop. Idempotent: a
    /// second call while already running is a no-op (spec.md §6's
    /// `start()`/`stop()` "idempotent").
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let memory = Arc::clone(&self.memory);
        let config = self.config.clone();
        let bus = Arc::clone(&self.bus);
        let stats = Arc::clone(&self.stats);
        let running = Arc::clone(&self.running);
        let sender = self.sender.clone();
        let feedback = Arc::clone(&self.feedback);

        self.handle = Some(std::thread::spawn(move || {
            run_loop(memory, config, bus, stats, running, sender, feedback);
        }));
    }

    /// Cancel future iterations and join the producer thread, letting any
    /// in-flight emission complete first (spec.md §5's cancellation
    /// guarantee).
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StreamReasoner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Scale factor applied to sampling aggressiveness: `<1` throttles,
/// `>1` accelerates, clamped to keep the loop from spinning unbounded.
fn feedback_scale(feedback: ConsumerFeedback, target_throughput: f32) -> f32 {
    const HIGH_LOAD: f32 = 0.8;
    if feedback.consumer_load > HIGH_LOAD {
        0.5
    } else if target_throughput > 0.0 && feedback.throughput < target_throughput * 0.9 {
        1.5
    } else {
        1.0
    }
}

fn run_loop(
    memory: Arc<Mutex<Memory>>,
    config: Config,
    bus: Arc<EventBus>,
    stats: Arc<SchedulerStats>,
    running: Arc<AtomicBool>,
    sender: Sender<Task>,
    feedback: Arc<Mutex<ConsumerFeedback>>,
) {
    let target_throughput = 1.0 / config.cpu_throttle_interval.as_secs_f32().max(1e-6);
    let mut peak_throughput = 0.0f32;
    let mut window_start = Instant::now();
    let mut window_count = 0u64;

    while running.load(Ordering::Acquire) {
        // (i) backpressure suspension point.
        if sender.len() >= config.backpressure_threshold {
            stats.backpressure_events.fetch_add(1, Ordering::Relaxed);
            log::warn!("stream reasoner backpressured: {} queued, sleeping {:?}", sender.len(), config.backpressure_interval);
            std::thread::sleep(config.backpressure_interval);
            continue;
        }

        // (iv) empty-memory suspension point.
        let is_empty = {
            let guard = memory.lock();
            guard.focus_len() == 0 && guard.long_term_len() == 0
        };
        if is_empty {
            std::thread::sleep(config.cpu_throttle_interval);
            continue;
        }

        let scale = feedback_scale(*feedback.lock(), target_throughput);

        let step_stats = {
            let mut guard = memory.lock();
            cycle::step(&mut guard, &config, &bus)
        };
        stats.cycles_run.fetch_add(1, Ordering::Relaxed);
        stats
            .total_derivations
            .fetch_add(step_stats.derivations as u64, Ordering::Relaxed);
        stats.max_depth_reached.fetch_max(step_stats.max_depth as u64, Ordering::Relaxed);

        for task in step_stats.derived {
            if sender.send(task).is_err() {
                return;
            }
            window_count += 1;
        }

        let elapsed = window_start.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            let throughput = window_count as f32 / elapsed;
            peak_throughput = peak_throughput.max(throughput);
            window_start = Instant::now();
            window_count = 0;
        }
        let _ = peak_throughput;

        // (ii) throttle suspension point, scaled by consumer feedback.
        let throttle = config.cpu_throttle_interval.div_f32(scale.max(0.1));
        std::thread::sleep(throttle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Punctuation, TaskBuilder};
    use crate::term::{Op, Term};
    use crate::truth::Truth;

    fn belief(term: Term, f: f32, c: f32) -> Task {
        TaskBuilder::new()
            .term(term)
            .truth(Truth::new(f, c))
            .punctuation(Punctuation::Belief)
            .build()
            .unwrap()
    }

    #[test]
    fn start_stop_is_idempotent_and_joins_cleanly() {
        let mut config = Config::default();
        config.cpu_throttle_interval = std::time::Duration::from_millis(1);
        let memory = Arc::new(Mutex::new(Memory::new(config.clone())));
        let bus = Arc::new(EventBus::new(64));
        let mut reasoner = StreamReasoner::new(memory, config, bus);
        reasoner.start();
        reasoner.start();
        assert!(reasoner.is_running());
        reasoner.stop();
        assert!(!reasoner.is_running());
    }

    #[test]
    fn running_reasoner_emits_derived_tasks() {
        let mut config = Config::default();
        config.cpu_throttle_interval = std::time::Duration::from_millis(1);
        config.seed = Some(3);
        let memory = Arc::new(Mutex::new(Memory::new(config.clone())));
        {
            let mut guard = memory.lock();
            let man = Term::atom("man");
            let mortal = Term::atom("mortal");
            let socrates = Term::atom("Socrates");
            guard.insert_task(belief(Term::compound(Op::Inheritance, vec![man.clone(), mortal]).unwrap(), 1.0, 0.9));
            guard.insert_task(belief(Term::compound(Op::Inheritance, vec![socrates, man]).unwrap(), 1.0, 0.8));
        }
        let bus = Arc::new(EventBus::new(256));
        let mut reasoner = StreamReasoner::new(memory, config, bus);
        let rx = reasoner.receiver();
        reasoner.start();

        let mut received = 0;
        let deadline = Instant::now() + std::time::Duration::from_secs(2);
        while Instant::now() < deadline && received < 1 {
            if rx.recv_timeout(std::time::Duration::from_millis(50)).is_ok() {
                received += 1;
            }
        }
        reasoner.stop();
        assert!(received > 0, "expected at least one derived task to be emitted");
    }
}
