//! In-process event bus: fan-out pub/sub for derivation traces, metrics,
//! and external observers (spec.md §4.10/§5/§6).
//!
//! Each subscriber gets its own bounded queue so a slow observer can
//! never stall the scheduler (spec.md §5's "bounded per-subscriber
//! queue, drop-oldest on overflow"). Producers never block on a send;
//! `publish` is O(subscriber count) and infallible.

use std::sync::Mutex;

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};

use crate::error::DropReason;
use crate::task::Task;
use crate::term::Term;

/// Discriminant for [`subscribe`](EventBus::subscribe) filtering, mirroring
/// spec.md §6's named event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CycleStart,
    CycleEnd,
    TaskInput,
    TaskAdded,
    TaskProcessed,
    ConceptCreated,
    BeliefAdded,
    QuestionAnswered,
    ReasoningDerivation,
    RuleFired,
    RuleNotFired,
    DepthLimited,
    TermCacheHit,
    TermCacheMiss,
}

/// A single observable occurrence, with kind-specific payload.
#[derive(Debug, Clone)]
pub enum Event {
    CycleStart { cycle: u64 },
    CycleEnd { cycle: u64 },
    TaskInput { task: Task },
    TaskAdded { task: Task },
    TaskProcessed { task: Task },
    ConceptCreated { term: Term },
    BeliefAdded { term: Term },
    QuestionAnswered { question: Term, answer: Task },
    ReasoningDerivation { conclusion: Task, rule: &'static str },
    RuleFired { rule: &'static str, premise_a: Term, premise_b: Option<Term> },
    RuleNotFired { rule: &'static str, reason: DropReason },
    DepthLimited { rule: &'static str, depth: u32 },
    TermCacheHit { term: Term },
    TermCacheMiss { term: Term },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::CycleStart { .. } => EventKind::CycleStart,
            Event::CycleEnd { .. } => EventKind::CycleEnd,
            Event::TaskInput { .. } => EventKind::TaskInput,
            Event::TaskAdded { .. } => EventKind::TaskAdded,
            Event::TaskProcessed { .. } => EventKind::TaskProcessed,
            Event::ConceptCreated { .. } => EventKind::ConceptCreated,
            Event::BeliefAdded { .. } => EventKind::BeliefAdded,
            Event::QuestionAnswered { .. } => EventKind::QuestionAnswered,
            Event::ReasoningDerivation { .. } => EventKind::ReasoningDerivation,
            Event::RuleFired { .. } => EventKind::RuleFired,
            Event::RuleNotFired { .. } => EventKind::RuleNotFired,
            Event::DepthLimited { .. } => EventKind::DepthLimited,
            Event::TermCacheHit { .. } => EventKind::TermCacheHit,
            Event::TermCacheMiss { .. } => EventKind::TermCacheMiss,
        }
    }
}

struct Subscriber {
    filter: Option<EventKind>,
    sender: Sender<Event>,
}

/// Multi-subscriber, fan-out event bus. Cheap to clone (an `Arc` around
/// the subscriber list would also work, but the bus is normally owned by
/// one `NAR`/scheduler and handed out as `&EventBus`).
pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
    queue_capacity: usize,
}

impl EventBus {
    pub fn new(queue_capacity: usize) -> Self {
        EventBus {
            subscribers: Mutex::new(Vec::new()),
            queue_capacity,
        }
    }

    /// Subscribe to every event of `filter`'s kind, or every event if
    /// `filter` is `None`. Returns the receiving end of a bounded channel;
    /// once full, the bus drops the *oldest* buffered event to admit the
    /// new one rather than blocking the publisher.
    pub fn subscribe(&self, filter: Option<EventKind>) -> Receiver<Event> {
        let (sender, receiver) = bounded(self.queue_capacity.max(1));
        self.subscribers.lock().unwrap().push(Subscriber { filter, sender });
        receiver
    }

    /// Publish one event to every matching subscriber. Never blocks: a
    /// full subscriber queue has its oldest entry evicted first.
    pub fn publish(&self, event: Event) {
        let kind = event.kind();
        let subs = self.subscribers.lock().unwrap();
        for sub in subs.iter() {
            if sub.filter.is_some_and(|f| f != kind) {
                continue;
            }
            let mut to_send = event.clone();
            loop {
                match sub.sender.try_send(to_send) {
                    Ok(()) => break,
                    Err(TrySendError::Full(rejected)) => {
                        // Drop-oldest: make room by discarding one buffered
                        // event, then retry with the same new event.
                        let _ = sub.sender.try_recv();
                        to_send = rejected;
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        EventBus::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_receives_matching_events_only() {
        let bus = EventBus::new(8);
        let rx = bus.subscribe(Some(EventKind::CycleStart));
        bus.publish(Event::CycleStart { cycle: 1 });
        bus.publish(Event::CycleEnd { cycle: 1 });
        let received = rx.try_recv().unwrap();
        assert_eq!(received.kind(), EventKind::CycleStart);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unfiltered_subscriber_receives_every_kind() {
        let bus = EventBus::new(8);
        let rx = bus.subscribe(None);
        bus.publish(Event::CycleStart { cycle: 1 });
        bus.publish(Event::CycleEnd { cycle: 1 });
        assert_eq!(rx.try_recv().unwrap().kind(), EventKind::CycleStart);
        assert_eq!(rx.try_recv().unwrap().kind(), EventKind::CycleEnd);
    }

    #[test]
    fn full_queue_drops_oldest_not_publisher() {
        let bus = EventBus::new(2);
        let rx = bus.subscribe(None);
        for i in 0..5u64 {
            bus.publish(Event::CycleStart { cycle: i });
        }
        // Queue capacity 2: only the last two survive.
        let a = rx.try_recv().unwrap();
        let b = rx.try_recv().unwrap();
        assert!(matches!(a, Event::CycleStart { cycle: 3 }));
        assert!(matches!(b, Event::CycleStart { cycle: 4 }));
        assert!(rx.try_recv().is_err());
    }
}
