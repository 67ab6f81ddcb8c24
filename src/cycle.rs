//! Synchronous cycle runner: the alternative to [`crate::stream`] that
//! advances memory a fixed number of discrete steps instead of running a
//! background producer (spec.md §4.9). Both share the same `step`
//! function so their observable semantics — rule catalog, event
//! ordering, depth/backpressure accounting — never drift apart.

use crate::config::Config;
use crate::event::{Event, EventBus};
use crate::memory::Memory;
use crate::{dispatcher, task::Task};

/// Bookkeeping produced by one call to [`step`].
#[derive(Debug, Default, Clone)]
pub struct StepStats {
    pub rules_fired: u32,
    pub depth_limited: u32,
    pub stamp_overlaps: u32,
    pub derivations: u32,
    pub max_depth: u32,
    /// The conclusion tasks produced this step, already re-inserted into
    /// memory.
    pub derived: Vec<Task>,
}

/// Advance `memory` by exactly one step (spec.md §4.8 steps 2–5, less the
/// backpressure check, which only applies to the streaming scheduler):
/// sample a concept, sample a primary task inside it, dispatch the rule
/// catalog against it, and file every conclusion back into memory.
///
/// Always runs — an empty memory or a concept with no tasks simply
/// produces an empty `StepStats`, matching `run_cycles`'s "completes in
/// bounded time even with no inputs" property (spec.md §8, property 9).
pub fn step(memory: &mut Memory, config: &Config, bus: &EventBus) -> StepStats {
    let mut stats = StepStats::default();
    let cycle = memory.advance_cycle();
    log::trace!("cycle {cycle} start");
    bus.publish(Event::CycleStart { cycle });

    let selected = memory.sample_concept_weighted(config.sampling_objectives);
    if let Some(term) = &selected {
        memory.touch(term);
        let primary = memory
            .concept(term)
            .and_then(|c| c.beliefs().best().or_else(|| c.goals().best()).cloned());

        if let Some(primary) = primary {
            let outcome = dispatcher::dispatch(memory, config, &primary, bus);
            stats.rules_fired = outcome.rules_fired;
            stats.depth_limited = outcome.depth_limited;
            stats.stamp_overlaps = outcome.stamp_overlaps;
            stats.derivations = outcome.conclusions.len() as u32;

            for conclusion in outcome.conclusions {
                stats.max_depth = stats.max_depth.max(conclusion.stamp().depth());
                let concept_existed = memory.concept(conclusion.term()).is_some();
                let insert_outcome = memory.insert_task(conclusion.clone());
                if !concept_existed {
                    bus.publish(Event::ConceptCreated { term: conclusion.term().clone() });
                }
                bus.publish(Event::TaskAdded { task: conclusion.clone() });
                if conclusion.is_belief() {
                    bus.publish(Event::BeliefAdded { term: conclusion.term().clone() });
                }
                for answer in insert_outcome.answered {
                    bus.publish(Event::QuestionAnswered {
                        question: answer.term().clone(),
                        answer: conclusion.clone(),
                    });
                }
                stats.derived.push(conclusion);
            }
        }
    }

    // Everything not selected as this step's primary loses a little
    // attention — the mechanism behind spec.md §8 property 8 and §4.7's
    // focus-to-long-term demotion (spec.md §4.4's "priority decays over
    // time and on use").
    memory.decay_unused(selected.as_ref());

    bus.publish(Event::CycleEnd { cycle });
    stats
}

/// Advance `memory` by up to `n` steps, returning the number actually
/// executed — the `run_cycles(n)` kernel operation (spec.md §6). Never
/// fails and always terminates in bounded time (spec.md §8 property 9);
/// there is nothing to cancel mid-call since each step is synchronous.
pub fn run_cycles(memory: &mut Memory, config: &Config, bus: &EventBus, n: u32) -> u32 {
    for _ in 0..n {
        step(memory, config, bus);
    }
    n
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
    fn empty_memory_step_is_a_noop() {
        let mut memory = Memory::new(Config::default());
        let bus = EventBus::new(64);
        let stats = step(&mut memory, &memory.config().clone(), &bus);
        assert_eq!(stats.derivations, 0);
    }

    #[test]
    fn classical_syllogism_over_several_cycles() {
        let mut config = Config::default();
        config.seed = Some(7);
        let mut memory = Memory::new(config.clone());
        let bus = EventBus::new(256);

        let man = Term::atom("man");
        let mortal = Term::atom("mortal");
        let socrates = Term::atom("Socrates");
        memory.insert_task(belief(Term::compound(Op::Inheritance, vec![man.clone(), mortal.clone()]).unwrap(), 1.0, 0.9));
        memory.insert_task(belief(Term::compound(Op::Inheritance, vec![socrates.clone(), man]).unwrap(), 1.0, 0.8));

        run_cycles(&mut memory, &config, &bus, 50);

        let socrates_mortal = Term::compound(Op::Inheritance, vec![socrates, mortal]).unwrap();
        assert!(memory.concept(&socrates_mortal).is_some(), "expected Socrates-->mortal to have been derived");
    }

    #[test]
    fn run_cycles_returns_requested_count() {
        let mut memory = Memory::new(Config::default());
        let config = memory.config().clone();
        let bus = EventBus::new(16);
        assert_eq!(run_cycles(&mut memory, &config, &bus, 5), 5);
        assert_eq!(memory.current_cycle(), 5);
    }
}
