//! The rule dispatcher: given a primary task drawn from a concept, finds
//! candidate secondary tasks, applies the rule catalog under the
//! self-premise/stamp-disjointness/depth-bound guarantees of spec.md
//! §4.6, and builds the resulting conclusion [`Task`]s (the "derived-task
//! builder" of spec.md §4.4).
//!
//! Tie-breaking is "fire everything that applies": every rule whose
//! patterns match is attempted, and every non-empty result is returned
//! independently (spec.md §4.5's "all are fired; outputs are queued
//! independently").

use crate::budget::{self, Budget};
use crate::config::Config;
use crate::error::DropReason;
use crate::event::{Event, EventBus};
use crate::memory::Memory;
use crate::rule::{self, Rule, TruthFn};
use crate::stamp::Stamp;
use crate::task::{Punctuation, Task, TaskBuilder};
use crate::term::Term;
use crate::truth::{self, Truth};
use crate::unify::{self, Substitution};

/// A candidate second premise: another belief/goal filed under the same
/// concept, or one from a directly linked concept (sharing a subterm with
/// the primary task's term) — spec.md §4.6's secondary-selection rule.
fn candidate_secondaries(memory: &Memory, primary: &Task) -> Vec<Task> {
    let mut out = Vec::new();
    let primary_id = primary.term().canonical_id();

    if let Some(concept) = memory.concept(primary.term()) {
        out.extend(concept.beliefs().iter().cloned());
        out.extend(concept.goals().iter().cloned());
    }

    // Concepts whose term shares a component with the primary's term are
    // its syllogism partners (e.g. `(Socrates-->man)` and `(man-->mortal)`
    // both contain `man`) — found via the reverse term-link index rather
    // than `Concept::term_links`, which only points outward to subterms.
    for subterm in primary.term().subterms() {
        for &linked_id in memory.concepts_containing(subterm.canonical_id()) {
            if linked_id == primary_id {
                continue;
            }
            if let Some(linked) = memory.concept_by_id(linked_id) {
                out.extend(linked.beliefs().iter().cloned());
            }
        }
    }

    out.sort_by_key(Task::id);
    out.dedup_by_key(Task::id);
    out.retain(|t| t.id() != primary.id());
    out
}

fn novelty_factor(memory: &Memory, term: &Term) -> f32 {
    if memory.concept(term).is_some() {
        0.9
    } else {
        1.0
    }
}

/// Try matching `rule`'s two patterns against `(t1, t2)` in that
/// assignment (`t1` against `pattern_a`, `t2` against `pattern_b`),
/// returning the conclusion term and the truth value if it unifies and
/// the truth function is defined for this argument order.
fn try_binary(rule: &Rule, t1: &Task, t2: &Task) -> Option<(Term, Truth)> {
    let pattern_b = rule.pattern_b.as_ref()?;
    let (truth_a, truth_b) = (t1.truth()?, t2.truth()?);
    let mut subst: Substitution<Term> = Substitution::new();
    if !unify::match_pattern(&rule.pattern_a, t1.term(), &mut subst) {
        return None;
    }
    if !unify::match_pattern(pattern_b, t2.term(), &mut subst) {
        return None;
    }
    let truth_fn = match rule.truth_fn {
        TruthFn::Double(f) => f,
        TruthFn::Single(_) => return None,
    };
    let truth = truth_fn(truth_a, truth_b)?;
    let conclusion = unify::apply(&rule.conclusion, &subst);
    Some((conclusion, truth))
}

fn try_unary(rule: &Rule, t: &Task) -> Option<(Term, Truth)> {
    if rule.pattern_b.is_some() {
        return None;
    }
    let truth = t.truth()?;
    let mut subst: Substitution<Term> = Substitution::new();
    if !unify::match_pattern(&rule.pattern_a, t.term(), &mut subst) {
        return None;
    }
    let truth_fn = match rule.truth_fn {
        TruthFn::Single(f) => f,
        TruthFn::Double(_) => return None,
    };
    let truth = truth_fn(truth)?;
    let conclusion = unify::apply(&rule.conclusion, &subst);
    Some((conclusion, truth))
}

fn build_conclusion(
    term: Term,
    truth: Truth,
    stamp: Stamp,
    factors: &[&Budget],
    rule_priority: f32,
    novelty: f32,
) -> Option<Task> {
    if !truth.frequency().is_finite() || !truth.confidence().is_finite() {
        return None;
    }
    let mut derived_budget = budget::derive(factors, rule_priority, Punctuation::Belief);
    derived_budget.set_priority(derived_budget.priority() * novelty);
    TaskBuilder::new()
        .term(term)
        .truth(truth)
        .punctuation(Punctuation::Belief)
        .budget(derived_budget)
        .stamp(stamp)
        .build()
        .ok()
}

/// Outcome of dispatching one primary task: the conclusions produced plus
/// the bookkeeping the scheduler/cycle runner needs for stats and events.
#[derive(Default)]
pub struct DispatchOutcome {
    pub conclusions: Vec<Task>,
    pub rules_fired: u32,
    pub depth_limited: u32,
    pub stamp_overlaps: u32,
}

/// Apply the rule catalog to `primary` against every candidate secondary
/// task found in its concept and linked concepts, plus the unary rules on
/// `primary` alone. Emits events on `bus` for every fire/no-fire/depth-limit
/// decision.
pub fn dispatch(memory: &Memory, config: &Config, primary: &Task, bus: &EventBus) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();

    // Unary rules need only the primary task.
    for rule in rule::catalog() {
        if rule.pattern_b.is_some() {
            continue;
        }
        let Some((term, truth)) = try_unary(rule, primary) else {
            continue;
        };
        let depth = primary.stamp().depth() + 1;
        if depth > config.max_derivation_depth {
            outcome.depth_limited += 1;
            log::trace!("{}: depth {depth} exceeds max_derivation_depth, dropping", rule.name);
            bus.publish(Event::DepthLimited { rule: rule.name, depth });
            continue;
        }
        let stamp = primary.stamp().derive_unary(config.max_stamp_length);
        let novelty = novelty_factor(memory, &term);
        match build_conclusion(term, truth, stamp, &[primary.budget()], rule.priority, novelty) {
            Some(task) => {
                log::debug!("{}: derived {}", rule.name, task.term());
                bus.publish(Event::RuleFired {
                    rule: rule.name,
                    premise_a: primary.term().clone(),
                    premise_b: None,
                });
                bus.publish(Event::ReasoningDerivation {
                    conclusion: task.clone(),
                    rule: rule.name,
                });
                outcome.rules_fired += 1;
                outcome.conclusions.push(task);
            }
            None => {
                bus.publish(Event::RuleNotFired {
                    rule: rule.name,
                    reason: DropReason::UndefinedTruth,
                });
            }
        }
    }

    let binary_rules: Vec<&Rule> = rule::catalog().iter().filter(|r| r.pattern_b.is_some()).collect();

    for secondary in candidate_secondaries(memory, primary) {
        if primary.stamp().overlaps(secondary.stamp()) {
            outcome.stamp_overlaps += 1;
            for rule in &binary_rules {
                bus.publish(Event::RuleNotFired {
                    rule: rule.name,
                    reason: DropReason::StampOverlap,
                });
            }
            continue;
        }

        let depth = primary.stamp().depth().max(secondary.stamp().depth()) + 1;
        if depth > config.max_derivation_depth {
            outcome.depth_limited += 1;
            for rule in &binary_rules {
                bus.publish(Event::DepthLimited { rule: rule.name, depth });
            }
            continue;
        }

        for rule in &binary_rules {
            let matched = try_binary(rule, primary, &secondary).or_else(|| try_binary(rule, &secondary, primary));
            let Some((term, truth)) = matched else {
                continue;
            };
            let stamp = primary.stamp().merge(secondary.stamp(), config.max_stamp_length);
            let novelty = novelty_factor(memory, &term);
            match build_conclusion(
                term,
                truth,
                stamp,
                &[primary.budget(), secondary.budget()],
                rule.priority,
                novelty,
            ) {
                Some(task) => {
                    log::debug!("{}: derived {}", rule.name, task.term());
                    bus.publish(Event::RuleFired {
                        rule: rule.name,
                        premise_a: primary.term().clone(),
                        premise_b: Some(secondary.term().clone()),
                    });
                    bus.publish(Event::ReasoningDerivation {
                        conclusion: task.clone(),
                        rule: rule.name,
                    });
                    outcome.rules_fired += 1;
                    outcome.conclusions.push(task);
                }
                None => {
                    bus.publish(Event::RuleNotFired {
                        rule: rule.name,
                        reason: DropReason::UndefinedTruth,
                    });
                }
            }
        }

        // Variable introduction: two inheritance beliefs that share a
        // predicate but differ on subject generalize into a statement
        // about a fresh dependent variable (spec.md §4.5's "variable
        // introduction" bullet; not expressible as a static pattern pair
        // since it mints a variable absent from both premises). Truth is
        // approximated via intersection, the same pooling formula the
        // composition rules use for "both premises must hold" — recorded
        // as a deliberate simplification in DESIGN.md.
        if primary.term().operator() == Some(crate::term::Op::Inheritance)
            && secondary.term().operator() == Some(crate::term::Op::Inheritance)
        {
            let (subj_a, pred_a) = (&primary.term().components()[0], &primary.term().components()[1]);
            let (subj_b, pred_b) = (&secondary.term().components()[0], &secondary.term().components()[1]);
            if pred_a == pred_b {
                if let Some(term) = rule::variable_introduction(subj_a, subj_b, pred_a) {
                    if let (Some(t1), Some(t2)) = (primary.truth(), secondary.truth()) {
                        let truth = truth::intersection(t1, t2);
                        let stamp = primary.stamp().merge(secondary.stamp(), config.max_stamp_length);
                        let novelty = novelty_factor(memory, &term);
                        if let Some(task) =
                            build_conclusion(term, truth, stamp, &[primary.budget(), secondary.budget()], 0.5, novelty)
                        {
                            bus.publish(Event::RuleFired {
                                rule: "variable_introduction",
                                premise_a: primary.term().clone(),
                                premise_b: Some(secondary.term().clone()),
                            });
                            outcome.rules_fired += 1;
                            outcome.conclusions.push(task);
                        }
                    }
                }

                // Variable elimination: the inverse direction. One side
                // carries the generalized `(#1 --> predicate)` belief a
                // prior introduction step minted; the other names a
                // concrete subject for that same predicate. Instantiate
                // the variable back to the concrete term, narrowing the
                // generalization with deduction's truth function (spec.md
                // §4.5's "variable introduction / elimination" bullet).
                let elim = rule::variable_elimination(subj_a, subj_b, pred_a)
                    .map(|t| (t, primary, secondary))
                    .or_else(|| rule::variable_elimination(subj_b, subj_a, pred_b).map(|t| (t, secondary, primary)));
                if let Some((term, generalized, grounding)) = elim {
                    if let (Some(t1), Some(t2)) = (generalized.truth(), grounding.truth()) {
                        let truth = truth::deduction(t1, t2);
                        let stamp = primary.stamp().merge(secondary.stamp(), config.max_stamp_length);
                        let novelty = novelty_factor(memory, &term);
                        if let Some(task) =
                            build_conclusion(term, truth, stamp, &[primary.budget(), secondary.budget()], 0.5, novelty)
                        {
                            bus.publish(Event::RuleFired {
                                rule: "variable_elimination",
                                premise_a: primary.term().clone(),
                                premise_b: Some(secondary.term().clone()),
                            });
                            outcome.rules_fired += 1;
                            outcome.conclusions.push(task);
                        }
                    }
                }
            }
        }
    }

    outcome
}
