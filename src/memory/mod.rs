//! Two-tier concept memory: a small, fast-moving `focus` bag holds the
//! concepts currently in attention; a much larger `long_term` bag holds
//! everything else. Both are priority-weighted [`Bag`]s over the same
//! [`Concept`] type, so migrating a concept between tiers is just moving
//! it from one bag to the other (spec.md §3/§4.7).

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bag::Bag;
use crate::concept::Concept;
use crate::config::{Config, SamplingObjectives};
use crate::error::DropReason;
use crate::task::{Punctuation, Task, TaskBuilder};
use crate::term::Term;
use crate::truth;

/// Which tier a concept currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Focus,
    LongTerm,
}

/// What happened when a task was inserted.
#[derive(Debug, Default)]
pub struct InsertOutcome {
    /// Whether an existing belief/goal was revised with `task` instead of
    /// the task being filed as a new competing entry.
    pub revised: bool,
    /// Open questions/quests this insertion answered.
    pub answered: Vec<Task>,
    /// A concept evicted from `focus` to make room, if any.
    pub evicted_concept: Option<Term>,
    /// Set when a revision was skipped because the two judgments' stamps
    /// overlapped.
    pub drop_reason: Option<DropReason>,
}

pub struct Memory {
    focus: Bag<Concept>,
    long_term: Bag<Concept>,
    config: Config,
    /// Reverse term-link index: subterm canonical id -> canonical ids of
    /// concepts whose term directly contains it. The dual of
    /// `Concept::term_links`, used by the dispatcher to find syllogism
    /// partners sharing a term (spec.md §4.6). Entries for evicted
    /// concepts are left dangling rather than swept, since a stale id
    /// just resolves to `None` at lookup time.
    term_index: HashMap<usize, Vec<usize>>,
    /// Number of cycles advanced so far, used for recency-weighted
    /// sampling and reported in `stats()`.
    cycle: u64,
    /// RNG backing weighted concept sampling, seeded alongside the focus
    /// and long-term bags' own RNGs so a `Config.seed` makes an entire
    /// run reproducible.
    rng: StdRng,
}

/// Snapshot of memory-level counters, the `memory_stats` half of the
/// `stats()` kernel operation (spec.md §6).
#[derive(Debug, Clone, Copy)]
pub struct MemoryStats {
    pub focus_concepts: usize,
    pub long_term_concepts: usize,
    pub cycle: u64,
}

impl Memory {
    pub fn new(config: Config) -> Self {
        let (focus, long_term, rng) = match config.seed {
            Some(seed) => (
                Bag::with_seed(config.focus_capacity, seed),
                Bag::with_seed(config.long_term_capacity, seed.wrapping_add(1)),
                StdRng::seed_from_u64(seed.wrapping_add(2)),
            ),
            None => (
                Bag::new(config.focus_capacity),
                Bag::new(config.long_term_capacity),
                StdRng::from_entropy(),
            ),
        };
        Memory {
            focus,
            long_term,
            config,
            term_index: HashMap::new(),
            cycle: 0,
            rng,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn focus_len(&self) -> usize {
        self.focus.len()
    }

    pub fn long_term_len(&self) -> usize {
        self.long_term.len()
    }

    /// Locate a concept by term, wherever it currently lives.
    pub fn concept(&self, term: &Term) -> Option<&Concept> {
        let key = term.canonical_id();
        self.focus.get(&key).or_else(|| self.long_term.get(&key))
    }

    pub fn concept_mut(&mut self, term: &Term) -> Option<&mut Concept> {
        let key = term.canonical_id();
        if self.focus.contains(&key) {
            self.focus.get_mut(&key)
        } else {
            self.long_term.get_mut(&key)
        }
    }

    /// Locate a concept by its term's canonical id, used to resolve a
    /// `term_links` entry without re-deriving a `Term` handle.
    pub fn concept_by_id(&self, id: usize) -> Option<&Concept> {
        self.focus.get(&id).or_else(|| self.long_term.get(&id))
    }

    /// Canonical ids of concepts whose term directly contains `subterm_id`
    /// as a component — the reverse of `Concept::term_links`.
    pub fn concepts_containing(&self, subterm_id: usize) -> &[usize] {
        self.term_index.get(&subterm_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn which_tier(&self, term: &Term) -> Option<Tier> {
        let key = term.canonical_id();
        if self.focus.contains(&key) {
            Some(Tier::Focus)
        } else if self.long_term.contains(&key) {
            Some(Tier::LongTerm)
        } else {
            None
        }
    }

    /// Get the concept for `term`, creating it (in `focus`) if absent.
    /// Returns any concept evicted from `focus` to make room.
    pub fn get_or_create(&mut self, term: &Term) -> (&mut Concept, Option<Term>) {
        let key = term.canonical_id();
        let mut evicted_term = None;
        if !self.focus.contains(&key) && !self.long_term.contains(&key) {
            let concept = Concept::new(
                term.clone(),
                self.config.belief_table_capacity,
                self.config.goal_table_capacity,
                self.config.question_capacity,
            );
            for &sub_id in concept.term_links() {
                self.term_index.entry(sub_id).or_default().push(key);
            }
            if let Some(evicted) = self.focus.put(concept) {
                log::debug!("evicted concept {} from focus to make room for {}", evicted.term(), term);
                evicted_term = Some(evicted.term().clone());
            }
        }
        let concept = if self.focus.contains(&key) {
            self.focus.get_mut(&key).unwrap()
        } else {
            self.long_term.get_mut(&key).unwrap()
        };
        (concept, evicted_term)
    }

    /// Move a concept into `focus`, promoting it out of `long_term` if
    /// that's where it was sampled from.
    pub fn promote(&mut self, term: &Term) {
        let key = term.canonical_id();
        if let Some(concept) = self.long_term.remove(&key) {
            if let Some(evicted) = self.focus.put(concept) {
                self.long_term.put(evicted);
            }
        }
    }

    /// Move a concept out of `focus` into `long_term`, called once its
    /// budget decays below attention.
    pub fn demote(&mut self, term: &Term) {
        let key = term.canonical_id();
        if let Some(concept) = self.focus.remove(&key) {
            self.long_term.put(concept);
        }
    }

    /// Sample a concept from `focus` with probability proportional to its
    /// budget, for the dispatcher to pick a primary premise.
    pub fn sample_focus(&mut self) -> Option<Term> {
        let key = self.focus.sample_key()?;
        self.focus.get(&key).map(|c| c.term().clone())
    }

    /// Advance the cycle counter, returning the new value. Called once per
    /// scheduler/cycle-runner step, independent of whether that step
    /// produced anything.
    pub fn advance_cycle(&mut self) -> u64 {
        self.cycle += 1;
        self.cycle
    }

    pub fn current_cycle(&self) -> u64 {
        self.cycle
    }

    /// Record that `term`'s concept was selected this cycle: promotes it
    /// into focus (a no-op if it's already there) and bumps its recency
    /// and visit counters.
    pub fn touch(&mut self, term: &Term) {
        self.promote(term);
        let cycle = self.cycle;
        if let Some(concept) = self.concept_mut(term) {
            concept.touch(cycle);
        }
    }

    /// Lower attention on every concept except `selected` (the step's
    /// primary, already freshly `touch`ed): both the concept's own budget
    /// and its stored belief/goal tasks' priorities decay, and any focus
    /// concept that falls below `demote_threshold` moves to long-term.
    /// Driving this once per `step` is what makes spec.md §8 property 8
    /// ("after k cycles without reuse, priority is strictly lower than at
    /// creation") and §4.7's focus-to-long-term demotion actually happen.
    pub fn decay_unused(&mut self, selected: Option<&Term>) {
        let selected_key = selected.map(Term::canonical_id);
        let threshold = self.config.demote_threshold;
        let mut to_demote = Vec::new();
        for concept in self.focus.iter_mut() {
            if Some(concept.term().canonical_id()) == selected_key {
                continue;
            }
            concept.decay();
            if concept.budget().priority() < threshold {
                to_demote.push(concept.term().clone());
            }
        }
        for concept in self.long_term.iter_mut() {
            if Some(concept.term().canonical_id()) == selected_key {
                continue;
            }
            concept.decay();
        }
        for term in to_demote {
            log::trace!("concept {term} decayed below attention threshold, demoting to long-term");
            self.demote(&term);
        }
    }

    /// Every concept currently held, in both tiers, as a term snapshot —
    /// the `concepts()` kernel operation (spec.md §6). A copy, not a
    /// reference, per spec.md §5's "snapshot requests return copies".
    pub fn concepts_snapshot(&self) -> Vec<Term> {
        self.focus
            .iter()
            .chain(self.long_term.iter())
            .map(|c| c.term().clone())
            .collect()
    }

    /// Belief tasks across memory, optionally restricted to one term's
    /// concept — the `beliefs([term])` kernel operation (spec.md §6).
    pub fn beliefs_snapshot(&self, filter: Option<&Term>) -> Vec<Task> {
        match filter {
            Some(term) => self
                .concept(term)
                .map(|c| c.beliefs().iter().cloned().collect())
                .unwrap_or_default(),
            None => self
                .focus
                .iter()
                .chain(self.long_term.iter())
                .flat_map(|c| c.beliefs().iter().cloned())
                .collect(),
        }
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            focus_concepts: self.focus.len(),
            long_term_concepts: self.long_term.len(),
            cycle: self.cycle,
        }
    }

    /// Sample a concept weighted by `objectives`'s composite score rather
    /// than raw priority alone (spec.md §4.8 step 2). Prefers `focus` over
    /// `long_term` with fixed odds, matching the bag's own "hot working
    /// set sampled more often" design (spec.md §3's Memory entry), then
    /// falls back to whichever tier is non-empty.
    pub fn sample_concept_weighted(&mut self, objectives: SamplingObjectives) -> Option<Term> {
        const FOCUS_BIAS: f32 = 0.85;
        let use_focus = if self.focus.is_empty() {
            false
        } else if self.long_term.is_empty() {
            true
        } else {
            self.rng.gen::<f32>() < FOCUS_BIAS
        };
        let bag = if use_focus { &self.focus } else { &self.long_term };
        if bag.is_empty() {
            return None;
        }
        let cycle = self.cycle;
        let mut terms = Vec::with_capacity(bag.len());
        let mut weights = Vec::with_capacity(bag.len());
        for concept in bag.iter() {
            let mut score = 1.0f32;
            if objectives.priority {
                score *= concept.budget().priority();
            }
            if objectives.recency {
                let age = cycle.saturating_sub(concept.last_touched()) as f32;
                score *= 1.0 / (1.0 + age);
            }
            if objectives.novelty {
                score *= 1.0 / (1.0 + concept.visits() as f32);
            }
            if objectives.punctuation && (!concept.questions().is_empty() || !concept.quests().is_empty()) {
                score *= 1.2;
            }
            terms.push(concept.term().clone());
            weights.push(score.max(1e-6));
        }
        let dist = rand::distributions::WeightedIndex::new(&weights).ok()?;
        let idx = rand::distributions::Distribution::sample(&dist, &mut self.rng);
        Some(terms.swap_remove(idx))
    }

    /// File a task into its concept's belief/goal table (revising with an
    /// existing disjoint-evidence entry when one exists) or question set,
    /// reinforcing the concept's attention budget.
    pub fn insert_task(&mut self, task: Task) -> InsertOutcome {
        let mut outcome = InsertOutcome::default();
        let term = task.term().clone();
        let (concept, evicted) = self.get_or_create(&term);
        outcome.evicted_concept = evicted;
        concept.reinforce(&task);

        match task.punctuation() {
            Punctuation::Belief => {
                let merged = merge_or_file(concept.beliefs_mut(), task.clone(), self.config.max_stamp_length, &mut outcome);
                outcome.answered.extend(concept.questions_mut().drain_answered(&merged));
            }
            Punctuation::Goal => {
                let merged = merge_or_file(concept.goals_mut(), task.clone(), self.config.max_stamp_length, &mut outcome);
                outcome.answered.extend(concept.quests_mut().drain_answered(&merged));
            }
            Punctuation::Question => {
                concept.questions_mut().insert(task.clone());
                if let Some(best) = concept.beliefs().best() {
                    outcome.answered.push(best.clone());
                }
            }
            Punctuation::Quest => {
                concept.quests_mut().insert(task.clone());
                if let Some(best) = concept.goals().best() {
                    outcome.answered.push(best.clone());
                }
            }
            Punctuation::Command => {}
        }
        outcome
    }
}

fn merge_or_file(
    table: &mut crate::table::RankedTable,
    task: Task,
    max_stamp_length: usize,
    outcome: &mut InsertOutcome,
) -> Task {
    if let Some(existing) = table.best() {
        if let (Some(t1), Some(t2)) = (existing.truth(), task.truth()) {
            if !existing.stamp().overlaps(task.stamp()) {
                let revised_truth = truth::revision(t1, t2);
                let merged_stamp = existing.stamp().merge(task.stamp(), max_stamp_length);
                let merged = TaskBuilder::new()
                    .term(task.term().clone())
                    .truth(revised_truth)
                    .punctuation(task.punctuation())
                    .budget(*task.budget())
                    .stamp(merged_stamp)
                    .build()
                    .expect("revised judgment is well-formed");
                table.insert(merged.clone());
                outcome.revised = true;
                return merged;
            } else {
                outcome.drop_reason = Some(DropReason::StampOverlap);
            }
        }
    }
    table.insert(task.clone());
    task
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::truth::Truth;

    fn belief(name: &str, freq: f32, conf: f32) -> Task {
        TaskBuilder::new()
            .term(Term::atom(name))
            .truth(Truth::new(freq, conf))
            .punctuation(Punctuation::Belief)
            .build()
            .unwrap()
    }

    #[test]
    fn new_term_creates_concept_in_focus() {
        let mut memory = Memory::new(Config::default());
        let outcome = memory.insert_task(belief("bird", 0.9, 0.8));
        assert!(outcome.evicted_concept.is_none());
        assert_eq!(memory.which_tier(&Term::atom("bird")), Some(Tier::Focus));
    }

    #[test]
    fn disjoint_evidence_revises_in_place() {
        let mut memory = Memory::new(Config::default());
        memory.insert_task(belief("bird", 0.9, 0.8));
        let outcome = memory.insert_task(belief("bird", 0.8, 0.7));
        assert!(outcome.revised);
        let concept = memory.concept(&Term::atom("bird")).unwrap();
        assert_eq!(concept.beliefs().len(), 1);
        assert!(concept.beliefs().best().unwrap().truth().unwrap().confidence() > 0.8);
    }

    #[test]
    fn question_is_answered_by_existing_belief() {
        let mut memory = Memory::new(Config::default());
        memory.insert_task(belief("bird", 0.9, 0.8));
        let question = TaskBuilder::new()
            .term(Term::atom("bird"))
            .punctuation(Punctuation::Question)
            .build()
            .unwrap();
        let outcome = memory.insert_task(question);
        assert_eq!(outcome.answered.len(), 1);
    }

    #[test]
    fn promote_moves_concept_from_long_term_to_focus() {
        let mut config = Config::default();
        config.focus_capacity = 1;
        let mut memory = Memory::new(config);
        memory.insert_task(belief("a", 0.9, 0.8));
        let (_, evicted) = memory.get_or_create(&Term::atom("b"));
        assert!(evicted.is_some() || memory.which_tier(&Term::atom("b")) == Some(Tier::Focus));
    }

    #[test]
    fn advance_cycle_increments_and_is_reported_in_stats() {
        let mut memory = Memory::new(Config::default());
        assert_eq!(memory.current_cycle(), 0);
        memory.advance_cycle();
        memory.advance_cycle();
        assert_eq!(memory.current_cycle(), 2);
        assert_eq!(memory.stats().cycle, 2);
    }

    #[test]
    fn touch_promotes_and_bumps_visits() {
        let mut config = Config::default();
        config.focus_capacity = 1;
        config.seed = Some(1);
        let mut memory = Memory::new(config);
        memory.insert_task(belief("a", 0.9, 0.8));
        memory.insert_task(belief("b", 0.9, 0.8));
        memory.demote(&Term::atom("b"));
        assert_eq!(memory.which_tier(&Term::atom("b")), Some(Tier::LongTerm));
        memory.advance_cycle();
        memory.touch(&Term::atom("b"));
        assert_eq!(memory.which_tier(&Term::atom("b")), Some(Tier::Focus));
        let concept = memory.concept(&Term::atom("b")).unwrap();
        assert_eq!(concept.visits(), 1);
        assert_eq!(concept.last_touched(), 1);
    }

    #[test]
    fn concepts_snapshot_covers_both_tiers() {
        let mut memory = Memory::new(Config::default());
        memory.insert_task(belief("a", 0.9, 0.8));
        memory.insert_task(belief("b", 0.9, 0.8));
        let snapshot = memory.concepts_snapshot();
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn beliefs_snapshot_filters_by_term() {
        let mut memory = Memory::new(Config::default());
        memory.insert_task(belief("a", 0.9, 0.8));
        memory.insert_task(belief("b", 0.9, 0.8));
        let filtered = memory.beliefs_snapshot(Some(&Term::atom("a")));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].term(), &Term::atom("a"));
        let all = memory.beliefs_snapshot(None);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn decay_unused_leaves_the_selected_concept_untouched() {
        let mut memory = Memory::new(Config::default());
        memory.insert_task(belief("a", 0.9, 0.8));
        let before = memory.concept(&Term::atom("a")).unwrap().budget().priority();
        memory.decay_unused(Some(&Term::atom("a")));
        assert_eq!(memory.concept(&Term::atom("a")).unwrap().budget().priority(), before);
    }

    /// Spec.md §8 property 8: after k cycles without reuse, a task's
    /// priority is strictly lower than at creation.
    #[test]
    fn unselected_task_priority_strictly_decreases_after_k_cycles() {
        let mut memory = Memory::new(Config::default());
        memory.insert_task(belief("hot", 0.9, 0.8));
        memory.insert_task(belief("cold", 0.9, 0.8));

        let initial_concept_priority = memory.concept(&Term::atom("cold")).unwrap().budget().priority();
        let initial_task_priority = memory
            .concept(&Term::atom("cold"))
            .unwrap()
            .beliefs()
            .best()
            .unwrap()
            .budget()
            .priority();

        for _ in 0..5 {
            memory.decay_unused(Some(&Term::atom("hot")));
        }

        let concept = memory.concept(&Term::atom("cold")).unwrap();
        assert!(concept.budget().priority() < initial_concept_priority);
        assert!(concept.beliefs().best().unwrap().budget().priority() < initial_task_priority);
    }

    #[test]
    fn decay_below_threshold_demotes_focus_concept_to_long_term() {
        let mut config = Config::default();
        config.demote_threshold = 0.4;
        let mut memory = Memory::new(config);
        memory.insert_task(belief("hot", 0.9, 0.8));
        memory.insert_task(belief("cold", 0.9, 0.8));
        assert_eq!(memory.which_tier(&Term::atom("cold")), Some(Tier::Focus));

        memory.decay_unused(Some(&Term::atom("hot")));

        assert_eq!(memory.which_tier(&Term::atom("cold")), Some(Tier::LongTerm));
    }

    #[test]
    fn sample_concept_weighted_favors_higher_priority() {
        let mut config = Config::default();
        config.seed = Some(42);
        let mut memory = Memory::new(config);
        memory.insert_task(belief("hot", 0.9, 0.9));
        let (concept, _) = memory.get_or_create(&Term::atom("hot"));
        concept.budget_mut().set_priority(0.95);
        memory.insert_task(belief("cold", 0.9, 0.9));
        let (concept, _) = memory.get_or_create(&Term::atom("cold"));
        concept.budget_mut().set_priority(0.05);

        let objectives = SamplingObjectives {
            priority: true,
            recency: false,
            punctuation: false,
            novelty: false,
        };
        let mut hot_count = 0;
        for _ in 0..200 {
            if memory.sample_concept_weighted(objectives) == Some(Term::atom("hot")) {
                hot_count += 1;
            }
        }
        assert!(hot_count > 150, "expected high-priority concept to dominate sampling, got {hot_count}/200");
    }
}
