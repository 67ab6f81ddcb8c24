//! Concepts: the per-term bucket memory indexes everything by. A concept
//! groups a term with its belief table, goal table, and open questions,
//! plus an attention budget that mirrors (but is not identical to) the
//! budgets of the tasks it contains (spec.md §3/§4.6).
//!
//! Term links are stored as term ids (`Term::canonical_id`), not as
//! owning pointers into other concepts — memory resolves a term id back
//! to a concept through its own index, so the concept graph never holds
//! a reference cycle (spec.md §9's "naming rather than pointing" note).

use crate::bag::BagItem;
use crate::budget::Budget;
use crate::table::{QuestionSet, RankedTable};
use crate::task::Task;
use crate::term::Term;

/// A term-indexed bucket of beliefs, goals, and open questions.
#[derive(Debug, Clone)]
pub struct Concept {
    term: Term,
    beliefs: RankedTable,
    goals: RankedTable,
    questions: QuestionSet,
    quests: QuestionSet,
    /// Canonical ids of subterms and structural neighbors, used to find
    /// related concepts to sample as a secondary premise.
    term_links: Vec<usize>,
    budget: Budget,
    /// Cycle number at which this concept was last sampled/promoted, used
    /// by the scheduler's recency sampling objective.
    last_touched: u64,
    /// Number of times this concept has been touched, used by the
    /// novelty sampling objective (`1 / (1 + visits)`).
    visits: u32,
}

impl Concept {
    pub fn new(term: Term, belief_capacity: usize, goal_capacity: usize, question_capacity: usize) -> Self {
        let term_links = term.subterms().iter().map(Term::canonical_id).collect();
        Concept {
            term,
            beliefs: RankedTable::with_capacity(belief_capacity),
            goals: RankedTable::with_capacity(goal_capacity),
            questions: QuestionSet::with_capacity(question_capacity),
            quests: QuestionSet::with_capacity(question_capacity),
            term_links,
            budget: Budget::default(),
            last_touched: 0,
            visits: 0,
        }
    }

    pub fn last_touched(&self) -> u64 {
        self.last_touched
    }

    pub fn visits(&self) -> u32 {
        self.visits
    }

    /// Record that this concept was sampled/promoted during `cycle`.
    pub fn touch(&mut self, cycle: u64) {
        self.last_touched = cycle;
        self.visits += 1;
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn beliefs(&self) -> &RankedTable {
        &self.beliefs
    }

    pub fn beliefs_mut(&mut self) -> &mut RankedTable {
        &mut self.beliefs
    }

    pub fn goals(&self) -> &RankedTable {
        &self.goals
    }

    pub fn goals_mut(&mut self) -> &mut RankedTable {
        &mut self.goals
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn questions_mut(&mut self) -> &mut QuestionSet {
        &mut self.questions
    }

    pub fn quests(&self) -> &QuestionSet {
        &self.quests
    }

    pub fn quests_mut(&mut self) -> &mut QuestionSet {
        &mut self.quests
    }

    pub fn term_links(&self) -> &[usize] {
        &self.term_links
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn budget_mut(&mut self) -> &mut Budget {
        &mut self.budget
    }

    /// Raise this concept's budget to at least `incoming`'s priority,
    /// mirroring (not copying) an inserted task's strength — the concept
    /// should become more attended, but its budget is a distinct
    /// quantity from any single task's.
    pub fn reinforce(&mut self, incoming: &Task) {
        let boosted = self.budget.priority().max(incoming.budget().priority());
        self.budget.set_priority(boosted);
    }

    /// Lower this concept's own attention and every belief/goal task it
    /// holds, applied once per cycle to every concept not selected as the
    /// step's primary (spec.md §4.7's "on decay, focus concepts demote" /
    /// §8 property 8's per-task priority decay).
    pub fn decay(&mut self) {
        self.budget.decay();
        self.beliefs.decay_all();
        self.goals.decay_all();
    }
}

impl BagItem for Concept {
    type Key = usize;

    fn key(&self) -> usize {
        self.term.canonical_id()
    }

    fn priority(&self) -> f32 {
        self.budget.priority()
    }
}
