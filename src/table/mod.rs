//! Per-concept tables: a concept's belief table holds competing judgments
//! about its term, ranked by confidence; its goal table is the same
//! shape for goals; its question set holds open questions/quests waiting
//! for an answering belief (spec.md §3/§4.6).

use crate::task::Task;

/// Rank used to order entries in a belief/goal table: higher confidence
/// wins, ties broken by recency (higher task id = more recent).
fn rank(task: &Task) -> (ordered_float::OrderedFloat<f32>, u64) {
    let confidence = task.truth().map(|t| t.confidence()).unwrap_or(0.0);
    (ordered_float::OrderedFloat(confidence), task.id())
}

/// A bounded, confidence-ranked table of judgment tasks (beliefs or
/// goals) about one term.
#[derive(Clone, Debug)]
pub struct RankedTable {
    entries: Vec<Task>,
    capacity: usize,
}

impl RankedTable {
    pub fn with_capacity(capacity: usize) -> Self {
        RankedTable {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The single best-ranked entry, if any.
    pub fn best(&self) -> Option<&Task> {
        self.entries.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.entries.iter()
    }

    /// Decay every entry's budget priority in place. Safe to call without
    /// re-sorting: `rank` orders entries by confidence and id only, never
    /// by priority, so decay can't disturb table order.
    pub fn decay_all(&mut self) {
        for task in self.entries.iter_mut() {
            task.budget_mut().decay();
        }
    }

    /// Insert `task` in rank order, evicting the weakest entry if this
    /// would exceed capacity. Does not check for same-term revision —
    /// that happens once at the `Memory` layer, which decides whether
    /// two tasks should be merged before either reaches a table.
    pub fn insert(&mut self, task: Task) {
        let pos = self
            .entries
            .binary_search_by(|t| rank(t).cmp(&rank(&task)).reverse())
            .unwrap_or_else(|p| p);
        self.entries.insert(pos, task);
        if self.entries.len() > self.capacity {
            self.entries.pop();
        }
    }
}

/// A bounded set of open questions/quests about one term, deduplicated
/// by term so repeated identical questions don't pile up, FIFO-evicted
/// when full.
#[derive(Clone, Debug)]
pub struct QuestionSet {
    entries: Vec<Task>,
    capacity: usize,
}

impl QuestionSet {
    pub fn with_capacity(capacity: usize) -> Self {
        QuestionSet {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.entries.iter()
    }

    /// Add a question, unless an equivalent one (same term) is already
    /// open.
    pub fn insert(&mut self, task: Task) {
        if self.entries.iter().any(|t| t.term() == task.term()) {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(task);
    }

    /// Remove and return every open question whose term matches
    /// `answer`'s term — called once a belief answering them is derived.
    pub fn drain_answered(&mut self, answer: &Task) -> Vec<Task> {
        let mut answered = Vec::new();
        self.entries.retain(|q| {
            if q.term() == answer.term() {
                answered.push(q.clone());
                false
            } else {
                true
            }
        });
        answered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Punctuation, TaskBuilder};
    use crate::term::Term;
    use crate::truth::Truth;

    fn belief(name: &str, confidence: f32) -> Task {
        TaskBuilder::new()
            .term(Term::atom(name))
            .truth(Truth::new(0.9, confidence))
            .punctuation(Punctuation::Belief)
            .build()
            .unwrap()
    }

    #[test]
    fn ranked_table_orders_by_confidence_descending() {
        let mut table = RankedTable::with_capacity(3);
        table.insert(belief("a", 0.3));
        table.insert(belief("b", 0.9));
        table.insert(belief("c", 0.6));
        let confidences: Vec<f32> = table.iter().map(|t| t.truth().unwrap().confidence()).collect();
        assert_eq!(confidences, vec![0.9, 0.6, 0.3]);
    }

    #[test]
    fn ranked_table_evicts_weakest_over_capacity() {
        let mut table = RankedTable::with_capacity(2);
        table.insert(belief("a", 0.3));
        table.insert(belief("b", 0.9));
        table.insert(belief("c", 0.6));
        assert_eq!(table.len(), 2);
        let confidences: Vec<f32> = table.iter().map(|t| t.truth().unwrap().confidence()).collect();
        assert_eq!(confidences, vec![0.9, 0.6]);
    }

    #[test]
    fn decay_all_lowers_every_entry_priority_without_reordering() {
        let mut table = RankedTable::with_capacity(3);
        let mut a = belief("a", 0.3);
        a.budget_mut().set_priority(0.8);
        let mut b = belief("b", 0.9);
        b.budget_mut().set_priority(0.8);
        table.insert(a);
        table.insert(b);
        table.decay_all();
        for task in table.iter() {
            assert!(task.budget().priority() < 0.8);
        }
        let confidences: Vec<f32> = table.iter().map(|t| t.truth().unwrap().confidence()).collect();
        assert_eq!(confidences, vec![0.9, 0.3]);
    }

    #[test]
    fn question_set_deduplicates_by_term() {
        let mut qs = QuestionSet::with_capacity(4);
        let q1 = TaskBuilder::new()
            .term(Term::atom("cat"))
            .punctuation(Punctuation::Question)
            .build()
            .unwrap();
        let q2 = TaskBuilder::new()
            .term(Term::atom("cat"))
            .punctuation(Punctuation::Question)
            .build()
            .unwrap();
        qs.insert(q1);
        qs.insert(q2);
        assert_eq!(qs.len(), 1);
    }

    #[test]
    fn question_set_drains_matching_answers() {
        let mut qs = QuestionSet::with_capacity(4);
        qs.insert(
            TaskBuilder::new()
                .term(Term::atom("cat"))
                .punctuation(Punctuation::Question)
                .build()
                .unwrap(),
        );
        let answer = belief("cat", 0.9);
        let drained = qs.drain_answered(&answer);
        assert_eq!(drained.len(), 1);
        assert!(qs.is_empty());
    }
}
