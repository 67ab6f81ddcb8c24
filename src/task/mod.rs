//! Tasks: a term tagged with punctuation, an optional truth value, a
//! budget, and a stamp — the unit the scheduler and rule dispatcher
//! operate on (spec.md §3/§4.3).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::budget::Budget;
use crate::stamp::Stamp;
use crate::term::Term;
use crate::truth::Truth;

/// Punctuation marks distinguishing beliefs, goals, questions, quests,
/// and commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punctuation {
    /// `.` — a judgment.
    Belief,
    /// `!` — a goal.
    Goal,
    /// `?` — a question about truth value.
    Question,
    /// `@` — a question about an achieving operation.
    Quest,
    /// `;` — an operation invocation.
    Command,
}

impl fmt::Display for Punctuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Punctuation::Belief => ".",
            Punctuation::Goal => "!",
            Punctuation::Question => "?",
            Punctuation::Quest => "@",
            Punctuation::Command => ";",
        };
        write!(f, "{s}")
    }
}

/// When a task's truth/occurrence is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tense {
    /// No particular time — always true/false.
    Eternal,
    /// Anchored to a specific moment.
    Occurring(i64),
}

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> u64 {
    NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed)
}

/// A term paired with punctuation, optional truth, a budget, a stamp,
/// and a process-unique id.
#[derive(Debug, Clone)]
pub struct Task {
    id: u64,
    term: Term,
    truth: Option<Truth>,
    punctuation: Punctuation,
    tense: Tense,
    budget: Budget,
    stamp: Stamp,
}

impl Task {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn truth(&self) -> Option<&Truth> {
        self.truth.as_ref()
    }

    pub fn punctuation(&self) -> Punctuation {
        self.punctuation
    }

    pub fn tense(&self) -> Tense {
        self.tense
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn budget_mut(&mut self) -> &mut Budget {
        &mut self.budget
    }

    pub fn stamp(&self) -> &Stamp {
        &self.stamp
    }

    pub fn is_belief(&self) -> bool {
        matches!(self.punctuation, Punctuation::Belief)
    }

    pub fn is_goal(&self) -> bool {
        matches!(self.punctuation, Punctuation::Goal)
    }

    pub fn is_question(&self) -> bool {
        matches!(self.punctuation, Punctuation::Question)
    }

    pub fn is_quest(&self) -> bool {
        matches!(self.punctuation, Punctuation::Quest)
    }

    pub fn is_command(&self) -> bool {
        matches!(self.punctuation, Punctuation::Command)
    }

    pub fn is_judgment(&self) -> bool {
        self.is_belief() || self.is_goal()
    }

    pub fn is_question_like(&self) -> bool {
        self.is_question() || self.is_quest()
    }

    pub fn is_eternal(&self) -> bool {
        matches!(self.tense, Tense::Eternal)
    }

    /// A task is an input task when its stamp carries exactly one base
    /// evidence id — it was never derived from other tasks.
    pub fn is_input(&self) -> bool {
        self.stamp.len() <= 1
    }

    pub fn complexity(&self) -> usize {
        self.term.complexity()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.punctuation {
            Punctuation::Question | Punctuation::Quest => write!(f, "{}{}", self.term, self.punctuation),
            _ => match self.truth {
                Some(truth) => write!(f, "{}. {}{}", self.term, truth, self.punctuation),
                None => write!(f, "{}{}", self.term, self.punctuation),
            },
        }
    }
}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

/// Builder for [`Task`], validating punctuation/truth consistency at
/// `build()` (questions and quests never carry a truth value).
pub struct TaskBuilder {
    term: Option<Term>,
    truth: Option<Truth>,
    punctuation: Option<Punctuation>,
    tense: Tense,
    budget: Budget,
    stamp: Option<Stamp>,
}

impl TaskBuilder {
    pub fn new() -> Self {
        TaskBuilder {
            term: None,
            truth: None,
            punctuation: None,
            tense: Tense::Eternal,
            budget: Budget::default(),
            stamp: None,
        }
    }

    pub fn term(mut self, term: Term) -> Self {
        self.term = Some(term);
        self
    }

    pub fn truth(mut self, truth: Truth) -> Self {
        self.truth = Some(truth);
        self
    }

    pub fn punctuation(mut self, punctuation: Punctuation) -> Self {
        self.punctuation = Some(punctuation);
        self
    }

    pub fn tense(mut self, tense: Tense) -> Self {
        self.tense = tense;
        self
    }

    pub fn budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    pub fn stamp(mut self, stamp: Stamp) -> Self {
        self.stamp = Some(stamp);
        self
    }

    pub fn build(self) -> Result<Task, &'static str> {
        let term = self.term.ok_or("task requires a term")?;
        let punctuation = self.punctuation.ok_or("task requires punctuation")?;

        let truth = if matches!(punctuation, Punctuation::Question | Punctuation::Quest | Punctuation::Command) {
            if self.truth.is_some() {
                return Err("questions, quests, and commands do not carry truth values");
            }
            None
        } else {
            self.truth
        };

        let occurrence = match self.tense {
            Tense::Eternal => None,
            Tense::Occurring(t) => Some(t),
        };
        let stamp = self.stamp.unwrap_or_else(|| Stamp::new_input(occurrence));

        Ok(Task {
            id: next_task_id(),
            term,
            truth,
            punctuation,
            tense: self.tense,
            budget: self.budget,
            stamp,
        })
    }
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_display() {
        assert_eq!(format!("{}", Punctuation::Belief), ".");
        assert_eq!(format!("{}", Punctuation::Goal), "!");
        assert_eq!(format!("{}", Punctuation::Question), "?");
        assert_eq!(format!("{}", Punctuation::Quest), "@");
        assert_eq!(format!("{}", Punctuation::Command), ";");
    }

    #[test]
    fn question_cannot_carry_truth() {
        let err = TaskBuilder::new()
            .term(Term::atom("cat"))
            .truth(Truth::new(0.9, 0.8))
            .punctuation(Punctuation::Question)
            .build()
            .unwrap_err();
        assert!(err.contains("truth"));
    }

    #[test]
    fn builder_defaults_to_fresh_input_stamp() {
        let task = TaskBuilder::new()
            .term(Term::atom("cat"))
            .truth(Truth::new(0.9, 0.8))
            .punctuation(Punctuation::Belief)
            .build()
            .unwrap();
        assert!(task.is_input());
        assert!(task.is_belief());
        assert!(task.is_judgment());
        assert!(task.is_eternal());
    }

    #[test]
    fn display_belief_includes_truth() {
        let task = TaskBuilder::new()
            .term(Term::atom("cat"))
            .truth(Truth::new(0.9, 0.8))
            .punctuation(Punctuation::Belief)
            .build()
            .unwrap();
        let shown = format!("{task}");
        assert!(shown.starts_with("cat."));
        assert!(shown.ends_with('.'));
    }

    #[test]
    fn display_question_has_no_truth() {
        let task = TaskBuilder::new()
            .term(Term::atom("cat"))
            .punctuation(Punctuation::Question)
            .build()
            .unwrap();
        assert_eq!(format!("{task}"), "cat?");
    }

    #[test]
    fn each_built_task_gets_a_distinct_id() {
        let a = TaskBuilder::new()
            .term(Term::atom("a"))
            .punctuation(Punctuation::Question)
            .build()
            .unwrap();
        let b = TaskBuilder::new()
            .term(Term::atom("b"))
            .punctuation(Punctuation::Question)
            .build()
            .unwrap();
        assert_ne!(a.id(), b.id());
    }
}
