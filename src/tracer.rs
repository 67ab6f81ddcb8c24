//! Derivation tracer: subscribes to the event bus and records an ordered,
//! bounded trace of rule firings and derivations for introspection and
//! debugging (spec.md §4.10). Pure data processing over whatever the bus
//! already emits; it has no effect on reasoning itself.

use std::collections::HashMap;

use crossbeam::channel::Receiver;

use crate::event::{Event, EventBus, EventKind};
use crate::term::Term;

/// One recorded occurrence in a trace.
#[derive(Debug, Clone)]
pub enum TraceEntry {
    RuleFired { rule: &'static str, premise_a: Term, premise_b: Option<Term> },
    RuleNotFired { rule: &'static str, reason: &'static str },
    Derivation { rule: &'static str, conclusion: Term },
    DepthLimited { rule: &'static str, depth: u32 },
}

impl TraceEntry {
    fn rule(&self) -> &'static str {
        match self {
            TraceEntry::RuleFired { rule, .. }
            | TraceEntry::RuleNotFired { rule, .. }
            | TraceEntry::Derivation { rule, .. }
            | TraceEntry::DepthLimited { rule, .. } => rule,
        }
    }
}

fn from_event(event: &Event) -> Option<TraceEntry> {
    match event {
        Event::RuleFired { rule, premise_a, premise_b } => Some(TraceEntry::RuleFired {
            rule,
            premise_a: premise_a.clone(),
            premise_b: premise_b.clone(),
        }),
        Event::RuleNotFired { rule, reason } => Some(TraceEntry::RuleNotFired {
            rule,
            reason: reason_str(*reason),
        }),
        Event::ReasoningDerivation { conclusion, rule } => Some(TraceEntry::Derivation {
            rule,
            conclusion: conclusion.term().clone(),
        }),
        Event::DepthLimited { rule, depth } => Some(TraceEntry::DepthLimited { rule, depth: *depth }),
        _ => None,
    }
}

fn reason_str(reason: crate::error::DropReason) -> &'static str {
    use crate::error::DropReason::*;
    match reason {
        StampOverlap => "stamp_overlap",
        DepthLimited => "depth_limited",
        CapacityEvicted => "capacity_evicted",
        BackpressureStall => "backpressure_stall",
        UndefinedTruth => "undefined_truth",
    }
}

/// A bounded, ordered recording of derivation events, with lookups for
/// path-finding, "why not" queries, and rule-usage counts.
pub struct Tracer {
    max_steps: usize,
    entries: Vec<TraceEntry>,
    receiver: Option<Receiver<Event>>,
}

impl Tracer {
    pub fn new(max_steps: usize) -> Self {
        Tracer {
            max_steps,
            entries: Vec::new(),
            receiver: None,
        }
    }

    /// Begin recording from `bus`, replacing any prior subscription.
    /// Unfiltered: the tracer wants rule-fired / rule-not-fired /
    /// derivation / depth-limited events, which span four `EventKind`s,
    /// so it filters in `drain` instead of at the bus.
    pub fn start_trace(&mut self, bus: &EventBus) {
        self.receiver = Some(bus.subscribe(None));
    }

    /// Stop recording and drop the subscription; already-recorded entries
    /// are kept.
    pub fn end_trace(&mut self) {
        self.receiver = None;
    }

    /// Pull any events the subscription has buffered since the last call,
    /// appending matching ones to the trace and truncating the oldest
    /// entries beyond `max_steps`.
    pub fn drain(&mut self) {
        let Some(receiver) = &self.receiver else { return };
        while let Ok(event) = receiver.try_recv() {
            if let Some(entry) = from_event(&event) {
                self.entries.push(entry);
            }
        }
        if self.entries.len() > self.max_steps {
            let drop = self.entries.len() - self.max_steps;
            self.entries.drain(0..drop);
        }
    }

    /// Record one entry directly, bypassing the event bus — useful for
    /// tests and for callers that already have an entry in hand.
    pub fn record(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
        if self.entries.len() > self.max_steps {
            self.entries.remove(0);
        }
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// BFS over premise -> conclusion edges recorded as derivations,
    /// looking for a chain from `from_term` to `to_term`. Returns the
    /// sequence of rule names applied along the shortest such chain.
    pub fn find_path(&self, from_term: &Term, to_term: &Term) -> Option<Vec<&'static str>> {
        use std::collections::VecDeque;

        // Build the derivation edges: conclusion -> (rule, premises) isn't
        // directly recoverable from `Derivation` alone (it doesn't carry
        // its premises), so pair each `Derivation` with the immediately
        // preceding `RuleFired` of the same rule name, which does.
        let mut edges: Vec<(Term, Term, &'static str)> = Vec::new();
        let mut last_fired: HashMap<&'static str, (Term, Option<Term>)> = HashMap::new();
        for entry in &self.entries {
            match entry {
                TraceEntry::RuleFired { rule, premise_a, premise_b } => {
                    last_fired.insert(rule, (premise_a.clone(), premise_b.clone()));
                }
                TraceEntry::Derivation { rule, conclusion } => {
                    if let Some((premise_a, premise_b)) = last_fired.get(rule) {
                        edges.push((premise_a.clone(), conclusion.clone(), rule));
                        if let Some(premise_b) = premise_b {
                            edges.push((premise_b.clone(), conclusion.clone(), rule));
                        }
                    }
                }
                _ => {}
            }
        }

        let mut queue = VecDeque::new();
        let mut visited: Vec<Term> = vec![from_term.clone()];
        queue.push_back((from_term.clone(), Vec::new()));
        while let Some((current, path)) = queue.pop_front() {
            if &current == to_term {
                return Some(path);
            }
            for (from, to, rule) in &edges {
                if from == &current && !visited.contains(to) {
                    visited.push(to.clone());
                    let mut next_path = path.clone();
                    next_path.push(*rule);
                    queue.push_back((to.clone(), next_path));
                }
            }
        }
        None
    }

    /// Reasons a derivation involving `term` was skipped: every
    /// `RuleNotFired`/`DepthLimited` entry whose recorded premises (for
    /// `RuleFired` siblings) or rule name touches `term`. Since
    /// `RuleNotFired` doesn't carry the premise terms, this matches by
    /// rule name against the nearest preceding `RuleFired` mentioning
    /// `term`.
    pub fn why_not(&self, term: &Term) -> Vec<&'static str> {
        let mut candidate_rules: Vec<&'static str> = Vec::new();
        let mut out = Vec::new();
        for entry in &self.entries {
            match entry {
                TraceEntry::RuleFired { rule, premise_a, premise_b } => {
                    if premise_a == term || premise_b.as_ref() == Some(term) {
                        candidate_rules.push(rule);
                    }
                }
                TraceEntry::RuleNotFired { rule, reason } if candidate_rules.contains(rule) => {
                    out.push(*reason);
                }
                TraceEntry::DepthLimited { rule, .. } if candidate_rules.contains(rule) => {
                    out.push("depth_limited");
                }
                _ => {}
            }
        }
        out
    }

    /// Rule -> fire count, across the whole trace.
    pub fn hot_rules(&self) -> HashMap<&'static str, u32> {
        let mut counts = HashMap::new();
        for entry in &self.entries {
            if matches!(entry, TraceEntry::RuleFired { .. }) {
                *counts.entry(entry.rule()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Render the trace as a JSON array of `{kind, rule, ...}` objects.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.entries
                .iter()
                .map(|entry| match entry {
                    TraceEntry::RuleFired { rule, premise_a, premise_b } => serde_json::json!({
                        "kind": "rule_fired",
                        "rule": rule,
                        "premise_a": premise_a.to_string(),
                        "premise_b": premise_b.as_ref().map(|t| t.to_string()),
                    }),
                    TraceEntry::RuleNotFired { rule, reason } => serde_json::json!({
                        "kind": "rule_not_fired",
                        "rule": rule,
                        "reason": reason,
                    }),
                    TraceEntry::Derivation { rule, conclusion } => serde_json::json!({
                        "kind": "derivation",
                        "rule": rule,
                        "conclusion": conclusion.to_string(),
                    }),
                    TraceEntry::DepthLimited { rule, depth } => serde_json::json!({
                        "kind": "depth_limited",
                        "rule": rule,
                        "depth": depth,
                    }),
                })
                .collect(),
        )
    }

    /// Render the trace as a Mermaid flowchart of `Derivation` edges.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("flowchart LR\n");
        for entry in &self.entries {
            if let TraceEntry::Derivation { rule, conclusion } = entry {
                out.push_str(&format!("  n{:x}[\"{conclusion}\"]\n", term_hash(conclusion)));
                let _ = rule;
            }
        }
        out
    }

    /// Render the trace as a Graphviz DOT digraph.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph trace {\n");
        for entry in &self.entries {
            match entry {
                TraceEntry::RuleFired { rule, premise_a, premise_b } => {
                    out.push_str(&format!("  \"{premise_a}\" -> \"{rule}\";\n"));
                    if let Some(premise_b) = premise_b {
                        out.push_str(&format!("  \"{premise_b}\" -> \"{rule}\";\n"));
                    }
                }
                TraceEntry::Derivation { rule, conclusion } => {
                    out.push_str(&format!("  \"{rule}\" -> \"{conclusion}\";\n"));
                }
                _ => {}
            }
        }
        out.push_str("}\n");
        out
    }

    /// Render the trace as a minimal standalone HTML page listing entries
    /// in order, for quick visual inspection.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<html><body><ul>\n");
        for entry in &self.entries {
            let line = match entry {
                TraceEntry::RuleFired { rule, premise_a, premise_b } => match premise_b {
                    Some(b) => format!("{rule}({premise_a}, {b})"),
                    None => format!("{rule}({premise_a})"),
                },
                TraceEntry::RuleNotFired { rule, reason } => format!("{rule}: not fired ({reason})"),
                TraceEntry::Derivation { rule, conclusion } => format!("{rule} ⊢ {conclusion}"),
                TraceEntry::DepthLimited { rule, depth } => format!("{rule}: depth limited at {depth}"),
            };
            out.push_str(&format!("<li>{line}</li>\n"));
        }
        out.push_str("</ul></body></html>\n");
        out
    }
}

fn term_hash(term: &Term) -> usize {
    term.canonical_id()
}
