//! The inference rule catalog: a flat table of rule values rather than a
//! class hierarchy of rule types (REDESIGN FLAGS), grounded in the
//! function-pointer `TruthFunction::Single`/`Double` pattern used
//! elsewhere in this corpus.
//!
//! Each [`Rule`] is a pattern pair (or single pattern) over terms with
//! shared variables, a conclusion template, and a truth function. The
//! dispatcher matches a rule's patterns against two premise tasks via
//! [`crate::unify::match_pattern`], then rebuilds the conclusion term
//! via [`crate::unify::apply`] and computes its truth via the rule's
//! truth function.

use std::sync::OnceLock;

use crate::term::{Op, Term, VarKind};
use crate::truth::{self, Truth};

/// A rule's truth function, kept as a plain function pointer rather than
/// a trait object so the whole catalog is `&'static` data with no
/// indirection beyond one call.
#[derive(Clone, Copy)]
pub enum TruthFn {
    /// Single-premise rules (conversion, contraposition).
    Single(fn(&Truth) -> Option<Truth>),
    /// Two-premise rules (the syllogistic core, composition).
    Double(fn(&Truth, &Truth) -> Option<Truth>),
}

/// One entry in the rule catalog.
pub struct Rule {
    pub name: &'static str,
    pub pattern_a: Term,
    /// `None` for single-premise rules.
    pub pattern_b: Option<Term>,
    pub conclusion: Term,
    pub truth_fn: TruthFn,
    /// Static weight folded into a derived task's priority alongside the
    /// premises' own budgets (spec.md §4.4/§4.5's "each rule carries a
    /// static priority"). Strong, information-preserving rules (deduction,
    /// composition) rank above weaker generalizations (induction,
    /// abduction) and structural rewrites (conversion, contraposition).
    pub priority: f32,
}

fn var(name: &str) -> Term {
    Term::variable(VarKind::Independent, name)
}

fn inh(a: Term, b: Term) -> Term {
    Term::compound(Op::Inheritance, vec![a, b]).unwrap()
}

fn imp(a: Term, b: Term) -> Term {
    Term::compound(Op::Implication, vec![a, b]).unwrap()
}

fn imp_op(op: Op, a: Term, b: Term) -> Term {
    Term::compound(op, vec![a, b]).unwrap()
}

fn neg(a: Term) -> Term {
    Term::compound(Op::Negation, vec![a]).unwrap()
}

fn compound2(op: Op, a: Term, b: Term) -> Term {
    Term::compound(op, vec![a, b]).unwrap()
}

fn deduction_fn(a: &Truth, b: &Truth) -> Option<Truth> {
    Some(truth::deduction(a, b))
}
fn induction_fn(a: &Truth, b: &Truth) -> Option<Truth> {
    truth::induction(a, b)
}
fn abduction_fn(a: &Truth, b: &Truth) -> Option<Truth> {
    truth::abduction(a, b)
}
fn exemplification_fn(a: &Truth, b: &Truth) -> Option<Truth> {
    truth::exemplification(a, b)
}
fn conversion_fn(a: &Truth) -> Option<Truth> {
    truth::conversion(a)
}
fn contraposition_fn(a: &Truth) -> Option<Truth> {
    truth::contraposition(a)
}
fn intersection_fn(a: &Truth, b: &Truth) -> Option<Truth> {
    Some(truth::intersection(a, b))
}
fn union_fn(a: &Truth, b: &Truth) -> Option<Truth> {
    Some(truth::union(a, b))
}
fn difference_fn(a: &Truth, b: &Truth) -> Option<Truth> {
    Some(truth::difference(a, b))
}

/// Structural decomposition: given a compound judgment and a known
/// sibling component, recover a truth estimate for the other component.
/// Implemented as one shared formula for intersection/union/difference
/// decomposition rather than three special-cased derivations — a
/// deliberate simplification recorded in DESIGN.md.
fn decompose_fn(compound_truth: &Truth, component_truth: &Truth) -> Option<Truth> {
    let fc = compound_truth.frequency() as f64;
    let f2 = component_truth.frequency() as f64;
    if f2 == 0.0 {
        return None;
    }
    let f = (fc / f2).min(1.0) as f32;
    let c = compound_truth.confidence() * component_truth.confidence();
    let t = Truth::new(f, c);
    if t.frequency().is_finite() && t.confidence().is_finite() {
        Some(t)
    } else {
        None
    }
}

/// Pushes the four syllogistic patterns (deduction/induction/abduction/
/// exemplification) for a single implication-family operator. Used both
/// for the untensed `==>` and, per spec.md §3/§4.5 treating `=/>`/`=|>`/
/// `=\>` as temporal variants of the same copula, for each of them too —
/// so `(A =/> B),(B =/> C)` deduces `(A =/> C)` exactly as `==>` does.
fn push_implication_syllogisms(rules: &mut Vec<Rule>, op: Op, names: [&'static str; 4], s: &Term, p: &Term, m: &Term) {
    rules.push(Rule {
        name: names[0],
        pattern_a: imp_op(op, m.clone(), p.clone()),
        pattern_b: Some(imp_op(op, s.clone(), m.clone())),
        conclusion: imp_op(op, s.clone(), p.clone()),
        truth_fn: TruthFn::Double(deduction_fn),
        priority: 1.0,
    });
    rules.push(Rule {
        name: names[1],
        pattern_a: imp_op(op, m.clone(), p.clone()),
        pattern_b: Some(imp_op(op, m.clone(), s.clone())),
        conclusion: imp_op(op, s.clone(), p.clone()),
        truth_fn: TruthFn::Double(induction_fn),
        priority: 0.7,
    });
    rules.push(Rule {
        name: names[2],
        pattern_a: imp_op(op, p.clone(), m.clone()),
        pattern_b: Some(imp_op(op, s.clone(), m.clone())),
        conclusion: imp_op(op, s.clone(), p.clone()),
        truth_fn: TruthFn::Double(abduction_fn),
        priority: 0.7,
    });
    rules.push(Rule {
        name: names[3],
        pattern_a: imp_op(op, p.clone(), m.clone()),
        pattern_b: Some(imp_op(op, m.clone(), s.clone())),
        conclusion: imp_op(op, s.clone(), p.clone()),
        truth_fn: TruthFn::Double(exemplification_fn),
        priority: 0.6,
    });
}

fn build_catalog() -> Vec<Rule> {
    let s = var("S");
    let p = var("P");
    let m = var("M");

    let mut rules = vec![
        // --- inheritance syllogisms ---
        Rule {
            name: "inheritance_deduction",
            pattern_a: inh(m.clone(), p.clone()),
            pattern_b: Some(inh(s.clone(), m.clone())),
            conclusion: inh(s.clone(), p.clone()),
            truth_fn: TruthFn::Double(deduction_fn),
            priority: 1.0,
        },
        Rule {
            name: "inheritance_induction",
            pattern_a: inh(m.clone(), p.clone()),
            pattern_b: Some(inh(m.clone(), s.clone())),
            conclusion: inh(s.clone(), p.clone()),
            truth_fn: TruthFn::Double(induction_fn),
            priority: 0.7,
        },
        Rule {
            name: "inheritance_abduction",
            pattern_a: inh(p.clone(), m.clone()),
            pattern_b: Some(inh(s.clone(), m.clone())),
            conclusion: inh(s.clone(), p.clone()),
            truth_fn: TruthFn::Double(abduction_fn),
            priority: 0.7,
        },
        Rule {
            name: "inheritance_exemplification",
            pattern_a: inh(p.clone(), m.clone()),
            pattern_b: Some(inh(m.clone(), s.clone())),
            conclusion: inh(s.clone(), p.clone()),
            truth_fn: TruthFn::Double(exemplification_fn),
            priority: 0.6,
        },
        // --- modus ponens / modus tollens ---
        Rule {
            name: "modus_ponens",
            pattern_a: s.clone(),
            pattern_b: Some(imp(s.clone(), p.clone())),
            conclusion: p.clone(),
            truth_fn: TruthFn::Double(deduction_fn),
            priority: 1.0,
        },
        Rule {
            name: "modus_tollens",
            pattern_a: neg(p.clone()),
            pattern_b: Some(imp(s.clone(), p.clone())),
            conclusion: neg(s.clone()),
            truth_fn: TruthFn::Double(deduction_fn),
            priority: 0.9,
        },
        // --- conversion / contraposition ---
        Rule {
            name: "conversion",
            pattern_a: inh(m.clone(), p.clone()),
            pattern_b: None,
            conclusion: inh(p.clone(), m.clone()),
            truth_fn: TruthFn::Single(conversion_fn),
            priority: 0.6,
        },
        Rule {
            name: "contraposition",
            pattern_a: imp(s.clone(), p.clone()),
            pattern_b: None,
            conclusion: imp(neg(p.clone()), neg(s.clone())),
            truth_fn: TruthFn::Single(contraposition_fn),
            priority: 0.6,
        },
        // --- composition (build a compound predicate from a shared subject) ---
        Rule {
            name: "composition_intersection",
            pattern_a: inh(m.clone(), s.clone()),
            pattern_b: Some(inh(m.clone(), p.clone())),
            conclusion: inh(m.clone(), compound2(Op::Conjunction, s.clone(), p.clone())),
            truth_fn: TruthFn::Double(intersection_fn),
            priority: 0.85,
        },
        Rule {
            name: "composition_union",
            pattern_a: inh(m.clone(), s.clone()),
            pattern_b: Some(inh(m.clone(), p.clone())),
            conclusion: inh(m.clone(), compound2(Op::Disjunction, s.clone(), p.clone())),
            truth_fn: TruthFn::Double(union_fn),
            priority: 0.85,
        },
        Rule {
            name: "composition_difference",
            pattern_a: inh(m.clone(), s.clone()),
            pattern_b: Some(inh(m.clone(), p.clone())),
            conclusion: inh(m.clone(), compound2(Op::Difference, s.clone(), p.clone())),
            truth_fn: TruthFn::Double(difference_fn),
            priority: 0.85,
        },
        // --- decomposition (recover a component from a known compound + sibling) ---
        Rule {
            name: "decomposition_intersection",
            pattern_a: inh(m.clone(), compound2(Op::Conjunction, s.clone(), p.clone())),
            pattern_b: Some(inh(m.clone(), s.clone())),
            conclusion: inh(m.clone(), p.clone()),
            truth_fn: TruthFn::Double(decompose_fn),
            priority: 0.8,
        },
        Rule {
            name: "decomposition_union",
            pattern_a: inh(m.clone(), compound2(Op::Disjunction, s.clone(), p.clone())),
            pattern_b: Some(inh(m.clone(), s.clone())),
            conclusion: inh(m.clone(), p.clone()),
            truth_fn: TruthFn::Double(decompose_fn),
            priority: 0.8,
        },
        Rule {
            name: "decomposition_difference",
            pattern_a: inh(m.clone(), compound2(Op::Difference, s.clone(), p.clone())),
            pattern_b: Some(inh(m.clone(), s)),
            conclusion: inh(m, p),
            truth_fn: TruthFn::Double(decompose_fn),
            priority: 0.8,
        },
    ];

    push_implication_syllogisms(
        &mut rules,
        Op::Implication,
        ["implication_deduction", "implication_induction", "implication_abduction", "implication_exemplification"],
        &s,
        &p,
        &m,
    );
    push_implication_syllogisms(
        &mut rules,
        Op::ImplicationPredictive,
        [
            "implication_predictive_deduction",
            "implication_predictive_induction",
            "implication_predictive_abduction",
            "implication_predictive_exemplification",
        ],
        &s,
        &p,
        &m,
    );
    push_implication_syllogisms(
        &mut rules,
        Op::ImplicationConcurrent,
        [
            "implication_concurrent_deduction",
            "implication_concurrent_induction",
            "implication_concurrent_abduction",
            "implication_concurrent_exemplification",
        ],
        &s,
        &p,
        &m,
    );
    push_implication_syllogisms(
        &mut rules,
        Op::ImplicationRetrospective,
        [
            "implication_retrospective_deduction",
            "implication_retrospective_induction",
            "implication_retrospective_abduction",
            "implication_retrospective_exemplification",
        ],
        &s,
        &p,
        &m,
    );

    rules
}

static CATALOG: OnceLock<Vec<Rule>> = OnceLock::new();

/// The process-wide rule catalog, built once on first use.
pub fn catalog() -> &'static [Rule] {
    CATALOG.get_or_init(build_catalog)
}

/// Variable introduction: given two beliefs about the same predicate
/// with differing subjects, generalize into a belief about a fresh
/// dependent variable standing for "some such subject". Unlike the
/// catalog rules above, this mints a variable not present in either
/// premise, so it can't be expressed as a static pattern/conclusion
/// pair and is applied as a dedicated step rather than a table lookup.
pub fn variable_introduction(subject_a: &Term, subject_b: &Term, predicate: &Term) -> Option<Term> {
    if subject_a == subject_b {
        return None;
    }
    let x = Term::variable(VarKind::Dependent, "1");
    Term::compound(Op::Inheritance, vec![x, predicate.clone()]).ok()
}

/// Variable elimination: the inverse of [`variable_introduction`]. Given
/// a generalized belief `(#1 --> predicate)` (a dependent variable
/// standing for "some such subject") and a grounding premise naming a
/// concrete candidate subject, instantiate the variable back to that
/// term. Like introduction, this substitutes against a variable minted
/// outside the static catalog's pattern/conclusion pairs, so it is
/// applied as a dedicated step rather than a table lookup.
pub fn variable_elimination(var_subject: &Term, grounding_subject: &Term, predicate: &Term) -> Option<Term> {
    if var_subject.var_kind() != Some(VarKind::Dependent) {
        return None;
    }
    Term::compound(Op::Inheritance, vec![grounding_subject.clone(), predicate.clone()]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_built_once_and_stable() {
        let first = catalog() as *const _;
        let second = catalog() as *const _;
        assert_eq!(first, second);
    }

    #[test]
    fn catalog_contains_every_named_rule() {
        let names: Vec<&str> = catalog().iter().map(|r| r.name).collect();
        for expected in [
            "inheritance_deduction",
            "inheritance_induction",
            "inheritance_abduction",
            "inheritance_exemplification",
            "implication_deduction",
            "implication_induction",
            "implication_abduction",
            "implication_exemplification",
            "modus_ponens",
            "modus_tollens",
            "conversion",
            "contraposition",
            "composition_intersection",
            "composition_union",
            "composition_difference",
            "decomposition_intersection",
            "decomposition_union",
            "decomposition_difference",
        ] {
            assert!(names.contains(&expected), "missing rule {expected}");
        }
    }

    #[test]
    fn single_premise_rules_have_no_second_pattern() {
        for r in catalog() {
            if r.name == "conversion" || r.name == "contraposition" {
                assert!(r.pattern_b.is_none());
            } else {
                assert!(r.pattern_b.is_some());
            }
        }
    }

    #[test]
    fn variable_introduction_requires_distinct_subjects() {
        let bird = Term::atom("bird");
        let animal = Term::atom("animal");
        assert!(variable_introduction(&bird, &bird, &animal).is_none());
        assert!(variable_introduction(&bird, &Term::atom("sparrow"), &animal).is_some());
    }

    #[test]
    fn variable_elimination_instantiates_a_generalized_subject() {
        let animal = Term::atom("animal");
        let bird = Term::atom("bird");
        let sparrow = Term::atom("sparrow");

        let generalized = variable_introduction(&bird, &sparrow, &animal).unwrap();
        let var_subject = &generalized.components()[0];
        assert_eq!(var_subject.var_kind(), Some(VarKind::Dependent));

        let concrete = variable_elimination(var_subject, &bird, &animal).unwrap();
        assert_eq!(concrete, inh(bird.clone(), animal.clone()));
    }

    #[test]
    fn variable_elimination_rejects_non_variable_subjects() {
        let bird = Term::atom("bird");
        let sparrow = Term::atom("sparrow");
        let animal = Term::atom("animal");
        assert!(variable_elimination(&bird, &sparrow, &animal).is_none());
    }

    #[test]
    fn every_rule_priority_is_in_unit_range() {
        for r in catalog() {
            assert!(r.priority > 0.0 && r.priority <= 1.0, "{} has priority {}", r.name, r.priority);
        }
    }
}
