//! Unification and substitution, parameterized over [`TermAdapter`] so the
//! same algorithm works over the kernel's own [`Term`](crate::term::Term)
//! or over an external intermediate representation (an LM bridge, say)
//! without depending on kernel internals.

use std::collections::HashMap;
use std::hash::Hash;

use crate::term::{Op, Term};

/// The structural operations unification needs from a term type.
pub trait TermAdapter: Sized + Clone + PartialEq {
    /// The operator type for compounds (e.g. [`Op`]).
    type Operator: PartialEq + Copy;

    /// Replace every occurrence of `from` with `to`.
    fn substitute(&self, from: &Self, to: &Self) -> Self;
    /// Structural equality.
    fn equals(&self, other: &Self) -> bool;
    fn is_variable(&self) -> bool;
    fn variable_name(&self) -> Option<&str>;
    fn is_compound(&self) -> bool;
    fn get_operator(&self) -> Option<Self::Operator>;
    fn get_components(&self) -> &[Self];
    /// Rebuild a compound from `operator` and `components`. `None` if the
    /// combination is ill-formed (e.g. wrong arity for `operator`).
    fn reconstruct(&self, operator: Self::Operator, components: Vec<Self>) -> Option<Self>;
}

impl TermAdapter for Term {
    type Operator = Op;

    fn substitute(&self, from: &Self, to: &Self) -> Self {
        Term::substitute(self, from, to)
    }

    fn equals(&self, other: &Self) -> bool {
        self == other
    }

    fn is_variable(&self) -> bool {
        Term::is_variable(self)
    }

    fn variable_name(&self) -> Option<&str> {
        if Term::is_variable(self) {
            Term::name(self)
        } else {
            None
        }
    }

    fn is_compound(&self) -> bool {
        Term::is_compound(self)
    }

    fn get_operator(&self) -> Option<Op> {
        Term::operator(self)
    }

    fn get_components(&self) -> &[Term] {
        Term::components(self)
    }

    fn reconstruct(&self, operator: Op, components: Vec<Term>) -> Option<Term> {
        Term::compound(operator, components).ok()
    }
}

/// Variable-to-term bindings accumulated while unifying.
pub type Substitution<T> = HashMap<T, T>;

fn resolve<T: TermAdapter + Eq + Hash>(term: &T, subst: &Substitution<T>) -> T {
    let mut current = term.clone();
    loop {
        if !current.is_variable() {
            return current;
        }
        match subst.get(&current) {
            Some(next) if !next.equals(&current) => current = next.clone(),
            _ => return current,
        }
    }
}

/// Does `needle` (a variable) occur anywhere inside `haystack`? Checked
/// before every variable binding so unification never produces a cyclic
/// substitution (spec.md §4.2's mandatory occurs-check).
fn occurs<T: TermAdapter>(needle: &T, haystack: &T) -> bool {
    if haystack.equals(needle) {
        return true;
    }
    haystack.is_compound() && haystack.get_components().iter().any(|c| occurs(needle, c))
}

/// Two-way unification: both `pattern` and `subject` may contain
/// variables, and either side's variables may be bound. Bindings
/// accumulate in `subst`, which is applied monotonically — a successful
/// call never removes an existing binding, only adds to them. Returns
/// `false` (and leaves `subst` exactly as it was on entry to the call
/// that failed) on mismatch.
pub fn unify<T: TermAdapter + Eq + Hash>(pattern: &T, subject: &T, subst: &mut Substitution<T>) -> bool {
    let pattern = resolve(pattern, subst);
    let subject = resolve(subject, subst);

    if pattern.equals(&subject) {
        return true;
    }
    if pattern.is_variable() {
        if occurs(&pattern, &subject) {
            return false;
        }
        subst.insert(pattern, subject);
        return true;
    }
    if subject.is_variable() {
        if occurs(&subject, &pattern) {
            return false;
        }
        subst.insert(subject, pattern);
        return true;
    }
    if pattern.is_compound() && subject.is_compound() {
        if pattern.get_operator() != subject.get_operator() {
            return false;
        }
        let pc = pattern.get_components();
        let sc = subject.get_components();
        if pc.len() != sc.len() {
            return false;
        }
        for (p, s) in pc.iter().zip(sc.iter()) {
            if !unify(p, s, subst) {
                return false;
            }
        }
        return true;
    }
    false
}

/// One-way match: only `pattern`'s variables are bound; a variable on the
/// `subject` side only matches if it is already bound to something equal.
/// Used by rule premises, which are ground sentences matched against a
/// variable-bearing rule template.
pub fn match_pattern<T: TermAdapter + Eq + Hash>(pattern: &T, subject: &T, subst: &mut Substitution<T>) -> bool {
    let pattern = resolve(pattern, subst);

    if pattern.is_variable() {
        if occurs(&pattern, subject) {
            return false;
        }
        subst.insert(pattern, subject.clone());
        return true;
    }
    if pattern.equals(subject) {
        return true;
    }
    if pattern.is_compound() && subject.is_compound() {
        if pattern.get_operator() != subject.get_operator() {
            return false;
        }
        let pc = pattern.get_components();
        let sc = subject.get_components();
        if pc.len() != sc.len() {
            return false;
        }
        for (p, s) in pc.iter().zip(sc.iter()) {
            if !match_pattern(p, s, subst) {
                return false;
            }
        }
        return true;
    }
    false
}

/// Apply an accumulated substitution to `term`, replacing every bound
/// variable with its binding (resolved transitively through chains).
pub fn apply<T: TermAdapter + Eq + Hash>(term: &T, subst: &Substitution<T>) -> T {
    if term.is_variable() {
        return resolve(term, subst);
    }
    if !term.is_compound() {
        return term.clone();
    }
    let op = term.get_operator().expect("compound term has an operator");
    let components: Vec<T> = term.get_components().iter().map(|c| apply(c, subst)).collect();
    term.reconstruct(op, components).unwrap_or_else(|| term.clone())
}
