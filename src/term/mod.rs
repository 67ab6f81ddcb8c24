//! Term representation in NARS.
//!
//! A term is the unit of the formal language: an atom, a variable, or a
//! compound built from an operator and an ordered list of component
//! terms. Terms are structurally immutable and interned (see
//! [`intern`]): two terms with identical structure share one
//! allocation, so equality and hashing are O(1).

pub mod intern;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smartstring::{LazyCompact, SmartString};

use crate::error::NarsError;

type Str = SmartString<LazyCompact>;

/// The kind of a variable term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// `$x` — bound the same way across a whole statement.
    Independent,
    /// `#x` — existentially scoped to one compound.
    Dependent,
    /// `?x` — stands for the answer to a question.
    Query,
}

impl VarKind {
    fn sigil(self) -> char {
        match self {
            VarKind::Independent => '$',
            VarKind::Dependent => '#',
            VarKind::Query => '?',
        }
    }
}

/// Term operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Inheritance,
    Similarity,
    Implication,
    Equivalence,
    /// Predictive implication `=/>` (antecedent precedes consequent).
    ImplicationPredictive,
    /// Concurrent implication `=|>` (antecedent and consequent overlap).
    ImplicationConcurrent,
    /// Retrospective implication `=\>` (antecedent follows consequent).
    ImplicationRetrospective,
    Negation,
    Conjunction,
    Disjunction,
    Difference,
    Product,
    ImageExt,
    ImageInt,
}

impl Op {
    /// Commutative operators normalize component order at construction
    /// (spec.md §3, §4.1; property 2 in §8).
    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            Op::Conjunction | Op::Disjunction | Op::Similarity | Op::Equivalence
        )
    }

    /// Fixed arity, or `None` if the operator accepts a variadic list.
    pub fn fixed_arity(self) -> Option<usize> {
        match self {
            Op::Inheritance
            | Op::Similarity
            | Op::Implication
            | Op::Equivalence
            | Op::ImplicationPredictive
            | Op::ImplicationConcurrent
            | Op::ImplicationRetrospective
            | Op::Difference => Some(2),
            Op::Negation => Some(1),
            Op::Conjunction | Op::Disjunction | Op::Product | Op::ImageExt | Op::ImageInt => None,
        }
    }

    /// Lowest arity accepted for variadic operators.
    fn min_arity(self) -> usize {
        match self {
            Op::Conjunction | Op::Disjunction => 2,
            Op::Product | Op::ImageExt | Op::ImageInt => 1,
            _ => self.fixed_arity().unwrap_or(1),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Op::Inheritance => "-->",
            Op::Similarity => "<->",
            Op::Implication => "==>",
            Op::Equivalence => "<=>",
            Op::ImplicationPredictive => "=/>",
            Op::ImplicationConcurrent => "=|>",
            Op::ImplicationRetrospective => "=\\>",
            Op::Negation => "--",
            Op::Conjunction => "&",
            Op::Disjunction => "|",
            Op::Difference => "<~>",
            Op::Product => "*",
            Op::ImageExt => "/",
            Op::ImageInt => "\\",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// The structural payload of an interned term node.
#[derive(Debug, Clone)]
pub(crate) enum TermData {
    Atom(Str),
    Var(VarKind, Str),
    Compound(Op, Box<[Term]>, Option<i32>),
}

/// A node in the interner: the structural data plus a cached hash and
/// complexity so both are O(1) to read off an already-canonical term.
#[derive(Debug)]
pub(crate) struct TermNode {
    data: TermData,
    hash: u64,
    complexity: usize,
}

impl TermNode {
    /// Structural equality, shallow over children: children of a
    /// `Compound` are themselves interned, so comparing them is a pointer
    /// comparison, not a recursive structural walk.
    fn structural_eq(&self, other: &TermNode) -> bool {
        match (&self.data, &other.data) {
            (TermData::Atom(a), TermData::Atom(b)) => a == b,
            (TermData::Var(k1, a), TermData::Var(k2, b)) => k1 == k2 && a == b,
            (TermData::Compound(op1, c1, dt1), TermData::Compound(op2, c2, dt2)) => {
                op1 == op2 && dt1 == dt2 && c1.len() == c2.len() && c1.iter().zip(c2.iter()).all(|(x, y)| x == y)
            }
            _ => false,
        }
    }
}

fn hash_of(data: &TermData) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut h = DefaultHasher::new();
    match data {
        TermData::Atom(s) => {
            0u8.hash(&mut h);
            s.hash(&mut h);
        }
        TermData::Var(kind, s) => {
            1u8.hash(&mut h);
            kind.hash(&mut h);
            s.hash(&mut h);
        }
        TermData::Compound(op, components, dt) => {
            2u8.hash(&mut h);
            op.hash(&mut h);
            dt.hash(&mut h);
            for c in components.iter() {
                c.canonical_id().hash(&mut h);
            }
        }
    }
    h.finish()
}

/// A canonical, interned term handle. Cheap to clone (an `Arc` bump);
/// equality and hashing are O(1) pointer operations once interned.
#[derive(Debug, Clone)]
pub struct Term(pub(crate) Arc<TermNode>);

impl Term {
    /// Construct (or fetch) the canonical atom with this name.
    pub fn atom(name: &str) -> Term {
        intern::intern(TermData::Atom(Str::from(name)))
    }

    /// Construct (or fetch) the canonical variable of `kind` named `name`
    /// (without its sigil).
    pub fn variable(kind: VarKind, name: &str) -> Term {
        intern::intern(TermData::Var(kind, Str::from(name)))
    }

    /// Construct (or fetch) the canonical compound. Commutative operators
    /// sort their components by canonical id; arity is validated against
    /// `op`. Construction only fails on ill-formed arity (`BadTerm`) —
    /// spec.md §4.1.
    pub fn compound(op: Op, mut components: Vec<Term>) -> Result<Term, NarsError> {
        if let Some(n) = op.fixed_arity() {
            if components.len() != n {
                return Err(NarsError::BadTerm(format!(
                    "{op} expects exactly {n} components, got {}",
                    components.len()
                )));
            }
        } else if components.len() < op.min_arity() {
            return Err(NarsError::BadTerm(format!(
                "{op} expects at least {} components, got {}",
                op.min_arity(),
                components.len()
            )));
        }
        if op.is_commutative() {
            components.sort_by_key(|t| t.canonical_id());
            components.dedup_by_key(|t| t.canonical_id());
        }
        Ok(intern::intern(TermData::Compound(op, components.into_boxed_slice(), None)))
    }

    /// As [`compound`](Self::compound) but with a temporal offset `dt`
    /// between the first two components (used for `=/>`, `=|>`, `=\>`
    /// and sequential/parallel conjunction).
    pub fn compound_temporal(op: Op, components: Vec<Term>, dt: i32) -> Result<Term, NarsError> {
        let t = Term::compound(op, components)?;
        match &t.0.data {
            TermData::Compound(op, components, _) => Ok(intern::intern(TermData::Compound(
                *op,
                components.clone(),
                Some(dt),
            ))),
            _ => unreachable!(),
        }
    }

    /// An opaque, process-stable id used to order commutative components
    /// and to key memory/termlink structures. Stable for the lifetime of
    /// the process because the interner never moves or frees live terms.
    pub fn canonical_id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn operator(&self) -> Option<Op> {
        match &self.0.data {
            TermData::Compound(op, _, _) => Some(*op),
            _ => None,
        }
    }

    pub fn components(&self) -> &[Term] {
        match &self.0.data {
            TermData::Compound(_, components, _) => components,
            _ => &[],
        }
    }

    /// Alias of [`components`](Self::components) (spec.md §4.1 naming).
    pub fn subterms(&self) -> &[Term] {
        self.components()
    }

    pub fn dt(&self) -> Option<i32> {
        match &self.0.data {
            TermData::Compound(_, _, dt) => *dt,
            _ => None,
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self.0.data, TermData::Compound(..))
    }

    pub fn is_atom(&self) -> bool {
        matches!(self.0.data, TermData::Atom(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.0.data, TermData::Var(..))
    }

    pub fn var_kind(&self) -> Option<VarKind> {
        match &self.0.data {
            TermData::Var(kind, _) => Some(*kind),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.0.data {
            TermData::Atom(s) => Some(s.as_str()),
            TermData::Var(_, s) => Some(s.as_str()),
            TermData::Compound(..) => None,
        }
    }

    /// Complexity: 1 for an atomic term, 1 plus the sum of the
    /// components' complexity for a compound.
    pub fn complexity(&self) -> usize {
        self.0.complexity
    }

    /// All variables occurring anywhere in this term, without duplicates,
    /// in first-occurrence order.
    pub fn free_variables(&self) -> Vec<Term> {
        let mut out = Vec::new();
        fn walk(t: &Term, out: &mut Vec<Term>) {
            if t.is_variable() {
                if !out.iter().any(|v| v == t) {
                    out.push(t.clone());
                }
            } else {
                for c in t.components() {
                    walk(c, out);
                }
            }
        }
        walk(self, &mut out);
        out
    }

    /// Recursively replace every occurrence of `from` with `to`.
    pub fn substitute(&self, from: &Term, to: &Term) -> Term {
        if self == from {
            return to.clone();
        }
        if !self.is_compound() {
            return self.clone();
        }
        let op = self.operator().unwrap();
        let dt = self.dt();
        let new_components: Vec<Term> = self.components().iter().map(|c| c.substitute(from, to)).collect();
        let unchanged = new_components
            .iter()
            .zip(self.components().iter())
            .all(|(a, b)| a == b);
        if unchanged {
            return self.clone();
        }
        match dt {
            Some(dt) => Term::compound_temporal(op, new_components, dt).unwrap_or_else(|_| self.clone()),
            None => Term::compound(op, new_components).unwrap_or_else(|_| self.clone()),
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash.hash(state);
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical_id().cmp(&other.canonical_id())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.data {
            TermData::Atom(s) => write!(f, "{s}"),
            TermData::Var(kind, s) => write!(f, "{}{s}", kind.sigil()),
            TermData::Compound(op, components, dt) => {
                match op {
                    Op::Negation => write!(f, "(--, {})", components[0])?,
                    Op::Product => {
                        write!(f, "(*")?;
                        for c in components.iter() {
                            write!(f, ", {c}")?;
                        }
                        write!(f, ")")?;
                    }
                    Op::ImageExt | Op::ImageInt => {
                        write!(f, "({op}")?;
                        for c in components.iter() {
                            write!(f, ", {c}")?;
                        }
                        write!(f, ")")?;
                    }
                    _ if components.len() == 2 => {
                        write!(f, "({} {op} {})", components[0], components[1])?;
                    }
                    _ => {
                        write!(f, "({op}")?;
                        for c in components.iter() {
                            write!(f, ", {c}")?;
                        }
                        write!(f, ")")?;
                    }
                }
                if let Some(dt) = dt {
                    write!(f, "_{dt}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_with_same_name_are_identical() {
        let a1 = Term::atom("bird");
        let a2 = Term::atom("bird");
        assert_eq!(a1, a2);
        assert_eq!(a1.canonical_id(), a2.canonical_id());
    }

    #[test]
    fn commutative_normalization() {
        let x = Term::atom("x");
        let y = Term::atom("y");
        let a = Term::compound(Op::Conjunction, vec![x.clone(), y.clone()]).unwrap();
        let b = Term::compound(Op::Conjunction, vec![y, x]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.components(), b.components());
    }

    #[test]
    fn non_commutative_keeps_order() {
        let x = Term::atom("x");
        let y = Term::atom("y");
        let a = Term::compound(Op::Inheritance, vec![x.clone(), y.clone()]).unwrap();
        let b = Term::compound(Op::Inheritance, vec![y, x]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn bad_arity_rejected() {
        let x = Term::atom("x");
        let err = Term::compound(Op::Inheritance, vec![x]).unwrap_err();
        assert!(matches!(err, NarsError::BadTerm(_)));
    }

    #[test]
    fn display_inheritance() {
        let t = Term::compound(Op::Inheritance, vec![Term::atom("bird"), Term::atom("flyer")]).unwrap();
        assert_eq!(format!("{t}"), "(bird --> flyer)");
    }

    #[test]
    fn display_negation_and_product() {
        let n = Term::compound(Op::Negation, vec![Term::atom("rain")]).unwrap();
        assert_eq!(format!("{n}"), "(--, rain)");

        let p = Term::compound(Op::Product, vec![Term::atom("a"), Term::atom("b")]).unwrap();
        assert_eq!(format!("{p}"), "(*, a, b)");
    }

    #[test]
    fn free_variables_deduplicated() {
        let x = Term::variable(VarKind::Independent, "x");
        let y = Term::atom("y");
        let t = Term::compound(Op::Conjunction, vec![x.clone(), y, x.clone()]).unwrap();
        assert_eq!(t.free_variables(), vec![x]);
    }

    #[test]
    fn substitute_replaces_variable() {
        let x = Term::variable(VarKind::Independent, "x");
        let bird = Term::atom("bird");
        let flyer = Term::atom("flyer");
        let pattern = Term::compound(Op::Inheritance, vec![x.clone(), flyer.clone()]).unwrap();
        let substituted = pattern.substitute(&x, &bird);
        assert_eq!(
            substituted,
            Term::compound(Op::Inheritance, vec![bird, flyer]).unwrap()
        );
    }

    #[test]
    fn complexity_counts_nodes() {
        let a = Term::atom("a");
        assert_eq!(a.complexity(), 1);
        let c = Term::compound(Op::Conjunction, vec![Term::atom("a"), Term::atom("b")]).unwrap();
        assert_eq!(c.complexity(), 3);
    }
}
