//! Truth values: a frequency/confidence pair summarizing the evidence
//! behind a judgment or goal, plus the truth-function catalog that
//! derives new truth values from premises.
//!
//! - Frequency `f`: the estimated proportion of positive evidence, in
//!   `[0.0, 1.0]`.
//! - Confidence `c`: how much evidence backs that estimate, in
//!   `[0.0, 1.0)` — confidence never reaches 1.0 because evidence is
//!   always finite (AIKR: a reasoner never has complete information).
//!
//! Confidence converts to/from an evidence amount `w` via
//! `c = w / (w + k)`, where `k` is the personality constant
//! [`EVIDENTIAL_HORIZON`].

use std::fmt;
use std::hash::{Hash, Hasher};

use ordered_float::OrderedFloat;

/// Personality constant `k` in `c = w / (w + k)`. Pinned at 1.0 rather
/// than threaded as a runtime parameter, since every rule in the catalog
/// assumes this value and nothing in the kernel varies it per instance.
pub const EVIDENTIAL_HORIZON: f64 = 1.0;

/// Ceiling below which confidence is clamped; confidence is never exactly
/// 1.0 since no finite amount of evidence is complete.
const MAX_CONFIDENCE: f32 = 0.999_99;

/// A frequency/confidence pair.
#[derive(Debug, Clone, Copy)]
pub struct Truth {
    frequency: OrderedFloat<f32>,
    confidence: OrderedFloat<f32>,
}

impl Truth {
    /// Construct a truth value, clamping both components into their valid
    /// ranges. NaN collapses to the most uncertain value (`0.5, 0.0`)
    /// rather than propagating.
    pub fn new(frequency: f32, confidence: f32) -> Self {
        let f = if frequency.is_nan() { 0.5 } else { frequency.clamp(0.0, 1.0) };
        let c = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, MAX_CONFIDENCE) };
        Truth {
            frequency: OrderedFloat(f),
            confidence: OrderedFloat(c),
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency.0
    }

    pub fn confidence(&self) -> f32 {
        self.confidence.0
    }

    /// Evidence amount `w` implied by this truth's confidence.
    pub fn evidence(&self) -> f64 {
        let c = self.confidence.0 as f64;
        EVIDENTIAL_HORIZON * c / (1.0 - c)
    }

    /// Build a truth value from a frequency and an evidence amount.
    pub fn from_evidence(freq: f32, evidence: f64) -> Self {
        let conf = (evidence / (evidence + EVIDENTIAL_HORIZON)) as f32;
        Truth::new(freq, conf)
    }

    /// `f * c`: how strongly this truth value favors "true".
    pub fn expectation(&self) -> f32 {
        self.frequency.0 * self.confidence.0
    }

    pub fn is_analytical(&self) -> bool {
        self.confidence.0 >= MAX_CONFIDENCE
    }

    /// `(1 - f, c)`.
    pub fn negation(&self) -> Self {
        Truth::new(1.0 - self.frequency.0, self.confidence.0)
    }

    pub fn default_belief() -> Self {
        Truth::new(1.0, 0.9)
    }

    pub fn default_goal() -> Self {
        Truth::new(1.0, 0.9)
    }
}

impl fmt::Display for Truth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{:.2};{:.2}%", self.frequency.0, self.confidence.0)
    }
}

impl Hash for Truth {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ((self.frequency.0 * 10000.0) as i32).hash(state);
        ((self.confidence.0 * 10000.0) as i32).hash(state);
    }
}

impl PartialEq for Truth {
    fn eq(&self, other: &Self) -> bool {
        (self.frequency.0 - other.frequency.0).abs() < 1e-4 && (self.confidence.0 - other.confidence.0).abs() < 1e-4
    }
}

impl Eq for Truth {}

/// Revision: combine two truth values about the same statement by
/// pooling their evidence.
pub fn revision(a: &Truth, b: &Truth) -> Truth {
    let w1 = a.evidence();
    let w2 = b.evidence();
    let w = w1 + w2;
    let f = (w1 * a.frequency() as f64 + w2 * b.frequency() as f64) / w;
    Truth::from_evidence(f as f32, w)
}

fn finite_or_none(t: Truth) -> Option<Truth> {
    if t.frequency().is_finite() && t.confidence().is_finite() {
        Some(t)
    } else {
        None
    }
}

/// Deduction: `S-->M, M-->P |- S-->P`.
pub fn deduction(a: &Truth, b: &Truth) -> Truth {
    let f = a.frequency() * b.frequency();
    let c = a.confidence() * b.confidence() * f;
    Truth::new(f, c)
}

/// Induction: `M-->P, M-->S |- S-->P` (weaker: generalizing from one case).
/// `f = f2`, `c = (f1*c1*c2) / (f1*c1*c2 + k)` (spec.md §4.3).
pub fn induction(a: &Truth, b: &Truth) -> Option<Truth> {
    let fa = a.frequency() as f64;
    let w = fa * a.confidence() as f64 * b.confidence() as f64;
    let denom = w + EVIDENTIAL_HORIZON;
    if denom == 0.0 {
        return None;
    }
    let f = b.frequency();
    let c = (w / denom) as f32;
    finite_or_none(Truth::new(f, c))
}

/// Abduction: `P-->M, S-->M |- S-->P`, symmetric to induction with `f2`
/// swapped for `f1`: `f = f1`, `c = (f2*c1*c2) / (f2*c1*c2 + k)` (spec.md
/// §4.3).
pub fn abduction(a: &Truth, b: &Truth) -> Option<Truth> {
    let fb = b.frequency() as f64;
    let w = fb * a.confidence() as f64 * b.confidence() as f64;
    let denom = w + EVIDENTIAL_HORIZON;
    if denom == 0.0 {
        return None;
    }
    let f = a.frequency();
    let c = (w / denom) as f32;
    finite_or_none(Truth::new(f, c))
}

/// Exemplification: `P-->M, M-->S |- S-->P` (the converse-flavored dual of
/// abduction).
pub fn exemplification(a: &Truth, b: &Truth) -> Option<Truth> {
    let fa = a.frequency();
    let fb = b.frequency();
    let denom = (fa * fb) as f64 + EVIDENTIAL_HORIZON;
    if denom == 0.0 {
        return None;
    }
    let f = fa * fb;
    let c = (a.confidence() as f64 * b.confidence() as f64 * f as f64 / denom) as f32;
    finite_or_none(Truth::new(f, c))
}

/// Comparison: `M-->P, M-->S |- S<->P`.
pub fn comparison(a: &Truth, b: &Truth) -> Option<Truth> {
    let fa = a.frequency();
    let fb = b.frequency();
    let denom = (fa * fb + (1.0 - fa) * (1.0 - fb)) as f64;
    if denom == 0.0 {
        return None;
    }
    let f = (fa as f64 * fb as f64 / denom) as f32;
    let c = a.confidence() * b.confidence() * f;
    finite_or_none(Truth::new(f, c))
}

/// Analogy: `S<->M, M-->P |- S-->P`.
pub fn analogy(a: &Truth, b: &Truth) -> Truth {
    let f = a.frequency() * b.frequency();
    let c = a.confidence() * b.confidence() * f;
    Truth::new(f, c)
}

/// Conversion: `M-->P |- P-->M`, weakened since a frequency-1 premise
/// carries no direct evidence for the reverse direction.
pub fn conversion(a: &Truth) -> Option<Truth> {
    let w = a.frequency() as f64 * a.confidence() as f64;
    let denom = w + EVIDENTIAL_HORIZON;
    if denom == 0.0 {
        return None;
    }
    let f = 1.0;
    let c = (w / denom) as f32;
    finite_or_none(Truth::new(f, c))
}

/// Contraposition: `(--S)-->P |- (--P)-->S`, defined via the premise's
/// negative evidence.
pub fn contraposition(a: &Truth) -> Option<Truth> {
    let w = (1.0 - a.frequency()) as f64 * a.confidence() as f64;
    let denom = w + EVIDENTIAL_HORIZON;
    if denom == 0.0 {
        return None;
    }
    let f = 0.0;
    let c = (w / denom) as f32;
    finite_or_none(Truth::new(f, c))
}

/// Intersection: used by composition rules building `(S & P)`-shaped
/// terms from two premises that share a subject or predicate.
pub fn intersection(a: &Truth, b: &Truth) -> Truth {
    let f = a.frequency() * b.frequency();
    let c = a.confidence() * b.confidence();
    Truth::new(f, c)
}

/// Union: used by composition rules building `(S | P)`-shaped terms.
pub fn union(a: &Truth, b: &Truth) -> Truth {
    let f = a.frequency() + b.frequency() - a.frequency() * b.frequency();
    let c = a.confidence() * b.confidence();
    Truth::new(f, c)
}

/// Difference: used by composition rules building `(S ~ P)`-shaped terms.
pub fn difference(a: &Truth, b: &Truth) -> Truth {
    let f = a.frequency() * (1.0 - b.frequency());
    let c = a.confidence() * b.confidence();
    Truth::new(f, c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_inputs() {
        let t = Truth::new(1.5, -0.5);
        assert_eq!(t.frequency(), 1.0);
        assert_eq!(t.confidence(), 0.0);
    }

    #[test]
    fn nan_collapses_to_uncertain() {
        let t = Truth::new(f32::NAN, f32::NAN);
        assert_eq!(t.frequency(), 0.5);
        assert_eq!(t.confidence(), 0.0);
    }

    #[test]
    fn confidence_never_reaches_one() {
        let t = Truth::from_evidence(1.0, 1_000_000.0);
        assert!(t.confidence() < 1.0);
    }

    #[test]
    fn revision_increases_confidence() {
        let a = Truth::new(0.9, 0.9);
        let b = Truth::new(0.8, 0.8);
        let r = revision(&a, &b);
        assert!(r.confidence() > a.confidence());
        assert!(r.confidence() > b.confidence());
    }

    #[test]
    fn revision_is_commutative() {
        let a = Truth::new(0.9, 0.8);
        let b = Truth::new(0.3, 0.6);
        assert_eq!(revision(&a, &b), revision(&b, &a));
    }

    #[test]
    fn deduction_matches_known_values() {
        let a = Truth::new(0.9, 0.9);
        let b = Truth::new(0.8, 0.8);
        let r = deduction(&a, &b);
        assert!((r.frequency() - 0.72).abs() < 1e-4);
        assert!((r.confidence() - 0.5184).abs() < 1e-4);
    }

    #[test]
    fn induction_is_weaker_than_deduction() {
        let a = Truth::new(0.9, 0.9);
        let b = Truth::new(0.8, 0.8);
        let ded = deduction(&a, &b);
        let ind = induction(&a, &b).unwrap();
        assert!(ind.confidence() < ded.confidence());
    }

    #[test]
    fn negation_flips_frequency_only() {
        let t = Truth::new(0.8, 0.9);
        let n = t.negation();
        assert!((n.frequency() - 0.2).abs() < 1e-4);
        assert_eq!(n.confidence(), t.confidence());
    }

    #[test]
    fn conversion_and_contraposition_are_defined_for_normal_inputs() {
        let t = Truth::new(0.0, 0.9);
        assert!(conversion(&t).is_some());
        let t2 = Truth::new(1.0, 0.9);
        assert!(contraposition(&t2).is_some());
    }

    #[test]
    fn conversion_matches_the_bird_flyer_worked_example() {
        // <bird --> flyer> %0.9;0.9% |- <flyer --> bird>, f = 1.0,
        // c = 0.9*0.9 / (0.9*0.9 + 1) ~= 0.4475.
        let t = conversion(&Truth::new(0.9, 0.9)).unwrap();
        assert!((t.frequency() - 1.0).abs() < 1e-4);
        assert!((t.confidence() - 0.4475).abs() < 1e-3);
    }

    #[test]
    fn intersection_union_difference_match_known_values() {
        let a = Truth::new(0.9, 0.9);
        let b = Truth::new(0.8, 0.8);
        let i = intersection(&a, &b);
        assert!((i.frequency() - 0.72).abs() < 1e-4);
        let u = union(&a, &b);
        assert!((u.frequency() - 0.98).abs() < 1e-4);
        let d = difference(&a, &b);
        assert!((d.frequency() - 0.18).abs() < 1e-4);
    }
}
