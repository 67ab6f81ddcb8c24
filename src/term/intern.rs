//! Process-wide term interner.
//!
//! Every [`Term`](super::Term) is canonicalized through this module:
//! structurally equal terms resolve to the same `Arc` allocation, so
//! `Term` equality and hashing become pointer operations. The interner
//! is a bucket map keyed by structural hash; collisions within a bucket
//! are resolved by the shallow structural comparison in
//! [`TermNode::structural_eq`](super::TermNode::structural_eq), which is
//! itself O(1) per level because a compound's children are already
//! interned by the time the compound is built.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::{hash_of, Term, TermData, TermNode};

type Bucket = Vec<Arc<TermNode>>;

struct Interner {
    buckets: RwLock<hashbrown::HashMap<u64, Bucket>>,
}

static INTERNER: OnceLock<Interner> = OnceLock::new();
static CACHE_HITS: AtomicU64 = AtomicU64::new(0);
static CACHE_MISSES: AtomicU64 = AtomicU64::new(0);

fn interner() -> &'static Interner {
    INTERNER.get_or_init(|| Interner {
        buckets: RwLock::new(hashbrown::HashMap::new()),
    })
}

fn complexity_of(data: &TermData) -> usize {
    match data {
        TermData::Atom(_) | TermData::Var(..) => 1,
        TermData::Compound(_, components, _) => {
            1 + components.iter().map(|c| c.complexity()).sum::<usize>()
        }
    }
}

/// Intern `data`, returning the canonical [`Term`] handle. Structurally
/// identical terms (including, for compounds, pointer-equal already-interned
/// children) always resolve to the same `Arc`.
pub fn intern(data: TermData) -> Term {
    intern_traced(data).0
}

/// As [`intern`], but also reports whether this call allocated a new node
/// (`true`) or found an existing one (`false`) — used by callers that want
/// to emit `term_cache_hit` / `term_cache_miss` events.
pub fn intern_traced(data: TermData) -> (Term, bool) {
    let hash = hash_of(&data);
    let probe = TermNode {
        data: data.clone(),
        hash,
        complexity: 0,
    };

    {
        let buckets = interner().buckets.read();
        if let Some(bucket) = buckets.get(&hash) {
            if let Some(existing) = bucket.iter().find(|n| n.structural_eq(&probe)) {
                CACHE_HITS.fetch_add(1, Ordering::Relaxed);
                return (Term(Arc::clone(existing)), false);
            }
        }
    }

    let mut buckets = interner().buckets.write();
    let bucket = buckets.entry(hash).or_insert_with(Vec::new);
    if let Some(existing) = bucket.iter().find(|n| n.structural_eq(&probe)) {
        CACHE_HITS.fetch_add(1, Ordering::Relaxed);
        return (Term(Arc::clone(existing)), false);
    }
    let complexity = complexity_of(&data);
    let node = Arc::new(TermNode {
        data,
        hash,
        complexity,
    });
    bucket.push(Arc::clone(&node));
    CACHE_MISSES.fetch_add(1, Ordering::Relaxed);
    (Term(node), true)
}

/// Snapshot of interner cache hit/miss counters, for `term_cache_hit` /
/// `term_cache_miss` event emission and diagnostics.
pub fn cache_stats() -> (u64, u64) {
    (
        CACHE_HITS.load(Ordering::Relaxed),
        CACHE_MISSES.load(Ordering::Relaxed),
    )
}

/// Number of distinct terms currently interned, across all buckets.
pub fn live_term_count() -> usize {
    interner().buckets.read().values().map(|b| b.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::super::{Op, VarKind};
    use super::*;

    #[test]
    fn repeated_interning_is_a_cache_hit() {
        let before = cache_stats();
        let a = Term::atom("zzz_unique_probe_one");
        let b = Term::atom("zzz_unique_probe_one");
        assert_eq!(a, b);
        let after = cache_stats();
        assert!(after.1 > before.1, "first intern should miss");
    }

    #[test]
    fn distinct_structures_do_not_collide() {
        let x = Term::variable(VarKind::Independent, "shared");
        let y = Term::atom("shared");
        assert_ne!(x, y);
        let c1 = Term::compound(Op::Inheritance, vec![x.clone(), Term::atom("p")]).unwrap();
        let c2 = Term::compound(Op::Inheritance, vec![y, Term::atom("p")]).unwrap();
        assert_ne!(c1, c2);
    }
}
