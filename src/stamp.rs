//! Evidential stamps: the trail of base beliefs behind a task, used to
//! reject derivations built from overlapping evidence (spec.md §3/§4.3 —
//! "a conclusion may not cite the same base evidence twice").

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EVIDENCE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a fresh base-evidence id, used when a task enters the system
/// from outside (input, not derived from other tasks).
pub fn next_evidence_id() -> u64 {
    NEXT_EVIDENCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// An evidential base: the set of input-task ids a belief ultimately
/// traces back to. Stored sorted and deduplicated so `overlaps` and
/// `merge` are linear scans.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stamp {
    evidence: Vec<u64>,
    occurrence_time: Option<i64>,
    /// Length of the longest evidence chain that led to this stamp: 0 for
    /// input tasks, `max(depth(parents)) + 1` for derived ones (spec.md
    /// §3/§4.6). Used by the dispatcher to enforce `max_derivation_depth`.
    depth: u32,
}

impl Stamp {
    /// A stamp for a freshly input task, carrying one fresh evidence id
    /// and depth 0.
    pub fn new_input(occurrence_time: Option<i64>) -> Self {
        Stamp {
            evidence: vec![next_evidence_id()],
            occurrence_time,
            depth: 0,
        }
    }

    /// Construct directly from an evidence list (used when replaying or
    /// restoring a snapshot).
    pub fn from_evidence(mut evidence: Vec<u64>, occurrence_time: Option<i64>) -> Self {
        evidence.sort_unstable();
        evidence.dedup();
        Stamp {
            evidence,
            occurrence_time,
            depth: 0,
        }
    }

    /// As [`from_evidence`](Self::from_evidence), with an explicit depth
    /// (used when restoring a snapshot that recorded derivation depth).
    pub fn from_evidence_at_depth(mut evidence: Vec<u64>, occurrence_time: Option<i64>, depth: u32) -> Self {
        evidence.sort_unstable();
        evidence.dedup();
        Stamp {
            evidence,
            occurrence_time,
            depth,
        }
    }

    pub fn evidence(&self) -> &[u64] {
        &self.evidence
    }

    pub fn occurrence_time(&self) -> Option<i64> {
        self.occurrence_time
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.evidence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evidence.is_empty()
    }

    /// Do two stamps share any base evidence? Binary rules (and revision)
    /// must refuse premises whose stamps overlap, or every derivation
    /// chain degenerates into circular self-confirmation.
    pub fn overlaps(&self, other: &Stamp) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.evidence.len() && j < other.evidence.len() {
            match self.evidence[i].cmp(&other.evidence[j]) {
                std::cmp::Ordering::Equal => return true,
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
            }
        }
        false
    }

    /// Merge two disjoint stamps' evidence, truncating to `max_len` (the
    /// oldest ids are dropped first) per spec.md §4.3. The merged depth is
    /// `max(self.depth, other.depth) + 1`, matching the dispatcher's depth
    /// rule (spec.md §4.6c).
    pub fn merge(&self, other: &Stamp, max_len: usize) -> Stamp {
        let mut evidence: Vec<u64> = self.evidence.iter().chain(other.evidence.iter()).copied().collect();
        evidence.sort_unstable();
        evidence.dedup();
        if evidence.len() > max_len {
            let drop = evidence.len() - max_len;
            evidence.drain(0..drop);
        }
        let occurrence_time = self.occurrence_time.or(other.occurrence_time);
        Stamp {
            evidence,
            occurrence_time,
            depth: self.depth.max(other.depth) + 1,
        }
    }

    /// Depth of a derivation from a single premise (unary rules): `depth +
    /// 1`.
    pub fn derive_unary(&self, max_len: usize) -> Stamp {
        let mut evidence = self.evidence.clone();
        if evidence.len() > max_len {
            let drop = evidence.len() - max_len;
            evidence.drain(0..drop);
        }
        Stamp {
            evidence,
            occurrence_time: self.occurrence_time,
            depth: self.depth + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_input_stamps_never_overlap() {
        let a = Stamp::new_input(None);
        let b = Stamp::new_input(None);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn merge_detects_shared_evidence() {
        let a = Stamp::from_evidence(vec![1, 2, 3], None);
        let b = Stamp::from_evidence(vec![3, 4, 5], None);
        assert!(a.overlaps(&b));
    }

    #[test]
    fn merge_deduplicates_and_sorts() {
        let a = Stamp::from_evidence(vec![5, 1], None);
        let b = Stamp::from_evidence(vec![1, 9], None);
        let merged = a.merge(&b, 10);
        assert_eq!(merged.evidence(), &[1, 5, 9]);
    }

    #[test]
    fn merge_truncates_oldest_first() {
        let a = Stamp::from_evidence(vec![1, 2, 3], None);
        let b = Stamp::from_evidence(vec![4, 5, 6], None);
        let merged = a.merge(&b, 3);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.evidence(), &[4, 5, 6]);
    }

    #[test]
    fn merge_depth_is_max_of_parents_plus_one() {
        let a = Stamp::from_evidence_at_depth(vec![1], None, 2);
        let b = Stamp::from_evidence_at_depth(vec![2], None, 5);
        let merged = a.merge(&b, 10);
        assert_eq!(merged.depth(), 6);
    }

    #[test]
    fn input_stamps_start_at_depth_zero() {
        assert_eq!(Stamp::new_input(None).depth(), 0);
    }
}
