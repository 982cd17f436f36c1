//! Duplicate-request suppression (spec.md §4.3's "SHOULD", required for
//! Property 5): a retransmitted request that was already applied must
//! be re-acknowledged without being re-applied.

use std::sync::Mutex;

use crate::reliable::AckOutcome;
use crate::seq::Seq;

struct Applied {
    seq: Seq,
    outcome: AckOutcome,
}

/// Tracks the last request this endpoint actually applied, so that a
/// retransmission of the same request (same seq) replays the previous
/// ack/nack instead of running the side effect twice.
#[derive(Default)]
pub struct RequestDedup {
    last: Mutex<Option<Applied>>,
}

impl RequestDedup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves an incoming request with sequence `seq`: if it's a
    /// repeat of the last applied sequence, returns the cached outcome;
    /// otherwise runs `apply`, records its outcome, and returns it.
    pub fn resolve(&self, seq: Seq, apply: impl FnOnce() -> AckOutcome) -> AckOutcome {
        let mut guard = self.last.lock().unwrap();
        if let Some(applied) = guard.as_ref() {
            if applied.seq == seq {
                return applied.outcome;
            }
        }
        let outcome = apply();
        *guard = Some(Applied { seq, outcome });
        outcome
    }

    /// The cached outcome for `seq`, if it's a repeat of the last request
    /// this endpoint applied. Split out from [`RequestDedup::resolve`]
    /// for callers whose "apply" step is a method on the same struct
    /// that owns this dedup instance, where a closure would otherwise
    /// have to borrow `self` as a whole.
    pub fn cached(&self, seq: Seq) -> Option<AckOutcome> {
        let guard = self.last.lock().unwrap();
        guard.as_ref().filter(|applied| applied.seq == seq).map(|applied| applied.outcome)
    }

    /// Records `outcome` as the result of applying `seq`.
    pub fn record(&self, seq: Seq, outcome: AckOutcome) {
        let mut guard = self.last.lock().unwrap();
        *guard = Some(Applied { seq, outcome });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn reapplies_new_sequences_but_not_repeats() {
        let dedup = RequestDedup::new();
        let calls = Cell::new(0);

        let first = dedup.resolve(Seq::new(0), || {
            calls.set(calls.get() + 1);
            AckOutcome::Ack
        });
        let repeat = dedup.resolve(Seq::new(0), || {
            calls.set(calls.get() + 1);
            AckOutcome::Ack
        });
        let next = dedup.resolve(Seq::new(1), || {
            calls.set(calls.get() + 1);
            AckOutcome::Ack
        });

        assert_eq!(first, AckOutcome::Ack);
        assert_eq!(repeat, AckOutcome::Ack);
        assert_eq!(next, AckOutcome::Ack);
        assert_eq!(calls.get(), 2);
    }
}
