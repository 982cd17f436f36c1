//! The condvar-based ack waiter used by a foreground activity that does
//! not itself own the transport's `recv` (spec.md §4.7) — concretely,
//! the client's input loop, which sends a `MOVE_*` and blocks while a
//! separate receive-pump thread watches the socket.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::core::ErrorCode;
use crate::seq::Seq;

/// The result of waiting for a response to a given sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    Ack,
    Nack(Option<ErrorCode>),
}

/// Something `send_and_wait` (§reliable::stopwait) can block on to learn
/// the outcome of one outstanding send. Takes `&self` rather than
/// `&mut self` because every implementation here is meant to be shared
/// (typically via `Arc`) with whatever feeds it — a receive-pump thread
/// for `CondvarAckSource`, the transport itself for `InlineAckSource`.
pub trait AckSource {
    /// Blocks for at most `timeout` for a response to `seq`. Returns
    /// `None` on timeout.
    fn await_ack(&self, seq: Seq, timeout: Duration) -> Option<AckOutcome>;
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    seq: Seq,
    outcome: Option<AckOutcome>,
}

/// Shared state a receive-pump thread publishes into and a foreground
/// thread blocks on, per spec.md §4.7's "pending-move record" /
/// `mutex_movimento`+`cond_movimento` pair in `original_source/`.
#[derive(Default)]
pub struct CondvarAckSource {
    slot: Mutex<Option<Slot>>,
    condvar: Condvar,
    cancelled: AtomicBool,
}

impl CondvarAckSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the receive pump when an ACK/NACK for `seq` arrives.
    /// Returns `true` if it matched the currently-awaited sequence.
    pub fn notify(&self, seq: Seq, outcome: AckOutcome) -> bool {
        let mut guard = self.slot.lock().unwrap();
        match guard.as_mut() {
            Some(pending) if pending.seq == seq => {
                pending.outcome = Some(outcome);
                self.condvar.notify_all();
                true
            }
            _ => false,
        }
    }

    /// Wakes any waiter unconditionally (used on shutdown, spec.md §5
    /// Cancellation), mirroring `original_source/treasure_client.c`'s
    /// `em_execucao` flag checked on every wakeup of its wait loop.
    /// Sets a sticky flag first so `await_ack` returns on the very next
    /// wakeup instead of re-entering `wait_timeout` for a fresh timeout.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.condvar.notify_all();
    }
}

impl AckSource for CondvarAckSource {
    fn await_ack(&self, seq: Seq, timeout: Duration) -> Option<AckOutcome> {
        let guard = self.slot.lock().unwrap();
        let mut guard = {
            let mut g = guard;
            *g = Some(Slot { seq, outcome: None });
            g
        };

        loop {
            match guard.as_ref().and_then(|s| s.outcome) {
                Some(outcome) => return Some(outcome),
                None => {
                    if self.cancelled.load(Ordering::Acquire) {
                        return guard.take().and_then(|s| s.outcome);
                    }
                    let (next, timed_out) = self.condvar.wait_timeout(guard, timeout).unwrap();
                    guard = next;
                    if timed_out.timed_out() || self.cancelled.load(Ordering::Acquire) {
                        return guard.take().and_then(|s| s.outcome);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn times_out_with_no_notification() {
        let source = CondvarAckSource::new();
        let outcome = source.await_ack(Seq::new(0), Duration::from_millis(20));
        assert!(outcome.is_none());
    }

    #[test]
    fn delivers_notification_from_another_thread() {
        let source = Arc::new(CondvarAckSource::new());
        let pump = source.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            pump.notify(Seq::new(5), AckOutcome::Ack);
        });

        let result = source.await_ack(Seq::new(5), Duration::from_millis(200));
        handle.join().unwrap();
        assert_eq!(result, Some(AckOutcome::Ack));
    }

    #[test]
    fn cancel_unblocks_a_waiter_promptly_instead_of_after_a_full_timeout() {
        let source = Arc::new(CondvarAckSource::new());
        let canceller = source.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            canceller.cancel();
        });

        let start = std::time::Instant::now();
        let result = source.await_ack(Seq::new(0), Duration::from_secs(5));
        handle.join().unwrap();

        assert!(result.is_none());
        assert!(start.elapsed() < Duration::from_secs(1), "cancel should unblock well before the 5s timeout");
    }
}
