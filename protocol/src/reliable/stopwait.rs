//! The stop-and-wait engine itself (spec.md §4.4): send one frame, wait
//! for ACK/NACK/timeout, retransmit on failure, give up after
//! `max_retries`.

use std::time::Duration;

use log::{debug, trace, warn};

use crate::core::{ErrorCode, FrameType};
use crate::error::{Error, Result};
use crate::mac::MacAddr;
use crate::reliable::{AckOutcome, AckSource};
use crate::seq::Seq;
use crate::transport::{RecvOutcome, Transport};

/// Timing knobs for the engine. Spec defaults are `timeout = 500ms`,
/// `max_retries = 5`; both are CLI-overridable (`SPEC_FULL.md` §2) so
/// tests can use short timeouts.
#[derive(Debug, Clone, Copy)]
pub struct StopWaitConfig {
    pub timeout: Duration,
    pub max_retries: u8,
}

impl Default for StopWaitConfig {
    fn default() -> Self {
        StopWaitConfig { timeout: Duration::from_millis(500), max_retries: 5 }
    }
}

/// Sends `(frame_type, seq, payload)` to `dst` and blocks (via
/// `ack_source`) until it is ACKed, NACKed repeatedly into exhaustion,
/// or the retry budget runs out.
///
/// `ack_source` is deliberately generic: the client's foreground thread
/// uses a `CondvarAckSource` fed by its receive-pump thread, while the
/// server drives file transfers inline on its single receive-pump
/// thread via `InlineAckSource`, which polls the transport directly
/// (mirroring `original_source/treasure_server.c`'s nested
/// receive-and-wait loops — there's only one thread reading the socket,
/// so there's nothing to hand the wait off to).
pub fn send_and_wait<T: Transport, A: AckSource>(
    transport: &mut T,
    ack_source: &A,
    dst: MacAddr,
    frame_type: FrameType,
    seq: Seq,
    payload: &[u8],
    cfg: &StopWaitConfig,
) -> Result<()> {
    let mut last_nack_code = None;

    for attempt in 0..cfg.max_retries {
        if attempt > 0 {
            debug!("retransmitting {frame_type:?} seq={} (attempt {attempt})", seq.get());
        }
        transport.send(dst, frame_type, seq, payload)?;

        match ack_source.await_ack(seq, cfg.timeout) {
            Some(AckOutcome::Ack) => return Ok(()),
            Some(AckOutcome::Nack(code)) => {
                last_nack_code = code;
            }
            None => {}
        }
    }

    warn!("giving up on {frame_type:?} seq={} after {} retries", seq.get(), cfg.max_retries);
    Err(Error::MaxRetriesExceeded { last_nack_code: last_nack_code.map(|c| c as u8) })
}

/// Handles one incoming request frame and decides the ack/nack to send
/// back. Implemented by the server for `MOVE_*` frames and by the
/// client for `SIZE`/`TEXT`/`VIDEO`/`IMAGE`/`DATA`/`END_OF_FILE` frames.
/// Returns `None` for frame types this handler doesn't own (ACK/NACK, or
/// a type the other side never sends it) — such frames are logged and
/// ignored, per spec.md §4.4's receiver-side rule.
pub trait RequestHandler {
    fn handle(&mut self, frame_type: FrameType, seq: Seq, payload: &[u8]) -> Option<AckOutcome>;
}

/// An `AckSource` for a thread that owns the transport's `recv` itself.
/// While waiting, it keeps servicing retransmitted copies of the
/// request that triggered this inline send (e.g. the client re-sending
/// the very move whose pickup we're now streaming a file for) through
/// `handler`, acking them just as the outer receive pump would. Any
/// other frame — in particular a *new* request the outer pump would
/// normally dispatch — is dropped without a reply, mirroring
/// `original_source/treasure_server.c`'s nested wait loops, which only
/// ever match `tipo_resp`/`seq_resp` against the one exchange in
/// flight and silently ignore everything else. This is what lets the
/// server send a whole file from inside its receive-pump thread without
/// deadlocking against itself, while still refusing to process a second
/// move until the transfer's EOF is acknowledged (spec.md §4.6).
pub struct InlineAckSource<'a, T: Transport, H: RequestHandler> {
    transport: std::cell::RefCell<&'a mut T>,
    handler: std::cell::RefCell<&'a mut H>,
    retry_of: (FrameType, Seq),
}

impl<'a, T: Transport, H: RequestHandler> InlineAckSource<'a, T, H> {
    /// `retry_of` identifies the request (frame type and sequence) that
    /// triggered this inline send — the only request frame this source
    /// will re-dispatch to `handler` while waiting.
    pub fn new(transport: &'a mut T, handler: &'a mut H, retry_of: (FrameType, Seq)) -> Self {
        InlineAckSource { transport: std::cell::RefCell::new(transport), handler: std::cell::RefCell::new(handler), retry_of }
    }

    /// Polls until an ACK/NACK for `seq` arrives or `deadline` elapses,
    /// re-acking retransmissions of `retry_of` along the way and
    /// dropping every other request frame unanswered.
    fn poll_until(&self, seq: Seq, deadline: Duration) -> Option<AckOutcome> {
        let start = std::time::Instant::now();
        loop {
            if start.elapsed() >= deadline {
                return None;
            }
            match self.transport.borrow_mut().recv() {
                Ok(RecvOutcome::Frame(received)) => {
                    if received.frame_type.is_ack_or_nack() {
                        if received.seq == seq {
                            return Some(match received.frame_type {
                                FrameType::Ack => AckOutcome::Ack,
                                _ => AckOutcome::Nack(received.payload.first().copied().and_then(ErrorCode::from_u8)),
                            });
                        }
                        // Stale ack/nack for a prior exchange; ignore.
                        continue;
                    }
                    if (received.frame_type, received.seq) != self.retry_of {
                        trace!(
                            "dropping {:?} seq={} from {} while a transfer is in flight",
                            received.frame_type,
                            received.seq.get(),
                            received.src
                        );
                        continue;
                    }
                    let outcome = self.handler.borrow_mut().handle(received.frame_type, received.seq, &received.payload);
                    if let Some(outcome) = outcome {
                        let reply_type = match outcome {
                            AckOutcome::Ack => FrameType::Ack,
                            AckOutcome::Nack(_) => FrameType::Nack,
                        };
                        let reply_payload = match outcome {
                            AckOutcome::Nack(Some(code)) => vec![code as u8],
                            _ => Vec::new(),
                        };
                        let _ = self.transport.borrow_mut().send(received.src, reply_type, received.seq, &reply_payload);
                    }
                }
                Ok(RecvOutcome::WouldBlock) => {}
                Err(_) => return None,
            }
        }
    }
}

impl<'a, T: Transport, H: RequestHandler> AckSource for InlineAckSource<'a, T, H> {
    fn await_ack(&self, seq: Seq, timeout: Duration) -> Option<AckOutcome> {
        self.poll_until(seq, timeout)
    }
}

impl<'a, T: Transport, H: RequestHandler> InlineAckSource<'a, T, H> {
    /// A `Transport` view onto the same socket this source polls for
    /// acks, for driving an outbound exchange (e.g. `transfer::send_file`)
    /// from the same thread without a second, conflicting `&mut` borrow.
    /// Each call takes the `RefCell` only for the duration of one
    /// `send`/`recv`, never overlapping with `await_ack`'s own borrow.
    pub fn as_transport(&self) -> InlineTransportView<'_, 'a, T, H> {
        InlineTransportView(self)
    }
}

/// See [`InlineAckSource::as_transport`].
pub struct InlineTransportView<'s, 'a, T: Transport, H: RequestHandler>(&'s InlineAckSource<'a, T, H>);

impl<'s, 'a, T: Transport, H: RequestHandler> Transport for InlineTransportView<'s, 'a, T, H> {
    fn send(&mut self, dst: MacAddr, frame_type: FrameType, seq: Seq, payload: &[u8]) -> Result<()> {
        self.0.transport.borrow_mut().send(dst, frame_type, seq, payload)
    }

    fn recv(&mut self) -> Result<crate::transport::RecvOutcome> {
        self.0.transport.borrow_mut().recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac::MacAddr;
    use crate::reliable::CondvarAckSource;
    use crate::transport::LoopbackTransport;

    #[test]
    fn succeeds_on_first_ack() {
        let (mut client, mut server) = LoopbackTransport::pair(MacAddr::new([1; 6]), MacAddr::new([2; 6]));
        let ack_source = CondvarAckSource::new();
        let cfg = StopWaitConfig { timeout: Duration::from_millis(50), max_retries: 3 };

        let server_mac = MacAddr::new([2; 6]);
        let handle = std::thread::spawn(move || {
            loop {
                if let RecvOutcome::Frame(f) = server.recv().unwrap() {
                    server.send(f.src, FrameType::Ack, f.seq, &[]).unwrap();
                    break;
                }
            }
        });

        let result = send_and_wait(&mut client, &ack_source, server_mac, FrameType::MoveRight, Seq::new(0), &[], &cfg);
        handle.join().unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn gives_up_after_max_retries_with_no_response() {
        let (mut client, _server) = LoopbackTransport::pair(MacAddr::new([1; 6]), MacAddr::new([2; 6]));
        let ack_source = CondvarAckSource::new();
        let cfg = StopWaitConfig { timeout: Duration::from_millis(5), max_retries: 2 };

        let result = send_and_wait(
            &mut client,
            &ack_source,
            MacAddr::new([2; 6]),
            FrameType::MoveUp,
            Seq::new(0),
            &[],
            &cfg,
        );
        assert!(matches!(result, Err(Error::MaxRetriesExceeded { .. })));
    }

    #[test]
    fn sends_exactly_max_retries_times_total_when_every_ack_is_dropped() {
        // No one ever acks, so every send times out; the server side
        // (which never replies) just accumulates the raw sends in its
        // queue for us to count afterwards.
        let (mut client, mut server) = LoopbackTransport::pair(MacAddr::new([1; 6]), MacAddr::new([2; 6]));
        let ack_source = CondvarAckSource::new();
        let cfg = StopWaitConfig { timeout: Duration::from_millis(5), max_retries: 3 };

        let result = send_and_wait(
            &mut client,
            &ack_source,
            MacAddr::new([2; 6]),
            FrameType::MoveUp,
            Seq::new(0),
            &[],
            &cfg,
        );
        assert!(matches!(result, Err(Error::MaxRetriesExceeded { .. })));

        let mut received = 0;
        while let RecvOutcome::Frame(_) = server.recv().unwrap() {
            received += 1;
        }
        assert_eq!(received, 3);
    }

    struct CountingHandler {
        calls: usize,
    }

    impl RequestHandler for CountingHandler {
        fn handle(&mut self, _frame_type: FrameType, _seq: Seq, _payload: &[u8]) -> Option<AckOutcome> {
            self.calls += 1;
            Some(AckOutcome::Ack)
        }
    }

    #[test]
    fn inline_ack_source_drops_a_new_request_instead_of_dispatching_it() {
        let (mut far, mut near) = LoopbackTransport::pair(MacAddr::new([1; 6]), MacAddr::new([2; 6]));
        // A distinct, unrelated move arrives while we're inline-waiting
        // on an ack for a different (frame_type, seq) pair.
        far.send(MacAddr::new([2; 6]), FrameType::MoveLeft, Seq::new(7), &[]).unwrap();

        let mut handler = CountingHandler { calls: 0 };
        let ack_source = InlineAckSource::new(&mut near, &mut handler, (FrameType::MoveRight, Seq::new(0)));
        let outcome = ack_source.await_ack(Seq::new(0), Duration::from_millis(20));

        assert!(outcome.is_none());
        assert_eq!(handler.calls, 0, "a request frame unrelated to the in-flight transfer must not be dispatched");
    }

    #[test]
    fn inline_ack_source_still_services_a_retransmission_of_the_triggering_request() {
        let (mut far, mut near) = LoopbackTransport::pair(MacAddr::new([1; 6]), MacAddr::new([2; 6]));
        far.send(MacAddr::new([2; 6]), FrameType::MoveRight, Seq::new(0), &[]).unwrap();
        far.send(MacAddr::new([2; 6]), FrameType::Ack, Seq::new(9), &[]).unwrap();

        let mut handler = CountingHandler { calls: 0 };
        let ack_source = InlineAckSource::new(&mut near, &mut handler, (FrameType::MoveRight, Seq::new(0)));
        let outcome = ack_source.await_ack(Seq::new(9), Duration::from_millis(50));

        assert_eq!(outcome, Some(AckOutcome::Ack));
        assert_eq!(handler.calls, 1, "a retransmission of the triggering request should still be re-acked");
    }
}
