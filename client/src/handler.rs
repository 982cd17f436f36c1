//! Client-side request handling for the incoming half of a file
//! transfer: SIZE → METADATA (TEXT/VIDEO/IMAGE) → DATA* → END_OF_FILE.
//!
//! Grounded on `original_source/treasure_client.c`'s `thread_recebimento`
//! switch over `TIPO_TAMANHO`/`TIPO_TEXTO`/`TIPO_VIDEO`/`TIPO_IMAGEM`/
//! `TIPO_DADOS`/`TIPO_FIM_ARQUIVO`.

use std::io::Write;

use log::{info, warn};

use protocol::collaborators::FileSink;
use protocol::core::{ErrorCode, FrameType};
use protocol::game::SharedGame;
use protocol::reliable::{AckOutcome, RequestDedup, RequestHandler, TransferGate};
use protocol::seq::Seq;
use protocol::transfer;

struct PendingFile {
    name: String,
    writer: Box<dyn Write + Send>,
}

/// Applies incoming file-transfer request frames, deduplicating
/// retransmissions the same way the server does for `MOVE_*` frames.
/// Holds `gate` up while a transfer is open (METADATA..EOF) so the
/// foreground input loop can refuse new moves until it closes again
/// (spec.md §4.6/§4.7).
pub struct ClientRequestHandler<'a> {
    game: &'a SharedGame,
    sink: &'a mut dyn FileSink,
    gate: &'a TransferGate,
    dedup: RequestDedup,
    pending: Option<PendingFile>,
}

impl<'a> ClientRequestHandler<'a> {
    pub fn new(game: &'a SharedGame, sink: &'a mut dyn FileSink, gate: &'a TransferGate) -> Self {
        ClientRequestHandler { game, sink, gate, dedup: RequestDedup::new(), pending: None }
    }

    fn apply(&mut self, frame_type: FrameType, payload: &[u8]) -> AckOutcome {
        match frame_type {
            FrameType::Size => match transfer::decode_size(payload) {
                Ok(size) => {
                    info!("incoming file size: {size} bytes");
                    if self.sink.check_space(size) {
                        AckOutcome::Ack
                    } else {
                        warn!("insufficient space for {size}-byte transfer");
                        AckOutcome::Nack(Some(ErrorCode::InsufficientSpace))
                    }
                }
                Err(e) => {
                    warn!("malformed SIZE payload: {e}");
                    AckOutcome::Nack(None)
                }
            },
            FrameType::Text | FrameType::Video | FrameType::Image => match transfer::decode_name(payload) {
                Ok(name) => match self.sink.create(&name) {
                    Ok(writer) => {
                        info!("receiving {name:?}");
                        self.pending = Some(PendingFile { name, writer });
                        self.gate.begin();
                        AckOutcome::Ack
                    }
                    Err(e) => {
                        warn!("could not create destination file: {e}");
                        AckOutcome::Nack(None)
                    }
                },
                Err(e) => {
                    warn!("malformed metadata payload: {e}");
                    AckOutcome::Nack(None)
                }
            },
            FrameType::Data => {
                let Some(pending) = self.pending.as_mut() else {
                    warn!("DATA frame with no transfer in progress");
                    return AckOutcome::Nack(None);
                };
                match pending.writer.write_all(payload) {
                    Ok(()) => AckOutcome::Ack,
                    Err(e) => {
                        warn!("failed writing chunk: {e}");
                        let name = pending.name.clone();
                        self.sink.abort(&name);
                        self.pending = None;
                        self.gate.end();
                        AckOutcome::Nack(None)
                    }
                }
            }
            FrameType::EndOfFile => {
                let Some(pending) = self.pending.take() else {
                    warn!("END_OF_FILE with no transfer in progress");
                    return AckOutcome::Nack(None);
                };
                info!("{:?} received successfully", pending.name);
                self.game.mutate(|g| g.record_discovery(g.player, pending.name));
                self.gate.end();
                AckOutcome::Ack
            }
            _ => unreachable!("handle() filters to known request types"),
        }
    }
}

impl<'a> RequestHandler for ClientRequestHandler<'a> {
    fn handle(&mut self, frame_type: FrameType, seq: Seq, payload: &[u8]) -> Option<AckOutcome> {
        if !matches!(
            frame_type,
            FrameType::Size | FrameType::Text | FrameType::Video | FrameType::Image | FrameType::Data | FrameType::EndOfFile
        ) {
            return None;
        }
        if let Some(cached) = self.dedup.cached(seq) {
            return Some(cached);
        }
        let outcome = self.apply(frame_type, payload);
        self.dedup.record(seq, outcome);
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    use protocol::game::GameState;

    #[derive(Default)]
    struct FakeSink {
        space_ok: bool,
        created: Mutex<Vec<String>>,
        aborted: Mutex<Vec<String>>,
    }

    impl FileSink for FakeSink {
        fn check_space(&self, _size: u64) -> bool {
            self.space_ok
        }

        fn create(&mut self, name: &str) -> protocol::error::Result<Box<dyn Write + Send>> {
            self.created.lock().unwrap().push(name.to_string());
            Ok(Box::new(Cursor::new(Vec::new())))
        }

        fn abort(&mut self, name: &str) {
            self.aborted.lock().unwrap().push(name.to_string());
        }
    }

    #[test]
    fn full_transfer_sequence_acks_every_phase_and_records_discovery() {
        let game = SharedGame::new(GameState::new_empty());
        let mut sink = FakeSink { space_ok: true, ..Default::default() };
        let gate = TransferGate::new();
        let mut handler = ClientRequestHandler::new(&game, &mut sink, &gate);

        let size_ack = handler.handle(FrameType::Size, Seq::new(0), &transfer::encode_size(5));
        assert_eq!(size_ack, Some(AckOutcome::Ack));

        let name = transfer::encode_name("3.txt").unwrap();
        let meta_ack = handler.handle(FrameType::Text, Seq::new(1), &name);
        assert_eq!(meta_ack, Some(AckOutcome::Ack));

        let data_ack = handler.handle(FrameType::Data, Seq::new(2), b"hello");
        assert_eq!(data_ack, Some(AckOutcome::Ack));

        let eof_ack = handler.handle(FrameType::EndOfFile, Seq::new(3), &[]);
        assert_eq!(eof_ack, Some(AckOutcome::Ack));

        assert_eq!(game.snapshot().treasures.iter().filter(|t| t.found).count(), 1);
        gate.wait_until_idle();
    }

    #[test]
    fn size_nacks_with_insufficient_space_code_when_sink_refuses() {
        let game = SharedGame::new(GameState::new_empty());
        let mut sink = FakeSink { space_ok: false, ..Default::default() };
        let gate = TransferGate::new();
        let mut handler = ClientRequestHandler::new(&game, &mut sink, &gate);

        let outcome = handler.handle(FrameType::Size, Seq::new(0), &transfer::encode_size(100));
        assert_eq!(outcome, Some(AckOutcome::Nack(Some(ErrorCode::InsufficientSpace))));
    }

    #[test]
    fn retransmitted_request_replays_cached_outcome_without_reapplying() {
        let game = SharedGame::new(GameState::new_empty());
        let mut sink = FakeSink { space_ok: true, ..Default::default() };
        let gate = TransferGate::new();
        let mut handler = ClientRequestHandler::new(&game, &mut sink, &gate);

        let name = transfer::encode_name("4.txt").unwrap();
        let first = handler.handle(FrameType::Text, Seq::new(5), &name);
        let repeat = handler.handle(FrameType::Text, Seq::new(5), &name);
        assert_eq!(first, repeat);
        assert_eq!(handler.sink.create("unused").is_ok(), true);
    }

    #[test]
    fn unowned_frame_types_return_none() {
        let game = SharedGame::new(GameState::new_empty());
        let mut sink = FakeSink::default();
        let gate = TransferGate::new();
        let mut handler = ClientRequestHandler::new(&game, &mut sink, &gate);
        assert_eq!(handler.handle(FrameType::Ack, Seq::new(0), &[]), None);
        assert_eq!(handler.handle(FrameType::MoveUp, Seq::new(0), &[]), None);
    }

    #[test]
    fn metadata_opens_the_gate_and_eof_closes_it() {
        let game = SharedGame::new(GameState::new_empty());
        let mut sink = FakeSink { space_ok: true, ..Default::default() };
        let gate = TransferGate::new();
        let mut handler = ClientRequestHandler::new(&game, &mut sink, &gate);

        let name = transfer::encode_name("5.txt").unwrap();
        handler.handle(FrameType::Text, Seq::new(0), &name);

        let closer_done = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = closer_done.clone();
        let closer = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        });
        // The gate must still be held at this point: nothing has ended it yet.
        gate.end();
        closer.join().unwrap();
        assert!(closer_done.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn write_failure_during_data_aborts_and_closes_the_gate() {
        struct FailingSink;
        impl FileSink for FailingSink {
            fn check_space(&self, _size: u64) -> bool {
                true
            }
            fn create(&mut self, _name: &str) -> protocol::error::Result<Box<dyn Write + Send>> {
                struct FailWriter;
                impl Write for FailWriter {
                    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                        Err(std::io::Error::other("disk full"))
                    }
                    fn flush(&mut self) -> std::io::Result<()> {
                        Ok(())
                    }
                }
                Ok(Box::new(FailWriter))
            }
            fn abort(&mut self, _name: &str) {}
        }

        let game = SharedGame::new(GameState::new_empty());
        let mut sink = FailingSink;
        let gate = TransferGate::new();
        let mut handler = ClientRequestHandler::new(&game, &mut sink, &gate);

        let name = transfer::encode_name("6.txt").unwrap();
        handler.handle(FrameType::Text, Seq::new(0), &name);
        let outcome = handler.handle(FrameType::Data, Seq::new(1), b"x");
        assert_eq!(outcome, Some(AckOutcome::Nack(None)));

        // The gate was closed by the failure path, so this returns immediately.
        gate.wait_until_idle();
    }
}
