mod cli;
mod handler;
mod render;
mod sink;

use std::io::{self, BufRead, Write as _};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};

use protocol::collaborators::GridRenderer;
use protocol::config;
use protocol::core::FrameType;
use protocol::game::{Direction, GameState, SharedGame};
use protocol::reliable::{send_and_wait, AckOutcome, CondvarAckSource, RequestHandler, TransferGate};
use protocol::seq::Seq;
use protocol::transport::{RawEthernetSocket, RecvOutcome, Transport};

use cli::Cli;
use handler::ClientRequestHandler;
use render::ClientGridRenderer;
use sink::{ensure_received_dir, ReceivedFileSink};

fn main() -> anyhow::Result<()> {
    // ── Logging ─────────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // ── Parse CLI ───────────────────────────────────────────────
    let args = Cli::parse();
    info!("starting treasure-hunt client on {} as {}", args.interface, args.local_mac);

    ensure_received_dir(&args.received_dir)?;
    let mut sink = ReceivedFileSink::new(&args.received_dir);

    let shared_game = SharedGame::new(GameState::new_empty());
    let transfer_gate = Arc::new(TransferGate::new());
    let cfg = config::stop_wait_config(args.timeout_ms, args.max_retries);

    let recv_transport = RawEthernetSocket::open(&args.interface, args.local_mac, Duration::from_millis(200))?;
    let mut send_transport = recv_transport.try_clone()?;

    let ack_source = Arc::new(CondvarAckSource::new());

    // ── Graceful shutdown ───────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        let ack_source = ack_source.clone();
        let transfer_gate = transfer_gate.clone();
        ctrlc::set_handler(move || {
            info!("shutting down...");
            running.store(false, Ordering::Relaxed);
            ack_source.cancel();
            transfer_gate.end();
        })?;
    }

    let mut renderer = ClientGridRenderer;
    renderer.render(&shared_game.snapshot());
    shared_game.take_redraw_pending();

    std::thread::scope(|scope| {
        let running_pump = running.clone();
        let ack_source_pump = ack_source.clone();
        let game_ref = &shared_game;
        let gate_ref = transfer_gate.as_ref();

        scope.spawn(move || {
            let mut handler = ClientRequestHandler::new(game_ref, &mut sink, gate_ref);
            pump_loop(recv_transport, ack_source_pump.as_ref(), &mut handler, running_pump.as_ref());
        });

        let mut next_seq_out = Seq::new(0);
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        while running.load(Ordering::Relaxed) {
            if shared_game.take_redraw_pending() {
                renderer.render(&shared_game.snapshot());
            }

            // Block here, not just the send below: a transfer triggered by
            // the last move must finish before the next command is even
            // read, per spec.md §4.6/§4.7.
            transfer_gate.wait_until_idle();
            if !running.load(Ordering::Relaxed) {
                break;
            }

            print!("Digite o comando (w/a/s/d, q para sair): ");
            let _ = io::stdout().flush();

            let Some(Ok(line)) = lines.next() else {
                break;
            };
            let Some(first) = line.trim().chars().next() else {
                continue;
            };

            let direction = match first.to_ascii_lowercase() {
                'w' => Some(Direction::Up),
                's' => Some(Direction::Down),
                'a' => Some(Direction::Left),
                'd' => Some(Direction::Right),
                'q' => {
                    running.store(false, Ordering::Relaxed);
                    ack_source.cancel();
                    break;
                }
                _ => None,
            };

            let Some(direction) = direction else {
                println!("Comando invalido!");
                continue;
            };

            let seq = next_seq_out;
            let result = send_and_wait(
                &mut send_transport,
                ack_source.as_ref(),
                args.peer_mac,
                direction.to_frame_type(),
                seq,
                &[],
                &cfg,
            );
            match result {
                Ok(()) => {
                    next_seq_out = seq.next();
                    shared_game.mutate(|g| g.apply_move(direction));
                }
                Err(e) => warn!("move failed: {e}"),
            }
        }
    });

    info!("client finished");
    Ok(())
}

/// Owns the raw socket's receive half, dispatching ACK/NACK to the
/// waiting foreground move and file-transfer request frames to
/// `handler`, mirroring `original_source/treasure_client.c`'s
/// `thread_recebimento`.
fn pump_loop(
    mut transport: RawEthernetSocket,
    ack_source: &CondvarAckSource,
    handler: &mut ClientRequestHandler<'_>,
    running: &AtomicBool,
) {
    while running.load(Ordering::Relaxed) {
        match transport.recv() {
            Ok(RecvOutcome::Frame(received)) => {
                if received.frame_type.is_ack_or_nack() {
                    let outcome = match received.frame_type {
                        FrameType::Ack => AckOutcome::Ack,
                        _ => AckOutcome::Nack(received.payload.first().copied().and_then(protocol::core::ErrorCode::from_u8)),
                    };
                    ack_source.notify(received.seq, outcome);
                    continue;
                }
                if let Some(outcome) = handler.handle(received.frame_type, received.seq, &received.payload) {
                    let reply_type = match outcome {
                        AckOutcome::Ack => FrameType::Ack,
                        AckOutcome::Nack(_) => FrameType::Nack,
                    };
                    let reply_payload = match outcome {
                        AckOutcome::Nack(Some(code)) => vec![code as u8],
                        _ => Vec::new(),
                    };
                    if let Err(e) = transport.send(received.src, reply_type, received.seq, &reply_payload) {
                        warn!("failed to reply to {:?}: {e}", received.frame_type);
                    }
                } else {
                    warn!("ignoring unexpected frame type {:?} from {}", received.frame_type, received.src);
                }
            }
            Ok(RecvOutcome::WouldBlock) => {}
            Err(e) => warn!("recv error: {e}"),
        }
    }
}
