mod cli;
mod handler;
mod render;
mod treasures;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};

use protocol::collaborators::{GridRenderer, TreasurePlacer};
use protocol::config;
use protocol::game::{Direction, GameState, SharedGame};
use protocol::reliable::RequestDedup;
use protocol::seq::Seq;
use protocol::transport::{RawEthernetSocket, RecvOutcome, Transport};

use cli::Cli;
use handler::{handle_move, ServerRequestHandler};
use render::ServerGridRenderer;
use treasures::{ensure_objects_dir, ObjectsFileStore, RandomTreasurePlacer};

fn main() -> anyhow::Result<()> {
    // ── Logging ─────────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // ── Parse CLI ───────────────────────────────────────────────
    let args = Cli::parse();
    info!("starting treasure-hunt server on {} as {}", args.interface, args.local_mac);

    ensure_objects_dir(&args.objects_dir)?;
    let store = ObjectsFileStore::new(&args.objects_dir);

    let positions = RandomTreasurePlacer.place();
    let game = GameState::new_with_treasures(positions);
    for (i, pos) in positions.iter().enumerate() {
        info!("treasure {}: ({},{})", i + 1, pos.x, pos.y);
    }
    let shared_game = SharedGame::new(game);
    let dedup = RequestDedup::new();
    let cfg = config::stop_wait_config(args.timeout_ms, args.max_retries);

    let transport = RawEthernetSocket::open(&args.interface, args.local_mac, Duration::from_millis(200))?;

    // ── Graceful shutdown ───────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            info!("shutting down...");
            running.store(false, Ordering::Relaxed);
        })?;
    }

    let mut renderer = ServerGridRenderer;
    renderer.render(&shared_game.snapshot());
    shared_game.take_redraw_pending();

    std::thread::scope(|scope| {
        let running_pump = running.clone();
        let game_ref = &shared_game;
        let store_ref = &store;
        let dedup_ref = &dedup;
        let cfg_ref = &cfg;
        let peer = args.peer_mac;

        scope.spawn(move || {
            pump_loop(transport, game_ref, store_ref, dedup_ref, peer, cfg_ref, running_pump.as_ref());
        });

        while running.load(Ordering::Relaxed) {
            if shared_game.take_redraw_pending() {
                renderer.render(&shared_game.snapshot());
            }
            std::thread::sleep(Duration::from_millis(500));
        }
    });

    info!("server finished");
    Ok(())
}

/// Owns the raw socket and dispatches every incoming `MOVE_*` request,
/// mirroring `original_source/treasure_server.c`'s `thread_recebimento`.
fn pump_loop(
    mut transport: RawEthernetSocket,
    game: &SharedGame,
    store: &ObjectsFileStore,
    dedup: &RequestDedup,
    peer: protocol::mac::MacAddr,
    cfg: &protocol::reliable::StopWaitConfig,
    running: &AtomicBool,
) {
    let mut handler = ServerRequestHandler { game, dedup };
    let mut next_seq_out = Seq::new(0);

    while running.load(Ordering::Relaxed) {
        match transport.recv() {
            Ok(RecvOutcome::Frame(received)) => {
                if received.frame_type.is_ack_or_nack() {
                    continue;
                }
                if Direction::from_frame_type(received.frame_type).is_some() {
                    handle_move(
                        &mut transport,
                        &mut handler,
                        store,
                        peer,
                        received.frame_type,
                        received.seq,
                        &mut next_seq_out,
                        cfg,
                    );
                } else {
                    warn!("ignoring unexpected frame type {:?} from {}", received.frame_type, received.src);
                }
            }
            Ok(RecvOutcome::WouldBlock) => {}
            Err(e) => warn!("recv error: {e}"),
        }
    }
}
