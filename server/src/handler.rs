//! Server-side request handling: applies `MOVE_*` requests to the game
//! state and, on a treasure pickup, drives the file-transfer protocol.
//!
//! Mirrors `original_source/treasure_server.c`'s `processar_movimento`
//! and `enviar_arquivo_tesouro`, including the flagged latent issue: the
//! move is ACKed before (and regardless of) its bounds check.

use log::{info, warn};

use protocol::collaborators::FileStore;
use protocol::core::FrameType;
use protocol::game::{Direction, SharedGame};
use protocol::mac::MacAddr;
use protocol::reliable::{AckOutcome, InlineAckSource, RequestDedup, RequestHandler, StopWaitConfig};
use protocol::seq::Seq;
use protocol::transfer;
use protocol::transport::Transport;

/// Applies incoming `MOVE_*` requests. Holds no reference to the
/// transport — it only decides what to ack — so the same instance can
/// be reused both by the outer pump loop and, wrapped in an
/// `InlineAckSource`, by a nested file-transfer send.
pub struct ServerRequestHandler<'a> {
    pub game: &'a SharedGame,
    pub dedup: &'a RequestDedup,
}

impl<'a> RequestHandler for ServerRequestHandler<'a> {
    fn handle(&mut self, frame_type: FrameType, seq: Seq, _payload: &[u8]) -> Option<AckOutcome> {
        let direction = Direction::from_frame_type(frame_type)?;
        let outcome = self.dedup.resolve(seq, || {
            let in_bounds = self.game.mutate(|g| g.apply_move(direction));
            if !in_bounds {
                warn!("move {direction:?} rejected by bounds check, but still ACKing (spec.md §4.5 known issue)");
            }
            // The server ACKs every move regardless of bounds validity -
            // spec.md §4.5's documented latent issue, kept deliberately.
            AckOutcome::Ack
        });
        Some(outcome)
    }
}

/// Called by the pump loop for every accepted `MOVE_*` frame: acks it,
/// then, if this is the first time this move lands on an unfound
/// treasure, drives the whole file-transfer exchange inline before
/// returning (spec.md §4.6's "server MUST NOT process further moves
/// until EOF is acknowledged").
pub fn handle_move<T: Transport>(
    transport: &mut T,
    handler: &mut ServerRequestHandler<'_>,
    store: &dyn FileStore,
    peer: MacAddr,
    frame_type: FrameType,
    seq: Seq,
    next_seq_out: &mut Seq,
    cfg: &StopWaitConfig,
) {
    let Some(outcome) = handler.handle(frame_type, seq, &[]) else { return };
    let reply_type = match outcome {
        AckOutcome::Ack => FrameType::Ack,
        AckOutcome::Nack(_) => FrameType::Nack,
    };
    if transport.send(peer, reply_type, seq, &[]).is_err() {
        warn!("failed to ack move seq={}", seq.get());
        return;
    }

    let pickup = handler.game.mutate(|g| g.treasure_at_current().map(|idx| (idx, g.treasures[idx].name.clone())));
    let Some((treasure_index, stored_name)) = pickup else { return };

    let resolved = match store.open_for_read(treasure_index, &stored_name) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!("could not open treasure file for index {treasure_index}: {e}");
            return;
        }
    };

    info!("player landed on treasure {treasure_index}, sending {:?} ({} bytes)", resolved.name, resolved.size);
    let ack_source = InlineAckSource::new(transport, handler, (frame_type, seq));
    let mut view = ack_source.as_transport();
    let mut reader = resolved.reader;
    let result = transfer::send_file(
        &mut view,
        &ack_source,
        peer,
        next_seq_out,
        resolved.kind,
        &resolved.name,
        resolved.size,
        reader.as_mut(),
        cfg,
    );
    match result {
        Ok(()) => {
            handler.game.mutate(|g| g.mark_found(treasure_index));
            info!("treasure {treasure_index} delivered and marked found");
        }
        Err(e) => warn!("transfer for treasure {treasure_index} failed: {e}"),
    }
}
