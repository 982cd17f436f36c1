//! Stop-and-wait reliability engine (spec.md §4.4) and the endpoint
//! coordination primitives (§4.7) it's built from.

mod ack;
mod dedup;
mod gate;
mod stopwait;

pub use ack::{AckOutcome, AckSource, CondvarAckSource};
pub use dedup::RequestDedup;
pub use gate::TransferGate;
pub use stopwait::{send_and_wait, InlineAckSource, InlineTransportView, RequestHandler, StopWaitConfig};
