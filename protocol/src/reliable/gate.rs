//! Blocks new user input while a file transfer is in flight (spec.md
//! §4.6/§4.7's "client MUST NOT accept user input (no new moves)" during
//! a transfer), mirroring `original_source/treasure_client.c`'s
//! `movimento_em_andamento` flag and its paired condition variable.

use std::sync::{Condvar, Mutex};

/// Shared between the client's request handler (which flips it on a
/// SIZE/TEXT/VIDEO/IMAGE start and off on END_OF_FILE/abort) and its
/// foreground input loop (which blocks on it before accepting the next
/// command).
#[derive(Default)]
pub struct TransferGate {
    busy: Mutex<bool>,
    condvar: Condvar,
}

impl TransferGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a transfer as started.
    pub fn begin(&self) {
        *self.busy.lock().unwrap() = true;
    }

    /// Marks the transfer finished (successfully or aborted), waking
    /// anyone blocked in `wait_until_idle`.
    pub fn end(&self) {
        *self.busy.lock().unwrap() = false;
        self.condvar.notify_all();
    }

    /// Blocks until no transfer is in progress.
    pub fn wait_until_idle(&self) {
        let guard = self.busy.lock().unwrap();
        let _guard = self.condvar.wait_while(guard, |busy| *busy).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn wait_until_idle_returns_immediately_when_never_begun() {
        let gate = TransferGate::new();
        gate.wait_until_idle();
    }

    #[test]
    fn wait_until_idle_blocks_until_end_is_called() {
        let gate = Arc::new(TransferGate::new());
        gate.begin();

        let closer = gate.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            closer.end();
        });

        let start = std::time::Instant::now();
        gate.wait_until_idle();
        handle.join().unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
