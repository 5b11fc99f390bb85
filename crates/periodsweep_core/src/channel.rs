//! Streaming channel between sweep workers and the coordinator.
//!
//! Unbounded multi-producer single-consumer: workers never block on a slow
//! coordinator. Messages from one worker arrive in the order it sent them;
//! there is no ordering across workers.

use std::sync::mpsc;
use std::time::Duration;

pub use std::sync::mpsc::{RecvTimeoutError, TryRecvError};

use crate::analysis::SweepResult;
use crate::error::DeliveryError;

/// Create a connected sender/receiver pair
pub fn result_channel() -> (ResultSender, ResultReceiver) {
    let (tx, rx) = mpsc::channel();
    (ResultSender { tx }, ResultReceiver { rx })
}

/// Producer side. Clone one per worker.
#[derive(Debug, Clone)]
pub struct ResultSender {
    tx: mpsc::Sender<SweepResult>,
}

impl ResultSender {
    /// Fails when the receiver has been dropped
    pub fn send(&self, result: SweepResult) -> Result<(), DeliveryError> {
        let id = result.id;
        self.tx.send(result).map_err(|_| DeliveryError { id })
    }
}

/// Consumer side, owned by the coordinator
#[derive(Debug)]
pub struct ResultReceiver {
    rx: mpsc::Receiver<SweepResult>,
}

impl ResultReceiver {
    /// Block until a result arrives, the timeout expires, or every sender is gone
    pub fn recv_timeout(&self, timeout: Duration) -> Result<SweepResult, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Result<SweepResult, TryRecvError> {
        self.rx.try_recv()
    }

    /// Invoke `callback` once per message on the calling thread until every
    /// sender has been dropped. Returns the number of messages handled.
    ///
    /// Calls never overlap, so `ctx` needs no synchronization.
    pub fn dispatch<C, F>(&self, ctx: &mut C, mut callback: F) -> usize
    where
        F: FnMut(&mut C, SweepResult),
    {
        let mut handled = 0;
        for result in self.rx.iter() {
            callback(ctx, result);
            handled += 1;
        }
        handled
    }
}
