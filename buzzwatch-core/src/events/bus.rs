//! Bounded FIFO bus between the poller and the processor.
//!
//! Both halves run on blocking threads: the poller hands records over with
//! [`BusProducer::send_blocking`] and the processor takes them with
//! [`BusConsumer::recv_blocking`]. A full bus blocks the poller, so a slow
//! alert sink throttles intake instead of growing an unbounded buffer. Order is
//! FIFO.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::trace;

/// Event bus error conditions.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EventError {
    #[error("Invalid capacity (must be at least one)")]
    InvalidCapacity,
    #[error("Event bus closed")]
    Closed,
}

/// Sending half, owned by the poller.
#[derive(Debug)]
pub struct BusProducer<T> {
    tx: mpsc::Sender<T>,
}

/// Receiving half, owned by the processor.
#[derive(Debug)]
pub struct BusConsumer<T> {
    rx: mpsc::Receiver<T>,
}

/// Creates a bus holding at most `capacity` in-flight items.
pub fn bounded<T>(capacity: usize) -> Result<(BusProducer<T>, BusConsumer<T>), EventError> {
    if capacity == 0 {
        return Err(EventError::InvalidCapacity);
    }
    let (tx, rx) = mpsc::channel(capacity);
    Ok((BusProducer { tx }, BusConsumer { rx }))
}

impl<T> BusProducer<T> {
    /// Send, blocking the current thread while the bus is full.
    ///
    /// Must not be called from inside an async task.
    pub fn send_blocking(&self, item: T) -> Result<(), EventError> {
        if self.tx.capacity() == 0 {
            trace!("Bus full, poller waiting on processor");
        }
        self.tx.blocking_send(item).map_err(|_| EventError::Closed)
    }
}

impl<T> BusConsumer<T> {
    /// Next item in FIFO order, blocking the current thread; `None` once the
    /// producer is dropped and the bus is drained.
    ///
    /// Must not be called from inside an async task.
    pub fn recv_blocking(&mut self) -> Option<T> {
        self.rx.blocking_recv()
    }
}
