//! Bus delivery wrapper
//!
//! The bus client glue wraps each received message in a `Delivery` and
//! observes the disposition on the paired receiver. Dropping a delivery
//! without a disposition reads as a Nack, so a crash mid-message leads to
//! redelivery rather than silent loss.

use bytes::Bytes;
use tokio::sync::oneshot;

/// Outcome of handling one bus message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Message fully processed; the bus may discard it
    Ack,
    /// Processing failed; the bus should redeliver
    Nack,
}

/// One message received from the bus, with its completion channel
#[derive(Debug)]
pub struct Delivery {
    payload: Bytes,
    done: Option<oneshot::Sender<Disposition>>,
}

impl Delivery {
    /// Wrap a received payload; the returned receiver observes the
    /// disposition once the forwarder settles the message
    pub fn new(payload: Bytes) -> (Self, oneshot::Receiver<Disposition>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                payload,
                done: Some(tx),
            },
            rx,
        )
    }

    /// The batched message bytes
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.payload
    }

    /// Settle the message
    pub(crate) fn settle(mut self, disposition: Disposition) {
        if let Some(done) = self.done.take() {
            let _ = done.send(disposition);
        }
    }
}
