//! Producer-side credit bookkeeping.

use tokio::sync::mpsc;

use crate::error::FlowError;
use crate::stream::frame::{Ack, Frame};

/// The worker-side handle a generator produces values through.
///
/// A `Producer` owns the sending end of the data channel and the receiving
/// end of the ack channel, plus the credit ledger that bounds how much data
/// can sit unconsumed in the channel. Its settings - budget, ack unit and
/// the value-size function - are copied in once at session start and never
/// change while the generator runs.
///
/// # Credit accounting
///
/// Every value costs `2 * max(1, size_of(value))` pending units. Whenever
/// the pending amount reaches the ack unit (`max(2, budget)`), an ack
/// marker is interleaved into the data channel and one ack becomes
/// outstanding; the consumer returns each marker on the ack channel as it
/// drains past it. Two markers per "full buffer" of production means credit
/// comes back in halves, so a producer blocked on
/// [`send`](Producer::send) resumes as soon as the consumer is half drained.
///
/// # Suspension
///
/// [`push`](Producer::push) never suspends. [`send`](Producer::send) and
/// [`flush_if_needed`](Producer::flush_if_needed) suspend until enough
/// acks have returned, with thresholds chosen by the session budget:
///
/// | budget | `send` waits until |
/// |---|---|
/// | `> 1` | at most 1 ack outstanding, then pushes |
/// | `1` | 0 acks outstanding (empty channel), then pushes |
/// | `<= 0` | pushes, then 0 outstanding (rendezvous) |
#[derive(Debug)]
pub struct Producer<T> {
    data_tx: mpsc::UnboundedSender<Frame<T>>,
    ack_rx: mpsc::UnboundedReceiver<Ack>,
    size_of: fn(&T) -> usize,
    budget: i64,
    ack_unit: u64,
    acks_outstanding: u64,
    amount_pending: u64,
    high_water: u64,
    closed: bool,
}

impl<T> Producer<T> {
    pub(crate) fn new(
        data_tx: mpsc::UnboundedSender<Frame<T>>,
        ack_rx: mpsc::UnboundedReceiver<Ack>,
        budget: i64,
        size_of: fn(&T) -> usize,
    ) -> Self {
        Self {
            data_tx,
            ack_rx,
            size_of,
            budget,
            ack_unit: budget.max(2) as u64,
            acks_outstanding: 0,
            amount_pending: 0,
            high_water: 0,
            closed: false,
        }
    }

    /// Sends a value without suspending.
    ///
    /// Interleaves ack markers into the data channel as the credit ledger
    /// dictates. Sink-style generators pair this with
    /// [`flush_if_needed`](Producer::flush_if_needed) to stay inside the
    /// channel bound.
    ///
    /// Returns [`FlowError::ConsumerGone`] once the consumer has dropped the
    /// stream; the generator should return cleanly when it sees this.
    pub fn push(&mut self, value: T) -> Result<(), FlowError> {
        if self.closed {
            return Err(FlowError::IllegalCall {
                message: "push after session close",
            });
        }

        let units = (self.size_of)(&value).max(1) as u64;
        self.data_tx
            .send(Frame::Value(value))
            .map_err(|_| FlowError::ConsumerGone)?;
        self.amount_pending += units * 2;

        while self.amount_pending >= self.ack_unit {
            self.data_tx
                .send(Frame::Ack)
                .map_err(|_| FlowError::ConsumerGone)?;
            self.acks_outstanding += 1;
            self.amount_pending -= self.ack_unit;
        }
        self.high_water = self.high_water.max(self.amount_pending);
        Ok(())
    }

    /// Sends a value, suspending first (or after, for rendezvous budgets)
    /// until the consumer has returned enough credit.
    pub async fn send(&mut self, value: T) -> Result<(), FlowError> {
        if self.budget > 1 {
            self.wait_for_acks(1).await?;
            self.push(value)
        } else if self.budget == 1 {
            self.wait_for_acks(0).await?;
            self.push(value)
        } else {
            self.push(value)?;
            self.wait_for_acks(0).await
        }
    }

    /// Suspends until outstanding credit is back under the send threshold.
    ///
    /// The explicit yield point for sink-style generators that produce via
    /// [`push`](Producer::push).
    pub async fn flush_if_needed(&mut self) -> Result<(), FlowError> {
        let pending = if self.budget > 1 { 1 } else { 0 };
        self.wait_for_acks(pending).await
    }

    /// Consumes acks until at most `pending` remain outstanding.
    async fn wait_for_acks(&mut self, pending: u64) -> Result<(), FlowError> {
        while self.acks_outstanding > pending {
            match self.ack_rx.recv().await {
                Some(Ack) => self.acks_outstanding -= 1,
                None => return Err(FlowError::ConsumerGone),
            }
        }
        Ok(())
    }

    /// Ends the session: emits the end-of-stream marker and waits for the
    /// consumer to acknowledge it.
    ///
    /// Driven by the worker session once the generator returns; generators
    /// never close the channel themselves. A consumer that disappeared is a
    /// clean shutdown here, not an error.
    pub(crate) async fn close(&mut self) -> Result<(), FlowError> {
        if self.closed {
            return Err(FlowError::IllegalCall {
                message: "double session close",
            });
        }
        self.closed = true;
        tracing::trace!(acks_outstanding = self.acks_outstanding, "producer eof");

        if self.data_tx.send(Frame::Eof).is_err() {
            return Ok(());
        }
        self.acks_outstanding += 1;
        match self.wait_for_acks(0).await {
            Ok(()) | Err(FlowError::ConsumerGone) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Returns the session's buffer budget as copied in at start.
    pub fn budget(&self) -> i64 {
        self.budget
    }

    /// Returns the ack unit, `max(2, budget)`.
    pub fn ack_unit(&self) -> u64 {
        self.ack_unit
    }

    /// Returns the number of acks currently outstanding.
    pub fn acks_outstanding(&self) -> u64 {
        self.acks_outstanding
    }

    /// Returns the pending amount not yet converted into an ack marker,
    /// in doubled size units.
    pub fn amount_pending(&self) -> u64 {
        self.amount_pending
    }

    /// Returns the highest pending amount observed after any push, in
    /// doubled size units. Instrumentation for verifying the channel bound.
    pub fn high_water(&self) -> u64 {
        self.high_water
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    type Channels = (
        Producer<Bytes>,
        mpsc::UnboundedReceiver<Frame<Bytes>>,
        mpsc::UnboundedSender<Ack>,
    );

    fn producer(budget: i64) -> Channels {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        let (ack_tx, ack_rx) = mpsc::unbounded_channel();
        let p = Producer::new(data_tx, ack_rx, budget, |b: &Bytes| b.len());
        (p, data_rx, ack_tx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Frame<Bytes>>) -> (usize, usize, usize) {
        let (mut values, mut acks, mut eofs) = (0, 0, 0);
        while let Ok(frame) = rx.try_recv() {
            match frame {
                Frame::Value(_) => values += 1,
                Frame::Ack => acks += 1,
                Frame::Eof => eofs += 1,
            }
        }
        (values, acks, eofs)
    }

    #[tokio::test]
    async fn test_push_accumulates_pending() {
        let (mut p, mut data_rx, _ack_tx) = producer(16);
        assert_eq!(p.ack_unit(), 16);

        // 3 bytes -> 6 pending units, below the 16-unit ack threshold
        p.push(Bytes::from_static(&[0; 3])).unwrap();
        assert_eq!(p.amount_pending(), 6);
        assert_eq!(p.acks_outstanding(), 0);
        assert_eq!(drain(&mut data_rx), (1, 0, 0));
    }

    #[tokio::test]
    async fn test_push_emits_ack_markers() {
        let (mut p, mut data_rx, _ack_tx) = producer(16);

        // 20 bytes -> 40 pending units -> two ack markers, 8 units remain
        p.push(Bytes::from_static(&[0; 20])).unwrap();
        assert_eq!(p.acks_outstanding(), 2);
        assert_eq!(p.amount_pending(), 8);
        assert_eq!(drain(&mut data_rx), (1, 2, 0));
    }

    #[tokio::test]
    async fn test_empty_value_counts_one_unit() {
        let (mut p, _data_rx, _ack_tx) = producer(16);
        p.push(Bytes::new()).unwrap();
        assert_eq!(p.amount_pending(), 2);
    }

    #[tokio::test]
    async fn test_rendezvous_budget_ack_unit() {
        let (mut p, mut data_rx, ack_tx) = producer(0);
        assert_eq!(p.ack_unit(), 2);

        // One 1-byte value -> 2 pending -> one ack marker immediately
        p.push(Bytes::from_static(&[7])).unwrap();
        assert_eq!(p.acks_outstanding(), 1);
        assert_eq!(drain(&mut data_rx), (1, 1, 0));

        // Returning the ack releases the rendezvous wait
        ack_tx.send(Ack).unwrap();
        p.wait_for_acks(0).await.unwrap();
        assert_eq!(p.acks_outstanding(), 0);
    }

    #[tokio::test]
    async fn test_close_sends_eof_and_waits() {
        let (mut p, mut data_rx, ack_tx) = producer(4);
        ack_tx.send(Ack).unwrap();
        p.close().await.unwrap();
        // close consumed the pre-supplied ack for its EOF
        let (_, _, eofs) = drain(&mut data_rx);
        assert_eq!(eofs, 1);
        assert!(matches!(
            p.push(Bytes::new()),
            Err(FlowError::IllegalCall { .. })
        ));
    }

    #[tokio::test]
    async fn test_consumer_gone_on_push() {
        let (mut p, data_rx, _ack_tx) = producer(4);
        drop(data_rx);
        assert!(matches!(
            p.push(Bytes::from_static(&[1])),
            Err(FlowError::ConsumerGone)
        ));
    }

    #[tokio::test]
    async fn test_consumer_gone_breaks_wait_loop() {
        let (mut p, _data_rx, ack_tx) = producer(4);
        p.acks_outstanding = 3;
        drop(ack_tx);
        assert!(matches!(
            p.wait_for_acks(0).await,
            Err(FlowError::ConsumerGone)
        ));
    }
}
