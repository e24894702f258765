//! Delivery collaborator seam.
//!
//! The dispatcher hands finished [`NotificationJob`]s to a
//! [`DeliveryChannel`]; what happens next (SMTP, SMS gateway, push) is the
//! collaborator's business, including its own retries and timeouts. The
//! in-process [`QueuedDelivery`] implementation backs the demo and tests
//! with a tokio channel drained by [`DeliveryWorker`].

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use crate::dispatch::NotificationJob;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery queue closed")]
    QueueClosed,
}

/// Accepts jobs for asynchronous delivery. `enqueue` must not block: the
/// triggering workflow transition has already committed and only waits for
/// the hand-off.
pub trait DeliveryChannel: Send + Sync {
    fn enqueue(&self, job: NotificationJob) -> Result<(), DeliveryError>;
}

impl<C: DeliveryChannel + ?Sized> DeliveryChannel for std::sync::Arc<C> {
    fn enqueue(&self, job: NotificationJob) -> Result<(), DeliveryError> {
        (**self).enqueue(job)
    }
}

/// Channel implementation backed by an unbounded tokio sender.
pub struct QueuedDelivery {
    tx: mpsc::UnboundedSender<NotificationJob>,
}

impl QueuedDelivery {
    pub fn new() -> (Self, DeliveryWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, DeliveryWorker { rx })
    }
}

impl DeliveryChannel for QueuedDelivery {
    fn enqueue(&self, job: NotificationJob) -> Result<(), DeliveryError> {
        self.tx.send(job).map_err(|_| DeliveryError::QueueClosed)
    }
}

/// Drains the delivery queue, standing in for the external transport.
pub struct DeliveryWorker {
    rx: mpsc::UnboundedReceiver<NotificationJob>,
}

impl DeliveryWorker {
    /// Receives jobs until the sending side is dropped, logging each one.
    /// Returns the jobs it saw, in arrival order.
    pub async fn drain(mut self) -> Vec<NotificationJob> {
        let mut delivered = Vec::new();
        while let Some(job) = self.rx.recv().await {
            info!(
                dedup_key = %job.dedup_key,
                recipients = job.recipients.len(),
                priority = ?job.priority,
                subject = %job.message.subject,
                "delivering notification"
            );
            delivered.push(job);
        }
        delivered
    }
}

/// Test double that records enqueued jobs instead of delivering them.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingChannel {
    jobs: std::sync::Mutex<Vec<NotificationJob>>,
    fail: bool,
}

#[cfg(test)]
impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel that refuses every enqueue, for post-commit failure tests.
    pub fn failing() -> Self {
        Self {
            jobs: std::sync::Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn jobs(&self) -> Vec<NotificationJob> {
        self.jobs.lock().expect("recording channel poisoned").clone()
    }
}

#[cfg(test)]
impl DeliveryChannel for RecordingChannel {
    fn enqueue(&self, job: NotificationJob) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::QueueClosed);
        }
        self.jobs
            .lock()
            .expect("recording channel poisoned")
            .push(job);
        Ok(())
    }
}
