//! Best-effort delivery of contact-form emails off the request path.

use std::sync::{Arc, Mutex};

use tokio::{
    sync::{
        Semaphore,
        mpsc::{self, error::TrySendError},
    },
    task::JoinHandle,
};

use crate::{
    email::{EmailError, MailerState},
    models::ContactMessage,
};

/// Default queue depth for `QueuedNotifier`.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default number of sends `QueuedNotifier` runs at the same time.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// One unit of background work.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationJob {
    Acknowledgment(ContactMessage),
    OwnerAlert(ContactMessage),
}

impl NotificationJob {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Acknowledgment(_) => "acknowledgment",
            Self::OwnerAlert(_) => "owner_alert",
        }
    }

    pub fn message_id(&self) -> i32 {
        match self {
            Self::Acknowledgment(message) | Self::OwnerAlert(message) => message.id,
        }
    }

    async fn run(&self, mailer: &MailerState) -> Result<(), EmailError> {
        match self {
            Self::Acknowledgment(message) => mailer.send_acknowledgment(message).await,
            Self::OwnerAlert(message) => mailer.send_owner_alert(message).await,
        }
    }
}

/// Notifier
///
/// Fire-and-forget hand-off used by the contact handler. Implementations must not
/// block and must not report failure: the submission is already saved.
pub trait Notifier: Send + Sync {
    fn notify_contact(&self, message: &ContactMessage);
}

pub type NotifierState = Arc<dyn Notifier>;

/// QueuedNotifier
///
/// Producer side of a bounded channel. A worker task drains the channel and spawns
/// one detached task per job, at most `max_in_flight` at a time. Once every slot is
/// busy the worker stops draining, the channel fills up, and further jobs are dropped
/// with a warning instead of piling up behind a slow SMTP server.
#[derive(Clone)]
pub struct QueuedNotifier {
    sender: mpsc::Sender<NotificationJob>,
}

impl QueuedNotifier {
    /// Spawns the worker. The worker exits once every `QueuedNotifier` clone is dropped.
    pub fn start(
        mailer: MailerState,
        capacity: usize,
        max_in_flight: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<NotificationJob>(capacity.max(1));
        let slots = Arc::new(Semaphore::new(max_in_flight.max(1)));

        let worker = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let Ok(permit) = slots.clone().acquire_owned().await else {
                    break;
                };
                let mailer = mailer.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    match job.run(&mailer).await {
                        Ok(()) => tracing::debug!(
                            job = job.kind(),
                            message_id = job.message_id(),
                            "notification sent"
                        ),
                        Err(e) => tracing::warn!(
                            job = job.kind(),
                            message_id = job.message_id(),
                            error = %e,
                            "notification failed"
                        ),
                    }
                });
            }
            tracing::debug!("notification worker stopped");
        });

        (Self { sender }, worker)
    }

    fn enqueue(&self, job: NotificationJob) {
        match self.sender.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => tracing::warn!(
                job = job.kind(),
                message_id = job.message_id(),
                "notification queue full, dropping job"
            ),
            Err(TrySendError::Closed(job)) => tracing::warn!(
                job = job.kind(),
                message_id = job.message_id(),
                "notification worker gone, dropping job"
            ),
        }
    }
}

impl Notifier for QueuedNotifier {
    fn notify_contact(&self, message: &ContactMessage) {
        self.enqueue(NotificationJob::Acknowledgment(message.clone()));
        self.enqueue(NotificationJob::OwnerAlert(message.clone()));
    }
}

/// RecordingNotifier
///
/// Test fake that keeps every job it is handed instead of sending anything.
#[derive(Default)]
pub struct RecordingNotifier {
    jobs: Mutex<Vec<NotificationJob>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<NotificationJob> {
        self.jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_contact(&self, message: &ContactMessage) {
        let mut jobs = self
            .jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        jobs.push(NotificationJob::Acknowledgment(message.clone()));
        jobs.push(NotificationJob::OwnerAlert(message.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{email::Mailer, models::ContactStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    #[derive(Default)]
    struct CountingMailer {
        sent: tokio::sync::Mutex<Vec<String>>,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl Mailer for CountingMailer {
        async fn send_acknowledgment(&self, message: &ContactMessage) -> Result<(), EmailError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.sent.lock().await.push(format!("ack:{}", message.id));
            if self.fail {
                return Err(EmailError::InvalidAddress(message.email.clone()));
            }
            Ok(())
        }

        async fn send_owner_alert(&self, message: &ContactMessage) -> Result<(), EmailError> {
            self.sent.lock().await.push(format!("alert:{}", message.id));
            if self.fail {
                return Err(EmailError::InvalidAddress("owner".into()));
            }
            Ok(())
        }
    }

    fn message(id: i32) -> ContactMessage {
        ContactMessage {
            id,
            name: "Jane".into(),
            email: "jane@example.com".into(),
            phone: None,
            subject: "Booking".into(),
            message: "Hello there, are you free?".into(),
            status: ContactStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn wait_for(mailer: &CountingMailer, count: usize) -> Vec<String> {
        for _ in 0..100 {
            let sent = mailer.sent.lock().await.clone();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        mailer.sent.lock().await.clone()
    }

    #[tokio::test]
    async fn both_jobs_are_delivered() {
        let mailer = Arc::new(CountingMailer::default());
        let (notifier, _worker) = QueuedNotifier::start(mailer.clone(), 8, 4);

        notifier.notify_contact(&message(7));

        let mut sent = wait_for(&mailer, 2).await;
        sent.sort();
        assert_eq!(sent, vec!["ack:7", "alert:7"]);
    }

    #[tokio::test]
    async fn failures_are_swallowed_and_the_worker_keeps_going() {
        let mailer = Arc::new(CountingMailer {
            fail: true,
            ..Default::default()
        });
        let (notifier, worker) = QueuedNotifier::start(mailer.clone(), 8, 4);

        notifier.notify_contact(&message(1));
        notifier.notify_contact(&message(2));

        assert_eq!(wait_for(&mailer, 4).await.len(), 4);
        assert!(!worker.is_finished());
    }

    #[tokio::test]
    async fn slow_jobs_do_not_block_later_ones() {
        let mailer = Arc::new(CountingMailer {
            delay: Some(Duration::from_millis(300)),
            ..Default::default()
        });
        let (notifier, _worker) = QueuedNotifier::start(mailer.clone(), 8, 4);

        notifier.notify_contact(&message(3));

        let early = wait_for(&mailer, 1).await;
        assert_eq!(early, vec!["alert:3"]);
    }

    /// Counts sends that were started; none of them ever completes.
    #[derive(Default)]
    struct StuckMailer {
        started: AtomicUsize,
    }

    impl StuckMailer {
        async fn hang(&self) -> Result<(), EmailError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    #[async_trait]
    impl Mailer for StuckMailer {
        async fn send_acknowledgment(&self, _: &ContactMessage) -> Result<(), EmailError> {
            self.hang().await
        }

        async fn send_owner_alert(&self, _: &ContactMessage) -> Result<(), EmailError> {
            self.hang().await
        }
    }

    #[tokio::test]
    async fn hung_smtp_caps_in_flight_sends_and_drops_the_rest() {
        let mailer = Arc::new(StuckMailer::default());
        let (notifier, _worker) = QueuedNotifier::start(mailer.clone(), 2, 2);

        for id in 0..50 {
            notifier.notify_contact(&message(id));
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        let started = mailer.started.load(Ordering::SeqCst);
        assert_eq!(started, 2);
        // The worker holds one more job while waiting for a slot; the channel is full.
        assert_eq!(notifier.sender.capacity(), 0);
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (sender, mut receiver) = mpsc::channel(1);
        let notifier = QueuedNotifier { sender };

        notifier.notify_contact(&message(1));
        notifier.notify_contact(&message(2));

        let queued = receiver.try_recv().unwrap();
        assert_eq!((queued.kind(), queued.message_id()), ("acknowledgment", 1));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn recording_notifier_keeps_jobs() {
        let notifier = RecordingNotifier::new();
        notifier.notify_contact(&message(5));

        let kinds: Vec<_> = notifier.jobs().iter().map(|j| j.kind()).collect();
        assert_eq!(kinds, vec!["acknowledgment", "owner_alert"]);
    }
}
