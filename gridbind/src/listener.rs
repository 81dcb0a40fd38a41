//! Consumer-side listener: polls a group view's queues and delivers
//! inbound messages to the local channel.

use crate::coordinator::ViewId;
use gridbind_core::{Message, MessageEnvelope, PartitionId, SubscribableChannel};
use gridbind_grid::RegionHandle;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle onto a running listener task.
pub struct ListenerHandle {
    view: ViewId,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
    delivered: Arc<AtomicU64>,
}

impl ListenerHandle {
    /// The group view this listener consumes from.
    #[must_use]
    pub fn view(&self) -> &ViewId {
        &self.view
    }

    /// Messages delivered to the local channel so far.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Stop the listener, waiting up to `grace` for the task to finish.
    /// Cancellation is a normal outcome, never an error; a task that
    /// outlives the grace period is aborted.
    pub async fn shutdown(mut self, grace: Duration) {
        let _ = self.cancel.send(true);
        if tokio::time::timeout(grace, &mut self.task).await.is_err() {
            tracing::warn!(view = %self.view, "listener exceeded shutdown grace; aborting");
            self.task.abort();
        }
    }
}

/// Blocking-poll loop over one group view.
///
/// A single task multiplexes every assigned partition: each iteration
/// waits (bounded) on a rotating head partition, then drains the remaining
/// partitions without blocking, up to the configured batch size. The
/// rotation keeps partitions fair; the bounded wait keeps the cancellation
/// flag fresh.
pub struct ConsumerListener {
    region: RegionHandle,
    view: ViewId,
    partitions: Vec<PartitionId>,
    channel: Arc<dyn SubscribableChannel>,
    batch_size: usize,
    poll_timeout: Duration,
    delivered: Arc<AtomicU64>,
}

impl ConsumerListener {
    /// Spawn the listener task for one consumer binding.
    #[must_use]
    pub fn spawn(
        region: RegionHandle,
        view: ViewId,
        partition_count: u32,
        channel: Arc<dyn SubscribableChannel>,
        batch_size: usize,
        poll_timeout: Duration,
    ) -> ListenerHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let delivered = Arc::new(AtomicU64::new(0));

        let listener = Self {
            region,
            view: view.clone(),
            partitions: (0..partition_count.max(1)).map(PartitionId::new).collect(),
            channel,
            batch_size: batch_size.max(1),
            poll_timeout,
            delivered: delivered.clone(),
        };

        let task = tokio::spawn(listener.run(cancel_rx));
        ListenerHandle { view, cancel: cancel_tx, task, delivered }
    }

    async fn run(self, mut cancel: watch::Receiver<bool>) {
        tracing::debug!(view = %self.view, partitions = self.partitions.len(), "listener started");
        let mut head = 0usize;

        loop {
            if *cancel.borrow() {
                break;
            }

            let mut batch = self.collect_batch(head, &mut cancel).await;
            head = (head + 1) % self.partitions.len();

            if batch.is_empty() {
                continue;
            }

            let count = batch.len() as u64;
            let result = if batch.len() == 1 {
                self.channel.send(batch.swap_remove(0)).await
            } else {
                self.channel.send_batch(batch).await
            };

            match result {
                Ok(()) => {
                    self.delivered.fetch_add(count, Ordering::Relaxed);
                },
                Err(err) => {
                    tracing::warn!(view = %self.view, %err, "local channel delivery failed");
                },
            }
        }

        tracing::debug!(view = %self.view, "listener stopped");
    }

    /// One poll cycle: bounded wait on the head partition, then a
    /// non-blocking drain of every partition up to the batch size.
    async fn collect_batch(&self, head: usize, cancel: &mut watch::Receiver<bool>) -> Vec<Message> {
        let mut batch = Vec::with_capacity(self.batch_size);

        let head_partition = self.partitions[head % self.partitions.len()];
        match self.region.queue(self.view.as_str(), head_partition) {
            Ok(queue) => {
                tokio::select! {
                    _ = cancel.changed() => return batch,
                    item = queue.poll(self.poll_timeout) => {
                        if let Some(bytes) = item {
                            self.decode_into(&mut batch, &bytes);
                        }
                    },
                }
            },
            Err(err) => {
                tracing::warn!(view = %self.view, %err, "queue unavailable; backing off");
                tokio::time::sleep(self.poll_timeout).await;
                return batch;
            },
        }

        for i in 0..self.partitions.len() {
            if batch.len() >= self.batch_size {
                break;
            }

            let partition = self.partitions[(head + i) % self.partitions.len()];
            let Ok(queue) = self.region.queue(self.view.as_str(), partition) else {
                continue;
            };

            while batch.len() < self.batch_size {
                match queue.try_pop() {
                    Some(bytes) => self.decode_into(&mut batch, &bytes),
                    None => break,
                }
            }
        }

        batch
    }

    /// Decode one envelope; a decode failure is logged and the message
    /// skipped, never redelivered.
    fn decode_into(&self, batch: &mut Vec<Message>, bytes: &[u8]) {
        match MessageEnvelope::decode(bytes) {
            Ok(envelope) => batch.push(envelope.into_message()),
            Err(err) => {
                tracing::warn!(view = %self.view, %err, "skipping undecodable message");
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use gridbind_core::{BindingName, MessageHandler, Result};
    use gridbind_grid::Grid;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        payloads: Mutex<Vec<String>>,
        batches: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl MessageHandler for Recorder {
        async fn handle(&self, message: Message) -> Result<()> {
            self.payloads
                .lock()
                .push(String::from_utf8_lossy(&message.payload).into_owned());
            Ok(())
        }

        async fn handle_batch(&self, messages: Vec<Message>) -> Result<()> {
            self.batches.lock().push(messages.len());
            for message in messages {
                self.handle(message).await?;
            }
            Ok(())
        }
    }

    fn setup() -> (Grid, RegionHandle, ViewId) {
        let grid = Grid::new();
        let region = grid.client("consumer").create_or_attach("gridbind.test").unwrap();
        let view = crate::coordinator::GroupCoordinator::new(
            BindingName::new("test").unwrap(),
            region.clone(),
        )
        .resolve_view(Some("g"));
        (grid, region, view)
    }

    fn push_envelope(region: &RegionHandle, view: &ViewId, partition: PartitionId, payload: &str) {
        let envelope =
            MessageEnvelope::wrap(Message::new(payload.to_string()), partition, None);
        region.queue(view.as_str(), partition).unwrap().push(envelope.encode().unwrap());
    }

    async fn wait_until(deadline: Duration, condition: impl Fn() -> bool) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        condition()
    }

    #[tokio::test]
    async fn test_listener_delivers_and_counts() {
        let (_grid, region, view) = setup();
        let channel = Arc::new(gridbind_core::LocalChannel::new());
        let recorder = Arc::new(Recorder::default());
        channel.subscribe(recorder.clone());

        let handle = ConsumerListener::spawn(
            region.clone(),
            view.clone(),
            1,
            channel,
            1,
            Duration::from_millis(20),
        );

        push_envelope(&region, &view, PartitionId::new(0), "hello world");

        assert!(wait_until(Duration::from_secs(2), || handle.delivered() == 1).await);
        assert_eq!(*recorder.payloads.lock(), vec!["hello world".to_string()]);

        handle.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_listener_skips_undecodable_messages() {
        let (_grid, region, view) = setup();
        let channel = Arc::new(gridbind_core::LocalChannel::new());
        let recorder = Arc::new(Recorder::default());
        channel.subscribe(recorder.clone());

        region
            .queue(view.as_str(), PartitionId::new(0))
            .unwrap()
            .push(Bytes::from_static(b"garbage"));

        let handle = ConsumerListener::spawn(
            region.clone(),
            view.clone(),
            1,
            channel,
            1,
            Duration::from_millis(20),
        );

        push_envelope(&region, &view, PartitionId::new(0), "valid");

        assert!(wait_until(Duration::from_secs(2), || handle.delivered() == 1).await);
        assert_eq!(*recorder.payloads.lock(), vec!["valid".to_string()]);

        handle.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_listener_batches_up_to_configured_size() {
        let (_grid, region, view) = setup();
        let channel = Arc::new(gridbind_core::LocalChannel::new());
        let recorder = Arc::new(Recorder::default());
        channel.subscribe(recorder.clone());

        for i in 0..3 {
            push_envelope(&region, &view, PartitionId::new(0), &format!("m{i}"));
        }

        let handle = ConsumerListener::spawn(
            region.clone(),
            view.clone(),
            1,
            channel,
            3,
            Duration::from_millis(20),
        );

        assert!(wait_until(Duration::from_secs(2), || handle.delivered() == 3).await);
        assert_eq!(recorder.batches.lock().first(), Some(&3));

        handle.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_listener_drains_all_partitions() {
        let (_grid, region, view) = setup();
        let channel = Arc::new(gridbind_core::LocalChannel::new());
        let recorder = Arc::new(Recorder::default());
        channel.subscribe(recorder.clone());

        let handle = ConsumerListener::spawn(
            region.clone(),
            view.clone(),
            2,
            channel,
            1,
            Duration::from_millis(20),
        );

        push_envelope(&region, &view, PartitionId::new(1), "from p1");
        push_envelope(&region, &view, PartitionId::new(0), "from p0");

        assert!(wait_until(Duration::from_secs(2), || handle.delivered() == 2).await);

        let mut payloads = recorder.payloads.lock().clone();
        payloads.sort();
        assert_eq!(payloads, vec!["from p0".to_string(), "from p1".to_string()]);

        handle.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_promptly() {
        let (_grid, region, view) = setup();
        let channel = Arc::new(gridbind_core::LocalChannel::new());

        let handle = ConsumerListener::spawn(
            region,
            view,
            1,
            channel,
            1,
            Duration::from_millis(50),
        );

        let start = std::time::Instant::now();
        handle.shutdown(Duration::from_secs(5)).await;
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
