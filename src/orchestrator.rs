//! Run-loop composition.
//!
//! `run` starts one publisher task and N subscriber tasks against one
//! address, all watching the same cancellation token. Cancellation is
//! cooperative: each loop checks the token between bounded operations, so
//! a subscriber stops at most one receive timeout after the signal and the
//! publisher at most one send interval after it.

use std::{sync::atomic::Ordering, time::Duration};

use tokio::{task::JoinSet, time};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    endpoint::{Publisher, Subscriber, DEFAULT_RECEIVE_HWM, DEFAULT_SEND_HWM},
    error::{RecvError, RunError, SendError, TaskError},
    message::TickMessage,
};

/// Everything a run needs. `new` fills in the reference cadence: 50ms
/// between sends, 2s receive timeout, 1s settle delay, high-water-marks of
/// 1000, one topic per subscriber.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub address: String,
    /// Ordered topic set; subscriber i is filtered on `topics[i]`.
    pub topics: Vec<String>,
    pub subscribers: usize,
    pub send_interval: Duration,
    /// Also the cancellation-responsiveness granularity of a subscriber.
    pub receive_timeout: Duration,
    /// Pause between bind and the first send, so slow-starting subscribers
    /// attach first. Best effort only; late joiners still miss traffic.
    pub settle_delay: Duration,
    pub send_high_water_mark: usize,
    pub receive_high_water_mark: usize,
    /// Fixed topic-index schedule, cycled, for deterministic runs; random
    /// pick per send when `None`.
    pub topic_schedule: Option<Vec<usize>>,
}

impl RunOptions {
    pub fn new(address: impl Into<String>, topic_count: usize) -> Self {
        Self {
            address: address.into(),
            topics: (0..topic_count).map(|t| format!("Topic{t}")).collect(),
            subscribers: topic_count,
            send_interval: Duration::from_millis(50),
            receive_timeout: Duration::from_secs(2),
            settle_delay: Duration::from_secs(1),
            send_high_water_mark: DEFAULT_SEND_HWM,
            receive_high_water_mark: DEFAULT_RECEIVE_HWM,
            topic_schedule: None,
        }
    }
}

/// What a finished run observed.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Envelopes the publisher handed to its endpoint.
    pub published: u64,
    /// Envelopes dropped at the publisher's outbound queue.
    pub dropped: u64,
    /// Envelopes each subscriber decoded, index-aligned with `topics`.
    pub received: Vec<u64>,
}

enum TaskOutcome {
    Publisher { published: u64, dropped: u64 },
    Subscriber { index: usize, received: u64 },
}

/// Runs 1 publisher + `options.subscribers` subscriber tasks until
/// `shutdown` is cancelled, then joins them all.
///
/// A task failing before shutdown cancels the token itself, so the join
/// never hangs on a run that already died; the first failure is what the
/// caller gets back.
pub async fn run(options: RunOptions, shutdown: CancellationToken) -> Result<RunReport, RunError> {
    if options.topics.is_empty() {
        return Err(RunError::NoTopics);
    }
    if options.subscribers > options.topics.len() {
        return Err(RunError::NotEnoughTopics {
            subscribers: options.subscribers,
            topics: options.topics.len(),
        });
    }

    let mut tasks: JoinSet<Result<TaskOutcome, TaskError>> = JoinSet::new();

    for index in 0..options.subscribers {
        let topic = options.topics[index].clone();
        let address = options.address.clone();
        let hwm = options.receive_high_water_mark;
        let timeout = options.receive_timeout;
        let token = shutdown.clone();
        tasks.spawn(
            async move { subscriber_task(index, topic, address, hwm, timeout, token).await },
        );
    }

    let publisher_options = options.clone();
    let publisher_token = shutdown.clone();
    tasks.spawn(async move { publisher_task(publisher_options, publisher_token).await });

    let mut report = RunReport {
        published: 0,
        dropped: 0,
        received: vec![0; options.subscribers],
    };
    let mut failure: Option<RunError> = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(TaskOutcome::Publisher { published, dropped })) => {
                report.published = published;
                report.dropped = dropped;
            }
            Ok(Ok(TaskOutcome::Subscriber { index, received })) => {
                report.received[index] = received;
            }
            Ok(Err(err)) => {
                // A failed task takes the whole run down.
                shutdown.cancel();
                failure.get_or_insert(RunError::Task(err));
            }
            Err(join_err) => {
                shutdown.cancel();
                failure.get_or_insert(RunError::Join(join_err));
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(report),
    }
}

async fn publisher_task(
    options: RunOptions,
    shutdown: CancellationToken,
) -> Result<TaskOutcome, TaskError> {
    let mut publisher = Publisher::with_high_water_mark(options.send_high_water_mark);
    publisher.bind(&options.address)?;
    info!(address = %options.address, "publisher bound");

    let result = publish_loop(&publisher, &options, &shutdown).await;
    let dropped = publisher.dropped_count.load(Ordering::Relaxed) as u64;
    publisher.close();

    let published = result?;
    info!(published, dropped, "publisher done");
    Ok(TaskOutcome::Publisher { published, dropped })
}

async fn publish_loop(
    publisher: &Publisher,
    options: &RunOptions,
    shutdown: &CancellationToken,
) -> Result<u64, TaskError> {
    // The settle delay is interruptible; everything after it checks the
    // token once per iteration and never inside a blocking call.
    tokio::select! {
        _ = time::sleep(options.settle_delay) => {}
        _ = shutdown.cancelled() => return Ok(0),
    }

    let mut counter: u64 = 0;
    let mut cursor = 0usize;
    while !shutdown.is_cancelled() {
        let topic_index = match &options.topic_schedule {
            Some(schedule) if !schedule.is_empty() => {
                let index = schedule[cursor % schedule.len()];
                cursor += 1;
                index % options.topics.len()
            }
            _ => fastrand::usize(..options.topics.len()),
        };
        let topic = &options.topics[topic_index];

        counter += 1;
        let message = TickMessage::with_counter(counter);
        match publisher.send(topic, &message) {
            Ok(()) => info!(topic = %topic, counter, "==> sent"),
            Err(SendError::Encode(err)) => {
                // One bad payload aborts one send, not the loop.
                counter -= 1;
                warn!(%err, "encode failed, send skipped");
            }
            Err(err) => return Err(err.into()),
        }

        time::sleep(options.send_interval).await;
    }
    Ok(counter)
}

async fn subscriber_task(
    index: usize,
    topic: String,
    address: String,
    receive_hwm: usize,
    timeout: Duration,
    shutdown: CancellationToken,
) -> Result<TaskOutcome, TaskError> {
    let mut subscriber = Subscriber::with_high_water_mark(receive_hwm);
    subscriber.connect(&address)?;
    info!(subscriber = index, address = %address, "subscriber connected");

    let result = subscribe_loop(&mut subscriber, index, &topic, timeout, &shutdown).await;
    subscriber.close();

    let received = result?;
    info!(subscriber = index, received, "subscriber done");
    Ok(TaskOutcome::Subscriber { index, received })
}

async fn subscribe_loop(
    subscriber: &mut Subscriber,
    index: usize,
    topic: &str,
    timeout: Duration,
    shutdown: &CancellationToken,
) -> Result<u64, TaskError> {
    subscriber.subscribe(topic)?;

    let mut received = 0u64;
    while !shutdown.is_cancelled() {
        match subscriber.try_receive::<TickMessage>(timeout).await {
            Ok(Some((topic, message))) => {
                received += 1;
                info!(
                    subscriber = index,
                    topic = %topic,
                    counter = message.counter,
                    name = %message.name,
                    "<== received"
                );
            }
            Ok(None) => {} // timeout; loop around to check the token
            Err(RecvError::Decode(err)) => {
                // One malformed envelope must not kill the loop.
                warn!(subscriber = index, %err, "undecodable envelope skipped");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(received)
}

#[cfg(test)]
mod tests {
    use tokio::time::{timeout as time_limit, Duration, Instant};

    use super::*;
    use crate::error::BindError;

    fn quick_options(address: &str, topic_count: usize) -> RunOptions {
        let mut options = RunOptions::new(address, topic_count);
        options.send_interval = Duration::from_millis(5);
        options.receive_timeout = Duration::from_millis(100);
        options.settle_delay = Duration::from_millis(20);
        options.topic_schedule = Some((0..topic_count).collect());
        options
    }

    /// Test verifies the empty-topics and too-many-subscribers guards.
    #[tokio::test]
    async fn test_option_validation() {
        let shutdown = CancellationToken::new();
        let mut options = quick_options("inproc://run-validate", 0);
        assert!(matches!(
            run(options.clone(), shutdown.clone()).await,
            Err(RunError::NoTopics)
        ));

        options = quick_options("inproc://run-validate", 1);
        options.subscribers = 2;
        assert!(matches!(
            run(options, shutdown).await,
            Err(RunError::NotEnoughTopics { .. })
        ));
    }

    /// Test verifies that cancelling before any send shuts everything down
    /// cleanly with zero messages exchanged.
    #[tokio::test]
    async fn test_cancel_before_first_send() {
        let options = quick_options("inproc://run-cancel-early", 2);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let report = time_limit(Duration::from_secs(5), run(options, shutdown))
            .await
            .expect("run must not hang")
            .expect("clean shutdown expected");
        assert_eq!(report.published, 0);
        assert_eq!(report.received, vec![0, 0]);
    }

    /// Test verifies that a publisher startup failure surfaces as a run
    /// failure instead of a silent hang.
    #[tokio::test]
    async fn test_failed_bind_fails_the_run() {
        let mut outside = Publisher::new();
        outside.bind("inproc://run-bind-conflict").unwrap();

        let options = quick_options("inproc://run-bind-conflict", 2);
        let shutdown = CancellationToken::new();
        let err = time_limit(Duration::from_secs(5), run(options, shutdown))
            .await
            .expect("run must not hang")
            .expect_err("bind conflict expected");
        assert!(matches!(
            err,
            RunError::Task(TaskError::Bind(BindError::AddressInUse(_)))
        ));
        outside.close();
    }

    /// Test verifies a full run: messages flow to every subscriber and
    /// shutdown completes within the cooperative-cancellation bound.
    #[tokio::test]
    async fn test_run_delivers_and_stops() {
        let options = quick_options("inproc://run-smoke", 2);
        let shutdown = CancellationToken::new();
        let runner = tokio::spawn(run(options, shutdown.clone()));

        time::sleep(Duration::from_millis(200)).await;
        let cancelled_at = Instant::now();
        shutdown.cancel();

        let report = time_limit(Duration::from_secs(5), runner)
            .await
            .expect("join must not hang")
            .expect("task must not panic")
            .expect("run must succeed");

        // 100ms receive timeout + 5ms send interval; 2s is generous.
        assert!(cancelled_at.elapsed() < Duration::from_secs(2));
        assert!(report.published > 0);
        assert!(report.received[0] > 0, "subscriber 0 got nothing");
        assert!(report.received[1] > 0, "subscriber 1 got nothing");
    }
}
