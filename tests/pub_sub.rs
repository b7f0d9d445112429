use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;

use topicbus::{
    orchestrator::{run, RunOptions},
    Publisher, RunError, Subscriber, TickMessage,
};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Numbered {
    counter: u64,
}

const RECEIVE: Duration = Duration::from_millis(500);
const SHORT: Duration = Duration::from_millis(50);

/// Test verifies the reference two-subscriber scenario: one message per
/// topic, each subscriber sees exactly its own and nothing of the other.
#[tokio::test]
async fn test_two_subscribers_two_topics() {
    let addr = "inproc://it-two-subs";

    let mut sub0 = Subscriber::new();
    sub0.connect(addr).unwrap();
    sub0.subscribe("Topic0").unwrap();
    let mut sub1 = Subscriber::new();
    sub1.connect(addr).unwrap();
    sub1.subscribe("Topic1").unwrap();

    let mut publisher = Publisher::new();
    publisher.bind(addr).unwrap();
    publisher.send("Topic0", &Numbered { counter: 1 }).unwrap();
    publisher.send("Topic1", &Numbered { counter: 1 }).unwrap();

    let (topic, message) = sub0
        .try_receive::<Numbered>(RECEIVE)
        .await
        .unwrap()
        .expect("subscriber 0 must get its message");
    assert_eq!(topic, "Topic0");
    assert_eq!(message.counter, 1);
    assert!(
        sub0.try_receive::<Numbered>(SHORT).await.unwrap().is_none(),
        "subscriber 0 must never see Topic1"
    );

    let (topic, message) = sub1
        .try_receive::<Numbered>(RECEIVE)
        .await
        .unwrap()
        .expect("subscriber 1 must get its message");
    assert_eq!(topic, "Topic1");
    assert_eq!(message.counter, 1);
    assert!(
        sub1.try_receive::<Numbered>(SHORT).await.unwrap().is_none(),
        "subscriber 1 must never see Topic0"
    );

    publisher.close();
    sub0.close();
    sub1.close();
}

/// Test verifies topic isolation under an interleaved stream: many
/// publishes split across two topics, each subscriber's received set holds
/// only its topic.
#[tokio::test]
async fn test_topic_isolation_interleaved() {
    let addr = "inproc://it-isolation";

    let mut left = Subscriber::new();
    left.connect(addr).unwrap();
    left.subscribe("Left").unwrap();
    let mut right = Subscriber::new();
    right.connect(addr).unwrap();
    right.subscribe("Right").unwrap();

    let mut publisher = Publisher::new();
    publisher.bind(addr).unwrap();
    for counter in 1..=20u64 {
        let topic = if counter % 2 == 0 { "Left" } else { "Right" };
        publisher.send(topic, &Numbered { counter }).unwrap();
    }

    let mut left_topics = Vec::new();
    while let Some((topic, _)) = left.try_receive::<Numbered>(RECEIVE).await.unwrap() {
        left_topics.push(topic);
        if left_topics.len() == 10 {
            break;
        }
    }
    let mut right_topics = Vec::new();
    while let Some((topic, _)) = right.try_receive::<Numbered>(RECEIVE).await.unwrap() {
        right_topics.push(topic);
        if right_topics.len() == 10 {
            break;
        }
    }

    assert_eq!(left_topics.len(), 10);
    assert!(left_topics.iter().all(|t| t == "Left"));
    assert_eq!(right_topics.len(), 10);
    assert!(right_topics.iter().all(|t| t == "Right"));

    publisher.close();
    left.close();
    right.close();
}

/// Test verifies in-topic ordering: with no drops, one subscriber observes
/// strictly increasing counters.
#[tokio::test]
async fn test_ordering_within_topic() {
    let addr = "inproc://it-ordering";

    let mut subscriber = Subscriber::new();
    subscriber.connect(addr).unwrap();
    subscriber.subscribe("Topic0").unwrap();

    let mut publisher = Publisher::new();
    publisher.bind(addr).unwrap();
    for counter in 1..=25u64 {
        publisher.send("Topic0", &Numbered { counter }).unwrap();
    }

    let mut last = 0u64;
    for _ in 0..25 {
        let (_, message) = subscriber
            .try_receive::<Numbered>(RECEIVE)
            .await
            .unwrap()
            .expect("sequence must arrive complete");
        assert!(
            message.counter > last,
            "counter {} after {}",
            message.counter,
            last
        );
        last = message.counter;
    }
    assert_eq!(last, 25);

    publisher.close();
    subscriber.close();
}

/// Test verifies late-joiner semantics: envelopes published before the
/// subscriber connected are gone for good.
#[tokio::test]
async fn test_late_joiner_misses_earlier_traffic() {
    let addr = "inproc://it-late-joiner";

    let mut publisher = Publisher::new();
    publisher.bind(addr).unwrap();
    publisher.send("Topic0", &Numbered { counter: 1 }).unwrap();
    // Let the outbound pump flush before the subscriber attaches.
    tokio::time::sleep(SHORT).await;

    let mut subscriber = Subscriber::new();
    subscriber.connect(addr).unwrap();
    subscriber.subscribe("Topic0").unwrap();
    assert!(
        subscriber
            .try_receive::<Numbered>(SHORT)
            .await
            .unwrap()
            .is_none(),
        "late joiner must not see earlier envelopes"
    );

    publisher.send("Topic0", &Numbered { counter: 2 }).unwrap();
    let (_, message) = subscriber
        .try_receive::<Numbered>(RECEIVE)
        .await
        .unwrap()
        .expect("traffic after the join must arrive");
    assert_eq!(message.counter, 2);

    publisher.close();
    subscriber.close();
}

/// Test verifies that the demo payload round-trips through the endpoints
/// unchanged.
#[tokio::test]
async fn test_tick_message_end_to_end() {
    let addr = "inproc://it-tick";

    let mut subscriber = Subscriber::new();
    subscriber.connect(addr).unwrap();
    subscriber.subscribe("Topic0").unwrap();

    let mut publisher = Publisher::new();
    publisher.bind(addr).unwrap();
    let sent = TickMessage::with_counter(42);
    publisher.send("Topic0", &sent).unwrap();

    let (_, got) = subscriber
        .try_receive::<TickMessage>(RECEIVE)
        .await
        .unwrap()
        .expect("message expected");
    assert_eq!(got, sent);

    publisher.close();
    subscriber.close();
}

/// Test verifies the immediate-shutdown scenario through the orchestrator:
/// cancelling right after startup ends the run cleanly with zero messages.
#[tokio::test]
async fn test_cancel_immediately_after_startup() {
    let mut options = RunOptions::new("inproc://it-cancel-now", 3);
    options.send_interval = Duration::from_millis(5);
    options.receive_timeout = Duration::from_millis(100);
    options.settle_delay = Duration::from_millis(500);

    let shutdown = CancellationToken::new();
    let runner = tokio::spawn(run(options, shutdown.clone()));
    shutdown.cancel();

    let report = timeout(Duration::from_secs(5), runner)
        .await
        .expect("run must not hang")
        .expect("run must not panic")
        .expect("clean shutdown expected");
    assert_eq!(report.published, 0);
    assert_eq!(report.received, vec![0, 0, 0]);
}

/// Test verifies bounded cancellation latency for a full run: everything
/// joins within the receive-timeout granularity after the signal.
#[tokio::test]
async fn test_bounded_cancellation_latency() {
    let mut options = RunOptions::new("inproc://it-latency", 2);
    options.send_interval = Duration::from_millis(10);
    options.receive_timeout = Duration::from_millis(200);
    options.settle_delay = Duration::from_millis(10);
    options.topic_schedule = Some(vec![0, 1]);

    let shutdown = CancellationToken::new();
    let runner = tokio::spawn(run(options, shutdown.clone()));

    tokio::time::sleep(Duration::from_millis(150)).await;
    let cancelled_at = Instant::now();
    shutdown.cancel();

    let report = timeout(Duration::from_secs(5), runner)
        .await
        .expect("run must not hang")
        .expect("run must not panic")
        .expect("run must succeed");

    // One 200ms receive timeout plus scheduling slack.
    assert!(
        cancelled_at.elapsed() < Duration::from_secs(2),
        "shutdown took {:?}",
        cancelled_at.elapsed()
    );
    assert!(report.published > 0);
}

/// Test verifies that a bind conflict fails the run instead of hanging the
/// join.
#[tokio::test]
async fn test_bind_conflict_fails_run() {
    let addr = "inproc://it-bind-conflict";
    let mut outside = Publisher::new();
    outside.bind(addr).unwrap();

    let mut options = RunOptions::new(addr, 2);
    options.receive_timeout = Duration::from_millis(100);
    options.settle_delay = Duration::from_millis(10);

    let shutdown = CancellationToken::new();
    let err = timeout(Duration::from_secs(5), run(options, shutdown))
        .await
        .expect("run must not hang")
        .expect_err("bind conflict expected");
    assert!(matches!(err, RunError::Task(_)));

    outside.close();
}
