use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use shop_mailer::domain::types::Outcome;
use shop_mailer::worker::Worker;

use crate::helpers::{FROM, MockOutboxRepo, MockSender, confirmation, drain};

// ── DrainOutbox ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_send_confirmation_and_mark_processed() {
    let event = confirmation("alice@example.com", 0);
    let order_id = event.payload["order_id"].as_str().unwrap().to_owned();
    let repo = MockOutboxRepo::new(vec![event.clone()]);
    let outcomes = repo.outcomes_handle();
    let sender = MockSender::default();
    let sent = sender.sent_handle();

    let report = drain(repo, sender, 10).execute(Utc::now()).await.unwrap();

    assert_eq!(report.sent, 1);
    let sent = sent.lock().unwrap();
    assert_eq!(sent[0].to, "alice@example.com");
    assert_eq!(sent[0].from, FROM);
    assert_eq!(sent[0].subject, "Order Confirmation");
    assert_eq!(
        sent[0].body,
        format!("Your order #{order_id} has been confirmed!")
    );
    assert_eq!(outcomes.lock().unwrap()[0], (event.id, Outcome::Sent));
}

#[tokio::test]
async fn should_schedule_retry_with_backoff_on_transport_error() {
    let event = confirmation("alice@example.com", 2);
    let repo = MockOutboxRepo::new(vec![event.clone()]);
    let outcomes = repo.outcomes_handle();
    let now = Utc::now();

    let report = drain(repo, MockSender::failing("connection refused"), 10)
        .execute(now)
        .await
        .unwrap();

    assert_eq!(report.retried, 1);
    let outcomes = outcomes.lock().unwrap();
    let Outcome::Retry {
        attempts,
        error,
        next_attempt_at,
    } = &outcomes[0].1
    else {
        panic!("expected retry, got {:?}", outcomes[0].1);
    };
    assert_eq!(*attempts, 3);
    assert!(error.contains("connection refused"));
    assert_eq!(*next_attempt_at, now + chrono::Duration::seconds(8));
}

#[tokio::test]
async fn should_fail_event_after_last_attempt() {
    let event = confirmation("alice@example.com", 4);
    let repo = MockOutboxRepo::new(vec![event]);
    let outcomes = repo.outcomes_handle();

    let report = drain(repo, MockSender::failing("timeout"), 10)
        .execute(Utc::now())
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert!(matches!(
        outcomes.lock().unwrap()[0].1,
        Outcome::Failed { attempts: 5, .. }
    ));
}

#[tokio::test]
async fn should_fail_unknown_kind_without_sending() {
    let mut event = confirmation("alice@example.com", 0);
    event.kind = "newsletter".to_owned();
    let repo = MockOutboxRepo::new(vec![event]);
    let outcomes = repo.outcomes_handle();
    let sender = MockSender::default();
    let sent = sender.sent_handle();

    drain(repo, sender, 10).execute(Utc::now()).await.unwrap();

    assert!(sent.lock().unwrap().is_empty());
    let outcomes = outcomes.lock().unwrap();
    let Outcome::Failed { attempts, error } = &outcomes[0].1 else {
        panic!("expected failure");
    };
    assert_eq!(*attempts, 1);
    assert!(error.contains("newsletter"));
}

#[tokio::test]
async fn should_take_at_most_one_batch() {
    let repo = MockOutboxRepo::new(vec![
        confirmation("a@example.com", 0),
        confirmation("b@example.com", 0),
        confirmation("c@example.com", 0),
    ]);
    let uc = drain(repo, MockSender::default(), 2);

    assert_eq!(uc.execute(Utc::now()).await.unwrap().sent, 2);
    assert_eq!(uc.execute(Utc::now()).await.unwrap().sent, 1);
    assert_eq!(uc.execute(Utc::now()).await.unwrap().total(), 0);
}

// ── Worker ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_drain_until_shutdown() {
    let repo = MockOutboxRepo::new(vec![
        confirmation("a@example.com", 0),
        confirmation("b@example.com", 0),
        confirmation("c@example.com", 0),
    ]);
    let sender = MockSender::default();
    let sent = sender.sent_handle();
    let worker = Worker {
        drain: drain(repo, sender, 2),
        poll_interval: Duration::from_millis(10),
    };
    let (tx, rx) = watch::channel(false);

    let handle = tokio::spawn(async move { worker.run(rx).await });
    for _ in 0..100 {
        if sent.lock().unwrap().len() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker stops after shutdown")
        .unwrap();
    assert_eq!(sent.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn should_stop_when_shutdown_sender_dropped() {
    let worker = Worker {
        drain: drain(MockOutboxRepo::default(), MockSender::default(), 10),
        poll_interval: Duration::from_secs(3600),
    };
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move { worker.run(rx).await });
    drop(tx);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker stops without a shutdown sender")
        .unwrap();
}
