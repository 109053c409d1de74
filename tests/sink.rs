use parapipe::pipeline::cancel::{CancelCause, CancelToken};
use parapipe::pipeline::stream::channel;
use parapipe::sink::{Outcome, Sink};

mod common;
use common::{collecting_sink, within};

#[tokio::test]
async fn exhaustion_reports_every_result() {
    let cancel = CancelToken::new();
    let (res_tx, results) = channel(1).unwrap();
    let (err_tx, errors) = channel::<String>(1).unwrap();
    let (seen, sink) = collecting_sink();

    let c = cancel.clone();
    let producer = tokio::spawn(async move {
        for i in 0..5u32 {
            res_tx.send(i, &c).await;
        }
        res_tx.close();
        err_tx.close();
    });

    let report = within("sink", sink.run(&cancel, results, errors)).await;
    producer.await.unwrap();

    assert_eq!(report.outcome, Outcome::Exhausted);
    assert!(report.is_exhausted());
    assert_eq!(report.results, 5);
    assert_eq!(report.errors, 0);
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    assert!(!cancel.is_cancelled());
}

#[tokio::test]
async fn first_error_cancels_the_pipeline() {
    let cancel = CancelToken::new();
    let (_res_tx, results) = channel::<u32>(1).unwrap();
    let (err_tx, errors) = channel(1).unwrap();

    err_tx.send("oh no".to_string(), &cancel).await;

    let report = within("sink", Sink::new().run(&cancel, results, errors)).await;

    assert!(cancel.is_cancelled());
    assert_eq!(report.errors, 1);
    assert_eq!(
        report.cause(),
        Some(&CancelCause::Failure {
            message: "oh no".into()
        })
    );
}

#[tokio::test]
async fn external_cancellation_ends_the_sink() {
    let cancel = CancelToken::new();
    let (_res_tx, results) = channel::<u32>(1).unwrap();
    let (_err_tx, errors) = channel::<String>(1).unwrap();

    let c = cancel.clone();
    let sink = tokio::spawn(async move { Sink::new().run(&c, results, errors).await });
    tokio::task::yield_now().await;
    cancel.cancel();

    let report = within("sink", sink).await.unwrap();
    assert_eq!(report.outcome, Outcome::Cancelled(CancelCause::Requested));
}

#[tokio::test]
async fn error_after_results_closed_is_still_observed() {
    let cancel = CancelToken::new();
    let (res_tx, results) = channel::<u32>(1).unwrap();
    let (err_tx, errors) = channel(1).unwrap();
    res_tx.close();

    let c = cancel.clone();
    let late = tokio::spawn(async move {
        tokio::task::yield_now().await;
        err_tx.send("late".to_string(), &c).await;
    });

    let report = within("sink", Sink::new().run(&cancel, results, errors)).await;
    late.await.unwrap();

    assert_eq!(report.errors, 1);
    assert!(matches!(report.outcome, Outcome::Cancelled(CancelCause::Failure { .. })));
}

#[tokio::test]
async fn closed_error_stream_does_not_spin() {
    let cancel = CancelToken::new();
    let (res_tx, results) = channel(1).unwrap();
    let (err_tx, errors) = channel::<String>(1).unwrap();
    err_tx.close();

    let c = cancel.clone();
    let producer = tokio::spawn(async move {
        for i in 0..3u32 {
            tokio::task::yield_now().await;
            res_tx.send(i, &c).await;
        }
    });

    let report = within("sink", Sink::new().run(&cancel, results, errors)).await;
    producer.await.unwrap();
    assert_eq!(report.results, 3);
    assert!(report.is_exhausted());
}

#[tokio::test]
async fn already_cancelled_token_ends_immediately() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let (_res_tx, results) = channel::<u32>(1).unwrap();
    let (_err_tx, errors) = channel::<String>(1).unwrap();

    let report = within("sink", Sink::new().run(&cancel, results, errors)).await;
    assert_eq!(report.results, 0);
    assert_eq!(report.cause(), Some(&CancelCause::Requested));
}
