use parapipe::error::Error;
use parapipe::pipeline::cancel::CancelToken;
use parapipe::source::VecSource;

mod common;
use common::within;

#[tokio::test]
async fn emits_items_in_order_then_closes() {
    let cancel = CancelToken::new();
    let rx = VecSource::new(vec!["a", "b", "c"]).spawn(&cancel, 1).unwrap();

    let got = within("source", rx.collect()).await;
    assert_eq!(got, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn empty_source_closes_immediately() {
    let cancel = CancelToken::new();
    let mut rx = VecSource::new(Vec::<u8>::new()).spawn(&cancel, 1).unwrap();
    assert_eq!(within("recv", rx.recv()).await, None);
}

#[tokio::test]
async fn cancellation_drops_remaining_items() {
    let cancel = CancelToken::new();
    let mut rx = VecSource::new(0u32..10_000).spawn(&cancel, 1).unwrap();

    assert_eq!(rx.recv().await, Some(0));
    assert_eq!(rx.recv().await, Some(1));
    cancel.cancel();

    let rest = within("drain after cancel", rx.collect()).await;
    // at most the value already buffered before cancellation
    assert!(rest.len() <= 1, "source kept emitting: {} items", rest.len());
}

#[test]
fn validated_reports_first_bad_index() {
    let res = VecSource::validated(vec!["ok", "", "also"], |s: &&str| {
        if s.is_empty() {
            Err("empty word".to_string())
        } else {
            Ok(())
        }
    });

    match res {
        Err(Error::InvalidInput { index, reason }) => {
            assert_eq!(index, 1);
            assert_eq!(reason, "empty word");
        }
        other => panic!("expected InvalidInput, got {:?}", other.map(|s| s.len())),
    }
}

#[test]
fn validated_accepts_good_input() {
    let source = VecSource::validated(vec![1, 2, 3], |_| Ok(())).unwrap();
    assert_eq!(source.len(), 3);
    assert!(!source.is_empty());
}

#[test]
fn zero_capacity_is_a_config_error() {
    let err = VecSource::new(vec![1u8]).spawn(&CancelToken::new(), 0).unwrap_err();
    assert!(err.is_config());
}
