use super::*;
use crate::testing::{test_config, DetailFixture, MockDom};

fn place(slug: &str) -> String {
    format!("https://www.google.com/maps/place/{slug}")
}

fn request(limit: usize) -> SearchRequest {
    SearchRequest::new("coffee shops", "New York", limit)
}

#[tokio::test]
async fn end_to_end_three_listings_in_order() {
    let (a, b, c) = (place("a"), place("b"), place("c"));
    let dom = MockDom::new()
        .with_feed_batches(vec![vec![&a, &b, &c]])
        .with_detail(&a, DetailFixture::named("A").rating("4.1").reviews("11"))
        .with_detail(&b, DetailFixture::named("B").rating("4.2").reviews("22"))
        .with_detail(&c, DetailFixture::named("C").rating("4.3").reviews("33"));
    let config = test_config();

    let outcome = run_session(&dom, &dom, &config, &request(3), &StopToken::new()).await;

    let names: Vec<_> = outcome.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["A", "B", "C"]);
    for record in &outcome.records {
        assert!(!record.name.is_empty());
        assert!(!record.map_url.is_empty());
    }
    assert_eq!(outcome.summary.requested, 3);
    assert_eq!(outcome.summary.attempted, 3);
    assert_eq!(outcome.summary.succeeded, 3);
    assert_eq!(outcome.summary.duplicates, 0);
    assert!(!outcome.summary.interrupted);
}

#[tokio::test]
async fn collected_records_never_exceed_the_limit() {
    let urls: Vec<String> = (0..5).map(|i| place(&format!("p{i}"))).collect();
    let batch: Vec<&str> = urls.iter().map(String::as_str).collect();
    let mut dom = MockDom::new().with_feed_batches(vec![batch]);
    for (i, url) in urls.iter().enumerate() {
        dom = dom.with_detail(url, DetailFixture::named(&format!("Place {i}")));
    }
    let config = test_config();

    let outcome = run_session(&dom, &dom, &config, &request(2), &StopToken::new()).await;

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.summary.attempted, 2);
}

#[tokio::test]
async fn failed_listing_is_skipped_and_the_session_continues() {
    let (a, b, c) = (place("a"), place("b"), place("c"));
    let dom = MockDom::new()
        .with_feed_batches(vec![vec![&a, &b, &c]])
        .with_detail(&a, DetailFixture::named("A"))
        // B's detail view never opens, even after every retry.
        .with_goto_failures(&b, 99)
        .with_detail(&c, DetailFixture::named("C"));
    let config = test_config();

    let outcome = run_session(&dom, &dom, &config, &request(3), &StopToken::new()).await;

    let names: Vec<_> = outcome.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["A", "C"]);
    assert_eq!(outcome.summary.attempted, 3);
    assert_eq!(outcome.summary.succeeded, 2);
    assert!(!outcome.summary.interrupted, "a failed listing does not end the session");
}

#[tokio::test]
async fn duplicate_listings_are_counted_and_dropped() {
    let (a1, a2) = (place("a-1"), place("a-2"));
    let same = || {
        DetailFixture::named("Twin Cafe").address("1 Same St")
    };
    let dom = MockDom::new()
        .with_feed_batches(vec![vec![&a1, &a2]])
        .with_detail(&a1, same())
        .with_detail(&a2, same());
    let config = test_config();

    let outcome = run_session(&dom, &dom, &config, &request(5), &StopToken::new()).await;

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.summary.succeeded, 2);
    assert_eq!(outcome.summary.duplicates, 1);
}

#[tokio::test]
async fn exhausted_feed_reports_soft_exhaustion() {
    let a = place("a");
    let dom = MockDom::new()
        .with_feed_batches(vec![vec![&a]])
        .with_detail(&a, DetailFixture::named("A"));
    let config = test_config();

    let outcome = run_session(&dom, &dom, &config, &request(100), &StopToken::new()).await;

    assert_eq!(outcome.records.len(), 1);
    assert!(outcome.summary.exhausted);
    assert!(!outcome.summary.interrupted);
}

#[tokio::test]
async fn search_failure_yields_empty_interrupted_outcome() {
    let dom = MockDom::new().without_feed();
    let config = test_config();

    let outcome = run_session(&dom, &dom, &config, &request(10), &StopToken::new()).await;

    assert!(outcome.records.is_empty());
    assert!(outcome.summary.interrupted);
    assert_eq!(outcome.summary.attempted, 0);
}

#[tokio::test]
async fn triggered_stop_ends_the_session_before_new_work() {
    let a = place("a");
    let dom = MockDom::new()
        .with_feed_batches(vec![vec![&a]])
        .with_detail(&a, DetailFixture::named("A"));
    let config = test_config();
    let stop = StopToken::new();
    stop.trigger();

    let outcome = run_session(&dom, &dom, &config, &request(10), &stop).await;

    assert!(outcome.records.is_empty());
    assert!(outcome.summary.interrupted);
    assert_eq!(outcome.summary.attempted, 0);
}
