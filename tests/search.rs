mod common;

use assert_matches::assert_matches;

use cmr_curl::cmr::PageCursor;
use cmr_curl::domain::PagingStrategy;
use cmr_curl::error::CmrError;
use cmr_curl::search::PagedFetcher;

use common::{FakeCmr, entries, granules_query};

fn ids(results: &cmr_curl::domain::ResultSet) -> Vec<String> {
    results.entries().iter().map(|entry| entry.id.clone()).collect()
}

#[test]
fn scroll_reassembles_pages_in_order() {
    let all = entries("G", 6);
    let cmr = FakeCmr::new().feed(
        granules_query("C1"),
        vec![all[0..2].to_vec(), all[2..4].to_vec(), all[4..6].to_vec()],
    );
    let fetcher = PagedFetcher::new(cmr, 2, PagingStrategy::Scroll);

    let results = fetcher.fetch(&granules_query("C1")).unwrap();

    assert_eq!(ids(&results), vec!["G1", "G2", "G3", "G4", "G5", "G6"]);
    assert_eq!(results.total_hits, 6);
    assert_eq!(fetcher.transport().request_count(), 3);
}

#[test]
fn scroll_stops_after_partial_last_page() {
    let all = entries("G", 5);
    let cmr = FakeCmr::new().feed(
        granules_query("C1"),
        vec![all[0..2].to_vec(), all[2..4].to_vec(), all[4..5].to_vec()],
    );
    let fetcher = PagedFetcher::new(cmr, 2, PagingStrategy::Scroll);

    let results = fetcher.fetch(&granules_query("C1")).unwrap();

    assert_eq!(results.len(), 5);
    assert_eq!(results.total_hits, 5);
    assert_eq!(fetcher.transport().request_count(), 3);
}

#[test]
fn scroll_continuations_carry_the_server_handle() {
    let all = entries("G", 4);
    let cmr = FakeCmr::new().feed(
        granules_query("C1"),
        vec![all[0..2].to_vec(), all[2..4].to_vec()],
    );
    let fetcher = PagedFetcher::new(cmr, 2, PagingStrategy::Scroll);
    fetcher.fetch(&granules_query("C1")).unwrap();

    let cursors = fetcher
        .transport()
        .requests()
        .into_iter()
        .map(|request| request.cursor)
        .collect::<Vec<_>>();
    assert_eq!(
        cursors,
        vec![
            PageCursor::ScrollStart,
            PageCursor::ScrollContinue("scroll-0".to_string()),
        ]
    );
}

#[test]
fn scroll_with_zero_hits_makes_one_request() {
    let cmr = FakeCmr::new().feed(granules_query("C1"), vec![Vec::new()]);
    let fetcher = PagedFetcher::new(cmr, 2000, PagingStrategy::Scroll);

    let results = fetcher.fetch(&granules_query("C1")).unwrap();

    assert!(results.is_empty());
    assert_eq!(fetcher.transport().request_count(), 1);
}

#[test]
fn scroll_tolerates_short_page_before_expected_end() {
    let all = entries("G", 3);
    let cmr = FakeCmr::new().feed_with_hits(
        granules_query("C1"),
        vec![all[0..2].to_vec(), all[2..3].to_vec(), entries("X", 2)],
        6,
    );
    let fetcher = PagedFetcher::new(cmr, 2, PagingStrategy::Scroll);

    let results = fetcher.fetch(&granules_query("C1")).unwrap();

    assert_eq!(ids(&results), vec!["G1", "G2", "G3"]);
    assert_eq!(fetcher.transport().request_count(), 2);
}

#[test]
fn missing_hits_header_is_a_protocol_error() {
    let cmr = FakeCmr::new()
        .feed(granules_query("C1"), vec![entries("G", 1)])
        .without_hits();
    let fetcher = PagedFetcher::new(cmr, 2, PagingStrategy::Scroll);

    let err = fetcher.fetch(&granules_query("C1")).unwrap_err();
    assert_matches!(err, CmrError::Protocol(_));
}

#[test]
fn missing_scroll_id_is_a_protocol_error_when_more_pages_remain() {
    let cmr = FakeCmr::new()
        .feed(granules_query("C1"), vec![entries("G", 2), entries("H", 2)])
        .without_scroll_id();
    let fetcher = PagedFetcher::new(cmr, 2, PagingStrategy::Scroll);

    let err = fetcher.fetch(&granules_query("C1")).unwrap_err();
    assert_matches!(err, CmrError::Protocol(_));
}

#[test]
fn zero_page_size_is_rejected_before_any_request() {
    let cmr = FakeCmr::new().feed(granules_query("C1"), vec![entries("G", 1)]);
    let fetcher = PagedFetcher::new(cmr, 0, PagingStrategy::Scroll);

    let err = fetcher.fetch(&granules_query("C1")).unwrap_err();
    assert_matches!(err, CmrError::Protocol(_));
    assert_eq!(fetcher.transport().request_count(), 0);
}

#[test]
fn transport_errors_propagate() {
    let fetcher = PagedFetcher::new(FakeCmr::new(), 2, PagingStrategy::Scroll);

    let err = fetcher.fetch(&granules_query("C1")).unwrap_err();
    assert_matches!(err, CmrError::Status { status: 400, .. });
}

#[test]
fn page_numbers_stop_at_first_empty_page() {
    let cmr = FakeCmr::new().feed_with_hits(
        granules_query("C1"),
        vec![entries("G", 2), entries("H", 1), Vec::new(), entries("Z", 2)],
        1000,
    );
    let fetcher = PagedFetcher::new(cmr, 2, PagingStrategy::PageNumber);

    let results = fetcher.fetch(&granules_query("C1")).unwrap();

    assert_eq!(ids(&results), vec!["G1", "G2", "H1"]);
    assert_eq!(results.total_hits, 3);
    let cursors = fetcher
        .transport()
        .requests()
        .into_iter()
        .map(|request| request.cursor)
        .collect::<Vec<_>>();
    assert_eq!(
        cursors,
        vec![
            PageCursor::PageNumber(1),
            PageCursor::PageNumber(2),
            PageCursor::PageNumber(3),
        ]
    );
}

#[test]
fn page_numbers_ignore_missing_hits() {
    let cmr = FakeCmr::new()
        .feed(granules_query("C1"), vec![entries("G", 2)])
        .without_hits();
    let fetcher = PagedFetcher::new(cmr, 2, PagingStrategy::PageNumber);

    let results = fetcher.fetch(&granules_query("C1")).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(fetcher.transport().request_count(), 2);
}
