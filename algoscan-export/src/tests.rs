//! End-to-end pipeline tests over mock page sources.

use std::collections::HashMap;

use algoscan::TransactionPage;
use chrono::{Duration, TimeZone, Utc};
use serde_json::{Value, json};

use crate::fetcher::scan_windows;
use crate::normalize::normalize;
use crate::retry::RetryPolicy;
use crate::summary::summarize;
use crate::window::TimeRange;

fn record(id: &str, kind: &str) -> algoscan::RawTransaction {
    let Value::Object(map) = json!({"id": id, "sender": "S", "tx-type": kind}) else {
        unreachable!()
    };
    map
}

/// Three one-hour windows, each serving one page of two records and
/// then an empty page, flow through scan → normalize → summarize.
#[tokio::test]
async fn windowed_scan_to_summary() {
    let start = Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2022, 6, 1, 3, 0, 0).unwrap();
    let range = TimeRange::new(start, end).unwrap();
    let windows = range.partition(Duration::hours(1)).unwrap();
    assert_eq!(windows.len(), 3);

    let retry = RetryPolicy::new(5);
    let mut calls_per_window: HashMap<String, u32> = HashMap::new();
    let records = scan_windows(&windows, &retry, async |window, token| {
        let calls = calls_per_window.entry(window.to_string()).or_default();
        *calls += 1;
        if *calls == 1 {
            assert!(token.is_none(), "each window's scan starts with no token");
            let hour = window.start().format("%H");
            Ok(TransactionPage {
                transactions: vec![
                    record(&format!("{hour}-a"), "pay"),
                    record(&format!("{hour}-b"), "pay"),
                ],
                next_token: Some("stale".to_owned()),
            })
        } else {
            assert_eq!(
                token.as_deref(),
                Some("stale"),
                "the server token is passed back even on the final fetch"
            );
            Ok(TransactionPage::default())
        }
    })
    .await
    .unwrap();

    assert_eq!(records.len(), 6, "two records from each of three windows");
    assert_eq!(
        calls_per_window.values().copied().collect::<Vec<_>>(),
        vec![2, 2, 2],
        "each window fetched its data page plus the terminating empty page"
    );

    // Window order is preserved, never re-sorted.
    let ids: Vec<_> = records
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_str))
        .collect();
    assert_eq!(ids, ["00-a", "00-b", "01-a", "01-b", "02-a", "02-b"]);

    let table = normalize(records);
    let summary = summarize(&table, "2022-06-01T00:00:00Z", "2022-06-01T03:00:00Z");
    assert_eq!(summary.total_transactions, 6);
    assert_eq!(summary.tx_type_counts, [("pay".to_owned(), 6)]);
}

/// A window whose pages keep failing aborts the whole scan.
#[tokio::test]
async fn failed_window_aborts_scan() {
    let start = Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2022, 6, 1, 2, 0, 0).unwrap();
    let windows = TimeRange::new(start, end)
        .unwrap()
        .partition(Duration::hours(1))
        .unwrap();

    let retry = RetryPolicy::new(2);
    let mut second_window_touched = false;
    let result = scan_windows(&windows, &retry, async |window, _token| {
        if window.start() == start {
            Err(algoscan::Error::Http {
                status: 500,
                body: "down".to_owned(),
            })
        } else {
            second_window_touched = true;
            Ok(TransactionPage::default())
        }
    })
    .await;

    assert!(result.is_err(), "scan must not continue past a failed window");
    assert!(
        !second_window_touched,
        "later windows are not fetched after an abort"
    );
}
