//! Paginated retrieval loops over the indexer gateway.
//!
//! Everything here is strictly sequential — one request in flight at a
//! time — so result ordering is deterministic for identical server
//! responses: window 0 pages in server order, then window 1, and so on.
//! Records are never re-sorted across windows.

use algoscan::{Account, Error, MicroAlgos, RawTransaction, TransactionPage};
use anyhow::Result;
use serde_json::Value;

use crate::retry::{FailurePolicy, RetryError, RetryPolicy};
use crate::window::TimeRange;

/// Drain every page of one paginated query.
///
/// The continuation token starts empty and is replaced by the server's
/// `next-token` after each page. The scan ends when a page carries zero
/// records — not when the token disappears, since some indexers return
/// an empty final page with a stale token. Each page request runs under
/// `retry`; exhaustion propagates to the caller.
///
/// # Errors
///
/// [`RetryError`] when any single page request exhausts its retries.
pub async fn drain_pages<Q>(
    context: &str,
    retry: &RetryPolicy,
    mut query: Q,
) -> Result<Vec<RawTransaction>, RetryError>
where
    Q: AsyncFnMut(Option<String>) -> Result<TransactionPage, Error>,
{
    let mut records = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = retry.run(context, async || query(token.clone()).await).await?;
        if page.transactions.is_empty() {
            break;
        }
        token = page.next_token;
        records.extend(page.transactions);
    }
    Ok(records)
}

/// Scan a full window set, draining every page of every window.
///
/// `query_window` issues one page request for one window; the per-page
/// limit lives inside it and is passed through on every call. An
/// exhausted retry on any page aborts the whole scan — partial data
/// with a missing window would silently under-report.
///
/// # Errors
///
/// The first window whose page request exhausts its retries.
pub async fn scan_windows<Q>(
    windows: &[TimeRange],
    retry: &RetryPolicy,
    mut query_window: Q,
) -> Result<Vec<RawTransaction>>
where
    Q: AsyncFnMut(&TimeRange, Option<String>) -> Result<TransactionPage, Error>,
{
    let total = windows.len();
    let mut all = Vec::new();
    for (i, window) in windows.iter().enumerate() {
        tracing::info!(window = %window, n = i + 1, of = total, "retrieving transactions");
        let context = format!("window {window}");
        let records = drain_pages(&context, retry, async |token| {
            query_window(window, token).await
        })
        .await?;
        tracing::info!(window = %window, records = records.len(), "window complete");
        all.extend(records);
    }
    Ok(all)
}

/// One account balance row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRow {
    /// The queried address, exactly as given in the input list.
    pub account: String,
    /// Balance in microalgos.
    pub balance: MicroAlgos,
}

/// Outcome of a balance sweep.
#[derive(Debug, Default)]
pub struct BalanceReport {
    /// Balance rows in input order.
    pub rows: Vec<BalanceRow>,
    /// Addresses skipped under [`FailurePolicy::SkipAndLog`].
    pub skipped: Vec<String>,
}

/// Fetch the current balance of every address in the list.
///
/// Addresses are queried in input order, duplicates included, each
/// lookup under `retry`. When retries for one address are exhausted,
/// `policy` decides: [`FailurePolicy::FailFast`] aborts the run,
/// [`FailurePolicy::SkipAndLog`] records the address and continues.
///
/// # Errors
///
/// Under `FailFast`, the first address whose lookup exhausts its
/// retries. `SkipAndLog` never fails — skipped addresses are reported
/// instead.
pub async fn fetch_balances<L>(
    addresses: &[String],
    retry: &RetryPolicy,
    policy: FailurePolicy,
    mut lookup: L,
) -> Result<BalanceReport>
where
    L: AsyncFnMut(&str) -> Result<Account, Error>,
{
    let mut report = BalanceReport::default();
    for address in addresses {
        tracing::info!(address = %address, "retrieving account balance");
        let fetched = retry
            .run(address, async || lookup(address.as_str()).await)
            .await;
        match fetched {
            Ok(account) => report.rows.push(BalanceRow {
                account: address.clone(),
                balance: account.amount,
            }),
            Err(e) => match policy {
                FailurePolicy::FailFast => return Err(e.into()),
                FailurePolicy::SkipAndLog => {
                    tracing::warn!(address = %address, error = %e, "skipping address");
                    report.skipped.push(address.clone());
                }
            },
        }
    }
    Ok(report)
}

/// One row of a single-address payment history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    /// Transaction id.
    pub tx_id: String,
    /// Sending address.
    pub sender: String,
    /// Payment amount; absent for non-payment transaction kinds.
    pub amount: Option<MicroAlgos>,
    /// Receiving address; absent for non-payment transaction kinds.
    pub receiver: Option<String>,
}

/// Fetch the full transaction history of one address.
///
/// Drains every page of the address query, then projects each record to
/// its payment fields. Records of other kinds keep their id and sender
/// with absent payment fields — a missing variant sub-structure is a
/// gap, not an error.
///
/// # Errors
///
/// [`RetryError`] when any page request exhausts its retries.
pub async fn fetch_history<Q>(
    address: &str,
    retry: &RetryPolicy,
    query: Q,
) -> Result<Vec<HistoryRow>, RetryError>
where
    Q: AsyncFnMut(Option<String>) -> Result<TransactionPage, Error>,
{
    let context = format!("history for {address}");
    let records = drain_pages(&context, retry, query).await?;
    Ok(records.iter().map(history_row).collect())
}

/// Project one raw record to its payment-history fields.
fn history_row(record: &RawTransaction) -> HistoryRow {
    let text = |key: &str| record.get(key).and_then(Value::as_str).map(str::to_owned);
    let payment = record.get("payment-transaction").and_then(Value::as_object);
    HistoryRow {
        tx_id: text("id").unwrap_or_default(),
        sender: text("sender").unwrap_or_default(),
        amount: payment
            .and_then(|p| p.get("amount"))
            .and_then(Value::as_u64)
            .map(MicroAlgos),
        receiver: payment
            .and_then(|p| p.get("receiver"))
            .and_then(|v| v.as_str())
            .map(str::to_owned),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use serde_json::json;

    use super::*;

    fn record(id: &str) -> RawTransaction {
        let Value::Object(map) = json!({"id": id, "sender": "S", "tx-type": "pay"}) else {
            unreachable!()
        };
        map
    }

    fn page(ids: &[&str], token: Option<&str>) -> TransactionPage {
        TransactionPage {
            transactions: ids.iter().map(|id| record(id)).collect(),
            next_token: token.map(str::to_owned),
        }
    }

    fn ids(records: &[RawTransaction]) -> Vec<String> {
        records
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_str))
            .map(str::to_owned)
            .collect()
    }

    #[tokio::test]
    async fn drains_pages_in_order() {
        let retry = RetryPolicy::new(5);
        let mut pages = VecDeque::from([
            page(&["a", "b", "c"], Some("t1")),
            page(&["d", "e", "f"], Some("t2")),
            page(&[], Some("t2")),
        ]);
        let mut calls = 0u32;
        let mut tokens = Vec::new();
        let records = drain_pages("q", &retry, async |token| {
            calls += 1;
            tokens.push(token.clone());
            Ok(pages.pop_front().unwrap())
        })
        .await
        .unwrap();

        assert_eq!(ids(&records), ["a", "b", "c", "d", "e", "f"]);
        assert_eq!(calls, 3, "two full pages plus the terminating empty one");
        assert_eq!(
            tokens,
            [None, Some("t1".to_owned()), Some("t2".to_owned())],
            "token starts empty and follows the server"
        );
    }

    #[tokio::test]
    async fn empty_page_ends_scan_not_absent_token() {
        // Pages never carry a token; termination must still come from
        // the empty page, and only from it.
        let retry = RetryPolicy::new(5);
        let mut calls = 0u32;
        let records = drain_pages("q", &retry, async |_token| {
            calls += 1;
            assert!(calls <= 10, "scan ran past the test call cap");
            if calls <= 4 {
                Ok(page(&["x", "y"], None))
            } else {
                Ok(page(&[], None))
            }
        })
        .await
        .unwrap();

        assert_eq!(records.len(), 8, "all four non-empty pages collected");
        assert_eq!(calls, 5);
    }

    #[tokio::test]
    async fn page_failure_is_retried_then_propagated() {
        let retry = RetryPolicy::new(3);
        let mut calls = 0u32;
        let result = drain_pages("q", &retry, async |_token| {
            calls += 1;
            Err::<TransactionPage, _>(algoscan::Error::Http {
                status: 500,
                body: "boom".to_owned(),
            })
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn balance_sweep_skip_and_log() {
        let retry = RetryPolicy::new(2);
        let addresses = ["GOOD1", "BAD", "GOOD2"].map(str::to_owned);
        let mut bad_calls = 0u32;
        let report = fetch_balances(
            &addresses,
            &retry,
            FailurePolicy::SkipAndLog,
            async |address| {
                if address == "BAD" {
                    bad_calls += 1;
                    return Err(algoscan::Error::Http {
                        status: 500,
                        body: "nope".to_owned(),
                    });
                }
                Ok(Account {
                    address: address.to_owned(),
                    amount: MicroAlgos(1_500_000),
                })
            },
        )
        .await
        .unwrap();

        assert_eq!(report.rows.len(), 2, "failed address is skipped");
        assert_eq!(report.rows[0].account, "GOOD1");
        assert_eq!(report.rows[1].account, "GOOD2");
        assert_eq!(report.skipped, ["BAD"]);
        assert_eq!(bad_calls, 2, "skipped address still used its retries");
    }

    #[tokio::test]
    async fn balance_sweep_fail_fast() {
        let retry = RetryPolicy::new(2);
        let addresses = ["GOOD1", "BAD", "GOOD2"].map(str::to_owned);
        let result = fetch_balances(
            &addresses,
            &retry,
            FailurePolicy::FailFast,
            async |address| {
                if address == "BAD" {
                    return Err(algoscan::Error::Http {
                        status: 500,
                        body: "nope".to_owned(),
                    });
                }
                Ok(Account {
                    address: address.to_owned(),
                    amount: MicroAlgos(0),
                })
            },
        )
        .await;

        assert!(result.is_err(), "fail-fast aborts the whole sweep");
    }

    #[tokio::test]
    async fn history_projects_payment_fields() {
        let retry = RetryPolicy::new(1);
        let payment = json!({
            "id": "TX1",
            "sender": "SND",
            "tx-type": "pay",
            "payment-transaction": {"amount": 2_500_000u64, "receiver": "RCV"}
        });
        let axfer = json!({
            "id": "TX2",
            "sender": "SND",
            "tx-type": "axfer",
            "asset-transfer-transaction": {"amount": 9, "asset-id": 31566704}
        });
        let mut pages = VecDeque::from([
            TransactionPage {
                transactions: vec![payment, axfer]
                    .into_iter()
                    .map(|v| {
                        let Value::Object(map) = v else { unreachable!() };
                        map
                    })
                    .collect(),
                next_token: None,
            },
            TransactionPage::default(),
        ]);

        let rows = fetch_history("SND", &retry, async |_token| Ok(pages.pop_front().unwrap()))
            .await
            .unwrap();

        assert_eq!(rows.len(), 2, "non-payment records are kept, not dropped");
        assert_eq!(rows[0].tx_id, "TX1");
        assert_eq!(rows[0].amount, Some(MicroAlgos(2_500_000)));
        assert_eq!(rows[0].receiver.as_deref(), Some("RCV"));
        assert_eq!(rows[1].tx_id, "TX2");
        assert_eq!(rows[1].amount, None, "no payment variant, no amount");
        assert_eq!(rows[1].receiver, None);
    }
}
