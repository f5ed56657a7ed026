//! HTTP gateway to one indexer deployment.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::types::{Account, AccountResponse, TransactionPage};

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum error-body length kept in [`Error::Http`].
const BODY_SNIPPET: usize = 200;

/// Read-only HTTP client for one Algorand indexer deployment.
///
/// Authentication headers are attached to every request: the indexer
/// API token when one is configured, plus an optional `X-API-KEY` for
/// gateway providers that require it. Every method performs a single
/// request — pagination and retry are the caller's concern.
#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: reqwest::Client,
    base_url: String,
}

impl IndexerClient {
    /// Build a client for the indexer at `url`.
    ///
    /// An empty `token` sends no token header; `api_key` adds the
    /// `X-API-KEY` header and is omitted when `None` or empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the URL does not parse or a header
    /// value is not valid HTTP header text, and [`Error::Transport`]
    /// when the underlying HTTP client cannot be constructed.
    pub fn new(url: &str, token: &str, api_key: Option<&str>) -> Result<Self, Error> {
        reqwest::Url::parse(url).map_err(|e| Error::Config(format!("indexer URL {url:?}: {e}")))?;

        let mut headers = HeaderMap::new();
        if !token.is_empty() {
            headers.insert("x-indexer-api-token", header_value("TOKEN", token)?);
        }
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            headers.insert("x-api-key", header_value("X-API-KEY", key)?);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_owned(),
        })
    }

    /// Probe the indexer's `/health` endpoint.
    ///
    /// # Errors
    ///
    /// Any transport or HTTP failure; a healthy indexer answers 200.
    pub async fn health(&self) -> Result<(), Error> {
        self.get_json::<serde_json::Value>("health", &[]).await.map(|_| ())
    }

    /// Search transactions in `[after, before]`, one page per call.
    ///
    /// `next` is the continuation token from the previous page (`None`
    /// starts the search); `limit` bounds the page size server-side and
    /// is passed on every call.
    ///
    /// # Errors
    ///
    /// Transport, HTTP, or decode failure for this single request.
    pub async fn search_transactions(
        &self,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
        next: Option<&str>,
        limit: u64,
    ) -> Result<TransactionPage, Error> {
        let mut query = vec![
            ("after-time", rfc3339(after)),
            ("before-time", rfc3339(before)),
            ("limit", limit.to_string()),
        ];
        if let Some(token) = next {
            query.push(("next", token.to_owned()));
        }
        self.get_json("v2/transactions", &query).await
    }

    /// Look up the current state of one account.
    ///
    /// # Errors
    ///
    /// Transport, HTTP (including 404 for unknown addresses), or decode
    /// failure.
    pub async fn account_info(&self, address: &str) -> Result<Account, Error> {
        let response: AccountResponse =
            self.get_json(&format!("v2/accounts/{address}"), &[]).await?;
        Ok(response.account)
    }

    /// Search one address's transactions from `after` onward, one page
    /// per call.
    ///
    /// # Errors
    ///
    /// Transport, HTTP, or decode failure for this single request.
    pub async fn search_transactions_by_address(
        &self,
        address: &str,
        after: DateTime<Utc>,
        next: Option<&str>,
        limit: u64,
    ) -> Result<TransactionPage, Error> {
        let mut query = vec![("after-time", rfc3339(after)), ("limit", limit.to_string())];
        if let Some(token) = next {
            query.push(("next", token.to_owned()));
        }
        self.get_json(&format!("v2/accounts/{address}/transactions"), &query)
            .await
    }

    /// One GET request, decoded from JSON.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = format!("{}/{path}", self.base_url);
        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Validate one configured header value.
fn header_value(name: &str, value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value).map_err(|e| Error::Config(format!("{name} header value: {e}")))
}

/// RFC 3339 with second precision and a `Z` suffix, the form the
/// indexer's time-bound parameters expect.
fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Trim an error body to a loggable size.
fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_SNIPPET {
        trimmed.to_owned()
    } else {
        trimmed.chars().take(BODY_SNIPPET).collect()
    }
}
