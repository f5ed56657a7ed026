//! Wire types for the indexer v2 REST API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A raw transaction record as returned by the indexer.
///
/// The shape varies by `tx-type`: each kind nests its specific fields
/// under a kind-named sub-object (`payment-transaction`,
/// `asset-transfer-transaction`, `application-transaction`), while the
/// common fields (`id`, `sender`, `tx-type`, `round`) appear on every
/// record. Records stay dynamic maps here; flattening the variants into
/// one schema is the consumer's concern.
pub type RawTransaction = serde_json::Map<String, serde_json::Value>;

/// One page of a paginated transaction search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionPage {
    /// Records in server order.
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
    /// Continuation cursor for the next page, if the server sent one.
    ///
    /// The final page of a search may still carry a stale token, so an
    /// empty `transactions` list — not an absent token — is what ends a
    /// scan.
    #[serde(rename = "next-token")]
    pub next_token: Option<String>,
}

/// Response envelope of `GET /v2/accounts/{address}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    /// The account state.
    pub account: Account,
    /// The round the state was read at.
    #[serde(rename = "current-round", default)]
    pub current_round: u64,
}

/// Account state as tracked by the indexer.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    /// The account address.
    pub address: String,
    /// Total balance in microalgos.
    pub amount: MicroAlgos,
}

/// An exact amount in microalgos (10⁻⁶ of one Algo).
///
/// Amounts stay in minor units end to end. Rendering in whole Algos is
/// exact base-10 division — quotient plus zero-padded remainder — never
/// floating point.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MicroAlgos(pub u64);

impl MicroAlgos {
    /// Minor units per whole Algo.
    pub const PER_ALGO: u64 = 1_000_000;

    /// Whole-Algo part of the amount.
    #[must_use]
    pub const fn whole(self) -> u64 {
        self.0 / Self::PER_ALGO
    }

    /// Microalgo remainder below one Algo, in `[0, 1_000_000)`.
    #[must_use]
    pub const fn frac(self) -> u64 {
        self.0 % Self::PER_ALGO
    }
}

impl fmt::Display for MicroAlgos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.whole(), self.frac())
    }
}
