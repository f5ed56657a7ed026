//! Aggregate statistics over a normalized table, and their CSV form.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;

use crate::normalize::NormalizedTable;

/// Column holding the transaction kind discriminant.
const TX_TYPE: &str = "tx-type";
/// Hoisted asset id column of asset-transfer records.
const ASSET_ID: &str = "asset-id-asset-transfer-tx";
/// Hoisted application id column of application-call records.
const APPLICATION_ID: &str = "application-id-application-tx";

/// Summary statistics for one exported time range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Total row count.
    pub total_transactions: usize,
    /// Echoed lower bound of the queried range, exactly as configured.
    pub from_time: String,
    /// Echoed upper bound of the queried range, exactly as configured.
    pub to_time: String,
    /// Distinct non-null asset ids across asset-transfer records.
    pub count_unique_assets: usize,
    /// Distinct non-null application ids across application-call records.
    pub count_unique_applications: usize,
    /// Occurrence count per distinct transaction type, descending by
    /// count with ties broken by name.
    pub tx_type_counts: Vec<(String, usize)>,
}

/// Compute summary statistics over a normalized table.
///
/// The time bounds are echoed from the configuration, not recomputed
/// from the data.
#[must_use]
pub fn summarize(table: &NormalizedTable, from_time: &str, to_time: &str) -> Summary {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in table.column_values(TX_TYPE).flatten() {
        let kind = value
            .as_str()
            .map_or_else(|| value.to_string(), str::to_owned);
        *counts.entry(kind).or_default() += 1;
    }
    let mut tx_type_counts: Vec<_> = counts.into_iter().collect();
    tx_type_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Summary {
        total_transactions: table.len(),
        from_time: from_time.to_owned(),
        to_time: to_time.to_owned(),
        count_unique_assets: distinct_values(table, ASSET_ID),
        count_unique_applications: distinct_values(table, APPLICATION_ID),
        tx_type_counts,
    }
}

/// Count distinct non-null values in one column.
fn distinct_values(table: &NormalizedTable, column: &str) -> usize {
    table
        .column_values(column)
        .flatten()
        .map(Value::to_string)
        .collect::<HashSet<_>>()
        .len()
}

impl Summary {
    /// The summary as ordered `(key, value)` entries: the fixed keys
    /// first, then one entry per observed transaction type.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![
            (
                "total_transactions".to_owned(),
                self.total_transactions.to_string(),
            ),
            ("from_time".to_owned(), self.from_time.clone()),
            ("to_time".to_owned(), self.to_time.clone()),
            (
                "count_unique_assets".to_owned(),
                self.count_unique_assets.to_string(),
            ),
            (
                "count_unique_applications".to_owned(),
                self.count_unique_applications.to_string(),
            ),
        ];
        entries.extend(
            self.tx_type_counts
                .iter()
                .map(|(kind, n)| (kind.clone(), n.to_string())),
        );
        entries
    }

    /// Write the summary as one `key,value` line per entry.
    ///
    /// The file is `algorand-transactions-summary-<timestamp>.csv`
    /// inside `out_dir`. A missing output directory is not fatal: the
    /// write is skipped with a warning and `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// I/O failure while writing into an existing directory.
    pub fn write_csv(&self, out_dir: &Path) -> Result<Option<PathBuf>> {
        if !out_dir.is_dir() {
            tracing::warn!(
                dir = %out_dir.display(),
                "output directory missing, skipping summary file"
            );
            return Ok(None);
        }

        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let path = out_dir.join(format!("algorand-transactions-summary-{stamp}.csv"));

        let mut text = String::new();
        for (key, value) in self.entries() {
            text.push_str(&key);
            text.push(',');
            text.push_str(&value);
            text.push('\n');
        }
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;

        tracing::info!(path = %path.display(), "summary written");
        Ok(Some(path))
    }
}
