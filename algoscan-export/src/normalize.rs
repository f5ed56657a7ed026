//! Variant flattening of raw transaction records.
//!
//! The indexer returns each transaction with its kind-specific fields
//! nested under a kind-named sub-object. Analysis wants one wide, flat
//! schema, so each variant's fields are hoisted to top-level columns
//! disambiguated by a kind suffix. A record lacking a variant simply
//! has no values in that variant's columns — a gap, never an error.

use std::collections::BTreeSet;

use algoscan::RawTransaction;
use serde_json::Value;

/// The known variant sub-structures, processed in this fixed order, and
/// the column suffix each one's fields are hoisted under. Suffixes are
/// distinct per variant, so hoisted names cannot collide.
const VARIANTS: &[(&str, &str)] = &[
    ("asset-transfer-transaction", "asset-transfer-tx"),
    ("payment-transaction", "payment-tx"),
    ("application-transaction", "application-tx"),
];

/// A flat table of normalized transaction records.
///
/// Row count always equals the input record count. The column set is
/// the union of keys observed across all rows, fixed once normalization
/// completes and deterministically ordered.
#[derive(Debug, Default)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<RawTransaction>,
}

impl NormalizedTable {
    /// The table's column names, in their fixed order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The flattened rows.
    #[must_use]
    pub fn rows(&self) -> &[RawTransaction] {
        &self.rows
    }

    /// Row count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One column's value per row; `None` where a row has no value (the
    /// column belongs to a variant the row does not carry).
    pub fn column_values<'a>(
        &'a self,
        column: &'a str,
    ) -> impl Iterator<Item = Option<&'a Value>> {
        self.rows
            .iter()
            .map(move |row| row.get(column).filter(|v| !v.is_null()))
    }
}

/// Flatten raw records into a [`NormalizedTable`].
///
/// For each known variant, every field `f` of the nested sub-object
/// becomes a top-level `f-<suffix>` entry and the nested object is
/// removed. Rows are neither dropped nor merged.
#[must_use]
pub fn normalize(records: Vec<RawTransaction>) -> NormalizedTable {
    let mut rows = records;
    for row in &mut rows {
        for &(variant, suffix) in VARIANTS {
            let Some(nested) = row.remove(variant) else {
                continue;
            };
            let Value::Object(fields) = nested else {
                continue;
            };
            for (field, value) in fields {
                row.insert(format!("{field}-{suffix}"), value);
            }
        }
    }

    let columns: BTreeSet<String> = rows.iter().flat_map(|row| row.keys().cloned()).collect();
    NormalizedTable {
        columns: columns.into_iter().collect(),
        rows,
    }
}
