//! Arrow conversion and Parquet output for normalized tables.
//!
//! The normalized column set is only known after observing the data, so
//! the Arrow schema is inferred per column: all-boolean and all-integer
//! columns get native types, everything else falls back to UTF-8 with
//! nested values rendered as JSON. Every column is nullable — a row
//! only carries the columns of its own transaction kind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{ArrayRef, BooleanArray, Int64Array, RecordBatch, StringArray, UInt64Array};
use arrow_schema::{DataType, Field, Schema};
use chrono::Utc;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde_json::Value;

use crate::normalize::NormalizedTable;

/// Convert a normalized table into a single columnar [`RecordBatch`].
///
/// # Errors
///
/// Returns an error if the Arrow batch construction fails.
pub fn table_to_batch(table: &NormalizedTable) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(table.columns().len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns().len());

    for column in table.columns() {
        let ty = infer_type(table.column_values(column));
        arrays.push(build_column(table, column, &ty));
        fields.push(Field::new(column.as_str(), ty, true));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .context("building transaction record batch")
}

/// Write the normalized table into `out_dir` as a timestamped,
/// Zstd-compressed Parquet file.
///
/// A missing output directory or an empty table skips the write with a
/// log line and returns `Ok(None)`.
///
/// # Errors
///
/// I/O or Parquet-writer failure while writing into an existing
/// directory.
pub fn export_table(table: &NormalizedTable, out_dir: &Path) -> Result<Option<PathBuf>> {
    if !out_dir.is_dir() {
        tracing::warn!(
            dir = %out_dir.display(),
            "output directory missing, skipping table file"
        );
        return Ok(None);
    }
    if table.is_empty() {
        tracing::info!("no transactions retrieved, skipping table file");
        return Ok(None);
    }

    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    let path = out_dir.join(format!("algorand-transactions-{stamp}.parquet"));
    write_table(table, &path)?;
    tracing::info!(path = %path.display(), rows = table.len(), "table written");
    Ok(Some(path))
}

/// Write the table to `path` atomically (temp file + rename).
///
/// # Errors
///
/// I/O failure or the Parquet writer rejecting the data.
pub fn write_table(table: &NormalizedTable, path: &Path) -> Result<()> {
    let batch = table_to_batch(table)?;

    let tmp = path.with_extension("parquet.tmp");
    let file =
        std::fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;

    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::ZSTD(
            parquet::basic::ZstdLevel::try_new(3).context("invalid zstd level")?,
        ))
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    std::fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} → {}", tmp.display(), path.display()))?;

    Ok(())
}

/// The Arrow type one value would map to on its own.
fn value_kind(value: &Value) -> DataType {
    match value {
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) if n.is_u64() => DataType::UInt64,
        Value::Number(n) if n.is_i64() => DataType::Int64,
        _ => DataType::Utf8,
    }
}

/// Infer a column type every non-null value fits.
///
/// Columns with mixed value kinds fall back to UTF-8 rather than lose
/// precision in a numeric cast; an all-null column is UTF-8 too.
fn infer_type<'a>(values: impl Iterator<Item = Option<&'a Value>>) -> DataType {
    let mut inferred: Option<DataType> = None;
    for value in values.flatten() {
        let kind = value_kind(value);
        match &inferred {
            None => inferred = Some(kind),
            Some(t) if *t == kind => {}
            Some(_) => return DataType::Utf8,
        }
    }
    inferred.unwrap_or(DataType::Utf8)
}

/// Build one column's array under the inferred type.
fn build_column(table: &NormalizedTable, column: &str, ty: &DataType) -> ArrayRef {
    let values = table.column_values(column);
    match ty {
        DataType::Boolean => Arc::new(
            values
                .map(|v| v.and_then(Value::as_bool))
                .collect::<BooleanArray>(),
        ),
        DataType::UInt64 => Arc::new(
            values
                .map(|v| v.and_then(Value::as_u64))
                .collect::<UInt64Array>(),
        ),
        DataType::Int64 => Arc::new(
            values
                .map(|v| v.and_then(Value::as_i64))
                .collect::<Int64Array>(),
        ),
        _ => Arc::new(
            values
                .map(|v| v.map(render_text))
                .collect::<StringArray>(),
        ),
    }
}

/// Render a value for a UTF-8 column: bare strings unquoted, everything
/// else (numbers in mixed columns, nested objects, arrays) as JSON.
fn render_text(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_owned)
}
