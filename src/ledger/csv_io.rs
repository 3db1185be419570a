// =============================================================================
// CSV persistence helpers — atomic tmp+rename rewrite, shared by registry
// and per-investor logs (§4.8A).
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Read all rows of a CSV file. Returns an empty vec if the file does not
/// exist (the caller decides whether that warrants a warning).
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open CSV at {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: T = record.with_context(|| format!("failed to parse row in {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Overwrite a CSV file with `rows`, atomically (write to a `.tmp` sibling,
/// then rename). Creates parent directories as needed.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }

    let tmp_path = tmp_sibling(path);
    {
        let mut writer = csv::Writer::from_path(&tmp_path)
            .with_context(|| format!("failed to open tmp CSV at {}", tmp_path.display()))?;
        for row in rows {
            writer
                .serialize(row)
                .with_context(|| format!("failed to serialise row into {}", tmp_path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to flush {}", tmp_path.display()))?;
    }

    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename tmp CSV into {}", path.display()))?;

    Ok(())
}

/// Append a single row to a CSV file without rewriting the rest, creating
/// the file (with header) if absent. Used for the append-only operations
/// and trades logs, where only new rows are ever added in the append path
/// (rewrites happen separately, via `write_rows`, for `process_pending`).
pub fn append_row<T: Serialize>(path: &Path, row: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }

    let needs_header = !path.exists();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open {} for append", path.display()))?,
        );

    writer
        .serialize(row)
        .with_context(|| format!("failed to append row to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ledger".to_string());
    name.push_str(".tmp");
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        name: String,
        amount: f64,
    }

    #[test]
    fn read_rows_returns_empty_when_file_absent() {
        let dir = TempDir::new().unwrap();
        let rows: Vec<Row> = read_rows(&dir.path().join("missing.csv")).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.csv");
        let rows = vec![
            Row { name: "Cherry".to_string(), amount: 100.0 },
            Row { name: "Alex".to_string(), amount: 200.0 },
        ];
        write_rows(&path, &rows).unwrap();
        let read_back: Vec<Row> = read_rows(&path).unwrap();
        assert_eq!(read_back, rows);
    }

    #[test]
    fn append_row_creates_header_once_then_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("appended.csv");
        append_row(&path, &Row { name: "A".to_string(), amount: 1.0 }).unwrap();
        append_row(&path, &Row { name: "B".to_string(), amount: 2.0 }).unwrap();

        let rows: Vec<Row> = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "B");
    }
}
