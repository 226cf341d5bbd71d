use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use crate::error::EngineError;

/// Append one record as a JSON line. The single write_all call is the
/// atomic append the stores rely on.
pub async fn append_line<T: Serialize>(path: &Path, record: &T) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| EngineError::new(
                format!("Failed to create data directory: {}", e),
                "io"
            ).with_context(format!("path: {:?}", parent)))?;
    }

    let mut line = serde_json::to_string(record)
        .map_err(|e| EngineError::new(
            format!("Failed to serialize record: {}", e),
            "json_serialize"
        ))?;
    line.push('\n');

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| EngineError::new(
            format!("Failed to open store file: {}", e),
            "io"
        ).with_context(format!("path: {:?}", path)))?;

    file.write_all(line.as_bytes())
        .await
        .map_err(|e| EngineError::new(
            format!("Failed to append record: {}", e),
            "io"
        ).with_context(format!("path: {:?}", path)))?;

    Ok(())
}

/// Load every record from a JSON-lines file in insertion order.
/// A missing file is an empty store; unparseable lines are skipped.
pub async fn load_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, EngineError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(EngineError::new(
                format!("Failed to read store file: {}", e),
                "io"
            ).with_context(format!("path: {:?}", path)));
        }
    };

    let mut records = Vec::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    path = ?path,
                    error = %e,
                    "Failed to parse store line, skipping"
                );
            }
        }
    }

    Ok(records)
}

/// Rewrite the whole file from the given records. Used only where a
/// record mutation is permitted (marking a notification read).
pub async fn write_all_lines<T: Serialize>(path: &Path, records: &[T]) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| EngineError::new(
                format!("Failed to create data directory: {}", e),
                "io"
            ).with_context(format!("path: {:?}", parent)))?;
    }

    let mut content = String::new();
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| EngineError::new(
                format!("Failed to serialize record: {}", e),
                "json_serialize"
            ))?;
        content.push_str(&line);
        content.push('\n');
    }

    tokio::fs::write(path, content)
        .await
        .map_err(|e| EngineError::new(
            format!("Failed to rewrite store file: {}", e),
            "io"
        ).with_context(format!("path: {:?}", path)))?;

    Ok(())
}
