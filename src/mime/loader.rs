//! Loading the base MIME list.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::mime::table::MimeType;

const BUNDLED_MIME_TYPES: &str = include_str!("../../assets/mime-types.json");

/// Errors raised while reading a MIME list.
#[derive(Debug, Error)]
pub enum MimeError {
    #[error("failed to read MIME list {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid MIME list {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The MIME list compiled into the binary.
pub fn bundled() -> Result<Vec<MimeType>, MimeError> {
    parse(BUNDLED_MIME_TYPES, "<bundled>")
}

/// Read a JSON array of `{type, name, extensions}` records from disk.
pub fn load_file(path: &Path) -> Result<Vec<MimeType>, MimeError> {
    let content = fs::read_to_string(path).map_err(|source| MimeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content, &path.display().to_string())
}

/// Base table: the override file when configured, else the bundled list.
pub fn load_base_table(override_file: Option<&Path>) -> Result<Vec<MimeType>, MimeError> {
    match override_file {
        Some(path) => {
            let entries = load_file(path)?;
            tracing::info!(path = %path.display(), entries = entries.len(), "Loaded MIME list");
            Ok(entries)
        }
        None => bundled(),
    }
}

fn parse(content: &str, origin: &str) -> Result<Vec<MimeType>, MimeError> {
    serde_json::from_str(content).map_err(|source| MimeError::Parse {
        origin: origin.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::MimeTable;
    use std::io::Write;

    #[test]
    fn test_bundled_list_parses() {
        let table = MimeTable::new(bundled().unwrap());
        assert_eq!(table.lookup("html").unwrap().mime_type, "text/html");
        assert_eq!(table.lookup("css").unwrap().mime_type, "text/css");
        assert_eq!(table.lookup("js").unwrap().mime_type, "application/javascript");
    }

    #[test]
    fn test_load_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"type": "text/x-only", "name": "Only", "extensions": ["only"]}}]"#
        )
        .unwrap();

        let entries = load_base_table(Some(file.path())).unwrap();
        assert_eq!(entries, vec![MimeType::new("text/x-only", "Only", &["only"])]);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, MimeError::Io { .. }));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = parse("{not json", "inline").unwrap_err();
        assert!(matches!(err, MimeError::Parse { .. }));
        assert!(err.to_string().contains("inline"));
    }
}
