//! MIME table definitions and the additions merge.

use serde::{Deserialize, Serialize};

/// A single MIME type record as found in the bundled JSON list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MimeType {
    /// Content type, e.g. `text/css`.
    #[serde(rename = "type")]
    pub mime_type: String,

    /// Human readable name.
    #[serde(default)]
    pub name: String,

    /// File extensions without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl MimeType {
    pub fn new(mime_type: impl Into<String>, name: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            mime_type: mime_type.into(),
            name: name.into(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Returns true if `extension` is listed for this type. Case-sensitive.
    pub fn has_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }
}

/// The effective MIME table used by the static resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeTable {
    entries: Vec<MimeType>,
}

impl MimeTable {
    pub fn new(entries: Vec<MimeType>) -> Self {
        Self { entries }
    }

    /// Merge developer additions into `base`.
    ///
    /// For every base entry, the extensions of each addition with the same
    /// `type` are appended in order. Additions with no matching base entry
    /// do not appear in the result.
    pub fn merge(base: Vec<MimeType>, additions: &[MimeType]) -> Self {
        for addition in additions {
            if !base.iter().any(|b| b.mime_type == addition.mime_type) {
                tracing::debug!(
                    mime_type = %addition.mime_type,
                    "Dropping MIME addition with no matching base type"
                );
            }
        }

        let entries = base
            .into_iter()
            .map(|mut entry| {
                for addition in additions.iter().filter(|a| a.mime_type == entry.mime_type) {
                    entry.extensions.extend(addition.extensions.iter().cloned());
                }
                entry
            })
            .collect();

        Self { entries }
    }

    /// Find the first entry whose extension set contains `extension`.
    pub fn lookup(&self, extension: &str) -> Option<&MimeType> {
        self.entries.iter().find(|m| m.has_extension(extension))
    }

    /// Find an entry by its content type.
    pub fn get(&self, mime_type: &str) -> Option<&MimeType> {
        self.entries.iter().find(|m| m.mime_type == mime_type)
    }

    pub fn entries(&self) -> &[MimeType] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
