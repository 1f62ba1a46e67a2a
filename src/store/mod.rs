//! Content storage: categories, entry identity, and filesystem operations.
//!
//! Every entry is addressed by a `category/name` identifier. Text, file and
//! notepad entries are one filesystem object each inside their category
//! directory; links are newline-separated lines in a single shared file.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod content;
pub mod naming;

pub use content::ContentStore;

/// Errors from content store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Entry not found: {0}")]
    NotFound(EntryId),

    #[error("Invalid entry identifier: {0}")]
    InvalidId(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Operation not supported for the {0} category")]
    Unsupported(Category),

    #[error("No free name available for: {0}")]
    NameSpaceExhausted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Content category an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Text snippets, one file per entry
    Text,

    /// Uploaded files, one file per entry
    Files,

    /// Links, one line per entry in a shared list file
    Links,

    /// Notepad pages, one file per page
    Notepad,
}

impl Category {
    /// All categories, in listing order
    pub const ALL: [Category; 4] = [
        Category::Text,
        Category::Files,
        Category::Links,
        Category::Notepad,
    ];

    /// The directory (or file, for links) name under the data root
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Text => "text",
            Category::Files => "files",
            Category::Links => "links",
            Category::Notepad => "notepad",
        }
    }

    /// Whether entries of this category are standalone filesystem objects
    pub fn is_directory_backed(&self) -> bool {
        !matches!(self, Category::Links)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Category::Text),
            "files" | "file" => Ok(Category::Files),
            "links" | "link" => Ok(Category::Links),
            "notepad" => Ok(Category::Notepad),
            _ => Err(StoreError::UnknownCategory(s.to_string())),
        }
    }
}

/// Identifier of a single entry: `category/name`.
///
/// The string form doubles as the entry's path relative to the data root and
/// as the key in the persisted expiration map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryId {
    pub category: Category,
    pub name: String,
}

impl EntryId {
    pub fn new(category: Category, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
        }
    }

    /// The canonical `category/name` key
    pub fn key(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

impl FromStr for EntryId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, StoreError> {
        let (category, name) = s
            .split_once('/')
            .ok_or_else(|| StoreError::InvalidId(s.to_string()))?;
        if name.is_empty() {
            return Err(StoreError::InvalidId(s.to_string()));
        }
        let category: Category = category.parse()?;

        // Directory-backed names resolve to paths under the category
        // directory; the sanitizer never emits separators or dot names, so
        // anything that could climb out of it is not a valid identifier.
        // Links are lines in the shared list file and may contain slashes.
        if category.is_directory_backed()
            && (name.contains('/') || name == "." || name == "..")
        {
            return Err(StoreError::InvalidId(s.to_string()));
        }

        Ok(Self {
            category,
            name: name.to_string(),
        })
    }
}

/// One row of a category listing
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// The entry's identifier
    pub id: EntryId,

    /// Deadline after which the entry is purged, if one is set
    pub expires_at: Option<DateTime<Utc>>,
}

/// The on-disk location of an entry relative to a data root
pub(crate) fn entry_path(root: &std::path::Path, id: &EntryId) -> PathBuf {
    root.join(id.category.as_str()).join(&id.name)
}
