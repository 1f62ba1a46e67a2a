//! Filesystem-backed content store.
//!
//! Text, file and notepad entries live as individual files inside their
//! category directory. Links live as newline-separated lines in a single
//! `links` file at the data root.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{entry_path, naming, Category, EntryId, StoreError};

/// Category-scoped create/read/list/rename/delete over one data root.
///
/// The store owns no timing state; expiration is tracked separately and only
/// calls back into [`ContentStore::delete`].
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Create a store rooted at `root` without touching the filesystem
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a store and ensure the category directories exist
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::new(root);
        for category in Category::ALL {
            if category.is_directory_backed() {
                fs::create_dir_all(store.category_dir(category)).await?;
            }
        }
        Ok(store)
    }

    /// The data root this store operates on
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a category's entries. For the links category this
    /// is the path of the shared list file instead.
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.as_str())
    }

    fn links_path(&self) -> PathBuf {
        self.root.join(Category::Links.as_str())
    }

    /// Store new content under a sanitized, collision-free name.
    ///
    /// Returns the identifier the entry ended up with, which may carry a
    /// numeric prefix when `requested_name` was already taken.
    pub async fn create(
        &self,
        category: Category,
        requested_name: &str,
        bytes: &[u8],
    ) -> Result<EntryId, StoreError> {
        if !category.is_directory_backed() {
            return Err(StoreError::Unsupported(category));
        }

        let dir = self.category_dir(category);
        fs::create_dir_all(&dir).await?;

        let name = naming::resolve(&dir, requested_name)?;
        fs::write(dir.join(&name), bytes).await?;

        Ok(EntryId::new(category, name))
    }

    /// Append a link to the shared list file
    pub async fn append_link(&self, value: &str) -> Result<EntryId, StoreError> {
        let line = value.trim();
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.links_path())
            .await?;
        file.write_all(format!("{}\n", line).as_bytes()).await?;
        file.flush().await?;

        Ok(EntryId::new(Category::Links, line))
    }

    /// Read an entry's bytes. For links this is the matching line itself.
    pub async fn read(&self, id: &EntryId) -> Result<Vec<u8>, StoreError> {
        if id.category == Category::Links {
            let links = self.list_links().await?;
            return links
                .into_iter()
                .find(|l| l == &id.name)
                .map(String::into_bytes)
                .ok_or_else(|| StoreError::NotFound(id.clone()));
        }

        match fs::read(entry_path(&self.root, id)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether an entry currently exists
    pub async fn exists(&self, id: &EntryId) -> Result<bool, StoreError> {
        if id.category == Category::Links {
            return Ok(self.list_links().await?.iter().any(|l| l == &id.name));
        }
        Ok(entry_path(&self.root, id).exists())
    }

    /// List entry names in a category. Sub-directories are skipped; the
    /// links category yields one name per line of the list file.
    pub async fn list(&self, category: Category) -> Result<Vec<String>, StoreError> {
        if category == Category::Links {
            return self.list_links().await;
        }

        let dir = self.category_dir(category);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();

        Ok(names)
    }

    async fn list_links(&self) -> Result<Vec<String>, StoreError> {
        let path = self.links_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    /// Rename an entry within its category, resolving collisions on the new
    /// name. Links cannot be renamed.
    pub async fn rename(
        &self,
        id: &EntryId,
        requested_name: &str,
    ) -> Result<EntryId, StoreError> {
        if !id.category.is_directory_backed() {
            return Err(StoreError::Unsupported(id.category));
        }

        let old_path = entry_path(&self.root, id);
        if !old_path.exists() {
            return Err(StoreError::NotFound(id.clone()));
        }

        let dir = self.category_dir(id.category);
        let new_name = naming::resolve(&dir, requested_name)?;
        fs::rename(&old_path, dir.join(&new_name)).await?;

        Ok(EntryId::new(id.category, new_name))
    }

    /// Delete an entry. Returns [`StoreError::NotFound`] when the entry does
    /// not exist; callers on bookkeeping paths (the sweep) treat that as
    /// success.
    pub async fn delete(&self, id: &EntryId) -> Result<(), StoreError> {
        if id.category == Category::Links {
            return self.delete_link(&id.name).await;
        }

        match fs::remove_file(entry_path(&self.root, id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the first line matching `value` from the links file
    async fn delete_link(&self, value: &str) -> Result<(), StoreError> {
        let links = self.list_links().await?;

        let Some(pos) = links.iter().position(|l| l == value) else {
            return Err(StoreError::NotFound(EntryId::new(Category::Links, value)));
        };

        let mut remaining = links;
        remaining.remove(pos);

        let mut content = remaining.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(self.links_path(), content).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store() -> (ContentStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = ContentStore::open(temp.path()).await.unwrap();
        (store, temp)
    }

    #[tokio::test]
    async fn test_create_read_delete() {
        let (store, _temp) = open_store().await;

        let id = store
            .create(Category::Text, "notes.md", b"hello")
            .await
            .unwrap();
        assert_eq!(id.key(), "text/notes.md");
        assert_eq!(store.read(&id).await.unwrap(), b"hello");

        store.delete(&id).await.unwrap();
        assert!(matches!(
            store.read(&id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (store, _temp) = open_store().await;
        let id = EntryId::new(Category::Files, "ghost.bin");
        assert!(matches!(
            store.delete(&id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_resolves_collision() {
        let (store, _temp) = open_store().await;

        let first = store
            .create(Category::Files, "report.txt", b"one")
            .await
            .unwrap();
        let second = store
            .create(Category::Files, "report.txt", b"two")
            .await
            .unwrap();

        assert_eq!(first.name, "report.txt");
        assert_ne!(second.name, first.name);
        assert!(second.name.ends_with("-report.txt"));
        assert_eq!(store.read(&second).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_list_skips_subdirectories() {
        let (store, temp) = open_store().await;

        store.create(Category::Text, "a.txt", b"a").await.unwrap();
        store.create(Category::Text, "b.txt", b"b").await.unwrap();
        std::fs::create_dir(temp.path().join("text").join("subdir")).unwrap();

        let names = store.list(Category::Text).await.unwrap();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_links_append_list_delete() {
        let (store, _temp) = open_store().await;

        store.append_link("https://example.com/a").await.unwrap();
        store.append_link("https://example.com/b").await.unwrap();
        store.append_link("https://example.com/a").await.unwrap();

        let links = store.list(Category::Links).await.unwrap();
        assert_eq!(links.len(), 3);

        // Delete removes only the first matching line
        let id = EntryId::new(Category::Links, "https://example.com/a");
        store.delete(&id).await.unwrap();

        let links = store.list(Category::Links).await.unwrap();
        assert_eq!(
            links,
            vec!["https://example.com/b", "https://example.com/a"]
        );
    }

    #[tokio::test]
    async fn test_rename_keeps_content() {
        let (store, _temp) = open_store().await;

        let id = store
            .create(Category::Text, "draft.md", b"work in progress")
            .await
            .unwrap();
        let renamed = store.rename(&id, "final.md").await.unwrap();

        assert_eq!(renamed.name, "final.md");
        assert_eq!(store.read(&renamed).await.unwrap(), b"work in progress");
        assert!(!store.exists(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_rename_links_unsupported() {
        let (store, _temp) = open_store().await;
        let id = EntryId::new(Category::Links, "https://example.com");
        assert!(matches!(
            store.rename(&id, "new").await,
            Err(StoreError::Unsupported(Category::Links))
        ));
    }
}
