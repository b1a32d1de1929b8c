//! Path collections: a base directory and the entries selected in it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wincopies_core::{EnumerationOrder, ProcessError};

use crate::enumerator::PathEnumerator;
use crate::size::{estimate, SizeEstimate};

/// A base directory plus the entries selected in it.
///
/// Entries are stored relative to the base. A collection without entries
/// stands for the whole contents of the base directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCollection {
    base: PathBuf,
    entries: Vec<PathBuf>,
}

impl PathCollection {
    /// Create a collection covering the contents of `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            entries: Vec::new(),
        }
    }

    /// Build a collection from rooted paths sharing one parent directory.
    pub fn from_sources<I, P>(sources: I) -> Result<Self, ProcessError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut collection: Option<Self> = None;

        for source in sources {
            let source = source.as_ref();
            let (parent, name) = match (source.parent(), source.file_name()) {
                (Some(parent), Some(name)) => (parent, name),
                _ => {
                    return Err(ProcessError::MixedParents {
                        path: source.to_path_buf(),
                    });
                }
            };

            let existing = collection.get_or_insert_with(|| Self::new(parent));
            if existing.base.as_path() != parent {
                return Err(ProcessError::MixedParents {
                    path: source.to_path_buf(),
                });
            }
            existing.push(name);
        }

        collection.ok_or(ProcessError::EmptySource)
    }

    /// Add an entry, relative to the base.
    pub fn push(&mut self, relative: impl Into<PathBuf>) {
        self.entries.push(relative.into());
    }

    /// The base directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Selected entries, relative to the base.
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Rooted paths of the selected entries, or the base itself when none.
    pub fn roots(&self) -> Vec<PathBuf> {
        if self.entries.is_empty() {
            vec![self.base.clone()]
        } else {
            self.entries.iter().map(|e| self.base.join(e)).collect()
        }
    }

    /// Whether the collection selects nothing but the base contents.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of selected entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Enumerate the collection lazily.
    pub fn enumerate(&self, order: EnumerationOrder, recursive: bool) -> PathEnumerator {
        self.enumerate_with(order, recursive, false)
    }

    /// Enumerate the collection lazily, optionally following symlinks.
    pub fn enumerate_with(
        &self,
        order: EnumerationOrder,
        recursive: bool,
        follow_symlinks: bool,
    ) -> PathEnumerator {
        PathEnumerator::new(
            self.base.clone(),
            self.entries.clone(),
            order,
            recursive,
            follow_symlinks,
        )
    }

    /// Estimate the number of items and bytes under the collection.
    pub fn estimate_size(&self, follow_symlinks: bool) -> SizeEstimate {
        estimate(&self.roots(), follow_symlinks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sources_shared_parent() {
        let collection =
            PathCollection::from_sources(["/data/a.txt", "/data/photos"]).unwrap();
        assert_eq!(collection.base(), Path::new("/data"));
        assert_eq!(
            collection.entries(),
            &[PathBuf::from("a.txt"), PathBuf::from("photos")]
        );
        assert_eq!(
            collection.roots(),
            vec![PathBuf::from("/data/a.txt"), PathBuf::from("/data/photos")]
        );
    }

    #[test]
    fn test_from_sources_mixed_parents() {
        let result = PathCollection::from_sources(["/data/a.txt", "/other/b.txt"]);
        assert!(matches!(result, Err(ProcessError::MixedParents { .. })));
    }

    #[test]
    fn test_from_sources_empty() {
        let result = PathCollection::from_sources(Vec::<PathBuf>::new());
        assert!(matches!(result, Err(ProcessError::EmptySource)));
    }

    #[test]
    fn test_whole_directory_roots() {
        let collection = PathCollection::new("/data");
        assert!(collection.is_empty());
        assert_eq!(collection.roots(), vec![PathBuf::from("/data")]);
    }
}
