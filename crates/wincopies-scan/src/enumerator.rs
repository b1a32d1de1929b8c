//! Lazy single-pass path enumerator.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use wincopies_core::{EnumerationOrder, ProcessPath};

use crate::inode::InodeTracker;
use crate::warning::{ScanWarning, WarningKind};

/// Source of candidates for one scan pass.
enum ScanPass {
    /// The entries selected in the collection, relative to the base.
    Roots(std::vec::IntoIter<PathBuf>),
    /// The contents of one directory.
    Dir(fs::ReadDir),
}

enum Candidate {
    Root(PathBuf),
    Entry(io::Result<fs::DirEntry>),
}

impl ScanPass {
    fn next_candidate(&mut self) -> Option<Candidate> {
        match self {
            Self::Roots(roots) => roots.next().map(Candidate::Root),
            Self::Dir(entries) => entries.next().map(Candidate::Entry),
        }
    }
}

/// Lazy, single-pass sequence of the paths of a [`PathCollection`].
///
/// In [`EnumerationOrder::FilesThenDirectories`] mode every directory met
/// during a scan pass is deferred to a FIFO and files are yielded right away.
/// Once the pass is exhausted the next deferred directory is yielded and, when
/// recursive, scanned as the next pass. In [`EnumerationOrder::None`] mode
/// entries are yielded pre-order, depth first.
///
/// Either way a directory is always yielded before its contents.
///
/// Symbolic links are yielded as links unless links are followed. When they
/// are, each directory is entered once; a link leading back to a directory
/// already visited is yielded as a link and reported as a warning.
///
/// [`PathCollection`]: crate::PathCollection
pub struct PathEnumerator {
    base: PathBuf,
    order: EnumerationOrder,
    recursive: bool,
    follow_symlinks: bool,
    stack: Vec<ScanPass>,
    deferred: VecDeque<ProcessPath>,
    warnings: Vec<ScanWarning>,
    visited: InodeTracker,
}

impl PathEnumerator {
    pub(crate) fn new(
        base: PathBuf,
        entries: Vec<PathBuf>,
        order: EnumerationOrder,
        recursive: bool,
        follow_symlinks: bool,
    ) -> Self {
        let mut enumerator = Self {
            base,
            order,
            recursive,
            follow_symlinks,
            stack: Vec::new(),
            deferred: VecDeque::new(),
            warnings: Vec::new(),
            visited: InodeTracker::default(),
        };

        if follow_symlinks {
            if let Ok(metadata) = fs::metadata(&enumerator.base) {
                enumerator.visited.track(&metadata);
            }
        }

        if entries.is_empty() {
            let base = enumerator.base.clone();
            enumerator.open(&base);
        } else {
            enumerator.stack.push(ScanPass::Roots(entries.into_iter()));
        }

        enumerator
    }

    /// Warnings collected so far.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Take the warnings collected so far.
    pub fn take_warnings(&mut self) -> Vec<ScanWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Start a scan pass over a directory's contents.
    fn open(&mut self, dir: &Path) {
        match fs::read_dir(dir) {
            Ok(entries) => self.stack.push(ScanPass::Dir(entries)),
            Err(err) => {
                tracing::warn!(path = %dir.display(), error = %err, "skipping unreadable directory");
                self.warnings.push(ScanWarning::read_error(dir, &err));
            }
        }
    }

    fn metadata(&self, path: &Path) -> io::Result<fs::Metadata> {
        if self.follow_symlinks {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        }
    }

    fn relative_to_base(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.base)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.file_name().map(PathBuf::from).unwrap_or_default())
    }

    /// Classify an entry from its metadata, or `None` when it must be skipped.
    fn admit(
        &mut self,
        path: PathBuf,
        relative: PathBuf,
        metadata: &fs::Metadata,
    ) -> Option<ProcessPath> {
        if metadata.file_type().is_symlink() {
            return Some(ProcessPath::symlink(path, relative));
        }
        if !metadata.is_dir() {
            return Some(ProcessPath::file(path, relative, metadata.len()));
        }

        if self.follow_symlinks && !self.visited.track(metadata) {
            tracing::warn!(path = %path.display(), "directory already visited, not descending");
            self.warnings.push(ScanWarning::new(
                &path,
                "Directory already visited through a symbolic link",
                WarningKind::SymlinkCycle,
            ));
            let is_link = fs::symlink_metadata(&path).is_ok_and(|m| m.file_type().is_symlink());
            return is_link.then(|| ProcessPath::symlink(path, relative));
        }

        Some(ProcessPath::directory(path, relative))
    }

    /// Resolve a candidate into a path, or `None` when it must be skipped.
    fn resolve(&mut self, candidate: Candidate) -> Option<ProcessPath> {
        match candidate {
            Candidate::Root(relative) => {
                let path = self.base.join(&relative);
                match self.metadata(&path) {
                    Ok(metadata) => self.admit(path, relative, &metadata),
                    Err(err) => {
                        // Selected entries are kept so the failure reaches the error queue.
                        tracing::debug!(path = %path.display(), error = %err, "selected entry unreadable");
                        Some(ProcessPath::unknown(path, relative))
                    }
                }
            }
            Candidate::Entry(Err(err)) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                self.warnings
                    .push(ScanWarning::read_error(PathBuf::new(), &err));
                None
            }
            Candidate::Entry(Ok(entry)) => {
                let path = entry.path();
                match self.metadata(&path) {
                    Ok(metadata) => {
                        let relative = self.relative_to_base(&path);
                        self.admit(path, relative, &metadata)
                    }
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "skipping entry");
                        self.warnings.push(ScanWarning::metadata_error(&path, &err));
                        None
                    }
                }
            }
        }
    }
}


impl Iterator for PathEnumerator {
    type Item = ProcessPath;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(pass) = self.stack.last_mut() else {
                let dir = self.deferred.pop_front()?;
                if self.recursive {
                    self.open(&dir.path);
                }
                return Some(dir);
            };

            let Some(candidate) = pass.next_candidate() else {
                self.stack.pop();
                continue;
            };

            let Some(path) = self.resolve(candidate) else {
                continue;
            };

            if !path.is_directory {
                return Some(path);
            }

            match self.order {
                EnumerationOrder::FilesThenDirectories => self.deferred.push_back(path),
                EnumerationOrder::None => {
                    if self.recursive {
                        self.open(&path.path);
                    }
                    return Some(path);
                }
            }
        }
    }
}

impl FusedIterator for PathEnumerator {}
