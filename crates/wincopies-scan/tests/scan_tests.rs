use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use wincopies_scan::{EnumerationOrder, PathCollection, ProcessPath};

/// Build a small tree:
///
/// ```text
/// root/a.txt (1)   root/b.txt (2)
/// root/d1/c.txt (3)   root/d1/d3/e.txt (4)
/// root/d2/f.txt (5)
/// ```
fn fixture() -> TempDir {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    fs::write(root.join("a.txt"), b"a").unwrap();
    fs::write(root.join("b.txt"), b"bb").unwrap();
    fs::create_dir_all(root.join("d1/d3")).unwrap();
    fs::write(root.join("d1/c.txt"), b"ccc").unwrap();
    fs::write(root.join("d1/d3/e.txt"), b"eeee").unwrap();
    fs::create_dir(root.join("d2")).unwrap();
    fs::write(root.join("d2/f.txt"), b"fffff").unwrap();
    temp
}

fn relative_names(paths: &[ProcessPath]) -> Vec<PathBuf> {
    paths.iter().map(|p| p.relative.clone()).collect()
}

fn position(paths: &[ProcessPath], relative: &str) -> usize {
    paths
        .iter()
        .position(|p| p.relative == Path::new(relative))
        .unwrap_or_else(|| panic!("{relative} not enumerated"))
}

#[test]
fn test_files_then_directories_yields_files_first_per_pass() {
    let temp = fixture();
    let collection = PathCollection::new(temp.path());
    let paths: Vec<_> = collection
        .enumerate(EnumerationOrder::FilesThenDirectories, true)
        .collect();

    assert_eq!(paths.len(), 8, "{:?}", relative_names(&paths));

    for dir in paths.iter().filter(|p| p.is_directory) {
        let dir_index = position(&paths, dir.relative.to_str().unwrap());
        let siblings = paths
            .iter()
            .filter(|p| !p.is_directory && p.path.parent() == dir.path.parent());
        for file in siblings {
            assert!(
                position(&paths, file.relative.to_str().unwrap()) < dir_index,
                "{} yielded after {}",
                file.relative.display(),
                dir.relative.display()
            );
        }
    }

    // All files of the base pass come before any directory at all.
    let first_dir = paths.iter().position(|p| p.is_directory).unwrap();
    assert!(position(&paths, "a.txt") < first_dir);
    assert!(position(&paths, "b.txt") < first_dir);
}

#[test]
fn test_directories_precede_their_contents() {
    let temp = fixture();
    let collection = PathCollection::new(temp.path());

    for order in [EnumerationOrder::None, EnumerationOrder::FilesThenDirectories] {
        let paths: Vec<_> = collection.enumerate(order, true).collect();
        assert_eq!(paths.len(), 8);

        for path in &paths {
            let parent = path.relative.parent().unwrap();
            if parent.as_os_str().is_empty() {
                continue;
            }
            assert!(
                position(&paths, parent.to_str().unwrap())
                    < position(&paths, path.relative.to_str().unwrap())
            );
        }
    }
}

#[test]
fn test_none_order_is_depth_first() {
    let temp = fixture();
    let collection = PathCollection::new(temp.path());
    let paths: Vec<_> = collection.enumerate(EnumerationOrder::None, true).collect();

    // Everything under d1 is contiguous right after d1 itself.
    let d1 = position(&paths, "d1");
    let block: Vec<_> = paths[d1 + 1..d1 + 4]
        .iter()
        .map(|p| p.relative.clone())
        .collect();
    for expected in ["d1/c.txt", "d1/d3", "d1/d3/e.txt"] {
        assert!(block.contains(&PathBuf::from(expected)), "{block:?}");
    }
}

#[test]
fn test_non_recursive_enumeration() {
    let temp = fixture();
    let collection = PathCollection::new(temp.path());
    let paths: Vec<_> = collection
        .enumerate(EnumerationOrder::FilesThenDirectories, false)
        .collect();

    assert_eq!(paths.len(), 4);
    assert!(!paths[0].is_directory);
    assert!(!paths[1].is_directory);
    assert!(paths[2].is_directory);
    assert!(paths[3].is_directory);
}

#[test]
fn test_selected_entries_only() {
    let temp = fixture();
    let collection =
        PathCollection::from_sources([temp.path().join("d2"), temp.path().join("a.txt")]).unwrap();
    let paths: Vec<_> = collection
        .enumerate(EnumerationOrder::FilesThenDirectories, true)
        .collect();

    assert_eq!(
        relative_names(&paths),
        vec![
            PathBuf::from("a.txt"),
            PathBuf::from("d2"),
            PathBuf::from("d2/f.txt"),
        ]
    );
    assert_eq!(paths[0].size, Some(1));
    assert_eq!(paths[1].size, None);
    assert_eq!(paths[2].size, Some(5));
}

#[test]
fn test_enumerator_is_fused() {
    let temp = fixture();
    let collection = PathCollection::from_sources([temp.path().join("a.txt")]).unwrap();
    let mut enumerator = collection.enumerate(EnumerationOrder::None, true);

    assert!(enumerator.next().is_some());
    assert!(enumerator.next().is_none());
    assert!(enumerator.next().is_none());
    assert!(enumerator.warnings().is_empty());
}

#[test]
fn test_estimate_size() {
    let temp = fixture();
    let collection = PathCollection::new(temp.path());
    let estimate = collection.estimate_size(false);

    assert_eq!(estimate.files, 5);
    assert_eq!(estimate.bytes, 15);
    // Base plus d1, d3, d2.
    assert_eq!(estimate.directories, 4);
    assert_eq!(estimate.skipped, 0);
    assert_eq!(estimate.items(), 9);
}

#[test]
fn test_estimate_size_counts_missing_roots_as_skipped() {
    let temp = fixture();
    let collection =
        PathCollection::from_sources([temp.path().join("a.txt"), temp.path().join("gone")])
            .unwrap();
    let estimate = collection.estimate_size(false);

    assert_eq!(estimate.files, 1);
    assert_eq!(estimate.bytes, 1);
    assert_eq!(estimate.skipped, 1);
}
