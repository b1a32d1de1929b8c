use std::io;
use std::path::Path;

use strum::IntoEnumIterator;
use wincopies_core::{
    EnumerationOrder, ErrorKind, IoPhase, PendingAction, ProcessError, ProcessErrorItem,
    ProcessOptions, ProcessPath, ProcessStatus,
};

#[test]
fn test_process_path_constructors() {
    let file = ProcessPath::file("/src/a.txt", "a.txt", 10);
    assert!(!file.is_directory);
    assert_eq!(file.size, Some(10));
    assert_eq!(file.accounted_size(), 10);
    assert_eq!(file.as_path(), Path::new("/src/a.txt"));

    let unknown = ProcessPath::unknown("/src/missing", "missing");
    assert!(!unknown.is_directory);
    assert_eq!(unknown.accounted_size(), 0);
}

#[test]
fn test_error_item_starts_undecided() {
    let item = ProcessErrorItem::new(
        ProcessPath::file("/src/b.txt", "b.txt", 20),
        ErrorKind::ReadProtection,
        "denied",
    );
    assert_eq!(item.pending_action, PendingAction::None);

    let text = item.to_string();
    assert!(text.contains("/src/b.txt"));
    assert!(text.contains("read-protected"));
}

#[test]
fn test_every_error_kind_has_description() {
    for kind in ErrorKind::iter() {
        assert!(!kind.description().is_empty());
        let parsed: ErrorKind = kind.to_string().parse().unwrap();
        assert_eq!(parsed, kind);
    }
}

#[test]
fn test_classify_common_kinds() {
    let cases = [
        (io::ErrorKind::NotFound, ErrorKind::NotFound),
        (io::ErrorKind::AlreadyExists, ErrorKind::AlreadyExists),
        (io::ErrorKind::Interrupted, ErrorKind::CancelledByUser),
        (io::ErrorKind::InvalidData, ErrorKind::Unknown),
    ];

    for (io_kind, expected) in cases {
        let err = io::Error::new(io_kind, "test");
        assert_eq!(ErrorKind::classify(&err, IoPhase::Read), expected);
    }
}

#[test]
fn test_invalid_state_message() {
    let err = ProcessError::invalid_state("start", ProcessStatus::Running);
    assert_eq!(err.to_string(), "Cannot start a process that is running");
}

#[test]
fn test_status_transitions_allowed() {
    assert!(ProcessStatus::NotStarted.can_start());
    assert!(ProcessStatus::Paused.can_start());
    assert!(!ProcessStatus::Erred.can_start());
    assert!(!ProcessStatus::Running.can_start());

    assert!(ProcessStatus::Erred.can_resolve());
    assert!(!ProcessStatus::Running.can_resolve());

    assert!(ProcessStatus::Cancelled.is_terminal());
    assert!(!ProcessStatus::Paused.is_terminal());
}

#[test]
fn test_options_from_toml() {
    let options: ProcessOptions = toml::from_str(
        r#"
        order = "none"
        overwrite = true
        auto_ignore = ["already-exists", "not-found"]
        "#,
    )
    .unwrap();

    assert_eq!(options.order, EnumerationOrder::None);
    assert!(options.overwrite);
    assert!(options.preserve_timestamps);
    assert!(options.match_path_prefix);
    assert_eq!(
        options.auto_ignore,
        vec![ErrorKind::AlreadyExists, ErrorKind::NotFound]
    );
    assert_eq!(options.buffer_size, wincopies_core::DEFAULT_BUFFER_SIZE);
}

#[test]
fn test_options_from_empty_toml() {
    let options: ProcessOptions = toml::from_str("").unwrap();
    assert_eq!(options, ProcessOptions::default());
}
