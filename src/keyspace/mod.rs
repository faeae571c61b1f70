//! Keyspace browsing for ferrite-lens.
//!
//! Bounded cursor scans, namespace grouping, the browse session state machine
//! and single-key inspection.

pub mod browser;
pub mod grouper;
pub mod inspect;
pub mod pattern;
pub mod scanner;

pub use browser::{BrowseState, KeyBrowser};
pub use grouper::{group_keys, KeyNode, KeyRecord, NamespaceGroup};
pub use inspect::{inspect_key, InspectedValue, KeyInspection};
pub use scanner::{scan_bounded, scan_keys, ScanResult, DEFAULT_BATCH_SIZE};
