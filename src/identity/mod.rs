//! Anonymous visitor identity
//!
//! A visitor is one browser or device. Its id comes from a fingerprint when
//! one can be computed and from a time-plus-random fallback otherwise, and is
//! cached in device-local storage so it stays stable across visits.

pub mod fingerprint;
pub mod local;
pub mod resolver;

pub use fingerprint::{
    EnvironmentFingerprinter, FailingFingerprinter, Fingerprint, FingerprintAgent, Fingerprinter,
    StaticFingerprinter,
};
pub use local::{FileLocalStore, LocalStore, MemoryLocalStore, StorageKeys};
pub use resolver::{fallback_visitor_id, VisitorIdResolver};
