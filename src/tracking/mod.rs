//! Visit classification and deduplicated visit counters
//!
//! Unique visitors are counted once per device (first visit), page views on
//! every load, and per-visitor records only on a first visit or a new
//! session.

pub mod classifier;
pub mod counters;
pub mod tracker;

pub use classifier::VisitClassifier;
pub use counters::CounterService;
pub use tracker::VisitTracker;
