pub mod outcome;
pub mod stats;
pub mod testimonial;
pub mod visitor;
pub mod waitlist;

pub use outcome::OperationResult;
pub use stats::{AggregateStats, ManualStatsUpdate};
pub use testimonial::{Testimonial, TestimonialInput};
pub use visitor::{
    ClientEnvironment, LocalVisitState, LocalVisitorStats, VisitSummary, VisitorIdentity,
    VisitorRecord,
};
pub use waitlist::{WaitlistEntry, WaitlistRequest};
