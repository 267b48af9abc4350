use crate::models::{AggregateStats, Testimonial, WaitlistEntry};
use crate::services::{StatsService, TestimonialService, WaitlistService};
use serde::Serialize;

/// Testimonials shown on the admin dashboard
pub const DASHBOARD_TESTIMONIAL_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: AggregateStats,
    pub waitlist: Vec<WaitlistEntry>,
    pub testimonials: Vec<Testimonial>,
}

/// Fetch the three admin views concurrently. Each part falls back on its own
/// failure default, so one failing read does not hide the others.
pub async fn load_dashboard(
    stats: &StatsService,
    waitlist: &WaitlistService,
    testimonials: &TestimonialService,
) -> Dashboard {
    let (stats, waitlist, testimonials) = tokio::join!(
        stats.get_stats(),
        waitlist.list_waitlist(),
        testimonials.get_testimonials(DASHBOARD_TESTIMONIAL_LIMIT),
    );

    Dashboard {
        stats,
        waitlist,
        testimonials,
    }
}
