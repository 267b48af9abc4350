pub mod dashboard;
pub mod stats;
pub mod testimonials;
pub mod waitlist;

pub use dashboard::{load_dashboard, Dashboard};
pub use stats::StatsService;
pub use testimonials::TestimonialService;
pub use waitlist::{normalize_email, WaitlistService};

use crate::config::StatsConfig;
use crate::store::DocumentStore;
use crate::tracking::CounterService;
use std::sync::Arc;

/// All store-backed services sharing one document store
pub struct Services {
    pub counters: Arc<CounterService>,
    pub stats: StatsService,
    pub waitlist: WaitlistService,
    pub testimonials: TestimonialService,
}

impl Services {
    pub fn new(store: Arc<dyn DocumentStore>, stats_config: &StatsConfig) -> Self {
        let counters = Arc::new(CounterService::new(
            Arc::clone(&store),
            stats_config.seed.clone(),
        ));

        Self {
            stats: StatsService::new(Arc::clone(&store), stats_config.display_defaults.clone()),
            waitlist: WaitlistService::new(Arc::clone(&store), Arc::clone(&counters)),
            testimonials: TestimonialService::new(store),
            counters,
        }
    }

    pub async fn load_dashboard(&self) -> Dashboard {
        load_dashboard(&self.stats, &self.waitlist, &self.testimonials).await
    }
}
