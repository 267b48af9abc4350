use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use conversy::clock::SystemClock;
use conversy::config::Config;
use conversy::identity::{EnvironmentFingerprinter, FileLocalStore, StorageKeys, VisitorIdResolver};
use conversy::models::{ClientEnvironment, ManualStatsUpdate};
use conversy::services::{StatsService, TestimonialService, WaitlistService};
use conversy::store;
use conversy::tracking::{CounterService, VisitClassifier, VisitTracker};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "conversy-admin")]
#[command(about = "Conversy landing page admin CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or overwrite the aggregate counters
    Stats {
        #[command(subcommand)]
        action: StatsCommands,
    },
    /// Inspect waitlist signups
    Waitlist {
        #[command(subcommand)]
        action: WaitlistCommands,
    },
    /// Manage testimonials
    Testimonials {
        #[command(subcommand)]
        action: TestimonialCommands,
    },
    /// Track a page visit from this machine
    Visit {
        /// File holding this device's visitor state
        #[arg(long, default_value = ".conversy-visitor.json")]
        state_file: PathBuf,
        /// Forget the cached visitor before tracking
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
enum StatsCommands {
    Show,
    /// Set manually tracked counters
    Set {
        #[arg(long)]
        linkedin_followers: Option<i64>,
        #[arg(long)]
        linkedin_page_views: Option<i64>,
        #[arg(long)]
        product_interest: Option<i64>,
    },
}

#[derive(Subcommand)]
enum WaitlistCommands {
    List,
}

#[derive(Subcommand)]
enum TestimonialCommands {
    List {
        /// 0 lists everything
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
    Delete {
        id: String,
    },
}

fn format_millis(millis: Option<i64>) -> String {
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Admin commands want a hard failure when the backend is down
    let store = store::connect(&config.database).await?;
    let counters = Arc::new(CounterService::new(
        Arc::clone(&store),
        config.stats.seed.clone(),
    ));

    match cli.command {
        Commands::Stats { action } => {
            let stats = StatsService::new(Arc::clone(&store), config.stats.display_defaults.clone());
            match action {
                StatsCommands::Show => {
                    let current = stats.get_stats().await;
                    println!("{:<22} {}", "Unique visitors", current.unique_visitors);
                    println!("{:<22} {}", "Total page views", current.total_page_views);
                    println!("{:<22} {}", "Waitlist", current.waitlist_count);
                    println!("{:<22} {}", "LinkedIn followers", current.linkedin_followers);
                    println!("{:<22} {}", "LinkedIn page views", current.linkedin_page_views);
                    println!("{:<22} {}", "Product interest", current.product_interest);
                    println!("{:<22} {}", "Last updated", format_millis(current.last_updated));
                }
                StatsCommands::Set {
                    linkedin_followers,
                    linkedin_page_views,
                    product_interest,
                } => {
                    let update = ManualStatsUpdate {
                        linkedin_followers,
                        linkedin_page_views,
                        product_interest,
                    };
                    if update.provided().is_empty() {
                        bail!("nothing to update; pass at least one counter");
                    }
                    stats
                        .try_update(&update)
                        .await
                        .context("failed to update stats")?;
                    println!("✓ Updated {} counter(s)", update.provided().len());
                }
            }
        }
        Commands::Waitlist {
            action: WaitlistCommands::List,
        } => {
            let waitlist = WaitlistService::new(Arc::clone(&store), Arc::clone(&counters));
            let entries = waitlist.try_list().await.context("failed to list waitlist")?;
            if entries.is_empty() {
                println!("Waitlist is empty.");
            } else {
                println!("{:<40} {:<24} {:<20} {}", "Email", "Name", "Joined", "Status");
                println!("{}", "-".repeat(96));
                for entry in &entries {
                    println!(
                        "{:<40} {:<24} {:<20} {}",
                        entry.email,
                        entry.name,
                        format_millis(entry.timestamp),
                        entry.status
                    );
                }
                println!("{} signup(s)", entries.len());
            }
        }
        Commands::Testimonials { action } => {
            let testimonials = TestimonialService::new(Arc::clone(&store));
            match action {
                TestimonialCommands::List { limit } => {
                    let items = testimonials
                        .try_list(limit)
                        .await
                        .context("failed to list testimonials")?;
                    if items.is_empty() {
                        println!("No testimonials found.");
                    }
                    for t in items {
                        println!("[{}] {} ({}) {}★", t.id, t.name, t.role, t.rating);
                        println!("    {}", t.content);
                    }
                }
                TestimonialCommands::Delete { id } => {
                    testimonials
                        .try_delete(&id)
                        .await
                        .with_context(|| format!("failed to delete testimonial '{}'", id))?;
                    println!("✓ Deleted testimonial '{}'", id);
                }
            }
        }
        Commands::Visit { state_file, reset } => {
            let local = Arc::new(FileLocalStore::open(&state_file)?);
            let keys = StorageKeys::new(&config.tracking.storage_prefix);
            let environment = ClientEnvironment::detect();
            let clock = Arc::new(SystemClock);

            let resolver = VisitorIdResolver::new(
                local.clone(),
                Arc::new(EnvironmentFingerprinter::new(environment.clone())),
                clock.clone(),
                keys.clone(),
            );
            let classifier = VisitClassifier::new(
                local.clone(),
                keys,
                config.tracking.session_idle_millis(),
            );
            if reset {
                classifier.clear_visitor_data()?;
            }

            let tracker = VisitTracker::new(resolver, classifier, counters, clock, environment);
            let Some(summary) = tracker.track_visitor().await else {
                bail!("could not update visitor state in {}", local.path().display());
            };

            println!("Visitor        {}", summary.visitor_id);
            println!("First visit    {}", summary.is_first_visit);
            println!("New session    {}", summary.is_new_session);
            println!("Visit count    {}", summary.visit_count);
        }
    }

    Ok(())
}
