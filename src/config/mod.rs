use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_server: ServerConfig,
    pub auth: AuthConfig,
    pub cache: CacheConfig,
    pub tracking: TrackingConfig,
    pub stats: StatsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Memory,
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub enabled: bool,
    /// Keys accepted in the `X-API-Key` header on admin routes
    #[serde(default)]
    pub api_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum cached document reads
    pub max_entries: u64,
    /// Seconds a cached read stays valid
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Inactivity after which the next visit opens a new session
    pub session_idle_minutes: i64,
    /// Prefix for local storage keys
    pub storage_prefix: String,
}

/// Product-configured values for the manually tracked counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSeed {
    pub linkedin_followers: i64,
    pub waitlist_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Written when the aggregate document is created by the first visit
    pub seed: StatsSeed,
    /// Returned by reads while the aggregate document does not exist
    pub display_defaults: StatsSeed,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            ttl_secs: 30,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            session_idle_minutes: 30,
            storage_prefix: "conversy".to_string(),
        }
    }
}

impl TrackingConfig {
    pub fn session_idle_millis(&self) -> i64 {
        self.session_idle_minutes.saturating_mul(60 * 1000)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Invalid value '{raw}' for {key}, using default");
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend = match env_or("DATABASE_BACKEND", "sqlite").to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "memory" => DatabaseBackend::Memory,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: memory, sqlite, postgres"
                );
                DatabaseBackend::Sqlite
            }
        };

        let database_url = env_or("DATABASE_URL", "sqlite://./conversy.db?mode=rwc");
        let max_connections = env_parse("DATABASE_MAX_CONNECTIONS", 5u32);

        let api_host = env_or("API_HOST", "127.0.0.1");
        let api_port = env_or("API_PORT", "8080").parse::<u16>()?;

        let disable_auth = std::env::var("DISABLE_AUTH")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let api_keys: Vec<String> = env_or("ADMIN_API_KEYS", "")
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();

        let cache_defaults = CacheConfig::default();
        let tracking_defaults = TrackingConfig::default();

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            auth: AuthConfig {
                enabled: !disable_auth,
                api_keys,
            },
            cache: CacheConfig {
                max_entries: env_parse("CACHE_MAX_ENTRIES", cache_defaults.max_entries),
                ttl_secs: env_parse("CACHE_TTL_SECS", cache_defaults.ttl_secs),
            },
            tracking: TrackingConfig {
                session_idle_minutes: env_parse(
                    "SESSION_IDLE_MINUTES",
                    tracking_defaults.session_idle_minutes,
                ),
                storage_prefix: env_or("LOCAL_STORAGE_PREFIX", &tracking_defaults.storage_prefix),
            },
            stats: StatsConfig {
                seed: StatsSeed {
                    linkedin_followers: env_parse("STATS_SEED_LINKEDIN_FOLLOWERS", 0),
                    waitlist_count: env_parse("STATS_SEED_WAITLIST_COUNT", 0),
                },
                display_defaults: StatsSeed {
                    linkedin_followers: env_parse("STATS_DEFAULT_LINKEDIN_FOLLOWERS", 0),
                    waitlist_count: env_parse("STATS_DEFAULT_WAITLIST_COUNT", 0),
                },
            },
        })
    }
}
