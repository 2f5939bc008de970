use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Web server
    pub host: String,
    pub port: u16,

    // Upstream services (migration only)
    pub profiles_address: String,
    pub content_address: String,

    // Event transport
    pub bus_kind: BusKind,
    pub subscription: String,
}

/// Which message-transport binding to run with. Selected once at startup;
/// handlers never branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusKind {
    Memory,
    Null,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("API_PORT")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .expect("API_PORT must be a number"),
            profiles_address: env::var("PROFILES_ADDRESS").unwrap_or_default(),
            content_address: env::var("CONTENT_ADDRESS").unwrap_or_default(),
            bus_kind: bus_kind_from_env(),
            subscription: env::var("SUBSCRIPTION_NAME")
                .unwrap_or_else(|_| "newsfeed".to_string()),
        }
    }
}

fn bus_kind_from_env() -> BusKind {
    match env::var("EVENTBUS_TYPE")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "memory" => BusKind::Memory,
        _ => BusKind::Null,
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
