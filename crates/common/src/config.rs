/// All runtime configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
/// Strategy and sizing parameters live in the TOML file instead.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Price feed
    pub binance_base_url: String,
    /// Kline interval, e.g. "1m".
    pub interval: String,
    /// Bounded batch size fetched per cycle.
    pub bar_limit: u32,

    // Evaluation
    pub instruments: Vec<String>,
    pub poll_secs: u64,

    // Strategy config file path
    pub strategy_config_path: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let instruments: Vec<String> = required_env("INSTRUMENTS")
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if instruments.is_empty() {
            panic!("INSTRUMENTS must name at least one trading pair, e.g. 'BTCUSDT,ETHUSDT'");
        }

        Config {
            database_url: required_env("DATABASE_URL"),
            binance_base_url: optional_env("BINANCE_BASE_URL")
                .unwrap_or_else(|| "https://fapi.binance.com".to_string()),
            interval: optional_env("INTERVAL").unwrap_or_else(|| "1m".to_string()),
            bar_limit: optional_env("BAR_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            instruments,
            poll_secs: optional_env("POLL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH")
                .unwrap_or_else(|| "config/strategy.toml".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
