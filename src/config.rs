use std::env;
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR: &str = "esports_odds";
const DB_FILE: &str = "odds.sqlite";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Dev,
}

impl Environment {
    pub fn default_log_level(self) -> &'static str {
        match self {
            Environment::Production => "info",
            Environment::Dev => "debug",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub environment: Environment,
    pub db_path: Option<PathBuf>,
    pub year: Option<i32>,
    pub feed_profiles: Option<PathBuf>,
    pub http_timeout: Duration,
    /// Persist outside production too.
    pub force_persist: bool,
}

impl ScrapeConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("ENVIRONMENT")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Dev,
        };
        let http_timeout_secs = env_parse::<u64>("HTTP_TIMEOUT_SECS")
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
            .clamp(1, 120);

        Self {
            environment,
            db_path: env_path("SCRAPE_DB_PATH").or_else(default_db_path),
            year: env_parse::<i32>("SCRAPE_YEAR"),
            feed_profiles: env_path("FEED_PROFILES"),
            http_timeout: Duration::from_secs(http_timeout_secs),
            force_persist: env_bool("PERSIST", false),
        }
    }

    pub fn should_persist(&self) -> bool {
        self.force_persist || self.environment == Environment::Production
    }
}

/// Paging and pacing for the results scan.
#[derive(Debug, Clone)]
pub struct ResultsBatchConfig {
    /// Text-rendering results endpoint the offset is appended to. No default:
    /// a raw HTML page would be transcribed as garbage entries.
    pub base_url: Option<String>,
    pub offset_start: u32,
    pub offset_end: u32,
    pub offset_step: u32,
    pub pace_min: Duration,
    pub pace_max: Duration,
}

impl ResultsBatchConfig {
    pub fn from_env() -> Self {
        let pace_min_ms = env_parse::<u64>("RESULTS_PACE_MIN_MS").unwrap_or(1000);
        let pace_max_ms = env_parse::<u64>("RESULTS_PACE_MAX_MS")
            .unwrap_or(3000)
            .max(pace_min_ms);
        Self {
            base_url: results_base_url(env::var("RESULTS_URL").ok()),
            offset_start: env_parse("RESULTS_OFFSET_START").unwrap_or(0),
            offset_end: env_parse("RESULTS_OFFSET_END").unwrap_or(100),
            offset_step: env_parse::<u32>("RESULTS_OFFSET_STEP").unwrap_or(100).max(1),
            pace_min: Duration::from_millis(pace_min_ms),
            pace_max: Duration::from_millis(pace_max_ms),
        }
    }

    pub fn offsets(&self) -> impl Iterator<Item = u32> {
        (self.offset_start..self.offset_end).step_by(self.offset_step as usize)
    }
}

fn results_base_url(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// `RUST_LOG` wins over the environment default.
pub fn init_logger(environment: Environment) {
    let env = env_logger::Env::default().default_filter_or(environment.default_log_level());
    let _ = env_logger::Builder::from_env(env).try_init();
}

pub fn app_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    app_dir().map(|dir| dir.join(DB_FILE))
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}
