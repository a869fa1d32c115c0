use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the costar crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub stars: ModeConfig,
    pub gazers: ModeConfig,
    #[serde(default)]
    pub backoff: BackoffConfig,
    pub collaborators: CollaboratorConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Scheduler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of crawl workers dispatched per round
    #[serde(rename = "parallel-workers")]
    pub parallel_workers: u32,

    /// Nodes pulled more recently than this many days are not re-crawled
    #[serde(rename = "freshness-days")]
    pub freshness_days: u64,

    /// Upper bound on scheduler rounds (one round crawls one mode)
    #[serde(rename = "max-rounds")]
    pub max_rounds: u32,

    /// Aggregate progress is logged every this many processed sources
    #[serde(rename = "log-frequency", default = "default_log_frequency")]
    pub log_frequency: u64,

    /// Print one symbol per processed source to stdout
    #[serde(rename = "progress-symbols", default = "default_true")]
    pub progress_symbols: bool,

    /// Costars are computed once a repo has more gazers than this
    #[serde(rename = "costars-threshold", default = "default_costars_threshold")]
    pub costars_threshold: u64,

    /// Failed nodes become eligible again after this many days; never if absent
    #[serde(rename = "retry-failed-after-days", default)]
    pub retry_failed_after_days: Option<u64>,
}

impl CrawlerConfig {
    pub fn freshness(&self) -> chrono::Duration {
        chrono::Duration::days(self.freshness_days as i64)
    }

    pub fn retry_failed_after(&self) -> Option<chrono::Duration> {
        self.retry_failed_after_days
            .map(|days| chrono::Duration::days(days as i64))
    }
}

/// Per-mode frontier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModeConfig {
    /// Maximum number of sources selected per round
    #[serde(rename = "batch-size")]
    pub batch_size: usize,
}

/// Rate-limit backoff configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackoffConfig {
    /// Pause between rounds when the trigger fires (seconds)
    #[serde(rename = "duration-secs")]
    pub duration_secs: u64,

    /// Which round outcome causes a pause
    #[serde(default)]
    pub trigger: BackoffTrigger,
}

impl BackoffConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            duration_secs: 600,
            trigger: BackoffTrigger::default(),
        }
    }
}

/// Condition under which the scheduler sleeps before the next round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackoffTrigger {
    /// Every chunk of the round reported exhausted quota
    #[default]
    AllExhausted,

    /// At least one chunk of the round reported exhausted quota
    AnyExhausted,

    /// Sleep after every round that dispatched work (continuous polling)
    EveryRound,
}

/// Endpoints of the external fetch and ranking services
#[derive(Debug, Clone, Deserialize)]
pub struct CollaboratorConfig {
    /// Base URL of the target fetch service
    #[serde(rename = "fetch-url")]
    pub fetch_url: String,

    /// Base URL of the similarity ranking service
    #[serde(rename = "rank-url")]
    pub rank_url: String,

    /// Request timeout for both services (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Nodes inserted into the status store before crawling
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub nodes: Vec<String>,
}

fn default_log_frequency() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_costars_threshold() -> u64 {
    2
}

fn default_timeout_secs() -> u64 {
    60
}
