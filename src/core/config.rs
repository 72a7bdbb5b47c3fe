//! Game configuration.
//!
//! Everything tunable about a game lives in `GameConfig`:
//! - how many pairs are dealt
//! - presentation timings (mismatch feedback, win reveal, ticker period)
//! - grid spacing used by the layout heuristic
//! - where images come from (`ImageSourceConfig`)
//!
//! Configuration is read from TOML. Every field has a default, so an empty
//! or missing file yields the stock game:
//!
//! ```toml
//! pair_count = 6
//! mismatch_delay_ms = 1000
//!
//! [image_source]
//! base_url = "https://api.thecatapi.com/v1/"
//! timeout_secs = 10
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{Error, Result};

/// Default number of pairs dealt per session.
pub const DEFAULT_PAIR_COUNT: usize = 6;

/// Largest number of pairs a session can deal. TheCatAPI returns at most
/// 100 images per search.
pub const MAX_PAIR_COUNT: usize = 100;

/// Environment variable that overrides `image_source.api_key`.
pub const API_KEY_ENV: &str = "CAT_API_KEY";

/// Where and how images are fetched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSourceConfig {
    /// Base URL of the image API. Requests go to `{base_url}images/search`.
    pub base_url: String,

    /// Sent as the `x-api-key` header when present.
    pub api_key: Option<String>,

    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ImageSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.thecatapi.com/v1/".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl ImageSourceConfig {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Complete game configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of pairs dealt by `restart`.
    pub pair_count: usize,

    /// How long a mismatched pair stays face-up (and shaking).
    pub mismatch_delay_ms: u64,

    /// Pause before the win screen appears. Presentation only.
    pub win_reveal_delay_ms: u64,

    /// Period of the elapsed-time ticker.
    pub tick_interval_ms: u64,

    /// Gap between cards, in the same unit as the viewport size.
    pub card_spacing: f32,

    /// Snapshots buffered per subscriber before it starts skipping.
    pub event_capacity: usize,

    /// Fixed shuffle seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,

    pub image_source: ImageSourceConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pair_count: DEFAULT_PAIR_COUNT,
            mismatch_delay_ms: 1000,
            win_reveal_delay_ms: 500,
            tick_interval_ms: 1000,
            card_spacing: 8.0,
            event_capacity: 64,
            seed: None,
            image_source: ImageSourceConfig::default(),
        }
    }
}

impl GameConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error: the defaults are returned.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse configuration from TOML text without validating it.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply overrides taken from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        let key = std::env::var(API_KEY_ENV).ok();
        self.with_api_key_override(key)
    }

    /// Replace the API key when an override is present and non-empty.
    #[must_use]
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.image_source.api_key = Some(key);
        }
        self
    }

    /// Check that the configuration describes a playable game.
    pub fn validate(&self) -> Result<()> {
        if self.pair_count == 0 {
            return Err(Error::config("pair_count must be at least 1"));
        }
        if self.pair_count > MAX_PAIR_COUNT {
            return Err(Error::config(format!(
                "pair_count must be at most {MAX_PAIR_COUNT}"
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::config("tick_interval_ms must be positive"));
        }
        if self.card_spacing.is_nan() || self.card_spacing < 0.0 {
            return Err(Error::config("card_spacing must not be negative"));
        }
        if self.event_capacity == 0 {
            return Err(Error::config("event_capacity must be at least 1"));
        }
        if self.image_source.base_url.trim().is_empty() {
            return Err(Error::config("image_source.base_url must not be empty"));
        }
        Ok(())
    }

    // === Builders ===

    /// Set the number of pairs.
    #[must_use]
    pub fn with_pair_count(mut self, pair_count: usize) -> Self {
        self.pair_count = pair_count;
        self
    }

    /// Set the mismatch feedback delay.
    #[must_use]
    pub fn with_mismatch_delay(mut self, delay: Duration) -> Self {
        self.mismatch_delay_ms = duration_to_ms(delay);
        self
    }

    /// Set the ticker period.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = duration_to_ms(interval);
        self
    }

    /// Fix the shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the image API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.image_source.base_url = base_url.into();
        self
    }

    // === Durations ===

    #[must_use]
    pub fn mismatch_delay(&self) -> Duration {
        Duration::from_millis(self.mismatch_delay_ms)
    }

    #[must_use]
    pub fn win_reveal_delay(&self) -> Duration {
        Duration::from_millis(self.win_reveal_delay_ms)
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
