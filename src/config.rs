// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;

/// How far, in pointer units, a card must be dragged before release commits
/// the swipe.
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 100.0;

/// Time between a resolved swipe and the next card becoming active. Leaves
/// room for the outgoing card's exit animation.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Autoplay rate used by the demo.
pub const DEFAULT_AUTOPLAY_INTERVAL: Duration = Duration::from_millis(4000);

/// Autoplay rate named in the product brief. Slower than the demo rate;
/// select it with `interval_ms = 8000`.
pub const PRODUCT_AUTOPLAY_INTERVAL: Duration = Duration::from_millis(8000);

pub const DEFAULT_CONTEXT: &str =
    "User is currently in District 1, Ho Chi Minh City. Time is roughly lunch time.";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const DEFAULT_CONCIERGE_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Artificial latency of the canned recommender.
pub const DEFAULT_CANNED_DELAY: Duration = Duration::from_millis(1000);

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub swipe: SwipeConfig,
    pub autoplay: AutoplayConfig,
    pub concierge: ConciergeConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwipeConfig {
    pub threshold: f64,
    pub settle_delay: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AutoplayConfig {
    pub interval: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConciergeConfig {
    /// Static locale/time description sent with every query.
    pub context: String,
    pub model: String,
    pub timeout: Duration,
    pub canned_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            swipe: SwipeConfig {
                threshold: DEFAULT_SWIPE_THRESHOLD,
                settle_delay: DEFAULT_SETTLE_DELAY,
            },
            autoplay: AutoplayConfig {
                interval: DEFAULT_AUTOPLAY_INTERVAL,
            },
            concierge: ConciergeConfig {
                context: DEFAULT_CONTEXT.to_string(),
                model: DEFAULT_MODEL.to_string(),
                timeout: DEFAULT_CONCIERGE_TIMEOUT,
                canned_delay: DEFAULT_CANNED_DELAY,
            },
        }
    }
}

/// The on-disk shape of the config file. Every field is optional.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    swipe: RawSwipe,
    #[serde(default)]
    autoplay: RawAutoplay,
    #[serde(default)]
    concierge: RawConcierge,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawSwipe {
    threshold: Option<f64>,
    settle_delay_ms: Option<u64>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawAutoplay {
    interval_ms: Option<u64>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConcierge {
    context: Option<String>,
    model: Option<String>,
    timeout_ms: Option<u64>,
    canned_delay_ms: Option<u64>,
}

impl Config {
    /// Loads the config file at `path`, or the defaults if no path is given.
    pub fn load(path: Option<&Path>) -> Fallible<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return fail("config file does not exist.");
                }
                log::debug!("Loading config from {}", path.display());
                Self::parse(&read_to_string(path)?)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn parse(text: &str) -> Fallible<Self> {
        let raw: RawConfig = toml::from_str(text)?;
        let defaults = Self::default();
        let threshold = raw.swipe.threshold.unwrap_or(defaults.swipe.threshold);
        if !(threshold.is_finite() && threshold > 0.0) {
            return fail("swipe threshold must be a positive number.");
        }
        let interval = raw
            .autoplay
            .interval_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.autoplay.interval);
        if interval.is_zero() {
            return fail("autoplay interval must be greater than zero.");
        }
        let timeout = raw
            .concierge
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.concierge.timeout);
        if timeout.is_zero() {
            return fail("concierge timeout must be greater than zero.");
        }
        Ok(Self {
            swipe: SwipeConfig {
                threshold,
                settle_delay: raw
                    .swipe
                    .settle_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.swipe.settle_delay),
            },
            autoplay: AutoplayConfig { interval },
            concierge: ConciergeConfig {
                context: raw.concierge.context.unwrap_or(defaults.concierge.context),
                model: raw.concierge.model.unwrap_or(defaults.concierge.model),
                timeout,
                canned_delay: raw
                    .concierge
                    .canned_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.concierge.canned_delay),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() -> Fallible<()> {
        assert_eq!(Config::parse("")?, Config::default());
        Ok(())
    }

    #[test]
    fn test_partial_override() -> Fallible<()> {
        let config = Config::parse(
            r#"
            [autoplay]
            interval_ms = 8000

            [concierge]
            context = "User is in Hanoi."
            "#,
        )?;
        assert_eq!(config.autoplay.interval, PRODUCT_AUTOPLAY_INTERVAL);
        assert_eq!(config.concierge.context, "User is in Hanoi.");
        assert_eq!(config.swipe.threshold, DEFAULT_SWIPE_THRESHOLD);
        assert_eq!(config.concierge.model, DEFAULT_MODEL);
        Ok(())
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(Config::parse("[swipe]\nthreshhold = 10\n").is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::parse("[swipe]\nthreshold = -1.0\n").is_err());
        assert!(Config::parse("[autoplay]\ninterval_ms = 0\n").is_err());
        assert!(Config::parse("[concierge]\ntimeout_ms = 0\n").is_err());
    }

    #[test]
    fn test_load_from_file() -> Fallible<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[swipe]\nsettle_delay_ms = 0")?;
        let config = Config::load(Some(file.path()))?;
        assert_eq!(config.swipe.settle_delay, Duration::ZERO);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Some(Path::new("./derpherp.toml")));
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("error: config file does not exist.".to_string())
        );
    }

    #[test]
    fn test_load_without_path() -> Fallible<()> {
        assert_eq!(Config::load(None)?, Config::default());
        Ok(())
    }

    #[test]
    fn test_demo_config() -> Fallible<()> {
        let config = Config::parse(include_str!("../demos/config.toml"))?;
        assert_eq!(config.autoplay.interval, DEFAULT_AUTOPLAY_INTERVAL);
        assert_eq!(config.swipe.settle_delay, DEFAULT_SETTLE_DELAY);
        Ok(())
    }
}
