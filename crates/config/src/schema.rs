use std::collections::BTreeMap;

use {
    chronos_results::{Dispatcher, PlatformProfile, ResultMarkers},
    serde::{Deserialize, Serialize},
};

pub use chronos_runner::RunnerConfig;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChronosConfig {
    pub runner: RunnerConfig,
    /// Delivery targets keyed by platform name (e.g. "telegram").
    pub platforms: BTreeMap<String, PlatformConfig>,
}

impl Default for ChronosConfig {
    fn default() -> Self {
        Self {
            runner: RunnerConfig::default(),
            platforms: BTreeMap::from([
                ("discord".to_string(), PlatformConfig {
                    marker: "DISCORD".into(),
                    profile: PlatformProfile::discord(),
                    no_results_notice: None,
                }),
                ("telegram".to_string(), PlatformConfig {
                    marker: "TELEGRAM".into(),
                    profile: PlatformProfile::telegram(),
                    no_results_notice: None,
                }),
            ]),
        }
    }
}

impl ChronosConfig {
    pub fn platform(&self, name: &str) -> Option<&PlatformConfig> {
        self.platforms.get(name)
    }

    /// Platform names in sorted order.
    pub fn platform_names(&self) -> Vec<&str> {
        self.platforms.keys().map(String::as_str).collect()
    }
}

/// One chat platform: where its result block is and how to chunk for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformConfig {
    /// Marker word framing this platform's result block, e.g. `TELEGRAM`
    /// for `TELEGRAM_RESULTS_START` / `TELEGRAM_RESULTS_END`.
    pub marker: String,
    pub profile: PlatformProfile,
    /// Replaces the default "no results" notice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_results_notice: Option<String>,
}

impl PlatformConfig {
    pub fn markers(&self) -> chronos_results::Result<ResultMarkers> {
        ResultMarkers::for_marker(&self.marker)
    }

    /// A dispatcher delivering as `source`.
    pub fn dispatcher(&self, source: &str) -> Dispatcher {
        let dispatcher = Dispatcher::new(self.profile, source);
        match &self.no_results_notice {
            Some(notice) => dispatcher.with_no_results_notice(notice.clone()),
            None => dispatcher,
        }
    }
}
