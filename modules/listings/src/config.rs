use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the listings module (`modules.listings`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListingsConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    /// Upper bound on one store round trip; `None` waits indefinitely.
    #[serde(default = "default_query_timeout", with = "humantime_serde")]
    pub query_timeout: Option<Duration>,
}

impl Default for ListingsConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            query_timeout: default_query_timeout(),
        }
    }
}

fn default_page_size() -> u64 {
    50
}

fn default_max_page_size() -> u64 {
    1000
}

fn default_query_timeout() -> Option<Duration> {
    Some(Duration::from_secs(30))
}

impl ListingsConfig {
    /// Parse the module's raw section; a missing section yields defaults.
    pub fn from_module(raw: Option<&serde_json::Value>) -> Result<Self, serde_json::Error> {
        match raw {
            Some(v) => serde_json::from_value(v.clone()),
            None => Ok(Self::default()),
        }
    }

    /// Absent or zero → default page size; anything above the max is capped.
    pub fn clamp_limit(&self, requested: Option<u64>) -> u64 {
        let limit = match requested {
            None | Some(0) => self.default_page_size,
            Some(n) => n,
        };
        limit.min(self.max_page_size).max(1)
    }
}
