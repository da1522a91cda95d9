use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Schema fetch pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Number of fetch workers sharing the pool
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    /// How long a printer waits for its schema fetch inside a render
    #[serde(default = "default_schema_wait")]
    pub schema_wait: HumanDuration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            schema_wait: default_schema_wait(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_workers() -> usize {
    1
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration(10_000)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration(60_000)
}

fn default_schema_wait() -> HumanDuration {
    HumanDuration(750)
}

fn default_user_agent() -> String {
    "prettybox/0.1.0".to_string()
}

/// Bounded render configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Overall deadline for one render attempt, inclusive of the schema wait
    #[serde(default = "default_deadline")]
    pub deadline: HumanDuration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            deadline: default_deadline(),
        }
    }
}

fn default_deadline() -> HumanDuration {
    HumanDuration(1_000)
}

/// Persistent body/schema store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/prettybox")
}
