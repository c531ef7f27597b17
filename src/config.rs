//! Client configuration

use serde::{Deserialize, Serialize};

/// Tunables for one orchestrator instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Text shown by the loading indicator while requests are pending.
    #[serde(default = "OrchestratorConfig::default_loading_text")]
    pub loading_text: String,

    /// Name of the cache-busting query/body parameter.
    #[serde(default = "OrchestratorConfig::default_buster_param")]
    pub buster_param: String,
}

impl OrchestratorConfig {
    fn default_loading_text() -> String {
        "Loading...".to_string()
    }

    fn default_buster_param() -> String {
        "req".to_string()
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            loading_text: Self::default_loading_text(),
            buster_param: Self::default_buster_param(),
        }
    }
}

/// Log file settings for [`crate::logging::Logger`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    /// Path of the log file. Parent directories are created on demand.
    pub path: String,
}
