use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Acknowledgment deadlines, in seconds, for each tenant kind and phase.
///
/// ```toml
/// [lifecycle]
/// org_create_timeout_in_secs = 300
/// org_delete_timeout_in_secs = 300
/// project_create_timeout_in_secs = 300
/// project_delete_timeout_in_secs = 300
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    #[serde(default = "default_timeout_in_secs")]
    pub org_create_timeout_in_secs: u64,

    #[serde(default = "default_timeout_in_secs")]
    pub org_delete_timeout_in_secs: u64,

    #[serde(default = "default_timeout_in_secs")]
    pub project_create_timeout_in_secs: u64,

    #[serde(default = "default_timeout_in_secs")]
    pub project_delete_timeout_in_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            org_create_timeout_in_secs: default_timeout_in_secs(),
            org_delete_timeout_in_secs: default_timeout_in_secs(),
            project_create_timeout_in_secs: default_timeout_in_secs(),
            project_delete_timeout_in_secs: default_timeout_in_secs(),
        }
    }
}

impl LifecycleConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("org_create_timeout_in_secs", self.org_create_timeout_in_secs),
            ("org_delete_timeout_in_secs", self.org_delete_timeout_in_secs),
            ("project_create_timeout_in_secs", self.project_create_timeout_in_secs),
            ("project_delete_timeout_in_secs", self.project_delete_timeout_in_secs),
        ] {
            if value == 0 {
                return Err(Error::Config(ConfigError::Message(format!(
                    "{name} must be greater than 0"
                ))));
            }
        }
        Ok(())
    }
}

fn default_timeout_in_secs() -> u64 {
    300
}
