use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Status writer settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StatusConfig {
    /// Re-read and re-apply attempts after an optimistic version conflict
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,

    /// Read the record back after each write and compare the indicator
    #[serde(default = "default_verify_writes")]
    pub verify_writes: bool,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            conflict_retries: default_conflict_retries(),
            verify_writes: default_verify_writes(),
        }
    }
}

impl StatusConfig {
    pub fn validate(&self) -> Result<()> {
        if self.conflict_retries > 100 {
            return Err(Error::Config(ConfigError::Message(format!(
                "conflict_retries {} exceeds the limit of 100",
                self.conflict_retries
            ))));
        }
        Ok(())
    }
}

fn default_conflict_retries() -> u32 {
    3
}
fn default_verify_writes() -> bool {
    true
}
