//! Registry configuration

use std::time::Duration;

/// Default delay between `interrupt` and the automatic finish
pub const DEFAULT_FINISH_AFTER: Duration = Duration::from_secs(10);

/// Registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long an interrupted stream waits before it is finished
    pub finish_after: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            finish_after: DEFAULT_FINISH_AFTER,
        }
    }
}

impl RegistryConfig {
    /// Create a config with the finish delay given in whole seconds
    pub fn from_secs(secs: u64) -> Self {
        Self {
            finish_after: Duration::from_secs(secs),
        }
    }

    /// Set the finish delay
    pub fn finish_after(mut self, delay: Duration) -> Self {
        self.finish_after = delay;
        self
    }
}
