use std::time::Duration;

/// Supervisor configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Time between the starts of consecutive ticks
    pub interval: Duration,
    /// Run the first tick immediately instead of after one interval.
    /// Used by convenience starters; `start` takes the flag explicitly.
    pub run_immediately: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            run_immediately: true,
        }
    }
}

impl SupervisorConfig {
    /// Creates a config with the given interval, running immediately.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_interval_keeps_defaults() {
        let config = SupervisorConfig::with_interval(Duration::from_millis(250));
        assert_eq!(config.interval, Duration::from_millis(250));
        assert!(config.run_immediately);
    }
}
