use super::core::Runtime;

use std::time::Duration;

/// Settings a [`Runtime`] is built with.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Seed of the runtime's task id source.
    pub(crate) id_seed: u64,

    /// Longest time an idle turn parks the driving thread.
    pub(crate) max_park: Duration,

    /// Tasks polled per turn before timers are checked again.
    pub(crate) event_interval: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id_seed: 0,
            max_park: Duration::from_millis(10),
            event_interval: 61,
        }
    }
}

/// Builder for configuring and creating a runtime.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// let runtime = weft::RuntimeBuilder::new()
///     .max_park(Duration::from_millis(1))
///     .event_interval(16)
///     .build();
/// # drop(runtime);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuntimeBuilder {
    config: Config,
}

impl RuntimeBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the seed of the task id source; the first task gets `seed + 1`.
    pub fn id_seed(mut self, seed: u64) -> Self {
        self.config.id_seed = seed;
        self
    }

    /// Sets the longest time an idle runtime parks between checks.
    ///
    /// # Panics
    ///
    /// Panics if `max_park` is zero.
    pub fn max_park(mut self, max_park: Duration) -> Self {
        assert!(!max_park.is_zero(), "max_park must be > 0");

        self.config.max_park = max_park;
        self
    }

    /// Sets how many tasks a turn polls before firing expired timers.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn event_interval(mut self, n: usize) -> Self {
        assert!(n > 0, "event_interval must be > 0");

        self.config.event_interval = n;
        self
    }

    /// Builds the runtime with the configured options.
    pub fn build(self) -> Runtime {
        Runtime::new(self.config)
    }
}
