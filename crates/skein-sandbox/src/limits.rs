//! Resource limits for plugin evaluation.

use std::time::Duration;

/// Resource budget enforced while a payload is evaluated.
///
/// Identity extraction runs a handful of instructions in a well-behaved
/// plugin, so the defaults are deliberately tight.
///
/// # Examples
///
/// ```
/// use skein_sandbox::SandboxLimits;
/// use std::time::Duration;
///
/// let limits = SandboxLimits::builder()
///     .memory_limit_mb(16)
///     .eval_timeout(Duration::from_secs(2))
///     .build();
///
/// assert_eq!(limits.memory_limit_bytes(), 16 * 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct SandboxLimits {
    memory_limit_bytes: usize,
    eval_timeout: Duration,
    max_fuel: u64,
}

impl SandboxLimits {
    /// Default memory limit: 64MB
    pub const DEFAULT_MEMORY_LIMIT_MB: usize = 64;

    /// Default evaluation timeout: 10 seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Default fuel limit: 10 million instructions
    pub const DEFAULT_FUEL: u64 = 10_000_000;

    /// Creates a new limits builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SandboxLimitsBuilder {
        SandboxLimitsBuilder::default()
    }

    /// Maximum linear memory available to the evaluated module.
    #[must_use]
    pub const fn memory_limit_bytes(&self) -> usize {
        self.memory_limit_bytes
    }

    /// Wall-clock budget for the whole evaluation.
    #[must_use]
    pub const fn eval_timeout(&self) -> Duration {
        self.eval_timeout
    }

    /// CPU fuel budget; exhausting it traps the evaluation.
    #[must_use]
    pub const fn max_fuel(&self) -> u64 {
        self.max_fuel
    }
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`SandboxLimits`].
#[derive(Debug, Clone)]
pub struct SandboxLimitsBuilder {
    memory_limit_bytes: usize,
    eval_timeout: Duration,
    max_fuel: u64,
}

impl Default for SandboxLimitsBuilder {
    fn default() -> Self {
        Self {
            memory_limit_bytes: SandboxLimits::DEFAULT_MEMORY_LIMIT_MB * 1024 * 1024,
            eval_timeout: Duration::from_secs(SandboxLimits::DEFAULT_TIMEOUT_SECS),
            max_fuel: SandboxLimits::DEFAULT_FUEL,
        }
    }
}

impl SandboxLimitsBuilder {
    /// Sets the memory limit in megabytes.
    #[must_use]
    pub const fn memory_limit_mb(mut self, mb: usize) -> Self {
        self.memory_limit_bytes = mb * 1024 * 1024;
        self
    }

    /// Sets the wall-clock evaluation budget.
    #[must_use]
    pub const fn eval_timeout(mut self, timeout: Duration) -> Self {
        self.eval_timeout = timeout;
        self
    }

    /// Sets the CPU fuel budget.
    #[must_use]
    pub const fn max_fuel(mut self, fuel: u64) -> Self {
        self.max_fuel = fuel;
        self
    }

    /// Builds the limits.
    #[must_use]
    pub const fn build(self) -> SandboxLimits {
        SandboxLimits {
            memory_limit_bytes: self.memory_limit_bytes,
            eval_timeout: self.eval_timeout,
            max_fuel: self.max_fuel,
        }
    }
}
