//! Configuration for stream sessions.
//!
//! This module provides [`StreamConfig`], the per-session options applied
//! when a worker is spawned:
//!
//! - A debug name, attached to the worker's tracing events
//! - A buffer-budget override, replacing the generator's own budget
//!
//! # Example
//!
//! ```
//! use flowrs::StreamConfig;
//!
//! let config = StreamConfig::default()
//!     .with_name("ingest")
//!     .with_buffer_budget(16 * 1024);
//! assert_eq!(config.buffer_budget(), Some(16 * 1024));
//! ```

/// Default buffer budget for byte streams (64 KiB).
pub const DEFAULT_BYTE_BUDGET: i64 = 64 * 1024;

/// Per-session options for spawning a credit stream.
///
/// The budget, like the generator's own, is read exactly once when the
/// session starts and copied into the producer; changing a config after
/// spawn has no effect on a running session.
///
/// # Example
///
/// ```
/// use flowrs::StreamConfig;
///
/// // Defaults: unnamed worker, generator-supplied budget
/// let config = StreamConfig::default();
/// assert!(config.name().is_none());
/// assert!(config.buffer_budget().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamConfig {
    /// Debug name for the worker, used in tracing events.
    name: Option<String>,

    /// Overrides the generator's buffer budget when set.
    buffer_budget: Option<i64>,
}

impl StreamConfig {
    /// Creates a configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker's debug name.
    ///
    /// # Example
    ///
    /// ```
    /// use flowrs::StreamConfig;
    ///
    /// let config = StreamConfig::default().with_name("decoder");
    /// assert_eq!(config.name(), Some("decoder"));
    /// ```
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Overrides the generator's buffer budget.
    ///
    /// Zero and negative budgets keep their protocol meanings: `1` forces an
    /// empty channel before each send, `0` and below give rendezvous
    /// semantics.
    pub fn with_buffer_budget(mut self, budget: i64) -> Self {
        self.buffer_budget = Some(budget);
        self
    }

    /// Returns the worker's debug name, if set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the budget override, if set.
    pub fn buffer_budget(&self) -> Option<i64> {
        self.buffer_budget
    }
}
