//! Display configuration.

/// Settings read by the logging consumers on every payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplaySettings {
    /// Print every delivered payload.
    pub callbacks_logs: bool,
}
