//! Channel engine configuration.

use crate::objects::ChannelName;

/// Settings applied when consumers are registered on exchange channels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSettings {
    /// Default consumer queue capacity. `0` means unbounded.
    pub queue_size: usize,
    /// Channels whose consumers must subscribe to an explicit symbol.
    pub symbol_required: Vec<ChannelName>,
}

impl ChannelSettings {
    pub fn new(queue_size: usize, symbol_required: Vec<ChannelName>) -> Self {
        Self {
            queue_size,
            symbol_required,
        }
    }

    /// Whether consumers of `channel` may not default their symbol to the wildcard.
    pub fn is_symbol_required(&self, channel: ChannelName) -> bool {
        self.symbol_required.contains(&channel)
    }
}
