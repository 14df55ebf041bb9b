//! Configuration types for tradebus.
//!
//! These types represent the validated runtime configuration and can be
//! shared across crates. The actual config loading/parsing is handled by the
//! server crate.

mod channels;
mod display;
mod exchange;
mod server;

pub use channels::ChannelSettings;
pub use display::DisplaySettings;
pub use exchange::ExchangeConfig;
pub use server::ServerConfig;
