//! Notifications raised by the engine for the host to drain.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::Notification;
