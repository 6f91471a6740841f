// Live channel: the single long-lived WebSocket connection carrying push
// events, run in a dedicated tokio task with typed command/notification
// channels.

pub mod channel;
pub mod error;

pub use channel::{spawn_channel, ChannelConfig, ChannelNotification, LiveChannel};
pub use error::ChannelError;
