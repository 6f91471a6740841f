use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChannelError {
    /// The channel task has terminated; no more emits are possible.
    #[error("Live channel is closed")]
    Closed,
}
