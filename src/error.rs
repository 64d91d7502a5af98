use crate::chip::ChipType;

pub type Result<T, E = LedStripError> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum LedStripError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Unknown chip type: {0}")]
    UnknownChip(String),

    #[error("Invalid {chip:?} profile at {tick_hz} Hz: {reason}")]
    InvalidProfile {
        chip: ChipType,
        tick_hz: u32,
        reason: &'static str,
    },

    #[error("No free transmit channel (pool of {0})")]
    ChannelsExhausted(usize),

    #[error("Transmit channel error: {0:#}")]
    Channel(#[source] anyhow::Error),

    #[error("Cannot allocate pulse buffer of {0} items")]
    Allocation(usize),

    #[error("Device handle is stale or was never issued")]
    StaleHandle,

    #[error("Timed out waiting for previous transmission")]
    Timeout,

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}
