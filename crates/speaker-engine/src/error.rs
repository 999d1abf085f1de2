use thiserror::Error;

/// Errors raised by the engine. Buffer full/empty is flow control, not an error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no output device matched (and no default available)")]
    NoOutputDevice,

    #[error("failed to query output device config: {0}")]
    DeviceConfig(String),

    #[error("failed to build output stream: {0}")]
    StreamBuild(String),

    #[error("failed to start output stream: {0}")]
    StreamPlay(String),

    #[error("unsupported output sample format: {0}")]
    UnsupportedFormat(String),

    /// A real read failure on the PCM input (end-of-stream is not an error).
    #[error("pcm input read failed: {0}")]
    Ingest(#[from] std::io::Error),

    #[error("invalid engine config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
