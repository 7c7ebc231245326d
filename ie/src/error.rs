/// Infrastructure failures of a scan.
///
/// Failing to find or match a card is not an error; see [`crate::Outcome`].
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The text recognizer could not run (missing models, engine crash, ...).
    #[error("text recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    /// A tuning value the pipeline cannot run with.
    #[error("invalid scan config: {0}")]
    InvalidConfig(String),

    /// Pixel data does not match the declared dimensions.
    #[error("pixel buffer of {len} bytes does not hold {width}x{height}x{channels}")]
    InvalidBuffer {
        width: u32,
        height: u32,
        channels: u32,
        len: usize,
    },
}

impl ScanError {
    pub fn engine(err: impl std::fmt::Display) -> Self {
        Self::EngineUnavailable(err.to_string())
    }
}
