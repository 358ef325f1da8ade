use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Frame shape mismatch: expected {expected:?}, found {found:?}")]
    FrameShape {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Expected 3 color channels, found {0}")]
    Channels(usize),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "opencv")]
    #[error("OpenCV Error: {0}")]
    OpenCv(#[from] opencv::Error),

    #[cfg(feature = "opencv")]
    #[error("Unsupported Mat: {0}")]
    UnsupportedMat(String),
}
