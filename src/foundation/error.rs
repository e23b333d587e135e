pub type BackdropResult<T> = Result<T, BackdropError>;

#[derive(thiserror::Error, Debug)]
pub enum BackdropError {
    #[error("invalid bitmap: {0}")]
    InvalidBitmap(String),

    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse error category, for callers that map failures onto responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidBitmap,
    InvalidDimensions,
    InvalidConfig,
    Decode,
    Encode,
    Other,
}

impl BackdropError {
    pub fn invalid_bitmap(msg: impl Into<String>) -> Self {
        Self::InvalidBitmap(msg.into())
    }

    pub fn invalid_dimensions(msg: impl Into<String>) -> Self {
        Self::InvalidDimensions(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidBitmap(_) => ErrorKind::InvalidBitmap,
            Self::InvalidDimensions(_) => ErrorKind::InvalidDimensions,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Encode(_) => ErrorKind::Encode,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Human-readable detail without the category prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidBitmap(m)
            | Self::InvalidDimensions(m)
            | Self::InvalidConfig(m)
            | Self::Decode(m)
            | Self::Encode(m) => m.clone(),
            Self::Other(e) => format!("{e:#}"),
        }
    }
}
