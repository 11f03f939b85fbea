use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no reference position - site latitude/longitude must be set")]
    NoReferencePosition,

    #[error("convex hull error: {0}")]
    Hull(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown math plugin: {0}")]
    UnknownPlugin(String),

    #[error("invalid mount alignment value: {0}")]
    InvalidMountAlignment(u8),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
