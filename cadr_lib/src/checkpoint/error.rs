use super::format::Tag;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid checkpoint magic {0}")]
    InvalidMagic(String),

    #[error("unsupported checkpoint version {0}")]
    UnsupportedVersion(u32),

    #[error("segment {tag}: expected {expected} words, found {found}")]
    SegmentLength {
        tag: Tag,
        expected: usize,
        found: usize,
    },

    #[error("missing segment {0}")]
    MissingSegment(Tag),

    #[error("corrupt checkpoint: {0}")]
    Corrupt(&'static str),
}

pub type Result<T> = std::result::Result<T, CheckpointError>;

impl CheckpointError {
    pub(super) fn invalid_magic(bytes: [u8; 4]) -> Self {
        CheckpointError::InvalidMagic(hex::encode(bytes))
    }
}
