//! Error types for studio model parsing and rebuilding.

use thiserror::Error;

/// Errors that can occur when working with studio model files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] propcolor_common::Error),

    /// The file does not start with a studio model signature.
    #[error("invalid MDL signature: expected 'IDST' or 'TSDI', got {actual:?}")]
    InvalidMagic { actual: Vec<u8> },

    /// The file is shorter than the fixed header.
    #[error("truncated MDL header: need {expected} bytes, file has {actual}")]
    TruncatedHeader { expected: usize, actual: usize },

    /// Save was requested but no append has been rebuilt into a new file.
    #[error("no changes to save")]
    NoChanges,

    /// The model has already been rebuilt once.
    #[error("model was already rebuilt; reload it before appending again")]
    AlreadyRebuilt,

    /// Skin families would be written with unequal lengths.
    #[error("skin family {family} has {actual} entries, expected {expected}")]
    InconsistentSkinFamilyLength {
        family: usize,
        expected: usize,
        actual: usize,
    },

    /// A texture slot does not fit into a 16-bit skin reference.
    #[error("texture slot {0} does not fit in a skin reference")]
    SlotIndexOverflow(usize),

    /// The rebuilt file would exceed the 32-bit offset range.
    #[error("rebuilt model too large: {0} bytes exceeds the 32-bit offset range")]
    LayoutOverflow(usize),
}

/// Result type for studio model operations.
pub type Result<T> = std::result::Result<T, Error>;
