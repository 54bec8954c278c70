use std::path::PathBuf;

use thiserror::Error;

use crate::shamir::ShamirError;

/// Everything that can go wrong across a split/bind cycle.
///
/// Messages carry enough context to diagnose (group ids, counts found vs.
/// required) but never key bytes, share values, or plaintext.
#[derive(Debug, Error)]
pub enum HorcruxError {
    #[error("invalid parameters: threshold must be between 2 and the total count (got {total} total, {threshold} threshold)")]
    InvalidParameters { total: usize, threshold: usize },

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt horcrux: {0}")]
    CorruptFragment(String),

    #[error("horcrux format version {0} is not supported by this build")]
    UnsupportedVersion(u8),

    #[error("inconsistent horcruxes: {0}")]
    InconsistentFragments(String),

    #[error("not enough horcruxes for group {group}: found {found}, need {required}")]
    InsufficientShares {
        group: String,
        found: usize,
        required: usize,
    },

    #[error("decryption failed: wrong or insufficient horcruxes for this group")]
    AuthenticationFailure,

    #[error("reconstructed file failed its integrity check")]
    ChecksumMismatch,

    #[error("output file already exists: {0} (use --force to overwrite)")]
    FileExists(PathBuf),

    #[error("cipher failure: {0}")]
    Cipher(String),

    #[error(transparent)]
    Shamir(#[from] ShamirError),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
