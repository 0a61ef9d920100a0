pub mod protracker;
pub mod s3m;

use thiserror::Error;

/// Errors produced while loading a module file. All of these are terminal
/// for the load attempt; no partial module is ever returned.
#[derive(Error, Debug, PartialEq)]
pub enum LoadError {
    #[error("invalid file header")]
    InvalidFormat,
    #[error("file data ends before a declared region")]
    Truncated,
    #[error("header count exceeds format maximum")]
    LimitExceeded,
    #[error("recognized signature but unsupported variant")]
    UnsupportedVariant,
}

// The loaders parse from in-memory byte slices, so the only io::Error that
// can reach them is an end-of-data condition on the cursor.
impl From<std::io::Error> for LoadError {
    fn from(_: std::io::Error) -> LoadError {
        LoadError::Truncated
    }
}

pub(crate) fn parse_str(bytes: &[u8]) -> String {
    // trim at the first NUL
    match bytes.split(|&n| n == 0).next() {
        Some(x) => String::from_utf8_lossy(x).into_owned(),
        None => String::new(),
    }
}
