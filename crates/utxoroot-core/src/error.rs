use core::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    SnapshotErrStore,
    SnapshotErrParse,
    SnapshotErrWindow,

    ClaimErrWallet,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::SnapshotErrStore => "SNAPSHOT_ERR_STORE",
            ErrorCode::SnapshotErrParse => "SNAPSHOT_ERR_PARSE",
            ErrorCode::SnapshotErrWindow => "SNAPSHOT_ERR_WINDOW",

            ErrorCode::ClaimErrWallet => "CLAIM_ERR_WALLET",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotError {
    pub code: ErrorCode,
    pub msg: String,
}

impl SnapshotError {
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SnapshotErrStore, msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SnapshotErrParse, msg)
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.msg.is_empty() {
            write!(f, "{}", self.code.as_str())
        } else {
            write!(f, "{}: {}", self.code.as_str(), self.msg)
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Per-output signing failure. Never aborts a claim batch.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SignError {
    #[error("private key not held for locking script")]
    KeyUnavailable,

    #[error("unsupported locking script")]
    UnsupportedScript,

    #[error("signing failed: {0}")]
    Failed(String),
}
