use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum CoreReason {
    #[error("lock busy")]
    LockBusy,
    #[error("tag parse error")]
    TagParse,
    #[error("invalid rule")]
    RuleInvalid,
    #[error("filesystem error")]
    FsTransient,
    #[error("transfer failure")]
    Transfer,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for CoreReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::LockBusy => 1001,
            Self::TagParse => 1002,
            Self::RuleInvalid => 1003,
            Self::FsTransient => 1004,
            Self::Transfer => 1005,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type CoreError = StructError<CoreReason>;
pub type CoreResult<T> = Result<T, CoreError>;
