use thiserror::Error;

use crate::store::StoreError;

/// Rejections produced by the attendance core.
///
/// Every validation variant renders a distinct message so a caller can tell
/// "already done" apart from "not yet allowed" and from bad input.
#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Check-out time is before check-in time")]
    InvalidRange,
    #[error("Already checked in today")]
    AlreadyCheckedIn,
    #[error("Please check in first")]
    NotCheckedIn,
    #[error("Already checked out today")]
    AlreadyCheckedOut,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AttendanceError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        AttendanceError::InvalidArgument(reason.into())
    }

    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceError::InvalidArgument(_) => "invalid_argument",
            AttendanceError::InvalidRange => "invalid_range",
            AttendanceError::AlreadyCheckedIn => "already_checked_in",
            AttendanceError::NotCheckedIn => "not_checked_in",
            AttendanceError::AlreadyCheckedOut => "already_checked_out",
            AttendanceError::Store(_) => "store_failure",
        }
    }

    /// True for failures the caller can fix by changing the request.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, AttendanceError::Store(_))
    }
}
