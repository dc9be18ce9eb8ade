use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemError {
    InvalidArgument,
    InvalidState,
    NotFound,
    NotSupported,
    Timeout,
    Io,
    LimitExceeded,
    BadData,
}

impl SystemError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::InvalidState => "invalid_state",
            Self::NotFound => "not_found",
            Self::NotSupported => "not_supported",
            Self::Timeout => "timeout",
            Self::Io => "io",
            Self::LimitExceeded => "limit_exceeded",
            Self::BadData => "bad_data",
        }
    }
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::InvalidState => write!(f, "operation not allowed in the current state"),
            Self::NotFound => write!(f, "entry not found"),
            Self::NotSupported => write!(f, "operation not supported"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::Io => write!(f, "storage or transport I/O failed"),
            Self::LimitExceeded => write!(f, "data exceeds capacity"),
            Self::BadData => write!(f, "stored data is corrupt"),
        }
    }
}
