//! Core value types shared by resources and their consumers.

use serde::{Deserialize, Serialize};

/// Identifier of a listener registered on a media resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Create a new ListenerId with the given value
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Media error classification, mirroring the host's numeric error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaErrorCode {
    /// Fetching was aborted at the user's request (code 1)
    Aborted,
    /// A network error interrupted fetching (code 2)
    Network,
    /// The media could not be decoded (code 3)
    Decode,
    /// The source format or location is not supported (code 4)
    SourceNotSupported,
    /// Any code outside 1-4, including 0 for "not reported"
    ///
    /// Build it through [`MediaErrorCode::from_code`]: `Unknown(1..=4)` is
    /// not a valid value, and `from_code` never yields it.
    Unknown(u16),
}

impl MediaErrorCode {
    /// Map a host numeric code; the only way codes 1-4 are classified
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::Aborted,
            2 => Self::Network,
            3 => Self::Decode,
            4 => Self::SourceNotSupported,
            other => Self::Unknown(other),
        }
    }

    /// The host numeric code
    ///
    /// `from_code(c).code() == c` for every `c`.
    pub fn code(&self) -> u16 {
        match self {
            Self::Aborted => 1,
            Self::Network => 2,
            Self::Decode => 3,
            Self::SourceNotSupported => 4,
            Self::Unknown(code) => *code,
        }
    }
}

impl std::fmt::Display for MediaErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aborted => write!(f, "MEDIA_ERR_ABORTED"),
            Self::Network => write!(f, "MEDIA_ERR_NETWORK"),
            Self::Decode => write!(f, "MEDIA_ERR_DECODE"),
            Self::SourceNotSupported => write!(f, "MEDIA_ERR_SRC_NOT_SUPPORTED"),
            Self::Unknown(code) => write!(f, "MEDIA_ERR_UNKNOWN({code})"),
        }
    }
}

/// A media error reported by the resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error classification
    pub code: MediaErrorCode,
    /// Host-provided diagnostic message, possibly empty
    pub message: String,
}

impl ErrorInfo {
    /// Create a new error description
    pub fn new(code: MediaErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Placeholder for an error event raised without error details
    pub fn unreported() -> Self {
        Self::new(
            MediaErrorCode::Unknown(0),
            "error event raised without error details",
        )
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}
