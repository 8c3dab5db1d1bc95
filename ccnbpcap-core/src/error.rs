//! Error types for ccnbpcap operations

use crate::content::ContentError;
use crate::skeleton::DecodeErrorCode;
use alloc::string::String;
use serde::{Deserialize, Serialize};

/// Errors that abort processing of the current buffer
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed record
    #[cfg_attr(
        feature = "std",
        error("Decode error {code} at offset {offset}: {consumed} of {remaining} bytes consumed ({total} total)")
    )]
    Decode {
        /// Decoder error code
        code: DecodeErrorCode,
        /// Offset of the record start
        offset: usize,
        /// Bytes consumed before the error
        consumed: usize,
        /// Bytes remaining from `offset`
        remaining: usize,
        /// Total buffer length
        total: usize,
    },

    /// Decoder made no progress while not done
    #[cfg_attr(
        feature = "std",
        error("No progress at offset {offset}: {remaining} bytes left ({total} total)")
    )]
    NoProgress {
        /// Offset of the record start
        offset: usize,
        /// Bytes remaining from `offset`
        remaining: usize,
        /// Total buffer length
        total: usize,
    },

    /// Buffer ends in the middle of a record
    #[cfg_attr(
        feature = "std",
        error("Incomplete record at offset {offset}: {consumed} of {remaining} bytes consumed ({total} total)")
    )]
    IncompleteAtEof {
        /// Offset of the record start
        offset: usize,
        /// Bytes consumed before input ran out
        consumed: usize,
        /// Bytes remaining from `offset`
        remaining: usize,
        /// Total buffer length
        total: usize,
    },

    /// Record is not a readable ContentObject
    #[cfg_attr(feature = "std", error("Unable to parse content object at offset {offset}: {source}"))]
    ContentParse {
        /// Offset of the record start
        offset: usize,
        /// What went wrong
        #[cfg_attr(feature = "std", source)]
        source: ContentError,
    },

    /// Payload does not fit in a frame
    #[cfg_attr(feature = "std", error("Payload of {payload_len} bytes overflows frame maximum {max}"))]
    EncodeOverflow {
        /// Payload length
        payload_len: usize,
        /// Maximum frame size
        max: usize,
    },

    /// A frame length field disagrees with the frame's bytes
    #[cfg_attr(feature = "std", error("Invalid frame structure: {0}"))]
    InvalidFrame(String),

    /// Output sink rejected a write or flush
    #[cfg_attr(feature = "std", error("Write failure: {0}"))]
    WriteFailure(String),
}

/// Coarse failure classification of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Malformed record
    Decode,
    /// Decoder stalled
    NoProgress,
    /// Truncated tail record
    IncompleteAtEof,
    /// Payload-only mode could not find the content
    ContentParse,
    /// Payload too large
    EncodeOverflow,
    /// Encoded frame failed its length checks
    InvalidFrame,
    /// Output rejected
    WriteFailure,
}

impl Error {
    /// Failure kind of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Decode { .. } => FailureKind::Decode,
            Error::NoProgress { .. } => FailureKind::NoProgress,
            Error::IncompleteAtEof { .. } => FailureKind::IncompleteAtEof,
            Error::ContentParse { .. } => FailureKind::ContentParse,
            Error::EncodeOverflow { .. } => FailureKind::EncodeOverflow,
            Error::InvalidFrame(_) => FailureKind::InvalidFrame,
            Error::WriteFailure(_) => FailureKind::WriteFailure,
        }
    }

    /// Whether the error comes from splitting the buffer into records
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self.kind(),
            FailureKind::Decode | FailureKind::NoProgress | FailureKind::IncompleteAtEof
        )
    }
}

impl core::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            FailureKind::Decode => "decode error",
            FailureKind::NoProgress => "no progress",
            FailureKind::IncompleteAtEof => "incomplete at end of input",
            FailureKind::ContentParse => "content parse error",
            FailureKind::EncodeOverflow => "encode overflow",
            FailureKind::InvalidFrame => "invalid frame",
            FailureKind::WriteFailure => "write failure",
        };
        f.write_str(name)
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::WriteFailure(err.to_string())
    }
}
