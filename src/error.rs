//! Error types for the `demux-session` crate.
//!
//! This module defines [`DemuxError`], the single error type produced by
//! every fallible step of a session. Each variant maps to a stable numeric
//! `ErrorID` so callers on the far side of a string boundary can branch on
//! the failure class without matching on message text.
//!
//! | Band | Call site |
//! |------|-----------|
//! | 1000s | session lifecycle (open) |
//! | 2000s | metadata queries |
//! | 3000s | seeking |
//! | 4000s | packet reads (never written as textual records) |

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

/// `ErrorID` reported for successful operations.
pub const SUCCESS: i32 = 0;

/// The unified error type for all session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DemuxError {
    /// `open` was called while a session was already open.
    #[error("Demuxer already open")]
    AlreadyOpen,

    /// The engine could not allocate a format context.
    #[error("Failed to allocate format context")]
    AllocationFailed,

    /// The engine refused to open the input.
    #[error("Failed to open input: {0}")]
    EngineOpenFailed(String),

    /// The input opened but its streams could not be probed.
    #[error("Failed to find stream info: {0}")]
    EngineProbeFailed(String),

    /// Stream metadata was requested with no session open.
    #[error("No file open or stream info unavailable")]
    MetadataUnavailable,

    /// A seek was requested with no session open.
    #[error("No file open")]
    NoFileOpen,

    /// A seek named a stream the session does not have.
    #[error("Invalid stream index {index} (session has {count} streams)")]
    InvalidStreamIndex {
        /// The index that was requested.
        index: i64,
        /// Number of streams in the open session.
        count: usize,
    },

    /// The engine rejected a seek request.
    #[error("Seek failed: {0}")]
    SeekFailed(String),

    /// The engine has no more packets.
    #[error("End of stream")]
    EndOfStream,

    /// The engine failed to produce the next packet for a reason other than
    /// end of stream (I/O failure, corrupt data).
    #[error("Failed to read packet: {0}")]
    ReadFailed(String),
}

impl DemuxError {
    /// The numeric `ErrorID` reported for this error.
    pub fn error_id(&self) -> i32 {
        match self {
            DemuxError::AlreadyOpen => 1001,
            DemuxError::AllocationFailed => 1002,
            DemuxError::EngineOpenFailed(_) => 1003,
            DemuxError::EngineProbeFailed(_) => 1004,
            DemuxError::MetadataUnavailable => 2001,
            DemuxError::NoFileOpen => 3001,
            DemuxError::InvalidStreamIndex { .. } => 3002,
            DemuxError::SeekFailed(_) => 3003,
            DemuxError::EndOfStream => 4001,
            DemuxError::ReadFailed(_) => 4002,
        }
    }
}

impl From<FfmpegError> for DemuxError {
    fn from(error: FfmpegError) -> Self {
        match error {
            FfmpegError::Eof => DemuxError::EndOfStream,
            other => DemuxError::ReadFailed(other.to_string()),
        }
    }
}
