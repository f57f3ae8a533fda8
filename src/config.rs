//! Session configuration.
//!
//! [`SessionConfig`] is a builder carrying the knobs a host sets once per
//! session: the size of the result buffer, options forwarded to the
//! engine's open step, and the engine's own console verbosity.
//!
//! # Example
//!
//! ```no_run
//! use demux_session::{FfmpegLogLevel, Session, SessionConfig};
//!
//! let config = SessionConfig::new()
//!     .with_input_option("rw_timeout", "5000000")
//!     .with_ffmpeg_log_level(FfmpegLogLevel::Error);
//! let mut session = Session::with_config(config);
//! println!("{}", session.open("rtmp://example.com/live"));
//! ```

use crate::ffmpeg::FfmpegLogLevel;

/// Default capacity of the result buffer, terminator included.
pub const DEFAULT_RESULT_CAPACITY: usize = 4096 * 4 + 1;

/// Smallest result buffer a session will allocate.
pub const MIN_RESULT_CAPACITY: usize = 128;

/// Configuration for a [`Session`](crate::Session).
///
/// A default-constructed config uses a 16 KiB result buffer, passes no
/// options to the engine and leaves the engine's log level untouched.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Result buffer capacity in bytes, including the NUL terminator.
    pub(crate) result_capacity: usize,
    /// Key/value options handed to the engine when opening an input.
    pub(crate) input_options: Vec<(String, String)>,
    /// Engine log level applied on every open. `None` leaves it as is.
    pub(crate) ffmpeg_log_level: Option<FfmpegLogLevel>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self {
            result_capacity: DEFAULT_RESULT_CAPACITY,
            input_options: Vec::new(),
            ffmpeg_log_level: None,
        }
    }

    /// Set the result buffer capacity.
    ///
    /// Clamped to a minimum of [`MIN_RESULT_CAPACITY`]. Metadata dumps that
    /// do not fit are truncated, so hosts with many streams per container
    /// may want a larger buffer.
    #[must_use]
    pub fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = capacity.max(MIN_RESULT_CAPACITY);
        self
    }

    /// Add an option passed to the engine's open step.
    ///
    /// These are demuxer and protocol options such as `rw_timeout`,
    /// `probesize` or `analyzeduration`. Options the engine does not
    /// recognise are ignored by it. Setting the same key twice keeps the
    /// last value.
    #[must_use]
    pub fn with_input_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.input_options.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.input_options.push((key, value)),
        }
        self
    }

    /// Set the engine's console log level, applied when a session opens.
    #[must_use]
    pub fn with_ffmpeg_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.ffmpeg_log_level = Some(level);
        self
    }

    /// Result buffer capacity in bytes.
    pub fn result_capacity(&self) -> usize {
        self.result_capacity
    }

    /// Options forwarded to the engine's open step, in insertion order.
    pub fn input_options(&self) -> &[(String, String)] {
        &self.input_options
    }

    /// Engine log level applied on open, if any.
    pub fn ffmpeg_log_level(&self) -> Option<FfmpegLogLevel> {
        self.ffmpeg_log_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.result_capacity(), DEFAULT_RESULT_CAPACITY);
        assert!(config.input_options().is_empty());
        assert!(config.ffmpeg_log_level().is_none());
    }

    #[test]
    fn result_capacity_is_clamped() {
        let config = SessionConfig::new().with_result_capacity(4);
        assert_eq!(config.result_capacity(), MIN_RESULT_CAPACITY);
    }

    #[test]
    fn repeated_input_option_keeps_last_value() {
        let config = SessionConfig::new()
            .with_input_option("probesize", "32")
            .with_input_option("rw_timeout", "100")
            .with_input_option("probesize", "5000000");

        assert_eq!(
            config.input_options(),
            &[
                ("probesize".to_string(), "5000000".to_string()),
                ("rw_timeout".to_string(), "100".to_string()),
            ]
        );
    }
}
