//! The FFmpeg container engine.
//!
//! [`FfmpegEngine`] opens inputs with `libavformat` through
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next), dropping to
//! `ffmpeg-sys-next` where the safe wrapper folds steps together: the
//! open path is split into allocate / open / probe so each failure is
//! reported on its own, and seeking goes through `av_seek_frame` so it can
//! target a single stream with a backward bias.
//!
//! FFmpeg also has its own console logging, separate from the Rust
//! [`log`](https://crates.io/crates/log) crate. [`set_ffmpeg_log_level`]
//! tunes it without importing `ffmpeg-next` directly.

use std::{
    ffi::{CString, c_int},
    ptr,
};

use ffmpeg_next::{
    Dictionary, Error as FfmpegError, Packet, format::context::Input, util::log::Level,
};
use ffmpeg_sys_next::{
    AVSEEK_FLAG_BACKWARD, av_packet_unref, av_seek_frame, avformat_alloc_context,
    avformat_close_input, avformat_find_stream_info, avformat_open_input,
};

use crate::{
    config::SessionConfig,
    engine::{ContainerEngine, ContainerInput, RawPacket, StreamParameters},
    error::DemuxError,
};

/// FFmpeg internal log verbosity level.
///
/// Maps directly to FFmpeg's `AV_LOG_*` constants, most quiet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Unrecoverable conditions that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl From<FfmpegLogLevel> for Level {
    fn from(level: FfmpegLogLevel) -> Self {
        match level {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }
}

impl From<Level> for FfmpegLogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Quiet => FfmpegLogLevel::Quiet,
            Level::Panic => FfmpegLogLevel::Panic,
            Level::Fatal => FfmpegLogLevel::Fatal,
            Level::Error => FfmpegLogLevel::Error,
            Level::Warning => FfmpegLogLevel::Warning,
            Level::Info => FfmpegLogLevel::Info,
            Level::Verbose => FfmpegLogLevel::Verbose,
            Level::Debug => FfmpegLogLevel::Debug,
            Level::Trace => FfmpegLogLevel::Trace,
        }
    }
}

/// Set the FFmpeg internal log verbosity level.
///
/// This controls what FFmpeg prints to stderr. It does **not** affect
/// Rust-side `log` crate output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(Level::from(level));
}

/// Get the current FFmpeg internal log verbosity level.
///
/// Returns `None` if the current level does not map to a known variant.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    ffmpeg_next::util::log::get_level()
        .ok()
        .map(FfmpegLogLevel::from)
}

/// Container engine backed by `libavformat`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegEngine;

impl FfmpegEngine {
    /// Create the engine. FFmpeg itself is initialised lazily on first open.
    pub fn new() -> Self {
        Self
    }
}

/// An open `libavformat` input plus the packet reused for every read.
pub struct FfmpegInput {
    context: Input,
    packet: Packet,
}

impl ContainerEngine for FfmpegEngine {
    type Input = FfmpegInput;

    fn open(&mut self, source: &str, config: &SessionConfig) -> Result<FfmpegInput, DemuxError> {
        ffmpeg_next::init().map_err(|error| {
            DemuxError::EngineOpenFailed(format!("FFmpeg initialisation failed: {error}"))
        })?;

        if let Some(level) = config.ffmpeg_log_level() {
            set_ffmpeg_log_level(level);
        }

        let path = CString::new(source).map_err(|_| {
            DemuxError::EngineOpenFailed("source contains an interior NUL byte".to_string())
        })?;

        let mut options = Dictionary::new();
        for (key, value) in config.input_options() {
            options.set(key, value);
        }

        unsafe {
            let mut context = avformat_alloc_context();
            if context.is_null() {
                return Err(DemuxError::AllocationFailed);
            }

            // On failure avformat_open_input frees the context and nulls
            // the pointer itself.
            let mut raw_options = options.disown();
            let status = avformat_open_input(
                &mut context,
                path.as_ptr(),
                ptr::null_mut(),
                &mut raw_options,
            );
            let unconsumed = Dictionary::own(raw_options);
            if status < 0 {
                return Err(DemuxError::EngineOpenFailed(
                    FfmpegError::from(status).to_string(),
                ));
            }
            for (key, _) in unconsumed.iter() {
                log::debug!("Input option '{key}' was not recognised by the demuxer");
            }

            let status = avformat_find_stream_info(context, ptr::null_mut());
            if status < 0 {
                avformat_close_input(&mut context);
                return Err(DemuxError::EngineProbeFailed(
                    FfmpegError::from(status).to_string(),
                ));
            }

            Ok(FfmpegInput {
                context: Input::wrap(context),
                packet: Packet::empty(),
            })
        }
    }
}

impl ContainerInput for FfmpegInput {
    fn stream_count(&self) -> usize {
        self.context.nb_streams() as usize
    }

    fn stream_parameters(&self, index: usize) -> Option<StreamParameters> {
        let stream = self.context.stream(index)?;
        let parameters = stream.parameters();
        // Dimensions, rates and format codes are read from the raw
        // AVCodecParameters; the safe wrapper only exposes them through a
        // decoder context.
        let raw = unsafe { &*parameters.as_ptr() };

        Some(StreamParameters {
            index,
            medium: parameters.medium(),
            codec_name: parameters.id().name().to_string(),
            width: raw.width,
            height: raw.height,
            format: raw.format,
            sample_rate: raw.sample_rate,
            channels: raw.ch_layout.nb_channels,
            duration: stream.duration(),
            time_base: stream.time_base(),
            frame_rate: stream.avg_frame_rate(),
        })
    }

    fn duration(&self) -> i64 {
        self.context.duration()
    }

    fn read_packet(&mut self) -> Result<RawPacket<'_>, DemuxError> {
        unsafe {
            av_packet_unref(self.packet.as_mut_ptr());
        }
        self.packet.read(&mut self.context)?;

        let packet = &self.packet;
        Ok(RawPacket {
            stream_index: packet.stream(),
            pts: packet.pts(),
            dts: packet.dts(),
            duration: packet.duration(),
            is_key: packet.is_key(),
            data: packet.data().unwrap_or(&[]),
        })
    }

    fn seek(&mut self, stream_index: usize, timestamp: i64) -> Result<(), DemuxError> {
        let status = unsafe {
            av_seek_frame(
                self.context.as_mut_ptr(),
                stream_index as c_int,
                timestamp,
                AVSEEK_FLAG_BACKWARD as c_int,
            )
        };
        if status < 0 {
            return Err(DemuxError::SeekFailed(FfmpegError::from(status).to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_round_trips_through_ffmpeg() {
        set_ffmpeg_log_level(FfmpegLogLevel::Error);
        assert_eq!(get_ffmpeg_log_level(), Some(FfmpegLogLevel::Error));
        set_ffmpeg_log_level(FfmpegLogLevel::Warning);
        assert_eq!(get_ffmpeg_log_level(), Some(FfmpegLogLevel::Warning));
    }

    #[test]
    fn missing_file_reports_open_failure() {
        let result = FfmpegEngine::new().open("this_file_does_not_exist.mp4", &SessionConfig::new());
        assert!(matches!(result, Err(DemuxError::EngineOpenFailed(_))));
    }

    #[test]
    fn interior_nul_is_rejected_before_the_engine() {
        let result = FfmpegEngine::new().open("bad\0path.mp4", &SessionConfig::new());
        assert!(matches!(result, Err(DemuxError::EngineOpenFailed(message)) if message.contains("NUL")));
    }
}
