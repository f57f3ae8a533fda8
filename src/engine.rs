//! The container engine seam.
//!
//! A [`Session`](crate::Session) never talks to a demuxing library
//! directly. It opens inputs through a [`ContainerEngine`] and drives the
//! resulting [`ContainerInput`]. [`FfmpegEngine`](crate::FfmpegEngine) is
//! the production implementation.

use ffmpeg_next::{Rational, media::Type};

use crate::{config::SessionConfig, error::DemuxError};

/// Opens container inputs.
pub trait ContainerEngine {
    /// Handle to one open input. Dropping it releases every engine resource
    /// it owns.
    type Input: ContainerInput;

    /// Allocate a context, open `source` into it and probe its streams.
    ///
    /// Each step fails with its own error
    /// ([`AllocationFailed`](DemuxError::AllocationFailed),
    /// [`EngineOpenFailed`](DemuxError::EngineOpenFailed),
    /// [`EngineProbeFailed`](DemuxError::EngineProbeFailed)). On failure
    /// nothing allocated by the attempt survives.
    fn open(&mut self, source: &str, config: &SessionConfig) -> Result<Self::Input, DemuxError>;
}

/// An open, probed container.
pub trait ContainerInput {
    /// Number of elementary streams.
    fn stream_count(&self) -> usize;

    /// Codec parameters of one stream, `None` past the end.
    fn stream_parameters(&self, index: usize) -> Option<StreamParameters>;

    /// Container-level duration in microseconds (`AV_TIME_BASE`), or a
    /// non-positive value when unknown.
    fn duration(&self) -> i64;

    /// Demux the next packet from any stream.
    ///
    /// Returns [`DemuxError::EndOfStream`] once the input is exhausted and
    /// [`DemuxError::ReadFailed`] for every other failure. The returned
    /// packet borrows engine storage and is only valid until the next call.
    fn read_packet(&mut self) -> Result<RawPacket<'_>, DemuxError>;

    /// Seek `stream_index` to the nearest sync point at or before
    /// `timestamp` (in that stream's time base).
    fn seek(&mut self, stream_index: usize, timestamp: i64) -> Result<(), DemuxError>;
}

/// Engine-reported properties of a single stream.
///
/// Integer format codes are passed through untouched (`AVPixelFormat` /
/// `AVSampleFormat` values for the FFmpeg engine).
#[derive(Debug, Clone, PartialEq)]
pub struct StreamParameters {
    /// Stream index assigned by the engine.
    pub index: usize,
    /// Codec type tag.
    pub medium: Type,
    /// Short codec name (e.g. `"h264"`).
    pub codec_name: String,
    /// Frame width (video).
    pub width: i32,
    /// Frame height (video).
    pub height: i32,
    /// Pixel format (video) or sample format (audio) code.
    pub format: i32,
    /// Sample rate (audio).
    pub sample_rate: i32,
    /// Channel count (audio).
    pub channels: i32,
    /// Duration in `time_base` units; non-positive when unknown.
    pub duration: i64,
    /// The stream's time base.
    pub time_base: Rational,
    /// Average frame rate.
    pub frame_rate: Rational,
}

/// One demuxed packet as the engine hands it over.
#[derive(Debug, Clone, Copy)]
pub struct RawPacket<'a> {
    /// Owning stream.
    pub stream_index: usize,
    /// Presentation timestamp.
    pub pts: Option<i64>,
    /// Decoding timestamp.
    pub dts: Option<i64>,
    /// Duration in stream time base units.
    pub duration: i64,
    /// Key frame flag.
    pub is_key: bool,
    /// Payload.
    pub data: &'a [u8],
}

#[cfg(test)]
pub(crate) mod scripted {
    //! In-memory engine for driving sessions in unit tests.

    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[derive(Debug, Clone)]
    pub struct ScriptedPacket {
        pub stream_index: usize,
        pub pts: i64,
        pub is_key: bool,
        pub data: Vec<u8>,
    }

    impl ScriptedPacket {
        pub fn new(stream_index: usize, pts: i64, is_key: bool, size: usize) -> Self {
            Self {
                stream_index,
                pts,
                is_key,
                data: vec![(pts & 0xff) as u8; size],
            }
        }
    }

    /// What the scripted engine does when asked to open.
    #[derive(Debug, Clone, Default)]
    pub struct Script {
        pub open_error: Option<DemuxError>,
        pub streams: Vec<StreamParameters>,
        pub packets: Vec<ScriptedPacket>,
        pub container_duration: i64,
        /// Fail reads with this error after the last packet instead of EOF.
        pub trailing_error: Option<DemuxError>,
        pub reject_seeks: bool,
    }

    #[derive(Debug, Default)]
    pub struct ScriptedEngine {
        pub script: Script,
        pub opens: usize,
        /// Every `(stream, timestamp)` pair passed to `seek`.
        pub seeks: Rc<RefCell<Vec<(usize, i64)>>>,
    }

    impl ScriptedEngine {
        pub fn new(script: Script) -> Self {
            Self {
                script,
                ..Self::default()
            }
        }
    }

    pub struct ScriptedInput {
        script: Script,
        cursor: usize,
        seeks: Rc<RefCell<Vec<(usize, i64)>>>,
    }

    impl ContainerEngine for ScriptedEngine {
        type Input = ScriptedInput;

        fn open(&mut self, _source: &str, _config: &SessionConfig) -> Result<ScriptedInput, DemuxError> {
            self.opens += 1;
            if let Some(error) = self.script.open_error.clone() {
                return Err(error);
            }
            Ok(ScriptedInput {
                script: self.script.clone(),
                cursor: 0,
                seeks: Rc::clone(&self.seeks),
            })
        }
    }

    impl ContainerInput for ScriptedInput {
        fn stream_count(&self) -> usize {
            self.script.streams.len()
        }

        fn stream_parameters(&self, index: usize) -> Option<StreamParameters> {
            self.script.streams.get(index).cloned()
        }

        fn duration(&self) -> i64 {
            self.script.container_duration
        }

        fn read_packet(&mut self) -> Result<RawPacket<'_>, DemuxError> {
            let Some(packet) = self.script.packets.get(self.cursor) else {
                return Err(self
                    .script
                    .trailing_error
                    .clone()
                    .unwrap_or(DemuxError::EndOfStream));
            };
            self.cursor += 1;
            Ok(RawPacket {
                stream_index: packet.stream_index,
                pts: Some(packet.pts),
                dts: Some(packet.pts),
                duration: 1,
                is_key: packet.is_key,
                data: &packet.data,
            })
        }

        fn seek(&mut self, stream_index: usize, timestamp: i64) -> Result<(), DemuxError> {
            self.seeks.borrow_mut().push((stream_index, timestamp));
            if self.script.reject_seeks {
                return Err(DemuxError::SeekFailed("Operation not permitted".into()));
            }
            // Land on the last key packet of the stream at or before the
            // target, or the stream's first packet.
            let landing = self
                .script
                .packets
                .iter()
                .enumerate()
                .filter(|(_, p)| p.stream_index == stream_index && p.is_key && p.pts <= timestamp)
                .map(|(position, _)| position)
                .last()
                .or_else(|| {
                    self.script
                        .packets
                        .iter()
                        .position(|p| p.stream_index == stream_index)
                });
            self.cursor = landing.unwrap_or(self.script.packets.len());
            Ok(())
        }
    }

    pub fn video_stream(index: usize) -> StreamParameters {
        StreamParameters {
            index,
            medium: Type::Video,
            codec_name: "h264".into(),
            width: 1280,
            height: 720,
            format: 0,
            sample_rate: 0,
            channels: 0,
            duration: 5000,
            time_base: Rational::new(1, 1000),
            frame_rate: Rational::new(30000, 1001),
        }
    }

    pub fn audio_stream(index: usize) -> StreamParameters {
        StreamParameters {
            index,
            medium: Type::Audio,
            codec_name: "aac".into(),
            width: 0,
            height: 0,
            format: 8,
            sample_rate: 48_000,
            channels: 2,
            duration: 240_000,
            time_base: Rational::new(1, 48_000),
            frame_rate: Rational::new(0, 0),
        }
    }

    pub fn subtitle_stream(index: usize) -> StreamParameters {
        StreamParameters {
            index,
            medium: Type::Subtitle,
            codec_name: "subrip".into(),
            width: 0,
            height: 0,
            format: 0,
            sample_rate: 0,
            channels: 0,
            duration: 0,
            time_base: Rational::new(1, 1000),
            frame_rate: Rational::new(0, 0),
        }
    }

    /// One video + one audio stream, interleaved, video keyframe every
    /// third packet.
    pub fn two_stream_script() -> Script {
        let mut packets = Vec::new();
        for n in 0..6i64 {
            packets.push(ScriptedPacket::new(0, n * 1000, n % 3 == 0, 100 + n as usize * 50));
            packets.push(ScriptedPacket::new(1, n * 48_000, true, 20));
        }
        Script {
            streams: vec![video_stream(0), audio_stream(1)],
            packets,
            container_duration: 5_000_000,
            ..Script::default()
        }
    }
}
