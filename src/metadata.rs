//! Stream metadata types.
//!
//! A [`StreamDescriptor`] is built for every elementary stream once, right
//! after a session opens, and cached until it closes. Descriptors are
//! `#[repr(C)]` so the cached slice can be handed across the FFI boundary
//! as-is.

use std::{ffi::c_char, fmt};

use ffmpeg_next::media::Type;
use serde::Serialize;

use crate::{
    conversion::{rational_to_f64, round_hundredths, truncate_utf8},
    engine::{ContainerInput, StreamParameters},
};

/// Size of the codec name field, terminator included.
pub const CODEC_NAME_CAPACITY: usize = 64;

/// Kind of an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MediaKind {
    /// Video track.
    Video = 0,
    /// Audio track.
    Audio = 1,
    /// Subtitle track. Data and attachment streams are reported as
    /// subtitles too.
    Subtitle = 2,
}

impl MediaKind {
    /// Classify an engine codec type tag.
    pub fn from_medium(medium: Type) -> Self {
        match medium {
            Type::Video => MediaKind::Video,
            Type::Audio => MediaKind::Audio,
            _ => MediaKind::Subtitle,
        }
    }

    /// Name used in the metadata dump.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Video => "Video",
            MediaKind::Audio => "Audio",
            MediaKind::Subtitle => "Subtitle",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached description of one elementary stream.
///
/// Fields that do not apply to the stream's [`MediaKind`] are zero.
#[derive(Clone, Copy, PartialEq)]
#[repr(C)]
pub struct StreamDescriptor {
    /// Stream index assigned by the engine.
    pub stream_index: i32,
    /// Media kind.
    pub kind: MediaKind,
    /// Frame width (video only).
    pub width: i32,
    /// Frame height (video only).
    pub height: i32,
    /// Pixel format code (video only).
    pub pixel_format: i32,
    /// Sample rate in hertz (audio only).
    pub sample_rate: i32,
    /// Channel count (audio only).
    pub channels: i32,
    /// Sample format code (audio only).
    pub sample_format: i32,
    /// Duration in the stream's time base units.
    pub duration: i64,
    /// Average frame rate (video only).
    pub frames_per_second: f64,
    codec_name: [c_char; CODEC_NAME_CAPACITY],
}

impl StreamDescriptor {
    /// Build a descriptor from engine parameters.
    ///
    /// Codec names longer than 63 bytes are cut silently.
    pub fn from_parameters(parameters: &StreamParameters) -> Self {
        let kind = MediaKind::from_medium(parameters.medium);
        let mut descriptor = Self {
            stream_index: parameters.index as i32,
            kind,
            width: 0,
            height: 0,
            pixel_format: 0,
            sample_rate: 0,
            channels: 0,
            sample_format: 0,
            duration: parameters.duration,
            frames_per_second: 0.0,
            codec_name: [0; CODEC_NAME_CAPACITY],
        };

        match kind {
            MediaKind::Video => {
                descriptor.width = parameters.width;
                descriptor.height = parameters.height;
                descriptor.pixel_format = parameters.format;
                descriptor.frames_per_second = rational_to_f64(parameters.frame_rate);
            }
            MediaKind::Audio => {
                descriptor.sample_rate = parameters.sample_rate;
                descriptor.channels = parameters.channels;
                descriptor.sample_format = parameters.format;
            }
            MediaKind::Subtitle => {}
        }

        let name = truncate_utf8(&parameters.codec_name, CODEC_NAME_CAPACITY - 1);
        for (slot, byte) in descriptor.codec_name.iter_mut().zip(name.bytes()) {
            *slot = byte as c_char;
        }
        descriptor
    }

    /// Codec name, e.g. `"h264"`.
    pub fn codec_name(&self) -> &str {
        let length = self
            .codec_name
            .iter()
            .position(|&byte| byte == 0)
            .unwrap_or(CODEC_NAME_CAPACITY);
        // SAFETY: c_char and u8 share size and alignment.
        let bytes = unsafe { std::slice::from_raw_parts(self.codec_name.as_ptr().cast::<u8>(), length) };
        // Always built from a &str cut on a char boundary.
        std::str::from_utf8(bytes).unwrap_or_default()
    }

    /// The dump entry for this stream, with only the fields its kind uses.
    pub(crate) fn to_json(&self) -> StreamJson<'_> {
        let mut json = StreamJson {
            index: self.stream_index,
            kind: self.kind.as_str(),
            codec: self.codec_name(),
            width: None,
            height: None,
            fps: None,
            sample_rate: None,
            channels: None,
        };
        match self.kind {
            MediaKind::Video => {
                json.width = Some(self.width);
                json.height = Some(self.height);
                json.fps = Some(round_hundredths(self.frames_per_second));
            }
            MediaKind::Audio => {
                json.sample_rate = Some(self.sample_rate);
                json.channels = Some(self.channels);
            }
            MediaKind::Subtitle => {}
        }
        json
    }
}

impl fmt::Debug for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDescriptor")
            .field("stream_index", &self.stream_index)
            .field("kind", &self.kind)
            .field("codec_name", &self.codec_name())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixel_format", &self.pixel_format)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("sample_format", &self.sample_format)
            .field("duration", &self.duration)
            .field("frames_per_second", &self.frames_per_second)
            .finish()
    }
}

/// One entry of the `Streams` array in the metadata dump.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct StreamJson<'a> {
    index: i32,
    #[serde(rename = "Type")]
    kind: &'static str,
    codec: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<i32>,
    #[serde(rename = "FPS", skip_serializing_if = "Option::is_none")]
    fps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<i32>,
}

/// The per-session cache of stream descriptors.
#[derive(Debug, Clone, Default)]
pub struct StreamCache {
    descriptors: Vec<StreamDescriptor>,
}

impl StreamCache {
    /// Read every stream the input reports and describe it.
    pub fn build<I: ContainerInput>(input: &I) -> Self {
        let count = input.stream_count();
        let mut descriptors = Vec::with_capacity(count);
        for index in 0..count {
            match input.stream_parameters(index) {
                Some(parameters) => descriptors.push(StreamDescriptor::from_parameters(&parameters)),
                None => log::warn!("Engine reported {count} streams but stream {index} is missing"),
            }
        }
        Self { descriptors }
    }

    /// All cached descriptors, in stream index order.
    pub fn descriptors(&self) -> &[StreamDescriptor] {
        &self.descriptors
    }

    /// Number of cached streams.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Drop every descriptor.
    pub fn clear(&mut self) {
        self.descriptors.clear();
    }
}
