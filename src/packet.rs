//! Packet-level reading.
//!
//! [`Session::next_packet`] pulls the next demuxed packet from any stream,
//! copies its payload into that stream's reusable buffer and returns a
//! [`Packet`] borrowing it. Because the view borrows the session, the
//! compiler enforces the aliasing rule: a packet must be consumed or
//! copied before the next one is requested.
//!
//! [`Session::descriptors`] wraps the same loop as an ordinary
//! [`Iterator`] that yields only the [`PacketDescriptor`]s.
//!
//! # Example
//!
//! ```no_run
//! use demux_session::Session;
//!
//! let mut session = Session::new();
//! let _ = session.open("input.mp4");
//! while let Some(packet) = session.next_packet() {
//!     if packet.descriptor.is_keyframe {
//!         println!(
//!             "Keyframe at PTS {:?} in stream {} ({} bytes)",
//!             packet.descriptor.pts(),
//!             packet.descriptor.stream_index,
//!             packet.data.len()
//!         );
//!     }
//! }
//! if let Some(error) = session.last_read_error() {
//!     eprintln!("stopped early: {error}");
//! }
//! ```

use std::time::Duration;

use ffmpeg_next::Rational;

use crate::{
    conversion::pts_to_duration,
    engine::{ContainerEngine, RawPacket},
    session::Session,
};

/// Timestamp value meaning "not set" (FFmpeg's `AV_NOPTS_VALUE`).
pub const NO_TIMESTAMP: i64 = i64::MIN;

/// Metadata for a single demuxed packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct PacketDescriptor {
    /// Presentation timestamp, or [`NO_TIMESTAMP`].
    pub pts: i64,
    /// Decoding timestamp, or [`NO_TIMESTAMP`].
    pub dts: i64,
    /// Duration in stream time base units (0 if unknown).
    pub duration: i64,
    /// The stream this packet belongs to.
    pub stream_index: i32,
    /// Payload size in bytes.
    pub size: i32,
    /// Whether this packet is a keyframe / sync point.
    pub is_keyframe: bool,
}

impl Default for PacketDescriptor {
    fn default() -> Self {
        Self {
            pts: NO_TIMESTAMP,
            dts: NO_TIMESTAMP,
            duration: 0,
            stream_index: -1,
            size: 0,
            is_keyframe: false,
        }
    }
}

impl PacketDescriptor {
    pub(crate) fn from_raw(raw: &RawPacket<'_>) -> Self {
        Self {
            pts: raw.pts.unwrap_or(NO_TIMESTAMP),
            dts: raw.dts.unwrap_or(NO_TIMESTAMP),
            duration: raw.duration,
            stream_index: raw.stream_index as i32,
            size: i32::try_from(raw.data.len()).unwrap_or(i32::MAX),
            is_keyframe: raw.is_key,
        }
    }

    /// Presentation timestamp, if the engine set one.
    pub fn pts(&self) -> Option<i64> {
        (self.pts != NO_TIMESTAMP).then_some(self.pts)
    }

    /// Decoding timestamp, if the engine set one.
    pub fn dts(&self) -> Option<i64> {
        (self.dts != NO_TIMESTAMP).then_some(self.dts)
    }

    /// Presentation time given the stream's time base.
    pub fn presentation_time(&self, time_base: Rational) -> Option<Duration> {
        self.pts().map(|pts| pts_to_duration(pts, time_base))
    }
}

/// A demuxed packet whose payload lives in its stream's buffer.
#[derive(Debug, Clone, Copy)]
pub struct Packet<'a> {
    /// Timing and ownership metadata.
    pub descriptor: PacketDescriptor,
    /// Read-only view of the payload.
    pub data: &'a [u8],
}

/// Iterator over the descriptors of the remaining packets of a session.
///
/// Created by [`Session::descriptors`]. Ends at end of stream or at the
/// first read failure; check [`Session::last_read_error`] afterwards to
/// tell the two apart.
pub struct PacketDescriptors<'a, E: ContainerEngine> {
    session: &'a mut Session<E>,
    done: bool,
}

impl<'a, E: ContainerEngine> PacketDescriptors<'a, E> {
    pub(crate) fn new(session: &'a mut Session<E>) -> Self {
        log::debug!("Creating PacketDescriptors iterator");
        Self {
            session,
            done: false,
        }
    }
}

impl<E: ContainerEngine> Iterator for PacketDescriptors<'_, E> {
    type Item = PacketDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let descriptor = self.session.next_packet().map(|packet| packet.descriptor);
        self.done = descriptor.is_none();
        descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_timestamps_read_as_none() {
        let descriptor = PacketDescriptor::from_raw(&RawPacket {
            stream_index: 1,
            pts: None,
            dts: Some(-2),
            duration: 0,
            is_key: false,
            data: &[0; 10],
        });
        assert_eq!(descriptor.pts(), None);
        assert_eq!(descriptor.dts(), Some(-2));
        assert_eq!(descriptor.size, 10);
        assert_eq!(descriptor.presentation_time(Rational::new(1, 1000)), None);
    }

    #[test]
    fn presentation_time_uses_the_time_base() {
        let descriptor = PacketDescriptor {
            pts: 90_000,
            ..PacketDescriptor::default()
        };
        assert_eq!(
            descriptor.presentation_time(Rational::new(1, 90_000)),
            Some(Duration::from_secs(1))
        );
    }
}
