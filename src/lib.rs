//! # demux-session
//!
//! Stateful, packet-level demuxing of media containers, powered by FFmpeg
//! via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! A [`Session`] opens one container, caches a descriptor for each of its
//! elementary streams, hands out compressed packets one at a time and seeks
//! by percentage or by seconds. Nothing is decoded. Every textual operation
//! reports its outcome as a small JSON record, so the same API works from
//! Rust and, through the [`ffi`] module, from any language with a C FFI.
//!
//! ## Quick Start
//!
//! ### Inspect Streams
//!
//! ```no_run
//! use demux_session::{MediaKind, Session};
//!
//! let mut session = Session::new();
//! let report = session.open("input.mp4");
//! assert!(report.is_success(), "{report}");
//!
//! for stream in session.streams() {
//!     match stream.kind {
//!         MediaKind::Video => println!(
//!             "#{} {} {}x{} @ {:.2} fps",
//!             stream.stream_index,
//!             stream.codec_name(),
//!             stream.width,
//!             stream.height,
//!             stream.frames_per_second
//!         ),
//!         MediaKind::Audio => println!(
//!             "#{} {} {} Hz, {} channels",
//!             stream.stream_index,
//!             stream.codec_name(),
//!             stream.sample_rate,
//!             stream.channels
//!         ),
//!         MediaKind::Subtitle => println!("#{} {}", stream.stream_index, stream.codec_name()),
//!     }
//! }
//!
//! // Or as JSON:
//! println!("{}", session.streams_json());
//! ```
//!
//! ### Read Packets
//!
//! ```no_run
//! use demux_session::Session;
//!
//! let mut session = Session::new();
//! let _ = session.open("input.mp4");
//!
//! let mut bytes = 0;
//! while let Some(packet) = session.next_packet() {
//!     bytes += packet.data.len();
//! }
//! println!("{bytes} bytes demuxed");
//! ```
//!
//! ### Seek
//!
//! ```no_run
//! use demux_session::Session;
//!
//! let mut session = Session::new();
//! let _ = session.open("input.mp4");
//!
//! let report = session.seek_by_percentage(0, 50);
//! println!("{report}"); // {"ErrorID":0,"ReturnMessage":"Seek successful"}
//!
//! let _ = session.seek_by_seconds(0, 10);
//! let keyframe = session.next_packet().map(|packet| packet.descriptor);
//! ```
//!
//! ## Error IDs
//!
//! | ID | Meaning |
//! |----|---------|
//! | 0 | Success |
//! | 1001 | Session already open |
//! | 1002 | Context allocation failed |
//! | 1003 | Engine could not open the input |
//! | 1004 | Engine could not probe stream info |
//! | 2001 | No file open / stream info unavailable |
//! | 3001 | Seek with no file open |
//! | 3002 | Invalid stream index |
//! | 3003 | Engine rejected the seek |
//!
//! Packet reads never produce a record. Reads that stop on anything other
//! than a clean end of stream are available from
//! [`Session::last_read_error`].
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system. See the
//! README for platform-specific instructions.

pub mod buffer_pool;
pub mod config;
mod conversion;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod ffmpeg;
pub mod metadata;
pub mod packet;
pub mod report;
pub mod seek;
pub mod session;

pub use buffer_pool::{PacketBuffer, PacketBufferPool};
pub use config::{DEFAULT_RESULT_CAPACITY, MIN_RESULT_CAPACITY, SessionConfig};
pub use engine::{ContainerEngine, ContainerInput, RawPacket, StreamParameters};
pub use error::{DemuxError, SUCCESS};
pub use ffmpeg::{
    FfmpegEngine, FfmpegInput, FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level,
};
pub use metadata::{CODEC_NAME_CAPACITY, MediaKind, StreamDescriptor};
pub use packet::{NO_TIMESTAMP, Packet, PacketDescriptor, PacketDescriptors};
pub use report::{Report, ResultBuffer};
pub use session::Session;
