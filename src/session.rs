//! Core [`Session`] implementation.
//!
//! A `Session` owns at most one open container at a time together with
//! everything derived from it: the stream metadata cache, the per-stream
//! packet buffers and the result buffer every textual operation writes to.
//! Nothing it owns is shared with other sessions.
//!
//! Operations never panic or return `Err` to the caller. Textual operations
//! return a [`Report`] (a JSON record plus its `ErrorID`); the hot packet
//! path returns `Option<Packet>` with `None` meaning end of stream.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use ffmpeg_next::Rational;

use crate::{
    buffer_pool::PacketBufferPool,
    config::SessionConfig,
    engine::{ContainerEngine, ContainerInput},
    error::DemuxError,
    ffmpeg::FfmpegEngine,
    metadata::{StreamCache, StreamDescriptor},
    packet::{Packet, PacketDescriptor, PacketDescriptors},
    report::{Report, ResultBuffer},
};

/// A stateful demuxing session.
///
/// # Example
///
/// ```no_run
/// use demux_session::Session;
///
/// let mut session = Session::new();
/// let report = session.open("input.mp4");
/// if !report.is_success() {
///     eprintln!("{report}");
///     return;
/// }
///
/// println!("{}", session.streams_json());
/// let _ = session.seek_by_percentage(0, 50);
/// if let Some(packet) = session.next_packet() {
///     println!("{} bytes from stream {}", packet.data.len(), packet.descriptor.stream_index);
/// }
/// let _ = session.close();
/// ```
pub struct Session<E: ContainerEngine = FfmpegEngine> {
    /// Opens inputs.
    pub(crate) engine: E,
    /// Settings applied on every open.
    pub(crate) config: SessionConfig,
    /// The open input; `None` while closed.
    pub(crate) input: Option<E::Input>,
    /// Descriptors built on open.
    pub(crate) streams: StreamCache,
    /// One payload buffer per stream that has produced a packet.
    pub(crate) buffers: PacketBufferPool,
    /// Shared output for every textual operation.
    pub(crate) result: ResultBuffer,
    /// Why the last packet read stopped, if it was not a clean end of stream.
    pub(crate) last_read_error: Option<DemuxError>,
}

impl<E: ContainerEngine> Debug for Session<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Session")
            .field("is_open", &self.is_open())
            .field("streams", &self.streams)
            .field("buffers", &self.buffers.len())
            .field("last_result", &self.result.as_str())
            .field("last_read_error", &self.last_read_error)
            .finish_non_exhaustive()
    }
}

impl Session<FfmpegEngine> {
    /// Create a closed session on the FFmpeg engine with default settings.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::new())
    }

    /// Create a closed session on the FFmpeg engine.
    pub fn with_config(config: SessionConfig) -> Self {
        Self::with_engine(FfmpegEngine::new(), config)
    }
}

impl Default for Session<FfmpegEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ContainerEngine> Session<E> {
    /// Create a closed session on any engine.
    pub fn with_engine(engine: E, config: SessionConfig) -> Self {
        let result = ResultBuffer::with_capacity(config.result_capacity());
        Self {
            engine,
            config,
            input: None,
            streams: StreamCache::default(),
            buffers: PacketBufferPool::new(),
            result,
            last_read_error: None,
        }
    }

    /// Open `source` (a path or any URL the engine understands).
    ///
    /// Reports `1001` if a session is already open (the open one is left
    /// untouched), `1002` if the engine cannot allocate a context, `1003`
    /// if it cannot open the input and `1004` if its streams cannot be
    /// probed. After any failure the session is closed.
    pub fn open(&mut self, source: &str) -> Report<'_> {
        let outcome = self.try_open(source);
        self.publish(outcome.map(|()| "File opened successfully"))
    }

    fn try_open(&mut self, source: &str) -> Result<(), DemuxError> {
        if self.input.is_some() {
            return Err(DemuxError::AlreadyOpen);
        }

        log::debug!("Opening container: {source}");
        let input = self.engine.open(source, &self.config)?;

        self.streams = StreamCache::build(&input);
        self.buffers.clear();
        self.last_read_error = None;

        log::info!(
            "Opened container: {source} (streams={}, duration={}us)",
            self.streams.len(),
            input.duration(),
        );
        for descriptor in self.streams.descriptors() {
            log::debug!(
                "Stream {}: {} codec={} duration={}",
                descriptor.stream_index,
                descriptor.kind,
                descriptor.codec_name(),
                descriptor.duration,
            );
        }

        self.input = Some(input);
        Ok(())
    }

    /// Close the session, releasing the engine handle, every packet buffer
    /// and the metadata cache. Closing a closed session succeeds.
    pub fn close(&mut self) -> Report<'_> {
        self.teardown();
        self.publish(Ok("Demuxer closed"))
    }

    fn teardown(&mut self) {
        if self.input.take().is_some() {
            log::debug!(
                "Closing session ({} streams, {} packet buffers)",
                self.streams.len(),
                self.buffers.len()
            );
        }
        self.buffers.clear();
        self.streams.clear();
        self.last_read_error = None;
    }

    /// Returns `true` while a container is open.
    pub fn is_open(&self) -> bool {
        self.input.is_some()
    }

    /// Cached stream descriptors; empty while closed.
    pub fn streams(&self) -> &[StreamDescriptor] {
        self.streams.descriptors()
    }

    /// Number of cached streams; `0` while closed.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Time base of a stream of the open container.
    pub fn stream_time_base(&self, stream_index: usize) -> Option<Rational> {
        self.input
            .as_ref()?
            .stream_parameters(stream_index)
            .map(|parameters| parameters.time_base)
    }

    /// Write the metadata dump.
    ///
    /// Reports `2001` while closed.
    pub fn streams_json(&mut self) -> Report<'_> {
        if self.input.is_none() {
            return self.publish(Err(DemuxError::MetadataUnavailable));
        }
        self.result.stream_dump(self.streams.descriptors())
    }

    /// The last record written by a textual operation.
    pub fn last_result(&self) -> Report<'_> {
        self.result.report()
    }

    /// The result buffer, for hosts that hold on to its pointer.
    pub fn result_buffer(&self) -> &ResultBuffer {
        &self.result
    }

    /// The per-stream packet buffers.
    pub fn buffer_pool(&self) -> &PacketBufferPool {
        &self.buffers
    }

    /// Read the next packet from any stream.
    ///
    /// Returns `None` at end of stream, when no session is open, and when
    /// the engine fails to read; [`last_read_error`](Session::last_read_error)
    /// tells the last case apart. The payload view stays valid until the
    /// next call.
    pub fn next_packet(&mut self) -> Option<Packet<'_>> {
        let input = self.input.as_mut()?;
        match input.read_packet() {
            Ok(raw) => {
                self.last_read_error = None;
                let descriptor = PacketDescriptor::from_raw(&raw);
                let data = self.buffers.store(raw.stream_index, raw.data);
                Some(Packet { descriptor, data })
            }
            Err(DemuxError::EndOfStream) => {
                self.last_read_error = None;
                None
            }
            Err(error) => {
                log::warn!("Packet read failed, treating as end of stream: {error}");
                self.last_read_error = Some(error);
                None
            }
        }
    }

    /// The failure that ended the last packet read, if it was not a clean
    /// end of stream.
    pub fn last_read_error(&self) -> Option<&DemuxError> {
        self.last_read_error.as_ref()
    }

    /// Iterate over the descriptors of the remaining packets.
    pub fn descriptors(&mut self) -> PacketDescriptors<'_, E> {
        PacketDescriptors::new(self)
    }

    /// Write the record for `outcome` into the result buffer.
    pub(crate) fn publish(&mut self, outcome: Result<&str, DemuxError>) -> Report<'_> {
        match outcome {
            Ok(message) => self.result.success(message),
            Err(error) => {
                log::debug!("Reporting error {}: {error}", error.error_id());
                self.result.error(error.error_id(), &error.to_string())
            }
        }
    }
}

impl<E: ContainerEngine> Drop for Session<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}
