//! C ABI surface.
//!
//! A session crosses the boundary as an opaque pointer created by
//! [`demux_session_new`] and released by [`demux_session_free`]. Textual
//! calls return a pointer into that session's result buffer: a
//! NUL-terminated JSON record that stays valid until the next textual call
//! on the same session. A null session pointer makes every call return
//! null (or end of stream for packet reads).
//!
//! A session must not be used from two threads at once.

use std::{
    ffi::{CStr, c_char, c_int},
    ptr,
};

use crate::{
    error::DemuxError, metadata::StreamDescriptor, packet::PacketDescriptor, session::Session,
};

/// Create a closed session. Release it with [`demux_session_free`].
#[unsafe(no_mangle)]
pub extern "C" fn demux_session_new() -> *mut Session {
    Box::into_raw(Box::new(Session::new()))
}

/// Close and release a session. Null is ignored.
///
/// # Safety
///
/// `session` must be null or a pointer returned by [`demux_session_new`]
/// that has not been freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn demux_session_free(session: *mut Session) {
    if !session.is_null() {
        drop(unsafe { Box::from_raw(session) });
    }
}

/// Open `path`. Returns the result record.
///
/// Paths that are not valid UTF-8 report `1003`.
///
/// # Safety
///
/// `session` must be null or a live session pointer. `path` must be null or
/// point to a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn demux_session_open(
    session: *mut Session,
    path: *const c_char,
) -> *const c_char {
    let Some(session) = (unsafe { session.as_mut() }) else {
        return ptr::null();
    };
    let path = if path.is_null() {
        Err(DemuxError::EngineOpenFailed("null path".to_owned()))
    } else {
        unsafe { CStr::from_ptr(path) }.to_str().map_err(|error| {
            DemuxError::EngineOpenFailed(format!("path is not valid UTF-8: {error}"))
        })
    };

    match path {
        Ok(path) => {
            let _ = session.open(path);
        }
        Err(error) => {
            let _ = session.publish(Err(error));
        }
    }
    session.result_buffer().as_c_ptr()
}

/// Close the session. Returns the result record.
///
/// # Safety
///
/// `session` must be null or a live session pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn demux_session_close(session: *mut Session) -> *const c_char {
    let Some(session) = (unsafe { session.as_mut() }) else {
        return ptr::null();
    };
    let _ = session.close();
    session.result_buffer().as_c_ptr()
}

/// Cached stream descriptors. Writes the count to `count` (when non-null)
/// and returns the first descriptor, or null when there are none.
///
/// The array stays valid until the session is closed, reopened or freed.
///
/// # Safety
///
/// `session` must be null or a live session pointer. `count` must be null
/// or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn demux_session_streams(
    session: *const Session,
    count: *mut usize,
) -> *const StreamDescriptor {
    let streams = unsafe { session.as_ref() }.map_or(&[][..], Session::streams);
    if let Some(count) = unsafe { count.as_mut() } {
        *count = streams.len();
    }
    if streams.is_empty() {
        ptr::null()
    } else {
        streams.as_ptr()
    }
}

/// Write the metadata dump. Returns the result record.
///
/// # Safety
///
/// `session` must be null or a live session pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn demux_session_streams_json(session: *mut Session) -> *const c_char {
    let Some(session) = (unsafe { session.as_mut() }) else {
        return ptr::null();
    };
    let _ = session.streams_json();
    session.result_buffer().as_c_ptr()
}

/// Seek `stream_index` to `percent` of its duration. Returns the result
/// record.
///
/// # Safety
///
/// `session` must be null or a live session pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn demux_session_seek_percentage(
    session: *mut Session,
    stream_index: c_int,
    percent: c_int,
) -> *const c_char {
    let Some(session) = (unsafe { session.as_mut() }) else {
        return ptr::null();
    };
    let _ = session.seek_by_percentage(stream_index, percent);
    session.result_buffer().as_c_ptr()
}

/// Seek `stream_index` to `seconds` from the start. Returns the result
/// record.
///
/// # Safety
///
/// `session` must be null or a live session pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn demux_session_seek_seconds(
    session: *mut Session,
    stream_index: c_int,
    seconds: i64,
) -> *const c_char {
    let Some(session) = (unsafe { session.as_mut() }) else {
        return ptr::null();
    };
    let _ = session.seek_by_seconds(stream_index, seconds);
    session.result_buffer().as_c_ptr()
}

/// Read the next packet.
///
/// On success fills `descriptor`, sets `eof` to `false` and returns the
/// payload (`descriptor.size` bytes), valid until the next read. At end of
/// stream, or on any read failure, sets `eof` to `true` and returns null.
///
/// # Safety
///
/// `session` must be null or a live session pointer. `descriptor` and
/// `eof` must each be null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn demux_session_next_packet(
    session: *mut Session,
    descriptor: *mut PacketDescriptor,
    eof: *mut bool,
) -> *const u8 {
    let packet = unsafe { session.as_mut() }.and_then(Session::next_packet);
    let (out, data) = match packet {
        Some(packet) => (packet.descriptor, packet.data.as_ptr()),
        None => (PacketDescriptor::default(), ptr::null()),
    };
    if let Some(descriptor) = unsafe { descriptor.as_mut() } {
        *descriptor = out;
    }
    if let Some(eof) = unsafe { eof.as_mut() } {
        *eof = data.is_null();
    }
    data
}
