//! The result channel.
//!
//! Every textual session operation writes one JSON record into the
//! session's [`ResultBuffer`] and hands back a [`Report`] borrowing it.
//! The buffer is allocated once, never grows past its capacity and keeps a
//! trailing NUL byte, so the same storage can be lent to a C caller as a
//! string that stays put until the next call overwrites it.
//!
//! Records look like `{"ErrorID":0,"ReturnMessage":"Seek successful"}`;
//! the metadata dump looks like
//! `{"ErrorID":0,"StreamCount":2,"Streams":[{"Index":0,"Type":"Video",...}]}`.

use std::{
    ffi::c_char,
    fmt,
    io::{self, Write},
};

use serde::Serialize;

use crate::{
    config::MIN_RESULT_CAPACITY, conversion::truncate_utf8, error::SUCCESS,
    metadata::StreamDescriptor,
};

const STREAMS_CLOSER: &[u8] = b"]}";

#[derive(Serialize)]
struct ResultRecord<'a> {
    #[serde(rename = "ErrorID")]
    error_id: i32,
    #[serde(rename = "ReturnMessage")]
    return_message: &'a str,
}

/// Length of `value` once serialized, without writing it anywhere.
fn serialized_len<T: Serialize>(value: &T) -> usize {
    struct Counter(usize);

    impl Write for Counter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0 += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let mut counter = Counter(0);
    let _ = serde_json::to_writer(&mut counter, value);
    counter.0
}

/// Fixed-capacity, NUL-terminated output buffer for JSON records.
#[derive(Debug)]
pub struct ResultBuffer {
    bytes: Vec<u8>,
    capacity: usize,
    error_id: i32,
}

impl ResultBuffer {
    /// Allocate a buffer holding at most `capacity` bytes, terminator
    /// included. Clamped to [`MIN_RESULT_CAPACITY`].
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_RESULT_CAPACITY);
        let mut bytes = Vec::with_capacity(capacity);
        bytes.push(0);
        Self {
            bytes,
            capacity,
            error_id: SUCCESS,
        }
    }

    /// Largest record, in bytes, the buffer can hold.
    fn limit(&self) -> usize {
        self.capacity - 1
    }

    /// Write a success record.
    pub fn success(&mut self, message: &str) -> Report<'_> {
        self.record(SUCCESS, message)
    }

    /// Write an error record.
    pub fn error(&mut self, error_id: i32, message: &str) -> Report<'_> {
        self.record(error_id, message)
    }

    /// Write `{"ErrorID":…,"ReturnMessage":…}`, shortening the message
    /// until the record fits.
    pub fn record(&mut self, error_id: i32, message: &str) -> Report<'_> {
        let mut record = ResultRecord {
            error_id,
            return_message: message,
        };
        loop {
            let excess = serialized_len(&record).saturating_sub(self.limit());
            if excess == 0 || record.return_message.is_empty() {
                break;
            }
            let message = record.return_message;
            record.return_message = truncate_utf8(message, message.len().saturating_sub(excess));
        }

        self.bytes.clear();
        let _ = serde_json::to_writer(&mut self.bytes, &record);
        self.finish(error_id)
    }

    /// Write the metadata dump for `streams`.
    ///
    /// Stream objects that would overflow the buffer are left out; the array
    /// and object are always closed. `StreamCount` reports every stream.
    pub fn stream_dump(&mut self, streams: &[StreamDescriptor]) -> Report<'_> {
        self.bytes.clear();
        let _ = write!(
            self.bytes,
            "{{\"ErrorID\":{SUCCESS},\"StreamCount\":{},\"Streams\":[",
            streams.len()
        );

        for (written, descriptor) in streams.iter().enumerate() {
            let entry = descriptor.to_json();
            let separator = usize::from(written > 0);
            let needed = separator + serialized_len(&entry) + STREAMS_CLOSER.len();
            if self.bytes.len() + needed > self.limit() {
                log::warn!(
                    "Stream dump truncated to {written} of {} streams (buffer capacity {} bytes)",
                    streams.len(),
                    self.capacity
                );
                break;
            }
            if separator > 0 {
                self.bytes.push(b',');
            }
            let _ = serde_json::to_writer(&mut self.bytes, &entry);
        }

        self.bytes.extend_from_slice(STREAMS_CLOSER);
        self.finish(SUCCESS)
    }

    fn finish(&mut self, error_id: i32) -> Report<'_> {
        self.bytes.push(0);
        self.error_id = error_id;
        self.report()
    }

    /// The last record written.
    pub fn report(&self) -> Report<'_> {
        Report {
            error_id: self.error_id,
            text: self.as_str(),
        }
    }

    /// The last record, without the terminator. Empty before the first
    /// write.
    pub fn as_str(&self) -> &str {
        let text = &self.bytes[..self.bytes.len() - 1];
        // serde_json only ever emits UTF-8.
        std::str::from_utf8(text).unwrap_or_default()
    }

    /// NUL-terminated pointer to the last record.
    ///
    /// Stays valid, pointing at the newest record, for as long as the buffer
    /// lives; the storage is never reallocated.
    pub fn as_c_ptr(&self) -> *const c_char {
        self.bytes.as_ptr().cast()
    }

    /// Capacity in bytes, terminator included.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Outcome of a textual session operation.
///
/// Borrows the session's result buffer; it is invalidated by the next
/// operation that writes a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Report<'a> {
    error_id: i32,
    text: &'a str,
}

impl<'a> Report<'a> {
    /// Numeric outcome; `0` on success.
    pub fn error_id(&self) -> i32 {
        self.error_id
    }

    /// Returns `true` when `error_id` is `0`.
    pub fn is_success(&self) -> bool {
        self.error_id == SUCCESS
    }

    /// The JSON record.
    pub fn as_str(&self) -> &'a str {
        self.text
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}
