//! SessionConfig tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

use std::path::Path;

use demux_session::{
    FfmpegLogLevel, MIN_RESULT_CAPACITY, Session, SessionConfig, get_ffmpeg_log_level,
};
use serde_json::Value;

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

// ── Builder ──────────────────────────────────────────────────────

#[test]
fn config_debug_output() {
    let config = SessionConfig::new().with_input_option("probesize", "32768");
    let debug = format!("{config:?}");
    assert!(debug.contains("SessionConfig"));
    assert!(debug.contains("probesize"));
}

#[test]
fn result_buffer_uses_configured_capacity() {
    let session = Session::with_config(SessionConfig::new().with_result_capacity(512));
    assert_eq!(session.result_buffer().capacity(), 512);

    let session = Session::with_config(SessionConfig::new().with_result_capacity(0));
    assert_eq!(session.result_buffer().capacity(), MIN_RESULT_CAPACITY);
}

// ── Applied on open ──────────────────────────────────────────────

#[test]
fn small_result_buffer_truncates_the_dump() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let config = SessionConfig::new().with_result_capacity(MIN_RESULT_CAPACITY);
    let mut session = Session::with_config(config);
    assert!(session.open(path).is_success());

    let report = session.streams_json();
    assert!(report.as_str().len() < MIN_RESULT_CAPACITY);
    let dump: Value = serde_json::from_str(report.as_str()).expect("dump stays valid JSON");
    assert_eq!(dump["StreamCount"], 2);
    assert!(dump["Streams"].as_array().unwrap().len() < 2);
}

#[test]
fn input_options_are_forwarded() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let config = SessionConfig::new()
        .with_input_option("probesize", "5000000")
        .with_input_option("not_a_real_option", "1");
    let mut session = Session::with_config(config);
    assert!(session.open(path).is_success());
    assert_eq!(session.stream_count(), 2);
}

#[test]
fn ffmpeg_log_level_is_applied_on_open() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let config = SessionConfig::new().with_ffmpeg_log_level(FfmpegLogLevel::Quiet);
    let mut session = Session::with_config(config);
    let _ = session.open(path);
    assert_eq!(get_ffmpeg_log_level(), Some(FfmpegLogLevel::Quiet));
}
