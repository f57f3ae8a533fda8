//! Seeking.
//!
//! Both seek flavours resolve a timestamp in the target stream's time base
//! and ask the engine for a backward-biased seek, landing on the nearest
//! sync point at or before the target. Seeking only moves the read
//! position; cached metadata and packet buffers are left alone.

use crate::{
    conversion::{container_duration_to_stream, percentage_of, seconds_to_stream_timestamp},
    engine::{ContainerEngine, ContainerInput, StreamParameters},
    error::DemuxError,
    report::Report,
    session::Session,
};

/// Target timestamp for seeking `percent` of the way into a stream.
///
/// `percent` is clamped to `0..=100`. When the stream reports no duration,
/// the container duration (microseconds) is rescaled into the stream's
/// time base instead; with neither, the target is the start.
pub fn percentage_target(parameters: &StreamParameters, container_duration: i64, percent: i32) -> i64 {
    let duration = if parameters.duration > 0 {
        parameters.duration
    } else if container_duration > 0 {
        container_duration_to_stream(container_duration, parameters.time_base)
    } else {
        0
    };
    percentage_of(duration, percent.clamp(0, 100))
}

/// Target timestamp for seeking to `seconds` into a stream. Negative
/// values seek to the start.
pub fn seconds_target(parameters: &StreamParameters, seconds: i64) -> i64 {
    seconds_to_stream_timestamp(seconds.max(0), parameters.time_base)
}

impl<E: ContainerEngine> Session<E> {
    /// Seek `stream_index` to `percent` of its duration.
    ///
    /// Reports `3001` with no session open, `3002` for an index outside
    /// `0..stream_count`, `3003` when the engine rejects the seek.
    pub fn seek_by_percentage(&mut self, stream_index: i32, percent: i32) -> Report<'_> {
        let outcome = self.seek_with(stream_index, |parameters, container_duration| {
            percentage_target(parameters, container_duration, percent)
        });
        self.publish(outcome.map(|()| "Seek successful"))
    }

    /// Seek `stream_index` to `seconds` from the start.
    ///
    /// Same error reporting as [`seek_by_percentage`](Session::seek_by_percentage).
    pub fn seek_by_seconds(&mut self, stream_index: i32, seconds: i64) -> Report<'_> {
        let outcome = self.seek_with(stream_index, |parameters, _| {
            seconds_target(parameters, seconds)
        });
        self.publish(outcome.map(|()| "Seek successful"))
    }

    fn seek_with(
        &mut self,
        stream_index: i32,
        target: impl FnOnce(&StreamParameters, i64) -> i64,
    ) -> Result<(), DemuxError> {
        let input = self.input.as_mut().ok_or(DemuxError::NoFileOpen)?;
        let count = input.stream_count();
        let parameters = usize::try_from(stream_index)
            .ok()
            .filter(|&index| index < count)
            .and_then(|index| input.stream_parameters(index))
            .ok_or(DemuxError::InvalidStreamIndex {
                index: i64::from(stream_index),
                count,
            })?;

        let timestamp = target(&parameters, input.duration());
        log::debug!(
            "Seeking stream {} to timestamp {timestamp} (time base {})",
            parameters.index,
            parameters.time_base
        );
        input.seek(parameters.index, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use ffmpeg_next::Rational;

    use super::*;
    use crate::{
        config::SessionConfig,
        engine::scripted::{Script, ScriptedEngine, audio_stream, two_stream_script, video_stream},
    };

    fn open_session(script: Script) -> Session<ScriptedEngine> {
        let mut session = Session::with_engine(ScriptedEngine::new(script), SessionConfig::new());
        assert!(session.open("scripted").is_success());
        session
    }

    #[test]
    fn percentage_of_stream_duration() {
        let video = video_stream(0);
        assert_eq!(percentage_target(&video, 0, 50), 2500);
        assert_eq!(percentage_target(&video, 0, 0), 0);
        assert_eq!(percentage_target(&video, 0, 100), 5000);
    }

    #[test]
    fn percentage_is_clamped() {
        let video = video_stream(0);
        assert_eq!(percentage_target(&video, 0, 250), 5000);
        assert_eq!(percentage_target(&video, 0, -10), 0);
    }

    #[test]
    fn percentage_falls_back_to_container_duration() {
        let mut stream = audio_stream(1);
        stream.duration = 0;
        stream.time_base = Rational::new(1, 1000);
        // 8 s container duration, 25% → 2 s → 2000 in a 1/1000 time base.
        assert_eq!(percentage_target(&stream, 8_000_000, 25), 2000);
        assert_eq!(percentage_target(&stream, -1, 25), 0);
    }

    #[test]
    fn seconds_rescale_and_clamp() {
        let audio = audio_stream(1);
        assert_eq!(seconds_target(&audio, 2), 96_000);
        assert_eq!(seconds_target(&audio, -5), 0);
    }

    #[test]
    fn seek_without_open_session() {
        let mut session = Session::with_engine(ScriptedEngine::default(), SessionConfig::new());
        assert_eq!(session.seek_by_percentage(0, 50).error_id(), 3001);
        assert_eq!(session.seek_by_seconds(0, 1).error_id(), 3001);
    }

    #[test]
    fn seek_rejects_out_of_range_streams_without_touching_the_engine() {
        let mut session = open_session(two_stream_script());
        assert_eq!(session.seek_by_percentage(2, 50).error_id(), 3002);
        assert_eq!(session.seek_by_seconds(-1, 0).error_id(), 3002);
        assert!(session.engine.seeks.borrow().is_empty());
    }

    #[test]
    fn engine_rejection_is_reported() {
        let mut script = two_stream_script();
        script.reject_seeks = true;
        let mut session = open_session(script);
        let report = session.seek_by_seconds(0, 1);
        assert_eq!(report.error_id(), 3003);
        assert!(report.as_str().contains("Seek failed"));
    }

    #[test]
    fn seeks_reach_the_engine_in_stream_time_base() {
        let mut session = open_session(two_stream_script());
        assert!(session.seek_by_percentage(0, 50).is_success());
        assert!(session.seek_by_seconds(1, 1).is_success());
        assert_eq!(*session.engine.seeks.borrow(), vec![(0, 2500), (1, 48_000)]);
    }

    #[test]
    fn seeking_keeps_cached_metadata() {
        let mut session = open_session(two_stream_script());
        let before = session.streams().to_vec();
        let _ = session.seek_by_percentage(0, 75);
        assert_eq!(session.streams(), before.as_slice());
    }

    #[test]
    fn seek_to_start_then_read_yields_the_earliest_packet() {
        let mut session = open_session(two_stream_script());
        while session.next_packet().is_some() {}

        assert!(session.seek_by_percentage(0, 0).is_success());
        let first = session.next_packet().expect("packet after seek").descriptor;
        assert_eq!(first.stream_index, 0);

        let mut session_pts = vec![first.pts];
        session_pts.extend(
            session
                .descriptors()
                .filter(|descriptor| descriptor.stream_index == 0)
                .map(|descriptor| descriptor.pts),
        );
        assert!(session_pts.iter().all(|&pts| pts >= first.pts));
    }

    #[test]
    fn seek_midway_then_by_seconds_then_read() {
        let mut session = open_session(two_stream_script());
        assert!(session.seek_by_percentage(0, 50).is_success());
        assert!(session.seek_by_seconds(0, 0).is_success());
        let packet = session.next_packet().expect("packet");
        assert_eq!(packet.descriptor.stream_index, 0);
    }
}
