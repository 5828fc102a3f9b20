use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use call_recorder_core::{
    AudioDeviceRegistry, CallSessionRecorder, FixedClock, MemoryOutputBackend, PlaybackEngine,
    PlaybackOutcome, RecorderConfiguration, StreamEvent,
};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("call_recorder_e2e_{}_{}", std::process::id(), name));
    fs::remove_dir_all(&dir).ok();
    dir
}

#[test]
fn capture_three_frames_then_play_back() {
    let dir = temp_dir("three_frames");
    let config = RecorderConfiguration::default().with_recordings_dir(&dir);

    let mut recorder = CallSessionRecorder::new(&config, AudioDeviceRegistry::with_placeholder())
        .unwrap()
        .with_clock(Arc::new(FixedClock { epoch_secs: 1000 }));

    // Session about to connect: the call engine receives the recording device.
    let device = recorder.on_session_connecting("s1");
    device.capturer().start_capture().unwrap();

    let frames: Vec<Vec<u8>> = (0..3u8).map(|i| vec![i + 1; 320]).collect();
    for frame in &frames {
        device.capturer().deliver_frame(frame);
    }

    // Session disconnected.
    let result = recorder.on_session_disconnected().unwrap();
    let recording = dir.join("1000-s1.raw");
    assert_eq!(result.file_path, recording);
    assert_eq!(fs::metadata(&recording).unwrap().len(), 960);

    let listing = recorder.library().list().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].file_name, "1000-s1.raw");

    // Replay with a platform minimum of 3000 bytes.
    let backend = MemoryOutputBackend::new(3000);
    let engine = PlaybackEngine::new(Arc::new(backend.clone()), &config).unwrap();
    let report = engine.play(&recording).unwrap().join().unwrap();

    assert_eq!(report.buffer_size, 6000);
    assert_eq!(report.chunks_written, 1);
    assert_eq!(report.bytes_written, 960);
    assert_eq!(report.outcome, PlaybackOutcome::Completed);
    assert_eq!(backend.output(), frames.concat());

    let streams = backend.streams();
    assert_eq!(streams.len(), 1);
    assert_eq!(
        streams[0].events,
        vec![
            StreamEvent::Opened { buffer_size: 6000 },
            StreamEvent::Play,
            StreamEvent::Write(960),
            StreamEvent::Pause,
            StreamEvent::Stop,
            StreamEvent::Flush,
            StreamEvent::Release,
        ]
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn long_recording_round_trips_through_playback() {
    let dir = temp_dir("round_trip");
    let config = RecorderConfiguration::default().with_recordings_dir(&dir);

    let mut recorder = CallSessionRecorder::new(&config, AudioDeviceRegistry::new())
        .unwrap()
        .with_clock(Arc::new(FixedClock { epoch_secs: 1234 }));

    let device = recorder.on_session_connecting("call-42");
    device.capturer().start_capture().unwrap();

    // 10 ms frames at 44.1 kHz mono s16, with varying content.
    let mut expected = Vec::new();
    for i in 0..200u32 {
        let frame: Vec<u8> = (0..882u32).map(|j| ((i * 7 + j) % 256) as u8).collect();
        device.capturer().deliver_frame(&frame);
        expected.extend_from_slice(&frame);
    }
    let result = recorder.on_session_disconnected().unwrap();
    assert_eq!(result.bytes_written, expected.len() as u64);

    let backend = MemoryOutputBackend::new(8000);
    let engine = PlaybackEngine::new(Arc::new(backend.clone()), &config).unwrap();
    let report = engine.play(&result.file_path).unwrap().join().unwrap();

    assert_eq!(report.outcome, PlaybackOutcome::Completed);
    assert_eq!(report.bytes_written, expected.len() as u64);
    assert_eq!(report.chunks_written, (expected.len() as u64).div_ceil(16000));
    assert_eq!(backend.output(), expected);

    fs::remove_dir_all(&dir).ok();
}
