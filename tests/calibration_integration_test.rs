//! Integration tests for the calibration workflow
//!
//! These tests drive synthetic recordings through the real analyser and the
//! session context:
//! - Recordings reduced to samples
//! - Recording window auto-stop
//! - Profile construction and activation
//! - Error handling for short or silent calibrations

use std::sync::Arc;

use whistle_counter::audio::synth::{concat, silence, sine_wave};
use whistle_counter::clock::StubTimeSource;
use whistle_counter::error::CalibrationError;
use whistle_counter::events::RecordingSink;
use whistle_counter::{
    AppConfig, FrameOutcome, PcmSpectrumSource, ProfileStore, WhistleCounter, WhistleEvent,
};

const SAMPLE_RATE: u32 = 44100;

fn session() -> (WhistleCounter, Arc<StubTimeSource>, Arc<RecordingSink>) {
    let clock = Arc::new(StubTimeSource::new());
    let sink = Arc::new(RecordingSink::new());
    let counter = WhistleCounter::new(AppConfig::default(), ProfileStore::in_memory())
        .with_clock(clock.clone())
        .with_sink(sink.clone());
    (counter, clock, sink)
}

/// Play `samples` into the running recording starting at `start_ms`
///
/// Returns the outcome of the frame that ended the recording, if any.
fn record(
    counter: &WhistleCounter,
    clock: &StubTimeSource,
    samples: Vec<f32>,
    start_ms: u64,
) -> Option<FrameOutcome> {
    let config = counter.config().audio.clone();
    clock.set_ms(start_ms);
    counter.start_recording().unwrap();

    for frame in PcmSpectrumSource::new(samples, SAMPLE_RATE, &config).starting_at(start_ms) {
        clock.set_ms(frame.timestamp_ms);
        let outcome = counter.process_frame(&frame).unwrap();
        if matches!(outcome, FrameOutcome::SampleRecorded(_)) {
            return Some(outcome);
        }
    }
    None
}

#[test]
fn test_three_recordings_build_profile() {
    let (counter, clock, sink) = session();
    counter.start_calibration().unwrap();

    for round in 0..3u64 {
        let start = round * 10_000;
        assert!(record(&counter, &clock, sine_wave(SAMPLE_RATE, 2000.0, 0.5, 1500), start).is_none());
        let sample = counter.stop_recording().unwrap();
        // 2000 Hz lands between bins; the winning bucket sits within one bin
        assert!(
            (sample.frequency - 2000.0).abs() <= 40.0,
            "unexpected sample frequency {}",
            sample.frequency
        );
        assert!(sample.consistency >= 5);
        assert!(sample.amplitude > 100.0);
    }

    let progress = counter.calibration_progress().unwrap().unwrap();
    assert!(progress.is_complete());

    let profile = counter.finish_calibration().unwrap();
    assert!((profile.target_frequency - 2000.0).abs() <= 40.0);
    assert!(profile.contains_frequency(2000.0));
    assert!(profile.tolerance() >= 80.0);
    assert!(profile.min_amplitude >= 100.0);
    assert!(profile.max_amplitude >= 2.0 * profile.min_amplitude);
    assert_eq!(profile.sample_count, 3);
    assert_eq!(counter.active_profile().unwrap(), Some(profile));

    let recorded = sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, WhistleEvent::CalibrationSampleRecorded { sample: Some(_) }))
        .count();
    assert_eq!(recorded, 3);
}

#[test]
fn test_long_recording_stops_after_window() {
    let (counter, clock, _sink) = session();
    counter.start_calibration().unwrap();

    let outcome = record(&counter, &clock, sine_wave(SAMPLE_RATE, 3000.0, 0.5, 6000), 0);
    match outcome {
        Some(FrameOutcome::SampleRecorded(Some(sample))) => {
            assert!((sample.frequency - 3000.0).abs() <= 40.0);
        }
        other => panic!("Expected an automatic sample, got {:?}", other),
    }

    // Already stopped by the window
    assert_eq!(counter.stop_recording(), Err(CalibrationError::NotRecording));
}

#[test]
fn test_silent_recording_is_rejected() {
    let (counter, clock, sink) = session();
    counter.start_calibration().unwrap();

    record(&counter, &clock, silence(SAMPLE_RATE, 1000), 0);
    assert_eq!(
        counter.stop_recording(),
        Err(CalibrationError::NoSignalDetected)
    );
    assert_eq!(
        sink.events(),
        vec![WhistleEvent::CalibrationSampleRecorded { sample: None }]
    );
}

#[test]
fn test_out_of_band_tone_is_rejected() {
    let (counter, clock, _sink) = session();
    counter.start_calibration().unwrap();

    // 500 Hz sits below the whistle band
    record(&counter, &clock, sine_wave(SAMPLE_RATE, 500.0, 0.5, 1000), 0);
    assert_eq!(
        counter.stop_recording(),
        Err(CalibrationError::NoSignalDetected)
    );
}

#[test]
fn test_single_sample_is_not_enough() {
    let (counter, clock, _sink) = session();
    counter.start_calibration().unwrap();

    let samples = concat(&[silence(SAMPLE_RATE, 200), sine_wave(SAMPLE_RATE, 2500.0, 0.5, 800)]);
    record(&counter, &clock, samples, 0);
    counter.stop_recording().unwrap();

    match counter.finish_calibration() {
        Err(CalibrationError::InsufficientCalibrationData {
            required,
            collected,
        }) => {
            assert_eq!(required, 2);
            assert_eq!(collected, 1);
        }
        other => panic!("Expected InsufficientCalibrationData, got {:?}", other),
    }

    // The sample survives a failed finish
    assert_eq!(
        counter
            .calibration_progress()
            .unwrap()
            .unwrap()
            .samples_collected,
        1
    );
    counter.add_manual_sample(2500.0).unwrap();
    assert!(counter.finish_calibration().is_ok());
}

#[test]
fn test_manual_frequency_validation() {
    let (counter, _clock, _sink) = session();
    counter.start_calibration().unwrap();

    assert!(matches!(
        counter.add_manual_sample(800.0),
        Err(CalibrationError::InvalidSample { .. })
    ));
    assert!(matches!(
        counter.add_manual_sample(f32::NAN),
        Err(CalibrationError::InvalidSample { .. })
    ));

    let sample = counter.add_manual_sample(6000.0).unwrap();
    assert_eq!(sample.amplitude, 150.0);
    assert_eq!(sample.max_amplitude, 200.0);
}

#[test]
fn test_calibration_requires_session() {
    let (counter, _clock, _sink) = session();
    assert_eq!(
        counter.start_recording(),
        Err(CalibrationError::NotInProgress)
    );
    assert_eq!(
        counter.finish_calibration(),
        Err(CalibrationError::NotInProgress)
    );
}
