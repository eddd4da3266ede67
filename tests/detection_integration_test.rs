//! End-to-end whistle counting on synthetic audio
//!
//! PCM goes through the analyser, the feature extractor, the classifier and
//! the detector exactly as a live session would run them.

use std::sync::Arc;

use futures::StreamExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use whistle_counter::audio::synth::{concat, silence, sine_wave};
use whistle_counter::clock::StubTimeSource;
use whistle_counter::events::RecordingSink;
use whistle_counter::{
    AppConfig, FrameOutcome, PcmSpectrumSource, ProfileStore, WhistleCounter, WhistleEvent,
    WhistleProfile,
};

const SAMPLE_RATE: u32 = 44100;

fn profile_at(frequency: f32) -> WhistleProfile {
    WhistleProfile {
        target_frequency: frequency,
        min_frequency: frequency - 80.0,
        max_frequency: frequency + 80.0,
        min_amplitude: 150.0,
        max_amplitude: 300.0,
        sample_count: 3,
    }
}

fn armed_session(
    profile: WhistleProfile,
    target: Option<u32>,
) -> (WhistleCounter, Arc<StubTimeSource>, Arc<RecordingSink>) {
    let clock = Arc::new(StubTimeSource::new());
    let sink = Arc::new(RecordingSink::new());
    let counter = WhistleCounter::new(AppConfig::default(), ProfileStore::in_memory())
        .with_clock(clock.clone())
        .with_sink(sink.clone());
    counter.set_active_profile(profile).unwrap();
    counter.start_detection(target).unwrap();
    (counter, clock, sink)
}

fn play(counter: &WhistleCounter, clock: &StubTimeSource, samples: Vec<f32>) -> Vec<FrameOutcome> {
    let config = counter.config().audio.clone();
    PcmSpectrumSource::new(samples, SAMPLE_RATE, &config)
        .map(|frame| {
            clock.set_ms(frame.timestamp_ms);
            counter.process_frame(&frame).unwrap()
        })
        .collect()
}

fn whistle_counts(outcomes: &[FrameOutcome]) -> Vec<u32> {
    outcomes
        .iter()
        .filter_map(|o| match o {
            FrameOutcome::WhistleCounted { count, .. } => Some(*count),
            _ => None,
        })
        .collect()
}

/// Two whistles 32 s apart, the cooker's usual rhythm
fn two_whistles(frequency: f32) -> Vec<f32> {
    concat(&[
        silence(SAMPLE_RATE, 500),
        sine_wave(SAMPLE_RATE, frequency, 0.5, 1500),
        silence(SAMPLE_RATE, 31_000),
        sine_wave(SAMPLE_RATE, frequency, 0.5, 1500),
        silence(SAMPLE_RATE, 500),
    ])
}

#[test]
fn test_counts_two_separated_whistles() {
    let (counter, clock, sink) = armed_session(profile_at(2000.0), None);

    let outcomes = play(&counter, &clock, two_whistles(2000.0));
    assert_eq!(whistle_counts(&outcomes), vec![1, 2]);
    assert_eq!(counter.count().unwrap(), 2);

    let timestamps: Vec<u64> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            WhistleEvent::WhistleDetected { timestamp_ms, .. } => Some(timestamp_ms),
            _ => None,
        })
        .collect();
    assert_eq!(timestamps.len(), 2);
    // Each whistle is counted within its first half second
    assert!(timestamps[0] >= 500 && timestamps[0] < 1_000);
    assert!(timestamps[1] >= 33_000 && timestamps[1] < 33_500);
}

#[test]
fn test_whistles_inside_cooldown_count_once() {
    let (counter, clock, _sink) = armed_session(profile_at(2000.0), None);

    let samples = concat(&[
        sine_wave(SAMPLE_RATE, 2000.0, 0.5, 1500),
        silence(SAMPLE_RATE, 5_000),
        sine_wave(SAMPLE_RATE, 2000.0, 0.5, 1500),
        silence(SAMPLE_RATE, 5_000),
        sine_wave(SAMPLE_RATE, 2000.0, 0.5, 1500),
    ]);
    let outcomes = play(&counter, &clock, samples);
    assert_eq!(whistle_counts(&outcomes), vec![1]);
}

#[test]
fn test_target_stops_detection() {
    let (counter, clock, sink) = armed_session(profile_at(2000.0), Some(1));

    let outcomes = play(&counter, &clock, two_whistles(2000.0));
    assert_eq!(whistle_counts(&outcomes), vec![1]);
    assert!(outcomes.contains(&FrameOutcome::WhistleCounted {
        count: 1,
        target_reached: true
    }));
    assert!(!counter.is_detecting().unwrap());
    assert!(outcomes.last() == Some(&FrameOutcome::Idle));

    let events = sink.events();
    assert!(matches!(
        events.last(),
        Some(WhistleEvent::TargetReached { count: 1, .. })
    ));
}

#[test]
fn test_other_tones_are_ignored() {
    let (counter, clock, _sink) = armed_session(profile_at(2000.0), None);

    let samples = concat(&[
        sine_wave(SAMPLE_RATE, 3500.0, 0.5, 2000),
        sine_wave(SAMPLE_RATE, 700.0, 0.5, 2000),
    ]);
    let outcomes = play(&counter, &clock, samples);
    assert!(whistle_counts(&outcomes).is_empty());
    assert!(outcomes.iter().all(|o| *o == FrameOutcome::Listening));
}

#[test]
fn test_broadband_noise_is_not_a_whistle() {
    let (counter, clock, _sink) = armed_session(profile_at(2000.0), None);

    let mut rng = StdRng::seed_from_u64(7);
    let noise: Vec<f32> = (0..SAMPLE_RATE as usize * 3)
        .map(|_| rng.gen_range(-0.5..0.5))
        .collect();
    let outcomes = play(&counter, &clock, noise);
    assert!(whistle_counts(&outcomes).is_empty());
}

#[test]
fn test_quiet_whistle_is_ignored() {
    let (counter, clock, _sink) = armed_session(profile_at(2000.0), None);

    // Roughly -94 dB after windowing, far below the amplitude floor
    let outcomes = play(&counter, &clock, sine_wave(SAMPLE_RATE, 2000.0, 0.0001, 2000));
    assert!(whistle_counts(&outcomes).is_empty());
}

#[test]
fn test_stop_and_restart_resets_count() {
    let (counter, clock, _sink) = armed_session(profile_at(2000.0), None);
    play(&counter, &clock, sine_wave(SAMPLE_RATE, 2000.0, 0.5, 1000));
    assert_eq!(counter.count().unwrap(), 1);

    assert!(counter.stop_detection().unwrap());
    counter.start_detection(None).unwrap();
    assert_eq!(counter.count().unwrap(), 0);
}

#[tokio::test]
async fn test_event_stream_delivers_detections() {
    let clock = Arc::new(StubTimeSource::new());
    let counter = WhistleCounter::new(AppConfig::default(), ProfileStore::in_memory())
        .with_clock(clock.clone());
    let mut stream = counter.event_stream().unwrap();

    counter.set_active_profile(profile_at(2000.0)).unwrap();
    counter.start_detection(Some(1)).unwrap();
    play(&counter, &clock, sine_wave(SAMPLE_RATE, 2000.0, 0.5, 1000));

    let first = stream.next().await.unwrap().unwrap();
    assert!(matches!(first, WhistleEvent::WhistleDetected { count: 1, .. }));
    let second = stream.next().await.unwrap().unwrap();
    assert!(matches!(second, WhistleEvent::TargetReached { count: 1, .. }));
}
