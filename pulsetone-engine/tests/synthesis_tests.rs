//! Synthesis engine tests against the offline output device

mod helpers;

use helpers::{is_silent, rms};
use pulsetone_common::config::SynthConfig;
use pulsetone_common::Mood;
use pulsetone_engine::audio::{EngineState, OfflineOutput, SynthesisEngine, WavSink};
use pulsetone_engine::classify::Prediction;

const SAMPLE_RATE: u32 = 44100;

fn running_engine() -> SynthesisEngine<OfflineOutput> {
    let mut engine = SynthesisEngine::new(OfflineOutput::new(SAMPLE_RATE), SynthConfig::default());
    engine.start();
    assert_eq!(engine.state(), EngineState::Running);
    engine
}

fn render_seconds(engine: &mut SynthesisEngine<OfflineOutput>, seconds: f64) -> Vec<pulsetone_engine::audio::AudioFrame> {
    let frames = (seconds * f64::from(SAMPLE_RATE)) as usize;
    engine.device_mut().render(frames)
}

#[test]
fn test_silent_until_first_estimate() {
    let mut engine = running_engine();
    assert!(is_silent(&render_seconds(&mut engine, 1.0)));
}

#[test]
fn test_energy_scales_level() {
    let mut quiet = running_engine();
    quiet.update(&Prediction { mood: Mood::Focused, energy: 0.0 }, Some(75.0));
    let mut loud = running_engine();
    loud.update(&Prediction { mood: Mood::Focused, energy: 1.0 }, Some(75.0));

    let quiet_rms = rms(&render_seconds(&mut quiet, 1.0));
    let loud_rms = rms(&render_seconds(&mut loud, 1.0));
    assert!(quiet_rms > 0.01);
    assert!(loud_rms > quiet_rms * 1.5, "{} vs {}", loud_rms, quiet_rms);
}

#[test]
fn test_output_stays_in_range() {
    let mut engine = running_engine();
    engine.update(&Prediction { mood: Mood::Excited, energy: 1.0 }, Some(180.0));
    for frame in render_seconds(&mut engine, 2.0) {
        assert!(frame.left.abs() <= 1.0 && frame.left.is_finite());
        assert_eq!(frame.left, frame.right);
    }
}

#[test]
fn test_mute_lets_tail_decay_to_silence() {
    let mut engine = running_engine();
    engine.update(&Prediction { mood: Mood::Relaxed, energy: 0.8 }, Some(60.0));
    assert!(rms(&render_seconds(&mut engine, 1.0)) > 0.01);

    // Out-of-contact mapping: zero BPM forces mute
    engine.update(&Prediction { mood: Mood::Focused, energy: 0.0 }, Some(0.0));
    assert!(engine.current_params().muted);
    let tail = render_seconds(&mut engine, 5.0);
    let last_half_second = &tail[tail.len() - SAMPLE_RATE as usize / 2..];
    assert!(rms(last_half_second) < 1e-3);
}

#[test]
fn test_stop_halts_output() {
    let mut engine = running_engine();
    engine.update(&Prediction { mood: Mood::Excited, energy: 0.6 }, Some(100.0));
    assert!(!is_silent(&render_seconds(&mut engine, 0.2)));

    engine.stop();
    assert_eq!(engine.state(), EngineState::Stopped);
    assert!(is_silent(&render_seconds(&mut engine, 0.2)));
}

#[test]
fn test_render_session_to_wav() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.wav");

    let mut engine = running_engine();
    engine.update(&Prediction { mood: Mood::Relaxed, energy: 0.4 }, Some(64.0));
    let mut sink = WavSink::create(&path, SAMPLE_RATE).unwrap();
    for _ in 0..10 {
        sink.write(&render_seconds(&mut engine, 0.1)).unwrap();
    }
    let written = sink.finalize().unwrap();
    assert_eq!(written, 44100);

    let mut reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
    let peak = reader
        .samples::<f32>()
        .map(|s| s.unwrap().abs())
        .fold(0.0f32, f32::max);
    assert!(peak > 0.05);
}
