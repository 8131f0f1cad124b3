//! End-to-end pipeline tests
//!
//! Drives the estimator and the orchestrator with synthetic pulse windows and
//! the simulated capture, against the offline output device.

mod helpers;

use helpers::{flat_signal, sine_pulse};
use pulsetone_common::config::PulsetoneConfig;
use pulsetone_common::events::PulseEvent;
use pulsetone_engine::audio::OfflineOutput;
use pulsetone_engine::capture::SimulatedCapture;
use pulsetone_engine::pipeline::Cycle;
use pulsetone_engine::signal::{BeatDetector, ContactGate};
use pulsetone_engine::Orchestrator;
use std::io::Write;
use tokio::sync::broadcast;

fn offline_orchestrator(config: &PulsetoneConfig) -> Orchestrator<OfflineOutput> {
    let mut orchestrator = Orchestrator::new(config, OfflineOutput::new(config.synth.sample_rate));
    orchestrator.start();
    orchestrator
}

fn drain(rx: &mut broadcast::Receiver<PulseEvent>) -> Vec<PulseEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => return events,
        }
    }
}

#[test]
fn test_75_bpm_pulse_estimate() {
    let window = sine_pulse(150.0, 50.0, 0.8, 0.0, 30.0, 20.0);
    let estimate = BeatDetector::default().estimate_heart_rate(&window.timestamps, &window.values);

    let bpm = estimate.bpm.expect("a clean pulse train yields a BPM");
    assert!((bpm - 75.0).abs() <= 2.0, "bpm {}", bpm);
    assert!(estimate.quality > 0.5, "quality {}", estimate.quality);
    assert!(estimate.rr_intervals.len() >= 3);
    for rr in &estimate.rr_intervals {
        assert!((rr - 0.8).abs() < 0.1, "interval {}", rr);
    }
}

#[test]
fn test_quality_grows_with_consistent_beats() {
    let detector = BeatDetector::default();
    let mut previous = 0.0;
    for seconds in [5.0, 10.0, 15.0] {
        let window = sine_pulse(150.0, 30.0, 1.0, 0.05, 30.0, seconds);
        let estimate = detector.estimate_heart_rate(&window.timestamps, &window.values);
        assert!(estimate.quality >= previous, "{}s: {} < {}", seconds, estimate.quality, previous);
        previous = estimate.quality;
    }
    assert!(previous > 0.99);
}

#[test]
fn test_flat_signal_emitter_off() {
    let window = flat_signal(150.0, 30.0, 30);
    assert!(!ContactGate::default().is_contact(&window.values, false));

    let config = PulsetoneConfig::default();
    let mut orchestrator = offline_orchestrator(&config);
    let mut rx = orchestrator.subscribe();

    let cycles: Vec<Cycle> = window.samples().filter_map(|s| orchestrator.push_sample(s)).collect();

    assert_eq!(cycles, vec![Cycle::NoContact, Cycle::NoContact]);
    assert!(!orchestrator.in_contact());
    assert!(orchestrator.engine().current_params().muted);
    assert!(orchestrator.buffer().is_empty());

    let events = drain(&mut rx);
    let resets: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            PulseEvent::BufferReset { discarded_samples, .. } => Some(*discarded_samples),
            _ => None,
        })
        .collect();
    assert_eq!(resets, vec![30]);
    assert!(events.iter().all(|e| match e {
        PulseEvent::ChartPoint { value, .. } => *value == 0.0,
        _ => true,
    }));
    assert!(events
        .iter()
        .any(|e| e.display_text().as_deref() == Some("Mood: No contact")));
}

#[test]
fn test_simulated_session_tracks_heart_rate() {
    let config = PulsetoneConfig::default();
    let mut capture = SimulatedCapture::new(&config.capture);
    let mut orchestrator = offline_orchestrator(&config);
    let mut rx = orchestrator.subscribe();
    orchestrator.set_emitter(capture.start());

    let mut last_cycle = None;
    let mut events = Vec::new();
    for _ in 0..450 {
        if let Some(cycle) = orchestrator.push_sample(capture.next_sample()) {
            last_cycle = Some(cycle);
        }
        events.extend(drain(&mut rx));
    }

    assert!(orchestrator.in_contact());
    match last_cycle {
        Some(Cycle::Measured { estimate, .. }) => {
            let bpm = estimate.bpm.expect("15 s of covered capture yields a BPM");
            assert!((bpm - 72.0).abs() < 3.0, "bpm {}", bpm);
            assert!(estimate.quality > 0.5);
        }
        other => panic!("expected a measured cycle, got {:?}", other),
    }
    assert!(!orchestrator.engine().current_params().muted);

    assert!(events.iter().any(|e| matches!(e, PulseEvent::HeartRate { bpm: Some(_), .. })));
    assert!(events
        .iter()
        .any(|e| e.display_text().as_deref() == Some("Torch: On • Contact: Yes")));
}

#[test]
fn test_sustained_dropout_cold_restarts() {
    let config = PulsetoneConfig::default();
    let mut capture = SimulatedCapture::new(&config.capture).with_dropout(5.0, 2.0);
    let mut orchestrator = offline_orchestrator(&config);
    let mut rx = orchestrator.subscribe();
    orchestrator.set_emitter(capture.start());

    let mut saw_no_contact_cycle = false;
    let mut resets = 0;
    for _ in 0..300 {
        if let Some(Cycle::NoContact) = orchestrator.push_sample(capture.next_sample()) {
            saw_no_contact_cycle = true;
            assert!(orchestrator.engine().current_params().muted);
        }
        resets += drain(&mut rx)
            .iter()
            .filter(|e| matches!(e, PulseEvent::BufferReset { .. }))
            .count();
    }

    assert!(saw_no_contact_cycle);
    assert!(orchestrator.in_contact());
    // Nothing from before the dropout survives the cold restart
    assert!(orchestrator.buffer().timestamps()[0] > 5.0);
    assert!(resets >= 1);
}

#[test]
fn test_cadence_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[orchestrator]\nestimate_every = 10").unwrap();
    let config = PulsetoneConfig::load_from_file(file.path()).unwrap();

    let mut orchestrator = offline_orchestrator(&config);
    let window = flat_signal(150.0, 30.0, 25);
    let cycle_at: Vec<usize> = window
        .samples()
        .enumerate()
        .filter_map(|(i, s)| orchestrator.push_sample(s).map(|_| i + 1))
        .collect();
    assert_eq!(cycle_at, vec![10, 20]);
}
