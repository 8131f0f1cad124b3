//! Pulsetone - Main entry point
//!
//! Runs a measurement session from the simulated fingertip capture, either
//! live (real-time, audio through the default output device) or offline into
//! a WAV file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use pulsetone_common::config::PulsetoneConfig;
use pulsetone_common::events::PulseEvent;
use pulsetone_engine::audio::{AudioOutput, OfflineOutput, OutputDevice, WavSink};
use pulsetone_engine::capture::SimulatedCapture;
use pulsetone_engine::Orchestrator;
use tokio::signal;
use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Length of the simulated finger-off interval
const DROPOUT_DURATION_SEC: f64 = 2.0;

/// Session length for offline rendering when none is given
const DEFAULT_RENDER_SEC: f64 = 30.0;

/// Command-line arguments for pulsetone
#[derive(Parser, Debug)]
#[command(name = "pulsetone")]
#[command(about = "Heart-rate driven generative audio from an optical pulse signal")]
#[command(version)]
struct Args {
    /// Configuration file (overrides PULSETONE_CONFIG and the platform default)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output device name (default device if absent or not found)
    #[arg(short, long, env = "PULSETONE_DEVICE")]
    device: Option<String>,

    /// List output devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Simulated heart rate in beats per minute
    #[arg(long)]
    bpm: Option<f64>,

    /// Session length in seconds (live sessions run until Ctrl+C when absent)
    #[arg(long)]
    duration: Option<f64>,

    /// Simulated capture frame rate
    #[arg(long)]
    fps: Option<f64>,

    /// Lift the simulated finger for two seconds starting at this time
    #[arg(long)]
    dropout_at: Option<f64>,

    /// Run without opening an audio device
    #[arg(long)]
    no_audio: bool,

    /// Render the session offline into a WAV file instead of playing it
    #[arg(long)]
    render_wav: Option<PathBuf>,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        PulsetoneConfig::resolve(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bpm) = args.bpm {
        config.capture.simulated_bpm = bpm;
    }
    if let Some(fps) = args.fps {
        config.capture.frame_rate = fps;
    }
    if args.device.is_some() {
        config.synth.device = args.device.clone();
    }
    config.validate().context("Invalid configuration")?;

    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("pulsetone_engine={level},pulsetone={level},pulsetone_common={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if args.list_devices {
        for name in AudioOutput::list_devices().context("Failed to list audio devices")? {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut capture = SimulatedCapture::new(&config.capture);
    if let Some(start) = args.dropout_at {
        capture = capture.with_dropout(start, DROPOUT_DURATION_SEC);
    }

    match args.render_wav.as_deref() {
        Some(path) => render_offline(&config, capture, path, args.duration, args.json),
        None => run_live(&config, capture, args.duration, args.no_audio, args.json).await,
    }
}

/// Real-time session paced by the capture frame rate
async fn run_live(
    config: &PulsetoneConfig,
    mut capture: SimulatedCapture,
    duration: Option<f64>,
    no_audio: bool,
    json: bool,
) -> Result<()> {
    let device = open_device(config, no_audio);
    let mut orchestrator = Orchestrator::new(config, device);
    let mut events = orchestrator.subscribe();

    orchestrator.start();
    orchestrator.set_emitter(capture.start());

    let mut ticker = tokio::time::interval(capture.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let deadline = duration.map(|secs| Instant::now() + Duration::from_secs_f64(secs));

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                orchestrator.push_sample(capture.next_sample());
                print_events(&mut events, json)?;
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    info!("Session duration reached");
                    break;
                }
            }
        }
    }

    // Silence the render path before the capture halts
    orchestrator.stop();
    orchestrator.set_emitter(capture.stop());
    print_events(&mut events, json)?;
    Ok(())
}

/// Faster-than-real-time session rendered into a WAV file
fn render_offline(
    config: &PulsetoneConfig,
    mut capture: SimulatedCapture,
    path: &Path,
    duration: Option<f64>,
    json: bool,
) -> Result<()> {
    let sample_rate = config.synth.sample_rate;
    let mut orchestrator = Orchestrator::new(config, OfflineOutput::new(sample_rate));
    let mut events = orchestrator.subscribe();
    let mut sink = WavSink::create(path, sample_rate)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    orchestrator.start();
    orchestrator.set_emitter(capture.start());

    let total_samples = (duration.unwrap_or(DEFAULT_RENDER_SEC) * capture.frame_rate()).round() as u64;
    let frames_per_sample = f64::from(sample_rate) / capture.frame_rate();
    let mut rendered: u64 = 0;

    for n in 1..=total_samples {
        orchestrator.push_sample(capture.next_sample());
        print_events(&mut events, json)?;

        let target = (n as f64 * frames_per_sample).round() as u64;
        let frames = orchestrator
            .engine_mut()
            .device_mut()
            .render((target - rendered) as usize);
        sink.write(&frames).context("Failed to write audio")?;
        rendered = target;
    }

    orchestrator.stop();
    orchestrator.set_emitter(capture.stop());
    print_events(&mut events, json)?;

    let written = sink.finalize().context("Failed to finalize WAV file")?;
    info!(
        "Wrote {} frames ({:.1}s) to {}",
        written,
        written as f64 / f64::from(sample_rate),
        path.display()
    );
    Ok(())
}

/// Open the configured audio device, or a silent stand-in when audio is
/// disabled or unavailable
fn open_device(config: &PulsetoneConfig, no_audio: bool) -> Box<dyn OutputDevice> {
    if no_audio {
        info!("Audio disabled");
        return Box::new(OfflineOutput::new(config.synth.sample_rate));
    }
    match AudioOutput::new(config.synth.device.as_deref(), config.synth.sample_rate) {
        Ok(output) => Box::new(output),
        Err(e) => {
            warn!("Audio unavailable, continuing without sound: {}", e);
            Box::new(OfflineOutput::new(config.synth.sample_rate))
        }
    }
}

/// Print pending display events to stdout
fn print_events(events: &mut broadcast::Receiver<PulseEvent>, json: bool) -> Result<()> {
    loop {
        match events.try_recv() {
            Ok(event) => {
                if json {
                    println!("{}", serde_json::to_string(&event)?);
                } else if let Some(text) = event.display_text() {
                    println!("{}", text);
                }
            }
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!("Display fell behind, skipped {} events", skipped);
            }
            Err(_) => return Ok(()),
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
