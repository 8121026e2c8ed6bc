//! Offline rendering of notes or MIDI files to WAV.

use anyhow::{Context, Result, bail, ensure};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use trivox_config::Patch;
use trivox_core::{NoteName, ParameterInfo, decibels_to_gain, gain_to_decibels};
use trivox_synth::{MidiEvent, PlayMode, SynthEngine, TimedMidiEvent, params};

use crate::midi_file::{self, ScheduledEvent};
use crate::wav;

/// Play modes for CLI
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CliPlayMode {
    Mono,
    Duo,
    Poly,
}

impl From<CliPlayMode> for PlayMode {
    fn from(mode: CliPlayMode) -> Self {
        match mode {
            CliPlayMode::Mono => PlayMode::Monophonic,
            CliPlayMode::Duo => PlayMode::Duophonic,
            CliPlayMode::Poly => PlayMode::Polyphonic,
        }
    }
}

#[derive(Args)]
pub struct RenderArgs {
    /// MIDI notes to hold together (comma-separated, e.g. "60,64,67")
    #[arg(long, value_delimiter = ',', required_unless_present = "midi", conflicts_with = "midi")]
    notes: Vec<u8>,

    /// Standard MIDI File to render instead of notes
    #[arg(long, value_name = "FILE")]
    midi: Option<PathBuf>,

    /// Output WAV file
    #[arg(short, long, value_name = "OUTPUT")]
    out: PathBuf,

    /// Total length in seconds when rendering notes
    #[arg(long, default_value = "2.0")]
    duration: f32,

    /// How long notes are held before note-off, in seconds
    #[arg(long, default_value = "1.5")]
    hold: f32,

    /// Note velocity (1-127)
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u8).range(1..=127))]
    velocity: u8,

    /// Seconds rendered after the last MIDI file event
    #[arg(long, default_value = "1.0")]
    tail: f32,

    /// Patch file applied before rendering
    #[arg(long, value_name = "PATCH")]
    patch: Option<PathBuf>,

    /// Play mode (overrides the patch)
    #[arg(long, value_enum)]
    play_mode: Option<CliPlayMode>,

    /// Master gain in dB, at most 0 (overrides the patch)
    #[arg(long, value_name = "DB", allow_hyphen_values = true)]
    master_db: Option<f32>,

    /// Sample rate
    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    /// Block size in samples
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Output channels
    #[arg(long, default_value = "2")]
    channels: u16,
}

pub fn run(args: RenderArgs) -> Result<()> {
    ensure!(args.sample_rate > 0, "sample rate must be positive");
    ensure!(args.block_size > 0, "block size must be positive");
    ensure!(args.channels > 0, "need at least one output channel");

    let sample_rate = args.sample_rate;
    let (timeline, total_samples) = match &args.midi {
        Some(path) => {
            let timeline = midi_file::load(path, sample_rate)?;
            let last = timeline.last().map_or(0, |e| e.sample);
            let total = last + seconds_to_samples(args.tail, sample_rate);
            tracing::info!(
                file = %path.display(),
                events = timeline.len(),
                "rendering MIDI file"
            );
            (timeline, total)
        }
        None => {
            ensure!(args.duration > 0.0, "duration must be positive");
            ensure!(args.hold >= 0.0, "hold must not be negative");
            if let Some(&bad) = args.notes.iter().find(|&&n| n > 127) {
                bail!("note {bad} is outside 0-127");
            }
            let names: Vec<String> = args.notes.iter().map(|&n| NoteName(n).to_string()).collect();
            tracing::info!(notes = %names.join(", "), "rendering notes");
            let timeline = note_timeline(
                &args.notes,
                args.velocity,
                seconds_to_samples(args.hold, sample_rate),
            );
            (timeline, seconds_to_samples(args.duration, sample_rate))
        }
    };

    let mut engine = SynthEngine::new();
    engine.prepare(sample_rate as f32, args.block_size);

    if let Some(path) = &args.patch {
        let patch = Patch::load(path)
            .with_context(|| format!("failed to load patch {}", path.display()))?;
        for problem in patch.problems() {
            tracing::warn!(%problem, "patch value will be clamped");
        }
        patch
            .apply(&mut engine)
            .with_context(|| format!("failed to apply patch {}", path.display()))?;
    }
    if let Some(mode) = args.play_mode {
        engine.request_play_mode_change(mode.into());
    }
    if let Some(db) = args.master_db {
        ensure!(db.is_finite(), "master gain must be a finite dB value");
        engine.set_param(params::MASTER_GAIN, decibels_to_gain(db));
    }

    let samples = render_timeline(
        &mut engine,
        &timeline,
        total_samples,
        usize::from(args.channels),
        args.block_size,
    );

    wav::write_interleaved(&args.out, &samples, sample_rate, args.channels)?;

    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    tracing::info!(
        out = %args.out.display(),
        seconds = total_samples as f64 / f64::from(sample_rate),
        peak_db = gain_to_decibels(peak, PEAK_FLOOR_DB),
        "render complete"
    );
    Ok(())
}

/// Reported peak for silent renders.
const PEAK_FLOOR_DB: f32 = -96.0;

fn seconds_to_samples(seconds: f32, sample_rate: u32) -> u64 {
    (f64::from(seconds.max(0.0)) * f64::from(sample_rate)).round() as u64
}

/// Note-ons at zero, note-offs at `hold`.
fn note_timeline(notes: &[u8], velocity: u8, hold: u64) -> Vec<ScheduledEvent> {
    let ons = notes
        .iter()
        .map(|&note| ScheduledEvent::new(0, MidiEvent::NoteOn { note, velocity }));
    let offs = notes
        .iter()
        .map(|&note| ScheduledEvent::new(hold, MidiEvent::NoteOff { note, velocity: 0 }));
    ons.chain(offs).collect()
}

/// Render `total_samples` frames block by block, delivering each event to
/// the block that contains it. Returns interleaved samples.
pub fn render_timeline(
    engine: &mut SynthEngine,
    timeline: &[ScheduledEvent],
    total_samples: u64,
    channels: usize,
    block_size: usize,
) -> Vec<f32> {
    let total = total_samples as usize;
    let mut interleaved = Vec::with_capacity(total * channels);
    let mut buffers = vec![vec![0.0f32; block_size]; channels];
    let mut events = Vec::new();
    let mut next_event = 0;
    let mut start = 0usize;

    while start < total {
        let len = block_size.min(total - start);
        let end = (start + len) as u64;

        events.clear();
        while let Some(scheduled) = timeline.get(next_event)
            && scheduled.sample < end
        {
            let offset = scheduled.sample.saturating_sub(start as u64) as u32;
            events.push(TimedMidiEvent::new(offset, scheduled.event));
            next_event += 1;
        }

        let mut outputs: Vec<&mut [f32]> = buffers.iter_mut().map(|b| &mut b[..len]).collect();
        engine.process(&mut outputs, &events);

        for frame in 0..len {
            for buffer in &buffers {
                interleaved.push(buffer[frame]);
            }
        }
        start += len;
    }

    interleaved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_timeline_orders_ons_before_offs() {
        let timeline = note_timeline(&[60, 64], 90, 100);
        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline[0], ScheduledEvent::new(0, MidiEvent::NoteOn { note: 60, velocity: 90 }));
        assert_eq!(timeline[3], ScheduledEvent::new(100, MidiEvent::NoteOff { note: 64, velocity: 0 }));
    }

    #[test]
    fn render_length_and_interleaving() {
        let mut engine = SynthEngine::new();
        engine.prepare(44100.0, 64);
        let timeline = note_timeline(&[60], 100, 100);
        let samples = render_timeline(&mut engine, &timeline, 1000, 2, 64);

        assert_eq!(samples.len(), 2000);
        for frame in samples.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert!(samples.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn events_land_in_their_block() {
        let mut engine = SynthEngine::new();
        engine.prepare(44100.0, 64);
        let timeline = [ScheduledEvent::new(
            200,
            MidiEvent::NoteOn {
                note: 69,
                velocity: 100,
            },
        )];
        let samples = render_timeline(&mut engine, &timeline, 256, 1, 64);

        // The block containing sample 200 starts at 192.
        assert!(samples[..192].iter().all(|&s| s == 0.0));
        assert!(samples[192..].iter().any(|&s| s != 0.0));
    }

    #[test]
    fn seconds_conversion_rounds() {
        assert_eq!(seconds_to_samples(0.5, 44100), 22050);
        assert_eq!(seconds_to_samples(-1.0, 44100), 0);
        assert_eq!(PlayMode::from(CliPlayMode::Duo), PlayMode::Duophonic);
    }
}
