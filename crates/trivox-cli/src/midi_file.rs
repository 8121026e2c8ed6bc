//! Standard MIDI File loading.
//!
//! All tracks are merged into one timeline. Tick positions are converted to
//! sample positions through the file's tempo map (120 BPM until the first
//! tempo event). Only note, controller and pitch-bend messages are kept;
//! channels are ignored.

use anyhow::{Context, Result, bail};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::path::Path;
use trivox_synth::MidiEvent;

/// Microseconds per quarter note at 120 BPM.
const DEFAULT_TEMPO_US: u32 = 500_000;

/// A MIDI event at an absolute sample position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    /// Sample position from the start of the render.
    pub sample: u64,
    /// The event.
    pub event: MidiEvent,
}

impl ScheduledEvent {
    /// Event at `sample`.
    pub fn new(sample: u64, event: MidiEvent) -> Self {
        Self { sample, event }
    }
}

/// Load a MIDI file as a sample-timed event list.
pub fn load(path: &Path, sample_rate: u32) -> Result<Vec<ScheduledEvent>> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse(&data, sample_rate).with_context(|| format!("failed to parse {}", path.display()))
}

/// Parse SMF bytes into a sample-timed event list, sorted by position.
pub fn parse(data: &[u8], sample_rate: u32) -> Result<Vec<ScheduledEvent>> {
    let smf = Smf::parse(data)?;
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) => u64::from(tpb.as_int()),
        Timing::Timecode(..) => bail!("SMPTE timecode timing is not supported"),
    };
    if ticks_per_beat == 0 {
        bail!("file declares zero ticks per beat");
    }

    let mut tempo_changes = Vec::new();
    let mut events = Vec::new();
    for track in &smf.tracks {
        let mut tick = 0u64;
        for event in track {
            tick += u64::from(event.delta.as_int());
            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(us)) => {
                    tempo_changes.push((tick, us.as_int()));
                }
                TrackEventKind::Midi { message, .. } => {
                    if let Some(event) = convert(message) {
                        events.push((tick, event));
                    }
                }
                _ => {}
            }
        }
    }

    // Stable: simultaneous events keep track order.
    events.sort_by_key(|&(tick, _)| tick);
    let tempo = TempoMap::new(tempo_changes, ticks_per_beat);

    tracing::debug!(
        tracks = smf.tracks.len(),
        ticks_per_beat,
        events = events.len(),
        "parsed MIDI file"
    );

    let sample_rate = f64::from(sample_rate);
    Ok(events
        .into_iter()
        .map(|(tick, event)| {
            let sample = (tempo.seconds_at(tick) * sample_rate).round() as u64;
            ScheduledEvent::new(sample, event)
        })
        .collect())
}

fn convert(message: MidiMessage) -> Option<MidiEvent> {
    match message {
        MidiMessage::NoteOn { key, vel } => Some(MidiEvent::NoteOn {
            note: key.as_int(),
            velocity: vel.as_int(),
        }),
        MidiMessage::NoteOff { key, vel } => Some(MidiEvent::NoteOff {
            note: key.as_int(),
            velocity: vel.as_int(),
        }),
        MidiMessage::Controller { controller, value } => Some(MidiEvent::Controller {
            number: controller.as_int(),
            value: value.as_int(),
        }),
        MidiMessage::PitchBend { bend } => Some(MidiEvent::PitchWheel(bend.0.as_int())),
        _ => None,
    }
}

/// Tick to seconds conversion over tempo segments.
#[derive(Debug)]
struct TempoMap {
    /// (start tick, seconds at start tick, microseconds per beat)
    segments: Vec<(u64, f64, u32)>,
    ticks_per_beat: u64,
}

impl TempoMap {
    fn new(mut changes: Vec<(u64, u32)>, ticks_per_beat: u64) -> Self {
        changes.sort_by_key(|&(tick, _)| tick);
        let mut map = Self {
            segments: vec![(0, 0.0, DEFAULT_TEMPO_US)],
            ticks_per_beat,
        };
        for (tick, us) in changes {
            let seconds = map.seconds_at(tick);
            match map.segments.last_mut() {
                Some(last) if last.0 == tick => *last = (tick, seconds, us),
                _ => map.segments.push((tick, seconds, us)),
            }
        }
        map
    }

    fn seconds_at(&self, tick: u64) -> f64 {
        let (start, seconds, us) = self
            .segments
            .iter()
            .rev()
            .find(|(start, ..)| *start <= tick)
            .copied()
            .unwrap_or((0, 0.0, DEFAULT_TEMPO_US));
        seconds + (tick - start) as f64 * f64::from(us) / 1_000_000.0 / self.ticks_per_beat as f64
    }
}
