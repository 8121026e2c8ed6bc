//! Integration tests for trivox-config.
//!
//! These tests load patches from disk and drive an engine with them.

use std::fs;

use tempfile::TempDir;
use trivox_config::{ConfigError, Patch};
use trivox_synth::{MidiEvent, PlayMode, SynthEngine, TimedMidiEvent, Waveform};

const PAD: &str = r#"
name = "Slow Pad"
play_mode = "duo"

[params]
oscillatorAType = "triangle"
oscillatorBType = "saw"
amplitudeEnvelopeAttack = 0.2
amplitudeEnvelopeRelease = 1.5
masterGain = 0.6
"#;

/// A patch written to disk loads, validates and shapes the rendered sound.
#[test]
fn load_apply_and_render() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("pad.toml");
    fs::write(&path, PAD).expect("write patch");

    let patch = Patch::load(&path).expect("load patch");
    assert_eq!(patch.name.as_deref(), Some("Slow Pad"));
    patch.validate().expect("valid");

    let mut engine = SynthEngine::new();
    engine.prepare(44100.0, 256);
    patch.apply(&mut engine).expect("apply");

    let events: Vec<_> = [60, 64, 67]
        .into_iter()
        .map(|note| TimedMidiEvent::at_start(MidiEvent::NoteOn { note, velocity: 100 }))
        .collect();
    let mut buf = vec![0.0f32; 256];
    engine.process(&mut [&mut buf[..]], &events);

    assert_eq!(engine.play_mode(), PlayMode::Duophonic);
    assert_eq!(engine.active_voice_count(), 2, "third note dropped in duo mode");
    assert_eq!(engine.oscillator_a_type(), Waveform::Triangle);
    assert_eq!(engine.oscillator_b_type(), Waveform::Saw);
    assert!(buf.iter().all(|s| s.is_finite()));
    assert!(buf.iter().any(|&s| s != 0.0));
}

/// Missing files surface as read errors carrying the path.
#[test]
fn missing_file_reports_path() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("absent.toml");
    let err = Patch::load(&path).expect_err("missing file");
    match err {
        ConfigError::ReadFile { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected ReadFile, got {other:?}"),
    }
}

/// Malformed TOML surfaces as a parse error.
#[test]
fn malformed_file_reports_parse_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[params\nmasterGain = ").expect("write patch");
    assert!(matches!(Patch::load(&path), Err(ConfigError::TomlParse(_))));
}

/// Validation problems do not stop a clamping apply.
#[test]
fn invalid_ranges_still_apply_clamped() {
    let patch = Patch::from_toml(
        r#"
        [params]
        masterGain = 4.0
        amplitudeEnvelopeDecay = 10
        "#,
    )
    .expect("parses");
    assert_eq!(patch.problems().len(), 2);

    let mut engine = SynthEngine::new();
    patch.apply(&mut engine).expect("clamps");
    assert_eq!(engine.master_gain(), 1.0);
    assert_eq!(engine.amplitude_envelope_params().decay, 5.0);
}
