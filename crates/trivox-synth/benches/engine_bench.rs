//! Criterion benchmarks for trivox-synth components
//!
//! Run with: cargo bench -p trivox-synth

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use trivox_synth::{
    EnvelopeGenerator, EnvelopeParams, MidiEvent, Oscillator, PlayMode, SynthEngine,
    TimedMidiEvent, Waveform,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn note_on(note: u8) -> TimedMidiEvent {
    TimedMidiEvent::at_start(MidiEvent::NoteOn {
        note,
        velocity: 100,
    })
}

// ============================================================================
// Oscillator benchmarks
// ============================================================================

fn bench_oscillator_waveforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("Oscillator");

    for waveform in Waveform::ALL {
        for &block_size in BLOCK_SIZES {
            let mut osc = Oscillator::new();
            osc.set_waveform(waveform);
            osc.set_frequency(440.0, SAMPLE_RATE);

            group.bench_with_input(
                BenchmarkId::new(waveform.name(), block_size),
                &block_size,
                |b, &size| {
                    b.iter(|| {
                        let mut sum = 0.0f32;
                        for _ in 0..size {
                            sum += osc.process();
                        }
                        black_box(sum)
                    })
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Envelope benchmarks
// ============================================================================

fn bench_envelope_full_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("Envelope_FullCycle");

    group.bench_function("1sec_cycle", |b| {
        let mut env = EnvelopeGenerator::new(SAMPLE_RATE);
        env.set_params(EnvelopeParams::new(0.05, 0.1, 0.6, 0.3));

        b.iter(|| {
            env.reset();
            env.note_on();

            let mut sum = 0.0f32;
            for _ in 0..24000 {
                sum += env.next_sample();
            }
            env.note_off();
            for _ in 0..24000 {
                sum += env.next_sample();
            }
            black_box(sum)
        })
    });

    group.finish();
}

// ============================================================================
// Engine benchmarks
// ============================================================================

fn bench_engine_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("SynthEngine_Voices");

    for voices in [1u8, 4, 8] {
        for &block_size in BLOCK_SIZES {
            let mut engine = SynthEngine::new();
            engine.prepare(SAMPLE_RATE, block_size);
            engine.set_oscillator_a_type(Waveform::Saw);
            engine.set_oscillator_b_type(Waveform::Square);

            let chord: Vec<_> = (0..voices).map(|i| note_on(48 + 4 * i)).collect();
            let mut left = vec![0.0f32; block_size];
            let mut right = vec![0.0f32; block_size];
            engine.process(&mut [&mut left, &mut right], &chord);

            group.bench_with_input(
                BenchmarkId::new(format!("{voices}_voices"), block_size),
                &block_size,
                |b, _| {
                    b.iter(|| {
                        engine.process(&mut [&mut left, &mut right], &[]);
                        black_box(left[0])
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_engine_note_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("SynthEngine_NoteChurn");

    group.bench_function("note_on_off_per_block", |b| {
        let mut engine = SynthEngine::new();
        engine.prepare(SAMPLE_RATE, 256);
        let mut buf = vec![0.0f32; 256];
        let mut note = 36u8;

        b.iter(|| {
            let events = [
                note_on(note),
                TimedMidiEvent::at_start(MidiEvent::NoteOff { note, velocity: 0 }),
            ];
            engine.process(&mut [&mut buf[..]], &events);
            note = if note >= 96 { 36 } else { note + 1 };
            black_box(buf[0])
        })
    });

    group.bench_function("play_mode_switch", |b| {
        let mut engine = SynthEngine::new();
        engine.prepare(SAMPLE_RATE, 256);
        let mut buf = vec![0.0f32; 256];
        let mut mono = false;

        b.iter(|| {
            mono = !mono;
            let mode = if mono {
                PlayMode::Monophonic
            } else {
                PlayMode::Polyphonic
            };
            engine.request_play_mode_change(mode);
            engine.process(&mut [&mut buf[..]], &[note_on(60), note_on(64)]);
            black_box(buf[0])
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_oscillator_waveforms,
    bench_envelope_full_cycle,
    bench_engine_voices,
    bench_engine_note_churn,
);

criterion_main!(benches);
