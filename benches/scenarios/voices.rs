//! Benchmarks for `FmVoice::render` at host rates.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use opn2_fm::synth::FmVoice;
use opn2_fm::{voices, EngineConfig};

use crate::BLOCK_SIZES;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size * 2];

        // === HELD NOTE AT 48kHz ===
        // Downsampling from the native rate, the common desktop case
        let mut voice = FmVoice::new(EngineConfig::default());
        voice.set_patch(voices::e_piano());
        voice.note_on(57, 100);
        group.bench_with_input(BenchmarkId::new("e_piano_48k", size), &size, |b, _| {
            b.iter(|| voice.render(black_box(48_000.0), black_box(&mut buffer)))
        });

        // === HELD NOTE AT 96kHz ===
        // Upsampling: fewer chip samples per output frame
        let mut voice = FmVoice::new(EngineConfig::default());
        voice.set_patch(voices::strings());
        voice.note_on(64, 100);
        group.bench_with_input(BenchmarkId::new("strings_96k", size), &size, |b, _| {
            b.iter(|| voice.render(black_box(96_000.0), black_box(&mut buffer)))
        });

        // === PATCH CHANGE EVERY BLOCK ===
        // Worst case for the staged-parameter path: full register rewrite
        let mut voice = FmVoice::new(EngineConfig::default());
        let patch = voices::brass();
        voice.set_patch(patch);
        voice.note_on(60, 100);
        group.bench_with_input(BenchmarkId::new("brass_restaged", size), &size, |b, _| {
            b.iter(|| {
                voice.set_patch(patch);
                voice.render(black_box(48_000.0), black_box(&mut buffer))
            })
        });

        // === SIX-VOICE CHORD ===
        // A full pool, mixed
        let mut chord: Vec<FmVoice> = [48, 55, 60, 64, 67, 72]
            .into_iter()
            .map(|note| {
                let mut voice = FmVoice::new(EngineConfig::default());
                voice.set_patch(voices::organ());
                voice.note_on(note, 90);
                voice
            })
            .collect();
        let mut mix = vec![0.0f32; size * 2];
        group.bench_with_input(BenchmarkId::new("organ_chord", size), &size, |b, _| {
            b.iter(|| {
                mix.fill(0.0);
                for voice in &mut chord {
                    voice.render(48_000.0, &mut buffer);
                    for (m, s) in mix.iter_mut().zip(&buffer) {
                        *m += s;
                    }
                }
                black_box(&mix);
            })
        });
    }

    group.finish();
}
