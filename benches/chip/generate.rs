//! Benchmarks for `Chip::generate` across algorithms and channel counts.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use opn2_fm::chip::{Chip, FnumBlock, OperatorField, OPERATOR_SLOT};
use opn2_fm::synth::PatchParams;
use opn2_fm::voices;

use crate::BLOCK_SIZES;

/// Program `channel` with `patch` and key it on at `hz`.
fn play(chip: &mut Chip, channel: usize, patch: &PatchParams, hz: f64) {
    let part = (channel / 3) as u8;
    let offset = (channel % 3) as u8;
    chip.write(part, 0xB0 + offset, patch.global.feedback_algorithm_register());
    chip.write(part, 0xB4 + offset, patch.global.stereo_lfo_register());
    for (op, params) in patch.operators.iter().enumerate() {
        let slot = OPERATOR_SLOT[op] as u8 * 4;
        for base in (0x30..=0x90).step_by(0x10) {
            if let Some(field) = OperatorField::from_address(base) {
                chip.write(part, base + slot + offset, params.register_value(field));
            }
        }
    }
    let (high, low) = FnumBlock::from_hz(hz, chip.clock()).registers();
    chip.write(part, 0xA4 + offset, high);
    chip.write(part, 0xA0 + offset, low);
    let key_channel = if part == 0 { offset } else { offset + 4 };
    chip.write(0, 0x28, 0xF0 | key_channel);
}

pub fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("chip/generate");

    for &size in BLOCK_SIZES {
        // === ONE CHANNEL, PER ALGORITHM ===
        // Serial chain vs fully additive: the routing cost difference
        for (name, patch) in [("bass_alg0", voices::bass()), ("organ_alg7", voices::organ())] {
            let mut chip = Chip::default();
            play(&mut chip, 0, &patch, 220.0);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &size| {
                b.iter(|| {
                    for _ in 0..size {
                        black_box(chip.generate());
                    }
                })
            });
        }

        // === ALL SIX CHANNELS ===
        // Worst case: nothing is idle
        let mut chip = Chip::default();
        for channel in 0..6 {
            play(&mut chip, channel, &voices::e_piano(), 110.0 * (channel + 1) as f64);
        }
        group.bench_with_input(BenchmarkId::new("six_channels", size), &size, |b, &size| {
            b.iter(|| {
                for _ in 0..size {
                    black_box(chip.generate());
                }
            })
        });

        // === IDLE CHIP ===
        // Baseline: every channel is skipped
        let mut idle = Chip::default();
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, &size| {
            b.iter(|| {
                for _ in 0..size {
                    black_box(idle.generate());
                }
            })
        });
    }

    group.finish();
}
