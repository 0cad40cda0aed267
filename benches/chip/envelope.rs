//! Benchmarks for the envelope generator state machine.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use opn2_fm::chip::{EnvelopeGenerator, SsgEg};

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("chip/envelope");

    for &size in BLOCK_SIZES {
        // Attack phase (exponential approach)
        let mut env = EnvelopeGenerator::new();
        env.set_attack_rate(20);
        env.key_on();
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, &size| {
            b.iter(|| {
                for _ in 0..size {
                    black_box(env.tick());
                }
                black_box(env.attenuation())
            })
        });

        // Decay/sustain (linear ramp)
        let mut env = EnvelopeGenerator::new();
        env.set_decay_rate(4);
        env.set_sustain_rate(2);
        env.key_on();
        group.bench_with_input(BenchmarkId::new("decay", size), &size, |b, &size| {
            b.iter(|| {
                for _ in 0..size {
                    black_box(env.tick());
                }
                black_box(env.attenuation())
            })
        });

        // SSG-EG looping: threshold checks every tick
        let mut env = EnvelopeGenerator::new();
        env.set_decay_rate(31);
        env.set_ssg(SsgEg::from_register(0x0A));
        env.key_on();
        group.bench_with_input(BenchmarkId::new("ssg_loop", size), &size, |b, &size| {
            b.iter(|| {
                for _ in 0..size {
                    black_box(env.tick());
                }
                black_box(env.attenuation())
            })
        });
    }

    group.finish();
}
