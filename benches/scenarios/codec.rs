//! Benchmarks for the .fui instrument codec.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use opn2_fm::patch::{fui, Instrument};
use opn2_fm::voices;

pub fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/codec");

    for version in [100u16, 224] {
        let mut instrument = Instrument::from_patch_params("Lead", &voices::lead());
        instrument.version = version;
        let bytes = fui::encode(&instrument);

        group.bench_with_input(BenchmarkId::new("decode", version), &bytes, |b, bytes| {
            b.iter(|| fui::decode(black_box(bytes)))
        });
        group.bench_with_input(BenchmarkId::new("encode", version), &instrument, |b, ins| {
            b.iter(|| fui::encode(black_box(ins)))
        });
    }

    group.finish();
}
