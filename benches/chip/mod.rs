//! Benchmarks for register-level chip primitives.

mod envelope;
mod generate;

pub use envelope::bench_envelope;
pub use generate::bench_generate;
