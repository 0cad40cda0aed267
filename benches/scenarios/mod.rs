//! Real-world scenario benchmarks.
//!
//! Voices rendered at a host rate the way an audio callback drives them,
//! and instrument files loaded the way a patch browser would.

mod codec;
mod voices;

pub use codec::bench_codec;
pub use voices::bench_voices;
