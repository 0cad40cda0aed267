//! Lead voice.
//!
//! One modulator driving three carriers at once. The carriers sit at
//! different ratios and the modulator is detuned, so the sum beats gently
//! and cuts through a mix.
//!
//! # How It Works
//!
//! 1. Algorithm 5: op1 modulates op2, op3 and op4 in parallel
//! 2. Feedback 6 turns op1 into a near-sawtooth modulator
//! 3. Op3 runs an octave up for brightness
//! 4. Sustain rates are low, so held notes keep singing
//!
//! # Variations
//!
//! - Raise op1 TL = softer, flute-like lead
//! - Enable AM on the carriers with an LFO = tremolo lead

use super::{operator, patch};
use crate::synth::params::PatchParams;

/// Bright, sustaining synth lead.
pub fn lead() -> PatchParams {
    patch(
        5,
        6,
        [
            operator(0x31, 0x1C, 0x1F, 0x08, 0x02, 0x1F),
            operator(0x01, 0x14, 0x1F, 0x06, 0x02, 0x1F),
            operator(0x02, 0x18, 0x1F, 0x06, 0x02, 0x1F),
            operator(0x01, 0x10, 0x1F, 0x06, 0x02, 0x1F),
        ],
    )
}
