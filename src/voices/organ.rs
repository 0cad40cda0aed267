//! Organ voice.
//!
//! Additive synthesis: all four operators are carriers at harmonic
//! ratios, like drawbars on a tonewheel organ.
//!
//! # How It Works
//!
//! 1. Algorithm 7 sums four unmodulated sines
//! 2. Multiples 1, 2, 3, 4 give fundamental, octave, twelfth and two octaves
//! 3. Each higher partial is a little quieter
//! 4. No decay, fast release: the note is flat while held
//!
//! # Variations
//!
//! - Add feedback = buzzier, more "percussive" organ
//! - Route an LFO to FM = rotary-speaker vibrato

use super::{operator, patch};
use crate::synth::params::PatchParams;

/// Drawbar organ.
pub fn organ() -> PatchParams {
    patch(
        7,
        0,
        [
            operator(0x01, 0x20, 0x1F, 0x00, 0x00, 0x0F),
            operator(0x02, 0x24, 0x1F, 0x00, 0x00, 0x0F),
            operator(0x03, 0x28, 0x1F, 0x00, 0x00, 0x0F),
            operator(0x04, 0x2C, 0x1F, 0x00, 0x00, 0x0F),
        ],
    )
}
