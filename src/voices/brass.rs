//! Brass voice.
//!
//! Moderate attack on the modulators makes the tone open up a moment
//! after the note starts, which reads as a player's breath.

use super::{operator, patch};
use crate::synth::params::PatchParams;

pub fn brass() -> PatchParams {
    patch(
        2,
        5,
        [
            operator(0x01, 0x1E, 0x18, 0x06, 0x03, 0x1A),
            operator(0x01, 0x22, 0x18, 0x06, 0x03, 0x1A),
            operator(0x01, 0x14, 0x1A, 0x05, 0x03, 0x1A),
            operator(0x01, 0x10, 0x1A, 0x05, 0x03, 0x1A),
        ],
    )
}
