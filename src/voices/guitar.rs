//! Distorted guitar voice.
//!
//! Maximum feedback on a detuned modulator gives a noisy, saturated
//! source that drives three carriers.

use super::{operator, patch};
use crate::synth::params::PatchParams;

pub fn guitar() -> PatchParams {
    patch(
        5,
        7,
        [
            operator(0x71, 0x1A, 0x1F, 0x0D, 0x02, 0x2A),
            operator(0x01, 0x12, 0x1F, 0x0A, 0x02, 0x2A),
            operator(0x32, 0x1C, 0x1F, 0x0A, 0x02, 0x2A),
            operator(0x01, 0x14, 0x1F, 0x0A, 0x02, 0x2A),
        ],
    )
}
