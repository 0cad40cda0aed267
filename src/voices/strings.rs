//! String pad voice.
//!
//! Slow attack rates on every operator let the modulation swell in with
//! the amplitude, the way a bowed section fades in.

use super::{operator, patch};
use crate::synth::params::PatchParams;

pub fn strings() -> PatchParams {
    patch(
        2,
        4,
        [
            operator(0x01, 0x22, 0x10, 0x02, 0x01, 0x14),
            operator(0x02, 0x26, 0x12, 0x02, 0x01, 0x14),
            operator(0x01, 0x1C, 0x10, 0x02, 0x01, 0x14),
            operator(0x01, 0x18, 0x0E, 0x02, 0x01, 0x14),
        ],
    )
}
