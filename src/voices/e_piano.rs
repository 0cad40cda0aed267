//! Electric piano voice.
//!
//! Two independent modulator/carrier pairs. One pair uses a high modulator
//! ratio for the metallic "tine" on the attack, the other gives the body.

use super::{operator, patch};
use crate::synth::params::PatchParams;

/// Tine-style electric piano.
pub fn e_piano() -> PatchParams {
    patch(
        4,
        3,
        [
            operator(0x01, 0x27, 0x1F, 0x0A, 0x04, 0x26),
            operator(0x0E, 0x1E, 0x1F, 0x0C, 0x05, 0x26),
            operator(0x01, 0x18, 0x1F, 0x08, 0x04, 0x26),
            operator(0x01, 0x14, 0x1F, 0x08, 0x04, 0x26),
        ],
    )
}
