//! Bass voice.
//!
//! A four-operator serial stack. Every modulator feeds the next, so the
//! carrier sees a deep, compound modulation that gives a punchy, growling
//! attack which settles as the modulators decay.
//!
//! # How It Works
//!
//! 1. Algorithm 0 chains op1 -> op2 -> op3 -> op4
//! 2. Feedback 5 on op1 adds grit to the top of the chain
//! 3. Op3 is switched off (TL 127), leaving a three-stage chain
//! 4. Modulators decay faster than the carrier, so brightness falls first
//!
//! # Variations
//!
//! - Lower op2 TL = more aggressive "slap"
//! - Raise op2 multiple = metallic, reedy bass
//! - Slower carrier release = legato bass lines

use super::{operator, patch};
use crate::synth::params::PatchParams;

/// Deep synth bass with a punchy attack.
pub fn bass() -> PatchParams {
    patch(
        0,
        5,
        [
            operator(0x01, 0x20, 0x1F, 0x08, 0x04, 0x1A),
            operator(0x02, 0x28, 0x1F, 0x0A, 0x05, 0x18),
            operator(0x00, 0x7F, 0x00, 0x00, 0x00, 0x0F),
            operator(0x01, 0x08, 0x1F, 0x06, 0x03, 0x1C),
        ],
    )
}
