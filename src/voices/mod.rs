//! Factory patches for common FM timbres.
//!
//! Each function returns a complete [`PatchParams`] ready to hand to a
//! voice. Use these as starting points for your own sounds, or study them
//! to learn which algorithms and ratios give which character.
//!
//! # Example
//!
//! ```ignore
//! use opn2_fm::{synth::FmVoice, voices, EngineConfig};
//!
//! let mut voice = FmVoice::new(EngineConfig::default());
//! voice.set_patch(voices::e_piano());
//! voice.note_on(60, 100);
//! ```
//!
//! Operator data is written the way a driver writes registers: one packed
//! byte per register, in natural operator order.

mod bass;
mod brass;
mod e_piano;
mod guitar;
mod lead;
mod organ;
mod strings;

pub use bass::bass;
pub use brass::brass;
pub use e_piano::e_piano;
pub use guitar::guitar;
pub use lead::lead;
pub use organ::organ;
pub use strings::strings;

use crate::synth::params::{GlobalParams, OperatorParams, PatchParams};

/// Every factory patch with its display name, in program-change order.
pub const PRESETS: [(&str, fn() -> PatchParams); 7] = [
    ("E.Piano", e_piano),
    ("Bass", bass),
    ("Organ", organ),
    ("Brass", brass),
    ("Strings", strings),
    ("Lead", lead),
    ("Guitar", guitar),
];

/// Look a preset up by name, ignoring case and punctuation.
pub fn by_name(name: &str) -> Option<PatchParams> {
    let wanted = normalise(name);
    PRESETS
        .iter()
        .find(|(preset, _)| normalise(preset) == wanted)
        .map(|(_, build)| build())
}

/// Preset for a program number, wrapping around the list.
pub fn by_program(program: u8) -> (&'static str, PatchParams) {
    let (name, build) = PRESETS[program as usize % PRESETS.len()];
    (name, build())
}

fn normalise(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Unpack one operator from its 0x30/0x40/0x50/0x60/0x70/0x80 register bytes.
fn operator(dt_mul: u8, tl: u8, ks_ar: u8, am_dr: u8, sr: u8, sl_rr: u8) -> OperatorParams {
    OperatorParams {
        total_level: tl & 0x7F,
        attack_rate: ks_ar & 0x1F,
        decay_rate: am_dr & 0x1F,
        sustain_rate: sr & 0x1F,
        sustain_level: sl_rr >> 4,
        release_rate: sl_rr & 0x0F,
        multiple: dt_mul & 0x0F,
        detune: (dt_mul >> 4) & 7,
        key_scale: ks_ar >> 6,
        am_enabled: am_dr & 0x80 != 0,
        ssg_enabled: false,
        ssg_mode: 0,
    }
}

fn patch(algorithm: u8, feedback: u8, operators: [OperatorParams; 4]) -> PatchParams {
    PatchParams {
        global: GlobalParams {
            algorithm,
            feedback,
            ..GlobalParams::default()
        },
        operators,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::Algorithm;

    #[test]
    fn register_bytes_unpack() {
        let op = operator(0x71, 0x1A, 0x9F, 0x8D, 0x02, 0x2A);
        assert_eq!(op.detune, 7);
        assert_eq!(op.multiple, 1);
        assert_eq!(op.total_level, 0x1A);
        assert_eq!(op.key_scale, 2);
        assert_eq!(op.attack_rate, 31);
        assert!(op.am_enabled);
        assert_eq!(op.decay_rate, 13);
        assert_eq!(op.sustain_level, 2);
        assert_eq!(op.release_rate, 10);
    }

    #[test]
    fn every_preset_has_an_audible_carrier() {
        for (name, build) in PRESETS {
            let params = build();
            let algorithm = Algorithm::new(params.global.algorithm);
            let loud = (0..4)
                .filter(|&op| algorithm.is_carrier(op))
                .any(|op| params.operators[op].total_level < 0x40);
            assert!(loud, "{name} has no audible carrier");
        }
    }

    #[test]
    fn lookup_by_name_and_program() {
        assert_eq!(by_name("e-piano"), Some(e_piano()));
        assert_eq!(by_name("STRINGS"), Some(strings()));
        assert_eq!(by_name("kazoo"), None);

        assert_eq!(by_program(1), ("Bass", bass()));
        assert_eq!(by_program(PRESETS.len() as u8).0, "E.Piano");
    }
}
