//! Instrument descriptors as stored by the external tracker format, and
//! conversion to the parameters a voice plays.

pub mod fui;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chip::NUM_OPERATORS;
use crate::synth::params::{GlobalParams, OperatorParams, PatchParams};

/// Format version written for new instruments.
pub const DEFAULT_VERSION: u16 = 224;

/// Tracker detune (3 = centre) to chip detune (sign-magnitude).
const DETUNE_TO_CHIP: [u8; 8] = [7, 6, 5, 0, 1, 2, 3, 4];
/// Chip detune to tracker detune.
const DETUNE_FROM_CHIP: [u8; 8] = [3, 4, 5, 6, 7, 2, 1, 0];

/// One operator in the tracker's register domain. Fields the chip does not
/// use (OPL/OPM extras) are carried so files round-trip unchanged.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmOperator {
    pub enabled: bool,
    pub am: u8,
    pub ar: u8,
    pub dr: u8,
    pub mult: u8,
    pub rr: u8,
    pub sl: u8,
    pub tl: u8,
    pub dt2: u8,
    pub rs: u8,
    pub dt: u8,
    pub d2r: u8,
    pub ssg_env: u8,
    pub dam: u8,
    pub dvb: u8,
    pub egt: u8,
    pub ksl: u8,
    pub sus: u8,
    pub vib: u8,
    pub ws: u8,
    pub ksr: u8,
    pub kvs: u8,
}

impl Default for FmOperator {
    fn default() -> Self {
        Self {
            enabled: true,
            am: 0,
            ar: 0,
            dr: 0,
            mult: 0,
            rr: 0,
            sl: 0,
            tl: 0,
            dt2: 0,
            rs: 0,
            dt: 0,
            d2r: 0,
            ssg_env: 0,
            dam: 0,
            dvb: 0,
            egt: 0,
            ksl: 0,
            sus: 0,
            vib: 0,
            ws: 0,
            ksr: 0,
            kvs: 0,
        }
    }
}

impl FmOperator {
    /// Tracker operator to chip parameters. A disabled operator is muted.
    pub fn to_params(&self) -> OperatorParams {
        OperatorParams {
            total_level: if self.enabled { self.tl & 0x7F } else { 0x7F },
            attack_rate: self.ar & 0x1F,
            decay_rate: self.dr & 0x1F,
            sustain_rate: self.d2r & 0x1F,
            sustain_level: self.sl & 0x0F,
            release_rate: self.rr & 0x0F,
            multiple: self.mult & 0x0F,
            detune: DETUNE_TO_CHIP[(self.dt & 7) as usize],
            key_scale: self.rs & 3,
            am_enabled: self.am != 0,
            ssg_enabled: self.ssg_env & 0x08 != 0,
            ssg_mode: self.ssg_env & 0x07,
        }
    }

    pub fn from_params(params: &OperatorParams) -> Self {
        let ssg_env = if params.ssg_enabled {
            0x08 | (params.ssg_mode & 7)
        } else {
            params.ssg_mode & 7
        };
        Self {
            am: params.am_enabled as u8,
            ar: params.attack_rate & 0x1F,
            dr: params.decay_rate & 0x1F,
            mult: params.multiple & 0x0F,
            rr: params.release_rate & 0x0F,
            sl: params.sustain_level & 0x0F,
            tl: params.total_level & 0x7F,
            rs: params.key_scale & 3,
            dt: DETUNE_FROM_CHIP[(params.detune & 7) as usize],
            d2r: params.sustain_rate & 0x1F,
            ssg_env,
            ..Self::default()
        }
    }
}

/// A whole FM instrument. Operators are kept in natural order (1, 2, 3, 4);
/// the file's hardware order is handled by the codec.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub name: String,
    pub version: u16,
    pub algorithm: u8,
    pub feedback: u8,
    pub fms: u8,
    pub ams: u8,
    pub fms2: u8,
    pub ams2: u8,
    pub operator_count: u8,
    pub opll_preset: u8,
    pub block: u8,
    pub operators: [FmOperator; NUM_OPERATORS],
}

impl Default for Instrument {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: DEFAULT_VERSION,
            algorithm: 0,
            feedback: 0,
            fms: 0,
            ams: 0,
            fms2: 0,
            ams2: 0,
            operator_count: 4,
            opll_preset: 0,
            block: 0,
            operators: [FmOperator::default(); NUM_OPERATORS],
        }
    }
}

impl Instrument {
    /// Voice parameters for this instrument. LFO rate and octave, which the
    /// instrument does not carry, come from `base`.
    pub fn to_patch_params(&self, base: &GlobalParams) -> PatchParams {
        PatchParams {
            global: GlobalParams {
                algorithm: self.algorithm & 7,
                feedback: self.feedback & 7,
                ams: self.ams & 3,
                fms: self.fms & 7,
                ..*base
            },
            operators: std::array::from_fn(|op| self.operators[op].to_params()),
        }
    }

    pub fn from_patch_params(name: impl Into<String>, params: &PatchParams) -> Self {
        Self {
            name: name.into(),
            algorithm: params.global.algorithm & 7,
            feedback: params.global.feedback & 7,
            fms: params.global.fms & 7,
            ams: params.global.ams & 3,
            operators: std::array::from_fn(|op| FmOperator::from_params(&params.operators[op])),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detune_tables_are_inverse() {
        for chip in 0..8u8 {
            let tracker = DETUNE_FROM_CHIP[chip as usize];
            assert_eq!(DETUNE_TO_CHIP[tracker as usize], chip);
        }
        // Tracker centre is no detune
        assert_eq!(DETUNE_TO_CHIP[3], 0);
    }

    #[test]
    fn patch_params_survive_instrument_conversion() {
        let mut patch = PatchParams::default();
        patch.global.algorithm = 5;
        patch.global.feedback = 3;
        patch.global.ams = 1;
        patch.global.fms = 6;
        patch.operators[2].detune = 6;
        patch.operators[3].ssg_enabled = true;
        patch.operators[3].ssg_mode = 3;
        patch.operators[1].am_enabled = true;

        let instrument = Instrument::from_patch_params("round trip", &patch);
        assert_eq!(instrument.operators[2].dt, 1);
        assert_eq!(instrument.to_patch_params(&patch.global), patch);
    }

    #[test]
    fn disabled_operator_is_muted() {
        let mut instrument = Instrument::default();
        instrument.operators[1].tl = 10;
        instrument.operators[1].enabled = false;
        let params = instrument.to_patch_params(&GlobalParams::default());
        assert_eq!(params.operators[1].total_level, 127);
        assert_eq!(params.operators[0].total_level, 0);
    }
}
