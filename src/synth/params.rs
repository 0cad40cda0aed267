//! Host-facing patch parameters and the lock-free path that delivers them
//! to a playing voice.

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chip::{OperatorField, SsgEg, NUM_OPERATORS};

/// Per-operator settings in chip register units. Natural operator order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorParams {
    /// 0..=127, 0 loudest.
    pub total_level: u8,
    pub attack_rate: u8,
    pub decay_rate: u8,
    pub sustain_rate: u8,
    /// 0..=15, 0 is full level.
    pub sustain_level: u8,
    pub release_rate: u8,
    /// 0..=15, 0 means x0.5.
    pub multiple: u8,
    /// Chip encoding: 0..=3 up, 4..=7 down.
    pub detune: u8,
    pub key_scale: u8,
    pub am_enabled: bool,
    pub ssg_enabled: bool,
    pub ssg_mode: u8,
}

impl Default for OperatorParams {
    fn default() -> Self {
        Self {
            total_level: 0,
            attack_rate: 31,
            decay_rate: 5,
            sustain_rate: 0,
            sustain_level: 1,
            release_rate: 10,
            multiple: 1,
            detune: 0,
            key_scale: 0,
            am_enabled: false,
            ssg_enabled: false,
            ssg_mode: 0,
        }
    }
}

impl OperatorParams {
    /// Packed byte for one of the operator's registers.
    pub fn register_value(&self, field: OperatorField) -> u8 {
        match field {
            OperatorField::DetuneMultiple => ((self.detune & 7) << 4) | (self.multiple & 0x0F),
            OperatorField::TotalLevel => self.total_level & 0x7F,
            OperatorField::KeyScaleAttack => ((self.key_scale & 3) << 6) | (self.attack_rate & 0x1F),
            OperatorField::AmDecay => ((self.am_enabled as u8) << 7) | (self.decay_rate & 0x1F),
            OperatorField::SustainRate => self.sustain_rate & 0x1F,
            OperatorField::SustainLevelRelease => {
                ((self.sustain_level & 0x0F) << 4) | (self.release_rate & 0x0F)
            }
            OperatorField::SsgEg => SsgEg {
                enabled: self.ssg_enabled,
                mode: self.ssg_mode,
            }
            .register(),
        }
    }
}

/// Channel-wide settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalParams {
    pub algorithm: u8,
    pub feedback: u8,
    pub lfo_enabled: bool,
    pub lfo_rate: u8,
    pub ams: u8,
    pub fms: u8,
    /// Transpose in octaves, applied at note-on.
    pub octave: i8,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            algorithm: 4,
            feedback: 5,
            lfo_enabled: false,
            lfo_rate: 0,
            ams: 0,
            fms: 0,
            octave: 0,
        }
    }
}

impl GlobalParams {
    /// Register 0xB0.
    pub fn feedback_algorithm_register(&self) -> u8 {
        ((self.feedback & 7) << 3) | (self.algorithm & 7)
    }

    /// Register 0xB4, both outputs on.
    pub fn stereo_lfo_register(&self) -> u8 {
        0xC0 | ((self.ams & 3) << 4) | (self.fms & 7)
    }

    /// Register 0x22.
    pub fn lfo_register(&self) -> u8 {
        if self.lfo_enabled {
            0x08 | (self.lfo_rate & 7)
        } else {
            0
        }
    }

    pub fn octave_factor(&self) -> f64 {
        2.0_f64.powi(self.octave.clamp(-4, 4) as i32)
    }
}

/// Everything needed to program one channel.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchParams {
    pub global: GlobalParams,
    pub operators: [OperatorParams; NUM_OPERATORS],
}

impl Default for PatchParams {
    /// Algorithm 4 with loud carriers and half-open modulators.
    fn default() -> Self {
        let mut operators = [OperatorParams::default(); NUM_OPERATORS];
        operators[0].total_level = 63;
        operators[2].total_level = 63;
        Self {
            global: GlobalParams::default(),
            operators,
        }
    }
}

#[cfg(feature = "rtrb")]
const PARAM_QUEUE_SIZE: usize = 16;

/// Control-thread side of a voice's parameter queue.
#[cfg(feature = "rtrb")]
pub struct ParamHandle {
    tx: Producer<PatchParams>,
}

#[cfg(feature = "rtrb")]
impl ParamHandle {
    /// Queue a full snapshot. Returns false when the voice has not drained
    /// the queue recently and the snapshot was dropped.
    pub fn publish(&mut self, params: PatchParams) -> bool {
        self.tx.push(params).is_ok()
    }
}

/// Audio-thread side: yields the newest pending snapshot, if any.
pub trait ParamReceiver {
    fn latest(&mut self) -> Option<PatchParams>;
}

#[cfg(feature = "rtrb")]
impl ParamReceiver for Consumer<PatchParams> {
    fn latest(&mut self) -> Option<PatchParams> {
        let mut latest = None;
        while let Ok(params) = self.pop() {
            latest = Some(params);
        }
        latest
    }
}

#[cfg(feature = "rtrb")]
pub fn param_channel() -> (ParamHandle, Consumer<PatchParams>) {
    let (tx, rx) = RingBuffer::<PatchParams>::new(PARAM_QUEUE_SIZE);
    (ParamHandle { tx }, rx)
}
