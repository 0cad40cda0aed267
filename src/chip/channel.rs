use super::algorithm::{route, Algorithm};
use super::frequency::FnumBlock;
use super::lfo::Lfo;
use super::operator::OperatorSlot;
use super::{NUM_OPERATORS, OPERATOR_SLOT};

/// One FM voice of the chip: four operators plus routing and pitch.
///
/// Operators are stored in hardware slot order {1, 3, 2, 4}, the same order
/// the register map uses. Anything addressing operators by their natural
/// number goes through [`OPERATOR_SLOT`].
#[derive(Debug, Clone)]
pub struct Channel {
    slots: [OperatorSlot; NUM_OPERATORS],
    algorithm: Algorithm,
    feedback: u8,
    frequency: FnumBlock,
    /// Operator 1's last two outputs.
    feedback_history: [f64; 2],
    ams: u8,
    fms: u8,
    left: bool,
    right: bool,
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| OperatorSlot::new()),
            algorithm: Algorithm::new(7),
            feedback: 0,
            frequency: FnumBlock::default(),
            feedback_history: [0.0; 2],
            ams: 0,
            fms: 0,
            left: true,
            right: true,
        }
    }

    /// Operator by natural number (0-based: 0 is operator 1).
    pub fn operator(&self, operator: usize) -> &OperatorSlot {
        &self.slots[OPERATOR_SLOT[operator & 3]]
    }

    /// Operator by storage slot (register order).
    pub fn slot(&self, slot: usize) -> &OperatorSlot {
        &self.slots[slot & 3]
    }

    /// Mutable operator by storage slot. Call [`Channel::refresh_slot`]
    /// after changing its multiple or detune.
    pub fn slot_mut(&mut self, slot: usize) -> &mut OperatorSlot {
        &mut self.slots[slot & 3]
    }

    pub fn refresh_slot(&mut self, slot: usize) {
        let (fc, key_code) = (self.frequency.fc(), self.frequency.key_code());
        self.slots[slot & 3].update_frequency(fc, key_code);
    }

    pub fn set_frequency(&mut self, frequency: FnumBlock) {
        self.frequency = frequency;
        let (fc, key_code) = (frequency.fc(), frequency.key_code());
        for slot in &mut self.slots {
            slot.update_frequency(fc, key_code);
        }
    }

    pub fn frequency(&self) -> FnumBlock {
        self.frequency
    }

    pub fn key_code(&self) -> u8 {
        self.frequency.key_code()
    }

    /// Register 0xB0: feedback[5:3] | algorithm[2:0].
    pub fn set_feedback_algorithm(&mut self, value: u8) {
        self.feedback = (value >> 3) & 7;
        self.algorithm = Algorithm::new(value & 7);
    }

    /// Register 0xB4: left[7] | right[6] | AMS[5:4] | FMS[2:0].
    pub fn set_stereo_lfo(&mut self, value: u8) {
        self.left = value & 0x80 != 0;
        self.right = value & 0x40 != 0;
        self.ams = (value >> 4) & 3;
        self.fms = value & 7;
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn feedback(&self) -> u8 {
        self.feedback
    }

    pub fn ams(&self) -> u8 {
        self.ams
    }

    pub fn fms(&self) -> u8 {
        self.fms
    }

    pub fn left(&self) -> bool {
        self.left
    }

    pub fn right(&self) -> bool {
        self.right
    }

    /// Key-on mask, natural order: bit 0 is operator 1.
    ///
    /// Set bits key on operators that are not already keyed, clear bits
    /// release them.
    pub fn set_key_mask(&mut self, mask: u8) {
        for (operator, &slot) in OPERATOR_SLOT.iter().enumerate() {
            if mask & (1 << operator) != 0 {
                self.slots[slot].key_on();
            } else {
                self.slots[slot].key_off();
            }
        }
    }

    /// Silence without touching patch registers. Panning returns to L+R.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.reset();
        }
        self.feedback_history = [0.0; 2];
        self.left = true;
        self.right = true;
    }

    /// Nothing left to render: every envelope is off.
    pub fn is_idle(&self) -> bool {
        self.slots.iter().all(|slot| slot.envelope().is_off())
    }

    /// Some operator that reaches the output is still above the quiet threshold.
    pub fn is_audible(&self) -> bool {
        let carriers = self.algorithm.carriers();
        (0..NUM_OPERATORS).any(|op| carriers[op] && self.operator(op).is_audible())
    }

    fn feedback_modulation(&self) -> f64 {
        if self.feedback == 0 {
            return 0.0;
        }
        let [previous, older] = self.feedback_history;
        (previous + older) / (1u32 << (9 - self.feedback)) as f64
    }

    /// Tick envelopes and produce one mono sample (roughly +-4 * 32767).
    #[inline]
    pub fn generate(&mut self, lfo: &Lfo) -> f64 {
        for slot in &mut self.slots {
            slot.tick_envelope();
        }

        let am = lfo.am_attenuation(self.ams);
        let pm = lfo.pm_factor(self.fms);

        let op1 = self.slots[OPERATOR_SLOT[0]].generate(self.feedback_modulation(), am, pm);
        self.feedback_history = [op1, self.feedback_history[0]];

        let slots = &mut self.slots;
        route(self.algorithm, op1, |operator, modulation| {
            slots[OPERATOR_SLOT[operator]].generate(modulation, am, pm)
        })
    }
}
