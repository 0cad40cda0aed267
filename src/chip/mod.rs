//! Register-level OPN2 emulation.
//!
//! [`Chip`] is programmed exclusively through [`Chip::write_register`],
//! exactly like the hardware, and produces one stereo sample per
//! [`Chip::generate`] call at its native rate (`clock / 144`).

pub mod algorithm;
pub mod channel;
pub mod envelope;
pub mod frequency;
pub mod lfo;
pub mod operator;
pub mod registers;

use log::debug;

pub use algorithm::{route, Algorithm};
pub use channel::Channel;
pub use envelope::{EnvelopeGenerator, EnvelopeState, SsgEg};
pub use frequency::FnumBlock;
pub use lfo::Lfo;
pub use operator::OperatorSlot;
pub use registers::{OperatorField, Register, RegisterBus, RegisterWrite};

/// NTSC master clock in Hz.
pub const CLOCK_NTSC: u32 = 7_670_453;
/// PAL master clock in Hz.
pub const CLOCK_PAL: u32 = 7_600_489;
/// Master clock cycles per output sample.
pub const PRESCALER: u32 = 144;

pub const NUM_CHANNELS: usize = 6;
pub const NUM_OPERATORS: usize = 4;

/// Silent attenuation. 0 is full volume; units are 1/64 dB.
pub const ENV_MAX: i32 = 1023;
/// Attenuation at or above which an operator outputs nothing.
pub const ENV_QUIET: i32 = 896;

/// Natural operator number (0-based) to storage slot. Storage follows the
/// hardware register order {1, 3, 2, 4}; the table is its own inverse.
pub const OPERATOR_SLOT: [usize; NUM_OPERATORS] = [0, 2, 1, 3];

/// Channel whose FM output the DAC replaces.
pub const DAC_CHANNEL: usize = 5;

/// Native sample rate for a master clock.
pub fn native_rate(clock: u32) -> f64 {
    frequency::reference_rate(clock)
}

/// Six channels, the shared LFO, the DAC and the port latches.
#[derive(Debug, Clone)]
pub struct Chip {
    channels: [Channel; NUM_CHANNELS],
    bus: RegisterBus,
    lfo: Lfo,
    clock: u32,
    dac_enabled: bool,
    dac_output: i32,
}

impl Default for Chip {
    fn default() -> Self {
        Self::new(CLOCK_NTSC)
    }
}

impl Chip {
    pub fn new(clock: u32) -> Self {
        Self {
            channels: std::array::from_fn(|_| Channel::new()),
            bus: RegisterBus::new(),
            lfo: Lfo::new(),
            clock: clock.max(PRESCALER),
            dac_enabled: false,
            dac_output: 0,
        }
    }

    /// Silence everything and clear latches, LFO and DAC. Patch registers
    /// (levels, rates, multiples, algorithm) are kept.
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
        self.bus.reset();
        self.lfo.reset();
        self.dac_enabled = false;
        self.dac_output = 0;
    }

    /// One port write: `is_address` selects the address port of `part`,
    /// otherwise the value goes to the latched register.
    pub fn write_register(&mut self, part: u8, is_address: bool, value: u8) {
        if let Some(write) = self.bus.write(part, is_address, value) {
            self.apply(write);
        }
    }

    /// Address then data write in one call.
    pub fn write(&mut self, part: u8, address: u8, value: u8) {
        self.write_register(part, true, address);
        self.write_register(part, false, value);
    }

    fn apply(&mut self, write: RegisterWrite) {
        match write {
            RegisterWrite::Lfo(value) => self.lfo.write(value),
            RegisterWrite::KeyOn { channel, mask } => self.channels[channel].set_key_mask(mask),
            RegisterWrite::DacData(value) => self.dac_output = (value as i32 - 0x80) << 6,
            RegisterWrite::DacEnable(enabled) => {
                if enabled != self.dac_enabled {
                    debug!("DAC {}", if enabled { "enabled" } else { "disabled" });
                }
                self.dac_enabled = enabled;
            }
            RegisterWrite::Operator {
                channel,
                slot,
                field,
                value,
            } => {
                let channel = &mut self.channels[channel];
                if field.apply(channel.slot_mut(slot), value) {
                    channel.refresh_slot(slot);
                }
            }
            RegisterWrite::Frequency { channel, frequency } => {
                self.channels[channel].set_frequency(frequency)
            }
            RegisterWrite::FeedbackAlgorithm { channel, value } => {
                self.channels[channel].set_feedback_algorithm(value)
            }
            RegisterWrite::StereoLfo { channel, value } => {
                self.channels[channel].set_stereo_lfo(value)
            }
        }
    }

    /// Advance one native-rate sample and return the stereo mix.
    pub fn generate(&mut self) -> (i16, i16) {
        self.lfo.tick();

        let mut left = 0.0;
        let mut right = 0.0;
        for (index, channel) in self.channels.iter_mut().enumerate() {
            let sample = if index == DAC_CHANNEL && self.dac_enabled {
                self.dac_output as f64
            } else if channel.is_idle() {
                continue;
            } else {
                channel.generate(&self.lfo)
            };

            if channel.left() {
                left += sample;
            }
            if channel.right() {
                right += sample;
            }
        }

        let scale = 1.0 / NUM_CHANNELS as f64;
        (to_i16(left * scale), to_i16(right * scale))
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn channels(&self) -> &[Channel; NUM_CHANNELS] {
        &self.channels
    }

    pub fn lfo(&self) -> &Lfo {
        &self.lfo
    }

    pub fn dac_enabled(&self) -> bool {
        self.dac_enabled
    }

    /// Any channel still producing sound from a carrier, or the DAC.
    pub fn is_audible(&self) -> bool {
        self.dac_enabled || self.channels.iter().any(Channel::is_audible)
    }

    pub fn clock(&self) -> u32 {
        self.clock
    }

    pub fn sample_rate(&self) -> f64 {
        native_rate(self.clock)
    }
}

#[inline]
fn to_i16(sample: f64) -> i16 {
    (sample as i32).clamp(i16::MIN as i32, i16::MAX as i32) as i16
}
