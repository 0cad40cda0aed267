/*
Register Interface
==================

The chip is programmed through two address/data port pairs:

  part 0    channels 1-3 and the global registers
  part 1    channels 4-6

Writing the address port latches a register number; the next write to the
same part's data port applies a value to it.


Register Map
------------

  0x22          LFO enable[3] | rate[2:0]                     (part 0 only)
  0x28          operator mask[7:4] | channel[2:0]             (part 0 only)
  0x2A          DAC sample, unsigned 8-bit                    (part 0 only)
  0x2B          DAC enable[7]                                 (part 0 only)

  0x30-0x9F     per operator: 0xN0 + slot * 4 + channel
                  0x30  detune[6:4] | multiple[3:0]
                  0x40  total level[6:0]
                  0x50  key scale[7:6] | attack rate[4:0]
                  0x60  AM enable[7] | decay rate[4:0]
                  0x70  sustain rate[4:0]
                  0x80  sustain level[7:4] | release rate[3:0]
                  0x90  SSG-EG enable[3] | mode[2:0]

  0xA0-0xA2     F-number low byte, applies the latched high byte
  0xA4-0xA6     block[5:3] | F-number[10:8], latched
  0xB0-0xB2     feedback[5:3] | algorithm[2:0]
  0xB4-0xB6     left[7] | right[6] | AMS[5:4] | FMS[2:0]

The slot number inside an operator address runs {1, 3, 2, 4}: slot 1 of
the register map is operator 3. Storage uses the same order, so the slot
number indexes storage directly.

Channel offset 3 and every address not listed are ignored, as is key-on
channel code 3 or 7.
*/

use log::trace;

use super::envelope::SsgEg;
use super::frequency::FnumBlock;
use super::operator::OperatorSlot;

/// Per-operator register fields, by the high nibble of their address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorField {
    DetuneMultiple,
    TotalLevel,
    KeyScaleAttack,
    AmDecay,
    SustainRate,
    SustainLevelRelease,
    SsgEg,
}

/// Dispatch table: `address >> 4` to operator field.
const OPERATOR_FIELDS: [Option<OperatorField>; 16] = [
    None,
    None,
    None,
    Some(OperatorField::DetuneMultiple),
    Some(OperatorField::TotalLevel),
    Some(OperatorField::KeyScaleAttack),
    Some(OperatorField::AmDecay),
    Some(OperatorField::SustainRate),
    Some(OperatorField::SustainLevelRelease),
    Some(OperatorField::SsgEg),
    None,
    None,
    None,
    None,
    None,
    None,
];

impl OperatorField {
    pub fn from_address(address: u8) -> Option<Self> {
        OPERATOR_FIELDS[(address >> 4) as usize]
    }

    /// Base address for slot 0 of channel 0.
    pub fn base_address(self) -> u8 {
        match self {
            Self::DetuneMultiple => 0x30,
            Self::TotalLevel => 0x40,
            Self::KeyScaleAttack => 0x50,
            Self::AmDecay => 0x60,
            Self::SustainRate => 0x70,
            Self::SustainLevelRelease => 0x80,
            Self::SsgEg => 0x90,
        }
    }

    /// Unpack `value` into the operator. Returns true when the operator's
    /// phase increment needs recomputing.
    pub fn apply(self, slot: &mut OperatorSlot, value: u8) -> bool {
        match self {
            Self::DetuneMultiple => {
                slot.set_detune((value >> 4) & 7);
                slot.set_multiple(value & 0x0F);
                return true;
            }
            Self::TotalLevel => slot.set_total_level(value & 0x7F),
            Self::KeyScaleAttack => {
                let env = slot.envelope_mut();
                env.set_key_scale(value >> 6);
                env.set_attack_rate(value & 0x1F);
            }
            Self::AmDecay => {
                slot.set_am_enabled(value & 0x80 != 0);
                slot.envelope_mut().set_decay_rate(value & 0x1F);
            }
            Self::SustainRate => slot.envelope_mut().set_sustain_rate(value & 0x1F),
            Self::SustainLevelRelease => {
                let env = slot.envelope_mut();
                env.set_sustain_level(value >> 4);
                env.set_release_rate(value & 0x0F);
            }
            Self::SsgEg => slot.set_ssg(SsgEg::from_register(value)),
        }
        false
    }
}

/// Register identity, independent of the value written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Lfo,
    KeyOnOff,
    DacData,
    DacEnable,
    Operator {
        channel: usize,
        slot: usize,
        field: OperatorField,
    },
    FrequencyLow {
        channel: usize,
    },
    FrequencyHigh,
    FeedbackAlgorithm {
        channel: usize,
    },
    StereoLfo {
        channel: usize,
    },
}

impl Register {
    /// Decode an address for a part. `None` for anything unmapped.
    pub fn decode(part: u8, address: u8) -> Option<Self> {
        if part > 1 {
            return None;
        }

        match (part, address) {
            (0, 0x22) => return Some(Self::Lfo),
            (0, 0x28) => return Some(Self::KeyOnOff),
            (0, 0x2A) => return Some(Self::DacData),
            (0, 0x2B) => return Some(Self::DacEnable),
            (_, 0x00..=0x2F) => return None,
            _ => {}
        }

        let offset = (address & 3) as usize;
        if offset == 3 {
            return None;
        }
        let channel = part as usize * 3 + offset;

        if let Some(field) = OperatorField::from_address(address) {
            let slot = ((address >> 2) & 3) as usize;
            return Some(Self::Operator {
                channel,
                slot,
                field,
            });
        }

        match address & 0xFC {
            0xA0 => Some(Self::FrequencyLow { channel }),
            0xA4 => Some(Self::FrequencyHigh),
            0xB0 => Some(Self::FeedbackAlgorithm { channel }),
            0xB4 => Some(Self::StereoLfo { channel }),
            _ => None,
        }
    }
}

/// A fully decoded data-port write, ready to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWrite {
    Lfo(u8),
    KeyOn { channel: usize, mask: u8 },
    DacData(u8),
    DacEnable(bool),
    Operator {
        channel: usize,
        slot: usize,
        field: OperatorField,
        value: u8,
    },
    Frequency { channel: usize, frequency: FnumBlock },
    FeedbackAlgorithm { channel: usize, value: u8 },
    StereoLfo { channel: usize, value: u8 },
}

/// Key-on channel code to channel index; codes 3 and 7 are reserved.
pub fn key_on_channel(code: u8) -> Option<usize> {
    match code & 7 {
        c @ 0..=2 => Some(c as usize),
        c @ 4..=6 => Some(c as usize - 1),
        _ => None,
    }
}

/// Address latches plus the shared F-number high byte latch.
#[derive(Debug, Clone, Default)]
pub struct RegisterBus {
    address: [u8; 2],
    fnum_latch: u8,
}

impl RegisterBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed one port write. Returns the decoded write when a data byte
    /// lands on a mapped register with something to apply.
    pub fn write(&mut self, part: u8, is_address: bool, value: u8) -> Option<RegisterWrite> {
        if part > 1 {
            trace!("ignoring write to part {part}");
            return None;
        }
        if is_address {
            self.address[part as usize] = value;
            return None;
        }

        let address = self.address[part as usize];
        let Some(register) = Register::decode(part, address) else {
            trace!("ignoring write {value:#04x} to unmapped {part}:{address:#04x}");
            return None;
        };

        let write = match register {
            Register::Lfo => RegisterWrite::Lfo(value),
            Register::KeyOnOff => {
                let Some(channel) = key_on_channel(value) else {
                    trace!("ignoring key-on for reserved channel code {}", value & 7);
                    return None;
                };
                RegisterWrite::KeyOn {
                    channel,
                    mask: value >> 4,
                }
            }
            Register::DacData => RegisterWrite::DacData(value),
            Register::DacEnable => RegisterWrite::DacEnable(value & 0x80 != 0),
            Register::Operator {
                channel,
                slot,
                field,
            } => RegisterWrite::Operator {
                channel,
                slot,
                field,
                value,
            },
            Register::FrequencyHigh => {
                self.fnum_latch = value & 0x3F;
                return None;
            }
            Register::FrequencyLow { channel } => RegisterWrite::Frequency {
                channel,
                frequency: FnumBlock::from_registers(self.fnum_latch, value),
            },
            Register::FeedbackAlgorithm { channel } => {
                RegisterWrite::FeedbackAlgorithm { channel, value }
            }
            Register::StereoLfo { channel } => RegisterWrite::StereoLfo { channel, value },
        };

        trace!("{part}:{address:#04x} <- {value:#04x}");
        Some(write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(bus: &mut RegisterBus, part: u8, address: u8, value: u8) -> Option<RegisterWrite> {
        assert_eq!(bus.write(part, true, address), None);
        bus.write(part, false, value)
    }

    #[test]
    fn operator_addresses_decode_slot_and_channel() {
        assert_eq!(
            Register::decode(0, 0x4D),
            Some(Register::Operator {
                channel: 1,
                slot: 3,
                field: OperatorField::TotalLevel,
            })
        );
        assert_eq!(
            Register::decode(1, 0x36),
            Some(Register::Operator {
                channel: 5,
                slot: 1,
                field: OperatorField::DetuneMultiple,
            })
        );
        assert_eq!(Register::decode(0, 0x43), None);
    }

    #[test]
    fn globals_only_exist_on_part_zero() {
        assert_eq!(Register::decode(0, 0x28), Some(Register::KeyOnOff));
        assert_eq!(Register::decode(1, 0x28), None);
        assert_eq!(Register::decode(1, 0x22), None);
        assert_eq!(Register::decode(0, 0x27), None);
        assert_eq!(Register::decode(2, 0x40), None);
    }

    #[test]
    fn unmapped_addresses_are_ignored() {
        let mut bus = RegisterBus::new();
        for address in [0x00, 0x10, 0x21, 0xA3, 0xA8, 0xB8, 0xC0, 0xFF] {
            assert_eq!(data(&mut bus, 0, address, 0x55), None, "{address:#x}");
        }
    }

    #[test]
    fn frequency_high_byte_is_latched_until_low_write() {
        let mut bus = RegisterBus::new();
        assert_eq!(data(&mut bus, 1, 0xA5, (3 << 3) | 0x02), None);
        assert_eq!(
            data(&mut bus, 1, 0xA1, 0x34),
            Some(RegisterWrite::Frequency {
                channel: 4,
                frequency: FnumBlock::new(3, 0x234),
            })
        );
    }

    #[test]
    fn key_on_skips_reserved_channel_codes() {
        let mut bus = RegisterBus::new();
        assert_eq!(data(&mut bus, 0, 0x28, 0xF3), None);
        assert_eq!(data(&mut bus, 0, 0x28, 0xF7), None);
        assert_eq!(
            data(&mut bus, 0, 0x28, 0xF4),
            Some(RegisterWrite::KeyOn {
                channel: 3,
                mask: 0x0F
            })
        );
        assert_eq!(key_on_channel(6), Some(5));
    }

    #[test]
    fn address_latch_is_per_part() {
        let mut bus = RegisterBus::new();
        bus.write(0, true, 0xB0);
        bus.write(1, true, 0xB4);
        assert_eq!(
            bus.write(0, false, 0x3B),
            Some(RegisterWrite::FeedbackAlgorithm {
                channel: 0,
                value: 0x3B
            })
        );
        assert_eq!(
            bus.write(1, false, 0xC0),
            Some(RegisterWrite::StereoLfo {
                channel: 3,
                value: 0xC0
            })
        );
    }

    #[test]
    fn field_unpacking() {
        let mut slot = OperatorSlot::new();
        assert!(OperatorField::DetuneMultiple.apply(&mut slot, 0x57));
        assert_eq!(slot.detune(), 5);
        assert_eq!(slot.multiple(), 7);

        assert!(!OperatorField::AmDecay.apply(&mut slot, 0x80 | 12));
        assert!(slot.am_enabled());

        OperatorField::SustainLevelRelease.apply(&mut slot, 0xF3);
        assert_eq!(slot.envelope().sustain_level(), 1023);

        OperatorField::SsgEg.apply(&mut slot, 0x0D);
        assert_eq!(
            slot.envelope().ssg(),
            SsgEg {
                enabled: true,
                mode: 5
            }
        );
    }
}
