//! Block / F-number frequency encoding.

/*
Frequency Registers
===================

The chip never sees a frequency in Hz. Each channel holds a tiny floating
point number instead:

  F-number    11-bit mantissa (0..=0x7FF), written in two halves: the high
              three bits through 0xA4 (latched) and the low byte through
              0xA0 (applies the pair).

  block       3-bit exponent (0..=7). Each step up doubles the pitch.

  fref        The chip's internal reference rate, master clock / 144. This
              is also the rate at which the chip produces output samples.

The relationship is

    hz = fnum * 2^block * fref / 2^20

so the same pitch can be spelled several ways. We normalise towards the
spelling that keeps the F-number in [0x200, 0x7FF], which keeps the full
10+ bits of resolution (worst case ~3.4 cents of truncation error).


Key Code
--------

The 5-bit key code summarises "how high is this note":

    key_code = block << 2 | fnum >> 9

It selects detune amounts and speeds up envelopes for high notes when key
scaling is enabled.


Phase Increment
---------------

Operators advance a 32-bit phase accumulator where 2^32 is one full sine
period. Running at the native rate (fref), one period per sample would be
`hz = fref`, so

    increment = hz / fref * 2^32 = (fnum << block) * 2^12

The multiple register works in half steps (0 means x0.5), which folds into
`(fc * mul_half_steps) << 11`. Anything past 2^32 simply wraps, just like
the hardware counter.
*/

use super::PRESCALER;

/// Largest F-number the 11-bit register can hold.
pub const FNUM_MAX: u16 = 0x7FF;
/// Lower edge of the normalised F-number range.
pub const FNUM_NORMAL_MIN: u16 = 0x200;
/// Block the search starts from before normalising.
const DEFAULT_BLOCK: u8 = 4;

/// Detune offsets in `fnum << block` units, indexed by `[detune & 3][key_code]`.
const DETUNE_TABLE: [[u32; 32]; 4] = [
    [0; 32],
    [
        0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 4, 4, 4, 4, 4, 4, 4, 4, 8, 8,
        8, 8,
    ],
    [
        1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 8, 8, 8, 8, 16, 16, 16, 16, 32, 32, 32, 32, 64, 64, 64,
        64, 128, 128, 128, 128,
    ],
    [
        2, 2, 2, 2, 4, 4, 4, 4, 8, 8, 8, 8, 16, 16, 16, 16, 32, 32, 32, 32, 64, 64, 64, 64, 128,
        128, 128, 128, 256, 256, 256, 256,
    ],
];

/// A channel frequency in the chip's own encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FnumBlock {
    pub block: u8,
    pub fnum: u16,
}

impl FnumBlock {
    pub fn new(block: u8, fnum: u16) -> Self {
        Self {
            block: block & 7,
            fnum: fnum & FNUM_MAX,
        }
    }

    /// Encode a frequency for a chip running at `clock` Hz.
    ///
    /// Non-finite or non-positive input encodes as the lowest possible
    /// frequency instead of failing.
    pub fn from_hz(hz: f64, clock: u32) -> Self {
        if !hz.is_finite() || hz <= 0.0 {
            return Self::new(0, 0);
        }

        let fref = reference_rate(clock);
        let mut block = DEFAULT_BLOCK;
        let mut fnum = hz * (1u32 << (20 - block)) as f64 / fref;

        while fnum > FNUM_MAX as f64 && block < 7 {
            block += 1;
            fnum /= 2.0;
        }
        while fnum < FNUM_NORMAL_MIN as f64 && block > 0 {
            block -= 1;
            fnum *= 2.0;
        }

        let fnum = (fnum as i64).clamp(0, FNUM_MAX as i64) as u16;
        Self::new(block, fnum)
    }

    /// Decode back to Hz for a chip running at `clock` Hz.
    pub fn to_hz(self, clock: u32) -> f64 {
        self.fc() as f64 * reference_rate(clock) / (1u32 << 20) as f64
    }

    /// Rebuild from the two register bytes (0xA4 high, 0xA0 low).
    pub fn from_registers(high: u8, low: u8) -> Self {
        Self::new((high >> 3) & 7, (((high & 7) as u16) << 8) | low as u16)
    }

    /// The two register bytes, high (0xA4: block | fnum[10:8]) first.
    pub fn registers(self) -> (u8, u8) {
        let high = ((self.block & 7) << 3) | ((self.fnum >> 8) as u8 & 7);
        (high, (self.fnum & 0xFF) as u8)
    }

    /// `fnum << block`, the linear frequency counter the operators scale.
    pub fn fc(self) -> u32 {
        (self.fnum as u32) << self.block
    }

    pub fn key_code(self) -> u8 {
        (self.block << 2) | (self.fnum >> 9) as u8
    }
}

/// The chip's reference rate (and native sample rate) for a master clock.
pub fn reference_rate(clock: u32) -> f64 {
    clock.max(PRESCALER) as f64 / PRESCALER as f64
}

/// Signed detune offset for a 3-bit detune register (bit 2 = negative).
pub fn detune_offset(detune: u8, key_code: u8) -> i32 {
    let magnitude = DETUNE_TABLE[(detune & 3) as usize][(key_code & 31) as usize] as i32;
    if detune & 4 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Multiple register in half steps: 0 means x0.5, otherwise `mul * 2`.
pub fn multiple_half_steps(multiple: u8) -> u32 {
    match multiple & 15 {
        0 => 1,
        m => m as u32 * 2,
    }
}

/// Per-sample phase increment (2^32 per cycle) at the native rate.
pub fn phase_increment(fc: u32, key_code: u8, multiple: u8, detune: u8) -> u32 {
    let adjusted = (fc as i64 + detune_offset(detune, key_code) as i64).max(0) as u64;
    ((adjusted * multiple_half_steps(multiple) as u64) << 11) as u32
}
