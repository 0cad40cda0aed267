use super::ENV_MAX;

/*
Operator Envelope Generator
===========================

Every operator owns one of these. It produces an ATTENUATION, not a level:
0 is full volume and ENV_MAX (1023) is silence. Attenuation is measured in
1/64 dB steps, so the operator turns it into a gain with

    gain = 10^(-attenuation / 1280)


Vocabulary
----------

  rate          A 5-bit register (4-bit for release) choosing how fast a
                stage moves. 0 means "never move".

  key scale     0..=3. Lets higher notes run their envelopes faster by
                adding `key_code >> (3 - key_scale)` to the doubled rate.

  increment     Attenuation change per sample, in 16.16 fixed point. The
                fractional part is carried between samples so slow rates
                do not drift or stall.

  sustain level The attenuation where decay hands over to the sustain
                stage (SL register * ENV_MAX / 15).


Rate to Increment
-----------------

    scaled  = clamp(rate * 2 + (key_code >> (3 - key_scale)), 0, 63)
    samples = 2^(18 - scaled / 4)
    inc     = ENV_MAX * 65536 / samples

`samples` is how long a full 0 -> ENV_MAX sweep takes. It is an
approximation of the chip's timing rather than a datasheet table, and the
rest of the engine is tuned against this curve, so it stays as is.


The State Machine
-----------------

    key on ──→ Attack ──(att = 0)──→ Decay ──(att >= SL)──→ Sustain
                  │                    │                       │
                  └──── key off ───────┴───────────────────────┤
                                                               ↓
    Off ←──────────────(att = ENV_MAX)──────────────────── Release

Sustain is not a hold: it keeps creeping towards silence at the sustain
rate (the chip's "second decay") and drops to Off when it gets there.

Attack is exponential. The increment is scaled by (attenuation + 1) / 128
before it goes through the accumulator, so the level shoots up first and
eases into full volume. Summed over the whole sweep that scaling comes out
close to the linear stages' timing, and the +1 keeps the last units from
stalling. The other stages are linear in attenuation (which is already
logarithmic in level).


SSG-EG
------

The looping envelope mode inherited from the SSG chip. When enabled, every
time decay or sustain reaches half scale (SSG_THRESHOLD) the envelope
either holds or loops back into attack, optionally flipping the output
upside down:

    mode bit 2  attack   start with the output inverted
    mode bit 1  alternate flip the inversion on every wrap
    mode bit 0  hold     stop at the end of the first sweep

A non-alternating loop also restarts the operator's phase.
*/

/// Attack increments are multiplied by `attenuation + 1` and shifted down by this.
const ATTACK_SHIFT: u32 = 7;

/// Half-scale attenuation where SSG-EG wraps or holds.
pub const SSG_THRESHOLD: i32 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Off,
    Release,
    Sustain,
    Decay,
    Attack,
}

/// SSG-EG register contents (0x90 + slot).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SsgEg {
    pub enabled: bool,
    pub mode: u8,
}

impl SsgEg {
    pub fn from_register(value: u8) -> Self {
        Self {
            enabled: value & 0x08 != 0,
            mode: value & 0x07,
        }
    }

    pub fn register(self) -> u8 {
        if self.enabled {
            0x08 | (self.mode & 7)
        } else {
            0
        }
    }

    fn attack(self) -> bool {
        self.mode & 4 != 0
    }

    fn alternate(self) -> bool {
        self.mode & 2 != 0
    }

    fn hold(self) -> bool {
        self.mode & 1 != 0
    }
}

/// Attenuation accumulator in 16.16 fixed point.
///
/// Only the fractional remainder is stored; whole units are handed back to
/// the caller on every advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EnvAccumulator(u32);

impl EnvAccumulator {
    fn advance(&mut self, increment: u32) -> i32 {
        let total = self.0 as u64 + increment as u64;
        self.0 = (total & 0xFFFF) as u32;
        (total >> 16) as i32
    }

    fn clear(&mut self) {
        self.0 = 0;
    }
}

/// Doubled rate plus key scaling, clamped to the chip's 0..=63 range.
pub fn key_scaled_rate(rate: u8, key_scale: u8, key_code: u8) -> u8 {
    if rate == 0 {
        return 0;
    }
    let scaled = rate as u32 * 2 + ((key_code & 31) >> (3 - (key_scale & 3))) as u32;
    scaled.min(63) as u8
}

/// Per-sample increment (x65536) for a key-scaled rate.
pub fn increment_for_rate(scaled_rate: u8) -> u32 {
    if scaled_rate == 0 {
        return 0;
    }
    let full_scale = ENV_MAX as f64 * 65536.0;
    let samples = 2.0_f64.powf(18.0 - scaled_rate.min(63) as f64 / 4.0).max(1.0);
    (full_scale / samples).min(full_scale) as u32
}

/// Per-sample increment (x65536) for a raw rate register.
pub fn rate_increment(rate: u8, key_scale: u8, key_code: u8) -> u32 {
    increment_for_rate(key_scaled_rate(rate, key_scale, key_code))
}

#[derive(Debug, Clone)]
pub struct EnvelopeGenerator {
    state: EnvelopeState,
    attenuation: i32,
    sustain_level: i32,
    accumulator: EnvAccumulator,

    // Raw registers, kept so increments can be re-derived
    attack_rate: u8,
    decay_rate: u8,
    sustain_rate: u8,
    release_rate: u8,
    key_scale: u8,
    key_code: u8,

    attack_increment: u32,
    decay_increment: u32,
    sustain_increment: u32,
    release_increment: u32,

    ssg: SsgEg,
    ssg_inverted: bool,
    ssg_holding: bool,
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeGenerator {
    /// Fast attack, moderate decay, no sustain creep, medium release.
    pub fn new() -> Self {
        let mut env = Self {
            state: EnvelopeState::Off,
            attenuation: ENV_MAX,
            sustain_level: ENV_MAX / 2,
            accumulator: EnvAccumulator::default(),
            attack_rate: 31,
            decay_rate: 10,
            sustain_rate: 0,
            release_rate: 8,
            key_scale: 0,
            key_code: 0,
            attack_increment: 0,
            decay_increment: 0,
            sustain_increment: 0,
            release_increment: 0,
            ssg: SsgEg::default(),
            ssg_inverted: false,
            ssg_holding: false,
        };
        env.update_increments();
        env
    }

    fn update_increments(&mut self) {
        let (ks, kc) = (self.key_scale, self.key_code);
        self.attack_increment = rate_increment(self.attack_rate, ks, kc);
        self.decay_increment = rate_increment(self.decay_rate, ks, kc);
        self.sustain_increment = rate_increment(self.sustain_rate, ks, kc);
        self.release_increment = rate_increment(self.release_rate, ks, kc);
    }

    pub fn set_attack_rate(&mut self, rate: u8) {
        self.attack_rate = rate & 31;
        self.update_increments();
    }

    pub fn set_decay_rate(&mut self, rate: u8) {
        self.decay_rate = rate & 31;
        self.update_increments();
    }

    pub fn set_sustain_rate(&mut self, rate: u8) {
        self.sustain_rate = rate & 31;
        self.update_increments();
    }

    pub fn set_release_rate(&mut self, rate: u8) {
        self.release_rate = rate & 15;
        self.update_increments();
    }

    pub fn set_key_scale(&mut self, key_scale: u8) {
        self.key_scale = key_scale & 3;
        self.update_increments();
    }

    /// Channel key code changed (new block / F-number).
    pub fn set_key_code(&mut self, key_code: u8) {
        self.key_code = key_code & 31;
        self.update_increments();
    }

    /// SL register (0..=15) to attenuation.
    pub fn set_sustain_level(&mut self, level: u8) {
        self.sustain_level = (level & 15) as i32 * ENV_MAX / 15;
    }

    pub fn set_ssg(&mut self, ssg: SsgEg) {
        self.ssg = ssg;
        if !ssg.enabled {
            self.ssg_inverted = false;
            self.ssg_holding = false;
        }
    }

    pub fn key_on(&mut self) {
        self.state = EnvelopeState::Attack;
        self.attenuation = ENV_MAX;
        self.accumulator.clear();
        self.ssg_inverted = self.ssg.enabled && self.ssg.attack();
        self.ssg_holding = false;
    }

    pub fn key_off(&mut self) {
        if self.state == EnvelopeState::Off {
            return;
        }
        if self.ssg_inverted {
            // Release continues from what was audible, not the raw counter
            self.attenuation = self.attenuation();
            self.ssg_inverted = false;
        }
        self.ssg_holding = false;
        self.state = EnvelopeState::Release;
        self.accumulator.clear();
    }

    /// Silence immediately, without a release stage.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Off;
        self.attenuation = ENV_MAX;
        self.accumulator.clear();
        self.ssg_inverted = false;
        self.ssg_holding = false;
    }

    /// Advance one sample. Returns true when SSG-EG asks for a phase reset.
    pub fn tick(&mut self) -> bool {
        let reset_phase = self.update_ssg();

        match self.state {
            EnvelopeState::Attack => {
                if self.attack_increment == 0 {
                    return reset_phase;
                }
                if self.attenuation > 0 {
                    let scaled = (self.attack_increment as u64 * (self.attenuation as u64 + 1))
                        >> ATTACK_SHIFT;
                    let step = self.accumulator.advance(scaled.min(u32::MAX as u64) as u32);
                    self.attenuation -= step;
                }
                if self.attenuation <= 0 {
                    self.attenuation = 0;
                    self.state = EnvelopeState::Decay;
                    self.accumulator.clear();
                }
            }

            EnvelopeState::Decay => {
                if self.decay_increment == 0 || self.ssg_holding {
                    return reset_phase;
                }
                self.attenuation += self.accumulator.advance(self.decay_increment);
                if self.attenuation >= self.sustain_level {
                    self.attenuation = self.sustain_level;
                    self.state = EnvelopeState::Sustain;
                    self.accumulator.clear();
                }
            }

            EnvelopeState::Sustain => {
                if self.sustain_increment == 0 || self.ssg_holding {
                    return reset_phase;
                }
                self.attenuation += self.accumulator.advance(self.sustain_increment);
                if self.attenuation >= ENV_MAX {
                    self.attenuation = ENV_MAX;
                    self.state = EnvelopeState::Off;
                }
            }

            EnvelopeState::Release => {
                if self.release_increment == 0 {
                    return reset_phase;
                }
                self.attenuation += self.accumulator.advance(self.release_increment);
                if self.attenuation >= ENV_MAX {
                    self.attenuation = ENV_MAX;
                    self.state = EnvelopeState::Off;
                }
            }

            EnvelopeState::Off => {
                self.attenuation = ENV_MAX;
            }
        }

        debug_assert!((0..=ENV_MAX).contains(&self.attenuation));
        reset_phase
    }

    fn update_ssg(&mut self) -> bool {
        if !self.ssg.enabled
            || self.attenuation < SSG_THRESHOLD
            || !matches!(self.state, EnvelopeState::Decay | EnvelopeState::Sustain)
        {
            return false;
        }

        if self.ssg.hold() {
            if !self.ssg_holding {
                self.ssg_holding = true;
                if self.ssg.alternate() {
                    self.ssg_inverted = !self.ssg_inverted;
                }
            }
            self.attenuation = if self.ssg_inverted {
                SSG_THRESHOLD
            } else {
                ENV_MAX
            };
            return false;
        }

        if self.ssg.alternate() {
            self.ssg_inverted = !self.ssg_inverted;
        }
        self.state = EnvelopeState::Attack;
        self.accumulator.clear();
        !self.ssg.alternate()
    }

    /// Effective attenuation (0 = loudest, ENV_MAX = silent), SSG inversion applied.
    pub fn attenuation(&self) -> i32 {
        if self.ssg_inverted {
            (SSG_THRESHOLD - self.attenuation) & ENV_MAX
        } else {
            self.attenuation
        }
    }

    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    pub fn is_off(&self) -> bool {
        self.state == EnvelopeState::Off
    }

    pub fn sustain_level(&self) -> i32 {
        self.sustain_level
    }

    pub fn ssg(&self) -> SsgEg {
        self.ssg
    }

    /// Current attack, decay, sustain and release increments (x65536).
    pub fn increments(&self) -> [u32; 4] {
        [
            self.attack_increment,
            self.decay_increment,
            self.sustain_increment,
            self.release_increment,
        ]
    }
}
