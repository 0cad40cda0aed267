use std::f64::consts::PI;

use super::envelope::{EnvelopeGenerator, EnvelopeState, SsgEg};
use super::frequency::phase_increment;
use super::{ENV_MAX, ENV_QUIET};

/// Operator output peak, the same scale modulation inputs are expressed in.
pub const OPERATOR_PEAK: f64 = 32767.0;

const PHASE_TO_RADIANS: f64 = 2.0 * PI / 4_294_967_296.0;
/// Modulation input to radians: +-32767 swings the phase by about +-2 pi.
const MODULATION_TO_RADIANS: f64 = PI / 16384.0;

/// One sine generator with its envelope and register state.
#[derive(Debug, Clone)]
pub struct OperatorSlot {
    phase: u32,
    phase_increment: u32,

    multiple: u8,
    detune: u8,
    /// TL register converted to envelope units.
    total_level: i32,
    total_level_register: u8,
    am_enabled: bool,
    keyed: bool,

    envelope: EnvelopeGenerator,
}

impl Default for OperatorSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorSlot {
    pub fn new() -> Self {
        Self {
            phase: 0,
            phase_increment: 0,
            multiple: 1,
            detune: 0,
            total_level: 0,
            total_level_register: 0,
            am_enabled: false,
            keyed: false,
            envelope: EnvelopeGenerator::new(),
        }
    }

    pub fn set_multiple(&mut self, multiple: u8) {
        self.multiple = multiple & 15;
    }

    /// 3-bit detune: bits 1:0 magnitude, bit 2 sign.
    pub fn set_detune(&mut self, detune: u8) {
        self.detune = detune & 7;
    }

    /// TL register 0..=127 (0 loudest).
    pub fn set_total_level(&mut self, level: u8) {
        self.total_level_register = level & 0x7F;
        self.total_level = self.total_level_register as i32 * ENV_MAX / 127;
    }

    pub fn set_am_enabled(&mut self, enabled: bool) {
        self.am_enabled = enabled;
    }

    pub fn envelope(&self) -> &EnvelopeGenerator {
        &self.envelope
    }

    pub fn envelope_mut(&mut self) -> &mut EnvelopeGenerator {
        &mut self.envelope
    }

    pub fn set_ssg(&mut self, ssg: SsgEg) {
        self.envelope.set_ssg(ssg);
    }

    /// Recompute the phase increment and key-scaled rates after a
    /// frequency, multiple or detune change.
    pub fn update_frequency(&mut self, fc: u32, key_code: u8) {
        self.phase_increment = phase_increment(fc, key_code, self.multiple, self.detune);
        self.envelope.set_key_code(key_code);
    }

    /// Key on, unless already keyed. Restarts phase and envelope.
    pub fn key_on(&mut self) {
        if self.keyed {
            return;
        }
        self.keyed = true;
        self.phase = 0;
        self.envelope.key_on();
    }

    pub fn key_off(&mut self) {
        if !self.keyed {
            return;
        }
        self.keyed = false;
        self.envelope.key_off();
    }

    /// Back to silence, keeping all register settings.
    pub fn reset(&mut self) {
        self.keyed = false;
        self.phase = 0;
        self.envelope.reset();
    }

    pub fn tick_envelope(&mut self) {
        if self.envelope.tick() {
            self.phase = 0;
        }
    }

    /// Envelope plus total level, clamped to silence.
    pub fn attenuation(&self) -> i32 {
        (self.envelope.attenuation() + self.total_level).min(ENV_MAX)
    }

    pub fn is_audible(&self) -> bool {
        self.envelope.state() != EnvelopeState::Off && self.attenuation() < ENV_QUIET
    }

    /// One sample in +-OPERATOR_PEAK.
    ///
    /// `modulation` is another operator's output (or feedback) in the same
    /// scale. `am_attenuation` is the LFO tremolo, applied only when this
    /// operator has AM enabled. `pm_factor` scales the phase increment for
    /// vibrato (1.0 when off).
    #[inline]
    pub fn generate(&mut self, modulation: f64, am_attenuation: i32, pm_factor: f64) -> f64 {
        let phase = self.phase;
        self.advance_phase(pm_factor);

        let mut attenuation = self.envelope.attenuation() + self.total_level;
        if self.am_enabled {
            attenuation += am_attenuation;
        }
        let attenuation = attenuation.min(ENV_MAX);
        if attenuation >= ENV_QUIET {
            return 0.0;
        }

        let gain = 10.0_f64.powf(-(attenuation as f64) / 1280.0);
        let angle = phase as f64 * PHASE_TO_RADIANS + modulation * MODULATION_TO_RADIANS;
        angle.sin() * gain * OPERATOR_PEAK
    }

    #[inline]
    fn advance_phase(&mut self, pm_factor: f64) {
        let increment = if pm_factor == 1.0 {
            self.phase_increment
        } else {
            (self.phase_increment as f64 * pm_factor) as u32
        };
        self.phase = self.phase.wrapping_add(increment);
    }

    pub fn multiple(&self) -> u8 {
        self.multiple
    }

    pub fn detune(&self) -> u8 {
        self.detune
    }

    pub fn total_level(&self) -> u8 {
        self.total_level_register
    }

    pub fn am_enabled(&self) -> bool {
        self.am_enabled
    }

    pub fn is_keyed(&self) -> bool {
        self.keyed
    }

    pub fn phase_increment(&self) -> u32 {
        self.phase_increment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::frequency::FnumBlock;
    use crate::chip::CLOCK_NTSC;

    fn keyed_operator() -> OperatorSlot {
        let mut op = OperatorSlot::new();
        let freq = FnumBlock::from_hz(440.0, CLOCK_NTSC);
        op.update_frequency(freq.fc(), freq.key_code());
        op.key_on();
        // AR 31 reaches full level in a handful of samples
        for _ in 0..64 {
            op.tick_envelope();
        }
        op
    }

    #[test]
    fn silent_before_key_on() {
        let mut op = OperatorSlot::new();
        for _ in 0..32 {
            op.tick_envelope();
            assert_eq!(op.generate(0.0, 0, 1.0), 0.0);
        }
    }

    #[test]
    fn output_is_bounded_by_peak() {
        let mut op = keyed_operator();
        let mut peak = 0.0_f64;
        for _ in 0..2_000 {
            op.tick_envelope();
            let s = op.generate(0.0, 0, 1.0);
            assert!(s.abs() <= OPERATOR_PEAK);
            peak = peak.max(s.abs());
        }
        assert!(peak > 1_000.0);
    }

    #[test]
    fn total_level_attenuates() {
        let mut loud = keyed_operator();
        let mut quiet = keyed_operator();
        quiet.set_total_level(64);
        let (mut a, mut b) = (0.0_f64, 0.0_f64);
        for _ in 0..500 {
            a = a.max(loud.generate(0.0, 0, 1.0).abs());
            b = b.max(quiet.generate(0.0, 0, 1.0).abs());
        }
        assert!(b < a * 0.5, "TL 64 should be well below TL 0: {b} vs {a}");
    }

    #[test]
    fn max_total_level_is_silent() {
        let mut op = keyed_operator();
        op.set_total_level(127);
        assert_eq!(op.attenuation(), ENV_MAX);
        assert!(!op.is_audible());
        assert_eq!(op.generate(0.0, 0, 1.0), 0.0);
    }

    #[test]
    fn repeated_key_on_does_not_retrigger() {
        let mut op = keyed_operator();
        let before = op.envelope().state();
        op.key_on();
        assert_eq!(op.envelope().state(), before);
        op.key_off();
        assert_eq!(op.envelope().state(), EnvelopeState::Release);
        op.key_on();
        assert_eq!(op.envelope().state(), EnvelopeState::Attack);
    }

    #[test]
    fn am_only_applies_when_enabled() {
        let mut plain = keyed_operator();
        let mut tremolo = keyed_operator();
        tremolo.set_am_enabled(true);
        let a = plain.generate(0.0, ENV_MAX, 1.0);
        let b = tremolo.generate(0.0, ENV_MAX, 1.0);
        assert_eq!(a, b, "first sample at phase 0 is zero for both");
        let a = plain.generate(0.0, ENV_MAX, 1.0);
        let b = tremolo.generate(0.0, ENV_MAX, 1.0);
        assert_ne!(a, 0.0);
        assert_eq!(b, 0.0);
    }
}
