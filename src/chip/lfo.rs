//! Global low-frequency oscillator (register 0x22).
//!
//! One LFO is shared by all six channels. Each channel picks how much of it
//! to use: AMS scales tremolo on operators with AM enabled, FMS scales
//! vibrato on the whole channel.

/// Native-rate samples per LFO step, indexed by the 3-bit rate.
/// With 128 steps per cycle this gives 3.98 .. 72.2 Hz at the NTSC clock.
const LFO_DIVIDER_TABLE: [u16; 8] = [108, 77, 71, 67, 62, 44, 8, 5];

/// LFO steps per full triangle cycle.
const LFO_STEPS: u8 = 128;

/// Peak tremolo per AMS setting, in 1/64 dB (0, 1.4, 5.9, 11.8 dB).
const AM_DEPTH: [f64; 4] = [0.0, 1.4 * 64.0, 5.9 * 64.0, 11.8 * 64.0];

/// Peak vibrato per FMS setting, in cents.
const FM_DEPTH_CENTS: [f64; 8] = [0.0, 3.4, 6.7, 10.0, 14.0, 20.0, 40.0, 80.0];

#[derive(Debug, Clone, Default)]
pub struct Lfo {
    enabled: bool,
    rate: u8,
    counter: u8,
    divider: u16,
}

impl Lfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register 0x22: bit 3 enable, bits 2:0 rate.
    pub fn write(&mut self, value: u8) {
        let enabled = value & 0x08 != 0;
        if !enabled {
            self.counter = 0;
            self.divider = 0;
        }
        self.enabled = enabled;
        self.rate = value & 0x07;
    }

    pub fn register(&self) -> u8 {
        if self.enabled {
            0x08 | self.rate
        } else {
            0
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn tick(&mut self) {
        if !self.enabled {
            return;
        }
        self.divider += 1;
        if self.divider >= LFO_DIVIDER_TABLE[self.rate as usize] {
            self.divider = 0;
            self.counter = (self.counter + 1) % LFO_STEPS;
        }
    }

    /// Unipolar triangle, 0.0 at the start of the cycle, 1.0 half way.
    fn unipolar(&self) -> f64 {
        let half = (LFO_STEPS / 2) as f64;
        let c = self.counter as f64;
        if c < half {
            c / half
        } else {
            (LFO_STEPS as f64 - c) / half
        }
    }

    /// Bipolar triangle in [-1, 1], starting at 0 and rising.
    fn bipolar(&self) -> f64 {
        let quarter = (LFO_STEPS / 4) as f64;
        let c = self.counter as f64;
        if c < quarter {
            c / quarter
        } else if c < 3.0 * quarter {
            2.0 - c / quarter
        } else {
            c / quarter - 4.0
        }
    }

    /// Extra attenuation for an AM-enabled operator, in envelope units.
    pub fn am_attenuation(&self, ams: u8) -> i32 {
        if !self.enabled {
            return 0;
        }
        (AM_DEPTH[(ams & 3) as usize] * self.unipolar()) as i32
    }

    /// Multiplier applied to phase increments for vibrato.
    pub fn pm_factor(&self, fms: u8) -> f64 {
        let depth = FM_DEPTH_CENTS[(fms & 7) as usize];
        if !self.enabled || depth == 0.0 {
            return 1.0;
        }
        2.0_f64.powf(depth * self.bipolar() / 1200.0)
    }
}

/// LFO frequency in Hz for a rate setting at the given native sample rate.
pub fn lfo_frequency(rate: u8, native_rate: f64) -> f64 {
    native_rate / (LFO_DIVIDER_TABLE[(rate & 7) as usize] as f64 * LFO_STEPS as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{native_rate, CLOCK_NTSC};

    #[test]
    fn rates_span_documented_range() {
        let native = native_rate(CLOCK_NTSC);
        let slowest = lfo_frequency(0, native);
        let fastest = lfo_frequency(7, native);
        assert!((slowest - 3.98).abs() < 0.2, "slowest {slowest}");
        assert!((fastest - 72.2).abs() < 12.0, "fastest {fastest}");
    }

    #[test]
    fn disabled_lfo_is_neutral() {
        let mut lfo = Lfo::new();
        for _ in 0..10_000 {
            lfo.tick();
        }
        assert_eq!(lfo.am_attenuation(3), 0);
        assert_eq!(lfo.pm_factor(7), 1.0);
    }

    #[test]
    fn am_depth_peaks_at_half_cycle() {
        let mut lfo = Lfo::new();
        lfo.write(0x08 | 7);
        let mut peak = 0;
        for _ in 0..(5 * LFO_STEPS as usize) {
            lfo.tick();
            peak = peak.max(lfo.am_attenuation(3));
        }
        assert_eq!(peak, (11.8 * 64.0) as i32);
    }

    #[test]
    fn vibrato_stays_within_depth() {
        let mut lfo = Lfo::new();
        lfo.write(0x08 | 6);
        let bound = 2.0_f64.powf(80.0 / 1200.0) + 1e-9;
        for _ in 0..(8 * LFO_STEPS as usize * 4) {
            lfo.tick();
            let f = lfo.pm_factor(7);
            assert!(f <= bound && f >= 1.0 / bound);
        }
    }

    #[test]
    fn disabling_resets_position() {
        let mut lfo = Lfo::new();
        lfo.write(0x0F);
        for _ in 0..100 {
            lfo.tick();
        }
        lfo.write(0x00);
        lfo.write(0x0F);
        assert_eq!(lfo.am_attenuation(3), 0);
    }
}
