/*
Voice Resampler
===============

The chip runs at its own fixed rate (about 53 kHz for NTSC) while the host
asks for 44.1, 48, 96 kHz or anything else. Each voice owns one of these
to bridge the two with linear interpolation.

    position    How far we are between the previous and current chip
                samples, in chip samples. Starts at 1.0 so the very first
                output pulls a fresh sample.

    ratio       chip rate / host rate. Added to `position` per output.

Per output sample:

    while position >= 1.0:
        previous = current
        current  = chip.generate()
        position -= 1.0
    out = previous + position * (current - previous)
    position += ratio

Chip samples are consumed strictly in order and never re-read, so the
chip's envelopes advance in real time regardless of the host rate.
*/

#[derive(Debug, Clone)]
pub struct VoiceResampler {
    ratio: f64,
    position: f64,
    previous: (f32, f32),
    current: (f32, f32),
}

impl VoiceResampler {
    pub fn new(native_rate: f64, host_rate: f64) -> Self {
        let mut resampler = Self {
            ratio: 1.0,
            position: 1.0,
            previous: (0.0, 0.0),
            current: (0.0, 0.0),
        };
        resampler.set_rates(native_rate, host_rate);
        resampler
    }

    /// Update the conversion ratio. Nonsensical rates fall back to 1:1.
    pub fn set_rates(&mut self, native_rate: f64, host_rate: f64) {
        let ratio = native_rate / host_rate;
        self.ratio = if ratio.is_finite() && ratio > 0.0 {
            ratio
        } else {
            1.0
        };
    }

    pub fn reset(&mut self) {
        self.position = 1.0;
        self.previous = (0.0, 0.0);
        self.current = (0.0, 0.0);
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Produce one host-rate stereo sample, pulling chip samples from
    /// `source` as needed.
    #[inline]
    pub fn next_frame<F>(&mut self, mut source: F) -> (f32, f32)
    where
        F: FnMut() -> (i16, i16),
    {
        while self.position >= 1.0 {
            self.previous = self.current;
            let (left, right) = source();
            self.current = (left as f32, right as f32);
            self.position -= 1.0;
        }

        let t = self.position as f32;
        let left = self.previous.0 + t * (self.current.0 - self.previous.0);
        let right = self.previous.1 + t * (self.current.1 - self.previous.1);
        self.position += self.ratio;
        (left, right)
    }
}
