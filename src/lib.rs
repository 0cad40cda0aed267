pub mod chip; // OPN2 register-level emulation
pub mod io;
pub mod patch; // Instrument descriptors and the .fui codec
pub mod synth; // Host-facing voices, resampling, parameter publishing
pub mod voices;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Per-voice engine configuration.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Chip master clock in Hz. The native output rate is `clock / 144`.
    pub clock: u32,
    /// Longest a released voice keeps rendering before it is freed, even if
    /// its carriers have not decayed to silence yet.
    pub release_tail_seconds: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clock: chip::CLOCK_NTSC,
            release_tail_seconds: 2.0,
        }
    }
}

impl EngineConfig {
    /// Native sample rate of a chip running at this configuration's clock.
    pub fn native_rate(&self) -> f64 {
        chip::native_rate(self.clock)
    }
}
