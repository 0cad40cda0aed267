use log::debug;
#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::chip::{Chip, FnumBlock, OperatorField, NUM_OPERATORS, OPERATOR_SLOT};
use crate::io::converter::midi_note_to_hz;
use crate::EngineConfig;

#[cfg(feature = "rtrb")]
use super::params::{param_channel, ParamHandle, ParamReceiver};
use super::params::{GlobalParams, OperatorParams, PatchParams};
use super::resampler::VoiceResampler;

/// Register write order for each operator.
const OPERATOR_FIELDS: [OperatorField; 7] = [
    OperatorField::DetuneMultiple,
    OperatorField::TotalLevel,
    OperatorField::KeyScaleAttack,
    OperatorField::AmDecay,
    OperatorField::SustainRate,
    OperatorField::SustainLevelRelease,
    OperatorField::SsgEg,
];

const KEY_ON_ALL: u8 = 0xF0;
const KEY_OFF_ALL: u8 = 0x00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Keyed on
    Releasing, // Keyed off, tail still sounding
}

/// One polyphonic voice: a private chip playing on channel 1.
///
/// Patch changes are staged and written to the chip at the start of the
/// next render block, never in the middle of one.
pub struct FmVoice {
    chip: Chip,
    config: EngineConfig,
    resampler: VoiceResampler,

    params: PatchParams,
    dirty: bool,
    #[cfg(feature = "rtrb")]
    params_rx: Option<Consumer<PatchParams>>,

    state: VoiceState,
    note: u8,
    velocity: u8,
    gain: f32,
    /// Seconds spent releasing.
    tail_elapsed: f64,
}

impl FmVoice {
    pub fn new(config: EngineConfig) -> Self {
        let chip = Chip::new(config.clock);
        let resampler = VoiceResampler::new(chip.sample_rate(), chip.sample_rate());
        Self {
            chip,
            config,
            resampler,
            params: PatchParams::default(),
            dirty: true,
            #[cfg(feature = "rtrb")]
            params_rx: None,
            state: VoiceState::Free,
            note: 0,
            velocity: 0,
            gain: 0.0,
            tail_elapsed: 0.0,
        }
    }

    /// A voice plus the handle a control thread uses to push patches to it.
    #[cfg(feature = "rtrb")]
    pub fn with_handle(config: EngineConfig) -> (Self, ParamHandle) {
        let (handle, rx) = param_channel();
        let mut voice = Self::new(config);
        voice.params_rx = Some(rx);
        (voice, handle)
    }

    /// Stage new settings for natural-order operator `operator` (0..=3).
    pub fn set_operator_params(&mut self, operator: usize, params: OperatorParams) {
        if let Some(slot) = self.params.operators.get_mut(operator) {
            *slot = params;
            self.dirty = true;
        }
    }

    pub fn set_global_params(&mut self, params: GlobalParams) {
        self.params.global = params;
        self.dirty = true;
    }

    pub fn set_patch(&mut self, params: PatchParams) {
        self.params = params;
        self.dirty = true;
    }

    pub fn patch(&self) -> &PatchParams {
        &self.params
    }

    pub fn note_on(&mut self, note: u8, velocity: u8) {
        self.poll_params();

        self.chip.reset();
        self.resampler.reset();
        self.write_all_registers();
        self.dirty = false;

        let hz = midi_note_to_hz(note) * self.params.global.octave_factor();
        let (high, low) = FnumBlock::from_hz(hz, self.config.clock).registers();
        self.chip.write(0, 0xA4, high);
        self.chip.write(0, 0xA0, low);
        self.chip.write(0, 0x28, KEY_ON_ALL);

        self.note = note;
        self.velocity = velocity.min(127);
        self.gain = self.velocity as f32 / 127.0 / 65536.0;
        self.tail_elapsed = 0.0;
        self.state = VoiceState::Active;
        debug!("note on {note} velocity {velocity} ({hz:.2} Hz)");
    }

    /// Key off. With `allow_tail_off` the release keeps rendering until the
    /// carriers fall silent or the configured tail limit passes; without it
    /// the voice stops and frees immediately.
    pub fn note_off(&mut self, allow_tail_off: bool) {
        if self.state == VoiceState::Free {
            return;
        }
        self.chip.write(0, 0x28, KEY_OFF_ALL);

        if allow_tail_off {
            if self.state == VoiceState::Active {
                self.state = VoiceState::Releasing;
                self.tail_elapsed = 0.0;
                debug!("note off {}, releasing", self.note);
            }
        } else {
            self.chip.reset();
            self.free();
            debug!("note off {}, hard stop", self.note);
        }
    }

    /// Fill `out` (interleaved stereo) at `host_rate`. A free voice writes silence.
    pub fn render(&mut self, host_rate: f64, out: &mut [f32]) {
        self.poll_params();

        if self.state == VoiceState::Free {
            out.fill(0.0);
            return;
        }

        if self.dirty {
            self.dirty = false;
            self.write_all_registers();
        }

        self.resampler.set_rates(self.chip.sample_rate(), host_rate);
        let gain = self.gain;
        let chip = &mut self.chip;
        let resampler = &mut self.resampler;

        let mut frames = out.chunks_exact_mut(2);
        for frame in &mut frames {
            let (left, right) = resampler.next_frame(|| chip.generate());
            frame[0] = left * gain;
            frame[1] = right * gain;
        }
        frames.into_remainder().fill(0.0);

        if self.state == VoiceState::Releasing {
            let frame_count = (out.len() / 2) as f64;
            if host_rate.is_finite() && host_rate > 0.0 {
                self.tail_elapsed += frame_count / host_rate;
            }
            let tail_done = self.tail_elapsed >= self.config.release_tail_seconds as f64;
            if tail_done || !self.chip.is_audible() {
                debug!("voice for note {} finished", self.note);
                self.chip.reset();
                self.free();
            }
        }
    }

    fn poll_params(&mut self) {
        #[cfg(feature = "rtrb")]
        if let Some(params) = self.params_rx.as_mut().and_then(|rx| rx.latest()) {
            self.params = params;
            self.dirty = true;
        }
    }

    fn write_all_registers(&mut self) {
        let global = self.params.global;
        self.chip.write(0, 0xB0, global.feedback_algorithm_register());
        self.chip.write(0, 0xB4, global.stereo_lfo_register());
        self.chip.write(0, 0x22, global.lfo_register());

        for operator in 0..NUM_OPERATORS {
            let params = self.params.operators[operator];
            let offset = (OPERATOR_SLOT[operator] * 4) as u8;
            for field in OPERATOR_FIELDS {
                self.chip
                    .write(0, field.base_address() + offset, params.register_value(field));
            }
        }
    }

    fn free(&mut self) {
        self.state = VoiceState::Free;
        self.note = 0;
        self.velocity = 0;
        self.tail_elapsed = 0.0;
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// The voice's chip, for inspection (envelope states, levels).
    pub fn chip(&self) -> &Chip {
        &self.chip
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
