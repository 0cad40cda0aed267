//! Voice pool - six FM voices fed from the control queue

use log::debug;
use rtrb::Consumer;

use opn2_fm::{
    chip::{EnvelopeState, ENV_MAX, NUM_OPERATORS},
    synth::{message::MessageReceiver, message::SynthMessage, FmVoice, PatchParams, VoiceState},
    voices, EngineConfig, MAX_BLOCK_SIZE,
};

pub const POOL_SIZE: usize = 6;

/// What the UI shows for one voice. Copy so it can cross the ring buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoiceSnapshot {
    pub state: VoiceState,
    pub note: u8,
    pub envelopes: [EnvelopeState; NUM_OPERATORS],
    /// Operator attenuation, 0 (loudest) ..= 1023.
    pub attenuation: [i32; NUM_OPERATORS],
}

impl Default for VoiceSnapshot {
    fn default() -> Self {
        Self {
            state: VoiceState::Free,
            note: 0,
            envelopes: [EnvelopeState::Off; NUM_OPERATORS],
            attenuation: [ENV_MAX; NUM_OPERATORS],
        }
    }
}

pub struct VoicePool<R: MessageReceiver = Consumer<SynthMessage>> {
    voices: Vec<FmVoice>,
    /// Frame counter value at each voice's last note-on.
    started: Vec<u64>,
    rx: R,
    scratch: Vec<f32>,
    frame_counter: u64,
}

impl<R: MessageReceiver> VoicePool<R> {
    pub fn new(config: EngineConfig, patch: PatchParams, rx: R) -> Self {
        let voices = (0..POOL_SIZE)
            .map(|_| {
                let mut voice = FmVoice::new(config);
                voice.set_patch(patch);
                voice
            })
            .collect();

        Self {
            voices,
            started: vec![0; POOL_SIZE],
            rx,
            scratch: vec![0.0; MAX_BLOCK_SIZE * 2],
            frame_counter: 0,
        }
    }

    /// Drain control messages, then mix every voice into `out`
    /// (interleaved stereo, at most `MAX_BLOCK_SIZE` frames).
    pub fn render_block(&mut self, host_rate: f64, out: &mut [f32]) {
        while let Some(msg) = self.rx.pop() {
            self.handle(msg);
        }

        out.fill(0.0);
        let len = out.len().min(self.scratch.len());
        for voice in &mut self.voices {
            if voice.is_free() {
                continue;
            }
            let scratch = &mut self.scratch[..len];
            voice.render(host_rate, scratch);
            for (o, s) in out.iter_mut().zip(scratch.iter()) {
                *o += s;
            }
        }

        self.frame_counter += (out.len() / 2) as u64;
    }

    fn handle(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn { note, velocity } => {
                let index = self.allocate_voice();
                self.voices[index].note_on(note, velocity);
                self.started[index] = self.frame_counter;
            }
            SynthMessage::NoteOff { note, .. } => {
                if let Some(voice) = self
                    .voices
                    .iter_mut()
                    .find(|v| v.note() == note && v.state() == VoiceState::Active)
                {
                    voice.note_off(true);
                }
            }
            SynthMessage::AllNotesOff => {
                for voice in &mut self.voices {
                    voice.note_off(true);
                }
            }
            SynthMessage::AllSoundOff => {
                for voice in &mut self.voices {
                    voice.note_off(false);
                }
            }
            SynthMessage::Program(program) => {
                let (name, patch) = voices::by_program(program);
                debug!("program {program}: {name}");
                self.set_patch(patch);
            }
        }
    }

    /// Give every voice a new patch; sounding voices pick it up next block.
    pub fn set_patch(&mut self, patch: PatchParams) {
        for voice in &mut self.voices {
            voice.set_patch(patch);
        }
    }

    /// Free voice first, then the oldest releasing one, then the oldest note.
    fn allocate_voice(&self) -> usize {
        if let Some(index) = self.voices.iter().position(|v| v.is_free()) {
            return index;
        }

        let oldest = |wanted: Option<VoiceState>| {
            self.voices
                .iter()
                .enumerate()
                .filter(|(_, v)| wanted.map_or(true, |s| v.state() == s))
                .min_by_key(|(i, _)| self.started[*i])
                .map(|(i, _)| i)
        };

        oldest(Some(VoiceState::Releasing))
            .or_else(|| oldest(None))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> [VoiceSnapshot; POOL_SIZE] {
        let mut out = [VoiceSnapshot::default(); POOL_SIZE];
        for (snap, voice) in out.iter_mut().zip(&self.voices) {
            snap.state = voice.state();
            snap.note = voice.note();
            if let Some(channel) = voice.chip().channel(0) {
                for op in 0..NUM_OPERATORS {
                    let slot = channel.operator(op);
                    snap.envelopes[op] = slot.envelope().state();
                    snap.attenuation[op] = slot.attenuation();
                }
            }
        }
        out
    }
}
