#[cfg(feature = "rtrb")]
use rtrb::Consumer;

/// Control events for a voice pool, sent from UI/MIDI threads to the audio thread.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SynthMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    /// Release every sounding note, letting tails ring out.
    AllNotesOff,
    /// Silence everything immediately.
    AllSoundOff,
    /// Select a built-in preset by index.
    Program(u8),
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}
