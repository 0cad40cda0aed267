//! Computer keyboard as a two-octave piano
//!
//!   s d   g h j         2 3   5 6 7
//!  z x c v b n m       q w e r t y u
//!
//! The lower row starts at the base octave's C, the upper row one octave up.
//! Key presses go out as raw MIDI channel messages, the same bytes a
//! hardware keyboard would send, and are parsed back into synth messages.

use std::time::{Duration, Instant};

use opn2_fm::{
    io::{converter::midi_to_synth, midi::MidiEvent},
    synth::message::SynthMessage,
};

const LOWER_ROW: &str = "zsxdcvgbhnjm";
const UPPER_ROW: &str = "q2w3er5t6y7u";

/// MIDI channel the keyboard plays on.
pub const MIDI_CHANNEL: u8 = 0;

/// CC 120, all sound off
const ALL_SOUND_OFF: u8 = 120;

pub const MIN_OCTAVE: i8 = 0;
pub const MAX_OCTAVE: i8 = 8;

/// Terminals without key-release reporting only send repeats while a key is
/// held, so a note whose key has been quiet this long is released.
pub const HOLD_TIMEOUT: Duration = Duration::from_millis(450);

/// MIDI note for `key` with the lower row at `octave` (C4 = 60 at octave 4).
pub fn note_for_key(key: char, octave: i8) -> Option<u8> {
    let key = key.to_ascii_lowercase();
    let offset = LOWER_ROW
        .find(key)
        .or_else(|| UPPER_ROW.find(key).map(|i| i + 12))?;
    let note = (octave as i32 + 1) * 12 + offset as i32;
    u8::try_from(note).ok().filter(|&n| n <= 127)
}

pub fn note_on_bytes(note: u8, velocity: u8) -> [u8; 3] {
    [0x90 | MIDI_CHANNEL, note & 0x7F, velocity & 0x7F]
}

pub fn note_off_bytes(note: u8) -> [u8; 3] {
    [0x80 | MIDI_CHANNEL, note & 0x7F, 0]
}

pub fn program_bytes(program: u8) -> [u8; 2] {
    [0xC0 | MIDI_CHANNEL, program & 0x7F]
}

pub fn all_sound_off_bytes() -> [u8; 3] {
    [0xB0 | MIDI_CHANNEL, ALL_SOUND_OFF, 0]
}

/// Parse a channel message for the keyboard's channel into a synth message.
pub fn midi_message(bytes: &[u8]) -> Option<SynthMessage> {
    MidiEvent::from_bytes(bytes).and_then(|event| midi_to_synth(event, MIDI_CHANNEL))
}

/// Notes currently held from the keyboard, with the time each was last seen.
#[derive(Default)]
pub struct HeldKeys {
    held: Vec<(u8, Instant)>,
}

impl HeldKeys {
    /// Record a press or repeat. Returns true when the note is newly held.
    pub fn press(&mut self, note: u8, now: Instant) -> bool {
        match self.held.iter_mut().find(|(n, _)| *n == note) {
            Some((_, seen)) => {
                *seen = now;
                false
            }
            None => {
                self.held.push((note, now));
                true
            }
        }
    }

    /// Returns true when the note was held.
    pub fn release(&mut self, note: u8) -> bool {
        let before = self.held.len();
        self.held.retain(|(n, _)| *n != note);
        self.held.len() != before
    }

    /// Remove and return notes whose keys have gone quiet.
    pub fn expire(&mut self, now: Instant) -> Vec<u8> {
        let mut expired = Vec::new();
        self.held.retain(|&(note, seen)| {
            let alive = now.duration_since(seen) < HOLD_TIMEOUT;
            if !alive {
                expired.push(note);
            }
            alive
        });
        expired
    }

    pub fn drain(&mut self) -> Vec<u8> {
        self.held.drain(..).map(|(note, _)| note).collect()
    }

    pub fn notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.held.iter().map(|(note, _)| *note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_map_to_chromatic_notes() {
        assert_eq!(note_for_key('z', 4), Some(60));
        assert_eq!(note_for_key('s', 4), Some(61));
        assert_eq!(note_for_key('m', 4), Some(71));
        assert_eq!(note_for_key('q', 4), Some(72));
        assert_eq!(note_for_key('U', 4), Some(83));
        assert_eq!(note_for_key('z', 0), Some(12));
        assert_eq!(note_for_key('p', 4), None);
    }

    #[test]
    fn key_messages_parse_back_to_synth_messages() {
        assert_eq!(
            midi_message(&note_on_bytes(60, 110)),
            Some(SynthMessage::NoteOn {
                note: 60,
                velocity: 110
            })
        );
        assert_eq!(
            midi_message(&note_off_bytes(60)),
            Some(SynthMessage::NoteOff {
                note: 60,
                velocity: 0
            })
        );
        assert_eq!(midi_message(&program_bytes(3)), Some(SynthMessage::Program(3)));
        assert_eq!(midi_message(&all_sound_off_bytes()), Some(SynthMessage::AllSoundOff));

        // Other channels and incomplete messages are dropped
        assert_eq!(midi_message(&[0x91, 60, 100]), None);
        assert_eq!(midi_message(&[0x90, 60]), None);
    }

    #[test]
    fn notes_above_midi_range_are_dropped() {
        assert_eq!(note_for_key('z', 9), Some(120));
        assert_eq!(note_for_key('q', 9), None);
    }

    #[test]
    fn held_keys_expire_after_timeout() {
        let start = Instant::now();
        let mut keys = HeldKeys::default();
        assert!(keys.press(60, start));
        assert!(!keys.press(60, start));
        assert!(keys.press(64, start + Duration::from_millis(300)));

        let later = start + Duration::from_millis(500);
        assert_eq!(keys.expire(later), vec![60]);
        assert_eq!(keys.notes().collect::<Vec<_>>(), vec![64]);
        assert!(keys.release(64));
        assert!(!keys.release(64));
    }
}
