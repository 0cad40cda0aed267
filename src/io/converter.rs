use crate::{io::midi::MidiEvent, synth::message::SynthMessage};

pub fn midi_to_synth(midi: MidiEvent, channel_filter: u8) -> Option<SynthMessage> {
    match midi {
        // Running-status note-offs arrive as note-ons with zero velocity
        MidiEvent::NoteOn {
            channel,
            key,
            velocity: 0,
        } if channel == channel_filter => Some(SynthMessage::NoteOff {
            note: key,
            velocity: 0,
        }),
        MidiEvent::NoteOn {
            channel,
            key,
            velocity,
        } if channel == channel_filter => Some(SynthMessage::NoteOn {
            note: key,
            velocity,
        }),
        MidiEvent::NoteOff {
            channel,
            key,
            velocity,
        } if channel == channel_filter => Some(SynthMessage::NoteOff {
            note: key,
            velocity,
        }),
        MidiEvent::ControlChange {
            channel,
            controller: 120,
            ..
        } if channel == channel_filter => Some(SynthMessage::AllSoundOff),
        MidiEvent::ControlChange {
            channel,
            controller: 123,
            ..
        } if channel == channel_filter => Some(SynthMessage::AllNotesOff),
        MidiEvent::ProgramChange { channel, program } if channel == channel_filter => {
            Some(SynthMessage::Program(program))
        }
        _ => None,
    }
}

/// Equal-tempered pitch, A4 (note 69) = 440 Hz.
pub fn midi_note_to_hz(note: u8) -> f64 {
    440.0 * 2.0_f64.powf((note as f64 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_pitches() {
        assert_eq!(midi_note_to_hz(69), 440.0);
        assert!((midi_note_to_hz(60) - 261.625_565).abs() < 1e-5);
        assert!((midi_note_to_hz(81) - 880.0).abs() < 1e-9);
    }

    #[test]
    fn zero_velocity_note_on_is_note_off() {
        let msg = midi_to_synth(
            MidiEvent::NoteOn {
                channel: 0,
                key: 64,
                velocity: 0,
            },
            0,
        );
        assert_eq!(
            msg,
            Some(SynthMessage::NoteOff {
                note: 64,
                velocity: 0
            })
        );
    }

    #[test]
    fn other_channels_are_filtered() {
        let event = MidiEvent::NoteOn {
            channel: 3,
            key: 60,
            velocity: 90,
        };
        assert_eq!(midi_to_synth(event, 0), None);
        assert_eq!(
            midi_to_synth(event, 3),
            Some(SynthMessage::NoteOn {
                note: 60,
                velocity: 90
            })
        );
    }

    #[test]
    fn channel_mode_messages() {
        let cc = |controller| MidiEvent::ControlChange {
            channel: 0,
            controller,
            value: 0,
        };
        assert_eq!(midi_to_synth(cc(123), 0), Some(SynthMessage::AllNotesOff));
        assert_eq!(midi_to_synth(cc(120), 0), Some(SynthMessage::AllSoundOff));
        assert_eq!(midi_to_synth(cc(7), 0), None);
    }
}
