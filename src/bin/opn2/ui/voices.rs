//! Live voice list with per-operator envelope levels

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::super::pool::VoiceSnapshot;
use opn2_fm::{
    chip::{EnvelopeState, ENV_MAX},
    synth::VoiceState,
};

const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];
const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn note_name(note: u8) -> String {
    format!("{}{}", NOTE_NAMES[note as usize % 12], (note / 12) as i32 - 1)
}

/// One bar glyph per operator, taller is louder
fn level_glyph(state: EnvelopeState, attenuation: i32) -> char {
    if state == EnvelopeState::Off {
        return ' ';
    }
    let level = (ENV_MAX - attenuation.clamp(0, ENV_MAX)) as usize;
    LEVELS[level * (LEVELS.len() - 1) / ENV_MAX as usize]
}

/// Render the voice pool
pub fn render_voices(frame: &mut Frame, area: Rect, voices: &[VoiceSnapshot]) {
    let lines: Vec<Line> = voices
        .iter()
        .enumerate()
        .map(|(i, voice)| {
            let (label, colour) = match voice.state {
                VoiceState::Free => ("free".to_string(), Color::DarkGray),
                VoiceState::Active => (note_name(voice.note), Color::Green),
                VoiceState::Releasing => (note_name(voice.note), Color::Yellow),
            };
            let bars: String = voice
                .envelopes
                .iter()
                .zip(voice.attenuation)
                .map(|(&state, att)| level_glyph(state, att))
                .collect();
            Line::from(vec![
                Span::raw(format!(" {} ", i + 1)),
                Span::styled(format!("{label:<5}"), Style::default().fg(colour)),
                Span::styled(bars, Style::default().fg(Color::Cyan)),
            ])
        })
        .collect();

    let widget = Paragraph::new(lines).block(Block::default().title(" Voices ").borders(Borders::ALL));
    frame.render_widget(widget, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_names() {
        assert_eq!(note_name(60), "C-4");
        assert_eq!(note_name(69), "A-4");
        assert_eq!(note_name(1), "C#-1");
    }

    #[test]
    fn glyph_tracks_level() {
        assert_eq!(level_glyph(EnvelopeState::Off, 0), ' ');
        assert_eq!(level_glyph(EnvelopeState::Sustain, 0), '█');
        assert_eq!(level_glyph(EnvelopeState::Release, ENV_MAX), '▁');
    }
}
