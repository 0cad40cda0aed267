//! TUI module for opn2
//!
//! Plays notes from the computer keyboard and shows the patch, the live
//! voice envelopes, an oscilloscope and a spectrum of the output.

mod operators;
mod spectrum;
mod voices;
mod waveform;

use color_eyre::eyre::Result as EyreResult;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use log::debug;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use std::time::{Duration, Instant};

use super::keyboard::{
    all_sound_off_bytes, midi_message, note_for_key, note_off_bytes, note_on_bytes,
    program_bytes, HeldKeys, MAX_OCTAVE, MIN_OCTAVE,
};
use super::pool::{VoiceSnapshot, POOL_SIZE};
use opn2_fm::{
    synth::{message::SynthMessage, PatchParams},
    voices::{self as presets, PRESETS},
    EngineConfig,
};

use operators::render_operators;
use spectrum::{render_spectrum, SpectrumAnalyzer};
use voices::render_voices;
use waveform::render_waveform;

/// Audio visualization buffer size
const VIS_BUFFER_SIZE: usize = 1024;
const NOTE_VELOCITY: u8 = 110;

/// Static state handed over once at start-up
pub struct UiInit {
    pub name: String,
    pub patch: PatchParams,
    pub config: EngineConfig,
    pub sample_rate: f64,
}

/// UI application state
pub struct UiApp {
    name: String,
    patch: PatchParams,
    config: EngineConfig,
    /// Next preset for the program key
    next_program: u8,

    control_tx: Producer<SynthMessage>,
    scope_rx: Consumer<f32>,
    status_rx: Consumer<[VoiceSnapshot; POOL_SIZE]>,

    voices: [VoiceSnapshot; POOL_SIZE],
    audio_buffer: Vec<f32>,
    spectrum: SpectrumAnalyzer,

    held: HeldKeys,
    octave: i8,
    /// Terminal reports key releases, so notes need no hold timeout
    release_events: bool,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        init: UiInit,
        control_tx: Producer<SynthMessage>,
        scope_rx: Consumer<f32>,
        status_rx: Consumer<[VoiceSnapshot; POOL_SIZE]>,
    ) -> Self {
        Self {
            name: init.name,
            patch: init.patch,
            config: init.config,
            next_program: 0,
            control_tx,
            scope_rx,
            status_rx,
            voices: [VoiceSnapshot::default(); POOL_SIZE],
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            spectrum: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, init.sample_rate as f32),
            held: HeldKeys::default(),
            octave: 4,
            release_events: false,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        self.release_events = supports_keyboard_enhancement().unwrap_or(false);
        if self.release_events {
            execute!(
                std::io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let result = self.event_loop(terminal);

        if self.release_events {
            execute!(std::io::stdout(), PopKeyboardEnhancementFlags)?;
        }
        self.send_midi(&all_sound_off_bytes());
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_status();
            if !self.release_events {
                for note in self.held.expire(Instant::now()) {
                    self.send_midi(&note_off_bytes(note));
                }
            }

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    /// Keep the newest VIS_BUFFER_SIZE scope samples
    fn poll_audio(&mut self) {
        let mut fresh = false;
        while let Ok(sample) = self.scope_rx.pop() {
            self.audio_buffer.push(sample);
            fresh = true;
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
        if fresh {
            self.spectrum.update(&self.audio_buffer);
        }
    }

    fn poll_status(&mut self) {
        while let Ok(voices) = self.status_rx.pop() {
            self.voices = voices;
        }
    }

    fn send_midi(&mut self, bytes: &[u8]) {
        let Some(msg) = midi_message(bytes) else {
            debug!("ignored MIDI message {bytes:02X?}");
            return;
        };
        if self.control_tx.push(msg).is_err() {
            debug!("control queue full, dropped {msg:?}");
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match (key.code, key.kind) {
            (KeyCode::Esc, KeyEventKind::Press) => self.should_quit = true,
            (KeyCode::Char('['), KeyEventKind::Press) => self.shift_octave(-1),
            (KeyCode::Char(']'), KeyEventKind::Press) => self.shift_octave(1),
            (KeyCode::Tab, KeyEventKind::Press) => self.next_preset(),
            (KeyCode::Char(' '), KeyEventKind::Press) => self.release_all(),
            (KeyCode::Char(c), kind) => {
                let Some(note) = note_for_key(c, self.octave) else {
                    return;
                };
                match kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => {
                        if self.held.press(note, Instant::now()) {
                            self.send_midi(&note_on_bytes(note, NOTE_VELOCITY));
                        }
                    }
                    KeyEventKind::Release => {
                        if self.held.release(note) {
                            self.send_midi(&note_off_bytes(note));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn shift_octave(&mut self, delta: i8) {
        self.release_all();
        self.octave = (self.octave + delta).clamp(MIN_OCTAVE, MAX_OCTAVE);
    }

    fn release_all(&mut self) {
        for note in self.held.drain() {
            self.send_midi(&note_off_bytes(note));
        }
    }

    fn next_preset(&mut self) {
        let program = self.next_program;
        let (name, patch) = presets::by_program(program);
        self.name = name.to_string();
        self.patch = patch;
        self.next_program = ((program as usize + 1) % PRESETS.len()) as u8;
        self.send_midi(&program_bytes(program));
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),  // Title
                Constraint::Length(7),  // Operators + voices
                Constraint::Min(6),     // Waveform
                Constraint::Length(10), // Spectrum
                Constraint::Length(1),  // Help bar
            ])
            .split(area);

        let title = Paragraph::new(format!(
            " {}  |  clock {} Hz ({:.0} Hz native)  |  octave {}",
            self.name,
            self.config.clock,
            self.config.native_rate(),
            self.octave
        ))
        .style(Style::default().fg(Color::Yellow));
        frame.render_widget(title, chunks[0]);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        render_operators(frame, panels[0], &self.patch);
        render_voices(frame, panels[1], &self.voices);

        render_waveform(frame, chunks[2], &self.audio_buffer);
        render_spectrum(frame, chunks[3], self.spectrum.data());

        let help = Paragraph::new(
            " [zsxdcvgbhnjm / q2w3er5t6y7u] Play  [ [ ] ] Octave  [Tab] Next preset  [Space] Release  [Esc] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[4]);
    }
}
