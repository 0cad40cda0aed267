//! Opn2 - application builder and runner

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{info, warn};
use rtrb::RingBuffer;

use super::pool::{VoicePool, VoiceSnapshot, POOL_SIZE};
use super::ui::{UiApp, UiInit};

use opn2_fm::{
    chip::CLOCK_NTSC,
    synth::{message::SynthMessage, PatchParams},
    EngineConfig, MAX_BLOCK_SIZE,
};

/// Control messages queued from the UI thread.
const CONTROL_QUEUE_SIZE: usize = 256;
/// Mono scope samples queued from the audio thread.
const SCOPE_QUEUE_SIZE: usize = 8192;
/// Voice snapshots queued from the audio thread.
const STATUS_QUEUE_SIZE: usize = 16;

/// Main application builder
pub struct Opn2 {
    name: String,
    patch: PatchParams,
    config: EngineConfig,
}

impl Opn2 {
    pub fn new(name: impl Into<String>, patch: PatchParams) -> Self {
        Self {
            name: name.into(),
            patch,
            config: EngineConfig {
                clock: CLOCK_NTSC,
                ..EngineConfig::default()
            },
        }
    }

    /// Chip master clock in Hz
    pub fn clock(mut self, clock: u32) -> Self {
        self.config.clock = clock;
        self
    }

    /// Run the application (takes over the terminal, plays audio)
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f64;
        let channels = config.channels() as usize;
        info!(
            "output {} Hz, {channels} channels, chip {:.1} Hz",
            sample_rate,
            self.config.native_rate()
        );

        let (control_tx, control_rx) = RingBuffer::<SynthMessage>::new(CONTROL_QUEUE_SIZE);
        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_QUEUE_SIZE);
        let (mut status_tx, status_rx) =
            RingBuffer::<[VoiceSnapshot; POOL_SIZE]>::new(STATUS_QUEUE_SIZE);

        let mut pool = VoicePool::new(self.config, self.patch, control_rx);
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE * 2];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames * 2];
                    pool.render_block(sample_rate, block);

                    let out_off = frames_written * channels;
                    for (i, frame) in block.chunks_exact(2).enumerate() {
                        let out = &mut data[out_off + i * channels..out_off + (i + 1) * channels];
                        match out {
                            [mono] => *mono = 0.5 * (frame[0] + frame[1]),
                            [left, right, rest @ ..] => {
                                *left = frame[0];
                                *right = frame[1];
                                rest.fill(0.0);
                            }
                            [] => {}
                        }
                        // Scope drops samples when the UI falls behind
                        let _ = scope_tx.push(0.5 * (frame[0] + frame[1]));
                    }

                    frames_written += frames;
                }

                let _ = status_tx.push(pool.snapshot());
            },
            |err| warn!("audio stream error: {err}"),
            None,
        )?;

        stream.play()?;

        let init = UiInit {
            name: self.name,
            patch: self.patch,
            config: self.config,
            sample_rate,
        };
        let mut app = UiApp::new(init, control_tx, scope_rx, status_rx);

        let mut terminal = ratatui::init();
        let result = app.run(&mut terminal);
        ratatui::restore();

        drop(stream);
        result
    }
}
