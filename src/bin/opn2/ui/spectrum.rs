//! Spectrum analyzer widget
//!
//! FFT of the scope buffer, read out at log-spaced frequencies and shown in
//! dB relative to full scale. Bars rise instantly and fall back slowly.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Number of frequency points to display
const SPECTRUM_BINS: usize = 64;
const FLOOR_DB: f64 = -96.0;
/// dB the display may fall per update
const FALL_DB: f64 = 3.0;

pub struct SpectrumAnalyzer {
    /// Hann window coefficients
    window: Vec<f32>,
    /// FFT bin read for each display point, plus its frequency (Hz)
    points: Vec<(usize, f64)>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Window gain correction so a full-scale sine reads 0 dB
    norm: f64,
    /// (log10 frequency, dBFS)
    spectrum: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    /// `buffer_len` must match the scope buffer passed to `update`.
    pub fn new(buffer_len: usize, sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(buffer_len);

        let window: Vec<f32> = (0..buffer_len)
            .map(|i| {
                if buffer_len > 1 {
                    let denom = (buffer_len - 1) as f32;
                    0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos())
                } else {
                    1.0
                }
            })
            .collect();
        let window_sum: f64 = window.iter().map(|&w| w as f64).sum();

        let half = (buffer_len / 2).max(1);
        let bin_hz = sample_rate as f64 / buffer_len.max(1) as f64;
        let max_freq = (sample_rate as f64 / 2.0).min(20_000.0).max(bin_hz * 2.0);
        let min_freq = (bin_hz * 2.0).max(30.0).min(max_freq);
        let ratio = max_freq / min_freq;

        let points: Vec<(usize, f64)> = (0..SPECTRUM_BINS)
            .map(|i| {
                let t = i as f64 / (SPECTRUM_BINS - 1) as f64;
                let freq = min_freq * ratio.powf(t);
                let index = ((freq / bin_hz).round() as usize).min(half - 1);
                (index, freq)
            })
            .collect();

        let spectrum = points.iter().map(|&(_, f)| (f.log10(), FLOOR_DB)).collect();

        Self {
            window,
            points,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); buffer_len],
            norm: (window_sum / 2.0).max(1e-9),
            spectrum,
        }
    }

    /// Ignores buffers whose length differs from the FFT size.
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for ((bin, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *bin = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for ((_, db), &(index, _)) in self.spectrum.iter_mut().zip(&self.points) {
            let magnitude = self.scratch[index].norm() as f64 / self.norm;
            let level = (20.0 * magnitude.max(1e-12).log10()).max(FLOOR_DB);
            *db = level.max(*db - FALL_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.spectrum
    }
}

/// Render the spectrum analyzer widget
pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &[(f64, f64)]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(spectrum);

    let (lo, hi) = spectrum
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &(x, _)| (lo.min(x), hi.max(x)));
    let (lo, hi) = if lo < hi { (lo, hi) } else { (1.0, 4.3) };

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([lo, hi])
                .labels(vec![
                    format!("{:.0}", 10f64.powf(lo)),
                    "1k".to_string(),
                    format!("{:.0}k", 10f64.powf(hi) / 1000.0),
                ])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(vec!["-96", "-48", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
