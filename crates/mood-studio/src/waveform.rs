use eframe::egui::{self, Pos2, Rect, Sense, Shape, Stroke, Vec2};

use crate::config::WaveformConfig;
use crate::error::PlaybackError;
use crate::model::AudioClip;

pub const SILENCE: u8 = 128;

pub trait Pipeline {
    /// Fills `buf` with the most recent time-domain samples, 128 = silence.
    fn sample_time_domain(&mut self, buf: &mut [u8]);
    fn is_playing(&self) -> bool;
    fn set_playing(&mut self, playing: bool);
}

pub trait AudioDevice {
    /// Starts playing `clip` and returns a pipeline analysing it with an
    /// `fft_size` window.
    fn open(&self, clip: &AudioClip, fft_size: usize) -> Result<Box<dyn Pipeline>, PlaybackError>;

    fn export(&self, clip: &AudioClip, file_name: &str) -> Result<(), PlaybackError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoopState {
    Running,
    TornDown,
}

/// Frame loop that can be stopped exactly once.
#[derive(Debug)]
pub struct RedrawLoop {
    state: LoopState,
    frames: u64,
}

impl Default for RedrawLoop {
    fn default() -> Self {
        Self::start()
    }
}

impl RedrawLoop {
    pub fn start() -> Self {
        Self {
            state: LoopState::Running,
            frames: 0,
        }
    }

    /// Advances one frame. Returns `false` once torn down, and stays `false`.
    pub fn tick(&mut self) -> bool {
        match self.state {
            LoopState::Running => {
                self.frames += 1;
                true
            }
            LoopState::TornDown => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tear_down(&mut self) {
        self.state = LoopState::TornDown;
    }
}

/// Polyline for `samples` across `rect`.
///
/// Sample `i` of `N` sits at `x = left + i * width / N` and
/// `y = top + (v / 128) * height / 2`; the line closes on `(right, mid_y)`.
pub fn trace(samples: &[u8], rect: Rect) -> Vec<Pos2> {
    let mid_y = rect.center().y;
    if samples.is_empty() {
        return vec![Pos2::new(rect.left(), mid_y), Pos2::new(rect.right(), mid_y)];
    }
    let slice = rect.width() / samples.len() as f32;
    let mut points: Vec<Pos2> = samples
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let x = rect.left() + i as f32 * slice;
            let y = rect.top() + (f32::from(v) / 128.0) * rect.height() / 2.0;
            Pos2::new(x, y)
        })
        .collect();
    points.push(Pos2::new(rect.right(), mid_y));
    points
}

pub struct WaveformVisualizer {
    pipeline: Option<Box<dyn Pipeline>>,
    redraw: RedrawLoop,
    buffer: Vec<u8>,
    config: WaveformConfig,
}

impl WaveformVisualizer {
    pub fn attach(
        device: &dyn AudioDevice,
        clip: &AudioClip,
        config: WaveformConfig,
    ) -> Result<Self, PlaybackError> {
        let pipeline = device.open(clip, config.fft_size)?;
        Ok(Self {
            pipeline: Some(pipeline),
            redraw: RedrawLoop::start(),
            buffer: vec![SILENCE; config.buffer_len()],
            config,
        })
    }

    pub fn is_running(&self) -> bool {
        self.redraw.is_running()
    }

    pub fn is_playing(&self) -> bool {
        self.pipeline.as_ref().is_some_and(|p| p.is_playing())
    }

    pub fn set_playing(&mut self, playing: bool) {
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline.set_playing(playing);
        }
    }

    pub fn tear_down(&mut self) {
        if self.redraw.is_running() {
            log::debug!("Tearing down waveform after {} frames", self.redraw.frames());
        }
        self.redraw.tear_down();
        self.pipeline = None;
    }

    /// Samples the pipeline and returns the polyline for `rect`, or `None`
    /// once torn down.
    pub fn next_frame(&mut self, rect: Rect) -> Option<Vec<Pos2>> {
        if !self.redraw.tick() {
            return None;
        }
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline.sample_time_domain(&mut self.buffer);
        }
        Some(trace(&self.buffer, rect))
    }

    pub fn draw(&mut self, ui: &mut egui::Ui) -> egui::Response {
        let width = ui.available_width().min(self.config.width);
        let (rect, response) = ui.allocate_exact_size(Vec2::new(width, self.config.height), Sense::hover());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, self.config.background_color);
        if let Some(points) = self.next_frame(rect) {
            painter.add(Shape::line(
                points,
                Stroke::new(self.config.line_width, self.config.stroke_color),
            ));
            ui.ctx().request_repaint();
        }
        response
    }
}

impl Drop for WaveformVisualizer {
    fn drop(&mut self) {
        self.tear_down();
    }
}
