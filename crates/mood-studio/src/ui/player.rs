use eframe::egui;

use crate::config::WaveformConfig;
use crate::model::{AudioClip, GenerationResult};
use crate::waveform::{AudioDevice, WaveformVisualizer};

use super::error_label;

/// Download name for a result, e.g. `calm-20240501-101500.mp3`.
pub fn export_name(result: &GenerationResult) -> String {
    let ext = result.audio.as_ref().map_or("mp3", AudioClip::file_extension);
    format!(
        "{}-{}.{ext}",
        result.request.mood.to_string().to_lowercase(),
        result.created_at.format("%Y%m%d-%H%M%S"),
    )
}

pub struct Player {
    clip: AudioClip,
    file_name: String,
    visualizer: Option<WaveformVisualizer>,
    error: Option<String>,
}

impl Player {
    /// `None` when the result has no audio (restored from storage).
    pub fn open(device: &dyn AudioDevice, result: &GenerationResult, config: &WaveformConfig) -> Option<Self> {
        let clip = result.audio.clone()?;
        let (visualizer, error) = match WaveformVisualizer::attach(device, &clip, config.clone()) {
            Ok(viz) => (Some(viz), None),
            Err(e) => {
                log::warn!("{e}");
                (None, Some(e.to_string()))
            }
        };
        Some(Self {
            clip,
            file_name: export_name(result),
            visualizer,
            error,
        })
    }

    pub fn clip(&self) -> &AudioClip {
        &self.clip
    }

    pub fn is_playing(&self) -> bool {
        self.visualizer.as_ref().is_some_and(WaveformVisualizer::is_playing)
    }

    pub fn pause(&mut self) {
        if let Some(viz) = self.visualizer.as_mut() {
            viz.set_playing(false);
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, device: &dyn AudioDevice) {
        ui.horizontal(|ui| {
            if let Some(viz) = self.visualizer.as_mut() {
                let playing = viz.is_playing();
                if ui.button(if playing { "⏸ Pause" } else { "▶ Play" }).clicked() {
                    viz.set_playing(!playing);
                }
            }
            if ui.button(format!("⬇ Download {}", self.clip.file_extension().to_uppercase())).clicked() {
                if let Err(e) = device.export(&self.clip, &self.file_name) {
                    log::warn!("{e}");
                    self.error = Some(e.to_string());
                }
            }
        });
        if let Some(viz) = self.visualizer.as_mut() {
            viz.draw(ui);
        }
        error_label(ui, self.error.as_deref());
    }
}
