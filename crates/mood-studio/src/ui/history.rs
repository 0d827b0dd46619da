use eframe::egui::{self, Color32, RichText};

use crate::config::WaveformConfig;
use crate::error::PlaybackError;
use crate::model::GenerationResult;
use crate::state::AppState;
use crate::waveform::AudioDevice;

use super::player::{export_name, Player};
use super::error_label;

pub const EMPTY_TEXT: &str = "No generated tracks yet.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryAction {
    Play(usize),
    Export(usize),
    Clear,
}

/// Renders `entries` newest first. `clearable` adds the "Clear History"
/// button.
pub fn list(ui: &mut egui::Ui, entries: &[GenerationResult], clearable: bool) -> Option<HistoryAction> {
    let mut action = None;
    if clearable && ui.button(RichText::new("Clear History").color(Color32::WHITE)).clicked() {
        action = Some(HistoryAction::Clear);
    }
    if entries.is_empty() {
        ui.label(EMPTY_TEXT);
        return action;
    }

    egui::ScrollArea::vertical()
        .id_salt("history_entries")
        .max_height(384.0)
        .show(ui, |ui| {
            for (index, entry) in entries.iter().enumerate() {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(RichText::new(format!("Prompt: {}", entry.request.prompt)).strong());
                    ui.horizontal_wrapped(|ui| {
                        for (label, value) in entry.request.parameter_rows() {
                            ui.label(format!("{label}: {value}"));
                        }
                    });
                    ui.horizontal(|ui| {
                        if entry.audio.is_some() {
                            if ui.button("▶ Play").clicked() {
                                action = Some(HistoryAction::Play(index));
                            }
                            if ui.button("⬇ Export").clicked() {
                                action = Some(HistoryAction::Export(index));
                            }
                        } else {
                            ui.weak("audio unavailable");
                        }
                        ui.weak(entry.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
                    });
                });
            }
        });
    action
}

/// Carries out a list action against `player`. Returns the entry that
/// started playing, if any.
pub fn dispatch(
    action: HistoryAction,
    state: &AppState,
    device: &dyn AudioDevice,
    config: &WaveformConfig,
    player: &mut Option<Player>,
) -> Result<Option<GenerationResult>, PlaybackError> {
    let history = state.history();
    match action {
        HistoryAction::Play(index) => {
            let Some(entry) = history.get(index) else {
                return Ok(None);
            };
            // Drop the old pipeline before opening a new one.
            *player = None;
            *player = Player::open(device, entry, config);
            Ok(Some(entry.clone()))
        }
        HistoryAction::Export(index) => {
            let Some(entry) = history.get(index) else {
                return Ok(None);
            };
            if let Some(clip) = &entry.audio {
                device.export(clip, &export_name(entry))?;
            }
            Ok(None)
        }
        HistoryAction::Clear => {
            state.clear_history();
            Ok(None)
        }
    }
}

#[derive(Default)]
pub struct HistoryView {
    player: Option<Player>,
    error: Option<String>,
}

impl HistoryView {
    pub fn leave(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.pause();
        }
    }

    pub fn apply(
        &mut self,
        action: HistoryAction,
        state: &AppState,
        device: &dyn AudioDevice,
        config: &WaveformConfig,
    ) {
        self.error = dispatch(action, state, device, config, &mut self.player)
            .err()
            .map(|e| e.to_string());
    }

    pub fn show(&mut self, ui: &mut egui::Ui, state: &AppState, device: &dyn AudioDevice, config: &WaveformConfig) {
        ui.heading("History");
        if let Some(player) = self.player.as_mut() {
            player.show(ui, device);
            ui.separator();
        }
        error_label(ui, self.error.as_deref());
        if let Some(action) = list(ui, &state.history(), false) {
            self.apply(action, state, device, config);
        }
    }
}
