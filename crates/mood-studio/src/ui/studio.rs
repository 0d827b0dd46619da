use eframe::egui::{self, RichText};
use strum::IntoEnumIterator;

use crate::config::WaveformConfig;
use crate::error::StudioError;
use crate::model::{GenerationRequest, GenerationResult, Mood, DURATION_RANGE, TEMPO_RANGE};
use crate::state::AppState;
use crate::studio::Studio;
use crate::task::Spawner;
use crate::transport::Transport;
use crate::waveform::AudioDevice;

use super::history::{self, HistoryAction};
use super::player::Player;
use super::{error_label, Pending};

pub struct StudioView<T> {
    studio: Studio<T>,
    spawner: Spawner,
    form: GenerationRequest,
    pending: Pending<Result<GenerationResult, StudioError>>,
    error: Option<String>,
    current: Option<GenerationResult>,
    player: Option<Player>,
}

impl<T: Transport + 'static> StudioView<T> {
    pub fn new(studio: Studio<T>, spawner: Spawner) -> Self {
        Self {
            studio,
            spawner,
            form: GenerationRequest::default(),
            pending: Pending::default(),
            error: None,
            current: None,
            player: None,
        }
    }

    /// Picks up a mood handed over from the home page.
    pub fn enter(&mut self, state: &AppState) {
        if let Some(mood) = state.take_selected_mood() {
            self.form.mood = mood;
        }
    }

    pub fn leave(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.pause();
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_waiting()
    }

    pub fn form_mut(&mut self) -> &mut GenerationRequest {
        &mut self.form
    }

    pub fn submit(&mut self) {
        if self.is_loading() {
            return;
        }
        self.error = None;
        self.current = None;
        self.player = None;
        let studio = self.studio.clone();
        let request = self.form.clone();
        self.pending
            .start(&self.spawner, async move { studio.generate(request).await });
    }

    pub fn poll(&mut self, device: &dyn AudioDevice, config: &WaveformConfig) {
        match self.pending.take() {
            Some(Ok(result)) => self.present(result, device, config),
            Some(Err(e)) => {
                log::debug!("Generation failed: {e}");
                self.error = Some(e.to_string());
            }
            None => {}
        }
    }

    fn present(&mut self, result: GenerationResult, device: &dyn AudioDevice, config: &WaveformConfig) {
        self.player = Player::open(device, &result, config);
        self.current = Some(result);
    }

    fn apply(&mut self, action: HistoryAction, state: &AppState, device: &dyn AudioDevice, config: &WaveformConfig) {
        self.error = None;
        match history::dispatch(action, state, device, config, &mut self.player) {
            Ok(Some(entry)) => self.current = Some(entry),
            Ok(None) => {}
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, state: &AppState, device: &dyn AudioDevice, config: &WaveformConfig) {
        self.poll(device, config);

        ui.heading(RichText::new("Mood-based AI Music Studio").size(28.0));
        ui.add_space(8.0);
        self.form_ui(ui);

        let label = if self.is_loading() { "Generating..." } else { "🎶 Generate Music" };
        if ui.add_enabled(!self.is_loading(), egui::Button::new(label)).clicked() {
            self.submit();
        }
        error_label(ui, self.error.as_deref());

        if let Some(current) = &self.current {
            ui.separator();
            ui.columns(2, |columns| {
                if let Some(player) = self.player.as_mut() {
                    player.show(&mut columns[0], device);
                } else {
                    columns[0].weak("audio unavailable");
                }
                columns[1].strong("Music Parameters");
                for (label, value) in current.request.parameter_rows() {
                    columns[1].label(format!("{label}: {value}"));
                }
            });
        }

        ui.separator();
        ui.heading("History");
        if let Some(action) = history::list(ui, &state.history(), true) {
            self.apply(action, state, device, config);
        }
    }

    fn form_ui(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("studio_form").num_columns(2).spacing([16.0, 8.0]).show(ui, |ui| {
            ui.label("Prompt / Mood");
            ui.add(egui::TextEdit::multiline(&mut self.form.prompt).desired_rows(3));
            ui.end_row();

            ui.label("Duration (sec)");
            ui.add(egui::Slider::new(&mut self.form.duration_secs, DURATION_RANGE));
            ui.end_row();

            ui.label("Tempo (BPM)");
            ui.add(egui::Slider::new(&mut self.form.tempo_bpm, TEMPO_RANGE));
            ui.end_row();

            ui.label("Mood");
            egui::ComboBox::from_id_salt("studio_mood")
                .selected_text(self.form.mood.to_string())
                .show_ui(ui, |ui| {
                    for mood in Mood::iter() {
                        ui.selectable_value(&mut self.form.mood, mood, mood.to_string());
                    }
                });
            ui.end_row();

            ui.label("Main Instrument");
            ui.text_edit_singleline(&mut self.form.instruments);
            ui.end_row();
        });
    }
}
