use eframe::egui::{self, RichText};
use strum::IntoEnumIterator;

use crate::model::{Mood, ProfileUpdate, UserSession};
use crate::state::AppState;

use super::notice_label;

pub const SIGNED_OUT_TEXT: &str = "Please log in to view your profile.";

#[derive(Default)]
pub struct ProfileView {
    draft: Option<ProfileUpdate>,
    notice: Option<String>,
}

impl ProfileView {
    pub fn begin_edit(&mut self, session: &UserSession) {
        self.notice = None;
        self.draft = Some(ProfileUpdate {
            full_name: session.full_name.clone(),
            email: session.email.clone(),
            favorite_mood: session.favorite_mood,
        });
    }

    pub fn save(&mut self, state: &AppState) {
        let Some(draft) = self.draft.take() else {
            return;
        };
        if state.update_profile(draft).is_some() {
            self.notice = Some("Profile updated successfully!".to_owned());
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, state: &AppState) {
        let Some(session) = state.session() else {
            self.draft = None;
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label(SIGNED_OUT_TEXT);
            });
            return;
        };

        ui.label(RichText::new(format!("Hello, {}!", session.display_name())).size(20.0));
        ui.horizontal(|ui| {
            ui.heading("Profile");
            if ui.button("Edit Profile").clicked() {
                self.begin_edit(&session);
            }
        });
        notice_label(ui, self.notice.as_deref());

        egui::Frame::group(ui.style()).show(ui, |ui| {
            egui::Grid::new("profile_fields").num_columns(2).spacing([24.0, 6.0]).show(ui, |ui| {
                ui.strong("Full name");
                ui.label(session.full_name.as_str());
                ui.end_row();
                ui.strong("Email");
                ui.label(session.email.as_str());
                ui.end_row();
                ui.strong("Joined");
                ui.label(session.joined_at.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default());
                ui.end_row();
                ui.strong("Tracks Generated");
                ui.label(state.history_len().to_string());
                ui.end_row();
                ui.strong("Favorite Mood");
                ui.label(session.favorite_mood.to_string());
                ui.end_row();
            });
        });

        self.edit_window(ui.ctx(), state);
    }

    fn edit_window(&mut self, ctx: &egui::Context, state: &AppState) {
        let mut open = self.draft.is_some();
        let mut save = false;
        if let Some(draft) = self.draft.as_mut() {
            egui::Window::new("Edit Profile")
                .open(&mut open)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.add(egui::TextEdit::singleline(&mut draft.full_name).hint_text("Full Name"));
                    ui.add(egui::TextEdit::singleline(&mut draft.email).hint_text("Email"));
                    egui::ComboBox::from_label("Favorite Mood")
                        .selected_text(draft.favorite_mood.to_string())
                        .show_ui(ui, |ui| {
                            for mood in Mood::iter() {
                                ui.selectable_value(&mut draft.favorite_mood, mood, mood.to_string());
                            }
                        });
                    save = ui.button("Save").clicked();
                });
        }
        if save {
            self.save(state);
        } else if !open {
            self.draft = None;
        }
    }
}
