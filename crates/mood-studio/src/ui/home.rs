use eframe::egui::{self, Color32, RichText, Vec2};
use strum::IntoEnumIterator;

use crate::app::Page;
use crate::model::Mood;
use crate::state::AppState;

const CARD_SIZE: Vec2 = Vec2::new(180.0, 110.0);

fn card_color(mood: Mood) -> Color32 {
    match mood {
        Mood::Happy => Color32::from_rgb(0xF5, 0xB7, 0x01),
        Mood::Sad => Color32::from_rgb(0x3A, 0x5F, 0xCD),
        Mood::Calm => Color32::from_rgb(0x19, 0xA8, 0x8E),
        Mood::Energetic => Color32::from_rgb(0xE8, 0x4A, 0x27),
        Mood::Romantic => Color32::from_rgb(0xD6, 0x3A, 0x8C),
        Mood::Mysterious => Color32::from_rgb(0x6C, 0x63, 0xFF),
    }
}

fn blurb(mood: Mood) -> &'static str {
    match mood {
        Mood::Happy => "Bright, upbeat melodies",
        Mood::Sad => "Slow, reflective tones",
        Mood::Calm => "Soft textures to unwind",
        Mood::Energetic => "Driving rhythms",
        Mood::Romantic => "Warm, tender harmonies",
        Mood::Mysterious => "Dark, curious atmospheres",
    }
}

/// Landing page. Picking a mood hands it to the studio and opens it.
pub fn show(ui: &mut egui::Ui, state: &AppState) -> Option<Page> {
    let mut go = None;
    ui.add_space(12.0);
    ui.heading(RichText::new("Mood Music AI").size(36.0).strong());
    ui.label("Tell us how you feel and we compose music to match. Adjust tempo, instruments and length in the studio.");
    ui.add_space(8.0);
    if ui.button("Try Now").clicked() {
        go = Some(Page::Studio);
    }

    ui.add_space(24.0);
    ui.heading("Choose your mood");
    ui.horizontal_wrapped(|ui| {
        for mood in Mood::iter() {
            let text = RichText::new(format!("{mood}\n{}", blurb(mood))).color(Color32::WHITE);
            let card = egui::Button::new(text).fill(card_color(mood)).min_size(CARD_SIZE);
            if ui.add(card).clicked() {
                state.select_mood(mood);
                go = Some(Page::Studio);
            }
        }
    });
    go
}
