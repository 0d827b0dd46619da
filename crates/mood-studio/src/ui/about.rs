use eframe::egui::{self, RichText};

const STEPS: [&str; 3] = ["You share a mood", "The model reads it", "Music is generated"];

const FEATURES: [(&str, &str); 4] = [
    ("Mood-based generation", "Music adapts to how you feel."),
    ("Manual controls", "Tune tempo, length and the lead instrument."),
    ("Personal history", "Replay and export what you made."),
    ("Live waveform", "Watch the signal while it plays."),
];

pub fn show(ui: &mut egui::Ui) {
    ui.heading(RichText::new("About Mood Music AI").size(28.0));
    ui.label(
        "An AI music generator that turns a mood and a short prompt into an original clip. \
         Happy, calm, energetic or mysterious, the studio composes to match.",
    );

    ui.add_space(16.0);
    ui.heading("How it works");
    ui.horizontal(|ui| {
        for (i, step) in STEPS.iter().enumerate() {
            if i > 0 {
                ui.label("→");
            }
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.label(*step);
            });
        }
    });

    ui.add_space(16.0);
    ui.heading("Key features");
    egui::Grid::new("about_features").num_columns(2).spacing([24.0, 8.0]).show(ui, |ui| {
        for (title, description) in FEATURES {
            ui.strong(title);
            ui.label(description);
            ui.end_row();
        }
    });
}
