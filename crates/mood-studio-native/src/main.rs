mod audio;
mod http;
mod store;

use eframe::NativeOptions;
use mood_studio::{ApiConfig, Backends, MoodStudioApp, Storage};

use crate::audio::NativeAudioDevice;
use crate::http::UreqTransport;
use crate::store::FileStore;

fn open_storage() -> Storage {
    let Some(path) = FileStore::default_path() else {
        log::warn!("No user data directory; history will not persist");
        return Storage::in_memory();
    };
    match FileStore::open(&path) {
        Ok(store) => {
            log::info!("Using store at {}", store.path().display());
            Storage::new(store)
        }
        Err(e) => {
            log::warn!("Cannot open {}: {e}; history will not persist", path.display());
            Storage::in_memory()
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let api = ApiConfig::from_env();
    match api.base_url() {
        Some(url) => log::info!("API base URL: {url}"),
        None => log::warn!("{} is not set", mood_studio::config::API_URL_ENV),
    }

    let backends = Backends {
        api,
        transport: UreqTransport::new(),
        storage: open_storage(),
        audio: Box::new(NativeAudioDevice),
    };
    let native_options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Mood Studio")
            .with_inner_size([1000.0, 760.0]),
        ..NativeOptions::default()
    };
    if let Err(e) = eframe::run_native(
        "Mood Studio",
        native_options,
        Box::new(|_cc| Ok(Box::new(MoodStudioApp::new(backends)))),
    ) {
        log::error!("Failed to start native app: {e}");
        std::process::exit(1);
    }
}
