pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod state;
pub mod storage;
pub mod studio;
pub mod task;
pub mod transport;
pub mod ui;
pub mod waveform;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::{Backends, MoodStudioApp, Page};
pub use config::{ApiConfig, WaveformConfig};
pub use error::{AuthError, ConfigError, PlaybackError, StorageError, StudioError, TransportError};
pub use model::{AudioClip, GenerationRequest, GenerationResult, Mood, UserSession};
pub use state::{AppState, StateEvent};
pub use storage::{KeyValueStore, MemoryStore, Storage};
pub use transport::{ApiRequest, ApiResponse, Method, Transport};
pub use waveform::{AudioDevice, Pipeline};

#[cfg(target_arch = "wasm32")]
const CANVAS_ID: &str = "mood_studio_canvas";

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// The canvas `data-api-url` attribute overrides the compiled-in API URL.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    use wasm_bindgen::JsCast;

    console_error_panic_hook::set_once();
    eframe::WebLogger::init(log::LevelFilter::Info).ok();

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| JsValue::from_str(&format!("no canvas element with id '{CANVAS_ID}'")))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str(&format!("element with id '{CANVAS_ID}' is not a canvas")))?;

    let api = match canvas.get_attribute("data-api-url") {
        Some(url) if !url.trim().is_empty() => ApiConfig::new(Some(&url)),
        _ => ApiConfig::compiled(),
    };
    let storage = match web::LocalStore::open() {
        Some(store) => Storage::new(store),
        None => {
            log::warn!("localStorage unavailable; nothing will persist across reloads");
            Storage::in_memory()
        }
    };
    let backends = Backends {
        api,
        transport: web::FetchTransport,
        storage,
        audio: Box::new(web::WebAudioDevice),
    };

    wasm_bindgen_futures::spawn_local(async move {
        let started = eframe::WebRunner::new()
            .start(
                canvas,
                eframe::WebOptions::default(),
                Box::new(|_cc| Ok(Box::new(MoodStudioApp::new(backends)))),
            )
            .await;
        if let Err(e) = started {
            log::error!("Failed to start eframe: {}", web::js_error_text(&e));
        }
    });

    Ok(())
}
