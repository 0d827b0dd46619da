mod audio;
mod fetch;
mod store;

pub use audio::WebAudioDevice;
pub use fetch::FetchTransport;
pub use store::LocalStore;

use wasm_bindgen::{JsCast, JsValue};

/// Best readable text for a thrown JS value.
pub(crate) fn js_error_text(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
