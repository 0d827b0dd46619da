use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{AnalyserNode, AudioContext, Blob, BlobPropertyBag, HtmlAnchorElement, HtmlAudioElement, MediaElementAudioSourceNode, Url};

use super::js_error_text;
use crate::error::PlaybackError;
use crate::model::AudioClip;
use crate::waveform::{AudioDevice, Pipeline};

#[derive(Clone, Copy, Debug, Default)]
pub struct WebAudioDevice;

struct WebPipeline {
    audio: HtmlAudioElement,
    context: AudioContext,
    analyser: AnalyserNode,
    _source: MediaElementAudioSourceNode,
    url: String,
}

fn pipeline_error(value: JsValue) -> PlaybackError {
    PlaybackError::Pipeline(js_error_text(&value))
}

fn object_url(clip: &AudioClip) -> Result<String, JsValue> {
    let bytes = js_sys::Uint8Array::from(clip.bytes());
    let parts = js_sys::Array::of1(&bytes);
    let props = BlobPropertyBag::new();
    props.set_type(clip.media_type());
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &props)?;
    Url::create_object_url_with_blob(&blob)
}

// Long enough for the browser to start reading the blob.
const REVOKE_DELAY_MS: i32 = 30_000;

fn revoke_later(url: String) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let revoke = Closure::once_into_js(move || {
        let _ = Url::revoke_object_url(&url);
    });
    if let Err(e) =
        window.set_timeout_with_callback_and_timeout_and_arguments_0(revoke.unchecked_ref(), REVOKE_DELAY_MS)
    {
        log::debug!("Could not schedule URL revoke: {}", js_error_text(&e));
    }
}

/// Awaits a media promise; a rejection (autoplay policy) is only logged.
fn settle(what: &'static str, promise: Result<js_sys::Promise, JsValue>) {
    match promise {
        Ok(promise) => spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                log::debug!("{what} refused: {}", js_error_text(&e));
            }
        }),
        Err(e) => log::debug!("{what} refused: {}", js_error_text(&e)),
    }
}

impl WebPipeline {
    fn build(clip: &AudioClip, fft_size: usize) -> Result<Self, JsValue> {
        let url = object_url(clip)?;
        let audio = HtmlAudioElement::new_with_src(&url)?;
        let context = AudioContext::new()?;
        let analyser = context.create_analyser()?;
        analyser.set_fft_size(u32::try_from(fft_size).unwrap_or(2048));
        let source = context.create_media_element_source(&audio)?;
        source.connect_with_audio_node(&analyser)?;
        analyser.connect_with_audio_node(&context.destination())?;
        Ok(Self {
            audio,
            context,
            analyser,
            _source: source,
            url,
        })
    }

    fn play(&self) {
        settle("Audio context resume", self.context.resume());
        settle("Autoplay", self.audio.play());
    }
}

impl Pipeline for WebPipeline {
    fn sample_time_domain(&mut self, buf: &mut [u8]) {
        self.analyser.get_byte_time_domain_data(buf);
    }

    fn is_playing(&self) -> bool {
        !self.audio.paused()
    }

    fn set_playing(&mut self, playing: bool) {
        if playing {
            self.play();
        } else if let Err(e) = self.audio.pause() {
            log::debug!("Pause failed: {}", js_error_text(&e));
        }
    }
}

impl Drop for WebPipeline {
    fn drop(&mut self) {
        let _ = self.audio.pause();
        self.audio.set_src("");
        settle("Audio context close", self.context.close());
        let _ = Url::revoke_object_url(&self.url);
        log::debug!("Released web audio pipeline");
    }
}

impl AudioDevice for WebAudioDevice {
    fn open(&self, clip: &AudioClip, fft_size: usize) -> Result<Box<dyn Pipeline>, PlaybackError> {
        let pipeline = WebPipeline::build(clip, fft_size).map_err(pipeline_error)?;
        pipeline.play();
        Ok(Box::new(pipeline))
    }

    fn export(&self, clip: &AudioClip, file_name: &str) -> Result<(), PlaybackError> {
        let export_error = |e: JsValue| PlaybackError::Export(js_error_text(&e));
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| PlaybackError::Export("no document".into()))?;
        // Detached anchors are ignored by some browsers.
        let body = document
            .body()
            .ok_or_else(|| PlaybackError::Export("no document body".into()))?;
        let anchor: HtmlAnchorElement = document
            .create_element("a")
            .map_err(export_error)?
            .dyn_into()
            .map_err(|_| PlaybackError::Export("anchor element unavailable".into()))?;
        let url = object_url(clip).map_err(export_error)?;
        anchor.set_href(&url);
        anchor.set_download(file_name);
        if let Err(e) = body.append_child(&anchor) {
            let _ = Url::revoke_object_url(&url);
            return Err(export_error(e));
        }
        anchor.click();
        anchor.remove();
        revoke_later(url);
        Ok(())
    }
}
