use egui::Color32;

use crate::error::ConfigError;

/// Environment variable (runtime on native, compile time everywhere) naming
/// the remote API base URL.
pub const API_URL_ENV: &str = "MOOD_STUDIO_API_URL";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: Option<String>,
}

impl ApiConfig {
    pub fn new(base_url: Option<&str>) -> Self {
        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .map(str::to_owned);
        Self { base_url }
    }

    pub fn compiled() -> Self {
        Self::new(option_env!("MOOD_STUDIO_API_URL"))
    }

    /// Runtime environment first, then the compiled-in value.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(Some(&url)),
            _ => Self::compiled(),
        }
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    pub fn endpoint(&self, path: &str) -> Result<String, ConfigError> {
        let base = self.base_url.as_deref().ok_or(ConfigError::MissingApiUrl)?;
        Ok(format!("{base}{path}"))
    }
}

#[derive(Clone, Debug)]
pub struct WaveformConfig {
    /// Analysis window; the time-domain buffer holds `fft_size / 2` samples.
    pub fft_size: usize,
    pub width: f32,
    pub height: f32,
    pub line_width: f32,
    pub stroke_color: Color32,
    pub background_color: Color32,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            width: 600.0,
            height: 200.0,
            line_width: 2.0,
            stroke_color: Color32::from_rgb(0x6C, 0x63, 0xFF),
            background_color: Color32::BLACK,
        }
    }
}

impl WaveformConfig {
    pub fn buffer_len(&self) -> usize {
        (self.fft_size / 2).max(1)
    }
}
