use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::StudioError;

pub const DURATION_RANGE: RangeInclusive<u32> = 5..=60;
pub const TEMPO_RANGE: RangeInclusive<u32> = 60..=200;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
pub enum Mood {
    #[default]
    Happy,
    Sad,
    Calm,
    Energetic,
    Romantic,
    Mysterious,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(rename = "duration")]
    pub duration_secs: u32,
    pub mood: Mood,
    #[serde(rename = "tempo")]
    pub tempo_bpm: u32,
    pub instruments: String,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            duration_secs: 20,
            mood: Mood::default(),
            tempo_bpm: 120,
            instruments: "Piano".to_owned(),
        }
    }
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), StudioError> {
        if !DURATION_RANGE.contains(&self.duration_secs) {
            return Err(StudioError::InvalidDuration(self.duration_secs));
        }
        if !TEMPO_RANGE.contains(&self.tempo_bpm) {
            return Err(StudioError::InvalidTempo(self.tempo_bpm));
        }
        Ok(())
    }

    pub fn parameter_rows(&self) -> [(&'static str, String); 4] {
        [
            ("Mood", self.mood.to_string()),
            ("Duration", format!("{} sec", self.duration_secs)),
            ("Tempo", format!("{} BPM", self.tempo_bpm)),
            ("Instruments", self.instruments.clone()),
        ]
    }
}

// Clones share the same byte buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioClip {
    media_type: String,
    bytes: Arc<[u8]>,
}

impl AudioClip {
    pub fn new(media_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn is_audio(media_type: &str) -> bool {
        media_type.trim_start().to_ascii_lowercase().starts_with("audio/")
    }

    pub fn file_extension(&self) -> &'static str {
        let essence = self
            .media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            "audio/ogg" => "ogg",
            "audio/flac" | "audio/x-flac" => "flac",
            "audio/aac" => "aac",
            "audio/mp4" | "audio/x-m4a" => "m4a",
            "audio/webm" => "webm",
            _ => "mp3",
        }
    }
}

/// One successful generation. The audio lives only in memory, so entries
/// restored from storage come back with `audio == None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(flatten)]
    pub request: GenerationRequest,
    #[serde(skip)]
    pub audio: Option<AudioClip>,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl GenerationResult {
    pub fn new(request: GenerationRequest, audio: AudioClip, created_at: DateTime<Utc>) -> Self {
        Self {
            request,
            audio: Some(audio),
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub full_name: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub favorite_mood: Mood,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

impl UserSession {
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub email: String,
    pub favorite_mood: Mood,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}
