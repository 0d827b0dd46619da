use std::rc::Rc;

use chrono::Utc;

use crate::api::ApiClient;
use crate::error::StudioError;
use crate::model::{GenerationRequest, GenerationResult};
use crate::state::AppState;
use crate::task::Spawner;
use crate::transport::Transport;

const GUEST: &str = "guest";

pub struct Studio<T> {
    client: Rc<ApiClient<T>>,
    state: AppState,
    spawner: Spawner,
}

impl<T> Clone for Studio<T> {
    fn clone(&self) -> Self {
        Self {
            client: Rc::clone(&self.client),
            state: self.state.clone(),
            spawner: self.spawner.clone(),
        }
    }
}

impl<T: Transport + 'static> Studio<T> {
    pub fn new(client: Rc<ApiClient<T>>, state: AppState, spawner: Spawner) -> Self {
        Self {
            client,
            state,
            spawner,
        }
    }

    /// The server-side history copy runs in the background and may fail
    /// without affecting the returned result.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult, StudioError> {
        let clip = self.client.generate(&request).await?;
        let result = GenerationResult::new(request, clip, Utc::now());
        log::info!(
            "Generated {}s of {} music ({} bytes, {})",
            result.request.duration_secs,
            result.request.mood,
            result.audio.as_ref().map_or(0, |a| a.bytes().len()),
            result.audio.as_ref().map_or("", |a| a.media_type()),
        );
        self.state.record_generation(result.clone());
        self.mirror(result.clone());
        Ok(result)
    }

    fn mirror(&self, result: GenerationResult) {
        let client = Rc::clone(&self.client);
        let username = self.state.username().unwrap_or_else(|| GUEST.to_owned());
        self.spawner.spawn(async move {
            if let Err(e) = client.save_history(&username, &result).await {
                log::warn!("Failed to mirror generation to remote history: {e}");
            }
        });
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::error::TransportError;
    use crate::model::{Mood, UserSession};
    use crate::storage::Storage;
    use crate::task::TaskRunner;
    use crate::transport::stub::{audio_reply, json_reply, StubTransport};
    use crate::transport::Method;
    use serde_json::json;

    struct Fixture {
        runner: TaskRunner,
        stub: StubTransport,
        state: AppState,
        studio: Studio<StubTransport>,
    }

    fn fixture() -> Fixture {
        let runner = TaskRunner::new();
        let stub = StubTransport::default();
        let state = AppState::load(Storage::in_memory());
        let client = Rc::new(ApiClient::new(ApiConfig::new(Some("http://api.test")), stub.clone()));
        let studio = Studio::new(client, state.clone(), runner.spawner());
        Fixture {
            runner,
            stub,
            state,
            studio,
        }
    }

    fn rain() -> GenerationRequest {
        GenerationRequest {
            prompt: "rain".into(),
            duration_secs: 20,
            mood: Mood::Calm,
            tempo_bpm: 90,
            instruments: "Piano".into(),
        }
    }

    #[test]
    fn rain_example_lands_at_history_head() {
        let mut f = fixture();
        f.stub.on(Method::Post, "/studio-generate", audio_reply("audio/mpeg", b"\xff\xfb"));
        f.stub.on(Method::Post, "/save-history", json_reply(201, &json!({})));

        let result = f.runner.block_on(f.studio.generate(rain())).unwrap();
        assert_eq!(result.request, rain());
        assert_eq!(result.audio.as_ref().unwrap().media_type(), "audio/mpeg");
        assert_eq!(f.state.history()[0], result);
    }

    #[test]
    fn newest_generation_is_prepended() {
        let mut f = fixture();
        f.stub.on(Method::Post, "/studio-generate", audio_reply("audio/mpeg", b"a"));
        f.stub.on(Method::Post, "/save-history", json_reply(201, &json!({})));

        let first = f.runner.block_on(f.studio.generate(rain())).unwrap();
        let mut second_req = rain();
        second_req.prompt = "storm".into();
        let second = f.runner.block_on(f.studio.generate(second_req)).unwrap();

        let history = f.state.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], second);
        assert_eq!(history[1], first);
        assert!(history[0].created_at >= history[1].created_at);
    }

    #[test]
    fn non_audio_reply_records_nothing() {
        let mut f = fixture();
        f.stub.on(Method::Post, "/studio-generate", json_reply(200, &json!({ "ok": true })));

        let err = f.runner.block_on(f.studio.generate(rain())).unwrap_err();
        assert!(matches!(err, StudioError::NotAudio { .. }));
        assert!(f.state.history().is_empty());
        assert!(f.stub.calls_to("/save-history").is_empty());
    }

    #[test]
    fn mirror_is_sent_as_guest_without_session() {
        let mut f = fixture();
        f.stub.on(Method::Post, "/studio-generate", audio_reply("audio/wav", b"RIFF"));
        f.stub.on(Method::Post, "/save-history", json_reply(201, &json!({})));

        f.runner.block_on(f.studio.generate(rain())).unwrap();
        f.runner.run_until_stalled();

        let mirrored = f.stub.calls_to("/save-history");
        assert_eq!(mirrored.len(), 1);
        let body: serde_json::Value = serde_json::from_str(mirrored[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["username"], "guest");
        assert_eq!(body["mood"], "Calm");
    }

    #[test]
    fn mirror_uses_signed_in_username() {
        let mut f = fixture();
        f.state.set_session(UserSession {
            id: None,
            full_name: "Ada".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            favorite_mood: Mood::Happy,
            joined_at: None,
        });
        f.stub.on(Method::Post, "/studio-generate", audio_reply("audio/mpeg", b"a"));
        f.stub.on(Method::Post, "/save-history", json_reply(201, &json!({})));

        f.runner.block_on(f.studio.generate(rain())).unwrap();
        f.runner.run_until_stalled();

        let body: serde_json::Value =
            serde_json::from_str(f.stub.calls_to("/save-history")[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["username"], "ada");
    }

    #[test]
    fn mirror_failure_does_not_fail_generation() {
        let mut f = fixture();
        f.stub.on(Method::Post, "/studio-generate", audio_reply("audio/mpeg", b"a"));
        f.stub.on(
            Method::Post,
            "/save-history",
            Err(TransportError("history store down".into())),
        );

        let result = f.runner.block_on(f.studio.generate(rain()));
        f.runner.run_until_stalled();
        assert!(result.is_ok());
        assert_eq!(f.state.history_len(), 1);
        assert!(!f.runner.has_pending());
    }

    #[test]
    fn missing_configuration_stops_before_any_call() {
        let runner = TaskRunner::new();
        let stub = StubTransport::default();
        let state = AppState::load(Storage::in_memory());
        let client = Rc::new(ApiClient::new(ApiConfig::new(None), stub.clone()));
        let studio = Studio::new(client, state.clone(), runner.spawner());

        let err = futures::executor::block_on(studio.generate(rain())).unwrap_err();
        assert!(matches!(err, StudioError::Config(_)));
        assert!(stub.calls().is_empty());
        assert!(state.history().is_empty());
    }
}
