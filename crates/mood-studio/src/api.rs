use chrono::SecondsFormat;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ApiConfig;
use crate::error::{AuthError, StudioError};
use crate::model::{AudioClip, GenerationRequest, GenerationResult, SignUpForm, UserSession};
use crate::transport::{ApiRequest, Transport};

pub struct ApiClient<T> {
    config: ApiConfig,
    transport: T,
}

#[derive(Deserialize)]
struct SignInReply {
    user: UserSession,
}

fn generation_body(request: &GenerationRequest) -> Value {
    json!({
        "prompt": request.prompt,
        "duration": request.duration_secs,
        "mood": request.mood.to_string(),
        "tempo": request.tempo_bpm,
        "instruments": request.instruments,
    })
}

impl<T: Transport> ApiClient<T> {
    pub fn new(config: ApiConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Requests one piece of music. The reply must be 2xx with an `audio/*`
    /// content type.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<AudioClip, StudioError> {
        let url = self.config.endpoint("/studio-generate")?;
        request.validate()?;
        let body = generation_body(request);
        let response = self.transport.send(ApiRequest::post_json(url, &body)).await?;
        if !response.is_success() {
            return Err(StudioError::Status(response.status));
        }
        match response.content_type {
            Some(content_type) if AudioClip::is_audio(&content_type) => {
                Ok(AudioClip::new(content_type, response.body))
            }
            content_type => Err(StudioError::NotAudio { content_type }),
        }
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<UserSession, AuthError> {
        let url = self.config.endpoint("/signin")?;
        let body = json!({ "username": username, "password": password });
        let response = self.transport.send(ApiRequest::post_json(url, &body)).await?;
        if !response.is_success() {
            return Err(AuthError::Rejected(
                response
                    .error_message()
                    .unwrap_or_else(|| "Invalid username or password.".to_owned()),
            ));
        }
        response
            .json::<SignInReply>()
            .map(|reply| reply.user)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }

    pub async fn sign_up(&self, form: &SignUpForm) -> Result<(), AuthError> {
        let url = self.config.endpoint("/signup")?;
        let body = json!({
            "fullName": form.full_name,
            "username": form.username,
            "email": form.email,
            "password": form.password,
        });
        let response = self.transport.send(ApiRequest::post_json(url, &body)).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(AuthError::Rejected(
                response
                    .error_message()
                    .unwrap_or_else(|| "Signup failed".to_owned()),
            ))
        }
    }

    /// Mirrors a generation to the account history on the server.
    pub async fn save_history(&self, username: &str, result: &GenerationResult) -> Result<(), StudioError> {
        let url = self.config.endpoint("/save-history")?;
        let mut body = generation_body(&result.request);
        body["timestamp"] = json!(result.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true));
        body["username"] = json!(username);
        let response = self.transport.send(ApiRequest::post_json(url, &body)).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(StudioError::Status(response.status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, TransportError};
    use crate::model::Mood;
    use crate::transport::stub::{audio_reply, json_reply, StubTransport};
    use crate::transport::{ApiResponse, Method};
    use futures::executor::block_on;

    const BASE: &str = "http://api.test";

    fn client(stub: &StubTransport) -> ApiClient<StubTransport> {
        ApiClient::new(ApiConfig::new(Some(BASE)), stub.clone())
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
    fn generate_posts_request_and_returns_clip() {
        let stub = StubTransport::default();
        stub.on(Method::Post, "/studio-generate", audio_reply("audio/mpeg", b"ID3"));

        let clip = block_on(client(&stub).generate(&rain())).unwrap();
        assert_eq!(clip.media_type(), "audio/mpeg");
        assert_eq!(clip.bytes(), b"ID3");

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "http://api.test/studio-generate");
        let sent: serde_json::Value = serde_json::from_str(calls[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(
            sent,
            json!({ "prompt": "rain", "duration": 20, "mood": "Calm", "tempo": 90, "instruments": "Piano" })
        );
    }

    #[test]
    fn generate_rejects_non_audio_payload() {
        let stub = StubTransport::default();
        stub.on(
            Method::Post,
            "/studio-generate",
            json_reply(200, &json!({ "message": "queued" })),
        );
        let err = block_on(client(&stub).generate(&rain())).unwrap_err();
        assert!(matches!(err, StudioError::NotAudio { content_type: Some(ref t) } if t == "application/json"));
    }

    #[test]
    fn generate_rejects_missing_content_type() {
        let stub = StubTransport::default();
        stub.on(
            Method::Post,
            "/studio-generate",
            Ok(ApiResponse {
                status: 200,
                content_type: None,
                body: vec![1, 2, 3],
            }),
        );
        let err = block_on(client(&stub).generate(&rain())).unwrap_err();
        assert_eq!(err, StudioError::NotAudio { content_type: None });
    }

    #[test]
    fn generate_surfaces_status_and_transport_faults() {
        let stub = StubTransport::default();
        stub.on(Method::Post, "/studio-generate", json_reply(500, &json!({})));
        assert_eq!(
            block_on(client(&stub).generate(&rain())),
            Err(StudioError::Status(500))
        );

        let offline = StubTransport::default();
        offline.on(
            Method::Post,
            "/studio-generate",
            Err(TransportError("connection refused".into())),
        );
        let err = block_on(client(&offline).generate(&rain())).unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch: connection refused");
    }

    #[test]
    fn unconfigured_client_makes_no_call() {
        let stub = StubTransport::default();
        let client = ApiClient::new(ApiConfig::new(None), stub.clone());
        assert_eq!(
            block_on(client.generate(&rain())),
            Err(StudioError::Config(ConfigError::MissingApiUrl))
        );
        assert!(block_on(client.sign_in("a", "b")).is_err());
        assert!(stub.calls().is_empty());
    }

    #[test]
    fn out_of_range_request_makes_no_call() {
        let stub = StubTransport::default();
        let mut req = rain();
        req.tempo_bpm = 300;
        assert_eq!(
            block_on(client(&stub).generate(&req)),
            Err(StudioError::InvalidTempo(300))
        );
        assert!(stub.calls().is_empty());
    }

    #[test]
    fn sign_in_parses_user() {
        let stub = StubTransport::default();
        stub.on(
            Method::Post,
            "/signin",
            json_reply(
                200,
                &json!({ "message": "Signin successful", "user": { "id": 3, "fullName": "Ada", "username": "ada", "email": "a@x.io" } }),
            ),
        );
        let user = block_on(client(&stub).sign_in("ada", "pw")).unwrap();
        assert_eq!(user.username, "ada");
        assert_eq!(user.full_name, "Ada");
    }

    #[test]
    fn sign_in_failure_prefers_server_message() {
        let stub = StubTransport::default();
        stub.on(Method::Post, "/signin", json_reply(401, &json!({ "error": "Invalid username or password" })));
        assert_eq!(
            block_on(client(&stub).sign_in("ada", "nope")),
            Err(AuthError::Rejected("Invalid username or password".into()))
        );

        let bare = StubTransport::default();
        bare.on(Method::Post, "/signin", json_reply(500, &json!({})));
        assert_eq!(
            block_on(client(&bare).sign_in("ada", "nope")),
            Err(AuthError::Rejected("Invalid username or password.".into()))
        );
    }

    #[test]
    fn save_history_adds_username() {
        let stub = StubTransport::default();
        stub.on(Method::Post, "/save-history", json_reply(201, &json!({ "message": "Saved" })));
        let at = chrono::DateTime::parse_from_rfc3339("2024-05-01T10:15:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let result = GenerationResult::new(rain(), AudioClip::new("audio/mpeg", vec![1u8]), at);
        block_on(client(&stub).save_history("guest", &result)).unwrap();

        let sent: serde_json::Value =
            serde_json::from_str(stub.calls_to("/save-history")[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(
            sent,
            json!({
                "prompt": "rain",
                "duration": 20,
                "mood": "Calm",
                "tempo": 90,
                "instruments": "Piano",
                "timestamp": "2024-05-01T10:15:00Z",
                "username": "guest",
            })
        );
    }
}
