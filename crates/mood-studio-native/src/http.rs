use std::future::Future;
use std::thread;

use futures::channel::oneshot;
use mood_studio::{ApiRequest, ApiResponse, Method, Transport, TransportError};
use ureq::Agent;

/// Generated WAV clips run to roughly 10 MiB a minute.
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        // Status codes are data here; the API client decides what a 4xx means.
        let config = Agent::config_builder().http_status_as_error(false).build();
        Self {
            agent: Agent::new_with_config(config),
        }
    }
}

fn fault(e: impl std::fmt::Display) -> TransportError {
    TransportError(e.to_string())
}

fn exchange(agent: &Agent, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
    let url = request.url.as_str();
    let response = match (request.method, request.body.as_deref()) {
        (Method::Post, Some(body)) => agent
            .post(url)
            .header("Content-Type", "application/json")
            .send(body),
        (Method::Post, None) => agent.post(url).send_empty(),
    }
    .map_err(fault)?;

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let mut body = response.into_body();
    let body = body
        .with_config()
        .limit(MAX_BODY_BYTES)
        .read_to_vec()
        .map_err(fault)?;

    log::debug!("{} {url} -> {status}", request.method.as_str());
    Ok(ApiResponse {
        status,
        content_type,
        body,
    })
}

impl Transport for UreqTransport {
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<ApiResponse, TransportError>> {
        let (tx, rx) = oneshot::channel();
        let agent = self.agent.clone();
        let worker = thread::Builder::new()
            .name("mood-studio-http".into())
            .spawn(move || {
                let _ = tx.send(exchange(&agent, &request));
            });
        async move {
            worker.map_err(fault)?;
            rx.await
                .map_err(|_| TransportError("request worker stopped".into()))?
        }
    }
}
