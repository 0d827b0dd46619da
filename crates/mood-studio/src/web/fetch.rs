use std::future::Future;

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use super::js_error_text;
use crate::error::TransportError;
use crate::transport::{ApiRequest, ApiResponse, Transport};

#[derive(Clone, Copy, Debug, Default)]
pub struct FetchTransport;

impl Transport for FetchTransport {
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<ApiResponse, TransportError>> {
        fetch(request)
    }
}

fn fault(value: JsValue) -> TransportError {
    TransportError(js_error_text(&value))
}

async fn fetch(request: ApiRequest) -> Result<ApiResponse, TransportError> {
    let window = web_sys::window().ok_or_else(|| TransportError("no window".into()))?;

    let init = RequestInit::new();
    init.set_method(request.method.as_str());
    if let Some(body) = &request.body {
        init.set_body(&JsValue::from_str(body));
    }
    let req = Request::new_with_str_and_init(&request.url, &init).map_err(fault)?;
    if request.body.is_some() {
        req.headers()
            .set("Content-Type", "application/json")
            .map_err(fault)?;
    }

    let reply = JsFuture::from(window.fetch_with_request(&req))
        .await
        .map_err(fault)?;
    let response: Response = reply.dyn_into().map_err(fault)?;
    let content_type = response.headers().get("content-type").map_err(fault)?;
    let buffer = JsFuture::from(response.array_buffer().map_err(fault)?)
        .await
        .map_err(fault)?;

    Ok(ApiResponse {
        status: response.status(),
        content_type,
        body: js_sys::Uint8Array::new(&buffer).to_vec(),
    })
}
