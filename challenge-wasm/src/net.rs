use challenge_core::{
    Ack, ChallengeDescriptor, FetchError, SubmissionSink, SubmitError, SubmitRequest, record_ack,
};
use log::debug;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response, Window};

use crate::error::js_message;

async fn response_text(resp: &Response) -> Result<String, JsValue> {
    let text = JsFuture::from(resp.text()?).await?;
    Ok(text.as_string().unwrap_or_default())
}

async fn send(window: &Window, request: &Request) -> Result<(u16, bool, String), JsValue> {
    let resp: Response = JsFuture::from(window.fetch_with_request(request))
        .await?
        .dyn_into()?;
    let body = response_text(&resp).await?;
    Ok((resp.status(), resp.ok(), body))
}

/// GET the challenge descriptor at `url`.
pub async fn fetch_challenge(
    window: &Window,
    url: &str,
) -> Result<ChallengeDescriptor, FetchError> {
    debug!("fetching challenge from {url}");
    let request =
        Request::new_with_str(url).map_err(|e| FetchError::Transport(js_message(&e)))?;
    let (status, ok, body) = send(window, &request)
        .await
        .map_err(|e| FetchError::Transport(js_message(&e)))?;
    ChallengeDescriptor::from_response(status, ok, &body)
}

fn json_post(url: &str, body: &str) -> Result<Request, JsValue> {
    let headers = Headers::new()?;
    headers.set("Content-Type", "application/json")?;
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(&headers);
    init.set_body(&JsValue::from_str(body));
    Request::new_with_str_and_init(url, &init)
}

/// POST `request` as JSON to `url` and decode the acknowledgement.
pub async fn post_submission(
    window: &Window,
    url: &str,
    request: &SubmitRequest,
) -> Result<Ack, SubmitError> {
    let body = serde_json::to_string(request).map_err(|e| SubmitError::Decode(e.to_string()))?;
    let req = json_post(url, &body).map_err(|e| SubmitError::Transport(js_message(&e)))?;
    let (status, ok, text) = send(window, &req)
        .await
        .map_err(|e| SubmitError::Transport(js_message(&e)))?;
    Ack::from_response(status, ok, &text)
}

/// Sends submissions over `fetch` without waiting on the result.
#[derive(Clone, Debug)]
pub struct FetchSink {
    window: Window,
    url: String,
}

impl FetchSink {
    pub fn new(window: Window, url: String) -> Self {
        FetchSink { window, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SubmissionSink for FetchSink {
    fn dispatch(&self, request: SubmitRequest) {
        let window = self.window.clone();
        let url = self.url.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = post_submission(&window, &url, &request).await;
            record_ack(&request.id, outcome);
        });
    }
}
