use challenge_core::{FetchError, RegistryError};
use thiserror::Error;
use wasm_bindgen::JsValue;

/// Reasons a widget never comes up. Each is logged once and the page is left
/// without a live session.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("missing query parameter `{0}`")]
    MissingParam(&'static str),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("dom: {0}")]
    Dom(String),
}

impl From<JsValue> for ClientError {
    fn from(v: JsValue) -> Self {
        ClientError::Dom(js_message(&v))
    }
}

/// Best-effort text of a thrown JS value.
pub fn js_message(v: &JsValue) -> String {
    v.as_string().unwrap_or_else(|| format!("{:?}", v))
}
