//! Browser front end for the challenge widgets. Reads the challenge id and
//! family from the page, fetches the descriptor, and wires the page's
//! `data-challenge-*` hooks to a [`challenge_core::ChallengeSession`].

mod bind;
mod canvas;
mod config;
mod constants;
mod drag;
mod error;
mod feedback;
mod net;
mod state;
mod utils;

use std::cell::RefCell;
use std::rc::Rc;

use challenge_core::registry::{self, AccumulatorRule};
use challenge_core::{ChallengeSession, SubmissionGate};
use log::{debug, error, info};
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlCanvasElement, HtmlElement, Window};

use crate::canvas::MarkerLayer;
use crate::constants::{INSTRUCTION, ROOT, SLICE, SURFACE};
use crate::net::FetchSink;
use crate::state::{STATE, State};

pub use config::ClientConfig;
pub use error::ClientError;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let search = window.location().search().unwrap_or_default();
    utils::init_logger(ClientConfig::log_level(&search));
    match ClientConfig::from_query(&search, utils::base_url(&window)) {
        Ok(config) => spawn_mount(window, config),
        // Host pages without URL parameters call `mount` themselves.
        Err(e) => debug!("not mounting from URL: {e}"),
    }
    Ok(())
}

/// Mount challenge `id` of family `variant`.
#[wasm_bindgen]
pub fn mount(id: String, variant: String) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let base = utils::base_url(&window);
    spawn_mount(window, ClientConfig::new(id, variant, base));
    Ok(())
}

fn spawn_mount(window: Window, config: ClientConfig) {
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = load_challenge(window, &config).await {
            error!("challenge {} ({}) not mounted: {e}", config.id, config.family);
        }
    });
}

async fn load_challenge(window: Window, config: &ClientConfig) -> Result<(), ClientError> {
    let endpoints = registry::family_endpoints(&config.family)?;
    let url = config.url(&endpoints.challenge_path(&config.id));
    let descriptor = net::fetch_challenge(&window, &url).await?;
    let entry = registry::resolve(&config.family, descriptor.subtype.as_deref())?;
    let session = ChallengeSession::new(config.id.clone(), entry, &descriptor)?;

    let document = window
        .document()
        .ok_or_else(|| ClientError::Dom("no document".into()))?;
    let root: Element = match document.query_selector(ROOT)? {
        Some(el) => el,
        None => document
            .body()
            .map(Element::from)
            .ok_or_else(|| ClientError::Dom("no body".into()))?,
    };
    if let Some(frame) = entry.frame
        && let Some(el) = root.dyn_ref::<HtmlElement>()
    {
        el.style()
            .set_property("width", &format!("{}px", frame.width))?;
        el.style()
            .set_property("height", &format!("{}px", frame.height_for(&descriptor)))?;
    }
    if let Some(text) = &descriptor.instruction
        && let Some(el) = state::query(&root, INSTRUCTION)
    {
        el.set_text_content(Some(text));
    }
    if let Some(top) = descriptor.height
        && let Some(slice) = state::query(&root, SLICE)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    {
        slice.style().set_property("top", &format!("{}px", top))?;
    }
    let marker = match entry.rule {
        AccumulatorRule::PointSelect(_) => state::query(&root, SURFACE)
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
            .and_then(|cv| MarkerLayer::new(cv).ok()),
        _ => None,
    };
    let sink = FetchSink::new(
        window.clone(),
        config.url(&entry.endpoints.submit_path(&config.id)),
    );
    info!("mounted {} for challenge {}", entry.key, config.id);
    debug!("submissions go to {}", sink.url());

    let state = Rc::new(RefCell::new(State {
        window,
        document,
        root,
        descriptor,
        session,
        gate: SubmissionGate::new(sink),
        marker,
        drag: None,
    }));
    STATE.with(|st| st.replace(Some(state.clone())));
    bind::attach_ui(&state)?;
    feedback::refresh(&mut state.borrow_mut());
    Ok(())
}
