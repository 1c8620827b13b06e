use std::cell::RefCell;
use std::rc::Rc;

use challenge_core::{ChallengeDescriptor, ChallengeSession, SubmissionGate};
use web_sys::{Document, Element, Window};

use crate::canvas::MarkerLayer;
use crate::drag::DragListeners;
use crate::net::FetchSink;

/// Runtime state of the mounted widget, shared by the DOM callbacks behind an
/// `Rc<RefCell<_>>`.
pub struct State {
    pub window: Window,
    pub document: Document,
    /// Element every `data-challenge-*` hook is looked up under.
    pub root: Element,
    pub descriptor: ChallengeDescriptor,
    pub session: ChallengeSession,
    pub gate: SubmissionGate<FetchSink>,
    /// Present when the point surface is a canvas.
    pub marker: Option<MarkerLayer>,
    /// Window listeners of the drag in progress.
    pub drag: Option<DragListeners>,
}

impl State {
    pub fn query(&self, selector: &str) -> Option<Element> {
        query(&self.root, selector)
    }

    pub fn query_all(&self, selector: &str) -> Vec<Element> {
        query_all(&self.root, selector)
    }
}

pub fn query(root: &Element, selector: &str) -> Option<Element> {
    root.query_selector(selector).ok().flatten()
}

pub fn query_all(root: &Element, selector: &str) -> Vec<Element> {
    let Ok(list) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|n| wasm_bindgen::JsCast::dyn_into::<Element>(n).ok())
        .collect()
}

// Thread local storage for the live session. Mounting a new challenge
// replaces, and so drops, the previous one.
thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}
