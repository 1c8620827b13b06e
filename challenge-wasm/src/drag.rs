use std::cell::RefCell;
use std::rc::Rc;

use challenge_core::GestureEvent;
use wasm_bindgen::prelude::*;
use web_sys::{MouseEvent, Window};

use crate::bind::dispatch;
use crate::state::State;
use crate::utils::client_point;

/// Window listeners that live only while a drag is in progress, so moves and
/// releases outside the widget still reach the session.
pub struct DragListeners {
    window: Window,
    on_move: Closure<dyn FnMut(MouseEvent)>,
    on_up: Closure<dyn FnMut(MouseEvent)>,
    on_cancel: Closure<dyn FnMut(MouseEvent)>,
}

const MOVE_EVENT: &str = "pointermove";
const END_EVENT: &str = "pointerup";
// Fired when the browser takes the pointer for panning or zooming.
const CANCEL_EVENT: &str = "pointercancel";

impl DragListeners {
    fn install(state: &Rc<RefCell<State>>) -> Result<Self, JsValue> {
        let window = state.borrow().window.clone();
        let st = state.clone();
        let on_move = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            e.prevent_default();
            dispatch(&st, GestureEvent::DragMove { at: client_point(&e) });
        }));
        let st = state.clone();
        let on_up = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |_e: MouseEvent| {
            dispatch(&st, GestureEvent::DragEnd);
            release(&st);
        }));
        let st = state.clone();
        let on_cancel = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |_e: MouseEvent| {
            dispatch(&st, GestureEvent::DragCancel);
            release(&st);
        }));
        let listeners = DragListeners {
            window,
            on_move,
            on_up,
            on_cancel,
        };
        for (kind, cb) in listeners.callbacks() {
            listeners
                .window
                .add_event_listener_with_callback(kind, cb.as_ref().unchecked_ref())?;
        }
        Ok(listeners)
    }

    fn callbacks(&self) -> [(&'static str, &Closure<dyn FnMut(MouseEvent)>); 3] {
        [
            (MOVE_EVENT, &self.on_move),
            (END_EVENT, &self.on_up),
            (CANCEL_EVENT, &self.on_cancel),
        ]
    }

    fn detach(&self) {
        for (kind, cb) in self.callbacks() {
            let _ = self
                .window
                .remove_event_listener_with_callback(kind, cb.as_ref().unchecked_ref());
        }
    }
}

impl Drop for DragListeners {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Route window pointer moves and releases to the session until the next
/// release. A capture left over from an earlier drag is replaced.
pub fn begin(state: &Rc<RefCell<State>>) -> Result<(), JsValue> {
    let listeners = DragListeners::install(state)?;
    let stale = state.borrow_mut().drag.replace(listeners);
    drop(stale);
    Ok(())
}

/// Stop routing window pointer events. Runs from inside the release
/// listener, so the closures are dropped on a later tick.
pub fn release(state: &Rc<RefCell<State>>) {
    let listeners = state.borrow_mut().drag.take();
    if let Some(listeners) = listeners {
        listeners.detach();
        wasm_bindgen_futures::spawn_local(async move { drop(listeners) });
    }
}
