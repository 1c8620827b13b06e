use std::cell::RefCell;
use std::rc::Rc;

use challenge_core::registry::{AccumulatorRule, TrackRule};
use challenge_core::{Applied, DragTarget, GestureEvent, Surface, TrackMetrics, Update};
use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{
    Element, Event, EventTarget, HtmlElement, HtmlImageElement, HtmlInputElement, MouseEvent,
    PointerEvent,
};

use crate::constants::{
    CELL_ATTR, GRID_ATTR, HANDLE, IMAGE, INPUT, MARK_ATTR, NEXT, PIECE_ATTR, PREV, SUBMIT,
    SURFACE, TILE_ATTR, TRACK,
};
use crate::state::State;
use crate::utils::{client_point, element_box};
use crate::{drag, feedback};

/// Route `event` through the session, submitting when it completes, and
/// refresh the widget if anything changed.
pub fn dispatch(state: &Rc<RefCell<State>>, event: GestureEvent) -> Applied {
    let mut guard = state.borrow_mut();
    let s = &mut *guard;
    let applied = s.session.handle(event, &s.gate);
    if applied.update != Update::Ignored {
        feedback::refresh(s);
    }
    applied
}

fn on_mouse(
    target: &EventTarget,
    kind: &str,
    handler: impl FnMut(MouseEvent) + 'static,
) -> Result<(), JsValue> {
    let cb = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(handler));
    target.add_event_listener_with_callback(kind, cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}

fn on_event(
    target: &EventTarget,
    kind: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let cb = Closure::<dyn FnMut(Event)>::wrap(Box::new(handler));
    target.add_event_listener_with_callback(kind, cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}

pub(crate) fn index_attr(el: &Element, attr: &str) -> Option<usize> {
    el.get_attribute(attr)?.trim().parse().ok()
}

/// `row-col` as written in `data-challenge-cell`.
pub fn parse_cell(v: &str) -> Option<(usize, usize)> {
    let (r, c) = v.split_once('-')?;
    Some((r.trim().parse().ok()?, c.trim().parse().ok()?))
}

/// Surface geometry of `el`, with the natural size of the challenge image
/// when one is loaded.
pub fn surface_of(s: &State, el: &Element) -> Surface {
    let surface = Surface::new(element_box(el));
    let image = el
        .dyn_ref::<HtmlImageElement>()
        .cloned()
        .or_else(|| s.query(IMAGE).and_then(|i| i.dyn_into().ok()));
    match image {
        Some(img) if img.natural_width() > 0 && img.natural_height() > 0 => {
            surface.with_content_size(img.natural_width() as f64, img.natural_height() as f64)
        }
        _ => surface,
    }
}

/// Wire the page's `data-challenge-*` hooks for the mounted variant.
pub fn attach_ui(state: &Rc<RefCell<State>>) -> Result<(), JsValue> {
    let rule = state.borrow().session.entry().rule;
    match rule {
        AccumulatorRule::PointSelect(_) | AccumulatorRule::SequenceSelect(_) => {
            bind_surface(state)?
        }
        AccumulatorRule::MultiSelect { .. } => bind_tiles(state, GestureEvent::Toggle)?,
        AccumulatorRule::TileChoice { .. } => bind_tiles(state, GestureEvent::Pick)?,
        AccumulatorRule::Carousel => bind_steps(state)?,
        AccumulatorRule::Placement(_) => bind_pieces(state)?,
        AccumulatorRule::SwapGrid { .. } => bind_cells(state)?,
        AccumulatorRule::ScalarDrag(_) | AccumulatorRule::BucketDrag { .. } => {
            bind_handle(state)?
        }
        AccumulatorRule::TextEntry => bind_input(state)?,
    }
    let submit = state.borrow().query(SUBMIT);
    if let Some(btn) = submit {
        let st = state.clone();
        on_mouse(&btn, "click", move |e: MouseEvent| {
            e.prevent_default();
            dispatch(&st, GestureEvent::Confirm);
        })?;
    }
    Ok(())
}

fn bind_surface(state: &Rc<RefCell<State>>) -> Result<(), JsValue> {
    let surface = state.borrow().query(SURFACE);
    let Some(surface) = surface else {
        debug!("no surface element; clicks are not captured");
        return Ok(());
    };
    let st = state.clone();
    let el = surface.clone();
    on_mouse(&surface, "click", move |e: MouseEvent| {
        // Clicking a numbered mark undoes back to before that mark.
        let mark = e
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|t| t.closest(&format!("[{}]", MARK_ATTR)).ok().flatten())
            .and_then(|m| index_attr(&m, MARK_ATTR));
        let event = match mark {
            Some(k) => GestureEvent::Marker(k),
            None => GestureEvent::Click {
                at: client_point(&e),
                surface: surface_of(&st.borrow(), &el),
            },
        };
        dispatch(&st, event);
    })
}

fn bind_tiles(state: &Rc<RefCell<State>>, make: fn(usize) -> GestureEvent) -> Result<(), JsValue> {
    let tiles = state.borrow().query_all(&format!("[{}]", TILE_ATTR));
    for tile in tiles {
        let Some(idx) = index_attr(&tile, TILE_ATTR) else {
            continue;
        };
        let st = state.clone();
        on_mouse(&tile, "click", move |_e: MouseEvent| {
            dispatch(&st, make(idx));
        })?;
    }
    Ok(())
}

fn bind_steps(state: &Rc<RefCell<State>>) -> Result<(), JsValue> {
    for (selector, delta) in [(PREV, -1), (NEXT, 1)] {
        let btn = state.borrow().query(selector);
        let Some(btn) = btn else {
            continue;
        };
        let st = state.clone();
        on_mouse(&btn, "click", move |e: MouseEvent| {
            e.prevent_default();
            dispatch(&st, GestureEvent::Step(delta));
        })?;
    }
    Ok(())
}

fn bind_cells(state: &Rc<RefCell<State>>) -> Result<(), JsValue> {
    let cells = state.borrow().query_all(&format!("[{}]", CELL_ATTR));
    for cell in cells {
        let Some((row, col)) = cell.get_attribute(CELL_ATTR).as_deref().and_then(parse_cell) else {
            continue;
        };
        let st = state.clone();
        on_mouse(&cell, "click", move |_e: MouseEvent| {
            dispatch(&st, GestureEvent::SelectCell { row, col });
        })?;
    }
    Ok(())
}

/// Stop touch drags on `el` from turning into page pans, which the browser
/// reports as `pointercancel`.
fn claim_touch(el: &Element) -> Result<(), JsValue> {
    if let Some(el) = el.dyn_ref::<HtmlElement>() {
        el.style().set_property("touch-action", "none")?;
    }
    Ok(())
}

// Keeps the rest of the gesture on `el` even after the pointer leaves it.
fn capture_pointer(el: &Element, e: &MouseEvent) {
    if let Some(pe) = e.dyn_ref::<PointerEvent>()
        && let Err(err) = el.set_pointer_capture(pe.pointer_id())
    {
        debug!("pointer capture refused: {:?}", err);
    }
}

// Starts a drag and captures the window when the session accepted it.
fn start_drag(state: &Rc<RefCell<State>>, event: GestureEvent) {
    if dispatch(state, event).update == Update::Ignored {
        return;
    }
    if let Err(e) = drag::begin(state) {
        log::warn!("could not capture drag: {:?}", e);
    }
}

fn bind_pieces(state: &Rc<RefCell<State>>) -> Result<(), JsValue> {
    let pieces = state.borrow().query_all(&format!("[{}]", PIECE_ATTR));
    for el in pieces {
        let Some(piece) = index_attr(&el, PIECE_ATTR) else {
            continue;
        };
        claim_touch(&el)?;
        let st = state.clone();
        let target = el.clone();
        on_mouse(&el, "pointerdown", move |e: MouseEvent| {
            e.prevent_default();
            capture_pointer(&target, &e);
            let grid = {
                let s = st.borrow();
                let grid_el = s.query(&format!("[{}]", GRID_ATTR));
                element_box(grid_el.as_ref().unwrap_or(&s.root))
            };
            let at = client_point(&e);
            start_drag(
                &st,
                GestureEvent::DragStart {
                    at,
                    target: DragTarget::Piece { piece, grid },
                },
            );
        })?;
    }
    Ok(())
}

/// Travel and reference width for a slider handle in the current layout.
fn track_metrics(s: &State, handle: &Element) -> TrackMetrics {
    let track = s.query(TRACK).map(|t| element_box(&t)).unwrap_or_else(|| element_box(&s.root));
    let rule = s.session.entry().track.unwrap_or(TrackRule::Full);
    let max_distance = rule.max_distance(track.width, element_box(handle).width);
    let reference_width = s
        .query(IMAGE)
        .map(|i| element_box(&i).width)
        .filter(|w| *w > 0.0)
        .unwrap_or(track.width);
    TrackMetrics {
        max_distance,
        reference_width,
    }
}

fn bind_handle(state: &Rc<RefCell<State>>) -> Result<(), JsValue> {
    let handle = state.borrow().query(HANDLE);
    let Some(handle) = handle else {
        debug!("no slider handle on page");
        return Ok(());
    };
    claim_touch(&handle)?;
    let st = state.clone();
    let el = handle.clone();
    on_mouse(&handle, "pointerdown", move |e: MouseEvent| {
        e.prevent_default();
        capture_pointer(&el, &e);
        let metrics = track_metrics(&st.borrow(), &el);
        start_drag(
            &st,
            GestureEvent::DragStart {
                at: client_point(&e),
                target: DragTarget::Handle(metrics),
            },
        );
    })
}

fn bind_input(state: &Rc<RefCell<State>>) -> Result<(), JsValue> {
    let input = state.borrow().query(INPUT);
    let Some(input) = input else {
        debug!("no text input on page");
        return Ok(());
    };
    let input: HtmlInputElement = input.dyn_into()?;
    let st = state.clone();
    let field = input.clone();
    on_event(&input, "input", move |_e: Event| {
        dispatch(&st, GestureEvent::Edit(field.value()));
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_parse_as_row_col() {
        assert_eq!(parse_cell("2-4"), Some((2, 4)));
        assert_eq!(parse_cell(" 0 - 1 "), Some((0, 1)));
        assert_eq!(parse_cell("3"), None);
        assert_eq!(parse_cell("a-1"), None);
    }
}
