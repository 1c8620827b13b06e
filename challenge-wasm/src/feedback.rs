//! Visual feedback for the accumulated state. Image layout and loading are
//! left to the host page; this only moves, marks and swaps what is there.

use challenge_core::accumulator::{ScalarMapping, SequenceSelect};
use challenge_core::registry::AccumulatorRule;
use challenge_core::Accumulator;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement, HtmlImageElement, HtmlInputElement};

use crate::bind::{index_attr, parse_cell, surface_of};
use crate::constants::{
    CELL_ATTR, HANDLE, IMAGE, INPUT, MARK_ATTR, MARK_CLASS, PIECE_ATTR, SELECTED_CLASS, SKIP_LABEL,
    SLICE, SUBMIT, SUBMITTED_CLASS, SURFACE, SWAP_FROM_OUTLINE, TILE_ATTR, VERIFY_LABEL,
};
use crate::error::js_message;
use crate::state::State;
use crate::utils::{element_box, png_data_url};

/// Bring the widget in line with the session. DOM failures are logged and
/// never reach the session.
pub fn refresh(s: &mut State) {
    if let Err(e) = paint(s) {
        warn!("could not refresh widget: {}", js_message(&e));
    }
}

fn paint(s: &mut State) -> Result<(), JsValue> {
    s.root
        .class_list()
        .toggle_with_force(SUBMITTED_CLASS, s.session.is_submitted())?;
    let acc = s.session.accumulator().clone();
    match &acc {
        Accumulator::PointSelect(p) => {
            let (Some(point), Some(el)) = (p.point(), s.query(SURFACE)) else {
                return Ok(());
            };
            let content = p.normalizer().content_box(&surface_of(s, &el));
            if let Some(marker) = s.marker.as_mut() {
                marker.draw(point.x(), point.y(), content)?;
            }
        }
        Accumulator::SequenceSelect(q) => paint_marks(s, q)?,
        Accumulator::MultiSelect(m) => {
            paint_tiles(s, |i| m.flags().get(i).copied().unwrap_or(false))?;
            if let Some(btn) = s.query(SUBMIT) {
                let label = if m.any_selected() { VERIFY_LABEL } else { SKIP_LABEL };
                btn.set_text_content(Some(label));
            }
        }
        Accumulator::Carousel(c) => {
            if let Some(img) = s.query(IMAGE).and_then(|e| e.dyn_into::<HtmlImageElement>().ok())
                && let Some(b64) = s.descriptor.images.get(c.index())
            {
                img.set_src(&png_data_url(b64));
            }
            paint_tiles(s, |i| i == c.index())?;
        }
        Accumulator::TileChoice(t) => paint_tiles(s, |i| t.choice() == Some(i))?,
        Accumulator::Placement(p) => {
            if let Some((piece, cell)) = p.held()
                && let Some(el) = s.query(&format!("[{}=\"{}\"]", PIECE_ATTR, piece))
            {
                let (x, y) = p.snap().piece_offset(cell);
                let el: HtmlElement = el.dyn_into()?;
                el.style().set_property("left", &format!("{}px", x))?;
                el.style().set_property("top", &format!("{}px", y))?;
            }
        }
        Accumulator::SwapGrid(g) => {
            for cell in s.query_all(&format!("[{}]", CELL_ATTR)) {
                let Some((r, c)) = cell.get_attribute(CELL_ATTR).as_deref().and_then(parse_cell)
                else {
                    continue;
                };
                let el: HtmlElement = cell.dyn_into()?;
                if let Some(&id) = g.grid().get(r).and_then(|row| row.get(c))
                    && let Some(b64) = s.descriptor.images.get(id as usize)
                {
                    let url = format!("url(\"{}\")", png_data_url(b64));
                    el.style().set_property("background-image", &url)?;
                }
                let outline = if g.from() == Some((r, c)) {
                    SWAP_FROM_OUTLINE
                } else {
                    "none"
                };
                el.style().set_property("outline", outline)?;
            }
        }
        Accumulator::ScalarDrag(d) => {
            translate_x(s.query(HANDLE), d.display_offset())?;
            match s.session.entry().rule {
                AccumulatorRule::ScalarDrag(ScalarMapping::Range(_)) => {
                    if let Some(img) = s.query(IMAGE) {
                        let img: HtmlElement = img.dyn_into()?;
                        img.style()
                            .set_property("transform", &format!("rotate({}deg)", d.value()))?;
                    }
                }
                _ => translate_x(s.query(SLICE), d.display_offset())?,
            }
        }
        Accumulator::BucketDrag(b) => {
            translate_x(s.query(HANDLE), b.display_offset())?;
            if let Some(frame) = b.frame() {
                paint_frame(s, &frame)?;
            }
        }
        Accumulator::TextEntry(t) => {
            if let Some(input) =
                s.query(INPUT).and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
            {
                input.set_disabled(t.is_locked());
            }
        }
    }
    Ok(())
}

fn translate_x(el: Option<Element>, px: f64) -> Result<(), JsValue> {
    if let Some(el) = el {
        let el: HtmlElement = el.dyn_into()?;
        el.style()
            .set_property("transform", &format!("translateX({}px)", px))?;
    }
    Ok(())
}

fn paint_tiles(s: &State, selected: impl Fn(usize) -> bool) -> Result<(), JsValue> {
    for tile in s.query_all(&format!("[{}]", TILE_ATTR)) {
        if let Some(i) = index_attr(&tile, TILE_ATTR) {
            tile.class_list().toggle_with_force(SELECTED_CLASS, selected(i))?;
        }
    }
    Ok(())
}

// Numbered marks are rebuilt from scratch so undo needs no bookkeeping.
fn paint_marks(s: &State, q: &SequenceSelect) -> Result<(), JsValue> {
    let Some(surface) = s.query(SURFACE) else {
        return Ok(());
    };
    for old in s.query_all(&format!("[{}]", MARK_ATTR)) {
        old.remove();
    }
    let bounds = element_box(&surface);
    let content = q.normalizer().content_box(&surface_of(s, &surface));
    for (i, p) in q.points().iter().enumerate() {
        let label = (i + 1).to_string();
        let mark: HtmlElement = s.document.create_element("div")?.dyn_into()?;
        mark.set_class_name(MARK_CLASS);
        mark.set_attribute(MARK_ATTR, &label)?;
        mark.set_text_content(Some(&label));
        let style = mark.style();
        style.set_property("position", "absolute")?;
        style.set_property(
            "left",
            &format!("{}px", content.left - bounds.left + p.x() * content.width),
        )?;
        style.set_property(
            "top",
            &format!("{}px", content.top - bounds.top + p.y() * content.height),
        )?;
        style.set_property("transform", "translate(-50%, -50%)")?;
        surface.append_child(&mark)?;
    }
    Ok(())
}

/// Lay the kaleidoscope sprite out as `frame`: cell `k` shows source tile
/// `frame[k]` of a square sprite.
fn paint_frame(s: &State, frame: &[usize]) -> Result<(), JsValue> {
    let side = (frame.len() as f64).sqrt().round() as usize;
    if side < 2 {
        return Ok(());
    }
    let sprite = s.descriptor.images.get(0).map(png_data_url);
    let pct = |k: usize| k as f64 * 100.0 / (side - 1) as f64;
    for cell in s.query_all(&format!("[{}]", CELL_ATTR)) {
        let Some((r, c)) = cell.get_attribute(CELL_ATTR).as_deref().and_then(parse_cell) else {
            continue;
        };
        let Some(&src) = frame.get(r * side + c) else {
            continue;
        };
        let el: HtmlElement = cell.dyn_into()?;
        let style = el.style();
        if let Some(url) = &sprite {
            style.set_property("background-image", &format!("url(\"{}\")", url))?;
        }
        style.set_property("background-size", &format!("{}% {}%", side * 100, side * 100))?;
        style.set_property(
            "background-position",
            &format!("{}% {}%", pct(src % side), pct(src / side)),
        )?;
    }
    Ok(())
}
