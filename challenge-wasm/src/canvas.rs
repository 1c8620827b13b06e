use challenge_core::BoundingBox;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::constants::{MARKER_FILL, MARKER_LINE_WIDTH, MARKER_RADIUS, MARKER_STROKE};

// Non-deprecated helpers to set canvas styles via property assignment.
pub fn set_fill_style(ctx: &CanvasRenderingContext2d, color: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(color),
    );
}

pub fn set_stroke_style(ctx: &CanvasRenderingContext2d, color: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("strokeStyle"),
        &JsValue::from_str(color),
    );
}

/// Selection marker over a canvas whose pixels are painted by the host page.
/// The pixels under the first marker are kept so later markers replace it.
pub struct MarkerLayer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    background: Option<ImageData>,
}

impl MarkerLayer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(MarkerLayer {
            canvas,
            ctx,
            background: None,
        })
    }

    /// Draw the marker at the fraction (`fx`, `fy`) of `content`, a box in
    /// client coordinates.
    pub fn draw(&mut self, fx: f64, fy: f64, content: BoundingBox) -> Result<(), JsValue> {
        let (x, y) = self.client_to_canvas(
            content.left + fx * content.width,
            content.top + fy * content.height,
        );
        let w = self.canvas.width() as f64;
        let h = self.canvas.height() as f64;
        match &self.background {
            Some(bg) => self.ctx.put_image_data(bg, 0.0, 0.0)?,
            None => self.background = Some(self.ctx.get_image_data(0.0, 0.0, w, h)?),
        }
        self.ctx.begin_path();
        self.ctx.arc(x, y, MARKER_RADIUS, 0.0, std::f64::consts::TAU)?;
        set_fill_style(&self.ctx, MARKER_FILL);
        self.ctx.fill();
        self.ctx.set_line_width(MARKER_LINE_WIDTH);
        set_stroke_style(&self.ctx, MARKER_STROKE);
        self.ctx.stroke();
        Ok(())
    }

    // Client coordinates into canvas pixels, so CSS scaling is respected.
    fn client_to_canvas(&self, x: f64, y: f64) -> (f64, f64) {
        let rect = self.canvas.get_bounding_client_rect();
        (
            (x - rect.left()) * (self.canvas.width() as f64) / rect.width().max(1.0),
            (y - rect.top()) * (self.canvas.height() as f64) / rect.height().max(1.0),
        )
    }
}
