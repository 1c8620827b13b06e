//! Pointer normalization: raw client coordinates and drag deltas in, bounded
//! fractions, distances and lattice cells out.

use serde::{Deserialize, Serialize};

/// Client-space pointer position, in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

/// Axis-aligned box in client space, as reported by `getBoundingClientRect`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        BoundingBox {
            left,
            top,
            width,
            height,
        }
    }
}

fn in_open_unit(v: f64) -> bool {
    v > 0.0 && v < 1.0
}

/// A position expressed as fractions of its surface. Both axes are strictly
/// inside `(0, 1)`; values on the border or outside cannot be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 2]", try_from = "[f64; 2]")]
pub struct NormalizedPoint {
    x: f64,
    y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Option<Self> {
        (in_open_unit(x) && in_open_unit(y)).then_some(NormalizedPoint { x, y })
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

impl From<NormalizedPoint> for [f64; 2] {
    fn from(p: NormalizedPoint) -> Self {
        [p.x, p.y]
    }
}

impl TryFrom<[f64; 2]> for NormalizedPoint {
    type Error = String;

    fn try_from(v: [f64; 2]) -> Result<Self, Self::Error> {
        NormalizedPoint::new(v[0], v[1])
            .ok_or_else(|| format!("coordinate ({}, {}) is outside (0, 1)", v[0], v[1]))
    }
}

/// A click target as measured at event time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Surface {
    pub bounds: BoundingBox,
    /// Natural size of the image drawn into the surface, when known.
    pub content_size: Option<(f64, f64)>,
}

impl Surface {
    pub fn new(bounds: BoundingBox) -> Self {
        Surface {
            bounds,
            content_size: None,
        }
    }

    pub fn with_content_size(mut self, width: f64, height: f64) -> Self {
        if width > 0.0 && height > 0.0 {
            self.content_size = Some((width, height));
        }
        self
    }
}

/// Which rectangle inside a surface the fractions refer to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceExtent {
    /// The measured bounding box itself.
    Measured,
    /// A fixed logical size anchored at the box origin.
    Fixed { width: f64, height: f64 },
    /// The image rectangle after fitting the content into the box. Tall images
    /// keep `pad_tall` above and below, wide images keep `pad_wide` left and
    /// right; the other axis is centered.
    Letterboxed { pad_tall: f64, pad_wide: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerNormalizer {
    extent: SurfaceExtent,
}

impl PointerNormalizer {
    pub const fn new(extent: SurfaceExtent) -> Self {
        PointerNormalizer { extent }
    }

    pub fn extent(&self) -> SurfaceExtent {
        self.extent
    }

    /// The rectangle fractions are measured against.
    pub fn content_box(&self, surface: &Surface) -> BoundingBox {
        let b = surface.bounds;
        match (self.extent, surface.content_size) {
            (SurfaceExtent::Measured, _) | (SurfaceExtent::Letterboxed { .. }, None) => b,
            (SurfaceExtent::Fixed { width, height }, _) => {
                BoundingBox::new(b.left, b.top, width, height)
            }
            (SurfaceExtent::Letterboxed { pad_tall, pad_wide }, Some((iw, ih))) => {
                if ih >= iw {
                    let height = b.height - pad_tall * 2.0;
                    let width = iw * (height / ih);
                    let margin_x = (b.width - width) / 2.0;
                    BoundingBox::new(b.left + margin_x, b.top + pad_tall, width, height)
                } else {
                    let width = b.width - pad_wide * 2.0;
                    let height = ih * (width / iw);
                    let margin_y = (b.height - height) / 2.0;
                    BoundingBox::new(b.left + pad_wide, b.top + margin_y, width, height)
                }
            }
        }
    }

    /// Map a client position to fractions of the content box. Points on the
    /// border, in the padding or outside yield `None`.
    pub fn normalize(&self, client: Point, surface: &Surface) -> Option<NormalizedPoint> {
        let b = self.content_box(surface);
        if b.width <= 0.0 || b.height <= 0.0 {
            return None;
        }
        NormalizedPoint::new((client.x - b.left) / b.width, (client.y - b.top) / b.height)
    }
}

/// One-dimensional drag along a track. The distance is always clamped to
/// `[0, max_distance]` and only published while a gesture is armed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DragState {
    start_x: f64,
    max_distance: f64,
    current_distance: f64,
    /// Distance when the gesture was armed, restored on cancel.
    origin_distance: f64,
    dragging: bool,
}

impl DragState {
    pub fn start_x(&self) -> f64 {
        self.start_x
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn current_distance(&self) -> f64 {
        self.current_distance
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Arm the gesture at `x`. The previous distance is kept until the first
    /// move so a press without movement reports where the handle already is.
    pub fn start(&mut self, x: f64, max_distance: f64) {
        self.start_x = x;
        self.max_distance = if max_distance.is_finite() {
            max_distance.max(0.0)
        } else {
            0.0
        };
        self.current_distance = self.clamp(self.current_distance);
        self.origin_distance = self.current_distance;
        self.dragging = true;
    }

    pub fn update(&mut self, x: f64) -> Option<f64> {
        if !self.dragging {
            return None;
        }
        self.current_distance = self.clamp(x - self.start_x);
        Some(self.current_distance)
    }

    /// Disarm and hand back the final distance. A second end without a new
    /// start returns `None`.
    pub fn end(&mut self) -> Option<f64> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        Some(self.current_distance)
    }

    /// Disarm without a final distance, putting the handle back where the
    /// gesture started.
    pub fn cancel(&mut self) {
        self.dragging = false;
        self.current_distance = self.origin_distance;
    }

    fn clamp(&self, distance: f64) -> f64 {
        if distance.is_nan() {
            0.0
        } else {
            distance.clamp(0.0, self.max_distance)
        }
    }
}

/// Lattice position of a placed piece.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub x: u32,
    pub y: u32,
}

/// Snaps client positions onto a lattice of `cell_spacing` pixels laid over a
/// grid box, clamped to the box's column and row extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSnap {
    pub cell_spacing: f64,
    /// Distance, in cells, from a piece's top-left corner to its grab point.
    pub anchor_cells: f64,
}

impl GridSnap {
    pub fn columns(&self, grid: &BoundingBox) -> u32 {
        Self::extent(grid.width, self.cell_spacing)
    }

    pub fn rows(&self, grid: &BoundingBox) -> u32 {
        Self::extent(grid.height, self.cell_spacing)
    }

    fn extent(len: f64, spacing: f64) -> u32 {
        if spacing <= 0.0 || !len.is_finite() || len <= 0.0 {
            0
        } else {
            (len / spacing).floor() as u32
        }
    }

    pub fn snap(&self, client: Point, grid: &BoundingBox) -> GridCell {
        let axis = |offset: f64, max: u32| -> u32 {
            if self.cell_spacing <= 0.0 || offset.is_nan() {
                return 0;
            }
            (offset / self.cell_spacing).round().clamp(0.0, max as f64) as u32
        };
        GridCell {
            x: axis(client.x - grid.left, self.columns(grid)),
            y: axis(client.y - grid.top, self.rows(grid)),
        }
    }

    /// Top-left offset, relative to the grid box, at which to draw a piece
    /// held at `cell`.
    pub fn piece_offset(&self, cell: GridCell) -> (f64, f64) {
        let anchor = self.anchor_cells * self.cell_spacing;
        (
            cell.x as f64 * self.cell_spacing - anchor,
            cell.y as f64 * self.cell_spacing - anchor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(w: f64, h: f64) -> Surface {
        Surface::new(BoundingBox::new(10.0, 20.0, w, h))
    }

    #[test]
    fn measured_click_becomes_fraction() {
        let n = PointerNormalizer::new(SurfaceExtent::Measured);
        let p = n
            .normalize(Point { x: 60.0, y: 45.0 }, &surface(100.0, 50.0))
            .unwrap();
        assert_eq!((p.x(), p.y()), (0.5, 0.5));
    }

    #[test]
    fn border_and_outside_clicks_are_dropped() {
        let n = PointerNormalizer::new(SurfaceExtent::Measured);
        let s = surface(100.0, 50.0);
        assert!(n.normalize(Point { x: 10.0, y: 30.0 }, &s).is_none());
        assert!(n.normalize(Point { x: 110.0, y: 30.0 }, &s).is_none());
        assert!(n.normalize(Point { x: 50.0, y: 71.0 }, &s).is_none());
        assert!(n.normalize(Point { x: f64::NAN, y: 30.0 }, &s).is_none());
    }

    #[test]
    fn fixed_extent_ignores_measured_size() {
        let n = PointerNormalizer::new(SurfaceExtent::Fixed {
            width: 320.0,
            height: 320.0,
        });
        let p = n
            .normalize(Point { x: 170.0, y: 100.0 }, &surface(640.0, 640.0))
            .unwrap();
        assert_eq!((p.x(), p.y()), (0.5, 0.25));
        assert!(n.normalize(Point { x: 400.0, y: 100.0 }, &surface(640.0, 640.0)).is_none());
    }

    #[test]
    fn letterboxed_wide_image_centers_vertically() {
        let n = PointerNormalizer::new(SurfaceExtent::Letterboxed {
            pad_tall: 20.0,
            pad_wide: 10.0,
        });
        let s =
            Surface::new(BoundingBox::new(0.0, 0.0, 500.0, 400.0)).with_content_size(960.0, 480.0);
        let b = n.content_box(&s);
        assert_eq!(b, BoundingBox::new(10.0, 80.0, 480.0, 240.0));
        // Click in the top margin lands outside the image.
        assert!(n.normalize(Point { x: 250.0, y: 50.0 }, &s).is_none());
    }

    #[test]
    fn letterboxed_tall_image_centers_horizontally() {
        let n = PointerNormalizer::new(SurfaceExtent::Letterboxed {
            pad_tall: 20.0,
            pad_wide: 10.0,
        });
        let s =
            Surface::new(BoundingBox::new(0.0, 0.0, 500.0, 400.0)).with_content_size(180.0, 360.0);
        assert_eq!(n.content_box(&s), BoundingBox::new(160.0, 20.0, 180.0, 360.0));
    }

    #[test]
    fn drag_clamps_and_publishes_only_while_armed() {
        let mut d = DragState::default();
        assert_eq!(d.update(50.0), None);
        d.start(100.0, 200.0);
        assert_eq!(d.update(40.0), Some(0.0));
        assert_eq!(d.update(180.0), Some(80.0));
        assert_eq!(d.update(900.0), Some(200.0));
        assert_eq!(d.end(), Some(200.0));
        assert_eq!(d.end(), None);
        assert_eq!(d.update(120.0), None);
        assert_eq!(d.current_distance(), 200.0);
    }

    #[test]
    fn grid_snap_rounds_and_clamps_to_extent() {
        let snap = GridSnap {
            cell_spacing: 10.0,
            anchor_cells: 6.0,
        };
        let grid = BoundingBox::new(100.0, 50.0, 95.0, 42.0);
        assert_eq!(snap.columns(&grid), 9);
        assert_eq!(snap.rows(&grid), 4);
        assert_eq!(snap.snap(Point { x: 134.0, y: 76.0 }, &grid), GridCell { x: 3, y: 3 });
        assert_eq!(snap.snap(Point { x: 20.0, y: 500.0 }, &grid), GridCell { x: 0, y: 4 });
        assert_eq!(snap.piece_offset(GridCell { x: 9, y: 6 }), (30.0, 0.0));
    }
}
