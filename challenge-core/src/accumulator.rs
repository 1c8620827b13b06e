//! Per-variant state accumulators. Each one owns the mutable state of a
//! session and turns gesture events into [`Update`]s.

use log::debug;

use crate::pointer::{
    BoundingBox, DragState, GridCell, GridSnap, NormalizedPoint, Point, PointerNormalizer, Surface,
};
use crate::state::{Placement, StateShape, StateValue};
use crate::swap::SwapSequence;

/// Measurements of a slider taken when the handle is pressed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackMetrics {
    /// Longest distance the handle may travel.
    pub max_distance: f64,
    /// Width that fractional offsets are measured against.
    pub reference_width: f64,
}

/// What a drag gesture grabbed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragTarget {
    Handle(TrackMetrics),
    Piece { piece: usize, grid: BoundingBox },
}

/// Input already routed to a session, in client coordinates where relevant.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureEvent {
    Click { at: Point, surface: Surface },
    /// Click on the 1-based marker of a previously recorded point.
    Marker(usize),
    Toggle(usize),
    Step(i64),
    Pick(usize),
    SelectCell { row: usize, col: usize },
    DragStart { at: Point, target: DragTarget },
    DragMove { at: Point },
    DragEnd,
    /// The platform took the pointer away mid-drag (e.g. to scroll). Ends
    /// the gesture without recording it.
    DragCancel,
    Edit(String),
    Confirm,
}

/// Outcome of applying one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Update {
    /// Event did not apply; state untouched.
    Ignored,
    /// Gesture bookkeeping moved but the reported state did not.
    Tracking,
    /// Reported state changed.
    Changed,
    /// A drag was released and its final value recorded.
    Released,
    /// The solver asked to submit.
    Confirmed,
}

/// Maps a clamped drag distance to a scalar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScalarMapping {
    /// `distance / max_distance * range`, e.g. degrees of rotation.
    Range(f64),
    /// `distance / reference_width`.
    TrackFraction,
}

impl ScalarMapping {
    fn map(&self, distance: f64, metrics: &TrackMetrics) -> f64 {
        let ratio = |den: f64| if den > 0.0 { distance / den } else { 0.0 };
        match *self {
            ScalarMapping::Range(range) => ratio(metrics.max_distance) * range,
            ScalarMapping::TrackFraction => ratio(metrics.reference_width),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointSelect {
    normalizer: PointerNormalizer,
    point: Option<NormalizedPoint>,
}

impl PointSelect {
    pub fn new(normalizer: PointerNormalizer) -> Self {
        PointSelect {
            normalizer,
            point: None,
        }
    }

    pub fn point(&self) -> Option<NormalizedPoint> {
        self.point
    }

    pub fn normalizer(&self) -> PointerNormalizer {
        self.normalizer
    }

    fn apply(&mut self, event: &GestureEvent) -> Update {
        match event {
            GestureEvent::Click { at, surface } => match self.normalizer.normalize(*at, surface) {
                Some(p) => {
                    self.point = Some(p);
                    Update::Changed
                }
                None => Update::Ignored,
            },
            GestureEvent::Confirm => Update::Confirmed,
            _ => Update::Ignored,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SequenceSelect {
    normalizer: PointerNormalizer,
    points: Vec<NormalizedPoint>,
}

impl SequenceSelect {
    pub fn new(normalizer: PointerNormalizer) -> Self {
        SequenceSelect {
            normalizer,
            points: Vec::new(),
        }
    }

    pub fn points(&self) -> &[NormalizedPoint] {
        &self.points
    }

    pub fn normalizer(&self) -> PointerNormalizer {
        self.normalizer
    }

    fn apply(&mut self, event: &GestureEvent) -> Update {
        match event {
            GestureEvent::Click { at, surface } => match self.normalizer.normalize(*at, surface) {
                Some(p) => {
                    self.points.push(p);
                    Update::Changed
                }
                None => Update::Ignored,
            },
            // Clicking marker k drops point k and everything after it.
            GestureEvent::Marker(k) if (1..=self.points.len()).contains(k) => {
                self.points.truncate(k - 1);
                Update::Changed
            }
            GestureEvent::Confirm => Update::Confirmed,
            _ => Update::Ignored,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MultiSelect {
    flags: Vec<bool>,
}

impl MultiSelect {
    pub fn new(tiles: usize) -> Self {
        MultiSelect {
            flags: vec![false; tiles],
        }
    }

    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    /// Drives the verify/skip label of the submit control.
    pub fn any_selected(&self) -> bool {
        self.flags.iter().any(|&f| f)
    }

    fn apply(&mut self, event: &GestureEvent) -> Update {
        match event {
            GestureEvent::Toggle(i) => match self.flags.get_mut(*i) {
                Some(flag) => {
                    *flag = !*flag;
                    Update::Changed
                }
                None => Update::Ignored,
            },
            GestureEvent::Confirm => Update::Confirmed,
            _ => Update::Ignored,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Carousel {
    index: usize,
    len: usize,
}

impl Carousel {
    /// `len` must be at least one.
    pub fn new(len: usize) -> Self {
        Carousel {
            index: 0,
            len: len.max(1),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    fn apply(&mut self, event: &GestureEvent) -> Update {
        match event {
            GestureEvent::Step(delta) => {
                let n = self.len as i64;
                self.index = (self.index as i64 + delta).rem_euclid(n) as usize;
                Update::Changed
            }
            GestureEvent::Confirm => Update::Confirmed,
            _ => Update::Ignored,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TileChoice {
    tiles: usize,
    choice: Option<usize>,
}

impl TileChoice {
    pub fn new(tiles: usize) -> Self {
        TileChoice {
            tiles,
            choice: None,
        }
    }

    pub fn choice(&self) -> Option<usize> {
        self.choice
    }

    fn apply(&mut self, event: &GestureEvent) -> Update {
        match event {
            GestureEvent::Pick(i) if *i < self.tiles => {
                self.choice = Some(*i);
                Update::Changed
            }
            _ => Update::Ignored,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct HeldPiece {
    piece: usize,
    grid: BoundingBox,
    cell: GridCell,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacementSet {
    snap: GridSnap,
    pieces: usize,
    placements: Vec<Placement>,
    held: Option<HeldPiece>,
}

impl PlacementSet {
    pub fn new(snap: GridSnap, pieces: usize) -> Self {
        PlacementSet {
            snap,
            pieces,
            placements: Vec::new(),
            held: None,
        }
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn snap(&self) -> GridSnap {
        self.snap
    }

    /// Piece being dragged and the cell it currently snaps to.
    pub fn held(&self) -> Option<(usize, GridCell)> {
        self.held.map(|h| (h.piece, h.cell))
    }

    fn apply(&mut self, event: &GestureEvent) -> Update {
        match event {
            GestureEvent::DragStart {
                at,
                target: DragTarget::Piece { piece, grid },
            } if *piece < self.pieces => {
                self.held = Some(HeldPiece {
                    piece: *piece,
                    grid: *grid,
                    cell: self.snap.snap(*at, grid),
                });
                Update::Tracking
            }
            GestureEvent::DragMove { at } => match self.held.as_mut() {
                Some(h) => {
                    h.cell = self.snap.snap(*at, &h.grid);
                    Update::Tracking
                }
                None => Update::Ignored,
            },
            GestureEvent::DragEnd => match self.held.take() {
                Some(h) => {
                    self.placements.push(Placement {
                        piece: h.piece,
                        cell: h.cell,
                    });
                    Update::Released
                }
                None => Update::Ignored,
            },
            GestureEvent::DragCancel => match self.held.take() {
                Some(_) => Update::Tracking,
                None => Update::Ignored,
            },
            _ => Update::Ignored,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwapGrid {
    cols: usize,
    grid: Vec<Vec<u32>>,
    from: Option<(usize, usize)>,
    history: SwapSequence,
}

impl SwapGrid {
    /// `grid` must be rectangular and non-empty.
    pub fn new(grid: Vec<Vec<u32>>) -> Self {
        let cols = grid.first().map_or(0, Vec::len);
        let size = grid.len() * cols;
        SwapGrid {
            cols,
            grid,
            from: None,
            history: SwapSequence::new(size),
        }
    }

    pub fn grid(&self) -> &[Vec<u32>] {
        &self.grid
    }

    /// Cell currently marked as the swap origin.
    pub fn from(&self) -> Option<(usize, usize)> {
        self.from
    }

    /// Completed swaps as row-major index pairs.
    pub fn history(&self) -> &SwapSequence {
        &self.history
    }

    fn apply(&mut self, event: &GestureEvent) -> Update {
        let GestureEvent::SelectCell { row, col } = *event else {
            return Update::Ignored;
        };
        if row >= self.grid.len() || col >= self.cols {
            return Update::Ignored;
        }
        match self.from {
            Some(from) if from == (row, col) => {
                self.from = None;
                Update::Tracking
            }
            None => {
                self.from = Some((row, col));
                Update::Tracking
            }
            Some((r1, c1)) => {
                let a = self.grid[r1][c1];
                self.grid[r1][c1] = self.grid[row][col];
                self.grid[row][col] = a;
                self.from = None;
                if let Err(e) = self.history.push(r1 * self.cols + c1, row * self.cols + col) {
                    debug!("swap history not recorded: {e}");
                }
                Update::Changed
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScalarDrag {
    mapping: ScalarMapping,
    drag: DragState,
    metrics: TrackMetrics,
    value: f64,
}

impl ScalarDrag {
    pub fn new(mapping: ScalarMapping) -> Self {
        ScalarDrag {
            mapping,
            drag: DragState::default(),
            metrics: TrackMetrics::default(),
            value: 0.0,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    /// Pixel offset at which to draw the handle.
    pub fn display_offset(&self) -> f64 {
        self.drag.current_distance()
    }

    fn apply(&mut self, event: &GestureEvent) -> Update {
        match event {
            GestureEvent::DragStart {
                at,
                target: DragTarget::Handle(metrics),
            } => {
                self.metrics = *metrics;
                self.drag.start(at.x, metrics.max_distance);
                Update::Tracking
            }
            GestureEvent::DragMove { at } => match self.drag.update(at.x) {
                Some(d) => {
                    self.value = self.mapping.map(d, &self.metrics);
                    Update::Changed
                }
                None => Update::Ignored,
            },
            GestureEvent::DragEnd => match self.drag.end() {
                Some(d) => {
                    self.value = self.mapping.map(d, &self.metrics);
                    Update::Released
                }
                None => Update::Ignored,
            },
            GestureEvent::DragCancel if self.drag.is_dragging() => {
                self.drag.cancel();
                self.value = self.mapping.map(self.drag.current_distance(), &self.metrics);
                Update::Changed
            }
            _ => Update::Ignored,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BucketDrag {
    buckets: usize,
    drag: DragState,
    index: usize,
    frames: Option<SwapSequence>,
}

impl BucketDrag {
    /// `buckets` must be at least one.
    pub fn new(buckets: usize) -> Self {
        BucketDrag {
            buckets: buckets.max(1),
            drag: DragState::default(),
            index: 0,
            frames: None,
        }
    }

    /// One bucket per frame of the sequence, identity first.
    pub fn with_swaps(swaps: SwapSequence) -> Self {
        let buckets = swaps.len() + 1;
        BucketDrag {
            frames: Some(swaps),
            ..BucketDrag::new(buckets)
        }
    }

    pub fn buckets(&self) -> usize {
        self.buckets
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    pub fn interval(&self) -> f64 {
        self.drag.max_distance() / self.buckets as f64
    }

    /// Bucket holding a clamped distance; the far end belongs to the last one.
    pub fn bucket_for(&self, distance: f64) -> usize {
        let interval = self.interval();
        if interval <= 0.0 {
            return 0;
        }
        ((distance / interval).floor() as usize).min(self.buckets - 1)
    }

    /// Handle offset snapped to the start of the current bucket.
    pub fn display_offset(&self) -> f64 {
        self.index as f64 * self.interval()
    }

    /// Permutation shown for the current bucket, when backed by swaps.
    pub fn frame(&self) -> Option<Vec<usize>> {
        self.frames.as_ref().map(|s| s.permutation(self.index))
    }

    fn apply(&mut self, event: &GestureEvent) -> Update {
        match event {
            GestureEvent::DragStart {
                at,
                target: DragTarget::Handle(metrics),
            } => {
                self.drag.start(at.x, metrics.max_distance);
                Update::Tracking
            }
            GestureEvent::DragMove { at } => match self.drag.update(at.x) {
                Some(d) => {
                    let index = self.bucket_for(d);
                    if index == self.index {
                        return Update::Tracking;
                    }
                    self.index = index;
                    Update::Changed
                }
                None => Update::Ignored,
            },
            GestureEvent::DragEnd => match self.drag.end() {
                Some(d) => {
                    self.index = self.bucket_for(d);
                    Update::Released
                }
                None => Update::Ignored,
            },
            GestureEvent::DragCancel if self.drag.is_dragging() => {
                self.drag.cancel();
                self.index = self.bucket_for(self.drag.current_distance());
                Update::Changed
            }
            _ => Update::Ignored,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextEntry {
    text: String,
    locked: bool,
}

impl TextEntry {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn apply(&mut self, event: &GestureEvent) -> Update {
        if self.locked {
            return Update::Ignored;
        }
        match event {
            GestureEvent::Edit(text) => {
                self.text.clone_from(text);
                Update::Changed
            }
            GestureEvent::Confirm => Update::Confirmed,
            _ => Update::Ignored,
        }
    }
}

/// The accumulator chosen for a session. Resolved once when the session is
/// built.
#[derive(Clone, Debug, PartialEq)]
pub enum Accumulator {
    PointSelect(PointSelect),
    SequenceSelect(SequenceSelect),
    MultiSelect(MultiSelect),
    Carousel(Carousel),
    TileChoice(TileChoice),
    Placement(PlacementSet),
    SwapGrid(SwapGrid),
    ScalarDrag(ScalarDrag),
    BucketDrag(BucketDrag),
    TextEntry(TextEntry),
}

impl Accumulator {
    pub fn apply(&mut self, event: &GestureEvent) -> Update {
        match self {
            Accumulator::PointSelect(a) => a.apply(event),
            Accumulator::SequenceSelect(a) => a.apply(event),
            Accumulator::MultiSelect(a) => a.apply(event),
            Accumulator::Carousel(a) => a.apply(event),
            Accumulator::TileChoice(a) => a.apply(event),
            Accumulator::Placement(a) => a.apply(event),
            Accumulator::SwapGrid(a) => a.apply(event),
            Accumulator::ScalarDrag(a) => a.apply(event),
            Accumulator::BucketDrag(a) => a.apply(event),
            Accumulator::TextEntry(a) => a.apply(event),
        }
    }

    /// Monotonic count used by threshold completion.
    pub fn progress(&self) -> usize {
        match self {
            Accumulator::PointSelect(a) => usize::from(a.point.is_some()),
            Accumulator::SequenceSelect(a) => a.points.len(),
            Accumulator::MultiSelect(a) => a.flags.iter().filter(|&&f| f).count(),
            Accumulator::Carousel(_) | Accumulator::ScalarDrag(_) | Accumulator::BucketDrag(_) => 0,
            Accumulator::TileChoice(a) => usize::from(a.choice.is_some()),
            Accumulator::Placement(a) => a.placements.len(),
            Accumulator::SwapGrid(a) => a.history.len(),
            Accumulator::TextEntry(a) => a.text.chars().count(),
        }
    }

    pub fn snapshot(&self) -> StateValue {
        match self {
            Accumulator::PointSelect(a) => StateValue::Point(a.point),
            Accumulator::SequenceSelect(a) => StateValue::Points(a.points.clone()),
            Accumulator::MultiSelect(a) => StateValue::Flags(a.flags.clone()),
            Accumulator::Carousel(a) => StateValue::Index(a.index),
            Accumulator::TileChoice(a) => StateValue::Index(a.choice.unwrap_or(0)),
            Accumulator::Placement(a) => StateValue::Placements(a.placements.clone()),
            Accumulator::SwapGrid(a) => StateValue::Grid(a.grid.clone()),
            Accumulator::ScalarDrag(a) => StateValue::Scalar(a.value),
            Accumulator::BucketDrag(a) => StateValue::Index(a.index),
            Accumulator::TextEntry(a) => StateValue::Text(a.text.clone()),
        }
    }

    pub fn shape(&self) -> StateShape {
        match self {
            Accumulator::PointSelect(_) => StateShape::Point,
            Accumulator::SequenceSelect(_) => StateShape::Points,
            Accumulator::MultiSelect(a) => StateShape::Flags(a.flags.len()),
            Accumulator::Carousel(_) | Accumulator::TileChoice(_) | Accumulator::BucketDrag(_) => {
                StateShape::Index
            }
            Accumulator::Placement(_) => StateShape::Placements,
            Accumulator::SwapGrid(a) => StateShape::Grid {
                rows: a.grid.len(),
                cols: a.cols,
            },
            Accumulator::ScalarDrag(_) => StateShape::Scalar,
            Accumulator::TextEntry(_) => StateShape::Text,
        }
    }

    /// Called once the session completes. Text entry stops accepting edits.
    pub fn freeze(&mut self) {
        if let Accumulator::TextEntry(t) = self {
            t.locked = true;
        }
    }
}
