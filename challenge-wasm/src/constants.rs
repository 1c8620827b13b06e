/// DOM hooks and feedback styling shared by the bindings.
/// Selectors match `data-challenge-*` attributes on the host page.
pub const ROOT: &str = "[data-challenge-root]";
pub const SURFACE: &str = "[data-challenge-surface]";
pub const IMAGE: &str = "[data-challenge-image]";
pub const SLICE: &str = "[data-challenge-slice]";
pub const TRACK: &str = "[data-challenge-track]";
pub const HANDLE: &str = "[data-challenge-handle]";
pub const INPUT: &str = "[data-challenge-input]";
pub const SUBMIT: &str = "[data-challenge-submit]";
pub const PREV: &str = "[data-challenge-prev]";
pub const NEXT: &str = "[data-challenge-next]";
pub const INSTRUCTION: &str = "[data-challenge-instruction]";

/// Attribute carrying a tile index.
pub const TILE_ATTR: &str = "data-challenge-tile";
/// Attribute carrying a `row-col` grid position.
pub const CELL_ATTR: &str = "data-challenge-cell";
/// Attribute carrying a placement piece index.
pub const PIECE_ATTR: &str = "data-challenge-piece";
/// Set on the container the pieces are dropped into.
pub const GRID_ATTR: &str = "data-challenge-grid";
/// Set on sequence markers, value is the 1-based click order.
pub const MARK_ATTR: &str = "data-challenge-mark";

pub const SELECTED_CLASS: &str = "selected";
pub const MARK_CLASS: &str = "challenge-mark";
/// Set on the root once the session has been submitted.
pub const SUBMITTED_CLASS: &str = "submitted";

/// Submit label while nothing is selected.
pub const SKIP_LABEL: &str = "Skip";
pub const VERIFY_LABEL: &str = "Verify";

/// Point marker drawn on canvas surfaces (CSS px).
pub const MARKER_RADIUS: f64 = 6.0;
pub const MARKER_FILL: &str = "#ffffff";
pub const MARKER_STROKE: &str = "#1a73e8";
pub const MARKER_LINE_WIDTH: f64 = 2.0;

/// Outline of the first cell picked in a swap grid.
pub const SWAP_FROM_OUTLINE: &str = "3px solid #ffffff";
