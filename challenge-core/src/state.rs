use serde::{Serialize, Serializer};

use crate::pointer::{GridCell, NormalizedPoint};

/// One completed placement gesture: which piece, and the lattice cell it was
/// released on. Serialized as `[piece, x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(into = "(usize, u32, u32)")]
pub struct Placement {
    pub piece: usize,
    pub cell: GridCell,
}

impl From<Placement> for (usize, u32, u32) {
    fn from(p: Placement) -> Self {
        (p.piece, p.cell.x, p.cell.y)
    }
}

/// The value reported to the backend. Serialized untagged, in the shape each
/// variant's validator expects.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateValue {
    /// Angle or fractional offset.
    Scalar(f64),
    /// A single selection. Reported as `[0, 0]` until the first valid click.
    Point(#[serde(serialize_with = "point_or_origin")] Option<NormalizedPoint>),
    /// Ordered clicks.
    Points(Vec<NormalizedPoint>),
    /// Fixed-size selection flags.
    Flags(Vec<bool>),
    Index(usize),
    Placements(Vec<Placement>),
    /// Row-major grid of image ids.
    Grid(Vec<Vec<u32>>),
    Text(String),
}

fn point_or_origin<S: Serializer>(
    point: &Option<NormalizedPoint>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match point {
        Some(p) => p.serialize(serializer),
        None => [0.0f64, 0.0].serialize(serializer),
    }
}

/// The structural shape of a [`StateValue`]. Fixed when a session is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateShape {
    Scalar,
    Point,
    Points,
    Flags(usize),
    Index,
    Placements,
    Grid { rows: usize, cols: usize },
    Text,
}

impl StateValue {
    pub fn shape(&self) -> StateShape {
        match self {
            StateValue::Scalar(_) => StateShape::Scalar,
            StateValue::Point(_) => StateShape::Point,
            StateValue::Points(_) => StateShape::Points,
            StateValue::Flags(f) => StateShape::Flags(f.len()),
            StateValue::Index(_) => StateShape::Index,
            StateValue::Placements(_) => StateShape::Placements,
            StateValue::Grid(g) => StateShape::Grid {
                rows: g.len(),
                cols: g.first().map_or(0, Vec::len),
            },
            StateValue::Text(_) => StateShape::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_in_backend_shapes() {
        let p = NormalizedPoint::new(0.25, 0.5).unwrap();
        assert_eq!(serde_json::to_value(StateValue::Point(Some(p))).unwrap(), json!([0.25, 0.5]));
        assert_eq!(serde_json::to_value(StateValue::Point(None)).unwrap(), json!([0.0, 0.0]));
        assert_eq!(serde_json::to_value(StateValue::Index(3)).unwrap(), json!(3));
        assert_eq!(
            serde_json::to_value(StateValue::Placements(vec![Placement {
                piece: 1,
                cell: GridCell { x: 12, y: 7 },
            }]))
            .unwrap(),
            json!([[1, 12, 7]])
        );
        assert_eq!(
            serde_json::to_value(StateValue::Flags(vec![true, false])).unwrap(),
            json!([true, false])
        );
        assert_eq!(serde_json::to_value(StateValue::Text("ab3".into())).unwrap(), json!("ab3"));
    }

    #[test]
    fn grid_shape_tracks_dimensions() {
        let g = StateValue::Grid(vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert_eq!(g.shape(), StateShape::Grid { rows: 2, cols: 3 });
        assert_eq!(StateValue::Flags(vec![false; 9]).shape(), StateShape::Flags(9));
    }
}
