//! Static table of challenge variants. Adding a challenge type means adding
//! one [`VariantEntry`] to [`REGISTRY`].

use std::fmt;

use log::debug;

use crate::accumulator::{
    Accumulator, BucketDrag, Carousel, MultiSelect, PlacementSet, PointSelect, ScalarDrag,
    ScalarMapping, SequenceSelect, SwapGrid, TextEntry, TileChoice,
};
use crate::completion::CompletionPolicy;
use crate::descriptor::ChallengeDescriptor;
use crate::error::RegistryError;
use crate::pointer::{GridSnap, PointerNormalizer, SurfaceExtent};
use crate::swap::SwapSequence;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VariantKey(&'static str);

impl VariantKey {
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Where the challenge and submit resources live, relative to the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointLayout {
    /// `challenge/{id}` and `submit`.
    Flat,
    /// `{id}/challenge` and `{id}/submit`.
    IdScoped,
}

impl EndpointLayout {
    pub fn challenge_path(&self, id: &str) -> String {
        match self {
            EndpointLayout::Flat => format!("challenge/{id}"),
            EndpointLayout::IdScoped => format!("{id}/challenge"),
        }
    }

    pub fn submit_path(&self, id: &str) -> String {
        match self {
            EndpointLayout::Flat => "submit".to_string(),
            EndpointLayout::IdScoped => format!("{id}/submit"),
        }
    }
}

/// Size of the frame hosting the widget, in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHints {
    pub width: u32,
    pub height: u32,
    /// Taller frame used when instruction example images are shown.
    pub height_with_examples: Option<u32>,
}

impl FrameHints {
    pub fn height_for(&self, descriptor: &ChallengeDescriptor) -> u32 {
        match self.height_with_examples {
            Some(h) if !descriptor.instruction_image.is_empty() => h,
            _ => self.height,
        }
    }
}

/// How the travel of a slider handle is measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackRule {
    /// The handle may travel the full track width.
    Full,
    /// Track width minus the handle width.
    MinusHandle,
}

impl TrackRule {
    pub fn max_distance(&self, track_width: f64, handle_width: f64) -> f64 {
        match self {
            TrackRule::Full => track_width,
            TrackRule::MinusHandle => (track_width - handle_width).max(0.0),
        }
    }
}

/// Which accumulator a variant uses, with its fixed magnitudes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AccumulatorRule {
    PointSelect(SurfaceExtent),
    SequenceSelect(SurfaceExtent),
    MultiSelect { tiles: usize },
    /// Pages through the descriptor's choice images.
    Carousel,
    TileChoice { tiles: usize },
    /// Piece count comes from the descriptor.
    Placement(GridSnap),
    /// Grid comes from the descriptor; `dims` pins its size when set.
    SwapGrid { dims: Option<(usize, usize)> },
    ScalarDrag(ScalarMapping),
    /// One bucket per frame of the descriptor's swap list over
    /// `permutation_size` tiles.
    BucketDrag { permutation_size: usize },
    TextEntry,
}

/// Completion policy, possibly parameterized by the descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyRule {
    Fixed(CompletionPolicy),
    /// Threshold on the descriptor's hole count.
    HoleCount,
    /// Threshold on the descriptor's expected answer length.
    ExpectedLength,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VariantEntry {
    pub key: VariantKey,
    pub rule: AccumulatorRule,
    pub policy: PolicyRule,
    pub endpoints: EndpointLayout,
    pub frame: Option<FrameHints>,
    pub track: Option<TrackRule>,
    /// Sent as `challenge_type` for backends that validate per subtype.
    pub variant_tag: Option<&'static str>,
}

impl VariantEntry {
    const fn new(key: &'static str, rule: AccumulatorRule, policy: PolicyRule) -> Self {
        VariantEntry {
            key: VariantKey(key),
            rule,
            policy,
            endpoints: EndpointLayout::Flat,
            frame: None,
            track: None,
            variant_tag: None,
        }
    }

    const fn id_scoped(mut self) -> Self {
        self.endpoints = EndpointLayout::IdScoped;
        self
    }

    const fn framed(mut self, width: u32, height: u32, height_with_examples: Option<u32>) -> Self {
        self.frame = Some(FrameHints {
            width,
            height,
            height_with_examples,
        });
        self
    }

    const fn track(mut self, track: TrackRule) -> Self {
        self.track = Some(track);
        self
    }

    const fn tagged(mut self, tag: &'static str) -> Self {
        self.variant_tag = Some(tag);
        self
    }

    pub fn name(&self) -> &'static str {
        self.key.as_str()
    }

    /// Build the initial accumulator and completion policy for `descriptor`.
    pub fn build(
        &self,
        descriptor: &ChallengeDescriptor,
    ) -> Result<(Accumulator, CompletionPolicy), RegistryError> {
        let variant = self.name();
        let accumulator = match self.rule {
            AccumulatorRule::PointSelect(extent) => {
                Accumulator::PointSelect(PointSelect::new(PointerNormalizer::new(extent)))
            }
            AccumulatorRule::SequenceSelect(extent) => {
                Accumulator::SequenceSelect(SequenceSelect::new(PointerNormalizer::new(extent)))
            }
            AccumulatorRule::MultiSelect { tiles } => {
                Accumulator::MultiSelect(MultiSelect::new(tiles))
            }
            AccumulatorRule::Carousel => {
                if descriptor.images.is_empty() {
                    return Err(RegistryError::MissingField {
                        variant,
                        field: "images",
                    });
                }
                Accumulator::Carousel(Carousel::new(descriptor.images.len()))
            }
            AccumulatorRule::TileChoice { tiles } => {
                Accumulator::TileChoice(TileChoice::new(tiles))
            }
            AccumulatorRule::Placement(snap) => {
                let pieces = descriptor.n_pieces.ok_or(RegistryError::MissingField {
                    variant,
                    field: "n_pieces",
                })?;
                Accumulator::Placement(PlacementSet::new(snap, pieces))
            }
            AccumulatorRule::SwapGrid { dims } => {
                let grid = descriptor.grid.clone().ok_or(RegistryError::MissingField {
                    variant,
                    field: "grid",
                })?;
                let rows = grid.len();
                let cols = grid.first().map_or(0, Vec::len);
                let invalid = |reason: String| RegistryError::InvalidDescriptor { variant, reason };
                if rows == 0 || cols == 0 || grid.iter().any(|r| r.len() != cols) {
                    return Err(invalid("grid must be rectangular and non-empty".into()));
                }
                if let Some((r, c)) = dims
                    && (r, c) != (rows, cols)
                {
                    return Err(invalid(format!("grid is {rows}x{cols}, expected {r}x{c}")));
                }
                Accumulator::SwapGrid(SwapGrid::new(grid))
            }
            AccumulatorRule::ScalarDrag(mapping) => {
                Accumulator::ScalarDrag(ScalarDrag::new(mapping))
            }
            AccumulatorRule::BucketDrag { permutation_size } => {
                let pairs = descriptor.swaps.as_deref().ok_or(RegistryError::MissingField {
                    variant,
                    field: "swaps",
                })?;
                let swaps = SwapSequence::from_pairs(permutation_size, pairs)
                    .map_err(|reason| RegistryError::InvalidDescriptor { variant, reason })?;
                Accumulator::BucketDrag(BucketDrag::with_swaps(swaps))
            }
            AccumulatorRule::TextEntry => Accumulator::TextEntry(TextEntry::default()),
        };

        let threshold = |count: Option<usize>, field: &'static str| match count {
            Some(required) if required > 0 => Ok(CompletionPolicy::Threshold { required }),
            Some(_) => Err(RegistryError::InvalidDescriptor {
                variant,
                reason: format!("`{field}` must be at least 1"),
            }),
            None => Err(RegistryError::MissingField { variant, field }),
        };
        let policy = match self.policy {
            PolicyRule::Fixed(CompletionPolicy::Threshold { required: 0 }) => {
                return Err(RegistryError::InvalidDescriptor {
                    variant,
                    reason: "threshold must be at least 1".into(),
                });
            }
            PolicyRule::Fixed(policy) => policy,
            PolicyRule::HoleCount => threshold(descriptor.n_holes, "n_holes")?,
            PolicyRule::ExpectedLength => threshold(descriptor.expected_len(), "expected_length")?,
        };
        debug!("built variant {variant}: {:?} / {policy:?}", accumulator.shape());
        Ok((accumulator, policy))
    }
}

const EXPLICIT: PolicyRule = PolicyRule::Fixed(CompletionPolicy::ExplicitAction);
const ON_RELEASE: PolicyRule = PolicyRule::Fixed(CompletionPolicy::ReleaseTriggered);
const FIRST: PolicyRule = PolicyRule::Fixed(CompletionPolicy::Threshold { required: 1 });

pub static REGISTRY: &[VariantEntry] = &[
    VariantEntry::new(
        "amazon",
        AccumulatorRule::PointSelect(SurfaceExtent::Fixed {
            width: 320.0,
            height: 320.0,
        }),
        EXPLICIT,
    ),
    VariantEntry::new(
        "tencent",
        AccumulatorRule::PointSelect(SurfaceExtent::Fixed {
            width: 340.0,
            height: 230.0,
        }),
        FIRST,
    ),
    VariantEntry::new("hcaptcha_binary", AccumulatorRule::MultiSelect { tiles: 9 }, EXPLICIT)
        .framed(400, 600, None)
        .tagged("binary"),
    VariantEntry::new(
        "hcaptcha_area",
        AccumulatorRule::PointSelect(SurfaceExtent::Letterboxed {
            pad_tall: 20.0,
            pad_wide: 10.0,
        }),
        EXPLICIT,
    )
    .framed(520, 580, Some(686))
    .tagged("area"),
    VariantEntry::new("recaptcha_binary", AccumulatorRule::MultiSelect { tiles: 9 }, EXPLICIT)
        .framed(400, 580, None),
    VariantEntry::new("recaptcha_tile", AccumulatorRule::MultiSelect { tiles: 16 }, EXPLICIT)
        .framed(400, 580, None),
    VariantEntry::new(
        "geetest_icon",
        AccumulatorRule::SequenceSelect(SurfaceExtent::Measured),
        EXPLICIT,
    ),
    VariantEntry::new(
        "geetest_slide",
        AccumulatorRule::ScalarDrag(ScalarMapping::TrackFraction),
        ON_RELEASE,
    )
    .track(TrackRule::MinusHandle),
    VariantEntry::new(
        "geetest_gobang",
        AccumulatorRule::SwapGrid { dims: Some((5, 5)) },
        FIRST,
    ),
    VariantEntry::new("geetest_iconcrush", AccumulatorRule::SwapGrid { dims: None }, FIRST),
    VariantEntry::new("baidu", AccumulatorRule::ScalarDrag(ScalarMapping::Range(360.0)), ON_RELEASE)
        .track(TrackRule::MinusHandle),
    VariantEntry::new(
        "yandex_kaleidoscope",
        AccumulatorRule::BucketDrag {
            permutation_size: 16,
        },
        ON_RELEASE,
    )
    .track(TrackRule::Full),
    VariantEntry::new("yandex_text", AccumulatorRule::TextEntry, EXPLICIT),
    VariantEntry::new("botdetect", AccumulatorRule::TextEntry, PolicyRule::ExpectedLength),
    VariantEntry::new("mtcaptcha", AccumulatorRule::TextEntry, EXPLICIT),
    VariantEntry::new(
        "lemin",
        AccumulatorRule::Placement(GridSnap {
            cell_spacing: 9.8,
            anchor_cells: 6.0,
        }),
        PolicyRule::HoleCount,
    ),
    VariantEntry::new("arkose_multichoice", AccumulatorRule::TileChoice { tiles: 6 }, FIRST)
        .id_scoped(),
    VariantEntry::new("arkose_paged", AccumulatorRule::Carousel, EXPLICIT).id_scoped(),
];

/// Families whose concrete variant depends on the descriptor's `subtype`.
const SUBTYPES: &[(&str, &str, &str)] = &[
    ("hcaptcha", "hcaptcha_type_2", "hcaptcha_binary"),
    ("hcaptcha", "hcaptcha_type_3", "hcaptcha_binary"),
    ("hcaptcha", "hcaptcha_type_4", "hcaptcha_area"),
    ("hcaptcha", "hcaptcha_type_5", "hcaptcha_area"),
    ("recaptchav2", "binary", "recaptcha_binary"),
    ("recaptchav2", "tile", "recaptcha_tile"),
];

pub fn lookup(key: &str) -> Result<&'static VariantEntry, RegistryError> {
    REGISTRY
        .iter()
        .find(|e| e.name() == key)
        .ok_or_else(|| RegistryError::UnknownVariant(key.to_string()))
}

/// Resolve a challenge family and optional subtype to a registry entry.
pub fn resolve(
    family: &str,
    subtype: Option<&str>,
) -> Result<&'static VariantEntry, RegistryError> {
    if let Some(sub) = subtype
        && let Some(&(_, _, key)) = SUBTYPES.iter().find(|(f, s, _)| *f == family && *s == sub)
    {
        return lookup(key);
    }
    lookup(family).map_err(|_| {
        RegistryError::UnknownVariant(match subtype {
            Some(sub) => format!("{family}/{sub}"),
            None => family.to_string(),
        })
    })
}

/// Endpoint layout of a family, known before its descriptor (and thus its
/// subtype) has been fetched.
pub fn family_endpoints(family: &str) -> Result<EndpointLayout, RegistryError> {
    if let Ok(entry) = lookup(family) {
        return Ok(entry.endpoints);
    }
    match SUBTYPES.iter().find(|(f, _, _)| *f == family) {
        Some(&(_, _, key)) => lookup(key).map(|e| e.endpoints),
        None => Err(RegistryError::UnknownVariant(family.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::StateShape;

    fn descriptor(v: serde_json::Value) -> ChallengeDescriptor {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn keys_are_unique() {
        for (i, a) in REGISTRY.iter().enumerate() {
            assert!(REGISTRY[i + 1..].iter().all(|b| b.key != a.key), "{}", a.key);
        }
    }

    #[test]
    fn subtype_aliases_point_at_entries() {
        for (_, _, key) in SUBTYPES {
            assert!(lookup(key).is_ok(), "{key}");
        }
    }

    #[test]
    fn unknown_key_is_an_error() {
        assert_eq!(
            lookup("nope").unwrap_err(),
            RegistryError::UnknownVariant("nope".into())
        );
        assert_eq!(
            resolve("hcaptcha", Some("hcaptcha_type_9")).unwrap_err(),
            RegistryError::UnknownVariant("hcaptcha/hcaptcha_type_9".into())
        );
    }

    #[test]
    fn resolves_subtypes() {
        assert_eq!(resolve("hcaptcha", Some("hcaptcha_type_4")).unwrap().name(), "hcaptcha_area");
        assert_eq!(resolve("recaptchav2", Some("tile")).unwrap().name(), "recaptcha_tile");
        assert_eq!(resolve("baidu", None).unwrap().name(), "baidu");
    }

    #[test]
    fn swap_grid_requires_matching_grid() {
        let entry = lookup("geetest_gobang").unwrap();
        assert_eq!(
            entry.build(&ChallengeDescriptor::default()).unwrap_err(),
            RegistryError::MissingField {
                variant: "geetest_gobang",
                field: "grid"
            }
        );
        let small = descriptor(json!({"grid": [[0, 1], [2, 3]]}));
        assert!(matches!(
            entry.build(&small).unwrap_err(),
            RegistryError::InvalidDescriptor { .. }
        ));
        let crush = lookup("geetest_iconcrush").unwrap();
        let (acc, _) = crush.build(&small).unwrap();
        assert_eq!(acc.shape(), StateShape::Grid { rows: 2, cols: 2 });
    }

    #[test]
    fn thresholds_come_from_descriptor() {
        let (_, policy) = lookup("lemin")
            .unwrap()
            .build(&descriptor(json!({"n_holes": 2, "n_pieces": 3})))
            .unwrap();
        assert_eq!(policy, CompletionPolicy::Threshold { required: 2 });
        let err = lookup("lemin")
            .unwrap()
            .build(&descriptor(json!({"n_holes": 0, "n_pieces": 3})))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDescriptor { .. }));
        let (_, policy) = lookup("botdetect")
            .unwrap()
            .build(&descriptor(json!({"labels": ["abc123"]})))
            .unwrap();
        assert_eq!(policy, CompletionPolicy::Threshold { required: 6 });
    }

    #[test]
    fn kaleidoscope_buckets_cover_every_frame() {
        let d = descriptor(json!({"swaps": [[0, 5], [3, 9], [1, 2]]}));
        let (acc, _) = lookup("yandex_kaleidoscope").unwrap().build(&d).unwrap();
        let Accumulator::BucketDrag(b) = acc else {
            panic!("expected bucket drag");
        };
        assert_eq!(b.buckets(), 4);
        let bad = descriptor(json!({"swaps": [[0, 16]]}));
        assert!(lookup("yandex_kaleidoscope").unwrap().build(&bad).is_err());
    }

    #[test]
    fn frame_grows_with_examples() {
        let frame = lookup("hcaptcha_area").unwrap().frame.unwrap();
        assert_eq!(frame.height_for(&ChallengeDescriptor::default()), 580);
        assert_eq!(frame.height_for(&descriptor(json!({"instruction_image": ["x"]}))), 686);
    }

    #[test]
    fn endpoint_layouts() {
        assert_eq!(EndpointLayout::Flat.challenge_path("3"), "challenge/3");
        assert_eq!(EndpointLayout::IdScoped.submit_path("3"), "3/submit");
        assert_eq!(lookup("arkose_paged").unwrap().endpoints, EndpointLayout::IdScoped);
        assert_eq!(family_endpoints("hcaptcha").unwrap(), EndpointLayout::Flat);
        assert!(family_endpoints("funcaptcha").is_err());
    }
}
